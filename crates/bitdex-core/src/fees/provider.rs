use std::fmt::Write as _;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use bitcoin::Amount;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::error::{CoreError, FeeError};
use crate::rpc::SmartFeeEstimator;

use super::mempoolspace::FeeProviderConfig;
use super::table::FeeTable;

/// Successful refreshes between two comparisons with the node estimator.
const COMPARE_EVERY: u64 = 60;
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Keeps a fee table refreshed from an external service.
///
/// A single background task downloads the configured document every
/// period and swaps the table. Readers never wait on the network. The task
/// stops on [`AlternativeFeeProvider::shutdown`] and is aborted when the
/// provider is dropped.
pub struct AlternativeFeeProvider {
    table: Arc<RwLock<FeeTable>>,
    stop: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AlternativeFeeProvider {
    /// Spawn the refresh task on the current tokio runtime.
    ///
    /// `estimator`, when given, is queried every sixty successful refreshes
    /// and both estimates are logged side by side.
    pub fn start(
        config: FeeProviderConfig,
        estimator: Option<Arc<dyn SmartFeeEstimator>>,
    ) -> Result<Self, CoreError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            CoreError::Config(format!("alternative fee provider needs a tokio runtime: {e}"))
        })?;
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| CoreError::Config(format!("fee provider http client: {e}")))?;

        let table = Arc::new(RwLock::new(FeeTable::default()));
        let (stop, stop_rx) = watch::channel(false);
        info!(
            fees.source = %config.source,
            fees.url = %config.url,
            fees.period_secs = config.period.as_secs(),
            "starting alternative fee provider"
        );
        let worker = Worker {
            config,
            http,
            table: Arc::clone(&table),
            estimator,
        };
        let handle = runtime.spawn(worker.run(stop_rx));

        Ok(Self {
            table,
            stop,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Fee for confirmation within `blocks` blocks, per 1000 virtual bytes.
    pub async fn estimate_fee(&self, blocks: u32) -> Result<Amount, FeeError> {
        self.table.read().await.estimate(blocks, SystemTime::now())
    }

    pub async fn table(&self) -> FeeTable {
        self.table.read().await.clone()
    }

    /// Stop the refresh task and wait for it to finish.
    pub async fn shutdown(&self) {
        let _ = self.stop.send(true);
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "alternative fee provider task failed");
            }
        }
    }
}

impl Drop for AlternativeFeeProvider {
    fn drop(&mut self) {
        let handle = self
            .worker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

// ==============================================================================
// Refresh Task
// ==============================================================================

struct Worker {
    config: FeeProviderConfig,
    http: reqwest::Client,
    table: Arc<RwLock<FeeTable>>,
    estimator: Option<Arc<dyn SmartFeeEstimator>>,
}

impl Worker {
    async fn run(self, mut stop: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut refreshed: u64 = 0;
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stop.changed() => break,
            }
            match self.refresh().await {
                Ok(()) => {
                    if refreshed % COMPARE_EVERY == 0 {
                        self.compare_to_node().await;
                    }
                    refreshed += 1;
                }
                Err(e) => error!(fees.url = %self.config.url, error = %e, "fee refresh failed"),
            }
        }
        debug!(fees.url = %self.config.url, "alternative fee provider stopped");
    }

    async fn refresh(&self) -> Result<(), FeeError> {
        let body = self.download().await?;
        let table = self.config.build_table(&body, SystemTime::now())?;
        debug!(fees.entries = table.entries().len(), "fee table refreshed");
        *self.table.write().await = table;
        Ok(())
    }

    async fn download(&self) -> Result<String, FeeError> {
        let response = self
            .http
            .get(&self.config.url)
            .send()
            .await
            .map_err(|e| FeeError::Fetch(e.to_string()))?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FeeError::Fetch(format!(
                "{} returned status {status}",
                self.config.url
            )));
        }
        response
            .text()
            .await
            .map_err(|e| FeeError::Fetch(e.to_string()))
    }

    async fn compare_to_node(&self) {
        let Some(estimator) = &self.estimator else {
            return;
        };
        let entries = self.table.read().await.entries().to_vec();
        let mut report = String::new();
        for entry in entries {
            let conservative = estimator.node_estimate_smart_fee(entry.blocks, true).await;
            let economical = estimator.node_estimate_smart_fee(entry.blocks, false).await;
            let (conservative, economical) = match (conservative, economical) {
                (Ok(c), Ok(e)) => (c, e),
                (Err(e), _) | (_, Err(e)) => {
                    error!(error = %e, "node fee estimate for comparison failed");
                    return;
                }
            };
            let _ = writeln!(
                report,
                "blocks {}: alternative {}, conservative {}, economical {}",
                entry.blocks,
                entry.fee_per_kb,
                conservative.to_sat(),
                economical.to_sat()
            );
        }
        info!(fees.url = %self.config.url, "alternative fees compared to node\n{report}");
    }
}
