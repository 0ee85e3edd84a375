//! mempool.space fee documents.
//!
//! `/api/v1/fees/recommended` returns a flat set of rates:
//!
//! ```json
//! {"fastestFee":41,"halfHourFee":39,"hourFee":36,"economyFee":36,"minimumFee":20}
//! ```
//!
//! `/api/v1/fees/mempool-blocks` returns the projected upcoming blocks, each
//! with a `medianFee` and a `feeRange` of the 2nd, 10th, 25th, 50th, 75th,
//! 90th and 98th percentiles. All rates are sat/vB.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime};

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::FeeError;

use super::table::{FeeEntry, FeeTable};

/// Highest valid `feeRangeIndex` (the 98th percentile).
const MAX_FEE_RANGE_INDEX: i64 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeSource {
    /// Flat recommended-fees document.
    MempoolSpace,
    /// Per-block projection.
    MempoolSpaceBlock,
}

impl FromStr for FeeSource {
    type Err = FeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mempoolspace" => Ok(Self::MempoolSpace),
            "mempoolspaceblock" => Ok(Self::MempoolSpaceBlock),
            other => Err(FeeError::InvalidConfig(format!(
                "unknown alternative fee provider `{other}`"
            ))),
        }
    }
}

impl fmt::Display for FeeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MempoolSpace => f.write_str("mempoolspace"),
            Self::MempoolSpaceBlock => f.write_str("mempoolspaceblock"),
        }
    }
}

// ==============================================================================
// Provider Config
// ==============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParams {
    #[serde(default)]
    url: String,
    #[serde(default)]
    period_seconds: u64,
    fee_range_index: Option<i64>,
    #[serde(default, rename = "fallbackFeePerKB")]
    fallback_fee_per_kb: Option<u64>,
}

/// Where and how often to download fees, and how to read the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeProviderConfig {
    pub source: FeeSource,
    pub url: String,
    pub period: Duration,
    /// Percentile of `feeRange` to use instead of the median.
    pub fee_range_index: Option<usize>,
    pub fallback_fee_per_kb: Option<u64>,
}

impl FeeProviderConfig {
    /// Parse the provider name and its JSON parameter string, e.g.
    /// `{"url":"https://mempool.space/api/v1/fees/recommended","periodSeconds":60}`.
    pub fn parse(source: &str, params: &str) -> Result<Self, FeeError> {
        let source: FeeSource = source.parse()?;
        let raw: RawParams = serde_json::from_str(params)
            .map_err(|e| FeeError::InvalidConfig(format!("{source} parameters: {e}")))?;
        if raw.url.is_empty() {
            return Err(FeeError::InvalidConfig(format!("{source}: missing url")));
        }
        if raw.period_seconds == 0 {
            return Err(FeeError::InvalidConfig(format!(
                "{source}: missing periodSeconds"
            )));
        }

        let mut config = Self {
            source,
            url: raw.url,
            period: Duration::from_secs(raw.period_seconds),
            fee_range_index: None,
            fallback_fee_per_kb: None,
        };
        if source == FeeSource::MempoolSpaceBlock {
            config.fee_range_index = match raw.fee_range_index {
                None => {
                    info!(fees.source = %source, "using median fee");
                    None
                }
                Some(index @ 0..=MAX_FEE_RANGE_INDEX) => {
                    info!(fees.source = %source, fees.range_index = index, "using fee range index");
                    Some(index as usize)
                }
                Some(_) => {
                    return Err(FeeError::InvalidConfig(format!(
                        "{source}: feeRangeIndex must be between 0 and {MAX_FEE_RANGE_INDEX}"
                    )))
                }
            };
            config.fallback_fee_per_kb = raw.fallback_fee_per_kb.filter(|fee| *fee > 0);
        }
        Ok(config)
    }

    /// Turn a downloaded document into a fee table synced at `now`.
    pub fn build_table(&self, body: &str, now: SystemTime) -> Result<FeeTable, FeeError> {
        let entries = match self.source {
            FeeSource::MempoolSpace => {
                let doc: RecommendedFees = decode(body)?;
                doc.entries()?
            }
            FeeSource::MempoolSpaceBlock => {
                let blocks: Vec<ProjectedBlock> = decode(body)?;
                block_entries(&blocks, self.fee_range_index)?
            }
        };
        Ok(FeeTable::new(entries, now).with_fallback(self.fallback_fee_per_kb))
    }
}

fn decode<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, FeeError> {
    serde_json::from_str(body).map_err(|e| FeeError::InvalidData(e.to_string()))
}

// ==============================================================================
// Documents
// ==============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendedFees {
    #[serde(default)]
    fastest_fee: f64,
    #[serde(default)]
    half_hour_fee: f64,
    #[serde(default)]
    hour_fee: f64,
    #[serde(default)]
    economy_fee: f64,
    #[serde(default)]
    minimum_fee: f64,
}

impl RecommendedFees {
    fn entries(&self) -> Result<Vec<FeeEntry>, FeeError> {
        let mapping = [
            (1, self.fastest_fee),
            (6, self.half_hour_fee),
            (36, self.hour_fee),
            (500, self.economy_fee),
            (1000, self.minimum_fee),
        ];
        if mapping.iter().any(|(_, fee)| *fee <= 0.0) {
            return Err(FeeError::InvalidData(format!("{self:?}")));
        }
        Ok(mapping
            .into_iter()
            .map(|(blocks, fee)| FeeEntry {
                blocks,
                fee_per_kb: per_kb(fee),
            })
            .collect())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectedBlock {
    #[serde(default)]
    median_fee: f64,
    #[serde(default)]
    fee_range: Vec<f64>,
}

fn block_entries(
    blocks: &[ProjectedBlock],
    fee_range_index: Option<usize>,
) -> Result<Vec<FeeEntry>, FeeError> {
    if blocks.is_empty() {
        return Err(FeeError::InvalidData("empty block list".into()));
    }
    let mut entries = Vec::with_capacity(blocks.len());
    for (i, block) in blocks.iter().enumerate() {
        let fee = match fee_range_index {
            None => block.median_fee,
            Some(index) => match block.fee_range.get(index) {
                Some(fee) => *fee,
                None => {
                    warn!(
                        fees.block = i,
                        fees.range_len = block.fee_range.len(),
                        fees.range_index = index,
                        "fee range too short, using median fee"
                    );
                    block.median_fee
                }
            },
        };
        if fee <= 0.0 {
            warn!(fees.block = i, fees.fee = fee, "skipping block with invalid fee");
            continue;
        }
        entries.push(FeeEntry {
            blocks: i as u32 + 1,
            fee_per_kb: per_kb(round_to_significant(fee, 3)),
        });
    }
    Ok(entries)
}

fn per_kb(sat_per_vbyte: f64) -> u64 {
    (sat_per_vbyte * 1000.0).round() as u64
}

/// Round `n` to `digits` significant figures: `1234 -> 1230`.
fn round_to_significant(n: f64, digits: i32) -> f64 {
    if n == 0.0 {
        return 0.0;
    }
    let integer_digits = n.abs().log10().ceil() as i32;
    let magnitude = 10f64.powi(digits - integer_digits);
    (n * magnitude).round() / magnitude
}

#[cfg(test)]
mod tests {
    use bitcoin::Amount;

    use super::*;

    const BLOCKS: &str = r#"[
        {"blockSize":1800000,"blockVSize":997931,"nTx":2500,"totalFees":6000000,"medianFee":25.1,"feeRange":[1,5,10,20,30,50,300]},
        {"blockSize":1750000,"blockVSize":997930,"nTx":2200,"totalFees":4500000,"medianFee":7.31,"feeRange":[1,2,5,10,15,20,150]},
        {"blockSize":1700000,"blockVSize":997929,"nTx":2000,"totalFees":3000000,"medianFee":3.14,"feeRange":[1,1.5,2,5,7,10,100]},
        {"blockSize":1650000,"blockVSize":997928,"nTx":1800,"totalFees":2000000,"medianFee":1.34,"feeRange":[1,1.2,1.5,3,4,5,50]},
        {"blockSize":1600000,"blockVSize":997927,"nTx":1500,"totalFees":1500000,"medianFee":1.11,"feeRange":[1,1.05,1.1,1.5,1.8,2,20]}
    ]"#;

    fn estimates(table: &FeeTable, now: SystemTime, targets: &[u32]) -> Vec<u64> {
        targets
            .iter()
            .map(|b| table.estimate(*b, now).map(Amount::to_sat).expect("fresh table"))
            .collect()
    }

    #[test]
    fn flat_document_maps_to_fixed_targets() {
        let config = FeeProviderConfig::parse(
            "mempoolspace",
            r#"{"url":"https://mempool.space/api/v1/fees/recommended","periodSeconds":20}"#,
        )
        .expect("valid config");
        let now = SystemTime::now();
        let table = config
            .build_table(
                r#"{"minimumFee":10,"economyFee":20,"hourFee":30,"halfHourFee":40,"fastestFee":50}"#,
                now,
            )
            .expect("valid data");
        assert_eq!(
            estimates(&table, now, &[0, 1, 2, 5, 6, 7, 36, 37, 500, 501, 5_000_000]),
            [50000, 50000, 40000, 40000, 40000, 30000, 30000, 20000, 20000, 10000, 10000]
        );
    }

    #[test]
    fn flat_document_with_zero_is_rejected() {
        let config = FeeProviderConfig::parse("mempoolspace", r#"{"url":"u","periodSeconds":1}"#)
            .expect("valid config");
        let err = config
            .build_table(
                r#"{"minimumFee":0,"economyFee":20,"hourFee":30,"halfHourFee":40,"fastestFee":50}"#,
                SystemTime::now(),
            )
            .expect_err("zero minimum fee");
        assert!(matches!(err, FeeError::InvalidData(_)));
    }

    #[test]
    fn block_document_uses_rounded_median() {
        let config = FeeProviderConfig::parse(
            "mempoolspaceblock",
            r#"{"url":"https://mempool.space/api/v1/fees/mempool-blocks","periodSeconds":20}"#,
        )
        .expect("valid config");
        let now = SystemTime::now();
        let table = config.build_table(BLOCKS, now).expect("valid data");
        assert_eq!(
            estimates(&table, now, &[0, 1, 2, 3, 4, 5, 6, 36, 501, 5_000_000]),
            [25100, 25100, 7310, 3140, 1340, 1110, 1110, 1110, 1110, 1110]
        );
    }

    #[test]
    fn block_document_with_range_index_and_fallback() {
        let config = FeeProviderConfig::parse(
            "mempoolspaceblock",
            r#"{"url":"u","periodSeconds":20,"feeRangeIndex":5,"fallbackFeePerKB":1000}"#,
        )
        .expect("valid config");
        let now = SystemTime::now();
        let table = config.build_table(BLOCKS, now).expect("valid data");
        assert_eq!(
            estimates(&table, now, &[0, 1, 2, 3, 4, 5, 6, 7, 100, 5_000_000]),
            [50000, 50000, 20000, 10000, 5000, 2000, 1000, 1000, 1000, 1000]
        );
    }

    #[test]
    fn short_fee_range_falls_back_to_median() {
        let entries = block_entries(
            &[ProjectedBlock {
                median_fee: 2.5,
                fee_range: vec![1.0],
            }],
            Some(3),
        )
        .expect("one block");
        assert_eq!(entries[0].fee_per_kb, 2500);
    }

    #[test]
    fn invalid_blocks_are_skipped() {
        let entries = block_entries(
            &[
                ProjectedBlock {
                    median_fee: 0.0,
                    fee_range: Vec::new(),
                },
                ProjectedBlock {
                    median_fee: 4.0,
                    fee_range: Vec::new(),
                },
            ],
            None,
        )
        .expect("valid list");
        assert_eq!(
            entries,
            [FeeEntry {
                blocks: 2,
                fee_per_kb: 4000
            }]
        );
        assert!(block_entries(&[], None).is_err());
    }

    #[test]
    fn config_validation() {
        for (source, params) in [
            ("whatthefee", r#"{"url":"u","periodSeconds":1}"#),
            ("mempoolspace", r#"{"periodSeconds":1}"#),
            ("mempoolspace", r#"{"url":"u"}"#),
            ("mempoolspaceblock", r#"{"url":"u","periodSeconds":1,"feeRangeIndex":7}"#),
            ("mempoolspaceblock", r#"{"url":"u","periodSeconds":1,"feeRangeIndex":-1}"#),
            ("mempoolspace", "not json"),
        ] {
            assert!(
                matches!(
                    FeeProviderConfig::parse(source, params),
                    Err(FeeError::InvalidConfig(_))
                ),
                "{source} {params} should be rejected"
            );
        }
    }

    #[test]
    fn significant_figures() {
        assert_eq!(round_to_significant(1234.0, 3), 1230.0);
        assert_eq!(round_to_significant(0.0, 3), 0.0);
        assert_eq!(per_kb(round_to_significant(7.31, 3)), 7310);
        assert_eq!(per_kb(round_to_significant(1.005_1, 3)), 1010);
    }
}
