//! Alternative fee provider against a fake fee service and node.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bitcoin::Amount;
use bitdex_core::error::FeeError;
use bitdex_core::fees::{AlternativeFeeProvider, FeeProviderConfig, FeeSource};
use bitdex_core::rpc::BlockChainRpc;
use bitdex_core::{BackendConfig, Coin, HttpRpcClient};
use serde_json::{json, Value};

static TRACING_INIT: Once = Once::new();

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bitdex_core=debug")),
            )
            .with_target(true)
            .with_test_writer()
            .try_init();
    });
}

#[derive(Clone, Default)]
struct Service {
    fee_downloads: Arc<AtomicUsize>,
    node_fee_calls: Arc<AtomicUsize>,
}

async fn recommended(State(service): State<Service>) -> Response {
    service.fee_downloads.fetch_add(1, Ordering::Relaxed);
    Json(json!({
        "fastestFee": 20,
        "halfHourFee": 12,
        "hourFee": 8,
        "economyFee": 3,
        "minimumFee": 1,
    }))
    .into_response()
}

async fn projected_blocks() -> Response {
    Json(json!([
        {"medianFee": 15.1234, "feeRange": [10.0, 12.0, 14.0, 15.0, 18.0, 25.0, 60.0]},
        {"medianFee": 9.876, "feeRange": [8.0, 9.0, 9.5, 10.0, 11.0, 12.0, 13.0]},
    ]))
    .into_response()
}

async fn broken() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "down").into_response()
}

async fn node(State(service): State<Service>, Json(req): Json<Value>) -> Response {
    let id = req["id"].clone();
    match req["method"].as_str().unwrap_or_default() {
        "estimatesmartfee" => {
            service.node_fee_calls.fetch_add(1, Ordering::Relaxed);
            Json(json!({"result": {"feerate": 0.0005, "blocks": 2}, "error": null, "id": id}))
                .into_response()
        }
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"result": null, "error": {"code": -32601, "message": "Method not found"}, "id": id})),
        )
            .into_response(),
    }
}

async fn spawn_service() -> (Service, SocketAddr) {
    let service = Service::default();
    let app = Router::new()
        .route("/", post(node))
        .route("/fees/recommended", get(recommended))
        .route("/fees/mempool-blocks", get(projected_blocks))
        .route("/broken", get(broken))
        .with_state(service.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake service");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake service");
    });
    (service, addr)
}

async fn wait_for_sync(provider: &AlternativeFeeProvider) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while provider.table().await.last_sync().is_none() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("fee table must sync");
}

fn client(addr: SocketAddr, source: &str, path: &str, extra: &str) -> HttpRpcClient {
    let config = BackendConfig {
        alternative_estimate_fee: Some(source.into()),
        alternative_estimate_fee_params: format!(
            r#"{{"url":"http://{addr}{path}","periodSeconds":3600{extra}}}"#
        ),
        ..BackendConfig::new(Coin::Bitcoin, format!("http://{addr}"))
    };
    config.validate().expect("valid config");
    HttpRpcClient::new(&config).expect("client")
}

#[tokio::test]
async fn recommended_fees_replace_node_estimates() {
    init_tracing();
    let (service, addr) = spawn_service().await;
    let rpc = client(addr, "mempoolspace", "/fees/recommended", "");
    let provider = rpc.alternative_fees().expect("provider configured");
    wait_for_sync(provider).await;

    assert_eq!(
        rpc.estimate_smart_fee(1, true).await.expect("fee"),
        Amount::from_sat(20_000)
    );
    assert_eq!(
        rpc.estimate_smart_fee(2, true).await.expect("fee"),
        Amount::from_sat(12_000)
    );
    assert_eq!(
        rpc.estimate_fee(100).await.expect("fee"),
        Amount::from_sat(3_000)
    );
    assert_eq!(
        rpc.estimate_smart_fee(5000, false).await.expect("fee"),
        Amount::from_sat(1_000)
    );
    assert_eq!(service.fee_downloads.load(Ordering::Relaxed), 1);

    rpc.shutdown().await;
    // The first refresh compares every target with the node, both modes.
    assert_eq!(service.node_fee_calls.load(Ordering::Relaxed), 10);
}

#[tokio::test]
async fn projected_blocks_use_median_and_fallback() {
    init_tracing();
    let (_service, addr) = spawn_service().await;
    let rpc = client(
        addr,
        "mempoolspaceblock",
        "/fees/mempool-blocks",
        r#","fallbackFeePerKB":1500"#,
    );
    let provider = rpc.alternative_fees().expect("provider configured");
    wait_for_sync(provider).await;

    assert_eq!(
        rpc.estimate_smart_fee(1, true).await.expect("fee"),
        Amount::from_sat(15_100)
    );
    assert_eq!(
        rpc.estimate_smart_fee(2, true).await.expect("fee"),
        Amount::from_sat(9_880)
    );
    assert_eq!(
        rpc.estimate_smart_fee(3, true).await.expect("fee"),
        Amount::from_sat(1_500)
    );
    rpc.shutdown().await;
}

#[tokio::test]
async fn failed_downloads_fall_back_to_the_node() {
    init_tracing();
    let (service, addr) = spawn_service().await;
    let rpc = client(addr, "mempoolspace", "/broken", "");

    assert_eq!(
        rpc.estimate_smart_fee(2, true).await.expect("fee"),
        Amount::from_sat(50_000)
    );
    let provider = rpc.alternative_fees().expect("provider configured");
    assert!(matches!(
        provider.estimate_fee(2).await,
        Err(FeeError::NoFeesYet)
    ));
    rpc.shutdown().await;
    assert_eq!(service.fee_downloads.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn provider_stops_on_shutdown() {
    init_tracing();
    let (service, addr) = spawn_service().await;
    let config = FeeProviderConfig {
        source: FeeSource::MempoolSpace,
        url: format!("http://{addr}/fees/recommended"),
        period: Duration::from_millis(50),
        fee_range_index: None,
        fallback_fee_per_kb: None,
    };
    let provider = AlternativeFeeProvider::start(config, None).expect("start");
    wait_for_sync(&provider).await;
    provider.shutdown().await;

    let downloads = service.fee_downloads.load(Ordering::Relaxed);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(service.fee_downloads.load(Ordering::Relaxed), downloads);
}
