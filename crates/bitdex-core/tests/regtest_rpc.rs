use std::sync::Once;
use std::{env, fs};

use bitcoin::Txid;
use bitdex_core::rpc::{BlockChainRpc, HttpRpcClient};
use bitdex_core::{BackendConfig, Coin};

static TRACING_INIT: Once = Once::new();

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bitdex_core=debug")),
            )
            .with_target(true)
            .try_init();
    });
}

fn regtest_client(parse_blocks: bool) -> HttpRpcClient {
    let rpc_url = env::var("BITDEX_TEST_RPC_URL").expect("BITDEX_TEST_RPC_URL must be set");
    let rpc_user = env::var("BITDEX_TEST_RPC_USER").expect("BITDEX_TEST_RPC_USER must be set");
    let rpc_pass = env::var("BITDEX_TEST_RPC_PASS").expect("BITDEX_TEST_RPC_PASS must be set");
    let config = BackendConfig {
        network: "regtest".into(),
        rpc_user: Some(rpc_user),
        rpc_pass: Some(rpc_pass),
        parse_blocks,
        ..BackendConfig::new(Coin::Bitcoin, rpc_url)
    };
    config.validate().expect("regtest config must validate");
    HttpRpcClient::new(&config).expect("rpc client must construct")
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a local regtest bitcoind; set BITDEX_TEST_RPC_* and BITDEX_TEST_TXIDS_FILE"]
async fn regtest_rpc_client_reads_chain_blocks_and_transactions() {
    init_tracing();

    let txids_file = env::var("BITDEX_TEST_TXIDS_FILE").expect("BITDEX_TEST_TXIDS_FILE must be set");
    let rpc = regtest_client(false);

    let info = rpc
        .get_chain_info()
        .await
        .expect("regtest get_chain_info must succeed");
    assert_eq!(info.chain, "regtest");
    assert!(
        info.blocks >= 110,
        "regtest must have mined setup blocks before running tx checks"
    );
    let best = rpc
        .get_best_block_hash()
        .await
        .expect("get_best_block_hash must succeed");
    assert_eq!(best, info.best_block_hash);

    let txids_raw = fs::read_to_string(&txids_file).expect("txid fixture file must be readable");
    let txids: Vec<Txid> = txids_raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.parse().expect("fixture txid must parse"))
        .collect();
    assert!(!txids.is_empty(), "fixture txid list must not be empty");
    eprintln!("[itest] validating {} transactions via get_tx", txids.len());

    for txid in &txids {
        let verbose = rpc.get_tx(txid).await.expect("regtest get_tx must succeed");
        let raw = rpc
            .get_tx_for_mempool(txid)
            .await
            .expect("regtest get_tx_for_mempool must succeed");
        assert_eq!(verbose.txid, *txid, "decoded txid must match requested txid");
        assert_eq!(raw.txid, *txid, "parsed txid must match requested txid");
        assert_eq!(
            verbose.outputs, raw.outputs,
            "node JSON and local decoding must agree on outputs"
        );
    }

    eprintln!("[itest] validating batched fetch");
    let batch = rpc
        .get_txs_for_mempool(&txids)
        .await
        .expect("regtest batch fetch must succeed");
    assert_eq!(batch.len(), txids.len());
    for (tx, txid) in batch.iter().zip(&txids) {
        assert_eq!(tx.txid, *txid, "batch results must keep request order");
    }
    eprintln!("[itest] integration test completed");
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a local regtest bitcoind; set BITDEX_TEST_RPC_*"]
async fn regtest_local_and_node_block_decoding_agree() {
    init_tracing();

    let node = regtest_client(false);
    let local = regtest_client(true);
    let height = node
        .get_best_block_height()
        .await
        .expect("get_best_block_height must succeed");

    for height in [0, height] {
        let from_node = node.get_block(None, height).await.expect("node block");
        let parsed = local.get_block(None, height).await.expect("parsed block");
        assert_eq!(from_node.header.hash, parsed.header.hash);
        assert_eq!(from_node.header.height, parsed.header.height);
        let node_txids: Vec<_> = from_node.txs.iter().map(|tx| tx.txid).collect();
        let parsed_txids: Vec<_> = parsed.txs.iter().map(|tx| tx.txid).collect();
        assert_eq!(node_txids, parsed_txids, "block {height} txids must agree");
    }
}
