use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bitcoin::{Amount, BlockHash, Txid};
use futures::future::try_join_all;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::header;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::config::BackendConfig;
use crate::error::{CoreError, ParseError, RpcError};
use crate::fees::AlternativeFeeProvider;
use crate::parser::json::{parse_amount, parse_txid};
use crate::parser::Parser;
use crate::types::{Block, BlockHeader, BlockInfo, Tx};

use super::super::types::{
    block_info_from_json, header_from_json, BlockchainInfoJson, ChainInfo, MempoolEntry,
    NetworkInfoJson,
};
use super::super::{BlockChainRpc, RpcDialect, SmartFeeEstimator};
use super::command::Command;
use super::connection::{parse_connection, resolve_auth, Credentials};
use super::protocol::{
    parse_batch_id, parse_jsonrpc_error, safe_decode, JsonRpcRequest, JsonRpcResponse,
    JsonRpcResponseOwned,
};

/// Mempool transactions fetched per JSON-RPC batch.
const BATCH_CHUNK_SIZE: usize = 100;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

// ==============================================================================
// Transport
// ==============================================================================

/// One node endpoint: HTTP pool, credentials, request ids and dialect.
/// Shared between the client and its node-only fee estimator.
struct Transport {
    client: reqwest::Client,
    url: String,
    auth: Option<Credentials>,
    limiter: Option<DirectRateLimiter>,
    dialect: RpcDialect,
    next_id: AtomicU64,
}

impl Transport {
    fn new(config: &BackendConfig) -> Result<Self, CoreError> {
        let endpoint = parse_connection(&config.rpc_url)?;
        let auth = resolve_auth(
            config.rpc_user.as_deref(),
            config.rpc_pass.as_deref(),
            config.rpc_cookie_file.as_deref(),
        )?
        .or(endpoint.embedded);

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.rpc_timeout())
            .tcp_keepalive(Duration::from_secs(600))
            .pool_max_idle_per_host(100)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| CoreError::Config(format!("rpc http client: {e}")))?;

        let limiter = match config.rpc_requests_per_second {
            None => None,
            Some(limit) => {
                let limit = NonZeroU32::new(limit).ok_or_else(|| {
                    CoreError::Config("rpc_requests_per_second must be at least 1".to_owned())
                })?;
                Some(RateLimiter::direct(Quota::per_second(limit)))
            }
        };

        Ok(Self {
            client,
            url: endpoint.url,
            auth,
            limiter,
            dialect: config.rpc_dialect(),
            next_id: AtomicU64::new(initial_request_id()),
        })
    }

    /// Atomically reserve `count` consecutive request IDs for batch calls.
    fn reserve_request_ids(&self, count: u64) -> u64 {
        self.next_id.fetch_add(count, Ordering::Relaxed)
    }

    async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    async fn post<T: serde::Serialize + ?Sized>(
        &self,
        payload: &T,
    ) -> Result<(reqwest::StatusCode, String), RpcError> {
        let mut builder = self
            .client
            .post(&self.url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(payload);
        if let Some(auth) = &self.auth {
            builder = builder.basic_auth(&auth.user, Some(&auth.pass));
        }
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    async fn call(&self, cmd: &Command<'_>) -> Result<Value, RpcError> {
        self.wait_for_rate_limit().await;
        let id = self.reserve_request_ids(1);
        let method = cmd.method();
        let params = cmd.params(self.dialect);
        debug!(rpc.id = id, rpc.method = method, rpc.params = %params, "rpc call");
        let req = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let (status, body) = self.post(&req).await?;
        debug!(rpc.id = id, rpc.method = method, %status, body_len = body.len(), "rpc response");
        trace!(rpc.id = id, rpc.method = method, body = %body, "rpc response body");

        // Nodes answer errors with 404/500 and a JSON body; the error object
        // is what matters.
        let decoded: JsonRpcResponse = match safe_decode(&body) {
            Ok(decoded) => decoded,
            Err(_) if !status.is_success() => {
                return Err(RpcError::Protocol(format!(
                    "{method}: http status {status}"
                )))
            }
            Err(e) => return Err(e),
        };

        if let Some(err) = decoded.error.filter(|e| !e.is_null()) {
            return Err(parse_jsonrpc_error(err));
        }

        Ok(decoded.result.unwrap_or(Value::Null))
    }

    async fn batch(&self, cmds: &[Command<'_>]) -> Result<Vec<Result<Value, RpcError>>, RpcError> {
        self.wait_for_rate_limit().await;
        let start_id = self.reserve_request_ids(cmds.len() as u64);
        debug!(
            rpc.batch_start_id = start_id,
            rpc.batch_size = cmds.len(),
            "rpc batch call"
        );
        let requests: Vec<JsonRpcRequest<'_>> = cmds
            .iter()
            .enumerate()
            .map(|(offset, cmd)| JsonRpcRequest {
                jsonrpc: "2.0",
                id: start_id + offset as u64,
                method: cmd.method(),
                params: cmd.params(self.dialect),
            })
            .collect();

        let (status, body) = self.post(&requests).await?;
        debug!(
            rpc.batch_start_id = start_id,
            rpc.batch_size = cmds.len(),
            %status,
            body_len = body.len(),
            "rpc batch response"
        );
        trace!(rpc.batch_start_id = start_id, body = %body, "rpc batch response body");

        let decoded: Vec<JsonRpcResponseOwned> = safe_decode(&body)?;
        let mut by_id: HashMap<u64, JsonRpcResponseOwned> = HashMap::with_capacity(decoded.len());
        for item in decoded {
            by_id.insert(parse_batch_id(&item.id)?, item);
        }

        (start_id..start_id + cmds.len() as u64)
            .map(|id| -> Result<Result<Value, RpcError>, RpcError> {
                let item = by_id.remove(&id).ok_or(RpcError::MissingBatchItem { id })?;
                Ok(match item.error.filter(|e| !e.is_null()) {
                    Some(err) => Err(parse_jsonrpc_error(err)),
                    None => Ok(item.result.unwrap_or(Value::Null)),
                })
            })
            .collect()
    }
}

fn initial_request_id() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1)
}

// ==============================================================================
// Client
// ==============================================================================

/// JSON-RPC client of a Bitcoin-family node.
///
/// Decodes transactions and blocks with the chain's [`Parser`]. When an
/// alternative fee provider is configured, fee estimates come from it
/// while its table is fresh and from the node otherwise.
pub struct HttpRpcClient {
    transport: Arc<Transport>,
    parser: Parser,
    parse_blocks: bool,
    alternative_fees: Option<AlternativeFeeProvider>,
}

impl HttpRpcClient {
    /// Build a client from validated settings. Starting an alternative fee
    /// provider requires a tokio runtime.
    pub fn new(config: &BackendConfig) -> Result<Self, CoreError> {
        let params = config.chain_params()?;
        let parser = Parser::new(params).with_address_format(config.address_format()?);
        let transport = Arc::new(Transport::new(config)?);
        let mut client = Self {
            transport,
            parser,
            parse_blocks: config.parse_blocks,
            alternative_fees: None,
        };
        if let Some(fee_config) = config.fee_provider()? {
            let estimator: Arc<dyn SmartFeeEstimator> = Arc::new(client.node_fee_estimator());
            client.alternative_fees =
                Some(AlternativeFeeProvider::start(fee_config, Some(estimator))?);
        }
        debug!(
            chain = %client.parser.params().label(),
            rpc.url = %client.transport.url,
            rpc.dialect = ?client.transport.dialect,
            "rpc client ready"
        );
        Ok(client)
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn alternative_fees(&self) -> Option<&AlternativeFeeProvider> {
        self.alternative_fees.as_ref()
    }

    /// Estimator that always asks the node.
    pub fn node_fee_estimator(&self) -> NodeFeeEstimator {
        NodeFeeEstimator {
            transport: Arc::clone(&self.transport),
            decimals: self.parser.policy().amount_decimals,
        }
    }

    /// Stop background work. In-flight calls run to their timeout.
    pub async fn shutdown(&self) {
        if let Some(fees) = &self.alternative_fees {
            fees.shutdown().await;
        }
    }

    async fn call(&self, cmd: &Command<'_>) -> Result<Value, RpcError> {
        self.transport.call(cmd).await
    }

    async fn call_string(&self, cmd: &Command<'_>) -> Result<String, CoreError> {
        match self.call(cmd).await? {
            Value::String(s) => Ok(s),
            other => Err(RpcError::Protocol(format!(
                "{}: expected a string result, got {other}",
                cmd.method()
            ))
            .into()),
        }
    }

    async fn getblock(&self, hash: &BlockHash, verbosity: u8) -> Result<Value, CoreError> {
        let hash = hash.to_string();
        self.call(&Command::GetBlock {
            hash: &hash,
            verbosity,
        })
        .await
        .map_err(|e| normalize_block_error(&hash, e))
    }

    async fn getrawtransaction(&self, txid: &Txid, verbose: bool) -> Result<Value, CoreError> {
        let id = txid.to_string();
        self.call(&Command::GetRawTransaction { txid: &id, verbose })
            .await
            .map_err(|e| normalize_getrawtransaction_error(txid, e))
    }

    fn tx_from_hex_result(&self, result: Value) -> Result<Tx, CoreError> {
        let hex = result.as_str().ok_or_else(|| {
            RpcError::Protocol(format!("getrawtransaction: expected hex, got {result}"))
        })?;
        Ok(self.parser.parse_tx_hex(hex)?)
    }

    /// Raw block decoded locally; height and hash come from the caller.
    async fn get_block_without_header(
        &self,
        hash: &BlockHash,
        height: u32,
    ) -> Result<Block, CoreError> {
        let bytes = self.get_block_bytes(hash).await?;
        let mut block = self.parser.parse_block(&bytes)?;
        block.header.hash = Some(*hash);
        block.header.height = Some(height.into());
        Ok(block)
    }

    async fn node_smart_fee(&self, blocks: u32, conservative: bool) -> Result<Amount, CoreError> {
        let estimator = self.node_fee_estimator();
        estimator.estimate(blocks, conservative).await
    }
}

// ==============================================================================
// Node Fee Estimator
// ==============================================================================

/// The node's `estimatesmartfee`, sharing the client's connection pool.
#[derive(Clone)]
pub struct NodeFeeEstimator {
    transport: Arc<Transport>,
    decimals: u32,
}

impl NodeFeeEstimator {
    async fn estimate(&self, blocks: u32, conservative: bool) -> Result<Amount, CoreError> {
        let result = self
            .transport
            .call(&Command::EstimateSmartFee {
                conf_target: blocks,
                conservative,
            })
            .await?;
        // A result without `feerate` means the node has no estimate yet.
        fee_rate(result.get("feerate"), self.decimals)
    }
}

#[async_trait]
impl SmartFeeEstimator for NodeFeeEstimator {
    async fn node_estimate_smart_fee(
        &self,
        blocks: u32,
        conservative: bool,
    ) -> Result<Amount, CoreError> {
        self.estimate(blocks, conservative).await
    }
}

#[async_trait]
impl SmartFeeEstimator for HttpRpcClient {
    async fn node_estimate_smart_fee(
        &self,
        blocks: u32,
        conservative: bool,
    ) -> Result<Amount, CoreError> {
        self.node_smart_fee(blocks, conservative).await
    }
}

/// Fee per kvB from a node value in the display unit. Missing and negative
/// values (the node's "no estimate") read as zero.
fn fee_rate(value: Option<&Value>, decimals: u32) -> Result<Amount, CoreError> {
    match value {
        None | Some(Value::Null) => Ok(Amount::ZERO),
        Some(v) if v.as_f64().is_some_and(|f| f < 0.0) => Ok(Amount::ZERO),
        Some(v) => Ok(parse_amount(v, decimals)?),
    }
}

// ==============================================================================
// BlockChainRpc
// ==============================================================================

#[async_trait]
impl BlockChainRpc for HttpRpcClient {
    async fn get_best_block_hash(&self) -> Result<BlockHash, CoreError> {
        let hash = self.call_string(&Command::GetBestBlockHash).await?;
        parse_block_hash(&hash)
    }

    async fn get_best_block_height(&self) -> Result<u32, CoreError> {
        let count = self.call(&Command::GetBlockCount).await?;
        count
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| RpcError::Protocol(format!("getblockcount: invalid result {count}")).into())
    }

    async fn get_block_hash(&self, height: u32) -> Result<BlockHash, CoreError> {
        let hash = self
            .call(&Command::GetBlockHash { height })
            .await
            .map_err(|e| normalize_block_error(&height.to_string(), e))?;
        match hash.as_str() {
            Some(hash) => parse_block_hash(hash),
            None => Err(RpcError::Protocol(format!("getblockhash: invalid result {hash}")).into()),
        }
    }

    async fn get_chain_info(&self) -> Result<ChainInfo, CoreError> {
        let chain = self.call(&Command::GetBlockchainInfo).await?;
        let chain: BlockchainInfoJson = serde_json::from_value(chain)
            .map_err(|e| RpcError::Protocol(format!("invalid getblockchaininfo result: {e}")))?;
        // Some forks lack getnetworkinfo; the chain part is still useful.
        let network = match self.call(&Command::GetNetworkInfo).await {
            Ok(network) => serde_json::from_value(network).map_err(|e| {
                RpcError::Protocol(format!("invalid getnetworkinfo result: {e}"))
            })?,
            Err(e) => {
                warn!(error = %e, "getnetworkinfo failed");
                NetworkInfoJson::default()
            }
        };
        Ok(ChainInfo::merge(chain, network))
    }

    async fn get_block_header(&self, hash: &BlockHash) -> Result<BlockHeader, CoreError> {
        let id = hash.to_string();
        let raw = self
            .call(&Command::GetBlockHeader { hash: &id })
            .await
            .map_err(|e| normalize_block_error(&id, e))?;
        Ok(header_from_json(&raw)?)
    }

    async fn get_block(&self, hash: Option<&BlockHash>, height: u32) -> Result<Block, CoreError> {
        let hash = match hash {
            Some(hash) => *hash,
            None => self.get_block_hash(height).await?,
        };
        if !self.parse_blocks {
            return self.get_block_full(&hash).await;
        }
        if height > 0 {
            return self.get_block_without_header(&hash, height).await;
        }
        let header = self.get_block_header(&hash).await?;
        let bytes = self.get_block_bytes(&hash).await?;
        let mut block = self.parser.parse_block(&bytes)?;
        block.header = BlockHeader {
            size: block.header.size,
            ..header
        };
        Ok(block)
    }

    async fn get_block_raw(&self, hash: &BlockHash) -> Result<String, CoreError> {
        match self.getblock(hash, 0).await? {
            Value::String(hex) => Ok(hex),
            other => Err(RpcError::Protocol(format!("getblock: expected hex, got {other}")).into()),
        }
    }

    async fn get_block_info(&self, hash: &BlockHash) -> Result<BlockInfo, CoreError> {
        let raw = self.getblock(hash, 1).await?;
        Ok(block_info_from_json(&raw)?)
    }

    async fn get_block_full(&self, hash: &BlockHash) -> Result<Block, CoreError> {
        let raw = self.getblock(hash, 2).await?;
        let header = header_from_json(&raw)?;
        let txs = raw
            .get("tx")
            .and_then(Value::as_array)
            .ok_or_else(|| ParseError::InvalidJson("block without tx array".into()))?
            .iter()
            .map(|tx| -> Result<Tx, ParseError> {
                let mut tx = self.parser.parse_tx_from_json(tx)?;
                tx.block_hash = header.hash;
                tx.block_time = Some(header.time);
                tx.time = Some(header.time);
                tx.confirmations = header.confirmations.and_then(|c| u32::try_from(c).ok());
                Ok(tx)
            })
            .collect::<Result<Vec<_>, ParseError>>()?;
        Ok(Block { header, txs })
    }

    async fn get_mempool_tx_ids(&self) -> Result<Vec<Txid>, CoreError> {
        let raw = self.call(&Command::GetRawMempool).await?;
        let ids = raw
            .as_array()
            .ok_or_else(|| RpcError::Protocol(format!("getrawmempool: expected array, got {raw}")))?;
        ids.iter()
            .map(|id| parse_txid(Some(id), "getrawmempool").map_err(CoreError::from))
            .collect()
    }

    async fn get_tx(&self, txid: &Txid) -> Result<Tx, CoreError> {
        let raw = self.getrawtransaction(txid, true).await?;
        Ok(self.parser.parse_tx_from_json(&raw)?)
    }

    async fn get_tx_for_mempool(&self, txid: &Txid) -> Result<Tx, CoreError> {
        let raw = self.getrawtransaction(txid, false).await?;
        self.tx_from_hex_result(raw)
    }

    async fn get_txs_for_mempool(&self, txids: &[Txid]) -> Result<Vec<Tx>, CoreError> {
        if txids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = txids.iter().map(Txid::to_string).collect();
        let cmds: Vec<Command<'_>> = ids
            .iter()
            .map(|id| Command::GetRawTransaction {
                txid: id,
                verbose: false,
            })
            .collect();

        // Chunks go out concurrently to avoid serial round-trip latency.
        let chunk_futures: Vec<_> = cmds
            .chunks(BATCH_CHUNK_SIZE)
            .map(|chunk| self.transport.batch(chunk))
            .collect();
        let results = match try_join_all(chunk_futures).await {
            Ok(chunks) => chunks.into_iter().flatten().collect::<Vec<_>>(),
            Err(batch_error) => {
                warn!(
                    tx_count = txids.len(),
                    error = %batch_error,
                    "batch getrawtransaction failed; falling back to sequential requests"
                );
                let mut sequential = Vec::with_capacity(txids.len());
                for txid in txids {
                    sequential.push(self.get_tx_for_mempool(txid).await?);
                }
                return Ok(sequential);
            }
        };

        txids
            .iter()
            .zip(results)
            .map(|(txid, result)| {
                let raw = result.map_err(|e| normalize_getrawtransaction_error(txid, e))?;
                self.tx_from_hex_result(raw)
            })
            .collect()
    }

    async fn get_raw_tx_json(&self, txid: &Txid) -> Result<Value, CoreError> {
        self.getrawtransaction(txid, true).await
    }

    async fn send_raw_tx(&self, hex: &str) -> Result<Txid, CoreError> {
        let txid = self.call_string(&Command::SendRawTransaction { hex }).await?;
        Ok(parse_txid(Some(&Value::String(txid)), "sendrawtransaction")?)
    }

    async fn get_mempool_entry(&self, txid: &Txid) -> Result<MempoolEntry, CoreError> {
        let id = txid.to_string();
        let raw = self.call(&Command::GetMempoolEntry { txid: &id }).await?;
        let entry: MempoolEntry = serde_json::from_value(raw)
            .map_err(|e| RpcError::Protocol(format!("invalid getmempoolentry result: {e}")))?;
        Ok(entry.normalize())
    }

    async fn estimate_fee(&self, blocks: u32) -> Result<Amount, CoreError> {
        if let Some(fee) = self.alternative_fee(blocks).await {
            return Ok(fee);
        }
        let result = self.call(&Command::EstimateFee { blocks }).await?;
        fee_rate(Some(&result), self.parser.policy().amount_decimals)
    }

    async fn estimate_smart_fee(
        &self,
        blocks: u32,
        conservative: bool,
    ) -> Result<Amount, CoreError> {
        if let Some(fee) = self.alternative_fee(blocks).await {
            return Ok(fee);
        }
        self.node_smart_fee(blocks, conservative).await
    }
}

impl HttpRpcClient {
    async fn alternative_fee(&self, blocks: u32) -> Option<Amount> {
        let provider = self.alternative_fees.as_ref()?;
        match provider.estimate_fee(blocks).await {
            Ok(fee) => Some(fee),
            Err(e) => {
                debug!(error = %e, fees.blocks = blocks, "using node fee estimate");
                None
            }
        }
    }
}

fn parse_block_hash(hash: &str) -> Result<BlockHash, CoreError> {
    hash.parse::<BlockHash>()
        .map_err(|e| RpcError::Protocol(format!("invalid block hash `{hash}`: {e}")).into())
}

// ==============================================================================
// RPC Error Normalization
// ==============================================================================

/// Map the node's "no such block" answers to `BlockNotFound`.
fn normalize_block_error(block: &str, err: RpcError) -> CoreError {
    match err {
        RpcError::Remote { ref message, .. } if is_block_not_found(message) => {
            RpcError::BlockNotFound(block.to_owned()).into()
        }
        other => other.into(),
    }
}

fn is_block_not_found(message: &str) -> bool {
    message == "Block not found" || message == "Block height out of range"
}

/// Map `getrawtransaction` code -5 (no such transaction) to `TxNotFound`.
fn normalize_getrawtransaction_error(txid: &Txid, err: RpcError) -> CoreError {
    match err {
        RpcError::Remote { code: -5, .. } => RpcError::TxNotFound(*txid).into(),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hashes::Hash;

    fn txid_1() -> Txid {
        Txid::from_slice(&[1; 32]).expect("static txid bytes must parse")
    }

    #[test]
    fn normalize_getrawtransaction_not_found_maps_to_typed_error() {
        let txid = txid_1();
        let err = RpcError::Remote {
            code: -5,
            message: "No such mempool or blockchain transaction".to_string(),
        };

        let mapped = normalize_getrawtransaction_error(&txid, err);
        assert!(matches!(mapped, CoreError::Rpc(RpcError::TxNotFound(found)) if found == txid));
    }

    #[test]
    fn normalize_getrawtransaction_other_server_error_preserved() {
        let txid = txid_1();
        let err = RpcError::Remote {
            code: -32603,
            message: "Internal error".to_string(),
        };

        let mapped = normalize_getrawtransaction_error(&txid, err);
        assert!(matches!(
            mapped,
            CoreError::Rpc(RpcError::Remote { code: -32603, .. })
        ));
    }

    #[test]
    fn block_not_found_messages() {
        for message in ["Block not found", "Block height out of range"] {
            let err = RpcError::Remote {
                code: -8,
                message: message.into(),
            };
            assert!(matches!(
                normalize_block_error("42", err),
                CoreError::Rpc(RpcError::BlockNotFound(block)) if block == "42"
            ));
        }
        let other = RpcError::Remote {
            code: -1,
            message: "block not found".into(),
        };
        assert!(matches!(
            normalize_block_error("42", other),
            CoreError::Rpc(RpcError::Remote { code: -1, .. })
        ));
    }

    #[test]
    fn node_fee_rates() {
        assert_eq!(fee_rate(None, 8).expect("missing"), Amount::ZERO);
        assert_eq!(
            fee_rate(Some(&serde_json::json!(-1)), 8).expect("negative"),
            Amount::ZERO
        );
        assert_eq!(
            fee_rate(Some(&serde_json::json!(0.00012)), 8).expect("valid"),
            Amount::from_sat(12_000)
        );
    }
}
