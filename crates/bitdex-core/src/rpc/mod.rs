//! Node JSON-RPC layer.
//!
//! Defines the [`BlockChainRpc`] trait and provides an HTTP JSON-RPC
//! implementation ([`HttpRpcClient`]) plus a test mock (`mock::MockRpc`).
//! Requests are marshalled per [`RpcDialect`]: positional arrays for older
//! nodes, named-parameter objects for current ones.

mod http_adapter;
#[cfg(test)]
pub mod mock;
pub mod types;

pub use http_adapter::{HttpRpcClient, NodeFeeEstimator};
pub(crate) use http_adapter::{parse_connection, resolve_auth};
pub use types::{ChainInfo, MempoolEntry};

use async_trait::async_trait;
use bitcoin::hex::FromHex;
use bitcoin::{Amount, BlockHash, Txid};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, ParseError};
use crate::types::{Block, BlockHeader, BlockInfo, Tx};

/// Parameter encoding understood by a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcDialect {
    /// Positional `params` array.
    V1,
    /// Named `params` object.
    #[default]
    V2,
}

/// Node methods the indexer consumes.
///
/// Fee values are amounts per 1000 virtual bytes in the chain's base unit.
#[async_trait]
pub trait BlockChainRpc: Send + Sync {
    async fn get_best_block_hash(&self) -> Result<BlockHash, CoreError>;

    async fn get_best_block_height(&self) -> Result<u32, CoreError>;

    async fn get_block_hash(&self, height: u32) -> Result<BlockHash, CoreError>;

    async fn get_chain_info(&self) -> Result<ChainInfo, CoreError>;

    async fn get_block_header(&self, hash: &BlockHash) -> Result<BlockHeader, CoreError>;

    /// Fetch a block by hash, or by height when `hash` is `None`.
    async fn get_block(&self, hash: Option<&BlockHash>, height: u32) -> Result<Block, CoreError>;

    /// Serialised block as hex.
    async fn get_block_raw(&self, hash: &BlockHash) -> Result<String, CoreError>;

    async fn get_block_bytes(&self, hash: &BlockHash) -> Result<Vec<u8>, CoreError> {
        let raw = self.get_block_raw(hash).await?;
        Vec::<u8>::from_hex(&raw).map_err(|e| ParseError::InvalidHex(format!("block: {e}")).into())
    }

    /// Header plus txids, without decoding transactions.
    async fn get_block_info(&self, hash: &BlockHash) -> Result<BlockInfo, CoreError>;

    /// Block with every transaction decoded by the node.
    async fn get_block_full(&self, hash: &BlockHash) -> Result<Block, CoreError>;

    async fn get_mempool_tx_ids(&self) -> Result<Vec<Txid>, CoreError>;

    /// Transaction decoded from the node's verbose JSON.
    async fn get_tx(&self, txid: &Txid) -> Result<Tx, CoreError>;

    /// Transaction decoded locally from its raw serialisation.
    async fn get_tx_for_mempool(&self, txid: &Txid) -> Result<Tx, CoreError>;

    /// Fetch many mempool transactions. Implementations may batch these
    /// requests into one or more RPC calls.
    async fn get_txs_for_mempool(&self, txids: &[Txid]) -> Result<Vec<Tx>, CoreError> {
        let mut results = Vec::with_capacity(txids.len());
        for txid in txids {
            results.push(self.get_tx_for_mempool(txid).await?);
        }
        Ok(results)
    }

    /// The node's verbose JSON for a transaction, unmodified.
    async fn get_raw_tx_json(&self, txid: &Txid) -> Result<Value, CoreError>;

    async fn send_raw_tx(&self, hex: &str) -> Result<Txid, CoreError>;

    async fn get_mempool_entry(&self, txid: &Txid) -> Result<MempoolEntry, CoreError>;

    async fn estimate_fee(&self, blocks: u32) -> Result<Amount, CoreError>;

    async fn estimate_smart_fee(&self, blocks: u32, conservative: bool)
        -> Result<Amount, CoreError>;
}

/// The node's own `estimatesmartfee`, bypassing any alternative provider.
#[async_trait]
pub trait SmartFeeEstimator: Send + Sync {
    async fn node_estimate_smart_fee(
        &self,
        blocks: u32,
        conservative: bool,
    ) -> Result<Amount, CoreError>;
}
