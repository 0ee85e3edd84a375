use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bitcoin::hashes::Hash;
use bitcoin::hex::DisplayHex;
use bitcoin::{Amount, BlockHash, Txid};
use serde_json::Value;

use crate::error::{CoreError, RpcError};
use crate::types::{Block, BlockHeader, BlockInfo, Tx};

use super::types::{ChainInfo, MempoolEntry};
use super::{BlockChainRpc, SmartFeeEstimator};

/// A mock node for testing. Returns canned blocks, transactions and fee
/// rates populated via the builder pattern.
pub struct MockRpc {
    blocks: Vec<(BlockHash, Block, Vec<u8>)>,
    transactions: HashMap<Txid, Tx>,
    mempool: Vec<Txid>,
    smart_fees: HashMap<(u32, bool), Amount>,
    chain_info: ChainInfo,
    fee_calls: AtomicUsize,
}

impl MockRpc {
    pub fn builder() -> MockRpcBuilder {
        MockRpcBuilder {
            blocks: Vec::new(),
            transactions: HashMap::new(),
            mempool: Vec::new(),
            smart_fees: HashMap::new(),
            chain_info: ChainInfo {
                chain: "regtest".into(),
                blocks: 0,
                headers: 0,
                best_block_hash: BlockHash::all_zeros(),
                difficulty: 0.0,
                size_on_disk: 0,
                version: 0,
                subversion: String::new(),
                protocol_version: 0,
                time_offset: 0,
                warnings: String::new(),
            },
        }
    }

    /// Number of `estimatesmartfee` calls answered so far.
    pub fn fee_calls(&self) -> usize {
        self.fee_calls.load(Ordering::Relaxed)
    }

    fn block(&self, hash: &BlockHash) -> Result<&(BlockHash, Block, Vec<u8>), CoreError> {
        self.blocks
            .iter()
            .find(|(h, _, _)| h == hash)
            .ok_or_else(|| RpcError::BlockNotFound(hash.to_string()).into())
    }

    fn tx(&self, txid: &Txid) -> Result<&Tx, CoreError> {
        self.transactions
            .get(txid)
            .ok_or_else(|| RpcError::TxNotFound(*txid).into())
    }
}

pub struct MockRpcBuilder {
    blocks: Vec<(BlockHash, Block, Vec<u8>)>,
    transactions: HashMap<Txid, Tx>,
    mempool: Vec<Txid>,
    smart_fees: HashMap<(u32, bool), Amount>,
    chain_info: ChainInfo,
}

impl MockRpcBuilder {
    /// Append a block at the next height. `raw` is what `getblock <hash> 0`
    /// returns.
    pub fn with_block(mut self, hash: BlockHash, mut block: Block, raw: Vec<u8>) -> Self {
        block.header.hash = Some(hash);
        block.header.height = Some((self.blocks.len() as u32).into());
        for tx in &block.txs {
            self.transactions.insert(tx.txid, tx.clone());
        }
        self.blocks.push((hash, block, raw));
        self
    }

    pub fn with_mempool_tx(mut self, tx: Tx) -> Self {
        self.mempool.push(tx.txid);
        self.transactions.insert(tx.txid, tx);
        self
    }

    pub fn with_smart_fee(mut self, blocks: u32, conservative: bool, fee: Amount) -> Self {
        self.smart_fees.insert((blocks, conservative), fee);
        self
    }

    pub fn with_chain_info(mut self, info: ChainInfo) -> Self {
        self.chain_info = info;
        self
    }

    pub fn build(mut self) -> MockRpc {
        if let Some((hash, _, _)) = self.blocks.last() {
            self.chain_info.best_block_hash = *hash;
            self.chain_info.blocks = self.blocks.len() as u32 - 1;
            self.chain_info.headers = self.chain_info.blocks;
        }
        MockRpc {
            blocks: self.blocks,
            transactions: self.transactions,
            mempool: self.mempool,
            smart_fees: self.smart_fees,
            chain_info: self.chain_info,
            fee_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BlockChainRpc for MockRpc {
    async fn get_best_block_hash(&self) -> Result<BlockHash, CoreError> {
        Ok(self.chain_info.best_block_hash)
    }

    async fn get_best_block_height(&self) -> Result<u32, CoreError> {
        Ok(self.chain_info.blocks)
    }

    async fn get_block_hash(&self, height: u32) -> Result<BlockHash, CoreError> {
        self.blocks
            .get(height as usize)
            .map(|(hash, _, _)| *hash)
            .ok_or_else(|| RpcError::BlockNotFound(height.to_string()).into())
    }

    async fn get_chain_info(&self) -> Result<ChainInfo, CoreError> {
        Ok(self.chain_info.clone())
    }

    async fn get_block_header(&self, hash: &BlockHash) -> Result<BlockHeader, CoreError> {
        Ok(self.block(hash)?.1.header.clone())
    }

    async fn get_block(&self, hash: Option<&BlockHash>, height: u32) -> Result<Block, CoreError> {
        let hash = match hash {
            Some(hash) => *hash,
            None => self.get_block_hash(height).await?,
        };
        Ok(self.block(&hash)?.1.clone())
    }

    async fn get_block_raw(&self, hash: &BlockHash) -> Result<String, CoreError> {
        Ok(self.block(hash)?.2.to_lower_hex_string())
    }

    async fn get_block_info(&self, hash: &BlockHash) -> Result<BlockInfo, CoreError> {
        let (_, block, _) = self.block(hash)?;
        Ok(BlockInfo {
            header: block.header.clone(),
            version: 1,
            merkle_root: String::new(),
            nonce: 0,
            bits: String::new(),
            difficulty: 0.0,
            txids: block.txs.iter().map(|tx| tx.txid).collect(),
        })
    }

    async fn get_block_full(&self, hash: &BlockHash) -> Result<Block, CoreError> {
        Ok(self.block(hash)?.1.clone())
    }

    async fn get_mempool_tx_ids(&self) -> Result<Vec<Txid>, CoreError> {
        Ok(self.mempool.clone())
    }

    async fn get_tx(&self, txid: &Txid) -> Result<Tx, CoreError> {
        self.tx(txid).cloned()
    }

    async fn get_tx_for_mempool(&self, txid: &Txid) -> Result<Tx, CoreError> {
        self.tx(txid).cloned()
    }

    async fn get_raw_tx_json(&self, txid: &Txid) -> Result<Value, CoreError> {
        let tx = self.tx(txid)?;
        serde_json::to_value(tx).map_err(|e| RpcError::Protocol(e.to_string()).into())
    }

    async fn send_raw_tx(&self, _hex: &str) -> Result<Txid, CoreError> {
        Err(RpcError::Remote {
            code: -26,
            message: "mock node does not relay".into(),
        }
        .into())
    }

    async fn get_mempool_entry(&self, txid: &Txid) -> Result<MempoolEntry, CoreError> {
        let tx = self.tx(txid)?;
        Ok(MempoolEntry {
            vsize: tx.vsize.unwrap_or_default() as u32,
            time: tx.time.unwrap_or_default() as u64,
            ..MempoolEntry::default()
        })
    }

    async fn estimate_fee(&self, blocks: u32) -> Result<Amount, CoreError> {
        self.node_estimate_smart_fee(blocks, true).await
    }

    async fn estimate_smart_fee(
        &self,
        blocks: u32,
        conservative: bool,
    ) -> Result<Amount, CoreError> {
        self.node_estimate_smart_fee(blocks, conservative).await
    }
}

#[async_trait]
impl SmartFeeEstimator for MockRpc {
    async fn node_estimate_smart_fee(
        &self,
        blocks: u32,
        conservative: bool,
    ) -> Result<Amount, CoreError> {
        self.fee_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .smart_fees
            .get(&(blocks, conservative))
            .copied()
            .unwrap_or(Amount::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{p2wpkh_output, spend_input, tx_with, txid_from_byte};

    fn hash(b: u8) -> BlockHash {
        BlockHash::from_byte_array([b; 32])
    }

    fn block_with(txs: Vec<Tx>) -> Block {
        Block {
            header: BlockHeader::default(),
            txs,
        }
    }

    #[tokio::test]
    async fn blocks_are_numbered_in_insertion_order() {
        let rpc = MockRpc::builder()
            .with_block(hash(1), block_with(Vec::new()), vec![0x01])
            .with_block(hash(2), block_with(Vec::new()), vec![0x02, 0x03])
            .build();
        assert_eq!(rpc.get_best_block_height().await.expect("height"), 1);
        assert_eq!(rpc.get_best_block_hash().await.expect("hash"), hash(2));
        let block = rpc.get_block(None, 1).await.expect("block 1");
        assert_eq!(block.header.hash, Some(hash(2)));
        assert_eq!(rpc.get_block_bytes(&hash(2)).await.expect("raw"), [2, 3]);
        assert!(matches!(
            rpc.get_block_hash(7).await,
            Err(CoreError::Rpc(RpcError::BlockNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn block_transactions_are_retrievable() {
        let mut tx = tx_with(
            vec![spend_input(3, 0, Default::default())],
            vec![p2wpkh_output(0, 1_000)],
        );
        tx.txid = txid_from_byte(9);
        let rpc = MockRpc::builder()
            .with_block(hash(1), block_with(vec![tx.clone()]), Vec::new())
            .build();
        assert_eq!(rpc.get_tx(&tx.txid).await.expect("known"), tx);
        let info = rpc.get_block_info(&hash(1)).await.expect("info");
        assert_eq!(info.txids, [tx.txid]);
        assert!(matches!(
            rpc.get_tx(&txid_from_byte(1)).await,
            Err(CoreError::Rpc(RpcError::TxNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn default_batch_fetch_is_sequential() {
        let mut a = tx_with(Vec::new(), Vec::new());
        a.txid = txid_from_byte(1);
        let mut b = a.clone();
        b.txid = txid_from_byte(2);
        let rpc = MockRpc::builder()
            .with_mempool_tx(a.clone())
            .with_mempool_tx(b.clone())
            .build();
        let ids = rpc.get_mempool_tx_ids().await.expect("mempool");
        let txs = rpc.get_txs_for_mempool(&ids).await.expect("batch");
        assert_eq!(txs, [a, b]);
    }

    #[tokio::test]
    async fn smart_fees_are_counted() {
        let rpc = MockRpc::builder()
            .with_smart_fee(2, true, Amount::from_sat(12_000))
            .build();
        assert_eq!(
            rpc.estimate_smart_fee(2, true).await.expect("fee"),
            Amount::from_sat(12_000)
        );
        assert_eq!(
            rpc.estimate_smart_fee(2, false).await.expect("fee"),
            Amount::ZERO
        );
        assert_eq!(rpc.fee_calls(), 2);
    }
}
