//! RPC-specific types that do not belong to the shared domain model.
//!
//! Transactions and blocks are represented directly as [`Tx`] / [`Block`]
//! from `crate::types`; this module defines the structures specific to
//! other RPC methods and the helpers that read header JSON.
//!
//! [`Tx`]: crate::types::Tx
//! [`Block`]: crate::types::Block

use bitcoin::{BlockHash, Txid};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParseError;
use crate::parser::json::{
    parse_integer_optional, parse_integer_required, parse_opt_block_hash, parse_txid,
};
use crate::types::{BlockHeader, BlockHeight, BlockInfo};

// ==============================================================================
// Chain Info
// ==============================================================================

/// Node state merged from `getblockchaininfo` and `getnetworkinfo`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainInfo {
    pub chain: String,
    pub blocks: u32,
    pub headers: u32,
    pub best_block_hash: BlockHash,
    pub difficulty: f64,
    pub size_on_disk: u64,
    pub version: i64,
    pub subversion: String,
    pub protocol_version: i64,
    pub time_offset: i64,
    pub warnings: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BlockchainInfoJson {
    pub chain: String,
    pub blocks: u32,
    #[serde(default)]
    pub headers: u32,
    #[serde(rename = "bestblockhash")]
    pub best_block_hash: BlockHash,
    #[serde(default)]
    pub difficulty: f64,
    #[serde(default)]
    pub size_on_disk: u64,
    #[serde(default)]
    pub warnings: Value,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NetworkInfoJson {
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub subversion: String,
    #[serde(default, rename = "protocolversion")]
    pub protocol_version: i64,
    #[serde(default, rename = "timeoffset")]
    pub time_offset: i64,
    #[serde(default)]
    pub warnings: Value,
}

impl ChainInfo {
    pub(crate) fn merge(chain: BlockchainInfoJson, network: NetworkInfoJson) -> Self {
        let mut warnings = warnings_text(&chain.warnings);
        let network_warnings = warnings_text(&network.warnings);
        if warnings.is_empty() {
            warnings = network_warnings;
        } else if !network_warnings.is_empty() && network_warnings != warnings {
            warnings = format!("{warnings} {network_warnings}");
        }
        Self {
            chain: chain.chain,
            blocks: chain.blocks,
            headers: chain.headers,
            best_block_hash: chain.best_block_hash,
            difficulty: chain.difficulty,
            size_on_disk: chain.size_on_disk,
            version: network.version,
            subversion: network.subversion,
            protocol_version: network.protocol_version,
            time_offset: network.time_offset,
            warnings,
        }
    }
}

// Older nodes report a string, newer ones a list of strings.
fn warnings_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_owned(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    }
}

// ==============================================================================
// Mempool Entry
// ==============================================================================

/// `getmempoolentry` result. Fees are in the chain's display unit, as the
/// node reports them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MempoolEntry {
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub vsize: u32,
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub fee: f64,
    #[serde(default, rename = "modifiedfee")]
    pub modified_fee: f64,
    #[serde(default)]
    pub time: u64,
    #[serde(default)]
    pub height: u32,
    #[serde(default, rename = "descendantcount")]
    pub descendant_count: u32,
    #[serde(default, rename = "descendantsize")]
    pub descendant_size: u32,
    #[serde(default, rename = "descendantfees")]
    pub descendant_fees: u64,
    #[serde(default, rename = "ancestorcount")]
    pub ancestor_count: u32,
    #[serde(default, rename = "ancestorsize")]
    pub ancestor_size: u32,
    #[serde(default, rename = "ancestorfees")]
    pub ancestor_fees: u64,
    #[serde(default)]
    pub depends: Vec<Txid>,
    #[serde(default, rename = "bip125-replaceable")]
    pub bip125_replaceable: bool,
    /// Fee breakdown reported by nodes that dropped the top-level fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<MempoolEntryFees>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MempoolEntryFees {
    #[serde(default)]
    pub base: f64,
    #[serde(default)]
    pub modified: f64,
    #[serde(default)]
    pub ancestor: f64,
    #[serde(default)]
    pub descendant: f64,
}

impl MempoolEntry {
    /// Copy the `fees` breakdown into the flat fields when only the former
    /// was reported.
    pub(crate) fn normalize(mut self) -> Self {
        if let Some(fees) = &self.fees {
            if self.fee == 0.0 {
                self.fee = fees.base;
            }
            if self.modified_fee == 0.0 {
                self.modified_fee = fees.modified;
            }
        }
        self
    }
}

// ==============================================================================
// Header JSON
// ==============================================================================

/// Header fields shared by `getblockheader` and `getblock` (verbosity >= 1).
pub(crate) fn header_from_json(raw: &Value) -> Result<BlockHeader, ParseError> {
    Ok(BlockHeader {
        hash: parse_opt_block_hash(raw.get("hash"), "hash")?,
        prev_hash: parse_opt_block_hash(raw.get("previousblockhash"), "previousblockhash")?,
        next_hash: parse_opt_block_hash(raw.get("nextblockhash"), "nextblockhash")?,
        height: parse_integer_optional::<u32, false>(raw.get("height")).map(BlockHeight),
        confirmations: parse_integer_optional::<i64, true>(raw.get("confirmations")),
        size: parse_integer_optional::<usize, false>(raw.get("size")).unwrap_or(0),
        time: parse_integer_required::<i64, true>(raw.get("time"), "time")?,
    })
}

/// `getblock <hash> 1`. Entries of `tx` may be txids or, at verbosity 2,
/// objects carrying a `txid`.
pub(crate) fn block_info_from_json(raw: &Value) -> Result<BlockInfo, ParseError> {
    let txids = raw
        .get("tx")
        .and_then(Value::as_array)
        .map(|txs| {
            txs.iter()
                .map(|tx| match tx {
                    Value::String(_) => parse_txid(Some(tx), "tx"),
                    _ => parse_txid(tx.get("txid"), "tx.txid"),
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?
        .unwrap_or_default();

    Ok(BlockInfo {
        header: header_from_json(raw)?,
        version: parse_integer_optional::<i32, true>(raw.get("version")).unwrap_or(0),
        merkle_root: string_field(raw, "merkleroot"),
        nonce: parse_integer_optional::<u32, false>(raw.get("nonce")).unwrap_or(0),
        bits: string_field(raw, "bits"),
        difficulty: raw.get("difficulty").and_then(Value::as_f64).unwrap_or(0.0),
        txids,
    })
}

fn string_field(raw: &Value, field: &str) -> String {
    raw.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "000000000000000000029aed1a3eb8fc1e9fd8da32ec5aee4e6a6ac2ea5dc5ff";

    #[test]
    fn header_from_getblockheader() {
        let raw = serde_json::json!({
            "hash": HASH,
            "confirmations": 2,
            "height": 700_000,
            "time": 1_631_333_672,
            "previousblockhash": HASH,
        });
        let header = header_from_json(&raw).expect("valid header");
        assert_eq!(header.height, Some(BlockHeight(700_000)));
        assert_eq!(header.confirmations, Some(2));
        assert_eq!(header.next_hash, None);
        assert_eq!(header.size, 0);
        assert_eq!(header.time, 1_631_333_672);
    }

    #[test]
    fn block_info_accepts_both_tx_forms() {
        let txid = "1".repeat(64);
        let thin = serde_json::json!({"hash": HASH, "time": 1, "tx": [txid], "bits": "1d00ffff"});
        let full = serde_json::json!({"hash": HASH, "time": 1, "tx": [{"txid": txid}]});
        assert_eq!(
            block_info_from_json(&thin).expect("thin").txids,
            block_info_from_json(&full).expect("full").txids
        );
        assert_eq!(block_info_from_json(&thin).expect("thin").bits, "1d00ffff");
    }

    #[test]
    fn chain_info_merges_warning_forms() {
        let chain: BlockchainInfoJson = serde_json::from_value(serde_json::json!({
            "chain": "main",
            "blocks": 10,
            "headers": 12,
            "bestblockhash": HASH,
            "warnings": ["unknown rules activated"],
        }))
        .expect("blockchain info");
        let network: NetworkInfoJson = serde_json::from_value(serde_json::json!({
            "version": 270000,
            "subversion": "/Satoshi:27.0.0/",
            "protocolversion": 70016,
            "warnings": "",
        }))
        .expect("network info");
        let info = ChainInfo::merge(chain, network);
        assert_eq!(info.headers, 12);
        assert_eq!(info.subversion, "/Satoshi:27.0.0/");
        assert_eq!(info.warnings, "unknown rules activated");
    }

    #[test]
    fn mempool_entry_reads_fee_breakdown() {
        let entry: MempoolEntry = serde_json::from_value(serde_json::json!({
            "vsize": 141,
            "weight": 561,
            "time": 1_700_000_000,
            "height": 820_000,
            "depends": [],
            "bip125-replaceable": true,
            "fees": {"base": 0.00000282, "modified": 0.00000282, "ancestor": 0.00000282, "descendant": 0.00000282},
        }))
        .expect("mempool entry");
        let entry = entry.normalize();
        assert_eq!(entry.fee, 0.00000282);
        assert!(entry.bip125_replaceable);
        assert_eq!(entry.vsize, 141);
    }
}
