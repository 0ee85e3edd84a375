//! Normalised transaction and block model shared by the parser, the packed
//! codec and the RPC client.
//!
//! Also holds the address descriptor newtype (the canonical output script
//! used as the indexing key for an address) and the script classification
//! enum.

use std::fmt;

use bitcoin::hex::{DisplayHex, FromHex};
use bitcoin::{Amount, BlockHash, OutPoint, Script, ScriptBuf, Txid, Witness};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

// ==============================================================================
// Script Type Classification
// ==============================================================================

/// Output script family as seen by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptType {
    P2pk,
    P2pkh,
    P2sh,
    P2wpkh,
    P2wsh,
    P2tr,
    BareMultisig,
    OpReturn,
    ZerocoinMint,
    ZerocoinSpend,
    Unknown,
}

impl ScriptType {
    /// Families whose single address is the natural owner of the output.
    /// Taproot outputs get an address but are not searchable.
    pub fn is_searchable(self) -> bool {
        matches!(self, Self::P2pkh | Self::P2sh | Self::P2wpkh | Self::P2wsh)
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::P2pk => write!(f, "p2pk"),
            Self::P2pkh => write!(f, "p2pkh"),
            Self::P2sh => write!(f, "p2sh"),
            Self::P2wpkh => write!(f, "p2wpkh"),
            Self::P2wsh => write!(f, "p2wsh"),
            Self::P2tr => write!(f, "p2tr"),
            Self::BareMultisig => write!(f, "bare_multisig"),
            Self::OpReturn => write!(f, "op_return"),
            Self::ZerocoinMint => write!(f, "zerocoin_mint"),
            Self::ZerocoinSpend => write!(f, "zerocoin_spend"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

// ==============================================================================
// Address Descriptor
// ==============================================================================

/// Canonical output script of an address. Two addresses are the same
/// indexing identity iff their descriptors are byte-equal.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AddressDescriptor(Vec<u8>);

impl AddressDescriptor {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, ParseError> {
        Vec::<u8>::from_hex(s)
            .map(Self)
            .map_err(|e| ParseError::InvalidHex(e.to_string()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_script(&self) -> &Script {
        Script::from_bytes(&self.0)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<ScriptBuf> for AddressDescriptor {
    fn from(script: ScriptBuf) -> Self {
        Self(script.into_bytes())
    }
}

impl fmt::Display for AddressDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_hex())
    }
}

impl fmt::Debug for AddressDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AddressDescriptor({})", self.0.as_hex())
    }
}

// ==============================================================================
// Block Height
// ==============================================================================

/// A block height, wrapped for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHeight(pub u32);

impl From<u32> for BlockHeight {
    fn from(h: u32) -> Self {
        Self(h)
    }
}

impl From<BlockHeight> for u32 {
    fn from(h: BlockHeight) -> Self {
        h.0
    }
}

impl std::ops::Deref for BlockHeight {
    type Target = u32;
    fn deref(&self) -> &u32 {
        &self.0
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ==============================================================================
// Transaction Types
// ==============================================================================

/// A normalised transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tx {
    pub txid: Txid,
    /// Raw serialisation as lowercase hex. Empty when the transaction came
    /// from a source that does not carry it.
    pub hex: String,
    pub version: i32,
    pub lock_time: u32,
    /// Weight-derived virtual size, for chains that report one.
    pub vsize: Option<u64>,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub block_hash: Option<BlockHash>,
    pub block_time: Option<i64>,
    pub time: Option<i64>,
    pub confirmations: Option<u32>,
}

impl Tx {
    /// A coinbase transaction has exactly one input without a prevout.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prevout.is_none()
    }

    pub fn raw_bytes(&self) -> Result<Vec<u8>, ParseError> {
        Vec::<u8>::from_hex(&self.hex).map_err(|e| ParseError::InvalidHex(e.to_string()))
    }
}

/// A transaction input. For coinbase inputs `prevout` is `None` and
/// `script_sig` holds the coinbase script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub prevout: Option<OutPoint>,
    pub script_sig: ScriptBuf,
    pub sequence: u32,
    #[serde(default, skip_serializing_if = "Witness::is_empty")]
    pub witness: Witness,
    /// Addresses known without resolving the prevout (peg-in placeholders).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<String>,
}

impl TxInput {
    pub fn coinbase(script: ScriptBuf, sequence: u32) -> Self {
        Self {
            prevout: None,
            script_sig: script,
            sequence,
            witness: Witness::default(),
            addresses: Vec::new(),
        }
    }

    pub fn spend(prevout: OutPoint, script_sig: ScriptBuf, sequence: u32) -> Self {
        Self {
            prevout: Some(prevout),
            script_sig,
            sequence,
            witness: Witness::default(),
            addresses: Vec::new(),
        }
    }
}

/// A transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: Amount,
    pub n: u32,
    pub script_pubkey: ScriptBuf,
    /// Decoded addresses; empty when not requested or not derivable.
    #[serde(default)]
    pub addresses: Vec<String>,
}

// ==============================================================================
// Blocks
// ==============================================================================

/// Block header metadata. Hash, height and neighbours are filled in from RPC
/// metadata when the block came from raw bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub hash: Option<BlockHash>,
    pub prev_hash: Option<BlockHash>,
    pub next_hash: Option<BlockHash>,
    pub height: Option<BlockHeight>,
    pub confirmations: Option<i64>,
    pub size: usize,
    pub time: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub txs: Vec<Tx>,
}

/// Header plus the ordered txids of a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub header: BlockHeader,
    pub version: i32,
    pub merkle_root: String,
    pub nonce: u32,
    pub bits: String,
    pub difficulty: f64,
    pub txids: Vec<Txid>,
}
