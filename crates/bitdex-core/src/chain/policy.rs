use serde::{Deserialize, Serialize};

use crate::rpc::RpcDialect;

/// How output scripts are turned into addresses on a coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptFlavour {
    Standard,
    /// Recognises `OP_ZEROCOINMINT` / `OP_ZEROCOINSPEND` scripts.
    Zerocoin,
    /// Renders addresses as cashaddr and indexes P2PK under P2PKH.
    CashAddr,
    /// Labels peg-in inputs with the mainchain outpoint they claim.
    LiquidPegIn,
}

/// What follows the 80-byte header in a serialised block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockEnvelope {
    Plain,
    /// Merged-mining proof, present when header version bit 8 is set.
    AuxPow,
    /// 32-byte accumulator checkpoint, present when header version > 1.
    AccumulatorCheckpoint,
    /// 32-byte accumulator checkpoint for header versions 4 to 6, 32-byte
    /// final sapling root from version 8 on.
    SaplingCheckpoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxFormat {
    Bitcoin,
    /// Overwinter/Sapling style tails after the lock time.
    Zcash,
    /// Bitcoin wire format plus a sapling tail when `version & 0xffff >= 3`.
    PivxSapling,
}

/// Hash used to compute the transaction id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxidHash {
    /// Double SHA-256 of the witness-stripped serialisation.
    DoubleSha256,
    /// Single SHA-256 of the witness-stripped serialisation.
    Sha256,
}

/// On-disk representation of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackPolicy {
    /// `[u32 BE height][VLQ block time][raw wire bytes]`.
    RawWire,
    /// Protobuf record with decoded addresses.
    Envelope,
}

/// Per-coin behaviour that the shared algorithms dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainPolicy {
    pub script: ScriptFlavour,
    pub block: BlockEnvelope,
    pub tx_format: TxFormat,
    pub txid_hash: TxidHash,
    pub pack: PackPolicy,
    pub supports_vsize: bool,
    /// Decimal places between the display unit and the base unit.
    pub amount_decimals: u32,
    pub rpc_dialect: RpcDialect,
}

impl ChainPolicy {
    pub const BITCOIN: ChainPolicy = ChainPolicy {
        script: ScriptFlavour::Standard,
        block: BlockEnvelope::Plain,
        tx_format: TxFormat::Bitcoin,
        txid_hash: TxidHash::DoubleSha256,
        pack: PackPolicy::RawWire,
        supports_vsize: true,
        amount_decimals: 8,
        rpc_dialect: RpcDialect::V2,
    };

    /// Legacy forks without segwit.
    pub const LEGACY: ChainPolicy = ChainPolicy {
        supports_vsize: false,
        ..Self::BITCOIN
    };
}
