use std::time::SystemTime;

use bitcoin::Txid;

/// Top-level error for everything the core exposes.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error(transparent)]
    Fee(#[from] FeeError),
    #[error(
        "chain registration conflict on network magic {magic:#010x}: {existing} already registered, cannot register {attempted}"
    )]
    RegistrationConflict {
        magic: u32,
        existing: String,
        attempted: String,
    },
    #[error("unknown chain: {0}")]
    UnknownChain(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures converting between textual addresses and output scripts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("unknown address format")]
    UnknownFormat,
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("address checksum mismatch")]
    ChecksumMismatch,
    #[error("unsupported witness version {0}")]
    UnsupportedWitnessVersion(u8),
    #[error("script has no address form")]
    UnsupportedScript,
}

/// Wire-format decoding failures. Offsets are relative to the start of the
/// buffer handed to the parser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("truncated stream at offset {offset} reading {field} ({needed} bytes needed)")]
    TruncatedStream {
        offset: usize,
        field: &'static str,
        needed: usize,
    },
    #[error("invalid varint at offset {offset} reading {field}")]
    InvalidVarInt { offset: usize, field: &'static str },
    #[error("segwit marker without flag at offset {offset} (flag byte {flag:#04x})")]
    WitnessWithoutFlag { offset: usize, flag: u8 },
    #[error("bad auxpow at offset {offset}: {reason}")]
    BadAuxpow { offset: usize, reason: String },
    #[error("block at offset {offset} declares {count} transactions, more than a block can hold")]
    TooManyTransactions { offset: usize, count: u64 },
    #[error("unknown script")]
    UnknownScript,
    #[error("{remaining} trailing bytes after transaction at offset {offset}")]
    TrailingBytes { offset: usize, remaining: usize },
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("invalid packed transaction: {0}")]
    InvalidPacked(String),
    #[error("invalid transaction JSON: {0}")]
    InvalidJson(String),
}

/// Descriptor / extended key failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("descriptor kind {0} is not supported")]
    UnsupportedKind(String),
    #[error("extended key checksum mismatch")]
    ChecksumMismatch,
    #[error("hardened child {0} requested from an extended public key")]
    HardenedChildRequested(u32),
    #[error("derivation overflow: range {from}..{to} is empty or out of bounds")]
    DerivationOverflow { from: u32, to: u32 },
    #[error("taproot tweak is not below the curve order")]
    InvalidTweak,
    #[error("extended key error: {0}")]
    Key(String),
}

/// Errors returned by the node RPC client.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("block not found: {0}")]
    BlockNotFound(String),
    #[error("transaction not found: {0}")]
    TxNotFound(Txid),
    #[error("RPC transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("RPC protocol error: {0}")]
    Protocol(String),
    #[error("RPC error {code}: {message}")]
    Remote { code: i64, message: String },
    #[error("JSON-RPC batch response missing id {id}")]
    MissingBatchItem { id: u64 },
}

/// Alternative fee provider failures. All of them make the RPC client fall
/// back to the node's own estimator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FeeError {
    #[error("alternative fee provider: no fees")]
    NoFeesYet,
    #[error("alternative fee provider: missing recent value, last sync at {last_sync_at:?}")]
    Stale { last_sync_at: SystemTime },
    #[error("fee download failed: {0}")]
    Fetch(String),
    #[error("invalid fee data: {0}")]
    InvalidData(String),
    #[error("invalid fee provider config: {0}")]
    InvalidConfig(String),
}
