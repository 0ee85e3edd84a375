//! Core of a Bitcoin-family block indexer backend.
//!
//! Chain parameters and the registry live in [`chain`]; [`parser`] decodes
//! raw transactions and blocks into the shared model in [`types`] and packs
//! them for storage; [`xpub`] derives addresses from extended keys;
//! [`rpc`] talks to the coin's node and [`fees`] supplies alternative fee
//! estimates.

pub mod address;
pub mod chain;
pub mod config;
pub mod error;
pub mod fees;
pub mod pack;
pub mod parser;
pub mod rpc;
pub mod script;
pub mod types;
pub mod xpub;

#[cfg(test)]
mod test_util;

pub use address::{AddressCodec, AddressFormat};
pub use chain::{ChainParams, ChainTag, Coin};
pub use config::BackendConfig;
pub use error::CoreError;
pub use parser::Parser;
pub use rpc::{BlockChainRpc, HttpRpcClient, RpcDialect};
pub use types::{AddressDescriptor, Block, BlockHeader, ScriptType, Tx};
pub use xpub::{XpubDeriver, XpubDescriptor};
