//! Native JSON-RPC client for Bitcoin-family nodes.
//!
//! Implements [`BlockChainRpc`] over JSON-RPC using `reqwest`, with support
//! for both parameter dialects, optional request rate limiting, batched
//! mempool fetches, basic auth and an optional alternative fee provider.
//!
//! [`BlockChainRpc`]: super::BlockChainRpc

mod client;
mod command;
mod connection;
mod protocol;

pub use client::{HttpRpcClient, NodeFeeEstimator};
pub(crate) use connection::{parse_connection, resolve_auth};
