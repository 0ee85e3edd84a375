use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use tracing::debug;

use super::{ChainParams, ChainTag, Coin};
use crate::error::CoreError;

type Table = HashMap<u32, &'static ChainParams>;

fn table() -> &'static RwLock<Table> {
    static TABLE: OnceLock<RwLock<Table>> = OnceLock::new();
    TABLE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Register a parameter record under its network magic.
///
/// Registering an equal record twice is a no-op. A different chain on an
/// already taken magic is a [`CoreError::RegistrationConflict`].
pub fn register(params: &'static ChainParams) -> Result<(), CoreError> {
    let mut table = table().write().unwrap_or_else(PoisonError::into_inner);
    match table.get(&params.magic) {
        Some(existing) if **existing == *params => Ok(()),
        Some(existing) => Err(CoreError::RegistrationConflict {
            magic: params.magic,
            existing: existing.label(),
            attempted: params.label(),
        }),
        None => {
            debug!(
                chain.coin = %params.coin,
                chain.tag = %params.tag,
                chain.magic = params.magic,
                "registered chain parameters"
            );
            table.insert(params.magic, params);
            Ok(())
        }
    }
}

pub fn is_registered(params: &ChainParams) -> bool {
    table()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&params.magic)
        .is_some_and(|existing| **existing == *params)
}

/// Resolve the parameters of `coin` for a chain tag, registering the coin's
/// networks first. Unknown tags resolve to main.
pub fn lookup(coin: Coin, tag: &str) -> Result<&'static ChainParams, CoreError> {
    for params in coin.registered_networks() {
        register(params)?;
    }
    let tag = tag.parse::<ChainTag>().unwrap_or_else(|_| {
        debug!(chain.coin = %coin, chain.tag = tag, "unknown chain tag, using main");
        ChainTag::Main
    });
    Ok(coin.params(tag))
}

pub fn lookup_by_magic(magic: u32) -> Option<&'static ChainParams> {
    table()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&magic)
        .copied()
}

/// Forget every registration.
///
/// Test-only. Not safe to call while other threads look chains up: they may
/// observe a half-populated table.
#[doc(hidden)]
pub fn reset() {
    table()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}
