//! Shared test helpers for `bitdex-core` unit tests.
//!
//! Builders for dummy transactions so that tests across modules share one
//! source of truth for fixture data.

use bitcoin::hashes::Hash;
use bitcoin::{Amount, OutPoint, ScriptBuf, Txid};

use crate::types::{Tx, TxInput, TxOutput};

// ==============================================================================
// Txid Helpers
// ==============================================================================

/// Create a deterministic `Txid` from a single distinguishing byte.
pub fn txid_from_byte(b: u8) -> Txid {
    let mut bytes = [0u8; 32];
    bytes[0] = b;
    Txid::from_byte_array(bytes)
}

// ==============================================================================
// Transaction Builders
// ==============================================================================

/// Build a `Tx` with sane defaults. Override fields after construction
/// when needed.
pub fn tx_with(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Tx {
    Tx {
        txid: txid_from_byte(0xee),
        hex: String::new(),
        version: 2,
        lock_time: 0,
        vsize: None,
        inputs,
        outputs,
        block_hash: None,
        block_time: None,
        time: None,
        confirmations: None,
    }
}

/// An input spending output `vout` of the transaction named by `txid_byte`.
pub fn spend_input(txid_byte: u8, vout: u32, script_sig: ScriptBuf) -> TxInput {
    TxInput::spend(
        OutPoint::new(txid_from_byte(txid_byte), vout),
        script_sig,
        0xFFFF_FFFE,
    )
}

/// A P2WPKH output paying to a fixed key hash.
pub fn p2wpkh_output(n: u32, sats: u64) -> TxOutput {
    let mut script = vec![0x00, 0x14];
    script.extend(1u8..=20);
    TxOutput {
        value: Amount::from_sat(sats),
        n,
        script_pubkey: ScriptBuf::from_bytes(script),
        addresses: Vec::new(),
    }
}
