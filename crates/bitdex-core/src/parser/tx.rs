//! Transaction wire decoding for the Bitcoin, Zcash and PIVX sapling
//! serialisations.

use bitcoin::hashes::{sha256, sha256d, Hash};
use bitcoin::hex::DisplayHex;
use bitcoin::{Amount, OutPoint, ScriptBuf, Txid, Witness};

use super::wire::WireReader;
use crate::chain::{ChainPolicy, ScriptFlavour, TxFormat, TxidHash};
use crate::error::ParseError;
use crate::script::is_zerocoin_spend;
use crate::types::{Tx, TxInput, TxOutput};

const WITNESS_SCALE_FACTOR: u64 = 4;

/// Outpoint (36) + empty script (1) + sequence (4).
const MIN_INPUT_SIZE: usize = 41;
/// Value (8) + empty script (1).
const MIN_OUTPUT_SIZE: usize = 9;

/// Elements marks peg-in inputs with this bit of the prevout index.
const OUTPOINT_PEGIN_FLAG: u32 = 1 << 30;
const OUTPOINT_ISSUANCE_FLAG: u32 = 1 << 31;

// Shielded description sizes.
const SPROUT_JOINSPLIT_SIZE: usize = 1802;
const SAPLING_JOINSPLIT_SIZE: usize = 1698;
const SAPLING_SPEND_SIZE: usize = 384;
const SAPLING_OUTPUT_SIZE: usize = 948;
const JOINSPLIT_PUBKEY_SIZE: usize = 32;
const JOINSPLIT_SIG_SIZE: usize = 64;
const BINDING_SIG_SIZE: usize = 64;

/// Byte ranges of one decoded transaction, relative to the reader buffer.
struct Layout {
    start: usize,
    /// `(start, end)` of the inputs and outputs, between the segwit flag
    /// and the witness stacks.
    body: (usize, usize),
    /// Start of the lock time (and any chain-specific tail).
    lock_time_at: usize,
    end: usize,
    segwit: bool,
}

/// Decode one transaction at the reader's position.
///
/// The returned [`Tx`] carries the raw hex but no output addresses.
pub(crate) fn decode_tx(r: &mut WireReader<'_>, policy: &ChainPolicy) -> Result<Tx, ParseError> {
    let start = r.position();
    let header = r.read_u32_le("version")?;

    let (mut tx, layout) = match policy.tx_format {
        TxFormat::Bitcoin => decode_bitcoin(r, start, header, true, policy)?,
        TxFormat::PivxSapling => {
            let shielded = header & 0xffff >= 3;
            let (tx, mut layout) = decode_bitcoin(r, start, header, !shielded, policy)?;
            if shielded {
                skip_pivx_sapling(r)?;
                layout.end = r.position();
            }
            (tx, layout)
        }
        TxFormat::Zcash => decode_zcash(r, start, header, policy)?,
    };

    let full = r.since(layout.start);
    let stripped_len = if layout.segwit {
        4 + (layout.body.1 - layout.body.0) + (layout.end - layout.lock_time_at)
    } else {
        full.len()
    };

    tx.txid = match (policy.tx_format, layout.segwit) {
        (TxFormat::Bitcoin, true) => {
            let mut stripped = Vec::with_capacity(stripped_len);
            stripped.extend_from_slice(&full[..4]);
            stripped.extend_from_slice(&full[layout.body.0 - start..layout.body.1 - start]);
            stripped.extend_from_slice(&full[layout.lock_time_at - start..]);
            txid_of(policy.txid_hash, &stripped)
        }
        (TxFormat::Bitcoin, false) => txid_of(policy.txid_hash, full),
        (TxFormat::Zcash | TxFormat::PivxSapling, _) => txid_of(TxidHash::DoubleSha256, full),
    };

    if policy.supports_vsize {
        let weight = stripped_len as u64 * (WITNESS_SCALE_FACTOR - 1) + full.len() as u64;
        tx.vsize = Some(weight.div_ceil(WITNESS_SCALE_FACTOR));
    }
    tx.hex = full.to_lower_hex_string();
    Ok(tx)
}

fn txid_of(hash: TxidHash, bytes: &[u8]) -> Txid {
    match hash {
        TxidHash::DoubleSha256 => Txid::from_byte_array(sha256d::Hash::hash(bytes).to_byte_array()),
        TxidHash::Sha256 => Txid::from_byte_array(sha256::Hash::hash(bytes).to_byte_array()),
    }
}

fn empty_tx(version: i32) -> Tx {
    Tx {
        txid: Txid::all_zeros(),
        hex: String::new(),
        version,
        lock_time: 0,
        vsize: None,
        inputs: Vec::new(),
        outputs: Vec::new(),
        block_hash: None,
        block_time: None,
        time: None,
        confirmations: None,
    }
}

// ==============================================================================
// Bitcoin
// ==============================================================================

fn decode_bitcoin(
    r: &mut WireReader<'_>,
    start: usize,
    header: u32,
    allow_segwit: bool,
    policy: &ChainPolicy,
) -> Result<(Tx, Layout), ParseError> {
    let mut tx = empty_tx(header as i32);

    let mut segwit = false;
    if allow_segwit && r.peek_u8("input_count")? == 0 {
        r.read_u8("segwit_marker")?;
        let flag_at = r.position();
        let flag = r.read_u8("segwit_flag")?;
        if flag != 0x01 {
            return Err(ParseError::WitnessWithoutFlag {
                offset: flag_at,
                flag,
            });
        }
        segwit = true;
    }

    let body_start = r.position();
    let raw_inputs = read_inputs(r)?;
    tx.outputs = read_outputs(r)?;
    let body_end = r.position();

    let mut witnesses = Vec::new();
    if segwit {
        witnesses.reserve(raw_inputs.len());
        for _ in 0..raw_inputs.len() {
            witnesses.push(read_witness(r)?);
        }
    }

    let lock_time_at = r.position();
    tx.lock_time = r.read_u32_le("lock_time")?;
    tx.inputs = normalise_inputs(raw_inputs, witnesses, policy);

    Ok((
        tx,
        Layout {
            start,
            body: (body_start, body_end),
            lock_time_at,
            end: r.position(),
            segwit,
        },
    ))
}

struct RawInput {
    prev_hash: [u8; 32],
    prev_index: u32,
    script_sig: Vec<u8>,
    sequence: u32,
}

fn read_inputs(r: &mut WireReader<'_>) -> Result<Vec<RawInput>, ParseError> {
    let (count, hint) = r.read_count("input_count", MIN_INPUT_SIZE)?;
    let mut inputs = Vec::with_capacity(hint);
    for _ in 0..count {
        inputs.push(RawInput {
            prev_hash: r.read_array("prevout_txid")?,
            prev_index: r.read_u32_le("prevout_index")?,
            script_sig: r.read_var_bytes("script_sig")?.to_vec(),
            sequence: r.read_u32_le("sequence")?,
        });
    }
    Ok(inputs)
}

fn read_outputs(r: &mut WireReader<'_>) -> Result<Vec<TxOutput>, ParseError> {
    let (count, hint) = r.read_count("output_count", MIN_OUTPUT_SIZE)?;
    let mut outputs = Vec::with_capacity(hint);
    for n in 0..count {
        let value = r.read_u64_le("value")?;
        let script = r.read_var_bytes("script_pubkey")?;
        outputs.push(TxOutput {
            value: Amount::from_sat(value),
            n: n as u32,
            script_pubkey: ScriptBuf::from_bytes(script.to_vec()),
            addresses: Vec::new(),
        });
    }
    Ok(outputs)
}

fn read_witness(r: &mut WireReader<'_>) -> Result<Witness, ParseError> {
    let (count, hint) = r.read_count("witness_item_count", 1)?;
    let mut items = Vec::with_capacity(hint);
    for _ in 0..count {
        items.push(r.read_var_bytes("witness_item")?);
    }
    Ok(Witness::from_slice(&items))
}

fn normalise_inputs(
    raw: Vec<RawInput>,
    witnesses: Vec<Witness>,
    policy: &ChainPolicy,
) -> Vec<TxInput> {
    let coinbase = raw.len() == 1
        && raw[0].prev_index == u32::MAX
        && raw[0].prev_hash == [0u8; 32]
        && !(policy.script == ScriptFlavour::Zerocoin && is_zerocoin_spend(&raw[0].script_sig));

    let mut witnesses = witnesses.into_iter();
    raw.into_iter()
        .map(|input| {
            let witness = witnesses.next().unwrap_or_default();
            let script_sig = ScriptBuf::from_bytes(input.script_sig);
            if coinbase {
                let mut vin = TxInput::coinbase(script_sig, input.sequence);
                vin.witness = witness;
                return vin;
            }
            let txid = Txid::from_byte_array(input.prev_hash);
            let pegin = policy.script == ScriptFlavour::LiquidPegIn
                && input.prev_index != u32::MAX
                && input.prev_index & OUTPOINT_PEGIN_FLAG != 0;
            let vout = if policy.script == ScriptFlavour::LiquidPegIn && input.prev_index != u32::MAX
            {
                input.prev_index & !(OUTPOINT_PEGIN_FLAG | OUTPOINT_ISSUANCE_FLAG)
            } else {
                input.prev_index
            };
            let mut vin = TxInput::spend(OutPoint::new(txid, vout), script_sig, input.sequence);
            vin.witness = witness;
            if pegin {
                vin.addresses = vec![pegin_address(&txid, vout)];
            }
            vin
        })
        .collect()
}

/// Placeholder address of an input that claims a mainchain output.
pub fn pegin_address(txid: &Txid, vout: u32) -> String {
    format!("Bitcoin tx {txid}:{vout}")
}

// ==============================================================================
// Shielded tails
// ==============================================================================

/// Sapling data appended to PIVX transactions of version 3 and later.
fn skip_pivx_sapling(r: &mut WireReader<'_>) -> Result<(), ParseError> {
    // Optional marker byte plus the 8-byte value balance.
    r.skip(9, "sapling_value_balance")?;
    let spends = r.read_varint("sapling_spend_count")?;
    r.skip_records(spends, SAPLING_SPEND_SIZE, "sapling_spends")?;
    let outputs = r.read_varint("sapling_output_count")?;
    r.skip_records(outputs, SAPLING_OUTPUT_SIZE, "sapling_outputs")?;
    r.skip(BINDING_SIG_SIZE, "binding_sig")
}

fn decode_zcash(
    r: &mut WireReader<'_>,
    start: usize,
    header: u32,
    policy: &ChainPolicy,
) -> Result<(Tx, Layout), ParseError> {
    let overwintered = header & 0x8000_0000 != 0;
    let version = header & 0x7fff_ffff;
    if overwintered {
        r.skip(4, "version_group_id")?;
    }

    let mut tx = empty_tx(version as i32);
    let body_start = r.position();
    let raw_inputs = read_inputs(r)?;
    tx.outputs = read_outputs(r)?;
    let body_end = r.position();
    let lock_time_at = r.position();
    tx.lock_time = r.read_u32_le("lock_time")?;
    tx.inputs = normalise_inputs(raw_inputs, Vec::new(), policy);

    if overwintered && version >= 3 {
        r.skip(4, "expiry_height")?;
    }

    let sapling = overwintered && version >= 4;
    let mut shielded_count = 0;
    if sapling {
        r.skip(8, "value_balance")?;
        let spends = r.read_varint("shielded_spend_count")?;
        r.skip_records(spends, SAPLING_SPEND_SIZE, "shielded_spends")?;
        let outputs = r.read_varint("shielded_output_count")?;
        r.skip_records(outputs, SAPLING_OUTPUT_SIZE, "shielded_outputs")?;
        shielded_count = spends.saturating_add(outputs);
    }

    if version >= 2 {
        let joinsplits = r.read_varint("joinsplit_count")?;
        let size = if sapling {
            SAPLING_JOINSPLIT_SIZE
        } else {
            SPROUT_JOINSPLIT_SIZE
        };
        r.skip_records(joinsplits, size, "joinsplits")?;
        if joinsplits > 0 {
            r.skip(JOINSPLIT_PUBKEY_SIZE, "joinsplit_pubkey")?;
            r.skip(JOINSPLIT_SIG_SIZE, "joinsplit_sig")?;
        }
    }

    if sapling && shielded_count > 0 {
        r.skip(BINDING_SIG_SIZE, "binding_sig")?;
    }

    Ok((
        tx,
        Layout {
            start,
            body: (body_start, body_end),
            lock_time_at,
            end: r.position(),
            segwit: false,
        },
    ))
}
