//! Protobuf storage record for chains whose transactions are stored with
//! their decoded addresses.
//!
//! Tag numbers and field types are part of the on-disk format.

use bitcoin::hex::{DisplayHex, FromHex};
use bitcoin::{Amount, OutPoint, ScriptBuf, Txid};
use prost::Message;

use crate::error::ParseError;
use crate::types::{Tx, TxInput, TxOutput};

#[derive(Clone, PartialEq, Message)]
pub(crate) struct PackedTx {
    /// Txid bytes in display order.
    #[prost(bytes = "vec", tag = "1")]
    pub txid: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub hex: Vec<u8>,
    #[prost(uint64, tag = "3")]
    pub blocktime: u64,
    #[prost(uint32, tag = "4")]
    pub locktime: u32,
    #[prost(uint32, tag = "5")]
    pub height: u32,
    #[prost(message, repeated, tag = "6")]
    pub vin: Vec<PackedVin>,
    #[prost(message, repeated, tag = "7")]
    pub vout: Vec<PackedVout>,
    #[prost(int32, tag = "8")]
    pub version: i32,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct PackedVin {
    /// Coinbase script as hex; empty for regular inputs.
    #[prost(string, tag = "1")]
    pub coinbase: String,
    #[prost(bytes = "vec", tag = "2")]
    pub txid: Vec<u8>,
    #[prost(uint32, tag = "3")]
    pub vout: u32,
    #[prost(bytes = "vec", tag = "4")]
    pub script_sig_hex: Vec<u8>,
    #[prost(uint32, tag = "5")]
    pub sequence: u32,
    #[prost(string, repeated, tag = "6")]
    pub addresses: Vec<String>,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct PackedVout {
    /// Big-endian value with leading zero bytes removed.
    #[prost(bytes = "vec", tag = "1")]
    pub value_sat: Vec<u8>,
    #[prost(uint32, tag = "2")]
    pub n: u32,
    #[prost(bytes = "vec", tag = "3")]
    pub script_pub_key_hex: Vec<u8>,
    #[prost(string, repeated, tag = "4")]
    pub addresses: Vec<String>,
}

pub(crate) fn pack(tx: &Tx, height: u32, block_time: i64) -> Result<Vec<u8>, ParseError> {
    let record = PackedTx {
        txid: txid_bytes(&tx.txid)?,
        hex: tx.raw_bytes()?,
        blocktime: block_time as u64,
        locktime: tx.lock_time,
        height,
        vin: tx
            .inputs
            .iter()
            .map(pack_input)
            .collect::<Result<_, _>>()?,
        vout: tx.outputs.iter().map(pack_output).collect(),
        version: tx.version,
    };
    Ok(record.encode_to_vec())
}

pub(crate) fn unpack(buf: &[u8]) -> Result<(Tx, u32), ParseError> {
    let record = PackedTx::decode(buf).map_err(|e| ParseError::InvalidPacked(e.to_string()))?;
    let block_time = record.blocktime as i64;
    let tx = Tx {
        txid: txid_from_bytes(&record.txid)?,
        hex: record.hex.to_lower_hex_string(),
        version: record.version,
        lock_time: record.locktime,
        vsize: None,
        inputs: record
            .vin
            .into_iter()
            .map(unpack_input)
            .collect::<Result<_, _>>()?,
        outputs: record
            .vout
            .into_iter()
            .map(unpack_output)
            .collect::<Result<_, _>>()?,
        block_hash: None,
        block_time: Some(block_time),
        time: Some(block_time),
        confirmations: None,
    };
    Ok((tx, record.height))
}

// ==============================================================================
// Field Conversions
// ==============================================================================

fn txid_bytes(txid: &Txid) -> Result<Vec<u8>, ParseError> {
    Vec::<u8>::from_hex(&txid.to_string()).map_err(|e| ParseError::InvalidHex(e.to_string()))
}

fn txid_from_bytes(bytes: &[u8]) -> Result<Txid, ParseError> {
    bytes
        .to_lower_hex_string()
        .parse()
        .map_err(|e| ParseError::InvalidPacked(format!("txid: {e}")))
}

fn pack_input(input: &TxInput) -> Result<PackedVin, ParseError> {
    let packed = match input.prevout {
        None => PackedVin {
            coinbase: input.script_sig.as_bytes().to_lower_hex_string(),
            sequence: input.sequence,
            addresses: input.addresses.clone(),
            ..PackedVin::default()
        },
        Some(prevout) => PackedVin {
            coinbase: String::new(),
            txid: txid_bytes(&prevout.txid)?,
            vout: prevout.vout,
            script_sig_hex: input.script_sig.to_bytes(),
            sequence: input.sequence,
            addresses: input.addresses.clone(),
        },
    };
    Ok(packed)
}

fn unpack_input(vin: PackedVin) -> Result<TxInput, ParseError> {
    let mut input = if vin.txid.is_empty() {
        let script = Vec::<u8>::from_hex(&vin.coinbase)
            .map_err(|e| ParseError::InvalidPacked(format!("coinbase: {e}")))?;
        TxInput::coinbase(ScriptBuf::from_bytes(script), vin.sequence)
    } else {
        TxInput::spend(
            OutPoint::new(txid_from_bytes(&vin.txid)?, vin.vout),
            ScriptBuf::from_bytes(vin.script_sig_hex),
            vin.sequence,
        )
    };
    input.addresses = vin.addresses;
    Ok(input)
}

fn pack_output(output: &TxOutput) -> PackedVout {
    let value = output.value.to_sat().to_be_bytes();
    let leading = value.iter().take_while(|b| **b == 0).count();
    PackedVout {
        value_sat: value[leading..].to_vec(),
        n: output.n,
        script_pub_key_hex: output.script_pubkey.to_bytes(),
        addresses: output.addresses.clone(),
    }
}

fn unpack_output(vout: PackedVout) -> Result<TxOutput, ParseError> {
    if vout.value_sat.len() > 8 {
        return Err(ParseError::InvalidPacked(format!(
            "output {} value does not fit 64 bits",
            vout.n
        )));
    }
    let value = vout
        .value_sat
        .iter()
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
    Ok(TxOutput {
        value: Amount::from_sat(value),
        n: vout.n,
        script_pubkey: ScriptBuf::from_bytes(vout.script_pub_key_hex),
        addresses: vout.addresses,
    })
}
