//! Helpers for the node's verbose transaction and block JSON.

use bitcoin::hex::FromHex;
use bitcoin::{Amount, BlockHash, Denomination, OutPoint, ScriptBuf, Txid, Witness};
use serde_json::Value;

use crate::error::ParseError;
use crate::types::{Tx, TxInput, TxOutput};

use super::tx::pegin_address;

pub(crate) fn parse_txid(value: Option<&Value>, field: &str) -> Result<Txid, ParseError> {
    let value = value
        .and_then(Value::as_str)
        .ok_or_else(|| ParseError::InvalidJson(format!("missing {field}")))?;
    value
        .parse()
        .map_err(|e| ParseError::InvalidJson(format!("invalid {field}: {e}")))
}

pub(crate) fn parse_opt_block_hash(
    value: Option<&Value>,
    field: &str,
) -> Result<Option<BlockHash>, ParseError> {
    match value.and_then(Value::as_str) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|e| ParseError::InvalidJson(format!("invalid {field}: {e}"))),
    }
}

pub(crate) fn parse_integer_required<T, const SIGNED: bool>(
    value: Option<&Value>,
    field: &str,
) -> Result<T, ParseError>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    parse_integer::<T, SIGNED, true>(value, field)?
        .ok_or_else(|| ParseError::InvalidJson(format!("missing {field}")))
}

pub(crate) fn parse_integer_optional<T, const SIGNED: bool>(value: Option<&Value>) -> Option<T>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    parse_integer::<T, SIGNED, false>(value, "value")
        .ok()
        .flatten()
}

// Generic integer parser used by all concrete numeric helpers.
// `required=false` treats missing/null/type-mismatch as `Ok(None)`.
fn parse_integer<T, const SIGNED: bool, const REQUIRED: bool>(
    value: Option<&Value>,
    field: &str,
) -> Result<Option<T>, ParseError>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    let missing_or_none = || {
        if REQUIRED {
            Err(ParseError::InvalidJson(format!("missing {field}")))
        } else {
            Ok(None)
        }
    };

    let Some(value) = value else {
        return missing_or_none();
    };

    if SIGNED {
        let Some(n) = value.as_i64() else {
            return missing_or_none();
        };
        T::try_from(n)
            .map(Some)
            .map_err(|_| ParseError::InvalidJson(format!("{field} out of range: {n}")))
    } else {
        let Some(n) = value.as_u64() else {
            return missing_or_none();
        };
        T::try_from(n)
            .map(Some)
            .map_err(|_| ParseError::InvalidJson(format!("{field} out of range: {n}")))
    }
}

pub(crate) fn script_from_hex(hex_str: &str) -> Result<ScriptBuf, ParseError> {
    ScriptBuf::from_hex(hex_str).map_err(|e| ParseError::InvalidHex(format!("script: {e}")))
}

/// Unit the node reports amounts in, by number of decimal places.
pub(crate) fn denomination(decimals: u32) -> Result<Denomination, ParseError> {
    match decimals {
        8 => Ok(Denomination::Bitcoin),
        5 => Ok(Denomination::MilliBitcoin),
        2 => Ok(Denomination::Bit),
        0 => Ok(Denomination::Satoshi),
        other => Err(ParseError::InvalidJson(format!(
            "unsupported amount precision of {other} decimals"
        ))),
    }
}

/// Parse a node amount into base units.
///
/// Number values are parsed via `Amount::from_float_in` to support scientific
/// notation, while string values are parsed via `Amount::from_str_in`.
pub(crate) fn parse_amount(value: &Value, decimals: u32) -> Result<Amount, ParseError> {
    let unit = denomination(decimals)?;
    match value {
        Value::Number(n) => {
            let parsed = n
                .as_f64()
                .ok_or_else(|| ParseError::InvalidJson(format!("invalid amount `{value}`")))?;
            Amount::from_float_in(parsed, unit)
                .map_err(|e| ParseError::InvalidJson(format!("invalid amount `{value}`: {e}")))
        }
        Value::String(s) => Amount::from_str_in(s, unit)
            .map_err(|e| ParseError::InvalidJson(format!("invalid amount `{s}`: {e}"))),
        _ => Err(ParseError::InvalidJson(format!(
            "expected numeric amount, got: {value}"
        ))),
    }
}

// ==============================================================================
// Verbose Transaction
// ==============================================================================

fn parse_vin(vin: &[Value]) -> Result<Vec<TxInput>, ParseError> {
    vin.iter()
        .map(|input| {
            let sequence = parse_integer_required::<u32, false>(input.get("sequence"), "sequence")?;

            if let Some(coinbase) = input.get("coinbase").and_then(Value::as_str) {
                return Ok(TxInput::coinbase(script_from_hex(coinbase)?, sequence));
            }

            let txid = parse_txid(input.get("txid"), "vin.txid")?;
            let vout = parse_integer_required::<u32, false>(input.get("vout"), "vin.vout")?;
            let script_sig = match input
                .get("scriptSig")
                .and_then(|s| s.get("hex"))
                .and_then(Value::as_str)
            {
                Some(hex) => script_from_hex(hex)?,
                None => ScriptBuf::new(),
            };

            let mut parsed = TxInput::spend(OutPoint::new(txid, vout), script_sig, sequence);
            if let Some(items) = input.get("txinwitness").and_then(Value::as_array) {
                let items = items
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .and_then(|s| Vec::<u8>::from_hex(s).ok())
                            .ok_or_else(|| ParseError::InvalidHex(format!("txinwitness: {item}")))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                parsed.witness = Witness::from_slice(&items);
            }
            if input.get("is_pegin").and_then(Value::as_bool) == Some(true) {
                parsed.addresses = vec![pegin_address(&txid, vout)];
            }
            Ok(parsed)
        })
        .collect()
}

fn parse_vout(vout: &[Value], decimals: u32) -> Result<Vec<TxOutput>, ParseError> {
    vout.iter()
        .enumerate()
        .map(|(position, output)| {
            let value = parse_amount(
                output
                    .get("value")
                    .ok_or_else(|| ParseError::InvalidJson("missing value in vout".into()))?,
                decimals,
            )?;
            let n = parse_integer_optional::<u32, false>(output.get("n"))
                .unwrap_or(position as u32);
            let script_pubkey = output
                .get("scriptPubKey")
                .and_then(|s| s.get("hex"))
                .and_then(Value::as_str)
                .ok_or_else(|| ParseError::InvalidJson("missing hex in scriptPubKey".into()))
                .and_then(script_from_hex)?;

            Ok(TxOutput {
                value,
                n,
                script_pubkey,
                addresses: Vec::new(),
            })
        })
        .collect()
}

/// Build a [`Tx`] from `getrawtransaction <txid> true` output. Output
/// addresses are left empty for the caller to derive.
pub(crate) fn tx_from_json(raw: &Value, decimals: u32, with_vsize: bool) -> Result<Tx, ParseError> {
    let vin = raw
        .get("vin")
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::InvalidJson("missing vin array".into()))?;
    let vout = raw
        .get("vout")
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::InvalidJson("missing vout array".into()))?;

    Ok(Tx {
        txid: parse_txid(raw.get("txid"), "txid")?,
        hex: raw
            .get("hex")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        version: parse_integer_required::<i32, true>(raw.get("version"), "version")?,
        lock_time: parse_integer_optional::<u32, false>(raw.get("locktime")).unwrap_or(0),
        vsize: if with_vsize {
            parse_integer_optional::<u64, false>(raw.get("vsize"))
        } else {
            None
        },
        inputs: parse_vin(vin)?,
        outputs: parse_vout(vout, decimals)?,
        block_hash: parse_opt_block_hash(raw.get("blockhash"), "blockhash")?,
        block_time: parse_integer_optional::<i64, true>(raw.get("blocktime")),
        time: parse_integer_optional::<i64, true>(raw.get("time")),
        confirmations: parse_integer_optional::<u32, false>(raw.get("confirmations")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_amount_integer() {
        let val = serde_json::json!(1);
        let amount = parse_amount(&val, 8).expect("should parse integer");
        assert_eq!(amount, Amount::from_sat(100_000_000));
    }

    #[test]
    fn parse_amount_fractional() {
        let val = serde_json::json!(0.00001);
        let amount = parse_amount(&val, 8).expect("should parse fractional");
        assert_eq!(amount, Amount::from_sat(1000));
    }

    #[test]
    fn parse_amount_string() {
        let val = serde_json::json!("0.5");
        let amount = parse_amount(&val, 8).expect("should parse string");
        assert_eq!(amount, Amount::from_sat(50_000_000));
    }

    #[test]
    fn parse_amount_two_decimals() {
        let val = serde_json::json!(5.46);
        let amount = parse_amount(&val, 2).expect("should parse xec amount");
        assert_eq!(amount, Amount::from_sat(546));
    }

    #[test]
    fn parse_amount_invalid() {
        let val = serde_json::json!(true);
        assert!(parse_amount(&val, 8).is_err());
    }

    #[test]
    fn parse_amount_scientific_number() {
        let val = serde_json::json!(6.6e-6);
        let amount = parse_amount(&val, 8).expect("should parse scientific notation");
        assert_eq!(amount, Amount::from_sat(660));
    }

    #[test]
    fn parse_amount_scientific_string() {
        let val = serde_json::json!("1e-8");
        assert!(parse_amount(&val, 8).is_err());
    }

    #[test]
    fn verbose_tx_with_coinbase_and_pegin() {
        let txid = "1".repeat(64);
        let raw = serde_json::json!({
            "txid": txid,
            "version": 2,
            "locktime": 0,
            "vsize": 120,
            "blocktime": 1_600_000_000,
            "confirmations": 3,
            "vin": [
                {"coinbase": "03a08601", "sequence": 4294967295u32},
                {"txid": txid, "vout": 0, "scriptSig": {"hex": ""}, "sequence": 1, "is_pegin": true}
            ],
            "vout": [
                {"value": 0.001, "n": 0, "scriptPubKey": {"hex": "0014cc8067093f6f843d6d3e22004a4290cd0c0f336b"}}
            ]
        });
        let tx = tx_from_json(&raw, 8, true).expect("valid verbose tx");
        assert!(tx.inputs[0].prevout.is_none());
        assert_eq!(tx.inputs[1].addresses, vec![format!("Bitcoin tx {txid}:0")]);
        assert_eq!(tx.outputs[0].value, Amount::from_sat(100_000));
        assert_eq!(tx.vsize, Some(120));
        assert_eq!(tx.block_time, Some(1_600_000_000));
        assert_eq!(tx.confirmations, Some(3));

        let without_vsize = tx_from_json(&raw, 8, false).expect("valid verbose tx");
        assert_eq!(without_vsize.vsize, None);
    }
}
