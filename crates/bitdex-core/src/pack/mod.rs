//! Storage form of transactions.
//!
//! Most chains store `[u32 BE height][VLQ block time][raw wire bytes]` and
//! re-parse on load. Chains with [`PackPolicy::Envelope`] store a protobuf
//! record that also holds the decoded addresses (see [`envelope`]).
//!
//! [`PackPolicy::Envelope`]: crate::chain::PackPolicy::Envelope

pub(crate) mod envelope;
pub mod vlq;

use crate::error::ParseError;
use crate::types::Tx;

const HEIGHT_LEN: usize = 4;

/// Raw-wire record of `tx`. Fails when the transaction carries no raw hex.
pub fn pack_raw(tx: &Tx, height: u32, block_time: i64) -> Result<Vec<u8>, ParseError> {
    if tx.hex.is_empty() {
        return Err(ParseError::InvalidPacked(format!(
            "transaction {} has no raw serialisation",
            tx.txid
        )));
    }
    let raw = tx.raw_bytes()?;
    let mut buf = Vec::with_capacity(HEIGHT_LEN + vlq::MAX_LEN_64 + raw.len());
    buf.extend_from_slice(&height.to_be_bytes());
    vlq::put_int(&mut buf, block_time);
    buf.extend_from_slice(&raw);
    Ok(buf)
}

/// Split a raw-wire record into height, block time and transaction bytes.
pub fn split_raw(buf: &[u8]) -> Result<(u32, i64, &[u8]), ParseError> {
    let (height, rest) = buf
        .split_first_chunk::<HEIGHT_LEN>()
        .ok_or_else(|| ParseError::InvalidPacked("record shorter than its height".into()))?;
    let (block_time, len) = vlq::int(rest)
        .ok_or_else(|| ParseError::InvalidPacked("truncated block time".into()))?;
    Ok((u32::from_be_bytes(*height), block_time, &rest[len..]))
}

#[cfg(test)]
mod tests {
    use bitcoin::hex::DisplayHex;

    use super::*;
    use crate::test_util::tx_with;

    #[test]
    fn raw_record_layout() {
        let mut tx = tx_with(Vec::new(), Vec::new());
        tx.hex = "01000000".into();
        let packed = pack_raw(&tx, 1_851_162, 1_583_392_607).expect("pack");
        assert_eq!(packed.to_lower_hex_string(), "001c3f1a8be6859d3e01000000");

        let (height, time, raw) = split_raw(&packed).expect("split");
        assert_eq!(height, 1_851_162);
        assert_eq!(time, 1_583_392_607);
        assert_eq!(raw, [1, 0, 0, 0]);
    }

    #[test]
    fn missing_hex_cannot_be_packed() {
        let tx = tx_with(Vec::new(), Vec::new());
        assert!(matches!(pack_raw(&tx, 1, 1), Err(ParseError::InvalidPacked(_))));
    }

    #[test]
    fn short_records_are_rejected() {
        assert!(split_raw(&[0, 0, 1]).is_err());
        assert!(split_raw(&[0, 0, 0, 1, 0x80]).is_err());
    }
}
