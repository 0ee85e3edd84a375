//! Variable-length quantities as used in packed records.
//!
//! Unsigned values are written big-endian in 7-bit groups, the high bit set
//! on every byte but the last. Signed values are zigzag mapped first.

/// Longest encoding of a 64-bit value.
pub const MAX_LEN_64: usize = 10;

pub fn put_uint(buf: &mut Vec<u8>, mut value: u64) -> usize {
    let mut tmp = [0u8; MAX_LEN_64];
    let mut i = MAX_LEN_64 - 1;
    tmp[i] = (value & 0x7f) as u8;
    value >>= 7;
    while value != 0 {
        i -= 1;
        tmp[i] = 0x80 | (value & 0x7f) as u8;
        value >>= 7;
    }
    buf.extend_from_slice(&tmp[i..]);
    MAX_LEN_64 - i
}

pub fn put_int(buf: &mut Vec<u8>, value: i64) -> usize {
    put_uint(buf, ((value << 1) ^ (value >> 63)) as u64)
}

/// Decode an unsigned value, returning it and the number of bytes read.
/// `None` when the input ends mid-value or overflows 64 bits.
pub fn uint(buf: &[u8]) -> Option<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, &b) in buf.iter().take(MAX_LEN_64).enumerate() {
        if value >> 57 != 0 {
            return None;
        }
        value = (value << 7) | u64::from(b & 0x7f);
        if b & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}

pub fn int(buf: &[u8]) -> Option<(i64, usize)> {
    uint(buf).map(|(v, n)| (((v >> 1) as i64) ^ -((v & 1) as i64), n))
}

#[cfg(test)]
mod tests {
    use bitcoin::hex::DisplayHex;

    use super::*;

    #[test]
    fn block_time_encoding() {
        let mut buf = Vec::new();
        assert_eq!(put_int(&mut buf, 1_583_392_607), 5);
        assert_eq!(buf.to_lower_hex_string(), "8be6859d3e");
        assert_eq!(int(&buf), Some((1_583_392_607, 5)));
    }

    #[test]
    fn small_and_signed_values() {
        for (value, hex) in [(0i64, "00"), (-1, "01"), (1, "02"), (63, "7e"), (64, "8100")] {
            let mut buf = Vec::new();
            put_int(&mut buf, value);
            assert_eq!(buf.to_lower_hex_string(), hex, "value {value}");
            assert_eq!(int(&buf).map(|(v, _)| v), Some(value));
        }
    }

    #[test]
    fn extremes() {
        for value in [i64::MIN, i64::MAX] {
            let mut buf = Vec::new();
            let n = put_int(&mut buf, value);
            assert!(n <= MAX_LEN_64);
            assert_eq!(int(&buf), Some((value, n)));
        }
    }

    #[test]
    fn truncated_input() {
        assert_eq!(uint(&[0x81, 0x80]), None);
        assert_eq!(uint(&[]), None);
    }
}
