//! CashAddr codec used by the eCash chains.

use crate::error::AddressError;

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const CHECKSUM_LEN: usize = 8;
const GENERATORS: [u64; 5] = [
    0x98_f2bc_8e61,
    0x79_b76d_99e2,
    0xf3_3e5f_b3c4,
    0xae_2eab_e2a8,
    0x1e_4f43_e470,
];

/// Payload type carried in the version byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashAddrKind {
    PubkeyHash,
    ScriptHash,
}

impl CashAddrKind {
    fn version_byte(self) -> u8 {
        // Type in bits 3..7, size code 0 (160-bit hash) in bits 0..3.
        match self {
            Self::PubkeyHash => 0x00,
            Self::ScriptHash => 0x08,
        }
    }
}

fn polymod(values: impl IntoIterator<Item = u8>) -> u64 {
    let mut c: u64 = 1;
    for d in values {
        let c0 = (c >> 35) as u8;
        c = ((c & 0x07_ffff_ffff) << 5) ^ u64::from(d);
        for (i, g) in GENERATORS.iter().enumerate() {
            if c0 & (1 << i) != 0 {
                c ^= g;
            }
        }
    }
    c ^ 1
}

fn prefix_values(prefix: &str) -> impl Iterator<Item = u8> + '_ {
    prefix.bytes().map(|b| b & 0x1f).chain(std::iter::once(0))
}

fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Option<Vec<u8>> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let max = (1u32 << to) - 1;
    let mut out = Vec::with_capacity(data.len() * from as usize / to as usize + 1);
    for &value in data {
        let value = u32::from(value);
        if value >> from != 0 {
            return None;
        }
        acc = (acc << from) | value;
        bits += from;
        while bits >= to {
            bits -= to;
            out.push(((acc >> bits) & max) as u8);
        }
    }
    if pad {
        if bits > 0 {
            out.push(((acc << (to - bits)) & max) as u8);
        }
    } else if bits >= from || (acc << (to - bits)) & max != 0 {
        return None;
    }
    Some(out)
}

/// Encode a 20-byte hash as `prefix:payload`.
pub fn encode(prefix: &str, kind: CashAddrKind, hash: &[u8; 20]) -> String {
    let mut raw = Vec::with_capacity(21);
    raw.push(kind.version_byte());
    raw.extend_from_slice(hash);
    // 8-to-5 with padding cannot fail.
    let payload = convert_bits(&raw, 8, 5, true).unwrap_or_default();

    let checksum = polymod(
        prefix_values(prefix)
            .chain(payload.iter().copied())
            .chain([0u8; CHECKSUM_LEN]),
    );

    let mut out = String::with_capacity(prefix.len() + 1 + payload.len() + CHECKSUM_LEN);
    out.push_str(prefix);
    out.push(':');
    for &v in &payload {
        out.push(char::from(CHARSET[usize::from(v)]));
    }
    for i in 0..CHECKSUM_LEN {
        let v = (checksum >> (5 * (7 - i))) & 0x1f;
        out.push(char::from(CHARSET[v as usize]));
    }
    out
}

/// Decode a cashaddr. The prefix may be omitted, in which case
/// `expected_prefix` is assumed.
pub fn decode(address: &str, expected_prefix: &str) -> Result<(CashAddrKind, [u8; 20]), AddressError> {
    let has_lower = address.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = address.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(AddressError::InvalidAddress("mixed case cashaddr".into()));
    }
    let address = address.to_ascii_lowercase();
    let (prefix, payload) = match address.split_once(':') {
        Some((prefix, payload)) => (prefix, payload),
        None => (expected_prefix, address.as_str()),
    };
    if prefix != expected_prefix {
        return Err(AddressError::UnknownFormat);
    }
    if payload.len() <= CHECKSUM_LEN {
        return Err(AddressError::UnknownFormat);
    }

    let values = payload
        .bytes()
        .map(|b| {
            CHARSET
                .iter()
                .position(|&c| c == b)
                .map(|p| p as u8)
                .ok_or(AddressError::UnknownFormat)
        })
        .collect::<Result<Vec<u8>, _>>()?;

    if polymod(prefix_values(prefix).chain(values.iter().copied())) != 0 {
        return Err(AddressError::ChecksumMismatch);
    }

    let data = &values[..values.len() - CHECKSUM_LEN];
    let raw = convert_bits(data, 5, 8, false)
        .ok_or_else(|| AddressError::InvalidAddress("bad cashaddr padding".into()))?;
    let (&version, hash) = raw
        .split_first()
        .ok_or_else(|| AddressError::InvalidAddress("empty cashaddr payload".into()))?;
    if version & 0x07 != 0 || hash.len() != 20 {
        return Err(AddressError::InvalidAddress(format!(
            "unsupported cashaddr hash size (version byte {version:#04x})"
        )));
    }
    let kind = match version >> 3 {
        0 => CashAddrKind::PubkeyHash,
        1 => CashAddrKind::ScriptHash,
        other => {
            return Err(AddressError::InvalidAddress(format!(
                "unsupported cashaddr type {other}"
            )))
        }
    };
    let mut out = [0u8; 20];
    out.copy_from_slice(hash);
    Ok((kind, out))
}
