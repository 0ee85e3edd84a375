use bitcoin::base58;
use bitcoin::hashes::{sha256d, Hash};
use groestl::{Digest, Groestl512};

use crate::chain::ChecksumHasher;
use crate::error::AddressError;

const CHECKSUM_LEN: usize = 4;

fn checksum(hasher: ChecksumHasher, data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut out = [0u8; CHECKSUM_LEN];
    match hasher {
        ChecksumHasher::DoubleSha256 => {
            out.copy_from_slice(&sha256d::Hash::hash(data).to_byte_array()[..CHECKSUM_LEN]);
        }
        ChecksumHasher::Groestl512D => {
            let once = Groestl512::digest(data);
            let twice = Groestl512::digest(once);
            out.copy_from_slice(&twice[..CHECKSUM_LEN]);
        }
    }
    out
}

/// Base58 with a 4-byte checksum computed by `hasher`.
pub(crate) fn encode_check(hasher: ChecksumHasher, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(payload.len() + CHECKSUM_LEN);
    data.extend_from_slice(payload);
    data.extend_from_slice(&checksum(hasher, payload));
    base58::encode(&data)
}

/// Decode base58 and strip the checksum.
///
/// Strings outside the base58 alphabet are [`AddressError::UnknownFormat`];
/// a wrong checksum is [`AddressError::ChecksumMismatch`].
pub(crate) fn decode_check(hasher: ChecksumHasher, s: &str) -> Result<Vec<u8>, AddressError> {
    let mut data = base58::decode(s).map_err(|_| AddressError::UnknownFormat)?;
    if data.len() <= CHECKSUM_LEN {
        return Err(AddressError::InvalidAddress(format!(
            "base58 payload of {} bytes is too short",
            data.len()
        )));
    }
    let split = data.len() - CHECKSUM_LEN;
    if checksum(hasher, &data[..split]) != data[split..] {
        return Err(AddressError::ChecksumMismatch);
    }
    data.truncate(split);
    Ok(data)
}
