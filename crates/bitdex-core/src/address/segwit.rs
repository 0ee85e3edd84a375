use bech32::{segwit, Fe32, Hrp};

use crate::error::AddressError;

/// Encode a witness program. Version 0 uses bech32, later versions bech32m.
pub(crate) fn encode(hrp: &str, version: u8, program: &[u8]) -> Result<String, AddressError> {
    let hrp = Hrp::parse(hrp).map_err(|e| AddressError::InvalidAddress(e.to_string()))?;
    let version =
        Fe32::try_from(version).map_err(|_| AddressError::UnsupportedWitnessVersion(version))?;
    segwit::encode(hrp, version, program).map_err(|e| AddressError::InvalidAddress(e.to_string()))
}

/// Decode a segwit address for `expected_hrp` into `(version, program)`.
pub(crate) fn decode(expected_hrp: &str, address: &str) -> Result<(u8, Vec<u8>), AddressError> {
    let (hrp, version, program) = match segwit::decode(address) {
        Ok(decoded) => decoded,
        Err(e) => {
            // Separate a broken checksum from a well-formed string that is
            // simply not a valid witness program.
            return Err(match bech32::decode(address) {
                Err(_) => AddressError::ChecksumMismatch,
                Ok(_) => AddressError::InvalidAddress(e.to_string()),
            });
        }
    };
    if hrp.to_lowercase() != expected_hrp {
        return Err(AddressError::UnknownFormat);
    }
    Ok((version.to_u8(), program))
}
