//! BIP-341 key-path-only output key, as used by BIP-86 wallets.

use std::sync::OnceLock;

use bitcoin::hashes::{sha256, Hash, HashEngine};
use bitcoin::secp256k1::{PublicKey, Scalar, Secp256k1, VerifyOnly, XOnlyPublicKey};

use crate::error::DescriptorError;

pub(crate) fn secp() -> &'static Secp256k1<VerifyOnly> {
    static SECP: OnceLock<Secp256k1<VerifyOnly>> = OnceLock::new();
    SECP.get_or_init(Secp256k1::verification_only)
}

/// `SHA256(SHA256("TapTweak") || SHA256("TapTweak") || msg)`.
pub(crate) fn tap_tweak_hash(msg: &[u8]) -> [u8; 32] {
    let tag = sha256::Hash::hash(b"TapTweak");
    let mut engine = sha256::Hash::engine();
    engine.input(tag.as_ref());
    engine.input(tag.as_ref());
    engine.input(msg);
    sha256::Hash::from_engine(engine).to_byte_array()
}

/// Output key `Q = lift_x(P) + H_TapTweak(P)·G` for the internal key of
/// `pubkey`, as the 32-byte x coordinate.
pub(crate) fn output_key(pubkey: &PublicKey) -> Result<[u8; 32], DescriptorError> {
    let (internal, _) = pubkey.x_only_public_key();
    tweak_x_only(&internal)
}

pub(crate) fn tweak_x_only(internal: &XOnlyPublicKey) -> Result<[u8; 32], DescriptorError> {
    let tweak = Scalar::from_be_bytes(tap_tweak_hash(&internal.serialize()))
        .map_err(|_| DescriptorError::InvalidTweak)?;
    let (output, _parity) = internal
        .add_tweak(secp(), &tweak)
        .map_err(|e| DescriptorError::Key(e.to_string()))?;
    // Fixed-width serialisation, small x coordinates come out zero padded.
    Ok(output.serialize())
}

#[cfg(test)]
mod tests {
    use bitcoin::hex::{DisplayHex, FromHex};
    use bitcoin::key::TapTweak;

    use super::*;

    #[test]
    fn tagged_hash_prefix() {
        let expected = {
            let tag = sha256::Hash::hash(b"TapTweak").to_byte_array();
            let mut m = tag.to_vec();
            m.extend_from_slice(&tag);
            m.extend_from_slice(&[1, 2, 3]);
            sha256::Hash::hash(&m).to_byte_array()
        };
        assert_eq!(tap_tweak_hash(&[1, 2, 3]), expected);
    }

    #[test]
    fn bip86_first_receive_key() {
        // m/86'/0'/0'/0/0 of the BIP-86 test mnemonic.
        let internal = XOnlyPublicKey::from_slice(
            &Vec::<u8>::from_hex("cc8a4bc64d897bddc5fbc2f670f7a8ba0b386779106cf1223c6fc5d7cd6fc115")
                .expect("static hex"),
        )
        .expect("valid key");
        let output = tweak_x_only(&internal).expect("tweak");
        assert_eq!(
            output.to_lower_hex_string(),
            "a60869f0dbcf1dc659c9cecbaf8050135ea9e8cdc487053f1dc6880949dc684c"
        );

        let (library, _) = internal.tap_tweak(secp(), None);
        assert_eq!(library.to_inner().serialize(), output);
    }
}
