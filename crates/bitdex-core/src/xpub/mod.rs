//! Extended public key and output descriptor handling.
//!
//! An account is given either as a bare extended key (`xpub`, `ypub`,
//! `zpub`, `tpub`, `upub`, ...) whose version bytes select the script kind,
//! or as a descriptor (`pkh(..)`, `sh(wpkh(..))`, `wpkh(..)`, `tr(..)`).
//! Only the non-hardened change and index levels are derived here.

mod descriptor;
mod taproot;

use std::fmt;

use bitcoin::bip32::{ChildNumber, Xpub};
use bitcoin::hashes::{hash160, Hash};
use bitcoin::secp256k1::PublicKey;
use bitcoin::ScriptBuf;

use crate::address::{self, base58};
use crate::chain::{ChainParams, ChecksumHasher};
use crate::error::{AddressError, DescriptorError};
use crate::types::AddressDescriptor;

/// Serialised extended key: version, depth, fingerprint, child number,
/// chain code, public key.
const EXTENDED_KEY_LEN: usize = 78;
/// Version the decoder is handed, whatever the chain's magic is.
const XPUB_VERSION_BYTES: [u8; 4] = [0x04, 0x88, 0xb2, 0x1e];
const ACCOUNT_DEPTH: u8 = 3;

/// Script derived for each child key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivationKind {
    P2pkh,
    P2shP2wpkh,
    P2wpkh,
    P2tr,
}

impl DerivationKind {
    /// BIP number of the derivation scheme.
    pub fn default_bip(self) -> &'static str {
        match self {
            Self::P2pkh => "44",
            Self::P2shP2wpkh => "49",
            Self::P2wpkh => "84",
            Self::P2tr => "86",
        }
    }
}

impl fmt::Display for DerivationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::P2pkh => write!(f, "p2pkh"),
            Self::P2shP2wpkh => write!(f, "p2sh-p2wpkh"),
            Self::P2wpkh => write!(f, "p2wpkh"),
            Self::P2tr => write!(f, "p2tr"),
        }
    }
}

/// Extended key magics and coin type, defaulting to the chain's own and
/// overridable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpubSettings {
    pub xpub_magic: u32,
    pub xpub_magic_segwit_p2sh: u32,
    pub xpub_magic_segwit_native: u32,
    pub slip44: u32,
}

impl XpubSettings {
    pub fn from_params(params: &ChainParams) -> Self {
        Self {
            xpub_magic: params.xpub_magic,
            xpub_magic_segwit_p2sh: params.xpub_magic_segwit_p2sh,
            xpub_magic_segwit_native: params.xpub_magic_segwit_native,
            slip44: params.slip44,
        }
    }
}

/// A parsed account. Created per request and dropped after derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpubDescriptor {
    /// The string as supplied.
    pub descriptor: String,
    /// The extended key part of it.
    pub xpub: String,
    pub kind: DerivationKind,
    pub bip: String,
    pub change_indexes: Vec<u32>,
    key: Xpub,
}

impl XpubDescriptor {
    pub fn depth(&self) -> u8 {
        self.key.depth
    }

    pub fn child_number(&self) -> ChildNumber {
        self.key.child_number
    }
}

// ==============================================================================
// Deriver
// ==============================================================================

#[derive(Debug, Clone)]
pub struct XpubDeriver {
    hasher: ChecksumHasher,
    settings: XpubSettings,
}

impl XpubDeriver {
    pub fn new(params: &ChainParams) -> Self {
        Self {
            hasher: params.checksum_hasher,
            settings: XpubSettings::from_params(params),
        }
    }

    pub fn with_settings(mut self, settings: XpubSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &XpubSettings {
        &self.settings
    }

    /// Parse a bare extended key or a descriptor.
    pub fn parse_xpub(&self, input: &str) -> Result<XpubDescriptor, DescriptorError> {
        if !descriptor::is_descriptor(input) {
            let (key, version) = self.decode_key(input)?;
            let kind = if version == self.settings.xpub_magic_segwit_p2sh {
                DerivationKind::P2shP2wpkh
            } else if version == self.settings.xpub_magic_segwit_native {
                DerivationKind::P2wpkh
            } else {
                DerivationKind::P2pkh
            };
            return Ok(XpubDescriptor {
                descriptor: input.to_owned(),
                xpub: input.to_owned(),
                kind,
                bip: kind.default_bip().to_owned(),
                change_indexes: vec![0, 1],
                key,
            });
        }

        let parts = descriptor::parse(input)?;
        let (key, _) = self.decode_key(parts.xpub)?;
        Ok(XpubDescriptor {
            descriptor: input.to_owned(),
            xpub: parts.xpub.to_owned(),
            kind: parts.kind,
            bip: parts
                .bip
                .unwrap_or_else(|| parts.kind.default_bip())
                .to_owned(),
            change_indexes: parts.change_indexes.unwrap_or_else(|| vec![0, 1]),
            key,
        })
    }

    /// Descriptors of `change/index` for each of `indexes`.
    pub fn derive_addresses(
        &self,
        desc: &XpubDescriptor,
        change: u32,
        indexes: &[u32],
    ) -> Result<Vec<AddressDescriptor>, DescriptorError> {
        let branch = derive_child(&desc.key, change)?;
        indexes
            .iter()
            .map(|&index| {
                let key = derive_child(&branch, index)?;
                output_script(desc.kind, &key.public_key).map(AddressDescriptor::from)
            })
            .collect()
    }

    /// Descriptors of `change/from` up to, not including, `change/to`.
    pub fn derive_range(
        &self,
        desc: &XpubDescriptor,
        change: u32,
        from: u32,
        to: u32,
    ) -> Result<Vec<AddressDescriptor>, DescriptorError> {
        if to <= from {
            return Err(DescriptorError::DerivationOverflow { from, to });
        }
        let indexes: Vec<u32> = (from..to).collect();
        self.derive_addresses(desc, change, &indexes)
    }

    /// `m/<bip>'/<slip44>'/<account>'` for account-level keys,
    /// `unknown/<child>` for keys at any other depth.
    pub fn base_path(&self, desc: &XpubDescriptor) -> String {
        let child = match desc.key.child_number {
            ChildNumber::Normal { index } => index.to_string(),
            ChildNumber::Hardened { index } => format!("{index}'"),
        };
        if desc.key.depth != ACCOUNT_DEPTH {
            return format!("unknown/{child}");
        }
        format!("m/{}'/{}'/{child}", desc.bip, self.settings.slip44)
    }

    /// Decode an extended public key checked with the chain's hasher.
    /// Returns the key and its original version.
    fn decode_key(&self, xpub: &str) -> Result<(Xpub, u32), DescriptorError> {
        let mut payload = base58::decode_check(self.hasher, xpub).map_err(|e| match e {
            AddressError::ChecksumMismatch => DescriptorError::ChecksumMismatch,
            other => DescriptorError::InvalidDescriptor(format!("extended key: {other}")),
        })?;
        if payload.len() != EXTENDED_KEY_LEN {
            return Err(DescriptorError::InvalidDescriptor(format!(
                "extended key is {} bytes, expected {EXTENDED_KEY_LEN}",
                payload.len()
            )));
        }
        let version = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
        payload[..4].copy_from_slice(&XPUB_VERSION_BYTES);
        let key = Xpub::decode(&payload).map_err(|e| DescriptorError::Key(e.to_string()))?;
        Ok((key, version))
    }
}

fn derive_child(key: &Xpub, index: u32) -> Result<Xpub, DescriptorError> {
    let child = ChildNumber::from_normal_idx(index)
        .map_err(|_| DescriptorError::HardenedChildRequested(index))?;
    key.ckd_pub(taproot::secp(), child)
        .map_err(|e| DescriptorError::Key(e.to_string()))
}

fn output_script(kind: DerivationKind, pubkey: &PublicKey) -> Result<ScriptBuf, DescriptorError> {
    let key_hash = hash160::Hash::hash(&pubkey.serialize()).to_byte_array();
    let script = match kind {
        DerivationKind::P2pkh => address::p2pkh_script(&key_hash),
        DerivationKind::P2shP2wpkh => {
            let redeem = address::witness_script(0, &key_hash);
            address::p2sh_script(&hash160::Hash::hash(redeem.as_bytes()).to_byte_array())
        }
        DerivationKind::P2wpkh => address::witness_script(0, &key_hash),
        DerivationKind::P2tr => address::witness_script(1, &taproot::output_key(pubkey)?),
    };
    Ok(script)
}
