//! Conversion between textual addresses and output scripts.
//!
//! One [`AddressCodec`] serves one network: it knows the base58 version
//! bytes and checksum hash, the bech32 HRP and, for eCash, the cashaddr
//! prefix and the preferred rendering.

pub(crate) mod base58;
pub mod cashaddr;
mod segwit;

use std::fmt;
use std::str::FromStr;

use bitcoin::hashes::{hash160, Hash};
use bitcoin::{Script, ScriptBuf};
use serde::{Deserialize, Serialize};

use crate::chain::ChainParams;
use crate::error::AddressError;
use crate::types::{AddressDescriptor, ScriptType};

use self::cashaddr::CashAddrKind;

// ==============================================================================
// Address Format
// ==============================================================================

/// Rendering of pay-to-hash addresses on chains that know cashaddr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFormat {
    #[default]
    CashAddr,
    Legacy,
}

impl FromStr for AddressFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "cashaddr" => Ok(Self::CashAddr),
            "legacy" => Ok(Self::Legacy),
            other => Err(format!("unknown address format `{other}`")),
        }
    }
}

impl fmt::Display for AddressFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CashAddr => f.write_str("cashaddr"),
            Self::Legacy => f.write_str("legacy"),
        }
    }
}

// ==============================================================================
// Script Templates
// ==============================================================================

const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUAL: u8 = 0x87;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;
const OP_PUSHBYTES_20: u8 = 0x14;

pub(crate) fn p2pkh_script(hash: &[u8; 20]) -> ScriptBuf {
    let mut bytes = Vec::with_capacity(25);
    bytes.extend_from_slice(&[OP_DUP, OP_HASH160, OP_PUSHBYTES_20]);
    bytes.extend_from_slice(hash);
    bytes.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
    ScriptBuf::from_bytes(bytes)
}

pub(crate) fn p2sh_script(hash: &[u8; 20]) -> ScriptBuf {
    let mut bytes = Vec::with_capacity(23);
    bytes.extend_from_slice(&[OP_HASH160, OP_PUSHBYTES_20]);
    bytes.extend_from_slice(hash);
    bytes.push(OP_EQUAL);
    ScriptBuf::from_bytes(bytes)
}

/// `OP_n <program>` for witness version `n`.
pub(crate) fn witness_script(version: u8, program: &[u8]) -> ScriptBuf {
    let mut bytes = Vec::with_capacity(program.len() + 2);
    bytes.push(if version == 0 { 0x00 } else { 0x50 + version });
    bytes.push(program.len() as u8);
    bytes.extend_from_slice(program);
    ScriptBuf::from_bytes(bytes)
}

/// Public key pushed by a P2PK script, if the script is one.
pub(crate) fn p2pk_pubkey(script: &Script) -> Option<&[u8]> {
    let bytes = script.as_bytes();
    match bytes {
        [0x21, key @ .., OP_CHECKSIG] if key.len() == 33 => Some(key),
        [0x41, key @ .., OP_CHECKSIG] if key.len() == 65 => Some(key),
        _ => None,
    }
}

/// `OP_m <keys..> OP_n OP_CHECKMULTISIG`, by its framing opcodes only.
fn is_bare_multisig(script: &Script) -> bool {
    const OP_CHECKMULTISIG: u8 = 0xae;
    match script.as_bytes() {
        [m, .., n, OP_CHECKMULTISIG] => (0x51..=0x60).contains(m) && (0x51..=0x60).contains(n),
        _ => false,
    }
}

fn hash20(bytes: &[u8]) -> Option<[u8; 20]> {
    bytes.try_into().ok()
}

/// Classify the standard templates by shape only.
pub fn standard_script_type(script: &Script) -> ScriptType {
    if script.is_p2pkh() {
        ScriptType::P2pkh
    } else if script.is_p2sh() {
        ScriptType::P2sh
    } else if script.is_p2wpkh() {
        ScriptType::P2wpkh
    } else if script.is_p2wsh() {
        ScriptType::P2wsh
    } else if script.is_p2tr() {
        ScriptType::P2tr
    } else if p2pk_pubkey(script).is_some() {
        ScriptType::P2pk
    } else if is_bare_multisig(script) {
        ScriptType::BareMultisig
    } else if script.is_op_return() {
        ScriptType::OpReturn
    } else {
        ScriptType::Unknown
    }
}

// ==============================================================================
// Codec
// ==============================================================================

/// Address codec bound to one network's parameters.
#[derive(Debug, Clone)]
pub struct AddressCodec {
    params: &'static ChainParams,
    format: AddressFormat,
}

impl AddressCodec {
    pub fn new(params: &'static ChainParams) -> Self {
        Self {
            params,
            format: AddressFormat::default(),
        }
    }

    pub fn with_format(mut self, format: AddressFormat) -> Self {
        self.format = format;
        self
    }

    pub fn params(&self) -> &'static ChainParams {
        self.params
    }

    pub fn format(&self) -> AddressFormat {
        self.format
    }

    fn renders_cashaddr(&self) -> Option<&'static str> {
        match self.format {
            AddressFormat::CashAddr => self.params.cashaddr_prefix,
            AddressFormat::Legacy => None,
        }
    }

    /// Parse a textual address into the output script it pays to.
    pub fn address_to_script(&self, address: &str) -> Result<ScriptBuf, AddressError> {
        if address.is_empty() {
            return Err(AddressError::InvalidAddress("empty address".into()));
        }

        if let Some(hrp) = self.params.bech32_hrp {
            let lower = address.to_ascii_lowercase();
            if lower.starts_with(hrp) && lower[hrp.len()..].starts_with('1') {
                return self.segwit_to_script(hrp, address);
            }
        }

        if let Some(prefix) = self.params.cashaddr_prefix {
            if address.contains(':') {
                return cashaddr_to_script(address, prefix);
            }
            if let Ok(script) = cashaddr_to_script(address, prefix) {
                return Ok(script);
            }
        }

        self.base58_to_script(address)
    }

    /// Address descriptor (canonical output script) of a textual address.
    pub fn addr_desc_from_address(&self, address: &str) -> Result<AddressDescriptor, AddressError> {
        self.address_to_script(address).map(AddressDescriptor::from)
    }

    fn segwit_to_script(&self, hrp: &str, address: &str) -> Result<ScriptBuf, AddressError> {
        let (version, program) = segwit::decode(hrp, address)?;
        match (version, program.len()) {
            (0, 20 | 32) | (1, 32) => Ok(witness_script(version, &program)),
            (0, len) => Err(AddressError::InvalidAddress(format!(
                "witness v0 program of {len} bytes"
            ))),
            (v, _) => Err(AddressError::UnsupportedWitnessVersion(v)),
        }
    }

    fn base58_to_script(&self, address: &str) -> Result<ScriptBuf, AddressError> {
        let data = base58::decode_check(self.params.checksum_hasher, address)?;
        let magic_len = self.params.address_magic_len();
        if data.len() != magic_len + 20 {
            return Err(AddressError::InvalidAddress(format!(
                "base58 payload of {} bytes, expected {}",
                data.len(),
                magic_len + 20
            )));
        }
        let (prefix, hash) = data.split_at(magic_len);
        let hash = hash20(hash).ok_or(AddressError::UnknownFormat)?;
        if prefix == self.params.pubkey_hash_prefix {
            Ok(p2pkh_script(&hash))
        } else if prefix == self.params.script_hash_prefix {
            Ok(p2sh_script(&hash))
        } else {
            Err(AddressError::UnknownFormat)
        }
    }

    // ==========================================================================
    // Encoding
    // ==========================================================================

    pub fn encode_p2pkh(&self, hash: &[u8; 20]) -> String {
        if let Some(prefix) = self.renders_cashaddr() {
            return cashaddr::encode(prefix, CashAddrKind::PubkeyHash, hash);
        }
        self.encode_base58(self.params.pubkey_hash_prefix, hash)
    }

    pub fn encode_p2sh(&self, hash: &[u8; 20]) -> String {
        if let Some(prefix) = self.renders_cashaddr() {
            return cashaddr::encode(prefix, CashAddrKind::ScriptHash, hash);
        }
        self.encode_base58(self.params.script_hash_prefix, hash)
    }

    /// Legacy base58 P2PKH form, regardless of the configured format.
    pub fn encode_legacy_p2pkh(&self, hash: &[u8; 20]) -> String {
        self.encode_base58(self.params.pubkey_hash_prefix, hash)
    }

    fn encode_base58(&self, prefix: &[u8], hash: &[u8; 20]) -> String {
        let mut payload = Vec::with_capacity(prefix.len() + 20);
        payload.extend_from_slice(prefix);
        payload.extend_from_slice(hash);
        base58::encode_check(self.params.checksum_hasher, &payload)
    }

    pub fn encode_witness(&self, version: u8, program: &[u8]) -> Result<String, AddressError> {
        let hrp = self
            .params
            .bech32_hrp
            .ok_or(AddressError::UnsupportedScript)?;
        segwit::encode(hrp, version, program)
    }

    /// Render the single address of a standard output script.
    ///
    /// P2PK renders as the P2PKH address of its key. Scripts without an
    /// address form yield [`AddressError::UnsupportedScript`].
    pub fn script_to_address(&self, script: &Script) -> Result<String, AddressError> {
        let bytes = script.as_bytes();
        if script.is_p2pkh() {
            let hash = hash20(&bytes[3..23]).ok_or(AddressError::UnsupportedScript)?;
            return Ok(self.encode_p2pkh(&hash));
        }
        if script.is_p2sh() {
            let hash = hash20(&bytes[2..22]).ok_or(AddressError::UnsupportedScript)?;
            return Ok(self.encode_p2sh(&hash));
        }
        if script.is_witness_program() {
            let version = match bytes[0] {
                0x00 => 0,
                op => op - 0x50,
            };
            let program = &bytes[2..];
            return match (version, program.len()) {
                (0, _) | (1, 32) => self.encode_witness(version, program),
                (v, _) => Err(AddressError::UnsupportedWitnessVersion(v)),
            };
        }
        if let Some(key) = p2pk_pubkey(script) {
            let hash = hash160::Hash::hash(key).to_byte_array();
            return Ok(self.encode_p2pkh(&hash));
        }
        Err(AddressError::UnsupportedScript)
    }
}

fn cashaddr_to_script(address: &str, prefix: &str) -> Result<ScriptBuf, AddressError> {
    let (kind, hash) = cashaddr::decode(address, prefix)?;
    Ok(match kind {
        CashAddrKind::PubkeyHash => p2pkh_script(&hash),
        CashAddrKind::ScriptHash => p2sh_script(&hash),
    })
}

/// Canonical P2PKH script for a P2PK output, the script itself otherwise.
pub fn canonical_script(script: &Script) -> ScriptBuf {
    match p2pk_pubkey(script) {
        Some(key) => p2pkh_script(&hash160::Hash::hash(key).to_byte_array()),
        None => script.to_owned(),
    }
}
