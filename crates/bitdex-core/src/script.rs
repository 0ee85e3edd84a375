//! Output script classification.
//!
//! Turns an output script into the list of addresses shown for it and a
//! flag saying whether the output belongs in the address index. The
//! per-coin differences (zerocoin opcodes, cashaddr rendering) are selected
//! by [`ScriptFlavour`]; OP_RETURN and OMNI analysis is shared.

use bitcoin::hashes::{hash160, Hash};
use bitcoin::script::Instruction;
use bitcoin::Script;

use crate::address::{self, AddressCodec};
use crate::chain::{ChainPolicy, ScriptFlavour};
use crate::types::{AddressDescriptor, ScriptType};

pub const OP_ZEROCOINMINT: u8 = 0xc1;
pub const OP_ZEROCOINSPEND: u8 = 0xc2;

const OP_RETURN: u8 = 0x6a;
const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;

pub fn is_zerocoin_mint(script: &[u8]) -> bool {
    script.len() > 1 && script[0] == OP_ZEROCOINMINT
}

/// Spend scripts carry a full coin spend proof, hence the length floor.
pub fn is_zerocoin_spend(script: &[u8]) -> bool {
    script.len() >= 100 && script[0] == OP_ZEROCOINSPEND
}

// ==============================================================================
// Classifier
// ==============================================================================

/// Addresses extracted from an output script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptAddresses {
    pub script_type: ScriptType,
    pub addresses: Vec<String>,
    /// Whether the output is indexed under its (single) address.
    pub searchable: bool,
}

#[derive(Debug, Clone)]
pub struct ScriptClassifier {
    codec: AddressCodec,
    flavour: ScriptFlavour,
    amount_decimals: u32,
}

impl ScriptClassifier {
    pub fn new(codec: AddressCodec, policy: &ChainPolicy) -> Self {
        Self {
            codec,
            flavour: policy.script,
            amount_decimals: policy.amount_decimals,
        }
    }

    pub fn codec(&self) -> &AddressCodec {
        &self.codec
    }

    pub fn classify(&self, script: &Script) -> ScriptType {
        if self.flavour == ScriptFlavour::Zerocoin {
            if is_zerocoin_spend(script.as_bytes()) {
                return ScriptType::ZerocoinSpend;
            }
            if is_zerocoin_mint(script.as_bytes()) {
                return ScriptType::ZerocoinMint;
            }
        }
        address::standard_script_type(script)
    }

    /// Addresses of an output script and its searchable flag.
    ///
    /// Never fails: scripts without an address form yield an empty list.
    pub fn script_to_addresses(&self, script: &Script) -> ScriptAddresses {
        let script_type = self.classify(script);
        let (addresses, searchable) = match script_type {
            ScriptType::ZerocoinSpend => (vec!["Zerocoin Spend".to_owned()], false),
            ScriptType::ZerocoinMint => (vec!["Zerocoin Mint".to_owned()], false),
            ScriptType::P2pk => (
                self.codec.script_to_address(script).ok().into_iter().collect(),
                false,
            ),
            ScriptType::BareMultisig => (self.multisig_addresses(script), false),
            ScriptType::OpReturn => (
                try_parse_op_return(script.as_bytes(), self.amount_decimals)
                    .into_iter()
                    .collect(),
                false,
            ),
            ScriptType::Unknown => (Vec::new(), false),
            family => match self.codec.script_to_address(script) {
                Ok(address) => (vec![address], family.is_searchable()),
                Err(_) => (Vec::new(), false),
            },
        };
        ScriptAddresses {
            script_type,
            addresses,
            searchable,
        }
    }

    /// Indexing key of an output. P2PK outputs are keyed by the P2PKH
    /// script of the same key so both forms land on one address.
    pub fn addr_desc_from_output(&self, script: &Script) -> AddressDescriptor {
        AddressDescriptor::from(address::canonical_script(script))
    }

    /// Addresses of a stored descriptor.
    pub fn addresses_from_addr_desc(&self, desc: &AddressDescriptor) -> ScriptAddresses {
        self.script_to_addresses(desc.as_script())
    }

    /// Only outputs with a non-empty, non-OP_RETURN script reach the index.
    pub fn is_indexable(&self, script: &Script) -> bool {
        !script.is_empty() && !script.is_op_return()
    }

    fn multisig_addresses(&self, script: &Script) -> Vec<String> {
        script
            .instructions()
            .filter_map(|ins| match ins {
                Ok(Instruction::PushBytes(push)) if matches!(push.len(), 33 | 65) => {
                    Some(push.as_bytes())
                }
                _ => None,
            })
            .map(|key| self.codec.encode_p2pkh(&hash160::Hash::hash(key).to_byte_array()))
            .collect()
    }
}

// ==============================================================================
// OP_RETURN
// ==============================================================================

/// Human readable rendering of an OP_RETURN output.
///
/// Handles a direct push, `OP_PUSHDATA1` and `OP_PUSHDATA2`. Returns `None`
/// when the declared push length does not match the payload.
pub fn try_parse_op_return(script: &[u8], decimals: u32) -> Option<String> {
    if script.len() < 2 || script[0] != OP_RETURN {
        return None;
    }
    let direct = || (usize::from(script[1]), &script[2..]);
    let (len, data) = match script[1] {
        OP_PUSHDATA1 if script.len() > 2 => {
            let (len, data) = (usize::from(script[2]), &script[3..]);
            if len == data.len() {
                (len, data)
            } else {
                direct()
            }
        }
        OP_PUSHDATA2 if script.len() > 3 => (
            usize::from(u16::from_le_bytes([script[2], script[3]])),
            &script[4..],
        ),
        _ => direct(),
    };
    if len != data.len() {
        return None;
    }

    if let Some(omni) = try_parse_omni(data, decimals) {
        return Some(omni);
    }
    let rendered = match std::str::from_utf8(data) {
        Ok(text) => format!("({text})"),
        Err(_) => bitcoin::hex::DisplayHex::to_lower_hex_string(data),
    };
    Some(format!("OP_RETURN {rendered}"))
}

fn omni_currency(id: u32) -> Option<&'static str> {
    match id {
        1 => Some("Omni"),
        2 => Some("Test Omni"),
        31 => Some("TetherUS"),
        _ => None,
    }
}

/// OMNI Simple Send, transaction version 0 only.
fn try_parse_omni(data: &[u8], decimals: u32) -> Option<String> {
    const HEADER: [u8; 8] = *b"omni\0\0\0\0";
    if data.len() != 20 || data[..8] != HEADER {
        return None;
    }
    let currency_id = u32::from_be_bytes(data[8..12].try_into().ok()?);
    let currency = omni_currency(currency_id)?;
    let amount = u64::from_be_bytes(data[12..20].try_into().ok()?);
    Some(format!(
        "OMNI Simple Send: {} {currency} (#{currency_id})",
        format_amount(amount, decimals)
    ))
}

/// Base units as a decimal string with trailing fractional zeros removed.
pub fn format_amount(value: u64, decimals: u32) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }
    let padded = if digits.len() <= decimals {
        format!("{}{digits}", "0".repeat(decimals - digits.len() + 1))
    } else {
        digits
    };
    let (int, frac) = padded.split_at(padded.len() - decimals);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        int.to_owned()
    } else {
        format!("{int}.{frac}")
    }
}
