//! Per-chain parameter records, the coin catalogue and the process-wide
//! registry keyed by network magic.
//!
//! Every coin starts from the Bitcoin template and overrides the handful of
//! fields that differ (magics, version bytes, HRPs). Behavioural differences
//! between coins live in [`ChainPolicy`], never in the parameter record.

mod coins;
mod policy;
mod registry;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use coins::Coin;
pub use policy::{BlockEnvelope, ChainPolicy, PackPolicy, ScriptFlavour, TxFormat, TxidHash};
pub use registry::{is_registered, lookup, lookup_by_magic, register, reset};

// ==============================================================================
// Chain Tag
// ==============================================================================

/// Which network of a coin a parameter record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainTag {
    Main,
    Test,
    Regtest,
    Signet,
}

impl ChainTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Test => "test",
            Self::Regtest => "regtest",
            Self::Signet => "signet",
        }
    }
}

impl fmt::Display for ChainTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" | "mainnet" => Ok(Self::Main),
            "test" | "testnet" | "testnet3" => Ok(Self::Test),
            "regtest" => Ok(Self::Regtest),
            "signet" => Ok(Self::Signet),
            other => Err(format!("unknown chain tag `{other}`")),
        }
    }
}

// ==============================================================================
// Parameter Record
// ==============================================================================

/// Hash function behind the 4-byte base58check checksum (and extended key
/// serialisation) of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumHasher {
    DoubleSha256,
    /// First four bytes of `groestl512(groestl512(payload))`.
    Groestl512D,
}

/// Immutable parameters of one network of one coin.
///
/// Version prefixes are byte slices because some forks (SnowGem) use
/// two-byte base58 prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainParams {
    pub coin: Coin,
    pub tag: ChainTag,
    pub magic: u32,
    pub pubkey_hash_prefix: &'static [u8],
    pub script_hash_prefix: &'static [u8],
    pub bech32_hrp: Option<&'static str>,
    pub cashaddr_prefix: Option<&'static str>,
    pub checksum_hasher: ChecksumHasher,
    pub xpub_magic: u32,
    pub xpub_magic_segwit_p2sh: u32,
    pub xpub_magic_segwit_native: u32,
    pub slip44: u32,
}

impl ChainParams {
    /// Length of the base58 version prefix.
    pub fn address_magic_len(&self) -> usize {
        self.pubkey_hash_prefix.len()
    }

    /// Human-readable `coin/tag` label used in logs and errors.
    pub fn label(&self) -> String {
        format!("{}/{}", self.coin, self.tag)
    }

    /// The policy bundle of the coin this record belongs to.
    pub fn policy(&self) -> &'static ChainPolicy {
        self.coin.policy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_tag_parses_aliases() {
        assert_eq!("main".parse::<ChainTag>(), Ok(ChainTag::Main));
        assert_eq!("testnet3".parse::<ChainTag>(), Ok(ChainTag::Test));
        assert_eq!("signet".parse::<ChainTag>(), Ok(ChainTag::Signet));
        assert!("moonnet".parse::<ChainTag>().is_err());
    }

    #[test]
    fn snowgem_uses_two_byte_prefixes() {
        let params = Coin::SnowGem.params(ChainTag::Main);
        assert_eq!(params.address_magic_len(), 2);
        assert_eq!(params.label(), "snowgem/main");
    }
}
