//! Backend configuration, read from the coin's JSON config file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::address::AddressFormat;
use crate::chain::{self, ChainParams, Coin};
use crate::error::{CoreError, FeeError};
use crate::fees::FeeProviderConfig;
use crate::rpc::RpcDialect;
use crate::xpub::XpubSettings;

const DEFAULT_RPC_TIMEOUT_SECS: u64 = 25;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackendConfig {
    pub coin: Coin,
    /// Chain tag such as `main`, `test` or `regtest`.
    #[serde(default = "default_network")]
    pub network: String,
    pub rpc_url: String,
    #[serde(default)]
    pub rpc_user: Option<String>,
    #[serde(default)]
    pub rpc_pass: Option<String>,
    #[serde(default)]
    pub rpc_cookie_file: Option<PathBuf>,
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
    /// Overrides the coin's parameter encoding.
    #[serde(default)]
    pub rpc_dialect: Option<RpcDialect>,
    #[serde(default)]
    pub rpc_requests_per_second: Option<u32>,
    /// Decode blocks locally from their raw bytes instead of asking the node
    /// for decoded JSON.
    #[serde(default)]
    pub parse_blocks: bool,
    #[serde(default)]
    pub address_format: String,
    #[serde(default)]
    pub alternative_estimate_fee: Option<String>,
    #[serde(default)]
    pub alternative_estimate_fee_params: String,
    #[serde(default)]
    pub xpub_magic: Option<u32>,
    #[serde(default)]
    pub xpub_magic_segwit_p2sh: Option<u32>,
    #[serde(default)]
    pub xpub_magic_segwit_native: Option<u32>,
    #[serde(default)]
    pub slip44: Option<u32>,
}

fn default_network() -> String {
    "main".to_owned()
}

fn default_rpc_timeout_secs() -> u64 {
    DEFAULT_RPC_TIMEOUT_SECS
}

impl BackendConfig {
    /// Minimal config for `coin` talking to `rpc_url`.
    pub fn new(coin: Coin, rpc_url: impl Into<String>) -> Self {
        Self {
            coin,
            network: default_network(),
            rpc_url: rpc_url.into(),
            rpc_user: None,
            rpc_pass: None,
            rpc_cookie_file: None,
            rpc_timeout_secs: DEFAULT_RPC_TIMEOUT_SECS,
            rpc_dialect: None,
            rpc_requests_per_second: None,
            parse_blocks: false,
            address_format: String::new(),
            alternative_estimate_fee: None,
            alternative_estimate_fee_params: String::new(),
            xpub_magic: None,
            xpub_magic_segwit_p2sh: None,
            xpub_magic_segwit_native: None,
            slip44: None,
        }
    }

    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CoreError::Config(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Check everything that can be checked without contacting the node.
    pub fn validate(&self) -> Result<(), CoreError> {
        crate::rpc::parse_connection(&self.rpc_url)?;
        crate::rpc::resolve_auth(
            self.rpc_user.as_deref(),
            self.rpc_pass.as_deref(),
            self.rpc_cookie_file.as_deref(),
        )?;
        if self.rpc_timeout_secs == 0 {
            return Err(CoreError::Config("rpc_timeout_secs must be at least 1".into()));
        }
        if self.rpc_requests_per_second == Some(0) {
            return Err(CoreError::Config(
                "rpc_requests_per_second must be at least 1".into(),
            ));
        }
        self.address_format()?;
        self.fee_provider()?;
        Ok(())
    }

    pub fn chain_params(&self) -> Result<&'static ChainParams, CoreError> {
        chain::lookup(self.coin, &self.network)
    }

    pub fn address_format(&self) -> Result<AddressFormat, CoreError> {
        self.address_format.parse().map_err(CoreError::Config)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    /// Configured dialect, else the coin's.
    pub fn rpc_dialect(&self) -> RpcDialect {
        self.rpc_dialect
            .unwrap_or_else(|| self.coin.policy().rpc_dialect)
    }

    pub fn fee_provider(&self) -> Result<Option<FeeProviderConfig>, CoreError> {
        let Some(source) = self.alternative_estimate_fee.as_deref() else {
            return Ok(None);
        };
        FeeProviderConfig::parse(source, &self.alternative_estimate_fee_params)
            .map(Some)
            .map_err(|e| match e {
                FeeError::InvalidConfig(msg) => CoreError::Config(msg),
                other => CoreError::Fee(other),
            })
    }

    /// The chain's extended key versions with any configured overrides.
    pub fn xpub_settings(&self, params: &ChainParams) -> XpubSettings {
        let defaults = XpubSettings::from_params(params);
        XpubSettings {
            xpub_magic: self.xpub_magic.unwrap_or(defaults.xpub_magic),
            xpub_magic_segwit_p2sh: self
                .xpub_magic_segwit_p2sh
                .unwrap_or(defaults.xpub_magic_segwit_p2sh),
            xpub_magic_segwit_native: self
                .xpub_magic_segwit_native
                .unwrap_or(defaults.xpub_magic_segwit_native),
            slip44: self.slip44.unwrap_or(defaults.slip44),
        }
    }
}
