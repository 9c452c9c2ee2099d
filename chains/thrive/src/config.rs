use alloy_primitives::{address, Address};
use anyhow::{Context, Result};
use config::{Config, File, FileFormat};
use core_logic::{ChainConfig, ConfigError};
use serde::Deserialize;
use std::path::Path;
use url::Url;

/// Sentinel the relay uses for the chain's native token.
pub const NATIVE_FEE_TOKEN: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// A labelled on-chain address from the target table.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TargetAddress {
    pub label: String,
    pub address: Address,
}

impl TargetAddress {
    pub fn new(label: impl Into<String>, address: Address) -> Self {
        Self {
            label: label.into(),
            address,
        }
    }

    /// Labels such as `simpleCounter` or `counterERC2771` get the trial-call probe.
    pub fn is_counter_like(&self) -> bool {
        self.label.to_lowercase().contains("counter")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_status_url")]
    pub status_url: String,
    /// Plain counter used by the sponsored call.
    pub sponsored_target: Address,
    /// ERC-2771 aware counter.
    pub erc2771_target: Address,
    /// `GelatoRelay1BalanceERC2771` trusted forwarder.
    pub forwarder: Address,
    /// `GelatoRelay1BalanceConcurrentERC2771` trusted forwarder.
    pub concurrent_forwarder: Address,
    /// Relay-context counter used by call-with-sync-fee.
    pub sync_fee_target: Address,
    #[serde(default = "default_fee_token")]
    pub fee_token: Address,
    #[serde(default = "default_sync_fee_functions")]
    pub sync_fee_functions: Vec<String>,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    #[serde(default = "default_user_deadline_secs")]
    pub user_deadline_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThriveConfig {
    pub network: ChainConfig,
    pub relay: RelayConfig,
    #[serde(default)]
    pub targets: Vec<TargetAddress>,
}

fn default_api_url() -> String {
    "https://api.gelato.digital".to_string()
}

fn default_status_url() -> String {
    "https://relay.gelato.digital/tasks/status".to_string()
}

fn default_fee_token() -> Address {
    NATIVE_FEE_TOKEN
}

fn default_sync_fee_functions() -> Vec<String> {
    [
        "increment",
        "incrementCounter",
        "incrementContext",
        "incrementWithRelay",
        "execute",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_gas_limit() -> u64 {
    500_000
}

fn default_user_deadline_secs() -> u64 {
    86_400
}

impl ThriveConfig {
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).is_file() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string(),
            }
            .into());
        }

        let settings = Config::builder()
            .add_source(File::with_name(path))
            .build()
            .with_context(|| format!("Failed to read config '{}'", path))?;

        let cfg: Self = settings
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!(e))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()?;

        let cfg: Self = settings
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!(e))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn chain_id(&self) -> u64 {
        self.network.chain_id
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rpc = &self.network.rpc_endpoint;
        match Url::parse(rpc) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(ConfigError::InvalidRpcUrl { url: rpc.clone() }),
        }

        if self.network.chain_id == 0 {
            return Err(ConfigError::InvalidValue {
                field: "network.chain_id".to_string(),
                reason: "must be non-zero".to_string(),
            });
        }

        for (field, value) in [
            ("relay.api_url", &self.relay.api_url),
            ("relay.status_url", &self.relay.status_url),
        ] {
            if Url::parse(value).is_err() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("'{}' is not a URL", value),
                });
            }
        }

        if self.relay.sync_fee_functions.is_empty() {
            return Err(ConfigError::MissingField {
                field: "relay.sync_fee_functions".to_string(),
            });
        }
        if let Some(bad) = self
            .relay
            .sync_fee_functions
            .iter()
            .find(|name| !crate::calldata::is_identifier(name))
        {
            return Err(ConfigError::InvalidValue {
                field: "relay.sync_fee_functions".to_string(),
                reason: format!("'{}' is not a function name", bad),
            });
        }

        if self.relay.gas_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "relay.gas_limit".to_string(),
                reason: "must be non-zero".to_string(),
            });
        }

        Ok(())
    }
}
