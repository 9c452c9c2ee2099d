use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// Environment variable holding the hex-encoded signing key.
pub const SIGNING_KEY_ENV: &str = "PRIVATE_KEY";
/// Environment variable holding the relay sponsor API key.
pub const RELAY_API_KEY_ENV: &str = "GELATO_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainConfig {
    pub name: String,
    pub rpc_endpoint: String,
    pub chain_id: u64,
}

/// Secrets read once at startup.
///
/// Both values are optional at load time; each diagnostic asks for the ones
/// it needs and gets a [`ConfigError::MissingEnv`] before touching the network
/// when one is absent.
#[derive(Clone, Default)]
pub struct Credentials {
    signing_key: Option<Zeroizing<String>>,
    relay_api_key: Option<Zeroizing<String>>,
}

impl Credentials {
    pub fn new(signing_key: Option<String>, relay_api_key: Option<String>) -> Self {
        Self {
            signing_key: non_blank(signing_key),
            relay_api_key: non_blank(relay_api_key),
        }
    }

    /// Reads `.env` (if present) and then the process environment.
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(lookup(SIGNING_KEY_ENV), lookup(RELAY_API_KEY_ENV))
    }

    pub fn signing_key(&self) -> Result<&str, ConfigError> {
        self.signing_key
            .as_deref()
            .map(String::as_str)
            .ok_or_else(|| ConfigError::MissingEnv {
                var: SIGNING_KEY_ENV.to_string(),
            })
    }

    pub fn relay_api_key(&self) -> Result<&str, ConfigError> {
        self.relay_api_key
            .as_deref()
            .map(String::as_str)
            .ok_or_else(|| ConfigError::MissingEnv {
                var: RELAY_API_KEY_ENV.to_string(),
            })
    }

    pub fn has_signing_key(&self) -> bool {
        self.signing_key.is_some()
    }

    pub fn has_relay_api_key(&self) -> bool {
        self.relay_api_key.is_some()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |present: bool| if present { "<redacted>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("signing_key", &redact(self.has_signing_key()))
            .field("relay_api_key", &redact(self.has_relay_api_key()))
            .finish()
    }
}

fn non_blank(value: Option<String>) -> Option<Zeroizing<String>> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(Zeroizing::new)
}
