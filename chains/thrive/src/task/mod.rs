//! Diagnostic tasks.
//!
//! Each task is an independent linear procedure run against a [`TaskContext`].
//! Sweeps (`t01`, `t02`, `t05`) isolate per-item failures and keep going;
//! relay trials (`t03`, `t04`) fail fast and return the error to the runner.

use crate::config::ThriveConfig;
use crate::relay::RelayService;
use crate::rpc::ChainRpc;
use alloy::signers::local::PrivateKeySigner;
use core_logic::{ConfigError, Credentials};
use std::sync::Arc;

pub mod t01_contract_code;
pub mod t02_function_probe;
pub mod t03_sponsored_call;
pub mod t04_sponsored_call_erc2771;
pub mod t05_call_with_sync_fee;

pub use self::t01_contract_code::ContractCodeTask;
pub use self::t02_function_probe::FunctionProbeTask;
pub use self::t03_sponsored_call::SponsoredCallTask;
pub use self::t04_sponsored_call_erc2771::SponsoredCallErc2771Task;
pub use self::t05_call_with_sync_fee::CallWithSyncFeeTask;

pub use core_logic::traits::{Task, TaskResult};

#[derive(Clone)]
pub struct TaskContext {
    pub rpc: Arc<dyn ChainRpc>,
    pub relay: Arc<dyn RelayService>,
    pub config: ThriveConfig,
    pub credentials: Credentials,
}

impl TaskContext {
    pub fn new(
        rpc: Arc<dyn ChainRpc>,
        relay: Arc<dyn RelayService>,
        config: ThriveConfig,
        credentials: Credentials,
    ) -> Self {
        Self {
            rpc,
            relay,
            config,
            credentials,
        }
    }

    /// Parses the signing key from the environment credentials.
    pub fn signer(&self) -> Result<PrivateKeySigner, ConfigError> {
        let key = self.credentials.signing_key()?;
        key.parse::<PrivateKeySigner>()
            .map_err(|e| ConfigError::InvalidValue {
                field: core_logic::SIGNING_KEY_ENV.to_string(),
                reason: e.to_string(),
            })
    }

    /// Both secrets the relay trials need, checked before any network call.
    pub fn relay_credentials(&self) -> Result<(PrivateKeySigner, &str), ConfigError> {
        let api_key = self.credentials.relay_api_key()?;
        let signer = self.signer()?;
        Ok((signer, api_key))
    }

    pub fn tracking_url(&self, handle: &crate::relay::RelayTaskHandle) -> String {
        handle.tracking_url(&self.config.relay.status_url)
    }
}

// Trait alias
pub type ThriveTask = dyn Task<TaskContext> + Send + Sync;
