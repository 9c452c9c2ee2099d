//! Meta-transaction relay seam.
//!
//! [`RelayService`] is the boundary the relay diagnostics talk to;
//! [`GelatoRelay`] implements it over the Gelato Relay v2 HTTP API.

pub mod erc2771;
pub mod gelato;

pub use erc2771::{ForwarderMode, ReplayProtection, SignedErc2771Call};
pub use gelato::GelatoRelay;

use crate::rpc::RpcError;
use alloy::signers::local::PrivateKeySigner;
use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use core_logic::{classify_failure, FailureKind, NetworkError};
use std::fmt;
use thiserror::Error;

/// One relay submission. Built fresh per attempt; the `with_*`/`into_*`
/// helpers consume the value and return a new request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayRequest {
    pub chain_id: u64,
    pub target: Address,
    pub data: Bytes,
    pub fee_token: Option<Address>,
    /// Original sender for forwarder-based (ERC-2771) calls.
    pub user: Option<Address>,
    pub is_concurrent: bool,
    pub is_relay_context: bool,
}

impl RelayRequest {
    /// Sponsored call: the relay pays gas against the API key, no sender.
    pub fn sponsored(chain_id: u64, target: Address, data: Bytes) -> Self {
        Self {
            chain_id,
            target,
            data,
            fee_token: None,
            user: None,
            is_concurrent: false,
            is_relay_context: false,
        }
    }

    pub fn erc2771(chain_id: u64, target: Address, data: Bytes, user: Address) -> Self {
        Self {
            user: Some(user),
            ..Self::sponsored(chain_id, target, data)
        }
    }

    /// Call-with-sync-fee: the target pays the relay in `fee_token` itself.
    pub fn sync_fee(chain_id: u64, target: Address, data: Bytes, fee_token: Address) -> Self {
        Self {
            fee_token: Some(fee_token),
            is_relay_context: true,
            ..Self::sponsored(chain_id, target, data)
        }
    }

    pub fn into_concurrent(self) -> Self {
        Self {
            is_concurrent: true,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncFeeOptions {
    pub gas_limit: Option<u64>,
}

/// Task id returned by the relay on acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelayTaskHandle(String);

impl RelayTaskHandle {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self(task_id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    pub fn tracking_url(&self, status_url: &str) -> String {
        format!("{}/{}", status_url.trim_end_matches('/'), self.0)
    }
}

impl fmt::Display for RelayTaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug, Clone)]
pub enum RelayError {
    #[error("relay rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("failed to read user nonce from forwarder {forwarder}: {source}")]
    UserNonce {
        forwarder: Address,
        #[source]
        source: RpcError,
    },

    #[error("request is missing field '{field}'")]
    InvalidRequest { field: &'static str },

    #[error("failed to sign relay request: {0}")]
    Signing(String),

    /// Pre-classified failure, reported by doubles that know their category.
    #[error("{message}")]
    Classified { kind: FailureKind, message: String },
}

impl RelayError {
    /// Failure category. Only [`RelayError::Classified`] and
    /// [`RelayError::UserNonce`] are structural; the rest is text inspection.
    pub fn kind(&self) -> FailureKind {
        match self {
            RelayError::Classified { kind, .. } => *kind,
            RelayError::UserNonce { .. } => FailureKind::NonceConflict,
            other => classify_failure(&other.to_string()),
        }
    }
}

#[async_trait]
pub trait RelayService: Send + Sync {
    async fn sponsored_call(
        &self,
        request: &RelayRequest,
        api_key: &str,
    ) -> Result<RelayTaskHandle, RelayError>;

    /// Signs the request as `signer` for `forwarder` and submits it.
    /// `request.is_concurrent` picks the salt-based forwarder flavour.
    async fn sponsored_call_erc2771(
        &self,
        request: &RelayRequest,
        signer: &PrivateKeySigner,
        forwarder: Address,
        api_key: &str,
    ) -> Result<RelayTaskHandle, RelayError>;

    async fn call_with_sync_fee(
        &self,
        request: &RelayRequest,
        options: &SyncFeeOptions,
    ) -> Result<RelayTaskHandle, RelayError>;
}
