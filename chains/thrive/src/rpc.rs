//! Chain RPC seam.
//!
//! Diagnostics talk to the chain only through [`ChainRpc`], so tests can swap
//! in a fake. [`AlloyRpc`] is the HTTP implementation used by the binary.

use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::client::ClientBuilder;
use alloy::rpc::types::TransactionRequest;
use alloy::transports::http::Http;
use alloy::transports::TransportError;
use alloy_primitives::{Address, Bytes, U256};
use anyhow::{Context, Result};
use async_trait::async_trait;
use core_logic::{classify_failure, FailureKind};
use alloy::transports::http::reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    #[error("call reverted: {reason}")]
    Reverted { reason: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("transport error: {0}")]
    Transport(String),
}

impl RpcError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RpcError::Reverted { .. } => FailureKind::Reverted,
            RpcError::Rpc { message, .. } => classify_failure(message),
            RpcError::Transport(message) => classify_failure(message),
        }
    }

    /// Message without the variant prefix.
    pub fn detail(&self) -> &str {
        match self {
            RpcError::Reverted { reason } => reason,
            RpcError::Rpc { message, .. } => message,
            RpcError::Transport(message) => message,
        }
    }
}

impl From<TransportError> for RpcError {
    fn from(err: TransportError) -> Self {
        if let Some(payload) = err.as_error_resp() {
            let message = payload.message.to_string();
            // EIP-1474 uses code 3 for execution reverts; some nodes only say so in text.
            if payload.code == 3 || message.to_lowercase().contains("revert") {
                return RpcError::Reverted { reason: message };
            }
            return RpcError::Rpc {
                code: payload.code,
                message,
            };
        }
        RpcError::Transport(err.to_string())
    }
}

#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Bytecode stored at `address`; empty for EOAs and unused addresses.
    async fn get_code(&self, address: Address) -> Result<Bytes, RpcError>;

    /// Read-only `eth_call` against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError>;

    async fn get_balance(&self, address: Address) -> Result<U256, RpcError>;

    async fn chain_id(&self) -> Result<u64, RpcError>;
}

/// `ChainRpc` over an alloy HTTP provider.
#[derive(Clone)]
pub struct AlloyRpc {
    provider: Arc<dyn Provider + Send + Sync>,
}

impl AlloyRpc {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Self::new_from_reqwest(rpc_url, http_client)
    }

    pub fn new_from_reqwest(rpc_url: &str, http_client: Client) -> Result<Self> {
        let url = rpc_url.parse::<Url>().context("Invalid RPC URL")?;
        let transport = Http::with_client(http_client, url);
        let client = ClientBuilder::default().transport(transport, false);

        let provider: Arc<dyn Provider + Send + Sync> =
            Arc::new(ProviderBuilder::new().connect_client(client));

        Ok(Self { provider })
    }
}

#[async_trait]
impl ChainRpc for AlloyRpc {
    async fn get_code(&self, address: Address) -> Result<Bytes, RpcError> {
        Ok(self.provider.get_code_at(address).await?)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError> {
        let query = TransactionRequest::default().to(to).input(data.into());
        Ok(self.provider.call(query).await?)
    }

    async fn get_balance(&self, address: Address) -> Result<U256, RpcError> {
        Ok(self.provider.get_balance(address).await?)
    }

    async fn chain_id(&self) -> Result<u64, RpcError> {
        Ok(self.provider.get_chain_id().await?)
    }
}
