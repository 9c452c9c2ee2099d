#![allow(dead_code)]

use alloy::signers::local::PrivateKeySigner;
use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use core_logic::{Credentials, FailureKind};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use thrive_probe::relay::SyncFeeOptions;
use thrive_probe::{
    ChainRpc, RelayError, RelayRequest, RelayService, RelayTaskHandle, RpcError, TaskContext,
    ThriveConfig,
};

pub const TEST_SIGNING_KEY: &str =
    "1111111111111111111111111111111111111111111111111111111111111111";
pub const TEST_API_KEY: &str = "sponsor-key";

pub const FORWARDER: &str = "0x61F2976610970AFeDc1d83229e1E21bdc3D5cbE4";
pub const CONCURRENT_FORWARDER: &str = "0x2e8235caa6a16E64D7F73b8DBC257369FBF2972D";

pub const TEST_CONFIG: &str = r#"
[network]
name = "Thrive Testnet"
rpc_endpoint = "https://rpc.thrive-testnet.t.raas.gelato.cloud"
chain_id = 1991

[relay]
sponsored_target = "0xE27C1359cf02B49acC6474311Bd79d1f10b1f8De"
erc2771_target = "0xF9B1b52f94dfB39B2E2Efac268474855E05A5f9d"
forwarder = "0x61F2976610970AFeDc1d83229e1E21bdc3D5cbE4"
concurrent_forwarder = "0x2e8235caa6a16E64D7F73b8DBC257369FBF2972D"
sync_fee_target = "0x317c56D44be1444302983c640532B20FBC0A3996"

[[targets]]
label = "feeToken"
address = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE"

[[targets]]
label = "simpleCounter"
address = "0xE27C1359cf02B49acC6474311Bd79d1f10b1f8De"
"#;

pub fn addr(raw: &str) -> Address {
    raw.parse().expect("valid address")
}

pub fn test_config() -> ThriveConfig {
    ThriveConfig::from_toml_str(TEST_CONFIG).expect("test config parses")
}

pub fn full_credentials() -> Credentials {
    Credentials::new(
        Some(TEST_SIGNING_KEY.to_string()),
        Some(TEST_API_KEY.to_string()),
    )
}

pub fn test_signer() -> PrivateKeySigner {
    TEST_SIGNING_KEY.parse().expect("valid key")
}

pub fn context(rpc: Arc<FakeRpc>, relay: Arc<FakeRelay>, credentials: Credentials) -> TaskContext {
    TaskContext::new(rpc, relay, test_config(), credentials)
}

pub fn classified(kind: FailureKind, message: &str) -> RelayError {
    RelayError::Classified {
        kind,
        message: message.to_string(),
    }
}

/// Scripted chain: unknown addresses have no code and every unscripted call fails.
#[derive(Default)]
pub struct FakeRpc {
    pub code: HashMap<Address, Result<Bytes, RpcError>>,
    pub calls: HashMap<Address, Result<Bytes, RpcError>>,
    pub balance: U256,
    pub chain_id: u64,
    pub get_code_count: AtomicUsize,
    pub call_count: AtomicUsize,
}

impl FakeRpc {
    pub fn new() -> Self {
        Self {
            chain_id: 1991,
            ..Default::default()
        }
    }

    pub fn with_code(mut self, address: Address, code: Result<Bytes, RpcError>) -> Self {
        self.code.insert(address, code);
        self
    }

    pub fn with_call(mut self, address: Address, result: Result<Bytes, RpcError>) -> Self {
        self.calls.insert(address, result);
        self
    }

    pub fn total_calls(&self) -> usize {
        self.get_code_count.load(Ordering::SeqCst) + self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainRpc for FakeRpc {
    async fn get_code(&self, address: Address) -> Result<Bytes, RpcError> {
        self.get_code_count.fetch_add(1, Ordering::SeqCst);
        self.code
            .get(&address)
            .cloned()
            .unwrap_or_else(|| Ok(Bytes::new()))
    }

    async fn call(&self, to: Address, _data: Bytes) -> Result<Bytes, RpcError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls
            .get(&to)
            .cloned()
            .unwrap_or_else(|| Err(RpcError::Transport("no scripted call".to_string())))
    }

    async fn get_balance(&self, _address: Address) -> Result<U256, RpcError> {
        Ok(self.balance)
    }

    async fn chain_id(&self) -> Result<u64, RpcError> {
        Ok(self.chain_id)
    }
}

/// One submission seen by [`FakeRelay`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub request: RelayRequest,
    pub forwarder: Option<Address>,
}

/// Relay double that replays queued outcomes in order and records what it was sent.
#[derive(Default)]
pub struct FakeRelay {
    responses: Mutex<VecDeque<Result<RelayTaskHandle, RelayError>>>,
    submissions: Mutex<Vec<Submission>>,
    calls: AtomicUsize,
}

impl FakeRelay {
    pub fn scripted(responses: Vec<Result<RelayTaskHandle, RelayError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    fn next(
        &self,
        request: &RelayRequest,
        forwarder: Option<Address>,
    ) -> Result<RelayTaskHandle, RelayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.submissions.lock().unwrap().push(Submission {
            request: request.clone(),
            forwarder,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(classified(FailureKind::Other, "no scripted response")))
    }
}

#[async_trait]
impl RelayService for FakeRelay {
    async fn sponsored_call(
        &self,
        request: &RelayRequest,
        _api_key: &str,
    ) -> Result<RelayTaskHandle, RelayError> {
        self.next(request, None)
    }

    async fn sponsored_call_erc2771(
        &self,
        request: &RelayRequest,
        _signer: &PrivateKeySigner,
        forwarder: Address,
        _api_key: &str,
    ) -> Result<RelayTaskHandle, RelayError> {
        self.next(request, Some(forwarder))
    }

    async fn call_with_sync_fee(
        &self,
        request: &RelayRequest,
        _options: &SyncFeeOptions,
    ) -> Result<RelayTaskHandle, RelayError> {
        self.next(request, None)
    }
}
