use super::erc2771::{self, ReplayProtection, SignedErc2771Call};
use super::{RelayError, RelayRequest, RelayService, RelayTaskHandle, SyncFeeOptions};
use crate::rpc::{ChainRpc, RpcError};
use alloy::signers::local::PrivateKeySigner;
use alloy_primitives::{Address, Bytes, B256};
use anyhow::Context;
use async_trait::async_trait;
use core_logic::NetworkError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const SPONSORED_CALL_PATH: &str = "relays/v2/sponsored-call";
const SPONSORED_CALL_ERC2771_PATH: &str = "relays/v2/sponsored-call-erc2771";
const CALL_WITH_SYNC_FEE_PATH: &str = "relays/v2/call-with-sync-fee";

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SponsoredCallBody<'a> {
    pub chain_id: String,
    pub target: Address,
    pub data: &'a Bytes,
    pub sponsor_api_key: &'a str,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SponsoredCallErc2771Body<'a> {
    pub chain_id: String,
    pub target: Address,
    pub data: &'a Bytes,
    pub user: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_nonce: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_salt: Option<B256>,
    pub user_deadline: u64,
    pub user_signature: &'a Bytes,
    pub sponsor_api_key: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_concurrent: bool,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallWithSyncFeeBody<'a> {
    pub chain_id: String,
    pub target: Address,
    pub data: &'a Bytes,
    pub fee_token: Address,
    pub is_relay_context: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskResponse {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

impl<'a> SponsoredCallErc2771Body<'a> {
    pub fn new(
        request: &'a RelayRequest,
        signed: &'a SignedErc2771Call,
        api_key: &'a str,
    ) -> Result<Self, RelayError> {
        let (user_nonce, user_salt) = match signed.protection {
            ReplayProtection::Nonce(nonce) => {
                let nonce = u64::try_from(nonce).map_err(|_| {
                    RelayError::Signing(format!("user nonce {} does not fit the relay payload", nonce))
                })?;
                (Some(nonce), None)
            }
            ReplayProtection::Salt(salt) => (None, Some(salt)),
        };

        Ok(Self {
            chain_id: request.chain_id.to_string(),
            target: request.target,
            data: &request.data,
            user: signed.user,
            user_nonce,
            user_salt,
            user_deadline: signed.deadline,
            user_signature: &signed.signature,
            sponsor_api_key: api_key,
            is_concurrent: user_salt.is_some(),
        })
    }
}

/// Gelato Relay v2 HTTP client.
///
/// Holds a [`ChainRpc`] because sequential ERC-2771 calls need the user's
/// nonce from the forwarder before signing.
#[derive(Clone)]
pub struct GelatoRelay {
    client: Client,
    api_url: String,
    rpc: Arc<dyn ChainRpc>,
    user_deadline: Duration,
}

impl GelatoRelay {
    pub fn new(
        api_url: &str,
        rpc: Arc<dyn ChainRpc>,
        user_deadline: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            rpc,
            user_deadline,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<RelayTaskHandle, RelayError> {
        let url = self.endpoint(path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| network_error(&url, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| network_error(&url, e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.message)
                .unwrap_or(text);
            return Err(RelayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: TaskResponse =
            serde_json::from_str(&text).map_err(|e| NetworkError::InvalidResponse {
                endpoint: url.clone(),
                reason: e.to_string(),
            })?;
        Ok(RelayTaskHandle::new(parsed.task_id))
    }

    async fn user_nonce(
        &self,
        forwarder: Address,
        user: Address,
    ) -> Result<ReplayProtection, RelayError> {
        let raw = self
            .rpc
            .call(forwarder, erc2771::user_nonce_call(user))
            .await
            .map_err(|source| RelayError::UserNonce { forwarder, source })?;

        let nonce = erc2771::decode_user_nonce(&raw).ok_or_else(|| RelayError::UserNonce {
            forwarder,
            source: RpcError::Transport(format!(
                "empty userNonce() result ({} bytes); no forwarder code at this address?",
                raw.len()
            )),
        })?;
        Ok(ReplayProtection::Nonce(nonce))
    }

    fn deadline(&self) -> u64 {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        now + self.user_deadline.as_secs()
    }
}

fn network_error(endpoint: &str, err: reqwest::Error) -> RelayError {
    let endpoint = endpoint.to_string();
    let err = if err.is_timeout() {
        NetworkError::Timeout {
            timeout_ms: 30_000,
            endpoint,
        }
    } else if err.is_connect() {
        NetworkError::ConnectionRefused {
            endpoint,
            reason: err.to_string(),
        }
    } else if let Some(status) = err.status() {
        NetworkError::HttpError {
            status_code: status.as_u16(),
            endpoint,
        }
    } else {
        NetworkError::InvalidResponse {
            endpoint,
            reason: err.to_string(),
        }
    };
    RelayError::Network(err)
}

#[async_trait]
impl RelayService for GelatoRelay {
    async fn sponsored_call(
        &self,
        request: &RelayRequest,
        api_key: &str,
    ) -> Result<RelayTaskHandle, RelayError> {
        let body = SponsoredCallBody {
            chain_id: request.chain_id.to_string(),
            target: request.target,
            data: &request.data,
            sponsor_api_key: api_key,
        };
        self.post(SPONSORED_CALL_PATH, &body).await
    }

    async fn sponsored_call_erc2771(
        &self,
        request: &RelayRequest,
        signer: &PrivateKeySigner,
        forwarder: Address,
        api_key: &str,
    ) -> Result<RelayTaskHandle, RelayError> {
        let user = request
            .user
            .ok_or(RelayError::InvalidRequest { field: "user" })?;

        let protection = if request.is_concurrent {
            ReplayProtection::random_salt()
        } else {
            self.user_nonce(forwarder, user).await?
        };

        let signed =
            erc2771::sign_call(request, signer, forwarder, protection, self.deadline()).await?;
        let body = SponsoredCallErc2771Body::new(request, &signed, api_key)?;
        self.post(SPONSORED_CALL_ERC2771_PATH, &body).await
    }

    async fn call_with_sync_fee(
        &self,
        request: &RelayRequest,
        options: &SyncFeeOptions,
    ) -> Result<RelayTaskHandle, RelayError> {
        let fee_token = request
            .fee_token
            .ok_or(RelayError::InvalidRequest { field: "fee_token" })?;

        let body = CallWithSyncFeeBody {
            chain_id: request.chain_id.to_string(),
            target: request.target,
            data: &request.data,
            fee_token,
            is_relay_context: request.is_relay_context,
            gas_limit: options.gas_limit.map(|g| g.to_string()),
        };
        self.post(CALL_WITH_SYNC_FEE_PATH, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    struct NonceRpc(Result<Bytes, RpcError>);

    #[async_trait]
    impl ChainRpc for NonceRpc {
        async fn get_code(&self, _address: Address) -> Result<Bytes, RpcError> {
            Ok(Bytes::new())
        }

        async fn call(&self, _to: Address, _data: Bytes) -> Result<Bytes, RpcError> {
            self.0.clone()
        }

        async fn get_balance(&self, _address: Address) -> Result<U256, RpcError> {
            Ok(U256::ZERO)
        }

        async fn chain_id(&self) -> Result<u64, RpcError> {
            Ok(1991)
        }
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(split) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..split]
            .lines()
            .find_map(|line| {
                let (key, value) = line.split_once(':')?;
                if key.eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);
        raw.len() >= split + 4 + content_length
    }

    /// Answers one HTTP request with a canned response; the join handle
    /// yields the raw request text.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if request_complete(&raw) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&raw).into_owned()
        });

        (url, handle)
    }

    fn relay(api_url: &str, nonce: Result<Bytes, RpcError>) -> GelatoRelay {
        GelatoRelay::new(api_url, Arc::new(NonceRpc(nonce)), Duration::from_secs(60)).unwrap()
    }

    fn sponsored_request() -> RelayRequest {
        RelayRequest::sponsored(1991, Address::repeat_byte(0x22), Bytes::from(vec![0xd0, 0x9d]))
    }

    fn nonce_word(value: u8) -> Bytes {
        let mut word = [0u8; 32];
        word[31] = value;
        Bytes::from(word.to_vec())
    }

    #[tokio::test]
    async fn accepted_call_returns_task_id() {
        let (url, server) = serve_once("201 Created", r#"{"taskId":"0xabc"}"#).await;

        let handle = relay(&url, Ok(Bytes::new()))
            .sponsored_call(&sponsored_request(), "key")
            .await
            .unwrap();
        let seen = server.await.unwrap();

        assert_eq!(handle.id(), "0xabc");
        assert!(seen.starts_with("POST /relays/v2/sponsored-call HTTP/1.1"));
        assert!(seen.contains(r#""sponsorApiKey":"key""#));
        assert!(seen.contains(r#""chainId":"1991""#));
    }

    #[tokio::test]
    async fn rejection_uses_json_message() {
        let (url, _server) =
            serve_once("400 Bad Request", r#"{"message":"Unauthorized sponsor"}"#).await;

        let err = relay(&url, Ok(Bytes::new()))
            .sponsored_call(&sponsored_request(), "key")
            .await
            .unwrap_err();

        match err {
            RelayError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Unauthorized sponsor");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejection_falls_back_to_raw_body() {
        let (url, _server) = serve_once("502 Bad Gateway", "upstream down").await;

        let err = relay(&url, Ok(Bytes::new()))
            .sponsored_call(&sponsored_request(), "key")
            .await
            .unwrap_err();

        match err {
            RelayError::Rejected { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_success_body_is_invalid_response() {
        let (url, _server) = serve_once("200 OK", "not json").await;

        let err = relay(&url, Ok(Bytes::new()))
            .sponsored_call(&sponsored_request(), "key")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RelayError::Network(NetworkError::InvalidResponse { .. })
        ));
    }

    #[tokio::test]
    async fn sequential_call_sends_forwarder_nonce() {
        let (url, server) = serve_once("201 Created", r#"{"taskId":"0xseq"}"#).await;
        let signer = PrivateKeySigner::random();
        let request = RelayRequest::erc2771(
            1991,
            Address::repeat_byte(0x33),
            Bytes::from(vec![0xd0, 0x9d]),
            signer.address(),
        );

        let handle = relay(&url, Ok(nonce_word(5)))
            .sponsored_call_erc2771(&request, &signer, Address::repeat_byte(0x61), "key")
            .await
            .unwrap();
        let seen = server.await.unwrap();

        assert_eq!(handle.id(), "0xseq");
        assert!(seen.starts_with("POST /relays/v2/sponsored-call-erc2771 HTTP/1.1"));
        assert!(seen.contains(r#""userNonce":5"#));
        assert!(!seen.contains("isConcurrent"));
    }

    #[tokio::test]
    async fn empty_nonce_result_is_user_nonce_error() {
        let signer = PrivateKeySigner::random();
        let forwarder = Address::repeat_byte(0x61);
        let request = RelayRequest::erc2771(
            1991,
            Address::repeat_byte(0x33),
            Bytes::new(),
            signer.address(),
        );

        // Port 9 is never contacted: the nonce read fails first.
        let err = relay("http://127.0.0.1:9", Ok(Bytes::new()))
            .sponsored_call_erc2771(&request, &signer, forwarder, "key")
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::UserNonce { forwarder: f, .. } if f == forwarder));
        assert_eq!(err.kind(), core_logic::FailureKind::NonceConflict);
    }

    #[tokio::test]
    async fn failed_nonce_read_is_user_nonce_error() {
        let signer = PrivateKeySigner::random();
        let request = RelayRequest::erc2771(
            1991,
            Address::repeat_byte(0x33),
            Bytes::new(),
            signer.address(),
        );
        let reverted = RpcError::Reverted {
            reason: "execution reverted".into(),
        };

        let err = relay("http://127.0.0.1:9", Err(reverted.clone()))
            .sponsored_call_erc2771(&request, &signer, Address::repeat_byte(0x61), "key")
            .await
            .unwrap_err();

        match err {
            RelayError::UserNonce { source, .. } => assert_eq!(source, reverted),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn sponsored_body_uses_relay_field_names() {
        let data = Bytes::from(vec![0xd0, 0x9d, 0xe0, 0x8a]);
        let body = SponsoredCallBody {
            chain_id: 1991.to_string(),
            target: Address::repeat_byte(0x22),
            data: &data,
            sponsor_api_key: "key",
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["chainId"], json!("1991"));
        assert_eq!(value["data"], json!("0xd09de08a"));
        assert_eq!(value["sponsorApiKey"], json!("key"));
    }

    #[test]
    fn concurrent_body_carries_salt_and_flag() {
        let request = RelayRequest::erc2771(
            1991,
            Address::repeat_byte(0x33),
            Bytes::new(),
            Address::repeat_byte(0x44),
        )
        .into_concurrent();
        let signed = SignedErc2771Call {
            user: Address::repeat_byte(0x44),
            protection: ReplayProtection::Salt(B256::repeat_byte(0x55)),
            deadline: 1_700_000_000,
            signature: Bytes::from(vec![1u8; 65]),
            signing_hash: B256::ZERO,
        };

        let body = SponsoredCallErc2771Body::new(&request, &signed, "key").unwrap();
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["isConcurrent"], json!(true));
        assert!(value.get("userNonce").is_none());
        assert!(value["userSalt"].as_str().unwrap().starts_with("0x5555"));
        assert_eq!(value["userDeadline"], json!(1_700_000_000u64));
    }

    #[test]
    fn sequential_body_omits_concurrency_fields() {
        let request = RelayRequest::erc2771(
            1991,
            Address::repeat_byte(0x33),
            Bytes::new(),
            Address::repeat_byte(0x44),
        );
        let signed = SignedErc2771Call {
            user: Address::repeat_byte(0x44),
            protection: ReplayProtection::Nonce(alloy_primitives::U256::from(3)),
            deadline: 10,
            signature: Bytes::from(vec![1u8; 65]),
            signing_hash: B256::ZERO,
        };

        let value =
            serde_json::to_value(SponsoredCallErc2771Body::new(&request, &signed, "key").unwrap())
                .unwrap();
        assert_eq!(value["userNonce"], json!(3));
        assert!(value.get("userSalt").is_none());
        assert!(value.get("isConcurrent").is_none());
    }
}
