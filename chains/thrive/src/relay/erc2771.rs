//! EIP-712 payloads for the relay's ERC-2771 trusted forwarders.
//!
//! Sequential forwarders protect against replay with a per-user nonce read
//! from the forwarder; concurrent forwarders take a random salt instead, so
//! parallel submissions never collide on ordering.

use super::{RelayError, RelayRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{eip712_domain, sol, Eip712Domain, SolStruct};

sol! {
    #[derive(Debug)]
    struct SponsoredCallERC2771 {
        uint256 chainId;
        address target;
        bytes data;
        address user;
        uint256 userNonce;
        uint256 userDeadline;
    }

    #[derive(Debug)]
    struct SponsoredCallConcurrentERC2771 {
        uint256 chainId;
        address target;
        bytes data;
        address user;
        bytes32 userSalt;
        uint256 userDeadline;
    }

    interface IGelatoRelayERC2771 {
        function userNonce(address account) external view returns (uint256);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwarderMode {
    Sequential,
    Concurrent,
}

impl ForwarderMode {
    /// EIP-712 domain name the forwarder contract was deployed with.
    pub fn domain_name(&self) -> &'static str {
        match self {
            ForwarderMode::Sequential => "GelatoRelay1BalanceERC2771",
            ForwarderMode::Concurrent => "GelatoRelay1BalanceConcurrentERC2771",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayProtection {
    Nonce(U256),
    Salt(B256),
}

impl ReplayProtection {
    pub fn mode(&self) -> ForwarderMode {
        match self {
            ReplayProtection::Nonce(_) => ForwarderMode::Sequential,
            ReplayProtection::Salt(_) => ForwarderMode::Concurrent,
        }
    }

    pub fn random_salt() -> Self {
        ReplayProtection::Salt(B256::from(rand::random::<[u8; 32]>()))
    }
}

/// Everything the relay needs besides the request itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedErc2771Call {
    pub user: Address,
    pub protection: ReplayProtection,
    pub deadline: u64,
    pub signature: Bytes,
    pub signing_hash: B256,
}

pub fn forwarder_domain(mode: ForwarderMode, chain_id: u64, forwarder: Address) -> Eip712Domain {
    eip712_domain! {
        name: mode.domain_name(),
        version: "1",
        chain_id: chain_id,
        verifying_contract: forwarder,
    }
}

/// Call data for `userNonce(user)` on a sequential forwarder.
pub fn user_nonce_call(user: Address) -> Bytes {
    use alloy_sol_types::SolCall;
    IGelatoRelayERC2771::userNonceCall { account: user }
        .abi_encode()
        .into()
}

/// Decodes a single `uint256` return word. An empty result means the
/// forwarder has no code at that address.
pub fn decode_user_nonce(raw: &[u8]) -> Option<U256> {
    if raw.len() < 32 {
        return None;
    }
    Some(U256::from_be_slice(&raw[..32]))
}

pub fn signing_hash(
    request: &RelayRequest,
    user: Address,
    forwarder: Address,
    protection: ReplayProtection,
    deadline: u64,
) -> B256 {
    let domain = forwarder_domain(protection.mode(), request.chain_id, forwarder);
    let chain_id = U256::from(request.chain_id);
    let user_deadline = U256::from(deadline);

    match protection {
        ReplayProtection::Nonce(nonce) => SponsoredCallERC2771 {
            chainId: chain_id,
            target: request.target,
            data: request.data.clone(),
            user,
            userNonce: nonce,
            userDeadline: user_deadline,
        }
        .eip712_signing_hash(&domain),
        ReplayProtection::Salt(salt) => SponsoredCallConcurrentERC2771 {
            chainId: chain_id,
            target: request.target,
            data: request.data.clone(),
            user,
            userSalt: salt,
            userDeadline: user_deadline,
        }
        .eip712_signing_hash(&domain),
    }
}

pub async fn sign_call(
    request: &RelayRequest,
    signer: &PrivateKeySigner,
    forwarder: Address,
    protection: ReplayProtection,
    deadline: u64,
) -> Result<SignedErc2771Call, RelayError> {
    let user = request
        .user
        .ok_or(RelayError::InvalidRequest { field: "user" })?;

    if user != signer.address() {
        return Err(RelayError::Signing(format!(
            "request user {} does not match signer {}",
            user,
            signer.address()
        )));
    }

    let hash = signing_hash(request, user, forwarder, protection, deadline);
    let signature = signer
        .sign_hash(&hash)
        .await
        .map_err(|e| RelayError::Signing(e.to_string()))?;

    Ok(SignedErc2771Call {
        user,
        protection,
        deadline,
        signature: Bytes::from(signature.as_bytes().to_vec()),
        signing_hash: hash,
    })
}
