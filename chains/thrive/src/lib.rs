//! Thrive Probe - testnet and relay diagnostics
//!
//! Probes a chain for deployed contracts and exercises the Gelato relay
//! (sponsored calls, ERC-2771 sponsored calls with a concurrent-forwarder
//! fallback, and call-with-sync-fee) against deployed counter contracts.
//!
//! ```bash
//! cargo run -p thrive-probe -- contracts
//! cargo run -p thrive-probe -- erc2771
//! ```
//!
//! All network access goes through [`rpc::ChainRpc`] and
//! [`relay::RelayService`], so every task can run against fakes.

/// Emits one transcript line on the `probe_result` target.
#[macro_export]
macro_rules! report {
    ($($arg:tt)*) => {
        tracing::info!(target: "probe_result", $($arg)*)
    };
}

pub mod calldata;
pub mod config;
pub mod probe;
pub mod relay;
pub mod rpc;
pub mod runner;
pub mod task;

pub use config::{TargetAddress, ThriveConfig};
pub use probe::{FunctionVerdict, ProbeResult};
pub use relay::{RelayError, RelayRequest, RelayService, RelayTaskHandle};
pub use rpc::{AlloyRpc, ChainRpc, RpcError};
pub use task::TaskContext;
