use crate::calldata::zero_arg_call;
use crate::relay::{RelayError, RelayRequest, RelayTaskHandle, SyncFeeOptions};
use crate::report;
use crate::task::{Task, TaskContext, TaskResult};
use alloy_primitives::utils::format_ether;
use anyhow::Result;
use async_trait::async_trait;
use core_logic::{truncate_message, FailureKind};

/// Tries call-with-sync-fee against the relay-context counter with each
/// candidate function name and reports which ones the relay accepts.
pub struct CallWithSyncFeeTask;

impl CallWithSyncFeeTask {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CallWithSyncFeeTask {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncFeeAttempt {
    Accepted(RelayTaskHandle),
    WrongSignature(String),
    Failed(String),
}

impl SyncFeeAttempt {
    pub fn from_outcome(outcome: Result<RelayTaskHandle, RelayError>) -> Self {
        match outcome {
            Ok(handle) => SyncFeeAttempt::Accepted(handle),
            Err(e) if is_wrong_signature(&e) => SyncFeeAttempt::WrongSignature(e.to_string()),
            Err(e) => SyncFeeAttempt::Failed(e.to_string()),
        }
    }
}

/// Any mention of a function or method counts, even next to revert or nonce
/// text, so the ordered classifier is not used here.
fn is_wrong_signature(err: &RelayError) -> bool {
    match err {
        RelayError::Classified { kind, .. } => *kind == FailureKind::MissingFunction,
        other => {
            let text = other.to_string().to_lowercase();
            text.contains("function") || text.contains("method")
        }
    }
}

#[async_trait]
impl Task<TaskContext> for CallWithSyncFeeTask {
    fn name(&self) -> &str {
        "05_callWithSyncFee"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<TaskResult> {
        let signer = ctx.signer()?;
        let relay_cfg = &ctx.config.relay;
        let options = SyncFeeOptions {
            gas_limit: Some(relay_cfg.gas_limit),
        };

        report!("🧪 Testing callWithSyncFee with CounterRelayContext");
        report!("Counter Relay Context: {}", relay_cfg.sync_fee_target);
        report!("Fee Token: {}", relay_cfg.fee_token);
        report!("Chain ID: {}", ctx.config.chain_id());
        report!("");

        let mut attempts = Vec::with_capacity(relay_cfg.sync_fee_functions.len());

        for function in &relay_cfg.sync_fee_functions {
            report!("3️⃣  Testing callWithSyncFee with {}()", function);
            report!("{}", "─".repeat(50));

            match ctx.rpc.get_balance(signer.address()).await {
                Ok(balance) => {
                    report!("Wallet: {}", signer.address());
                    report!("Balance: {} ETH", format_ether(balance));
                }
                Err(e) => report!("Wallet: {} (balance unavailable: {})", signer.address(), e),
            }

            let attempt = match zero_arg_call(function) {
                Ok(data) => {
                    let request = RelayRequest::sync_fee(
                        ctx.config.chain_id(),
                        relay_cfg.sync_fee_target,
                        data,
                        relay_cfg.fee_token,
                    );
                    report!("Sending callWithSyncFee with {}()...", function);
                    SyncFeeAttempt::from_outcome(
                        ctx.relay.call_with_sync_fee(&request, &options).await,
                    )
                }
                Err(e) => SyncFeeAttempt::Failed(e.to_string()),
            };

            match &attempt {
                SyncFeeAttempt::Accepted(handle) => {
                    report!("✅ SUCCESS!");
                    report!("Task ID: {}", handle);
                    report!("Track: {}", ctx.tracking_url(handle));
                }
                SyncFeeAttempt::WrongSignature(_) => {
                    report!("❌ FAILED!");
                    report!(
                        "   └── Function {}() doesn't exist or wrong signature",
                        function
                    );
                }
                SyncFeeAttempt::Failed(message) => {
                    report!("❌ FAILED!");
                    report!("   └── Error: {}", truncate_message(message, 100));
                }
            }
            report!("");

            attempts.push((function.clone(), attempt));
        }

        let accepted: Vec<&(String, SyncFeeAttempt)> = attempts
            .iter()
            .filter(|(_, a)| matches!(a, SyncFeeAttempt::Accepted(_)))
            .collect();

        let wrong_signature = attempts
            .iter()
            .filter(|(_, a)| matches!(a, SyncFeeAttempt::WrongSignature(_)))
            .count();

        let summary = if accepted.is_empty() {
            format!(
                "no candidate accepted ({} tried, {} wrong signature)",
                attempts.len(),
                wrong_signature
            )
        } else {
            let names: Vec<String> = accepted.iter().map(|(f, _)| format!("{}()", f)).collect();
            format!(
                "accepted: {} ({} wrong signature)",
                names.join(", "),
                wrong_signature
            )
        };

        let mut result = TaskResult::ok(summary);
        if let Some((_, SyncFeeAttempt::Accepted(handle))) = accepted.first() {
            result = result.with_task_id(handle.id());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_text_beats_revert_and_nonce_text() {
        let reverted = RelayError::Rejected {
            status: 400,
            message: "execution reverted: function selector was not recognized".into(),
        };
        let nonce = RelayError::Rejected {
            status: 400,
            message: "method eth_estimateGas failed: nonce too low".into(),
        };

        assert!(matches!(
            SyncFeeAttempt::from_outcome(Err(reverted)),
            SyncFeeAttempt::WrongSignature(_)
        ));
        assert!(matches!(
            SyncFeeAttempt::from_outcome(Err(nonce)),
            SyncFeeAttempt::WrongSignature(_)
        ));
    }

    #[test]
    fn structured_kind_wins_over_text() {
        let err = RelayError::Classified {
            kind: FailureKind::Other,
            message: "insufficient fee for method".into(),
        };
        assert!(matches!(
            SyncFeeAttempt::from_outcome(Err(err)),
            SyncFeeAttempt::Failed(_)
        ));

        let err = RelayError::Classified {
            kind: FailureKind::MissingFunction,
            message: "unknown selector".into(),
        };
        assert!(matches!(
            SyncFeeAttempt::from_outcome(Err(err)),
            SyncFeeAttempt::WrongSignature(_)
        ));
    }
}
