use crate::calldata::zero_arg_call;
use crate::probe::{FunctionVerdict, ProbeResult};
use crate::report;
use crate::rpc::ChainRpc;
use crate::task::{Task, TaskContext, TaskResult};
use alloy_primitives::Address;
use anyhow::Result;
use async_trait::async_trait;
use core_logic::FailureKind;

/// Read-only trial call of `function()` on every counter-like target.
pub struct FunctionProbeTask {
    function: String,
}

impl FunctionProbeTask {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
        }
    }
}

/// Calls `function()` as if it were a view and classifies the outcome.
///
/// A revert is read as "exists but mutates state". That reading is a
/// heuristic: the call may revert for unrelated reasons.
pub async fn probe_function(
    rpc: &dyn ChainRpc,
    address: Address,
    function: &str,
) -> (ProbeResult, FunctionVerdict) {
    let result = match zero_arg_call(function) {
        Ok(data) => match rpc.call(address, data).await {
            Ok(return_data) => ProbeResult::CallSucceeded { return_data },
            Err(e) if e.kind() == FailureKind::Reverted => ProbeResult::CallReverted {
                reason: e.detail().to_string(),
            },
            Err(e) => ProbeResult::CallFailed {
                message: e.to_string(),
            },
        },
        Err(e) => ProbeResult::CallFailed {
            message: e.to_string(),
        },
    };

    let verdict = FunctionVerdict::from(&result);
    (result, verdict)
}

#[async_trait]
impl Task<TaskContext> for FunctionProbeTask {
    fn name(&self) -> &str {
        "02_functionProbe"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<TaskResult> {
        report!("🔎 Trial-calling {}() on counter contracts", self.function);
        report!("================================================");

        let mut found = 0usize;
        let mut probed = 0usize;

        for target in ctx.config.targets.iter().filter(|t| t.is_counter_like()) {
            probed += 1;
            let (result, verdict) =
                probe_function(ctx.rpc.as_ref(), target.address, &self.function).await;

            let mark = match verdict {
                FunctionVerdict::AbsentOrIncompatible => "❌",
                _ => {
                    found += 1;
                    "✅"
                }
            };
            report!("{} {}: {}", mark, target.label, target.address);
            report!("   └── {}", verdict.describe(&self.function));
            if let ProbeResult::CallFailed { message } = &result {
                report!("   └── {}", core_logic::truncate_message(message, 100));
            }
        }

        Ok(TaskResult::ok(format!(
            "{}() answered on {}/{} counter contracts",
            self.function, found, probed
        )))
    }
}
