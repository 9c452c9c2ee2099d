use crate::config::TargetAddress;
use crate::probe::{FunctionVerdict, ProbeResult};
use crate::report;
use crate::rpc::ChainRpc;
use crate::task::t02_function_probe::probe_function;
use crate::task::{Task, TaskContext, TaskResult};
use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

/// Function tried on counter-like contracts that turn out to have code.
pub const COUNTER_PROBE_FUNCTION: &str = "increment";

/// One line of the sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    pub target: TargetAddress,
    pub code: ProbeResult,
    pub function: Option<(ProbeResult, FunctionVerdict)>,
}

pub struct ContractCodeTask;

impl ContractCodeTask {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ContractCodeTask {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn probe_code(rpc: &dyn ChainRpc, target: &TargetAddress) -> ProbeResult {
    match rpc.get_code(target.address).await {
        Ok(code) => ProbeResult::from_code(&code),
        Err(e) => ProbeResult::CallFailed {
            message: e.to_string(),
        },
    }
}

/// Best-effort sweep over `targets`; a failing address never stops the rest.
pub async fn sweep(rpc: &dyn ChainRpc, targets: &[TargetAddress]) -> Vec<TargetReport> {
    let mut reports = Vec::with_capacity(targets.len());

    for target in targets {
        let code = probe_code(rpc, target).await;

        let function = if code.has_contract() && target.is_counter_like() {
            Some(probe_function(rpc, target.address, COUNTER_PROBE_FUNCTION).await)
        } else {
            None
        };

        let entry = TargetReport {
            target: target.clone(),
            code,
            function,
        };
        print_report(&entry);
        reports.push(entry);
    }

    reports
}

fn print_report(entry: &TargetReport) {
    let mark = if entry.code.has_contract() { "✅" } else { "❌" };
    report!("{} {}: {}", mark, entry.target.label, entry.target.address);
    report!("   └── {}", entry.code);
    if let Some((_, verdict)) = &entry.function {
        report!("   └── {}", verdict.describe(COUNTER_PROBE_FUNCTION));
    }
    report!("");
}

#[async_trait]
impl Task<TaskContext> for ContractCodeTask {
    fn name(&self) -> &str {
        "01_contractCode"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<TaskResult> {
        report!("🔍 Debugging Contract Addresses on {}", ctx.config.network.name);
        report!("================================================");

        match ctx.rpc.chain_id().await {
            Ok(id) if id != ctx.config.chain_id() => warn!(
                "RPC reports chain id {} but config says {}",
                id,
                ctx.config.chain_id()
            ),
            Ok(id) => report!("Chain ID: {}", id),
            Err(e) => warn!("Could not read chain id: {}", e),
        }
        report!("");

        let reports = sweep(ctx.rpc.as_ref(), &ctx.config.targets).await;

        let found = reports.iter().filter(|r| r.code.has_contract()).count();
        let errored = reports.iter().filter(|r| r.code.is_failure()).count();

        Ok(TaskResult::ok(format!(
            "{}/{} addresses have code ({} errors)",
            found,
            reports.len(),
            errored
        )))
    }
}
