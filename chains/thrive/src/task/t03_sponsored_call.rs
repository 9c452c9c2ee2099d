use crate::calldata::zero_arg_call;
use crate::relay::RelayRequest;
use crate::report;
use crate::task::{Task, TaskContext, TaskResult};
use anyhow::{Context, Result};
use async_trait::async_trait;

/// `increment()` on the plain counter, gas paid by the sponsor API key.
pub struct SponsoredCallTask;

impl SponsoredCallTask {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SponsoredCallTask {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Task<TaskContext> for SponsoredCallTask {
    fn name(&self) -> &str {
        "03_sponsoredCall"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<TaskResult> {
        // The signer is unused by a plain sponsored call but still required up front.
        let (_signer, api_key) = ctx.relay_credentials()?;
        let relay_cfg = &ctx.config.relay;

        report!("🧪 Testing Gelato Relay on {}", ctx.config.network.name);
        report!("Target Contract: {}", relay_cfg.sponsored_target);
        report!("Chain ID: {}", ctx.config.chain_id());
        report!("");
        report!("1️⃣  Testing sponsoredCall");

        let request = RelayRequest::sponsored(
            ctx.config.chain_id(),
            relay_cfg.sponsored_target,
            zero_arg_call("increment")?,
        );

        report!("Sending sponsoredCall request...");
        let handle = match ctx.relay.sponsored_call(&request, api_key).await {
            Ok(handle) => handle,
            Err(e) => {
                report!("❌ FAILED! {}", e);
                return Err(e).context("sponsoredCall failed");
            }
        };

        report!("✅ SUCCESS!");
        report!("Task ID: {}", handle);
        report!("Track status: {}", ctx.tracking_url(&handle));

        Ok(TaskResult::ok(format!("sponsoredCall accepted as {}", handle))
            .with_task_id(handle.id()))
    }
}
