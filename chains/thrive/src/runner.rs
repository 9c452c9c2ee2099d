use crate::report;
use crate::task::{TaskContext, ThriveTask};
use core_logic::ConfigError;
use tracing::error;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

/// Runs one diagnostic to completion and maps its outcome to a process exit code.
pub async fn run_task(task: &ThriveTask, ctx: &TaskContext) -> u8 {
    match task.run(ctx).await {
        Ok(result) if result.success => {
            report!("🎉 [{}] SUCCESS: {}", task.name(), result.message);
            EXIT_SUCCESS
        }
        Ok(result) => {
            report!("💥 [{}] FAILED: {}", task.name(), result.message);
            EXIT_FAILURE
        }
        Err(e) => {
            if let Some(config_err) = e.downcast_ref::<ConfigError>() {
                error!("❌ Configuration error: {}", config_err);
            }
            report!("💥 [{}] FAILED: {:#}", task.name(), e);
            EXIT_FAILURE
        }
    }
}
