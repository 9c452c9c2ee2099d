use clap::{Parser, Subcommand};
use core_logic::{setup_logger, Credentials};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use thrive_probe::relay::GelatoRelay;
use thrive_probe::runner::{run_task, EXIT_FAILURE};
use thrive_probe::task::{
    CallWithSyncFeeTask, ContractCodeTask, FunctionProbeTask, SponsoredCallErc2771Task,
    SponsoredCallTask, TaskContext, ThriveTask,
};
use thrive_probe::{AlloyRpc, ChainRpc, ThriveConfig};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "chains/thrive/config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check which configured addresses hold contract code
    Contracts,
    /// Trial-call a zero-argument function on counter-like targets
    Functions {
        #[arg(long, default_value = "increment")]
        name: String,
    },
    /// Relay sponsoredCall against the plain counter
    Sponsored,
    /// Relay sponsoredCallERC2771, falling back to the concurrent forwarder on nonce errors
    Erc2771,
    /// Relay callWithSyncFee with each candidate function name
    SyncFee,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log_guard = setup_logger();
    let credentials = Credentials::load();

    info!("Loading config from: {}", args.config);

    let config = match ThriveConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:#}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    info!("Configuration loaded for chain ID: {}", config.chain_id());

    let rpc: Arc<dyn ChainRpc> = match AlloyRpc::new(&config.network.rpc_endpoint) {
        Ok(rpc) => Arc::new(rpc),
        Err(e) => {
            error!("Failed to create RPC client: {:#}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let relay = match GelatoRelay::new(
        &config.relay.api_url,
        rpc.clone(),
        Duration::from_secs(config.relay.user_deadline_secs),
    ) {
        Ok(relay) => Arc::new(relay),
        Err(e) => {
            error!("Failed to create relay client: {:#}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let task: Box<ThriveTask> = match args.command {
        Command::Contracts => Box::new(ContractCodeTask::new()),
        Command::Functions { name } => Box::new(FunctionProbeTask::new(name)),
        Command::Sponsored => Box::new(SponsoredCallTask::new()),
        Command::Erc2771 => Box::new(SponsoredCallErc2771Task::new()),
        Command::SyncFee => Box::new(CallWithSyncFeeTask::new()),
    };

    let ctx = TaskContext::new(rpc, relay, config, credentials);
    ExitCode::from(run_task(task.as_ref(), &ctx).await)
}
