//! flowbindd: the flowbind scheduling bridge daemon.
//!
//! Connects a Firmament-style flow scheduling engine to a Kubernetes
//! API server:
//! - Readiness gate on the engine's health RPC
//! - Identity registry, populated through the bridge API
//! - Scheduling loop applying engine deltas as pod bindings/deletions
//! - Bridge API (health, metrics, registration, trigger)
//!
//! # Usage
//!
//! ```text
//! flowbindd run --config /etc/flowbind/flowbind.toml
//! flowbindd run --engine-address firmament.local --dry-run
//! flowbindd check --engine-address firmament.local
//! ```

mod bridge;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use flowbind_core::{BridgeConfig, BrokenInvariantPolicy, UncontrolledWorkloadPolicy};

#[derive(Parser)]
#[command(name = "flowbindd", about = "flowbind scheduling bridge daemon")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the bridge until Ctrl-C.
    Run(ConfigArgs),

    /// Probe the engine once; exit non-zero unless it is serving.
    Check(ConfigArgs),
}

/// Configuration file plus per-field overrides.
#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// Path to a flowbind.toml file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name this bridge reports in logs and metrics.
    #[arg(long)]
    scheduler_name: Option<String>,

    /// Engine host name or address.
    #[arg(long)]
    engine_address: Option<String>,

    /// Engine gRPC port.
    #[arg(long)]
    engine_port: Option<u16>,

    /// Listen address for the bridge API.
    #[arg(long)]
    listen: Option<String>,

    /// Orchestrator API server (`host:port`).
    #[arg(long)]
    api_server: Option<String>,

    /// Bearer token sent to the orchestrator API server.
    #[arg(long)]
    api_token: Option<String>,

    /// Time between scheduling iterations (e.g. `10s`).
    #[arg(long)]
    scheduling_interval: Option<String>,

    /// How long to wait for the engine at startup (e.g. `10m`).
    #[arg(long)]
    readiness_timeout: Option<String>,

    /// Log orchestrator actions instead of performing them.
    #[arg(long)]
    dry_run: bool,

    /// Stop the bridge when a delta references an unregistered identifier.
    #[arg(long)]
    abort_on_broken_invariant: bool,

    /// Refuse to preempt or migrate workloads that have no controller.
    #[arg(long)]
    reject_uncontrolled: bool,
}

impl ConfigArgs {
    /// Load the file (or defaults), apply overrides, and validate.
    fn load(self) -> anyhow::Result<BridgeConfig> {
        let mut config = match self.config {
            Some(ref path) => BridgeConfig::from_file(path)?,
            None => BridgeConfig::default(),
        };

        if let Some(name) = self.scheduler_name {
            config.scheduler_name = name;
        }
        if let Some(address) = self.engine_address {
            config.engine_address = address;
        }
        if let Some(port) = self.engine_port {
            config.engine_port = port;
        }
        if let Some(listen) = self.listen {
            config.listen_address = listen;
        }
        if let Some(api_server) = self.api_server {
            config.api_server = api_server;
        }
        if let Some(token) = self.api_token {
            config.api_token = Some(token);
        }
        if let Some(interval) = self.scheduling_interval {
            config.scheduling_interval = interval;
        }
        if let Some(timeout) = self.readiness_timeout {
            config.readiness_timeout = timeout;
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if self.abort_on_broken_invariant {
            config.broken_invariant_policy = BrokenInvariantPolicy::Abort;
        }
        if self.reject_uncontrolled {
            config.uncontrolled_workload_policy = UncontrolledWorkloadPolicy::Reject;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,flowbindd=debug,flowbind=debug"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Run(args) => bridge::run_bridge(args.load()?).await,
        Command::Check(args) => bridge::check_engine(&args.load()?).await,
    }
}
