//! powrace daemon: one-shot work generation and the RPC server.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use powrace_coordinator::{ShutdownController, WorkConfig, WorkService};
use powrace_rpc::RpcServer;
use powrace_types::{BlockHash, Difficulty, NetworkId};
use powrace_utils::{init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "powrace-daemon", about = "Proof-of-work race coordinator")]
struct Cli {
    /// Network whose base difficulty applies by default: "nano", "banano" or "dev".
    #[arg(long, env = "POWRACE_NETWORK")]
    network: Option<NetworkId>,

    /// Work peer URLs (comma-separated). Replaces the file's list when given.
    #[arg(long, env = "POWRACE_WORK_PEERS", value_delimiter = ',')]
    work_peers: Vec<String>,

    /// Node RPC URL.
    #[arg(long, env = "POWRACE_NODE_URL")]
    node_url: Option<String>,

    /// Race the node as one more work peer.
    #[arg(long, env = "POWRACE_NODE_WORK_GENERATE")]
    node_work_generate: bool,

    /// Directory of the shared failure-flag store.
    #[arg(long, env = "POWRACE_STORE_PATH")]
    store_path: Option<PathBuf>,

    /// Seconds one race round waits for the next result.
    #[arg(long, env = "POWRACE_ROUND_TIMEOUT")]
    round_timeout_secs: Option<u64>,

    /// Local search threads (0 = one per core).
    #[arg(long, env = "POWRACE_WORK_THREADS")]
    work_threads: Option<usize>,

    /// RPC server port.
    #[arg(long, env = "POWRACE_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Log format: "human" or "json".
    #[arg(long, env = "POWRACE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "POWRACE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Generate work for one hash and print it.
    Generate {
        /// Block hash, 64 hex characters.
        #[arg(long)]
        hash: BlockHash,

        /// Difficulty threshold, hex (defaults to the network base).
        #[arg(long)]
        difficulty: Option<Difficulty>,
    },
    /// Run the RPC server until SIGINT/SIGTERM.
    Serve,
}

impl Cli {
    /// File config (or defaults), overridden by flags, then credentials from the environment.
    fn work_config(&self) -> anyhow::Result<WorkConfig> {
        let mut config = match &self.config {
            Some(path) => WorkConfig::from_toml_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => WorkConfig::default(),
        };

        if let Some(network) = self.network {
            config.network = network;
        }
        if !self.work_peers.is_empty() {
            config.work_peers = self.work_peers.clone();
        }
        if let Some(url) = &self.node_url {
            config.node_url = url.clone();
        }
        config.node_work_generate |= self.node_work_generate;
        if let Some(path) = &self.store_path {
            config.store_path = path.clone();
        }
        if let Some(secs) = self.round_timeout_secs {
            config.round_timeout_secs = secs;
        }
        if let Some(threads) = self.work_threads {
            config.work_threads = threads;
        }
        if let Some(port) = self.rpc_port {
            config.rpc_port = port;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }

        Ok(config.with_env_credentials(|name| std::env::var(name).ok()))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.work_config()?;
    init_logging(config.log_format, &config.log_level);

    if let Some(path) = &cli.config {
        tracing::info!(path = %path.display(), "loaded config");
    }

    match cli.command {
        Command::Generate { hash, difficulty } => {
            let service = WorkService::start(config)?;
            let work = service.generate(&hash, difficulty).await;
            println!("{work}");
            service.shutdown().await;
        }
        Command::Serve => {
            let rpc_port = config.rpc_port;
            let service = WorkService::start(config)?;
            let shutdown = ShutdownController::new();

            let server = RpcServer::new(rpc_port, service.clone());
            let server_shutdown = shutdown.subscribe();
            let mut server_task = tokio::spawn(async move { server.start(server_shutdown).await });

            // The server only returns early if it failed.
            let finished = tokio::select! {
                _ = shutdown.wait_for_signal() => None,
                result = &mut server_task => Some(result),
            };
            let result = match finished {
                Some(result) => result,
                None => server_task.await,
            };

            service.shutdown().await;
            result.context("RPC server task panicked")??;
            tracing::info!("powrace daemon exited cleanly");
        }
    }

    Ok(())
}
