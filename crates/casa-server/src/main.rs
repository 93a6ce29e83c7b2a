//! Casa hub server
//!
//! ```bash
//! # Create the database schema
//! casa --config ./config init
//!
//! # Run the hub
//! casa --config ./config start
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use casa_api::{start_server, AppState};
use casa_automation::AutomationScheduler;
use casa_config::ServerConfig;
use casa_gateway::{GatewayClient, GatewaySession};
use casa_store::SqliteStore;
use casa_telemetry::TelemetryCache;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Casa home automation hub
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding casa.yaml and secrets.yaml
    #[arg(short, long, default_value = "./config")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the hub
    Start,
    /// Create the database schema and exit
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {:?}", cli.config))?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    match cli.command {
        Command::Init => init(&cli.config, &config),
        Command::Start => start(&cli.config, config).await,
    }
}

fn open_store(config_dir: &Path, config: &ServerConfig) -> Result<SqliteStore> {
    let path = config.database_path(config_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating database directory {:?}", parent))?;
    }
    SqliteStore::open(&path).with_context(|| format!("opening database {:?}", path))
}

fn init(config_dir: &Path, config: &ServerConfig) -> Result<()> {
    open_store(config_dir, config)?;
    info!("Database initialized at {:?}", config.database_path(config_dir));
    Ok(())
}

async fn start(config_dir: &Path, config: ServerConfig) -> Result<()> {
    info!("Starting Casa v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(open_store(config_dir, &config)?);
    let session = Arc::new(
        GatewaySession::new(
            store,
            TelemetryCache::spawn(),
            GatewayClient::new(config.gateway.request_timeout()),
        )
        .with_discovery_timeout(config.gateway.discovery_timeout()),
    );

    let scheduler = AutomationScheduler::new(session.clone(), config.automation.interval());
    let scheduler_task = scheduler.start();

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutting down...");
    };

    let result = start_server(AppState::new(session), &config.http.bind, shutdown).await;
    scheduler.stop();
    if let Some(task) = scheduler_task {
        let _ = task.await;
    }
    result.with_context(|| format!("serving on {}", config.http.bind))
}
