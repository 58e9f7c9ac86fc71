//! loghubd - centralized in-memory log aggregation daemon
//!
//! Accepts logger connections over TCP, keeps a bounded history of
//! recent entries, and fans them out to registered listeners.
//!
//! # Usage
//!
//! ```bash
//! loghubd
//! loghubd --port 9601 --history-capacity 1000
//! loghubd --log-level debug
//! ```

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use loghub_server::{Hub, HubConfig, IngestConfig, IngestServer};

/// Centralized in-memory log aggregation daemon
#[derive(Parser, Debug)]
#[command(name = "loghubd")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Bind address for the ingest listener
    #[arg(short, long, default_value = "0.0.0.0")]
    address: String,

    /// Listen port for logger connections
    #[arg(short, long, default_value_t = 9601)]
    port: u16,

    /// Number of recent entries retained for catch-up replay
    #[arg(long, default_value_t = 1000)]
    history_capacity: usize,

    /// Catch-up replay deadline in milliseconds
    #[arg(long, default_value_t = 1000)]
    catchup_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let hub_config = HubConfig::default()
        .with_history_capacity(cli.history_capacity)
        .with_catchup_timeout(Duration::from_millis(cli.catchup_timeout_ms));
    let (hub, handle) = Hub::new(hub_config);
    let hub_task = hub.spawn();

    let ingest_config = IngestConfig {
        address: cli.address,
        port: cli.port,
    };
    let ingest = IngestServer::bind(&ingest_config, handle.clone()).await?;
    let cancel = CancellationToken::new();
    let ingest_task = ingest.spawn(cancel.clone());

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    cancel.cancel();
    ingest_task.await?;

    // Connection handlers also exit on cancel, releasing their hub
    // handles; dropping ours lets the hub drain and exit.
    drop(handle);
    hub_task.await?;

    Ok(())
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}
