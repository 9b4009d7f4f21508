//! Request Gatekeeper
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                 GATEKEEPER                    │
//!     Client Request      │  ┌────────────┐   ┌────────────┐   ┌────────┐ │
//!     ────────────────────┼─▶│ rate limit │──▶│    auth    │──▶│ routes │ │
//!                         │  │local/redis │   │  resolver  │   │        │ │
//!                         │  └────────────┘   └────────────┘   └────────┘ │
//!                         │   (order configurable: gate.order)           │
//!                         │                                              │
//!                         │  config · observability · lifecycle          │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use gatekeeper::config::validation::validate_config;
use gatekeeper::config::{load_config, ConfigError, GatekeeperConfig};
use gatekeeper::lifecycle::{build_services, Shutdown};
use gatekeeper::observability::{logging, metrics};
use gatekeeper::GatekeeperServer;

#[derive(Parser)]
#[command(name = "gatekeeper")]
#[command(about = "Identity resolution and rate limiting in front of HTTP routes", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Required in practice: the defaults
    /// carry no JWT key and are refused.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => {
            // Defaults carry no JWT key and are refused like any invalid file.
            let config = GatekeeperConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            config
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!("gatekeeper v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limit_backend = ?config.rate_limit.backend,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let services = build_services(&config).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = GatekeeperServer::new(config, services.gate);
    let server_shutdown = shutdown.subscribe();

    let signals = tokio::spawn(async move { shutdown.trigger_on_signal().await });

    server.run(listener, server_shutdown).await?;
    signals.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}
