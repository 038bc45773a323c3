//! Rewriting Forward Proxy
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                    REWRITE PROXY                      │
//!   GET /proxy?url=…  │  ┌─────────┐    ┌──────────┐    ┌────────────┐       │
//!  ───────────────────┼─▶│  http   │───▶│ security │───▶│  upstream  │───────┼──▶ Origin
//!                     │  │ server  │    │ headers  │    │ forwarder  │       │
//!                     │  └─────────┘    └──────────┘    └─────┬──────┘       │
//!                     │                                       │              │
//!                     │  ┌──────────────────────────────────┐ │              │
//!  ◀──────────────────┼──│ http::response (dispatch)        │◀┘              │
//!                     │  │  preflight / redirect / html /   │                │
//!                     │  │  passthrough  + rewrite::*       │                │
//!                     │  └──────────────────────────────────┘                │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use rewrite_proxy::config::{load_config, validation::validate_config, ConfigError, ProxyConfig};
use rewrite_proxy::observability::{logging, metrics};
use rewrite_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "rewrite-proxy")]
#[command(about = "Forwarding proxy that rewrites links, redirects and cookies", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    logging::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config_file = ?cli.config,
        bind_address = %config.listener.bind_address,
        proxy_path = %config.rewrite.proxy_path,
        "rewrite-proxy starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
