//! imd-mc (Material Control) - Main entry point
//!
//! Serves the scan validation API used by the AXIAL and RADIAL workstation
//! clients: part lookup, feeder and polarity checks, and history inserts.

use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use imd_common::config::{AppConfig, ConfigOverrides, LoggingConfig};
use imd_common::db::StoreConnector;
use imd_mc::{build_router, AppState};
use sqlx::Connection;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for imd-mc
#[derive(Parser, Debug)]
#[command(name = "imd-mc")]
#[command(about = "IMD material control validation service")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file (falls back to IMD_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "IMD_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "IMD_PORT")]
    port: Option<u16>,

    /// Station name used to pick the default machine (defaults to host name)
    #[arg(short, long, env = "IMD_STATION")]
    station: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(ConfigOverrides {
        config_path: args.config,
        host: args.host,
        port: args.port,
        station: args.station,
    })
    .context("Failed to load configuration")?;

    init_tracing(&config.logging)?;

    info!(
        "Starting IMD Material Control (imd-mc) v{}",
        env!("CARGO_PKG_VERSION")
    );
    match &config.source {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: compiled defaults (no config file found)"),
    }
    info!(
        "Station {} (default machine {})",
        config.station.name, config.station.machine_default
    );

    let connector = StoreConnector::new(config.profiles.clone())?;
    for (idx, profile) in connector.profiles().iter().enumerate() {
        info!("Store profile {}: {}", idx + 1, profile.name);
    }

    // Migrates the first reachable profile now; others are migrated on first use
    match connector.acquire().await {
        Ok(conn) => conn.close().await?,
        Err(e) => warn!("Store not reachable at startup: {}", e),
    }

    let state = AppState::new(connector, config.station.clone());
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("imd-mc listening on http://{}", addr);
    info!("Health check: http://{}/api/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Stdout logging plus an optional appending log file
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "imd_mc={level},imd_common={level},tower_http={level}",
            level = logging.level
        ))
    });

    let file_layer = match &logging.file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {:?}", parent))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
