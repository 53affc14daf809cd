//! rcp-ingest - Recipe Audit Ingest Service
//!
//! Accepts multipart uploads of recipe files on POST /api/process, decodes
//! them, runs the recipe processor and saves each outcome under the results
//! directory.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rcp_common::config::{config_file_path, load_toml_config, ConfigOverrides};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rcp_ingest::processor::SummaryProcessor;
use rcp_ingest::{build_router, AppState};

/// Command-line arguments for rcp-ingest
#[derive(Parser, Debug)]
#[command(name = "rcp-ingest")]
#[command(about = "Recipe audit ingest service")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "RCP_CONFIG")]
    config: Option<PathBuf>,

    /// Interface to bind to
    #[arg(long, env = "RCP_BIND_ADDRESS")]
    bind_address: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "RCP_PORT")]
    port: Option<u16>,

    /// Directory receiving processing result artifacts
    #[arg(short, long, env = "RCP_RESULTS_DIR")]
    results_dir: Option<PathBuf>,

    /// Largest accepted request body in bytes
    #[arg(long, env = "RCP_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, env = "RCP_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bind_address: self.bind_address.clone(),
            port: self.port,
            results_dir: self.results_dir.clone(),
            max_upload_bytes: self.max_upload_bytes,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is loaded before tracing so the TOML log level can apply
    let config = load_toml_config(args.config.as_deref())
        .context("Failed to load configuration")?
        .with_overrides(args.overrides());

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting rcp-ingest v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match config_file_path(args.config.as_deref()) {
        Some(path) if path.exists() => info!("Configuration file: {}", path.display()),
        _ => info!("No configuration file, using defaults and overrides"),
    }
    info!("Results directory: {}", config.results_dir.display());
    info!("Upload limit: {} bytes", config.max_upload_bytes);

    let state = AppState::new(Arc::new(SummaryProcessor), config.results_dir.clone())
        .with_max_upload_bytes(config.max_upload_bytes);
    let app = build_router(state);

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
            info!("Received SIGTERM, shutting down");
        },
    }
}
