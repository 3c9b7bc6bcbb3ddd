//! QuickCert license server
//!
//! Issues device-bound certificates and temporary trial permits over HTTP.
//!
//! Usage:
//!   quickcert-server init              # generate the signing key pair
//!   quickcert-server --config configs/server.toml
//!
//! TLS is expected to be terminated by a reverse proxy in front.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quickcert_server::startup::{build_state, init_keys};
use quickcert_server::{serve, Config, DEFAULT_CONFIG_PATH};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "quickcert-server")]
#[command(about = "QuickCert license issuance server")]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Generate the RSA signing key pair at the configured paths
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let config = Config::load(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Init => init_keys(&config),
        Command::Serve => run(config).await,
    }
}

async fn run(config: Config) -> Result<()> {
    info!("QuickCert server starting...");
    let state = build_state(&config)?;

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Listening");

    serve(listener, state, shutdown_signal())
        .await
        .context("HTTP server failed")?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C; shutting down"),
    }
}
