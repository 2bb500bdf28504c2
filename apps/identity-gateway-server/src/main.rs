mod config;
mod logging;
mod signals;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use identity_gateway::IdentityGateway;
use tokio::net::TcpListener;

use crate::config::AppConfig;

/// Identity Gateway Server - REST front door to the identity orchestrator
#[derive(Parser)]
#[command(name = "identity-gateway-server")]
#[command(about = "Identity Gateway Server - REST front door to the identity orchestrator")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration, build the transport and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Layered config:
    // 1) defaults -> 2) YAML (if provided) -> 3) env (IDGW__*) -> 4) CLI overrides
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.port);

    logging::init(&config.logging, cli.verbose);

    if cli.print_config {
        println!("Effective configuration:\n{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config).await,
    }
}

async fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    let gateway = IdentityGateway::from_config(&config.gateway).await?;
    println!("Configuration is valid");
    println!("transport: {}", gateway.transport_name());
    Ok(())
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("Identity Gateway Server starting");
    let gateway = IdentityGateway::from_config(&config.gateway).await?;

    let listener = TcpListener::bind(config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    let local_addr = listener.local_addr()?;
    tracing::info!(
        addr = %local_addr,
        transport = gateway.transport_name(),
        "Identity Gateway Server listening"
    );

    axum::serve(listener, gateway.router())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated with an error")?;

    tracing::info!("Identity Gateway Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signals::wait_for_shutdown().await {
        tracing::error!(error = %e, "Signal handling failed, shutting down");
    }
}
