//! Calculation orchestrator - Main Entry Point
//!
//! Serves the HTTP API and runs the configured number of in-process agent
//! loops until SIGINT or SIGTERM.

use calc_orchestrator::agent::spawn_agents;
use calc_orchestrator::api::ApiServer;
use calc_orchestrator::config::ServerConfig;
use calc_orchestrator::observability::init_default_logging;
use calc_orchestrator::CalculatorService;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Arithmetic expression orchestrator
#[derive(Parser)]
#[command(name = "calc-orchestrator")]
#[command(about = "Distributed arithmetic expression service")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API and run agent loops
    Run,
    /// Validate configuration
    Config {
        /// Show the effective configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging(cli.verbose);

    info!(
        "Starting calculation orchestrator v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run => run_server(config).await,
        Commands::Config { show } => handle_config_command(&config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }

    info!("Application shutdown complete");
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    if let Some(path) = config_path {
        info!("Loading configuration from: {}", path.display());
        return Ok(ServerConfig::load_from_file(path)?);
    }

    for path_str in ["calculator.toml", "config/calculator.toml"] {
        let path = PathBuf::from(path_str);
        if path.exists() {
            info!("Loading configuration from: {}", path.display());
            return Ok(ServerConfig::load_from_file(&path)?);
        }
    }

    info!("No configuration file found, using defaults and environment");
    Ok(ServerConfig::from_env()?)
}

async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.socket_addr()?;
    let service = Arc::new(CalculatorService::new(&config));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let (bound, server) = ApiServer::new(service.clone(), addr).bind(shutdown_rx.clone())?;
    let server_handle = tokio::spawn(server);

    if config.agent.workers == 0 {
        info!("No in-process agents configured; waiting for external workers");
    }
    let agents = spawn_agents(config.agent.workers, service, shutdown_rx);

    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    info!(
        addr = %bound,
        agents = config.agent.workers,
        queue_capacity = config.queue.capacity,
        "Service is running"
    );

    tokio::select! {
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }

    let _ = shutdown_tx.send(true);

    for agent in agents {
        if let Err(e) = agent.await {
            warn!("Agent task ended abnormally: {}", e);
        }
    }
    if let Err(e) = server_handle.await {
        warn!("HTTP server task ended abnormally: {}", e);
    }

    Ok(())
}

fn handle_config_command(
    config: &ServerConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("Current configuration:");
        println!("{}", toml::to_string_pretty(config)?);
    }

    println!("Configuration is valid");
    Ok(())
}
