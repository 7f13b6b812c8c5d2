//! Arena Server - Main Entry Point
//!
//! A WebSocket battle-arena server: players create and join two-player
//! rooms, start battles, and receive broadcast notifications, with
//! graceful shutdown handling.

use anyhow::Result;
use clap::Parser;
use std::time::Instant;
use tracing::{error, info};

use arena_server::{
    config::{self, Args, Config},
    logging, shutdown, ArenaServer, ServerConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    let startup_start = Instant::now();

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging system
    if let Err(e) = logging::setup_logging(&args) {
        eprintln!("Failed to initialize logging: {e}");
        return Err(anyhow::anyhow!("Failed to initialize logging: {}", e));
    }

    info!("Starting Arena Server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = config::load_config(&args)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    info!("Configuration loaded from: {}", args.config.display());

    // Create server configuration with CLI overrides
    let server_config = create_server_config(&config, &args)?;
    log_server_configuration(&server_config);

    // Initialize the server
    let server = ArenaServer::new(server_config);

    // Setup shutdown handler
    let shutdown_receiver = shutdown::setup_shutdown_handler().await;

    info!("Startup complete in {:.2?}", startup_start.elapsed());

    // Run the server and wait for shutdown
    tokio::select! {
        result = server.start() => {
            match result {
                Ok(_) => info!("Server stopped normally"),
                Err(e) => {
                    error!("Server error: {}", e);
                    return Err(e.into());
                }
            }
        }
        _ = shutdown_receiver => {
            let shutdown_start = Instant::now();
            info!("Shutdown signal received");
            server.shutdown();
            info!("Server shutdown completed in {:.2?}", shutdown_start.elapsed());
        }
    }

    Ok(())
}

/// Create server configuration from loaded config and CLI arguments
fn create_server_config(config: &Config, args: &Args) -> Result<ServerConfig> {
    let mut server_config = ServerConfig::from_config(config)
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    if let Some(listen) = args.listen.as_deref() {
        server_config.bind_address = listen
            .parse()
            .map_err(|e| anyhow::anyhow!("Failed to parse listen address: {}", e))?;
    }
    if let Some(max_connections) = args.max_connections {
        server_config.max_connections = max_connections;
    }

    Ok(server_config)
}

/// Log the final server configuration
fn log_server_configuration(config: &ServerConfig) {
    info!("Server configuration:");
    info!("  Listen address: {}", config.bind_address);
    info!("  Max connections: {}", config.max_connections);
    info!("  Room reclaim interval: {:?}", config.reclaim_interval);
    info!("  Room max age: {:?}", config.room_max_age);
}
