// src/main.rs

//! The main entry point for the framelink server binary.
//!
//! The binary wires a trivial echo dispatcher into the connection engine;
//! embedders supply their own [`FrameDispatcher`] through the library API.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use framelink::FrameLinkError;
use framelink::config::Config;
use framelink::core::dispatch::FrameDispatcher;
use framelink::core::state::{ClientId, ServerState};
use framelink::server::Server;
use std::env;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, info};
use tracing_subscriber::filter::EnvFilter;

/// Echoes every frame back to its sender.
#[derive(Debug, Default)]
struct EchoDispatcher;

#[async_trait]
impl FrameDispatcher for EchoDispatcher {
    async fn handle_frame(
        &self,
        state: &Arc<ServerState>,
        id: ClientId,
        payload: Bytes,
    ) -> Result<(), FrameLinkError> {
        debug!("client {id}: echoing frame of {} bytes", payload.len());
        state.send(id, payload).await;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let args: Vec<String> = env::args().collect();

    if args.contains(&"--version".to_string()) {
        println!("framelink version {VERSION}");
        return Ok(());
    }

    // Determine the configuration path. It can be provided via a --config
    // flag; otherwise it defaults to "config.toml". A missing file falls back
    // to built-in defaults.
    let config_path = args
        .iter()
        .position(|arg| arg == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
        .unwrap_or("config.toml");

    let mut config = match Config::load_or_default(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration from \"{config_path}\": {e}");
            std::process::exit(1);
        }
    };

    // Override port if provided as a command-line argument.
    if let Some(port_index) = args.iter().position(|arg| arg == "--port") {
        match args.get(port_index + 1).map(|s| s.parse::<u16>()) {
            Some(Ok(port)) => config.listen_port = port,
            Some(Err(_)) => {
                eprintln!("Invalid port number: {}", args[port_index + 1]);
                std::process::exit(1);
            }
            None => {
                eprintln!("--port flag requires a value");
                std::process::exit(1);
            }
        }
    }

    // Get the log level from the environment, falling back to the config.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .compact()
        .with_ansi(true)
        .init();

    let server = Server::init(config, Arc::new(EchoDispatcher))?;
    let addr = server.start_listening()?;
    info!("framelink node ready on {addr}");

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => info!("SIGINT received, initiating graceful shutdown"),
        _ = sigterm.recv() => info!("SIGTERM received, initiating graceful shutdown"),
    }

    server.shutdown().await;
    Ok(())
}
