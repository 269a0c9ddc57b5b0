//! Line Chat Relay - Entry Point
//!
//! Parses configuration, binds the listener and accepts connections until Ctrl-C.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use line_relay::{Config, RelayServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=line_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("line_relay=info")),
        )
        .init();

    let config = Config::parse();

    let server = RelayServer::bind(&config).await?;
    info!("Chat relay listening on {}", server.local_addr()?);

    server.run_until_ctrl_c().await;

    info!("Chat relay shutting down");
    Ok(())
}
