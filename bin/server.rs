// HBNB - Web Server
// REST API with Axum over the configured storage backend

use anyhow::{Context, Result};
use clap::Parser;
use hbnb::{ServerArgs, StorageArgs};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hbnb-server", version, about = "HBNB REST API server")]
struct Cli {
    #[command(flatten)]
    server: ServerArgs,

    #[command(flatten)]
    storage: StorageArgs,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(Cli::parse()).await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Starting HBNB API v{}", hbnb::VERSION);

    // Unreadable persisted state stops us here, before binding
    let storage = cli.storage.open()?;
    info!(
        backend = storage.backend(),
        objects = storage.count(None)?,
        "Storage ready"
    );

    let app = hbnb::api::router(storage);

    let addr = cli.server.display_address();
    let listener = tokio::net::TcpListener::bind(cli.server.bind_target())
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Server running on http://{}/api/v1", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
