//! Lingo server entry point

use anyhow::{Context, Result};
use clap::Parser;
use lingo_common::init_logging;
use lingo_server::{serve, shutdown_signal, Args};
use lingo_service::ServiceContext;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.load_config().context("failed to load configuration")?;

    if args.check_config {
        println!("Configuration is valid");
        return Ok(());
    }

    let _log_guard = init_logging(&config.logging).context("failed to initialize logging")?;
    info!(version = env!("CARGO_PKG_VERSION"), "Starting Lingo");

    let bind_address = config.server.bind_address.clone();
    let ctx = ServiceContext::from_config(config)
        .await
        .context("failed to initialize services")?;

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;

    serve(ctx, listener, shutdown_signal()).await?;
    info!("Lingo stopped");
    Ok(())
}
