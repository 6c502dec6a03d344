//! # Lingo Server
//!
//! HTTP front end of the localization service: command line parsing,
//! startup wiring and the axum router.

pub mod api;
pub mod cli;
pub mod error;

pub use api::router;
pub use cli::Args;
pub use error::{ApiError, ApiResult};

use anyhow::Context;
use lingo_service::ServiceContext;
use std::future::Future;
use tokio::net::TcpListener;
use tracing::info;

/// Serves `ctx` on `listener` until `shutdown` resolves, then stops
/// population and closes the store.
pub async fn serve<F>(ctx: ServiceContext, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("listener has no local address")?;
    info!(%addr, "Lingo server listening");

    axum::serve(listener, router(ctx.clone()))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    info!("HTTP server stopped, draining population jobs");
    ctx.shutdown().await;
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Received shutdown signal, starting graceful shutdown");
}
