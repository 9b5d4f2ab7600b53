//! Server startup and graceful shutdown

use anyhow::{Context, Result};
use axum::Router;
use chunkgate_core::Config;
use std::future::IntoFuture;
use tokio::sync::watch;

/// Start the server; after a shutdown signal in-flight requests get the configured grace period
pub async fn start_server(config: &Config, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %config.bind_addr,
        bucket = %config.upload_bucket_name,
        max_chunk_mb = config.max_chunk_bytes / 1024 / 1024,
        "Server ready and accepting connections"
    );

    let (signal_tx, signal_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = signal_tx.send(true);
    });

    let mut drain_rx = signal_rx.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = drain_rx.wait_for(|stop| *stop).await;
        })
        .into_future();

    let grace = config.graceful_shutdown_timeout();
    let mut deadline_rx = signal_rx;
    let deadline = async move {
        if deadline_rx.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => result.context("Server error")?,
        _ = deadline => {
            tracing::warn!(
                timeout_secs = grace.as_secs(),
                "Graceful shutdown timed out, dropping in-flight requests"
            );
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Signal handler for graceful shutdown
///
/// # Panics
/// Panics if the Ctrl+C or SIGTERM handler cannot be installed
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down gracefully...");
}
