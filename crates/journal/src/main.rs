//! `stellar-journal` service entry point.
//!
//! Runs the ingestion worker and the read API in one process until SIGINT or
//! SIGTERM, then stops both.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use journal::config::AppConfig;
use journal::{IngestionWorker, NasaApodSource, SqliteStore, api, telemetry};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;

    telemetry::init(config.env)
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))?;

    info!(
        env = %config.env,
        version = env!("CARGO_PKG_VERSION"),
        "Starting stellar journal"
    );
    debug!(?config, "Configuration loaded");

    let store = Arc::new(
        SqliteStore::new(&config.storage.path).with_context(|| {
            format!("failed to open journal at {}", config.storage.path.display())
        })?,
    );

    let source = Arc::new(
        NasaApodSource::new(config.nasa_api.api_key.clone())
            .with_base_url(config.nasa_api.base_url.clone())
            .with_timeout(config.nasa_api.request_timeout()),
    );

    let listener = TcpListener::bind(&config.http_server.address)
        .await
        .with_context(|| format!("failed to bind {}", config.http_server.address))?;

    let shutdown = CancellationToken::new();

    let worker = IngestionWorker::new(source, store.clone(), config.poll_policy());
    let worker_handle = tokio::spawn(worker.run(shutdown.child_token()));

    let app = api::router(store, config.http_server.request_timeout());
    let mut server_handle = tokio::spawn(api::serve(listener, app, shutdown.child_token()));

    tokio::select! {
        () = shutdown_signal() => {}
        result = &mut server_handle => {
            match result {
                Ok(Ok(())) => warn!("Read API stopped unexpectedly"),
                Ok(Err(e)) => error!(error = %e, "Read API failed"),
                Err(e) => error!(error = %e, "Read API task panicked"),
            }
            shutdown.cancel();
            let _ = worker_handle.await;
            anyhow::bail!("read API stopped before shutdown was requested");
        }
    }

    info!("Stopping service");
    shutdown.cancel();

    let drained = tokio::time::timeout(config.http_server.shutdown_timeout(), async {
        if let Ok(Err(e)) = server_handle.await {
            error!(error = %e, "Read API failed during shutdown");
        }
        if let Ok(state) = worker_handle.await {
            debug!(
                consecutive_duplicates = state.consecutive_duplicates(),
                "Worker state at shutdown"
            );
        }
    })
    .await;

    match drained {
        Ok(()) => info!("Service stopped"),
        Err(_) => warn!(
            timeout_secs = config.http_server.shutdown_timeout_secs,
            "Shutdown timed out, exiting with requests in flight"
        ),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C"),
        () = terminate => info!("Received SIGTERM"),
    }
}
