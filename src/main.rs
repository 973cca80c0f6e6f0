//! RegPortal Recommendation Engine
//!
//! Serves event recommendations and trending events for the sports registration portal.
//!
//! # Architecture
//!
//! - **Catalog**: JSON snapshot of events and registrations, refreshed periodically
//! - **Recommendation Engine**: Per-athlete event ranking and trending ranking
//! - **API Server**: REST endpoints for the portal frontend
//!
//! # Graceful Shutdown
//!
//! The engine handles SIGTERM and SIGINT signals, letting in-flight requests complete
//! and stopping the catalog refresher.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use regportal::api::{self, AppState};
use regportal::updater;
use regportal::{Catalog, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with structured logging; keep the guard alive to flush file logs
    let _log_guard = init_tracing();

    info!("═══════════════════════════════════════════════════════════════");
    info!("  🏅 RegPortal Engine v{}", env!("CARGO_PKG_VERSION"));
    info!("═══════════════════════════════════════════════════════════════");

    // Load configuration
    let config = Arc::new(Config::from_env().context("Failed to load configuration")?);
    info!("✅ Configuration loaded and validated");

    #[cfg(feature = "prometheus")]
    {
        regportal::recommendation::metrics::install_exporter(config.metrics_port)
            .context("Failed to start Prometheus exporter")?;
        info!("✅ Prometheus exporter listening on :{}", config.metrics_port);
    }

    // Load the initial catalog snapshot
    let catalog = Catalog::load(&config.data).await.with_context(|| {
        format!(
            "Failed to load catalog from {}",
            config.data.dir.display()
        )
    })?;
    info!("✅ Catalog snapshot loaded");

    let state = Arc::new(
        AppState::new(catalog.clone(), &config).context("Failed to build application state")?,
    );

    // Create shutdown channel
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let mut handles = Vec::new();

    info!("🔄 Starting catalog refresher...");
    handles.push(updater::spawn_catalog_refresher(
        catalog,
        config.data.refresh_interval,
        shutdown_tx.subscribe(),
    ));

    info!("🌐 Starting API server on port {}...", config.api.port);
    handles.push(spawn_api_server(state, config.clone(), shutdown_tx.subscribe()));

    info!("═══════════════════════════════════════════════════════════════");
    info!("  ✅ All services started successfully");
    info!("  📡 API: http://{}:{}", config.api.host, config.api.port);
    info!(
        "  🔗 Health: http://{}:{}/health",
        config.api.host, config.api.port
    );
    info!("═══════════════════════════════════════════════════════════════");

    // Wait for shutdown signal or service failure
    tokio::select! {
        _ = shutdown_signal() => {
            info!("📴 Shutdown signal received");
        }
        _ = wait_for_any_failure(&mut handles) => {
            warn!("⚠️ A service stopped unexpectedly, initiating shutdown");
        }
    }

    info!("🛑 Initiating graceful shutdown...");
    let _ = shutdown_tx.send(());

    let shutdown_timeout = Duration::from_secs(30);
    if tokio::time::timeout(shutdown_timeout, shutdown_services(handles))
        .await
        .is_err()
    {
        warn!("⚠️ Shutdown timeout exceeded, forcing exit");
    }

    info!("👋 RegPortal Engine stopped gracefully");
    Ok(())
}

/// Initialize structured logging with tracing.
///
/// Console output always; a daily-rolling JSON file as well when `LOG_DIR` is set.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Default log levels
        EnvFilter::new("regportal_engine=debug,regportal=debug,tower_http=debug,info")
    });

    let console = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(std::env::var("NO_COLOR").is_err());

    let (file_layer, guard) = match std::env::var("LOG_DIR") {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "regportal.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_writer(writer).boxed();
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();

    guard
}

/// Spawn the API server
fn spawn_api_server(
    state: Arc<AppState>,
    config: Arc<Config>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let shutdown = async move {
            let _ = shutdown_rx.recv().await;
            info!("API server shutting down");
        };
        if let Err(e) = api::start_server(state, &config.api, shutdown).await {
            error!("API server error: {:?}", e);
        }
    })
}

/// Wait for any task to finish
async fn wait_for_any_failure(handles: &mut [tokio::task::JoinHandle<()>]) {
    loop {
        if handles.iter().any(|handle| handle.is_finished()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// Wait for all services to complete shutdown
async fn shutdown_services(handles: Vec<tokio::task::JoinHandle<()>>) {
    for handle in handles {
        let _ = handle.await;
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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
}
