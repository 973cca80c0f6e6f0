use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::catalog::Catalog;
use crate::error::Result;

/// Reload the catalog once, logging the outcome
pub async fn refresh_catalog(catalog: &Catalog) -> Result<()> {
    let snapshot = catalog.reload().await?;
    info!(
        "🔄 Catalog refreshed: {} events, {} registrations (version {})",
        snapshot.events.len(),
        snapshot.registrations.len(),
        snapshot.version
    );
    Ok(())
}

/// Spawn the periodic catalog refresher. A failed refresh keeps the old snapshot.
pub fn spawn_catalog_refresher(
    catalog: Catalog,
    every: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);

        // Skip first tick (runs immediately otherwise)
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = refresh_catalog(&catalog).await {
                        error!("Failed to refresh catalog, serving previous snapshot: {:?}", e);
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Catalog refresher shutting down");
                    break;
                }
            }
        }
    })
}
