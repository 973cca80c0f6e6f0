//! Event catalog snapshots
//!
//! Loads events and registrations from the portal's JSON data directory and hands
//! out immutable snapshots:
//! - Every load produces a new [`Snapshot`] with a fresh version id
//! - Readers hold an `Arc<Snapshot>` and never observe a half-applied reload
//! - A failed reload leaves the previous snapshot in place

use crate::config::DataConfig;
use crate::error::{Error, Result};
use crate::recommendation::{Event, RegistrationRecord};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// One consistent view of the portal data
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub version: Uuid,
    pub loaded_at: DateTime<Utc>,
    pub events: Vec<Event>,
    pub registrations: Vec<RegistrationRecord>,
}

impl Snapshot {
    pub fn new(events: Vec<Event>, registrations: Vec<RegistrationRecord>) -> Self {
        Self {
            version: Uuid::new_v4(),
            loaded_at: Utc::now(),
            events,
            registrations,
        }
    }

    pub fn stats(&self) -> SnapshotStats {
        SnapshotStats {
            version: self.version,
            loaded_at: self.loaded_at,
            events: self.events.len(),
            registrations: self.registrations.len(),
        }
    }
}

/// Snapshot summary for health reporting
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStats {
    pub version: Uuid,
    pub loaded_at: DateTime<Utc>,
    pub events: usize,
    pub registrations: usize,
}

/// Shared handle to the current snapshot
#[derive(Clone)]
pub struct Catalog {
    source: Option<DataConfig>,
    current: Arc<RwLock<Arc<Snapshot>>>,
}

impl Catalog {
    /// Load the initial snapshot from the data directory
    #[instrument(skip(config), fields(dir = %config.dir.display()))]
    pub async fn load(config: &DataConfig) -> Result<Self> {
        let snapshot = read_snapshot(config).await?;
        info!(
            "📦 Loaded {} events and {} registrations",
            snapshot.events.len(),
            snapshot.registrations.len()
        );
        Ok(Self {
            source: Some(config.clone()),
            current: Arc::new(RwLock::new(Arc::new(snapshot))),
        })
    }

    /// Catalog over a fixed in-memory snapshot; `reload` keeps it as is
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            source: None,
            current: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Re-read the data directory and swap in the new snapshot
    pub async fn reload(&self) -> Result<Arc<Snapshot>> {
        let Some(config) = &self.source else {
            debug!("Catalog has no data source, keeping in-memory snapshot");
            return Ok(self.snapshot());
        };

        let snapshot = Arc::new(read_snapshot(config).await?);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::clone(&snapshot);
        Ok(snapshot)
    }

    pub fn stats(&self) -> SnapshotStats {
        self.snapshot().stats()
    }
}

async fn read_snapshot(config: &DataConfig) -> Result<Snapshot> {
    let events: Vec<Event> = read_json(&config.events_path()).await?;

    let registrations_path = config.registrations_path();
    let registrations: Vec<RegistrationRecord> =
        if tokio::fs::try_exists(&registrations_path).await? {
            read_json(&registrations_path).await?
        } else {
            warn!(
                "Registrations file {} not found, starting with none",
                registrations_path.display()
            );
            Vec::new()
        };

    Ok(Snapshot::new(events, registrations))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::catalog_with_source(format!("failed to read {}", path.display()), e)
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        Error::catalog_with_source(format!("failed to parse {}", path.display()), e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const EVENTS: &str = r#"[
        {"id": "evt-1", "name": "City Marathon", "startDate": "2026-11-02", "endDate": "2026-11-02",
         "status": "upcoming", "location": "Harbour Front",
         "sports": [{"id": "sp-run", "name": "athletics", "categories": ["Senior"]}]}
    ]"#;

    const REGISTRATIONS: &str = r#"[
        {"id": "reg-1", "eventId": "evt-1", "registeredAt": "2026-10-01T08:30:00Z", "tshirt": "M"}
    ]"#;

    #[tokio::test]
    async fn test_load_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("events.json"), EVENTS).unwrap();
        fs::write(dir.path().join("registrations.json"), REGISTRATIONS).unwrap();

        let catalog = Catalog::load(&DataConfig::in_dir(dir.path())).await.unwrap();
        let first = catalog.snapshot();
        assert_eq!(first.events.len(), 1);
        assert_eq!(first.registrations.len(), 1);

        fs::write(dir.path().join("registrations.json"), "[]").unwrap();
        let second = catalog.reload().await.unwrap();
        assert_eq!(second.registrations.len(), 0);
        assert_ne!(first.version, second.version);
        assert_eq!(catalog.stats().version, second.version);
        // readers holding the old snapshot still see it unchanged
        assert_eq!(first.registrations.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_registrations_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("events.json"), EVENTS).unwrap();

        let catalog = Catalog::load(&DataConfig::in_dir(dir.path())).await.unwrap();
        assert!(catalog.snapshot().registrations.is_empty());
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("events.json"), EVENTS).unwrap();

        let catalog = Catalog::load(&DataConfig::in_dir(dir.path())).await.unwrap();
        let before = catalog.snapshot().version;

        fs::write(dir.path().join("events.json"), "{not json").unwrap();
        let err = catalog.reload().await.unwrap_err();
        assert!(matches!(err, Error::Catalog { .. }));
        assert_eq!(catalog.snapshot().version, before);
    }

    #[tokio::test]
    async fn test_missing_events_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Catalog::load(&DataConfig::in_dir(dir.path())).await;
        assert!(result.is_err());
    }
}
