// # Snapshot Provider
//
// File-backed provider: inventory and zone contents live in one JSON file.
//
// ## Purpose
//
// Lets the daemon run against a provider-neutral description of the world.
// Another process (or an operator) keeps the `groups` section current; the
// daemon converges the `zones` section and writes it back.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good snapshot
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "updated_at": "2025-01-09T12:00:00Z",
//   "groups": {
//     "web": {
//       "name": "web",
//       "instances": [
//         { "id": "i-1", "private_ip": "10.0.0.1", "tags": {}, "running": true }
//       ]
//     }
//   },
//   "zones": {
//     "Z123": {
//       "zone": { "id": "Z123", "name": "example.com." },
//       "records": {
//         "i-1.example.com.": { "values": ["10.0.0.1"], "ttl": 300 }
//       }
//     }
//   }
// }
// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use super::ProviderState;
use crate::Error;
use crate::model::{AutoScalingGroup, Record, Zone, ZoneChangeBatch};
use crate::traits::{ChangeSink, InventorySource, RecordSource};

/// Snapshot file format version
const SNAPSHOT_FILE_VERSION: &str = "1.0";

/// JSON snapshot provider with crash recovery
///
/// The file is re-read at the start of every inventory fetch so external
/// edits to group membership are picked up by the next pass. Accepted
/// batches are written back immediately.
///
/// # Example
///
/// ```rust,no_run
/// use auto53_core::provider::SnapshotProvider;
/// use auto53_core::InventorySource;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let provider = SnapshotProvider::new("/var/lib/auto53/snapshot.json").await?;
///
///     let groups = provider.auto_scaling_groups(&["web".to_string()]).await?;
///     println!("{} member(s)", groups["web"].instances.len());
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct SnapshotProvider {
    path: PathBuf,
    state: Arc<RwLock<ProviderState>>,
}

/// Serializable snapshot file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct SnapshotFileFormat {
    version: String,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    state: ProviderState,
}

impl SnapshotProvider {
    /// Create or load a snapshot provider
    ///
    /// This will:
    /// 1. Try to load the snapshot file
    /// 2. If corruption detected, try to load from backup
    /// 3. If both fail (or the file does not exist), start empty
    /// 4. Create parent directories if needed
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::config(format!(
                        "Failed to create snapshot directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let state = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot with automatic recovery
    ///
    /// Recovery strategy:
    /// 1. Try to load the main file
    /// 2. If it does not parse, try loading the backup
    /// 3. If the backup also fails, start with an empty state
    async fn load_with_recovery(path: &Path) -> Result<ProviderState, Error> {
        match Self::load(path).await {
            Ok(state) => {
                tracing::debug!(
                    "Loaded snapshot: {} group(s), {} zone(s)",
                    state.groups.len(),
                    state.zones.len()
                );
                Ok(state)
            }
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "Snapshot file appears corrupted: {}. Attempting recovery from backup.",
                    e
                );

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::warn!("No backup file found. Starting with empty snapshot.");
                    return Ok(ProviderState::new());
                }

                match Self::load(&backup_path).await {
                    Ok(state) => {
                        tracing::info!(
                            "Recovered snapshot from backup: {} zone(s)",
                            state.zones.len()
                        );
                        if let Err(restore_err) = Self::restore_from_backup(path, &backup_path).await
                        {
                            tracing::error!(
                                "Failed to restore snapshot file from backup: {}",
                                restore_err
                            );
                        }
                        Ok(state)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "Backup also corrupted: {}. Starting with empty snapshot.",
                            backup_err
                        );
                        Ok(ProviderState::new())
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Load the snapshot file; a missing file is an empty state
    async fn load(path: &Path) -> Result<ProviderState, Error> {
        if !path.exists() {
            tracing::debug!("Snapshot file does not exist: {}", path.display());
            return Ok(ProviderState::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::snapshot(format!(
                "Failed to read snapshot file {}: {}",
                path.display(),
                e
            ))
        })?;

        let file: SnapshotFileFormat = serde_json::from_str(&content)?;

        if file.version != SNAPSHOT_FILE_VERSION {
            tracing::warn!(
                "Snapshot file version mismatch: expected {}, got {}. \
                Attempting to load anyway.",
                SNAPSHOT_FILE_VERSION,
                file.version
            );
        }

        Ok(file.state)
    }

    /// Re-read the file, keeping the in-memory state if that fails
    async fn refresh(&self) {
        match Self::load(&self.path).await {
            Ok(state) => *self.state.write().await = state,
            Err(e) => tracing::warn!(
                "Failed to reload snapshot {}: {}. Using last loaded state.",
                self.path.display(),
                e
            ),
        }
    }

    /// Write `state` to the snapshot file atomically
    async fn write(&self, state: &ProviderState) -> Result<(), Error> {
        let file = SnapshotFileFormat {
            version: SNAPSHOT_FILE_VERSION.to_string(),
            updated_at: Some(Utc::now()),
            state: state.clone(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::snapshot(format!("Failed to serialize snapshot: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut out = fs::File::create(&temp_path).await.map_err(|e| {
                Error::snapshot(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            out.write_all(json.as_bytes()).await.map_err(|e| {
                Error::snapshot(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            out.flush().await.map_err(|e| {
                Error::snapshot(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::snapshot(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Snapshot written to {}", self.path.display());
        Ok(())
    }

    async fn restore_from_backup(path: &Path, backup_path: &Path) -> Result<(), Error> {
        fs::copy(backup_path, path).await.map_err(|e| {
            Error::snapshot(format!(
                "Failed to restore from backup {} to {}: {}",
                backup_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!("Restored snapshot file from backup");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }

    /// Force the current state to disk
    pub async fn sync(&self) -> Result<(), Error> {
        let state = self.state.read().await.clone();
        self.write(&state).await
    }
}

#[async_trait]
impl InventorySource for SnapshotProvider {
    async fn auto_scaling_groups(
        &self,
        names: &[String],
    ) -> Result<HashMap<String, AutoScalingGroup>, Error> {
        self.refresh().await;
        Ok(self.state.read().await.groups_for(names))
    }

    fn source_name(&self) -> &'static str {
        "snapshot"
    }
}

#[async_trait]
impl RecordSource for SnapshotProvider {
    async fn zone_records(&self, zone: &Zone) -> Result<Vec<Record>, Error> {
        self.state.read().await.records_in(zone)
    }

    fn source_name(&self) -> &'static str {
        "snapshot"
    }
}

#[async_trait]
impl ChangeSink for SnapshotProvider {
    async fn submit(&self, batch: &ZoneChangeBatch) -> Result<(), Error> {
        let mut guard = self.state.write().await;

        let mut next = guard.clone();
        next.apply(batch)?;
        self.write(&next).await.map_err(|e| {
            Error::submission(&batch.zone.id, format!("snapshot not written: {}", e))
        })?;
        *guard = next;

        tracing::debug!(
            "Applied {} change(s) to zone {} in {}",
            batch.changes.len(),
            batch.zone.id,
            self.path.display()
        );
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "snapshot"
    }
}
