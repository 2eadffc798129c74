// # Memory Provider
//
// In-memory implementation of InventorySource, RecordSource and ChangeSink.
//
// ## Purpose
//
// Holds groups and hosted zones in process memory. Batches are applied to
// the same state the record source reads, so a second pass over unchanged
// inventory produces no changes.
//
// ## When to Use
//
// - Testing environments
// - Embedding the engine where another component owns the real provider
// - Rehearsing rule files without touching a real zone

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::ProviderState;
use crate::Error;
use crate::model::{AutoScalingGroup, Record, Zone, ZoneChangeBatch};
use crate::traits::{ChangeSink, InventorySource, RecordSource};

/// In-memory provider implementation
///
/// # Example
///
/// ```rust,no_run
/// use auto53_core::model::{AutoScalingGroup, Instance, Zone};
/// use auto53_core::provider::{MemoryProvider, ProviderState};
///
/// let provider = MemoryProvider::with_state(
///     ProviderState::new()
///         .with_zone(Zone::new("Z123", "example.com"))
///         .with_group(AutoScalingGroup::new(
///             "web",
///             vec![Instance::new("i-1").with_private_ip("10.0.0.1")],
///         )),
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    inner: Arc<RwLock<ProviderState>>,
    applied: Arc<RwLock<Vec<ZoneChangeBatch>>>,
}

impl MemoryProvider {
    /// Create an empty provider (no groups, no zones)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider seeded with `state`
    pub fn with_state(state: ProviderState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
            applied: Arc::default(),
        }
    }

    /// Replace a group's membership
    pub async fn set_group(&self, group: AutoScalingGroup) {
        self.inner
            .write()
            .await
            .groups
            .insert(group.name.clone(), group);
    }

    /// Remove a group entirely
    pub async fn remove_group(&self, name: &str) {
        self.inner.write().await.groups.remove(name);
    }

    /// Seed a record outside of any batch
    pub async fn put_record(&self, record: Record) {
        self.inner.write().await.put_record(record);
    }

    /// Current address records of a zone (empty if the zone is unknown)
    pub async fn records(&self, zone: &Zone) -> Vec<Record> {
        self.inner
            .read()
            .await
            .records_in(zone)
            .unwrap_or_default()
    }

    /// Batches accepted so far, in submission order
    pub async fn applied_batches(&self) -> Vec<ZoneChangeBatch> {
        self.applied.read().await.clone()
    }

    /// Copy of the current state
    pub async fn state(&self) -> ProviderState {
        self.inner.read().await.clone()
    }
}

#[async_trait]
impl InventorySource for MemoryProvider {
    async fn auto_scaling_groups(
        &self,
        names: &[String],
    ) -> Result<HashMap<String, AutoScalingGroup>, Error> {
        Ok(self.inner.read().await.groups_for(names))
    }

    fn source_name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl RecordSource for MemoryProvider {
    async fn zone_records(&self, zone: &Zone) -> Result<Vec<Record>, Error> {
        self.inner.read().await.records_in(zone)
    }

    fn source_name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl ChangeSink for MemoryProvider {
    async fn submit(&self, batch: &ZoneChangeBatch) -> Result<(), Error> {
        self.inner.write().await.apply(batch)?;
        self.applied.write().await.push(batch.clone());
        tracing::debug!(
            "Applied {} change(s) to zone {}",
            batch.changes.len(),
            batch.zone.id
        );
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "memory"
    }
}
