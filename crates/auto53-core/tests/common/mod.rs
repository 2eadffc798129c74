//! Test doubles and common utilities for contract tests
//!
//! The in-memory provider holds the "world"; the doubles here wrap it to
//! count calls and to inject failures for chosen zones.

#![allow(dead_code)]

use auto53_core::config::{Auto53Config, RuleConfig};
use auto53_core::error::{Error, Result};
use auto53_core::model::{AutoScalingGroup, Instance, Record, Zone, ZoneChangeBatch};
use auto53_core::provider::{MemoryProvider, ProviderState};
use auto53_core::traits::{ChangeSink, InventorySource, ProviderHandle, RecordSource};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Inventory source that counts calls and forwards to a memory provider
pub struct CountingInventory {
    inner: Arc<MemoryProvider>,
    calls: Arc<AtomicUsize>,
}

impl CountingInventory {
    pub fn new(inner: Arc<MemoryProvider>) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times auto_scaling_groups() was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl InventorySource for CountingInventory {
    async fn auto_scaling_groups(
        &self,
        names: &[String],
    ) -> Result<HashMap<String, AutoScalingGroup>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.auto_scaling_groups(names).await
    }

    fn source_name(&self) -> &'static str {
        "counting"
    }
}

/// Change sink that records submissions and rejects chosen zones
pub struct ScriptedSink {
    inner: Arc<MemoryProvider>,
    reject: HashSet<String>,
    submitted: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSink {
    /// Forward every batch to `inner`
    pub fn new(inner: Arc<MemoryProvider>) -> Self {
        Self {
            inner,
            reject: HashSet::new(),
            submitted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reject batches for `zone_id` without forwarding them
    pub fn rejecting(mut self, zone_id: &str) -> Self {
        self.reject.insert(zone_id.to_string());
        self
    }

    /// Zone IDs in the order their batches reached the sink
    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChangeSink for ScriptedSink {
    async fn submit(&self, batch: &ZoneChangeBatch) -> Result<()> {
        self.submitted.lock().unwrap().push(batch.zone.id.clone());
        if self.reject.contains(&batch.zone.id) {
            return Err(Error::Other("Throttling: rate exceeded".to_string()));
        }
        self.inner.submit(batch).await
    }

    fn sink_name(&self) -> &'static str {
        "scripted"
    }
}

/// Record source that always fails
pub struct UnreachableRecords;

#[async_trait::async_trait]
impl RecordSource for UnreachableRecords {
    async fn zone_records(&self, zone: &Zone) -> Result<Vec<Record>> {
        Err(Error::record_source(format!("zone {} unreachable", zone.id)))
    }

    fn source_name(&self) -> &'static str {
        "unreachable"
    }
}

pub fn zone_a() -> Zone {
    Zone::new("Z1", "apex1.example.")
}

pub fn zone_b() -> Zone {
    Zone::new("Z2", "apex2.example.")
}

/// Running instance with a private address
pub fn instance(id: &str, private_ip: &str) -> Instance {
    Instance::new(id).with_private_ip(private_ip)
}

pub fn group(name: &str, instances: Vec<Instance>) -> AutoScalingGroup {
    AutoScalingGroup::new(name, instances)
}

/// Memory provider holding both test zones and the given groups
pub fn world(groups: Vec<AutoScalingGroup>) -> Arc<MemoryProvider> {
    let mut state = ProviderState::new().with_zone(zone_a()).with_zone(zone_b());
    for g in groups {
        state = state.with_group(g);
    }
    Arc::new(MemoryProvider::with_state(state))
}

/// Handle reading from `world` and submitting through `sink`
pub fn handle_with_sink(world: &Arc<MemoryProvider>, sink: Arc<dyn ChangeSink>) -> ProviderHandle {
    ProviderHandle {
        inventory: world.clone(),
        records: world.clone(),
        sink,
    }
}

/// Helper to create a minimal Auto53Config for testing
pub fn minimal_config(rules: Vec<RuleConfig>) -> Auto53Config {
    let mut config = Auto53Config::new(rules);
    config.engine.event_channel_capacity = 100;
    config
}
