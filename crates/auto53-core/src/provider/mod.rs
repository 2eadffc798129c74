//! Bundled providers
//!
//! Two self-contained providers ship with the core:
//!
//! - [`MemoryProvider`]: inventory and zones held in memory, for tests and
//!   embedding
//! - [`SnapshotProvider`]: the same state persisted as a JSON snapshot file
//!
//! Both keep their data in a [`ProviderState`], which also implements the
//! batch semantics of the authoritative service: a batch either applies in
//! full or not at all, a `DELETE` must name an existing record set with the
//! same values, and a `CREATE` must not collide with an existing one.

pub mod memory;
pub mod snapshot;

pub use memory::MemoryProvider;
pub use snapshot::SnapshotProvider;

use crate::error::{Error, Result};
use crate::model::{AutoScalingGroup, ChangeAction, Record, Zone, ZoneChangeBatch};
use crate::planner::{ADDRESS_RECORD_TYPE, RECORD_TTL};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Values and TTL of one address record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Addresses
    pub values: Vec<String>,

    /// Time-to-live in seconds
    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

fn default_ttl() -> u32 {
    RECORD_TTL
}

impl RecordSet {
    fn matches(&self, values: &[String]) -> bool {
        let ours: BTreeSet<&str> = self.values.iter().map(String::as_str).collect();
        let theirs: BTreeSet<&str> = values.iter().map(String::as_str).collect();
        ours == theirs
    }
}

/// A hosted zone and its address record sets, keyed by dot-terminated FQDN
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedZone {
    /// Zone identity
    pub zone: Zone,

    /// Record sets by fully-qualified name
    #[serde(default)]
    pub records: BTreeMap<String, RecordSet>,
}

impl HostedZone {
    fn new(zone: Zone) -> Self {
        Self {
            zone,
            records: BTreeMap::new(),
        }
    }
}

/// Inventory and zone contents of a bundled provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderState {
    /// Auto-scaling groups by name
    #[serde(default)]
    pub groups: BTreeMap<String, AutoScalingGroup>,

    /// Hosted zones by zone ID
    #[serde(default)]
    pub zones: BTreeMap<String, HostedZone>,
}

impl ProviderState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a group
    pub fn with_group(mut self, group: AutoScalingGroup) -> Self {
        self.groups.insert(group.name.clone(), group);
        self
    }

    /// Add an empty hosted zone (no-op if the zone already exists)
    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.zones
            .entry(zone.id.clone())
            .or_insert_with(|| HostedZone::new(zone));
        self
    }

    /// Seed a record, creating its zone if needed
    pub fn with_record(mut self, record: Record) -> Self {
        self.put_record(record);
        self
    }

    pub(crate) fn put_record(&mut self, record: Record) {
        let fqdn = record.fqdn();
        let hosted = self
            .zones
            .entry(record.zone.id.clone())
            .or_insert_with(|| HostedZone::new(record.zone.clone()));
        hosted.records.insert(
            fqdn,
            RecordSet {
                values: record.ips,
                ttl: RECORD_TTL,
            },
        );
    }

    /// Requested groups; names the state does not know map to empty groups
    pub fn groups_for(&self, names: &[String]) -> HashMap<String, AutoScalingGroup> {
        names
            .iter()
            .map(|name| {
                let group = self
                    .groups
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| AutoScalingGroup::new(name.clone(), Vec::new()));
                (name.clone(), group)
            })
            .collect()
    }

    /// Address records of `zone`, named relative to the zone apex
    ///
    /// Record sets at the apex itself have no relative name and are skipped.
    /// A zone whose name disagrees with the hosted zone of the same ID is
    /// rejected.
    pub fn records_in(&self, zone: &Zone) -> Result<Vec<Record>> {
        let hosted = self
            .zones
            .get(&zone.id)
            .ok_or_else(|| Error::record_source(format!("no such hosted zone: {}", zone.id)))?;

        if !hosted.zone.apex().eq_ignore_ascii_case(zone.apex()) {
            return Err(Error::record_source(format!(
                "hosted zone {} is {}, not {}",
                zone.id,
                hosted.zone.apex(),
                zone.apex()
            )));
        }

        let mut records = Vec::with_capacity(hosted.records.len());
        for (fqdn, set) in &hosted.records {
            match hosted.zone.relative_name(fqdn) {
                Some(name) => records.push(Record::new(zone.clone(), name, set.values.clone())),
                None => tracing::debug!("Skipping record set {} at the apex of zone {}", fqdn, zone.id),
            }
        }

        Ok(records)
    }

    /// Apply a batch atomically
    ///
    /// Directives are validated against a working copy in order; the zone is
    /// only replaced once every directive succeeded.
    pub fn apply(&mut self, batch: &ZoneChangeBatch) -> Result<()> {
        let zone_id = &batch.zone.id;
        let hosted = self
            .zones
            .get(zone_id)
            .ok_or_else(|| Error::submission(zone_id, "no such hosted zone"))?;

        let mut records = hosted.records.clone();
        for change in &batch.changes {
            if change.record_type != ADDRESS_RECORD_TYPE {
                return Err(Error::submission(
                    zone_id,
                    format!(
                        "unsupported record type {} for {}",
                        change.record_type, change.name
                    ),
                ));
            }

            match change.action {
                ChangeAction::Delete => match records.get(&change.name) {
                    Some(existing) if existing.matches(&change.values) => {
                        records.remove(&change.name);
                    }
                    Some(_) => {
                        return Err(Error::submission(
                            zone_id,
                            format!(
                                "tried to delete record set {} but the values do not match",
                                change.name
                            ),
                        ));
                    }
                    None => {
                        return Err(Error::submission(
                            zone_id,
                            format!("tried to delete record set {} but it was not found", change.name),
                        ));
                    }
                },
                ChangeAction::Create => {
                    if records.contains_key(&change.name) {
                        return Err(Error::submission(
                            zone_id,
                            format!(
                                "tried to create record set {} but it already exists",
                                change.name
                            ),
                        ));
                    }
                    records.insert(
                        change.name.clone(),
                        RecordSet {
                            values: change.values.clone(),
                            ttl: change.ttl,
                        },
                    );
                }
            }
        }

        if let Some(hosted) = self.zones.get_mut(zone_id) {
            hosted.records = records;
        }
        Ok(())
    }
}
