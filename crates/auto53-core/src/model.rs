//! Reconciliation data model
//!
//! Plain data handed between the synthesizer, reconciler and planner. None of
//! these types outlive a single reconciliation pass and none of them cache
//! derived state: a record's identity is recomputed from its fields by
//! [`crate::fingerprint`] whenever it is needed.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

/// Snapshot of one compute instance as reported by the inventory source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Provider instance identifier (e.g. `i-0123456789abcdef0`)
    pub id: String,

    /// Public address, absent for instances without one
    #[serde(default)]
    pub public_ip: Option<String>,

    /// Private address, absent for instances that are not attached
    #[serde(default)]
    pub private_ip: Option<String>,

    /// Free-form instance tags
    #[serde(default)]
    pub tags: HashMap<String, String>,

    /// Whether the instance is in the running state
    #[serde(default)]
    pub running: bool,
}

impl Instance {
    /// Create a running instance with no addresses or tags
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            running: true,
            ..Self::default()
        }
    }

    /// Set the public address
    pub fn with_public_ip(mut self, ip: impl Into<String>) -> Self {
        self.public_ip = Some(ip.into());
        self
    }

    /// Set the private address
    pub fn with_private_ip(mut self, ip: impl Into<String>) -> Self {
        self.private_ip = Some(ip.into());
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Set the running flag
    pub fn with_running(mut self, running: bool) -> Self {
        self.running = running;
        self
    }
}

/// Named collection of instances sharing group membership
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoScalingGroup {
    /// Group name, unique within a reconciliation pass
    pub name: String,

    /// Current members
    #[serde(default)]
    pub instances: Vec<Instance>,
}

impl AutoScalingGroup {
    /// Create a group
    pub fn new(name: impl Into<String>, instances: Vec<Instance>) -> Self {
        Self {
            name: name.into(),
            instances,
        }
    }
}

/// Hosted zone
///
/// Two zones are equal when their IDs are equal; the display name and the
/// private flag are descriptive only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Zone {
    /// Opaque hosted zone identifier
    #[serde(alias = "ID", alias = "Id")]
    pub id: String,

    /// Zone apex, with or without the trailing dot
    #[serde(alias = "Name")]
    pub name: String,

    /// Whether the zone is private
    #[serde(default, alias = "Private")]
    pub private: bool,
}

impl Zone {
    /// Create a public zone
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            private: false,
        }
    }

    /// Zone apex without the trailing dot
    pub fn apex(&self) -> &str {
        self.name.trim_end_matches('.')
    }

    /// Fully-qualified, dot-terminated name of `name` within this zone
    pub fn fqdn(&self, name: &str) -> String {
        format!("{}.{}.", name, self.apex())
    }

    /// Inverse of [`Zone::fqdn`]: the zone-relative part of a record name
    ///
    /// Returns `None` when `fqdn` does not belong to this zone.
    pub fn relative_name<'a>(&self, fqdn: &'a str) -> Option<&'a str> {
        let trimmed = fqdn.trim_end_matches('.');
        let suffix = format!(".{}", self.apex());
        trimmed.strip_suffix(suffix.as_str())
    }
}

impl PartialEq for Zone {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Zone {}

impl Hash for Zone {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Address record: a name within a zone mapped to a set of IPs
///
/// `ips` keeps encounter order but is compared as a set when diffing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Zone the record lives in
    pub zone: Zone,

    /// Zone-relative record name
    pub name: String,

    /// Addresses, in encounter order
    pub ips: Vec<String>,
}

impl Record {
    /// Create a record
    pub fn new(zone: Zone, name: impl Into<String>, ips: Vec<String>) -> Self {
        Self {
            zone,
            name: name.into(),
            ips,
        }
    }

    /// Distinct addresses of this record
    pub fn ip_set(&self) -> BTreeSet<&str> {
        self.ips.iter().map(String::as_str).collect()
    }

    /// Fully-qualified, dot-terminated record name
    pub fn fqdn(&self) -> String {
        self.zone.fqdn(&self.name)
    }
}

/// What an evaluation does to its record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationKind {
    /// Record must be created
    Add,
    /// Record must be deleted
    Remove,
    /// Kind not understood by this version (only produced by deserialization)
    #[serde(other)]
    Unknown,
}

impl EvaluationKind {
    /// Label used in plan tables
    pub fn label(&self) -> &'static str {
        match self {
            EvaluationKind::Add => "create",
            EvaluationKind::Remove => "delete",
            EvaluationKind::Unknown => "unknown",
        }
    }

    /// Position within a sorted plan: deletions precede creations of a name
    pub(crate) fn rank(&self) -> u8 {
        match self {
            EvaluationKind::Remove => 0,
            EvaluationKind::Add => 1,
            EvaluationKind::Unknown => 2,
        }
    }
}

/// Intended mutation of a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Add or remove
    pub kind: EvaluationKind,

    /// Record to add or remove
    pub record: Record,
}

impl Evaluation {
    /// Evaluation creating `record`
    pub fn add(record: Record) -> Self {
        Self {
            kind: EvaluationKind::Add,
            record,
        }
    }

    /// Evaluation deleting `record`
    pub fn remove(record: Record) -> Self {
        Self {
            kind: EvaluationKind::Remove,
            record,
        }
    }
}

/// Provider-agnostic change action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    /// Create a record set
    Create,
    /// Delete a record set
    Delete,
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeAction::Create => write!(f, "CREATE"),
            ChangeAction::Delete => write!(f, "DELETE"),
        }
    }
}

/// One primitive change within a zone batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDirective {
    /// Create or delete
    pub action: ChangeAction,

    /// Fully-qualified, dot-terminated record name
    pub name: String,

    /// DNS record type, always `A`
    pub record_type: String,

    /// Address payload, verbatim from the record
    pub values: Vec<String>,

    /// Time-to-live in seconds
    pub ttl: u32,
}

/// All changes for one zone in one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneChangeBatch {
    /// Target zone
    pub zone: Zone,

    /// Human-readable batch comment
    pub comment: String,

    /// Directives in evaluation order
    pub changes: Vec<ChangeDirective>,
}
