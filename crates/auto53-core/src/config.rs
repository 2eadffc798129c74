//! Configuration types for auto53
//!
//! Naming rules come from a YAML rule file; everything else (provider,
//! engine tuning) is assembled by the embedding application.
//!
//! ## Rule file
//!
//! ```yaml
//! - AutoScalingGroup: web
//!   Zone:
//!     ID: Z0123456789
//!     Name: example.com
//!   Record: "{{ .Id }}-web"
//!   Public: true
//! - AutoScalingGroup: web
//!   Zone:
//!     ID: Z0123456789
//!     Name: example.com
//!   Record: web
//! ```

use crate::error::{Error, Result};
use crate::model::Zone;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main auto53 configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auto53Config {
    /// Naming rules to enforce
    pub rules: Vec<RuleConfig>,

    /// Where inventory and records come from and where batches go
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Auto53Config {
    /// Create a configuration with default provider and engine settings
    pub fn new(rules: Vec<RuleConfig>) -> Self {
        Self {
            rules,
            provider: ProviderConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.rules.is_empty() {
            return Err(Error::config("No naming rules configured"));
        }

        for (index, rule) in self.rules.iter().enumerate() {
            rule.validate().map_err(|e| match e {
                Error::Config(msg) => Error::config(format!("rule #{}: {}", index + 1, msg)),
                other => other,
            })?;
        }

        self.provider.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

/// One naming rule as written in the rule file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleConfig {
    /// Name of the auto-scaling group whose instances back the records
    #[serde(alias = "group")]
    pub auto_scaling_group: String,

    /// Hosted zone receiving the records
    #[serde(alias = "zone")]
    pub zone: Zone,

    /// Record name template, see [`crate::template`]
    #[serde(alias = "record")]
    pub record: String,

    /// Publish public addresses instead of private ones
    #[serde(default, alias = "public")]
    pub public: bool,
}

impl RuleConfig {
    /// Create a rule publishing private addresses
    pub fn new(group: impl Into<String>, zone: Zone, record: impl Into<String>) -> Self {
        Self {
            auto_scaling_group: group.into(),
            zone,
            record: record.into(),
            public: false,
        }
    }

    /// Select public or private addresses
    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    /// Check required fields; template syntax is checked on compilation
    pub fn validate(&self) -> Result<()> {
        if self.auto_scaling_group.is_empty() {
            return Err(Error::config(format!(
                "rule for record '{}' does not have an auto-scaling group specified",
                self.record
            )));
        }
        if self.zone.id.is_empty() {
            return Err(Error::config(format!(
                "rule for group '{}' does not have a zone ID specified",
                self.auto_scaling_group
            )));
        }
        if self.zone.name.is_empty() {
            return Err(Error::config(format!(
                "rule for group '{}' does not have a zone name specified",
                self.auto_scaling_group
            )));
        }
        if self.record.trim().is_empty() {
            return Err(Error::config(format!(
                "rule for group '{}' has an empty record template",
                self.auto_scaling_group
            )));
        }
        Ok(())
    }
}

/// Parse naming rules from YAML text
pub fn rules_from_yaml(content: &str) -> Result<Vec<RuleConfig>> {
    let rules: Option<Vec<RuleConfig>> = serde_yaml::from_str(content)?;
    Ok(rules.unwrap_or_default())
}

/// Load naming rules from a YAML file
pub fn rules_from_yaml_file(path: impl AsRef<Path>) -> Result<Vec<RuleConfig>> {
    let path = path.as_ref();

    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::config(format!("configuration file {} not found", path.display()))
        } else {
            Error::config(format!(
                "couldn't read configuration file {}: {}",
                path.display(),
                e
            ))
        }
    })?;

    rules_from_yaml(&content).map_err(|e| {
        Error::config(format!(
            "couldn't parse yaml configuration file {}: {}",
            path.display(),
            e
        ))
    })
}

/// Provider configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// JSON snapshot file holding inventory and zone contents
    Snapshot {
        /// Path to the snapshot file
        path: String,
    },

    /// In-memory provider (starts empty, not persistent)
    #[default]
    Memory,

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<()> {
        match self {
            ProviderConfig::Snapshot { path } => {
                if path.is_empty() {
                    return Err(Error::config("Snapshot provider path cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(Error::config("Custom provider factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(Error::config("Custom provider config cannot be null"));
                }
                Ok(())
            }
            ProviderConfig::Memory => Ok(()),
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Snapshot { .. } => "snapshot",
            ProviderConfig::Memory => "memory",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Compute and report changes without submitting them
    #[serde(default)]
    pub dry_run: bool,

    /// Interval between reconciliation passes (in seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Submit zone batches in parallel instead of one after another
    ///
    /// Sequential submission stops at the first failing zone. Concurrent
    /// submission lets every zone finish and reports failures per zone.
    #[serde(default)]
    pub concurrent_submission: bool,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped with a warning.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(Error::config("Engine interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            interval_secs: default_interval_secs(),
            concurrent_submission: false,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_interval_secs() -> u64 {
    120
}

fn default_event_channel_capacity() -> usize {
    1000
}
