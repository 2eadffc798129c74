//! Error types for auto53
//!
//! Every fallible operation in the crate returns [`Error`]. Errors carry the
//! operation and the identifiers involved (group, rule, zone) so the caller
//! can report them without further context. Nothing in the core retries.

use thiserror::Error;

/// Result type alias for auto53 operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for auto53
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid rule-to-group bindings, absent inputs, bad settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Name template could not be compiled or rendered
    #[error("Template error: {0}")]
    Template(String),

    /// Absent record collection handed to the reconciler
    #[error("Invalid input: {0}")]
    Input(String),

    /// An evaluation carried a kind the planner cannot translate
    #[error("Unknown evaluation kind for record '{record}' in zone {zone_id}")]
    UnknownEvaluationKind {
        /// Zone of the offending evaluation
        zone_id: String,
        /// Record name of the offending evaluation
        record: String,
    },

    /// A change sink rejected the batch of a zone
    #[error("Submission to zone {zone_id} failed: {message}")]
    Submission {
        /// Zone whose batch failed
        zone_id: String,
        /// Error reported by the sink
        message: String,
    },

    /// Inventory source failures
    #[error("Inventory error: {0}")]
    Inventory(String),

    /// Record source failures
    #[error("Record source error: {0}")]
    RecordSource(String),

    /// Snapshot file failures
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a template error
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    /// Create an input error
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Create an inventory error
    pub fn inventory(msg: impl Into<String>) -> Self {
        Self::Inventory(msg.into())
    }

    /// Create a record source error
    pub fn record_source(msg: impl Into<String>) -> Self {
        Self::RecordSource(msg.into())
    }

    /// Create a snapshot error
    pub fn snapshot(msg: impl Into<String>) -> Self {
        Self::Snapshot(msg.into())
    }

    /// Wrap a sink failure with the zone it was submitted to
    pub fn submission(zone_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Submission {
            zone_id: zone_id.into(),
            message: message.into(),
        }
    }

    /// Whether this error aborts a pass before any zone was touched
    pub fn is_fatal_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Template(_))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
