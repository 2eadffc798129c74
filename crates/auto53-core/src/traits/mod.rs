//! Collaborator traits
//!
//! The engine consumes already-fetched data and produces batch descriptions;
//! everything that talks to a cloud provider sits behind these interfaces.
//!
//! - [`InventorySource`]: Retrieve auto-scaling group membership
//! - [`RecordSource`]: Retrieve a zone's current address records
//! - [`ChangeSink`]: Submit one zone's change batch

pub mod inventory_source;
pub mod record_source;
pub mod change_sink;
pub mod provider;

pub use inventory_source::InventorySource;
pub use record_source::RecordSource;
pub use change_sink::ChangeSink;
pub use provider::{ProviderFactory, ProviderHandle};
