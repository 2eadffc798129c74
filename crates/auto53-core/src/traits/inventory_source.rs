// # Inventory Source Trait
//
// Defines the interface for retrieving auto-scaling group membership.
//
// ## Implementations
//
// - In-memory: `provider::MemoryProvider`
// - Snapshot file: `provider::SnapshotProvider`
//
// ## Usage
//
// ```rust,ignore
// use auto53_core::InventorySource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* InventorySource implementation */;
//
//     let groups = source
//         .auto_scaling_groups(&["web".to_string()])
//         .await?;
//
//     for instance in &groups["web"].instances {
//         println!("{} {:?}", instance.id, instance.private_ip);
//     }
//
//     Ok(())
// }
// ```

use crate::model::AutoScalingGroup;
use async_trait::async_trait;
use std::collections::HashMap;

/// Trait for inventory source implementations
///
/// # Contract
///
/// - Every requested name is present in the returned map. A group without
///   members (scaled to zero, or unknown to the provider) maps to an empty
///   group, so its records are removed rather than reported as an error.
/// - Group names are unique keys; the engine does no further deduplication.
/// - Pagination, filtering and rate limiting are the implementation's concern.
///
/// # Trust Level: Untrusted
///
/// Inventory sources perform I/O against the compute provider only. They
/// must not retry, cache across calls or touch zones.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Fetch the current members of the named groups
    ///
    /// # Parameters
    ///
    /// - `names`: Distinct group names referenced by the naming rules
    ///
    /// # Returns
    ///
    /// - `Ok(HashMap)`: group name → group
    /// - `Err(Error)`: If the inventory could not be retrieved
    async fn auto_scaling_groups(
        &self,
        names: &[String],
    ) -> Result<HashMap<String, AutoScalingGroup>, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
