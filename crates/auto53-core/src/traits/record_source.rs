// # Record Source Trait
//
// Defines the interface for reading what a hosted zone currently contains.

use crate::model::{Record, Zone};
use async_trait::async_trait;

/// Trait for record source implementations
///
/// Implementations return the zone's address (`A`) records only, each with
/// its name relative to the zone apex and its `zone` field set to the zone
/// that was asked for. Other record types are filtered out upstream; the
/// engine never sees them.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// List the current address records of a zone
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Record>)`: the zone's address records (possibly empty)
    /// - `Err(Error)`: If the zone could not be read
    async fn zone_records(&self, zone: &Zone) -> Result<Vec<Record>, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
