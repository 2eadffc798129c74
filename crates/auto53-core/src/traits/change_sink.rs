// # Change Sink Trait
//
// Defines the interface for submitting zone change batches to the
// authoritative DNS service.
//
// ## Usage
//
// ```rust,ignore
// use auto53_core::{ChangeSink, planner};
//
// let batches = planner::plan(&evaluations)?;
// for batch in batches.values() {
//     sink.submit(batch).await?;
// }
// ```

use crate::model::ZoneChangeBatch;
use async_trait::async_trait;

/// Trait for change sink implementations
///
/// # Contract
///
/// - A batch is applied atomically: either every directive takes effect or
///   none does.
/// - The engine never submits two batches for the same zone concurrently,
///   but batches for different zones may be in flight at the same time.
///
/// # Trust Level: Untrusted
///
/// Sinks perform one submission per call and return the provider's verdict.
/// They must not retry or back off (throttling surfaces as an error), and
/// must not decide whether a change is needed.
#[async_trait]
pub trait ChangeSink: Send + Sync {
    /// Submit one zone's batch
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The batch was accepted
    /// - `Err(Error)`: The provider rejected the batch or could not be reached
    async fn submit(&self, batch: &ZoneChangeBatch) -> Result<(), crate::Error>;

    /// Get the sink name (for logging/debugging)
    fn sink_name(&self) -> &'static str;
}
