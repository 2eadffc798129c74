// # Provider Handle
//
// A provider bundles the three collaborators a reconciliation pass needs.
// Most providers implement all three traits on one type; the handle lets
// them be mixed (e.g. a real inventory with a recording sink in tests).

use super::{ChangeSink, InventorySource, RecordSource};
use async_trait::async_trait;
use std::sync::Arc;

/// The collaborators of one engine
#[derive(Clone)]
pub struct ProviderHandle {
    /// Where group membership comes from
    pub inventory: Arc<dyn InventorySource>,
    /// Where current zone contents come from
    pub records: Arc<dyn RecordSource>,
    /// Where change batches go
    pub sink: Arc<dyn ChangeSink>,
}

impl ProviderHandle {
    /// Handle whose three roles are played by the same provider
    pub fn from_shared<P>(provider: Arc<P>) -> Self
    where
        P: InventorySource + RecordSource + ChangeSink + 'static,
    {
        Self {
            inventory: provider.clone(),
            records: provider.clone(),
            sink: provider,
        }
    }
}

impl std::fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("inventory", &self.inventory.source_name())
            .field("records", &self.records.source_name())
            .field("sink", &self.sink.sink_name())
            .finish()
    }
}

/// Helper trait for constructing providers from configuration
///
/// Creation is async since providers may load state (e.g. a snapshot file)
/// before they can answer.
#[async_trait]
pub trait ProviderFactory: Send + Sync {
    /// Create a provider from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Provider configuration; factories reject variants they do
    ///   not handle with a configuration error
    async fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<ProviderHandle, crate::Error>;
}
