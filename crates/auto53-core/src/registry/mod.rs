//! Plugin-based provider registry
//!
//! The registry maps provider type names to factories, so the daemon can
//! build its collaborators from configuration without hardcoded if-else
//! chains. The bundled `memory` and `snapshot` providers are registered by
//! [`ProviderRegistry::with_builtin`]; cloud providers live in their own
//! crates and register themselves:
//!
//! ```rust,ignore
//! # use auto53_core::registry::ProviderRegistry;
//! // In an auto53-provider-aws crate
//! pub fn register(registry: &ProviderRegistry) {
//!     registry.register_provider("aws", Box::new(AwsFactory));
//! }
//!
//! // In the daemon
//! let registry = ProviderRegistry::with_builtin();
//! auto53_provider_aws::register(&registry);
//! let handle = registry.create_provider(&config.provider).await?;
//! ```

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::provider::{MemoryProvider, SnapshotProvider};
use crate::traits::{ProviderFactory, ProviderHandle};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Provider registry for plugin-based provider creation
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered provider factories
    providers: RwLock<HashMap<String, Arc<dyn ProviderFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the bundled `memory` and `snapshot` providers
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register_provider("memory", Box::new(MemoryProviderFactory));
        registry.register_provider("snapshot", Box::new(SnapshotProviderFactory));
        registry
    }

    /// Register a provider factory
    ///
    /// Registering a name twice replaces the earlier factory.
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "snapshot", "aws")
    /// - `factory`: Factory object for creating provider instances
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn ProviderFactory>) {
        let name = name.into();
        self.write().insert(name, Arc::from(factory));
    }

    /// Create a provider from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Provider configuration
    ///
    /// # Returns
    ///
    /// - `Ok(ProviderHandle)`: Created collaborators
    /// - `Err(Error)`: If the provider type is not registered or creation fails
    pub async fn create_provider(&self, config: &ProviderConfig) -> Result<ProviderHandle> {
        let provider_type = config.type_name();

        let factory = self
            .read()
            .get(provider_type)
            .cloned()
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        // Lock released before the async create
        factory.create(config).await
    }

    /// List all registered provider types, sorted
    pub fn list_providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<dyn ProviderFactory>>> {
        self.providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<dyn ProviderFactory>>> {
        self.providers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Factory for [`MemoryProvider`]
struct MemoryProviderFactory;

#[async_trait]
impl ProviderFactory for MemoryProviderFactory {
    async fn create(&self, config: &ProviderConfig) -> Result<ProviderHandle> {
        match config {
            ProviderConfig::Memory => Ok(ProviderHandle::from_shared(Arc::new(
                MemoryProvider::new(),
            ))),
            other => Err(Error::config(format!(
                "memory factory cannot build a {} provider",
                other.type_name()
            ))),
        }
    }
}

/// Factory for [`SnapshotProvider`]
struct SnapshotProviderFactory;

#[async_trait]
impl ProviderFactory for SnapshotProviderFactory {
    async fn create(&self, config: &ProviderConfig) -> Result<ProviderHandle> {
        match config {
            ProviderConfig::Snapshot { path } => {
                let provider = SnapshotProvider::new(path).await?;
                Ok(ProviderHandle::from_shared(Arc::new(provider)))
            }
            other => Err(Error::config(format!(
                "snapshot factory cannot build a {} provider",
                other.type_name()
            ))),
        }
    }
}
