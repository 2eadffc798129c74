// # auto53-core
//
// Core library for keeping DNS address records in sync with auto-scaling
// group membership.
//
// ## Architecture Overview
//
// - **Synthesizer**: groups + naming rules → desired records
// - **Reconciler**: current vs desired records → add/remove evaluations
// - **Planner**: evaluations → one atomic change batch per zone
// - **InventorySource / RecordSource / ChangeSink**: traits for the provider
//   I/O the core never performs itself
// - **Auto53Engine**: runs passes (fetch, synthesize, diff, plan, submit)
// - **ProviderRegistry**: plugin-based registry for providers
//
// ## Design Principles
//
// 1. **Pure core**: Synthesis, diffing and planning are synchronous functions
// 2. **Content-addressed**: Records compare by fingerprint of zone, name and IP set
// 3. **Plugin-Based**: Providers are registered dynamically, no hard-coded if-else
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Idempotency**: A pass over converged state produces no changes

pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod model;
pub mod planner;
pub mod provider;
pub mod reconciler;
pub mod registry;
pub mod report;
pub mod rule;
pub mod synthesizer;
pub mod template;
pub mod traits;

// Re-export core types for convenience
pub use config::{Auto53Config, EngineConfig, ProviderConfig, RuleConfig};
pub use engine::{Auto53Engine, EngineEvent, PassReport, SubmissionReport};
pub use error::{Error, Result};
pub use fingerprint::fingerprint;
pub use model::{
    AutoScalingGroup, ChangeAction, ChangeDirective, Evaluation, EvaluationKind, Instance,
    Record, Zone, ZoneChangeBatch,
};
pub use provider::{MemoryProvider, SnapshotProvider};
pub use reconciler::{diff, sort_evaluations};
pub use registry::ProviderRegistry;
pub use rule::{AddressSelection, NamingRule};
pub use synthesizer::synthesize;
pub use template::NameTemplate;
pub use traits::{ChangeSink, InventorySource, ProviderFactory, ProviderHandle, RecordSource};
