//! Reconciliation engine
//!
//! The Auto53Engine is responsible for:
//! - Fetching group membership via InventorySource
//! - Fetching current zone contents via RecordSource
//! - Synthesizing, diffing and planning per-zone batches
//! - Submitting batches via ChangeSink
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐   groups    ┌─────────────┐  desired  ┌────────────┐
//! │ InventorySource │────────────▶│ synthesize  │──────────▶│            │
//! └─────────────────┘             └─────────────┘           │    diff    │
//! ┌─────────────────┐          current records              │            │
//! │  RecordSource   │──────────────────────────────────────▶│            │
//! └─────────────────┘                                       └────────────┘
//!                                                                  │ evaluations
//!                                                                  ▼
//! ┌─────────────────┐          one batch per zone           ┌────────────┐
//! │   ChangeSink    │◀──────────────────────────────────────│    plan    │
//! └─────────────────┘                                       └────────────┘
//! ```
//!
//! ## Pass Flow
//!
//! 1. Fetch every group referenced by a rule
//! 2. Fetch the address records of every zone referenced by a rule
//! 3. Synthesize the desired records and diff them against the current ones
//! 4. Plan one batch per zone (dry-run stops here)
//! 5. Submit, sequentially or concurrently
//! 6. Emit events for monitoring/logging

pub mod submit;

pub use submit::{SubmissionReport, submit_concurrent, submit_sequential};

use crate::config::Auto53Config;
use crate::error::Result;
use crate::model::{AutoScalingGroup, Evaluation, EvaluationKind, Record, Zone, ZoneChangeBatch};
use crate::reconciler::{diff, sort_evaluations};
use crate::rule::NamingRule;
use crate::traits::ProviderHandle;
use crate::{planner, synthesizer};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, error, info, warn};

/// Events emitted by the Auto53Engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        rules_count: usize,
        zones_count: usize,
    },

    /// Reconciliation pass started
    PassStarted {
        started_at: DateTime<Utc>,
    },

    /// Desired records synthesized and current records fetched
    RecordsSynthesized {
        desired: usize,
        current: usize,
    },

    /// Diff computed
    EvaluationsComputed {
        adds: usize,
        removes: usize,
    },

    /// A zone's batch was accepted
    BatchSubmitted {
        zone_id: String,
        changes: usize,
    },

    /// A zone's batch was rejected
    BatchFailed {
        zone_id: String,
        error: String,
    },

    /// Pass finished (with or without per-zone failures)
    PassCompleted {
        evaluations: usize,
        zones_changed: usize,
        dry_run: bool,
    },

    /// Pass aborted
    PassFailed {
        error: String,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Everything one reconciliation pass saw and did
#[derive(Debug)]
pub struct PassReport {
    /// When the pass started
    pub started_at: DateTime<Utc>,

    /// Inventory the pass worked from, one entry per referenced group
    pub groups: BTreeMap<String, AutoScalingGroup>,

    /// Evaluations, sorted by zone, name and kind
    pub evaluations: Vec<Evaluation>,

    /// Planned batches, sorted by zone ID
    pub batches: Vec<ZoneChangeBatch>,

    /// Per-zone submission outcome (empty on dry runs)
    pub submission: SubmissionReport,

    /// Whether submission was skipped
    pub dry_run: bool,
}

impl PassReport {
    /// Whether the pass found nothing to change
    pub fn is_converged(&self) -> bool {
        self.evaluations.is_empty()
    }
}

/// Core reconciliation engine
///
/// ## Lifecycle
///
/// 1. Create with [`Auto53Engine::new()`] (rules are compiled here)
/// 2. Either call [`Auto53Engine::run_once()`] or start the periodic loop
///    with [`Auto53Engine::run()`]
/// 3. The loop runs until a shutdown signal is received
///
/// ## Load Resistance
///
/// - **Bounded event channel**: Prevents unbounded memory growth
/// - **Event dropping**: When the channel is full, new events are dropped (logged)
/// - **Missed ticks are delayed**: A slow pass never triggers a burst of
///   catch-up passes
pub struct Auto53Engine {
    /// Inventory, record source and change sink
    provider: ProviderHandle,

    /// Compiled naming rules
    rules: Vec<NamingRule>,

    /// Distinct group names referenced by the rules, sorted
    group_names: Vec<String>,

    /// Distinct zones referenced by the rules, sorted by ID
    zones: Vec<Zone>,

    /// Plan only, never submit
    dry_run: bool,

    /// Delay between passes
    interval: Duration,

    /// Submit zones concurrently instead of sequentially
    concurrent_submission: bool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl Auto53Engine {
    /// Create a new engine
    ///
    /// # Parameters
    ///
    /// - `provider`: Collaborators the engine reads from and submits to
    /// - `config`: Rules and engine settings
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    ///
    /// # Errors
    ///
    /// Configuration or template errors if the configuration is invalid or a
    /// rule's template does not compile.
    pub fn new(
        provider: ProviderHandle,
        config: Auto53Config,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let rules = NamingRule::compile_all(&config.rules)?;

        let mut group_names: Vec<String> = rules.iter().map(|r| r.group().to_string()).collect();
        group_names.sort();
        group_names.dedup();

        let zones: Vec<Zone> = rules
            .iter()
            .map(|r| (r.zone().id.clone(), r.zone().clone()))
            .collect::<BTreeMap<_, _>>()
            .into_values()
            .collect();

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            provider,
            rules,
            group_names,
            zones,
            dry_run: config.engine.dry_run,
            interval: Duration::from_secs(config.engine.interval_secs),
            concurrent_submission: config.engine.concurrent_submission,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Compiled rules, in configuration order
    pub fn rules(&self) -> &[NamingRule] {
        &self.rules
    }

    /// Zones the engine manages, sorted by ID
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Run a single reconciliation pass
    ///
    /// # Returns
    ///
    /// - `Ok(PassReport)`: The pass ran to completion. With concurrent
    ///   submission, per-zone failures are reported in
    ///   [`PassReport::submission`].
    /// - `Err(Error)`: Fetching, synthesis, diffing or planning failed, or
    ///   (sequential submission) a zone's batch was rejected. Zones submitted
    ///   before the failure stay applied.
    pub async fn run_once(&self) -> Result<PassReport> {
        let started_at = Utc::now();
        self.emit_event(EngineEvent::PassStarted { started_at });

        match self.pass(started_at).await {
            Ok(report) => {
                info!(
                    "Pass complete: {} evaluation(s) across {} zone(s){}",
                    report.evaluations.len(),
                    report.batches.len(),
                    if report.dry_run { " (dry run)" } else { "" }
                );
                self.emit_event(EngineEvent::PassCompleted {
                    evaluations: report.evaluations.len(),
                    zones_changed: report.submission.submitted.len(),
                    dry_run: report.dry_run,
                });
                Ok(report)
            }
            Err(e) => {
                self.emit_event(EngineEvent::PassFailed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn pass(&self, started_at: DateTime<Utc>) -> Result<PassReport> {
        let mut groups = self
            .provider
            .inventory
            .auto_scaling_groups(&self.group_names)
            .await?;

        for name in &self.group_names {
            groups.entry(name.clone()).or_insert_with(|| {
                warn!(
                    "Inventory source {} did not return group {}; treating it as empty",
                    self.provider.inventory.source_name(),
                    name
                );
                AutoScalingGroup::new(name.clone(), Vec::new())
            });
        }

        let mut current: Vec<Record> = Vec::new();
        for zone in &self.zones {
            let records = self.provider.records.zone_records(zone).await?;
            debug!("Zone {} holds {} address record(s)", zone.id, records.len());
            current.extend(records);
        }

        let desired = synthesizer::synthesize(Some(&groups), Some(self.rules.as_slice()))?;
        self.emit_event(EngineEvent::RecordsSynthesized {
            desired: desired.len(),
            current: current.len(),
        });

        let mut evaluations = diff(Some(current.as_slice()), Some(desired.as_slice()))?;
        sort_evaluations(&mut evaluations);

        let adds = evaluations
            .iter()
            .filter(|e| e.kind == EvaluationKind::Add)
            .count();
        self.emit_event(EngineEvent::EvaluationsComputed {
            adds,
            removes: evaluations.len() - adds,
        });

        let mut batches: Vec<ZoneChangeBatch> = planner::plan(&evaluations)?.into_values().collect();
        batches.sort_by(|a, b| a.zone.id.cmp(&b.zone.id));

        let submission = if self.dry_run || batches.is_empty() {
            SubmissionReport::default()
        } else {
            self.submit(&batches).await?
        };

        Ok(PassReport {
            started_at,
            groups: groups.into_iter().collect(),
            evaluations,
            batches,
            submission,
            dry_run: self.dry_run,
        })
    }

    async fn submit(&self, batches: &[ZoneChangeBatch]) -> Result<SubmissionReport> {
        let changes: HashMap<&str, usize> = batches
            .iter()
            .map(|b| (b.zone.id.as_str(), b.changes.len()))
            .collect();

        let report = if self.concurrent_submission {
            submit_concurrent(self.provider.sink.clone(), batches.to_vec()).await
        } else {
            match submit_sequential(self.provider.sink.as_ref(), batches).await {
                Ok(submitted) => SubmissionReport {
                    submitted,
                    failed: Vec::new(),
                },
                Err(e) => {
                    if let crate::Error::Submission { zone_id, .. } = &e {
                        // Zones are submitted in ID order, so every zone
                        // before the failed one was accepted
                        let applied: Vec<String> = batches
                            .iter()
                            .map(|b| b.zone.id.clone())
                            .filter(|id| id < zone_id)
                            .collect();
                        self.announce_submitted(&applied, &changes);
                        self.emit_event(EngineEvent::BatchFailed {
                            zone_id: zone_id.clone(),
                            error: e.to_string(),
                        });
                    }
                    return Err(e);
                }
            }
        };

        self.announce_submitted(&report.submitted, &changes);
        for err in &report.failed {
            if let crate::Error::Submission { zone_id, .. } = err {
                self.emit_event(EngineEvent::BatchFailed {
                    zone_id: zone_id.clone(),
                    error: err.to_string(),
                });
            }
        }

        Ok(report)
    }

    fn announce_submitted(&self, zones: &[String], changes: &HashMap<&str, usize>) {
        for zone_id in zones {
            let count = changes.get(zone_id.as_str()).copied().unwrap_or_default();
            info!("Submitted {} change(s) to zone {}", count, zone_id);
            self.emit_event(EngineEvent::BatchSubmitted {
                zone_id: zone_id.clone(),
                changes: count,
            });
        }
    }

    /// Run the engine
    ///
    /// Runs a pass immediately and then once per configured interval until a
    /// shutdown signal is received. A failed pass is logged and the next one
    /// runs on schedule.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Internal run implementation that accepts an optional shutdown signal
    ///
    /// # Parameters
    ///
    /// - `shutdown_rx`: Optional oneshot receiver to trigger shutdown (for testing)
    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(EngineEvent::Started {
            rules_count: self.rules.len(),
            zones_count: self.zones.len(),
        });
        info!(
            "Reconciling {} rule(s) across {} zone(s) every {}s",
            self.rules.len(),
            self.zones.len(),
            self.interval.as_secs()
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(interval);

        let shutdown = async {
            match shutdown_rx {
                // Test mode: wait for provided shutdown signal
                Some(rx) => {
                    let _ = rx.await;
                }
                // Production mode: wait for SIGINT
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for shutdown signal: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                Some(_) = ticks.next() => {
                    if let Err(e) = self.run_once().await {
                        error!("Reconciliation pass failed: {}", e);
                        // Continue running despite errors
                    }
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    self.emit_event(EngineEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    break;
                }
            }
        }

        info!("Engine stopped");
        Ok(())
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }

    /// Run the periodic loop with a controlled shutdown signal
    ///
    /// With `None` this behaves like [`Auto53Engine::run()`]. Tests and
    /// embedders pass a oneshot receiver instead of relying on SIGINT.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }
}
