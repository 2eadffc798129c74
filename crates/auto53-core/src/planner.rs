//! Per-zone batch planning
//!
//! Groups evaluations by zone and translates each one into a
//! provider-agnostic change directive. Each zone gets exactly one batch per
//! pass; batches for different zones are independent and unordered.

use crate::error::{Error, Result};
use crate::model::{ChangeAction, ChangeDirective, Evaluation, EvaluationKind, ZoneChangeBatch};
use std::collections::HashMap;
use tracing::debug;

/// TTL applied to every address record
pub const RECORD_TTL: u32 = 300;

/// Record type of every directive
pub const ADDRESS_RECORD_TYPE: &str = "A";

/// Comment attached to every batch
pub const BATCH_COMMENT: &str = "auto53: converge address records with auto-scaling group membership";

/// Build one change batch per zone, keyed by zone ID
///
/// Directives within a batch follow the order of `evals`.
///
/// # Errors
///
/// [`Error::UnknownEvaluationKind`] if an evaluation is neither an add nor a
/// remove.
pub fn plan(evals: &[Evaluation]) -> Result<HashMap<String, ZoneChangeBatch>> {
    let mut batches: HashMap<String, ZoneChangeBatch> = HashMap::new();

    for eval in evals {
        let action = match eval.kind {
            EvaluationKind::Add => ChangeAction::Create,
            EvaluationKind::Remove => ChangeAction::Delete,
            EvaluationKind::Unknown => {
                return Err(Error::UnknownEvaluationKind {
                    zone_id: eval.record.zone.id.clone(),
                    record: eval.record.name.clone(),
                });
            }
        };

        let zone = &eval.record.zone;
        let batch = batches
            .entry(zone.id.clone())
            .or_insert_with(|| ZoneChangeBatch {
                zone: zone.clone(),
                comment: BATCH_COMMENT.to_string(),
                changes: Vec::new(),
            });

        batch.changes.push(ChangeDirective {
            action,
            name: eval.record.fqdn(),
            record_type: ADDRESS_RECORD_TYPE.to_string(),
            values: eval.record.ips.clone(),
            ttl: RECORD_TTL,
        });
    }

    debug!(
        "Planned {} evaluation(s) into {} zone batch(es)",
        evals.len(),
        batches.len()
    );

    Ok(batches)
}
