//! Current/desired reconciliation
//!
//! Compares the records a zone holds with the records it should hold and
//! produces the evaluations that converge one into the other. Records are
//! compared by [`fingerprint`], so a record whose address set changed is a
//! different record: it is always a `Remove` of the old identity plus an
//! `Add` of the new one, never an in-place update.

use crate::error::{Error, Result};
use crate::fingerprint::fingerprint;
use crate::model::{Evaluation, Record};
use std::collections::HashMap;
use tracing::debug;

/// Compute the evaluations converging `current` into `desired`
///
/// Records present on both sides produce nothing, so diffing a collection
/// with itself yields no evaluations. Duplicate records on either side
/// collapse into one. The order of the returned evaluations is unspecified;
/// use [`sort_evaluations`] when a stable order is needed.
///
/// # Errors
///
/// [`Error::Input`] if either collection is absent. Empty collections are
/// valid.
pub fn diff(current: Option<&[Record]>, desired: Option<&[Record]>) -> Result<Vec<Evaluation>> {
    let (Some(current), Some(desired)) = (current, desired) else {
        return Err(Error::input("current and desired must be non-nil"));
    };

    let current_map = index(current);
    let desired_map = index(desired);

    let mut evals = Vec::new();

    for (hash, record) in &current_map {
        if !desired_map.contains_key(hash) {
            evals.push(Evaluation::remove((*record).clone()));
        }
    }

    for (hash, record) in &desired_map {
        if !current_map.contains_key(hash) {
            evals.push(Evaluation::add((*record).clone()));
        }
    }

    debug!(
        "Diffed {} current against {} desired record(s): {} evaluation(s)",
        current.len(),
        desired.len(),
        evals.len()
    );

    Ok(evals)
}

/// Sort evaluations by zone ID, record name, then kind (removals first)
pub fn sort_evaluations(evals: &mut [Evaluation]) {
    evals.sort_by(|a, b| {
        a.record
            .zone
            .id
            .cmp(&b.record.zone.id)
            .then_with(|| a.record.name.cmp(&b.record.name))
            .then_with(|| a.kind.rank().cmp(&b.kind.rank()))
    });
}

fn index(records: &[Record]) -> HashMap<u64, &Record> {
    records.iter().map(|r| (fingerprint(r), r)).collect()
}
