//! Batch submission
//!
//! Two strategies over the same input (one batch per zone):
//!
//! - [`submit_sequential`]: zones in ID order, stop at the first failure
//! - [`submit_concurrent`]: one task per zone, every zone runs to completion
//!
//! Neither retries and neither rolls back batches that were accepted before
//! a failure.

use crate::error::{Error, Result};
use crate::model::ZoneChangeBatch;
use crate::traits::ChangeSink;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error};

/// Per-zone outcome of submitting one pass's batches
#[derive(Debug, Default)]
pub struct SubmissionReport {
    /// Zones whose batch was accepted
    pub submitted: Vec<String>,

    /// Failed zones, each as [`Error::Submission`]
    pub failed: Vec<Error>,
}

impl SubmissionReport {
    /// Whether every batch was accepted
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// IDs of the zones whose submission failed
    pub fn failed_zones(&self) -> Vec<&str> {
        self.failed
            .iter()
            .filter_map(|e| match e {
                Error::Submission { zone_id, .. } => Some(zone_id.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Tag a sink failure with the zone it was submitted to
fn wrap(zone_id: &str, err: Error) -> Error {
    match err {
        Error::Submission { .. } => err,
        other => Error::submission(zone_id, other.to_string()),
    }
}

/// Submit batches one zone at a time, in zone ID order
///
/// # Returns
///
/// - `Ok(Vec<String>)`: IDs of the zones submitted, all accepted
/// - `Err(Error::Submission)`: the first zone that failed; later zones were
///   not submitted, earlier ones stay applied
pub async fn submit_sequential(
    sink: &dyn ChangeSink,
    batches: &[ZoneChangeBatch],
) -> Result<Vec<String>> {
    let mut ordered: Vec<&ZoneChangeBatch> = batches.iter().collect();
    ordered.sort_by(|a, b| a.zone.id.cmp(&b.zone.id));

    let mut submitted = Vec::with_capacity(ordered.len());
    for batch in ordered {
        debug!(
            "Submitting {} change(s) to zone {} via {}",
            batch.changes.len(),
            batch.zone.id,
            sink.sink_name()
        );

        if let Err(e) = sink.submit(batch).await {
            let err = wrap(&batch.zone.id, e);
            error!("{}", err);
            return Err(err);
        }
        submitted.push(batch.zone.id.clone());
    }

    Ok(submitted)
}

/// Submit every zone's batch concurrently
///
/// Each zone gets its own task; a failing zone does not cancel the others.
/// A task that panics is reported as a submission failure of its zone.
/// Zone lists in the report are sorted by zone ID.
pub async fn submit_concurrent(
    sink: Arc<dyn ChangeSink>,
    batches: Vec<ZoneChangeBatch>,
) -> SubmissionReport {
    let mut tasks = JoinSet::new();
    let mut zones = HashMap::new();
    for batch in batches {
        let sink = Arc::clone(&sink);
        let zone_id = batch.zone.id.clone();
        let handle = tasks.spawn(async move { sink.submit(&batch).await });
        zones.insert(handle.id(), zone_id);
    }

    let mut report = SubmissionReport::default();
    while let Some(joined) = tasks.join_next_with_id().await {
        let (task_id, result) = match joined {
            Ok((id, result)) => (id, result),
            Err(e) => {
                let message = format!("submission task failed: {}", e);
                (e.id(), Err(Error::Other(message)))
            }
        };
        let Some(zone_id) = zones.remove(&task_id) else {
            continue;
        };

        match result {
            Ok(()) => report.submitted.push(zone_id),
            Err(e) => {
                let err = wrap(&zone_id, e);
                error!("{}", err);
                report.failed.push(err);
            }
        }
    }

    report.submitted.sort();
    report.failed.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Zone;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Sink that rejects a fixed set of zones and records the rest
    #[derive(Default)]
    struct RecordingSink {
        reject: HashSet<String>,
        panic_on: HashSet<String>,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChangeSink for RecordingSink {
        async fn submit(&self, batch: &ZoneChangeBatch) -> Result<()> {
            self.seen.lock().unwrap().push(batch.zone.id.clone());
            if self.panic_on.contains(&batch.zone.id) {
                panic!("sink crashed on {}", batch.zone.id);
            }
            if self.reject.contains(&batch.zone.id) {
                return Err(Error::Other("throttled".to_string()));
            }
            Ok(())
        }

        fn sink_name(&self) -> &'static str {
            "recording"
        }
    }

    fn batch(zone_id: &str) -> ZoneChangeBatch {
        ZoneChangeBatch {
            zone: Zone::new(zone_id, format!("{}.example.", zone_id)),
            comment: "test".to_string(),
            changes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_sequential_runs_in_zone_order() {
        let sink = RecordingSink::default();
        let submitted = submit_sequential(&sink, &[batch("Z3"), batch("Z1"), batch("Z2")])
            .await
            .unwrap();

        assert_eq!(submitted, vec!["Z1", "Z2", "Z3"]);
        assert_eq!(*sink.seen.lock().unwrap(), vec!["Z1", "Z2", "Z3"]);
    }

    #[tokio::test]
    async fn test_sequential_aborts_on_first_failure() {
        let sink = RecordingSink {
            reject: HashSet::from(["Z2".to_string()]),
            ..Default::default()
        };

        let err = submit_sequential(&sink, &[batch("Z1"), batch("Z2"), batch("Z3")])
            .await
            .unwrap_err();

        match err {
            Error::Submission { zone_id, message } => {
                assert_eq!(zone_id, "Z2");
                assert_eq!(message, "throttled");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*sink.seen.lock().unwrap(), vec!["Z1", "Z2"]);
    }

    #[tokio::test]
    async fn test_concurrent_reports_per_zone() {
        let sink = Arc::new(RecordingSink {
            reject: HashSet::from(["Z2".to_string()]),
            ..Default::default()
        });

        let report =
            submit_concurrent(sink.clone(), vec![batch("Z1"), batch("Z2"), batch("Z3")]).await;

        assert_eq!(report.submitted, vec!["Z1", "Z3"]);
        assert_eq!(report.failed_zones(), vec!["Z2"]);
        assert!(!report.is_success());
        assert_eq!(sink.seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_reports_panicked_zone() {
        let sink = Arc::new(RecordingSink {
            panic_on: HashSet::from(["Z2".to_string()]),
            ..Default::default()
        });

        let report = submit_concurrent(sink, vec![batch("Z1"), batch("Z2")]).await;

        assert_eq!(report.submitted, vec!["Z1"]);
        assert_eq!(report.failed_zones(), vec!["Z2"]);
        match &report.failed[0] {
            Error::Submission { message, .. } => assert!(message.contains("panicked")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
