//! Contract Test: Diff Properties
//!
//! Constraints verified:
//! - diff(A, A) is empty for any A
//! - diff(A, B) and diff(B, A) are complementary
//! - IP order and duplicate IPs never produce changes
//! - Absent inputs are rejected, empty inputs are not
//! - Batches group evaluations by zone with the right actions

use auto53_core::model::{ChangeAction, Evaluation, EvaluationKind, Record, Zone};
use auto53_core::{Error, diff, fingerprint, planner, sort_evaluations};

fn record(zone: &Zone, name: &str, ips: &[&str]) -> Record {
    Record::new(
        zone.clone(),
        name,
        ips.iter().map(|ip| ip.to_string()).collect(),
    )
}

fn zones() -> (Zone, Zone) {
    (Zone::new("Z1", "apex1"), Zone::new("Z2", "apex2"))
}

fn sample_a() -> Vec<Record> {
    let (z1, z2) = zones();
    vec![
        record(&z1, "www", &["10.0.0.1", "10.0.0.2"]),
        record(&z1, "api", &["10.0.0.3"]),
        record(&z2, "www", &["10.0.1.1"]),
    ]
}

fn sample_b() -> Vec<Record> {
    let (z1, z2) = zones();
    vec![
        record(&z1, "www", &["10.0.0.2", "10.0.0.1"]),
        record(&z1, "api", &["10.0.0.4"]),
        record(&z2, "db", &["10.0.1.2"]),
    ]
}

#[test]
fn diff_of_identical_sets_is_empty() {
    for sample in [sample_a(), sample_b(), Vec::new()] {
        let evals = diff(Some(sample.as_slice()), Some(sample.as_slice())).unwrap();
        assert!(evals.is_empty());
    }
}

#[test]
fn diff_is_complementary() {
    let a = sample_a();
    let b = sample_b();

    let forward = diff(Some(a.as_slice()), Some(b.as_slice())).unwrap();
    let backward = diff(Some(b.as_slice()), Some(a.as_slice())).unwrap();

    let fingerprints = |evals: &[Evaluation], kind: EvaluationKind| {
        let mut prints: Vec<u64> = evals
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| fingerprint(&e.record))
            .collect();
        prints.sort();
        prints
    };

    assert_eq!(
        fingerprints(&forward, EvaluationKind::Add),
        fingerprints(&backward, EvaluationKind::Remove)
    );
    assert_eq!(
        fingerprints(&forward, EvaluationKind::Remove),
        fingerprints(&backward, EvaluationKind::Add)
    );
    assert_eq!(forward.len(), backward.len());
    // www in Z1 differs only by IP order, so it is not part of either diff
    assert_eq!(forward.len(), 4);
}

#[test]
fn ip_order_and_duplicates_are_ignored() {
    let (z1, _) = zones();
    let current = vec![record(&z1, "www", &["10.0.0.1", "10.0.0.2"])];
    let desired = vec![record(&z1, "www", &["10.0.0.2", "10.0.0.1", "10.0.0.2"])];

    let evals = diff(Some(current.as_slice()), Some(desired.as_slice())).unwrap();
    assert!(evals.is_empty());
}

#[test]
fn absent_inputs_are_rejected() {
    let empty: Vec<Record> = Vec::new();

    assert!(matches!(diff(None, Some(empty.as_slice())), Err(Error::Input(_))));
    assert!(matches!(diff(Some(empty.as_slice()), None), Err(Error::Input(_))));
    assert!(diff(Some(empty.as_slice()), Some(empty.as_slice())).unwrap().is_empty());
}

#[test]
fn batches_group_by_zone() {
    let a = sample_a();
    let b = sample_b();

    let mut evals = diff(Some(a.as_slice()), Some(b.as_slice())).unwrap();
    sort_evaluations(&mut evals);
    let batches = planner::plan(&evals).unwrap();

    assert_eq!(batches.len(), 2);

    let z1 = &batches["Z1"];
    let z1_actions: Vec<(ChangeAction, &str)> = z1
        .changes
        .iter()
        .map(|c| (c.action, c.name.as_str()))
        .collect();
    assert_eq!(
        z1_actions,
        vec![
            (ChangeAction::Delete, "api.apex1."),
            (ChangeAction::Create, "api.apex1."),
        ]
    );

    let z2 = &batches["Z2"];
    let z2_actions: Vec<(ChangeAction, &str)> = z2
        .changes
        .iter()
        .map(|c| (c.action, c.name.as_str()))
        .collect();
    assert_eq!(
        z2_actions,
        vec![
            (ChangeAction::Create, "db.apex2."),
            (ChangeAction::Delete, "www.apex2."),
        ]
    );

    for batch in batches.values() {
        assert!(batch.changes.iter().all(|c| c.record_type == "A" && c.ttl == 300));
    }
}
