//! Contract Test: Convergence
//!
//! Constraints verified:
//! - A pass makes the zone match the synthesized records
//! - A second pass over unchanged inventory changes nothing
//! - Scaling out, scaling in and address changes converge in one pass
//! - An address change is a delete of the old set plus a create of the new one

mod common;

use auto53_core::config::RuleConfig;
use auto53_core::model::{ChangeAction, EvaluationKind, Instance};
use auto53_core::{Auto53Engine, ProviderHandle};
use common::*;

#[tokio::test]
async fn second_pass_is_a_no_op() {
    let world = world(vec![group(
        "asg1",
        vec![instance("i-1", "10.0.0.1"), instance("i-2", "10.0.0.2")],
    )]);
    let config = minimal_config(vec![RuleConfig::new("asg1", zone_a(), "{{ .Id }}-asg1")]);
    let (engine, _events) =
        Auto53Engine::new(ProviderHandle::from_shared(world.clone()), config).unwrap();

    let first = engine.run_once().await.unwrap();
    assert_eq!(first.evaluations.len(), 2);
    assert!(
        first
            .evaluations
            .iter()
            .all(|e| e.kind == EvaluationKind::Add)
    );

    let names: Vec<String> = world
        .records(&zone_a())
        .await
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["i-1-asg1", "i-2-asg1"]);

    let second = engine.run_once().await.unwrap();
    assert!(second.is_converged(), "unchanged inventory must not produce changes");
    assert_eq!(world.applied_batches().await.len(), 1);
}

#[tokio::test]
async fn scale_out_and_in_converge() {
    let world = world(vec![group("web", vec![instance("i-1", "10.0.0.1")])]);
    let config = minimal_config(vec![RuleConfig::new("web", zone_a(), "web")]);
    let (engine, _events) =
        Auto53Engine::new(ProviderHandle::from_shared(world.clone()), config).unwrap();

    engine.run_once().await.unwrap();

    // Scale out: the shared record is replaced with the larger set
    world
        .set_group(group(
            "web",
            vec![instance("i-1", "10.0.0.1"), instance("i-2", "10.0.0.2")],
        ))
        .await;
    let pass = engine.run_once().await.unwrap();
    let kinds: Vec<EvaluationKind> = pass.evaluations.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EvaluationKind::Remove, EvaluationKind::Add]);

    let actions: Vec<ChangeAction> = pass.batches[0].changes.iter().map(|c| c.action).collect();
    assert_eq!(actions, vec![ChangeAction::Delete, ChangeAction::Create]);

    let records = world.records(&zone_a()).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].ip_set().len(), 2);

    // Scale to zero: the record disappears
    world.set_group(group("web", Vec::new())).await;
    let pass = engine.run_once().await.unwrap();
    assert_eq!(pass.evaluations.len(), 1);
    assert_eq!(pass.evaluations[0].kind, EvaluationKind::Remove);
    assert!(world.records(&zone_a()).await.is_empty());
}

#[tokio::test]
async fn instance_without_selected_address_is_skipped() {
    let world = world(vec![group(
        "web",
        vec![
            instance("i-1", "10.0.0.1").with_public_ip("203.0.113.1"),
            Instance::new("i-2").with_private_ip("10.0.0.2").with_running(false),
        ],
    )]);
    let config = minimal_config(vec![
        RuleConfig::new("web", zone_a(), "{{ .Id }}").with_public(true),
    ]);
    let (engine, _events) =
        Auto53Engine::new(ProviderHandle::from_shared(world.clone()), config).unwrap();

    engine.run_once().await.unwrap();

    let records = world.records(&zone_a()).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "i-1");
    assert_eq!(records[0].ips, vec!["203.0.113.1"]);
}

#[tokio::test]
async fn rules_fan_out_across_zones() {
    let world = world(vec![
        group("asg1", vec![instance("i-1", "10.0.0.1")]),
        group("asg2", vec![instance("i-2", "10.0.1.1")]),
    ]);
    let config = minimal_config(vec![
        RuleConfig::new("asg1", zone_a(), "{{ .Id }}"),
        RuleConfig::new("asg1", zone_a(), "asg1"),
        RuleConfig::new("asg2", zone_b(), "{{ .Id }}"),
    ]);
    let (engine, _events) =
        Auto53Engine::new(ProviderHandle::from_shared(world.clone()), config).unwrap();

    let pass = engine.run_once().await.unwrap();
    assert_eq!(pass.batches.len(), 2);
    assert_eq!(pass.batches[0].zone.id, "Z1");
    assert_eq!(pass.batches[0].changes.len(), 2);
    assert_eq!(pass.batches[1].zone.id, "Z2");
    assert_eq!(pass.batches[1].changes[0].name, "i-2.apex2.example.");

    assert_eq!(world.records(&zone_a()).await.len(), 2);
    assert_eq!(world.records(&zone_b()).await.len(), 1);
}

#[tokio::test]
async fn unmanaged_records_in_a_zone_are_removed() {
    let world = world(vec![group("web", vec![instance("i-1", "10.0.0.1")])]);
    world
        .put_record(auto53_core::Record::new(
            zone_a(),
            "stale",
            vec!["10.9.9.9".to_string()],
        ))
        .await;

    let config = minimal_config(vec![RuleConfig::new("web", zone_a(), "web")]);
    let (engine, _events) =
        Auto53Engine::new(ProviderHandle::from_shared(world.clone()), config).unwrap();

    let pass = engine.run_once().await.unwrap();
    assert_eq!(pass.evaluations.len(), 2);

    let names: Vec<String> = world
        .records(&zone_a())
        .await
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["web"]);
}
