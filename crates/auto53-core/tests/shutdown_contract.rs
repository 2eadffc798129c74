//! Contract Test: Periodic Loop and Shutdown
//!
//! Constraints verified:
//! - The loop runs a pass immediately on start
//! - The engine terminates promptly on the shutdown signal
//! - A failing pass does not stop the loop
//! - Started/Stopped events bracket the loop

mod common;

use auto53_core::config::RuleConfig;
use auto53_core::traits::ProviderHandle;
use auto53_core::{Auto53Engine, EngineEvent};
use common::*;
use std::sync::Arc;
use tokio::time::{Duration, sleep, timeout};

#[tokio::test]
async fn shutdown_signal_terminates_engine() {
    let world = world(vec![group("web", vec![instance("i-1", "10.0.0.1")])]);
    let inventory = Arc::new(CountingInventory::new(world.clone()));
    let handle = ProviderHandle {
        inventory: inventory.clone(),
        records: world.clone(),
        sink: world.clone(),
    };
    let config = minimal_config(vec![RuleConfig::new("web", zone_a(), "web")]);
    let (engine, mut events) = Auto53Engine::new(handle, config).unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let engine_handle =
        tokio::spawn(async move { engine.run_with_shutdown(Some(shutdown_rx)).await });

    // Wait for the first pass
    sleep(Duration::from_millis(100)).await;
    assert_eq!(inventory.call_count(), 1, "first pass runs immediately");
    assert_eq!(world.records(&zone_a()).await.len(), 1);

    assert!(shutdown_tx.send(()).is_ok(), "shutdown signal send succeeds");

    let result = timeout(Duration::from_secs(5), engine_handle).await;
    assert!(result.is_ok(), "Engine should terminate within 5 seconds");
    let engine_result = result.unwrap().unwrap();
    assert!(
        engine_result.is_ok(),
        "Engine should shut down successfully: {:?}",
        engine_result
    );

    // Interval is two minutes: no second pass happened
    assert_eq!(inventory.call_count(), 1);

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    assert!(matches!(received.first(), Some(EngineEvent::Started { rules_count: 1, zones_count: 1 })));
    assert!(matches!(received.last(), Some(EngineEvent::Stopped { .. })));
}

#[tokio::test]
async fn failing_pass_keeps_the_loop_alive() {
    let world = world(vec![group("web", vec![instance("i-1", "10.0.0.1")])]);
    let handle = ProviderHandle {
        inventory: world.clone(),
        records: Arc::new(UnreachableRecords),
        sink: world.clone(),
    };
    let config = minimal_config(vec![RuleConfig::new("web", zone_a(), "web")]);
    let (engine, mut events) = Auto53Engine::new(handle, config).unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let engine_handle =
        tokio::spawn(async move { engine.run_with_shutdown(Some(shutdown_rx)).await });

    sleep(Duration::from_millis(100)).await;
    assert!(!engine_handle.is_finished(), "a failed pass must not stop the engine");

    shutdown_tx.send(()).unwrap();
    let result = timeout(Duration::from_secs(5), engine_handle)
        .await
        .expect("engine stops after shutdown")
        .unwrap();
    assert!(result.is_ok());

    let mut saw_failure = false;
    while let Ok(event) = events.try_recv() {
        if let EngineEvent::PassFailed { error } = event {
            assert!(error.contains("unreachable"));
            saw_failure = true;
        }
    }
    assert!(saw_failure);
}
