//! Agent collector pushing into a real hub
//!
//! These tests verify that:
//! - Samples produced by a collector arrive under the agent's name
//! - A collector that is not admitted keeps running and counts failures
//! - An unreachable hub does not stop the loop

use std::time::Duration;

use async_trait::async_trait;
use pulse_monitoring::{
    RawSample,
    actors::collector::CollectorHandle,
    config::{AgentConfig, IdentityMode},
    monitors::{SampleError, SampleSource},
};
use tokio::sync::watch;

use crate::helpers::*;

/// Source yielding samples with consecutive timestamps
struct CountingSource {
    next: i64,
}

#[async_trait]
impl SampleSource for CountingSource {
    async fn sample(&mut self) -> Result<RawSample, SampleError> {
        self.next += 1;
        Ok(sample_at(self.next))
    }
}

fn agent_config(name: &str, hub_url: String) -> AgentConfig {
    let mut config = AgentConfig::new(name, hub_url);
    // ticks are driven by push_now
    config.interval = Duration::from_secs(3600);
    config.timeout = Duration::from_secs(2);
    config
}

#[tokio::test]
async fn test_collector_pushes_into_hub() {
    let hub = spawn_test_hub(IdentityMode::Name).await;
    hub.registry.add_allowed("agentA");

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let collector = CollectorHandle::spawn(
        agent_config("agentA", hub.base_url()),
        CountingSource { next: 0 },
        shutdown_rx,
    )
    .unwrap();

    for _ in 0..3 {
        collector.push_now().await.unwrap();
    }

    let timestamps: Vec<i64> = hub
        .registry
        .query("agentA")
        .iter()
        .map(|s| s.timestamp)
        .collect();
    assert_eq!(timestamps, vec![1, 2, 3]);

    let stats = collector.get_stats().await.unwrap();
    assert_eq!(stats.pushed, 3);
    assert_eq!(stats.transmit_failures, 0);
}

#[tokio::test]
async fn test_denied_collector_keeps_running() {
    let hub = spawn_test_hub(IdentityMode::Name).await;

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let collector = CollectorHandle::spawn(
        agent_config("agentX", hub.base_url()),
        CountingSource { next: 0 },
        shutdown_rx,
    )
    .unwrap();

    assert!(collector.push_now().await.is_err());
    assert!(collector.push_now().await.is_err());

    let stats = collector.get_stats().await.unwrap();
    assert_eq!(stats.ticks, 2);
    assert_eq!(stats.transmit_failures, 2);
    assert!(hub.registry.query_all().is_empty());

    // admitted later: the next tick goes through
    hub.registry.add_allowed("agentX");
    collector.push_now().await.unwrap();
    assert_eq!(hub.registry.query("agentX").len(), 1);
}

#[tokio::test]
async fn test_collector_survives_stopped_hub() {
    let hub = spawn_test_hub(IdentityMode::Name).await;
    hub.registry.add_allowed("agentA");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let collector = CollectorHandle::spawn(
        agent_config("agentA", hub.base_url()),
        CountingSource { next: 0 },
        shutdown_rx,
    )
    .unwrap();

    collector.push_now().await.unwrap();

    hub.shutdown_tx.send(true).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(collector.push_now().await.is_err());
    assert!(collector.get_stats().await.is_some());

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), collector.closed())
        .await
        .expect("collector did not stop");
}

#[tokio::test]
async fn test_timer_driven_pushes() {
    let hub = spawn_test_hub(IdentityMode::Name).await;
    hub.registry.add_allowed("agentA");

    let mut config = agent_config("agentA", hub.base_url());
    config.interval = Duration::from_millis(50);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let collector =
        CollectorHandle::spawn(config, CountingSource { next: 0 }, shutdown_rx).unwrap();

    tokio::time::sleep(Duration::from_millis(400)).await;
    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), collector.closed())
        .await
        .expect("collector did not stop");

    assert!(hub.registry.query("agentA").len() >= 2);
}
