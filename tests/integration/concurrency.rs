//! Concurrency tests for the shared registry
//!
//! These tests verify thread-safety of concurrent operation:
//! - Many writers appending while readers copy histories
//! - Allow-list churn racing with appends
//! - Liveness evaluation during ingestion

use std::sync::Arc;

use futures::future::join_all;

use pulse_monitoring::{
    RawSample,
    monitors::LivenessEvaluator,
    storage::{DEFAULT_RETENTION_CAP, MetricsRegistry},
};

fn sample(timestamp: i64) -> RawSample {
    RawSample {
        timestamp,
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_and_reads() {
    let registry = Arc::new(MetricsRegistry::new());
    let agents: Vec<String> = (0..8).map(|i| format!("agent-{i}")).collect();
    for agent in &agents {
        registry.add_allowed(agent);
    }

    let mut tasks = vec![];
    for agent in agents.clone() {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            for ts in 0..500 {
                registry.append(&agent, sample(ts));
                if ts % 50 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        }));
    }

    for _ in 0..4 {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..200 {
                for history in registry.query_all().values() {
                    assert!(history.len() <= DEFAULT_RETENTION_CAP);
                    // arrival order is preserved even in partial snapshots
                    assert!(history.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
                }
                tokio::task::yield_now().await;
            }
        }));
    }

    for result in join_all(tasks).await {
        result.unwrap();
    }

    for agent in &agents {
        let history = registry.query(agent);
        assert_eq!(history.len(), DEFAULT_RETENTION_CAP);
        assert_eq!(history.first().unwrap().timestamp, 400);
        assert_eq!(history.last().unwrap().timestamp, 499);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_allow_list_churn_never_leaves_orphans() {
    let registry = Arc::new(MetricsRegistry::new());

    let writer = {
        let registry = registry.clone();
        tokio::spawn(async move {
            for ts in 0..2000 {
                registry.append("flaky", sample(ts));
                if ts % 100 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        })
    };

    let churn = {
        let registry = registry.clone();
        tokio::spawn(async move {
            for _ in 0..200 {
                registry.add_allowed("flaky");
                tokio::task::yield_now().await;
                registry.remove_allowed("flaky");
            }
        })
    };

    writer.await.unwrap();
    churn.await.unwrap();

    // the churn task ends with a removal
    assert!(!registry.is_allowed("flaky"));
    assert!(registry.query_all().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_liveness_during_ingestion() {
    let registry = Arc::new(MetricsRegistry::new());
    registry.add_allowed("agentA");
    registry.add_allowed("agentB");
    let evaluator = LivenessEvaluator::new(registry.clone(), 90);

    let writer = {
        let registry = registry.clone();
        tokio::spawn(async move {
            for ts in 1..=1000 {
                registry.append("agentA", sample(ts));
            }
        })
    };

    for _ in 0..100 {
        let records = evaluator.compute_at(1000);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].identity, "agentA");
        assert!(!records[1].liveness.is_alive());
        tokio::task::yield_now().await;
    }

    writer.await.unwrap();

    let records = evaluator.compute_at(1000);
    assert!(records[0].liveness.is_alive());
}
