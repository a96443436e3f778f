//! Integration tests for the administrative endpoints
//!
//! These tests verify that:
//! - Authentication rejects missing (401) and wrong (403) tokens
//! - Allow-list changes are visible immediately and purge on removal
//! - Metric and liveness queries reflect the registry

use pretty_assertions::assert_eq;
use pulse_monitoring::config::IdentityMode;
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::helpers::*;

#[tokio::test]
async fn test_health_endpoint_needs_no_auth() {
    let hub = spawn_test_hub(IdentityMode::Name).await;

    let response = reqwest::get(hub.url("/api/v1/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let hub = spawn_test_hub(IdentityMode::Name).await;

    let response = reqwest::get(hub.url("/api/v1/allowed")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_token_is_forbidden() {
    let hub = spawn_test_hub(IdentityMode::Name).await;
    let client = reqwest::Client::new();

    for token in ["wrong-token", "Bearer test-token", "TEST-TOKEN"] {
        let response = client
            .get(hub.url("/api/v1/alive"))
            .header("Authorization", token)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN, "token {token:?}");
    }
}

#[tokio::test]
async fn test_admission_without_token_is_rejected() {
    let hub = spawn_test_hub(IdentityMode::Name).await;
    let client = reqwest::Client::new();

    let response = client
        .post(hub.url("/api/v1/allowed"))
        .json(&json!({"identity": "intruder"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .delete(hub.url("/api/v1/allowed/agentA"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert!(hub.registry.list_allowed().is_empty());
}

#[tokio::test]
async fn test_empty_configured_token_matches_nothing() {
    let hub = spawn_hub_with_token(IdentityMode::Name, "").await;
    let client = reqwest::Client::new();

    let response = client
        .post(hub.url("/api/v1/allowed"))
        .header("Authorization", "")
        .json(&json!({"identity": "intruder"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(hub.registry.list_allowed().is_empty());
}

#[tokio::test]
async fn test_push_route_is_not_behind_auth() {
    let hub = spawn_test_hub(IdentityMode::Name).await;
    hub.registry.add_allowed("agentA");
    let client = reqwest::Client::new();

    let ack = push(&client, &hub, &push_body("agentA", now())).await;

    assert_eq!(ack["success"], true);
}

#[tokio::test]
async fn test_allow_list_management() {
    let hub = spawn_test_hub(IdentityMode::Name).await;
    let client = reqwest::Client::new();

    for identity in ["agentB", "agentA", "agentB"] {
        let response = client
            .post(hub.url("/api/v1/allowed"))
            .header("Authorization", TEST_TOKEN)
            .json(&json!({ "identity": identity }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let json: Value = client
        .get(hub.url("/api/v1/allowed"))
        .header("Authorization", TEST_TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(json["identities"], json!(["agentB", "agentA"]));
    assert_eq!(json["count"], 2);
}

#[tokio::test]
async fn test_adding_empty_identity_is_rejected() {
    let hub = spawn_test_hub(IdentityMode::Name).await;
    let client = reqwest::Client::new();

    let response = client
        .post(hub.url("/api/v1/allowed"))
        .header("Authorization", TEST_TOKEN)
        .json(&json!({ "identity": "  " }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(hub.registry.list_allowed().is_empty());
}

#[tokio::test]
async fn test_remove_allowed_purges_history() {
    let hub = spawn_test_hub(IdentityMode::Name).await;
    hub.registry.add_allowed("agentA");
    hub.registry.append("agentA", sample_at(now()));
    let client = reqwest::Client::new();

    let json: Value = client
        .delete(hub.url("/api/v1/allowed/agentA"))
        .header("Authorization", TEST_TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(json, json!({ "identity": "agentA", "changed": true }));
    assert!(!hub.registry.is_allowed("agentA"));
    assert!(hub.registry.query_all().is_empty());

    let response = client
        .get(hub.url("/api/v1/metrics/agentA"))
        .header("Authorization", TEST_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_identity_metrics_in_arrival_order() {
    let hub = spawn_test_hub(IdentityMode::Name).await;
    hub.registry.add_allowed("agentA");
    hub.registry.add_allowed("agentB");
    for ts in [30, 10, 20] {
        hub.registry.append("agentA", sample_at(ts));
    }
    let client = reqwest::Client::new();

    let json: Value = client
        .get(hub.url("/api/v1/metrics/agentA"))
        .header("Authorization", TEST_TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let timestamps: Vec<i64> = json["samples"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["timestamp"].as_i64().unwrap())
        .collect();
    assert_eq!(timestamps, vec![30, 10, 20]);

    // admitted but silent: empty, not 404
    let json: Value = client
        .get(hub.url("/api/v1/metrics/agentB"))
        .header("Authorization", TEST_TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["samples"], json!([]));
}

#[tokio::test]
async fn test_all_metrics_lists_identities_with_history() {
    let hub = spawn_test_hub(IdentityMode::Name).await;
    hub.registry.add_allowed("agentA");
    hub.registry.add_allowed("agentB");
    hub.registry.append("agentA", sample_at(1));
    let client = reqwest::Client::new();

    let json: Value = client
        .get(hub.url("/api/v1/metrics"))
        .header("Authorization", TEST_TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let metrics = json["metrics"].as_object().unwrap();
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics["agentA"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_alive_reports_every_admitted_identity() {
    let hub = spawn_test_hub(IdentityMode::Name).await;
    let now = now();
    hub.registry.add_allowed("fresh");
    hub.registry.add_allowed("stale");
    hub.registry.add_allowed("silent");
    hub.registry.append("fresh", sample_at(now - 5));
    hub.registry.append("stale", sample_at(now - 600));
    let client = reqwest::Client::new();

    let json: Value = client
        .get(hub.url("/api/v1/alive"))
        .header("Authorization", TEST_TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(json["threshold_secs"], 90);

    let agents = json["agents"].as_array().unwrap();
    assert_eq!(agents.len(), 3);

    assert_eq!(agents[0]["identity"], "fresh");
    assert_eq!(agents[0]["alive"], true);

    assert_eq!(agents[1]["identity"], "stale");
    assert_eq!(agents[1]["alive"], false);
    assert_eq!(agents[1]["last_sample"]["timestamp"], now - 600);

    assert_eq!(agents[2]["identity"], "silent");
    assert_eq!(agents[2]["alive"], false);
    assert!(agents[2].get("last_sample").is_none());
}

#[tokio::test]
async fn test_server_stops_on_shutdown_signal() {
    let hub = spawn_test_hub(IdentityMode::Name).await;
    let url = hub.url("/api/v1/health");

    hub.shutdown_tx.send(true).unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    assert!(reqwest::get(url).await.is_err());
}
