//! Request and response bodies of the administrative API

use std::collections::HashMap;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::{RawSample, monitors::LivenessRecord};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Body of `POST /api/v1/allowed`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowedRequest {
    pub identity: String,
}

/// Allow-list in admission order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowedResponse {
    pub identities: Vec<String>,
    pub count: usize,
}

/// Result of adding or removing an identity.
///
/// `changed` is false when the call was a no-op (already admitted, or not
/// admitted to begin with).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowListChange {
    pub identity: String,
    pub changed: bool,
}

/// History of one identity, oldest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub identity: String,
    pub samples: Vec<RawSample>,
}

/// Histories of every identity with at least one sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllMetricsResponse {
    pub metrics: HashMap<String, Vec<RawSample>>,
}

/// Verdict for one admitted identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliveEntry {
    pub identity: String,
    pub alive: bool,

    /// Last received sample, present even when offline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sample: Option<RawSample>,

    /// Address the last batch came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<IpAddr>,
}

impl From<LivenessRecord> for AliveEntry {
    fn from(record: LivenessRecord) -> Self {
        Self {
            alive: record.liveness.is_alive(),
            last_sample: record.liveness.last_sample().copied(),
            ip: record.source,
            identity: record.identity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliveResponse {
    pub threshold_secs: i64,
    pub agents: Vec<AliveEntry>,
}
