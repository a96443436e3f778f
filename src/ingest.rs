//! Server-side acceptance of pushed samples
//!
//! The transport (the `/api/v1/push` route) hands every request to the
//! [`IngestionGate`] together with whatever it knows about the caller. The
//! gate resolves the identity, applies the allow-list to the whole batch and
//! commits the samples.
//!
//! ## Outcomes
//!
//! - identity cannot be resolved → [`IngestError`], a protocol failure
//! - policy denial (not allowed, missing name, empty batch) →
//!   `PushResponse { success: false }`, the transport itself worked
//! - accepted → every sample is appended, `PushResponse { success: true }`

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{RawSample, config::IdentityMode, storage::MetricsRegistry};

/// A sample as it travels over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushedSample {
    /// Declared agent name, required when the hub runs in name mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(flatten)]
    pub sample: RawSample,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushRequest {
    pub samples: Vec<PushedSample>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushResponse {
    pub success: bool,
    pub message: String,
}

impl PushResponse {
    fn accepted(count: usize) -> Self {
        Self {
            success: true,
            message: format!("{count} metrics pushed successfully"),
        }
    }

    fn denied(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Failures of the ingestion protocol itself (not policy denials)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// The transport could not tell who is calling
    IdentityResolution(String),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::IdentityResolution(msg) => {
                write!(f, "could not resolve caller identity: {msg}")
            }
        }
    }
}

impl std::error::Error for IngestError {}

/// Entry point for pushed batches
#[derive(Debug, Clone)]
pub struct IngestionGate {
    registry: Arc<MetricsRegistry>,
    mode: IdentityMode,
    debug: bool,
}

impl IngestionGate {
    pub fn new(registry: Arc<MetricsRegistry>, mode: IdentityMode) -> Self {
        Self {
            registry,
            mode,
            debug: false,
        }
    }

    /// Log the content of every received batch
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn mode(&self) -> IdentityMode {
        self.mode
    }

    /// Validate and commit one batch.
    ///
    /// `peer` is the source address observed by the transport, if any. The
    /// batch is all-or-nothing: either every sample is appended or none is.
    #[instrument(skip_all, fields(mode = ?self.mode))]
    pub fn push(
        &self,
        peer: Option<IpAddr>,
        request: PushRequest,
    ) -> Result<PushResponse, IngestError> {
        let PushRequest { samples } = request;

        let peer_identity = match (self.mode, peer) {
            (IdentityMode::Address, None) => {
                return Err(IngestError::IdentityResolution(
                    "source address unavailable".to_string(),
                ));
            }
            (IdentityMode::Address, Some(ip)) => Some(ip.to_canonical().to_string()),
            (IdentityMode::Name, _) => None,
        };

        let Some(first) = samples.first() else {
            return Ok(PushResponse::denied("no samples in request"));
        };

        let identity = match peer_identity {
            Some(identity) => identity,
            None => match declared_identity(&samples) {
                Ok(identity) => identity,
                Err(reason) => {
                    debug!("denying batch: {reason}");
                    return Ok(PushResponse::denied(reason));
                }
            },
        };

        if self.debug {
            info!(
                "received {} samples from {identity} (peer: {peer:?}), first: {:?}",
                samples.len(),
                first.sample
            );
        }

        let count = samples.len();
        let source = peer.map(|ip| ip.to_canonical());
        let committed = self.registry.append_batch(
            &identity,
            source,
            samples.into_iter().map(|pushed| pushed.sample),
        );

        if !committed {
            debug!("{identity}: denying batch, identity not allowed");
            return Ok(PushResponse::denied(format!(
                "identity {identity} is not allowed"
            )));
        }

        if self.debug {
            info!(
                "current history of {identity}: {:?}",
                self.registry.query(&identity)
            );
        }

        debug!("{identity}: accepted {count} samples");

        Ok(PushResponse::accepted(count))
    }
}

/// The single name every sample of a batch declares.
///
/// Fails on the first sample without a name or with a different one.
fn declared_identity(samples: &[PushedSample]) -> Result<String, String> {
    let mut identity: Option<&str> = None;

    for (index, pushed) in samples.iter().enumerate() {
        let name = match pushed.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => return Err(format!("metric name cannot be empty (sample {index})")),
        };

        match identity {
            None => identity = Some(name),
            Some(expected) if expected != name => {
                return Err(format!(
                    "sample {index} declares {name}, batch belongs to {expected}"
                ));
            }
            Some(_) => {}
        }
    }

    identity
        .map(str::to_string)
        .ok_or_else(|| "no samples in request".to_string())
}
