//! HTTP client used by agents to push samples to the hub

use std::fmt;
use std::time::Duration;

use tracing::trace;

use crate::ingest::{PushRequest, PushResponse, PushedSample};

/// Path of the ingestion route on the hub
pub const PUSH_PATH: &str = "/api/v1/push";

/// Failure to deliver a batch to the hub
#[derive(Debug)]
pub enum TransmitError {
    /// The HTTP client could not be constructed
    Client(String),

    /// The hub did not answer within the configured timeout
    Timeout,

    /// The hub could not be reached
    Connect(String),

    /// The hub answered with a non-success status code
    Status(u16),

    /// The response body was not a valid push response
    Decode(String),

    /// The hub understood the request but refused the batch
    Rejected(String),

    /// Any other request failure
    Request(String),
}

impl fmt::Display for TransmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransmitError::Client(msg) => write!(f, "failed to build HTTP client: {msg}"),
            TransmitError::Timeout => write!(f, "request timeout"),
            TransmitError::Connect(msg) => write!(f, "connection failed: {msg}"),
            TransmitError::Status(status) => write!(f, "HTTP error: {status}"),
            TransmitError::Decode(msg) => write!(f, "invalid response: {msg}"),
            TransmitError::Rejected(msg) => write!(f, "hub rejected metrics: {msg}"),
            TransmitError::Request(msg) => write!(f, "HTTP request failed: {msg}"),
        }
    }
}

impl std::error::Error for TransmitError {}

impl From<reqwest::Error> for TransmitError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            TransmitError::Timeout
        } else if error.is_connect() {
            TransmitError::Connect(error.to_string())
        } else if error.is_decode() {
            TransmitError::Decode(error.to_string())
        } else {
            TransmitError::Request(error.to_string())
        }
    }
}

/// Pushes batches to one hub.
///
/// The underlying `reqwest::Client` is reused across pushes; every request
/// is bounded by the timeout given at construction.
#[derive(Debug, Clone)]
pub struct HubClient {
    client: reqwest::Client,
    push_url: String,
}

impl HubClient {
    pub fn new(hub_url: &str, timeout: Duration) -> Result<Self, TransmitError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| TransmitError::Client(e.to_string()))?;

        Ok(Self {
            client,
            push_url: format!("{}{PUSH_PATH}", hub_url.trim_end_matches('/')),
        })
    }

    pub fn push_url(&self) -> &str {
        &self.push_url
    }

    /// Send one batch and return the hub's acknowledgement.
    ///
    /// A `success: false` acknowledgement is reported as
    /// [`TransmitError::Rejected`].
    pub async fn push(&self, samples: Vec<PushedSample>) -> Result<PushResponse, TransmitError> {
        trace!("pushing {} samples to {}", samples.len(), self.push_url);

        let response = self
            .client
            .post(&self.push_url)
            .json(&PushRequest { samples })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransmitError::Status(status.as_u16()));
        }

        let ack: PushResponse = response.json().await?;
        if !ack.success {
            return Err(TransmitError::Rejected(ack.message));
        }

        Ok(ack)
    }
}
