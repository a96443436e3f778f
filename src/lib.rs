pub mod actors;
#[cfg(feature = "api")]
pub mod api;
pub mod client;
pub mod config;
pub mod ingest;
pub mod monitors;
pub mod storage;
pub mod util;

use serde::{Deserialize, Serialize};

/// One reading of host telemetry as produced by an agent.
///
/// The identity the sample belongs to is never part of the record; it is the
/// key the sample is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RawSample {
    /// CPU usage in percent (averaged over all cores)
    pub cpu_percent: f64,

    /// Used memory in MB
    pub memory_mb: f64,

    /// Inbound network throughput in KB/s
    pub net_in_kbps: f64,

    /// Outbound network throughput in KB/s
    pub net_out_kbps: f64,

    /// Unix timestamp (seconds, UTC) at which the sample was taken
    pub timestamp: i64,
}

impl RawSample {
    /// Age of the sample in seconds relative to `now` (unix seconds).
    ///
    /// Negative if the sample claims to be from the future. Saturates at the
    /// `i64` bounds, so a timestamp far in the past is simply very old.
    pub fn age_secs(&self, now: i64) -> i64 {
        now.saturating_sub(self.timestamp)
    }
}
