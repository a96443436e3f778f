//! Host sampling for the agent
//!
//! The collector only knows the [`SampleSource`] trait; the agent binary plugs
//! in [`SystemSampleSource`], tests plug in scripted sources.

use std::fmt;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use sysinfo::{Networks, System};
use tracing::trace;

use crate::RawSample;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const BYTES_PER_KB: f64 = 1024.0;

/// Transient failure while taking a single reading
#[derive(Debug, Clone, PartialEq)]
pub enum SampleError {
    /// A counter could not be read on this host
    Unavailable(String),

    /// Any other failure of a sample source
    Failed(String),
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::Unavailable(what) => write!(f, "{what} counters unavailable"),
            SampleError::Failed(msg) => write!(f, "sampling failed: {msg}"),
        }
    }
}

impl std::error::Error for SampleError {}

/// Produces one [`RawSample`] per call.
///
/// A failure only concerns the current call; the collector logs it and tries
/// again on the next tick.
#[async_trait]
pub trait SampleSource: Send {
    async fn sample(&mut self) -> Result<RawSample, SampleError>;
}

/// Samples the local host via `sysinfo`.
///
/// CPU usage and network throughput are measured over the time between two
/// consecutive calls, so the first reading after construction covers the
/// time since `new()`.
pub struct SystemSampleSource {
    system: System,
    networks: Networks,
    last_refresh: Instant,
}

impl SystemSampleSource {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        system.refresh_memory();

        Self {
            system,
            networks: Networks::new_with_refreshed_list(),
            last_refresh: Instant::now(),
        }
    }
}

impl Default for SystemSampleSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SampleSource for SystemSampleSource {
    async fn sample(&mut self) -> Result<RawSample, SampleError> {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();
        self.networks.refresh(true);

        let elapsed = self.last_refresh.elapsed().as_secs_f64();
        self.last_refresh = Instant::now();

        if self.system.cpus().is_empty() {
            return Err(SampleError::Unavailable("cpu".to_string()));
        }

        if self.networks.list().is_empty() {
            return Err(SampleError::Unavailable("network".to_string()));
        }

        let (received, transmitted) = self
            .networks
            .list()
            .values()
            .fold((0u64, 0u64), |(rx, tx), data| {
                (rx + data.received(), tx + data.transmitted())
            });

        let per_second = |bytes: u64| {
            if elapsed > 0.0 {
                bytes as f64 / BYTES_PER_KB / elapsed
            } else {
                0.0
            }
        };

        let sample = RawSample {
            cpu_percent: f64::from(self.system.global_cpu_usage()),
            memory_mb: self.system.used_memory() as f64 / BYTES_PER_MB,
            net_in_kbps: per_second(received),
            net_out_kbps: per_second(transmitted),
            timestamp: Utc::now().timestamp(),
        };

        trace!("sampled host: {sample:?}");

        Ok(sample)
    }
}
