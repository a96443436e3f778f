use std::net::IpAddr;
use std::sync::Arc;

use chrono::Utc;
use tracing::{instrument, trace};

use crate::{RawSample, storage::MetricsRegistry};

/// Default maximum age (seconds) of the last sample for an agent to count as alive
pub const DEFAULT_OFFLINE_THRESHOLD_SECS: i64 = 90;

/// Verdict for a single identity
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Liveness {
    /// The last sample is recent enough
    Alive { last: RawSample },

    /// The last sample is too old, or nothing was ever pushed
    Offline { last: Option<RawSample> },
}

impl Liveness {
    pub fn evaluate(last: Option<RawSample>, now: i64, threshold_secs: i64) -> Liveness {
        match last {
            Some(last) if last.age_secs(now) <= threshold_secs => Liveness::Alive { last },
            last => Liveness::Offline { last },
        }
    }

    pub fn is_alive(&self) -> bool {
        matches!(self, Liveness::Alive { .. })
    }

    /// The last sample, reported regardless of the verdict
    pub fn last_sample(&self) -> Option<&RawSample> {
        match self {
            Liveness::Alive { last } => Some(last),
            Liveness::Offline { last } => last.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LivenessRecord {
    pub identity: String,
    pub liveness: Liveness,

    /// Address the latest batch was received from
    pub source: Option<IpAddr>,
}

/// Derives alive/offline verdicts from the registry on demand.
///
/// Nothing is cached: every call looks at the current tail of each history.
/// The tail is the last sample to *arrive*, which is not necessarily the one
/// with the highest timestamp.
#[derive(Debug, Clone)]
pub struct LivenessEvaluator {
    registry: Arc<MetricsRegistry>,
    threshold_secs: i64,
}

impl LivenessEvaluator {
    pub fn new(registry: Arc<MetricsRegistry>, threshold_secs: i64) -> Self {
        Self {
            registry,
            threshold_secs,
        }
    }

    pub fn threshold_secs(&self) -> i64 {
        self.threshold_secs
    }

    /// Verdicts for every allowed identity, in allow-list order
    pub fn compute(&self) -> Vec<LivenessRecord> {
        self.compute_at(Utc::now().timestamp())
    }

    /// Same as [`compute`](Self::compute) with an explicit "now" (unix seconds)
    #[instrument(skip(self))]
    pub fn compute_at(&self, now: i64) -> Vec<LivenessRecord> {
        let records: Vec<LivenessRecord> = self
            .registry
            .latest_samples()
            .into_iter()
            .map(|latest| LivenessRecord {
                liveness: Liveness::evaluate(latest.sample, now, self.threshold_secs),
                identity: latest.identity,
                source: latest.source,
            })
            .collect();

        trace!(
            "{} of {} identities alive (threshold: {}s)",
            records.iter().filter(|r| r.liveness.is_alive()).count(),
            records.len(),
            self.threshold_secs
        );

        records
    }
}
