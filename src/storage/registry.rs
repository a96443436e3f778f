//! In-memory metrics registry
//!
//! Maps every allowed identity to the samples it pushed, in arrival order.
//! Each history is a ring buffer with a fixed capacity (the retention cap);
//! when it is full, the oldest sample is evicted.
//!
//! ## Locking
//!
//! The allow-list and the histories share a single `RwLock`. Removing an
//! identity drops its history inside the same write section, so there is
//! never a moment where samples exist for an identity that is no longer
//! allowed. A pushed batch is committed inside one write section as well.
//! Reads take the shared lock and always hand out copies.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::allow_list::AllowList;
use crate::RawSample;

/// Default number of samples kept per identity
pub const DEFAULT_RETENTION_CAP: usize = 100;

#[derive(Debug, Default)]
struct RegistryState {
    allowed: AllowList,
    histories: HashMap<String, VecDeque<RawSample>>,

    /// Address the latest batch of each identity was received from
    sources: HashMap<String, IpAddr>,
}

/// Tail of one identity's history as seen by liveness evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct LatestSample {
    pub identity: String,
    pub sample: Option<RawSample>,
    pub source: Option<IpAddr>,
}

/// Outcome of a [`MetricsRegistry::cleanup`] pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Identities whose (empty) history was dropped entirely
    pub removed_identities: usize,

    /// Samples evicted from histories that exceeded the retention cap
    pub trimmed_samples: usize,
}

/// Point-in-time counters of the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub allowed_identities: usize,
    pub identities_with_history: usize,
    pub total_samples: usize,
}

/// Concurrent store of recent samples per allowed identity.
///
/// Constructed once by the hub and shared as `Arc<MetricsRegistry>` with the
/// ingestion gate, the API handlers and the cleanup actor.
#[derive(Debug)]
pub struct MetricsRegistry {
    state: RwLock<RegistryState>,
    retention_cap: usize,
}

impl MetricsRegistry {
    /// Create a registry with the default retention cap
    pub fn new() -> Self {
        Self::with_retention_cap(DEFAULT_RETENTION_CAP)
    }

    /// Create a registry keeping at most `retention_cap` samples per identity.
    ///
    /// A cap of zero is raised to one, a history always holds its latest sample.
    pub fn with_retention_cap(retention_cap: usize) -> Self {
        let retention_cap = retention_cap.max(1);
        debug!("creating metrics registry (retention cap: {retention_cap})");

        Self {
            state: RwLock::new(RegistryState::default()),
            retention_cap,
        }
    }

    pub fn retention_cap(&self) -> usize {
        self.retention_cap
    }

    /// Admit `identity`. Returns `true` if it was not allowed before.
    pub fn add_allowed(&self, identity: &str) -> bool {
        let added = self.state.write().allowed.insert(identity);
        if added {
            debug!("{identity}: added to allow-list");
        }
        added
    }

    pub fn is_allowed(&self, identity: &str) -> bool {
        self.state.read().allowed.contains(identity)
    }

    /// Revoke `identity` and drop everything stored for it.
    ///
    /// Returns `true` if the identity was allowed before.
    pub fn remove_allowed(&self, identity: &str) -> bool {
        let mut state = self.state.write();
        let removed = state.allowed.remove(identity);
        let dropped = state
            .histories
            .remove(identity)
            .map(|history| history.len())
            .unwrap_or_default();
        state.sources.remove(identity);
        drop(state);

        if removed {
            debug!("{identity}: removed from allow-list ({dropped} samples dropped)");
        }
        removed
    }

    /// Append `sample` to the history of `identity`.
    ///
    /// Samples for identities that are not allowed are ignored.
    pub fn append(&self, identity: &str, sample: RawSample) {
        if !self.append_batch(identity, None, [sample]) {
            trace!("{identity}: ignoring sample, identity not allowed");
        }
    }

    /// Append a whole batch for `identity` under one write lock.
    ///
    /// Either every sample is appended or, if the identity is not allowed,
    /// none is. `source` (the peer the batch came from) replaces the
    /// recorded address when present. Returns whether the batch was committed.
    pub fn append_batch<I>(&self, identity: &str, source: Option<IpAddr>, samples: I) -> bool
    where
        I: IntoIterator<Item = RawSample>,
    {
        let mut state = self.state.write();
        if !state.allowed.contains(identity) {
            return false;
        }

        if let Some(source) = source {
            state.sources.insert(identity.to_string(), source);
        }

        let history = state
            .histories
            .entry(identity.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.retention_cap));

        history.extend(samples);
        if history.len() > self.retention_cap {
            let excess = history.len() - self.retention_cap;
            history.drain(..excess);
        }

        true
    }

    /// Address the latest batch of `identity` was received from
    pub fn source(&self, identity: &str) -> Option<IpAddr> {
        self.state.read().sources.get(identity).copied()
    }

    /// Copy of the history of `identity`, oldest first.
    ///
    /// Empty if the identity is not allowed or has not pushed anything.
    pub fn query(&self, identity: &str) -> Vec<RawSample> {
        let state = self.state.read();
        if !state.allowed.contains(identity) {
            return vec![];
        }

        state
            .histories
            .get(identity)
            .map(|history| history.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Copy of every stored history
    pub fn query_all(&self) -> HashMap<String, Vec<RawSample>> {
        self.state
            .read()
            .histories
            .iter()
            .map(|(identity, history)| (identity.clone(), history.iter().copied().collect()))
            .collect()
    }

    /// Allowed identities in the order they were added
    pub fn list_allowed(&self) -> Vec<String> {
        self.state.read().allowed.to_vec()
    }

    /// Most recently arrived sample of `identity`
    pub fn latest(&self, identity: &str) -> Option<RawSample> {
        let state = self.state.read();
        if !state.allowed.contains(identity) {
            return None;
        }

        state
            .histories
            .get(identity)
            .and_then(|history| history.back().copied())
    }

    /// Latest sample of every allowed identity, in allow-list order.
    ///
    /// Taken under one read lock, so the result is a consistent snapshot.
    pub fn latest_samples(&self) -> Vec<LatestSample> {
        let state = self.state.read();

        state
            .allowed
            .iter()
            .map(|identity| LatestSample {
                identity: identity.to_string(),
                sample: state
                    .histories
                    .get(identity)
                    .and_then(|history| history.back().copied()),
                source: state.sources.get(identity).copied(),
            })
            .collect()
    }

    /// Drop empty histories and trim histories above the retention cap.
    ///
    /// `append` already enforces the cap; this pass is the coarse safety net
    /// run periodically by the cleanup actor.
    pub fn cleanup(&self) -> CleanupReport {
        let mut report = CleanupReport::default();
        let mut state = self.state.write();
        let RegistryState {
            allowed,
            histories,
            sources,
        } = &mut *state;

        histories.retain(|identity, history| {
            if history.is_empty() || !allowed.contains(identity) {
                report.removed_identities += 1;
                return false;
            }

            if history.len() > self.retention_cap {
                let excess = history.len() - self.retention_cap;
                history.drain(..excess);
                report.trimmed_samples += excess;
            }

            true
        });
        sources.retain(|identity, _| histories.contains_key(identity));

        report
    }

    pub fn stats(&self) -> RegistryStats {
        let state = self.state.read();

        RegistryStats {
            allowed_identities: state.allowed.len(),
            identities_with_history: state.histories.len(),
            total_samples: state.histories.values().map(VecDeque::len).sum(),
        }
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
