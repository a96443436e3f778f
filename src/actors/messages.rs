//! Message types for actor communication
//!
//! Every actor owns an mpsc command receiver. Queries carry a oneshot sender
//! for the answer.

use std::time::Duration;

use tokio::sync::oneshot;

use crate::storage::CleanupReport;

/// Commands that can be sent to a CollectorActor
#[derive(Debug)]
pub enum CollectorCommand {
    /// Sample and push immediately (bypassing the interval timer)
    ///
    /// Used for testing and manual refresh operations.
    PushNow {
        respond_to: oneshot::Sender<anyhow::Result<()>>,
    },

    /// Update the push interval
    ///
    /// The ticker restarts with the new interval right away.
    UpdateInterval { interval: Duration },

    /// Get the counters of the collector loop
    GetStats {
        respond_to: oneshot::Sender<CollectorStats>,
    },

    /// Stop the loop after the current tick
    Shutdown,
}

/// Counters of a collector loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorStats {
    /// Ticks handled (timer ticks and PushNow)
    pub ticks: u64,

    /// Samples acknowledged by the hub
    pub pushed: u64,

    /// Ticks skipped because sampling failed
    pub sample_failures: u64,

    /// Ticks whose sample could not be delivered
    pub transmit_failures: u64,
}

/// Commands that can be sent to the CleanupActor
#[derive(Debug)]
pub enum CleanupCommand {
    /// Run a cleanup pass now
    RunNow {
        respond_to: oneshot::Sender<CleanupReport>,
    },

    /// Stop the cleanup loop
    Shutdown,
}
