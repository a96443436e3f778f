//! CleanupActor - Periodic retention pass over the registry
//!
//! `append` already keeps each history within the retention cap. This actor
//! runs [`MetricsRegistry::cleanup`] on a coarse schedule (hours) to drop
//! empty histories and re-trim anything that slipped past the cap.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, instrument, warn};

use crate::storage::{CleanupReport, MetricsRegistry};

use super::{messages::CleanupCommand, shutdown_requested};

/// Bounds of the cleanup interval; tokio rejects a zero period and
/// `Instant` arithmetic overflows on huge ones
const MIN_CLEANUP_INTERVAL: Duration = Duration::from_millis(10);
const MAX_CLEANUP_INTERVAL: Duration = Duration::from_secs(365 * 24 * 3600);

pub struct CleanupActor {
    registry: Arc<MetricsRegistry>,

    command_rx: mpsc::Receiver<CleanupCommand>,

    /// Process-wide shutdown signal
    shutdown: watch::Receiver<bool>,

    interval_duration: Duration,
}

impl CleanupActor {
    pub fn new(
        registry: Arc<MetricsRegistry>,
        interval_duration: Duration,
        command_rx: mpsc::Receiver<CleanupCommand>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            registry,
            command_rx,
            shutdown,
            interval_duration: interval_duration.clamp(MIN_CLEANUP_INTERVAL, MAX_CLEANUP_INTERVAL),
        }
    }

    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting cleanup actor (every {:?})", self.interval_duration);

        let mut ticker = interval_at(
            Instant::now() + self.interval_duration,
            self.interval_duration,
        );

        loop {
            tokio::select! {
                _ = shutdown_requested(&mut self.shutdown) => {
                    debug!("received shutdown signal");
                    break;
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(CleanupCommand::RunNow { respond_to }) => {
                            let _ = respond_to.send(self.cleanup());
                        }

                        Some(CleanupCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }

                        None => {
                            warn!("command channel closed, shutting down");
                            break;
                        }
                    }
                }

                _ = ticker.tick() => {
                    self.cleanup();
                }
            }
        }

        debug!("cleanup actor stopped");
    }

    fn cleanup(&self) -> CleanupReport {
        let report = self.registry.cleanup();
        info!(
            "cleanup metrics store: {} empty identities removed, {} samples trimmed",
            report.removed_identities, report.trimmed_samples
        );
        report
    }
}

/// Handle for controlling the CleanupActor
#[derive(Clone)]
pub struct CleanupHandle {
    sender: mpsc::Sender<CleanupCommand>,
}

impl CleanupHandle {
    pub fn spawn(
        registry: Arc<MetricsRegistry>,
        interval_duration: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        let actor = CleanupActor::new(registry, interval_duration, cmd_rx, shutdown);

        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Run a cleanup pass immediately
    pub async fn run_now(&self) -> Result<CleanupReport> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CleanupCommand::RunNow { respond_to: tx })
            .await
            .context("failed to send RunNow command")?;

        rx.await.context("failed to receive response")
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(CleanupCommand::Shutdown).await;
    }

    /// Resolves once the actor has stopped
    pub async fn closed(&self) {
        self.sender.closed().await;
    }
}
