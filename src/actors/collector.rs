//! CollectorActor - Samples the host and pushes to the hub
//!
//! One collector runs per agent process. Each tick walks through
//! `Idle → Sampling → Transmitting → Idle`; the loop ends (`Stopped`) on the
//! process-wide shutdown signal, a `Shutdown` command, or when every handle
//! is gone.
//!
//! ## Failure handling
//!
//! A failed reading skips the transmission of that tick. A failed push is
//! dropped. Neither is retried or buffered and neither stops the loop; the
//! hub sees the gap as staleness.
//!
//! ```text
//! Timer tick → SampleSource → HubClient::push → hub
//!     ↑
//!     └─── Commands (PushNow, UpdateInterval, GetStats, Shutdown) + shutdown signal
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, instrument, trace, warn};

use crate::{
    client::HubClient,
    config::AgentConfig,
    ingest::PushedSample,
    monitors::SampleSource,
};

use super::{
    messages::{CollectorCommand, CollectorStats},
    shutdown_requested,
};

/// Bounds of the push interval; tokio rejects a zero period and `Instant`
/// arithmetic overflows on huge ones
const MIN_PUSH_INTERVAL: Duration = Duration::from_millis(10);
const MAX_PUSH_INTERVAL: Duration = Duration::from_secs(24 * 3600);

/// Actor driving the periodic sample-and-push loop of one agent
pub struct CollectorActor<S: SampleSource> {
    config: AgentConfig,

    /// Source of host readings
    source: S,

    /// HTTP client (reused across pushes)
    client: HubClient,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<CollectorCommand>,

    /// Process-wide shutdown signal
    shutdown: watch::Receiver<bool>,

    /// Current push interval
    interval_duration: Duration,

    stats: CollectorStats,
}

impl<S: SampleSource> CollectorActor<S> {
    pub fn new(
        config: AgentConfig,
        source: S,
        client: HubClient,
        command_rx: mpsc::Receiver<CollectorCommand>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let interval_duration = config.interval.clamp(MIN_PUSH_INTERVAL, MAX_PUSH_INTERVAL);

        Self {
            config,
            source,
            client,
            command_rx,
            shutdown,
            interval_duration,
            stats: CollectorStats::default(),
        }
    }

    /// Run the actor's main loop
    ///
    /// The first tick fires one interval after start.
    #[instrument(skip(self), fields(agent = %self.config.name))]
    pub async fn run(mut self) {
        info!(
            "pushing metrics to {} every {:?}",
            self.client.push_url(),
            self.interval_duration
        );

        let mut ticker = self.ticker();

        loop {
            tokio::select! {
                // fires immediately if shutdown was already signalled
                _ = shutdown_requested(&mut self.shutdown) => {
                    debug!("received shutdown signal");
                    break;
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(CollectorCommand::PushNow { respond_to }) => {
                            debug!("received PushNow command");
                            let result = self.tick().await;
                            let _ = respond_to.send(result);
                        }

                        Some(CollectorCommand::UpdateInterval { interval }) => {
                            debug!("updating interval to {interval:?}");
                            self.interval_duration = interval.clamp(MIN_PUSH_INTERVAL, MAX_PUSH_INTERVAL);
                            ticker = self.ticker();
                        }

                        Some(CollectorCommand::GetStats { respond_to }) => {
                            let _ = respond_to.send(self.stats);
                        }

                        Some(CollectorCommand::Shutdown) => {
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
                    if let Err(e) = self.tick().await {
                        warn!("skipping tick: {:#}", e);
                    }
                }
            }
        }

        info!("metric collection stopped");
    }

    fn ticker(&self) -> tokio::time::Interval {
        let mut ticker = interval_at(
            Instant::now() + self.interval_duration,
            self.interval_duration,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    /// Take one sample and push it
    async fn tick(&mut self) -> Result<()> {
        self.stats.ticks += 1;

        let sample = match self.source.sample().await {
            Ok(sample) => sample,
            Err(e) => {
                self.stats.sample_failures += 1;
                return Err(e).context("failed to sample host metrics");
            }
        };

        trace!("pushing sample taken at {}", sample.timestamp);

        let batch = vec![PushedSample {
            name: Some(self.config.name.clone()),
            sample,
        }];

        if let Err(e) = self.client.push(batch).await {
            self.stats.transmit_failures += 1;
            return Err(e).context("failed to push metrics");
        }

        self.stats.pushed += 1;
        debug!(
            "pushed metrics: CPU={:.2}%, memory={:.2}MB, net in={:.2}KB/s, net out={:.2}KB/s",
            sample.cpu_percent, sample.memory_mb, sample.net_in_kbps, sample.net_out_kbps
        );

        Ok(())
    }
}

/// Handle for controlling a CollectorActor
///
/// It can be cloned and shared across tasks. The actor stops once the last
/// handle is dropped.
#[derive(Clone)]
pub struct CollectorHandle {
    sender: mpsc::Sender<CollectorCommand>,

    /// Identity the collector pushes as
    pub name: String,
}

impl CollectorHandle {
    /// Spawn a collector actor as a tokio task.
    ///
    /// Fails only if the HTTP client cannot be built.
    pub fn spawn<S>(config: AgentConfig, source: S, shutdown: watch::Receiver<bool>) -> Result<Self>
    where
        S: SampleSource + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let client = HubClient::new(&config.hub_url, config.timeout)
            .context("failed to create hub client")?;
        let name = config.name.clone();

        let actor = CollectorActor::new(config, source, client, cmd_rx, shutdown);

        tokio::spawn(actor.run());

        Ok(Self {
            sender: cmd_tx,
            name,
        })
    }

    /// Sample and push immediately, returning the outcome of this tick
    pub async fn push_now(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CollectorCommand::PushNow { respond_to: tx })
            .await
            .context("failed to send PushNow command")?;

        rx.await.context("failed to receive response")??;
        Ok(())
    }

    pub async fn update_interval(&self, interval: Duration) -> Result<()> {
        self.sender
            .send(CollectorCommand::UpdateInterval { interval })
            .await
            .context("failed to send UpdateInterval command")?;
        Ok(())
    }

    pub async fn get_stats(&self) -> Option<CollectorStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CollectorCommand::GetStats { respond_to: tx })
            .await
            .ok()?;

        rx.await.ok()
    }

    /// Gracefully shut down the collector
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(CollectorCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }

    /// Resolves once the actor has stopped
    pub async fn closed(&self) {
        self.sender.closed().await;
    }
}
