use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use pulse_monitoring::{
    actors::collector::CollectorHandle,
    config::{AgentConfig, DEFAULT_PUSH_INTERVAL_SECS, DEFAULT_PUSH_TIMEOUT_SECS},
    monitors::SystemSampleSource,
    util::{get_hub_url, termination_signal},
};
use tokio::sync::watch;
use tracing::{info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound for the collector to wind down after a termination signal
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Parser)]
#[command(about = "Samples this host and pushes the readings to a monitoring hub")]
struct Args {
    /// Identity under which this agent reports
    #[arg(short, long)]
    name: String,

    /// Base URL of the hub (defaults to MONITORING_SERVER_HOST)
    #[arg(long)]
    hub: Option<String>,

    /// Seconds between two pushes
    #[arg(long, default_value_t = DEFAULT_PUSH_INTERVAL_SECS)]
    interval: u64,

    /// Timeout for a single push in seconds
    #[arg(long, default_value_t = DEFAULT_PUSH_TIMEOUT_SECS)]
    timeout: u64,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("pulse_monitoring", LevelFilter::DEBUG),
        ("pulse_agent", LevelFilter::TRACE),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let hub_url = args
        .hub
        .or_else(get_hub_url)
        .context("no hub given (use --hub or set MONITORING_SERVER_HOST)")?;

    let mut config = AgentConfig::new(args.name, hub_url);
    config.interval = Duration::from_secs(args.interval);
    config.timeout = Duration::from_secs(args.timeout);

    info!(
        "reporting as {} to {} every {:?}",
        config.name, config.hub_url, config.interval
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let collector = CollectorHandle::spawn(config, SystemSampleSource::new(), shutdown_rx)?;

    termination_signal()
        .await
        .context("failed to listen for termination signals")?;
    info!("shutting down");

    let _ = shutdown_tx.send(true);
    if tokio::time::timeout(SHUTDOWN_GRACE, collector.closed())
        .await
        .is_err()
    {
        warn!("collector did not stop within {SHUTDOWN_GRACE:?}");
    }

    Ok(())
}
