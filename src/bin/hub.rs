use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use pulse_monitoring::{
    actors::cleanup::CleanupHandle,
    api::{ApiConfig, ApiState, spawn_api_server},
    config::{HubConfig, read_config_file},
    ingest::IngestionGate,
    monitors::LivenessEvaluator,
    storage::MetricsRegistry,
    util::termination_signal,
};
use tokio::sync::watch;
use tracing::{debug, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(about = "Collects pushed host metrics and tracks agent liveness")]
struct Args {
    /// Config file (JSON); built-in defaults are used when omitted
    #[arg(short)]
    file: Option<String>,
}

fn init(debug: bool) {
    let level = if debug {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };
    let filter = filter::Targets::new().with_targets(vec![
        ("pulse_monitoring", level),
        ("pulse_hub", level),
        ("tower_http", LevelFilter::DEBUG),
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
    let args = Args::parse();

    let config = match &args.file {
        Some(path) => read_config_file(path)?,
        None => HubConfig::default(),
    }
    .with_env_overrides();

    init(config.debug);
    trace!("started with args: {args:?}");
    let auth_token = config.require_auth_token()?;
    debug!(
        "bind {}, retention cap {}, offline after {}s, cleanup every {:?}",
        config.bind_addr,
        config.retention_cap,
        config.offline_threshold_secs,
        config.cleanup_interval()
    );

    let registry = Arc::new(MetricsRegistry::with_retention_cap(config.retention_cap));
    for identity in &config.allowed {
        registry.add_allowed(identity);
    }
    info!(
        "{} identities admitted from config, retention cap {}",
        registry.list_allowed().len(),
        registry.retention_cap()
    );

    let gate = IngestionGate::new(registry.clone(), config.identity_mode).with_debug(config.debug);
    let liveness = LivenessEvaluator::new(registry.clone(), config.offline_threshold_secs);
    let state = ApiState::new(registry.clone(), gate, liveness);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let cleanup = CleanupHandle::spawn(
        registry.clone(),
        config.cleanup_interval(),
        shutdown_rx.clone(),
    );

    let api_config = ApiConfig {
        bind_addr: config.bind_addr,
        auth_token,
        enable_cors: config.enable_cors,
    };
    let addr = spawn_api_server(api_config, state, shutdown_rx)
        .await
        .context("failed to start API server")?;
    info!("hub ready on {addr} ({:?} identity mode)", config.identity_mode);

    termination_signal()
        .await
        .context("failed to listen for termination signals")?;
    info!("shutting down");

    let _ = shutdown_tx.send(true);
    cleanup.closed().await;
    info!("final registry state: {:?}", registry.stats());

    Ok(())
}
