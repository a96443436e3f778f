use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;

use tracing::warn;

const DEFAULT_HUB_PORT: u16 = 37322;

const DEFAULT_HUB_ADDR: Ipv4Addr = Ipv4Addr::new(0, 0, 0, 0);

pub fn get_default_bind_addr() -> SocketAddr {
    SocketAddr::from((DEFAULT_HUB_ADDR, DEFAULT_HUB_PORT))
}

/// Read and parse `key` from the environment.
///
/// Unset variables yield `None`; unparsable ones are logged and ignored.
fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    let value = std::env::var(key).ok()?;
    value
        .parse()
        .inspect_err(|_| warn!("ignoring invalid value for {key}: {value:?}"))
        .ok()
}

const HUB_ADDR: &str = "HUB_ADDR";

pub fn get_hub_addr() -> Option<SocketAddr> {
    parse_env(HUB_ADDR)
}

const AUTH_TOKEN: &str = "AUTH_TOKEN";

pub fn get_auth_token() -> Option<String> {
    std::env::var(AUTH_TOKEN).ok().filter(|token| !token.is_empty())
}

const OFFLINE_THRESHOLD_SEC: &str = "OFFLINE_THRESHOLD_SEC";

pub fn get_offline_threshold() -> Option<i64> {
    parse_env(OFFLINE_THRESHOLD_SEC)
}

const CLEANUP_INTERVAL_HOURS: &str = "CLEANUP_INTERVAL_HOURS";

pub fn get_cleanup_interval_hours() -> Option<u64> {
    parse_env(CLEANUP_INTERVAL_HOURS)
}

const DEBUG: &str = "DEBUG";

pub fn get_debug() -> Option<bool> {
    parse_env(DEBUG)
}

const MONITORING_SERVER_HOST: &str = "MONITORING_SERVER_HOST";

/// Hub URL derived from `MONITORING_SERVER_HOST` (host name or IP, default port)
pub fn get_hub_url() -> Option<String> {
    let host = std::env::var(MONITORING_SERVER_HOST).ok()?;
    if host.is_empty() {
        return None;
    }
    Some(format!("http://{host}:{DEFAULT_HUB_PORT}"))
}

/// Resolves on Ctrl-C, or on SIGTERM where the platform has it
pub async fn termination_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result,
            _ = terminate.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}
