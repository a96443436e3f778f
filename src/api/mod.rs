//! HTTP server of the monitoring hub
//!
//! Agents push samples to the ingestion route. Everything else is the
//! administrative surface: allow-list management, metric retrieval and
//! liveness verdicts.
//!
//! ## Endpoints
//!
//! - `GET /api/v1/health` - Health check (no auth)
//! - `POST /api/v1/push` - Ingestion of agent samples (no auth)
//! - `GET /api/v1/allowed` - Allow-list in admission order
//! - `POST /api/v1/allowed` - Admit an identity
//! - `DELETE /api/v1/allowed/:identity` - Revoke an identity and purge its history
//! - `GET /api/v1/metrics` - Histories of all identities
//! - `GET /api/v1/metrics/:identity` - History of one identity
//! - `GET /api/v1/alive` - Alive/offline verdicts

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;
pub use types::{
    AliveEntry, AliveResponse, AllMetricsResponse, AllowListChange, AllowedRequest,
    AllowedResponse, HealthResponse, MetricsResponse,
};

use std::net::SocketAddr;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::actors::shutdown_requested;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:37322")
    pub bind_addr: SocketAddr,

    /// Shared secret for the administrative routes (must not be empty)
    pub auth_token: String,

    /// Enable CORS for browser clients
    pub enable_cors: bool,
}

/// Assemble the router without binding it
pub fn router(config: &ApiConfig, state: ApiState) -> Router {
    let admin = Router::new()
        .route(
            "/api/v1/allowed",
            get(routes::allowed::list_allowed).post(routes::allowed::add_allowed),
        )
        .route(
            "/api/v1/allowed/:identity",
            delete(routes::allowed::remove_allowed),
        )
        .route("/api/v1/metrics", get(routes::metrics::all_metrics))
        .route(
            "/api/v1/metrics/:identity",
            get(routes::metrics::identity_metrics),
        )
        .route("/api/v1/alive", get(routes::alive::list_alive))
        .layer(axum::middleware::from_fn_with_state(
            config.auth_token.clone(),
            middleware::auth::auth_middleware,
        ));

    let mut app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/push", post(routes::ingest::push_metrics))
        .merge(admin)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Spawn the API server
///
/// The server runs in a background task until `shutdown` flips to `true`.
/// Returns the address actually bound (useful with port 0).
pub async fn spawn_api_server(
    config: ApiConfig,
    state: ApiState,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(&config, state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        let result = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { shutdown_requested(&mut shutdown).await })
        .await;

        match result {
            Ok(()) => info!("API server stopped"),
            Err(e) => error!("API server error: {}", e),
        }
    });

    Ok(addr)
}
