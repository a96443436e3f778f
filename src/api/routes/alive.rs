//! Liveness endpoint

use axum::{Json, extract::State};

use crate::api::{
    ApiState,
    types::{AliveEntry, AliveResponse},
};

/// GET /api/v1/alive
///
/// One entry per admitted identity, in admission order.
pub async fn list_alive(State(state): State<ApiState>) -> Json<AliveResponse> {
    let agents = state
        .liveness
        .compute()
        .into_iter()
        .map(AliveEntry::from)
        .collect();

    Json(AliveResponse {
        threshold_secs: state.liveness.threshold_secs(),
        agents,
    })
}
