//! Ingestion endpoint used by agents

use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, State},
};

use crate::{
    api::{ApiResult, ApiState},
    ingest::{PushRequest, PushResponse},
};

/// POST /api/v1/push
///
/// Denied batches still answer 200 with `success: false`. Only a failure to
/// resolve the sender (address mode without peer info) is an HTTP error.
pub async fn push_metrics(
    State(state): State<ApiState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    Json(request): Json<PushRequest>,
) -> ApiResult<Json<PushResponse>> {
    let peer_ip = peer.map(|ConnectInfo(addr)| addr.ip());
    let response = state.gate.push(peer_ip, request)?;

    Ok(Json(response))
}
