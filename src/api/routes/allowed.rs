//! Allow-list management endpoints

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;

use crate::api::{
    ApiError, ApiResult, ApiState,
    types::{AllowListChange, AllowedRequest, AllowedResponse},
};

/// GET /api/v1/allowed
pub async fn list_allowed(State(state): State<ApiState>) -> Json<AllowedResponse> {
    let identities = state.registry.list_allowed();

    Json(AllowedResponse {
        count: identities.len(),
        identities,
    })
}

/// POST /api/v1/allowed
pub async fn add_allowed(
    State(state): State<ApiState>,
    Json(request): Json<AllowedRequest>,
) -> ApiResult<Json<AllowListChange>> {
    let identity = request.identity.trim();
    if identity.is_empty() {
        return Err(ApiError::InvalidRequest(
            "identity must not be empty".to_string(),
        ));
    }

    let changed = state.registry.add_allowed(identity);
    if changed {
        info!("{identity}: admitted");
    }

    Ok(Json(AllowListChange {
        identity: identity.to_string(),
        changed,
    }))
}

/// DELETE /api/v1/allowed/:identity
///
/// Revoking also drops the stored history.
pub async fn remove_allowed(
    State(state): State<ApiState>,
    Path(identity): Path<String>,
) -> Json<AllowListChange> {
    let changed = state.registry.remove_allowed(&identity);
    if changed {
        info!("{identity}: revoked, history purged");
    }

    Json(AllowListChange { identity, changed })
}
