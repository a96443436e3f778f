//! Metric retrieval endpoints

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::{
    ApiError, ApiResult, ApiState,
    types::{AllMetricsResponse, MetricsResponse},
};

/// GET /api/v1/metrics
pub async fn all_metrics(State(state): State<ApiState>) -> Json<AllMetricsResponse> {
    Json(AllMetricsResponse {
        metrics: state.registry.query_all(),
    })
}

/// GET /api/v1/metrics/:identity
///
/// An admitted identity without samples yields an empty list; an identity
/// that is not admitted yields 404.
pub async fn identity_metrics(
    State(state): State<ApiState>,
    Path(identity): Path<String>,
) -> ApiResult<Json<MetricsResponse>> {
    if !state.registry.is_allowed(&identity) {
        return Err(ApiError::NotFound(format!(
            "identity {identity} is not allowed"
        )));
    }

    Ok(Json(MetricsResponse {
        samples: state.registry.query(&identity),
        identity,
    }))
}
