//! API shared state

use std::sync::Arc;

use crate::{ingest::IngestionGate, monitors::LivenessEvaluator, storage::MetricsRegistry};

/// Shared state passed to all API handlers
#[derive(Debug, Clone)]
pub struct ApiState {
    /// Registry backing every route
    pub registry: Arc<MetricsRegistry>,

    /// Validation and commit of pushed batches
    pub gate: IngestionGate,

    /// Verdicts for `/alive`
    pub liveness: LivenessEvaluator,
}

impl ApiState {
    /// Build the state around one registry; gate and evaluator must share it
    pub fn new(
        registry: Arc<MetricsRegistry>,
        gate: IngestionGate,
        liveness: LivenessEvaluator,
    ) -> Self {
        Self {
            registry,
            gate,
            liveness,
        }
    }
}
