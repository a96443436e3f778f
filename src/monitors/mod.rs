//! Evaluation of agent state
//!
//! - [`liveness`]: alive/offline verdicts on the hub
//! - [`sample`]: host readings on the agent

pub mod liveness;
pub mod sample;

pub use liveness::{DEFAULT_OFFLINE_THRESHOLD_SECS, Liveness, LivenessEvaluator, LivenessRecord};
pub use sample::{SampleError, SampleSource, SystemSampleSource};
