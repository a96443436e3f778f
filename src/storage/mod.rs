//! Memory-resident storage for pushed metrics
//!
//! The hub keeps the most recent samples of every admitted agent in a
//! [`MetricsRegistry`]. Nothing is persisted: restarting the hub starts with
//! an empty registry and the allow-list from the configuration.
//!
//! ## Usage
//!
//! ```
//! use pulse_monitoring::{RawSample, storage::MetricsRegistry};
//!
//! let registry = MetricsRegistry::new();
//! registry.add_allowed("web-1");
//! registry.append("web-1", RawSample { timestamp: 1, ..Default::default() });
//! assert_eq!(registry.query("web-1").len(), 1);
//! ```

pub mod allow_list;
pub mod registry;

pub use allow_list::AllowList;
pub use registry::{
    CleanupReport, DEFAULT_RETENTION_CAP, LatestSample, MetricsRegistry, RegistryStats,
};
