//! Tracklab - experiment analysis and dual-metric chart engine for self-tracking
//!
//! Tracklab turns a user's logged metrics into experiment results and chart-ready
//! series through a deterministic pipeline: daily aggregation → condition split
//! → group statistics → correlation, and daily records → axis synchronization.
//!
//! ## Modules
//!
//! - **Experiments**: lifecycle plus high/low condition analysis of an input metric
//!   against an output metric
//! - **Charts**: dual-axis series with boolean-to-scale normalization and a
//!   memoized, stale-safe chart session
//! - **Findings**: community posts with vote toggling and report flagging

pub mod aggregator;
pub mod axis;
pub mod config;
pub mod error;
pub mod experiment;
pub mod findings;
pub mod pipeline;
pub mod series;
pub mod splitter;
pub mod stats;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use aggregator::{DailyAggregator, DateWindow};
pub use axis::{AxisConfig, ChartScenario};
pub use config::Settings;
pub use error::AnalysisError;
pub use experiment::{
    compute_experiment_results, try_compute_experiment_results, Experiment, ExperimentResults,
};
pub use findings::{Finding, VoteLedger, VoteType};
pub use pipeline::{dual_series_json, experiment_results_json, Dataset, InsightProcessor};
pub use series::{compute_dual_metric_series, ChartSession, DualMetricSeries, SeriesSource};
pub use stats::pearson_correlation;
pub use types::{LogEntry, MetricType, TrackableItem, UserContext};

/// Tracklab version, reported by the CLI and the C ABI
pub const TRACKLAB_VERSION: &str = env!("CARGO_PKG_VERSION");
