//! Error types for Tracklab

use thiserror::Error;

/// Errors surfaced at the boundaries of the analysis engine.
///
/// The statistical functions themselves never fail for business reasons;
/// these variants cover malformed documents, ownership checks and lifecycle
/// violations.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unknown trackable item: {0}")]
    UnknownItem(String),

    #[error("Unknown experiment: {0}")]
    UnknownExperiment(String),

    #[error("Access denied: {0}")]
    NotOwner(String),

    #[error("Invalid metric role: {0}")]
    InvalidMetricRole(String),

    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Invalid finding: {0}")]
    InvalidFinding(String),

    #[error("Data fetch failed: {0}")]
    FetchError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
