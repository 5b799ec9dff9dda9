//! Runtime settings
//!
//! Settings are read from an optional JSON file; every field has a default
//! so a partial file (or none at all) is fine.

use crate::error::AnalysisError;
use crate::findings::DEFAULT_REPORT_THRESHOLD;
use crate::series::{DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_WINDOW_DAYS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of days shown on a chart
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Days shown when a chart request does not say
    pub default_window_days: u32,
    /// Longest chart selection accepted, in days
    pub max_window_days: u32,
    /// Unique reports before a finding is flagged
    pub report_threshold: u32,
    /// Selections memoized per chart session
    pub chart_cache_capacity: usize,
    /// Tracing filter directive, e.g. "info" or "tracklab=debug"
    pub log_level: String,
    /// Force pretty JSON; `None` means pretty only on a terminal
    pub pretty: Option<bool>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_window_days: DEFAULT_WINDOW_DAYS,
            max_window_days: DEFAULT_MAX_WINDOW_DAYS,
            report_threshold: DEFAULT_REPORT_THRESHOLD,
            chart_cache_capacity: DEFAULT_CACHE_CAPACITY,
            log_level: "warn".to_string(),
            pretty: None,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON document
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, AnalysisError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        if self.default_window_days == 0 {
            return Err(AnalysisError::ConfigError(
                "default_window_days must be at least 1".to_string(),
            ));
        }
        if self.default_window_days > self.max_window_days {
            return Err(AnalysisError::ConfigError(format!(
                "default_window_days ({}) exceeds max_window_days ({})",
                self.default_window_days, self.max_window_days
            )));
        }
        if self.report_threshold == 0 {
            return Err(AnalysisError::ConfigError(
                "report_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = Settings::from_json(r#"{"default_window_days": 14}"#).unwrap();
        assert_eq!(settings.default_window_days, 14);
        assert_eq!(settings.report_threshold, DEFAULT_REPORT_THRESHOLD);
        assert_eq!(settings.log_level, "warn");
        assert_eq!(settings.pretty, None);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(Settings::from_json("{}").unwrap(), Settings::default());
    }

    #[test]
    fn test_zero_values_rejected() {
        let err = Settings::from_json(r#"{"report_threshold": 0}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigError(_)));
        assert!(Settings::from_json(r#"{"default_window_days": 0}"#).is_err());
    }

    #[test]
    fn test_default_window_must_fit_max_window() {
        let err = Settings::from_json(r#"{"max_window_days": 7}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigError(_)));

        let settings =
            Settings::from_json(r#"{"default_window_days": 7, "max_window_days": 7}"#).unwrap();
        assert_eq!(settings.max_window_days, 7);
    }

    #[test]
    fn test_malformed_json() {
        let err = Settings::from_json("{not json").unwrap_err();
        assert!(matches!(err, AnalysisError::JsonError(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::load(Path::new("/nonexistent/tracklab.json")).unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigError(_)));
        assert_eq!(Settings::load_or_default(None).unwrap(), Settings::default());
    }
}
