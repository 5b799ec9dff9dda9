//! Core types for the Tracklab engine
//!
//! This module defines the domain records that flow through the analysis
//! pipeline: metric definitions, raw log entries, per-day chart records and
//! the explicit user context every entry point receives.

use crate::error::AnalysisError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The user on whose behalf an operation runs.
///
/// Passed explicitly into every entry point; there is no ambient session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Uuid,
}

impl UserContext {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }

    /// Fail with `NotOwner` unless `owner` is the current user
    pub fn ensure_owner(&self, owner: Uuid, what: &str) -> Result<(), AnalysisError> {
        if owner == self.user_id {
            Ok(())
        } else {
            Err(AnalysisError::NotOwner(format!(
                "{what} does not belong to user {}",
                self.user_id
            )))
        }
    }
}

/// Whether a metric is something the user does or something they observe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricCategory {
    Input,
    Output,
}

/// Value type of a trackable metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricType {
    #[serde(rename = "NUMERIC")]
    Numeric,
    #[serde(rename = "SCALE_1_10")]
    Scale1To10,
    #[serde(rename = "BOOLEAN")]
    Boolean,
    #[serde(rename = "TEXT")]
    Text,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Numeric => "NUMERIC",
            MetricType::Scale1To10 => "SCALE_1_10",
            MetricType::Boolean => "BOOLEAN",
            MetricType::Text => "TEXT",
        }
    }

    /// Types allowed on the output (dependent / primary chart) side
    pub fn is_valid_output(&self) -> bool {
        match self {
            MetricType::Numeric | MetricType::Scale1To10 => true,
            MetricType::Boolean | MetricType::Text => false,
        }
    }

    /// Types allowed on the input (independent / comparison) side
    pub fn is_valid_input(&self) -> bool {
        match self {
            MetricType::Numeric | MetricType::Scale1To10 | MetricType::Boolean => true,
            MetricType::Text => false,
        }
    }
}

/// A user-defined metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackableItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub category: MetricCategory,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
}

/// A raw logged value as stored by the backing store.
///
/// Values arrive loosely typed; interpretation depends on the metric type
/// (see [`LogValue::coerce`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl LogValue {
    /// Convert to the numeric value used for aggregation.
    ///
    /// Booleans become 0/1, numeric and scale values pass through, text
    /// metrics never aggregate. Anything unparseable or non-finite is `None`.
    pub fn coerce(&self, metric_type: MetricType) -> Option<f64> {
        match metric_type {
            MetricType::Text => None,
            MetricType::Boolean => match self {
                LogValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
                LogValue::Number(n) if *n == 0.0 || *n == 1.0 => Some(*n),
                LogValue::Number(_) => None,
                LogValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "yes" | "1" => Some(1.0),
                    "false" | "no" | "0" => Some(0.0),
                    _ => None,
                },
            },
            MetricType::Numeric | MetricType::Scale1To10 => match self {
                LogValue::Number(n) => Some(*n).filter(|v| v.is_finite()),
                LogValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
                LogValue::Bool(_) => None,
            },
        }
    }
}

/// One recorded value for one item on one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub item_id: Uuid,
    pub date: NaiveDate,
    pub value: LogValue,
    pub created_at: DateTime<Utc>,
}

/// One day of a dual-metric chart as delivered by the data-fetch collaborator.
///
/// Every day in the requested range is present; missing logs are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub primary_value: Option<f64>,
    pub comparison_value: Option<f64>,
}
