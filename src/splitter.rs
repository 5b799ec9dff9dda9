//! Condition splitting
//!
//! Classifies each day as belonging to the positive ("high") or negative
//! ("low") condition of an experiment based on the independent variable's
//! value and its type-specific threshold rule.

use crate::aggregator::DailySeries;
use crate::types::MetricType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scale values at or above this count as the high condition
pub const SCALE_POSITIVE_THRESHOLD: f64 = 6.0;

/// Which group a day falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Positive,
    Negative,
}

/// The rule used to split days, reported alongside experiment results
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SplitBasis {
    /// true → positive, false → negative
    Boolean,
    /// value ≥ threshold → positive
    ScaleMidpoint { threshold: f64 },
    /// value ≥ an explicit, caller-supplied threshold → positive
    NumericThreshold { threshold: f64 },
    /// No rule applies; every day is left out of both groups
    Unsplit,
}

/// Splits independent-variable days into conditions
#[derive(Debug, Clone, Copy)]
pub struct ConditionSplitter {
    basis: SplitBasis,
}

impl ConditionSplitter {
    /// Pick the split rule for an independent variable of `metric_type`.
    ///
    /// NUMERIC variables only split when an explicit finite threshold is
    /// given; no median rule is inferred.
    pub fn for_type(metric_type: MetricType, numeric_threshold: Option<f64>) -> Self {
        let basis = match metric_type {
            MetricType::Boolean => SplitBasis::Boolean,
            MetricType::Scale1To10 => SplitBasis::ScaleMidpoint {
                threshold: SCALE_POSITIVE_THRESHOLD,
            },
            MetricType::Numeric => match numeric_threshold.filter(|t| t.is_finite()) {
                Some(threshold) => SplitBasis::NumericThreshold { threshold },
                None => SplitBasis::Unsplit,
            },
            MetricType::Text => SplitBasis::Unsplit,
        };
        Self { basis }
    }

    pub fn basis(&self) -> SplitBasis {
        self.basis
    }

    /// Classify a single day's independent value
    pub fn classify(&self, value: f64) -> Option<Condition> {
        if !value.is_finite() {
            return None;
        }
        match self.basis {
            SplitBasis::Boolean => {
                if value == 1.0 {
                    Some(Condition::Positive)
                } else if value == 0.0 {
                    Some(Condition::Negative)
                } else {
                    None
                }
            }
            SplitBasis::ScaleMidpoint { threshold } | SplitBasis::NumericThreshold { threshold } => {
                if value >= threshold {
                    Some(Condition::Positive)
                } else {
                    Some(Condition::Negative)
                }
            }
            SplitBasis::Unsplit => None,
        }
    }

    /// Classify every day present in `independent`.
    ///
    /// Days without a value are simply absent from the result.
    pub fn split(&self, independent: &DailySeries) -> BTreeMap<NaiveDate, Condition> {
        independent
            .iter()
            .filter_map(|(date, value)| self.classify(*value).map(|c| (*date, c)))
            .collect()
    }
}
