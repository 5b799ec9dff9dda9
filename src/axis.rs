//! Dual-axis synchronization
//!
//! Derives the left/right axis domains, tick labelling and optional value
//! remapping for a chart that plots a primary (output) metric against an
//! optional comparison (input) metric.
//!
//! The right-hand side is selected from a fixed decision table over the two
//! metric types:
//!
//! | primary      | comparison   | scenario               |
//! |--------------|--------------|------------------------|
//! | any          | none         | `SINGLE`               |
//! | `SCALE_1_10` | `BOOLEAN`    | `SCALE_WITH_BOOLEAN`   |
//! | `NUMERIC`    | `BOOLEAN`    | `NUMERIC_WITH_BOOLEAN` |
//! | `SCALE_1_10` | `SCALE_1_10` | `SHARED_SCALE`         |
//! | `NUMERIC`    | `SCALE_1_10` | `NUMERIC_WITH_SCALE`   |
//! | anything else              || `DEFAULT`              |

use crate::types::MetricType;
use serde::{Deserialize, Serialize};

/// Headroom applied above the observed maximum of an open-ended axis
pub const DOMAIN_HEADROOM: f64 = 1.1;

/// Where a boolean `true` lands when drawn on a 1-10 scale
pub const BOOLEAN_TRUE_ON_SCALE: f64 = 7.5;

/// Where a boolean `false` lands when drawn on a 1-10 scale
pub const BOOLEAN_FALSE_ON_SCALE: f64 = 2.5;

/// Inclusive numeric range of an axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisDomain {
    pub min: f64,
    pub max: f64,
}

impl AxisDomain {
    pub const SCALE: AxisDomain = AxisDomain { min: 1.0, max: 10.0 };
    pub const BOOLEAN: AxisDomain = AxisDomain { min: 0.0, max: 1.0 };
    /// Fallback when a series has no observed values
    pub const EMPTY: AxisDomain = AxisDomain { min: 0.0, max: 10.0 };

    /// Domain for a series of `metric_type` whose largest value is `observed_max`
    pub fn for_values(metric_type: MetricType, observed_max: Option<f64>) -> Self {
        match metric_type {
            MetricType::Scale1To10 => Self::SCALE,
            MetricType::Numeric | MetricType::Boolean | MetricType::Text => {
                match observed_max.filter(|m| m.is_finite()) {
                    Some(max) => AxisDomain {
                        min: 0.0,
                        max: (max * DOMAIN_HEADROOM).max(1.0),
                    },
                    None => Self::EMPTY,
                }
            }
        }
    }
}

/// Named chart layouts from the decision table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChartScenario {
    Single,
    ScaleWithBoolean,
    NumericWithBoolean,
    SharedScale,
    NumericWithScale,
    Default,
}

impl ChartScenario {
    /// Pure lookup in the decision table
    pub fn select(primary: MetricType, comparison: Option<MetricType>) -> Self {
        use MetricType::{Boolean, Numeric, Scale1To10, Text};

        match (primary, comparison) {
            (_, None) => ChartScenario::Single,
            (Scale1To10, Some(Boolean)) => ChartScenario::ScaleWithBoolean,
            (Numeric, Some(Boolean)) => ChartScenario::NumericWithBoolean,
            (Scale1To10, Some(Scale1To10)) => ChartScenario::SharedScale,
            (Numeric, Some(Scale1To10)) => ChartScenario::NumericWithScale,
            (Numeric | Scale1To10 | Boolean | Text, Some(Numeric | Scale1To10 | Boolean | Text)) => {
                ChartScenario::Default
            }
        }
    }
}

/// How tick values are turned back into human labels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TickFormat {
    Plain,
    /// Values nearer `yes_at` read "Yes", values nearer `no_at` read "No"
    YesNo { yes_at: f64, no_at: f64 },
}

impl TickFormat {
    pub fn label(&self, value: f64) -> String {
        match self {
            TickFormat::Plain => {
                if value.fract() == 0.0 {
                    format!("{value:.0}")
                } else {
                    format!("{value:.1}")
                }
            }
            TickFormat::YesNo { yes_at, no_at } => {
                if (value - yes_at).abs() <= (value - no_at).abs() {
                    "Yes".to_string()
                } else {
                    "No".to_string()
                }
            }
        }
    }
}

/// Pre-transformation applied to comparison values before charting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueTransform {
    Identity,
    /// 1 → `true_value`, 0 → `false_value`
    BooleanToScale { true_value: f64, false_value: f64 },
}

impl ValueTransform {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            ValueTransform::Identity => value,
            ValueTransform::BooleanToScale {
                true_value,
                false_value,
            } => {
                if value >= 0.5 {
                    *true_value
                } else {
                    *false_value
                }
            }
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, ValueTransform::Identity)
    }
}

/// One vertical axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSide {
    pub domain: AxisDomain,
    /// Explicit tick positions; `None` lets the renderer choose
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticks: Option<Vec<f64>>,
    pub format: TickFormat,
}

impl AxisSide {
    fn plain(domain: AxisDomain) -> Self {
        Self {
            domain,
            ticks: None,
            format: TickFormat::Plain,
        }
    }

    /// Labels for the explicit ticks, if any
    pub fn tick_labels(&self) -> Option<Vec<String>> {
        self.ticks
            .as_ref()
            .map(|ticks| ticks.iter().map(|t| self.format.label(*t)).collect())
    }
}

/// Complete axis layout for a dual-metric chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub scenario: ChartScenario,
    pub left: AxisSide,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<AxisSide>,
    pub comparison_transform: ValueTransform,
}

impl AxisConfig {
    /// Build the layout from the two metric types and each series' maximum.
    ///
    /// Maxima are `None` when a series has no observed values.
    pub fn for_types(
        primary: MetricType,
        comparison: Option<MetricType>,
        primary_max: Option<f64>,
        comparison_max: Option<f64>,
    ) -> Self {
        let scenario = ChartScenario::select(primary, comparison);
        let left = AxisSide::plain(AxisDomain::for_values(primary, primary_max));

        let (right, comparison_transform) = match scenario {
            ChartScenario::Single => (None, ValueTransform::Identity),
            ChartScenario::ScaleWithBoolean => (
                Some(AxisSide {
                    domain: AxisDomain::SCALE,
                    ticks: Some(vec![BOOLEAN_FALSE_ON_SCALE, BOOLEAN_TRUE_ON_SCALE]),
                    format: TickFormat::YesNo {
                        yes_at: BOOLEAN_TRUE_ON_SCALE,
                        no_at: BOOLEAN_FALSE_ON_SCALE,
                    },
                }),
                ValueTransform::BooleanToScale {
                    true_value: BOOLEAN_TRUE_ON_SCALE,
                    false_value: BOOLEAN_FALSE_ON_SCALE,
                },
            ),
            ChartScenario::NumericWithBoolean => (
                Some(AxisSide {
                    domain: AxisDomain::BOOLEAN,
                    ticks: Some(vec![0.0, 1.0]),
                    format: TickFormat::YesNo {
                        yes_at: 1.0,
                        no_at: 0.0,
                    },
                }),
                ValueTransform::Identity,
            ),
            ChartScenario::SharedScale | ChartScenario::NumericWithScale => (
                Some(AxisSide::plain(AxisDomain::SCALE)),
                ValueTransform::Identity,
            ),
            ChartScenario::Default => {
                // Single is handled above, so a comparison type exists here
                let domain = comparison
                    .map(|t| AxisDomain::for_values(t, comparison_max))
                    .unwrap_or(AxisDomain::EMPTY);
                (Some(AxisSide::plain(domain)), ValueTransform::Identity)
            }
        };

        Self {
            scenario,
            left,
            right,
            comparison_transform,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scale_with_boolean() {
        let config = AxisConfig::for_types(
            MetricType::Scale1To10,
            Some(MetricType::Boolean),
            Some(9.0),
            Some(1.0),
        );

        assert_eq!(config.scenario, ChartScenario::ScaleWithBoolean);
        assert_eq!(config.left.domain, AxisDomain::SCALE);

        let right = config.right.as_ref().unwrap();
        assert_eq!(right.ticks, Some(vec![2.5, 7.5]));
        assert_eq!(
            right.tick_labels(),
            Some(vec!["No".to_string(), "Yes".to_string()])
        );

        assert_eq!(config.comparison_transform.apply(1.0), 7.5);
        assert_eq!(config.comparison_transform.apply(0.0), 2.5);
        assert!(!config.comparison_transform.is_identity());
    }

    #[test]
    fn test_numeric_with_boolean() {
        let config = AxisConfig::for_types(
            MetricType::Numeric,
            Some(MetricType::Boolean),
            Some(50.0),
            Some(1.0),
        );

        assert_eq!(config.scenario, ChartScenario::NumericWithBoolean);
        assert_eq!(config.left.domain.min, 0.0);
        assert!((config.left.domain.max - 55.0).abs() < 1e-9);
        let right = config.right.unwrap();
        assert_eq!(right.domain, AxisDomain::BOOLEAN);
        assert_eq!(right.format.label(1.0), "Yes");
        assert_eq!(right.format.label(0.0), "No");
        assert!(config.comparison_transform.is_identity());
    }

    #[test]
    fn test_shared_and_mixed_scales() {
        let shared = AxisConfig::for_types(
            MetricType::Scale1To10,
            Some(MetricType::Scale1To10),
            None,
            None,
        );
        assert_eq!(shared.scenario, ChartScenario::SharedScale);
        assert_eq!(shared.right.unwrap().domain, AxisDomain::SCALE);

        let mixed = AxisConfig::for_types(
            MetricType::Numeric,
            Some(MetricType::Scale1To10),
            Some(3.0),
            Some(8.0),
        );
        assert_eq!(mixed.scenario, ChartScenario::NumericWithScale);
        assert_eq!(mixed.right.unwrap().domain, AxisDomain::SCALE);
    }

    #[test]
    fn test_default_scenario_for_other_pairs() {
        let config = AxisConfig::for_types(
            MetricType::Scale1To10,
            Some(MetricType::Numeric),
            Some(7.0),
            Some(20.0),
        );
        assert_eq!(config.scenario, ChartScenario::Default);
        let right = config.right.unwrap();
        assert!((right.domain.max - 22.0).abs() < 1e-9);
        assert_eq!(right.format, TickFormat::Plain);

        // Unusual combinations still fall back rather than fail
        assert_eq!(
            ChartScenario::select(MetricType::Text, Some(MetricType::Boolean)),
            ChartScenario::Default
        );
        assert_eq!(
            ChartScenario::select(MetricType::Boolean, Some(MetricType::Scale1To10)),
            ChartScenario::Default
        );
    }

    #[test]
    fn test_single_metric_has_no_right_axis() {
        let config = AxisConfig::for_types(MetricType::Numeric, None, Some(4.0), None);
        assert_eq!(config.scenario, ChartScenario::Single);
        assert!(config.right.is_none());
    }

    #[test]
    fn test_domain_rules() {
        assert_eq!(
            AxisDomain::for_values(MetricType::Scale1To10, Some(3.0)),
            AxisDomain::SCALE
        );
        assert_eq!(
            AxisDomain::for_values(MetricType::Numeric, None),
            AxisDomain::EMPTY
        );
        // Tiny maxima still get a unit-high axis
        assert_eq!(
            AxisDomain::for_values(MetricType::Numeric, Some(0.2)),
            AxisDomain { min: 0.0, max: 1.0 }
        );
        assert_eq!(
            AxisDomain::for_values(MetricType::Numeric, Some(f64::NAN)),
            AxisDomain::EMPTY
        );
    }

    #[test]
    fn test_selection_is_idempotent() {
        let a = AxisConfig::for_types(
            MetricType::Scale1To10,
            Some(MetricType::Boolean),
            Some(8.0),
            Some(1.0),
        );
        let b = AxisConfig::for_types(
            MetricType::Scale1To10,
            Some(MetricType::Boolean),
            Some(8.0),
            Some(1.0),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_plain_labels() {
        assert_eq!(TickFormat::Plain.label(5.0), "5");
        assert_eq!(TickFormat::Plain.label(2.5), "2.5");
    }

    #[test]
    fn test_config_serialization() {
        let config = AxisConfig::for_types(
            MetricType::Scale1To10,
            Some(MetricType::Boolean),
            None,
            None,
        );
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["scenario"], "SCALE_WITH_BOOLEAN");
        assert_eq!(json["right"]["format"]["kind"], "YES_NO");
        assert_eq!(json["comparison_transform"]["kind"], "BOOLEAN_TO_SCALE");
    }
}
