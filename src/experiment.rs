//! Experiments
//!
//! An experiment pairs an independent (input) metric with a dependent
//! (output) metric over an inclusive date range. This module owns the
//! experiment lifecycle and the on-demand results computation:
//! daily aggregation → condition split → group statistics → correlation.

use crate::aggregator::{DailyAggregator, DateWindow};
use crate::error::AnalysisError;
use crate::splitter::{Condition, ConditionSplitter, SplitBasis};
use crate::stats::{pearson_correlation, round_to, GroupStats};
use crate::types::{LogEntry, TrackableItem, UserContext};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Experiment lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExperimentStatus {
    Active,
    Completed,
}

/// User-supplied fields for a new experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentDraft {
    pub independent_item_id: Uuid,
    pub dependent_item_id: Uuid,
    pub hypothesis: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Split point for NUMERIC independent variables
    #[serde(default)]
    pub threshold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub independent_item_id: Uuid,
    pub dependent_item_id: Uuid,
    pub hypothesis: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ExperimentStatus,
    /// Split point for NUMERIC independent variables; without it such
    /// experiments report no condition groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

/// How far an experiment has run, relative to a reference day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperimentProgress {
    pub total_days: u32,
    pub days_elapsed: u32,
    pub days_remaining: u32,
    /// 0-100
    pub percent_complete: f64,
}

impl Experiment {
    /// Validate a draft and create an `ACTIVE` experiment owned by `ctx`.
    pub fn create(
        ctx: &UserContext,
        draft: ExperimentDraft,
        independent: &TrackableItem,
        dependent: &TrackableItem,
        today: NaiveDate,
    ) -> Result<Self, AnalysisError> {
        if independent.id != draft.independent_item_id {
            return Err(AnalysisError::UnknownItem(draft.independent_item_id.to_string()));
        }
        if dependent.id != draft.dependent_item_id {
            return Err(AnalysisError::UnknownItem(draft.dependent_item_id.to_string()));
        }
        ctx.ensure_owner(independent.user_id, "independent variable")?;
        ctx.ensure_owner(dependent.user_id, "dependent variable")?;

        if independent.id == dependent.id {
            return Err(AnalysisError::InvalidMetricRole(
                "independent and dependent variables must differ".to_string(),
            ));
        }
        if !independent.metric_type.is_valid_input() {
            return Err(AnalysisError::InvalidMetricRole(format!(
                "{} cannot be an independent variable",
                independent.metric_type.as_str()
            )));
        }
        if !dependent.metric_type.is_valid_output() {
            return Err(AnalysisError::InvalidMetricRole(format!(
                "{} cannot be a dependent variable",
                dependent.metric_type.as_str()
            )));
        }
        if draft.hypothesis.trim().is_empty() {
            return Err(AnalysisError::ParseError("hypothesis is required".to_string()));
        }
        if let Some(threshold) = draft.threshold {
            if !threshold.is_finite() {
                return Err(AnalysisError::ParseError(format!(
                    "threshold must be a finite number, got {threshold}"
                )));
            }
        }

        DateWindow::new(draft.start_date, draft.end_date)?;
        if draft.end_date < today {
            return Err(AnalysisError::InvalidDateRange(format!(
                "end date {} is already in the past",
                draft.end_date
            )));
        }

        let experiment = Self {
            id: Uuid::new_v4(),
            user_id: ctx.user_id,
            independent_item_id: draft.independent_item_id,
            dependent_item_id: draft.dependent_item_id,
            hypothesis: draft.hypothesis.trim().to_string(),
            start_date: draft.start_date,
            end_date: draft.end_date,
            status: ExperimentStatus::Active,
            threshold: draft.threshold,
        };
        info!(experiment = %experiment.id, "experiment created");
        Ok(experiment)
    }

    /// The experiment's date range, `None` if the stored dates are inverted
    pub fn window(&self) -> Option<DateWindow> {
        DateWindow::new(self.start_date, self.end_date).ok()
    }

    /// Complete an active experiment whose end date has passed.
    ///
    /// Returns whether the status changed.
    pub fn refresh_status(&mut self, today: NaiveDate) -> bool {
        match self.status {
            ExperimentStatus::Active if today > self.end_date => {
                self.status = ExperimentStatus::Completed;
                info!(experiment = %self.id, "experiment auto-completed");
                true
            }
            ExperimentStatus::Active | ExperimentStatus::Completed => false,
        }
    }

    /// Manually complete an active experiment
    pub fn complete(&mut self) -> Result<(), AnalysisError> {
        match self.status {
            ExperimentStatus::Active => {
                self.status = ExperimentStatus::Completed;
                Ok(())
            }
            ExperimentStatus::Completed => Err(AnalysisError::InvalidTransition(
                "experiment is already completed".to_string(),
            )),
        }
    }

    /// Move a completed experiment back to `ACTIVE`.
    ///
    /// `extend_to` replaces the end date. The resulting end date must not be
    /// in the past, otherwise the next status refresh would complete it again.
    pub fn reactivate(
        &mut self,
        today: NaiveDate,
        extend_to: Option<NaiveDate>,
    ) -> Result<(), AnalysisError> {
        if self.status != ExperimentStatus::Completed {
            return Err(AnalysisError::InvalidTransition(
                "only completed experiments can be reactivated".to_string(),
            ));
        }

        let end_date = extend_to.unwrap_or(self.end_date);
        DateWindow::new(self.start_date, end_date)?;
        if end_date < today {
            return Err(AnalysisError::InvalidTransition(format!(
                "end date {end_date} has passed; extend it to reactivate"
            )));
        }

        self.end_date = end_date;
        self.status = ExperimentStatus::Active;
        info!(experiment = %self.id, end_date = %end_date, "experiment reactivated");
        Ok(())
    }

    /// Progress through the date range as of `today`
    pub fn progress(&self, today: NaiveDate) -> ExperimentProgress {
        let Some(window) = self.window() else {
            return ExperimentProgress {
                total_days: 0,
                days_elapsed: 0,
                days_remaining: 0,
                percent_complete: 0.0,
            };
        };

        let total_days = window.len_days();
        let elapsed = ((today - window.start).num_days() + 1).clamp(0, i64::from(total_days));
        let days_elapsed = elapsed as u32;

        ExperimentProgress {
            total_days,
            days_elapsed,
            days_remaining: total_days - days_elapsed,
            percent_complete: round_to(f64::from(days_elapsed) / f64::from(total_days) * 100.0, 1),
        }
    }
}

/// Derived, never persisted summary of an experiment's data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResults {
    pub experiment_id: Uuid,
    pub split_basis: SplitBasis,
    pub positive_condition_average: Option<f64>,
    pub positive_condition_count: u32,
    pub negative_condition_average: Option<f64>,
    pub negative_condition_count: u32,
    /// Calendar days in the experiment range
    pub total_days: u32,
    /// Days where both variables have a value
    pub days_with_data: u32,
    /// Pearson r over paired days; `None` means insufficient data
    pub correlation: Option<f64>,
    /// Positive minus negative average, when both exist
    pub difference: Option<f64>,
}

/// Like [`compute_experiment_results`], but fails when `independent` or
/// `dependent` is not the item the experiment refers to.
pub fn try_compute_experiment_results(
    experiment: &Experiment,
    independent: &TrackableItem,
    dependent: &TrackableItem,
    entries: &[LogEntry],
) -> Result<ExperimentResults, AnalysisError> {
    if independent.id != experiment.independent_item_id {
        return Err(AnalysisError::UnknownItem(format!(
            "{} is not the independent variable of experiment {}",
            independent.id, experiment.id
        )));
    }
    if dependent.id != experiment.dependent_item_id {
        return Err(AnalysisError::UnknownItem(format!(
            "{} is not the dependent variable of experiment {}",
            dependent.id, experiment.id
        )));
    }
    Ok(compute_experiment_results(
        experiment,
        independent,
        dependent,
        entries,
    ))
}

/// Compute results for `experiment` from the raw log entries.
///
/// `independent` and `dependent` are the experiment's two items. Entries
/// outside the experiment range or for other items are ignored. This never
/// fails: missing data shows up as `None` averages and correlation.
pub fn compute_experiment_results(
    experiment: &Experiment,
    independent: &TrackableItem,
    dependent: &TrackableItem,
    entries: &[LogEntry],
) -> ExperimentResults {
    debug_assert_eq!(independent.id, experiment.independent_item_id);
    debug_assert_eq!(dependent.id, experiment.dependent_item_id);

    let splitter = ConditionSplitter::for_type(independent.metric_type, experiment.threshold);

    let Some(window) = experiment.window() else {
        return ExperimentResults {
            experiment_id: experiment.id,
            split_basis: splitter.basis(),
            positive_condition_average: None,
            positive_condition_count: 0,
            negative_condition_average: None,
            negative_condition_count: 0,
            total_days: 0,
            days_with_data: 0,
            correlation: None,
            difference: None,
        };
    };

    let independent_days = DailyAggregator::aggregate(independent, entries, Some(&window));
    let dependent_days = DailyAggregator::aggregate(dependent, entries, Some(&window));

    let mut positive = Vec::new();
    let mut negative = Vec::new();
    for (date, condition) in splitter.split(&independent_days) {
        if let Some(value) = dependent_days.get(&date) {
            match condition {
                Condition::Positive => positive.push(*value),
                Condition::Negative => negative.push(*value),
            }
        }
    }

    let (xs, ys): (Vec<f64>, Vec<f64>) = independent_days
        .iter()
        .filter_map(|(date, x)| dependent_days.get(date).map(|y| (*x, *y)))
        .unzip();

    let positive_stats = GroupStats::from_values(&positive);
    let negative_stats = GroupStats::from_values(&negative);
    let correlation = pearson_correlation(&xs, &ys);

    let difference = match (positive_stats.average, negative_stats.average) {
        (Some(p), Some(n)) => Some(round_to(p - n, 1)),
        _ => None,
    };

    debug!(
        experiment = %experiment.id,
        paired_days = xs.len(),
        positive = positive_stats.count,
        negative = negative_stats.count,
        "computed experiment results"
    );

    ExperimentResults {
        experiment_id: experiment.id,
        split_basis: splitter.basis(),
        positive_condition_average: positive_stats.average,
        positive_condition_count: positive_stats.count,
        negative_condition_average: negative_stats.average,
        negative_condition_count: negative_stats.count,
        total_days: window.len_days(),
        days_with_data: xs.len() as u32,
        correlation,
        difference,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LogValue, MetricCategory, MetricType};
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, n).unwrap()
    }

    fn make_item(user_id: Uuid, category: MetricCategory, metric_type: MetricType) -> TrackableItem {
        TrackableItem {
            id: Uuid::new_v4(),
            user_id,
            name: format!("{metric_type:?}"),
            category,
            metric_type,
        }
    }

    fn log(item: &TrackableItem, date: NaiveDate, value: LogValue) -> LogEntry {
        LogEntry {
            id: Uuid::new_v4(),
            user_id: item.user_id,
            item_id: item.id,
            date,
            value,
            created_at: Utc.from_utc_datetime(&date.and_hms_opt(20, 0, 0).unwrap()),
        }
    }

    fn make_experiment(
        independent: &TrackableItem,
        dependent: &TrackableItem,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Experiment {
        Experiment {
            id: Uuid::new_v4(),
            user_id: independent.user_id,
            independent_item_id: independent.id,
            dependent_item_id: dependent.id,
            hypothesis: "meditation improves mood".to_string(),
            start_date: start,
            end_date: end,
            status: ExperimentStatus::Active,
            threshold: None,
        }
    }

    /// 5 true days with high output, 5 false days with low output
    fn boolean_scenario() -> (Experiment, TrackableItem, TrackableItem, Vec<LogEntry>) {
        let user = Uuid::new_v4();
        let meditated = make_item(user, MetricCategory::Input, MetricType::Boolean);
        let mood = make_item(user, MetricCategory::Output, MetricType::Scale1To10);

        let highs = [8.0, 7.0, 9.0, 6.0, 8.0];
        let lows = [3.0, 4.0, 2.0, 5.0, 3.0];

        let mut entries = Vec::new();
        for (i, value) in highs.iter().enumerate() {
            let date = day(1 + i as u32);
            entries.push(log(&meditated, date, LogValue::Bool(true)));
            entries.push(log(&mood, date, LogValue::Number(*value)));
        }
        for (i, value) in lows.iter().enumerate() {
            let date = day(6 + i as u32);
            entries.push(log(&meditated, date, LogValue::Bool(false)));
            entries.push(log(&mood, date, LogValue::Number(*value)));
        }

        let experiment = make_experiment(&meditated, &mood, day(1), day(10));
        (experiment, meditated, mood, entries)
    }

    #[test]
    fn test_boolean_experiment_end_to_end() {
        let (experiment, meditated, mood, entries) = boolean_scenario();
        let results = compute_experiment_results(&experiment, &meditated, &mood, &entries);

        assert_eq!(results.positive_condition_average, Some(7.6));
        assert_eq!(results.negative_condition_average, Some(3.4));
        assert_eq!(results.positive_condition_count, 5);
        assert_eq!(results.negative_condition_count, 5);
        assert_eq!(results.total_days, 10);
        assert_eq!(results.days_with_data, 10);
        assert_eq!(results.difference, Some(4.2));
        assert_eq!(results.split_basis, SplitBasis::Boolean);

        let r = results.correlation.unwrap();
        assert!(r > 0.0 && r <= 1.0);
    }

    #[test]
    fn test_results_are_deterministic() {
        let (experiment, meditated, mood, mut entries) = boolean_scenario();
        let first = compute_experiment_results(&experiment, &meditated, &mood, &entries);
        let second = compute_experiment_results(&experiment, &meditated, &mood, &entries);
        assert_eq!(first, second);

        entries.reverse();
        let reversed = compute_experiment_results(&experiment, &meditated, &mood, &entries);
        assert_eq!(first, reversed);
    }

    #[test]
    fn test_empty_group_is_null_not_zero() {
        let user = Uuid::new_v4();
        let sleep = make_item(user, MetricCategory::Input, MetricType::Scale1To10);
        let energy = make_item(user, MetricCategory::Output, MetricType::Numeric);

        // Every independent value is low, so the positive group is empty
        let entries: Vec<LogEntry> = (1..=4)
            .flat_map(|n| {
                vec![
                    log(&sleep, day(n), LogValue::Number(3.0)),
                    log(&energy, day(n), LogValue::Number(f64::from(n))),
                ]
            })
            .collect();
        let experiment = make_experiment(&sleep, &energy, day(1), day(7));

        let results = compute_experiment_results(&experiment, &sleep, &energy, &entries);
        assert_eq!(results.positive_condition_average, None);
        assert_eq!(results.positive_condition_count, 0);
        assert_eq!(results.negative_condition_average, Some(2.5));
        assert_eq!(results.negative_condition_count, 4);
        assert_eq!(results.difference, None);
        // Constant independent values have no variance
        assert_eq!(results.correlation, None);
        assert_eq!(results.total_days, 7);
    }

    #[test]
    fn test_days_without_independent_value_are_excluded() {
        let (experiment, meditated, mood, mut entries) = boolean_scenario();
        // Mood logged on a day with no meditation log
        let extra_day = day(10) - Duration::days(12);
        entries.push(log(&mood, extra_day, LogValue::Number(10.0)));
        let mut wide = experiment.clone();
        wide.start_date = extra_day;

        let results = compute_experiment_results(&wide, &meditated, &mood, &entries);
        assert_eq!(results.positive_condition_count + results.negative_condition_count, 10);
        assert_eq!(results.days_with_data, 10);
    }

    #[test]
    fn test_numeric_without_threshold_is_unsplit() {
        let user = Uuid::new_v4();
        let steps = make_item(user, MetricCategory::Input, MetricType::Numeric);
        let mood = make_item(user, MetricCategory::Output, MetricType::Scale1To10);
        let entries = vec![
            log(&steps, day(1), LogValue::Number(4000.0)),
            log(&mood, day(1), LogValue::Number(4.0)),
            log(&steps, day(2), LogValue::Number(12000.0)),
            log(&mood, day(2), LogValue::Number(8.0)),
        ];
        let mut experiment = make_experiment(&steps, &mood, day(1), day(2));

        let results = compute_experiment_results(&experiment, &steps, &mood, &entries);
        assert_eq!(results.split_basis, SplitBasis::Unsplit);
        assert_eq!(results.positive_condition_count, 0);
        assert_eq!(results.negative_condition_count, 0);
        // Correlation does not depend on the split
        assert_eq!(results.correlation, Some(1.0));

        experiment.threshold = Some(10000.0);
        let results = compute_experiment_results(&experiment, &steps, &mood, &entries);
        assert_eq!(results.positive_condition_average, Some(8.0));
        assert_eq!(results.negative_condition_average, Some(4.0));
    }

    #[test]
    fn test_entries_outside_range_are_ignored() {
        let (mut experiment, meditated, mood, entries) = boolean_scenario();
        experiment.end_date = day(5);

        let results = compute_experiment_results(&experiment, &meditated, &mood, &entries);
        assert_eq!(results.positive_condition_count, 5);
        assert_eq!(results.negative_condition_count, 0);
        assert_eq!(results.total_days, 5);
        // All independent values are true: zero variance
        assert_eq!(results.correlation, None);
    }

    #[test]
    fn test_create_validates_roles_and_dates() {
        let user = Uuid::new_v4();
        let ctx = UserContext::new(user);
        let input = make_item(user, MetricCategory::Input, MetricType::Boolean);
        let output = make_item(user, MetricCategory::Output, MetricType::Scale1To10);
        let draft = ExperimentDraft {
            independent_item_id: input.id,
            dependent_item_id: output.id,
            hypothesis: "  walking helps  ".to_string(),
            start_date: day(5),
            end_date: day(20),
            threshold: None,
        };

        let experiment = Experiment::create(&ctx, draft.clone(), &input, &output, day(3)).unwrap();
        assert_eq!(experiment.status, ExperimentStatus::Active);
        assert_eq!(experiment.hypothesis, "walking helps");
        assert_eq!(experiment.user_id, user);

        // Boolean outputs are not allowed
        let swapped = ExperimentDraft {
            independent_item_id: output.id,
            dependent_item_id: input.id,
            ..draft.clone()
        };
        let err = Experiment::create(&ctx, swapped, &output, &input, day(3)).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidMetricRole(_)));

        // Already over
        let err = Experiment::create(&ctx, draft.clone(), &input, &output, day(21)).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidDateRange(_)));

        // Inverted range
        let inverted = ExperimentDraft {
            start_date: day(20),
            end_date: day(5),
            ..draft.clone()
        };
        let err = Experiment::create(&ctx, inverted, &input, &output, day(1)).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidDateRange(_)));

        // Someone else's items
        let stranger = UserContext::new(Uuid::new_v4());
        let err = Experiment::create(&stranger, draft, &input, &output, day(3)).unwrap_err();
        assert!(matches!(err, AnalysisError::NotOwner(_)));
    }

    #[test]
    fn test_non_finite_threshold_rejected() {
        let user = Uuid::new_v4();
        let ctx = UserContext::new(user);
        let steps = make_item(user, MetricCategory::Input, MetricType::Numeric);
        let mood = make_item(user, MetricCategory::Output, MetricType::Scale1To10);
        let draft = ExperimentDraft {
            independent_item_id: steps.id,
            dependent_item_id: mood.id,
            hypothesis: "walking more helps".to_string(),
            start_date: day(1),
            end_date: day(10),
            threshold: Some(8000.0),
        };
        assert!(Experiment::create(&ctx, draft.clone(), &steps, &mood, day(1)).is_ok());

        for threshold in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let bad = ExperimentDraft {
                threshold: Some(threshold),
                ..draft.clone()
            };
            let err = Experiment::create(&ctx, bad, &steps, &mood, day(1)).unwrap_err();
            assert!(matches!(err, AnalysisError::ParseError(_)));
        }
    }

    #[test]
    fn test_checked_results_reject_mismatched_items() {
        let (experiment, independent, dependent, entries) = boolean_scenario();

        let checked =
            try_compute_experiment_results(&experiment, &independent, &dependent, &entries).unwrap();
        assert_eq!(
            checked,
            compute_experiment_results(&experiment, &independent, &dependent, &entries)
        );

        let err = try_compute_experiment_results(&experiment, &dependent, &independent, &entries)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownItem(_)));

        let other = make_item(experiment.user_id, MetricCategory::Output, MetricType::Numeric);
        let err =
            try_compute_experiment_results(&experiment, &independent, &other, &entries).unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownItem(_)));
    }

    #[test]
    fn test_text_metrics_cannot_join_experiments() {
        let user = Uuid::new_v4();
        let ctx = UserContext::new(user);
        let notes = make_item(user, MetricCategory::Input, MetricType::Text);
        let mood = make_item(user, MetricCategory::Output, MetricType::Scale1To10);
        let draft = ExperimentDraft {
            independent_item_id: notes.id,
            dependent_item_id: mood.id,
            hypothesis: "journaling".to_string(),
            start_date: day(1),
            end_date: day(10),
            threshold: None,
        };

        let err = Experiment::create(&ctx, draft, &notes, &mood, day(1)).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidMetricRole(_)));
    }

    #[test]
    fn test_lifecycle_transitions() {
        let (mut experiment, _, _, _) = boolean_scenario();

        // Not over yet
        assert!(!experiment.refresh_status(day(10)));
        assert_eq!(experiment.status, ExperimentStatus::Active);

        // End date passed
        assert!(experiment.refresh_status(day(11)));
        assert_eq!(experiment.status, ExperimentStatus::Completed);
        assert!(!experiment.refresh_status(day(12)));

        assert!(matches!(
            experiment.complete(),
            Err(AnalysisError::InvalidTransition(_))
        ));

        // Cannot reactivate without moving the end date forward
        assert!(experiment.reactivate(day(12), None).is_err());
        assert_eq!(experiment.status, ExperimentStatus::Completed);

        experiment.reactivate(day(12), Some(day(20))).unwrap();
        assert_eq!(experiment.status, ExperimentStatus::Active);
        assert_eq!(experiment.end_date, day(20));

        assert!(matches!(
            experiment.reactivate(day(12), None),
            Err(AnalysisError::InvalidTransition(_))
        ));

        experiment.complete().unwrap();
        assert_eq!(experiment.status, ExperimentStatus::Completed);
    }

    #[test]
    fn test_progress() {
        let (experiment, _, _, _) = boolean_scenario();

        let before = experiment.progress(day(1) - Duration::days(3));
        assert_eq!(before.days_elapsed, 0);
        assert_eq!(before.days_remaining, 10);

        let midway = experiment.progress(day(5));
        assert_eq!(midway.days_elapsed, 5);
        assert_eq!(midway.percent_complete, 50.0);

        let after = experiment.progress(day(25));
        assert_eq!(after.days_elapsed, 10);
        assert_eq!(after.days_remaining, 0);
        assert_eq!(after.percent_complete, 100.0);
    }

    #[test]
    fn test_status_wire_format() {
        let (experiment, _, _, _) = boolean_scenario();
        let json = serde_json::to_value(&experiment).unwrap();
        assert_eq!(json["status"], "ACTIVE");
        assert!(json.get("threshold").is_none());
    }
}
