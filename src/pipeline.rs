//! Pipeline orchestration
//!
//! This module provides the public API for Tracklab. The stateless functions
//! take a JSON [`Dataset`] document and return JSON results; the
//! [`InsightProcessor`] keeps a dataset, a memoized chart session and the
//! vote ledger across calls.

use crate::config::Settings;
use crate::error::AnalysisError;
use crate::experiment::{
    try_compute_experiment_results, Experiment, ExperimentDraft, ExperimentResults,
};
use crate::findings::{community_feed, Finding, FindingDraft, VoteLedger, VoteOutcome, VoteType};
use crate::series::{
    compute_dual_metric_series, ChartSession, DualMetricSeries, MemoryLogStore, Selection,
    SeriesSource, DEFAULT_MAX_WINDOW_DAYS,
};
use crate::types::{LogEntry, TrackableItem, UserContext};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Everything one user has tracked, as exchanged with the backing store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub user_id: Uuid,
    #[serde(default)]
    pub items: Vec<TrackableItem>,
    #[serde(default)]
    pub entries: Vec<LogEntry>,
    #[serde(default)]
    pub experiments: Vec<Experiment>,
}

impl Dataset {
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        serde_json::from_str(json).map_err(|e| AnalysisError::ParseError(e.to_string()))
    }

    /// The dataset owner as the acting user
    pub fn context(&self) -> UserContext {
        UserContext::new(self.user_id)
    }
}

/// Compute results for one experiment of a dataset.
///
/// # Example
/// ```ignore
/// let results = experiment_results_json(dataset_json, "4f9c…")?;
/// ```
pub fn experiment_results_json(
    dataset_json: &str,
    experiment_id: &str,
) -> Result<String, AnalysisError> {
    let dataset = Dataset::from_json(dataset_json)?;
    let experiment_id = parse_id(experiment_id)?;
    let ctx = dataset.context();
    let store = MemoryLogStore::new(dataset.items, dataset.entries);

    let experiment = find_experiment(&dataset.experiments, &ctx, experiment_id)?;
    let results = results_for(&ctx, &store, experiment)?;
    Ok(serde_json::to_string(&results)?)
}

/// Compute results for every experiment in a dataset, in document order
pub fn all_experiment_results_json(dataset_json: &str) -> Result<String, AnalysisError> {
    let dataset = Dataset::from_json(dataset_json)?;
    let ctx = dataset.context();
    let store = MemoryLogStore::new(dataset.items, dataset.entries);

    let results = dataset
        .experiments
        .iter()
        .map(|experiment| {
            ctx.ensure_owner(experiment.user_id, "experiment")?;
            results_for(&ctx, &store, experiment)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(serde_json::to_string(&results)?)
}

/// Build a dual-metric chart series for a selection over a dataset.
///
/// `selection_json` is a [`Selection`] document. Selections longer than
/// [`DEFAULT_MAX_WINDOW_DAYS`] are rejected.
pub fn dual_series_json(dataset_json: &str, selection_json: &str) -> Result<String, AnalysisError> {
    dual_series_json_with_limit(dataset_json, selection_json, DEFAULT_MAX_WINDOW_DAYS)
}

/// [`dual_series_json`] with an explicit limit on the selection length
pub fn dual_series_json_with_limit(
    dataset_json: &str,
    selection_json: &str,
    max_window_days: u32,
) -> Result<String, AnalysisError> {
    let dataset = Dataset::from_json(dataset_json)?;
    let selection: Selection = serde_json::from_str(selection_json)
        .map_err(|e| AnalysisError::ParseError(e.to_string()))?;
    let ctx = dataset.context();
    let store = MemoryLogStore::new(dataset.items, dataset.entries)
        .with_max_window_days(max_window_days);

    let fetched = store.fetch_series(&ctx, &selection)?;
    let series = compute_dual_metric_series(
        &fetched.primary,
        fetched.comparison.as_ref(),
        &fetched.records,
    );
    Ok(serde_json::to_string(&series)?)
}

fn parse_id(raw: &str) -> Result<Uuid, AnalysisError> {
    Uuid::parse_str(raw.trim())
        .map_err(|e| AnalysisError::ParseError(format!("invalid id '{raw}': {e}")))
}

fn find_experiment<'a>(
    experiments: &'a [Experiment],
    ctx: &UserContext,
    id: Uuid,
) -> Result<&'a Experiment, AnalysisError> {
    let experiment = experiments
        .iter()
        .find(|e| e.id == id)
        .ok_or_else(|| AnalysisError::UnknownExperiment(id.to_string()))?;
    ctx.ensure_owner(experiment.user_id, "experiment")?;
    Ok(experiment)
}

fn results_for(
    ctx: &UserContext,
    store: &MemoryLogStore,
    experiment: &Experiment,
) -> Result<ExperimentResults, AnalysisError> {
    let independent = store.item(ctx, experiment.independent_item_id)?;
    let dependent = store.item(ctx, experiment.dependent_item_id)?;
    try_compute_experiment_results(experiment, independent, dependent, store.entries())
}

/// Stateful processor for interactive use.
///
/// Keeps one user's dataset, the chart memo cache and the community vote
/// ledger. New log entries invalidate the chart cache.
#[derive(Debug)]
pub struct InsightProcessor {
    store: MemoryLogStore,
    experiments: Vec<Experiment>,
    session: ChartSession,
    ledger: VoteLedger,
    findings: Vec<Finding>,
    max_window_days: u32,
}

impl Default for InsightProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightProcessor {
    /// Create a new processor with default settings
    pub fn new() -> Self {
        Self::with_settings(&Settings::default())
    }

    pub fn with_settings(settings: &Settings) -> Self {
        Self {
            store: MemoryLogStore::default().with_max_window_days(settings.max_window_days),
            experiments: Vec::new(),
            session: ChartSession::new(settings.chart_cache_capacity),
            ledger: VoteLedger::new(settings.report_threshold),
            findings: Vec::new(),
            max_window_days: settings.max_window_days,
        }
    }

    /// Replace the tracked data
    pub fn load_dataset(&mut self, dataset: Dataset) {
        info!(
            items = dataset.items.len(),
            entries = dataset.entries.len(),
            experiments = dataset.experiments.len(),
            "dataset loaded"
        );
        self.store = MemoryLogStore::new(dataset.items, dataset.entries)
            .with_max_window_days(self.max_window_days);
        self.experiments = dataset.experiments;
        self.session.invalidate();
    }

    /// Record a new log entry for one of the current user's items
    pub fn log_entry(&mut self, ctx: &UserContext, entry: LogEntry) -> Result<(), AnalysisError> {
        ctx.ensure_owner(entry.user_id, "log entry")?;
        self.store.item(ctx, entry.item_id)?;
        self.store.push_entry(entry);
        self.session.invalidate();
        Ok(())
    }

    /// Chart a selection, served from the memo cache when possible
    pub fn chart(
        &mut self,
        ctx: &UserContext,
        selection: Selection,
    ) -> Result<DualMetricSeries, AnalysisError> {
        self.session.load(ctx, &self.store, selection)
    }

    /// Create an experiment over two of the current user's items.
    ///
    /// Both items must exist in the loaded dataset; ownership, roles and
    /// dates are checked by [`Experiment::create`].
    pub fn create_experiment(
        &mut self,
        ctx: &UserContext,
        draft: ExperimentDraft,
        today: NaiveDate,
    ) -> Result<Experiment, AnalysisError> {
        let independent = self.store.item(ctx, draft.independent_item_id)?;
        let dependent = self.store.item(ctx, draft.dependent_item_id)?;
        let experiment = Experiment::create(ctx, draft, independent, dependent, today)?;
        self.experiments.push(experiment.clone());
        Ok(experiment)
    }

    pub fn experiments(&self) -> &[Experiment] {
        &self.experiments
    }

    pub fn experiment_results(
        &self,
        ctx: &UserContext,
        experiment_id: Uuid,
    ) -> Result<ExperimentResults, AnalysisError> {
        let experiment = find_experiment(&self.experiments, ctx, experiment_id)?;
        results_for(ctx, &self.store, experiment)
    }

    /// Complete every active experiment whose end date has passed.
    ///
    /// Returns the number of experiments that changed status.
    pub fn refresh_experiments(&mut self, today: NaiveDate) -> usize {
        let completed = self
            .experiments
            .iter_mut()
            .map(|experiment| experiment.refresh_status(today))
            .filter(|changed| *changed)
            .count();
        if completed > 0 {
            debug!(completed, "experiments auto-completed");
        }
        completed
    }

    /// Publish a finding under the current user.
    ///
    /// A referenced experiment must exist and belong to the author.
    pub fn publish_finding(
        &mut self,
        ctx: &UserContext,
        draft: FindingDraft,
        now: DateTime<Utc>,
    ) -> Result<Finding, AnalysisError> {
        if let Some(experiment_id) = draft.experiment_id {
            find_experiment(&self.experiments, ctx, experiment_id)?;
        }
        let finding = Finding::publish(ctx, draft, now)?;
        self.findings.push(finding.clone());
        Ok(finding)
    }

    pub fn vote(
        &mut self,
        ctx: &UserContext,
        finding_id: Uuid,
        vote: VoteType,
    ) -> Result<VoteOutcome, AnalysisError> {
        let finding = self
            .findings
            .iter_mut()
            .find(|f| f.id == finding_id)
            .ok_or_else(|| AnalysisError::InvalidFinding(format!("unknown finding {finding_id}")))?;
        Ok(self.ledger.cast_vote(ctx, finding, vote))
    }

    /// Report a finding; `Ok(false)` when this user already reported it
    pub fn report(&mut self, ctx: &UserContext, finding_id: Uuid) -> Result<bool, AnalysisError> {
        let finding = self
            .findings
            .iter_mut()
            .find(|f| f.id == finding_id)
            .ok_or_else(|| AnalysisError::InvalidFinding(format!("unknown finding {finding_id}")))?;
        Ok(self.ledger.report(ctx, finding))
    }

    /// Published findings, newest first
    pub fn feed(&self) -> Vec<&Finding> {
        community_feed(&self.findings)
    }

    /// Load previously saved findings and re-apply the ledger to them
    pub fn load_findings(&mut self, findings: Vec<Finding>) {
        self.findings = findings;
        for finding in &mut self.findings {
            self.ledger.sync(finding);
        }
    }

    /// Load vote ledger state from JSON
    pub fn load_ledger(&mut self, json: &str) -> Result<(), AnalysisError> {
        self.ledger =
            VoteLedger::from_json(json).map_err(|e| AnalysisError::ParseError(e.to_string()))?;
        for finding in &mut self.findings {
            self.ledger.sync(finding);
        }
        Ok(())
    }

    /// Save vote ledger state to JSON
    pub fn save_ledger(&self) -> Result<String, AnalysisError> {
        Ok(self.ledger.to_json()?)
    }
}
