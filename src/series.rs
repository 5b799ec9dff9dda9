//! Dual-metric chart series
//!
//! Turns per-day records for a primary metric (and an optional comparison
//! metric) into chart points plus a synchronized axis layout, and memoizes
//! the result per selection.
//!
//! Fetching raw data is delegated to a [`SeriesSource`]. A [`ChartSession`]
//! hands out a [`FetchTicket`] per request and drops responses whose ticket
//! was superseded by a newer selection before they resolved.

use crate::aggregator::{DailyAggregator, DateWindow};
use crate::axis::AxisConfig;
use crate::error::AnalysisError;
use crate::types::{DailyRecord, LogEntry, TrackableItem, UserContext};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, warn};
use uuid::Uuid;

/// Default number of selections a session keeps memoized
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Default upper bound on the days a single selection may span
pub const DEFAULT_MAX_WINDOW_DAYS: u32 = 366;

/// One charted day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub primary: Option<f64>,
    /// Comparison value after the axis transform (what gets drawn)
    pub comparison: Option<f64>,
    /// Comparison value as logged, for tooltips
    pub comparison_raw: Option<f64>,
}

/// Chart-ready series with its axis layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualMetricSeries {
    pub points: Vec<ChartPoint>,
    pub axis: AxisConfig,
}

/// Build chart points and axes from raw daily records.
///
/// Non-finite values are treated as missing. When no comparison metric is
/// given, comparison values in `raw` are ignored.
pub fn compute_dual_metric_series(
    primary: &TrackableItem,
    comparison: Option<&TrackableItem>,
    raw: &[DailyRecord],
) -> DualMetricSeries {
    let primary_values: Vec<Option<f64>> = raw
        .iter()
        .map(|r| r.primary_value.filter(|v| v.is_finite()))
        .collect();
    let comparison_values: Vec<Option<f64>> = raw
        .iter()
        .map(|r| {
            comparison
                .and_then(|_| r.comparison_value)
                .filter(|v| v.is_finite())
        })
        .collect();

    let axis = AxisConfig::for_types(
        primary.metric_type,
        comparison.map(|c| c.metric_type),
        observed_max(&primary_values),
        observed_max(&comparison_values),
    );

    let points = raw
        .iter()
        .zip(primary_values.iter().zip(comparison_values.iter()))
        .map(|(record, (primary, comparison_raw))| ChartPoint {
            date: record.date,
            primary: *primary,
            comparison: comparison_raw.map(|v| axis.comparison_transform.apply(v)),
            comparison_raw: *comparison_raw,
        })
        .collect();

    DualMetricSeries { points, axis }
}

fn observed_max(values: &[Option<f64>]) -> Option<f64> {
    values.iter().flatten().copied().reduce(f64::max)
}

/// What the user asked to chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub primary_item_id: Uuid,
    #[serde(default)]
    pub comparison_item_id: Option<Uuid>,
    /// Last day shown
    pub end_date: NaiveDate,
    /// Number of days shown, ending on `end_date`
    pub days: u32,
}

impl Selection {
    /// The selected date range, rejecting selections longer than `max_days`
    pub fn window(&self, max_days: u32) -> Result<DateWindow, AnalysisError> {
        if self.days > max_days {
            return Err(AnalysisError::InvalidDateRange(format!(
                "{} days requested, at most {max_days} allowed",
                self.days
            )));
        }
        DateWindow::trailing(self.end_date, self.days)
    }
}

/// Memoization key: the selection plus whose data it is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionKey {
    pub user_id: Uuid,
    pub selection: Selection,
}

/// Everything a fetch returns for one selection
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedSeries {
    pub primary: TrackableItem,
    pub comparison: Option<TrackableItem>,
    /// One record per day in the selection window, oldest first
    pub records: Vec<DailyRecord>,
}

/// Data-fetch collaborator.
///
/// Implementations return a complete result or an error; partial results
/// are not part of the contract.
pub trait SeriesSource {
    /// Metric definition, owned by the current user
    fn trackable_item(&self, ctx: &UserContext, id: Uuid) -> Result<TrackableItem, AnalysisError>;

    /// One record per day in the selection window, oldest first, with
    /// missing values as `None`
    fn fetch_daily_records(
        &self,
        ctx: &UserContext,
        selection: &Selection,
    ) -> Result<Vec<DailyRecord>, AnalysisError>;

    /// Resolve both metrics, check their chart roles and fetch the records
    fn fetch_series(
        &self,
        ctx: &UserContext,
        selection: &Selection,
    ) -> Result<FetchedSeries, AnalysisError> {
        let primary = self.trackable_item(ctx, selection.primary_item_id)?;
        if !primary.metric_type.is_valid_output() {
            return Err(AnalysisError::InvalidMetricRole(format!(
                "{} cannot be charted as the primary metric",
                primary.metric_type.as_str()
            )));
        }

        let comparison = match selection.comparison_item_id {
            Some(id) => {
                let item = self.trackable_item(ctx, id)?;
                if !item.metric_type.is_valid_input() {
                    return Err(AnalysisError::InvalidMetricRole(format!(
                        "{} cannot be charted as a comparison metric",
                        item.metric_type.as_str()
                    )));
                }
                Some(item)
            }
            None => None,
        };

        let records = self.fetch_daily_records(ctx, selection)?;
        Ok(FetchedSeries {
            primary,
            comparison,
            records,
        })
    }
}

/// In-memory [`SeriesSource`] over a user's items and log entries
#[derive(Debug, Clone)]
pub struct MemoryLogStore {
    items: Vec<TrackableItem>,
    entries: Vec<LogEntry>,
    max_window_days: u32,
}

impl Default for MemoryLogStore {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl MemoryLogStore {
    pub fn new(items: Vec<TrackableItem>, entries: Vec<LogEntry>) -> Self {
        Self {
            items,
            entries,
            max_window_days: DEFAULT_MAX_WINDOW_DAYS,
        }
    }

    /// Limit how many days one selection may span
    pub fn with_max_window_days(mut self, max_window_days: u32) -> Self {
        self.max_window_days = max_window_days.max(1);
        self
    }

    /// Look up an item owned by the current user
    pub fn item(&self, ctx: &UserContext, id: Uuid) -> Result<&TrackableItem, AnalysisError> {
        let item = self
            .items
            .iter()
            .find(|i| i.id == id)
            .ok_or_else(|| AnalysisError::UnknownItem(id.to_string()))?;
        ctx.ensure_owner(item.user_id, "trackable item")?;
        Ok(item)
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Record a new log entry
    pub fn push_entry(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }
}

impl SeriesSource for MemoryLogStore {
    fn trackable_item(&self, ctx: &UserContext, id: Uuid) -> Result<TrackableItem, AnalysisError> {
        self.item(ctx, id).cloned()
    }

    fn fetch_daily_records(
        &self,
        ctx: &UserContext,
        selection: &Selection,
    ) -> Result<Vec<DailyRecord>, AnalysisError> {
        let primary = self.item(ctx, selection.primary_item_id)?;
        let comparison = selection
            .comparison_item_id
            .map(|id| self.item(ctx, id))
            .transpose()?;

        let window = selection.window(self.max_window_days)?;
        let primary_days = DailyAggregator::aggregate(primary, &self.entries, Some(&window));
        let comparison_days = comparison
            .map(|item| DailyAggregator::aggregate(item, &self.entries, Some(&window)))
            .unwrap_or_default();

        Ok(window
            .dates()
            .map(|date| DailyRecord {
                date,
                primary_value: primary_days.get(&date).copied(),
                comparison_value: comparison_days.get(&date).copied(),
            })
            .collect())
    }
}

/// Handle for one outstanding fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    key: SelectionKey,
}

impl FetchTicket {
    pub fn key(&self) -> &SelectionKey {
        &self.key
    }
}

/// Per-viewer chart state: memoized series and the stale-response guard
#[derive(Debug)]
pub struct ChartSession {
    cache: HashMap<SelectionKey, DualMetricSeries>,
    /// Insertion order, oldest first, for eviction
    order: VecDeque<SelectionKey>,
    capacity: usize,
    generation: u64,
}

impl Default for ChartSession {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl ChartSession {
    /// Create a session memoizing at most `capacity` selections
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: HashMap::new(),
            order: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            generation: 0,
        }
    }

    /// Register a new selection; any earlier ticket becomes stale
    pub fn begin(&mut self, ctx: &UserContext, selection: Selection) -> FetchTicket {
        self.generation += 1;
        FetchTicket {
            generation: self.generation,
            key: SelectionKey {
                user_id: ctx.user_id,
                selection,
            },
        }
    }

    /// Memoized series for a ticket's selection, if already computed
    pub fn cached(&self, ticket: &FetchTicket) -> Option<&DualMetricSeries> {
        self.cache.get(&ticket.key)
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Complete a fetch.
    ///
    /// Returns `None` when the ticket was superseded; the response is
    /// discarded without touching the cache. Otherwise the computed series
    /// (or the fetch error) is returned and successful results are memoized.
    pub fn resolve(
        &mut self,
        ticket: FetchTicket,
        fetched: Result<FetchedSeries, AnalysisError>,
    ) -> Option<Result<DualMetricSeries, AnalysisError>> {
        if !self.is_current(&ticket) {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale chart response"
            );
            return None;
        }

        let fetched = match fetched {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(error = %e, "chart data fetch failed");
                return Some(Err(e));
            }
        };

        let series = compute_dual_metric_series(
            &fetched.primary,
            fetched.comparison.as_ref(),
            &fetched.records,
        );
        self.insert(ticket.key, series.clone());
        Some(Ok(series))
    }

    /// Synchronous convenience: serve from cache or fetch through `source`
    pub fn load<S: SeriesSource>(
        &mut self,
        ctx: &UserContext,
        source: &S,
        selection: Selection,
    ) -> Result<DualMetricSeries, AnalysisError> {
        let ticket = self.begin(ctx, selection);
        if let Some(series) = self.cached(&ticket) {
            debug!("chart series served from cache");
            return Ok(series.clone());
        }

        let fetched = source.fetch_series(ctx, &selection);
        self.resolve(ticket, fetched).unwrap_or_else(|| {
            Err(AnalysisError::FetchError(
                "selection changed before data arrived".to_string(),
            ))
        })
    }

    /// Drop every memoized series, e.g. after new data was logged
    pub fn invalidate(&mut self) {
        self.cache.clear();
        self.order.clear();
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    fn insert(&mut self, key: SelectionKey, series: DualMetricSeries) {
        if self.cache.insert(key, series).is_none() {
            self.order.push_back(key);
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.cache.remove(&oldest);
            }
        }
    }
}
