//! Daily aggregation
//!
//! Groups raw log entries by calendar day and produces one representative
//! value per day for a single trackable item.

use crate::error::AnalysisError;
use crate::types::{LogEntry, TrackableItem};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Create a window, rejecting `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AnalysisError> {
        if start > end {
            return Err(AnalysisError::InvalidDateRange(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// The `days` calendar days ending on `end` (inclusive).
    ///
    /// A zero-day request is treated as a single day. Fails when the start
    /// would fall outside the representable calendar.
    pub fn trailing(end: NaiveDate, days: u32) -> Result<Self, AnalysisError> {
        let span = i64::from(days.max(1)) - 1;
        let start = end.checked_sub_signed(Duration::days(span)).ok_or_else(|| {
            AnalysisError::InvalidDateRange(format!("{days} days before {end} is out of range"))
        })?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of calendar days in the window
    pub fn len_days(&self) -> u32 {
        ((self.end - self.start).num_days() + 1) as u32
    }

    /// Every date in the window, ascending
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..i64::from(self.len_days())).map(move |offset| start + Duration::days(offset))
    }
}

/// Map from calendar day to the single value used for that day
pub type DailySeries = BTreeMap<NaiveDate, f64>;

/// Stateless helper that reduces log entries to per-day values
pub struct DailyAggregator;

impl DailyAggregator {
    /// Aggregate `entries` for `item`, optionally limited to `window`.
    ///
    /// Entries for other items are ignored. Values are coerced according to
    /// the item's type; text metrics yield an empty series and malformed
    /// values are dropped. When several valid entries share a day, the one
    /// with the latest `created_at` wins, ties going to the larger entry id,
    /// so input order never affects the result.
    pub fn aggregate(
        item: &TrackableItem,
        entries: &[LogEntry],
        window: Option<&DateWindow>,
    ) -> DailySeries {
        let mut best: BTreeMap<NaiveDate, (&LogEntry, f64)> = BTreeMap::new();
        let mut dropped = 0usize;

        for entry in entries {
            if entry.item_id != item.id {
                continue;
            }
            if let Some(window) = window {
                if !window.contains(entry.date) {
                    continue;
                }
            }

            let Some(value) = entry.value.coerce(item.metric_type) else {
                dropped += 1;
                continue;
            };

            let replace = best
                .get(&entry.date)
                .map_or(true, |(current, _)| is_newer(entry, current));
            if replace {
                best.insert(entry.date, (entry, value));
            }
        }

        if dropped > 0 {
            debug!(
                item = %item.id,
                metric_type = item.metric_type.as_str(),
                dropped,
                "dropped log entries that could not be coerced"
            );
        }

        best.into_iter()
            .map(|(date, (_, value))| (date, value))
            .collect()
    }
}

/// Recency ordering used to resolve same-day duplicates
fn is_newer(candidate: &LogEntry, current: &LogEntry) -> bool {
    (candidate.created_at, candidate.id) > (current.created_at, current.id)
}
