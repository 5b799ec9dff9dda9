//! Community findings, votes and reports
//!
//! A finding is written once and never edited; afterwards only its vote
//! counters, report count and moderation status change. The [`VoteLedger`]
//! is the single source of those side effects and keeps at most one vote
//! and one report per (user, finding).

use crate::error::AnalysisError;
use crate::series::Selection;
use crate::types::UserContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};
use uuid::Uuid;

/// Reports needed before a finding is flagged
pub const DEFAULT_REPORT_THRESHOLD: u32 = 3;

/// Moderation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingStatus {
    Published,
    Flagged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteType {
    Up,
    Down,
}

/// What a vote did to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOutcome {
    /// First vote by this user on this finding
    Inserted,
    /// Opposite vote replaced the previous one
    Switched,
    /// Same vote again, toggled off
    Removed,
}

/// User input for a new finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingDraft {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub chart_config: Option<Selection>,
    #[serde(default)]
    pub experiment_id: Option<Uuid>,
    #[serde(default)]
    pub share_data: bool,
}

/// A published community insight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    /// Snapshot of the chart selection the finding refers to
    pub chart_config: Option<Selection>,
    pub experiment_id: Option<Uuid>,
    pub share_data: bool,
    pub upvotes: u32,
    pub downvotes: u32,
    pub report_count: u32,
    pub status: FindingStatus,
    pub created_at: DateTime<Utc>,
}

impl Finding {
    /// Validate a draft and publish it under the current user
    pub fn publish(
        ctx: &UserContext,
        draft: FindingDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, AnalysisError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(AnalysisError::InvalidFinding(
                "title must not be empty".to_string(),
            ));
        }
        if draft.content.trim().is_empty() {
            return Err(AnalysisError::InvalidFinding(
                "content must not be empty".to_string(),
            ));
        }
        if draft.chart_config.is_some() && draft.experiment_id.is_some() {
            return Err(AnalysisError::InvalidFinding(
                "a finding references a chart or an experiment, not both".to_string(),
            ));
        }

        let finding = Self {
            id: Uuid::new_v4(),
            user_id: ctx.user_id,
            title: title.to_string(),
            content: draft.content,
            chart_config: draft.chart_config,
            experiment_id: draft.experiment_id,
            share_data: draft.share_data,
            upvotes: 0,
            downvotes: 0,
            report_count: 0,
            status: FindingStatus::Published,
            created_at: now,
        };
        info!(finding = %finding.id, "finding published");
        Ok(finding)
    }

    pub fn score(&self) -> i64 {
        i64::from(self.upvotes) - i64::from(self.downvotes)
    }

    pub fn is_visible(&self) -> bool {
        self.status == FindingStatus::Published
    }
}

/// Published findings, newest first
pub fn community_feed(findings: &[Finding]) -> Vec<&Finding> {
    let mut feed: Vec<&Finding> = findings.iter().filter(|f| f.is_visible()).collect();
    feed.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    feed
}

/// Votes and reports keyed by finding, then by user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteLedger {
    votes: BTreeMap<Uuid, BTreeMap<Uuid, VoteType>>,
    reports: BTreeMap<Uuid, BTreeSet<Uuid>>,
    report_threshold: u32,
}

impl Default for VoteLedger {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_THRESHOLD)
    }
}

impl VoteLedger {
    pub fn new(report_threshold: u32) -> Self {
        Self {
            votes: BTreeMap::new(),
            reports: BTreeMap::new(),
            report_threshold: report_threshold.max(1),
        }
    }

    /// Cast, switch or toggle off the current user's vote.
    ///
    /// The finding's counters are recomputed from the ledger afterwards.
    pub fn cast_vote(
        &mut self,
        ctx: &UserContext,
        finding: &mut Finding,
        vote: VoteType,
    ) -> VoteOutcome {
        let votes = self.votes.entry(finding.id).or_default();
        let outcome = match votes.get(&ctx.user_id).copied() {
            None => {
                votes.insert(ctx.user_id, vote);
                VoteOutcome::Inserted
            }
            Some(existing) if existing == vote => {
                votes.remove(&ctx.user_id);
                VoteOutcome::Removed
            }
            Some(_) => {
                votes.insert(ctx.user_id, vote);
                VoteOutcome::Switched
            }
        };
        if votes.is_empty() {
            self.votes.remove(&finding.id);
        }

        let (up, down) = self.tally(finding.id);
        finding.upvotes = up;
        finding.downvotes = down;
        debug!(finding = %finding.id, ?outcome, up, down, "vote applied");
        outcome
    }

    /// The current user's vote on a finding
    pub fn vote_of(&self, ctx: &UserContext, finding_id: Uuid) -> Option<VoteType> {
        self.votes
            .get(&finding_id)
            .and_then(|votes| votes.get(&ctx.user_id))
            .copied()
    }

    /// (upvotes, downvotes) for a finding
    pub fn tally(&self, finding_id: Uuid) -> (u32, u32) {
        self.votes
            .get(&finding_id)
            .map(|votes| {
                votes.values().fold((0, 0), |(up, down), vote| match vote {
                    VoteType::Up => (up + 1, down),
                    VoteType::Down => (up, down + 1),
                })
            })
            .unwrap_or((0, 0))
    }

    /// Report a finding; returns false when this user already reported it.
    ///
    /// The finding is flagged once its report count reaches the threshold.
    pub fn report(&mut self, ctx: &UserContext, finding: &mut Finding) -> bool {
        let reporters = self.reports.entry(finding.id).or_default();
        let recorded = reporters.insert(ctx.user_id);
        finding.report_count = reporters.len() as u32;

        if finding.report_count >= self.report_threshold
            && finding.status == FindingStatus::Published
        {
            finding.status = FindingStatus::Flagged;
            info!(
                finding = %finding.id,
                reports = finding.report_count,
                "finding flagged for moderation"
            );
        }
        recorded
    }

    /// Overwrite a finding's counters and status from the ledger
    pub fn sync(&self, finding: &mut Finding) {
        let (up, down) = self.tally(finding.id);
        finding.upvotes = up;
        finding.downvotes = down;
        finding.report_count = self
            .reports
            .get(&finding.id)
            .map_or(0, |reporters| reporters.len() as u32);
        finding.status = if finding.report_count >= self.report_threshold {
            FindingStatus::Flagged
        } else {
            FindingStatus::Published
        };
    }

    pub fn report_threshold(&self) -> u32 {
        self.report_threshold
    }

    /// Load from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Save to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
