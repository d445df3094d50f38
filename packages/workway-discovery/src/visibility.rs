//! Per-workflow visibility: breakdown history and the disappearance score.
//!
//! A healthy workflow disappears into use — the user stops thinking about
//! it. Every breakdown forces it back into view. The disappearance score
//! compresses the last week of breakdown history into a 0–100 health
//! number, higher meaning more invisible, suitable for a health indicator
//! without exposing error internals.
//!
//! Scores are computed against an explicit `now` so window math is
//! deterministic under test.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use workway_core::{BreakdownKind, BreakdownSeverity};

/// Breakdowns older than this stop affecting the score.
const WINDOW_DAYS: i64 = 7;

/// Flat penalty while a breakdown is unresolved.
const ACTIVE_PENALTY: i64 = 30;

/// Credit for a breakdown the platform healed without the user noticing.
const AUTO_RESOLVE_CREDIT: i64 = 5;

/// Ceiling on the breakdown-free streak bonus, in days.
const STREAK_CAP: i64 = 20;

/// One reported breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownRecord {
    /// When the breakdown was reported.
    pub at: DateTime<Utc>,
    pub kind: BreakdownKind,
    pub severity: BreakdownSeverity,
    /// When it was resolved; `None` while active.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Whether the platform recovered on its own (Silent severity).
    pub auto_resolved: bool,
}

impl BreakdownRecord {
    fn weight(&self) -> i64 {
        match self.severity {
            BreakdownSeverity::Silent => 2,
            BreakdownSeverity::Ambient => 5,
            BreakdownSeverity::Notification => 15,
            BreakdownSeverity::Blocking => 25,
        }
    }
}

/// Breakdown history and current health of one workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisibilityState {
    /// Whether an unresolved breakdown exists.
    pub degraded: bool,
    history: Vec<BreakdownRecord>,
    /// Index of the unresolved record in `history`, if any.
    active: Option<usize>,
}

impl VisibilityState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new breakdown and mark the workflow degraded.
    ///
    /// If a breakdown is already active it is closed as superseded (not
    /// auto-resolved); at most one record is ever active.
    pub fn record_breakdown(
        &mut self,
        kind: BreakdownKind,
        severity: BreakdownSeverity,
        now: DateTime<Utc>,
    ) {
        self.prune(now);
        if let Some(open) = self.active.and_then(|i| self.history.get_mut(i)) {
            open.resolved_at = Some(now);
        }
        self.history.push(BreakdownRecord {
            at: now,
            kind,
            severity,
            resolved_at: None,
            auto_resolved: false,
        });
        self.active = Some(self.history.len() - 1);
        self.degraded = true;
    }

    /// Resolve the active breakdown and restore normal visibility.
    ///
    /// Silent-severity breakdowns are the ones the retry layer heals on its
    /// own, so resolving one records an auto-recovery. No-op when nothing
    /// is active.
    pub fn resolve(&mut self, now: DateTime<Utc>) {
        if let Some(open) = self.active.take().and_then(|i| self.history.get_mut(i)) {
            open.resolved_at = Some(now);
            open.auto_resolved = open.severity.auto_recovers();
        }
        self.degraded = false;
        self.prune(now);
    }

    /// The unresolved breakdown, if any.
    pub fn active_breakdown(&self) -> Option<&BreakdownRecord> {
        self.active.and_then(|i| self.history.get(i))
    }

    /// Whether the active breakdown is severe enough to pull the workflow
    /// out of suggestions entirely.
    pub fn blocks_suggestions(&self) -> bool {
        self.active_breakdown()
            .is_some_and(|record| record.severity.requires_action())
    }

    /// Recorded breakdowns, oldest first.
    pub fn history(&self) -> &[BreakdownRecord] {
        &self.history
    }

    /// Health score in `[0, 100]`; higher is more invisible.
    ///
    /// Starts from 100; each breakdown inside the trailing seven days
    /// subtracts its severity weight (Silent 2, Ambient 5, Notification 15,
    /// Blocking 25), auto-resolved ones earn back 5, an unresolved
    /// breakdown costs a flat 30, and a breakdown-free streak earns up to
    /// 20 (one point per whole day since the last breakdown).
    pub fn disappearance_score(&self, now: DateTime<Utc>) -> u8 {
        let mut score: i64 = 100;
        let window_start = now - Duration::days(WINDOW_DAYS);

        for record in &self.history {
            if record.at <= window_start {
                continue;
            }
            score -= record.weight();
            if record.auto_resolved {
                score += AUTO_RESOLVE_CREDIT;
            }
        }

        if self.active.is_some() {
            score -= ACTIVE_PENALTY;
        }

        if let Some(last) = self.history.iter().map(|record| record.at).max() {
            let streak_days = (now - last).num_days().max(0);
            score += streak_days.min(STREAK_CAP);
        }

        score.clamp(0, 100) as u8
    }

    /// Drop resolved records that have aged out of the scoring window. The
    /// active record always stays.
    fn prune(&mut self, now: DateTime<Utc>) {
        let window_start = now - Duration::days(WINDOW_DAYS);
        if !self.history.iter().any(|r| r.at <= window_start && r.resolved_at.is_some()) {
            return;
        }
        self.history.retain(|r| r.at > window_start || r.resolved_at.is_none());
        self.active = self.history.iter().position(|r| r.resolved_at.is_none());
    }
}
