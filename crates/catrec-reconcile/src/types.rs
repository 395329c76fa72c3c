use catrec_catalog::{RecordFilter, MAX_PAGE_SIZE};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Pause after every write call to stay under the catalog's throttling.
pub const DEFAULT_PACING: Duration = Duration::from_millis(200);

/// Knobs for one run. Built from configuration at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcilerSettings {
    pub filter: RecordFilter,
    pub page_size: u32,
    pub pacing: Duration,
    /// Apply rules and log, but issue no writes.
    pub dry_run: bool,
}

impl ReconcilerSettings {
    pub fn new(filter: RecordFilter) -> Self {
        Self {
            filter,
            page_size: MAX_PAGE_SIZE,
            pacing: DEFAULT_PACING,
            dry_run: false,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// What happened to one record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum OutcomeKind {
    /// Rules required no change; nothing written.
    Unchanged,
    /// Rules required a change and the write was accepted.
    Updated,
    /// Detail fetch or write failed.
    Failed,
    /// Dry run: a write would have been issued.
    WouldUpdate,
    /// The catalog returned no option list for the record.
    Skipped,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Unchanged => "UNCHANGED",
            OutcomeKind::Updated => "UPDATED",
            OutcomeKind::Failed => "FAILED",
            OutcomeKind::WouldUpdate => "WOULD_UPDATE",
            OutcomeKind::Skipped => "SKIPPED",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    pub record_id: String,
    pub label: String,
    pub kind: OutcomeKind,
    pub reason: String,
}

impl RecordOutcome {
    pub fn new(
        record_id: impl Into<String>,
        label: impl Into<String>,
        kind: OutcomeKind,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            label: label.into(),
            kind,
            reason: reason.into(),
        }
    }
}

/// Run-level counters. Single writer: the reconciler that owns the run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub scanned: u64,
    pub updated: u64,
    pub failed: u64,
    pub skipped: u64,
    pub would_update: u64,
}

impl Stats {
    /// Fold one record's outcome in. `scanned` is counted separately, when
    /// the record is first seen.
    pub fn record(&mut self, kind: OutcomeKind) {
        match kind {
            OutcomeKind::Unchanged => {}
            OutcomeKind::Updated => self.updated += 1,
            OutcomeKind::Failed => self.failed += 1,
            OutcomeKind::WouldUpdate => self.would_update += 1,
            OutcomeKind::Skipped => self.skipped += 1,
        }
    }

    pub fn unchanged(&self) -> u64 {
        self.scanned
            .saturating_sub(self.updated + self.failed + self.skipped + self.would_update)
    }

    /// `scanned >= updated + failed (+ skipped + would_update)`.
    pub fn is_consistent(&self) -> bool {
        self.scanned >= self.updated + self.failed + self.skipped + self.would_update
    }
}

/// Everything a finished (or aborted) run hands to the report emitter.
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pages_fetched: u32,
    pub stats: Stats,
    /// Every outcome other than `Unchanged`, in processing order.
    pub outcomes: Vec<RecordOutcome>,
    /// Set when a page fetch failed and the run ended early.
    pub aborted: Option<String>,
    pub dry_run: bool,
}

impl RunSummary {
    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    pub fn outcomes_of(&self, kind: OutcomeKind) -> impl Iterator<Item = &RecordOutcome> {
        self.outcomes.iter().filter(move |o| o.kind == kind)
    }
}
