use crate::{OutcomeKind, ReconcilerSettings, RecordOutcome, RunSummary, Stats};
use catrec_catalog::CatalogClient;
use catrec_rules::{apply_rules, RuleSet};
use catrec_schemas::RecordSummary;
use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Run state: `FETCHING_PAGE -> PROCESSING_RECORD* -> (next page | DONE)`.
///
/// Borrows the catalog client and rule set; owns nothing that outlives a run
/// except its settings.
pub struct Reconciler<'a> {
    catalog: &'a dyn CatalogClient,
    rules: &'a RuleSet,
    settings: ReconcilerSettings,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        catalog: &'a dyn CatalogClient,
        rules: &'a RuleSet,
        settings: ReconcilerSettings,
    ) -> Self {
        Self {
            catalog,
            rules,
            settings,
        }
    }

    pub fn settings(&self) -> &ReconcilerSettings {
        &self.settings
    }

    /// One full pass. Never fails: a page-fetch failure ends the pass and is
    /// reported through [`RunSummary::aborted`] with the partial stats.
    pub async fn run(&self) -> RunSummary {
        self.run_with_id(Uuid::new_v4()).await
    }

    pub async fn run_with_id(&self, run_id: Uuid) -> RunSummary {
        let started_at = Utc::now();
        let filter = &self.settings.filter;
        let page_size = self.settings.page_size;

        let mut stats = Stats::default();
        let mut outcomes: Vec<RecordOutcome> = Vec::new();
        let mut aborted: Option<String> = None;
        let mut pages_fetched: u32 = 0;
        let mut offset: u32 = 0;

        info!(
            %run_id,
            category = %filter.category_id,
            page_size,
            dry_run = self.settings.dry_run,
            "reconcile run started"
        );

        loop {
            let page = match self.catalog.list_records(filter, offset, page_size).await {
                Ok(p) => p,
                Err(e) => {
                    error!(%run_id, offset, error = %e, "page fetch failed; ending run");
                    aborted = Some(format!("page fetch failed at offset {offset}: {e}"));
                    break;
                }
            };
            pages_fetched += 1;

            if page.is_empty() {
                break;
            }

            let has_more = page.has_more;
            info!(%run_id, offset, count = page.items.len(), "processing page");

            for summary in page.items {
                stats.scanned += 1;
                let outcome = self.process_record(summary).await;
                stats.record(outcome.kind);
                if outcome.kind != OutcomeKind::Unchanged {
                    outcomes.push(outcome);
                }
            }

            if !has_more {
                break;
            }
            offset = offset.saturating_add(page_size);
        }

        let finished_at = Utc::now();
        info!(
            %run_id,
            scanned = stats.scanned,
            updated = stats.updated,
            failed = stats.failed,
            skipped = stats.skipped,
            would_update = stats.would_update,
            aborted = aborted.is_some(),
            "reconcile run finished"
        );

        RunSummary {
            run_id,
            started_at,
            finished_at,
            pages_fetched,
            stats,
            outcomes,
            aborted,
            dry_run: self.settings.dry_run,
        }
    }

    /// Every failure is folded into the returned outcome; nothing propagates.
    async fn process_record(&self, summary: RecordSummary) -> RecordOutcome {
        let id = summary.id.clone();
        let label = summary.label.clone();

        let record = match self.catalog.fetch_full_record(summary).await {
            Ok(r) => r,
            Err(e) => {
                warn!(record_id = %id, label = %label, error = %e, "record fetch failed");
                return RecordOutcome::new(
                    id,
                    label,
                    OutcomeKind::Failed,
                    format!("detail fetch failed: {e}"),
                );
            }
        };

        let Some(current) = record.options.as_deref() else {
            debug!(record_id = %id, "no option list; skipping");
            return RecordOutcome::new(id, label, OutcomeKind::Skipped, "no option list");
        };

        let ruled = apply_rules(self.rules, current);
        if !ruled.changed {
            debug!(record_id = %id, "already reconciled");
            return RecordOutcome::new(id, label, OutcomeKind::Unchanged, "");
        }

        let reason = ruled.describe();
        if self.settings.dry_run {
            info!(record_id = %id, label = %label, changes = %reason, "dry run: would update");
            return RecordOutcome::new(id, label, OutcomeKind::WouldUpdate, reason);
        }

        let written = self.catalog.patch_options(&record.id, &ruled.options).await;
        self.pace().await;

        match written {
            Ok(true) => {
                info!(record_id = %id, label = %label, changes = %reason, "record updated");
                RecordOutcome::new(id, label, OutcomeKind::Updated, reason)
            }
            Ok(false) => {
                warn!(record_id = %id, label = %label, "update rejected by catalog");
                RecordOutcome::new(
                    id,
                    label,
                    OutcomeKind::Failed,
                    format!("update rejected by catalog ({reason})"),
                )
            }
            Err(e) => {
                warn!(record_id = %id, label = %label, error = %e, "update failed");
                RecordOutcome::new(
                    id,
                    label,
                    OutcomeKind::Failed,
                    format!("update failed: {e}"),
                )
            }
        }
    }

    /// Blocking pause after a write. Reads are never paced.
    async fn pace(&self) {
        if !self.settings.pacing.is_zero() {
            tokio::time::sleep(self.settings.pacing).await;
        }
    }
}
