//! scenario_reconcile_end_to_end
//!
//! Full pass: FakeCatalog -> Reconciler -> ReportEmitter -> RecordingNotifier.
//!
//! Validates:
//! A) unset default on a 3-choice target becomes index 2, required=false, written once
//! B) an already-correct record issues no write
//! C) a removed option is dropped and the target corrected in one write
//! D) a rejected write counts as failed, the run continues, the report is WARNING
//! E) an empty first page ends the run with scanned=0 and a NO-OP report
//! plus: a second pass over the written catalog is a no-op with zero writes

use catrec_catalog::RecordFilter;
use catrec_reconcile::{OutcomeKind, Reconciler, ReconcilerSettings, RunSummary};
use catrec_report::{ReportEmitter, RunContext, Severity};
use catrec_rules::RuleSet;
use catrec_testkit::{select, text_field, FakeCatalog, RecordingNotifier, StoredRecord};
use std::time::Duration;

fn settings() -> ReconcilerSettings {
    ReconcilerSettings::new(RecordFilter::category("194057007")).with_pacing(Duration::ZERO)
}

fn ctx(rules: &RuleSet) -> RunContext {
    RunContext {
        category: "194057007".to_string(),
        target_option: rules.target_option.clone(),
        config_hash: "test-hash".to_string(),
    }
}

async fn run_and_report(
    catalog: &FakeCatalog,
    rules: &RuleSet,
    settings: ReconcilerSettings,
) -> (RunSummary, RecordingNotifier) {
    let summary = Reconciler::new(catalog, rules, settings).run().await;
    let notifier = RecordingNotifier::new();
    let emitter = ReportEmitter::new(Box::new(notifier.clone()));
    assert!(emitter.emit(&summary, &ctx(rules)).await);
    assert!(summary.stats.is_consistent());
    assert!(summary.stats.scanned >= summary.stats.updated + summary.stats.failed);
    (summary, notifier)
}

#[tokio::test]
async fn scenario_a_unset_default_on_three_choices() {
    let catalog = FakeCatalog::new(vec![StoredRecord::new(
        "11",
        "Mug",
        vec![select("Variant", &["a", "b", "c"], None).with_required(true)],
    )]);
    let rules = RuleSet::reference("Variant");

    let (summary, notifier) = run_and_report(&catalog, &rules, settings()).await;

    assert_eq!(summary.stats.scanned, 1);
    assert_eq!(summary.stats.updated, 1);
    let patches = catalog.patches();
    assert_eq!(patches.len(), 1);
    let written = &patches[0].1[0];
    assert_eq!(written.default_choice, Some(2));
    assert!(!written.required);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].severity, Severity::Success);
}

#[tokio::test]
async fn scenario_b_already_correct_issues_no_write() {
    let catalog = FakeCatalog::new(vec![StoredRecord::new(
        "12",
        "Cap",
        vec![select("Variant", &["a", "b"], Some(1)).with_required(false)],
    )]);
    let rules = RuleSet::reference("Variant");

    let (summary, notifier) = run_and_report(&catalog, &rules, settings()).await;

    assert_eq!(summary.stats.scanned, 1);
    assert_eq!(summary.stats.updated, 0);
    assert_eq!(summary.stats.unchanged(), 1);
    assert!(summary.outcomes.is_empty());
    assert!(catalog.patches().is_empty());
    assert_eq!(notifier.sent()[0].severity, Severity::NoOp);
}

#[tokio::test]
async fn scenario_c_removal_and_correction_in_one_write() {
    let catalog = FakeCatalog::new(vec![StoredRecord::new(
        "13",
        "Shirt",
        vec![
            text_field("Message"),
            select("Variant", &["a", "b", "c"], None),
        ],
    )]);
    let rules = RuleSet::reference("Variant").with_removed(&["Message"]);

    let (summary, _) = run_and_report(&catalog, &rules, settings()).await;

    assert_eq!(summary.stats.updated, 1);
    let stored = catalog.record("13").unwrap().options.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Variant");
    assert_eq!(stored[0].default_choice, Some(2));

    let reason = &summary.outcomes[0].reason;
    assert!(reason.contains("removed 'Message'"), "{reason}");
}

#[tokio::test]
async fn scenario_d_rejected_write_is_failed_and_run_continues() {
    let catalog = FakeCatalog::new(vec![
        StoredRecord::new("21", "First", vec![select("Variant", &["a", "b", "c"], None)]),
        StoredRecord::new("22", "Second", vec![select("Variant", &["a", "b", "c"], None)]),
        StoredRecord::new("23", "Third", vec![select("Variant", &["a", "b"], None)]),
    ])
    .rejecting_patch("22");
    let rules = RuleSet::reference("Variant");

    let (summary, notifier) = run_and_report(&catalog, &rules, settings()).await;

    assert_eq!(summary.stats.scanned, 3);
    assert_eq!(summary.stats.updated, 2);
    assert_eq!(summary.stats.failed, 1);
    let failed: Vec<_> = summary.outcomes_of(OutcomeKind::Failed).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].record_id, "22");
    assert!(failed[0].reason.starts_with("update rejected by catalog"));

    let ids: Vec<String> = catalog.patches().into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["21", "23"]);

    let report = &notifier.sent()[0];
    assert_eq!(report.severity, Severity::Warning);
    assert!(report.subject.starts_with("[WARNING] Catalog reconcile category=194057007 "));
}

#[tokio::test]
async fn scenario_e_empty_first_page_is_noop() {
    let catalog = FakeCatalog::new(vec![]);
    let rules = RuleSet::reference("Variant");

    let (summary, notifier) = run_and_report(&catalog, &rules, settings()).await;

    assert_eq!(summary.stats.scanned, 0);
    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(catalog.list_calls(), vec![(0, 100)]);
    assert!(!summary.is_aborted());
    assert_eq!(notifier.sent()[0].severity, Severity::NoOp);
}

#[tokio::test]
async fn second_pass_over_written_catalog_is_noop() {
    let records: Vec<StoredRecord> = (0..7)
        .map(|i| {
            StoredRecord::new(
                format!("{i}"),
                format!("Product {i}"),
                vec![
                    text_field("Message"),
                    select("Variant", &["a", "b", "c", "d"][..(i % 4) + 1], None),
                ],
            )
        })
        .collect();
    let catalog = FakeCatalog::new(records);
    let rules = RuleSet::reference("Variant")
        .with_removed(&["Message"])
        .with_ensure_present(text_field("Gift note"));

    let first = Reconciler::new(&catalog, &rules, settings().with_page_size(3))
        .run()
        .await;
    assert_eq!(first.stats.scanned, 7);
    assert_eq!(first.stats.updated, 7);
    assert_eq!(catalog.list_calls(), vec![(0, 3), (3, 3), (6, 3)]);

    let writes_after_first = catalog.patches().len();
    let second = Reconciler::new(&catalog, &rules, settings().with_page_size(3))
        .run()
        .await;

    assert_eq!(second.stats.scanned, 7);
    assert_eq!(second.stats.updated, 0);
    assert_eq!(second.stats.unchanged(), 7);
    assert_eq!(catalog.patches().len(), writes_after_first);

    // Exactly one ensured option per record after both passes.
    for i in 0..7 {
        let opts = catalog.record(&i.to_string()).unwrap().options.unwrap();
        assert_eq!(opts.iter().filter(|o| o.name == "Gift note").count(), 1);
        assert!(opts.iter().all(|o| o.name != "Message"));
    }
}
