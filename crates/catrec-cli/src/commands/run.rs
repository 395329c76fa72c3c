//! `catrec run`: resolve config, reconcile one category, deliver the report.
//!
//! Exit status is non-zero only when configuration cannot be resolved. A run
//! with record failures, an early abort, or an undeliverable report still
//! exits 0; those are reported, not fatal.

use anyhow::{Context, Result};
use catrec_catalog::{HttpCatalogClient, RecordFilter};
use catrec_config::{AppConfig, NotifySettings};
use catrec_reconcile::{OutcomeKind, Reconciler, ReconcilerSettings, RunSummary};
use catrec_report::smtp::{SmtpNotifier, SmtpSettings};
use catrec_report::{classify, ReportEmitter, RunContext};
use tracing::info;

use super::load_config;

pub async fn run_reconcile(config_paths: Vec<String>, dry_run: bool, no_report: bool) -> Result<()> {
    let loaded = load_config(&config_paths)?;
    let cfg = AppConfig::resolve(&loaded)?;

    // Built before any catalog call so a bad address fails at startup.
    let emitter = if no_report {
        None
    } else {
        let notifier = SmtpNotifier::new(&smtp_settings(&cfg.notify))
            .context("CONFIG_INVALID: notify settings")?;
        Some(ReportEmitter::new(Box::new(notifier)))
    };

    let catalog = HttpCatalogClient::new(cfg.catalog.base_url.clone(), cfg.catalog.token.clone());
    let settings = ReconcilerSettings::new(RecordFilter::category(cfg.catalog.category_id.clone()))
        .with_page_size(cfg.catalog.page_size)
        .with_pacing(cfg.catalog.pacing)
        .with_dry_run(dry_run);

    info!(config_hash = %cfg.config_hash, "configuration resolved");

    let summary = Reconciler::new(&catalog, &cfg.rules, settings).run().await;

    let ctx = RunContext {
        category: cfg.catalog.category_id.clone(),
        target_option: cfg.rules.target_option.clone(),
        config_hash: cfg.config_hash.clone(),
    };
    let delivered = match &emitter {
        Some(e) => e.emit(&summary, &ctx).await,
        None => false,
    };

    print_summary(&summary, &ctx, delivered);
    Ok(())
}

fn smtp_settings(n: &NotifySettings) -> SmtpSettings {
    SmtpSettings {
        host: n.host.clone(),
        port: n.port,
        username: n.username.clone(),
        password: n.password.clone(),
        from: n.from.clone(),
        to: n.to.clone(),
    }
}

fn print_summary(summary: &RunSummary, ctx: &RunContext, delivered: bool) {
    println!("run_id={}", summary.run_id);
    println!("category={}", ctx.category);
    println!("config_hash={}", ctx.config_hash);
    println!("dry_run={}", summary.dry_run);
    println!("severity={}", classify(summary).as_str());
    println!("pages_fetched={}", summary.pages_fetched);
    println!("scanned={}", summary.stats.scanned);
    println!("updated={}", summary.stats.updated);
    println!("failed={}", summary.stats.failed);
    println!("skipped={}", summary.stats.skipped);
    if summary.dry_run {
        println!("would_update={}", summary.stats.would_update);
    }
    println!("unchanged={}", summary.stats.unchanged());
    println!("aborted={}", summary.aborted.as_deref().unwrap_or(""));
    println!("report_delivered={}", delivered);
    for o in summary.outcomes_of(OutcomeKind::Failed) {
        println!("failed_record={} reason={}", o.record_id, o.reason);
    }
}
