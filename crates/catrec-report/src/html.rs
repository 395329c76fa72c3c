use crate::{classify, Report, RunContext};
use catrec_reconcile::{OutcomeKind, RecordOutcome, RunSummary};
use chrono::SecondsFormat;
use std::fmt::Write;

/// Escape text for interpolation into HTML element content or attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn stat_row(out: &mut String, label: &str, value: u64) {
    let _ = write!(out, "<tr><th align=\"left\">{label}</th><td>{value}</td></tr>");
}

fn outcome_rows(out: &mut String, outcomes: &[&RecordOutcome]) {
    for o in outcomes {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            o.kind.as_str(),
            escape_html(&o.record_id),
            escape_html(&o.label),
            escape_html(&o.reason)
        );
    }
}

/// Subject line and HTML body for one run.
///
/// Subject: `[<SEVERITY>] Catalog reconcile category=<id> <RFC3339 start>`.
pub fn render_report(summary: &RunSummary, ctx: &RunContext) -> Report {
    let severity = classify(summary);
    let ts = summary
        .started_at
        .to_rfc3339_opts(SecondsFormat::Secs, true);
    let stats = &summary.stats;

    let subject = format!(
        "[{}] Catalog reconcile category={} {}",
        severity.as_str(),
        ctx.category,
        ts
    );

    let mut html = String::new();
    html.push_str("<!DOCTYPE html><html><body>");
    let _ = write!(
        html,
        "<h2>Catalog reconcile: {}</h2>",
        severity.as_str()
    );
    let _ = write!(
        html,
        "<p>Run <code>{}</code> started {} finished {}</p>",
        summary.run_id,
        escape_html(&ts),
        escape_html(
            &summary
                .finished_at
                .to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    );
    let _ = write!(
        html,
        "<p>Category: <b>{}</b><br>Target option: <b>{}</b><br>Config hash: <code>{}</code>{}</p>",
        escape_html(&ctx.category),
        escape_html(&ctx.target_option),
        escape_html(&ctx.config_hash),
        if summary.dry_run { "<br><b>DRY RUN</b>: no writes issued" } else { "" }
    );

    if let Some(reason) = &summary.aborted {
        let _ = write!(
            html,
            "<p style=\"color:#b00\"><b>Run ended early:</b> {}</p>",
            escape_html(reason)
        );
    }

    html.push_str("<table border=\"1\" cellpadding=\"4\" cellspacing=\"0\">");
    stat_row(&mut html, "Scanned", stats.scanned);
    stat_row(&mut html, "Updated", stats.updated);
    stat_row(&mut html, "Failed", stats.failed);
    stat_row(&mut html, "Skipped (no options)", stats.skipped);
    if summary.dry_run {
        stat_row(&mut html, "Would update", stats.would_update);
    }
    stat_row(&mut html, "Unchanged", stats.unchanged());
    html.push_str("</table>");

    let listed: Vec<&RecordOutcome> = summary
        .outcomes
        .iter()
        .filter(|o| {
            matches!(
                o.kind,
                OutcomeKind::Updated | OutcomeKind::Failed | OutcomeKind::WouldUpdate
            )
        })
        .collect();

    if !listed.is_empty() {
        html.push_str("<h3>Records</h3>");
        html.push_str("<table border=\"1\" cellpadding=\"4\" cellspacing=\"0\">");
        html.push_str("<tr><th>Outcome</th><th>ID</th><th>Label</th><th>Detail</th></tr>");
        outcome_rows(&mut html, &listed);
        html.push_str("</table>");
    }

    html.push_str("</body></html>");

    Report {
        severity,
        subject,
        html,
    }
}
