//! catrec-report
//!
//! Turns a finished run into a human-readable report and hands it to a
//! notification channel. Delivery is best-effort: the reconciliation work is
//! already done, so a failed send is logged and never fails the run.

mod html;
mod notifier;
pub mod smtp;

pub use html::{escape_html, render_report};
pub use notifier::{Notifier, NotifyError};
pub use smtp::{SmtpNotifier, SmtpSettings};

use catrec_reconcile::RunSummary;
use serde::Serialize;
use tracing::{info, warn};

/// Report severity, derived from run statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// At least one record failed, or the run ended early.
    Warning,
    /// Records were updated and none failed.
    Success,
    /// Nothing needed changing.
    NoOp,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "WARNING",
            Severity::Success => "SUCCESS",
            Severity::NoOp => "NO-OP",
        }
    }
}

/// `failed > 0` (or aborted) -> Warning; else `updated > 0` -> Success; else NoOp.
pub fn classify(summary: &RunSummary) -> Severity {
    if summary.stats.failed > 0 || summary.is_aborted() {
        Severity::Warning
    } else if summary.stats.updated > 0 {
        Severity::Success
    } else {
        Severity::NoOp
    }
}

/// What a run targeted, for the report body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunContext {
    pub category: String,
    pub target_option: String,
    pub config_hash: String,
}

/// A rendered report, ready for any channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub severity: Severity,
    pub subject: String,
    pub html: String,
}

/// Best-effort report delivery.
pub struct ReportEmitter {
    notifier: Box<dyn Notifier>,
}

impl ReportEmitter {
    pub fn new(notifier: Box<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Render and send. Returns whether delivery succeeded; never errors.
    pub async fn emit(&self, summary: &RunSummary, ctx: &RunContext) -> bool {
        let report = render_report(summary, ctx);
        match self.notifier.send(&report).await {
            Ok(()) => {
                info!(
                    channel = self.notifier.channel_name(),
                    severity = report.severity.as_str(),
                    "run report delivered"
                );
                true
            }
            Err(e) => {
                warn!(
                    channel = self.notifier.channel_name(),
                    severity = report.severity.as_str(),
                    error = %e,
                    "run report delivery failed"
                );
                false
            }
        }
    }
}
