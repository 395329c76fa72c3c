//! catrec-reconcile
//!
//! Drives one reconciliation pass over a filtered slice of the catalog:
//! fetch a page, apply the rule set to each record, write back what changed,
//! and fold every record's result into run statistics.
//!
//! Execution is strictly sequential: one page, one record, one write at a
//! time. Only a page-fetch failure ends a run early; record-level failures
//! are counted and the pass moves on.

mod engine;
mod types;

pub use engine::Reconciler;
pub use types::*;
