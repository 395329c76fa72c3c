//! catrec-rules
//!
//! Option rule engine.
//!
//! Given a record's current option list, compute the option list the rule set
//! wants and whether anything changed. Steps run in a fixed order:
//! removal, default-choice correction, ensure-present.
//!
//! Deterministic, pure logic. No IO. No catalog calls.

mod engine;
mod types;

pub use engine::{apply_rules, needs_update};
pub use types::*;
