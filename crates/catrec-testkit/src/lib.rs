//! In-memory collaborators for scenario tests.
//!
//! [`FakeCatalog`] behaves like the remote catalog: it pages, serves detail
//! calls, and applies accepted writes to its own state, so a second pass over
//! the same catalog sees the first pass's results. Failures are injected per
//! offset or per record id. No network I/O.

mod catalog;
mod notifier;

pub use catalog::{FakeCatalog, StoredRecord};
pub use notifier::RecordingNotifier;

use catrec_schemas::{OptionKind, ProductOption};

/// `Variant`-style select option with the given choices and default.
pub fn select(name: &str, choices: &[&str], default_choice: Option<u32>) -> ProductOption {
    ProductOption::new(name, OptionKind::Select)
        .with_choices(choices)
        .with_default_choice(default_choice)
}

/// Free-text option.
pub fn text_field(name: &str) -> ProductOption {
    ProductOption::new(name, OptionKind::TextField)
}
