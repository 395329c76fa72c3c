use catrec_schemas::{OptionKind, ProductOption};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Maps a minimum choice count to the default-choice index it requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DefaultChoiceThreshold {
    pub min_choices: u32,
    pub index: u32,
}

impl DefaultChoiceThreshold {
    pub fn new(min_choices: u32, index: u32) -> Self {
        Self { min_choices, index }
    }
}

/// Reference policy: 3 or more choices -> index 2; exactly 2 -> index 1.
pub fn reference_thresholds() -> Vec<DefaultChoiceThreshold> {
    vec![
        DefaultChoiceThreshold::new(3, 2),
        DefaultChoiceThreshold::new(2, 1),
    ]
}

/// Process-wide rule configuration. Built once at startup, never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleSet {
    /// Option whose default choice is corrected from its choice count.
    pub target_option: String,
    pub thresholds: Vec<DefaultChoiceThreshold>,
    /// Option names removed unconditionally. Exact, case-sensitive match.
    pub remove: BTreeSet<String>,
    /// Appended when no option matches both its name and kind.
    pub ensure_present: Option<ProductOption>,
}

impl RuleSet {
    /// Reference policy on `target_option`, nothing removed, nothing ensured.
    pub fn reference(target_option: impl Into<String>) -> Self {
        Self {
            target_option: target_option.into(),
            thresholds: reference_thresholds(),
            remove: BTreeSet::new(),
            ensure_present: None,
        }
    }

    pub fn with_removed<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.remove = names.iter().map(|n| n.as_ref().to_string()).collect();
        self
    }

    pub fn with_ensure_present(mut self, template: ProductOption) -> Self {
        self.ensure_present = Some(template);
        self
    }

    /// Desired default index for an option with `n_choices` choices.
    ///
    /// The threshold with the largest `min_choices` not above `n_choices` wins.
    /// `None` means the option is left alone.
    pub fn desired_default_index(&self, n_choices: usize) -> Option<u32> {
        self.thresholds
            .iter()
            .filter(|t| (t.min_choices as usize) <= n_choices)
            .max_by_key(|t| t.min_choices)
            .map(|t| t.index)
    }

    /// Reject rule sets the engine cannot apply idempotently.
    pub fn validate(&self) -> Result<(), RuleSetError> {
        if self.target_option.trim().is_empty() {
            return Err(RuleSetError::EmptyTargetOption);
        }

        let mut seen: BTreeSet<u32> = BTreeSet::new();
        for t in &self.thresholds {
            if !seen.insert(t.min_choices) {
                return Err(RuleSetError::DuplicateThreshold {
                    min_choices: t.min_choices,
                });
            }
            if t.index >= t.min_choices {
                return Err(RuleSetError::IndexOutOfRange { threshold: *t });
            }
        }

        if let Some(tpl) = &self.ensure_present {
            if tpl.name.trim().is_empty() {
                return Err(RuleSetError::EnsurePresentUnnamed);
            }
            if self.remove.contains(&tpl.name) {
                return Err(RuleSetError::EnsurePresentRemoved {
                    name: tpl.name.clone(),
                });
            }
            if tpl.name == self.target_option {
                return Err(RuleSetError::EnsurePresentIsTarget {
                    name: tpl.name.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Why a rule set was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleSetError {
    EmptyTargetOption,
    DuplicateThreshold { min_choices: u32 },
    IndexOutOfRange { threshold: DefaultChoiceThreshold },
    EnsurePresentUnnamed,
    /// Removal would drop the template and ensure-present would re-append it every run.
    EnsurePresentRemoved { name: String },
    /// The appended copy would be corrected on the following run.
    EnsurePresentIsTarget { name: String },
}

impl fmt::Display for RuleSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSetError::EmptyTargetOption => write!(f, "target option name is empty"),
            RuleSetError::DuplicateThreshold { min_choices } => {
                write!(f, "duplicate threshold for min_choices={min_choices}")
            }
            RuleSetError::IndexOutOfRange { threshold } => write!(
                f,
                "threshold index {} must be below min_choices {}",
                threshold.index, threshold.min_choices
            ),
            RuleSetError::EnsurePresentUnnamed => write!(f, "ensure-present template has no name"),
            RuleSetError::EnsurePresentRemoved { name } => write!(
                f,
                "ensure-present option '{name}' is also in the removal set"
            ),
            RuleSetError::EnsurePresentIsTarget { name } => write!(
                f,
                "ensure-present option '{name}' is the default-choice target option"
            ),
        }
    }
}

impl std::error::Error for RuleSetError {}

/// One edit the engine made, in application order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleChange {
    Removed {
        name: String,
    },
    DefaultChoiceSet {
        name: String,
        from: Option<u32>,
        to: u32,
        was_required: bool,
    },
    Appended {
        name: String,
        kind: OptionKind,
    },
}

impl fmt::Display for RuleChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleChange::Removed { name } => write!(f, "removed '{name}'"),
            RuleChange::DefaultChoiceSet { name, from, to, .. } => match from {
                Some(prev) => write!(f, "'{name}' default {prev} -> {to}"),
                None => write!(f, "'{name}' default unset -> {to}"),
            },
            RuleChange::Appended { name, kind } => write!(f, "appended '{name}' ({kind})"),
        }
    }
}

/// Result of applying a [`RuleSet`] to one record's options.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleOutcome {
    pub options: Vec<ProductOption>,
    /// `true` iff at least one step altered the sequence. Sole write-back trigger.
    pub changed: bool,
    pub changes: Vec<RuleChange>,
}

impl RuleOutcome {
    /// Human-readable summary of the changes, `"; "`-joined.
    pub fn describe(&self) -> String {
        self.changes
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}
