//! scenario_rules_idempotent
//!
//! Applying the engine to its own output must report `changed == false` and
//! return the same options: no default-index thrash, no second ensure-present
//! insertion, nothing left to remove.

use catrec_rules::*;
use catrec_schemas::{OptionKind, ProductOption};

fn full_rules() -> RuleSet {
    RuleSet::reference("Variant")
        .with_removed(&["Message", "Gift note"])
        .with_ensure_present(
            ProductOption::new("Engraving", OptionKind::TextField).with_required(false),
        )
}

fn sample_inputs() -> Vec<Vec<ProductOption>> {
    let mut out = Vec::new();
    for n in 0..6usize {
        for default_choice in [None, Some(0), Some(1), Some(2)] {
            let texts: Vec<String> = (0..n).map(|i| format!("c{i}")).collect();
            out.push(vec![
                ProductOption::new("Message", OptionKind::TextArea),
                ProductOption::new("Variant", OptionKind::Select)
                    .with_choices(&texts)
                    .with_default_choice(default_choice)
                    .with_required(true),
                ProductOption::new("Gift note", OptionKind::TextField),
            ]);
        }
    }
    out.push(Vec::new());
    out.push(vec![ProductOption::new("Engraving", OptionKind::TextField).with_required(true)]);
    out
}

#[test]
fn second_application_is_a_noop() {
    let rules = full_rules();
    assert!(rules.validate().is_ok());

    for input in sample_inputs() {
        let first = apply_rules(&rules, &input);
        let second = apply_rules(&rules, &first.options);

        assert!(
            !second.changed,
            "second pass changed {:?} (first changes: {:?})",
            second.changes, first.changes
        );
        assert_eq!(second.options, first.options);
    }
}

#[test]
fn unchanged_output_equals_input() {
    let rules = full_rules();
    for input in sample_inputs() {
        let out = apply_rules(&rules, &input);
        if !out.changed {
            assert_eq!(out.options, input);
        }
    }
}
