use crate::{RuleChange, RuleOutcome, RuleSet};
use catrec_schemas::ProductOption;

fn remove_listed(rules: &RuleSet, options: &mut Vec<ProductOption>, changes: &mut Vec<RuleChange>) {
    options.retain(|opt| {
        if rules.remove.contains(&opt.name) {
            changes.push(RuleChange::Removed {
                name: opt.name.clone(),
            });
            false
        } else {
            true
        }
    });
}

fn correct_default_choice(
    rules: &RuleSet,
    options: &mut [ProductOption],
    changes: &mut Vec<RuleChange>,
) {
    // Duplicate target names are each corrected on their own.
    for opt in options.iter_mut() {
        if opt.name != rules.target_option || opt.choices.is_empty() {
            continue;
        }

        let Some(desired) = rules.desired_default_index(opt.choices.len()) else {
            continue;
        };

        if opt.default_choice == Some(desired) {
            continue;
        }

        changes.push(RuleChange::DefaultChoiceSet {
            name: opt.name.clone(),
            from: opt.default_choice,
            to: desired,
            was_required: opt.required,
        });
        opt.default_choice = Some(desired);
        opt.required = false;
    }
}

fn ensure_present(rules: &RuleSet, options: &mut Vec<ProductOption>, changes: &mut Vec<RuleChange>) {
    let Some(tpl) = &rules.ensure_present else {
        return;
    };

    let present = options
        .iter()
        .any(|o| o.name == tpl.name && o.kind == tpl.kind);

    if !present {
        options.push(tpl.clone());
        changes.push(RuleChange::Appended {
            name: tpl.name.clone(),
            kind: tpl.kind.clone(),
        });
    }
}

/// Apply `rules` to `current`:
/// 1) drop options named in the removal set
/// 2) correct the target option's default choice (forces `required = false`)
/// 3) append the ensure-present template when no option matches name and kind
///
/// `changed` is never `true` for a no-op, so a second application to the
/// output reports `changed == false` and returns identical options.
pub fn apply_rules(rules: &RuleSet, current: &[ProductOption]) -> RuleOutcome {
    let mut options: Vec<ProductOption> = current.to_vec();
    let mut changes: Vec<RuleChange> = Vec::new();

    remove_listed(rules, &mut options, &mut changes);
    correct_default_choice(rules, &mut options, &mut changes);
    ensure_present(rules, &mut options, &mut changes);

    RuleOutcome {
        changed: !changes.is_empty(),
        options,
        changes,
    }
}

/// `true` when applying `rules` to `current` would require a write.
pub fn needs_update(rules: &RuleSet, current: &[ProductOption]) -> bool {
    apply_rules(rules, current).changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use catrec_schemas::OptionKind;

    fn variant(n: usize, default_choice: Option<u32>) -> ProductOption {
        let texts: Vec<String> = (0..n).map(|i| format!("c{i}")).collect();
        ProductOption::new("Variant", OptionKind::Select)
            .with_choices(&texts)
            .with_default_choice(default_choice)
    }

    #[test]
    fn empty_input_is_unchanged() {
        let out = apply_rules(&RuleSet::reference("Variant"), &[]);
        assert!(!out.changed);
        assert!(out.options.is_empty());
        assert!(out.changes.is_empty());
    }

    #[test]
    fn required_is_left_alone_when_default_already_correct() {
        let rules = RuleSet::reference("Variant");
        let opt = variant(3, Some(2)).with_required(true);
        let out = apply_rules(&rules, &[opt.clone()]);
        assert!(!out.changed);
        assert_eq!(out.options, vec![opt]);
    }

    #[test]
    fn other_option_names_are_untouched() {
        let rules = RuleSet::reference("Variant");
        let size = ProductOption::new("Size", OptionKind::Select)
            .with_choices(&["s", "m", "l"])
            .with_required(true);
        let out = apply_rules(&rules, &[size.clone()]);
        assert!(!out.changed);
        assert_eq!(out.options[0], size);
    }

    #[test]
    fn change_log_is_in_application_order() {
        let rules = RuleSet::reference("Variant")
            .with_removed(&["Message"])
            .with_ensure_present(ProductOption::new("Engraving", OptionKind::TextField));
        let input = vec![
            ProductOption::new("Message", OptionKind::TextArea),
            variant(2, None),
        ];

        let out = apply_rules(&rules, &input);
        assert_eq!(out.changes.len(), 3);
        assert!(matches!(out.changes[0], RuleChange::Removed { .. }));
        assert!(matches!(
            out.changes[1],
            RuleChange::DefaultChoiceSet { to: 1, from: None, .. }
        ));
        assert!(matches!(out.changes[2], RuleChange::Appended { .. }));
        assert_eq!(
            out.describe(),
            "removed 'Message'; 'Variant' default unset -> 1; appended 'Engraving' (TEXTFIELD)"
        );
    }

    #[test]
    fn needs_update_matches_changed_flag() {
        let rules = RuleSet::reference("Variant");
        assert!(needs_update(&rules, &[variant(3, Some(0))]));
        assert!(!needs_update(&rules, &[variant(3, Some(2))]));
    }
}
