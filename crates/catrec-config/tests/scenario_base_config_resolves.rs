//! scenario_base_config_resolves
//!
//! The shipped config/defaults/base.yaml loads, has no unused keys, and
//! resolves to the reference rule set once a category is layered on top.

use catrec_config::{
    load_layered_yaml, load_layered_yaml_from_strings, report_unused_keys, AppConfig,
    UnusedKeyPolicy,
};
use catrec_rules::reference_thresholds;
use std::path::Path;

fn base_yaml() -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config/defaults/base.yaml");
    std::fs::read_to_string(path).expect("base.yaml must exist")
}

fn env(name: &str) -> Option<String> {
    Some(format!("value-of-{name}"))
}

#[test]
fn base_config_is_clean_and_resolves() {
    let base = base_yaml();
    let loaded =
        load_layered_yaml_from_strings(&[base.as_str(), "catalog:\n  category_id: 194057007\n"])
            .unwrap();

    let unused = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(unused.is_clean());

    let cfg = AppConfig::resolve_with_env(&loaded, &env).unwrap();
    assert_eq!(cfg.catalog.category_id, "194057007");
    assert_eq!(cfg.catalog.token, "value-of-ECWID_API_TOKEN");
    assert_eq!(cfg.rules.thresholds, reference_thresholds());
    assert!(cfg.rules.ensure_present.is_none());
    assert_eq!(cfg.notify.port, 587);
}

#[test]
fn base_config_path_loads_from_disk() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/defaults/base.yaml");
    let loaded = load_layered_yaml(&[path.to_str().unwrap()]).unwrap();
    assert_eq!(loaded.config_hash.len(), 64);
}

#[test]
fn base_config_alone_is_missing_its_category() {
    let base = base_yaml();
    let loaded = load_layered_yaml_from_strings(&[base.as_str()]).unwrap();
    let err = AppConfig::resolve_with_env(&loaded, &env).unwrap_err().to_string();
    assert!(err.contains("CONFIG_MISSING"), "{err}");
    assert!(err.contains("/catalog/category_id"), "{err}");
}
