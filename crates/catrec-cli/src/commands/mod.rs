//! Command handler modules for catrec-cli.
//!
//! Shared utilities used by multiple command paths live here.

pub mod run;

use anyhow::Result;
use catrec_config::{load_layered_yaml, report_unused_keys, LoadedConfig, UnusedKeyPolicy};

/// Load layered YAML and print any unused keys to stderr.
pub fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = load_layered_yaml(&path_refs)?;

    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    if !report.is_clean() {
        eprintln!(
            "WARN: CONFIG_UNUSED_KEYS unused_leaf_keys={}",
            report.unused_leaf_pointers.len()
        );
        for p in report.unused_leaf_pointers.iter().take(50) {
            eprintln!("  unused={}", p);
        }
        let extra = report.unused_leaf_pointers.len().saturating_sub(50);
        if extra > 0 {
            eprintln!("  ... and {} more", extra);
        }
    }

    Ok(loaded)
}
