//! catrec-config
//!
//! Layered YAML configuration for a reconcile run.
//!
//! - YAML documents merge in order: earlier docs are base, later docs override.
//! - The merged document is canonicalized and hashed so every run report can
//!   name exactly which configuration produced it.
//! - Secrets never appear in YAML. The YAML names environment variables; see
//!   [`secrets`]. Literal secret-looking values are rejected at load time.
//! - [`AppConfig::resolve`] turns the merged document into one immutable
//!   structure before any network call is made.

mod app;
pub mod secrets;

pub use app::{AppConfig, CatalogSettings, NotifySettings};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;

/// If any leaf string in the merged config starts with one of these, loading
/// aborts with CONFIG_SECRET_DETECTED.
const SECRET_PREFIXES: &[&str] = &[
    "secret_", // catalog API tokens
    "sk-",
    "sk_live",
    "sk_test",
    "AKIA",       // AWS access key ID
    "-----BEGIN", // PEM private keys
    "ghp_",
    "glpat-",
    "xoxb-",
];

/// Exact pointers `AppConfig::resolve` and `secrets` read. A pointer covers
/// its subtree (a threshold list, the ensure-present template). Anything else,
/// including a misspelled key inside a known section, is unused.
pub const CONSUMED_POINTERS: &[&str] = &[
    "/catalog/category_id",
    "/catalog/page_size",
    "/catalog/pacing_ms",
    "/catalog/base_url_env",
    "/catalog/token_env",
    "/rules/target_option",
    "/rules/default_choice_thresholds",
    "/rules/remove_options",
    "/rules/ensure_present",
    "/notify/from",
    "/notify/to",
    "/notify/smtp_port",
    "/notify/smtp_host_env",
    "/notify/smtp_username_env",
    "/notify/smtp_password_env",
];

/// Rule values are catalog option names and choice texts, not credentials.
const SECRET_SCAN_EXEMPT: &[&str] = &["/rules"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Minimal set of unused leaf pointers (sorted)
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Report config leaves not covered by [`CONSUMED_POINTERS`].
///
/// `Fail` turns a non-clean report into an error; `Warn` always returns it.
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let consumed: BTreeSet<String> = CONSUMED_POINTERS
        .iter()
        .map(|p| normalize_pointer(p))
        .collect();

    let mut leaves: Vec<String> = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);

    let mut unused: Vec<String> = leaves
        .into_iter()
        .filter(|lp| !consumed.iter().any(|cp| is_prefix_pointer(cp, lp)))
        .collect();
    unused.sort();
    unused.dedup();

    let report = UnusedKeyReport {
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNUSED_KEYS: {} unused config leaf key(s). First few: {:?}",
            report.unused_leaf_pointers.len(),
            report.unused_leaf_pointers.iter().take(12).collect::<Vec<_>>()
        );
    }

    Ok(report)
}

fn normalize_pointer(p: &str) -> String {
    let mut s = p.trim().to_string();
    if !s.starts_with('/') {
        s.insert(0, '/');
    }
    while s.ends_with('/') && s.len() > 1 {
        s.pop();
    }
    s
}

/// "/a/b" covers "/a/b" and "/a/b/c" but not "/a/bc".
fn is_prefix_pointer(prefix: &str, leaf: &str) -> bool {
    if prefix == "/" || leaf == prefix {
        return true;
    }
    leaf.strip_prefix(prefix)
        .map(|rest| rest.starts_with('/'))
        .unwrap_or(false)
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map.iter() {
                let token = k.replace('~', "~0").replace('/', "~1");
                collect_leaf_pointers(vv, &format!("{prefix}/{token}"), out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                collect_leaf_pointers(vv, &format!("{prefix}/{i}"), out);
            }
        }
        _ => out.push(if prefix.is_empty() {
            "/".to_string()
        } else {
            prefix.to_string()
        }),
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw = fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }
    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    enforce_no_secret_literals(&merged)?;

    let canonical_json =
        serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Objects merge key by key; any other value in `b` replaces `a` wholesale
/// (so a later layer's list replaces, never appends to, an earlier one).
fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let mut leaves = Vec::new();
    collect_leaf_pointers(v, "", &mut leaves);

    for ptr in leaves {
        if SECRET_SCAN_EXEMPT.iter().any(|p| is_prefix_pointer(p, &ptr)) {
            continue;
        }
        let Some(s) = v.pointer(&ptr).and_then(|val| val.as_str()) else {
            continue;
        };
        if looks_like_secret(s) {
            bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    t.len() >= 8 && SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_pointer_respects_segment_boundary() {
        assert!(is_prefix_pointer("/rules", "/rules/target_option"));
        assert!(is_prefix_pointer("/rules", "/rules"));
        assert!(!is_prefix_pointer("/rules", "/rulesets/x"));
        assert!(is_prefix_pointer("/", "/anything"));
    }

    #[test]
    fn later_layer_list_replaces_earlier() {
        let base = "rules:\n  remove_options: [A, B]\n";
        let over = "rules:\n  remove_options: [C]\n";
        let loaded = load_layered_yaml_from_strings(&[base, over]).unwrap();
        assert_eq!(
            loaded.config_json.pointer("/rules/remove_options"),
            Some(&serde_json::json!(["C"]))
        );
    }

    #[test]
    fn short_values_are_never_secrets() {
        assert!(!looks_like_secret("sk-1"));
        assert!(looks_like_secret("secret_abcdef123"));
    }

    #[test]
    fn rule_option_names_are_not_scanned_for_secrets() {
        let yaml = "rules:\n  remove_options: [\"secret_santa_note\"]\n  ensure_present:\n    name: \"secret_menu_pick\"\n    type: TEXTFIELD\n";
        let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
        assert_eq!(
            loaded.config_json.pointer("/rules/remove_options/0"),
            Some(&serde_json::json!("secret_santa_note"))
        );

        let err = load_layered_yaml_from_strings(&["notify:\n  from: \"secret_santa_note\"\n"])
            .unwrap_err()
            .to_string();
        assert!(err.contains("CONFIG_SECRET_DETECTED"), "{err}");
    }
}
