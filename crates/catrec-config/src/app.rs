use crate::secrets::{process_env, read_str_at, resolve_secrets_with};
use crate::LoadedConfig;
use anyhow::{anyhow, bail, Context, Result};
use catrec_catalog::MAX_PAGE_SIZE;
use catrec_rules::{reference_thresholds, DefaultChoiceThreshold, RuleSet};
use catrec_schemas::ProductOption;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PACING_MS: u64 = 200;
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Remote catalog endpoint and run scope.
#[derive(Clone)]
pub struct CatalogSettings {
    pub base_url: String,
    pub token: String,
    pub category_id: String,
    pub page_size: u32,
    pub pacing: Duration,
}

impl std::fmt::Debug for CatalogSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogSettings")
            .field("base_url", &"<REDACTED>")
            .field("token", &"<REDACTED>")
            .field("category_id", &self.category_id)
            .field("page_size", &self.page_size)
            .field("pacing", &self.pacing)
            .finish()
    }
}

#[derive(Clone)]
pub struct NotifySettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: Vec<String>,
}

impl std::fmt::Debug for NotifySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifySettings")
            .field("host", &"<REDACTED>")
            .field("port", &self.port)
            .field("username", &"<REDACTED>")
            .field("password", &"<REDACTED>")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

/// Everything a run needs, built once before any network call.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub catalog: CatalogSettings,
    pub rules: RuleSet,
    pub notify: NotifySettings,
    pub config_hash: String,
}

impl AppConfig {
    /// Resolve against the process environment.
    pub fn resolve(loaded: &LoadedConfig) -> Result<Self> {
        Self::resolve_with_env(loaded, &process_env)
    }

    /// Resolve with an explicit env lookup. Fails on the first missing or
    /// invalid setting; secrets are checked last.
    pub fn resolve_with_env(
        loaded: &LoadedConfig,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let cfg = &loaded.config_json;

        let category_id = read_id_at(cfg, "/catalog/category_id")
            .ok_or_else(|| missing("/catalog/category_id"))?;
        let page_size = read_u64_at(cfg, "/catalog/page_size")?
            .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
            .unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            bail!(
                "CONFIG_INVALID: /catalog/page_size must be within 1..={MAX_PAGE_SIZE}, got {page_size}"
            );
        }
        let pacing_ms = read_u64_at(cfg, "/catalog/pacing_ms")?.unwrap_or(DEFAULT_PACING_MS);

        let rules = parse_rules(cfg)?;

        let from = read_str_at(cfg, "/notify/from").ok_or_else(|| missing("/notify/from"))?;
        let to = parse_recipients(cfg)?;
        let port = match read_u64_at(cfg, "/notify/smtp_port")? {
            None => DEFAULT_SMTP_PORT,
            Some(p) => u16::try_from(p)
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| anyhow!("CONFIG_INVALID: /notify/smtp_port out of range: {p}"))?,
        };

        let secrets = resolve_secrets_with(cfg, lookup)?;

        Ok(Self {
            catalog: CatalogSettings {
                base_url: secrets.catalog_base_url,
                token: secrets.catalog_token,
                category_id,
                page_size,
                pacing: Duration::from_millis(pacing_ms),
            },
            rules,
            notify: NotifySettings {
                host: secrets.smtp_host,
                port,
                username: secrets.smtp_username,
                password: secrets.smtp_password,
                from,
                to,
            },
            config_hash: loaded.config_hash.clone(),
        })
    }
}

fn missing(pointer: &str) -> anyhow::Error {
    anyhow!("CONFIG_MISSING: required setting '{pointer}' is not set or empty")
}

/// Category ids arrive as YAML numbers or strings.
fn read_id_at(cfg: &Value, pointer: &str) -> Option<String> {
    match cfg.pointer(pointer)? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(_) => read_str_at(cfg, pointer),
        _ => None,
    }
}

fn read_u64_at(cfg: &Value, pointer: &str) -> Result<Option<u64>> {
    match cfg.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| anyhow!("CONFIG_INVALID: {pointer} must be a non-negative integer")),
    }
}

fn parse_recipients(cfg: &Value) -> Result<Vec<String>> {
    let list = match cfg.pointer("/notify/to") {
        None | Some(Value::Null) => return Err(missing("/notify/to")),
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(|s| s.to_string())
                    .ok_or_else(|| anyhow!("CONFIG_INVALID: /notify/to entries must be strings"))
            })
            .collect::<Result<Vec<_>>>()?,
        Some(_) => bail!("CONFIG_INVALID: /notify/to must be a string or a list of strings"),
    };

    let to: Vec<String> = list
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if to.is_empty() {
        return Err(missing("/notify/to"));
    }
    Ok(to)
}

fn parse_rules(cfg: &Value) -> Result<RuleSet> {
    let target =
        read_str_at(cfg, "/rules/target_option").ok_or_else(|| missing("/rules/target_option"))?;

    let thresholds: Vec<DefaultChoiceThreshold> =
        match cfg.pointer("/rules/default_choice_thresholds") {
            None | Some(Value::Null) => reference_thresholds(),
            Some(v) => serde_json::from_value(v.clone())
                .context("CONFIG_INVALID: /rules/default_choice_thresholds")?,
        };

    let remove: Vec<String> = match cfg.pointer("/rules/remove_options") {
        None | Some(Value::Null) => Vec::new(),
        Some(v) => {
            serde_json::from_value(v.clone()).context("CONFIG_INVALID: /rules/remove_options")?
        }
    };

    let ensure_present: Option<ProductOption> = match cfg.pointer("/rules/ensure_present") {
        None | Some(Value::Null) => None,
        Some(v) => Some(
            serde_json::from_value(v.clone()).context("CONFIG_INVALID: /rules/ensure_present")?,
        ),
    };

    let mut rules = RuleSet::reference(target).with_removed(&remove);
    rules.thresholds = thresholds;
    rules.ensure_present = ensure_present;

    rules
        .validate()
        .map_err(|e| anyhow!("CONFIG_INVALID: rules: {e}"))?;
    Ok(rules)
}
