//! Runtime secret resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** (e.g. `catalog.token_env:
//!   "ECWID_API_TOKEN"`); absent names fall back to the defaults below.
//! - Secrets are resolved once at startup and passed into constructors.
//! - `Debug` output redacts every value.
//! - Error messages reference the env var **NAME**, never the value.
//!
//! All five secrets are required; the first missing one fails with
//! `CONFIG_MISSING`.

use anyhow::{bail, Result};
use serde_json::Value;

pub const DEFAULT_BASE_URL_ENV: &str = "ECWID_BASE_URL";
pub const DEFAULT_TOKEN_ENV: &str = "ECWID_API_TOKEN";
pub const DEFAULT_SMTP_HOST_ENV: &str = "SMTP_HOST";
pub const DEFAULT_SMTP_USERNAME_ENV: &str = "SMTP_USERNAME";
pub const DEFAULT_SMTP_PASSWORD_ENV: &str = "SMTP_PASSWORD";

/// Values resolved from the environment. **Redacted in `Debug`.**
#[derive(Clone)]
pub struct ResolvedSecrets {
    pub catalog_base_url: String,
    pub catalog_token: String,
    pub smtp_host: String,
    pub smtp_username: String,
    pub smtp_password: String,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The base URL embeds the store id; treat it like the rest.
        f.debug_struct("ResolvedSecrets")
            .field("catalog_base_url", &"<REDACTED>")
            .field("catalog_token", &"<REDACTED>")
            .field("smtp_host", &"<REDACTED>")
            .field("smtp_username", &"<REDACTED>")
            .field("smtp_password", &"<REDACTED>")
            .finish()
    }
}

/// Env var names read from the config, with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretEnvNames {
    pub base_url: String,
    pub token: String,
    pub smtp_host: String,
    pub smtp_username: String,
    pub smtp_password: String,
}

/// Non-empty, trimmed string at `pointer`.
pub(crate) fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn parse_env_names(config_json: &Value) -> SecretEnvNames {
    let name = |pointer: &str, default: &str| {
        read_str_at(config_json, pointer).unwrap_or_else(|| default.to_string())
    };
    SecretEnvNames {
        base_url: name("/catalog/base_url_env", DEFAULT_BASE_URL_ENV),
        token: name("/catalog/token_env", DEFAULT_TOKEN_ENV),
        smtp_host: name("/notify/smtp_host_env", DEFAULT_SMTP_HOST_ENV),
        smtp_username: name("/notify/smtp_username_env", DEFAULT_SMTP_USERNAME_ENV),
        smtp_password: name("/notify/smtp_password_env", DEFAULT_SMTP_PASSWORD_ENV),
    }
}

/// Process environment lookup; unset and blank are both `None`.
pub fn process_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve every secret through `lookup`.
///
/// `lookup` is [`process_env`] in production; tests pass a map.
pub fn resolve_secrets_with<F>(config_json: &Value, lookup: F) -> Result<ResolvedSecrets>
where
    F: Fn(&str) -> Option<String>,
{
    let names = parse_env_names(config_json);

    let require = |var: &str, what: &str| -> Result<String> {
        match lookup(var) {
            Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
            _ => bail!("CONFIG_MISSING: required env var '{var}' ({what}) is not set or empty"),
        }
    };

    Ok(ResolvedSecrets {
        catalog_base_url: require(&names.base_url, "catalog base url")?,
        catalog_token: require(&names.token, "catalog bearer token")?,
        smtp_host: require(&names.smtp_host, "smtp host")?,
        smtp_username: require(&names.smtp_username, "smtp username")?,
        smtp_password: require(&names.smtp_password, "smtp password")?,
    })
}

pub fn resolve_secrets(config_json: &Value) -> Result<ResolvedSecrets> {
    resolve_secrets_with(config_json, process_env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_apply_when_names_absent() {
        let names = parse_env_names(&json!({}));
        assert_eq!(names.base_url, DEFAULT_BASE_URL_ENV);
        assert_eq!(names.token, DEFAULT_TOKEN_ENV);
        assert_eq!(names.smtp_password, DEFAULT_SMTP_PASSWORD_ENV);
    }

    #[test]
    fn configured_names_override_defaults() {
        let names = parse_env_names(&json!({
            "catalog": { "token_env": "STAGING_CATALOG_TOKEN" }
        }));
        assert_eq!(names.token, "STAGING_CATALOG_TOKEN");
        assert_eq!(names.base_url, DEFAULT_BASE_URL_ENV);
    }

    #[test]
    fn debug_is_redacted() {
        let s = ResolvedSecrets {
            catalog_base_url: "https://app.example.test/api/v3/1".to_string(),
            catalog_token: "tok-value-1".to_string(),
            smtp_host: "smtp.example.test".to_string(),
            smtp_username: "user-value".to_string(),
            smtp_password: "pw-value".to_string(),
        };
        let dbg = format!("{s:?}");
        for v in ["tok-value-1", "user-value", "pw-value", "smtp.example.test"] {
            assert!(!dbg.contains(v), "debug leaked {v}");
        }
    }
}
