//! Config loader — reads `~/.maildraft/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.maildraft/config.json` (or `--config`)
//! 3. Deployment env vars (`IMAP_HOST`, `SMTP_PASS`, `DEEPSEEK_API_KEY`, ...)
//! 4. Namespaced env vars `MAILDRAFT_<SECTION>__<FIELD>`

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info, warn};

use super::schema::{Config, DeliveryMode};
use crate::error::ConfigError;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from `path` (or the default path) plus env vars.
///
/// A missing file means defaults. A file that exists but cannot be read or
/// parsed is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    let config = load_config_from_path(&config_path)?;
    Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
}

/// Load config from a specific file path, without env overrides.
fn load_config_from_path(path: &Path) -> Result<Config, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No config file found at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    debug!("Loaded config from {}", path.display());

    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> Result<(), ConfigError> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    let write_err = |source: std::io::Error| ConfigError::Write {
        path: config_path.clone(),
        source,
    };

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| write_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

    std::fs::write(&config_path, json).map_err(write_err)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Env var holding the API key for a provider, e.g. `deepseek` → `DEEPSEEK_API_KEY`.
pub fn provider_key_var(provider: &str) -> String {
    format!("{}_API_KEY", provider.trim().to_uppercase().replace('-', "_"))
}

/// Apply environment variable overrides on top of a loaded config.
///
/// `lookup` returns the value of an env var; tests pass a map instead of the
/// process environment.
///
/// Deployment names (applied first):
/// - `IMAP_HOST`, `IMAP_PORT`, `IMAP_USER`, `IMAP_PASS`, `DRAFTS_FOLDER`
/// - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USER`, `SMTP_PASS`
/// - `<PROVIDER>_API_KEY` for the selected provider
/// - `BATCH_LIMIT`, `REPLY_MODE`
///
/// Namespaced names (applied last, win over everything):
/// - `MAILDRAFT_MAILBOX__HOST`, `MAILDRAFT_MAILBOX__PORT`, ...
/// - `MAILDRAFT_RELAY__HOST`, ...
/// - `MAILDRAFT_COMPLETION__PROVIDER`, `MAILDRAFT_COMPLETION__API_KEY`, ...
/// - `MAILDRAFT_PIPELINE__MODE`, `MAILDRAFT_PIPELINE__BATCH_LIMIT`, ...
pub fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    // Deployment names
    set_string(&lookup, "IMAP_HOST", &mut config.mailbox.host);
    set_parsed(&lookup, "IMAP_PORT", &mut config.mailbox.port);
    set_string(&lookup, "IMAP_USER", &mut config.mailbox.username);
    set_string(&lookup, "IMAP_PASS", &mut config.mailbox.password);
    set_string(&lookup, "DRAFTS_FOLDER", &mut config.mailbox.drafts_folder);

    set_string(&lookup, "SMTP_HOST", &mut config.relay.host);
    set_parsed(&lookup, "SMTP_PORT", &mut config.relay.port);
    set_string(&lookup, "SMTP_USER", &mut config.relay.username);
    set_string(&lookup, "SMTP_PASS", &mut config.relay.password);

    set_parsed(&lookup, "BATCH_LIMIT", &mut config.pipeline.batch_limit);
    set_mode(&lookup, "REPLY_MODE", &mut config.pipeline.mode);

    // Mailbox
    set_string(&lookup, "MAILDRAFT_MAILBOX__HOST", &mut config.mailbox.host);
    set_parsed(&lookup, "MAILDRAFT_MAILBOX__PORT", &mut config.mailbox.port);
    set_string(&lookup, "MAILDRAFT_MAILBOX__USERNAME", &mut config.mailbox.username);
    set_string(&lookup, "MAILDRAFT_MAILBOX__PASSWORD", &mut config.mailbox.password);
    set_bool(&lookup, "MAILDRAFT_MAILBOX__USE_SSL", &mut config.mailbox.use_ssl);
    set_string(&lookup, "MAILDRAFT_MAILBOX__INBOX", &mut config.mailbox.inbox);
    set_string(&lookup, "MAILDRAFT_MAILBOX__DRAFTS_FOLDER", &mut config.mailbox.drafts_folder);
    set_string(&lookup, "MAILDRAFT_MAILBOX__FROM_ADDRESS", &mut config.mailbox.from_address);
    set_parsed(&lookup, "MAILDRAFT_MAILBOX__TIMEOUT_SECS", &mut config.mailbox.timeout_secs);

    // Relay
    set_string(&lookup, "MAILDRAFT_RELAY__HOST", &mut config.relay.host);
    set_parsed(&lookup, "MAILDRAFT_RELAY__PORT", &mut config.relay.port);
    set_string(&lookup, "MAILDRAFT_RELAY__USERNAME", &mut config.relay.username);
    set_string(&lookup, "MAILDRAFT_RELAY__PASSWORD", &mut config.relay.password);
    set_bool(&lookup, "MAILDRAFT_RELAY__USE_TLS", &mut config.relay.use_tls);
    set_bool(&lookup, "MAILDRAFT_RELAY__USE_SSL", &mut config.relay.use_ssl);
    set_parsed(&lookup, "MAILDRAFT_RELAY__TIMEOUT_SECS", &mut config.relay.timeout_secs);

    // Completion. The provider is resolved first so its key variable is known.
    set_string(&lookup, "MAILDRAFT_COMPLETION__PROVIDER", &mut config.completion.provider);
    let key_var = provider_key_var(&config.completion.provider);
    set_string(&lookup, &key_var, &mut config.completion.api_key);
    set_string(&lookup, "MAILDRAFT_COMPLETION__API_KEY", &mut config.completion.api_key);
    if let Some(val) = lookup("MAILDRAFT_COMPLETION__API_BASE") {
        config.completion.api_base = Some(val);
    }
    if let Some(val) = lookup("MAILDRAFT_COMPLETION__MODEL") {
        config.completion.model = Some(val);
    }
    set_parsed(&lookup, "MAILDRAFT_COMPLETION__MAX_TOKENS", &mut config.completion.max_tokens);
    set_parsed(&lookup, "MAILDRAFT_COMPLETION__TEMPERATURE", &mut config.completion.temperature);
    set_parsed(&lookup, "MAILDRAFT_COMPLETION__TIMEOUT_SECS", &mut config.completion.timeout_secs);

    // Pipeline
    set_mode(&lookup, "MAILDRAFT_PIPELINE__MODE", &mut config.pipeline.mode);
    set_parsed(&lookup, "MAILDRAFT_PIPELINE__BATCH_LIMIT", &mut config.pipeline.batch_limit);
    set_string(&lookup, "MAILDRAFT_PIPELINE__PROCESSED_FILE", &mut config.pipeline.processed_file);
    set_parsed(&lookup, "MAILDRAFT_PIPELINE__MAX_BODY_CHARS", &mut config.pipeline.max_body_chars);

    config
}

fn set_string<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, target: &mut String) {
    if let Some(val) = lookup(key) {
        *target = val;
    }
}

fn set_bool<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, target: &mut bool) {
    if let Some(val) = lookup(key) {
        *target = val == "true" || val == "1";
    }
}

fn set_parsed<T, F>(lookup: &F, key: &str, target: &mut T)
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup(key) {
        match val.trim().parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!("Ignoring {key}={val}: not a valid value"),
        }
    }
}

fn set_mode<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, target: &mut DeliveryMode) {
    if let Some(val) = lookup(key) {
        match val.parse::<DeliveryMode>() {
            Ok(mode) => *target = mode,
            Err(e) => warn!("Ignoring {key}: {e}"),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_missing_file() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json")).unwrap();
        assert_eq!(config.pipeline.batch_limit, 5);
        assert_eq!(config.mailbox.port, 993);
    }

    #[test]
    fn test_load_unreachable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let err = load_config_from_path(&blocker.join("config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(
            r#"{
            "mailbox": {
                "host": "imap.example.com",
                "username": "me@example.com"
            },
            "completion": {
                "model": "deepseek-reasoner",
                "maxTokens": 800
            }
        }"#,
        );

        let config = load_config_from_path(file.path()).unwrap();
        assert_eq!(config.mailbox.host, "imap.example.com");
        assert_eq!(config.completion.model.as_deref(), Some("deepseek-reasoner"));
        assert_eq!(config.completion.max_tokens, 800);
        // Default preserved
        assert_eq!(config.completion.temperature, 0.2);
    }

    #[test]
    fn test_load_invalid_json_is_an_error() {
        let file = write_temp_json("not valid json {{{");
        let err = load_config_from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_wrong_type_is_an_error() {
        let file = write_temp_json(r#"{ "mailbox": { "port": "not-a-port" } }"#);
        assert!(load_config_from_path(file.path()).is_err());
    }

    #[test]
    fn test_load_empty_json() {
        let file = write_temp_json("{}");
        let config = load_config_from_path(file.path()).unwrap();
        assert_eq!(config.completion.provider, "deepseek");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.mailbox.host = "imap.example.com".to_string();
        config.completion.api_key = "sk-test".to_string();

        save_config(&config, Some(&path)).unwrap();

        let reloaded = load_config_from_path(&path).unwrap();
        assert_eq!(reloaded.mailbox.host, "imap.example.com");
        assert_eq!(reloaded.completion.api_key, "sk-test");
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_config(&Config::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert!(raw["completion"].get("maxTokens").is_some());
        assert!(raw["completion"].get("max_tokens").is_none());
    }

    #[test]
    fn test_deployment_env_vars() {
        let config = apply_env_overrides(
            Config::default(),
            env(&[
                ("IMAP_HOST", "imap.mail.ru"),
                ("IMAP_PORT", "1993"),
                ("IMAP_USER", "user@mail.ru"),
                ("IMAP_PASS", "app-password"),
                ("SMTP_HOST", "smtp.mail.ru"),
                ("DEEPSEEK_API_KEY", "sk-deepseek"),
                ("DRAFTS_FOLDER", "Черновики"),
                ("BATCH_LIMIT", "3"),
                ("REPLY_MODE", "send"),
            ]),
        );

        assert_eq!(config.mailbox.host, "imap.mail.ru");
        assert_eq!(config.mailbox.port, 1993);
        assert_eq!(config.mailbox.username, "user@mail.ru");
        assert_eq!(config.mailbox.password, "app-password");
        assert_eq!(config.relay.host, "smtp.mail.ru");
        assert_eq!(config.completion.api_key, "sk-deepseek");
        assert_eq!(config.mailbox.drafts_folder, "Черновики");
        assert_eq!(config.pipeline.batch_limit, 3);
        assert_eq!(config.pipeline.mode, DeliveryMode::Send);
    }

    #[test]
    fn test_key_follows_selected_provider() {
        let config = apply_env_overrides(
            Config::default(),
            env(&[
                ("MAILDRAFT_COMPLETION__PROVIDER", "openai"),
                ("DEEPSEEK_API_KEY", "sk-deepseek"),
                ("OPENAI_API_KEY", "sk-openai"),
            ]),
        );
        assert_eq!(config.completion.provider, "openai");
        assert_eq!(config.completion.api_key, "sk-openai");
    }

    #[test]
    fn test_namespaced_wins_over_deployment() {
        let config = apply_env_overrides(
            Config::default(),
            env(&[
                ("IMAP_HOST", "plain.example.com"),
                ("MAILDRAFT_MAILBOX__HOST", "namespaced.example.com"),
                ("MAILDRAFT_PIPELINE__BATCH_LIMIT", "9"),
                ("MAILDRAFT_MAILBOX__USE_SSL", "false"),
            ]),
        );
        assert_eq!(config.mailbox.host, "namespaced.example.com");
        assert_eq!(config.pipeline.batch_limit, 9);
        assert!(!config.mailbox.use_ssl);
    }

    #[test]
    fn test_unparsable_env_value_is_ignored() {
        let config = apply_env_overrides(
            Config::default(),
            env(&[("IMAP_PORT", "imaps"), ("REPLY_MODE", "later")]),
        );
        assert_eq!(config.mailbox.port, 993);
        assert_eq!(config.pipeline.mode, DeliveryMode::Draft);
    }

    #[test]
    fn test_provider_key_var() {
        assert_eq!(provider_key_var("deepseek"), "DEEPSEEK_API_KEY");
        assert_eq!(provider_key_var("open-router"), "OPEN_ROUTER_API_KEY");
    }
}
