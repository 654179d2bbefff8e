//! Config loader — reads `~/.webnotify/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.webnotify/config.json` (or an explicit path)
//! 3. Environment variables `WEBNOTIFY_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, NotifierConfig, RateLimitConfig};

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from `path` (or the default location) plus env vars.
///
/// A missing, unreadable or malformed file is never fatal: the defaults are
/// used instead and the env overrides still apply.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    load_config_from_path(&config_path)
}

fn load_config_from_path(path: &Path) -> Config {
    let config = read_config_file(path).unwrap_or_default();
    apply_env_overrides(config)
}

/// Parse the JSON file at `path`; `None` (with a log line) when that fails.
fn read_config_file(path: &Path) -> Option<Config> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no config file, using defaults");
            return None;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read config file, using defaults");
            return None;
        }
    };

    debug!(path = %path.display(), "loaded config file");
    serde_json::from_str(&content)
        .map_err(|e| warn!(path = %path.display(), error = %e, "invalid config JSON, using defaults"))
        .ok()
}

/// Write `config` as pretty camelCase JSON, creating parent directories.
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;
    std::fs::write(&config_path, json)?;
    debug!(path = %config_path.display(), "config saved");
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `WEBNOTIFY_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `WEBNOTIFY_NOTIFIER__TG_API_KEY`, `__TG_CHANNEL_ID`, `__TG_API_BASE`,
///   `__TG_STRICT_RESPONSES`, `__HTTP_TIMEOUT_SECS`
/// - `WEBNOTIFY_NOTIFIER__SMTP_HOST`, `__SMTP_PORT`, `__SMTP_USERNAME`,
///   `__SMTP_PASSWORD`, `__FROM_EMAIL`, `__TO_EMAIL`
/// - `WEBNOTIFY_RATE_LIMITS__GLOBAL_CAPACITY`, `__GLOBAL_PER_SECOND`,
///   `__DESTINATION_CAPACITY`, `__DESTINATION_PER_SECOND`,
///   `__DESTINATION_PRUNE_THRESHOLD`
fn apply_env_overrides(mut config: Config) -> Config {
    apply_notifier_env(&mut config.notifier);
    apply_rate_limit_env(&mut config.rate_limits);
    config
}

fn notifier_var(field: &str) -> Option<String> {
    std::env::var(format!("WEBNOTIFY_NOTIFIER__{field}")).ok()
}

fn rate_limit_var(field: &str) -> Option<String> {
    std::env::var(format!("WEBNOTIFY_RATE_LIMITS__{field}")).ok()
}

fn parse_bool(val: &str) -> bool {
    val == "true" || val == "1"
}

fn apply_notifier_env(notifier: &mut NotifierConfig) {
    let strings: [(&str, &mut String); 8] = [
        ("TG_API_KEY", &mut notifier.tg_api_key),
        ("TG_CHANNEL_ID", &mut notifier.tg_channel_id),
        ("TG_API_BASE", &mut notifier.tg_api_base),
        ("SMTP_HOST", &mut notifier.smtp_host),
        ("SMTP_USERNAME", &mut notifier.smtp_username),
        ("SMTP_PASSWORD", &mut notifier.smtp_password),
        ("FROM_EMAIL", &mut notifier.from_email),
        ("TO_EMAIL", &mut notifier.to_email),
    ];
    for (field, slot) in strings {
        if let Some(val) = notifier_var(field) {
            *slot = val;
        }
    }

    if let Some(val) = notifier_var("SMTP_PORT") {
        match val.parse::<u16>() {
            Ok(p) => notifier.smtp_port = p,
            Err(e) => warn!("Ignoring invalid WEBNOTIFY_NOTIFIER__SMTP_PORT={}: {}", val, e),
        }
    }
    if let Some(val) = notifier_var("HTTP_TIMEOUT_SECS") {
        if let Ok(n) = val.parse::<u64>() {
            notifier.http_timeout_secs = n;
        }
    }
    if let Some(val) = notifier_var("TG_STRICT_RESPONSES") {
        notifier.tg_strict_responses = parse_bool(&val);
    }
}

fn apply_rate_limit_env(limits: &mut RateLimitConfig) {
    if let Some(n) = rate_limit_var("GLOBAL_CAPACITY").and_then(|v| v.parse().ok()) {
        limits.global_capacity = n;
    }
    if let Some(r) = rate_limit_var("GLOBAL_PER_SECOND").and_then(|v| v.parse().ok()) {
        limits.global_per_second = r;
    }
    if let Some(n) = rate_limit_var("DESTINATION_CAPACITY").and_then(|v| v.parse().ok()) {
        limits.destination_capacity = n;
    }
    if let Some(r) = rate_limit_var("DESTINATION_PER_SECOND").and_then(|v| v.parse().ok()) {
        limits.destination_per_second = r;
    }
    if let Some(n) = rate_limit_var("DESTINATION_PRUNE_THRESHOLD").and_then(|v| v.parse().ok()) {
        limits.destination_prune_threshold = n;
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
