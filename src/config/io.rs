//! Configuration I/O - Loading and saving configuration
//!
//! Handles reading configuration from files and environment variables.

use secrecy::SecretString;
use std::path::Path;
use std::time::Duration;

use super::types::Config;
use crate::error::{Error, Result};

/// A snapshot of the configuration file
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    /// Path to the config file
    pub path: std::path::PathBuf,
    /// Whether the file exists
    pub exists: bool,
    /// Parsed configuration
    pub config: Option<Config>,
    /// Problems found while reading
    pub issues: Vec<String>,
}

/// Load configuration with layered precedence:
/// 1. Config file (config.json or config.toml) if it exists, otherwise defaults
/// 2. Environment variable overrides (includes .env)
pub fn load_config() -> Result<Config> {
    let config_path = super::paths::config_path();

    let mut config = if config_path.exists() {
        load_config_from_path(&config_path)?
    } else {
        Config::default()
    };

    apply_env_overrides(&mut config);

    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    // Detect format by extension
    let config: Config = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))?
    } else if path.extension().is_some_and(|ext| ext == "json") {
        // JSON5 is a superset of JSON and allows comments
        json5::from_str(&content).map_err(|e| Error::Config(format!("Invalid JSON config: {}", e)))?
    } else {
        json5::from_str(&content)
            .or_else(|_| toml::from_str(&content).map_err(|e| Error::Config(e.to_string())))
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?
    };

    Ok(config)
}

/// Apply environment variable overrides to an existing config.
///
/// Loads `.env` first, then overlays any set variables. Env vars have the
/// highest precedence: defaults < file < env.
pub fn apply_env_overrides(config: &mut Config) {
    dotenvy::dotenv().ok();
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides from an arbitrary key lookup.
pub(crate) fn apply_overrides_from<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // Judge overrides
    if let Some(url) = lookup("JUDGE_BASE_URL") {
        config.judge.base_url = Some(url);
    }
    if let Some(key) = lookup("JUDGE_API_KEY") {
        config.judge.api_key = Some(SecretString::from(key));
    }
    if let Some(header) = lookup("JUDGE_AUTH_HEADER") {
        config.judge.auth_header = header;
    }
    if let Some(interval) = lookup("JUDGE_POLL_INTERVAL").and_then(|v| parse_duration(&v)) {
        config.judge.poll_interval = interval;
    }
    if let Some(attempts) = lookup("JUDGE_MAX_POLL_ATTEMPTS").and_then(|v| v.parse().ok()) {
        config.judge.max_poll_attempts = attempts;
    }
    if let Some(timeout) = lookup("JUDGE_REQUEST_TIMEOUT").and_then(|v| parse_duration(&v)) {
        config.judge.request_timeout = timeout;
    }

    // Local executor overrides
    if let Some(dir) = lookup("CODEPREP_SCRATCH_DIR") {
        config.local.scratch_dir = std::path::PathBuf::from(dir);
    }
    if let Some(timeout) = lookup("LOCAL_EXEC_TIMEOUT").and_then(|v| parse_duration(&v)) {
        config.local.timeout = timeout;
    }
    if let Some(max) = lookup("LOCAL_MAX_CONCURRENT").and_then(|v| v.parse().ok()) {
        config.local.max_concurrent = max;
    }

    // Server overrides
    if let Some(bind) = lookup("CODEPREP_BIND") {
        config.server.bind = bind;
    }
    if let Some(port) = lookup("CODEPREP_PORT").and_then(|v| v.parse().ok()) {
        config.server.port = port;
    }
}

/// Parse "10s", "500ms" or a bare number of seconds
fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    humantime_serde::re::humantime::parse_duration(value).ok()
}

/// Save configuration to a file
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let content = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    } else {
        serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, content)?;
    Ok(())
}

/// Read a configuration file into a snapshot
pub fn read_config_snapshot(path: &Path) -> ConfigSnapshot {
    if !path.exists() {
        return ConfigSnapshot {
            path: path.to_path_buf(),
            exists: false,
            config: None,
            issues: vec!["Configuration file does not exist".to_string()],
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigSnapshot {
            path: path.to_path_buf(),
            exists: true,
            config: Some(config),
            issues: Vec::new(),
        },
        Err(e) => ConfigSnapshot {
            path: path.to_path_buf(),
            exists: true,
            config: None,
            issues: vec![e.to_string()],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test_config.json");

        let mut config = Config::default();
        config.judge.base_url = Some("http://judge:2358".to_string());
        save_config(&config, &path).unwrap();

        let loaded = load_config_from_path(&path).unwrap();
        assert_eq!(loaded.judge.base_url, config.judge.base_url);
        assert_eq!(loaded.local.timeout, config.local.timeout);
    }

    #[test]
    fn test_load_toml_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[judge]\nbase_url = \"http://judge\"\npoll_interval = \"250ms\"\n",
        )
        .unwrap();

        let loaded = load_config_from_path(&path).unwrap();
        assert_eq!(loaded.judge.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("JUDGE_BASE_URL", "http://judge0:2358"),
            ("JUDGE_API_KEY", "secret"),
            ("JUDGE_MAX_POLL_ATTEMPTS", "3"),
            ("LOCAL_EXEC_TIMEOUT", "5"),
            ("LOCAL_MAX_CONCURRENT", "not-a-number"),
            ("CODEPREP_PORT", "9000"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_overrides_from(&mut config, |k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.judge.base_url.as_deref(), Some("http://judge0:2358"));
        assert_eq!(
            config.judge.api_key.as_ref().map(|k| k.expose_secret().to_string()),
            Some("secret".to_string())
        );
        assert_eq!(config.judge.max_poll_attempts, 3);
        assert_eq!(config.local.timeout, Duration::from_secs(5));
        // Unparseable values keep the previous setting
        assert_eq!(config.local.max_concurrent, 4);
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_snapshot_of_missing_file() {
        let dir = tempdir().unwrap();
        let snapshot = read_config_snapshot(&dir.path().join("nope.json"));
        assert!(!snapshot.exists);
        assert!(snapshot.config.is_none());
        assert_eq!(snapshot.issues.len(), 1);
    }
}
