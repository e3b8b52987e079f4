//! Configuration paths
//!
//! Utilities for resolving configuration file paths.

use std::path::PathBuf;

/// Get the configuration directory
pub fn config_dir() -> PathBuf {
    // Check for explicit override
    if let Ok(dir) = std::env::var("CODEPREP_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    // Use XDG config directory or fallback
    dirs::config_dir()
        .map(|d| d.join("codeprep"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".config").join("codeprep"))
                .unwrap_or_else(|| PathBuf::from(".codeprep"))
        })
}

/// Get the main configuration file path
pub fn config_path() -> PathBuf {
    // Check for explicit override
    if let Ok(path) = std::env::var("CODEPREP_CONFIG") {
        return PathBuf::from(path);
    }

    let dir = config_dir();
    let toml = dir.join("config.toml");
    if toml.exists() {
        return toml;
    }
    dir.join("config.json")
}
