//! Configuration types module

pub mod sandbox;

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Remote judge configuration
    #[serde(default)]
    pub judge: sandbox::JudgeConfig,

    /// Local fallback executor configuration
    #[serde(default)]
    pub local: sandbox::LocalConfig,
}

impl Config {
    /// Load configuration from environment variables and files
    ///
    /// It loads configuration from:
    /// 1. Default values
    /// 2. Config file (if present)
    /// 3. Environment variable overrides
    pub fn from_env() -> crate::error::Result<Self> {
        crate::config::load_config()
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum number of test cases accepted by one submission
    #[serde(default = "default_max_test_cases")]
    pub max_test_cases: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
            bind: default_bind(),
            max_test_cases: default_max_test_cases(),
        }
    }
}

fn default_port() -> u16 {
    5000
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_max_test_cases() -> usize {
    50
}
