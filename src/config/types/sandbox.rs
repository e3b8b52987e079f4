//! Execution backend configuration types
//!
//! Configuration for the remote judge and the local fallback executor.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Remote judge (sandbox service) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeConfig {
    /// Base URL of the judge service. `None` disables the remote path.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Auth token sent with every request
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,
    /// Header carrying `api_key`
    #[serde(default = "default_auth_header")]
    pub auth_header: String,
    /// Delay between status polls
    #[serde(with = "humantime_serde", default = "default_poll_interval")]
    pub poll_interval: Duration,
    /// Polls before giving up and falling back
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
    /// Per-request HTTP timeout
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,
    /// Resource limits forwarded with each submission
    #[serde(default)]
    pub limits: ResourceLimits,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        JudgeConfig {
            base_url: None,
            api_key: None,
            auth_header: default_auth_header(),
            poll_interval: default_poll_interval(),
            max_poll_attempts: default_max_poll_attempts(),
            request_timeout: default_request_timeout(),
            limits: ResourceLimits::default(),
        }
    }
}

impl JudgeConfig {
    /// Whether a judge endpoint is configured
    pub fn is_enabled(&self) -> bool {
        self.base_url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}

fn default_auth_header() -> String {
    "X-Auth-Token".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_max_poll_attempts() -> u32 {
    10
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Limits the judge enforces on a submission
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// CPU time ceiling in seconds
    #[serde(default = "default_cpu_time")]
    pub cpu_time_limit: f64,
    /// Memory ceiling in kilobytes
    #[serde(default = "default_memory")]
    pub memory_limit: u64,
    /// Wall-clock ceiling in seconds
    #[serde(default = "default_wall_time")]
    pub wall_time_limit: f64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        ResourceLimits {
            cpu_time_limit: default_cpu_time(),
            memory_limit: default_memory(),
            wall_time_limit: default_wall_time(),
        }
    }
}

fn default_cpu_time() -> f64 {
    2.0
}

fn default_memory() -> u64 {
    128_000
}

fn default_wall_time() -> f64 {
    5.0
}

/// Local fallback executor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Directory that holds per-run workspaces
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
    /// Wall-clock limit covering compile and run
    #[serde(with = "humantime_serde", default = "default_local_timeout")]
    pub timeout: Duration,
    /// Maximum number of local executions running at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Maximum bytes kept from each of stdout/stderr
    #[serde(default = "default_max_output")]
    pub max_output_bytes: usize,
}

impl Default for LocalConfig {
    fn default() -> Self {
        LocalConfig {
            scratch_dir: default_scratch_dir(),
            timeout: default_local_timeout(),
            max_concurrent: default_max_concurrent(),
            max_output_bytes: default_max_output(),
        }
    }
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("codeprep")
}

fn default_local_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_concurrent() -> usize {
    4
}

fn default_max_output() -> usize {
    1024 * 1024 // 1MB
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_judge_config_default() {
        let config = JudgeConfig::default();
        assert!(!config.is_enabled());
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.max_poll_attempts, 10);
    }

    #[test]
    fn test_local_config_from_toml() {
        let config: LocalConfig = toml::from_str(
            r#"
            timeout = "3s"
            max_concurrent = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.max_concurrent, 2);
        assert_eq!(config.max_output_bytes, 1024 * 1024);
    }

    #[test]
    fn test_blank_base_url_is_disabled() {
        let config = JudgeConfig {
            base_url: Some("  ".to_string()),
            ..JudgeConfig::default()
        };
        assert!(!config.is_enabled());
    }
}
