//! Configuration module
//!
//! - types/mod.rs: Core configuration types (Config, ServerConfig)
//! - types/sandbox.rs: Judge and local executor configuration
//! - io.rs: Configuration loading and saving
//! - validation.rs: Configuration validation
//! - paths.rs: Configuration file paths

mod io;
mod paths;
mod types;
mod validation;

pub use types::{Config, ServerConfig};

pub use types::sandbox::{JudgeConfig, LocalConfig, ResourceLimits};

pub use io::{
    apply_env_overrides, load_config, load_config_from_path, read_config_snapshot, save_config,
    ConfigSnapshot,
};
pub use paths::{config_dir, config_path};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};
