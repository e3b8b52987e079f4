//! Configuration validation
//!
//! Validates configuration and reports issues.

use super::types::Config;

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    result = validate_judge_config(config, result);
    result = validate_local_config(config, result);

    result
}

fn validate_judge_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    let judge = &config.judge;

    match judge.base_url.as_deref() {
        Some(raw) if judge.is_enabled() => {
            match url::Url::parse(raw) {
                Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
                Ok(url) => {
                    result = result.with_error(ValidationIssue::new(
                        "judge.base_url",
                        format!("Unsupported URL scheme: {}", url.scheme()),
                    ));
                }
                Err(e) => {
                    result = result.with_error(
                        ValidationIssue::new("judge.base_url", format!("Invalid URL: {}", e))
                            .with_suggestion("Use a full URL such as http://localhost:2358"),
                    );
                }
            }
        }
        _ => {
            result = result.with_warning(
                ValidationIssue::new(
                    "judge.base_url",
                    "No judge service configured. All code will run on local toolchains.",
                )
                .with_suggestion("Set JUDGE_BASE_URL or configure judge.base_url"),
            );
        }
    }

    if judge.max_poll_attempts == 0 {
        result = result.with_error(
            ValidationIssue::new("judge.max_poll_attempts", "Must be at least 1")
                .with_suggestion("The default is 10"),
        );
    }

    if judge.limits.cpu_time_limit <= 0.0 || judge.limits.wall_time_limit <= 0.0 {
        result = result.with_error(ValidationIssue::new(
            "judge.limits",
            "Time limits must be positive",
        ));
    }

    result
}

fn validate_local_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    let local = &config.local;

    if local.max_concurrent == 0 {
        result = result.with_error(
            ValidationIssue::new("local.max_concurrent", "Must be at least 1")
                .with_suggestion("Set LOCAL_MAX_CONCURRENT to a positive number"),
        );
    }

    if local.timeout.is_zero() {
        result = result.with_error(ValidationIssue::new(
            "local.timeout",
            "Timeout must be greater than zero",
        ));
    }

    if local.scratch_dir.exists() && !local.scratch_dir.is_dir() {
        result = result.with_error(
            ValidationIssue::new(
                "local.scratch_dir",
                format!("{} exists and is not a directory", local.scratch_dir.display()),
            )
            .with_suggestion("Point CODEPREP_SCRATCH_DIR at a directory"),
        );
    }

    result
}
