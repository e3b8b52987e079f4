//! Error types for CodePrep

use thiserror::Error;

/// Result type alias using CodePrep's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CodePrep
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Language has no profile; rejected before any execution attempt
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Remote judge could not be reached or never produced a result
    #[error("Sandbox unavailable: {0}")]
    SandboxUnavailable(String),

    /// Harness rendering error
    #[error("Template error: {0}")]
    Template(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if error is a client error (user's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::UnsupportedLanguage(_) | Error::InvalidInput(_))
    }
}

impl From<handlebars::RenderError> for Error {
    fn from(err: handlebars::RenderError) -> Self {
        Error::Template(err.to_string())
    }
}

impl From<handlebars::TemplateError> for Error {
    fn from(err: handlebars::TemplateError) -> Self {
        Error::Template(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Config(format!("Invalid URL: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(Error::UnsupportedLanguage("cobol".into()).is_client_error());
        assert!(Error::InvalidInput("empty".into()).is_client_error());
        assert!(!Error::SandboxUnavailable("down".into()).is_client_error());
    }
}
