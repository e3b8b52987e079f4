//! Common executor trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sandbox::template::ProblemSignature;

/// Supported programming languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Cpp,
    C,
    Java,
    Python,
    JavaScript,
    TypeScript,
    CSharp,
    Go,
    Rust,
    Php,
    Ruby,
    Kotlin,
    Swift,
}

impl Language {
    /// Every language with a profile
    pub const ALL: [Language; 13] = [
        Language::Cpp,
        Language::C,
        Language::Java,
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::CSharp,
        Language::Go,
        Language::Rust,
        Language::Php,
        Language::Ruby,
        Language::Kotlin,
        Language::Swift,
    ];
}

impl std::str::FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cpp" | "c++" | "cxx" => Ok(Language::Cpp),
            "c" => Ok(Language::C),
            "java" => Ok(Language::Java),
            "python" | "py" | "python3" => Ok(Language::Python),
            "javascript" | "js" | "node" => Ok(Language::JavaScript),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "csharp" | "c#" | "cs" => Ok(Language::CSharp),
            "go" | "golang" => Ok(Language::Go),
            "rust" | "rs" => Ok(Language::Rust),
            "php" => Ok(Language::Php),
            "ruby" | "rb" => Ok(Language::Ruby),
            "kotlin" | "kt" => Ok(Language::Kotlin),
            "swift" => Ok(Language::Swift),
            _ => Err(Error::UnsupportedLanguage(s.to_string())),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Java => "java",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::CSharp => "csharp",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Php => "php",
            Language::Ruby => "ruby",
            Language::Kotlin => "kotlin",
            Language::Swift => "swift",
        };
        f.write_str(name)
    }
}

/// Request to execute code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// The code to execute
    pub code: String,
    /// Programming language
    pub language: Language,
    /// Standard input
    #[serde(default)]
    pub stdin: String,
    /// Signature of the expected entry point, when the code is a bare solution
    #[serde(default)]
    pub problem: Option<ProblemSignature>,
}

impl ExecutionRequest {
    /// Create a new execution request
    pub fn new(code: impl Into<String>, language: Language) -> Self {
        ExecutionRequest {
            code: code.into(),
            language,
            stdin: String::new(),
            problem: None,
        }
    }

    /// Set stdin
    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = stdin.into();
        self
    }

    /// Attach a problem signature so the code gets wrapped in a harness
    pub fn with_problem(mut self, problem: ProblemSignature) -> Self {
        self.problem = Some(problem);
        self
    }
}

/// A fully wrapped program ready for a backend
#[derive(Debug, Clone)]
pub struct ExecutionJob {
    /// Runnable program text
    pub program: String,
    /// Programming language
    pub language: Language,
    /// Standard input
    pub stdin: String,
}

/// Outcome classification of one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Accepted,
    WrongAnswer,
    RuntimeError,
    CompilationError,
    TimeLimitExceeded,
    InternalError,
}

impl ExecutionStatus {
    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            ExecutionStatus::Accepted => "Accepted",
            ExecutionStatus::WrongAnswer => "Wrong Answer",
            ExecutionStatus::RuntimeError => "Runtime Error",
            ExecutionStatus::CompilationError => "Compilation Error",
            ExecutionStatus::TimeLimitExceeded => "Time Limit Exceeded",
            ExecutionStatus::InternalError => "Internal Error",
        }
    }

    /// Whether the program ran far enough for its stdout to mean something
    pub fn has_usable_output(&self) -> bool {
        !matches!(
            self,
            ExecutionStatus::CompilationError | ExecutionStatus::InternalError
        )
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Which backend produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sandbox,
    Local,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Sandbox => write!(f, "sandbox"),
            Backend::Local => write!(f, "local"),
        }
    }
}

/// Result of code execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Outcome classification
    pub status: ExecutionStatus,
    /// Status id reported by the judge, if the judge produced the result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_id: Option<u32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Compiler diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_output: Option<String>,
    /// Wall time in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    /// Peak memory in kilobytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_kb: Option<u64>,
    /// Process exit code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Diagnostic message for internal failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Backend that produced this result
    pub backend: Backend,
}

impl ExecutionResult {
    /// Create a result from captured process output
    pub fn completed(
        status: ExecutionStatus,
        stdout: String,
        stderr: String,
        elapsed_ms: u64,
        exit_code: Option<i32>,
        backend: Backend,
    ) -> Self {
        ExecutionResult {
            status,
            status_id: None,
            stdout,
            stderr,
            compile_output: None,
            elapsed_ms: Some(elapsed_ms),
            memory_kb: None,
            exit_code,
            message: None,
            backend,
        }
    }

    /// Create a compilation failure result
    pub fn compilation_error(diagnostics: String, elapsed_ms: u64, backend: Backend) -> Self {
        ExecutionResult {
            status: ExecutionStatus::CompilationError,
            status_id: None,
            stdout: String::new(),
            stderr: diagnostics.clone(),
            compile_output: Some(diagnostics),
            elapsed_ms: Some(elapsed_ms),
            memory_kb: None,
            exit_code: None,
            message: None,
            backend,
        }
    }

    /// Create a timeout result
    pub fn time_limit_exceeded(partial_stdout: String, elapsed_ms: u64, backend: Backend) -> Self {
        ExecutionResult {
            status: ExecutionStatus::TimeLimitExceeded,
            status_id: None,
            stdout: partial_stdout,
            stderr: "Execution timed out".to_string(),
            compile_output: None,
            elapsed_ms: Some(elapsed_ms),
            memory_kb: None,
            exit_code: None,
            message: None,
            backend,
        }
    }

    /// Create an internal failure result carrying the underlying message
    pub fn internal_error(message: impl Into<String>, backend: Backend) -> Self {
        let message = message.into();
        ExecutionResult {
            status: ExecutionStatus::InternalError,
            status_id: None,
            stdout: String::new(),
            stderr: message.clone(),
            compile_output: None,
            elapsed_ms: None,
            memory_kb: None,
            exit_code: None,
            message: Some(message),
            backend,
        }
    }

    /// Human-readable status description
    pub fn description(&self) -> &'static str {
        self.status.description()
    }

    /// Whether the program ran to completion without errors
    pub fn is_accepted(&self) -> bool {
        self.status == ExecutionStatus::Accepted
    }
}

/// Trait for code execution backends
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    /// Get the executor name
    fn name(&self) -> &str;

    /// Execute a wrapped program
    async fn execute(&self, job: &ExecutionJob) -> Result<ExecutionResult>;

    /// Check that the backend can accept work
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Release any resources held by the backend
    async fn cleanup(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parsing() {
        assert_eq!("python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("py".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("C++".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!("js".parse::<Language>().unwrap(), Language::JavaScript);
        assert!(matches!(
            "cobol".parse::<Language>(),
            Err(Error::UnsupportedLanguage(_))
        ));
    }

    #[test]
    fn test_language_display_round_trips() {
        for language in Language::ALL {
            assert_eq!(language.to_string().parse::<Language>().unwrap(), language);
        }
    }

    #[test]
    fn test_execution_request() {
        let req = ExecutionRequest::new("print(input())", Language::Python).with_stdin("42");

        assert_eq!(req.code, "print(input())");
        assert_eq!(req.language, Language::Python);
        assert_eq!(req.stdin, "42");
        assert!(req.problem.is_none());
    }

    #[test]
    fn test_execution_result_constructors() {
        let timeout = ExecutionResult::time_limit_exceeded(String::new(), 10_000, Backend::Local);
        assert_eq!(timeout.status, ExecutionStatus::TimeLimitExceeded);
        assert_eq!(timeout.stderr, "Execution timed out");

        let internal = ExecutionResult::internal_error("spawn failed", Backend::Local);
        assert_eq!(internal.message.as_deref(), Some("spawn failed"));
        assert!(!internal.status.has_usable_output());

        let compile = ExecutionResult::compilation_error("oops".into(), 5, Backend::Sandbox);
        assert_eq!(compile.compile_output.as_deref(), Some("oops"));
        assert_eq!(compile.description(), "Compilation Error");
    }
}
