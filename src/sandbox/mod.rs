//! Sandbox module - code execution
//!
//! - Template engine: wraps bare solutions in a language harness
//! - Judge client: remote execution service (primary path)
//! - Local executor: host toolchains in a scoped workspace (fallback path)
//! - Orchestrator: picks the path and always returns a result

mod executor;
mod judge;
mod local;
mod orchestrator;
mod profile;
mod template;
mod workspace;

pub use executor::{
    Backend, CodeExecutor, ExecutionJob, ExecutionRequest, ExecutionResult, ExecutionStatus,
    Language,
};
pub use judge::{map_status, JudgeClient, SandboxSubmission};
pub use local::LocalExecutor;
pub use orchestrator::Orchestrator;
pub use profile::{CommandTemplate, LanguageProfile};
pub use template::{
    CppHarness, HarnessAdapter, JavaHarness, JavaScriptHarness, ParamType, ProblemSignature,
    PythonHarness, TemplateEngine,
};
pub use workspace::{remove_stale, TemporaryWorkspace, WORKSPACE_PREFIX};
