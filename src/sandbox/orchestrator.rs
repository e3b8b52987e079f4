//! Execution orchestrator
//!
//! Front door for running code: wraps the source, tries the judge service
//! and falls back to local execution when the judge fails. Callers always
//! get an [`ExecutionResult`]; backend failures are folded into it.

use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::Result;
use crate::sandbox::executor::{
    Backend, CodeExecutor, ExecutionJob, ExecutionRequest, ExecutionResult, Language,
};
use crate::sandbox::judge::JudgeClient;
use crate::sandbox::local::LocalExecutor;
use crate::sandbox::template::TemplateEngine;

/// Routes execution requests to the judge with a local fallback
pub struct Orchestrator {
    engine: TemplateEngine,
    primary: Option<Arc<dyn CodeExecutor>>,
    fallback: Arc<dyn CodeExecutor>,
}

impl Orchestrator {
    /// Create an orchestrator from explicit backends
    pub fn new(
        engine: TemplateEngine,
        primary: Option<Arc<dyn CodeExecutor>>,
        fallback: Arc<dyn CodeExecutor>,
    ) -> Self {
        Orchestrator {
            engine,
            primary,
            fallback,
        }
    }

    /// Build the judge client (when configured) and the local executor
    pub fn from_config(config: &Config) -> Result<Self> {
        let primary: Option<Arc<dyn CodeExecutor>> = if config.judge.is_enabled() {
            Some(Arc::new(JudgeClient::connect(&config.judge)?))
        } else {
            debug!("No judge configured; using local execution only");
            None
        };
        let fallback = Arc::new(LocalExecutor::new(config.local.clone()));

        Ok(Self::new(TemplateEngine::new(), primary, fallback))
    }

    /// Template engine used for wrapping
    pub fn engine(&self) -> &TemplateEngine {
        &self.engine
    }

    /// Whether a judge backend is configured
    pub fn has_sandbox(&self) -> bool {
        self.primary.is_some()
    }

    /// Run code given a language name. Fails only for unknown languages,
    /// before any backend is touched.
    pub async fn run_source(&self, code: &str, language: &str, stdin: &str) -> Result<ExecutionResult> {
        let language: Language = language.parse()?;
        let request = ExecutionRequest::new(code, language).with_stdin(stdin);
        Ok(self.run(&request).await)
    }

    /// Run a request to completion
    pub async fn run(&self, request: &ExecutionRequest) -> ExecutionResult {
        let program = match self
            .engine
            .wrap(&request.code, request.language, request.problem.as_ref())
        {
            Ok(program) => program,
            Err(e) => {
                error!("Failed to wrap {} source: {}", request.language, e);
                return ExecutionResult::internal_error(
                    format!("Failed to prepare program: {}", e),
                    Backend::Local,
                );
            }
        };

        let job = ExecutionJob {
            program,
            language: request.language,
            stdin: request.stdin.clone(),
        };

        if let Some(primary) = &self.primary {
            match primary.execute(&job).await {
                Ok(result) => return result,
                Err(e) => {
                    warn!(
                        "{} backend failed, falling back to {}: {}",
                        primary.name(),
                        self.fallback.name(),
                        e
                    );
                }
            }
        }

        match self.fallback.execute(&job).await {
            Ok(result) => result,
            Err(e) => {
                error!("{} backend failed: {}", self.fallback.name(), e);
                ExecutionResult::internal_error(e.to_string(), Backend::Local)
            }
        }
    }

    /// Report health of each backend as `(name, healthy)`
    pub async fn health(&self) -> Vec<(String, bool)> {
        let mut report = Vec::new();
        for backend in self.primary.iter().chain(std::iter::once(&self.fallback)) {
            let healthy = backend.health_check().await.unwrap_or(false);
            report.push((backend.name().to_string(), healthy));
        }
        report
    }

    /// Release backend resources
    pub async fn shutdown(&self) {
        for backend in self.primary.iter().chain(std::iter::once(&self.fallback)) {
            if let Err(e) = backend.cleanup().await {
                warn!("Cleanup of {} backend failed: {}", backend.name(), e);
            }
        }
    }
}
