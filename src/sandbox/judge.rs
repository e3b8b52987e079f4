//! Remote judge client
//!
//! Speaks the submissions protocol of a Judge0-compatible service:
//!
//! 1. `POST /submissions` with source, language id, stdin and limits,
//!    answered with an opaque token.
//! 2. `GET /submissions/{token}` at a fixed interval for a fixed number of
//!    attempts until the status leaves "In Queue" / "Processing".
//!
//! Anything short of a recognized final status is reported as
//! [`Error::SandboxUnavailable`] so the caller can fall back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{JudgeConfig, ResourceLimits};
use crate::error::{Error, Result};
use crate::sandbox::executor::{
    Backend, CodeExecutor, ExecutionJob, ExecutionResult, ExecutionStatus,
};
use crate::sandbox::profile::LanguageProfile;

/// Highest status id that means "not finished yet"
const LAST_PENDING_STATUS: u32 = 2;

/// Submission creation body
#[derive(Debug, Serialize)]
struct CreateSubmission<'a> {
    source_code: &'a str,
    language_id: u32,
    stdin: &'a str,
    cpu_time_limit: f64,
    memory_limit: u64,
    wall_time_limit: f64,
}

#[derive(Debug, Deserialize)]
struct CreatedSubmission {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JudgeStatus {
    id: u32,
    #[serde(default)]
    description: String,
}

/// Status-by-token response
#[derive(Debug, Deserialize)]
struct SubmissionDetails {
    status: JudgeStatus,
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    stderr: Option<String>,
    #[serde(default)]
    compile_output: Option<String>,
    #[serde(default)]
    message: Option<String>,
    /// Seconds, as a decimal string
    #[serde(default)]
    time: Option<String>,
    /// Kilobytes
    #[serde(default)]
    memory: Option<u64>,
    #[serde(default)]
    exit_code: Option<i32>,
}

/// A submission being tracked for one polling session
#[derive(Debug, Clone)]
pub struct SandboxSubmission {
    /// Opaque token issued by the judge
    pub token: String,
    /// When the submission was accepted
    pub created_at: DateTime<Utc>,
}

/// Map a judge status id onto an execution status. `None` for ids this
/// client does not know, including the pending ones.
pub fn map_status(id: u32) -> Option<ExecutionStatus> {
    match id {
        3 => Some(ExecutionStatus::Accepted),
        4 => Some(ExecutionStatus::WrongAnswer),
        5 => Some(ExecutionStatus::TimeLimitExceeded),
        6 => Some(ExecutionStatus::CompilationError),
        7..=12 => Some(ExecutionStatus::RuntimeError),
        13 | 14 => Some(ExecutionStatus::InternalError),
        _ => None,
    }
}

/// HTTP client for the judge service
pub struct JudgeClient {
    client: Client,
    base_url: url::Url,
    config: JudgeConfig,
}

impl JudgeClient {
    /// Build a client from configuration. Fails if no usable base URL is set.
    pub fn connect(config: &JudgeConfig) -> Result<Self> {
        let raw = config
            .base_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| Error::Config("judge.base_url is not set".to_string()))?;

        // Trailing slash so joins append instead of replacing the last segment
        let base_url = url::Url::parse(&format!("{}/", raw.trim_end_matches('/')))?;

        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(key) = &config.api_key {
            let name = reqwest::header::HeaderName::from_bytes(config.auth_header.as_bytes())
                .map_err(|e| Error::Config(format!("Invalid judge.auth_header: {}", e)))?;
            let mut value = reqwest::header::HeaderValue::from_str(key.expose_secret())
                .map_err(|e| Error::Config(format!("Invalid judge API key: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()?;

        info!("Judge client configured for {}", base_url);

        Ok(JudgeClient {
            client,
            base_url,
            config: config.clone(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &url::Url {
        &self.base_url
    }

    /// Submit a program and wait for its result
    pub async fn run(
        &self,
        program: &str,
        profile: &LanguageProfile,
        stdin: &str,
    ) -> Result<ExecutionResult> {
        let submission = self.submit(program, profile, stdin, &self.config.limits).await?;
        self.poll(&submission).await
    }

    async fn submit(
        &self,
        program: &str,
        profile: &LanguageProfile,
        stdin: &str,
        limits: &ResourceLimits,
    ) -> Result<SandboxSubmission> {
        let mut url = self.base_url.join("submissions")?;
        url.query_pairs_mut()
            .append_pair("base64_encoded", "false")
            .append_pair("wait", "false");

        let body = CreateSubmission {
            source_code: program,
            language_id: profile.remote_id,
            stdin,
            cpu_time_limit: limits.cpu_time_limit,
            memory_limit: limits.memory_limit,
            wall_time_limit: limits.wall_time_limit,
        };

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::SandboxUnavailable(format!("Submission request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::SandboxUnavailable(format!(
                "Submission rejected with status {}: {}",
                status, text
            )));
        }

        let created: CreatedSubmission = response
            .json()
            .await
            .map_err(|e| Error::SandboxUnavailable(format!("Invalid submission response: {}", e)))?;

        let token = created
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::SandboxUnavailable("Judge returned no token".to_string()))?;

        debug!("Submitted {} program, token {}", profile.language, token);

        Ok(SandboxSubmission {
            token,
            created_at: Utc::now(),
        })
    }

    async fn fetch(&self, token: &str) -> Result<SubmissionDetails> {
        let mut url = self.base_url.join("submissions/")?.join(token)?;
        url.query_pairs_mut().append_pair("base64_encoded", "false");

        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json::<SubmissionDetails>().await?)
    }

    async fn poll(&self, submission: &SandboxSubmission) -> Result<ExecutionResult> {
        let max_attempts = self.config.max_poll_attempts;

        for attempt in 1..=max_attempts {
            tokio::time::sleep(self.config.poll_interval).await;

            let details = match self.fetch(&submission.token).await {
                Ok(details) => details,
                // The token may not be visible yet on the first poll
                Err(e) if attempt == 1 => {
                    debug!("First poll for {} failed: {}", submission.token, e);
                    continue;
                }
                Err(e) => {
                    warn!("Polling {} failed on attempt {}: {}", submission.token, attempt, e);
                    break;
                }
            };

            if details.status.id <= LAST_PENDING_STATUS {
                debug!(
                    "Submission {} still {} (attempt {}/{})",
                    submission.token, details.status.description, attempt, max_attempts
                );
                continue;
            }

            let Some(status) = map_status(details.status.id) else {
                warn!(
                    "Submission {} ended with unknown status {} ({})",
                    submission.token, details.status.id, details.status.description
                );
                break;
            };

            let waited = Utc::now() - submission.created_at;
            info!(
                "Submission {} finished: {} after {} attempts ({}ms)",
                submission.token,
                status,
                attempt,
                waited.num_milliseconds()
            );
            return Ok(normalize(details, status));
        }

        Err(Error::SandboxUnavailable(format!(
            "No result for submission {} after {} polls",
            submission.token, max_attempts
        )))
    }
}

fn normalize(details: SubmissionDetails, status: ExecutionStatus) -> ExecutionResult {
    let elapsed_ms = details
        .time
        .as_deref()
        .and_then(|t| t.trim().parse::<f64>().ok())
        .map(|secs| (secs * 1000.0).round() as u64);

    let message = details.message.filter(|m| !m.is_empty());

    ExecutionResult {
        status,
        status_id: Some(details.status.id),
        stdout: details.stdout.unwrap_or_default(),
        stderr: details.stderr.unwrap_or_default(),
        compile_output: details.compile_output.filter(|c| !c.is_empty()),
        elapsed_ms,
        memory_kb: details.memory,
        exit_code: details.exit_code,
        message,
        backend: Backend::Sandbox,
    }
}

#[async_trait]
impl CodeExecutor for JudgeClient {
    fn name(&self) -> &str {
        "sandbox"
    }

    async fn execute(&self, job: &ExecutionJob) -> Result<ExecutionResult> {
        let profile = LanguageProfile::for_language(job.language);
        self.run(&job.program, profile, &job.stdin).await
    }

    async fn health_check(&self) -> Result<bool> {
        let url = self.base_url.join("about")?;
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(5))
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}
