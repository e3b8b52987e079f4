//! HTTP surface for running and grading code

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::Error;
use crate::grading::{Grader, TestCase, Verdict};
use crate::sandbox::{
    ExecutionRequest, ExecutionResult, ExecutionStatus, Language, LanguageProfile, Orchestrator,
    ProblemSignature,
};

// ---- App State ----

#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<Orchestrator>,
    max_test_cases: usize,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, server: &ServerConfig) -> Self {
        AppState {
            orchestrator,
            max_test_cases: server.max_test_cases,
        }
    }
}

// ---- Wire types ----

#[derive(Debug, Deserialize)]
pub struct ExecuteBody {
    pub code: String,
    pub language: String,
    #[serde(default, alias = "stdin")]
    pub input: String,
    #[serde(default)]
    pub problem: Option<ProblemSignature>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitBody {
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub problem: Option<ProblemSignature>,
    #[serde(alias = "testCases")]
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Serialize)]
pub struct StatusBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub status: StatusBody,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compile_output: Option<String>,
    /// Wall time in seconds, as text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Peak memory in KB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl From<&ExecutionResult> for ExecuteResponse {
    fn from(result: &ExecutionResult) -> Self {
        ExecuteResponse {
            status: StatusBody {
                id: result.status_id,
                description: result.description().to_string(),
            },
            stdout: result.stdout.clone(),
            stderr: result.stderr.clone(),
            compile_output: result.compile_output.clone(),
            time: result
                .elapsed_ms
                .map(|ms| format!("{:.3}", ms as f64 / 1000.0)),
            memory: result.memory_kb,
            exit_code: result.exit_code,
        }
    }
}

/// Body returned when no backend could produce a result
#[derive(Debug, Serialize)]
pub struct FailureBody {
    pub error: bool,
    pub message: String,
    pub stdout: String,
    pub stderr: String,
    pub status: StatusBody,
}

impl FailureBody {
    fn new(message: String, stderr: String) -> Self {
        FailureBody {
            error: true,
            message,
            stdout: String::new(),
            stderr,
            status: StatusBody {
                id: None,
                description: "Error".to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LanguageInfo {
    pub name: String,
    pub remote_id: u32,
    pub harness: bool,
    pub compiled: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub sandbox: bool,
}

// ---- Error Handling ----

pub struct AppError(Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let message = self.0.to_string();
        (status, Json(FailureBody::new(message.clone(), message))).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError(err)
    }
}

fn build_request(
    code: String,
    language: &str,
    problem: Option<ProblemSignature>,
) -> Result<ExecutionRequest, AppError> {
    let language: Language = language.parse()?;
    if code.trim().is_empty() {
        return Err(Error::InvalidInput("code must not be empty".into()).into());
    }
    let request = ExecutionRequest::new(code, language);
    Ok(match problem {
        Some(problem) => request.with_problem(problem),
        None => request,
    })
}

// ---- Handlers ----

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
        sandbox: state.orchestrator.has_sandbox(),
    })
}

async fn execute(
    State(state): State<AppState>,
    Json(body): Json<ExecuteBody>,
) -> Result<Response, AppError> {
    let request = build_request(body.code, &body.language, body.problem)?.with_stdin(body.input);
    let result = state.orchestrator.run(&request).await;
    info!(
        "Executed {} via {}: {}",
        request.language, result.backend, result.status
    );

    // No backend produced a result; judge-reported 13/14 carry a status id
    if result.status == ExecutionStatus::InternalError && result.status_id.is_none() {
        let message = result
            .message
            .clone()
            .unwrap_or_else(|| result.description().to_string());
        warn!("Execution failed: {}", message);
        let body = FailureBody::new(message, result.stderr.clone());
        return Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response());
    }

    Ok(Json(ExecuteResponse::from(&result)).into_response())
}

async fn submit(
    State(state): State<AppState>,
    Json(body): Json<SubmitBody>,
) -> Result<Json<Verdict>, AppError> {
    let request = build_request(body.code, &body.language, body.problem)?;
    if body.test_cases.is_empty() {
        return Err(Error::InvalidInput("at least one test case is required".into()).into());
    }
    if body.test_cases.len() > state.max_test_cases {
        return Err(Error::InvalidInput(format!(
            "too many test cases: {} (limit {})",
            body.test_cases.len(),
            state.max_test_cases
        ))
        .into());
    }

    let verdict = Grader::new(&state.orchestrator)
        .grade(&request, &body.test_cases)
        .await;
    Ok(Json(verdict))
}

async fn languages(State(state): State<AppState>) -> Json<Vec<LanguageInfo>> {
    let engine = state.orchestrator.engine();
    let list = Language::ALL
        .iter()
        .map(|&language| {
            let profile = LanguageProfile::for_language(language);
            LanguageInfo {
                name: language.to_string(),
                remote_id: profile.remote_id,
                harness: engine.has_harness(language),
                compiled: profile.is_compiled(),
            }
        })
        .collect();
    Json(list)
}

// ---- Router ----

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/execute", post(execute))
        .route("/submit", post(submit))
        .route("/languages", get(languages));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::sandbox::{Backend, CodeExecutor, ExecutionJob, TemplateEngine};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    /// Prints its stdin back, or fails when the program says so
    struct EchoExecutor;

    #[async_trait]
    impl CodeExecutor for EchoExecutor {
        fn name(&self) -> &str {
            "echo"
        }

        async fn execute(&self, job: &ExecutionJob) -> Result<ExecutionResult> {
            if job.program.contains("explode") {
                return Err(Error::Internal("toolchain missing".into()));
            }
            if job.program.contains("judge_internal") {
                let mut result =
                    ExecutionResult::internal_error("Exec format error", Backend::Sandbox);
                result.status_id = Some(13);
                return Ok(result);
            }
            Ok(ExecutionResult::completed(
                ExecutionStatus::Accepted,
                job.stdin.clone(),
                String::new(),
                1500,
                Some(0),
                Backend::Local,
            ))
        }
    }

    fn app() -> Router {
        let orchestrator = Orchestrator::new(TemplateEngine::new(), None, Arc::new(EchoExecutor));
        let server = ServerConfig {
            max_test_cases: 2,
            ..ServerConfig::default()
        };
        router(AppState::new(Arc::new(orchestrator), &server))
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["sandbox"], false);
    }

    #[tokio::test]
    async fn test_execute_returns_result_shape() {
        let (status, body) = call(
            app(),
            "POST",
            "/api/execute",
            Some(json!({ "code": "print(input())", "language": "python", "input": "hi" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"]["description"], "Accepted");
        assert_eq!(body["stdout"], "hi");
        assert_eq!(body["time"], "1.500");
        assert_eq!(body["exit_code"], 0);
        assert!(body.get("compile_output").is_none());
    }

    #[tokio::test]
    async fn test_execute_unsupported_language_is_bad_request() {
        let (status, body) = call(
            app(),
            "POST",
            "/api/execute",
            Some(json!({ "code": "DISPLAY 'HI'", "language": "cobol" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], true);
        assert_eq!(body["status"]["description"], "Error");
        assert!(body["message"].as_str().unwrap().contains("cobol"));
    }

    #[tokio::test]
    async fn test_execute_total_failure_shape() {
        let (status, body) = call(
            app(),
            "POST",
            "/api/execute",
            Some(json!({ "code": "explode()", "language": "python" })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], true);
        assert_eq!(body["stdout"], "");
        assert!(body["message"].as_str().unwrap().contains("toolchain missing"));
        assert_eq!(body["status"]["description"], "Error");
    }

    #[tokio::test]
    async fn test_execute_judge_internal_error_keeps_status_id() {
        let (status, body) = call(
            app(),
            "POST",
            "/api/execute",
            Some(json!({ "code": "judge_internal()", "language": "python" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.get("error").is_none());
        assert_eq!(body["status"]["id"], 13);
        assert_eq!(body["status"]["description"], "Internal Error");
        assert_eq!(body["stderr"], "Exec format error");
    }

    #[tokio::test]
    async fn test_submit_grades_cases() {
        let (status, body) = call(
            app(),
            "POST",
            "/api/submit",
            Some(json!({
                "code": "print(input())",
                "language": "python",
                "test_cases": [
                    { "input": "[0,1]", "expected_output": "[0, 1]" },
                    { "input": "a", "expectedOutput": "b" }
                ]
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["passed"], false);
        assert_eq!(body["passedCount"], 1);
        assert_eq!(body["total"], 2);
        assert_eq!(body["testResults"][1]["actual"], "a");
    }

    #[tokio::test]
    async fn test_submit_rejects_too_many_cases() {
        let case = json!({ "input": "1", "expected_output": "1" });
        let (status, body) = call(
            app(),
            "POST",
            "/api/submit",
            Some(json!({
                "code": "print(input())",
                "language": "python",
                "test_cases": [case.clone(), case.clone(), case]
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("too many"));
    }

    #[tokio::test]
    async fn test_languages_lists_every_profile() {
        let (status, body) = call(app(), "GET", "/api/languages", None).await;

        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), Language::ALL.len());
        let cpp = list.iter().find(|l| l["name"] == "cpp").unwrap();
        assert_eq!(cpp["remote_id"], 54);
        assert_eq!(cpp["harness"], true);
        let ruby = list.iter().find(|l| l["name"] == "ruby").unwrap();
        assert_eq!(ruby["harness"], false);
    }
}
