//! Local fallback executor
//!
//! Compiles and runs programs with the toolchains installed on this host.
//! Used when the judge service is unavailable. Every attempt runs inside its
//! own [`TemporaryWorkspace`] under one wall-clock deadline covering both
//! the compile and the run step. The number of simultaneous attempts is
//! bounded by a semaphore.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::LocalConfig;
use crate::error::{Error, Result};
use crate::sandbox::executor::{
    Backend, CodeExecutor, ExecutionJob, ExecutionResult, ExecutionStatus, Language,
};
use crate::sandbox::profile::{CommandTemplate, LanguageProfile};
use crate::sandbox::workspace::{self, TemporaryWorkspace};

/// What happened to one child process
#[derive(Debug)]
enum StepOutcome {
    Finished {
        stdout: String,
        stderr: String,
        exit_code: Option<i32>,
        success: bool,
    },
    TimedOut,
    Failed(String),
}

/// Executes programs with local toolchains
pub struct LocalExecutor {
    config: LocalConfig,
    permits: Arc<Semaphore>,
}

impl LocalExecutor {
    /// Create a new local executor
    pub fn new(config: LocalConfig) -> Self {
        let slots = config.max_concurrent.max(1);
        LocalExecutor {
            config,
            permits: Arc::new(Semaphore::new(slots)),
        }
    }

    /// Number of executions that could start right now
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    /// Languages whose toolchain is present on PATH
    pub fn available_toolchains() -> Vec<Language> {
        Language::ALL
            .into_iter()
            .filter(|language| {
                LanguageProfile::for_language(*language)
                    .required_programs()
                    .iter()
                    .all(|program| which::which(program).is_ok())
            })
            .collect()
    }

    /// Run `job` with an explicit profile: permit, workspace, compile/run, release
    async fn execute_with_profile(
        &self,
        profile: &LanguageProfile,
        job: &ExecutionJob,
    ) -> Result<ExecutionResult> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::Internal("Local executor is shut down".to_string()))?;

        let workspace = TemporaryWorkspace::create(&self.config.scratch_dir, profile).await?;
        let result = self.execute_in(&workspace, profile, job).await;
        workspace.release().await;

        if let Ok(result) = &result {
            info!(
                "Local {} execution finished: {} in {}ms",
                job.language,
                result.status,
                result.elapsed_ms.unwrap_or_default()
            );
        }
        result
    }

    async fn execute_in(
        &self,
        workspace: &TemporaryWorkspace,
        profile: &LanguageProfile,
        job: &ExecutionJob,
    ) -> Result<ExecutionResult> {
        workspace.write_source(&job.program).await?;

        let start = Instant::now();
        let deadline = tokio::time::Instant::now() + self.config.timeout;

        if let Some(compile) = &profile.compile {
            debug!("Compiling {} in {}", job.language, workspace.dir().display());

            match self.run_step(compile, workspace, None, deadline).await {
                StepOutcome::Finished { success: true, .. } => {}
                StepOutcome::Finished { stdout, stderr, .. } => {
                    let diagnostics = if stderr.is_empty() { stdout } else { stderr };
                    return Ok(ExecutionResult::compilation_error(
                        diagnostics,
                        elapsed_ms(start),
                        Backend::Local,
                    ));
                }
                StepOutcome::TimedOut => {
                    warn!("Compilation timed out after {:?}", self.config.timeout);
                    return Ok(ExecutionResult::time_limit_exceeded(
                        String::new(),
                        elapsed_ms(start),
                        Backend::Local,
                    ));
                }
                StepOutcome::Failed(message) => {
                    return Ok(ExecutionResult::internal_error(message, Backend::Local));
                }
            }
        }

        debug!("Running {} in {}", job.language, workspace.dir().display());

        let outcome = self
            .run_step(&profile.run, workspace, Some(&job.stdin), deadline)
            .await;

        Ok(match outcome {
            StepOutcome::Finished {
                stdout,
                stderr,
                exit_code,
                ..
            } => {
                // Only stderr decides; a non-zero exit with a clean stderr
                // is still Accepted and keeps its exit code.
                let status = if stderr.is_empty() {
                    ExecutionStatus::Accepted
                } else {
                    ExecutionStatus::RuntimeError
                };
                ExecutionResult::completed(
                    status,
                    stdout,
                    stderr,
                    elapsed_ms(start),
                    exit_code,
                    Backend::Local,
                )
            }
            StepOutcome::TimedOut => {
                warn!("Execution timed out after {:?}", self.config.timeout);
                ExecutionResult::time_limit_exceeded(String::new(), elapsed_ms(start), Backend::Local)
            }
            StepOutcome::Failed(message) => ExecutionResult::internal_error(message, Backend::Local),
        })
    }

    /// Run one command inside the workspace until it exits or the deadline passes
    async fn run_step(
        &self,
        template: &CommandTemplate,
        workspace: &TemporaryWorkspace,
        stdin: Option<&str>,
        deadline: tokio::time::Instant,
    ) -> StepOutcome {
        // Source is passed relative to the workspace so diagnostics don't
        // leak the scratch path.
        let source = workspace
            .source_path()
            .file_name()
            .map(Path::new)
            .unwrap_or_else(|| workspace.source_path());
        let (program, args) = template.render(Path::new("."), source, workspace.executable_path());

        let mut command = Command::new(&program);
        command
            .args(&args)
            .current_dir(workspace.dir())
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to start {}: {}", program, e);
                return StepOutcome::Failed(format!("Failed to start {}: {}", program, e));
            }
        };

        if let (Some(data), Some(mut pipe)) = (stdin, child.stdin.take()) {
            let data = data.to_string();
            // Feed stdin concurrently so a chatty child can't deadlock on a full pipe
            tokio::spawn(async move {
                if let Err(e) = pipe.write_all(data.as_bytes()).await {
                    debug!("Child closed stdin early: {}", e);
                }
            });
        }

        match tokio::time::timeout_at(deadline, child.wait_with_output()).await {
            Ok(Ok(output)) => StepOutcome::Finished {
                stdout: truncate_output(&output.stdout, self.config.max_output_bytes),
                stderr: truncate_output(&output.stderr, self.config.max_output_bytes),
                exit_code: output.status.code(),
                success: output.status.success(),
            },
            Ok(Err(e)) => StepOutcome::Failed(format!("Process error: {}", e)),
            // Dropping the wait future drops the child, which kills it
            Err(_) => StepOutcome::TimedOut,
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn truncate_output(bytes: &[u8], max: usize) -> String {
    let kept = &bytes[..bytes.len().min(max)];
    String::from_utf8_lossy(kept).into_owned()
}

#[async_trait]
impl CodeExecutor for LocalExecutor {
    fn name(&self) -> &str {
        "local"
    }

    async fn execute(&self, job: &ExecutionJob) -> Result<ExecutionResult> {
        self.execute_with_profile(LanguageProfile::for_language(job.language), job)
            .await
    }

    async fn health_check(&self) -> Result<bool> {
        tokio::fs::create_dir_all(&self.config.scratch_dir).await?;
        Ok(!Self::available_toolchains().is_empty())
    }

    /// Removes leftover workspaces. Only safe while no execution is running.
    async fn cleanup(&self) -> Result<()> {
        let removed = workspace::remove_stale(&self.config.scratch_dir).await?;
        if removed > 0 {
            info!("Removed {} stale workspaces", removed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::template::{ParamType, ProblemSignature, TemplateEngine};
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    fn executor(timeout: Duration) -> (TempDir, LocalExecutor) {
        let scratch = tempdir().unwrap();
        let config = LocalConfig {
            scratch_dir: scratch.path().to_path_buf(),
            timeout,
            ..LocalConfig::default()
        };
        (scratch, LocalExecutor::new(config))
    }

    fn job(program: &str, language: Language, stdin: &str) -> ExecutionJob {
        ExecutionJob {
            program: program.to_string(),
            language,
            stdin: stdin.to_string(),
        }
    }

    fn has(program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn scratch_is_empty(scratch: &TempDir) -> bool {
        std::fs::read_dir(scratch.path()).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_javascript_hello_world() {
        if !has("node") {
            return;
        }
        let (scratch, executor) = executor(Duration::from_secs(10));

        let result = executor
            .execute(&job("console.log(\"Hello, World!\")", Language::JavaScript, ""))
            .await
            .unwrap();

        assert_eq!(result.status, ExecutionStatus::Accepted);
        assert_eq!(result.stdout, "Hello, World!\n");
        assert_eq!(result.backend, Backend::Local);
        assert!(scratch_is_empty(&scratch));
    }

    #[tokio::test]
    async fn test_python_syntax_error() {
        if !has("python3") {
            return;
        }
        let (scratch, executor) = executor(Duration::from_secs(10));

        let result = executor
            .execute(&job("def broken(:\n    pass\n", Language::Python, ""))
            .await
            .unwrap();

        assert_eq!(result.status, ExecutionStatus::RuntimeError);
        assert!(!result.stderr.is_empty());
        assert!(scratch_is_empty(&scratch));
    }

    #[tokio::test]
    async fn test_python_reads_stdin() {
        if !has("python3") {
            return;
        }
        let (_scratch, executor) = executor(Duration::from_secs(10));

        let result = executor
            .execute(&job(
                "import sys\nprint(sum(int(x) for x in sys.stdin.read().split()))",
                Language::Python,
                "1 2 3\n",
            ))
            .await
            .unwrap();

        assert_eq!(result.stdout, "6\n");
    }

    #[tokio::test]
    async fn test_repeated_runs_match() {
        if !has("python3") {
            return;
        }
        let (_scratch, executor) = executor(Duration::from_secs(10));
        let job = job("import sys\nprint('out')\nprint('err', file=sys.stderr)", Language::Python, "");

        let first = executor.execute(&job).await.unwrap();
        let second = executor.execute(&job).await.unwrap();

        assert_eq!(first.stdout, second.stdout);
        assert_eq!(first.stderr, second.stderr);
        assert_eq!(first.status, second.status);
    }

    #[tokio::test]
    async fn test_timeout_kills_and_cleans_up() {
        if !has("python3") {
            return;
        }
        let (scratch, executor) = executor(Duration::from_millis(300));

        let result = executor
            .execute(&job("import time\ntime.sleep(10)", Language::Python, ""))
            .await
            .unwrap();

        assert_eq!(result.status, ExecutionStatus::TimeLimitExceeded);
        assert_eq!(result.stderr, "Execution timed out");
        assert!(scratch_is_empty(&scratch));
    }

    #[tokio::test]
    async fn test_cpp_two_sum_harness() {
        if !has("g++") {
            return;
        }
        let (scratch, executor) = executor(Duration::from_secs(30));
        let code = r#"class Solution {
public:
    vector<int> twoSum(vector<int>& nums, int target) {
        for (int i = 0; i < (int)nums.size(); ++i)
            for (int j = i + 1; j < (int)nums.size(); ++j)
                if (nums[i] + nums[j] == target) return {i, j};
        return {};
    }
};"#;
        let signature = ProblemSignature::new(
            "twoSum",
            vec![ParamType::IntArray, ParamType::Int],
            ParamType::IntArray,
        );
        let program = TemplateEngine::new()
            .wrap(code, Language::Cpp, Some(&signature))
            .unwrap();

        let result = executor
            .execute(&job(&program, Language::Cpp, "2,7,11,15\n9\n"))
            .await
            .unwrap();

        assert_eq!(result.status, ExecutionStatus::Accepted, "{}", result.stderr);
        assert_eq!(result.stdout.trim(), "[0,1]");
        assert!(scratch_is_empty(&scratch));
    }

    #[tokio::test]
    async fn test_cpp_compilation_error() {
        if !has("g++") {
            return;
        }
        let (scratch, executor) = executor(Duration::from_secs(30));

        let result = executor
            .execute(&job("int main() { return undefined_name; }", Language::Cpp, ""))
            .await
            .unwrap();

        assert_eq!(result.status, ExecutionStatus::CompilationError);
        assert!(result.compile_output.unwrap().contains("undefined_name"));
        assert!(scratch_is_empty(&scratch));
    }

    #[tokio::test]
    async fn test_missing_toolchain_is_internal_error_and_cleans_up() {
        let (scratch, executor) = executor(Duration::from_secs(5));
        let profile = LanguageProfile {
            run: CommandTemplate::new(&["codeprep-no-such-toolchain", "{src}"]),
            ..*LanguageProfile::for_language(Language::Python)
        };

        let result = executor
            .execute_with_profile(&profile, &job("print(1)", Language::Python, ""))
            .await
            .unwrap();

        assert_eq!(result.status, ExecutionStatus::InternalError);
        assert!(result.message.unwrap().contains("codeprep-no-such-toolchain"));
        assert!(scratch_is_empty(&scratch));
    }

    #[tokio::test]
    async fn test_nonzero_exit_with_clean_stderr_is_accepted() {
        if !has("node") {
            return;
        }
        let (_scratch, executor) = executor(Duration::from_secs(10));

        let result = executor
            .execute(&job("console.log('done'); process.exit(3);", Language::JavaScript, ""))
            .await
            .unwrap();

        assert_eq!(result.status, ExecutionStatus::Accepted);
        assert_eq!(result.stdout, "done\n");
        assert_eq!(result.exit_code, Some(3));
    }

    #[tokio::test]
    async fn test_compiled_language_with_relative_scratch_dir() {
        if !has("g++") {
            return;
        }
        let relative = std::path::PathBuf::from(format!(
            "codeprep-local-rel-{}",
            uuid::Uuid::new_v4().simple()
        ));
        let executor = LocalExecutor::new(LocalConfig {
            scratch_dir: relative.clone(),
            timeout: Duration::from_secs(30),
            ..LocalConfig::default()
        });

        let result = executor
            .execute(&job(
                "#include <iostream>\nint main() { std::cout << \"hi\" << std::endl; }",
                Language::Cpp,
                "",
            ))
            .await
            .unwrap();

        let leftover = std::fs::read_dir(&relative).unwrap().count();
        std::fs::remove_dir_all(&relative).unwrap();
        assert_eq!(result.status, ExecutionStatus::Accepted, "{}", result.stderr);
        assert_eq!(result.stdout, "hi\n");
        assert_eq!(leftover, 0);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        if !has("python3") {
            return;
        }
        let scratch = tempdir().unwrap();
        let executor = LocalExecutor::new(LocalConfig {
            scratch_dir: scratch.path().to_path_buf(),
            timeout: Duration::from_secs(10),
            max_concurrent: 1,
            ..LocalConfig::default()
        });
        let sleeper = job("import time\ntime.sleep(0.4)", Language::Python, "");

        let start = Instant::now();
        let (first, second) = tokio::join!(executor.execute(&sleeper), executor.execute(&sleeper));

        assert!(first.unwrap().is_accepted());
        assert!(second.unwrap().is_accepted());
        assert!(start.elapsed() >= Duration::from_millis(800));
        assert_eq!(executor.available_slots(), 1);
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let config = LocalConfig {
            max_concurrent: 0,
            ..LocalConfig::default()
        };
        assert_eq!(LocalExecutor::new(config).available_slots(), 1);
    }

    #[test]
    fn test_truncate_output() {
        assert_eq!(truncate_output(b"hello world", 5), "hello");
        assert_eq!(truncate_output(b"hi", 5), "hi");
    }
}
