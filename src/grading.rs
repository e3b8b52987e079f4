//! Grading harness
//!
//! Runs a submission against stored test cases and compares canonicalized
//! output. Cases are independent: every case runs, in input order, even
//! after a failure.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::sandbox::{ExecutionRequest, ExecutionResult, ExecutionStatus, Orchestrator};

/// Placeholder shown when a run produced nothing worth comparing
pub const NO_OUTPUT: &str = "No output";

/// One stored input/expected-output pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Text fed to stdin
    pub input: String,
    /// Expected stdout
    #[serde(alias = "expectedOutput")]
    pub expected_output: String,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        TestCase {
            input: input.into(),
            expected_output: expected_output.into(),
        }
    }
}

/// Outcome of one test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    /// Position in the submitted list
    pub index: usize,
    pub input: String,
    pub expected: String,
    pub actual: String,
    pub passed: bool,
    /// Execution status of this run
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

/// Overall verdict for a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    /// True iff there was at least one case and all passed
    pub passed: bool,
    pub passed_count: usize,
    pub total: usize,
    pub test_results: Vec<TestCaseResult>,
}

impl Verdict {
    /// Build a verdict from per-case results
    pub fn from_results(test_results: Vec<TestCaseResult>) -> Self {
        let passed_count = test_results.iter().filter(|r| r.passed).count();
        let total = test_results.len();
        Verdict {
            passed: total > 0 && passed_count == total,
            passed_count,
            total,
            test_results,
        }
    }
}

/// Normalize line endings and surrounding whitespace
pub fn canonicalize(output: &str) -> String {
    output
        .replace("\r\n", "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Exact match after canonicalization, or structural match when both sides
/// are JSON (so `[0, 1]` equals `[0,1]`).
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    let actual = canonicalize(actual);
    let expected = canonicalize(expected);
    if actual == expected {
        return true;
    }

    match (
        serde_json::from_str::<serde_json::Value>(&actual),
        serde_json::from_str::<serde_json::Value>(&expected),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Compare one execution result against its test case
pub fn compare(index: usize, result: &ExecutionResult, case: &TestCase) -> TestCaseResult {
    let usable = result.status.has_usable_output();
    let actual = if usable {
        canonicalize(&result.stdout)
    } else {
        NO_OUTPUT.to_string()
    };
    let passed = usable
        && result.status != ExecutionStatus::TimeLimitExceeded
        && outputs_match(&result.stdout, &case.expected_output);

    TestCaseResult {
        index,
        input: case.input.clone(),
        expected: canonicalize(&case.expected_output),
        actual,
        passed,
        status: result.status,
        elapsed_ms: result.elapsed_ms,
    }
}

/// Runs submissions through an orchestrator and grades them
pub struct Grader<'a> {
    orchestrator: &'a Orchestrator,
}

impl<'a> Grader<'a> {
    pub fn new(orchestrator: &'a Orchestrator) -> Self {
        Grader { orchestrator }
    }

    /// Run `request` once per case, with the case input as stdin
    pub async fn grade(&self, request: &ExecutionRequest, cases: &[TestCase]) -> Verdict {
        let runs = cases.iter().map(|case| {
            let request = request.clone().with_stdin(case.input.clone());
            async move { self.orchestrator.run(&request).await }
        });
        let results = join_all(runs).await;

        let test_results = results
            .iter()
            .zip(cases)
            .enumerate()
            .map(|(index, (result, case))| compare(index, result, case))
            .collect();

        let verdict = Verdict::from_results(test_results);
        info!(
            "Graded {} submission: {}/{} passed",
            request.language, verdict.passed_count, verdict.total
        );
        verdict
    }
}
