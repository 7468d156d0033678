//! Result Aggregator
//!
//! Entry point for analyzing one file. The advisory request and the
//! execution run concurrently; their results are merged once both finish.
//! Per-file failures are folded into the returned result and never
//! propagate, so one bad file cannot abort a batch.

use code_insight_core::CodeSubmission;
use code_insight_execution::{Dispatcher, ExecutionError, ExecutionOutcome, FailureReason};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::advisor::Advisor;
use crate::models::analysis::{
    AnalysisResult, Finding, Severity, KIND_AGENT_ERROR, KIND_RUNTIME, KIND_RUNTIME_FAILURE,
};
use crate::models::settings::RuntimeErrorPolicy;

/// Whether execution output looks like a failure: a case-insensitive
/// substring test for "error". Also fires on programs that merely print the
/// word.
pub fn output_indicates_error(output: &str) -> bool {
    output.to_lowercase().contains("error")
}

/// Analyzes single submissions
#[derive(Clone)]
pub struct CodeAnalyzer {
    advisor: Advisor,
    dispatcher: Dispatcher,
    policy: RuntimeErrorPolicy,
}

impl CodeAnalyzer {
    pub fn new(advisor: Advisor, dispatcher: Dispatcher, policy: RuntimeErrorPolicy) -> Self {
        Self {
            advisor,
            dispatcher,
            policy,
        }
    }

    pub fn advisor(&self) -> &Advisor {
        &self.advisor
    }

    /// Analyze one submission. Always returns a well-formed result.
    pub async fn analyze(
        &self,
        submission: &CodeSubmission,
        cancel: &CancellationToken,
    ) -> AnalysisResult {
        let (advice, execution) = tokio::join!(
            self.advisor.request_advice(submission, cancel),
            self.dispatcher.execute(submission, cancel)
        );

        match execution {
            Ok(outcome) => self.merge(submission, advice, outcome, None),
            Err(ExecutionError::Failure { reason, outcome }) => {
                debug!(file = %submission.filename(), %reason, "execution failed");
                self.merge(submission, advice, outcome, Some(reason))
            }
            Err(e) => {
                warn!(file = %submission.filename(), error = %e, "analysis aborted");
                AnalysisResult::single_error(KIND_AGENT_ERROR, e.to_string(), submission.filename())
            }
        }
    }

    /// Overlay measured metrics and output onto the advisory result and
    /// append runtime errors per the configured policy.
    fn merge(
        &self,
        submission: &CodeSubmission,
        advice: AnalysisResult,
        outcome: ExecutionOutcome,
        failure: Option<FailureReason>,
    ) -> AnalysisResult {
        let filename = submission.filename();
        let mut result = advice;
        result.metrics.execution_time = outcome.execution_time_seconds;
        result.metrics.memory_usage = outcome.memory_usage_bytes;

        let output = outcome.combined_output;
        match self.policy {
            RuntimeErrorPolicy::OutputHeuristic => {
                let flagged = output_indicates_error(&output);
                if flagged {
                    result.errors.push(runtime_finding(KIND_RUNTIME, output.clone(), filename));
                }
                if let Some(reason) = failure.filter(|_| !flagged) {
                    result
                        .errors
                        .push(runtime_finding(KIND_RUNTIME_FAILURE, reason.to_string(), filename));
                }
            }
            RuntimeErrorPolicy::ExitStatus => {
                if let Some(reason) = failure {
                    let message = if output.trim().is_empty() {
                        reason.to_string()
                    } else {
                        output.clone()
                    };
                    result.errors.push(runtime_finding(KIND_RUNTIME, message, filename));
                }
            }
        }

        result.output.insert(filename.to_string(), output);
        result
    }
}

fn runtime_finding(kind: &str, message: String, filename: &str) -> Finding {
    Finding::new(kind, message, filename)
        .with_line(0)
        .with_severity(Severity::Error)
}
