//! Execution Models

use serde::{Deserialize, Serialize};

/// What was observed while running one submission.
///
/// `combined_output` is stdout when the program wrote anything there,
/// otherwise stderr. Never mutated after the dispatcher returns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    pub combined_output: String,
    pub execution_time_seconds: f64,
    pub memory_usage_bytes: u64,
    /// Exit code, absent when the process was killed or never started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub timed_out: bool,
}

impl ExecutionOutcome {
    /// Pick the observable output from the two captured streams
    pub fn select_output(stdout: String, stderr: String) -> String {
        if stdout.is_empty() {
            stderr
        } else {
            stdout
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_output_prefers_stdout() {
        assert_eq!(
            ExecutionOutcome::select_output("out".into(), "err".into()),
            "out"
        );
        assert_eq!(
            ExecutionOutcome::select_output(String::new(), "err".into()),
            "err"
        );
    }

    #[test]
    fn test_serializes_camel_case() {
        let outcome = ExecutionOutcome {
            combined_output: "hi\n".into(),
            execution_time_seconds: 0.5,
            memory_usage_bytes: 1024,
            exit_code: Some(0),
            timed_out: false,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["combinedOutput"], "hi\n");
        assert_eq!(json["memoryUsageBytes"], 1024);
        assert_eq!(json["exitCode"], 0);
    }
}
