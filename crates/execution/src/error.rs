//! Execution Errors

use std::time::Duration;

use code_insight_core::Language;
use thiserror::Error;

use crate::models::ExecutionOutcome;

/// Why a started (or attempted) process did not finish cleanly
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    SpawnFailed(String),
    NonZeroExit(Option<i32>),
    TimedOut(Duration),
    /// Killed because the caller cancelled
    Cancelled,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::SpawnFailed(msg) => write!(f, "Failed to start process: {}", msg),
            FailureReason::NonZeroExit(Some(code)) => {
                write!(f, "Process exited with status {}", code)
            }
            FailureReason::NonZeroExit(None) => write!(f, "Process terminated by signal"),
            FailureReason::TimedOut(limit) => {
                write!(f, "Process timed out after {} seconds", limit.as_secs())
            }
            FailureReason::Cancelled => write!(f, "Process cancelled"),
        }
    }
}

/// Dispatcher errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// No executor registered; nothing was spawned
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(Language),

    /// Cancelled before anything was spawned
    #[error("Execution cancelled")]
    Cancelled,

    #[error("Failed to prepare workspace: {0}")]
    Workspace(#[from] std::io::Error),

    /// The process could not run to a clean exit. Carries whatever was captured.
    #[error("{reason}")]
    Failure {
        reason: FailureReason,
        outcome: ExecutionOutcome,
    },
}

impl ExecutionError {
    pub(crate) fn failure(reason: FailureReason, outcome: ExecutionOutcome) -> Self {
        Self::Failure { reason, outcome }
    }

    /// Best-effort outcome, present only for `Failure`
    pub fn outcome(&self) -> Option<&ExecutionOutcome> {
        match self {
            Self::Failure { outcome, .. } => Some(outcome),
            _ => None,
        }
    }
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;
