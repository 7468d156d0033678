//! Response Types
//!
//! Standard response envelope for all commands.

use serde::{Deserialize, Serialize};

/// Generic command response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    /// Set when the error was caused by the caller's input
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub client_error: bool,
}

impl<T> CommandResponse<T> {
    /// Create a successful response with data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            client_error: false,
        }
    }

    /// Create an error response with message
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            client_error: false,
        }
    }

    /// Create an error response from an application error
    pub fn from_error(err: crate::utils::error::AppError) -> Self {
        Self {
            client_error: err.is_client_error(),
            ..Self::err(err.to_string())
        }
    }
}

impl<T> From<Result<T, crate::utils::error::AppError>> for CommandResponse<T> {
    fn from(result: Result<T, crate::utils::error::AppError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::from_error(e),
        }
    }
}

/// Advisory service health report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryHealth {
    pub provider: String,
    pub model: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
