//! HTTP Client Factory
//!
//! Provides a factory function for building the reqwest client shared by a
//! provider for its whole lifetime.

use std::time::Duration;

use crate::types::{LlmError, LlmResult};

/// Build a `reqwest::Client` whose requests are abandoned after `timeout_secs`.
///
/// A zero timeout disables the client-side limit; callers are then expected
/// to bound the request themselves.
pub fn build_http_client(timeout_secs: u64) -> LlmResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder().connect_timeout(Duration::from_secs(10));
    if timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(timeout_secs));
    }
    builder.build().map_err(|e| LlmError::Other {
        message: format!("failed to build HTTP client: {}", e),
    })
}
