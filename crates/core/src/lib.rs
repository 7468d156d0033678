//! Code Insight Core
//!
//! Foundational types shared by every crate in the Code Insight workspace.
//! This crate has no dependencies on process execution, HTTP, or storage code.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `language` - Supported languages, canonical extensions, extension inference
//! - `submission` - The unit of analysis (`CodeSubmission`, `SubmissionContext`)

pub mod error;
pub mod language;
pub mod submission;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Languages ──────────────────────────────────────────────────────────
pub use language::Language;

// ── Submissions ────────────────────────────────────────────────────────
pub use submission::{CodeSubmission, SubmissionContext};
