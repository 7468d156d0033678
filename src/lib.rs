//! Code Insight
//!
//! Analyzes submitted source files two ways at once: an advisory language
//! model reviews the code while the code itself is executed in a scratch
//! workspace. The two are merged into a single result per file, batches are
//! aggregated and persisted, and every per-file result joins an in-process
//! history.
//!
//! It includes:
//! - Commands returning `CommandResponse` envelopes
//! - Analysis services (advisory parsing, aggregation, batches, history)
//! - Storage layer (in-memory or SQLite records, JSON config)
//! - Data models and utilities

pub mod commands;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use commands::{
    analyze_files, check_advisory_health, get_analysis, get_file_history, list_analyses,
};
pub use models::response::*;
pub use models::settings::AppConfig;
pub use state::AppState;
