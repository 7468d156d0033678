//! Integration Tests Module
//!
//! End-to-end batch analysis against a mock advisory server, with real
//! child processes and SQLite persistence.

mod analysis_pipeline_test;
