//! Storage Layer
//!
//! Handles all data persistence: analysis records (in memory or SQLite) and
//! the JSON config file.

pub mod analysis_store;
pub mod config;
pub mod database;

pub use analysis_store::{AnalysisStore, MemoryAnalysisStore};
pub use config::ConfigService;
pub use database::{Database, DbPool};
