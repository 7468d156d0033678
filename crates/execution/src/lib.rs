//! Code Insight Execution
//!
//! Runs a submission's source as a child process inside a scratch
//! directory and reports what it printed, how long it took and an
//! approximate memory sample.
//!
//! - `registry`: language to executable table
//! - `workspace`: scoped scratch directories
//! - `dispatcher`: process lifecycle with timeout and kill
//! - `memory`: memory sampling

pub mod dispatcher;
pub mod error;
pub mod memory;
pub mod models;
pub mod registry;
pub mod workspace;

pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use error::{ExecutionError, ExecutionResult, FailureReason};
pub use models::ExecutionOutcome;
pub use registry::ExecutorRegistry;
pub use workspace::{source_file_name, Workspace};
