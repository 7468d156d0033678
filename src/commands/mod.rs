//! Commands
//!
//! Entry points callable by the CLI and embedding applications.

pub mod analysis;

pub use analysis::*;
