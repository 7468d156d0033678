//! Data Models
//!
//! Contains all data structures used throughout the application.

pub mod analysis;
pub mod response;
pub mod settings;

pub use analysis::*;
pub use response::*;
pub use settings::*;
