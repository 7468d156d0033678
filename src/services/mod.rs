//! Services
//!
//! Business logic behind the commands.

pub mod analysis;
