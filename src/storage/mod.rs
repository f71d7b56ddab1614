//! Settings storage and persistence module.
//!
//! Handles saving and loading the application settings to/from disk.

pub mod settings;

// Re-export commonly used items
pub use settings::*;
