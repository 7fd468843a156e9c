//! Models Module - Data Structures & Configuration
//!
//! Single source of truth for data types, configuration and the error taxonomy.

pub mod config;
pub mod errors;
pub mod types;

pub use config::*;
pub use errors::*;
pub use types::*;
