//! Utils Module - Helper Functions & Shared Utilities
//!
//! Verdict cache, constants, address validation and scan counters.

pub mod cache;
pub mod constants;
pub mod telemetry;
pub mod validator;

pub use cache::*;
pub use constants::*;
pub use telemetry::*;
pub use validator::*;
