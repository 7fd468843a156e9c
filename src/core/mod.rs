//! Core Module - Detection Engine & Scan Pipeline
//!
//! Source normalization, sanitization, the pattern catalog, the bounded
//! matcher, verdicts, and the end-to-end analyzer.

pub mod analyzer;
pub mod detector;
pub mod matcher;
pub mod normalizer;
pub mod patterns;
pub mod sanitizer;
pub mod verdict;

pub use analyzer::*;
pub use detector::*;
pub use matcher::*;
pub use normalizer::*;
pub use patterns::*;
pub use sanitizer::*;
pub use verdict::*;
