//! Honeypot Scan Library
//!
//! Static source scanner for EVM token contracts. Given a contract address
//! it finds the chain the contract lives on, pulls verified Solidity from a
//! block explorer and runs a catalog of honeypot signatures over it:
//! - `tx.origin` based balance, allowance and transfer traps
//! - hidden sell taxes and sell blocks
//! - whitelist-only and asymmetric transfer logic
//!
//! Pasted source can be scanned offline through the same detector.

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::analyzer::ContractAnalyzer;
pub use crate::core::detector::HoneypotDetector;
pub use crate::core::matcher::{scan_source, MatchReport, PatternMatcher};
pub use crate::core::patterns::{HoneypotPattern, Severity, HONEYPOT_PATTERNS};
pub use crate::core::sanitizer::{sanitize_contract_code, SanitizeResult};
pub use models::config::{AppConfig, Chain, MatchLimits, ScanConfig};
pub use models::errors::{AppError, AppResult, ErrorCode};
pub use models::types::{CodeScanResult, DetectionVerdict, Finding, ScanResult, TokenMetadata};
pub use utils::cache::{CacheStats, VerdictCache};
