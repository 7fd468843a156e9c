//! Type definitions for the honeypot scanner
//! Findings, verdicts and the scan result returned at the API boundary

use serde::{Deserialize, Serialize};

use crate::models::config::Chain;

/// One pattern hit in analysed source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Catalog name of the pattern that fired
    #[serde(rename = "name")]
    pub pattern_name: String,
    /// 1-based line of the match start
    #[serde(rename = "line")]
    pub line_number: usize,
    /// Up to 100 characters from the match start
    #[serde(rename = "code")]
    pub code_snippet: String,
}

/// Aggregated detection outcome. Always recomputed from source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionVerdict {
    pub is_honeypot: bool,
    /// 0-100
    pub confidence: u8,
    pub findings: Vec<Finding>,
    pub message: String,
}

/// Best-effort metadata pulled from the explorer response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub compiler_version: Option<String>,
}

impl TokenMetadata {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.symbol.is_none() && self.compiler_version.is_none()
    }
}

/// Sanitizer statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeStats {
    pub lines: usize,
    pub chars: usize,
}

/// Result of scanning an on-chain address
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub is_honeypot: bool,
    pub confidence: u8,
    pub patterns: Vec<Finding>,
    pub chain: Chain,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_metadata: Option<TokenMetadata>,
    /// RFC 3339 timestamp
    pub scanned_at: String,
    pub detection_version: String,
    /// Lossy or partial matching that happened during this scan
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Served from the verdict cache
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
}

/// Result of scanning pasted source code
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeScanResult {
    pub is_honeypot: bool,
    pub confidence: u8,
    pub patterns: Vec<Finding>,
    pub message: String,
    pub stats: CodeStats,
    pub scanned_at: String,
    pub detection_version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
