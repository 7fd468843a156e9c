//! Honeypot detector
//!
//! Matcher + verdict, and the offline code-scan path
//! (sanitize → match → verdict) used for pasted source.

use chrono::Utc;
use tracing::{debug, info};

use crate::core::matcher::PatternMatcher;
use crate::core::sanitizer::sanitize_contract_code;
use crate::core::verdict::build_verdict;
use crate::models::config::ScanConfig;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{CodeScanResult, DetectionVerdict};
use crate::utils::constants::DETECTION_VERSION;

/// Verdict plus notes on partial matching
#[derive(Debug, Clone)]
pub struct Detection {
    pub verdict: DetectionVerdict,
    pub warnings: Vec<String>,
}

/// Stateless detector over the built-in pattern catalog
#[derive(Debug, Clone, Copy, Default)]
pub struct HoneypotDetector {
    config: ScanConfig,
}

impl HoneypotDetector {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Run the catalog over already-sanitized source
    pub fn detect(&self, sanitized: &str) -> Detection {
        let report = PatternMatcher::with_catalog(self.config.limits).scan(sanitized);
        let warnings = report.warnings();
        let verdict = build_verdict(report.findings, self.config.min_patterns_for_detection);

        debug!(
            is_honeypot = verdict.is_honeypot,
            findings = verdict.findings.len(),
            confidence = verdict.confidence,
            "Detection complete"
        );

        Detection { verdict, warnings }
    }

    /// Scan user-pasted source. Sanitizer rejections become `INVALID_CODE`.
    pub fn scan_code(&self, code: &str) -> AppResult<CodeScanResult> {
        let sanitized = sanitize_contract_code(code);
        if !sanitized.is_valid {
            return Err(AppError::invalid_code(
                sanitized.error.unwrap_or_else(|| "Invalid code".to_string()),
            ));
        }

        let Detection { verdict, warnings } = self.detect(&sanitized.sanitized);
        if verdict.is_honeypot {
            info!(findings = verdict.findings.len(), "🍯 Honeypot patterns in pasted code");
        }

        Ok(CodeScanResult {
            is_honeypot: verdict.is_honeypot,
            confidence: verdict.confidence,
            patterns: verdict.findings,
            message: verdict.message,
            stats: sanitized.stats,
            scanned_at: Utc::now().to_rfc3339(),
            detection_version: DETECTION_VERSION.to_string(),
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;

    const HONEYPOT: &str = r#"pragma solidity ^0.8.0;

contract Trap {
    mapping(address => uint256) private _balances;
    address private _owner;

    function balanceOf(address account) public view returns (uint256) {
        address caller = tx.origin;
        return caller == _owner ? _balances[account] : 0;
    }

    function transfer(address to, uint256 amount) public returns (bool) {
        address caller = tx.origin;
        _balances[caller] -= amount;
        _balances[to] += amount;
        return true;
    }
}
"#;

    const CLEAN: &str = r#"pragma solidity ^0.8.0;

contract Token {
    mapping(address => uint256) private _balances;

    function balanceOf(address account) public view returns (uint256) {
        return _balances[account];
    }

    function transfer(address to, uint256 amount) public returns (bool) {
        require(_balances[msg.sender] >= amount, "insufficient");
        _balances[msg.sender] -= amount;
        _balances[to] += amount;
        return true;
    }
}
"#;

    #[test]
    fn test_two_signatures_flagged() {
        let result = HoneypotDetector::default().scan_code(HONEYPOT).unwrap();
        let names: Vec<_> = result.patterns.iter().map(|p| p.pattern_name.as_str()).collect();
        assert_eq!(names, vec!["balance_tx_origin", "transfer_tx_origin"]);
        assert!(result.is_honeypot);
        assert!(result.confidence >= 80);
    }

    #[test]
    fn test_clean_contract() {
        let result = HoneypotDetector::default().scan_code(CLEAN).unwrap();
        assert!(result.patterns.is_empty());
        assert!(!result.is_honeypot);
        assert!((95..=100).contains(&result.confidence));
        assert_eq!(result.detection_version, DETECTION_VERSION);
    }

    #[test]
    fn test_threshold_respected() {
        let detector = HoneypotDetector::new(ScanConfig {
            min_patterns_for_detection: 3,
            ..ScanConfig::default()
        });
        let result = detector.scan_code(HONEYPOT).unwrap();
        assert_eq!(result.patterns.len(), 2);
        assert!(!result.is_honeypot);
    }

    #[test]
    fn test_invalid_code_rejected() {
        let err = HoneypotDetector::default().scan_code("hello").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCode);
    }

    #[test]
    fn test_deterministic() {
        let detector = HoneypotDetector::default();
        let a = detector.detect(HONEYPOT);
        let b = detector.detect(HONEYPOT);
        assert_eq!(a.verdict, b.verdict);
    }
}
