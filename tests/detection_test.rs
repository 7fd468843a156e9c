//! Detection engine integration tests: sanitizer → matcher → verdict

mod common;

use common::{CLEAN_SOURCE, TRAP_SOURCE};
use honeypot_scan::core::{sanitize_contract_code, strip_comments};
use honeypot_scan::{scan_source, ErrorCode, HoneypotDetector, MatchLimits, ScanConfig};
use std::time::{Duration, Instant};

fn detector_with_threshold(min_patterns_for_detection: usize) -> HoneypotDetector {
    HoneypotDetector::new(ScanConfig {
        min_patterns_for_detection,
        ..ScanConfig::default()
    })
}

#[test]
fn test_two_signatures_flagged_with_confidence() {
    let result = HoneypotDetector::default().scan_code(TRAP_SOURCE).unwrap();

    assert!(result.is_honeypot);
    assert!(result.confidence >= 80);
    let names: Vec<&str> = result.patterns.iter().map(|f| f.pattern_name.as_str()).collect();
    assert!(names.contains(&"balance_tx_origin"));
    assert!(names.contains(&"transfer_tx_origin"));
    assert!(result.message.contains("DO NOT BUY"));
}

#[test]
fn test_clean_contract_is_safe() {
    let result = HoneypotDetector::default().scan_code(CLEAN_SOURCE).unwrap();

    assert!(!result.is_honeypot);
    assert!(result.patterns.is_empty());
    assert!((95..=100).contains(&result.confidence));
}

#[test]
fn test_threshold_decides_verdict() {
    for threshold in 1..=3 {
        let result = detector_with_threshold(threshold).scan_code(TRAP_SOURCE).unwrap();
        assert_eq!(result.patterns.len(), 2);
        assert_eq!(
            result.is_honeypot,
            result.patterns.len() >= threshold,
            "threshold {}",
            threshold
        );
    }
}

#[test]
fn test_detection_is_deterministic() {
    let detector = HoneypotDetector::default();
    let first = detector.scan_code(TRAP_SOURCE).unwrap();
    let second = detector.scan_code(TRAP_SOURCE).unwrap();

    assert_eq!(first.patterns, second.patterns);
    assert_eq!(first.confidence, second.confidence);
    assert_eq!(first.is_honeypot, second.is_honeypot);
}

#[test]
fn test_commented_out_trap_is_ignored() {
    let source = r#"pragma solidity ^0.8.0;

contract Token {
    mapping(address => uint256) private _balances;

    // function balanceOf(address a) public view returns (uint256) { return tx.origin == a ? 1 : 0; }
    /*
    function transfer(address to, uint256 amount) public returns (bool) {
        require(tx.origin == owner);
    }
    */
    function balanceOf(address account) public view returns (uint256) {
        return _balances[account];
    }
}
"#;
    let result = HoneypotDetector::default().scan_code(source).unwrap();
    assert!(result.patterns.is_empty());
    assert!(!result.is_honeypot);
}

#[test]
fn test_inline_block_comment_does_not_hide_trap() {
    let source = r#"pragma solidity ^0.8.0;

contract Token {
    function/**/balanceOf(address a) public view returns (uint256) { return tx.origin == a ? 1 : 0; }
}
"#;
    let result = HoneypotDetector::default().scan_code(source).unwrap();
    let names: Vec<&str> = result.patterns.iter().map(|f| f.pattern_name.as_str()).collect();
    assert!(names.contains(&"balance_tx_origin"));
    assert!(result.is_honeypot);
}

#[test]
fn test_url_in_string_survives_comment_stripping() {
    let code = "string constant SITE = \"https://example.com/token\"; // homepage\nuint x = 1;";
    let stripped = strip_comments(code);
    assert!(stripped.contains("\"https://example.com/token\""));
    assert!(!stripped.contains("homepage"));
    assert!(stripped.contains("uint x = 1;"));
}

#[test]
fn test_html_input_rejected() {
    let sanitized = sanitize_contract_code("<script>alert(1)</script> pragma solidity ^0.8.0; contract A {}");
    assert!(!sanitized.is_valid);

    let err = HoneypotDetector::default()
        .scan_code("<img src=x onerror=alert(1)> pragma solidity ^0.8.0; contract A {}")
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidCode);
}

#[test]
fn test_adversarial_input_stays_within_budget() {
    // compile the catalog before timing
    scan_source("", MatchLimits::default());

    let mut hostile = String::from("pragma solidity ^0.8.0;\ncontract Hostile {\n");
    for _ in 0..300 {
        hostile.push_str("function balanceOf(address a) public view returns (uint256) { require(a != address(0) ");
        hostile.push_str("if (origin == a && origin == a ");
        hostile.push_str("[ origin                                    ");
    }

    let started = Instant::now();
    let report = scan_source(&hostile, MatchLimits::default());
    let elapsed = started.elapsed();

    // unoptimized test builds get more headroom
    let budget = if cfg!(debug_assertions) {
        Duration::from_secs(2)
    } else {
        Duration::from_millis(200)
    };
    assert!(elapsed < budget, "scan took {:?}", elapsed);
    assert!(report.findings.is_empty());
    assert!(report.failed_patterns.is_empty());
}

#[test]
fn test_signature_in_middle_of_large_file() {
    let filler_line = "    uint256 private _reserve0 = 1000000000000000000;\n";
    let mut before = String::from("pragma solidity ^0.8.0;\ncontract Large {\n");
    while before.len() < 35_000 {
        before.push_str(filler_line);
    }
    let trap = "    function balanceOf(address account) public view returns (uint256) {\n        return tx.origin == account ? 1 : 0;\n    }\n";
    let mut source = before.clone();
    source.push_str(trap);
    while source.len() < 70_000 {
        source.push_str(filler_line);
    }
    source.push_str("}\n");

    let report = scan_source(&source, MatchLimits::default());
    let hit = report
        .findings
        .iter()
        .find(|f| f.pattern_name == "balance_tx_origin")
        .expect("mid-file signature detected");

    assert_eq!(hit.line_number, before.matches('\n').count() + 1);
    assert!(hit.code_snippet.starts_with("function balanceOf"));
    assert!(!report.truncated);
}
