//! Honeypot Pattern Catalog
//!
//! Ordered list of source-level honeypot signatures. Every quantifier in
//! every pattern is explicitly bounded (`{0,500}`, `\s{0,32}`) so a match
//! stays local to one function body and worst-case cost is capped by the
//! pattern itself. `audit_pattern` enforces that rule; the catalog is
//! checked against it in tests.
//!
//! Changing this list changes verdicts: bump `DETECTION_VERSION` in
//! `utils/constants.rs` so cached results are invalidated.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::fmt;
use tracing::error;

/// Compiled program size cap. The bounded Unicode classes (`[^}]{0,500}`)
/// expand to large programs, well above the crate default.
const PATTERN_SIZE_LIMIT: usize = 64 * (1 << 20);
const PATTERN_DFA_SIZE_LIMIT: usize = 16 * (1 << 20);

/// How bad a hit is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
        })
    }
}

/// One catalog entry
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoneypotPattern {
    pub name: &'static str,
    #[serde(skip)]
    pub regex: &'static str,
    pub title: &'static str,
    pub severity: Severity,
    pub description: &'static str,
}

/// The catalog, in reporting order
pub const HONEYPOT_PATTERNS: &[HoneypotPattern] = &[
    // ERC20 surface with tx.origin abuse
    HoneypotPattern {
        name: "balance_tx_origin",
        regex: r"function\s{1,32}balanceOf[^}]{0,500}?(?:tx\.origin|origin\(\))",
        title: "Balance Check with tx.origin",
        severity: Severity::Critical,
        description: "The balanceOf function uses tx.origin to manipulate balance reporting.",
    },
    HoneypotPattern {
        name: "allowance_tx_origin",
        regex: r"function\s{1,32}allowance[^}]{0,500}?(?:tx\.origin|origin\(\))",
        title: "Allowance Manipulation via tx.origin",
        severity: Severity::Critical,
        description: "The allowance function behaves differently based on tx.origin.",
    },
    HoneypotPattern {
        name: "transfer_tx_origin",
        regex: r"function\s{1,32}transfer[^}]{0,500}?(?:tx\.origin|origin\(\))",
        title: "Transfer Restriction via tx.origin",
        severity: Severity::Critical,
        description: "Transfer function checks tx.origin to selectively block transactions.",
    },
    // Named helpers
    HoneypotPattern {
        name: "hidden_fee_taxPayer",
        regex: r"function\s{1,32}_taxPayer[^}]{0,300}?(?:tx\.origin|origin\(\))",
        title: "Hidden Tax Mechanism",
        severity: Severity::High,
        description: "Contract contains a hidden _taxPayer function using tx.origin.",
    },
    HoneypotPattern {
        name: "isSuper_tx_origin",
        regex: r"function\s{1,32}_isSuper[^}]{0,200}?(?:tx\.origin|origin\(\))",
        title: "Super User Check",
        severity: Severity::High,
        description: "Contract has a _isSuper function that grants special privileges.",
    },
    // tx.origin as an access check or tracking key
    HoneypotPattern {
        name: "tx_origin_require",
        regex: r"\brequire\s{0,32}\([^;]{0,200}?tx\.origin",
        title: "tx.origin in Require Statement",
        severity: Severity::Critical,
        description: "A require statement uses tx.origin for access control.",
    },
    HoneypotPattern {
        name: "tx_origin_if_auth",
        regex: r"\bif\s{0,32}\([^)]{0,200}?(?:tx\.origin\s{0,32}[!=]=|[!=]=\s{0,32}tx\.origin)",
        title: "Conditional tx.origin Authentication",
        severity: Severity::High,
        description: "Authentication logic uses tx.origin in if statements.",
    },
    HoneypotPattern {
        name: "tx_origin_assert",
        regex: r"\bassert\s{0,32}\([^;]{0,200}?tx\.origin",
        title: "tx.origin Assertion",
        severity: Severity::Critical,
        description: "An assert statement checks tx.origin.",
    },
    HoneypotPattern {
        name: "tx_origin_mapping",
        regex: r"\[\s{0,32}tx\.origin\s{0,32}\]",
        title: "tx.origin Tracking in Mapping",
        severity: Severity::Medium,
        description: "Contract stores tx.origin values in a mapping for tracking.",
    },
    // Structural sell blocking
    HoneypotPattern {
        name: "sell_block_pattern",
        regex: r"if\s{0,32}\(\s{0,32}_isSuper\s{0,32}\(\s{0,32}recipient\s{0,32}\)\s{0,32}\)\s{0,32}return\s{1,32}false",
        title: "Explicit Sell Blocking",
        severity: Severity::Critical,
        description: "Contract contains logic that explicitly blocks sells to certain recipients.",
    },
    HoneypotPattern {
        name: "asymmetric_transfer_logic",
        regex: r"function\s{1,32}_canTransfer[^}]{0,500}?return\s{1,32}false",
        title: "Asymmetric Transfer Logic",
        severity: Severity::High,
        description: "Transfer logic behaves differently for buys vs sells.",
    },
    HoneypotPattern {
        name: "transfer_whitelist_only",
        regex: r"require\s{0,32}\(\s{0,32}_whitelist\[[^\]]{0,100}?\]\s{0,32}\|\|\s{0,32}_whitelist\[[^\]]{0,100}?\]\s{0,32},",
        title: "Whitelist-Only Transfers",
        severity: Severity::High,
        description: "Transfers require sender or recipient to be whitelisted.",
    },
    HoneypotPattern {
        name: "hidden_sell_tax",
        regex: r"if\s{0,32}\([^)]{0,200}?pair[^)]{0,100}?\)[^{]{0,100}?\{[^}]{0,300}?sellTax\s{0,32}=\s{0,32}(?:100|9[5-9])",
        title: "Hidden Excessive Sell Tax",
        severity: Severity::Critical,
        description: "Contract applies very high taxes (95-100%) on sells.",
    },
];

/// Catalog entry by name
pub fn get_pattern(name: &str) -> Option<&'static HoneypotPattern> {
    HONEYPOT_PATTERNS.iter().find(|p| p.name == name)
}

/// A catalog entry ready for matching
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub name: &'static str,
    pub regex: Regex,
}

/// Compile one pattern with the raised size limits
pub fn compile_pattern(name: &'static str, source: &str) -> Result<CompiledPattern, regex::Error> {
    let regex = RegexBuilder::new(source)
        .size_limit(PATTERN_SIZE_LIMIT)
        .dfa_size_limit(PATTERN_DFA_SIZE_LIMIT)
        .build()?;
    Ok(CompiledPattern { name, regex })
}

/// Compile a catalog. Entries that fail to compile are logged and skipped
/// so one bad pattern cannot disable the rest.
pub fn compile_catalog(patterns: &[HoneypotPattern]) -> Vec<CompiledPattern> {
    patterns
        .iter()
        .filter_map(|p| match compile_pattern(p.name, p.regex) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                error!(pattern = p.name, "❌ Failed to compile pattern: {}", e);
                None
            }
        })
        .collect()
}

lazy_static! {
    /// The built-in catalog, compiled once
    pub static ref COMPILED_PATTERNS: Vec<CompiledPattern> = compile_catalog(HONEYPOT_PATTERNS);
}

/// Check that a pattern only uses bounded quantifiers.
///
/// Returns the reason a pattern is rejected: an unbounded `*`, `+` or
/// `{n,}` outside a character class, or a bounded repetition applied to a
/// group that already contains a quantifier. Escapes and `[...]` classes
/// are skipped.
pub fn audit_pattern(source: &str) -> Option<&'static str> {
    let chars: Vec<char> = source.chars().collect();
    let mut in_class = false;
    // One entry per open group: does it contain a quantifier?
    let mut groups: Vec<bool> = Vec::new();
    // The atom just before the cursor is a group holding a quantifier
    let mut prev_quantified_group = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' {
            i += 2;
            prev_quantified_group = false;
            continue;
        }

        if in_class {
            if c == ']' {
                in_class = false;
            }
            i += 1;
            continue;
        }

        match c {
            '[' => {
                in_class = true;
                prev_quantified_group = false;
            }
            '(' => {
                groups.push(false);
                prev_quantified_group = false;
                // Skip `?:` / `?s` style group modifiers
                if chars.get(i + 1) == Some(&'?') {
                    i += 1;
                }
            }
            ')' => {
                let inner = groups.pop().unwrap_or(false);
                if inner {
                    if let Some(parent) = groups.last_mut() {
                        *parent = true;
                    }
                }
                prev_quantified_group = inner;
            }
            '*' | '+' => return Some("unbounded quantifier"),
            '{' => {
                let close = chars[i..].iter().position(|&ch| ch == '}').map(|p| i + p);
                let Some(close) = close else {
                    return Some("unterminated repetition");
                };
                let body: String = chars[i + 1..close].iter().collect();
                if body.trim_end().ends_with(',') {
                    return Some("unbounded repetition");
                }
                if prev_quantified_group {
                    return Some("nested quantifier");
                }
                if let Some(top) = groups.last_mut() {
                    *top = true;
                }
                prev_quantified_group = false;
                i = close;
            }
            _ => prev_quantified_group = false,
        }
        i += 1;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_compiles() {
        assert_eq!(COMPILED_PATTERNS.len(), HONEYPOT_PATTERNS.len());
    }

    #[test]
    fn test_catalog_names_unique() {
        let names: HashSet<_> = HONEYPOT_PATTERNS.iter().map(|p| p.name).collect();
        assert_eq!(names.len(), HONEYPOT_PATTERNS.len());
    }

    #[test]
    fn test_catalog_is_bounded() {
        for pattern in HONEYPOT_PATTERNS {
            assert_eq!(audit_pattern(pattern.regex), None, "pattern {} is unbounded", pattern.name);
        }
    }

    #[test]
    fn test_audit_flags_unsafe_patterns() {
        assert_eq!(audit_pattern(r"function\s+transfer"), Some("unbounded quantifier"));
        assert_eq!(audit_pattern(r"a.*b"), Some("unbounded quantifier"));
        assert_eq!(audit_pattern(r"a{2,}"), Some("unbounded repetition"));
        assert_eq!(audit_pattern(r"(a{1,5}){1,5}"), Some("nested quantifier"));
        assert_eq!(audit_pattern(r"(?:x(a{0,3})){0,2}"), Some("nested quantifier"));
    }

    #[test]
    fn test_audit_ignores_escapes_and_classes() {
        assert_eq!(audit_pattern(r"a\+b\*c"), None);
        assert_eq!(audit_pattern(r"[+*]{0,3}"), None);
        assert_eq!(audit_pattern(r"[^\]]{0,100}"), None);
        assert_eq!(audit_pattern(r"(?:100|9[5-9])"), None);
    }

    #[test]
    fn test_balance_pattern_matches() {
        let compiled = compile_pattern("balance_tx_origin", HONEYPOT_PATTERNS[0].regex).unwrap();
        let src = "function balanceOf(address a) public view returns (uint256) {\n    if (tx.origin == owner) return 0;";
        assert!(compiled.regex.is_match(src));
        assert!(!compiled.regex.is_match("function balanceOf(address a) public view returns (uint256) { return b[a]; }"));
    }

    #[test]
    fn test_bounded_window_stops_at_body_end() {
        let compiled = compile_pattern("transfer_tx_origin", HONEYPOT_PATTERNS[2].regex).unwrap();
        // tx.origin appears only after the transfer body closes
        let src = "function transfer(address to, uint256 v) public { _move(to, v); }\nfunction other() public { x = tx.origin; }";
        assert!(!compiled.regex.is_match(src));
    }

    #[test]
    fn test_sell_tax_range() {
        let p = get_pattern("hidden_sell_tax").unwrap();
        let compiled = compile_pattern(p.name, p.regex).unwrap();
        assert!(compiled.regex.is_match("if (to == uniswapPair) { sellTax = 99; }"));
        assert!(!compiled.regex.is_match("if (to == uniswapPair) { sellTax = 5; }"));
    }

    #[test]
    fn test_mapping_key() {
        let p = get_pattern("tx_origin_mapping").unwrap();
        let compiled = compile_pattern(p.name, p.regex).unwrap();
        assert!(compiled.regex.is_match("_buyers[ tx.origin ] = true;"));
    }

    #[test]
    fn test_bad_pattern_skipped() {
        let defs = [
            HoneypotPattern { regex: "(unclosed", ..HONEYPOT_PATTERNS[0] },
            HONEYPOT_PATTERNS[1],
        ];
        let compiled = compile_catalog(&defs);
        assert_eq!(compiled.len(), 1);
        assert_eq!(compiled[0].name, "allowance_tx_origin");
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_value(get_pattern("tx_origin_mapping").unwrap()).unwrap();
        assert_eq!(json["severity"], "medium");
        assert!(json.get("regex").is_none());
    }
}
