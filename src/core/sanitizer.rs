//! Code Sanitizer
//!
//! Gatekeeper between untrusted text and the matcher. Each step can reject
//! the input; rejections are reported through `SanitizeResult`, never as
//! errors, so callers can always render a message.
//!
//! Pipeline:
//! 1. empty check
//! 2. size gate
//! 3. injection denylist on the RAW input (before comments are stripped,
//!    so payloads hidden in comments are still caught)
//! 4. line ending normalization
//! 5. comment stripping with a string-aware scanner
//! 6. blank line collapse + trim
//! 7. minimum length
//! 8. Solidity gate: `pragma solidity` AND a contract/interface/library

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::models::types::CodeStats;
use crate::utils::constants::{MAX_CODE_SIZE_BYTES, MIN_CODE_LENGTH};

lazy_static! {
    /// Signatures of markup/script injection attempts
    static ref INJECTION_SIGNATURES: Vec<(&'static str, Regex)> = vec![
        ("script_tag", Regex::new(r"(?i)<\s*/?\s*script").unwrap()),
        (
            "html_tag",
            Regex::new(r"(?i)<\s*(?:html|body|head|div|iframe|frame|object|embed|img|svg|style|link|meta|form|input|base)\b").unwrap()
        ),
        ("event_handler", Regex::new(r"(?i)<[^>]{0,200}\bon[a-z]{2,20}\s*=").unwrap()),
        ("javascript_uri", Regex::new(r"(?i)\bjavascript\s*:").unwrap()),
        ("vbscript_uri", Regex::new(r"(?i)\bvbscript\s*:").unwrap()),
        ("data_html_uri", Regex::new(r"(?i)\bdata\s*:\s*text/html").unwrap()),
        (
            "encoded_tag",
            Regex::new(r"(?i)(?:%3c|&lt;|&#0{0,8}60;?|&#x0{0,8}3c;?|\\u003c|\\x3c)\s*/?\s*(?:script|iframe|img|svg|html|body)").unwrap()
        ),
    ];

    static ref EXCESS_BLANK_LINES: Regex = Regex::new(r"\n(?:[ \t]*\n){2,}").unwrap();
    static ref PRAGMA_SOLIDITY: Regex = Regex::new(r"(?i)pragma\s{1,16}solidity").unwrap();
    static ref DECLARATION: Regex =
        Regex::new(r"(?i)\b(?:contract|interface|library)\s{1,16}\w").unwrap();
}

/// Outcome of sanitization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizeResult {
    pub sanitized: String,
    pub is_valid: bool,
    pub error: Option<String>,
    pub stats: CodeStats,
}

impl SanitizeResult {
    fn rejected(sanitized: String, error: impl Into<String>, stats: CodeStats) -> Self {
        Self {
            sanitized,
            is_valid: false,
            error: Some(error.into()),
            stats,
        }
    }
}

/// Which gates apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeOptions {
    /// Size gate in bytes; `None` disables it
    pub max_bytes: Option<usize>,
    /// Run the injection denylist
    pub check_injection: bool,
    /// Minimum sanitized length in chars
    pub min_length: usize,
}

impl SanitizeOptions {
    /// Untrusted, user-pasted code: every gate on
    pub fn user_input() -> Self {
        Self {
            max_bytes: Some(MAX_CODE_SIZE_BYTES),
            check_injection: true,
            min_length: MIN_CODE_LENGTH,
        }
    }

    /// Verified explorer source: no size gate (the matcher caps length)
    /// and no markup denylist (on-chain SVG/HTML string literals are legal)
    pub fn trusted_source() -> Self {
        Self {
            max_bytes: None,
            check_injection: false,
            min_length: MIN_CODE_LENGTH,
        }
    }
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self::user_input()
    }
}

/// Sanitize user-supplied contract code with every gate enabled
pub fn sanitize_contract_code(code: &str) -> SanitizeResult {
    sanitize_with(code, SanitizeOptions::user_input())
}

/// Sanitize with explicit options
pub fn sanitize_with(code: &str, options: SanitizeOptions) -> SanitizeResult {
    if code.trim().is_empty() {
        return SanitizeResult::rejected(String::new(), "No code provided", CodeStats::default());
    }

    if let Some(max) = options.max_bytes {
        if code.len() > max {
            return SanitizeResult::rejected(
                String::new(),
                format!("Code exceeds maximum size of {}KB", max / 1024),
                CodeStats::default(),
            );
        }
    }

    if options.check_injection {
        if let Some(signature) = find_injection(code) {
            warn!(signature, "🚫 Rejected input matching injection signature");
            return SanitizeResult::rejected(
                String::new(),
                "Invalid input: HTML/script content detected",
                CodeStats::default(),
            );
        }
    }

    let normalized = normalize_line_endings(code);
    let stripped = strip_comments(&normalized);
    let collapsed = EXCESS_BLANK_LINES.replace_all(&stripped, "\n\n");
    let sanitized = collapsed.trim().to_string();
    let stats = code_stats(&sanitized);

    if stats.chars < options.min_length {
        return SanitizeResult::rejected(sanitized, "Code is too short to be a valid contract", stats);
    }

    if !is_solidity(&sanitized) {
        return SanitizeResult::rejected(
            sanitized,
            "No valid Solidity code detected (missing pragma solidity or contract/interface/library declaration)",
            stats,
        );
    }

    debug!(lines = stats.lines, chars = stats.chars, "Sanitized contract code");
    SanitizeResult {
        sanitized,
        is_valid: true,
        error: None,
        stats,
    }
}

/// Name of the first injection signature found in `raw`, if any
pub fn find_injection(raw: &str) -> Option<&'static str> {
    INJECTION_SIGNATURES
        .iter()
        .find(|(_, re)| re.is_match(raw))
        .map(|(name, _)| *name)
}

/// `pragma solidity` plus at least one contract/interface/library declaration
pub fn is_solidity(code: &str) -> bool {
    PRAGMA_SOLIDITY.is_match(code) && DECLARATION.is_match(code)
}

pub fn code_stats(code: &str) -> CodeStats {
    if code.is_empty() {
        return CodeStats::default();
    }
    CodeStats {
        lines: code.split('\n').count(),
        chars: code.chars().count(),
    }
}

fn normalize_line_endings(code: &str) -> String {
    code.replace("\r\n", "\n").replace('\r', "\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    DoubleQuoted,
    SingleQuoted,
    LineComment,
    /// `spans_lines` once a newline has been seen inside the comment
    BlockComment { spans_lines: bool },
}

/// Remove `//` and `/* */` comments while leaving string literals intact.
///
/// A `//` inside `"https://..."` is string content, not a comment. Escapes
/// inside literals are honoured. Newlines inside block comments are kept so
/// line numbers of later code do not shift; a single-line block comment
/// becomes one space so the tokens around it stay separate. Solidity
/// literals cannot span lines, so a newline closes an unterminated literal.
pub fn strip_comments(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut state = ScanState::Code;
    let mut chars = code.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            ScanState::Code => match c {
                '"' => {
                    state = ScanState::DoubleQuoted;
                    out.push(c);
                }
                '\'' => {
                    state = ScanState::SingleQuoted;
                    out.push(c);
                }
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    state = ScanState::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = ScanState::BlockComment { spans_lines: false };
                }
                _ => out.push(c),
            },
            ScanState::DoubleQuoted | ScanState::SingleQuoted => {
                out.push(c);
                let quote = if state == ScanState::DoubleQuoted { '"' } else { '\'' };
                if c == '\\' {
                    match chars.peek() {
                        Some('\n') | None => {}
                        Some(_) => {
                            if let Some(escaped) = chars.next() {
                                out.push(escaped);
                            }
                        }
                    }
                } else if c == quote || c == '\n' {
                    state = ScanState::Code;
                }
            }
            ScanState::LineComment => {
                if c == '\n' {
                    out.push('\n');
                    state = ScanState::Code;
                }
            }
            ScanState::BlockComment { spans_lines } => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    if !spans_lines {
                        out.push(' ');
                    }
                    state = ScanState::Code;
                } else if c == '\n' {
                    out.push('\n');
                    state = ScanState::BlockComment { spans_lines: true };
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "pragma solidity ^0.8.0;\n\ncontract Token {\n";

    fn contract(body: &str) -> String {
        format!("{}{}\n}}\n", HEADER, body)
    }

    #[test]
    fn test_url_in_string_survives() {
        let code = contract(r#"    string public site = "http://example.com"; // real comment"#);
        let result = sanitize_contract_code(&code);
        assert!(result.is_valid, "{:?}", result.error);
        assert!(result.sanitized.contains(r#""http://example.com""#));
        assert!(!result.sanitized.contains("real comment"));
    }

    #[test]
    fn test_line_and_block_comments_removed() {
        let code = contract("    // line comment\n    /* block\n comment */ uint256 x = 1;");
        let result = sanitize_contract_code(&code);
        assert!(result.is_valid);
        assert!(!result.sanitized.contains("line comment"));
        assert!(!result.sanitized.contains("block"));
        assert!(result.sanitized.contains("uint256 x = 1;"));
    }

    #[test]
    fn test_single_quoted_and_escaped_strings() {
        let out = strip_comments(r#"a = 'it\'s // not a comment'; b = "say \"/*hi*/\""; // gone"#);
        assert_eq!(out, r#"a = 'it\'s // not a comment'; b = "say \"/*hi*/\""; "#);
    }

    #[test]
    fn test_block_comment_keeps_line_count() {
        let out = strip_comments("a\n/* one\ntwo\nthree */b");
        assert_eq!(out, "a\n\n\nb");
    }

    #[test]
    fn test_inline_block_comment_separates_tokens() {
        assert_eq!(strip_comments("function/**/balanceOf"), "function balanceOf");
        assert_eq!(strip_comments("tx/* x */.origin"), "tx .origin");
    }

    #[test]
    fn test_unterminated_literal_closes_at_newline() {
        let out = strip_comments("x = \"oops\ny = 1; // comment");
        assert_eq!(out, "x = \"oops\ny = 1; ");
    }

    #[test]
    fn test_empty_rejected() {
        let result = sanitize_contract_code("   \n ");
        assert!(!result.is_valid);
        assert_eq!(result.error.as_deref(), Some("No code provided"));
    }

    #[test]
    fn test_oversized_rejected() {
        let code = contract(&"uint256 a;\n".repeat(MAX_CODE_SIZE_BYTES / 10));
        let result = sanitize_contract_code(&code);
        assert!(!result.is_valid);
        assert!(result.error.unwrap().contains("maximum size"));
    }

    #[test]
    fn test_too_short_rejected() {
        let result = sanitize_contract_code("pragma solidity 0.8.0; contract A {}");
        assert!(!result.is_valid);
        assert!(result.error.unwrap().contains("too short"));
    }

    #[test]
    fn test_requires_pragma_and_declaration() {
        let no_pragma = "contract Token {\n    function transfer(address to, uint256 amount) public {}\n}";
        let result = sanitize_contract_code(no_pragma);
        assert!(!result.is_valid);
        assert!(result.error.unwrap().contains("No valid Solidity"));

        let no_decl = "pragma solidity ^0.8.0;\n\nfunction helper(uint256 a) pure returns (uint256) { return a; }";
        assert!(!sanitize_contract_code(no_decl).is_valid);

        let library = "pragma solidity ^0.8.0;\n\nlibrary SafeMath {\n    function add(uint a, uint b) internal pure returns (uint) { return a + b; }\n}";
        assert!(sanitize_contract_code(library).is_valid);
    }

    #[test]
    fn test_script_in_comment_rejected_before_stripping() {
        let code = contract("    // <script>alert(1)</script>\n    uint256 x;");
        let result = sanitize_contract_code(&code);
        assert!(!result.is_valid);
        assert!(result.sanitized.is_empty());
        assert_eq!(result.stats, CodeStats::default());
    }

    #[test]
    fn test_injection_signatures() {
        assert_eq!(find_injection("<div onclick=x>"), Some("html_tag"));
        assert_eq!(find_injection("<a onmouseover = 'x'>"), Some("event_handler"));
        assert_eq!(find_injection("href=JavaScript:alert(1)"), Some("javascript_uri"));
        assert_eq!(find_injection("data:text/html;base64,AAAA"), Some("data_html_uri"));
        assert_eq!(find_injection("%3Cscript%3E"), Some("encoded_tag"));
        assert_eq!(find_injection("&lt;iframe src=x&gt;"), Some("encoded_tag"));
        assert_eq!(find_injection("require(a < b && onlyOwner == true);"), None);
    }

    #[test]
    fn test_trusted_source_allows_markup_in_literals() {
        let code = contract(r#"    string constant SVG = "<svg xmlns='http://www.w3.org/2000/svg'></svg>";"#);
        assert!(!sanitize_contract_code(&code).is_valid);
        assert!(sanitize_with(&code, SanitizeOptions::trusted_source()).is_valid);
    }

    #[test]
    fn test_blank_lines_collapsed_and_crlf_normalized() {
        let code = "pragma solidity ^0.8.0;\r\n\r\n\r\n\r\ncontract A {\r\n    uint256 public value = 42;\r\n}\r\n";
        let result = sanitize_contract_code(code);
        assert!(result.is_valid);
        assert!(!result.sanitized.contains('\r'));
        assert!(!result.sanitized.contains("\n\n\n"));
        assert_eq!(result.stats.lines, 5);
    }
}
