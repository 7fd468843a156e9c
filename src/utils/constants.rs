//! Constants Module - Single Source of Truth
//!
//! Every limit, default and endpoint used across the scanner is defined here.
//! Other modules import these instead of repeating literals.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "HoneypotScan";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for explorer requests
pub const USER_AGENT: &str = "HoneypotScan/0.1.0";

/// Detection version tag. Bump whenever the pattern catalog changes so that
/// cached verdicts produced by an older catalog stop being served.
pub const DETECTION_VERSION: &str = "v3";

// ============================================
// CHAIN IDS
// ============================================

/// Ethereum Mainnet
pub const CHAIN_ID_ETHEREUM: u64 = 1;
/// Polygon PoS
pub const CHAIN_ID_POLYGON: u64 = 137;
/// Arbitrum One
pub const CHAIN_ID_ARBITRUM: u64 = 42161;

/// All supported chain IDs, in probe/report order
pub const SUPPORTED_CHAIN_IDS: [u64; 3] = [CHAIN_ID_ETHEREUM, CHAIN_ID_POLYGON, CHAIN_ID_ARBITRUM];

/// Machine name of a chain (used in cache keys and API responses)
pub fn get_chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_ID_ETHEREUM => "ethereum",
        CHAIN_ID_POLYGON => "polygon",
        CHAIN_ID_ARBITRUM => "arbitrum",
        _ => "unknown",
    }
}

/// Human-readable chain name
pub fn get_chain_display_name(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_ID_ETHEREUM => "Ethereum",
        CHAIN_ID_POLYGON => "Polygon",
        CHAIN_ID_ARBITRUM => "Arbitrum",
        _ => "Unknown",
    }
}

// ============================================
// EXPLORER CONSTANTS
// ============================================

/// Etherscan V2 multichain endpoint (chain selected by `chainid` query param)
pub const DEFAULT_EXPLORER_API_URL: &str = "https://api.etherscan.io/v2/api";

/// Number of numbered `ETHERSCAN_API_KEY_<n>` slots read from the environment
pub const MAX_API_KEY_SLOTS: usize = 6;

/// Per-request timeout for explorer calls (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Per-request timeout for chain bytecode lookups (seconds)
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// Backoff between API key attempts (milliseconds)
pub const DEFAULT_KEY_BACKOFF_MS: u64 = 50;

// ============================================
// CACHE CONSTANTS
// ============================================

/// Default verdict TTL: one day
pub const DEFAULT_CACHE_TTL_SECS: u64 = 86_400;

/// Cache-Control header for successful scan responses
pub const CACHE_CONTROL_VALUE: &str =
    "public, max-age=86400, s-maxage=86400, stale-while-revalidate=604800";

// ============================================
// SANITIZER LIMITS
// ============================================

/// Maximum accepted size of user-supplied code (bytes)
pub const MAX_CODE_SIZE_BYTES: usize = 100 * 1024;

/// Minimum length of sanitized code to be considered a contract (chars)
pub const MIN_CODE_LENGTH: usize = 50;

// ============================================
// MATCHER LIMITS
// ============================================

/// Wall-clock budget per pattern (milliseconds)
pub const DEFAULT_REGEX_TIMEOUT_MS: u64 = 100;

/// Match ceiling per pattern
pub const DEFAULT_MAX_MATCHES_PER_PATTERN: usize = 100;

/// Inputs larger than this are scanned in overlapping windows (bytes)
pub const DEFAULT_CHUNK_SIZE: usize = 50_000;

/// Window overlap (bytes). Must stay at least twice `MAX_MATCH_SPAN`.
pub const DEFAULT_CHUNK_OVERLAP: usize = 4_096;

/// Longest span (bytes) any catalog pattern is expected to cover
pub const MAX_MATCH_SPAN: usize = 2_048;

/// Inputs are truncated to this many bytes before matching
pub const DEFAULT_MAX_SOURCE_LENGTH: usize = 500 * 1024;

/// Maximum characters kept in a finding's code snippet
pub const SNIPPET_MAX_CHARS: usize = 100;

// ============================================
// VERDICT CONSTANTS
// ============================================

/// Default minimum number of findings for a honeypot verdict
pub const DEFAULT_MIN_PATTERNS_FOR_DETECTION: usize = 1;

/// Honeypot-branch confidence floor
pub const HONEYPOT_CONFIDENCE_FLOOR: u8 = 60;

/// Honeypot-branch confidence gained per finding
pub const HONEYPOT_CONFIDENCE_STEP: u8 = 10;

/// Honeypot-branch confidence ceiling
pub const HONEYPOT_CONFIDENCE_CEILING: u8 = 95;

/// Safe-branch confidence with zero findings
pub const SAFE_CONFIDENCE_BASE: u8 = 100;

/// Safe-branch confidence lost per sub-threshold finding
pub const SAFE_CONFIDENCE_STEP: u8 = 10;

/// Safe-branch confidence floor
pub const SAFE_CONFIDENCE_FLOOR: u8 = 70;

// ============================================
// API / PERIMETER CONSTANTS
// ============================================

/// Requests allowed per client per window
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 30;

/// Rate limit window (seconds)
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Rate limiter store size that triggers forced eviction
pub const RATE_LIMIT_MAX_STORE_SIZE: usize = 5_000;

/// Maximum addresses per batch request
pub const MAX_BATCH_ADDRESSES: usize = 3;

/// Maximum request body (bytes)
pub const MAX_REQUEST_BODY_BYTES: usize = 256 * 1024;

/// Overall per-request timeout for the HTTP server (seconds)
pub const DEFAULT_HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;
