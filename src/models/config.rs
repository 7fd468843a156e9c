//! Configuration module for the honeypot scanner
//!
//! Chain table plus runtime configuration loaded from the environment.
//! Defaults live in `utils/constants.rs`; nothing is hardcoded here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

use crate::utils::constants::{
    get_chain_display_name, get_chain_name, CHAIN_ID_ARBITRUM, CHAIN_ID_ETHEREUM,
    CHAIN_ID_POLYGON, DEFAULT_CACHE_TTL_SECS, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
    DEFAULT_EXPLORER_API_URL, DEFAULT_HTTP_REQUEST_TIMEOUT_SECS, DEFAULT_KEY_BACKOFF_MS,
    DEFAULT_MAX_MATCHES_PER_PATTERN, DEFAULT_MAX_SOURCE_LENGTH,
    DEFAULT_MIN_PATTERNS_FOR_DETECTION, DEFAULT_PROBE_TIMEOUT_SECS, DEFAULT_RATE_LIMIT_MAX_REQUESTS,
    DEFAULT_RATE_LIMIT_WINDOW_SECS, DEFAULT_REGEX_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_SECS,
    MAX_API_KEY_SLOTS, MAX_REQUEST_BODY_BYTES,
};

/// Supported blockchain networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Polygon,
    Arbitrum,
}

impl Chain {
    /// All chains, in probe order
    pub const ALL: [Chain; 3] = [Chain::Ethereum, Chain::Polygon, Chain::Arbitrum];

    /// Numeric chain ID
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Ethereum => CHAIN_ID_ETHEREUM,
            Self::Polygon => CHAIN_ID_POLYGON,
            Self::Arbitrum => CHAIN_ID_ARBITRUM,
        }
    }

    /// Get chain from numeric ID
    pub fn from_id(id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.chain_id() == id)
    }

    /// Get chain from its machine name ("ethereum", "polygon", ...)
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Machine name (delegates to constants)
    pub fn name(&self) -> &'static str {
        get_chain_name(self.chain_id())
    }

    /// Display name (delegates to constants)
    pub fn display_name(&self) -> &'static str {
        get_chain_display_name(self.chain_id())
    }

    pub fn config(&self) -> ChainConfig {
        ChainConfig {
            name: self.name(),
            chain_id: self.chain_id(),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static chain entry: one per supported network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainConfig {
    pub name: &'static str,
    pub chain_id: u64,
}

// ============================================
// Environment helpers
// ============================================

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, "⚠️ Invalid config value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(raw) => matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

// ============================================
// Matcher / detection configuration
// ============================================

/// Hard bounds for the ReDoS-safe matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchLimits {
    /// Wall-clock budget per pattern
    pub timeout: Duration,
    /// Match ceiling per pattern
    pub max_matches: usize,
    /// Inputs above this size are scanned in windows
    pub chunk_size: usize,
    /// Overlap between consecutive windows
    pub chunk_overlap: usize,
    /// Inputs are truncated to this length before matching
    pub max_source_length: usize,
}

impl Default for MatchLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_REGEX_TIMEOUT_MS),
            max_matches: DEFAULT_MAX_MATCHES_PER_PATTERN,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            max_source_length: DEFAULT_MAX_SOURCE_LENGTH,
        }
    }
}

/// Detection configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Findings needed for `is_honeypot`. 1 favours recall, 2 favours precision.
    pub min_patterns_for_detection: usize,
    /// Reject mixed-case addresses whose EIP-55 checksum is wrong
    pub strict_checksum: bool,
    pub limits: MatchLimits,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_patterns_for_detection: DEFAULT_MIN_PATTERNS_FOR_DETECTION,
            strict_checksum: false,
            limits: MatchLimits::default(),
        }
    }
}

impl ScanConfig {
    pub fn from_env() -> Self {
        let defaults = MatchLimits::default();
        Self {
            min_patterns_for_detection: env_parse(
                "MIN_PATTERNS_FOR_DETECTION",
                DEFAULT_MIN_PATTERNS_FOR_DETECTION,
            )
            .max(1),
            strict_checksum: env_bool("STRICT_CHECKSUM", false),
            limits: MatchLimits {
                timeout: Duration::from_millis(env_parse(
                    "REGEX_TIMEOUT_MS",
                    DEFAULT_REGEX_TIMEOUT_MS,
                )),
                max_matches: env_parse("REGEX_MAX_MATCHES", DEFAULT_MAX_MATCHES_PER_PATTERN).max(1),
                ..defaults
            },
        }
    }
}

// ============================================
// Explorer configuration
// ============================================

/// Block explorer access (source fetch + bytecode probes)
#[derive(Clone)]
pub struct ExplorerConfig {
    pub base_url: String,
    pub api_keys: Vec<String>,
    pub request_timeout: Duration,
    /// Timeout for a single `eth_getCode` chain lookup
    pub probe_timeout: Duration,
    pub key_backoff: Duration,
}

impl fmt::Debug for ExplorerConfig {
    // Keys are never printed
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplorerConfig")
            .field("base_url", &self.base_url)
            .field("api_keys", &format!("<{} hidden>", self.api_keys.len()))
            .field("request_timeout", &self.request_timeout)
            .field("probe_timeout", &self.probe_timeout)
            .field("key_backoff", &self.key_backoff)
            .finish()
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_EXPLORER_API_URL.to_string(),
            api_keys: Vec::new(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            key_backoff: Duration::from_millis(DEFAULT_KEY_BACKOFF_MS),
        }
    }
}

impl ExplorerConfig {
    pub fn from_env() -> Self {
        let api_keys = Self::load_api_keys();
        if api_keys.is_empty() {
            warn!("⚠️ No explorer API keys configured (ETHERSCAN_API_KEY_1..{})", MAX_API_KEY_SLOTS);
        } else {
            info!("🔑 {} explorer API key(s) configured (keys hidden)", api_keys.len());
        }

        Self {
            base_url: std::env::var("EXPLORER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_EXPLORER_API_URL.to_string()),
            api_keys,
            request_timeout: Duration::from_secs(env_parse(
                "EXPLORER_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
            probe_timeout: Duration::from_secs(env_parse(
                "EXPLORER_PROBE_TIMEOUT_SECS",
                DEFAULT_PROBE_TIMEOUT_SECS,
            )),
            key_backoff: Duration::from_millis(env_parse(
                "EXPLORER_KEY_BACKOFF_MS",
                DEFAULT_KEY_BACKOFF_MS,
            )),
        }
    }

    /// Numbered slots first, then the comma-separated list; duplicates dropped
    fn load_api_keys() -> Vec<String> {
        let numbered = (1..=MAX_API_KEY_SLOTS)
            .filter_map(|n| std::env::var(format!("ETHERSCAN_API_KEY_{}", n)).ok());
        let listed = std::env::var("ETHERSCAN_API_KEYS")
            .map(|raw| raw.split(',').map(str::to_string).collect::<Vec<_>>())
            .unwrap_or_default();

        let mut keys: Vec<String> = Vec::new();
        for key in numbered.chain(listed) {
            let key = key.trim().to_string();
            if !key.is_empty() && key != "YOUR_API_KEY" && !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

// ============================================
// Cache configuration
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: env_bool("CACHE_ENABLED", true),
            ttl: Duration::from_secs(env_parse("CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)),
        }
    }
}

// ============================================
// Server configuration
// ============================================

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window: Duration,
    pub max_body_bytes: usize,
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            rate_limit_max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            rate_limit_window: Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW_SECS),
            max_body_bytes: MAX_REQUEST_BODY_BYTES,
            request_timeout: Duration::from_secs(DEFAULT_HTTP_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        // PORT is what most hosting platforms inject; HONEYPOT_PORT for local dev
        let port = std::env::var("PORT")
            .or_else(|_| std::env::var("HONEYPOT_PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        Self {
            host: std::env::var("HOST")
                .or_else(|_| std::env::var("HONEYPOT_HOST"))
                .unwrap_or(defaults.host),
            port,
            rate_limit_max_requests: env_parse(
                "RATE_LIMIT_MAX_REQUESTS",
                DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            ),
            rate_limit_window: Duration::from_secs(env_parse(
                "RATE_LIMIT_WINDOW_SECS",
                DEFAULT_RATE_LIMIT_WINDOW_SECS,
            )),
            ..defaults
        }
    }
}

/// Full application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub scan: ScanConfig,
    pub explorer: ExplorerConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            scan: ScanConfig::from_env(),
            explorer: ExplorerConfig::from_env(),
            cache: CacheConfig::from_env(),
            server: ServerConfig::from_env(),
        }
    }
}
