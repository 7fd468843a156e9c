//! Block Explorer HTTP Client
//!
//! Thin wrapper over the Etherscan V2 multichain API. One shared
//! `reqwest::Client` (gzip, user agent, per-request timeout) serves both
//! bytecode probes and source fetches. Every call returns a classified
//! `ExplorerError` so callers can decide between "try the next key",
//! "not on this chain" and "give up".
//!
//! API: {base}?chainid=<id>&module=<m>&action=<a>&address=<addr>&apikey=<key>

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::models::config::{Chain, ExplorerConfig};
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::utils::constants::USER_AGENT as USER_AGENT_CONST;

/// Raw explorer envelope. `result` is an array for contract calls, a hex
/// string for proxy calls, and an error string on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Value,
}

impl ExplorerResponse {
    /// Error text the explorer put in `result` or `message`
    pub fn error_text(&self) -> String {
        match (&self.result, &self.message) {
            (Value::String(s), _) if !s.is_empty() => s.clone(),
            (_, Some(m)) if !m.is_empty() => m.clone(),
            _ => "Unknown error".to_string(),
        }
    }
}

/// Why a single explorer call failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorerError {
    /// Request exceeded its timeout
    Timeout,
    /// HTTP 429 or an explorer "rate limit" message
    RateLimited(String),
    /// Non-2xx status
    Http(u16),
    /// Explorer answered with `status != "1"`
    Api(String),
    /// Connection-level failure
    Transport(String),
    /// Body was not the expected JSON
    Decode(String),
    /// Explorer answered, but had no source for the address
    MissingSource,
}

impl fmt::Display for ExplorerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "request timed out"),
            Self::RateLimited(msg) => write!(f, "rate limited: {}", msg),
            Self::Http(status) => write!(f, "HTTP {}", status),
            Self::Api(msg) => write!(f, "API error: {}", msg),
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
            Self::Decode(msg) => write!(f, "malformed response: {}", msg),
            Self::MissingSource => write!(f, "source code not found"),
        }
    }
}

impl std::error::Error for ExplorerError {}

impl ExplorerError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }

    /// Explorer-level error text, with rate limit messages split out
    pub fn from_api_message(msg: String) -> Self {
        if msg.to_lowercase().contains("rate limit") {
            Self::RateLimited(msg)
        } else {
            Self::Api(msg)
        }
    }

    /// Failures tied to the API key used; another key may succeed
    pub fn is_key_related(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Api(_) | Self::Http(_))
    }

    /// Final error once every attempt has failed with `self` as the last cause
    pub fn into_app_error(self, attempts: usize) -> AppError {
        let code = match &self {
            Self::Timeout => ErrorCode::SourceFetchTimeout,
            Self::RateLimited(_) => ErrorCode::ExternalRateLimit,
            Self::MissingSource => ErrorCode::SourceNotVerified,
            Self::Api(msg) if is_unverified_message(msg) => ErrorCode::SourceNotVerified,
            _ => ErrorCode::SourceFetchFailed,
        };
        if code == ErrorCode::SourceNotVerified {
            return AppError::source_not_verified();
        }
        let message = format!("All {} API key attempt(s) failed: {}", attempts, self);
        AppError::with_source(code, message, self)
    }
}

fn is_unverified_message(msg: &str) -> bool {
    let msg = msg.to_lowercase();
    msg.contains("not verified") || msg.contains("source code not found")
}

/// Shared explorer client
#[derive(Clone)]
pub struct ExplorerClient {
    client: reqwest::Client,
    config: ExplorerConfig,
}

impl ExplorerClient {
    pub fn new(config: ExplorerConfig) -> AppResult<Self> {
        let client = Self::build_client(&config)?;
        Ok(Self { client, config })
    }

    fn build_client(config: &ExplorerConfig) -> AppResult<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .gzip(true)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn api_keys(&self) -> &[String] {
        &self.config.api_keys
    }

    /// One GET against the explorer with the configured request timeout.
    /// Non-2xx and undecodable bodies are errors; API-level `status` is left
    /// to the caller.
    pub async fn call(
        &self,
        chain: Chain,
        module: &str,
        action: &str,
        address: &str,
        api_key: Option<&str>,
    ) -> Result<ExplorerResponse, ExplorerError> {
        self.call_with_timeout(chain, module, action, address, api_key, self.config.request_timeout)
            .await
    }

    /// Same as [`call`](Self::call) with an explicit per-request timeout
    pub async fn call_with_timeout(
        &self,
        chain: Chain,
        module: &str,
        action: &str,
        address: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<ExplorerResponse, ExplorerError> {
        let chain_id = chain.chain_id().to_string();
        let mut query: Vec<(&str, &str)> = vec![
            ("chainid", chain_id.as_str()),
            ("module", module),
            ("action", action),
            ("address", address),
        ];
        if module == "proxy" {
            query.push(("tag", "latest"));
        }
        if let Some(key) = api_key {
            query.push(("apikey", key));
        }

        debug!(chain = %chain, module, action, "Explorer request");

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&query)
            .timeout(timeout)
            .send()
            .await
            .map_err(ExplorerError::from_reqwest)?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ExplorerError::RateLimited("HTTP 429".to_string()));
        }
        if !status.is_success() {
            return Err(ExplorerError::Http(status.as_u16()));
        }

        response
            .json::<ExplorerResponse>()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExplorerError::Timeout
                } else {
                    ExplorerError::Decode(e.to_string())
                }
            })
    }
}
