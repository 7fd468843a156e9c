//! Source Fetcher
//!
//! Pulls verified source for an address from the explorer, rotating over
//! the configured API keys:
//! - key order is a fresh Fisher–Yates shuffle per call (no shared cursor)
//! - keys are tried one at a time, with a short backoff between attempts
//! - each attempt has its own request timeout
//! - only running out of keys is a failure; the error carries the last cause
//!
//! Successful payloads go through the source normalizer and come back with
//! best-effort metadata (contract name, symbol, compiler version).

use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::core::normalizer::normalize_source;
use crate::models::config::Chain;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::TokenMetadata;
use crate::providers::explorer::{ExplorerClient, ExplorerError, ExplorerResponse};

lazy_static! {
    static ref SYMBOL_ASSIGNMENT: Regex =
        Regex::new(r#"\b_?symbol\s{0,8}=\s{0,8}"([^"\n]{1,32})""#).unwrap();
    static ref ERC20_CONSTRUCTOR: Regex =
        Regex::new(r#"\bERC20\s{0,8}\(\s{0,8}"[^"\n]{0,64}"\s{0,8},\s{0,8}"([^"\n]{1,32})""#).unwrap();
}

/// Verified source plus whatever metadata the explorer gave us
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSource {
    /// Normalized (flattened) source
    pub source: String,
    pub metadata: TokenMetadata,
}

/// Unbiased in-place Fisher–Yates shuffle
pub fn shuffle_with<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Fresh random order of `keys`; the input is untouched
pub fn shuffle_keys(keys: &[String]) -> Vec<String> {
    let mut shuffled = keys.to_vec();
    shuffle_with(&mut shuffled, &mut rand::thread_rng());
    shuffled
}

/// Best-effort token symbol from source text
pub fn extract_symbol(source: &str) -> Option<String> {
    SYMBOL_ASSIGNMENT
        .captures(source)
        .or_else(|| ERC20_CONSTRUCTOR.captures(source))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Explorer source fetcher with key rotation
#[derive(Clone)]
pub struct SourceFetcher {
    explorer: ExplorerClient,
}

impl SourceFetcher {
    pub fn new(explorer: ExplorerClient) -> Self {
        Self { explorer }
    }

    /// Fetch verified source, trying the configured keys in random order
    pub async fn fetch_source(&self, chain: Chain, address: &str) -> AppResult<FetchedSource> {
        let keys = shuffle_keys(self.explorer.api_keys());
        self.fetch_with_keys(&keys, chain, address).await
    }

    /// Fetch verified source, trying `keys` in the given order
    pub async fn fetch_with_keys(
        &self,
        keys: &[String],
        chain: Chain,
        address: &str,
    ) -> AppResult<FetchedSource> {
        if keys.is_empty() {
            return Err(AppError::new(ErrorCode::NoApiKeys, "No explorer API keys configured"));
        }

        let started = Instant::now();
        let backoff = self.explorer.config().key_backoff;
        let mut last_error = ExplorerError::MissingSource;

        for (idx, key) in keys.iter().enumerate() {
            if idx > 0 {
                tokio::time::sleep(backoff).await;
            }

            match self.try_key(key, chain, address).await {
                Ok(fetched) => {
                    info!(
                        chain = %chain,
                        attempt = idx + 1,
                        bytes = fetched.source.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "📄 Source fetched"
                    );
                    return Ok(fetched);
                }
                Err(e) => {
                    warn!(chain = %chain, attempt = idx + 1, of = keys.len(), "⚠️ API key attempt failed: {}", e);
                    last_error = e;
                }
            }
        }

        Err(last_error.into_app_error(keys.len()))
    }

    async fn try_key(&self, key: &str, chain: Chain, address: &str) -> Result<FetchedSource, ExplorerError> {
        let response = self
            .explorer
            .call(chain, "contract", "getsourcecode", address, Some(key))
            .await?;
        parse_source_response(&response)
    }
}

/// Turn a `getsourcecode` envelope into normalized source + metadata
pub fn parse_source_response(response: &ExplorerResponse) -> Result<FetchedSource, ExplorerError> {
    if response.status.as_deref() != Some("1") {
        return Err(ExplorerError::from_api_message(response.error_text()));
    }

    let entry = response
        .result
        .as_array()
        .and_then(|items| items.first())
        .ok_or_else(|| ExplorerError::Api("No result in API response".to_string()))?;

    let raw = entry
        .get("SourceCode")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or(ExplorerError::MissingSource)?;

    let source = normalize_source(raw);
    let metadata = TokenMetadata {
        name: non_empty(entry.get("ContractName")),
        symbol: extract_symbol(&source),
        compiler_version: non_empty(entry.get("CompilerVersion")),
    };

    debug!(name = ?metadata.name, compiler = ?metadata.compiler_version, "Parsed source response");
    Ok(FetchedSource { source, metadata })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn response(json: &str) -> ExplorerResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut items: Vec<u32> = (0..20).collect();
        shuffle_with(&mut items, &mut rng);
        let mut sorted = items.clone();
        sorted.sort();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffle_handles_tiny_inputs() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut empty: Vec<u8> = vec![];
        shuffle_with(&mut empty, &mut rng);
        let mut one = vec![42];
        shuffle_with(&mut one, &mut rng);
        assert_eq!(one, vec![42]);
    }

    #[test]
    fn test_shuffle_keys_leaves_input() {
        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let shuffled = shuffle_keys(&keys);
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(shuffled.len(), 3);
    }

    #[test]
    fn test_parse_success() {
        let resp = response(
            r#"{"status":"1","message":"OK","result":[{"SourceCode":"pragma solidity ^0.8.0;\ncontract Pepe { string public symbol = \"PEPE\"; }","ContractName":"Pepe","CompilerVersion":"v0.8.19+commit.7dd6d404"}]}"#,
        );
        let fetched = parse_source_response(&resp).unwrap();
        assert!(fetched.source.contains("contract Pepe"));
        assert_eq!(fetched.metadata.name.as_deref(), Some("Pepe"));
        assert_eq!(fetched.metadata.symbol.as_deref(), Some("PEPE"));
        assert_eq!(fetched.metadata.compiler_version.as_deref(), Some("v0.8.19+commit.7dd6d404"));
    }

    #[test]
    fn test_parse_failures() {
        let api_error = response(r#"{"status":"0","message":"NOTOK","result":"Invalid API Key"}"#);
        assert_eq!(
            parse_source_response(&api_error).unwrap_err(),
            ExplorerError::Api("Invalid API Key".to_string())
        );

        let empty = response(r#"{"status":"1","message":"OK","result":[]}"#);
        assert!(matches!(parse_source_response(&empty), Err(ExplorerError::Api(_))));

        let unverified = response(r#"{"status":"1","message":"OK","result":[{"SourceCode":"","ContractName":""}]}"#);
        assert_eq!(parse_source_response(&unverified).unwrap_err(), ExplorerError::MissingSource);
    }

    #[test]
    fn test_extract_symbol() {
        assert_eq!(extract_symbol(r#"string private _symbol = "SCAM";"#).as_deref(), Some("SCAM"));
        assert_eq!(
            extract_symbol(r#"constructor() ERC20("Good Token", "GOOD") {}"#).as_deref(),
            Some("GOOD")
        );
        assert_eq!(extract_symbol("contract A {}"), None);
    }
}
