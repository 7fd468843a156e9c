//! Chain Resolver
//!
//! Finds which supported chain an address has bytecode on. All chains are
//! probed concurrently (`eth_getCode` via the explorer proxy module); the
//! first chain that reports real bytecode wins and the remaining probes are
//! dropped. A failed probe counts as "not on this chain". Resolution only
//! errors when every probe failed.
//!
//! Key order is shuffled per call and each chain starts at a different
//! offset into it. A probe rejected for a key reason (rate limit, API error,
//! HTTP status) moves on to the next key.

use futures_util::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::models::config::Chain;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::providers::explorer::{ExplorerClient, ExplorerError};
use crate::providers::fetcher::shuffle_keys;

/// Concurrent first-success chain lookup
#[derive(Clone)]
pub struct ChainResolver {
    explorer: ExplorerClient,
    chains: Vec<Chain>,
}

impl ChainResolver {
    pub fn new(explorer: ExplorerClient) -> Self {
        Self {
            explorer,
            chains: Chain::ALL.to_vec(),
        }
    }

    /// Restrict probing to a subset of chains
    pub fn with_chains(explorer: ExplorerClient, chains: Vec<Chain>) -> Self {
        Self { explorer, chains }
    }

    /// `Ok(Some(chain))` on the first chain with bytecode, `Ok(None)` when
    /// at least one probe answered and none found code,
    /// `CHAIN_DETECTION_FAILED` when every probe errored.
    pub async fn resolve(&self, address: &str) -> AppResult<Option<Chain>> {
        let keys = shuffle_keys(self.explorer.api_keys());

        let mut probes: FuturesUnordered<_> = self
            .chains
            .iter()
            .enumerate()
            .map(|(idx, &chain)| {
                let keys = &keys;
                async move { (chain, self.probe_with_keys(chain, address, keys, idx).await) }
            })
            .collect();

        let mut answered = 0usize;
        let mut last_error: Option<ExplorerError> = None;

        while let Some((chain, outcome)) = probes.next().await {
            match outcome {
                Ok(true) => {
                    info!(chain = %chain, "🔗 Contract found on {}", chain.display_name());
                    return Ok(Some(chain));
                }
                Ok(false) => {
                    debug!(chain = %chain, "No bytecode");
                    answered += 1;
                }
                Err(e) => {
                    warn!(chain = %chain, "⚠️ Chain probe failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        if answered == 0 {
            if let Some(e) = last_error {
                return Err(AppError::with_source(
                    ErrorCode::ChainDetectionFailed,
                    format!("All {} chain probes failed", self.chains.len()),
                    e,
                ));
            }
        }

        Ok(None)
    }

    /// Probe `chain`, walking `keys` from `offset` until one is accepted
    async fn probe_with_keys(
        &self,
        chain: Chain,
        address: &str,
        keys: &[String],
        offset: usize,
    ) -> Result<bool, ExplorerError> {
        if keys.is_empty() {
            return self.probe(chain, address, None).await;
        }

        let backoff = self.explorer.config().key_backoff;
        let mut last_error = None;

        for attempt in 0..keys.len() {
            if attempt > 0 {
                tokio::time::sleep(backoff).await;
            }
            let key = keys[(offset + attempt) % keys.len()].as_str();
            match self.probe(chain, address, Some(key)).await {
                Err(e) if e.is_key_related() => {
                    debug!(chain = %chain, attempt = attempt + 1, "Probe key rejected: {}", e);
                    last_error = Some(e);
                }
                outcome => return outcome,
            }
        }

        Err(last_error.unwrap_or(ExplorerError::Api("No API key accepted".to_string())))
    }

    async fn probe(&self, chain: Chain, address: &str, api_key: Option<&str>) -> Result<bool, ExplorerError> {
        let timeout = self.explorer.config().probe_timeout;
        let response = self
            .explorer
            .call_with_timeout(chain, "proxy", "eth_getCode", address, api_key, timeout)
            .await?;

        if response.status.as_deref() == Some("0") {
            return Err(ExplorerError::from_api_message(response.error_text()));
        }

        match &response.result {
            Value::String(code) => Ok(is_bytecode(code)),
            _ => Ok(false),
        }
    }
}

/// Non-empty `0x`-prefixed hex. Error strings like "Max rate limit
/// reached" in `result` are not bytecode.
pub fn is_bytecode(result: &str) -> bool {
    let Some(hex_part) = result.strip_prefix("0x") else {
        return false;
    };
    !hex_part.is_empty() && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}
