//! Contract Analyzer
//!
//! End-to-end address scan:
//! validate → resolve chain → cache lookup → fetch source → normalize →
//! sanitize (trusted mode) → match → verdict → cache store.
//!
//! Upstream failures surface as `AppError` with a specific code; nothing
//! is retried here beyond the fetcher's own key rotation.

use chrono::Utc;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::core::detector::{Detection, HoneypotDetector};
use crate::core::sanitizer::{sanitize_with, SanitizeOptions};
use crate::models::config::{AppConfig, Chain, ScanConfig};
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{CodeScanResult, ScanResult};
use crate::providers::chain_resolver::ChainResolver;
use crate::providers::explorer::ExplorerClient;
use crate::providers::fetcher::{FetchedSource, SourceFetcher};
use crate::utils::cache::VerdictCache;
use crate::utils::constants::DETECTION_VERSION;
use crate::utils::telemetry::ScanTelemetry;
use crate::utils::validator::validate_address;

/// Full scanning pipeline, cheap to clone and share between handlers
#[derive(Clone)]
pub struct ContractAnalyzer {
    detector: HoneypotDetector,
    resolver: ChainResolver,
    fetcher: SourceFetcher,
    cache: Option<VerdictCache>,
    telemetry: Arc<ScanTelemetry>,
}

impl ContractAnalyzer {
    /// Build from application config
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let explorer = ExplorerClient::new(config.explorer.clone())?;
        let cache = config.cache.enabled.then(|| VerdictCache::new(config.cache.ttl));
        if cache.is_none() {
            info!("💤 Verdict cache disabled");
        }
        Ok(Self::from_parts(config.scan, explorer, cache))
    }

    /// Build from already constructed parts
    pub fn from_parts(scan: ScanConfig, explorer: ExplorerClient, cache: Option<VerdictCache>) -> Self {
        Self {
            detector: HoneypotDetector::new(scan),
            resolver: ChainResolver::new(explorer.clone()),
            fetcher: SourceFetcher::new(explorer),
            cache,
            telemetry: Arc::new(ScanTelemetry::new()),
        }
    }

    pub fn detector(&self) -> &HoneypotDetector {
        &self.detector
    }

    pub fn cache(&self) -> Option<&VerdictCache> {
        self.cache.as_ref()
    }

    pub fn telemetry(&self) -> &ScanTelemetry {
        &self.telemetry
    }

    /// Scan a deployed contract by address
    pub async fn scan_address(&self, address: &str, skip_cache: bool) -> AppResult<ScanResult> {
        let started = Instant::now();
        let outcome = self.run_scan(address, skip_cache).await;

        match &outcome {
            Ok(result) if !result.cached => {
                let latency_ms = started.elapsed().as_millis() as u64;
                self.telemetry.record_scan(result.is_honeypot, latency_ms);
                info!(
                    chain = %result.chain,
                    is_honeypot = result.is_honeypot,
                    confidence = result.confidence,
                    patterns = result.patterns.len(),
                    latency_ms,
                    "{} Scan complete",
                    if result.is_honeypot { "🍯" } else { "✅" }
                );
            }
            Ok(_) => {}
            Err(e) => {
                self.telemetry.record_error();
                warn!(code = e.code_str(), "❌ Scan failed: {}", e);
            }
        }

        outcome
    }

    async fn run_scan(&self, address: &str, skip_cache: bool) -> AppResult<ScanResult> {
        let address = validate_address(address, self.detector.config().strict_checksum)?;
        let normalized = address.to_lowercase();

        let chain = self
            .resolver
            .resolve(&normalized)
            .await?
            .ok_or_else(AppError::contract_not_found)?;

        if let Some(cache) = self.cache.as_ref().filter(|_| !skip_cache) {
            if let Some(mut hit) = cache.get(chain, &normalized) {
                self.telemetry.record_cache_hit();
                hit.cached = true;
                return Ok(hit);
            }
            self.telemetry.record_cache_miss();
        }

        let fetched = self.fetcher.fetch_source(chain, &normalized).await?;
        let analyzer = self.clone();
        let result = tokio::task::spawn_blocking(move || analyzer.analyze_source(chain, fetched))
            .await
            .map_err(|e| AppError::internal(format!("Analysis task failed: {}", e)))??;

        if let Some(cache) = &self.cache {
            cache.set(chain, &normalized, &result);
        }

        Ok(result)
    }

    /// Sanitize and score fetched source for `chain`.
    ///
    /// CPU bound; async callers run it on the blocking pool.
    pub fn analyze_source(&self, chain: Chain, fetched: FetchedSource) -> AppResult<ScanResult> {
        if fetched.source.trim().is_empty() {
            return Err(AppError::source_not_available());
        }

        let sanitized = sanitize_with(&fetched.source, SanitizeOptions::trusted_source());
        if !sanitized.is_valid {
            return Err(AppError::new(
                ErrorCode::SourceNotSolidity,
                sanitized
                    .error
                    .unwrap_or_else(|| "Verified source is not Solidity".to_string()),
            ));
        }

        let Detection { verdict, warnings } = self.detector.detect(&sanitized.sanitized);
        let metadata = fetched.metadata;

        Ok(ScanResult {
            is_honeypot: verdict.is_honeypot,
            confidence: verdict.confidence,
            patterns: verdict.findings,
            chain,
            message: verdict.message,
            token_metadata: (!metadata.is_empty()).then_some(metadata),
            scanned_at: Utc::now().to_rfc3339(),
            detection_version: DETECTION_VERSION.to_string(),
            warnings,
            cached: false,
        })
    }

    /// Scan pasted source code (no network)
    pub fn scan_code(&self, code: &str) -> AppResult<CodeScanResult> {
        let outcome = self.detector.scan_code(code);
        match &outcome {
            Ok(result) => self.telemetry.record_code_scan(result.is_honeypot),
            Err(_) => self.telemetry.record_error(),
        }
        outcome
    }

    /// Scan several addresses concurrently; one result per input, in order
    pub async fn scan_batch(&self, addresses: &[String], skip_cache: bool) -> Vec<AppResult<ScanResult>> {
        join_all(addresses.iter().map(|a| self.scan_address(a, skip_cache))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::ExplorerConfig;
    use crate::models::types::TokenMetadata;

    fn analyzer() -> ContractAnalyzer {
        let explorer = ExplorerClient::new(ExplorerConfig::default()).unwrap();
        ContractAnalyzer::from_parts(ScanConfig::default(), explorer, Some(VerdictCache::default()))
    }

    #[test]
    fn test_analyze_source_keeps_metadata() {
        let fetched = FetchedSource {
            source: "pragma solidity ^0.8.0;\n\ncontract Token {\n    function balanceOf(address a) public view returns (uint256) { return 0; }\n}".to_string(),
            metadata: TokenMetadata {
                name: Some("Token".to_string()),
                ..Default::default()
            },
        };
        let result = analyzer().analyze_source(Chain::Polygon, fetched).unwrap();
        assert!(!result.is_honeypot);
        assert_eq!(result.chain, Chain::Polygon);
        assert_eq!(result.token_metadata.unwrap().name.as_deref(), Some("Token"));
    }

    #[test]
    fn test_analyze_source_rejects_non_solidity() {
        let fetched = FetchedSource {
            source: "# Vyper\n@external\ndef transfer(to: address, amount: uint256) -> bool:\n    return True".to_string(),
            metadata: TokenMetadata::default(),
        };
        let err = analyzer().analyze_source(Chain::Ethereum, fetched).unwrap_err();
        assert_eq!(err.code, ErrorCode::SourceNotSolidity);
    }

    #[test]
    fn test_trusted_source_allows_svg_literals() {
        let fetched = FetchedSource {
            source: "pragma solidity ^0.8.0;\n\ncontract Art {\n    string constant IMG = \"<svg xmlns='http://www.w3.org/2000/svg'/>\";\n}".to_string(),
            metadata: TokenMetadata::default(),
        };
        assert!(analyzer().analyze_source(Chain::Ethereum, fetched).is_ok());
    }

    #[test]
    fn test_blank_source_not_available() {
        let fetched = FetchedSource {
            source: " \n\t\n".to_string(),
            metadata: TokenMetadata::default(),
        };
        let err = analyzer().analyze_source(Chain::Arbitrum, fetched).unwrap_err();
        assert_eq!(err.code, ErrorCode::SourceNotAvailable);
        assert_eq!(err.code_str(), "SOURCE_NOT_AVAILABLE");
        assert_eq!(err.code.http_status(), 404);
    }

    #[tokio::test]
    async fn test_invalid_address_fails_before_network() {
        let analyzer = analyzer();
        let err = analyzer.scan_address("0xnope", false).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAddress);
        assert_eq!(analyzer.telemetry().get_stats().errors, 1);
    }

    #[test]
    fn test_code_scan_counted() {
        let analyzer = analyzer();
        assert!(analyzer.scan_code("not solidity").is_err());
        assert_eq!(analyzer.telemetry().get_stats().errors, 1);
    }
}
