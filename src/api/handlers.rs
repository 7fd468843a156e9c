//! API Request Handlers

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::middleware::{RateLimitConfig, RateLimiter};
use super::types::*;
use crate::core::analyzer::ContractAnalyzer;
use crate::core::patterns::HONEYPOT_PATTERNS;
use crate::models::config::AppConfig;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::utils::constants::{APP_VERSION, CACHE_CONTROL_VALUE, DETECTION_VERSION, MAX_BATCH_ADDRESSES};

/// Shared application state
pub struct AppState {
    pub analyzer: ContractAnalyzer,
    pub rate_limiter: Arc<RateLimiter>,
    pub config: AppConfig,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let analyzer = ContractAnalyzer::new(&config)?;
        Ok(Self::with_analyzer(config, analyzer))
    }

    /// State around an existing analyzer (tests, custom wiring)
    pub fn with_analyzer(config: AppConfig, analyzer: ContractAnalyzer) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig::from(&config.server)));
        Self {
            analyzer,
            rate_limiter,
            config,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Map body extraction failures onto the error taxonomy
fn body_error(rejection: JsonRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::new(ErrorCode::RequestTooLarge, "Request body too large")
    } else {
        AppError::new(ErrorCode::InvalidJson, format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

// ============================================
// Health & Stats
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthData> {
    Json(HealthData {
        status: "healthy".to_string(),
        version: APP_VERSION.to_string(),
        detection_version: DETECTION_VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsData> {
    Json(StatsData {
        scans: state.analyzer.telemetry().get_stats(),
        cache: state.analyzer.cache().map(|c| c.stats()),
        rate_limited_clients: state.rate_limiter.tracked_clients(),
    })
}

pub async fn list_patterns(State(state): State<Arc<AppState>>) -> Json<PatternsResponse> {
    Json(PatternsResponse {
        detection_version: DETECTION_VERSION,
        min_patterns_for_detection: state.config.scan.min_patterns_for_detection,
        patterns: HONEYPOT_PATTERNS,
    })
}

// ============================================
// Scanning
// ============================================

/// POST /v1/scan
pub async fn scan_address(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload.map_err(body_error)?;
    let address = req
        .address
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(AppError::missing_address)?;

    let result = state.analyzer.scan_address(&address, req.skip_cache).await?;
    Ok(([(header::CACHE_CONTROL, CACHE_CONTROL_VALUE)], Json(result)))
}

/// POST /v1/scan/code
pub async fn scan_code(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CodeScanRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload.map_err(body_error)?;
    let code = req.code.unwrap_or_default();

    // CPU-bound; keep it off the async workers
    let analyzer = state.analyzer.clone();
    let result = tokio::task::spawn_blocking(move || analyzer.scan_code(&code))
        .await
        .map_err(|e| AppError::internal(format!("Code scan task failed: {}", e)))??;

    info!(
        is_honeypot = result.is_honeypot,
        patterns = result.patterns.len(),
        lines = result.stats.lines,
        "📝 Code scan complete"
    );
    Ok(Json(result))
}

/// POST /v1/scan/batch
pub async fn scan_batch(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BatchScanRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload.map_err(body_error)?;

    if req.addresses.is_empty() {
        return Err(AppError::missing_address());
    }
    if req.addresses.len() > MAX_BATCH_ADDRESSES {
        warn!(requested = req.addresses.len(), "Batch too large");
        return Err(AppError::new(
            ErrorCode::BatchTooLarge,
            format!("At most {} addresses per batch", MAX_BATCH_ADDRESSES),
        ));
    }

    let outcomes = state.analyzer.scan_batch(&req.addresses, req.skip_cache).await;

    let results: Vec<BatchItem> = req
        .addresses
        .into_iter()
        .zip(outcomes)
        .map(|(address, outcome)| match outcome {
            Ok(result) => BatchItem {
                address,
                result: Some(result),
                error: None,
            },
            Err(e) => BatchItem {
                address,
                result: None,
                error: Some(ErrorBody::from(&e)),
            },
        })
        .collect();

    let honeypots = results
        .iter()
        .filter(|item| item.result.as_ref().is_some_and(|r| r.is_honeypot))
        .count();
    let failed = results.iter().filter(|item| item.error.is_some()).count();

    Ok(Json(BatchScanResponse {
        total: results.len(),
        honeypots,
        failed,
        results,
    }))
}
