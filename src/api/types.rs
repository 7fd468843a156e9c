//! API Request/Response Types

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::core::patterns::HoneypotPattern;
use crate::models::errors::{AppError, ErrorCode};
use crate::models::types::ScanResult;
use crate::utils::cache::CacheStats;
use crate::utils::telemetry::ScanStats;

// ============================================
// Requests
// ============================================

/// POST /v1/scan
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub skip_cache: bool,
}

/// POST /v1/scan/code
#[derive(Debug, Clone, Deserialize)]
pub struct CodeScanRequest {
    #[serde(default)]
    pub code: Option<String>,
}

/// POST /v1/scan/batch
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchScanRequest {
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub skip_cache: bool,
}

// ============================================
// Responses
// ============================================

/// Error body: `{ "error": message, "code": CODE }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        Self {
            error: err.public_message(),
            code: err.code_str().to_string(),
        }
    }
}

/// One address in a batch response
#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ScanResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchScanResponse {
    pub results: Vec<BatchItem>,
    pub total: usize,
    pub honeypots: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternsResponse {
    pub detection_version: &'static str,
    pub min_patterns_for_detection: usize,
    pub patterns: &'static [HoneypotPattern],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub detection_version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsData {
    pub scans: ScanStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,
    pub rate_limited_clients: usize,
}

// ============================================
// Error rendering
// ============================================

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if self.code == ErrorCode::Internal {
            // Full detail stays server-side
            error!(code = self.code_str(), source = ?self.source, "💥 Internal error: {}", self.message);
        }

        let mut response = (status, Json(ErrorBody::from(&self))).into_response();
        if self.code.is_retryable() {
            response
                .headers_mut()
                .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        }
        response
    }
}
