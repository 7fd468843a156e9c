//! Centralized Error Handling Module
//!
//! Every failure path carries a unique machine-readable code plus a message
//! that is safe to show to an end user. Underlying causes are kept in
//! `source` for server-side logs and never rendered to clients.
//!
//! Categories:
//! - input errors (400): bad address, bad code, bad JSON
//! - not found (404): contract missing or source unverified
//! - rate limited (429)
//! - upstream failures (503): explorer errors, timeouts, key exhaustion
//! - internal errors (500)

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    /// HTTP status for this error
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // ============================================
    // Input Errors
    // ============================================
    /// Request had no address
    MissingAddress,
    /// Address is not 0x + 40 hex chars
    InvalidAddress,
    /// Mixed-case address with a wrong EIP-55 checksum
    InvalidChecksum,
    /// Body was not valid JSON for the endpoint
    InvalidJson,
    /// Submitted code failed sanitization
    InvalidCode,
    /// Too many addresses in one batch
    BatchTooLarge,
    /// Request body over the size limit
    RequestTooLarge,

    // ============================================
    // Not Found
    // ============================================
    /// No bytecode on any supported chain
    ContractNotFound,
    /// Explorer has no verified source
    SourceNotVerified,
    /// Explorer returned an empty source
    SourceNotAvailable,
    /// Verified source is not Solidity
    SourceNotSolidity,

    // ============================================
    // Rate Limiting
    // ============================================
    /// Client exceeded the per-IP window
    RateLimitExceeded,

    // ============================================
    // Upstream Errors
    // ============================================
    /// Every chain probe failed
    ChainDetectionFailed,
    /// Explorer request timed out
    SourceFetchTimeout,
    /// Explorer rate limited us
    ExternalRateLimit,
    /// Explorer failed for another reason
    SourceFetchFailed,
    /// No explorer API keys configured
    NoApiKeys,
    /// Whole request exceeded the server budget
    RequestTimeout,

    // ============================================
    // Generic
    // ============================================
    /// Unexpected internal error
    Internal,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingAddress => "MISSING_ADDRESS",
            Self::InvalidAddress => "INVALID_ADDRESS",
            Self::InvalidChecksum => "INVALID_CHECKSUM",
            Self::InvalidJson => "INVALID_JSON",
            Self::InvalidCode => "INVALID_CODE",
            Self::BatchTooLarge => "BATCH_TOO_LARGE",
            Self::RequestTooLarge => "REQUEST_TOO_LARGE",

            Self::ContractNotFound => "CONTRACT_NOT_FOUND",
            Self::SourceNotVerified => "SOURCE_NOT_VERIFIED",
            Self::SourceNotAvailable => "SOURCE_NOT_AVAILABLE",
            Self::SourceNotSolidity => "SOURCE_NOT_SOLIDITY",

            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",

            Self::ChainDetectionFailed => "CHAIN_DETECTION_FAILED",
            Self::SourceFetchTimeout => "SOURCE_FETCH_TIMEOUT",
            Self::ExternalRateLimit => "EXTERNAL_RATE_LIMIT",
            Self::SourceFetchFailed => "SOURCE_FETCH_FAILED",
            Self::NoApiKeys => "NO_API_KEYS",
            Self::RequestTimeout => "REQUEST_TIMEOUT",

            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::MissingAddress
            | Self::InvalidAddress
            | Self::InvalidChecksum
            | Self::InvalidJson
            | Self::InvalidCode
            | Self::BatchTooLarge => 400,
            Self::RequestTooLarge => 413,
            Self::ContractNotFound
            | Self::SourceNotVerified
            | Self::SourceNotAvailable
            | Self::SourceNotSolidity => 404,
            Self::RateLimitExceeded => 429,
            Self::ChainDetectionFailed
            | Self::SourceFetchTimeout
            | Self::ExternalRateLimit
            | Self::SourceFetchFailed
            | Self::NoApiKeys
            | Self::RequestTimeout => 503,
            Self::Internal => 500,
        }
    }

    /// Check if the client may retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded
                | Self::ChainDetectionFailed
                | Self::SourceFetchTimeout
                | Self::ExternalRateLimit
                | Self::SourceFetchFailed
                | Self::RequestTimeout
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    pub fn missing_address() -> Self {
        Self::new(ErrorCode::MissingAddress, "Address is required")
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddress, msg)
    }

    pub fn invalid_code(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidCode, msg)
    }

    pub fn contract_not_found() -> Self {
        Self::new(
            ErrorCode::ContractNotFound,
            "Contract not found on supported chains (Ethereum, Polygon, Arbitrum). \
             Please verify the address is correct and the contract is deployed.",
        )
    }

    pub fn source_not_verified() -> Self {
        Self::new(
            ErrorCode::SourceNotVerified,
            "Contract source code is not verified on block explorer. \
             Only verified contracts can be scanned.",
        )
    }

    pub fn source_not_available() -> Self {
        Self::new(
            ErrorCode::SourceNotAvailable,
            "Contract source code not available or not verified on the block explorer.",
        )
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self::new(
            ErrorCode::RateLimitExceeded,
            format!(
                "Rate limit exceeded. Please try again in {} seconds.",
                retry_after_secs
            ),
        )
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    /// Message safe to return to a client. Internal details stay in logs.
    pub fn public_message(&self) -> String {
        match self.code {
            ErrorCode::Internal => "An unexpected error occurred. Please try again later.".to_string(),
            ErrorCode::SourceFetchTimeout => {
                "Request timed out while fetching contract source. Please try again.".to_string()
            }
            ErrorCode::ExternalRateLimit => {
                "External API rate limit reached. Please wait a moment and try again.".to_string()
            }
            ErrorCode::SourceFetchFailed | ErrorCode::NoApiKeys => {
                "Failed to fetch contract source code. Please try again later.".to_string()
            }
            ErrorCode::ChainDetectionFailed => {
                "Failed to detect contract chain. Please try again.".to_string()
            }
            _ => self.message.clone(),
        }
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::invalid_address("Invalid contract address format");
        assert_eq!(err.code, ErrorCode::InvalidAddress);
        assert_eq!(err.code_str(), "INVALID_ADDRESS");
        assert_eq!(err.to_string(), "[INVALID_ADDRESS] Invalid contract address format");
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::InvalidAddress.http_status(), 400);
        assert_eq!(ErrorCode::SourceNotVerified.http_status(), 404);
        assert_eq!(ErrorCode::RateLimitExceeded.http_status(), 429);
        assert_eq!(ErrorCode::SourceFetchFailed.http_status(), 503);
        assert_eq!(ErrorCode::Internal.http_status(), 500);
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::SourceFetchTimeout.is_retryable());
        assert!(ErrorCode::RateLimitExceeded.is_retryable());
        assert!(!ErrorCode::InvalidAddress.is_retryable());
        assert!(!ErrorCode::SourceNotVerified.is_retryable());
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::internal("db pool poisoned at worker.rs:42");
        assert!(!err.public_message().contains("worker.rs"));

        let err = AppError::new(ErrorCode::SourceFetchFailed, "All 3 API keys failed: API error: NOTOK");
        assert!(!err.public_message().contains("NOTOK"));
    }
}
