//! Address validation
//!
//! `0x` + 40 hex chars, case-insensitive. Length is checked before anything
//! else so oversized input is rejected without scanning it. Strict mode also
//! verifies the EIP-55 checksum of mixed-case addresses (keccak256 of the
//! lowercase hex).

use alloy_primitives::keccak256;

use crate::models::errors::{AppError, AppResult, ErrorCode};

/// Length of `0x` + 40 hex chars
pub const ADDRESS_LENGTH: usize = 42;

/// Validate an address and return it trimmed.
///
/// All-lowercase and all-uppercase addresses carry no checksum and always
/// pass; mixed-case addresses are checked only when `strict` is set.
pub fn validate_address(address: &str, strict: bool) -> AppResult<String> {
    let address = address.trim();
    if address.is_empty() {
        return Err(AppError::missing_address());
    }

    if address.len() != ADDRESS_LENGTH {
        return Err(AppError::invalid_address(
            "Invalid contract address format. Expected 0x followed by 40 hex characters.",
        ));
    }

    let Some(hex_part) = address.strip_prefix("0x") else {
        return Err(AppError::invalid_address("Address must start with 0x"));
    };

    if hex::decode(hex_part).is_err() {
        return Err(AppError::invalid_address("Address contains non-hex characters"));
    }

    if strict && !is_valid_checksum(address) {
        return Err(AppError::new(
            ErrorCode::InvalidChecksum,
            "Address checksum is invalid (EIP-55). Check the address for typos.",
        ));
    }

    Ok(address.to_string())
}

/// Quick shape check without error details
pub fn is_valid_address(address: &str) -> bool {
    validate_address(address, false).is_ok()
}

/// EIP-55 checksummed form of a `0x` + 40 hex address
pub fn to_checksum_address(address: &str) -> String {
    let lower = address.trim_start_matches("0x").to_lowercase();
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(ADDRESS_LENGTH);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// True for single-case addresses or a correct EIP-55 mixed-case address
pub fn is_valid_checksum(address: &str) -> bool {
    let hex_part = address.trim_start_matches("0x");
    let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
    if !(has_lower && has_upper) {
        return true;
    }
    to_checksum_address(address) == address
}
