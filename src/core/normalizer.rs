//! Source Normalizer
//!
//! Explorers return verified source either as a flat Solidity file or as a
//! standard-JSON-input blob (often wrapped in an extra pair of braces).
//! This flattens both into one text blob for analysis. Never fails: anything
//! that does not parse as multi-file JSON is returned unchanged.

use serde_json::Value;
use tracing::debug;

/// Flatten a raw explorer `SourceCode` payload into a single text blob
pub fn normalize_source(raw: &str) -> String {
    let trimmed = raw.trim();

    // Etherscan wraps standard-JSON input as `{{ ... }}`
    let unwrapped = if trimmed.starts_with("{{") && trimmed.ends_with("}}") {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    if !unwrapped.starts_with('{') {
        return raw.to_string();
    }

    let json: Value = match serde_json::from_str(unwrapped) {
        Ok(json) => json,
        Err(e) => {
            debug!("Source is not JSON, treating as single file: {}", e);
            return raw.to_string();
        }
    };

    let Some(sources) = json.get("sources").and_then(Value::as_object) else {
        return raw.to_string();
    };

    let mut combined = String::new();
    for (file_name, file) in sources {
        if let Some(content) = file.get("content").and_then(Value::as_str) {
            combined.push_str("// File: ");
            combined.push_str(file_name);
            combined.push('\n');
            combined.push_str(content);
            combined.push_str("\n\n");
        }
    }

    if combined.is_empty() {
        return raw.to_string();
    }

    debug!(files = sources.len(), "Flattened multi-file source");
    combined
}
