//! Detection verdict builder
//!
//! Pure function of the findings and the threshold. No I/O.

use crate::models::types::{DetectionVerdict, Finding};
use crate::utils::constants::{
    HONEYPOT_CONFIDENCE_CEILING, HONEYPOT_CONFIDENCE_FLOOR, HONEYPOT_CONFIDENCE_STEP,
    SAFE_CONFIDENCE_BASE, SAFE_CONFIDENCE_FLOOR, SAFE_CONFIDENCE_STEP,
};

/// Build the verdict for a finding list.
///
/// `is_honeypot` holds exactly when `findings.len() >= min_patterns`.
/// A threshold of 0 is treated as 1.
pub fn build_verdict(findings: Vec<Finding>, min_patterns: usize) -> DetectionVerdict {
    let threshold = min_patterns.max(1);
    let count = findings.len();
    let is_honeypot = count >= threshold;

    let confidence = if is_honeypot {
        honeypot_confidence(count)
    } else {
        safe_confidence(count)
    };

    let message = if is_honeypot {
        format!(
            "⚠️ This contract contains {} honeypot pattern(s). DO NOT BUY!",
            count
        )
    } else if count == 0 {
        "✅ No honeypot patterns detected. Contract appears safe.".to_string()
    } else {
        format!(
            "✅ {} suspicious pattern(s) found, below the detection threshold of {}. \
             Manual review recommended.",
            count, threshold
        )
    };

    DetectionVerdict {
        is_honeypot,
        confidence,
        findings,
        message,
    }
}

/// Floor plus a step per finding, capped
fn honeypot_confidence(count: usize) -> u8 {
    let raw = HONEYPOT_CONFIDENCE_FLOOR as usize + HONEYPOT_CONFIDENCE_STEP as usize * count;
    raw.min(HONEYPOT_CONFIDENCE_CEILING as usize) as u8
}

/// Base minus a step per stray finding, floored
fn safe_confidence(count: usize) -> u8 {
    let penalty = (SAFE_CONFIDENCE_STEP as usize).saturating_mul(count);
    let raw = (SAFE_CONFIDENCE_BASE as usize).saturating_sub(penalty);
    raw.max(SAFE_CONFIDENCE_FLOOR as usize) as u8
}
