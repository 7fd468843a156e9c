//! ReDoS-Safe Matcher
//!
//! Runs every compiled pattern over sanitized source and collects all
//! non-overlapping matches, within hard bounds:
//! - per-pattern wall-clock budget, checked between matches and at window
//!   boundaries
//! - per-pattern match ceiling
//! - zero-width matches advance the cursor by one char
//! - inputs above `chunk_size` are scanned in overlapping windows; hits in
//!   the overlap are deduplicated by absolute offset
//! - inputs above `max_source_length` are truncated first (reported)
//!
//! The `regex` crate runs in linear time, so a single `find_at` call cannot
//! backtrack catastrophically. The elapsed-time checks are still a soft
//! bound: a running search is never interrupted.
//!
//! A pattern that panics or runs out of budget only loses its own
//! remaining matches; the other patterns still run.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, error, warn};

use crate::core::patterns::{CompiledPattern, COMPILED_PATTERNS};
use crate::models::config::MatchLimits;
use crate::models::types::Finding;
use crate::utils::constants::{MAX_MATCH_SPAN, SNIPPET_MAX_CHARS};

/// How a single pattern's scan ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternStatus {
    Complete,
    TimedOut,
    Capped,
}

/// Everything the matcher produced, including what it had to give up on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchReport {
    pub findings: Vec<Finding>,
    /// Input was cut to `max_source_length` before matching
    pub truncated: bool,
    /// Patterns that ran out of time budget
    pub timed_out_patterns: Vec<&'static str>,
    /// Patterns that hit the match ceiling
    pub capped_patterns: Vec<&'static str>,
    /// Patterns that panicked during matching
    pub failed_patterns: Vec<&'static str>,
}

impl MatchReport {
    /// Human-readable notes on lossy or partial matching
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.truncated {
            warnings.push("Source exceeded the analysis limit and was truncated".to_string());
        }
        for name in &self.timed_out_patterns {
            warnings.push(format!("Pattern {} timed out; results may be partial", name));
        }
        for name in &self.capped_patterns {
            warnings.push(format!("Pattern {} reached the match limit", name));
        }
        for name in &self.failed_patterns {
            warnings.push(format!("Pattern {} failed and was skipped", name));
        }
        warnings
    }
}

/// Bounded multi-pattern matcher
pub struct PatternMatcher<'a> {
    patterns: &'a [CompiledPattern],
    limits: MatchLimits,
}

impl PatternMatcher<'static> {
    /// Matcher over the built-in catalog
    pub fn with_catalog(limits: MatchLimits) -> Self {
        Self::new(&COMPILED_PATTERNS, limits)
    }
}

impl<'a> PatternMatcher<'a> {
    pub fn new(patterns: &'a [CompiledPattern], limits: MatchLimits) -> Self {
        let mut limits = limits;
        // Windows must advance, and must overlap enough to hold any match
        limits.chunk_size = limits.chunk_size.max(4 * MAX_MATCH_SPAN);
        limits.chunk_overlap = limits.chunk_overlap.max(2 * MAX_MATCH_SPAN).min(limits.chunk_size / 2);
        limits.max_matches = limits.max_matches.max(1);
        Self { patterns, limits }
    }

    pub fn limits(&self) -> &MatchLimits {
        &self.limits
    }

    /// Scan `source` with every pattern, in catalog order
    pub fn scan(&self, source: &str) -> MatchReport {
        self.scan_each(source, |pattern, text| self.scan_pattern(pattern, text))
    }

    /// Run `scan_one` per pattern; a panicking pattern is recorded and skipped
    fn scan_each<F>(&self, source: &str, scan_one: F) -> MatchReport
    where
        F: Fn(&CompiledPattern, &str) -> (Vec<(usize, usize)>, PatternStatus),
    {
        let mut report = MatchReport::default();

        let text = if source.len() > self.limits.max_source_length {
            let cut = floor_char_boundary(source, self.limits.max_source_length);
            warn!(
                original = source.len(),
                kept = cut,
                "✂️ Source truncated before matching"
            );
            report.truncated = true;
            &source[..cut]
        } else {
            source
        };

        for pattern in self.patterns {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| scan_one(pattern, text)));

            match outcome {
                Ok((offsets, status)) => {
                    match status {
                        PatternStatus::Complete => {}
                        PatternStatus::TimedOut => report.timed_out_patterns.push(pattern.name),
                        PatternStatus::Capped => report.capped_patterns.push(pattern.name),
                    }
                    let mut lines = LineCursor::new(text);
                    for (start, end) in offsets {
                        report.findings.push(Finding {
                            pattern_name: pattern.name.to_string(),
                            line_number: lines.line_at(start),
                            code_snippet: text[start..end].chars().take(SNIPPET_MAX_CHARS).collect(),
                        });
                    }
                }
                Err(_) => {
                    error!(pattern = pattern.name, "❌ Pattern matching panicked, skipping");
                    report.failed_patterns.push(pattern.name);
                }
            }
        }

        debug!(
            findings = report.findings.len(),
            patterns = self.patterns.len(),
            bytes = text.len(),
            "Pattern scan complete"
        );
        report
    }

    /// All non-overlapping matches of one pattern as `(start, end)` byte
    /// offsets, ascending
    fn scan_pattern(&self, pattern: &CompiledPattern, text: &str) -> (Vec<(usize, usize)>, PatternStatus) {
        let started = Instant::now();
        let mut hits = Vec::new();
        let mut seen: HashSet<usize> = HashSet::new();
        let mut cursor = 0usize;

        for (window_start, window_end) in self.windows(text) {
            if started.elapsed() > self.limits.timeout {
                warn!(
                    pattern = pattern.name,
                    offset = window_start,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "⏱️ Pattern timed out at window boundary"
                );
                return (hits, PatternStatus::TimedOut);
            }

            // Haystack ends at the window; offsets stay absolute
            let haystack = &text[..window_end];
            let mut pos = cursor.max(window_start);

            while pos <= haystack.len() {
                let Some(m) = pattern.regex.find_at(haystack, pos) else {
                    break;
                };

                if seen.insert(m.start()) {
                    hits.push((m.start(), m.end()));
                    if hits.len() >= self.limits.max_matches {
                        warn!(
                            pattern = pattern.name,
                            max = self.limits.max_matches,
                            "⚠️ Match ceiling reached"
                        );
                        return (hits, PatternStatus::Capped);
                    }
                }

                pos = if m.end() > m.start() {
                    m.end()
                } else {
                    next_char_boundary(haystack, m.end())
                };
                cursor = pos;

                if started.elapsed() > self.limits.timeout {
                    warn!(
                        pattern = pattern.name,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        found = hits.len(),
                        "⏱️ Pattern timed out, keeping partial results"
                    );
                    return (hits, PatternStatus::TimedOut);
                }
            }
        }

        (hits, PatternStatus::Complete)
    }

    /// `(start, end)` byte windows covering `text`, on char boundaries
    fn windows(&self, text: &str) -> Vec<(usize, usize)> {
        let len = text.len();
        if len <= self.limits.chunk_size {
            return vec![(0, len)];
        }

        let mut windows = Vec::new();
        let mut start = 0;
        loop {
            let end = floor_char_boundary(text, (start + self.limits.chunk_size).min(len));
            windows.push((start, end));
            if end >= len {
                break;
            }
            start = floor_char_boundary(text, end - self.limits.chunk_overlap);
        }
        windows
    }
}

/// Scan with the built-in catalog
pub fn scan_source(source: &str, limits: MatchLimits) -> MatchReport {
    PatternMatcher::with_catalog(limits).scan(source)
}

/// Incremental line lookup for ascending offsets; only the bytes between
/// consecutive lookups are counted
struct LineCursor<'t> {
    text: &'t str,
    offset: usize,
    line: usize,
}

impl<'t> LineCursor<'t> {
    fn new(text: &'t str) -> Self {
        Self { text, offset: 0, line: 1 }
    }

    fn line_at(&mut self, offset: usize) -> usize {
        if offset < self.offset {
            self.offset = 0;
            self.line = 1;
        }
        self.line += self.text.as_bytes()[self.offset..offset]
            .iter()
            .filter(|&&b| b == b'\n')
            .count();
        self.offset = offset;
        self.line
    }
}

/// 1-based line of a byte offset
pub fn line_number_at(text: &str, offset: usize) -> usize {
    LineCursor::new(text).line_at(offset)
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut i = index;
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Offset of the char after `index`; one past the end when there is none
fn next_char_boundary(text: &str, index: usize) -> usize {
    match text[index..].chars().next() {
        Some(c) => index + c.len_utf8(),
        None => text.len() + 1,
    }
}
