//! Path pattern matching
//!
//! Glob matching for the scanner's include/exclude path filter and for
//! lock-candidate patterns. Paths are repository-relative paths as stored in
//! git trees, always using `/` separators.

use glob::{MatchOptions, Pattern, PatternError};
use std::path::Path;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// A single compiled pattern
///
/// A pattern without a `/` matches the file name at any depth (`*.psd`
/// matches `art/cover.psd`). A pattern without glob metacharacters also
/// matches everything below it as a directory prefix (`assets` matches
/// `assets/logo.png`).
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    glob: Pattern,
    basename_only: bool,
    literal: bool,
}

impl PathPattern {
    pub fn new(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim().trim_start_matches("./").trim_end_matches('/');
        let glob = Pattern::new(trimmed)
            .map_err(|e: PatternError| format!("Invalid pattern '{}': {}", raw, e))?;
        Ok(Self {
            raw: raw.to_string(),
            glob,
            basename_only: !trimmed.contains('/'),
            literal: !trimmed.contains(['*', '?', '[']),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.glob.matches_with(path, MATCH_OPTIONS) {
            return true;
        }
        if self.literal && is_path_prefix_match(path, self.glob.as_str()) {
            return true;
        }
        if self.basename_only {
            let name = Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_default();
            return self.glob.matches_with(&name, MATCH_OPTIONS);
        }
        false
    }
}

/// Include/exclude path matcher
#[derive(Debug, Clone, Default)]
pub struct FilePatternMatcher {
    include_patterns: Vec<PathPattern>,
    exclude_patterns: Vec<PathPattern>,
}

impl FilePatternMatcher {
    pub fn new(include_patterns: &[String], exclude_patterns: &[String]) -> Result<Self, String> {
        Ok(Self {
            include_patterns: parse_patterns(include_patterns)?,
            exclude_patterns: parse_patterns(exclude_patterns)?,
        })
    }

    /// Check if a path passes the filter.
    ///
    /// Exclusion takes precedence over inclusion; with no include patterns
    /// every path not excluded passes.
    pub fn matches(&self, path: &str) -> bool {
        if self.exclude_patterns.iter().any(|p| p.matches(path)) {
            return false;
        }
        self.include_patterns.is_empty() || self.include_patterns.iter().any(|p| p.matches(path))
    }

    pub fn is_empty(&self) -> bool {
        self.include_patterns.is_empty() && self.exclude_patterns.is_empty()
    }
}

/// Check if a path lies under `prefix` with proper boundary detection
///
/// - `is_path_prefix_match("src/main.rs", "src")` -> `true`
/// - `is_path_prefix_match("src2/main.rs", "src")` -> `false`
/// - `is_path_prefix_match("src", "src")` -> `true`
fn is_path_prefix_match(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

/// Compile a list of raw patterns
pub fn parse_patterns(pattern_strings: &[String]) -> Result<Vec<PathPattern>, String> {
    pattern_strings
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| PathPattern::new(s))
        .collect()
}

/// Split comma-separated pattern arguments, dropping empties and duplicates
pub fn split_pattern_list(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        for part in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !out.iter().any(|existing| existing == part) {
                out.push(part.to_string());
            }
        }
    }
    out
}
