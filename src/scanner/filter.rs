//! Path predicates consumed by the strategies

use crate::core::pattern_parser::{parse_patterns, FilePatternMatcher, PathPattern};

/// Decides which paths are eligible at all
pub trait PathFilter: Send + Sync {
    fn matches(&self, path: &str) -> bool;
}

impl PathFilter for FilePatternMatcher {
    fn matches(&self, path: &str) -> bool {
        FilePatternMatcher::matches(self, path)
    }
}

impl<F> PathFilter for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn matches(&self, path: &str) -> bool {
        self(path)
    }
}

/// Membership test for lock candidates
pub trait LockableSet: Send + Sync {
    fn contains(&self, path: &str) -> bool;
}

/// Lock candidates described by glob patterns (e.g. `*.psd`)
#[derive(Debug, Clone, Default)]
pub struct LockablePatterns {
    patterns: Vec<PathPattern>,
}

impl LockablePatterns {
    pub fn new(patterns: &[String]) -> Result<Self, String> {
        Ok(Self {
            patterns: parse_patterns(patterns)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl LockableSet for LockablePatterns {
    fn contains(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lockable_patterns() {
        let set = LockablePatterns::new(&["*.psd".to_string(), "design".to_string()]).unwrap();
        assert!(set.contains("art/cover.psd"));
        assert!(set.contains("design/logo.ai"));
        assert!(!set.contains("src/main.rs"));
        assert!(LockablePatterns::default().is_empty());
    }

    #[test]
    fn test_closure_filter() {
        let only_bin = |path: &str| path.ends_with(".bin");
        assert!(PathFilter::matches(&only_bin, "a.bin"));
        assert!(!PathFilter::matches(&only_bin, "a.txt"));
    }
}
