//! Per-call scan options
//!
//! Built fresh by the dispatcher for every scan entry point and read-only for
//! the rest of the call. The only interior mutability is the shared
//! [`NameCache`].

use crate::scanner::backend::{GitBackend, RevListQuery, WalkDepth};
use crate::scanner::error::ScanResult;
use crate::scanner::name_cache::NameCache;
use std::sync::Arc;
use strum_macros::Display;

/// Which refs a history scan starts from and which it stops at
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ScanMode {
    /// Reachable from `include`, not reachable from `exclude`
    Refs {
        include: Vec<String>,
        exclude: Vec<String>,
    },
    /// Every ref in the repository
    All,
    /// Like `Refs`, additionally excluding what `remote` already has
    RangeToRemote {
        include: String,
        exclude: Vec<String>,
        remote: String,
        skipped_refs: Vec<String>,
    },
}

/// Uniqueness granularity for reported pointers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Dedup {
    /// Each blob is reported once per scan
    Object,
    /// Each blob is reported once per tree it appears in
    PerTree,
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub mode: ScanMode,
    /// Visit blobs that were replaced or removed later in the range
    pub include_deleted: bool,
    pub dedup: Dedup,
    pub names: Arc<NameCache>,
}

impl ScanOptions {
    pub fn new(mode: ScanMode) -> Self {
        Self {
            mode,
            include_deleted: true,
            dedup: Dedup::Object,
            names: Arc::new(NameCache::new()),
        }
    }

    pub fn with_deleted(mut self, include_deleted: bool) -> Self {
        self.include_deleted = include_deleted;
        self
    }

    pub fn with_dedup(mut self, dedup: Dedup) -> Self {
        self.dedup = dedup;
        self
    }

    /// Remote this scan is scoped to; empty when unscoped
    pub fn remote(&self) -> &str {
        match &self.mode {
            ScanMode::RangeToRemote { remote, .. } => remote,
            _ => "",
        }
    }

    /// Translate the mode into a backend reachability query
    pub fn rev_list_query(&self, backend: &dyn GitBackend) -> ScanResult<RevListQuery> {
        let (include, exclude) = match &self.mode {
            ScanMode::Refs { include, exclude } => (include.clone(), exclude.clone()),
            ScanMode::All => (commit_refs(backend)?, Vec::new()),
            ScanMode::RangeToRemote {
                include,
                exclude,
                skipped_refs,
                ..
            } => {
                let mut all_excluded = exclude.clone();
                all_excluded.extend(skipped_refs.iter().cloned());
                (vec![include.clone()], all_excluded)
            }
        };

        Ok(RevListQuery {
            include: non_empty(include),
            exclude: non_empty(exclude),
            depth: if self.include_deleted {
                WalkDepth::History
            } else {
                WalkDepth::TipsOnly
            },
        })
    }
}

/// Every ref that peels to a commit; tags of trees or blobs have no history
fn commit_refs(backend: &dyn GitBackend) -> ScanResult<Vec<String>> {
    let mut refs = Vec::new();
    for name in backend.all_refs()? {
        if backend.resolve(&name)?.is_some() {
            refs.push(name);
        } else {
            log::debug!("skipping {}: does not point at a commit", name);
        }
    }
    Ok(refs)
}

fn non_empty(refs: Vec<String>) -> Vec<String> {
    refs.into_iter().filter(|r| !r.trim().is_empty()).collect()
}
