//! Scan Dispatcher
//!
//! [`GitScanner`] is the single entry surface of the scanner. Each entry point
//! resolves the result callback, checks the scanner state, builds a fresh
//! [`ScanOptions`] for its mode and hands off to the matching strategy.

use crate::core::pattern_parser::FilePatternMatcher;
use crate::scanner::backend::GitBackend;
use crate::scanner::error::{ScanError, ScanResult};
use crate::scanner::filter::{LockableSet, PathFilter};
use crate::scanner::options::{Dedup, ScanMode, ScanOptions};
use crate::scanner::pointer::{LfsPointerParser, PointerParser};
use crate::scanner::refs::{calc_skipped_refs, RemoteRefSource};
use crate::scanner::sink::{LockableSink, PointerSink};
use crate::scanner::strategy::{self, Lockables, ScanContext};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

/// Remote bound for push scans and the refs it already holds
#[derive(Debug, Clone)]
struct BoundRemote {
    name: String,
    skipped_refs: Vec<String>,
}

/// Discovers pointers and lockable paths in one repository
pub struct GitScanner {
    backend: Arc<dyn GitBackend>,
    filter: Box<dyn PathFilter>,
    parser: Box<dyn PointerParser>,
    default_sink: Option<Arc<dyn PointerSink>>,
    lockables: Option<(Arc<dyn LockableSet>, Arc<dyn LockableSink>)>,
    remote_refs: Option<Arc<dyn RemoteRefSource>>,
    workers: usize,
    remote: Option<BoundRemote>,
    closed: bool,
    started: Instant,
}

/// Builder for [`GitScanner`]
pub struct GitScannerBuilder {
    backend: Arc<dyn GitBackend>,
    filter: Box<dyn PathFilter>,
    parser: Box<dyn PointerParser>,
    default_sink: Option<Arc<dyn PointerSink>>,
    lockables: Option<(Arc<dyn LockableSet>, Arc<dyn LockableSink>)>,
    remote_refs: Option<Arc<dyn RemoteRefSource>>,
    workers: Option<usize>,
}

impl GitScannerBuilder {
    pub fn new(backend: Arc<dyn GitBackend>) -> Self {
        Self {
            backend,
            filter: Box::new(FilePatternMatcher::default()),
            parser: Box::new(LfsPointerParser),
            default_sink: None,
            lockables: None,
            remote_refs: None,
            workers: None,
        }
    }

    /// Restrict reported paths; everything passes by default
    pub fn with_filter(mut self, filter: impl PathFilter + 'static) -> Self {
        self.filter = Box::new(filter);
        self
    }

    pub fn with_parser(mut self, parser: impl PointerParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    /// Callback used by entry points called without an explicit one
    pub fn with_callback(mut self, sink: Arc<dyn PointerSink>) -> Self {
        self.default_sink = Some(sink);
        self
    }

    /// Report non-pointer paths in `set` to `sink` during tree and index scans
    pub fn with_lockables(mut self, set: Arc<dyn LockableSet>, sink: Arc<dyn LockableSink>) -> Self {
        self.lockables = Some((set, sink));
        self
    }

    pub fn with_remote_refs(mut self, source: Arc<dyn RemoteRefSource>) -> Self {
        self.remote_refs = Some(source);
        self
    }

    /// Number of blob-reading workers; 0 picks the available parallelism
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = (workers > 0).then_some(workers);
        self
    }

    pub fn build(self) -> GitScanner {
        let workers = self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });
        GitScanner {
            backend: self.backend,
            filter: self.filter,
            parser: self.parser,
            default_sink: self.default_sink,
            lockables: self.lockables,
            remote_refs: self.remote_refs,
            workers,
            remote: None,
            closed: false,
            started: Instant::now(),
        }
    }
}

impl GitScanner {
    pub fn builder(backend: Arc<dyn GitBackend>) -> GitScannerBuilder {
        GitScannerBuilder::new(backend)
    }

    /// Scanner with the default filter and parser and no default callback
    pub fn new(backend: Arc<dyn GitBackend>) -> Self {
        Self::builder(backend).build()
    }

    /// Remote bound by [`remote_for_push`](Self::remote_for_push), if any
    pub fn remote(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.name.as_str())
    }

    /// Commits excluded from range-to-remote scans
    pub fn skipped_refs(&self) -> &[String] {
        self.remote
            .as_ref()
            .map(|r| r.skipped_refs.as_slice())
            .unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Bind the remote that push scans are relative to.
    ///
    /// Binding the same remote again is a no-op. A different remote fails with
    /// [`ScanError::RemoteConflict`] and leaves the binding unchanged.
    pub fn remote_for_push(&mut self, remote: &str) -> ScanResult<()> {
        self.ensure_open()?;
        match &self.remote {
            Some(bound) if bound.name == remote => Ok(()),
            Some(bound) => Err(ScanError::RemoteConflict {
                current: bound.name.clone(),
                requested: remote.to_string(),
            }),
            None => {
                let skipped_refs =
                    calc_skipped_refs(self.backend.as_ref(), remote, self.remote_refs.as_deref())?;
                log::debug!("bound remote {:?}, skipping {} ref(s)", remote, skipped_refs.len());
                self.remote = Some(BoundRemote {
                    name: remote.to_string(),
                    skipped_refs,
                });
                Ok(())
            }
        }
    }

    /// Scan what `include` adds on top of `exclude` and the bound remote
    pub fn scan_multi_range_to_remote(
        &self,
        include: &str,
        exclude: &[String],
        callback: Option<&dyn PointerSink>,
    ) -> ScanResult<()> {
        let sink = self.resolve_sink(callback)?;
        let bound = self.remote.as_ref().ok_or_else(|| ScanError::NoRemote {
            reference: include.to_string(),
        })?;
        let opts = ScanOptions::new(ScanMode::RangeToRemote {
            include: include.to_string(),
            exclude: exclude.to_vec(),
            remote: bound.name.clone(),
            skipped_refs: bound.skipped_refs.clone(),
        });
        self.run_rev_list(opts, sink)
    }

    /// Scan history reachable from any of `include` and none of `exclude`
    pub fn scan_refs(
        &self,
        include: &[String],
        exclude: &[String],
        callback: Option<&dyn PointerSink>,
    ) -> ScanResult<()> {
        let sink = self.resolve_sink(callback)?;
        let opts = ScanOptions::new(ScanMode::Refs {
            include: include.to_vec(),
            exclude: exclude.to_vec(),
        });
        self.run_rev_list(opts, sink)
    }

    /// Scan history in `exclude..include`; an empty `exclude` means all of it
    pub fn scan_ref_range(
        &self,
        include: &str,
        exclude: &str,
        callback: Option<&dyn PointerSink>,
    ) -> ScanResult<()> {
        let sink = self.resolve_sink(callback)?;
        self.run_rev_list(ScanOptions::new(range(include, exclude)), sink)
    }

    /// Like [`scan_ref_range`](Self::scan_ref_range), reporting each blob once
    /// per tree it appears in
    pub fn scan_ref_range_by_tree(
        &self,
        include: &str,
        exclude: &str,
        callback: Option<&dyn PointerSink>,
    ) -> ScanResult<()> {
        let sink = self.resolve_sink(callback)?;
        let opts = ScanOptions::new(range(include, exclude)).with_dedup(Dedup::PerTree);
        self.run_rev_list(opts, sink)
    }

    /// Scan the full history of `reference`
    pub fn scan_ref_with_deleted(
        &self,
        reference: &str,
        callback: Option<&dyn PointerSink>,
    ) -> ScanResult<()> {
        self.scan_ref_range(reference, "", callback)
    }

    /// Scan only the tree `reference` points at
    pub fn scan_ref(&self, reference: &str, callback: Option<&dyn PointerSink>) -> ScanResult<()> {
        let sink = self.resolve_sink(callback)?;
        let opts = ScanOptions::new(range(reference, "")).with_deleted(false);
        self.run_rev_list(opts, sink)
    }

    pub fn scan_ref_by_tree(
        &self,
        reference: &str,
        callback: Option<&dyn PointerSink>,
    ) -> ScanResult<()> {
        let sink = self.resolve_sink(callback)?;
        let opts = ScanOptions::new(range(reference, ""))
            .with_deleted(false)
            .with_dedup(Dedup::PerTree);
        self.run_rev_list(opts, sink)
    }

    /// Scan the history of every ref in the repository
    pub fn scan_all(&self, callback: Option<&dyn PointerSink>) -> ScanResult<()> {
        let sink = self.resolve_sink(callback)?;
        self.run_rev_list(ScanOptions::new(ScanMode::All), sink)
    }

    /// Report every pointer path in the tree at `reference`, plus lockable
    /// paths when lockables are configured
    pub fn scan_tree(&self, reference: &str, callback: Option<&dyn PointerSink>) -> ScanResult<()> {
        let sink = self.resolve_sink(callback)?;
        self.timed("tree", || strategy::scan_tree(&self.context(), reference, sink))
    }

    /// Scan local history not yet on `remote` ("" for any remote)
    pub fn scan_unpushed(&self, remote: &str, callback: Option<&dyn PointerSink>) -> ScanResult<()> {
        let sink = self.resolve_sink(callback)?;
        self.timed("unpushed", || {
            strategy::scan_unpushed(&self.context(), remote, sink)
        })
    }

    /// Scan content that stash entries introduce.
    ///
    /// Content present in the tree of any ordinary ref tip is left out. Content
    /// that only appears further back in branch history is still reported.
    pub fn scan_stashed(&self, callback: Option<&dyn PointerSink>) -> ScanResult<()> {
        let sink = self.resolve_sink(callback)?;
        self.timed("stash", || strategy::scan_stashed(&self.context(), sink))
    }

    /// Scan content that commits on `reference` since `since` replaced or
    /// deleted
    pub fn scan_previous_versions(
        &self,
        reference: &str,
        since: SystemTime,
        callback: Option<&dyn PointerSink>,
    ) -> ScanResult<()> {
        let sink = self.resolve_sink(callback)?;
        self.timed("previous-versions", || {
            strategy::scan_previous_versions(&self.context(), reference, since, sink)
        })
    }

    /// Scan pointers staged in the index relative to `reference`
    pub fn scan_index(&self, reference: &str, callback: Option<&dyn PointerSink>) -> ScanResult<()> {
        let sink = self.resolve_sink(callback)?;
        self.timed("index", || strategy::scan_index(&self.context(), reference, sink))
    }

    /// Mark the scanner as finished. Later calls are no-ops.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        log::debug!("scanner closed after {:?}", self.started.elapsed());
    }

    fn ensure_open(&self) -> ScanResult<()> {
        if self.closed {
            Err(ScanError::Closed)
        } else {
            Ok(())
        }
    }

    /// Pick the explicit callback, else the default one
    fn resolve_sink<'s>(
        &'s self,
        callback: Option<&'s dyn PointerSink>,
    ) -> ScanResult<&'s dyn PointerSink> {
        let sink = callback
            .or(self.default_sink.as_deref())
            .ok_or(ScanError::MissingCallback)?;
        self.ensure_open()?;
        Ok(sink)
    }

    fn context(&self) -> ScanContext<'_> {
        ScanContext {
            backend: self.backend.as_ref(),
            filter: self.filter.as_ref(),
            parser: self.parser.as_ref(),
            lockables: self.lockables.as_ref().map(|(set, sink)| Lockables {
                set: set.as_ref(),
                sink: sink.as_ref(),
            }),
            workers: self.workers,
        }
    }

    fn run_rev_list(&self, opts: ScanOptions, sink: &dyn PointerSink) -> ScanResult<()> {
        let label = opts.mode.to_string();
        self.timed(&label, || strategy::scan_rev_list(&self.context(), &opts, sink))
    }

    fn timed(&self, label: &str, scan: impl FnOnce() -> ScanResult<()>) -> ScanResult<()> {
        let start = Instant::now();
        let result = scan();
        match &result {
            Ok(()) => log::debug!("{} scan finished in {:?}", label, start.elapsed()),
            Err(e) => log::debug!("{} scan failed after {:?}: {}", label, start.elapsed(), e),
        }
        result
    }
}

impl std::fmt::Debug for GitScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitScanner")
            .field("remote", &self.remote)
            .field("workers", &self.workers)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

fn range(include: &str, exclude: &str) -> ScanMode {
    ScanMode::Refs {
        include: vec![include.to_string()],
        exclude: vec![exclude.to_string()],
    }
}
