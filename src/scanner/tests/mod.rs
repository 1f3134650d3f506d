//! Unit tests for the scanner, run against an in-memory backend

mod strategies;

use crate::scanner::backend::GitBackend;
use crate::scanner::dispatcher::{GitScanner, GitScannerBuilder};
use crate::scanner::error::ScanError;
use crate::scanner::sink::CollectingSink;
use crate::scanner::types::WrappedPointer;
use mock::MockBackend;
use std::sync::Arc;

/// Builder over a shared handle to `backend`, so tests can inspect it later
pub(super) fn builder(backend: MockBackend) -> (Arc<MockBackend>, GitScannerBuilder) {
    let backend = Arc::new(backend);
    let dyn_backend: Arc<dyn GitBackend> = backend.clone();
    (backend, GitScanner::builder(dyn_backend).with_workers(4))
}

/// Run `scan` with a fresh collecting sink; pointers come back sorted by name
pub(super) fn collect(
    scan: impl FnOnce(&CollectingSink) -> Result<(), ScanError>,
) -> (Vec<WrappedPointer>, Vec<ScanError>) {
    let sink = CollectingSink::new();
    scan(&sink).expect("scan failed");
    let (mut pointers, errors) = sink.into_parts();
    pointers.sort_by(|a, b| a.name.cmp(&b.name).then(a.oid().cmp(b.oid())));
    (pointers, errors)
}
