//! Result delivery
//!
//! Strategies hand every discovered pointer (or per-object error) to a
//! [`PointerSink`] and every lock candidate to a [`LockableSink`]. Sinks may be
//! called concurrently from several scan workers.

use crate::scanner::error::ScanError;
use crate::scanner::types::WrappedPointer;
use std::sync::Mutex;

/// Receives each scan result exactly once
pub trait PointerSink: Send + Sync {
    fn found(&self, result: Result<WrappedPointer, ScanError>);
}

impl<F> PointerSink for F
where
    F: Fn(Result<WrappedPointer, ScanError>) + Send + Sync,
{
    fn found(&self, result: Result<WrappedPointer, ScanError>) {
        self(result)
    }
}

/// Receives each lockable path, once per occurrence
pub trait LockableSink: Send + Sync {
    fn found(&self, path: &str);
}

impl<F> LockableSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn found(&self, path: &str) {
        self(path)
    }
}

/// Sink that accumulates everything it receives
#[derive(Debug, Default)]
pub struct CollectingSink {
    pointers: Mutex<Vec<WrappedPointer>>,
    errors: Mutex<Vec<ScanError>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain into `(pointers, errors)`
    pub fn into_parts(self) -> (Vec<WrappedPointer>, Vec<ScanError>) {
        (
            self.pointers.into_inner().unwrap_or_else(|e| e.into_inner()),
            self.errors.into_inner().unwrap_or_else(|e| e.into_inner()),
        )
    }
}

impl PointerSink for CollectingSink {
    fn found(&self, result: Result<WrappedPointer, ScanError>) {
        match result {
            Ok(pointer) => self
                .pointers
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(pointer),
            Err(err) => self
                .errors
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(err),
        }
    }
}
