//! Scanner Component
//!
//! Discovery of large-file pointers and lockable paths across a repository's
//! history, working tree, index and stash.
//!
//! ## Layout
//!
//! - **GitScanner** (`dispatcher`): entry points, callback resolution, bound remote
//! - **Strategies** (`strategy`): one traversal per scan mode, sharing a
//!   parallel filter/dedup/parse pipeline
//! - **GitBackend** (`backend`): repository queries, implemented on gix
//! - **NameCache**: first observed path per pointer blob, shared by workers
//! - **Ref exclusion** (`refs`): what a remote already holds
//!
//! Results are streamed to a [`PointerSink`](sink::PointerSink); lockable
//! paths to a [`LockableSink`](sink::LockableSink).

pub mod api;
pub mod backend;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod name_cache;
pub mod options;
pub mod pointer;
pub mod refs;
pub mod sink;
pub mod types;

mod strategy;

#[cfg(test)]
mod tests;

pub use dispatcher::{GitScanner, GitScannerBuilder};
pub use error::{is_callback_missing, ErrorKind, ScanError, ScanResult};
pub use types::{Pointer, PointerExtension, WrappedPointer};
