//! Scanner API
//!
//! Public surface of the scanner, consolidated for the binary and for library
//! users.

// Entry points
pub use crate::scanner::dispatcher::{GitScanner, GitScannerBuilder};

// Collaborators
pub use crate::scanner::backend::{GitBackend, GixBackend};
pub use crate::scanner::filter::{LockablePatterns, LockableSet, PathFilter};
pub use crate::scanner::pointer::{LfsPointerParser, PointerError, PointerParser};
pub use crate::scanner::refs::{calc_skipped_refs, RemoteRefSource};
pub use crate::scanner::sink::{CollectingSink, LockableSink, PointerSink};

// Error handling
pub use crate::scanner::error::{is_callback_missing, ErrorKind, ScanError, ScanResult};

// Data types
pub use crate::scanner::name_cache::NameCache;
pub use crate::scanner::options::{Dedup, ScanMode, ScanOptions};
pub use crate::scanner::types::{Pointer, PointerExtension, PointerSummary, WrappedPointer};
