//! Scanner Error Types
//!
//! A scan call returns at most one `ScanError` describing why the scan as a
//! whole could not run. Individual malformed pointers are delivered through the
//! result callback as `ScanError::Pointer` instead and never abort the scan.

use strum_macros::{Display, IntoStaticStr};

/// Coarse classification of a [`ScanError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    /// Neither an explicit nor a default pointer callback was available
    MissingCallback,
    /// A different remote was already bound for push scans
    RemoteConflict,
    /// A remote-scoped scan was requested before a remote was bound
    NoRemote,
    /// The scanner was used after `close()`
    Closed,
    /// The version-control backend failed; the scan was aborted
    Backend,
    /// A single candidate blob held a malformed pointer
    Pointer,
    /// Internal synchronisation failure (poisoned lock)
    Internal,
}

/// Scanner error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("no callback given")]
    MissingCallback,

    #[error("trying to set remote to {requested:?}, already set to {current:?}")]
    RemoteConflict { current: String, requested: String },

    #[error("unable to scan starting at {reference:?}: no remote set")]
    NoRemote { reference: String },

    #[error("scanner has already been closed")]
    Closed,

    #[error("Repository error: {message}")]
    Backend { message: String },

    #[error("invalid pointer in {path:?} (blob {blob}): {message}")]
    Pointer {
        path: String,
        blob: String,
        message: String,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ScanError {
    /// Classify this error without matching on its message
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::MissingCallback => ErrorKind::MissingCallback,
            ScanError::RemoteConflict { .. } => ErrorKind::RemoteConflict,
            ScanError::NoRemote { .. } => ErrorKind::NoRemote,
            ScanError::Closed => ErrorKind::Closed,
            ScanError::Backend { .. } => ErrorKind::Backend,
            ScanError::Pointer { .. } => ErrorKind::Pointer,
            ScanError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Shorthand used by the gix backend and strategies
    pub(crate) fn backend(message: impl Into<String>) -> Self {
        ScanError::Backend {
            message: message.into(),
        }
    }
}

/// Returns true when `err` reports that no pointer callback was available.
pub fn is_callback_missing(err: &ScanError) -> bool {
    err.kind() == ErrorKind::MissingCallback
}

impl crate::core::error_handling::ContextualError for ScanError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::MissingCallback | ErrorKind::RemoteConflict | ErrorKind::NoRemote
        )
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ScanError::MissingCallback => Some("no callback given"),
            ScanError::RemoteConflict { .. } => {
                Some("a different remote is already bound for this scan")
            }
            ScanError::NoRemote { .. } => Some("no remote set; pass --remote to scan for push"),
            _ => None,
        }
    }
}

pub type ScanResult<T> = Result<T, ScanError>;
