//! Error reporting for the binary
//!
//! Library errors stay typed; only the top level of `lfscan` decides how much
//! of an error the user sees.

/// Errors that know whether their message is meant for the user
///
/// When `is_user_actionable()` is true, `user_message()` returns the message to
/// show. Otherwise it returns `None` and the failing operation is named
/// instead, with the error itself logged at debug level.
pub trait ContextualError: std::error::Error {
    /// True for errors the user can fix (bad arguments, bad config, wrong
    /// remote); false for repository and internal failures
    fn is_user_actionable(&self) -> bool;

    fn user_message(&self) -> Option<&str>;
}

/// Line to log at error level for `error` raised while doing `operation_context`
pub fn fatal_message<E: ContextualError>(error: &E, operation_context: &str) -> String {
    match error.user_message().filter(|_| error.is_user_actionable()) {
        Some(user_msg) => format!("FATAL: {}", user_msg),
        None => format!("FATAL: {}: {}", operation_context, error),
    }
}

/// Log a fatal error, with full details at debug level
///
/// ```rust,no_run
/// # use lfscan::core::error_handling::log_error_with_context;
/// # use lfscan::scanner::api::ScanError;
/// let err = ScanError::MissingCallback;
/// log_error_with_context(&err, "Scanning repository");
/// // Logs: "FATAL: no callback given"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    log::error!("{}", fatal_message(error, operation_context));
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::error::ScanError;

    #[test]
    fn test_user_actionable_error_shows_specific_message() {
        let err = ScanError::NoRemote {
            reference: "main".to_string(),
        };
        assert!(err.is_user_actionable());
        assert_eq!(
            fatal_message(&err, "Scanning repository"),
            "FATAL: no remote set; pass --remote to scan for push"
        );
    }

    #[test]
    fn test_system_error_uses_operation_context() {
        let err = ScanError::backend("object abc not found");
        assert!(!err.is_user_actionable());
        assert_eq!(
            fatal_message(&err, "Scanning repository"),
            "FATAL: Scanning repository: Repository error: object abc not found"
        );
    }
}
