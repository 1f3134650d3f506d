//! Lock poisoning helpers
//!
//! The scanner shares very little mutable state between workers (the name
//! cache and the result sinks), but a panicking worker can still poison those
//! locks. These helpers turn poisoning into an ordinary error instead of a
//! second panic.

use std::sync::{LockResult, RwLockReadGuard, RwLockWriteGuard};

/// Convert a poisoned read lock into an application error
///
/// # Examples
/// ```
/// use std::sync::RwLock;
/// use lfscan::core::sync::handle_rwlock_read;
/// use lfscan::scanner::api::ScanError;
///
/// let lock = RwLock::new(42);
/// let guard = handle_rwlock_read(lock.read(), |message| ScanError::Internal { message })
///     .unwrap();
/// assert_eq!(*guard, 42);
/// ```
pub fn handle_rwlock_read<T, E>(
    result: LockResult<RwLockReadGuard<T>>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockReadGuard<T>, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (RwLock read poisoned). A worker panicked while holding the write lock. PoisonError: {:?}",
            poison_err
        ))
    })
}

/// Write variant of [`handle_rwlock_read`]
pub fn handle_rwlock_write<T, E>(
    result: LockResult<RwLockWriteGuard<T>>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockWriteGuard<T>, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (RwLock write poisoned). A worker panicked while holding the lock. PoisonError: {:?}",
            poison_err
        ))
    })
}
