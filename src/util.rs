//! Module containing various utilities.

use log::warn;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks the given mutex, recovering the data if another thread panicked
/// while holding it.
///
/// The guarded data is made of plain tile assignments and pixels, which stay
/// usable even if an update was interrupted.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Prints a warning message based on the error if the given result is not OK.
pub fn warn_on_error<E: std::fmt::Debug>(x: Result<(), E>, msg: &str) {
    match x {
        Ok(()) => {}
        Err(e) => warn!("Failed to send {}: {:?}", msg, e),
    }
}
