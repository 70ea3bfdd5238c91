//! Transient-failure retry, bounded by the cooperative running flag.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{EndpointError, Result};

/// Re-invoke `op` while it fails transiently and `running` is still true.
///
/// The flag is checked on every retry iteration, not just on entry, so a stop
/// request interrupts an otherwise unbounded retry loop: the transient error
/// observed after the flag drops is returned to the caller, which decides
/// whether that constitutes a failure or a stop.
///
/// Hard failures are returned immediately and are never retried.
///
/// # Errors
///
/// Returns the last error from `op` when retrying is not (or no longer)
/// permitted.
pub fn retry_interrupted<T, F>(running: &AtomicBool, mut op: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    loop {
        match op() {
            Err(error) if error.is_transient() => {
                if running.load(Ordering::SeqCst) {
                    continue;
                }
                return Err(error);
            }
            other => return other,
        }
    }
}
