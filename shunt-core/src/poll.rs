//! Bounded-wait readiness polling over a fixed set of endpoints.
//!
//! The device never blocks indefinitely: every wait is bounded by a finite
//! timeout so a stop request is noticed within one polling interval even if
//! no endpoint ever becomes ready. Wakeups are delivered through a shared
//! [`ReadySignal`] that transports notify when frames arrive.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::endpoint::Endpoint;
use crate::error::Result;

/// A shared wakeup for readiness changes.
///
/// Carries a generation counter so a notification that lands between a
/// readiness probe and the subsequent wait is never lost: the waiter snapshots
/// the generation first and `wait_timeout` returns immediately if it has
/// already moved on.
pub struct ReadySignal {
    generation: Mutex<u64>,
    ready: Condvar,
}

impl ReadySignal {
    #[must_use]
    pub fn new() -> Self {
        Self {
            generation: Mutex::new(0),
            ready: Condvar::new(),
        }
    }

    /// Wake all waiters. Called by transports after enqueuing a frame.
    pub fn notify(&self) {
        let mut generation = self.generation.lock();
        *generation = generation.wrapping_add(1);
        drop(generation);
        self.ready.notify_all();
    }

    /// Current generation, to snapshot before probing.
    #[must_use]
    pub fn generation(&self) -> u64 {
        *self.generation.lock()
    }

    /// Block until the generation advances past `seen` or `timeout` elapses.
    ///
    /// Returns `true` if a notification arrived, `false` on timeout.
    pub fn wait_timeout(&self, seen: u64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut generation = self.generation.lock();
        while *generation == seen {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.ready.wait_for(&mut generation, deadline - now);
        }
        true
    }
}

impl Default for ReadySignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-endpoint readiness bits, addressed by position in the polled slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness(u32);

impl Readiness {
    /// Nothing is ready.
    pub const NONE: Self = Self(0);

    /// Is the endpoint at `index` readable?
    #[inline]
    #[must_use]
    pub const fn is_ready(self, index: usize) -> bool {
        (self.0 & (1 << index)) != 0
    }

    /// Is anything readable?
    #[inline]
    #[must_use]
    pub const fn any(self) -> bool {
        self.0 != 0
    }
}

/// Poll `endpoints` for readability, waiting up to `timeout`.
///
/// Probes every endpoint once; if none is readable, waits on `signal` for at
/// most `timeout` and probes once more. The result reflects readiness at the
/// final probe, one bit per endpoint index. Supports up to 32 endpoints.
///
/// # Errors
///
/// Propagates the first probe failure; transient probe failures are the
/// caller's to retry.
pub fn poll(endpoints: &[&dyn Endpoint], signal: &ReadySignal, timeout: Duration) -> Result<Readiness> {
    debug_assert!(endpoints.len() <= 32, "poll set limited to 32 endpoints");

    let seen = signal.generation();
    let ready = probe(endpoints)?;
    if ready.any() || timeout.is_zero() {
        return Ok(ready);
    }

    signal.wait_timeout(seen, timeout);
    probe(endpoints)
}

fn probe(endpoints: &[&dyn Endpoint]) -> Result<Readiness> {
    let mut bits = 0u32;
    for (index, endpoint) in endpoints.iter().enumerate() {
        if endpoint.readable()? {
            bits |= 1 << index;
        }
    }
    Ok(Readiness(bits))
}
