//! The endpoint capability surface consumed by the relay device.
//!
//! An endpoint is an opaque handle to a message-queue connection point. The
//! relay borrows two of them for its lifetime and never closes either;
//! endpoint lifecycle belongs to the caller.

use std::sync::Arc;

use crate::error::Result;
use crate::frame::Frame;
use crate::poll::ReadySignal;

/// A connection point capable of exchanging discrete message frames.
///
/// The trait is object safe, so heterogeneous endpoints can sit behind
/// `dyn Endpoint`.
pub trait Endpoint {
    /// Take the next frame.
    ///
    /// May block when no frame is available. Callers that cannot tolerate
    /// blocking must confirm readiness first (via [`crate::poll::poll`]);
    /// invoking `recv` without a positive readiness indication is a caller
    /// error, not something the endpoint is required to detect.
    fn recv(&mut self) -> Result<Frame>;

    /// Emit one frame, flags included.
    fn send(&mut self, frame: Frame) -> Result<()>;

    /// Non-blocking readiness probe: is a frame available right now?
    ///
    /// Fallible so transports can surface poll-time faults; a transient
    /// failure here is retried by the device like any other.
    fn readable(&self) -> Result<bool>;

    /// Attach a shared wakeup the transport must notify whenever this
    /// endpoint becomes readable. Multiple signals may be registered.
    fn register_ready_signal(&mut self, signal: Arc<ReadySignal>);

    /// Short name for logging.
    fn endpoint_desc(&self) -> &'static str {
        "endpoint"
    }
}
