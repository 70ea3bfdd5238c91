//! In-process endpoint pair over channels.
//!
//! The inproc transport connects two endpoints inside the same process with
//! no serialization, network, or syscall overhead. It is the transport
//! integration tests, examples, and benches run the relay device over.
//!
//! # Usage
//!
//! ```
//! use shunt_core::endpoint::Endpoint;
//! use shunt_core::frame::Frame;
//! use shunt_core::inproc;
//!
//! let (mut a, mut b) = inproc::pair();
//! a.send(Frame::new("hello")).unwrap();
//!
//! let frame = b.recv().unwrap();
//! assert_eq!(&frame.payload[..], b"hello");
//! ```

use std::io;
use std::sync::Arc;
use std::time::Duration;

use flume::{Receiver, Sender};
use parking_lot::Mutex;

use crate::endpoint::Endpoint;
use crate::error::{EndpointError, Result};
use crate::frame::Frame;
use crate::poll::ReadySignal;

/// Ready signals registered by one side, notified by its peer on enqueue.
type SignalSet = Arc<Mutex<Vec<Arc<ReadySignal>>>>;

/// One half of an in-process connection.
///
/// Frames sent on one half arrive, in order, on the other. Dropping a half
/// closes the connection: the surviving half sees [`EndpointError::Closed`]
/// on both `send` and `recv`.
pub struct InprocEndpoint {
    name: &'static str,
    tx: Sender<Frame>,
    rx: Receiver<Frame>,
    local_signals: SignalSet,
    peer_signals: SignalSet,
}

/// Create a connected pair of in-process endpoints.
#[must_use]
pub fn pair() -> (InprocEndpoint, InprocEndpoint) {
    let (a_to_b_tx, a_to_b_rx) = flume::unbounded();
    let (b_to_a_tx, b_to_a_rx) = flume::unbounded();
    let a_signals: SignalSet = Arc::new(Mutex::new(Vec::new()));
    let b_signals: SignalSet = Arc::new(Mutex::new(Vec::new()));

    let a = InprocEndpoint {
        name: "inproc(a)",
        tx: a_to_b_tx,
        rx: b_to_a_rx,
        local_signals: Arc::clone(&a_signals),
        peer_signals: Arc::clone(&b_signals),
    };
    let b = InprocEndpoint {
        name: "inproc(b)",
        tx: b_to_a_tx,
        rx: a_to_b_rx,
        local_signals: b_signals,
        peer_signals: a_signals,
    };
    (a, b)
}

impl InprocEndpoint {
    /// Receive with a deadline. Test/supervision convenience; the device
    /// itself only receives after a positive readiness indication.
    ///
    /// # Errors
    ///
    /// `Io(TimedOut)` when the deadline passes, `Closed` when the peer is
    /// gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Frame> {
        self.rx.recv_timeout(timeout).map_err(|e| match e {
            flume::RecvTimeoutError::Timeout => {
                EndpointError::Io(io::Error::new(io::ErrorKind::TimedOut, "recv timed out"))
            }
            flume::RecvTimeoutError::Disconnected => EndpointError::Closed,
        })
    }

    /// Number of frames queued for this endpoint.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl Endpoint for InprocEndpoint {
    fn recv(&mut self) -> Result<Frame> {
        self.rx.recv().map_err(|_| EndpointError::Closed)
    }

    fn send(&mut self, frame: Frame) -> Result<()> {
        self.tx.send(frame).map_err(|_| EndpointError::Closed)?;
        for signal in self.peer_signals.lock().iter() {
            signal.notify();
        }
        Ok(())
    }

    fn readable(&self) -> Result<bool> {
        Ok(!self.rx.is_empty())
    }

    fn register_ready_signal(&mut self, signal: Arc<ReadySignal>) {
        self.local_signals.lock().push(signal);
    }

    fn endpoint_desc(&self) -> &'static str {
        self.name
    }
}
