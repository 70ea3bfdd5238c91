//! The relay device: a bounded-poll run loop pumping whole multipart
//! messages between two endpoints.
//!
//! The device borrows two endpoints for its lifetime and never closes
//! either; it owns no other resources. One `run()` call executes entirely on
//! the calling thread, with no internal fan-out. The only cross-thread
//! mutable state is the running flag, an atomic read at every iteration
//! boundary and inside every transient-retry loop, which is what makes
//! stopping cooperative: a stop request is observed within one polling
//! interval when the device is idle, or after the in-flight message when it
//! is mid-pump. A message is never abandoned partway through a direction.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use thiserror::Error;
use tracing::debug;

use shunt_core::endpoint::Endpoint;
use shunt_core::error::EndpointError;
use shunt_core::poll::{poll, ReadySignal};
use shunt_core::retry::retry_interrupted;

use crate::relay::relay_message;

/// Default bounded wait for one readiness poll.
///
/// Stop latency is bounded by this interval, so supervisors that need a
/// snappier shutdown can lower it with [`Device::with_poll_interval`].
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

const FRONTEND: usize = 0;
const BACKEND: usize = 1;

/// The two relay directions, for error attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Frontend endpoint to backend endpoint.
    FrontendToBackend,
    /// Backend endpoint to frontend endpoint.
    BackendToFrontend,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrontendToBackend => f.write_str("frontend -> backend"),
            Self::BackendToFrontend => f.write_str("backend -> frontend"),
        }
    }
}

/// Why a device stopped, when it did not stop cleanly.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// A message relay failed while the device was still supposed to run.
    #[error("relay {direction} failed: {source}")]
    Relay {
        /// Which direction was being pumped.
        direction: Direction,
        /// The endpoint failure that aborted the pump.
        #[source]
        source: EndpointError,
    },

    /// The readiness poll failed while the device was still supposed to run.
    #[error("readiness poll failed: {0}")]
    Poll(#[source] EndpointError),

    /// The thread hosting the device died without reporting an outcome.
    #[error("device thread panicked")]
    Panicked,
}

/// Signaled when a run finishes; created set so waiting on a device that
/// never ran returns immediately.
#[derive(Debug)]
struct StopLatch {
    stopped: Mutex<bool>,
    cond: Condvar,
}

impl StopLatch {
    fn new() -> Self {
        Self {
            stopped: Mutex::new(true),
            cond: Condvar::new(),
        }
    }

    /// Mark a run as underway. Returns `true` if this call performed the
    /// transition (i.e. no run was already armed).
    fn arm(&self) -> bool {
        let mut stopped = self.stopped.lock();
        let was_stopped = *stopped;
        *stopped = false;
        was_stopped
    }

    fn set(&self) {
        *self.stopped.lock() = true;
        self.cond.notify_all();
    }

    fn wait(&self) {
        let mut stopped = self.stopped.lock();
        while !*stopped {
            self.cond.wait(&mut stopped);
        }
    }

    fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut stopped = self.stopped.lock();
        while !*stopped {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.cond.wait_for(&mut stopped, deadline - now);
        }
        true
    }
}

/// Cloneable control handle for a device, usable from any thread.
///
/// `run()` exclusively borrows the device, so a supervisor that wants to
/// stop it must take a control handle first.
#[derive(Debug, Clone)]
pub struct DeviceControl {
    running: Arc<AtomicBool>,
    latch: Arc<StopLatch>,
}

impl DeviceControl {
    /// Request a graceful stop.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Current running state.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Block until the device's run loop has exited.
    pub fn wait(&self) {
        self.latch.wait();
    }

    /// Block until the run loop has exited or `timeout` elapses. Returns
    /// `true` if the device is stopped.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.latch.wait_timeout(timeout)
    }
}

/// A bidirectional relay between a frontend and a backend endpoint.
///
/// Whole logical messages are forwarded in both directions: once the first
/// frame of a message has been received, every remaining frame is relayed
/// (in order, flags reconstructed) before the opposite direction is
/// serviced. The frontend is always serviced before the backend on each
/// iteration, and each iteration relays at most one message per direction
/// before re-polling, which bounds the service ratio near 1:1 under
/// symmetric load: flooding one side cannot starve the other.
pub struct Device<F, B> {
    frontend: F,
    backend: B,
    capture: Option<Box<dyn Endpoint + Send>>,
    running: Arc<AtomicBool>,
    latch: Arc<StopLatch>,
    poll_interval: Duration,
}

impl<F, B> Device<F, B>
where
    F: Endpoint,
    B: Endpoint,
{
    /// A device relaying between `frontend` and `backend`, initially
    /// stopped.
    pub fn new(frontend: F, backend: B) -> Self {
        Self {
            frontend,
            backend,
            capture: None,
            running: Arc::new(AtomicBool::new(false)),
            latch: Arc::new(StopLatch::new()),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the bounded readiness-poll wait.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Attach a capture endpoint that receives a copy of every relayed
    /// frame. Capture failures never abort the relay.
    #[must_use]
    pub fn with_capture(mut self, capture: impl Endpoint + Send + 'static) -> Self {
        self.capture = Some(Box::new(capture));
        self
    }

    /// A control handle for stopping and supervising this device from other
    /// threads.
    #[must_use]
    pub fn control(&self) -> DeviceControl {
        DeviceControl {
            running: Arc::clone(&self.running),
            latch: Arc::clone(&self.latch),
        }
    }

    /// Current running state.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Raise the running flag. `run()` does this itself, so calling `start`
    /// first is optional.
    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    /// Request a graceful stop. The run loop observes the flag within one
    /// polling interval, or after the in-flight message completes.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// The configured bounded poll wait.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Release the two endpoints. The device never closes them; their
    /// lifecycle belongs to the caller.
    pub fn into_endpoints(self) -> (F, B) {
        (self.frontend, self.backend)
    }

    /// Mark a run as underway before the hosting thread actually enters
    /// `run()`, so that a stop or a latch wait issued right after a spawn is
    /// not lost.
    pub(crate) fn arm(&self) {
        if self.latch.arm() {
            self.running.store(true, Ordering::SeqCst);
        }
    }

    /// Relay messages in both directions until the running flag drops or an
    /// unrecoverable error occurs. Blocks the calling thread.
    ///
    /// # Errors
    ///
    /// Returns `Ok(())` on a clean stop. A hard endpoint failure observed
    /// while the device is still supposed to run surfaces as a
    /// [`DeviceError`]; the same failure observed after a stop request is a
    /// normal consequence of shutdown (tearing down an endpoint invalidates
    /// in-flight operations) and is reclassified as a clean stop.
    pub fn run(&mut self) -> Result<(), DeviceError> {
        let running = Arc::clone(&self.running);
        let signal = Arc::new(ReadySignal::new());
        self.frontend.register_ready_signal(Arc::clone(&signal));
        self.backend.register_ready_signal(Arc::clone(&signal));

        self.arm();
        debug!(
            "device running: {} <-> {}",
            self.frontend.endpoint_desc(),
            self.backend.endpoint_desc()
        );

        let result = self.run_loop(&running, &signal);

        running.store(false, Ordering::SeqCst);
        self.latch.set();
        debug!("device stopped");
        result
    }

    fn run_loop(&mut self, running: &AtomicBool, signal: &ReadySignal) -> Result<(), DeviceError> {
        while running.load(Ordering::SeqCst) {
            let interval = self.poll_interval;
            let polled = {
                let frontend = &self.frontend as &dyn Endpoint;
                let backend = &self.backend as &dyn Endpoint;
                retry_interrupted(running, || poll(&[frontend, backend], signal, interval))
            };
            let ready = match polled {
                Ok(ready) => ready,
                Err(source) => return stopped_or(running, DeviceError::Poll(source)),
            };

            // Frontend before backend, every iteration. Servicing at most
            // one message per direction between polls keeps the ratio near
            // 1:1 under load; draining one side first would let it be used
            // to starve the other.
            if ready.is_ready(FRONTEND) {
                if let Err(source) = relay_message(
                    running,
                    &mut self.frontend,
                    &mut self.backend,
                    self.capture.as_deref_mut(),
                ) {
                    return stopped_or(
                        running,
                        DeviceError::Relay {
                            direction: Direction::FrontendToBackend,
                            source,
                        },
                    );
                }
            }

            if ready.is_ready(BACKEND) {
                if let Err(source) = relay_message(
                    running,
                    &mut self.backend,
                    &mut self.frontend,
                    self.capture.as_deref_mut(),
                ) {
                    return stopped_or(
                        running,
                        DeviceError::Relay {
                            direction: Direction::BackendToFrontend,
                            source,
                        },
                    );
                }
            }
        }
        Ok(())
    }
}

/// A failure with the running flag already down is a shutdown artifact, not
/// an error: stopping legitimately invalidates in-flight endpoint
/// operations.
fn stopped_or(running: &AtomicBool, error: DeviceError) -> Result<(), DeviceError> {
    if running.load(Ordering::SeqCst) {
        Err(error)
    } else {
        debug!("shutdown in progress, reclassifying as clean stop: {error}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEndpoint;
    use crate::thread_device::ThreadDevice;
    use shunt_core::frame::{Frame, FrameFlags};
    use std::io;

    const TEST_INTERVAL: Duration = Duration::from_millis(5);
    const WAIT: Duration = Duration::from_secs(5);

    fn device(front: &MockEndpoint, back: &MockEndpoint) -> Device<MockEndpoint, MockEndpoint> {
        Device::new(front.clone(), back.clone()).with_poll_interval(TEST_INTERVAL)
    }

    fn wait_for(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + WAIT;
        while !condition() {
            assert!(Instant::now() < deadline, "condition not met in time");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn relays_frontend_to_backend_and_back() {
        let front = MockEndpoint::new("front");
        let back = MockEndpoint::new("back");
        front.push_frame(Frame::with_flags("req-1", FrameFlags::MORE));
        front.push_frame(Frame::new("req-2"));
        back.push_frame(Frame::new("rep"));

        let dev = ThreadDevice::spawn(device(&front, &back)).unwrap();
        wait_for(|| back.sent().len() == 2 && front.sent().len() == 1);

        dev.stop();
        dev.join().unwrap();

        let to_back = back.sent();
        assert_eq!(&to_back[0].payload[..], b"req-1");
        assert!(to_back[0].more());
        assert!(!to_back[1].more());
        assert_eq!(&front.sent()[0].payload[..], b"rep");
    }

    #[test]
    fn symmetric_load_is_serviced_frontend_first_one_message_each() {
        let front = MockEndpoint::new("front");
        let back = MockEndpoint::new("back");
        let log = Arc::new(Mutex::new(Vec::new()));
        front.log_service_to(Arc::clone(&log));
        back.log_service_to(Arc::clone(&log));
        for i in 0..3 {
            front.push_frame(Frame::new(format!("f{i}")));
            back.push_frame(Frame::new(format!("b{i}")));
        }

        let dev = ThreadDevice::spawn(device(&front, &back)).unwrap();
        wait_for(|| back.sent().len() == 3 && front.sent().len() == 3);
        dev.stop();
        dev.join().unwrap();

        // Both directions continuously ready: strict A-B-A-B alternation,
        // bounded unfairness of one.
        assert_eq!(
            *log.lock(),
            vec!["front", "back", "front", "back", "front", "back"]
        );
    }

    #[test]
    fn transient_failures_are_invisible() {
        let front = MockEndpoint::new("front");
        let back = MockEndpoint::new("back");
        front.push_recv_error(EndpointError::Interrupted);
        front.push_frame(Frame::new("x"));
        front.push_readable_error(EndpointError::Interrupted);
        back.push_send_error(EndpointError::Interrupted);

        let dev = ThreadDevice::spawn(device(&front, &back)).unwrap();
        wait_for(|| back.sent().len() == 1);
        dev.stop();
        assert!(dev.join().is_ok(), "no transient error may surface");
        assert_eq!(&back.sent()[0].payload[..], b"x");
    }

    #[test]
    fn hard_error_while_running_surfaces_from_run() {
        let front = MockEndpoint::new("front");
        let back = MockEndpoint::new("back");
        front.push_recv_error(EndpointError::Io(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "endpoint torn down",
        )));

        let dev = ThreadDevice::spawn(device(&front, &back)).unwrap();
        let outcome = dev.join();
        assert!(matches!(
            outcome,
            Err(DeviceError::Relay {
                direction: Direction::FrontendToBackend,
                ..
            })
        ));
    }

    #[test]
    fn hard_error_after_stop_request_is_a_clean_stop() {
        let front = MockEndpoint::new("front");
        let back = MockEndpoint::new("back");

        let dev_under_test = device(&front, &back);
        // The stop lands immediately before the scripted error is returned,
        // so the device observes the failure with the flag already down.
        front.stop_on_error(dev_under_test.control());
        front.push_recv_error(EndpointError::Closed);

        let dev = ThreadDevice::spawn(dev_under_test).unwrap();
        assert!(dev.join().is_ok());
    }

    #[test]
    fn stop_mid_message_finishes_the_message_first() {
        let front = MockEndpoint::new("front");
        let back = MockEndpoint::new("back");

        let dev_under_test = device(&front, &back);
        front.stop_after_recvs(1, dev_under_test.control());
        front.push_frame(Frame::with_flags("part-1", FrameFlags::MORE));
        front.push_frame(Frame::with_flags("part-2", FrameFlags::MORE));
        front.push_frame(Frame::new("part-3"));

        let dev = ThreadDevice::spawn(dev_under_test).unwrap();
        assert!(dev.join().is_ok());

        // Stop was requested after the first frame; the whole message still
        // crossed before the loop exited.
        let sent = back.sent();
        assert_eq!(sent.len(), 3);
        assert!(!sent[2].more());
    }

    #[test]
    fn transient_poll_failure_is_retried() {
        let front = MockEndpoint::new("front");
        let back = MockEndpoint::new("back");
        front.push_readable_error(EndpointError::Interrupted);
        front.push_frame(Frame::new("after the blip"));

        let dev = ThreadDevice::spawn(device(&front, &back)).unwrap();
        wait_for(|| back.sent().len() == 1);
        dev.stop();
        dev.join().unwrap();
    }

    #[test]
    fn hard_poll_failure_surfaces_from_run() {
        let front = MockEndpoint::new("front");
        let back = MockEndpoint::new("back");
        front.push_readable_error(EndpointError::Io(io::Error::new(
            io::ErrorKind::NotConnected,
            "poll broke",
        )));

        let dev = ThreadDevice::spawn(device(&front, &back)).unwrap();
        assert!(matches!(dev.join(), Err(DeviceError::Poll(_))));
    }

    #[test]
    fn capture_sees_traffic_from_both_directions() {
        let front = MockEndpoint::new("front");
        let back = MockEndpoint::new("back");
        let cap = MockEndpoint::new("cap");
        front.push_frame(Frame::new("from front"));
        back.push_frame(Frame::new("from back"));

        let dev = ThreadDevice::spawn(
            device(&front, &back).with_capture(cap.clone()),
        )
        .unwrap();
        wait_for(|| cap.sent().len() == 2);
        dev.stop();
        dev.join().unwrap();
    }

    #[test]
    fn into_endpoints_returns_the_borrowed_pair() {
        let front = MockEndpoint::new("front");
        let back = MockEndpoint::new("back");
        let dev = device(&front, &back);
        let (f, b) = dev.into_endpoints();
        assert_eq!(f.endpoint_desc(), "front");
        assert_eq!(b.endpoint_desc(), "back");
    }

    #[test]
    fn control_wait_returns_immediately_before_any_run() {
        let front = MockEndpoint::new("front");
        let back = MockEndpoint::new("back");
        let control = device(&front, &back).control();
        assert!(control.wait_timeout(Duration::ZERO));
        assert!(!control.is_running());
    }
}
