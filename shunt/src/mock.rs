//! Scripted endpoint for unit tests: queued frames, injectable failures,
//! shared inspection handles.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use shunt_core::endpoint::Endpoint;
use shunt_core::error::{EndpointError, Result};
use shunt_core::frame::Frame;
use shunt_core::poll::ReadySignal;

use crate::device::DeviceControl;

#[derive(Default)]
struct MockState {
    recv_script: VecDeque<Result<Frame>>,
    sent: Vec<Frame>,
    send_errors: VecDeque<EndpointError>,
    readable_errors: VecDeque<EndpointError>,
    signals: Vec<Arc<ReadySignal>>,
    service_log: Option<Arc<Mutex<Vec<&'static str>>>>,
    stop_on_error: Option<DeviceControl>,
    stop_after_recvs: Option<(usize, DeviceControl)>,
    recv_count: usize,
}

/// Clones share state, so a test keeps one handle for inspection while the
/// device owns the other.
#[derive(Clone)]
pub(crate) struct MockEndpoint {
    name: &'static str,
    state: Arc<Mutex<MockState>>,
}

impl MockEndpoint {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    pub(crate) fn push_frame(&self, frame: Frame) {
        let mut state = self.state.lock();
        state.recv_script.push_back(Ok(frame));
        for signal in &state.signals {
            signal.notify();
        }
    }

    pub(crate) fn push_recv_error(&self, error: EndpointError) {
        let mut state = self.state.lock();
        state.recv_script.push_back(Err(error));
        for signal in &state.signals {
            signal.notify();
        }
    }

    pub(crate) fn push_send_error(&self, error: EndpointError) {
        self.state.lock().send_errors.push_back(error);
    }

    pub(crate) fn push_readable_error(&self, error: EndpointError) {
        self.state.lock().readable_errors.push_back(error);
    }

    /// Frames accepted by `send` so far.
    pub(crate) fn sent(&self) -> Vec<Frame> {
        self.state.lock().sent.clone()
    }

    /// Unconsumed recv script entries.
    pub(crate) fn pending(&self) -> usize {
        self.state.lock().recv_script.len()
    }

    /// Record every successful `recv` into a log shared across endpoints,
    /// to observe the device's service order.
    pub(crate) fn log_service_to(&self, log: Arc<Mutex<Vec<&'static str>>>) {
        self.state.lock().service_log = Some(log);
    }

    /// Stop the device right before a scripted recv error is returned, so
    /// the error is observed with the running flag already down.
    pub(crate) fn stop_on_error(&self, control: DeviceControl) {
        self.state.lock().stop_on_error = Some(control);
    }

    /// Stop the device after the n-th successful recv, mid-message if the
    /// script says so.
    pub(crate) fn stop_after_recvs(&self, n: usize, control: DeviceControl) {
        self.state.lock().stop_after_recvs = Some((n, control));
    }
}

impl Endpoint for MockEndpoint {
    fn recv(&mut self) -> Result<Frame> {
        let mut state = self.state.lock();
        match state.recv_script.pop_front() {
            Some(Ok(frame)) => {
                state.recv_count += 1;
                if let Some(log) = &state.service_log {
                    log.lock().push(self.name);
                }
                if let Some((n, control)) = &state.stop_after_recvs {
                    if state.recv_count == *n {
                        control.stop();
                    }
                }
                Ok(frame)
            }
            Some(Err(error)) => {
                if let Some(control) = &state.stop_on_error {
                    control.stop();
                }
                Err(error)
            }
            // The script ran dry: a real endpoint would block here, but a
            // test that lets this happen has a bug, so fail loudly instead.
            None => Err(EndpointError::Closed),
        }
    }

    fn send(&mut self, frame: Frame) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(error) = state.send_errors.pop_front() {
            return Err(error);
        }
        state.sent.push(frame);
        Ok(())
    }

    fn readable(&self) -> Result<bool> {
        let mut state = self.state.lock();
        if let Some(error) = state.readable_errors.pop_front() {
            return Err(error);
        }
        Ok(!state.recv_script.is_empty())
    }

    fn register_ready_signal(&mut self, signal: Arc<ReadySignal>) {
        self.state.lock().signals.push(signal);
    }

    fn endpoint_desc(&self) -> &'static str {
        self.name
    }
}
