//! A relay device hosted on its own OS thread.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use shunt_core::endpoint::Endpoint;

use crate::device::{Device, DeviceControl, DeviceError};

/// Runs a [`Device`] on a dedicated, named thread and exposes its control
/// surface to the spawning thread.
///
/// The device is armed before the thread starts, so a `stop()` or a
/// `join_timeout()` issued immediately after `spawn` behaves as expected.
pub struct ThreadDevice {
    control: DeviceControl,
    handle: JoinHandle<Result<(), DeviceError>>,
}

impl ThreadDevice {
    /// Start `device` on a new thread.
    ///
    /// # Errors
    ///
    /// Fails only if the OS refuses to spawn the thread.
    pub fn spawn<F, B>(device: Device<F, B>) -> io::Result<Self>
    where
        F: Endpoint + Send + 'static,
        B: Endpoint + Send + 'static,
    {
        let control = device.control();
        device.arm();
        let handle = thread::Builder::new()
            .name("shunt-device".into())
            .spawn(move || {
                let mut device = device;
                device.run()
            })?;
        Ok(Self { control, handle })
    }

    /// A control handle for this device.
    #[must_use]
    pub fn control(&self) -> DeviceControl {
        self.control.clone()
    }

    /// Current running state.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.control.is_running()
    }

    /// Request a graceful stop; observed within one polling interval, or
    /// after the in-flight message completes.
    pub fn stop(&self) {
        self.control.stop();
    }

    /// Block until the device terminates or `timeout` elapses. Returns
    /// `true` if the device terminated.
    #[must_use]
    pub fn join_timeout(&self, timeout: Duration) -> bool {
        self.control.wait_timeout(timeout)
    }

    /// Block until the device thread terminates and return its outcome.
    ///
    /// # Errors
    ///
    /// The device's own stop-with-error outcome, or
    /// [`DeviceError::Panicked`] if the hosting thread died.
    pub fn join(self) -> Result<(), DeviceError> {
        match self.handle.join() {
            Ok(outcome) => outcome,
            Err(_) => Err(DeviceError::Panicked),
        }
    }
}
