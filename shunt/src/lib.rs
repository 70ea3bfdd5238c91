//! # Shunt
//!
//! A bidirectional relay device for multipart message streams.
//!
//! A [`Device`] sits between two message-queue endpoints (a frontend and a
//! backend) and forwards whole multipart messages between them, using
//! bounded readiness polling rather than blocking reads, with cooperative
//! start/stop that never corrupts an in-flight message.
//!
//! ## Layering
//!
//! - **`shunt-core`**: frames, the [`Endpoint`] capability trait, readiness
//!   polling, the transient-retry combinator, and an in-process transport
//! - **`shunt`**: the device run loop, the frame pump, and the threaded
//!   runner (this crate)
//!
//! ## Quick Start
//!
//! ```no_run
//! use shunt::{inproc, Device, Endpoint, Frame, ThreadDevice};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Each pair() half talks to the other: the device owns one half of each
//! // pair, the application keeps the peers.
//! let (frontend, mut client) = inproc::pair();
//! let (backend, mut worker) = inproc::pair();
//!
//! let device = ThreadDevice::spawn(Device::new(frontend, backend))?;
//!
//! client.send(Frame::new("ping"))?;
//! let frame = worker.recv()?;
//! assert_eq!(&frame.payload[..], b"ping");
//!
//! device.stop();
//! device.join()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees
//!
//! - A logical message, once begun, is relayed whole: frames in order,
//!   `MORE`/`LABEL` flags reconstructed, never interleaved with the opposite
//!   direction.
//! - The frontend is serviced before the backend on every iteration and at
//!   most one message per direction is relayed between polls, so neither
//!   direction can starve the other.
//! - Stopping is cooperative: observed within one polling interval when
//!   idle, after the in-flight message when mid-pump.
//! - Transient interruptions of poll/receive/send are retried internally and
//!   never surface; any other failure stops the device and is reported from
//!   [`Device::run`], unless a stop was already requested, in which case it
//!   is a normal shutdown artifact.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export core types
pub use bytes::Bytes;
pub use shunt_core::endpoint::Endpoint;
pub use shunt_core::error::EndpointError;
pub use shunt_core::frame::{Frame, FrameFlags};
pub use shunt_core::{inproc, poll, retry};

pub mod dev_tracing;
pub mod device;
pub mod relay;
pub mod thread_device;

pub use device::{Device, DeviceControl, DeviceError, Direction, DEFAULT_POLL_INTERVAL};
pub use relay::relay_message;
pub use thread_device::ThreadDevice;

#[cfg(test)]
pub(crate) mod mock;
