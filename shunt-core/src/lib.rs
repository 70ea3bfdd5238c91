//! Shunt Core
//!
//! Transport-agnostic building blocks for the shunt relay device:
//! - Frames and per-frame flags (`frame`)
//! - The endpoint capability trait (`endpoint`)
//! - Bounded-wait readiness polling (`poll`)
//! - Transient-failure retry bounded by a running flag (`retry`)
//! - Error taxonomy (`error`)
//! - In-process channel-backed endpoints (`inproc`)

#![cfg_attr(not(test), deny(unsafe_code))]
#![allow(clippy::module_name_repetitions)]

pub mod endpoint;
pub mod error;
pub mod frame;
pub mod inproc;
pub mod poll;
pub mod retry;

// Optional: a small prelude to make downstream crates ergonomic.
// Keep it minimal to avoid API lock-in.
pub mod prelude {
    pub use crate::endpoint::Endpoint;
    pub use crate::error::EndpointError;
    pub use crate::frame::{Frame, FrameFlags};
    pub use crate::inproc::InprocEndpoint;
    pub use crate::poll::{poll, Readiness, ReadySignal};
    pub use crate::retry::retry_interrupted;
}
