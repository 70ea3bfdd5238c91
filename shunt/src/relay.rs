//! The frame pump: per-message forwarding between two endpoints.

use std::sync::atomic::AtomicBool;

use tracing::{debug, trace};

use shunt_core::endpoint::Endpoint;
use shunt_core::error::Result;
use shunt_core::frame::{Frame, FrameFlags};
use shunt_core::retry::retry_interrupted;

/// Relay exactly one logical message from `source` to `destination`.
///
/// Frames are pumped one at a time until the message's last frame (the first
/// with the `MORE` bit clear). For every frame the outgoing flag set is
/// re-derived: continuation is requested iff more frames remain, and the
/// label designation is preserved iff the received frame carried it. The two
/// are orthogonal properties and are translated independently.
///
/// When a `capture` endpoint is attached it receives a copy of every frame,
/// flags included, before the destination does. Capture failures are logged
/// and never abort the relay.
///
/// Transiently interrupted receives and sends are retried while `running`
/// holds; the caller is expected to invoke this only after a positive
/// readiness indication on `source`.
///
/// # Errors
///
/// Any non-transient endpoint failure aborts the pump mid-message and is
/// propagated. A transient failure is returned only when `running` has gone
/// false, which the device reinterprets as a stop.
pub fn relay_message<S, D, C>(
    running: &AtomicBool,
    source: &mut S,
    destination: &mut D,
    mut capture: Option<&mut C>,
) -> Result<()>
where
    S: Endpoint + ?Sized,
    D: Endpoint + ?Sized,
    C: Endpoint + ?Sized,
{
    let mut frames = 0usize;
    loop {
        let frame = retry_interrupted(running, || source.recv())?;
        let more = frame.more();
        let flags = FrameFlags::NONE
            .with_more(more)
            .with_label(frame.is_label());
        let payload = frame.payload;

        if let Some(cap) = capture.as_deref_mut() {
            if let Err(error) = cap.send(Frame::with_flags(payload.clone(), flags)) {
                debug!("capture {} dropped a frame: {}", cap.endpoint_desc(), error);
            }
        }

        retry_interrupted(running, || {
            destination.send(Frame::with_flags(payload.clone(), flags))
        })?;
        frames += 1;

        if !more {
            trace!(
                "{} -> {}: relayed message of {} frame(s)",
                source.endpoint_desc(),
                destination.endpoint_desc(),
                frames
            );
            return Ok(());
        }
    }
}
