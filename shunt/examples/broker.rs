//! Bidirectional broker with a capture tap: a client and a worker exchange
//! request/reply traffic through the device while every relayed frame is
//! mirrored to a monitoring endpoint.
//!
//! Run with: `cargo run --example broker`

use std::time::Duration;

use shunt::inproc;
use shunt::{Device, Endpoint, Frame, FrameFlags, ThreadDevice};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    shunt::dev_tracing::init_tracing();

    let (frontend, mut client) = inproc::pair();
    let (backend, mut worker) = inproc::pair();
    let (capture, monitor) = inproc::pair();

    let device = ThreadDevice::spawn(
        Device::new(frontend, backend)
            .with_poll_interval(Duration::from_millis(20))
            .with_capture(capture),
    )?;

    for i in 0..3 {
        // Request: a label frame for routing, then the body.
        client.send(Frame::with_flags(
            format!("client-{i}"),
            FrameFlags::MORE.union(FrameFlags::LABEL),
        ))?;
        client.send(Frame::with_flags("ping", FrameFlags::NONE))?;

        let route = worker.recv_timeout(Duration::from_secs(1))?;
        let body = worker.recv_timeout(Duration::from_secs(1))?;
        println!(
            "worker: {} says {}",
            String::from_utf8_lossy(&route.payload),
            String::from_utf8_lossy(&body.payload)
        );

        worker.send(Frame::new("pong"))?;
        let reply = client.recv_timeout(Duration::from_secs(1))?;
        println!("client: got {}", String::from_utf8_lossy(&reply.payload));
    }

    let mut mirrored = 0;
    while monitor.recv_timeout(Duration::from_millis(100)).is_ok() {
        mirrored += 1;
    }
    println!("monitor: saw {mirrored} frames cross the relay");

    device.stop();
    device.join()?;
    Ok(())
}
