//! One-way pipeline: a producer pushes work through the device to a
//! consumer. The device itself is symmetric; one-way flow simply means one
//! direction never has traffic.
//!
//! Run with: `cargo run --example forwarder`

use std::time::Duration;

use shunt::inproc;
use shunt::{Device, Endpoint, Frame, FrameFlags, ThreadDevice};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    shunt::dev_tracing::init_tracing();

    let (frontend, mut producer) = inproc::pair();
    let (backend, consumer) = inproc::pair();

    let device = ThreadDevice::spawn(
        Device::new(frontend, backend).with_poll_interval(Duration::from_millis(20)),
    )?;

    for task in 0..5 {
        producer.send(Frame::with_flags(format!("task-{task}"), FrameFlags::MORE))?;
        producer.send(Frame::new("payload"))?;
    }

    for _ in 0..5 {
        let header = consumer.recv_timeout(Duration::from_secs(1))?;
        let body = consumer.recv_timeout(Duration::from_secs(1))?;
        println!(
            "consumer got {} ({} bytes of payload)",
            String::from_utf8_lossy(&header.payload),
            body.payload.len()
        );
    }

    device.stop();
    device.join()?;
    println!("forwarder stopped cleanly");
    Ok(())
}
