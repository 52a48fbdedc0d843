//! Plug a virtual controller, read it, rumble it, unplug it.
//!
//! Run with `RUST_LOG=debug cargo run --example hotplug` for the full trace.

use gameinput_joystick::backends::virtual_input::{VirtualDevice, VirtualGameInput};
use gameinput_joystick::platform::{capability, gamepad_button, rumble_motor, GameInput, GamepadState};
use gameinput_joystick::{DriverConfig, EventFilter, GameInputDriver, LogSink, SinkBus};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let platform = VirtualGameInput::new();
    let pad = platform.plug(
        VirtualDevice::new(0x045E, 0x0B13)
            .with_capabilities(capability::WIRELESS)
            .with_rumble_motors(rumble_motor::LOW_FREQUENCY | rumble_motor::HIGH_FREQUENCY)
            .with_firmware(5, 17),
    );

    let dyn_platform: Arc<dyn GameInput> = platform.clone();
    let mut driver = GameInputDriver::init(dyn_platform, DriverConfig::default())?;

    let mut bus = SinkBus::new();
    bus.add_sink(LogSink, EventFilter::All, None);

    driver.detect(&mut bus);
    println!("{}", driver.devices_json()?);

    let mut session = driver.open(0)?;
    println!("capabilities: {:?}", session.capabilities());

    for (ts, x) in [(1_000u64, 0.0f32), (2_000, 0.5), (3_000, -1.0)] {
        pad.feed(
            ts,
            GamepadState {
                buttons: if x < 0.0 { gamepad_button::A } else { 0 },
                left_thumbstick_x: x,
                ..Default::default()
            },
        );
        let emitted = driver.update(&mut session, &mut bus);
        println!("t={}us: {} events", ts, emitted);
    }
    // Nothing new since the last poll.
    println!("repeat poll: {} events", driver.update(&mut session, &mut bus));

    session.rumble(0x8000, 0x4000)?;
    if let Some(params) = pad.last_rumble() {
        println!("rumble submitted: {:?}", params);
    }

    session.close();
    platform.unplug(&pad);
    driver.detect(&mut bus);
    println!("tracked after unplug: {}", driver.count());

    driver.shutdown();
    Ok(())
}
