//! Reading → event translation.
//!
//! Each tick, [`translate`] turns the newest GameInput reading of an opened
//! device into a full set of joystick events:
//!
//! ## Axes (6)
//! - `0`: left stick X
//! - `1`: left stick Y
//! - `2`: left trigger
//! - `3`: right stick X
//! - `4`: right stick Y
//! - `5`: right trigger
//!
//! Sticks and triggers arrive as floats and leave as `i16`
//! (see [`axis_to_i16`]). Y is reported as the platform reports it.
//!
//! ## Buttons (11)
//! A, B, X, Y, LB, RB, View, Menu, LThumb, RThumb, Guide. The platform has no
//! guide button, so index 10 is always released.
//!
//! ## Hat (1)
//! D-pad as a [`hat`](crate::event::hat) bitmask.
//!
//! ## Battery
//! Always [`PowerLevel::Full`]; there is no battery telemetry for gamepads.
//!
//! Nothing is emitted when there is no reading, when its timestamp matches the
//! last one we translated, or when it carries no gamepad payload.

use crate::event::{hat, InstanceId, JoystickEvent, PowerLevel};
use crate::platform::{gamepad_button, GamepadState, GameInputReading};
use crate::sink::JoystickSink;

/// Nanoseconds per platform timestamp unit (microseconds).
pub const NS_PER_US: u64 = 1_000;

/// Number of axes reported for every device.
pub const AXIS_COUNT: u8 = 6;

/// Button masks in report order. `0` marks a button the hardware lacks.
pub const BUTTON_MAP: [u32; 11] = [
    gamepad_button::A,
    gamepad_button::B,
    gamepad_button::X,
    gamepad_button::Y,
    gamepad_button::LEFT_SHOULDER,
    gamepad_button::RIGHT_SHOULDER,
    gamepad_button::VIEW,
    gamepad_button::MENU,
    gamepad_button::LEFT_THUMBSTICK,
    gamepad_button::RIGHT_THUMBSTICK,
    0, // guide
];

/// Number of buttons reported for every device.
pub const BUTTON_COUNT: u8 = BUTTON_MAP.len() as u8;

/// Number of hats reported for every device.
pub const HAT_COUNT: u8 = 1;

/// Why a reading produced no events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Skip {
    /// Same timestamp as the last translated reading.
    Stale,
    /// The reading holds no gamepad payload.
    Undecodable,
}

/// Map a normalized float onto the full `i16` range.
///
/// Negative values scale by 32768 and non-negative ones by 32767, so both
/// `-1.0 → -32768` and `1.0 → 32767` are exact. Out-of-range input saturates.
#[inline]
pub fn axis_to_i16(value: f32) -> i16 {
    if value < 0.0 {
        (value * 32768.0) as i16
    } else {
        (value * 32767.0) as i16
    }
}

/// D-pad bits → hat bitmask.
pub fn hat_from_buttons(buttons: u32) -> u8 {
    let mut value = hat::CENTERED;
    if buttons & gamepad_button::DPAD_UP != 0 {
        value |= hat::UP;
    }
    if buttons & gamepad_button::DPAD_DOWN != 0 {
        value |= hat::DOWN;
    }
    if buttons & gamepad_button::DPAD_LEFT != 0 {
        value |= hat::LEFT;
    }
    if buttons & gamepad_button::DPAD_RIGHT != 0 {
        value |= hat::RIGHT;
    }
    value
}

/// Platform microseconds → sink nanoseconds.
#[inline]
pub fn timestamp_ns(timestamp_us: u64) -> u64 {
    timestamp_us.wrapping_mul(NS_PER_US)
}

/// Translate one reading.
///
/// `last_timestamp` is the converted timestamp of the previous translated
/// reading (`0` before the first one) and is advanced on success. Returns the
/// number of events emitted, or why none were.
pub fn translate(
    reading: &dyn GameInputReading,
    instance_id: InstanceId,
    last_timestamp: &mut u64,
    sink: &mut dyn JoystickSink,
) -> Result<usize, Skip> {
    let timestamp = timestamp_ns(reading.timestamp());

    if *last_timestamp != 0 && timestamp == *last_timestamp {
        return Err(Skip::Stale);
    }

    let state = reading.gamepad_state().ok_or(Skip::Undecodable)?;
    let emitted = emit_state(&state, timestamp, instance_id, sink);
    *last_timestamp = timestamp;
    Ok(emitted)
}

fn emit_state(
    state: &GamepadState,
    timestamp: u64,
    instance_id: InstanceId,
    sink: &mut dyn JoystickSink,
) -> usize {
    let axes = [
        state.left_thumbstick_x,
        state.left_thumbstick_y,
        state.left_trigger,
        state.right_thumbstick_x,
        state.right_thumbstick_y,
        state.right_trigger,
    ];
    let mut emitted = 0;

    for (axis, &value) in axes.iter().enumerate() {
        sink.on_event(&JoystickEvent::AxisMoved {
            timestamp,
            instance_id,
            axis: axis as u8,
            value: axis_to_i16(value),
        });
        emitted += 1;
    }

    for (button, &mask) in BUTTON_MAP.iter().enumerate() {
        let pressed = mask != 0 && state.buttons & mask != 0;
        sink.on_event(&JoystickEvent::ButtonChanged {
            timestamp,
            instance_id,
            button: button as u8,
            pressed,
        });
        emitted += 1;
    }

    sink.on_event(&JoystickEvent::HatChanged {
        timestamp,
        instance_id,
        hat: 0,
        value: hat_from_buttons(state.buttons),
    });

    sink.on_event(&JoystickEvent::BatteryLevel {
        timestamp,
        instance_id,
        level: PowerLevel::Full,
    });

    emitted + 2
}
