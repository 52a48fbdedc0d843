//! Events and channel descriptions.
//!
//! The driver reports everything it observes as [`JoystickEvent`]s pushed into a
//! [`JoystickSink`](crate::sink::JoystickSink).
//!
//! ## Value conventions
//! - **Axes:** signed 16-bit. Sticks span `-32768..=32767`; triggers `0..=32767`.
//! - **Buttons:** level state (`pressed`), reported every tick, not as edges.
//! - **Hats:** bitmask of [`hat::UP`], [`hat::RIGHT`], [`hat::DOWN`], [`hat::LEFT`];
//!   `0` is centered. Diagonals are two bits ORed together.
//! - **Timestamps:** nanoseconds on the platform's clock. Every event produced
//!   by the same tick carries the same timestamp.

use serde::Serialize;
use std::fmt;

/// Process-unique joystick instance id. Never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InstanceId(pub u32);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hat direction bits.
pub mod hat {
    pub const CENTERED: u8 = 0x00;
    pub const UP: u8 = 0x01;
    pub const RIGHT: u8 = 0x02;
    pub const DOWN: u8 = 0x04;
    pub const LEFT: u8 = 0x08;
}

/// Battery / power state reported to the sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PowerLevel {
    Unknown,
    Empty,
    Low,
    Medium,
    Full,
    Wired,
}

/// Normalized change reported to the joystick layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JoystickEvent {
    /// A device became available.
    DeviceAdded { instance_id: InstanceId },

    /// A previously added device went away.
    DeviceRemoved { instance_id: InstanceId },

    /// Axis value (device-local index, see [`ChannelDesc`]).
    AxisMoved {
        timestamp: u64,
        instance_id: InstanceId,
        axis: u8,
        value: i16,
    },

    /// Button state.
    ButtonChanged {
        timestamp: u64,
        instance_id: InstanceId,
        button: u8,
        pressed: bool,
    },

    /// Hat state (see [`hat`]).
    HatChanged {
        timestamp: u64,
        instance_id: InstanceId,
        hat: u8,
        value: u8,
    },

    /// Battery level.
    BatteryLevel {
        timestamp: u64,
        instance_id: InstanceId,
        level: PowerLevel,
    },
}

impl JoystickEvent {
    /// Device this event is about.
    pub fn instance_id(&self) -> InstanceId {
        match *self {
            JoystickEvent::DeviceAdded { instance_id }
            | JoystickEvent::DeviceRemoved { instance_id }
            | JoystickEvent::AxisMoved { instance_id, .. }
            | JoystickEvent::ButtonChanged { instance_id, .. }
            | JoystickEvent::HatChanged { instance_id, .. }
            | JoystickEvent::BatteryLevel { instance_id, .. } => instance_id,
        }
    }

    /// Timestamp for input events; `None` for add/remove.
    pub fn timestamp(&self) -> Option<u64> {
        match *self {
            JoystickEvent::DeviceAdded { .. } | JoystickEvent::DeviceRemoved { .. } => None,
            JoystickEvent::AxisMoved { timestamp, .. }
            | JoystickEvent::ButtonChanged { timestamp, .. }
            | JoystickEvent::HatChanged { timestamp, .. }
            | JoystickEvent::BatteryLevel { timestamp, .. } => Some(timestamp),
        }
    }

    /// `true` for [`DeviceAdded`](Self::DeviceAdded) / [`DeviceRemoved`](Self::DeviceRemoved).
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            JoystickEvent::DeviceAdded { .. } | JoystickEvent::DeviceRemoved { .. }
        )
    }
}

/// Category of an input channel on a device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ChannelKind {
    Axis,
    Button,
    Hat,
}

/// Describes a channel exposed by an opened device.
///
/// `idx` matches the indices carried by [`JoystickEvent`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChannelDesc {
    pub kind: ChannelKind,
    pub idx: u8,
    /// Short name (e.g. `"LX"`, `"A"`, `"DPad"`).
    pub name: &'static str,
    pub logical_min: i32,
    pub logical_max: i32,
}
