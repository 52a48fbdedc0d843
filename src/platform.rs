//! Platform capability provider.
//!
//! The driver talks to GameInput exclusively through the traits in this module.
//! A production build wires them to the real `IGameInput` COM objects; the
//! [`virtual_input`](crate::backends::virtual_input) backend implements them
//! in-process for tests and demos.
//!
//! # Handles and reference counting
//! A [`DeviceHandle`] is an `Arc<dyn GameInputDevice>`. Cloning it is the
//! `AddRef`, dropping it is the `Release`; every acquisition is paired with
//! exactly one release by construction. Identity comparisons go through
//! [`same_device`], never through the device contents.
//!
//! # Threading
//! Device callbacks may fire on any thread, so every trait here is
//! `Send + Sync`.

use std::sync::Arc;
use std::time::Duration;

/// Size of the opaque per-device identifier (`APP_LOCAL_DEVICE_ID`).
pub const APP_LOCAL_DEVICE_ID_SIZE: usize = 32;

/// Shared, reference-counted handle to a platform device object.
pub type DeviceHandle = Arc<dyn GameInputDevice>;

/// Token identifying a registered device callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallbackToken(pub u64);

/// `GameInputKind` bits.
pub mod kind {
    pub const GAMEPAD: u32 = 0x0004_0000;
}

/// `GameInputDeviceStatus` bits.
pub mod status {
    pub const NONE: u32 = 0x0000_0000;
    pub const CONNECTED: u32 = 0x0000_0001;
    pub const INPUT_ENABLED: u32 = 0x0000_0002;
}

/// `GameInputDeviceCapabilities` bits.
pub mod capability {
    pub const NONE: u32 = 0x0000_0000;
    pub const AUDIO: u32 = 0x0000_0001;
    pub const PLUGIN_MODULE: u32 = 0x0000_0002;
    pub const POWER_OFF: u32 = 0x0000_0004;
    pub const SYNCHRONIZATION: u32 = 0x0000_0008;
    pub const WIRELESS: u32 = 0x0000_0010;
}

/// `GameInputRumbleMotors` bits.
pub mod rumble_motor {
    pub const NONE: u32 = 0x0000_0000;
    pub const LOW_FREQUENCY: u32 = 0x0000_0001;
    pub const HIGH_FREQUENCY: u32 = 0x0000_0002;
    pub const LEFT_TRIGGER: u32 = 0x0000_0004;
    pub const RIGHT_TRIGGER: u32 = 0x0000_0008;
}

/// `GameInputGamepadButtons` bits.
pub mod gamepad_button {
    pub const NONE: u32 = 0x0000_0000;
    pub const MENU: u32 = 0x0000_0001;
    pub const VIEW: u32 = 0x0000_0002;
    pub const A: u32 = 0x0000_0004;
    pub const B: u32 = 0x0000_0008;
    pub const X: u32 = 0x0000_0010;
    pub const Y: u32 = 0x0000_0020;
    pub const DPAD_UP: u32 = 0x0000_0040;
    pub const DPAD_DOWN: u32 = 0x0000_0080;
    pub const DPAD_LEFT: u32 = 0x0000_0100;
    pub const DPAD_RIGHT: u32 = 0x0000_0200;
    pub const LEFT_SHOULDER: u32 = 0x0000_0400;
    pub const RIGHT_SHOULDER: u32 = 0x0000_0800;
    pub const LEFT_THUMBSTICK: u32 = 0x0000_1000;
    pub const RIGHT_THUMBSTICK: u32 = 0x0000_2000;
}

/// How `RegisterDeviceCallback` enumerates already-connected devices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnumerationKind {
    /// No initial enumeration.
    None,
    /// Initial enumeration runs on a platform thread.
    Async,
    /// Initial enumeration runs synchronously inside the registration call.
    Blocking,
}

/// Firmware version as reported by the device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub build: u16,
    pub revision: u16,
}

/// Identity and capability data returned by `GetDeviceInfo`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device_id: [u8; APP_LOCAL_DEVICE_ID_SIZE],
    pub vendor_id: u16,
    pub product_id: u16,
    pub firmware_version: Version,
    /// [`capability`] bits.
    pub capabilities: u32,
    /// [`rumble_motor`] bits.
    pub supported_rumble_motors: u32,
}

/// Decoded gamepad payload of a reading.
///
/// Sticks are normalized to `[-1.0, 1.0]`, triggers to `[0.0, 1.0]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GamepadState {
    /// [`gamepad_button`] bits.
    pub buttons: u32,
    pub left_trigger: f32,
    pub right_trigger: f32,
    pub left_thumbstick_x: f32,
    pub left_thumbstick_y: f32,
    pub right_thumbstick_x: f32,
    pub right_thumbstick_y: f32,
}

/// Rumble motor intensities in `[0.0, 1.0]` (`GameInputRumbleParams`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RumbleParams {
    pub low_frequency: f32,
    pub high_frequency: f32,
    pub left_trigger: f32,
    pub right_trigger: f32,
}

/// Device connection callback.
///
/// Arguments: device (may be `None` if the platform misbehaves), timestamp in
/// microseconds, current status bits, previous status bits.
pub type DeviceCallback = Arc<dyn Fn(Option<&DeviceHandle>, u64, u32, u32) + Send + Sync>;

/// `IGameInputDevice`.
pub trait GameInputDevice: Send + Sync {
    /// Identity/capability data, or `None` if the platform cannot provide it.
    fn device_info(&self) -> Option<DeviceInfo>;

    /// Live [`status`] bits.
    fn device_status(&self) -> u32;

    /// Submit a rumble record. The platform reports no result.
    fn set_rumble_state(&self, params: &RumbleParams);
}

/// `IGameInputReading`.
pub trait GameInputReading {
    /// Hardware timestamp in microseconds.
    fn timestamp(&self) -> u64;

    /// Decoded gamepad payload, or `None` if the reading holds no gamepad data.
    fn gamepad_state(&self) -> Option<GamepadState>;
}

/// `IGameInput`.
pub trait GameInput: Send + Sync {
    /// Register `callback` for devices of `kind` whose status matches `status_filter`.
    ///
    /// With [`EnumerationKind::Blocking`] the callback is invoked for every
    /// matching device before this returns. Errors carry the native HRESULT.
    fn register_device_callback(
        &self,
        kind: u32,
        status_filter: u32,
        enumeration: EnumerationKind,
        callback: DeviceCallback,
    ) -> std::result::Result<CallbackToken, i32>;

    /// Unregister a callback, waiting at most `timeout` for in-flight
    /// invocations. Returns `false` if the wait timed out.
    fn unregister_callback(&self, token: CallbackToken, timeout: Duration) -> bool;

    /// Latest reading of `kind` for `device`. Errors carry the native HRESULT;
    /// "no reading yet" is reported as an error too.
    fn current_reading(
        &self,
        kind: u32,
        device: &DeviceHandle,
    ) -> std::result::Result<Box<dyn GameInputReading>, i32>;
}

/// `true` if both handles refer to the same platform object.
#[inline]
pub fn same_device(a: &DeviceHandle, b: &DeviceHandle) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
