//! Opened-device sessions.
//!
//! A [`DeviceSession`] exists between `open` and `close` of one registry entry.
//! It keeps its own counted reference to the platform device, the persistent
//! rumble record, and the timestamp of the last translated reading. It never
//! owns or mutates the registry entry.

use crate::error::{Error, Result};
use crate::event::{ChannelDesc, ChannelKind, InstanceId};
use crate::platform::{DeviceHandle, RumbleParams};
use crate::translate::{AXIS_COUNT, BUTTON_COUNT, HAT_COUNT};

/// Shape and optional features reported when a device is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub axes: u8,
    pub buttons: u8,
    pub hats: u8,
    /// Low/high frequency rumble.
    pub rumble: bool,
    pub trigger_rumble: bool,
}

/// Runtime state of one opened device.
pub struct DeviceSession {
    instance_id: InstanceId,
    device: DeviceHandle,
    capabilities: Capabilities,
    rumble: RumbleParams,
    pub(crate) last_timestamp: u64,
}

#[inline]
fn normalize_u16(value: u16) -> f32 {
    value as f32 / u16::MAX as f32
}

impl DeviceSession {
    pub(crate) fn new(instance_id: InstanceId, device: DeviceHandle, rumble: bool, trigger_rumble: bool) -> Self {
        Self {
            instance_id,
            device,
            capabilities: Capabilities {
                axes: AXIS_COUNT,
                buttons: BUTTON_COUNT,
                hats: HAT_COUNT,
                rumble,
                trigger_rumble,
            },
            rumble: RumbleParams::default(),
            last_timestamp: 0,
        }
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    pub fn device(&self) -> &DeviceHandle {
        &self.device
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Rumble record as last submitted.
    pub fn rumble_params(&self) -> RumbleParams {
        self.rumble
    }

    /// Converted timestamp of the last translated reading (`0` before the first).
    pub fn last_timestamp(&self) -> u64 {
        self.last_timestamp
    }

    /// Set the low/high frequency motors; trigger motors keep their values.
    ///
    /// Submitted without a capability check: the platform silently ignores
    /// motors a device lacks and reports nothing back.
    pub fn rumble(&mut self, low_frequency: u16, high_frequency: u16) -> Result<()> {
        self.rumble.low_frequency = normalize_u16(low_frequency);
        self.rumble.high_frequency = normalize_u16(high_frequency);
        self.device.set_rumble_state(&self.rumble);
        Ok(())
    }

    /// Set the trigger motors; low/high frequency motors keep their values.
    pub fn rumble_triggers(&mut self, left: u16, right: u16) -> Result<()> {
        self.rumble.left_trigger = normalize_u16(left);
        self.rumble.right_trigger = normalize_u16(right);
        self.device.set_rumble_state(&self.rumble);
        Ok(())
    }

    pub fn set_led(&mut self, _red: u8, _green: u8, _blue: u8) -> Result<()> {
        Err(Error::Unsupported("LED control"))
    }

    pub fn send_effect(&mut self, _data: &[u8]) -> Result<()> {
        Err(Error::Unsupported("sending effects"))
    }

    /// No sensors to configure; always succeeds.
    pub fn set_sensors_enabled(&mut self, _enabled: bool) -> Result<()> {
        Ok(())
    }

    /// Channel map matching the events produced by the translator.
    pub fn describe(&self) -> Vec<ChannelDesc> {
        const AXIS_NAMES: [&str; AXIS_COUNT as usize] = ["LX", "LY", "LT", "RX", "RY", "RT"];
        const BUTTON_NAMES: [&str; BUTTON_COUNT as usize] = [
            "A", "B", "X", "Y", "LB", "RB", "View", "Menu", "LThumb", "RThumb", "Guide",
        ];

        let mut out = Vec::with_capacity(AXIS_NAMES.len() + BUTTON_NAMES.len() + 1);

        for (i, &name) in AXIS_NAMES.iter().enumerate() {
            let is_trigger = name.ends_with('T');
            out.push(ChannelDesc {
                kind: ChannelKind::Axis,
                idx: i as u8,
                name,
                logical_min: if is_trigger { 0 } else { i16::MIN as i32 },
                logical_max: i16::MAX as i32,
            });
        }

        for (i, &name) in BUTTON_NAMES.iter().enumerate() {
            out.push(ChannelDesc {
                kind: ChannelKind::Button,
                idx: i as u8,
                name,
                logical_min: 0,
                logical_max: 1,
            });
        }

        out.push(ChannelDesc {
            kind: ChannelKind::Hat,
            idx: 0,
            name: "DPad",
            logical_min: 0,
            logical_max: 0x0F,
        });

        out
    }

    /// End the session, releasing its device reference.
    pub fn close(self) {
        log::debug!("session: closed instance={}", self.instance_id);
    }
}
