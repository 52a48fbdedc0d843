//! Device metadata snapshot.
//!
//! [`DeviceMeta`] is a lightweight, cloneable description of a tracked device
//! suitable for UI display, logging, and diagnostics dumps. It is built from a
//! registry entry on demand and does not hold the platform handle.
//!
//! # Conventions
//! - `bus` is a short, human-readable bus hint: `"usb"` or `"bluetooth"`.
//! - `path` is the device id rendered as uppercase hex pairs. It is stable for
//!   a device on this machine but means nothing elsewhere.
//! - `guid` serializes as 32 lowercase hex characters.

use crate::event::InstanceId;
use crate::guid::{JoystickGuid, HARDWARE_BUS_BLUETOOTH};
use serde::Serialize;

/// Snapshot of metadata describing a single tracked device.
#[derive(Clone, Debug, Serialize)]
pub struct DeviceMeta {
    pub instance_id: InstanceId,
    pub name: String,
    pub path: String,
    pub bus: &'static str,
    pub vid: u16,
    pub pid: u16,
    pub guid: JoystickGuid,
    pub player_index: Option<i32>,
    pub rumble: bool,
    pub trigger_rumble: bool,
}

/// Short bus label for a GUID bus word.
pub fn bus_label(bus: u16) -> &'static str {
    if bus == HARDWARE_BUS_BLUETOOTH {
        "bluetooth"
    } else {
        "usb"
    }
}
