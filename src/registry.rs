//! Device registry.
//!
//! Ordered collection of every controller the platform has told us about.
//! Membership changes only on the poll thread (see [`hotplug`](crate::hotplug)),
//! so the registry itself carries no locking.
//!
//! Lookups are by index or by handle identity. Order is insertion order and is
//! preserved when entries are removed; linear scans are fine for the handful
//! of controllers a machine realistically has.

use crate::error::{Error, Result};
use crate::event::InstanceId;
use crate::guid::{JoystickGuid, HARDWARE_BUS_BLUETOOTH, HARDWARE_BUS_USB};
use crate::metadata::{bus_label, DeviceMeta};
use crate::platform::{capability, rumble_motor, same_device, DeviceHandle};
use std::fmt;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU32, Ordering};

/// Vendor half of the GUID name CRC.
const GUID_VENDOR_NAME: &str = "GameInput";
/// Product half of the GUID name CRC.
const GUID_PRODUCT_NAME: &str = "Gamepad";
/// Driver signature byte stamped into every GUID from this backend.
const GUID_DRIVER_SIGNATURE: u8 = b'g';

static NEXT_INSTANCE_ID: AtomicU32 = AtomicU32::new(1);

/// Allocate a process-unique instance id. Zero is never handed out.
pub fn next_instance_id() -> InstanceId {
    InstanceId(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
}

/// Render a device id as uppercase hex pairs with no separator.
pub fn device_path(device_id: &[u8]) -> String {
    let mut path = String::with_capacity(device_id.len() * 2);
    for b in device_id {
        let _ = write!(path, "{:02X}", b);
    }
    path
}

/// One physical controller known to the registry.
///
/// Holds one counted reference on the platform device for as long as it lives.
pub struct TrackedDevice {
    device: DeviceHandle,
    path: String,
    name: String,
    vendor: u16,
    product: u16,
    guid: JoystickGuid,
    instance_id: InstanceId,
    supported_rumble_motors: u32,
    pub(crate) player_index: Option<i32>,
    /// The sink has seen `DeviceAdded` for this entry.
    pub(crate) announced: bool,
    /// A disconnect notification arrived; drop on the next detection pass.
    pub(crate) removal_requested: bool,
}

impl TrackedDevice {
    pub fn device(&self) -> &DeviceHandle {
        &self.device
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vendor(&self) -> u16 {
        self.vendor
    }

    pub fn product(&self) -> u16 {
        self.product
    }

    pub fn guid(&self) -> JoystickGuid {
        self.guid
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    pub fn supported_rumble_motors(&self) -> u32 {
        self.supported_rumble_motors
    }

    pub fn player_index(&self) -> Option<i32> {
        self.player_index
    }

    pub fn is_announced(&self) -> bool {
        self.announced
    }

    pub fn is_removal_requested(&self) -> bool {
        self.removal_requested
    }

    /// Low/high frequency motors present.
    pub fn has_rumble(&self) -> bool {
        self.supported_rumble_motors & (rumble_motor::LOW_FREQUENCY | rumble_motor::HIGH_FREQUENCY)
            != 0
    }

    /// Trigger motors present.
    pub fn has_trigger_rumble(&self) -> bool {
        self.supported_rumble_motors & (rumble_motor::LEFT_TRIGGER | rumble_motor::RIGHT_TRIGGER)
            != 0
    }

    pub fn meta(&self) -> DeviceMeta {
        DeviceMeta {
            instance_id: self.instance_id,
            name: self.name.clone(),
            path: self.path.clone(),
            bus: bus_label(self.guid.bus()),
            vid: self.vendor,
            pid: self.product,
            guid: self.guid,
            player_index: self.player_index,
            rumble: self.has_rumble(),
            trigger_rumble: self.has_trigger_rumble(),
        }
    }
}

impl fmt::Debug for TrackedDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedDevice")
            .field("instance_id", &self.instance_id)
            .field("vendor", &format_args!("{:#06x}", self.vendor))
            .field("product", &format_args!("{:#06x}", self.product))
            .field("path", &self.path)
            .field("announced", &self.announced)
            .field("removal_requested", &self.removal_requested)
            .finish()
    }
}

/// Ordered, dynamically sized set of tracked devices.
pub struct DeviceRegistry {
    devices: Vec<TrackedDevice>,
    device_name: String,
}

impl DeviceRegistry {
    /// Empty registry; every entry will report `device_name`.
    pub fn new(device_name: impl Into<String>) -> Self {
        Self {
            devices: Vec::new(),
            device_name: device_name.into(),
        }
    }

    /// Index of the entry for `device`, adding one if none exists.
    ///
    /// Idempotent per handle. Fails with [`Error::DeviceInfoUnavailable`] if a
    /// new device cannot be described, or [`Error::OutOfMemory`] if the
    /// registry cannot grow.
    pub fn add_or_find(&mut self, device: &DeviceHandle) -> Result<usize> {
        if let Some(idx) = self.position(device) {
            return Ok(idx);
        }

        let info = device.device_info().ok_or(Error::DeviceInfoUnavailable)?;
        self.devices.try_reserve_exact(1)?;

        let bus = if info.capabilities & capability::WIRELESS != 0 {
            HARDWARE_BUS_BLUETOOTH
        } else {
            HARDWARE_BUS_USB
        };
        let version = (info.firmware_version.major << 8) | info.firmware_version.minor;
        let guid = JoystickGuid::create(
            bus,
            info.vendor_id,
            info.product_id,
            version,
            GUID_VENDOR_NAME,
            GUID_PRODUCT_NAME,
            GUID_DRIVER_SIGNATURE,
            0,
        );

        let entry = TrackedDevice {
            device: DeviceHandle::clone(device),
            path: device_path(&info.device_id),
            name: self.device_name.clone(),
            vendor: info.vendor_id,
            product: info.product_id,
            guid,
            instance_id: next_instance_id(),
            supported_rumble_motors: info.supported_rumble_motors,
            player_index: None,
            announced: false,
            removal_requested: false,
        };

        log::debug!(
            "registry: added vid=0x{:04x} pid=0x{:04x} bus={} path={} instance={}",
            entry.vendor,
            entry.product,
            bus_label(bus),
            entry.path,
            entry.instance_id
        );

        self.devices.push(entry);
        Ok(self.devices.len() - 1)
    }

    /// Drop the entry at `index`, releasing its device reference.
    ///
    /// Later entries shift down by one; storage is released when the registry
    /// becomes empty.
    pub fn remove_by_index(&mut self, index: usize) -> Result<()> {
        if index >= self.devices.len() {
            return Err(Error::IndexOutOfRange {
                index,
                count: self.devices.len(),
            });
        }

        let entry = self.devices.remove(index);
        log::debug!(
            "registry: removed instance={} path={}",
            entry.instance_id,
            entry.path
        );
        drop(entry);

        if self.devices.is_empty() {
            self.devices = Vec::new();
        } else {
            self.devices.shrink_to_fit();
        }
        Ok(())
    }

    /// Entry at `index`, or `None` when out of range.
    pub fn find_by_index(&self, index: usize) -> Option<&TrackedDevice> {
        self.devices.get(index)
    }

    pub fn find_by_index_mut(&mut self, index: usize) -> Option<&mut TrackedDevice> {
        self.devices.get_mut(index)
    }

    /// Index of the entry holding `device`.
    pub fn position(&self, device: &DeviceHandle) -> Option<usize> {
        self.devices
            .iter()
            .position(|entry| same_device(&entry.device, device))
    }

    pub fn count(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Allocated slots. Zero whenever the registry is empty.
    pub fn capacity(&self) -> usize {
        self.devices.capacity()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedDevice> {
        self.devices.iter()
    }

    /// Drop every entry and release the storage.
    pub fn clear(&mut self) {
        self.devices = Vec::new();
    }
}
