//! The GameInput joystick driver.
//!
//! [`GameInputDriver`] is the single context object for the backend: it owns
//! the platform handle, the device registry, the hotplug queue, and the
//! callback registration. Whoever initializes it owns it, and every operation
//! goes through it; there is no global state.
//!
//! # Typical loop
//! ```no_run
//! # use std::sync::Arc;
//! # use gameinput_joystick::{DriverConfig, EventLog, GameInputDriver};
//! # fn platform() -> Arc<dyn gameinput_joystick::platform::GameInput> { unimplemented!() }
//! let mut driver = GameInputDriver::init(platform(), DriverConfig::default())?;
//! let mut sink = EventLog::new();
//! driver.detect(&mut sink);
//! let mut session = driver.open(0)?;
//! loop {
//!     driver.detect(&mut sink);
//!     driver.update(&mut session, &mut sink);
//!     # break;
//! }
//! session.close();
//! driver.shutdown();
//! # Ok::<(), gameinput_joystick::Error>(())
//! ```
//!
//! # Threading
//! The driver is used from the poll thread only. The platform callback runs
//! elsewhere and reaches the driver solely through the hotplug queue.

use crate::config::{
    DriverConfig, USB_PRODUCT_XBOX_ONE_XBOXGIP_CONTROLLER, USB_VENDOR_MICROSOFT,
};
use crate::error::{Error, Result};
use crate::event::{InstanceId, JoystickEvent};
use crate::guid::JoystickGuid;
use crate::hotplug::{self, HotplugQueue};
use crate::metadata::DeviceMeta;
use crate::platform::{kind, status, CallbackToken, EnumerationKind, GameInput};
use crate::registry::DeviceRegistry;
use crate::session::DeviceSession;
use crate::sink::JoystickSink;
use crate::translate::{translate, Skip};
use std::sync::Arc;

pub struct GameInputDriver {
    platform: Arc<dyn GameInput>,
    registry: DeviceRegistry,
    queue: HotplugQueue,
    token: Option<CallbackToken>,
    config: DriverConfig,
}

impl GameInputDriver {
    /// Create the platform object through `factory` (the `GameInputCreate`
    /// entry point) and initialize the driver on it.
    pub fn create<F>(factory: F, config: DriverConfig) -> Result<Self>
    where
        F: FnOnce() -> std::result::Result<Arc<dyn GameInput>, i32>,
    {
        let platform = factory().map_err(|hr| Error::platform("GameInputCreate", hr))?;
        Self::init(platform, config)
    }

    /// Register for gamepad connection changes and enumerate what is already
    /// connected.
    ///
    /// Enumeration is blocking, so every connected gamepad is in the registry
    /// when this returns. None of them are announced yet; the first
    /// [`detect`](Self::detect) does that.
    pub fn init(platform: Arc<dyn GameInput>, config: DriverConfig) -> Result<Self> {
        let (listener, queue) = hotplug::channel();

        let token = platform
            .register_device_callback(
                kind::GAMEPAD,
                status::CONNECTED,
                EnumerationKind::Blocking,
                listener.into_callback(),
            )
            .map_err(|hr| Error::platform("IGameInput::RegisterDeviceCallback", hr))?;

        let mut registry = DeviceRegistry::new(config.device_name.clone());
        queue.apply(&mut registry);

        log::info!(
            "GameInput: device callback registered, {} gamepad(s) enumerated",
            registry.count()
        );

        Ok(Self {
            platform,
            registry,
            queue,
            token: Some(token),
            config,
        })
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Read-only view of the tracked devices.
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Number of tracked devices.
    pub fn count(&self) -> usize {
        self.registry.count()
    }

    /// Reconcile the registry with pending hotplug notifications and the live
    /// device status, telling `sink` about every change.
    ///
    /// New entries are announced first; entries flagged for removal, or whose
    /// device no longer reports connected, are then reported removed and
    /// dropped. An entry can be added and removed in the same pass, always in
    /// that order.
    pub fn detect(&mut self, sink: &mut dyn JoystickSink) {
        self.queue.apply(&mut self.registry);

        let mut idx = 0;
        while let Some(entry) = self.registry.find_by_index_mut(idx) {
            let instance_id = entry.instance_id();

            if !entry.announced {
                log::info!(
                    "GameInput: added {} (vid=0x{:04x} pid=0x{:04x})",
                    instance_id,
                    entry.vendor(),
                    entry.product()
                );
                sink.on_event(&JoystickEvent::DeviceAdded { instance_id });
                entry.announced = true;
            }

            let gone = entry.removal_requested
                || entry.device().device_status() & status::CONNECTED == 0;
            if gone {
                log::info!("GameInput: removed {}", instance_id);
                sink.on_event(&JoystickEvent::DeviceRemoved { instance_id });
                if let Err(e) = self.registry.remove_by_index(idx) {
                    log::error!("GameInput: failed to drop {}: {}", instance_id, e);
                    idx += 1;
                }
                // Same index again: the next entry shifted into it.
                continue;
            }

            idx += 1;
        }
    }

    /// `true` if a device with this vendor/product is tracked, or is one of
    /// the always-present ids.
    ///
    /// The Xbox One GIP controller is always claimed; the configured
    /// `always_present` list only adds to it.
    pub fn is_device_present(&self, vendor: u16, product: u16) -> bool {
        if vendor == USB_VENDOR_MICROSOFT && product == USB_PRODUCT_XBOX_ONE_XBOXGIP_CONTROLLER {
            return true;
        }
        if self
            .config
            .always_present
            .iter()
            .any(|id| id.vendor == vendor && id.product == product)
        {
            return true;
        }
        self.registry
            .iter()
            .any(|entry| entry.vendor() == vendor && entry.product() == product)
    }

    pub fn device_name(&self, index: usize) -> Option<&str> {
        self.registry.find_by_index(index).map(|e| e.name())
    }

    /// Device id as uppercase hex, used by association callbacks.
    pub fn device_path(&self, index: usize) -> Option<&str> {
        self.registry.find_by_index(index).map(|e| e.path())
    }

    /// Steam virtual gamepads do not exist here.
    pub fn steam_virtual_gamepad_slot(&self, _index: usize) -> i32 {
        -1
    }

    /// GameInput has no player slots; this is whatever the application assigned.
    pub fn player_index(&self, index: usize) -> Option<i32> {
        self.registry.find_by_index(index).and_then(|e| e.player_index())
    }

    pub fn set_player_index(&mut self, index: usize, player_index: Option<i32>) {
        if let Some(entry) = self.registry.find_by_index_mut(index) {
            entry.player_index = player_index;
        }
    }

    pub fn device_guid(&self, index: usize) -> Option<JoystickGuid> {
        self.registry.find_by_index(index).map(|e| e.guid())
    }

    pub fn device_instance_id(&self, index: usize) -> Option<InstanceId> {
        self.registry.find_by_index(index).map(|e| e.instance_id())
    }

    pub fn device_meta(&self, index: usize) -> Option<DeviceMeta> {
        self.registry.find_by_index(index).map(|e| e.meta())
    }

    /// JSON array describing every tracked device.
    pub fn devices_json(&self) -> serde_json::Result<String> {
        let metas: Vec<DeviceMeta> = self.registry.iter().map(|e| e.meta()).collect();
        serde_json::to_string_pretty(&metas)
    }

    /// There is no mapping database for this backend.
    pub fn gamepad_mapping(&self, _index: usize) -> Result<String> {
        Err(Error::Unsupported("gamepad mapping lookup"))
    }

    /// Open the device at `index`.
    pub fn open(&self, index: usize) -> Result<DeviceSession> {
        let entry = self
            .registry
            .find_by_index(index)
            .ok_or(Error::IndexOutOfRange {
                index,
                count: self.registry.count(),
            })?;

        log::debug!(
            "session: opened instance={} rumble={} trigger_rumble={}",
            entry.instance_id(),
            entry.has_rumble(),
            entry.has_trigger_rumble()
        );

        Ok(DeviceSession::new(
            entry.instance_id(),
            entry.device().clone(),
            entry.has_rumble(),
            entry.has_trigger_rumble(),
        ))
    }

    /// Translate the newest reading for `session` into events.
    ///
    /// Returns the number of events emitted. No reading, a repeated reading,
    /// or an undecodable one all yield zero; none of them is an error.
    pub fn update(&self, session: &mut DeviceSession, sink: &mut dyn JoystickSink) -> usize {
        let reading = match self
            .platform
            .current_reading(kind::GAMEPAD, session.device())
        {
            Ok(reading) => reading,
            Err(hr) => {
                log::trace!(
                    "GameInput: no reading for {} (HRESULT {:08X})",
                    session.instance_id(),
                    hr as u32
                );
                return 0;
            }
        };

        let instance_id = session.instance_id();
        match translate(&*reading, instance_id, &mut session.last_timestamp, sink) {
            Ok(emitted) => emitted,
            Err(Skip::Stale) => 0,
            Err(Skip::Undecodable) => {
                log::trace!("GameInput: undecodable reading for {}", instance_id);
                0
            }
        }
    }

    /// Unregister the callback and release every device and the platform.
    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };

        if !self
            .platform
            .unregister_callback(token, self.config.unregister_timeout())
        {
            log::warn!(
                "GameInput: device callback did not unregister within {:?}",
                self.config.unregister_timeout()
            );
        }

        self.queue.clear();
        self.registry.clear();
        log::info!("GameInput: shut down");
    }
}

impl Drop for GameInputDriver {
    fn drop(&mut self) {
        self.teardown();
    }
}
