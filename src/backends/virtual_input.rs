//! In-process GameInput.
//!
//! [`VirtualGameInput`] implements the platform traits without hardware so the
//! driver can be exercised in tests, demos, and on machines without GameInput.
//! Devices are plugged and unplugged explicitly; each plug/unplug fires the
//! registered callbacks synchronously on the calling thread, just as the real
//! platform would fire them on one of its own.
//!
//! ```
//! use gameinput_joystick::backends::virtual_input::{VirtualDevice, VirtualGameInput};
//! use gameinput_joystick::platform::GamepadState;
//!
//! let platform = VirtualGameInput::new();
//! let pad = platform.plug(VirtualDevice::new(0x045E, 0x0B13));
//! pad.feed(1_000, GamepadState::default());
//! ```

use crate::platform::{
    status, CallbackToken, DeviceCallback, DeviceHandle, DeviceInfo, EnumerationKind,
    GameInput, GameInputDevice, GameInputReading, GamepadState, RumbleParams, Version,
    APP_LOCAL_DEVICE_ID_SIZE,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// `E_NOTIMPL`, returned when no reading is available.
pub const E_NOTIMPL: i32 = 0x8000_4001_u32 as i32;
/// `GAMEINPUT_E_READING_NOT_FOUND`.
pub const E_READING_NOT_FOUND: i32 = 0x838A_0003_u32 as i32;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while holding one of these locks leaves plain data behind.
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Reading injected into a virtual device.
#[derive(Clone, Copy, Debug)]
enum Injected {
    Gamepad { timestamp: u64, state: GamepadState },
    Garbage { timestamp: u64 },
}

/// Reading produced by the virtual platform.
#[derive(Clone, Copy, Debug)]
pub struct VirtualReading {
    timestamp: u64,
    state: Option<GamepadState>,
}

impl GameInputReading for VirtualReading {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn gamepad_state(&self) -> Option<GamepadState> {
        self.state
    }
}

/// A simulated controller.
pub struct VirtualDevice {
    info: Option<DeviceInfo>,
    status: AtomicU32,
    reading: Mutex<Option<Injected>>,
    rumble: Mutex<Vec<RumbleParams>>,
}

static NEXT_DEVICE_SERIAL: AtomicU64 = AtomicU64::new(1);

impl VirtualDevice {
    /// Wired controller with a unique device id and no rumble motors.
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        let serial = NEXT_DEVICE_SERIAL.fetch_add(1, Ordering::Relaxed);
        let mut device_id = [0u8; APP_LOCAL_DEVICE_ID_SIZE];
        device_id[..8].copy_from_slice(&serial.to_be_bytes());
        device_id[8..10].copy_from_slice(&vendor_id.to_be_bytes());
        device_id[10..12].copy_from_slice(&product_id.to_be_bytes());

        Self {
            info: Some(DeviceInfo {
                device_id,
                vendor_id,
                product_id,
                firmware_version: Version::default(),
                capabilities: 0,
                supported_rumble_motors: 0,
            }),
            status: AtomicU32::new(status::NONE),
            reading: Mutex::new(None),
            rumble: Mutex::new(Vec::new()),
        }
    }

    fn info_mut(&mut self) -> Option<&mut DeviceInfo> {
        self.info.as_mut()
    }

    /// Add the given capability bits.
    pub fn with_capabilities(mut self, bits: u32) -> Self {
        if let Some(info) = self.info_mut() {
            info.capabilities |= bits;
        }
        self
    }

    /// Set the supported rumble motor bits.
    pub fn with_rumble_motors(mut self, bits: u32) -> Self {
        if let Some(info) = self.info_mut() {
            info.supported_rumble_motors = bits;
        }
        self
    }

    pub fn with_firmware(mut self, major: u16, minor: u16) -> Self {
        if let Some(info) = self.info_mut() {
            info.firmware_version.major = major;
            info.firmware_version.minor = minor;
        }
        self
    }

    pub fn with_device_id(mut self, device_id: [u8; APP_LOCAL_DEVICE_ID_SIZE]) -> Self {
        if let Some(info) = self.info_mut() {
            info.device_id = device_id;
        }
        self
    }

    /// Make `GetDeviceInfo` fail for this device.
    pub fn without_info(mut self) -> Self {
        self.info = None;
        self
    }

    /// Make `state` the current reading, stamped `timestamp_us`.
    pub fn feed(&self, timestamp_us: u64, state: GamepadState) {
        *lock(&self.reading) = Some(Injected::Gamepad {
            timestamp: timestamp_us,
            state,
        });
    }

    /// Make the current reading one without a gamepad payload.
    pub fn feed_undecodable(&self, timestamp_us: u64) {
        *lock(&self.reading) = Some(Injected::Garbage {
            timestamp: timestamp_us,
        });
    }

    /// Drop the current reading.
    pub fn clear_reading(&self) {
        *lock(&self.reading) = None;
    }

    fn current_reading(&self) -> Option<VirtualReading> {
        let injected = *lock(&self.reading);
        injected.map(|injected| match injected {
            Injected::Gamepad { timestamp, state } => VirtualReading {
                timestamp,
                state: Some(state),
            },
            Injected::Garbage { timestamp } => VirtualReading {
                timestamp,
                state: None,
            },
        })
    }

    /// Change the live status without firing callbacks, as when a device
    /// drops off between notifications.
    pub fn set_status(&self, bits: u32) {
        self.status.store(bits, Ordering::SeqCst);
    }

    /// Every rumble record submitted so far, oldest first.
    pub fn rumble_history(&self) -> Vec<RumbleParams> {
        lock(&self.rumble).clone()
    }

    pub fn last_rumble(&self) -> Option<RumbleParams> {
        lock(&self.rumble).last().copied()
    }
}

impl GameInputDevice for VirtualDevice {
    fn device_info(&self) -> Option<DeviceInfo> {
        self.info.clone()
    }

    fn device_status(&self) -> u32 {
        self.status.load(Ordering::SeqCst)
    }

    fn set_rumble_state(&self, params: &RumbleParams) {
        lock(&self.rumble).push(*params);
    }
}

struct Registration {
    kind: u32,
    status_filter: u32,
    callback: DeviceCallback,
}

#[derive(Default)]
struct PlatformState {
    devices: Vec<Arc<VirtualDevice>>,
    callbacks: BTreeMap<u64, Registration>,
    next_token: u64,
    registration_error: Option<i32>,
    refuse_unregister: bool,
    last_unregister_timeout: Option<Duration>,
    clock_us: u64,
}

/// Simulated `IGameInput`.
///
/// Every virtual device is a gamepad.
#[derive(Default)]
pub struct VirtualGameInput {
    state: Mutex<PlatformState>,
}

impl VirtualGameInput {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every subsequent `RegisterDeviceCallback` fail with `hresult`.
    pub fn fail_registration(&self, hresult: i32) {
        lock(&self.state).registration_error = Some(hresult);
    }

    /// Make every subsequent `UnregisterCallback` miss its deadline. The
    /// callback stays registered, as it would if the platform were still
    /// running it.
    pub fn fail_unregister(&self) {
        lock(&self.state).refuse_unregister = true;
    }

    /// Timeout passed to the most recent `UnregisterCallback`.
    pub fn last_unregister_timeout(&self) -> Option<Duration> {
        lock(&self.state).last_unregister_timeout
    }

    /// Connect a device and notify every matching callback.
    pub fn plug(&self, device: VirtualDevice) -> Arc<VirtualDevice> {
        let device = Arc::new(device);
        device.set_status(status::CONNECTED);

        let (callbacks, ts) = {
            let mut st = lock(&self.state);
            st.devices.push(Arc::clone(&device));
            st.clock_us += 1;
            (Self::matching(&st, status::CONNECTED), st.clock_us)
        };

        let handle: DeviceHandle = device.clone();
        for cb in callbacks {
            cb(Some(&handle), ts, status::CONNECTED, status::NONE);
        }
        device
    }

    /// Disconnect a device and notify every registered callback.
    ///
    /// The platform drops its own reference; the caller keeps theirs.
    pub fn unplug(&self, device: &Arc<VirtualDevice>) {
        device.set_status(status::NONE);

        let (callbacks, ts) = {
            let mut st = lock(&self.state);
            st.devices.retain(|d| !Arc::ptr_eq(d, device));
            st.clock_us += 1;
            let all: Vec<DeviceCallback> =
                st.callbacks.values().map(|r| Arc::clone(&r.callback)).collect();
            (all, st.clock_us)
        };

        let handle: DeviceHandle = device.clone();
        for cb in callbacks {
            cb(Some(&handle), ts, status::NONE, status::CONNECTED);
        }
    }

    /// Fire a notification with a null device, as a misbehaving platform might.
    pub fn notify_null(&self, current_status: u32) {
        let callbacks: Vec<DeviceCallback> = lock(&self.state)
            .callbacks
            .values()
            .map(|r| Arc::clone(&r.callback))
            .collect();
        for cb in callbacks {
            cb(None, 0, current_status, status::NONE);
        }
    }

    /// Devices currently connected.
    pub fn connected(&self) -> usize {
        lock(&self.state).devices.len()
    }

    /// Registered callbacks.
    pub fn callback_count(&self) -> usize {
        lock(&self.state).callbacks.len()
    }

    fn matching(st: &PlatformState, device_status: u32) -> Vec<DeviceCallback> {
        st.callbacks
            .values()
            .filter(|r| r.kind & crate::platform::kind::GAMEPAD != 0)
            .filter(|r| r.status_filter == 0 || r.status_filter & device_status != 0)
            .map(|r| Arc::clone(&r.callback))
            .collect()
    }

    fn find(&self, device: &DeviceHandle) -> Option<Arc<VirtualDevice>> {
        lock(&self.state)
            .devices
            .iter()
            .find(|d| std::ptr::addr_eq(Arc::as_ptr(*d), Arc::as_ptr(device)))
            .cloned()
    }
}

impl GameInput for VirtualGameInput {
    fn register_device_callback(
        &self,
        kind: u32,
        status_filter: u32,
        enumeration: EnumerationKind,
        callback: DeviceCallback,
    ) -> Result<CallbackToken, i32> {
        let (token, existing, ts) = {
            let mut st = lock(&self.state);
            if let Some(hr) = st.registration_error {
                return Err(hr);
            }
            let token = st.next_token;
            st.next_token += 1;
            st.callbacks.insert(
                token,
                Registration {
                    kind,
                    status_filter,
                    callback: Arc::clone(&callback),
                },
            );
            (token, st.devices.clone(), st.clock_us)
        };

        match enumeration {
            EnumerationKind::None => {}
            EnumerationKind::Blocking => {
                for device in existing {
                    let handle: DeviceHandle = device;
                    callback(Some(&handle), ts, status::CONNECTED, status::NONE);
                }
            }
            EnumerationKind::Async => {
                std::thread::spawn(move || {
                    for device in existing {
                        let handle: DeviceHandle = device;
                        callback(Some(&handle), ts, status::CONNECTED, status::NONE);
                    }
                });
            }
        }

        Ok(CallbackToken(token))
    }

    fn unregister_callback(&self, token: CallbackToken, timeout: Duration) -> bool {
        let mut st = lock(&self.state);
        st.last_unregister_timeout = Some(timeout);
        if st.refuse_unregister {
            return false;
        }
        st.callbacks.remove(&token.0).is_some()
    }

    fn current_reading(
        &self,
        _kind: u32,
        device: &DeviceHandle,
    ) -> Result<Box<dyn GameInputReading>, i32> {
        let device = self.find(device).ok_or(E_NOTIMPL)?;
        match device.current_reading() {
            Some(reading) => Ok(Box::new(reading)),
            None => Err(E_READING_NOT_FOUND),
        }
    }
}
