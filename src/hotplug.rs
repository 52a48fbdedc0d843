//! Hotplug listener.
//!
//! GameInput reports connect/disconnect from a platform thread. The callback
//! built here never touches the registry: it only pushes a [`HotplugIntent`]
//! into a channel. The detection pass on the poll thread drains the channel
//! and is the only place the registry changes shape.

use crate::error::{Error, Result};
use crate::platform::{status, DeviceCallback, DeviceHandle};
use crate::registry::DeviceRegistry;
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;

/// Pending membership change observed by the callback.
pub enum HotplugIntent {
    Connected(DeviceHandle),
    Disconnected(DeviceHandle),
}

/// Sending half, owned by the platform callback.
#[derive(Clone)]
pub struct HotplugListener {
    tx: Sender<HotplugIntent>,
}

/// Receiving half, owned by the driver.
pub struct HotplugQueue {
    rx: Receiver<HotplugIntent>,
}

/// Create a connected listener/queue pair.
pub fn channel() -> (HotplugListener, HotplugQueue) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (HotplugListener { tx }, HotplugQueue { rx })
}

impl HotplugListener {
    /// Handle one device notification.
    ///
    /// A device whose current status has the connected bit becomes a
    /// `Connected` intent; anything else is a `Disconnected` intent.
    pub fn notify(&self, device: Option<&DeviceHandle>, current_status: u32) -> Result<()> {
        let Some(device) = device else {
            log::warn!("hotplug: notification without a device handle");
            return Err(Error::InvalidHandle);
        };

        let intent = if current_status & status::CONNECTED != 0 {
            log::trace!("hotplug: connected (status=0x{:08x})", current_status);
            HotplugIntent::Connected(DeviceHandle::clone(device))
        } else {
            log::trace!("hotplug: disconnected (status=0x{:08x})", current_status);
            HotplugIntent::Disconnected(DeviceHandle::clone(device))
        };

        // The queue only goes away with the driver; late notifications are dropped.
        let _ = self.tx.send(intent);
        Ok(())
    }

    /// Wrap this listener as a platform device callback.
    pub fn into_callback(self) -> DeviceCallback {
        Arc::new(
            move |device: Option<&DeviceHandle>, _timestamp: u64, current: u32, _previous: u32| {
                let _ = self.notify(device, current);
            },
        )
    }
}

impl HotplugQueue {
    /// Apply every pending intent to `registry`.
    ///
    /// Connects go through `add_or_find`; a connect that fails is logged and
    /// dropped. Disconnects flag the matching entry for removal; unknown
    /// devices are ignored. Returns the number of intents applied.
    ///
    /// A flag is never cleared here: a disconnect followed by a reconnect of
    /// the same handle before the next detection pass still removes the entry.
    pub fn apply(&self, registry: &mut DeviceRegistry) -> usize {
        let mut applied = 0;
        for intent in self.rx.try_iter() {
            applied += 1;
            match intent {
                HotplugIntent::Connected(device) => {
                    if let Err(e) = registry.add_or_find(&device) {
                        log::warn!("hotplug: could not track connected device: {}", e);
                    }
                }
                HotplugIntent::Disconnected(device) => {
                    if let Some(idx) = registry.position(&device) {
                        if let Some(entry) = registry.find_by_index_mut(idx) {
                            entry.removal_requested = true;
                        }
                    }
                }
            }
        }
        applied
    }

    /// Intents waiting to be applied.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Discard pending intents, releasing the handles they hold.
    pub fn clear(&self) {
        for _ in self.rx.try_iter() {}
    }
}
