//! Driver configuration.
//!
//! Everything has a sensible default; a TOML file only needs the keys it
//! wants to change:
//!
//! ```toml
//! unregister_timeout_us = 20000
//! device_name = "Xbox Controller"
//!
//! [[always_present]]
//! vendor = 0x046D
//! product = 0xC21D
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Microsoft's USB vendor id.
pub const USB_VENDOR_MICROSOFT: u16 = 0x045E;
/// Raw-input id of the Xbox One controller on the GIP stack; always
/// reported present.
pub const USB_PRODUCT_XBOX_ONE_XBOXGIP_CONTROLLER: u16 = 0x02FF;

/// Vendor/product pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VidPid {
    pub vendor: u16,
    pub product: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// How long shutdown waits for the device callback to unregister.
    pub unregister_timeout_us: u64,
    /// Name reported for every device.
    pub device_name: String,
    /// Extra devices the presence check claims, tracked or not. The Xbox One
    /// GIP controller is claimed regardless.
    pub always_present: Vec<VidPid>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            unregister_timeout_us: 10_000,
            device_name: "GameInput Gamepad".to_string(),
            always_present: Vec::new(),
        }
    }
}

impl DriverConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        log::info!("Loaded driver config from {:?}", path);
        Ok(config)
    }

    pub fn unregister_timeout(&self) -> Duration {
        Duration::from_micros(self.unregister_timeout_us)
    }
}
