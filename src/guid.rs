//! Joystick GUIDs.
//!
//! The generic joystick layer identifies device models by a 16-byte GUID.
//! Layout (all 16-bit words little-endian):
//!
//! | bytes  | content                                   |
//! |--------|-------------------------------------------|
//! | 0..2   | bus type                                  |
//! | 2..4   | CRC-16 of `"<vendor name> <product name>"` |
//! | 4..6   | vendor id                                 |
//! | 8..10  | product id                                |
//! | 12..14 | version                                   |
//! | 14     | driver signature                          |
//! | 15     | driver data                               |
//!
//! When the vendor id is zero the product name is copied in after the CRC instead.

use serde::{Serialize, Serializer};
use std::fmt;

/// USB-class hardware bus.
pub const HARDWARE_BUS_USB: u16 = 0x03;
/// Bluetooth-class hardware bus.
pub const HARDWARE_BUS_BLUETOOTH: u16 = 0x05;

/// 128-bit joystick model identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct JoystickGuid(pub [u8; 16]);

impl JoystickGuid {
    /// Synthesize a GUID from device identity.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        bus: u16,
        vendor: u16,
        product: u16,
        version: u16,
        vendor_name: &str,
        product_name: &str,
        driver_signature: u8,
        driver_data: u8,
    ) -> Self {
        let mut data = [0u8; 16];

        let crc = if !vendor_name.is_empty() && !product_name.is_empty() {
            let crc = crc16(0, vendor_name.as_bytes());
            let crc = crc16(crc, b" ");
            crc16(crc, product_name.as_bytes())
        } else {
            crc16(0, product_name.as_bytes())
        };

        data[0..2].copy_from_slice(&bus.to_le_bytes());
        data[2..4].copy_from_slice(&crc.to_le_bytes());

        if vendor != 0 {
            data[4..6].copy_from_slice(&vendor.to_le_bytes());
            data[8..10].copy_from_slice(&product.to_le_bytes());
            data[12..14].copy_from_slice(&version.to_le_bytes());
            data[14] = driver_signature;
            data[15] = driver_data;
        } else {
            // Name bytes, leaving room for a terminator.
            let mut available = data.len() - 4;
            if driver_signature != 0 {
                available -= 2;
                data[14] = driver_signature;
                data[15] = driver_data;
            }
            let name = product_name.as_bytes();
            let n = name.len().min(available.saturating_sub(1));
            data[4..4 + n].copy_from_slice(&name[..n]);
        }

        JoystickGuid(data)
    }

    #[inline]
    pub fn bus(&self) -> u16 {
        u16::from_le_bytes([self.0[0], self.0[1]])
    }

    #[inline]
    pub fn vendor(&self) -> u16 {
        u16::from_le_bytes([self.0[4], self.0[5]])
    }

    #[inline]
    pub fn product(&self) -> u16 {
        u16::from_le_bytes([self.0[8], self.0[9]])
    }

    #[inline]
    pub fn version(&self) -> u16 {
        u16::from_le_bytes([self.0[12], self.0[13]])
    }
}

impl fmt::Display for JoystickGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl Serialize for JoystickGuid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// CRC-16/ARC (reflected 0xA001), continuing from `crc`.
pub fn crc16(mut crc: u16, data: &[u8]) -> u16 {
    for &byte in data {
        crc = crc16_for_byte((crc as u8) ^ byte) ^ (crc >> 8);
    }
    crc
}

fn crc16_for_byte(mut r: u8) -> u16 {
    let mut crc: u16 = 0;
    for _ in 0..8 {
        crc = (if (crc ^ r as u16) & 1 != 0 { 0xA001 } else { 0 }) ^ (crc >> 1);
        r >>= 1;
    }
    crc
}
