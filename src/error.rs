//! Error types.
//!
//! Registry and setup failures surface through [`Error`]. Per-tick translation
//! never produces an error: a missing or undecodable reading is a normal
//! steady-state condition and is skipped silently.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong in the driver.
#[derive(Debug, Error)]
pub enum Error {
    /// The platform handed us a null device handle.
    #[error("device handle cannot be null")]
    InvalidHandle,

    /// A registry index was outside `0..count`.
    #[error("device index {index} is out of range (count = {count})")]
    IndexOutOfRange { index: usize, count: usize },

    /// Growing the registry failed.
    #[error("out of memory")]
    OutOfMemory,

    /// `GetDeviceInfo` returned nothing for a device.
    #[error("device info is unavailable for this device")]
    DeviceInfoUnavailable,

    /// A platform call failed; `code` is the native HRESULT.
    #[error("{operation} failure with HRESULT of {code:08X}")]
    Platform { operation: &'static str, code: u32 },

    /// The platform has no equivalent for this operation.
    #[error("{0} is not supported")]
    Unsupported(&'static str),

    /// Configuration could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Build a [`Error::Platform`] from a signed HRESULT as the platform returns it.
    pub fn platform(operation: &'static str, hresult: i32) -> Self {
        Error::Platform {
            operation,
            code: hresult as u32,
        }
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::OutOfMemory
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_error_renders_hresult_as_hex() {
        let e = Error::platform("GameInputCreate", 0x8000_4005_u32 as i32);
        assert_eq!(
            e.to_string(),
            "GameInputCreate failure with HRESULT of 80004005"
        );
    }

    #[test]
    fn reserve_failure_maps_to_out_of_memory() {
        let mut v: Vec<u64> = Vec::new();
        let err = v.try_reserve_exact(usize::MAX).unwrap_err();
        assert!(matches!(Error::from(err), Error::OutOfMemory));
    }
}
