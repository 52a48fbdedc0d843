//! Platform backends for `gameinput-joystick`.
//!
//! Implementations of the [`platform`](crate::platform) traits.
//!
//! # Feature flags
//! - **`virtual`** (default): [`virtual_input`], an in-process GameInput used by
//!   tests and demos.
//!
//! The real GameInput binding lives with the host application, which owns the
//! `gameinput.dll` load and hands the created `IGameInput` to
//! [`GameInputDriver::create`](crate::manager::GameInputDriver::create).

#[cfg(feature = "virtual")]
#[cfg_attr(docsrs, doc(cfg(feature = "virtual")))]
pub mod virtual_input;
