//! GameInput gamepad backend for a generic joystick layer.
//!
//! Discovers gamepads through GameInput, keeps a live registry of connected
//! devices under asynchronous hotplug, and translates each opened device's
//! per-tick reading into normalized axis/button/hat/battery events.
//!
//! The entry point is [`GameInputDriver`]. The platform itself is abstracted by
//! the traits in [`platform`]; events leave through a [`JoystickSink`].

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod backends;
pub mod config;
pub mod error;
pub mod event;
pub mod guid;
pub mod hotplug;
pub mod manager;
pub mod metadata;
pub mod platform;
pub mod registry;
pub mod session;
pub mod sink;
pub mod translate;

pub use config::*;
pub use error::{Error, Result};
pub use event::*;
pub use guid::JoystickGuid;
pub use manager::*;
pub use metadata::DeviceMeta;
pub use session::*;
pub use sink::*;
