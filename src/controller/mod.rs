//! # Controller Module
//!
//! Physical gamepad input.
//!
//! This module handles:
//! - Gamepad discovery and reading via evdev
//! - Mapping raw events to buttons and normalised axes
//! - Deadzone algorithms for stick mouse motion
//! - Mouse motion pacing from sticks and d-pad

pub mod deadzone;
pub mod device;
pub mod events;
pub mod mouse;

pub use device::Controller;
pub use events::{Axis, ControllerEvent, EventMapper};
