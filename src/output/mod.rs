//! # Output Module
//!
//! Synthesized input: the sink trait the engine writes to, the uinput
//! keyboard/pointer behind it and the Xbox 360 passthrough pad.

pub mod gamepad;
pub mod keyboard;
pub mod sink;

pub use gamepad::VirtualGamepad;
pub use keyboard::VirtualKeyboard;
pub use sink::InputSink;

/// Prefix shared by this program's own virtual devices.
pub const VIRTUAL_DEVICE_PREFIX: &str = "padmap";
