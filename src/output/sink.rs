//! Trait abstraction for synthesized input so the control engine can be
//! tested without a uinput device.

use evdev::Key;

use crate::error::Result;
use crate::keys::KeyStroke;

/// Destination for keyboard and mouse events produced by the engine.
///
/// Implementations own modifier handling: on press the modifiers of the
/// stroke go down before the key, on release they come up after it.
#[cfg_attr(test, mockall::automock)]
pub trait InputSink {
    /// Press or release a key together with its modifiers.
    fn emit_key(&mut self, stroke: KeyStroke, pressed: bool) -> Result<()>;

    /// Move the pointer by a relative amount.
    fn emit_mouse_motion(&mut self, dx: i32, dy: i32) -> Result<()>;
}

/// Presses and releases `stroke`.
///
/// # Errors
///
/// Returns the first error reported by the sink.
pub fn tap(sink: &mut dyn InputSink, stroke: KeyStroke) -> Result<()> {
    sink.emit_key(stroke, true)?;
    sink.emit_key(stroke, false)
}

/// Presses and releases an unmodified key.
///
/// # Errors
///
/// Returns the first error reported by the sink.
pub fn tap_key(sink: &mut dyn InputSink, key: Key) -> Result<()> {
    tap(sink, KeyStroke::plain(key))
}
