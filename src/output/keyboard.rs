//! # Virtual Keyboard
//!
//! uinput keyboard and relative pointer used in keyboard/mouse mode.

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key, RelativeAxisType};
use tracing::{debug, info};

use crate::error::{PadmapError, Result};
use crate::keys::KeyStroke;
use crate::output::sink::InputSink;

/// Name reported by the virtual keyboard. Controller discovery skips
/// devices whose name starts with this.
pub const KEYBOARD_NAME: &str = "padmap keyboard";

/// Highest regular key code exposed by the virtual keyboard.
const MAX_KEY_CODE: u16 = 255;

/// Virtual keyboard plus pointer backed by uinput
pub struct VirtualKeyboard {
    device: VirtualDevice,
}

impl VirtualKeyboard {
    /// Create the uinput device
    ///
    /// # Errors
    ///
    /// Returns error if `/dev/uinput` is unavailable or the device cannot
    /// be built.
    pub fn new() -> Result<Self> {
        let mut keys = AttributeSet::<Key>::new();
        for code in 1..=MAX_KEY_CODE {
            keys.insert(Key::new(code));
        }
        keys.insert(Key::BTN_LEFT);
        keys.insert(Key::BTN_RIGHT);
        keys.insert(Key::BTN_MIDDLE);

        let mut axes = AttributeSet::<RelativeAxisType>::new();
        axes.insert(RelativeAxisType::REL_X);
        axes.insert(RelativeAxisType::REL_Y);

        let device = VirtualDeviceBuilder::new()
            .map_err(|e| PadmapError::Output(format!("Failed to open uinput: {}", e)))?
            .name(KEYBOARD_NAME)
            .with_keys(&keys)
            .map_err(|e| PadmapError::Output(format!("Failed to set key capabilities: {}", e)))?
            .with_relative_axes(&axes)
            .map_err(|e| PadmapError::Output(format!("Failed to set pointer axes: {}", e)))?
            .build()
            .map_err(|e| PadmapError::Output(format!("Failed to build keyboard: {}", e)))?;

        info!("Created virtual keyboard '{}'", KEYBOARD_NAME);

        Ok(Self { device })
    }

    fn write(&mut self, events: &[InputEvent]) -> Result<()> {
        self.device.emit(events).map_err(|e| {
            debug!("Failed to write keyboard events: {}", e);
            PadmapError::Output(e.to_string())
        })
    }
}

impl InputSink for VirtualKeyboard {
    fn emit_key(&mut self, stroke: KeyStroke, pressed: bool) -> Result<()> {
        self.write(&key_events(stroke, pressed))
    }

    fn emit_mouse_motion(&mut self, dx: i32, dy: i32) -> Result<()> {
        let events = motion_events(dx, dy);
        if events.is_empty() {
            return Ok(());
        }
        self.write(&events)
    }
}

/// Builds the event sequence for one key transition.
///
/// On press the modifiers go down in shift, alt, ctrl order before the
/// key. On release the key comes up first and the modifiers follow in
/// reverse order. Every modifier or key transition is followed by its own
/// report so applications observe the ordering.
#[must_use]
pub fn key_events(stroke: KeyStroke, pressed: bool) -> Vec<InputEvent> {
    let modifiers: Vec<Key> = stroke.modifiers.keys().collect();
    let mut events = Vec::with_capacity((modifiers.len() + 1) * 2);

    let mut push = |key: Key, value: i32| {
        events.push(InputEvent::new(EventType::KEY, key.code(), value));
        events.push(sync());
    };

    if pressed {
        for key in &modifiers {
            push(*key, 1);
        }
        push(stroke.key, 1);
    } else {
        push(stroke.key, 0);
        for key in modifiers.iter().rev() {
            push(*key, 0);
        }
    }

    events
}

/// Builds a pointer motion report. Zero motion produces no events.
#[must_use]
pub fn motion_events(dx: i32, dy: i32) -> Vec<InputEvent> {
    let mut events = Vec::with_capacity(3);
    if dx != 0 {
        events.push(InputEvent::new(
            EventType::RELATIVE,
            RelativeAxisType::REL_X.0,
            dx,
        ));
    }
    if dy != 0 {
        events.push(InputEvent::new(
            EventType::RELATIVE,
            RelativeAxisType::REL_Y.0,
            dy,
        ));
    }
    if !events.is_empty() {
        events.push(sync());
    }
    events
}

fn sync() -> InputEvent {
    InputEvent::new(EventType::SYNCHRONIZATION, 0, 0)
}
