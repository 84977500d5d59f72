//! # Controller Event Mapper Module
//!
//! Translates raw evdev events from a gamepad into [`ControllerEvent`]s:
//! button edges for the abstract [`Button`]s and normalised axis samples.
//!
//! ## Button Codes (EV_KEY)
//!
//! | evdev Code | Button |
//! |------------|--------|
//! | BTN_SOUTH / BTN_EAST / BTN_WEST / BTN_NORTH | a / b / x / y |
//! | BTN_TL / BTN_TR | l1 / r1 |
//! | BTN_TL2 / BTN_TR2 | l2 / r2 |
//! | BTN_THUMBL / BTN_THUMBR | l3 / r3 |
//! | BTN_START / BTN_SELECT / BTN_MODE | start / back / guide |
//! | BTN_DPAD_* | up / down / left / right |
//!
//! ## Axis Codes (EV_ABS)
//!
//! | evdev Code | Axis | Normalised range |
//! |------------|------|------------------|
//! | ABS_X / ABS_Y | left stick | -1.0 to 1.0 |
//! | ABS_RX / ABS_RY | right stick | -1.0 to 1.0 |
//! | ABS_Z / ABS_RZ | left / right trigger | 0.0 to 1.0 |
//! | ABS_HAT0X / ABS_HAT0Y | d-pad | button edges |
//!
//! ## Usage
//!
//! ```
//! use evdev::{EventType, InputEvent, Key};
//! use padmap::controller::events::{AxisRanges, ControllerEvent, EventMapper};
//! use padmap::controls::button::Button;
//!
//! let mut mapper = EventMapper::new(AxisRanges::default());
//! let event = InputEvent::new(EventType::KEY, Key::BTN_SOUTH.code(), 1);
//!
//! assert_eq!(
//!     mapper.process_event(&event),
//!     vec![ControllerEvent::Button { button: Button::A, pressed: true }]
//! );
//! ```

use evdev::{AbsoluteAxisType, Device, InputEvent, InputEventKind, Key};
use tracing::debug;

use crate::controls::button::Button;

/// Analog axes tracked by the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    LeftX,
    LeftY,
    RightX,
    RightY,
    LeftTrigger,
    RightTrigger,
}

impl Axis {
    pub const ALL: [Axis; 6] = [
        Axis::LeftX,
        Axis::LeftY,
        Axis::RightX,
        Axis::RightY,
        Axis::LeftTrigger,
        Axis::RightTrigger,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// evdev code this axis is read from.
    #[must_use]
    pub fn code(self) -> AbsoluteAxisType {
        match self {
            Axis::LeftX => AbsoluteAxisType::ABS_X,
            Axis::LeftY => AbsoluteAxisType::ABS_Y,
            Axis::RightX => AbsoluteAxisType::ABS_RX,
            Axis::RightY => AbsoluteAxisType::ABS_RY,
            Axis::LeftTrigger => AbsoluteAxisType::ABS_Z,
            Axis::RightTrigger => AbsoluteAxisType::ABS_RZ,
        }
    }

    fn from_code(code: AbsoluteAxisType) -> Option<Self> {
        Self::ALL.into_iter().find(|axis| axis.code() == code)
    }

    /// Returns true for the two trigger axes.
    #[must_use]
    pub fn is_trigger(self) -> bool {
        matches!(self, Axis::LeftTrigger | Axis::RightTrigger)
    }
}

/// Raw range reported by the device for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub min: i32,
    pub max: i32,
}

impl AxisRange {
    /// Default stick range: signed 16-bit.
    pub const STICK: Self = Self::new(-32768, 32767);
    /// Default trigger range: unsigned 8-bit.
    pub const TRIGGER: Self = Self::new(0, 255);

    #[must_use]
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Maps `raw` onto -1.0 to 1.0 around the range midpoint.
    ///
    /// # Examples
    ///
    /// ```
    /// use padmap::controller::events::AxisRange;
    ///
    /// let range = AxisRange::new(0, 255);
    /// assert!((range.normalize_stick(0) + 1.0).abs() < 0.01);
    /// assert!((range.normalize_stick(255) - 1.0).abs() < 0.01);
    /// ```
    #[must_use]
    pub fn normalize_stick(&self, raw: i32) -> f32 {
        let span = (self.max - self.min) as f32;
        if span <= 0.0 {
            return 0.0;
        }
        let centre = (self.min as f32 + self.max as f32) / 2.0;
        ((raw as f32 - centre) / (span / 2.0)).clamp(-1.0, 1.0)
    }

    /// Maps `raw` onto 0.0 to 1.0.
    #[must_use]
    pub fn normalize_trigger(&self, raw: i32) -> f32 {
        let span = (self.max - self.min) as f32;
        if span <= 0.0 {
            return 0.0;
        }
        ((raw - self.min) as f32 / span).clamp(0.0, 1.0)
    }
}

/// Raw ranges for every [`Axis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRanges([AxisRange; 6]);

impl Default for AxisRanges {
    fn default() -> Self {
        Self(Axis::ALL.map(|axis| {
            if axis.is_trigger() {
                AxisRange::TRIGGER
            } else {
                AxisRange::STICK
            }
        }))
    }
}

impl AxisRanges {
    /// Reads axis ranges from an open device, keeping defaults for axes the
    /// device does not report.
    #[must_use]
    pub fn from_device(device: &Device) -> Self {
        let mut ranges = Self::default();

        let state = match device.get_abs_state() {
            Ok(state) => state,
            Err(e) => {
                debug!("Failed to read axis ranges: {}", e);
                return ranges;
            }
        };

        for axis in Axis::ALL {
            if let Some(info) = state.get(axis.code().0 as usize) {
                if info.maximum > info.minimum {
                    ranges.0[axis.index()] = AxisRange::new(info.minimum, info.maximum);
                }
            }
        }
        ranges
    }

    #[must_use]
    pub fn get(&self, axis: Axis) -> AxisRange {
        self.0[axis.index()]
    }

    pub fn set(&mut self, axis: Axis, range: AxisRange) {
        self.0[axis.index()] = range;
    }
}

/// Abstract input produced from raw device events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerEvent {
    /// Physical button edge.
    Button { button: Button, pressed: bool },
    /// Normalised axis sample.
    Axis { axis: Axis, value: f32 },
}

/// Maps a gamepad key code to its abstract button.
#[must_use]
pub fn button_for_key(key: Key) -> Option<Button> {
    let button = match key {
        Key::BTN_SOUTH => Button::A,
        Key::BTN_EAST => Button::B,
        Key::BTN_WEST => Button::X,
        Key::BTN_NORTH => Button::Y,
        Key::BTN_TL => Button::L1,
        Key::BTN_TR => Button::R1,
        Key::BTN_TL2 => Button::L2,
        Key::BTN_TR2 => Button::R2,
        Key::BTN_THUMBL => Button::L3,
        Key::BTN_THUMBR => Button::R3,
        Key::BTN_START => Button::Start,
        Key::BTN_SELECT => Button::Back,
        Key::BTN_MODE => Button::Guide,
        Key::BTN_DPAD_UP => Button::DpadUp,
        Key::BTN_DPAD_DOWN => Button::DpadDown,
        Key::BTN_DPAD_LEFT => Button::DpadLeft,
        Key::BTN_DPAD_RIGHT => Button::DpadRight,
        _ => return None,
    };
    Some(button)
}

/// Stateful translator from evdev events to [`ControllerEvent`]s.
///
/// Tracks the d-pad hat position so hat changes become press and release
/// edges.
#[derive(Debug, Clone)]
pub struct EventMapper {
    ranges: AxisRanges,
    hat_x: i32,
    hat_y: i32,
}

impl Default for EventMapper {
    fn default() -> Self {
        Self::new(AxisRanges::default())
    }
}

impl EventMapper {
    #[must_use]
    pub fn new(ranges: AxisRanges) -> Self {
        Self {
            ranges,
            hat_x: 0,
            hat_y: 0,
        }
    }

    #[must_use]
    pub fn ranges(&self) -> &AxisRanges {
        &self.ranges
    }

    /// Processes a single evdev event.
    ///
    /// # Returns
    ///
    /// Zero or more abstract events. A hat change can release one direction
    /// and press the opposite one.
    pub fn process_event(&mut self, event: &InputEvent) -> Vec<ControllerEvent> {
        match event.kind() {
            InputEventKind::Key(key) => {
                // value 2 is kernel autorepeat
                if event.value() == 2 {
                    return Vec::new();
                }
                button_for_key(key)
                    .map(|button| ControllerEvent::Button {
                        button,
                        pressed: event.value() != 0,
                    })
                    .into_iter()
                    .collect()
            }
            InputEventKind::AbsAxis(AbsoluteAxisType::ABS_HAT0X) => {
                let previous = std::mem::replace(&mut self.hat_x, event.value().signum());
                hat_edges(previous, self.hat_x, Button::DpadLeft, Button::DpadRight)
            }
            InputEventKind::AbsAxis(AbsoluteAxisType::ABS_HAT0Y) => {
                let previous = std::mem::replace(&mut self.hat_y, event.value().signum());
                hat_edges(previous, self.hat_y, Button::DpadUp, Button::DpadDown)
            }
            InputEventKind::AbsAxis(code) => match Axis::from_code(code) {
                Some(axis) => {
                    let range = self.ranges.get(axis);
                    let value = if axis.is_trigger() {
                        range.normalize_trigger(event.value())
                    } else {
                        range.normalize_stick(event.value())
                    };
                    vec![ControllerEvent::Axis { axis, value }]
                }
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Forgets the hat position.
    pub fn reset(&mut self) {
        self.hat_x = 0;
        self.hat_y = 0;
    }
}

fn hat_edges(previous: i32, current: i32, negative: Button, positive: Button) -> Vec<ControllerEvent> {
    let mut events = Vec::with_capacity(2);
    if previous == current {
        return events;
    }

    let button_for = |value: i32| if value < 0 { negative } else { positive };
    if previous != 0 {
        events.push(ControllerEvent::Button {
            button: button_for(previous),
            pressed: false,
        });
    }
    if current != 0 {
        events.push(ControllerEvent::Button {
            button: button_for(current),
            pressed: true,
        });
    }
    events
}
