//! # Virtual Gamepad
//!
//! Generic-gamepad passthrough: controller events are forwarded to a
//! uinput device that presents itself as an Xbox 360 pad.

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{
    AbsInfo, AbsoluteAxisType, AttributeSet, BusType, EventType, InputEvent, InputId, Key,
    UinputAbsSetup,
};
use tracing::{debug, info};

use crate::controller::events::{Axis, ControllerEvent};
use crate::controls::button::Button;
use crate::error::{PadmapError, Result};

/// Device name reported by the virtual pad.
pub const GAMEPAD_NAME: &str = "Microsoft X-Box 360 pad";

const VENDOR_MICROSOFT: u16 = 0x045e;
const PRODUCT_XBOX360: u16 = 0x028e;

/// Stick output range is ±STICK_MAX.
pub const STICK_MAX: i32 = 32767;

/// Trigger output range is 0..=TRIGGER_MAX.
pub const TRIGGER_MAX: i32 = 255;

/// Button → key code on the virtual pad. D-pad and analog directions are
/// not listed; the d-pad travels on the hat axes.
fn output_key(button: Button) -> Option<Key> {
    let key = match button {
        Button::A => Key::BTN_SOUTH,
        Button::B => Key::BTN_EAST,
        Button::X => Key::BTN_WEST,
        Button::Y => Key::BTN_NORTH,
        Button::L1 => Key::BTN_TL,
        Button::R1 => Key::BTN_TR,
        Button::L3 => Key::BTN_THUMBL,
        Button::R3 => Key::BTN_THUMBR,
        Button::Start => Key::BTN_START,
        Button::Back => Key::BTN_SELECT,
        Button::Guide => Key::BTN_MODE,
        _ => return None,
    };
    Some(key)
}

/// Translates controller events into Xbox 360 pad reports.
///
/// Keeps the d-pad state so opposing directions on the hat resolve the
/// same way the kernel xpad driver reports them.
#[derive(Debug, Default)]
pub struct PadTranslator {
    dpad: [bool; 4],
}

impl PadTranslator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the report for one controller event, ending with a sync.
    /// Events with no counterpart on the pad yield nothing.
    pub fn translate(&mut self, event: ControllerEvent) -> Vec<InputEvent> {
        let mut events = match event {
            ControllerEvent::Button { button, pressed } => self.button(button, pressed),
            ControllerEvent::Axis { axis, value } => vec![axis_event(axis, value)],
        };
        if !events.is_empty() {
            events.push(InputEvent::new(EventType::SYNCHRONIZATION, 0, 0));
        }
        events
    }

    fn button(&mut self, button: Button, pressed: bool) -> Vec<InputEvent> {
        let value = i32::from(pressed);

        let dpad_slot = match button {
            Button::DpadUp => Some(0),
            Button::DpadDown => Some(1),
            Button::DpadLeft => Some(2),
            Button::DpadRight => Some(3),
            _ => None,
        };
        if let Some(slot) = dpad_slot {
            self.dpad[slot] = pressed;
            return if slot < 2 {
                vec![abs(AbsoluteAxisType::ABS_HAT0Y, hat(self.dpad[0], self.dpad[1]))]
            } else {
                vec![abs(AbsoluteAxisType::ABS_HAT0X, hat(self.dpad[2], self.dpad[3]))]
            };
        }

        // Digital triggers drive the analog trigger axes fully.
        match button {
            Button::L2 => return vec![abs(AbsoluteAxisType::ABS_Z, value * TRIGGER_MAX)],
            Button::R2 => return vec![abs(AbsoluteAxisType::ABS_RZ, value * TRIGGER_MAX)],
            _ => {}
        }

        match output_key(button) {
            Some(key) => vec![InputEvent::new(EventType::KEY, key.code(), value)],
            None => Vec::new(),
        }
    }
}

fn hat(negative: bool, positive: bool) -> i32 {
    match (negative, positive) {
        (true, false) => -1,
        (false, true) => 1,
        _ => 0,
    }
}

fn abs(code: AbsoluteAxisType, value: i32) -> InputEvent {
    InputEvent::new(EventType::ABSOLUTE, code.0, value)
}

/// Scales a normalised axis sample to the pad's range.
#[must_use]
pub fn scale_axis(axis: Axis, value: f32) -> i32 {
    if axis.is_trigger() {
        (value.clamp(0.0, 1.0) * TRIGGER_MAX as f32).round() as i32
    } else {
        (value.clamp(-1.0, 1.0) * STICK_MAX as f32).round() as i32
    }
}

fn axis_event(axis: Axis, value: f32) -> InputEvent {
    abs(axis.code(), scale_axis(axis, value))
}

/// uinput Xbox 360 pad
pub struct VirtualGamepad {
    device: VirtualDevice,
    translator: PadTranslator,
}

impl VirtualGamepad {
    /// Create the uinput device
    ///
    /// # Errors
    ///
    /// Returns error if `/dev/uinput` is unavailable or the device cannot
    /// be built.
    pub fn new() -> Result<Self> {
        let mut keys = AttributeSet::<Key>::new();
        for button in Button::ALL {
            if let Some(key) = output_key(button) {
                keys.insert(key);
            }
        }

        let stick = AbsInfo::new(0, -STICK_MAX, STICK_MAX, 16, 128, 0);
        let trigger = AbsInfo::new(0, 0, TRIGGER_MAX, 0, 0, 0);
        let hat = AbsInfo::new(0, -1, 1, 0, 0, 0);

        let axes = [
            UinputAbsSetup::new(AbsoluteAxisType::ABS_X, stick),
            UinputAbsSetup::new(AbsoluteAxisType::ABS_Y, stick),
            UinputAbsSetup::new(AbsoluteAxisType::ABS_RX, stick),
            UinputAbsSetup::new(AbsoluteAxisType::ABS_RY, stick),
            UinputAbsSetup::new(AbsoluteAxisType::ABS_Z, trigger),
            UinputAbsSetup::new(AbsoluteAxisType::ABS_RZ, trigger),
            UinputAbsSetup::new(AbsoluteAxisType::ABS_HAT0X, hat),
            UinputAbsSetup::new(AbsoluteAxisType::ABS_HAT0Y, hat),
        ];

        let mut builder = VirtualDeviceBuilder::new()
            .map_err(|e| PadmapError::Output(format!("Failed to open uinput: {}", e)))?
            .name(GAMEPAD_NAME)
            .input_id(InputId::new(BusType::BUS_USB, VENDOR_MICROSOFT, PRODUCT_XBOX360, 0x0110))
            .with_keys(&keys)
            .map_err(|e| PadmapError::Output(format!("Failed to set button capabilities: {}", e)))?;

        for setup in &axes {
            builder = builder
                .with_absolute_axis(setup)
                .map_err(|e| PadmapError::Output(format!("Failed to set axis capabilities: {}", e)))?;
        }

        let device = builder
            .build()
            .map_err(|e| PadmapError::Output(format!("Failed to build gamepad: {}", e)))?;

        info!("Created virtual gamepad '{}'", GAMEPAD_NAME);

        Ok(Self {
            device,
            translator: PadTranslator::new(),
        })
    }

    /// Forward one controller event.
    ///
    /// # Errors
    ///
    /// Returns error if the report cannot be written.
    pub fn forward(&mut self, event: ControllerEvent) -> Result<()> {
        let events = self.translator.translate(event);
        if events.is_empty() {
            return Ok(());
        }
        self.device.emit(&events).map_err(|e| {
            debug!("Failed to write gamepad events: {}", e);
            PadmapError::Output(e.to_string())
        })
    }
}
