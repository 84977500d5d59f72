//! # Configuration Module
//!
//! Loads ini-style control files into [`Settings`], the control
//! [`ProfileStore`] and the registered text-entry [`InputSets`].
//!
//! ## File layout
//!
//! ```ini
//! [config]
//! repeat_delay = 400
//! deadzone_mode = scaled_radial
//! charset = "hex" "0123456789abcdef"
//!
//! [controls]
//! a = enter
//! start = push_state menu
//!
//! [controls:menu]
//! overlay = parent
//! b = esc pop_state
//! ```
//!
//! Keys before the first section header are read in legacy mode; see
//! [`loader`].

pub mod bindings;
pub mod dump;
pub mod ini;
pub mod loader;
pub mod tokenize;

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::controller::deadzone::DeadzoneMode;
use crate::controls::button::Button;
use crate::controls::profile::ProfileStore;
use crate::text::InputSets;

pub use loader::ConfigLoader;

/// `[config]` values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    /// Delay before a held repeat button starts repeating, in ms.
    pub repeat_delay: u64,

    /// Interval between repeats, in ms.
    pub repeat_rate: u64,

    /// Mouse speed percentage while `mouse_slow` is held.
    pub mouse_slow_scale: i32,

    pub deadzone_mode: DeadzoneMode,

    /// Pixels per second at full stick deflection.
    pub deadzone_scale: i32,

    pub deadzone_x: i32,
    pub deadzone_y: i32,
    pub deadzone_triggers: i32,

    /// Pixels per motion tick for each held d-pad direction.
    pub dpad_mouse_step: i32,

    pub dpad_mouse_normalize: bool,

    /// Button that combines with start to quit.
    #[serde(serialize_with = "serialize_button")]
    pub hotkey: Button,

    /// Profile the stack starts in.
    pub controls: String,
}

fn serialize_button<S: Serializer>(button: &Button, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(button.name())
}

// Default value functions
fn default_repeat_delay() -> u64 { 500 }
fn default_repeat_rate() -> u64 { 60 }
fn default_mouse_slow_scale() -> i32 { 50 }
fn default_deadzone_scale() -> i32 { 512 }
fn default_deadzone() -> i32 { 15000 }
fn default_deadzone_axis() -> i32 { 1000 }
fn default_deadzone_triggers() -> i32 { 3000 }
fn default_dpad_mouse_step() -> i32 { 5 }
fn default_dpad_mouse_normalize() -> bool { true }
fn default_hotkey() -> Button { Button::Back }
fn default_controls() -> String { crate::controls::profile::ROOT_PROFILE.to_string() }

impl Default for Settings {
    fn default() -> Self {
        Self {
            repeat_delay: default_repeat_delay(),
            repeat_rate: default_repeat_rate(),
            mouse_slow_scale: default_mouse_slow_scale(),
            deadzone_mode: DeadzoneMode::Default,
            deadzone_scale: default_deadzone_scale(),
            deadzone_x: default_deadzone_axis(),
            deadzone_y: default_deadzone_axis(),
            deadzone_triggers: default_deadzone_triggers(),
            dpad_mouse_step: default_dpad_mouse_step(),
            dpad_mouse_normalize: default_dpad_mouse_normalize(),
            hotkey: default_hotkey(),
            controls: default_controls(),
        }
    }
}

impl Settings {
    /// Applies one scalar `[config]` key.
    ///
    /// Collection keys (`charset`, `wordset`) are handled by the loader.
    ///
    /// # Arguments
    ///
    /// * `key` - Key name, case-insensitive
    /// * `value` - First value token
    ///
    /// # Returns
    ///
    /// `false` if the key is not a scalar setting.
    pub fn apply(&mut self, key: &str, value: &str) -> bool {
        match key.to_ascii_lowercase().as_str() {
            "repeat_delay" => {
                self.repeat_delay = atoi_between(value, 16, 3000, default_repeat_delay() as i32) as u64;
            }
            "repeat_rate" => {
                self.repeat_rate = atoi_between(value, 16, 3000, default_repeat_rate() as i32) as u64;
            }
            "mouse_slow_scale" => {
                self.mouse_slow_scale = atoi_between(value, 1, 100, default_mouse_slow_scale());
            }
            "deadzone_mode" => self.deadzone_mode = DeadzoneMode::parse(value),
            "deadzone_scale" | "mouse_scale" => {
                self.deadzone_scale = atoi_between(value, 1, 32768, default_deadzone_scale());
            }
            "deadzone" => {
                let deadzone = atoi_between(value, 500, 32768, default_deadzone());
                self.deadzone_x = deadzone;
                self.deadzone_y = deadzone;
            }
            "deadzone_x" => self.deadzone_x = atoi_between(value, 500, 32768, default_deadzone_axis()),
            "deadzone_y" => self.deadzone_y = atoi_between(value, 500, 32768, default_deadzone_axis()),
            "deadzone_triggers" => {
                self.deadzone_triggers = atoi_between(value, 500, 32768, default_deadzone_triggers());
            }
            "dpad_mouse_step" => {
                self.dpad_mouse_step = atoi_between(value, 1, 100, default_dpad_mouse_step());
            }
            "dpad_mouse_normalize" => {
                self.dpad_mouse_normalize = atob(value, default_dpad_mouse_normalize());
            }
            "hotkey" => match Button::from_name(value) {
                Some(button) => self.hotkey = button,
                None => debug!("hotkey \"{}\" is not a button, keeping {}", value, self.hotkey),
            },
            "controls" => self.controls = value.to_string(),
            "mouse_delay" | "deadzone_delay" => {}
            _ => return false,
        }
        true
    }
}

/// Parses an integer, clamping it to `[minimum, maximum]`.
///
/// Anything that is not a whole decimal integer yields `default`.
///
/// # Examples
///
/// ```
/// use padmap::config::atoi_between;
///
/// assert_eq!(atoi_between("250", 16, 3000, 500), 250);
/// assert_eq!(atoi_between("5", 16, 3000, 500), 16);
/// assert_eq!(atoi_between("fast", 16, 3000, 500), 500);
/// ```
#[must_use]
pub fn atoi_between(value: &str, minimum: i32, maximum: i32, default: i32) -> i32 {
    match value.trim().parse::<i64>() {
        Ok(parsed) => parsed.clamp(i64::from(minimum), i64::from(maximum)) as i32,
        Err(_) => default,
    }
}

/// Parses `true`/`1`/`false`/`0`, case-insensitively.
#[must_use]
pub fn atob(value: &str, default: bool) -> bool {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") || value == "1" {
        true
    } else if value.eq_ignore_ascii_case("false") || value == "0" {
        false
    } else {
        default
    }
}

/// Everything read from the control files.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings: Settings,
    pub profiles: ProfileStore,
    pub sets: InputSets,
}
