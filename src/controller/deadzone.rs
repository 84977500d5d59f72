//! # Deadzone Module
//!
//! Suppresses small analog stick movements before they become mouse motion.
//!
//! ## Algorithms
//!
//! | Mode | Behaviour |
//! |------|-----------|
//! | `axial` | each axis passes unmodified once its magnitude exceeds the radius |
//! | `radial` | the whole vector passes once its magnitude reaches the radius |
//! | `scaled_radial` | like `radial`, remaining range rescaled `[r,1] -> [0,1]` |
//! | `sloped_axial` | per-axis threshold `r * |axis|`, unmodified above it |
//! | `sloped_scaled_axial` | per-axis threshold, remaining range rescaled |
//! | `hybrid` | `scaled_radial` followed by `sloped_scaled_axial` |
//!
//! `default` selects `axial`.
//!
//! ## Usage
//!
//! ```
//! use padmap::controller::deadzone::{DeadzoneMode, Vector2};
//!
//! let mode = DeadzoneMode::parse("scaled_radial");
//! let out = mode.apply(Vector2::new(0.6, 0.0), 0.2);
//! assert!((out.x - 0.5).abs() < 1e-6);
//! ```

use std::fmt;

use serde::{Serialize, Serializer};
use tracing::warn;

/// Full-scale value of the integer deadzone settings.
pub const AXIS_FULL_SCALE: f32 = 32768.0;

/// A 2D stick vector with components in -1.0 to 1.0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    /// The centred vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    #[must_use]
    pub fn magnitude(&self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Multiplies both components by `factor`.
    #[must_use]
    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

/// Linearly maps `value` from `[old_min, old_max]` to `[new_min, new_max]`.
///
/// A degenerate source range maps everything to `new_max`.
#[must_use]
pub fn map_range(value: f32, old_min: f32, old_max: f32, new_min: f32, new_max: f32) -> f32 {
    let span = old_max - old_min;
    if span.abs() <= f32::EPSILON {
        return new_max;
    }
    new_min + (new_max - new_min) * (value - old_min) / span
}

/// Deadzone algorithm selected by `deadzone_mode`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeadzoneMode {
    /// Alias of [`DeadzoneMode::Axial`].
    #[default]
    Default,
    Axial,
    Radial,
    ScaledRadial,
    SlopedAxial,
    SlopedScaledAxial,
    Hybrid,
}

impl DeadzoneMode {
    /// All modes with their config names.
    pub const ALL: [(Self, &'static str); 7] = [
        (Self::Default, "default"),
        (Self::Axial, "axial"),
        (Self::Radial, "radial"),
        (Self::ScaledRadial, "scaled_radial"),
        (Self::SlopedAxial, "sloped_axial"),
        (Self::SlopedScaledAxial, "sloped_scaled_axial"),
        (Self::Hybrid, "hybrid"),
    ];

    /// Parses a mode name case-insensitively.
    ///
    /// Unknown names log a warning and select [`DeadzoneMode::Default`].
    ///
    /// # Examples
    ///
    /// ```
    /// use padmap::controller::deadzone::DeadzoneMode;
    ///
    /// assert_eq!(DeadzoneMode::parse("Hybrid"), DeadzoneMode::Hybrid);
    /// assert_eq!(DeadzoneMode::parse("bogus"), DeadzoneMode::Default);
    /// ```
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match Self::ALL
            .iter()
            .find(|(_, mode_name)| mode_name.eq_ignore_ascii_case(name.trim()))
        {
            Some((mode, _)) => *mode,
            None => {
                warn!("Unknown deadzone_mode \"{}\", using default", name);
                Self::Default
            }
        }
    }

    /// Config name of this mode.
    #[must_use]
    pub fn name(&self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(mode, _)| mode == self)
            .map_or("default", |(_, name)| name)
    }

    /// Applies the algorithm to `input` with deadzone radius `radius`.
    ///
    /// # Arguments
    ///
    /// * `input` - Stick vector, components in -1.0 to 1.0
    /// * `radius` - Deadzone radius as a fraction of full deflection
    ///
    /// # Returns
    ///
    /// The filtered vector, components in -1.0 to 1.0.
    #[must_use]
    pub fn apply(&self, input: Vector2, radius: f32) -> Vector2 {
        match self {
            Self::Default | Self::Axial => axial(input, radius),
            Self::Radial => radial(input, radius),
            Self::ScaledRadial => scaled_radial(input, radius),
            Self::SlopedAxial => sloped_axial(input, radius),
            Self::SlopedScaledAxial => sloped_scaled_axial(input, radius),
            Self::Hybrid => hybrid(input, radius),
        }
    }
}

impl fmt::Display for DeadzoneMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for DeadzoneMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[inline]
fn pass_axis(value: f32, threshold: f32) -> f32 {
    if value.abs() > threshold {
        value
    } else {
        0.0
    }
}

/// Each axis passes through once its magnitude exceeds `radius`.
#[must_use]
pub fn axial(input: Vector2, radius: f32) -> Vector2 {
    Vector2::new(pass_axis(input.x, radius), pass_axis(input.y, radius))
}

/// The whole vector passes through once its magnitude reaches `radius`.
#[must_use]
pub fn radial(input: Vector2, radius: f32) -> Vector2 {
    if input.magnitude() >= radius {
        input
    } else {
        Vector2::ZERO
    }
}

/// Rescales the magnitude from `[radius, 1]` to `[0, 1]`, keeping direction.
#[must_use]
pub fn scaled_radial(input: Vector2, radius: f32) -> Vector2 {
    let magnitude = input.magnitude();
    if magnitude < radius || magnitude <= f32::EPSILON {
        return Vector2::ZERO;
    }

    let scaled = map_range(magnitude.min(1.0), radius, 1.0, 0.0, 1.0);
    input.scale(scaled / magnitude)
}

/// Zeroes an axis whose magnitude is below `radius * |axis|`.
#[must_use]
pub fn sloped_axial(input: Vector2, radius: f32) -> Vector2 {
    let threshold_x = radius * input.x.abs();
    let threshold_y = radius * input.y.abs();

    let mut output = input;
    if input.x.abs() < threshold_x {
        output.x = 0.0;
    }
    if input.y.abs() < threshold_y {
        output.y = 0.0;
    }
    output
}

#[inline]
fn sloped_scaled_axis(value: f32, radius: f32) -> f32 {
    let magnitude = value.abs();
    let threshold = radius * magnitude;
    if magnitude > threshold {
        value.signum() * map_range(magnitude.min(1.0), threshold, 1.0, 0.0, 1.0)
    } else {
        0.0
    }
}

/// Per-axis threshold `radius * |axis|`, remaining range rescaled to
/// `[0, 1]` with the sign preserved.
#[must_use]
pub fn sloped_scaled_axial(input: Vector2, radius: f32) -> Vector2 {
    Vector2::new(
        sloped_scaled_axis(input.x, radius),
        sloped_scaled_axis(input.y, radius),
    )
}

/// `scaled_radial` followed by `sloped_scaled_axial`.
#[must_use]
pub fn hybrid(input: Vector2, radius: f32) -> Vector2 {
    if input.magnitude() < radius {
        return Vector2::ZERO;
    }
    sloped_scaled_axial(scaled_radial(input, radius), radius)
}

/// Trigger clamp: passes `value` through when it exceeds `deadzone`,
/// otherwise zero.
///
/// # Examples
///
/// ```
/// use padmap::controller::deadzone::trigger_clamp;
///
/// assert_eq!(trigger_clamp(0.05, 0.1), 0.0);
/// assert_eq!(trigger_clamp(0.8, 0.1), 0.8);
/// ```
#[must_use]
pub fn trigger_clamp(value: f32, deadzone: f32) -> f32 {
    if value > deadzone {
        value
    } else {
        0.0
    }
}

/// Converts an integer deadzone setting (0 to 32768) to a fraction.
#[must_use]
pub fn setting_to_fraction(setting: i32) -> f32 {
    (setting as f32 / AXIS_FULL_SCALE).clamp(0.0, 1.0)
}
