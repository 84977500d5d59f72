//! # Mouse Motion Module
//!
//! Converts stick deflection and held d-pad directions into relative pointer
//! motion.
//!
//! Motion is produced once per [`MOTION_TICK_MS`]. Sticks run through the
//! configured deadzone algorithm and are scaled so that full deflection moves
//! `deadzone_scale` pixels per second. The d-pad moves `dpad_mouse_step`
//! pixels per tick. Fractional pixels are carried to the next tick so slow
//! movement is not lost to truncation.
//!
//! ## Usage
//!
//! ```
//! use padmap::controller::deadzone::{DeadzoneMode, Vector2};
//! use padmap::controller::mouse::{MouseMotion, MouseTuning};
//!
//! let tuning = MouseTuning {
//!     mode: DeadzoneMode::Radial,
//!     radius: 0.0,
//!     speed: 1000.0,
//!     dpad_step: 5,
//!     dpad_normalize: true,
//!     slow_scale: 0.5,
//! };
//! let mut mouse = MouseMotion::new(tuning);
//!
//! let velocity = mouse.stick_velocity(Vector2::new(1.0, 0.0));
//! assert_eq!(mouse.advance(velocity, false), (16, 0));
//! ```

use crate::config::Settings;
use crate::controller::deadzone::{setting_to_fraction, DeadzoneMode, Vector2};

/// Interval between pointer updates in milliseconds.
pub const MOTION_TICK_MS: u64 = 16;

/// Pointer tuning derived from `[config]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseTuning {
    /// Deadzone algorithm applied to sticks.
    pub mode: DeadzoneMode,
    /// Deadzone radius as a fraction of full deflection.
    pub radius: f32,
    /// Pixels per second at full stick deflection.
    pub speed: f32,
    /// Pixels per tick for each held d-pad direction.
    pub dpad_step: i32,
    /// Scale diagonal d-pad motion to the same speed as straight motion.
    pub dpad_normalize: bool,
    /// Multiplier applied while a `mouse_slow` button is held.
    pub slow_scale: f32,
}

impl From<&Settings> for MouseTuning {
    fn from(settings: &Settings) -> Self {
        Self {
            mode: settings.deadzone_mode,
            radius: setting_to_fraction(settings.deadzone_x.max(settings.deadzone_y)),
            speed: settings.deadzone_scale as f32,
            dpad_step: settings.dpad_mouse_step,
            dpad_normalize: settings.dpad_mouse_normalize,
            slow_scale: settings.mouse_slow_scale as f32 / 100.0,
        }
    }
}

/// Pointer motion accumulator.
#[derive(Debug, Clone)]
pub struct MouseMotion {
    tuning: MouseTuning,
    carry: Vector2,
}

impl MouseMotion {
    #[must_use]
    pub fn new(tuning: MouseTuning) -> Self {
        Self {
            tuning,
            carry: Vector2::ZERO,
        }
    }

    #[must_use]
    pub fn tuning(&self) -> &MouseTuning {
        &self.tuning
    }

    /// Pixels per tick for a stick vector.
    #[must_use]
    pub fn stick_velocity(&self, stick: Vector2) -> Vector2 {
        let filtered = self.tuning.mode.apply(stick, self.tuning.radius);
        let per_tick = self.tuning.speed * MOTION_TICK_MS as f32 / 1000.0;
        filtered.scale(per_tick)
    }

    /// Pixels per tick for held d-pad directions.
    ///
    /// # Arguments
    ///
    /// * `dx` - -1 for left, 1 for right, 0 for neither or both
    /// * `dy` - -1 for up, 1 for down, 0 for neither or both
    #[must_use]
    pub fn dpad_velocity(&self, dx: i32, dy: i32) -> Vector2 {
        let direction = Vector2::new(dx.signum() as f32, dy.signum() as f32);
        let step = self.tuning.dpad_step as f32;

        if self.tuning.dpad_normalize && direction.x != 0.0 && direction.y != 0.0 {
            direction.scale(step / direction.magnitude())
        } else {
            direction.scale(step)
        }
    }

    /// Adds one tick of `velocity` and returns the whole pixels to move.
    ///
    /// The fractional remainder is carried to the next tick. A zero velocity
    /// drops any carry.
    pub fn advance(&mut self, velocity: Vector2, slow: bool) -> (i32, i32) {
        if velocity == Vector2::ZERO {
            self.carry = Vector2::ZERO;
            return (0, 0);
        }

        let velocity = if slow {
            velocity.scale(self.tuning.slow_scale)
        } else {
            velocity
        };

        let x = self.carry.x + velocity.x;
        let y = self.carry.y + velocity.y;
        let (dx, dy) = (x.trunc(), y.trunc());
        self.carry = Vector2::new(x - dx, y - dy);

        (dx as i32, dy as i32)
    }

    /// Drops accumulated sub-pixel motion.
    pub fn reset(&mut self) {
        self.carry = Vector2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> MouseTuning {
        MouseTuning {
            mode: DeadzoneMode::Axial,
            radius: 0.1,
            speed: 500.0,
            dpad_step: 5,
            dpad_normalize: true,
            slow_scale: 0.5,
        }
    }

    // ====== Stick Tests ======

    #[test]
    fn test_stick_inside_deadzone_is_still() {
        let mut mouse = MouseMotion::new(tuning());
        let velocity = mouse.stick_velocity(Vector2::new(0.05, -0.05));
        assert_eq!(mouse.advance(velocity, false), (0, 0));
    }

    #[test]
    fn test_stick_full_deflection_speed() {
        let mut mouse = MouseMotion::new(tuning());
        let velocity = mouse.stick_velocity(Vector2::new(1.0, -1.0));

        // 500 px/s over 16 ms is 8 px per tick
        assert_eq!(mouse.advance(velocity, false), (8, -8));
    }

    #[test]
    fn test_subpixel_motion_is_carried() {
        let mut mouse = MouseMotion::new(MouseTuning {
            speed: 46.875,
            ..tuning()
        });
        let velocity = mouse.stick_velocity(Vector2::new(1.0, 0.0));

        // 0.75 px per tick
        let total: i32 = (0..10).map(|_| mouse.advance(velocity, false).0).sum();
        assert_eq!(total, 7);
    }

    #[test]
    fn test_zero_velocity_drops_carry() {
        let mut mouse = MouseMotion::new(tuning());
        mouse.advance(Vector2::new(0.9, 0.0), false);
        mouse.advance(Vector2::ZERO, false);
        assert_eq!(mouse.advance(Vector2::new(0.9, 0.0), false), (0, 0));
    }

    #[test]
    fn test_slow_scales_motion() {
        let mut mouse = MouseMotion::new(tuning());
        assert_eq!(mouse.advance(Vector2::new(8.0, 4.0), true), (4, 2));
    }

    // ====== D-pad Tests ======

    #[test]
    fn test_dpad_straight_step() {
        let mouse = MouseMotion::new(tuning());
        assert_eq!(mouse.dpad_velocity(1, 0), Vector2::new(5.0, 0.0));
        assert_eq!(mouse.dpad_velocity(0, -1), Vector2::new(0.0, -5.0));
        assert_eq!(mouse.dpad_velocity(0, 0), Vector2::ZERO);
    }

    #[test]
    fn test_dpad_diagonal_normalised() {
        let mouse = MouseMotion::new(tuning());
        let velocity = mouse.dpad_velocity(1, 1);
        assert!((velocity.magnitude() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_dpad_diagonal_unnormalised() {
        let mouse = MouseMotion::new(MouseTuning {
            dpad_normalize: false,
            ..tuning()
        });
        assert_eq!(mouse.dpad_velocity(-1, 1), Vector2::new(-5.0, 5.0));
    }

    // ====== Settings Tests ======

    #[test]
    fn test_tuning_from_settings() {
        let settings = Settings::default();
        let tuning = MouseTuning::from(&settings);
        assert_eq!(tuning.mode, DeadzoneMode::Default);
        assert!((tuning.radius - 1000.0 / 32768.0).abs() < 1e-6);
        assert_eq!(tuning.speed, 512.0);
        assert_eq!(tuning.dpad_step, 5);
        assert!((tuning.slow_scale - 0.5).abs() < 1e-6);
    }
}
