//! # Padmap Library
//!
//! Map gamepad input to keyboard and mouse events on Linux handhelds.
//!
//! Buttons are resolved through a stack of named control profiles loaded
//! from ini-style control files. Profiles can push, replace and hold one
//! another, type text from character or word sets and turn sticks or the
//! d-pad into a mouse.

pub mod config;
pub mod controller;
pub mod controls;
pub mod error;
pub mod keys;
pub mod output;
pub mod process;
pub mod text;
