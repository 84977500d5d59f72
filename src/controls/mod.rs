//! # Controls Module
//!
//! Control profiles, the stack of active profiles and the engine that
//! resolves button presses through them.

pub mod binding;
pub mod button;
pub mod engine;
pub mod profile;
pub mod stack;

pub use binding::{Action, ButtonBinding, SpecialFunction, StackOp, TriState};
pub use button::{BindTarget, Button, ButtonGroup, ButtonSet};
pub use engine::Engine;
pub use profile::{ControlProfile, ProfileId, ProfileStore};
pub use stack::ControlStack;
