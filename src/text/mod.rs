//! Text composition with a gamepad.

pub mod charset;
pub mod entry;

pub use charset::{CharSet, CharacterMap, InputSets, WordSet};
pub use entry::{TextEntry, MAX_TEXT_LENGTH};
