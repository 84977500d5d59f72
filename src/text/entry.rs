//! # Text Entry
//!
//! Compose text with a controller by cycling through a charset or wordset.
//!
//! ## Character Entry
//!
//! The last character of the buffer is the live slot. Cycling replaces it
//! (backspace, then the new character); `add_letter` appends a copy of the
//! cursor character as a new live slot; `remove_letter` erases the live
//! slot and the cursor moves back to the character before it.
//!
//! ## Word Entry
//!
//! Cycling erases the whole buffer and types the selected word.
//!
//! ## Example
//!
//! ```
//! use padmap::text::charset::InputSets;
//! use padmap::text::entry::TextEntry;
//! # use padmap::output::sink::InputSink;
//! # use padmap::keys::KeyStroke;
//! # struct Null;
//! # impl InputSink for Null {
//! #     fn emit_key(&mut self, _: KeyStroke, _: bool) -> padmap::error::Result<()> { Ok(()) }
//! #     fn emit_mouse_motion(&mut self, _: i32, _: i32) -> padmap::error::Result<()> { Ok(()) }
//! # }
//! # let mut sink = Null;
//!
//! let sets = InputSets::new();
//! let mut entry = TextEntry::new();
//! entry.load_charset(&sets, "digits");
//!
//! entry.next_letter(&mut sink, 3);
//! assert_eq!(entry.cursor_char(), Some('3'));
//! entry.prev_letter(&mut sink, 4);
//! assert_eq!(entry.cursor_char(), Some('9'));
//! ```

use evdev::Key;
use tracing::{debug, info, warn};

use crate::output::sink::{tap, tap_key, InputSink};
use crate::text::charset::{CharSet, CharacterMap, InputSets, WordSet, FALLBACK_CHARSET};

/// Maximum number of characters in the composition buffer.
pub const MAX_TEXT_LENGTH: usize = 64;

#[derive(Debug, Clone, Default)]
enum Mode {
    #[default]
    Inactive,
    Chars(CharSet),
    Words(WordSet),
}

/// Text-entry state machine.
#[derive(Debug, Clone)]
pub struct TextEntry {
    mode: Mode,
    text: Vec<char>,
    letter: usize,
    word: usize,
    map: CharacterMap,
}

impl Default for TextEntry {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEntry {
    /// Creates an inactive engine with the built-in character map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: Mode::Inactive,
            text: Vec::with_capacity(MAX_TEXT_LENGTH),
            letter: 0,
            word: 0,
            map: CharacterMap::builtin(),
        }
    }

    /// Returns true while a charset or wordset is loaded.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self.mode, Mode::Inactive)
    }

    /// Name of the loaded charset, if in character mode.
    #[must_use]
    pub fn charset_name(&self) -> Option<&str> {
        match &self.mode {
            Mode::Chars(set) => Some(&set.name),
            _ => None,
        }
    }

    /// Name of the loaded wordset, if in word mode.
    #[must_use]
    pub fn wordset_name(&self) -> Option<&str> {
        match &self.mode {
            Mode::Words(set) => Some(&set.name),
            _ => None,
        }
    }

    /// Current buffer contents.
    #[must_use]
    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    /// Character under the cursor in character mode.
    #[must_use]
    pub fn cursor_char(&self) -> Option<char> {
        match &self.mode {
            Mode::Chars(set) => set.chars.get(self.letter).copied(),
            _ => None,
        }
    }

    /// Selected word in word mode.
    #[must_use]
    pub fn current_word(&self) -> Option<&str> {
        match &self.mode {
            Mode::Words(set) => set.words.get(self.word).map(String::as_str),
            _ => None,
        }
    }

    fn reset_session(&mut self) {
        self.text.clear();
        self.letter = 0;
        self.word = 0;
    }

    /// Enters character mode with the charset `name`.
    ///
    /// Unknown names fall back to the `basic` charset. The buffer is only
    /// reset when entering from the inactive state.
    pub fn load_charset(&mut self, sets: &InputSets, name: &str) {
        let set = match sets.charset(name) {
            Some(set) => {
                info!("Loaded charset \"{}\"", name);
                set.clone()
            }
            None => {
                warn!("Unknown charset \"{}\", using \"{}\"", name, FALLBACK_CHARSET);
                match sets.charset(FALLBACK_CHARSET) {
                    Some(set) => set.clone(),
                    None => return,
                }
            }
        };

        if !self.is_active() {
            self.reset_session();
        }
        if self.letter >= set.len() {
            self.letter = 0;
        }
        self.mode = Mode::Chars(set);
    }

    /// Enters word mode with the wordset `name`.
    ///
    /// Unknown names leave the current state untouched.
    pub fn load_wordset(&mut self, sets: &InputSets, name: &str) {
        let Some(set) = sets.wordset(name) else {
            warn!("Unknown wordset \"{}\"", name);
            return;
        };
        info!("Loaded wordset \"{}\"", name);

        if !self.is_active() {
            self.reset_session();
        }
        if self.word >= set.words.len() {
            self.word = 0;
        }
        self.mode = Mode::Words(set.clone());
    }

    /// Leaves text entry.
    pub fn stop(&mut self) {
        if self.is_active() {
            info!("Cleared input sets");
        }
        self.mode = Mode::Inactive;
    }

    fn type_char(&self, sink: &mut dyn InputSink, c: char) {
        if let Err(e) = tap(sink, self.map.stroke(c)) {
            debug!("Failed to type '{}': {}", c, e);
        }
    }

    fn backspace(sink: &mut dyn InputSink) {
        if let Err(e) = tap_key(sink, Key::KEY_BACKSPACE) {
            debug!("Failed to send backspace: {}", e);
        }
    }

    /// Writes the cursor character into the live slot, starting the first
    /// slot if the buffer is empty.
    fn retype_live(&mut self, sink: &mut dyn InputSink) {
        let Some(c) = self.cursor_char() else {
            return;
        };

        match self.text.last_mut() {
            Some(last) => {
                *last = c;
                Self::backspace(sink);
            }
            None => self.text.push(c),
        }
        self.type_char(sink, c);
    }

    /// Appends the cursor character as a new live slot.
    pub fn add_letter(&mut self, sink: &mut dyn InputSink) {
        let Some(c) = self.cursor_char() else {
            return;
        };
        if self.text.len() >= MAX_TEXT_LENGTH {
            return;
        }
        self.text.push(c);
        self.type_char(sink, c);
    }

    /// Erases the live slot and moves the cursor to the previous character.
    pub fn remove_letter(&mut self, sink: &mut dyn InputSink) {
        let Mode::Chars(set) = &self.mode else {
            return;
        };
        if self.text.pop().is_none() {
            return;
        }
        Self::backspace(sink);

        if let Some(position) = self.text.last().and_then(|c| set.position(*c)) {
            self.letter = position;
        }
    }

    fn step_letter(&mut self, sink: &mut dyn InputSink, amount: i64) {
        let Mode::Chars(set) = &self.mode else {
            return;
        };
        if set.is_empty() {
            return;
        }
        let len = set.len() as i64;
        self.letter = (self.letter as i64 + amount).rem_euclid(len) as usize;
        self.retype_live(sink);
    }

    /// Cycles the cursor character forward by `amount`.
    pub fn next_letter(&mut self, sink: &mut dyn InputSink, amount: i32) {
        self.step_letter(sink, i64::from(amount));
    }

    /// Cycles the cursor character backward by `amount`.
    pub fn prev_letter(&mut self, sink: &mut dyn InputSink, amount: i32) {
        self.step_letter(sink, -i64::from(amount));
    }

    fn change_case(&mut self, sink: &mut dyn InputSink, convert: fn(char) -> char) {
        let Mode::Chars(set) = &self.mode else {
            return;
        };
        let Some(current) = set.chars.get(self.letter).copied() else {
            return;
        };

        let target = convert(current);
        if target == current {
            return;
        }
        let Some(position) = set.position(target) else {
            return;
        };

        self.letter = position;
        self.retype_live(sink);
    }

    /// Switches the cursor character to upper case if the charset has it.
    pub fn upper_case(&mut self, sink: &mut dyn InputSink) {
        self.change_case(sink, |c| c.to_ascii_uppercase());
    }

    /// Switches the cursor character to lower case if the charset has it.
    pub fn lower_case(&mut self, sink: &mut dyn InputSink) {
        self.change_case(sink, |c| c.to_ascii_lowercase());
    }

    /// Flips the case of the cursor character if the charset has both.
    pub fn toggle_case(&mut self, sink: &mut dyn InputSink) {
        self.change_case(sink, |c| {
            if c.is_ascii_uppercase() {
                c.to_ascii_lowercase()
            } else {
                c.to_ascii_uppercase()
            }
        });
    }

    fn erase_all(&mut self, sink: &mut dyn InputSink) {
        for _ in 0..self.text.len() {
            Self::backspace(sink);
        }
        self.text.clear();
    }

    fn step_word(&mut self, sink: &mut dyn InputSink, amount: i64) {
        let Mode::Words(set) = &self.mode else {
            return;
        };
        if set.words.is_empty() {
            return;
        }
        let len = set.words.len() as i64;
        self.word = (self.word as i64 + amount).rem_euclid(len) as usize;
        let word: Vec<char> = set.words[self.word].chars().take(MAX_TEXT_LENGTH).collect();

        self.erase_all(sink);
        for c in word {
            self.text.push(c);
            self.type_char(sink, c);
        }
    }

    /// Selects and types the word `amount` places forward.
    pub fn next_word(&mut self, sink: &mut dyn InputSink, amount: i32) {
        self.step_word(sink, i64::from(amount));
    }

    /// Selects and types the word `amount` places backward.
    pub fn prev_word(&mut self, sink: &mut dyn InputSink, amount: i32) {
        self.step_word(sink, -i64::from(amount));
    }

    /// Presses Enter once and empties the buffer. The caller pops the
    /// control stack.
    pub fn accept(&mut self, sink: &mut dyn InputSink) {
        debug!("Accepting text \"{}\"", self.text());
        if let Err(e) = tap_key(sink, Key::KEY_ENTER) {
            debug!("Failed to send enter: {}", e);
        }
        self.text.clear();
    }

    /// Erases the typed text without pressing Enter. The caller pops the
    /// control stack.
    pub fn cancel(&mut self, sink: &mut dyn InputSink) {
        debug!("Cancelling text \"{}\"", self.text());
        self.erase_all(sink);
    }
}
