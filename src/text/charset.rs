//! # Character and Word Sets
//!
//! Named pools the text-entry engine cycles through.
//!
//! Built-in charsets are registered on construction. Registering a charset
//! with an existing name replaces it; registering a word appends to the
//! named wordset, creating it on first use. Names are matched
//! case-insensitively.

use std::collections::HashMap;

use evdev::Key;
use tracing::{debug, warn};

use crate::keys::{find_key, KeyStroke, Modifiers};

/// Built-in charsets, in registration order.
pub const BUILTIN_CHARSETS: [(&str, &str); 6] = [
    ("basic", "ABCDEFGHIJKLMNOPQRSTUVWXYZ .,-_() 0123456789 "),
    (
        "extended",
        "ABCDEFGHIJKLMNOPQRSTUVWXYZ abcdefghijklmnopqrstuvwxyz .,-_() 0123456789 ",
    ),
    (
        "full",
        "ABCDEFGHIJKLMNOPQRSTUVWXYZ abcdefghijklmnopqrstuvwxyz .,-_()@#%&*-+!\"':;/?~`|{}$^=[]\\<> 0123456789",
    ),
    ("digits", "0123456789"),
    ("hex", "0123456789ABCDEF"),
    ("alpha", "ABCDEFGHIJKLMNOPQRSTUVWXYZ"),
];

/// Name of the charset used to build the character map.
pub const FULL_CHARSET: &str = "full";

/// Charset loaded when a profile names one that does not exist.
pub const FALLBACK_CHARSET: &str = "basic";

/// A named, ordered pool of characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharSet {
    pub name: String,
    pub chars: Vec<char>,
    /// Registered at startup rather than by a config file.
    pub builtin: bool,
}

impl CharSet {
    /// Position of `c`, if present.
    #[must_use]
    pub fn position(&self, c: char) -> Option<usize> {
        self.chars.iter().position(|x| *x == c)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

/// A named, growable list of words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSet {
    pub name: String,
    pub words: Vec<String>,
}

/// Registry of charsets and wordsets.
#[derive(Debug, Clone)]
pub struct InputSets {
    charsets: Vec<CharSet>,
    wordsets: Vec<WordSet>,
}

impl Default for InputSets {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSets {
    /// Creates a registry holding the built-in charsets.
    #[must_use]
    pub fn new() -> Self {
        let charsets = BUILTIN_CHARSETS
            .iter()
            .map(|(name, chars)| CharSet {
                name: (*name).to_string(),
                chars: chars.chars().collect(),
                builtin: true,
            })
            .collect();

        Self {
            charsets,
            wordsets: Vec::new(),
        }
    }

    /// Registers or replaces a charset.
    pub fn register_charset(&mut self, name: &str, chars: &str) {
        if chars.is_empty() {
            warn!("charset \"{}\" specified without any characters", name);
            return;
        }

        let chars: Vec<char> = chars.chars().collect();
        match self.charsets.iter_mut().find(|set| set.name.eq_ignore_ascii_case(name)) {
            Some(existing) => {
                debug!("Replacing charset \"{}\"", name);
                existing.chars = chars;
                existing.builtin = false;
            }
            None => {
                debug!("Registering charset \"{}\"", name);
                self.charsets.push(CharSet {
                    name: name.to_string(),
                    chars,
                    builtin: false,
                });
            }
        }
    }

    /// Appends `word` to the wordset `name`, creating the set if needed.
    pub fn register_word(&mut self, name: &str, word: &str) {
        if word.is_empty() {
            return;
        }

        match self.wordsets.iter_mut().find(|set| set.name.eq_ignore_ascii_case(name)) {
            Some(existing) => existing.words.push(word.to_string()),
            None => self.wordsets.push(WordSet {
                name: name.to_string(),
                words: vec![word.to_string()],
            }),
        }
    }

    /// Finds a charset by name.
    #[must_use]
    pub fn charset(&self, name: &str) -> Option<&CharSet> {
        self.charsets.iter().find(|set| set.name.eq_ignore_ascii_case(name))
    }

    /// Finds a wordset by name.
    #[must_use]
    pub fn wordset(&self, name: &str) -> Option<&WordSet> {
        self.wordsets.iter().find(|set| set.name.eq_ignore_ascii_case(name))
    }

    /// All charsets in registration order.
    pub fn charsets(&self) -> impl Iterator<Item = &CharSet> {
        self.charsets.iter()
    }

    /// All wordsets in registration order.
    pub fn wordsets(&self) -> impl Iterator<Item = &WordSet> {
        self.wordsets.iter()
    }
}

/// Character to keystroke table used when typing text.
#[derive(Debug, Clone)]
pub struct CharacterMap {
    strokes: HashMap<char, KeyStroke>,
}

impl CharacterMap {
    /// Placeholder typed for characters with no known key.
    pub const PLACEHOLDER: KeyStroke = KeyStroke::plain(Key::KEY_SPACE);

    /// Builds the table from the characters of `charset` using the
    /// keyboard name table.
    #[must_use]
    pub fn from_charset(charset: &CharSet) -> Self {
        let mut strokes = HashMap::with_capacity(charset.len());

        for c in charset.chars.iter().copied() {
            let mut buf = [0u8; 4];
            match find_key(c.encode_utf8(&mut buf)) {
                Some(entry) => {
                    let shift = entry.modifiers & Modifiers::SHIFT;
                    strokes.insert(c, KeyStroke::new(entry.key, shift));
                }
                None => warn!("No key for character '{}'", c),
            }
        }

        Self { strokes }
    }

    /// Builds the table from the built-in `full` charset.
    #[must_use]
    pub fn builtin() -> Self {
        let full = BUILTIN_CHARSETS
            .iter()
            .find(|(name, _)| *name == FULL_CHARSET)
            .map(|(_, chars)| *chars)
            .unwrap_or_default();

        Self::from_charset(&CharSet {
            name: FULL_CHARSET.to_string(),
            chars: full.chars().collect(),
            builtin: true,
        })
    }

    /// Keystroke for `c`, falling back to [`CharacterMap::PLACEHOLDER`].
    #[must_use]
    pub fn stroke(&self, c: char) -> KeyStroke {
        self.strokes.get(&c).copied().unwrap_or(Self::PLACEHOLDER)
    }
}
