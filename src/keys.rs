//! # Keyboard Name Table
//!
//! Maps the key names accepted in configuration files to evdev key codes.
//!
//! Some names carry an implied modifier: uppercase letters and shifted
//! punctuation (`"A"`, `"!"`, `"_"`) resolve to the unshifted key plus
//! [`Modifiers::SHIFT`]. Binding parsing only takes the key code from a
//! lookup, while the text-entry character table keeps the modifier.
//!
//! ## Lookup Rules
//!
//! [`find_key`] tries an exact match first and then a case-insensitive
//! one, so `"A"` finds the shifted entry but `"Esc"` still finds `"esc"`.
//!
//! ```
//! use padmap::keys::{find_key, Modifiers};
//! use evdev::Key;
//!
//! let entry = find_key("A").unwrap();
//! assert_eq!(entry.key, Key::KEY_A);
//! assert_eq!(entry.modifiers, Modifiers::SHIFT);
//!
//! assert_eq!(find_key("ESC").unwrap().key, Key::KEY_ESC);
//! ```

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use evdev::Key;

/// Bitmask of modifier keys held around a synthesized key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u8);

impl Modifiers {
    /// No modifiers.
    pub const NONE: Modifiers = Modifiers(0);
    /// Left shift.
    pub const SHIFT: Modifiers = Modifiers(1);
    /// Left control.
    pub const CTRL: Modifiers = Modifiers(2);
    /// Left alt.
    pub const ALT: Modifiers = Modifiers(4);

    /// Emission order for modifier keys: shift, then alt, then ctrl.
    pub const ORDER: [(Modifiers, Key); 3] = [
        (Modifiers::SHIFT, Key::KEY_LEFTSHIFT),
        (Modifiers::ALT, Key::KEY_LEFTALT),
        (Modifiers::CTRL, Key::KEY_LEFTCTRL),
    ];

    /// Returns true if every bit of `other` is set in `self`.
    #[must_use]
    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if no modifier is set.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw mask value.
    #[must_use]
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Modifier keys to hold, in emission order.
    pub fn keys(self) -> impl Iterator<Item = Key> {
        Self::ORDER
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, key)| key)
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Self) -> Self::Output {
        Modifiers(self.0 | rhs.0)
    }
}

impl BitAnd for Modifiers {
    type Output = Modifiers;

    fn bitand(self, rhs: Self) -> Self::Output {
        Modifiers(self.0 & rhs.0)
    }
}

impl BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (flag, name) in [
            (Modifiers::SHIFT, "add_shift"),
            (Modifiers::ALT, "add_alt"),
            (Modifiers::CTRL, "add_ctrl"),
        ] {
            if self.contains(flag) {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A key code together with the modifiers held around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyStroke {
    /// Key to press.
    pub key: Key,
    /// Modifiers held while the key is down.
    pub modifiers: Modifiers,
}

impl KeyStroke {
    /// Creates a keystroke.
    #[must_use]
    pub const fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Creates a keystroke with no modifiers.
    #[must_use]
    pub const fn plain(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }
}

/// One row of the keyboard name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEntry {
    /// Name as written in configuration files.
    pub name: &'static str,
    /// Key code.
    pub key: Key,
    /// Modifier implied by the name (shift for uppercase letters and
    /// shifted punctuation).
    pub modifiers: Modifiers,
}

const fn k(name: &'static str, key: Key) -> KeyEntry {
    KeyEntry {
        name,
        key,
        modifiers: Modifiers::NONE,
    }
}

const fn s(name: &'static str, key: Key) -> KeyEntry {
    KeyEntry {
        name,
        key,
        modifiers: Modifiers::SHIFT,
    }
}

static KEYBOARD: &[KeyEntry] = &[
    k("up", Key::KEY_UP),
    k("down", Key::KEY_DOWN),
    k("left", Key::KEY_LEFT),
    k("right", Key::KEY_RIGHT),
    k("mouse_left", Key::BTN_LEFT),
    k("mouse_right", Key::BTN_RIGHT),
    k("mouse_middle", Key::BTN_MIDDLE),
    k("space", Key::KEY_SPACE),
    k(" ", Key::KEY_SPACE),
    k("esc", Key::KEY_ESC),
    k("end", Key::KEY_END),
    k("home", Key::KEY_HOME),
    k("shift", Key::KEY_LEFTSHIFT),
    k("leftshift", Key::KEY_LEFTSHIFT),
    k("left_shift", Key::KEY_LEFTSHIFT),
    k("rightshift", Key::KEY_RIGHTSHIFT),
    k("right_shift", Key::KEY_RIGHTSHIFT),
    k("ctrl", Key::KEY_LEFTCTRL),
    k("leftctrl", Key::KEY_LEFTCTRL),
    k("left_ctrl", Key::KEY_LEFTCTRL),
    k("rightctrl", Key::KEY_RIGHTCTRL),
    k("right_ctrl", Key::KEY_RIGHTCTRL),
    k("alt", Key::KEY_LEFTALT),
    k("leftalt", Key::KEY_LEFTALT),
    k("left_alt", Key::KEY_LEFTALT),
    k("rightalt", Key::KEY_RIGHTALT),
    k("right_alt", Key::KEY_RIGHTALT),
    k("backspace", Key::KEY_BACKSPACE),
    k("enter", Key::KEY_ENTER),
    k("pageup", Key::KEY_PAGEUP),
    k("page_up", Key::KEY_PAGEUP),
    k("pagedown", Key::KEY_PAGEDOWN),
    k("page_down", Key::KEY_PAGEDOWN),
    k("insert", Key::KEY_INSERT),
    k("delete", Key::KEY_DELETE),
    k("capslock", Key::KEY_CAPSLOCK),
    k("tab", Key::KEY_TAB),
    k("pause", Key::KEY_PAUSE),
    k("menu", Key::KEY_MENU),
    // letters
    k("a", Key::KEY_A),
    k("b", Key::KEY_B),
    k("c", Key::KEY_C),
    k("d", Key::KEY_D),
    k("e", Key::KEY_E),
    k("f", Key::KEY_F),
    k("g", Key::KEY_G),
    k("h", Key::KEY_H),
    k("i", Key::KEY_I),
    k("j", Key::KEY_J),
    k("k", Key::KEY_K),
    k("l", Key::KEY_L),
    k("m", Key::KEY_M),
    k("n", Key::KEY_N),
    k("o", Key::KEY_O),
    k("p", Key::KEY_P),
    k("q", Key::KEY_Q),
    k("r", Key::KEY_R),
    k("s", Key::KEY_S),
    k("t", Key::KEY_T),
    k("u", Key::KEY_U),
    k("v", Key::KEY_V),
    k("w", Key::KEY_W),
    k("x", Key::KEY_X),
    k("y", Key::KEY_Y),
    k("z", Key::KEY_Z),
    s("A", Key::KEY_A),
    s("B", Key::KEY_B),
    s("C", Key::KEY_C),
    s("D", Key::KEY_D),
    s("E", Key::KEY_E),
    s("F", Key::KEY_F),
    s("G", Key::KEY_G),
    s("H", Key::KEY_H),
    s("I", Key::KEY_I),
    s("J", Key::KEY_J),
    s("K", Key::KEY_K),
    s("L", Key::KEY_L),
    s("M", Key::KEY_M),
    s("N", Key::KEY_N),
    s("O", Key::KEY_O),
    s("P", Key::KEY_P),
    s("Q", Key::KEY_Q),
    s("R", Key::KEY_R),
    s("S", Key::KEY_S),
    s("T", Key::KEY_T),
    s("U", Key::KEY_U),
    s("V", Key::KEY_V),
    s("W", Key::KEY_W),
    s("X", Key::KEY_X),
    s("Y", Key::KEY_Y),
    s("Z", Key::KEY_Z),
    // number row
    k("1", Key::KEY_1),
    k("2", Key::KEY_2),
    k("3", Key::KEY_3),
    k("4", Key::KEY_4),
    k("5", Key::KEY_5),
    k("6", Key::KEY_6),
    k("7", Key::KEY_7),
    k("8", Key::KEY_8),
    k("9", Key::KEY_9),
    k("0", Key::KEY_0),
    s(")", Key::KEY_0),
    s("!", Key::KEY_1),
    s("@", Key::KEY_2),
    s("#", Key::KEY_3),
    s("$", Key::KEY_4),
    s("%", Key::KEY_5),
    s("^", Key::KEY_6),
    s("&", Key::KEY_7),
    s("*", Key::KEY_8),
    s("(", Key::KEY_9),
    k("-", Key::KEY_MINUS),
    s("+", Key::KEY_EQUAL),
    // function keys
    k("f1", Key::KEY_F1),
    k("f2", Key::KEY_F2),
    k("f3", Key::KEY_F3),
    k("f4", Key::KEY_F4),
    k("f5", Key::KEY_F5),
    k("f6", Key::KEY_F6),
    k("f7", Key::KEY_F7),
    k("f8", Key::KEY_F8),
    k("f9", Key::KEY_F9),
    k("f10", Key::KEY_F10),
    k("f11", Key::KEY_F11),
    k("f12", Key::KEY_F12),
    // punctuation
    k("'", Key::KEY_APOSTROPHE),
    s("\"", Key::KEY_APOSTROPHE),
    k(";", Key::KEY_SEMICOLON),
    k("/", Key::KEY_SLASH),
    k(".", Key::KEY_DOT),
    k(",", Key::KEY_COMMA),
    k("`", Key::KEY_GRAVE),
    k("=", Key::KEY_EQUAL),
    k("[", Key::KEY_LEFTBRACE),
    k("]", Key::KEY_RIGHTBRACE),
    k("\\", Key::KEY_BACKSLASH),
    s(":", Key::KEY_SEMICOLON),
    s("?", Key::KEY_SLASH),
    s("<", Key::KEY_COMMA),
    s(">", Key::KEY_DOT),
    s("~", Key::KEY_GRAVE),
    s("|", Key::KEY_BACKSLASH),
    s("{", Key::KEY_LEFTBRACE),
    s("}", Key::KEY_RIGHTBRACE),
    s("_", Key::KEY_MINUS),
];

/// Looks up a key by configuration name.
///
/// # Arguments
///
/// * `name` - Key name, e.g. `"enter"`, `"f5"`, `"A"` or `"?"`
///
/// # Returns
///
/// The matching table entry, or `None` if the name is unknown.
#[must_use]
pub fn find_key(name: &str) -> Option<&'static KeyEntry> {
    KEYBOARD
        .iter()
        .find(|entry| entry.name == name)
        .or_else(|| KEYBOARD.iter().find(|entry| entry.name.eq_ignore_ascii_case(name)))
}

/// Returns the first configuration name for a key code.
///
/// Used for diagnostics and config dumps. Codes that are not in the table
/// are rendered as their numeric value.
#[must_use]
pub fn key_name(key: Key) -> String {
    KEYBOARD
        .iter()
        .find(|entry| entry.key == key)
        .map(|entry| entry.name.to_string())
        .unwrap_or_else(|| format!("key_{}", key.code()))
}

/// All table entries, in table order.
pub fn entries() -> impl Iterator<Item = &'static KeyEntry> {
    KEYBOARD.iter()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ====== Lookup Tests ======

    #[test]
    fn test_find_key_exact_lowercase() {
        let entry = find_key("a").unwrap();
        assert_eq!(entry.key, Key::KEY_A);
        assert!(entry.modifiers.is_empty(), "lowercase letters carry no modifier");
    }

    #[test]
    fn test_find_key_uppercase_is_shifted() {
        let entry = find_key("Q").unwrap();
        assert_eq!(entry.key, Key::KEY_Q);
        assert_eq!(entry.modifiers, Modifiers::SHIFT);
    }

    #[test]
    fn test_find_key_case_insensitive_fallback() {
        assert_eq!(find_key("ENTER").unwrap().key, Key::KEY_ENTER);
        assert_eq!(find_key("F10").unwrap().key, Key::KEY_F10);
    }

    #[test]
    fn test_find_key_punctuation() {
        assert_eq!(find_key("\"").unwrap().key, Key::KEY_APOSTROPHE);
        assert_eq!(find_key("\"").unwrap().modifiers, Modifiers::SHIFT);
        assert_eq!(find_key("_").unwrap().key, Key::KEY_MINUS);
        assert_eq!(find_key(" ").unwrap().key, Key::KEY_SPACE);
    }

    #[test]
    fn test_find_key_unknown() {
        assert!(find_key("not_a_key").is_none());
        assert!(find_key("").is_none());
    }

    #[test]
    fn test_key_name_reverse_lookup() {
        assert_eq!(key_name(Key::KEY_UP), "up");
        assert_eq!(key_name(Key::KEY_A), "a");
        assert_eq!(key_name(Key::KEY_VOLUMEUP), format!("key_{}", Key::KEY_VOLUMEUP.code()));
    }

    // ====== Modifier Tests ======

    #[test]
    fn test_modifiers_combine() {
        let mods = Modifiers::SHIFT | Modifiers::CTRL;
        assert!(mods.contains(Modifiers::SHIFT));
        assert!(mods.contains(Modifiers::CTRL));
        assert!(!mods.contains(Modifiers::ALT));
        assert_eq!(mods.bits(), 3);
    }

    #[test]
    fn test_modifier_key_order() {
        let mods = Modifiers::CTRL | Modifiers::ALT | Modifiers::SHIFT;
        let keys: Vec<Key> = mods.keys().collect();
        assert_eq!(
            keys,
            vec![Key::KEY_LEFTSHIFT, Key::KEY_LEFTALT, Key::KEY_LEFTCTRL],
            "modifiers must be pressed shift, alt, ctrl"
        );
    }

    #[test]
    fn test_modifiers_display() {
        assert_eq!(Modifiers::NONE.to_string(), "");
        assert_eq!((Modifiers::SHIFT | Modifiers::CTRL).to_string(), "add_shift add_ctrl");
    }
}
