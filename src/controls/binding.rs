//! # Button Bindings
//!
//! What a single button does inside one control profile.
//!
//! A binding is a tagged [`Action`] plus a modifier mask and an independent
//! repeat flag. Stack actions carry a [`ProfileLink`]: the target name as
//! written in the config, and the resolved profile id once the store has
//! been finalised.

use std::fmt;

use evdev::Key;

use crate::controls::profile::ProfileId;
use crate::keys::{key_name, KeyStroke, Modifiers};

/// Special functions a button can trigger instead of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialFunction {
    /// Slow down mouse motion while held.
    MouseSlow,
    /// Append the cursor character to the text buffer.
    AddLetter,
    /// Erase the last character of the text buffer.
    RemoveLetter,
    /// Cycle the cursor character forward.
    NextLetter(i32),
    /// Cycle the cursor character backward.
    PrevLetter(i32),
    /// Select the next word of the active word set.
    NextWord(i32),
    /// Select the previous word of the active word set.
    PrevWord(i32),
    UpperCase,
    LowerCase,
    ToggleCase,
    /// Press Enter and leave the text-entry profile.
    FinishText,
    /// Erase the typed text and leave the text-entry profile.
    CancelText,
}

impl SpecialFunction {
    /// Parses a special-function verb.
    ///
    /// Cycling verbs accept a numeric suffix as the step amount, so
    /// `next_letter5` steps five characters. Without a suffix the amount
    /// is 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use padmap::controls::binding::SpecialFunction;
    ///
    /// assert_eq!(SpecialFunction::parse("next_letter"), Some(SpecialFunction::NextLetter(1)));
    /// assert_eq!(SpecialFunction::parse("PREV_WORD3"), Some(SpecialFunction::PrevWord(3)));
    /// assert_eq!(SpecialFunction::parse("jump"), None);
    /// ```
    #[must_use]
    pub fn parse(token: &str) -> Option<SpecialFunction> {
        let lower = token.to_ascii_lowercase();

        let fixed = match lower.as_str() {
            "mouse_slow" => Some(SpecialFunction::MouseSlow),
            "add_letter" => Some(SpecialFunction::AddLetter),
            "remove_letter" => Some(SpecialFunction::RemoveLetter),
            "upper_case" => Some(SpecialFunction::UpperCase),
            "lower_case" => Some(SpecialFunction::LowerCase),
            "toggle_case" => Some(SpecialFunction::ToggleCase),
            "finish_text" => Some(SpecialFunction::FinishText),
            "cancel_text" => Some(SpecialFunction::CancelText),
            _ => None,
        };
        if fixed.is_some() {
            return fixed;
        }

        let stepped: [(&str, fn(i32) -> SpecialFunction); 4] = [
            ("next_letter", SpecialFunction::NextLetter),
            ("prev_letter", SpecialFunction::PrevLetter),
            ("next_word", SpecialFunction::NextWord),
            ("prev_word", SpecialFunction::PrevWord),
        ];

        for (prefix, make) in stepped {
            if let Some(rest) = lower.strip_prefix(prefix) {
                if rest.is_empty() {
                    return Some(make(1));
                }
                return rest.parse::<i32>().ok().filter(|n| *n > 0).map(make);
            }
        }

        None
    }

    /// Returns true for functions handled by the text-entry engine.
    #[must_use]
    pub fn is_text(self) -> bool {
        !matches!(self, SpecialFunction::MouseSlow)
    }
}

impl fmt::Display for SpecialFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stepped = |f: &mut fmt::Formatter<'_>, name: &str, n: i32| {
            if n == 1 {
                f.write_str(name)
            } else {
                write!(f, "{}{}", name, n)
            }
        };

        match *self {
            SpecialFunction::MouseSlow => f.write_str("mouse_slow"),
            SpecialFunction::AddLetter => f.write_str("add_letter"),
            SpecialFunction::RemoveLetter => f.write_str("remove_letter"),
            SpecialFunction::NextLetter(n) => stepped(f, "next_letter", n),
            SpecialFunction::PrevLetter(n) => stepped(f, "prev_letter", n),
            SpecialFunction::NextWord(n) => stepped(f, "next_word", n),
            SpecialFunction::PrevWord(n) => stepped(f, "prev_word", n),
            SpecialFunction::UpperCase => f.write_str("upper_case"),
            SpecialFunction::LowerCase => f.write_str("lower_case"),
            SpecialFunction::ToggleCase => f.write_str("toggle_case"),
            SpecialFunction::FinishText => f.write_str("finish_text"),
            SpecialFunction::CancelText => f.write_str("cancel_text"),
        }
    }
}

/// Stack operations that name a target profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackOp {
    /// Push the target on top of the stack.
    Push,
    /// Replace the top of the stack with the target.
    Set,
    /// Overlay the target only while the button is held.
    Hold,
}

impl StackOp {
    /// Configuration verb.
    #[must_use]
    pub fn verb(self) -> &'static str {
        match self {
            StackOp::Push => "push_state",
            StackOp::Set => "set_state",
            StackOp::Hold => "hold_state",
        }
    }
}

/// Reference from a binding to another profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileLink {
    /// Normalised target name.
    pub name: String,
    /// Resolved target, set by the store's finalise pass.
    pub id: Option<ProfileId>,
}

impl ProfileLink {
    /// Creates an unresolved link.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
        }
    }
}

/// What a binding does when its button is pressed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Action {
    /// Nothing. Still a concrete binding: it stops resolution.
    #[default]
    None,
    /// Defer to the profile below on the stack.
    Inherit,
    /// Press a key.
    Key(Key),
    /// Trigger a special function.
    Special(SpecialFunction),
    /// Pop the stack, optionally pressing a key as well.
    Pop { key: Option<Key> },
    /// Push, set or hold a target profile, optionally pressing a key as well.
    Stack {
        op: StackOp,
        target: ProfileLink,
        key: Option<Key>,
    },
}

impl Action {
    /// Key pressed by this action, if any.
    #[must_use]
    pub fn key(&self) -> Option<Key> {
        match self {
            Action::Key(key) => Some(*key),
            Action::Pop { key } | Action::Stack { key, .. } => *key,
            _ => None,
        }
    }
}

/// A button's binding within one profile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ButtonBinding {
    pub action: Action,
    pub modifiers: Modifiers,
    pub repeat: bool,
}

impl ButtonBinding {
    /// A binding that defers to the profile below.
    #[must_use]
    pub fn inherit() -> Self {
        Self {
            action: Action::Inherit,
            ..Self::default()
        }
    }

    /// A plain key binding.
    #[must_use]
    pub fn key(key: Key) -> Self {
        Self {
            action: Action::Key(key),
            ..Self::default()
        }
    }

    /// Returns true if resolution should skip past this binding.
    #[must_use]
    pub fn is_inherit(&self) -> bool {
        matches!(self.action, Action::Inherit)
    }

    /// Keystroke emitted on press and release, if any.
    #[must_use]
    pub fn keystroke(&self) -> Option<KeyStroke> {
        self.action.key().map(|key| KeyStroke::new(key, self.modifiers))
    }

    /// Sets the key. Stack and pop actions keep their action and press the
    /// key alongside it; anything else becomes a plain key binding.
    pub fn set_key(&mut self, key: Key) {
        match &mut self.action {
            Action::Pop { key: slot } | Action::Stack { key: slot, .. } => *slot = Some(key),
            action => *action = Action::Key(key),
        }
    }

    /// Switches to a stack action, keeping any key already bound.
    pub fn set_stack(&mut self, op: StackOp, target: ProfileLink) {
        let key = self.action.key();
        self.action = Action::Stack { op, target, key };
    }

    /// Switches to a pop action, keeping any key already bound.
    pub fn set_pop(&mut self) {
        let key = self.action.key();
        self.action = Action::Pop { key };
    }

    /// Resets to an empty binding.
    pub fn clear(&mut self) {
        self.action = Action::None;
        self.modifiers = Modifiers::NONE;
    }

    /// Resets to an inheriting binding.
    pub fn make_inherit(&mut self) {
        self.action = Action::Inherit;
        self.modifiers = Modifiers::NONE;
    }
}

impl fmt::Display for ButtonBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();

        match &self.action {
            Action::None => parts.push("clear".to_string()),
            Action::Inherit => parts.push("parent".to_string()),
            Action::Key(key) => parts.push(key_name(*key)),
            Action::Special(special) => parts.push(special.to_string()),
            Action::Pop { key } => {
                if let Some(key) = key {
                    parts.push(key_name(*key));
                }
                parts.push("pop_state".to_string());
            }
            Action::Stack { op, target, key } => {
                if let Some(key) = key {
                    parts.push(key_name(*key));
                }
                parts.push(op.verb().to_string());
                let short = target.name.strip_prefix("controls:").unwrap_or(&target.name);
                parts.push(short.to_string());
            }
        }

        if !self.modifiers.is_empty() {
            parts.push(self.modifiers.to_string());
        }
        if self.repeat {
            parts.push("repeat".to_string());
        }

        let rendered: Vec<String> = parts
            .into_iter()
            .map(|part| {
                if part.is_empty() || part.contains(char::is_whitespace) || part.contains(['"', ';', '#']) {
                    if part.contains('"') {
                        format!("'{}'", part)
                    } else {
                        format!("\"{}\"", part)
                    }
                } else {
                    part
                }
            })
            .collect();

        f.write_str(&rendered.join(" "))
    }
}

/// Three-valued per-profile setting: explicitly off, explicitly on, or
/// taken from the profile below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriState {
    #[default]
    Off,
    On,
    Inherit,
}

impl TriState {
    /// Parses `true`/`false`/`parent`. Anything else is `Off`.
    #[must_use]
    pub fn parse(value: &str) -> TriState {
        if value.eq_ignore_ascii_case("parent") {
            TriState::Inherit
        } else if value.eq_ignore_ascii_case("true") {
            TriState::On
        } else {
            TriState::Off
        }
    }

    /// Configuration spelling.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            TriState::Off => "false",
            TriState::On => "true",
            TriState::Inherit => "parent",
        }
    }
}

/// Last overlay applied to a profile, kept for config dumps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OverlayMode {
    #[default]
    None,
    Parent,
    Clear,
    Named(String),
}

impl fmt::Display for OverlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayMode::None => f.write_str("(none)"),
            OverlayMode::Parent => f.write_str("parent"),
            OverlayMode::Clear => f.write_str("clear"),
            OverlayMode::Named(name) => f.write_str(name.strip_prefix("controls:").unwrap_or(name)),
        }
    }
}
