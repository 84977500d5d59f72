//! # Abstract Buttons
//!
//! The fixed set of logical controller inputs the control engine works with.
//!
//! | Name | Source |
//! |------|--------|
//! | `a`, `b`, `x`, `y` | Face buttons |
//! | `l1`, `l2`, `l3`, `r1`, `r2`, `r3` | Shoulders, triggers, stick clicks |
//! | `start`, `back` (alias `select`), `guide` | System buttons |
//! | `up`, `down`, `left`, `right` | D-pad |
//! | `left_analog_up` ... `left_analog_right` | Left stick pushed past its deadzone |
//! | `right_analog_up` ... `right_analog_right` | Right stick pushed past its deadzone |
//!
//! Group names (`dpad`, `left_analog`, `right_analog`) exist only for
//! binding convenience and never carry runtime state.

use std::fmt;
use std::ops::BitOr;

/// Number of abstract buttons.
pub const BUTTON_COUNT: usize = 25;

/// One logical controller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Button {
    A,
    B,
    X,
    Y,
    L1,
    L2,
    L3,
    R1,
    R2,
    R3,
    Start,
    Back,
    Guide,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    LeftStickUp,
    LeftStickDown,
    LeftStickLeft,
    LeftStickRight,
    RightStickUp,
    RightStickDown,
    RightStickLeft,
    RightStickRight,
}

impl Button {
    /// Every button, in index order.
    pub const ALL: [Button; BUTTON_COUNT] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::L1,
        Button::L2,
        Button::L3,
        Button::R1,
        Button::R2,
        Button::R3,
        Button::Start,
        Button::Back,
        Button::Guide,
        Button::DpadUp,
        Button::DpadDown,
        Button::DpadLeft,
        Button::DpadRight,
        Button::LeftStickUp,
        Button::LeftStickDown,
        Button::LeftStickLeft,
        Button::LeftStickRight,
        Button::RightStickUp,
        Button::RightStickDown,
        Button::RightStickLeft,
        Button::RightStickRight,
    ];

    /// Position of this button in per-button arrays.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Bit for this button in a [`ButtonSet`].
    #[must_use]
    pub fn mask(self) -> u32 {
        1 << self.index()
    }

    /// Configuration name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Button::A => "a",
            Button::B => "b",
            Button::X => "x",
            Button::Y => "y",
            Button::L1 => "l1",
            Button::L2 => "l2",
            Button::L3 => "l3",
            Button::R1 => "r1",
            Button::R2 => "r2",
            Button::R3 => "r3",
            Button::Start => "start",
            Button::Back => "back",
            Button::Guide => "guide",
            Button::DpadUp => "up",
            Button::DpadDown => "down",
            Button::DpadLeft => "left",
            Button::DpadRight => "right",
            Button::LeftStickUp => "left_analog_up",
            Button::LeftStickDown => "left_analog_down",
            Button::LeftStickLeft => "left_analog_left",
            Button::LeftStickRight => "left_analog_right",
            Button::RightStickUp => "right_analog_up",
            Button::RightStickDown => "right_analog_down",
            Button::RightStickLeft => "right_analog_left",
            Button::RightStickRight => "right_analog_right",
        }
    }

    /// Parses a button name, case-insensitively. `select` is accepted for
    /// `back`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Button> {
        if name.eq_ignore_ascii_case("select") {
            return Some(Button::Back);
        }

        Button::ALL
            .into_iter()
            .find(|button| button.name().eq_ignore_ascii_case(name))
    }

    /// The group this button belongs to, if any.
    #[must_use]
    pub fn group(self) -> Option<ButtonGroup> {
        ButtonGroup::ALL
            .into_iter()
            .find(|group| group.members().contains(&self))
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Four-button groups that can be bound together and switched into mouse
/// mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonGroup {
    Dpad,
    LeftStick,
    RightStick,
}

impl ButtonGroup {
    /// Every group.
    pub const ALL: [ButtonGroup; 3] = [ButtonGroup::Dpad, ButtonGroup::LeftStick, ButtonGroup::RightStick];

    /// Members in up, down, left, right order.
    #[must_use]
    pub fn members(self) -> [Button; 4] {
        match self {
            ButtonGroup::Dpad => [
                Button::DpadUp,
                Button::DpadDown,
                Button::DpadLeft,
                Button::DpadRight,
            ],
            ButtonGroup::LeftStick => [
                Button::LeftStickUp,
                Button::LeftStickDown,
                Button::LeftStickLeft,
                Button::LeftStickRight,
            ],
            ButtonGroup::RightStick => [
                Button::RightStickUp,
                Button::RightStickDown,
                Button::RightStickLeft,
                Button::RightStickRight,
            ],
        }
    }

    /// Index into per-group arrays.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Configuration name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ButtonGroup::Dpad => "dpad",
            ButtonGroup::LeftStick => "left_analog",
            ButtonGroup::RightStick => "right_analog",
        }
    }

    /// Parses a group name, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<ButtonGroup> {
        ButtonGroup::ALL
            .into_iter()
            .find(|group| group.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for ButtonGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Left-hand side of a binding line: a single button or a whole group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindTarget {
    Button(Button),
    Group(ButtonGroup),
}

impl BindTarget {
    /// Parses a binding name. `hotkey` resolves to the configured hotkey
    /// button.
    #[must_use]
    pub fn parse(name: &str, hotkey: Button) -> Option<BindTarget> {
        if let Some(button) = Button::from_name(name) {
            return Some(BindTarget::Button(button));
        }
        if let Some(group) = ButtonGroup::from_name(name) {
            return Some(BindTarget::Group(group));
        }
        if name.eq_ignore_ascii_case("hotkey") {
            return Some(BindTarget::Button(hotkey));
        }
        None
    }

    /// Buttons written to by this target.
    #[must_use]
    pub fn buttons(self) -> Vec<Button> {
        match self {
            BindTarget::Button(button) => vec![button],
            BindTarget::Group(group) => group.members().to_vec(),
        }
    }

    /// Group whose mouse mode is affected by binding this target.
    #[must_use]
    pub fn group(self) -> Option<ButtonGroup> {
        match self {
            BindTarget::Button(button) => button.group(),
            BindTarget::Group(group) => Some(group),
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            BindTarget::Button(button) => button.name(),
            BindTarget::Group(group) => group.name(),
        }
    }
}

/// Bitmask over [`Button`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonSet(u32);

impl ButtonSet {
    /// Empty set.
    #[must_use]
    pub const fn empty() -> Self {
        ButtonSet(0)
    }

    #[must_use]
    pub fn contains(self, button: Button) -> bool {
        self.0 & button.mask() != 0
    }

    pub fn insert(&mut self, button: Button) {
        self.0 |= button.mask();
    }

    pub fn remove(&mut self, button: Button) {
        self.0 &= !button.mask();
    }

    pub fn set(&mut self, button: Button, on: bool) {
        if on {
            self.insert(button);
        } else {
            self.remove(button);
        }
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true if any button of `group` is in the set.
    #[must_use]
    pub fn any_of(self, group: ButtonGroup) -> bool {
        group.members().into_iter().any(|button| self.contains(button))
    }

    /// Iterates the members in index order.
    pub fn iter(self) -> impl Iterator<Item = Button> {
        Button::ALL.into_iter().filter(move |button| self.contains(*button))
    }
}

impl BitOr for ButtonSet {
    type Output = ButtonSet;

    fn bitor(self, rhs: ButtonSet) -> ButtonSet {
        ButtonSet(self.0 | rhs.0)
    }
}
