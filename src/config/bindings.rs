//! # Binding Parser
//!
//! Applies the value of a button line, e.g. `a = esc add_alt repeat`, to a
//! control profile.
//!
//! Tokens are processed left to right, so later tokens refine or replace
//! earlier ones:
//!
//! | Token | Effect |
//! |-------|--------|
//! | key name | bind the key, switch the group's mouse mode off |
//! | `add_alt`, `add_ctrl`, `add_shift` | add a modifier |
//! | `alt`, `ctrl`, `shift` | modifier when not the first token |
//! | `repeat` | repeat while held |
//! | `parent` / `clear` | inherit / empty, modifiers dropped |
//! | `push_state`, `set_state`, `hold_state` + name | stack action |
//! | `pop_state` | pop action |
//! | special verb | special function, key dropped |
//! | `mouse_movement`, `arrow_keys` | group only |
//!
//! A stack action keeps a key bound earlier on the same line; the key is
//! pressed alongside the stack change.

use evdev::Key;
use tracing::warn;

use crate::config::tokenize::{non_empty, tokenize};
use crate::controls::binding::{Action, ProfileLink, SpecialFunction, StackOp, TriState};
use crate::controls::button::BindTarget;
use crate::controls::profile::{normalise_name, ControlProfile};
use crate::keys::{find_key, Modifiers};

const ARROW_KEYS: [Key; 4] = [Key::KEY_UP, Key::KEY_DOWN, Key::KEY_LEFT, Key::KEY_RIGHT];

/// Applies a binding value to `target` in `profile`.
///
/// Problems are logged and parsing stops at the offending token; the
/// tokens before it stay applied.
///
/// # Examples
///
/// ```
/// use evdev::Key;
/// use padmap::config::bindings::apply_binding;
/// use padmap::controls::binding::Action;
/// use padmap::controls::button::{BindTarget, Button};
/// use padmap::controls::profile::{ProfileId, ProfileStore};
///
/// let mut store = ProfileStore::new();
/// let root = store.get_mut(ProfileId::ROOT);
/// apply_binding(root, BindTarget::Button(Button::A), "enter repeat");
///
/// assert_eq!(root.binding(Button::A).action, Action::Key(Key::KEY_ENTER));
/// assert!(root.binding(Button::A).repeat);
/// ```
pub fn apply_binding(profile: &mut ControlProfile, target: BindTarget, value: &str) {
    let tokens = tokenize(value);
    let mut tokens = non_empty(&tokens);
    let mut first = true;

    while let Some(token) = tokens.next() {
        let lower = token.to_ascii_lowercase();

        if let Some(special) = SpecialFunction::parse(&lower) {
            let BindTarget::Button(button) = target else {
                reject(profile, target, token);
                return;
            };
            if special == SpecialFunction::MouseSlow {
                set_group_mouse(profile, target, TriState::Off);
            }
            let binding = profile.binding_mut(button);
            binding.action = Action::Special(special);
        } else if let Some(op) = stack_op(&lower) {
            let BindTarget::Button(button) = target else {
                reject(profile, target, token);
                return;
            };
            let Some(name) = tokens.next() else {
                warn!("{}: {} without a state specified on {}", profile.name(), lower, target.name());
                return;
            };
            set_group_mouse(profile, target, TriState::Off);
            profile
                .binding_mut(button)
                .set_stack(op, ProfileLink::named(normalise_name(name)));
        } else if lower == "pop_state" {
            let BindTarget::Button(button) = target else {
                reject(profile, target, token);
                return;
            };
            set_group_mouse(profile, target, TriState::Off);
            profile.binding_mut(button).set_pop();
        } else if let Some(modifier) = modifier(&lower, first) {
            for button in target.buttons() {
                profile.binding_mut(button).modifiers |= modifier;
            }
        } else if lower == "repeat" {
            for button in target.buttons() {
                profile.binding_mut(button).repeat = true;
            }
        } else if lower == "parent" {
            set_group_mouse(profile, target, TriState::Inherit);
            for button in target.buttons() {
                profile.binding_mut(button).make_inherit();
            }
        } else if lower == "clear" {
            set_group_mouse(profile, target, TriState::Off);
            for button in target.buttons() {
                profile.binding_mut(button).clear();
            }
        } else if let Some(entry) = find_key(token) {
            // the entry's implied shift is not applied; `A` binds like `a`
            set_group_mouse(profile, target, TriState::Off);
            for button in target.buttons() {
                profile.binding_mut(button).set_key(entry.key);
            }
        } else if lower == "mouse_movement" {
            let BindTarget::Group(group) = target else {
                reject(profile, target, token);
                return;
            };
            profile.set_mouse_mode(group, TriState::On);
            for button in group.members() {
                profile.binding_mut(button).action = Action::None;
            }
        } else if lower == "arrow_keys" {
            let BindTarget::Group(group) = target else {
                reject(profile, target, token);
                return;
            };
            profile.set_mouse_mode(group, TriState::Off);
            for (button, key) in group.members().into_iter().zip(ARROW_KEYS) {
                profile.binding_mut(button).set_key(key);
            }
        } else if token == "\\\"" {
            // escaped empty string
        } else {
            warn!(
                "{}: unknown key \"{}\" in binding: {} = \"{}\"",
                profile.name(),
                token,
                target.name(),
                value
            );
        }

        first = false;
    }
}

fn stack_op(token: &str) -> Option<StackOp> {
    match token {
        "push_state" => Some(StackOp::Push),
        "set_state" => Some(StackOp::Set),
        "hold_state" => Some(StackOp::Hold),
        _ => None,
    }
}

fn modifier(token: &str, first: bool) -> Option<Modifiers> {
    match token {
        "add_alt" => Some(Modifiers::ALT),
        "add_ctrl" => Some(Modifiers::CTRL),
        "add_shift" => Some(Modifiers::SHIFT),
        "alt" if !first => Some(Modifiers::ALT),
        "ctrl" if !first => Some(Modifiers::CTRL),
        "shift" if !first => Some(Modifiers::SHIFT),
        _ => None,
    }
}

fn set_group_mouse(profile: &mut ControlProfile, target: BindTarget, mode: TriState) {
    if let Some(group) = target.group() {
        profile.set_mouse_mode(group, mode);
    }
}

fn reject(profile: &ControlProfile, target: BindTarget, token: &str) {
    warn!("{}: unable to set {} to {}", profile.name(), token, target.name());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::button::{Button, ButtonGroup};
    use crate::controls::profile::{ProfileId, ProfileStore};

    fn root(store: &mut ProfileStore) -> &mut ControlProfile {
        store.get_mut(ProfileId::ROOT)
    }

    fn bind(store: &mut ProfileStore, target: BindTarget, value: &str) {
        apply_binding(root(store), target, value);
    }

    // ====== Key Tests ======

    #[test]
    fn test_key_with_modifiers_and_repeat() {
        let mut store = ProfileStore::new();
        bind(&mut store, BindTarget::Button(Button::A), "f4 add_alt repeat");

        let binding = store.root().binding(Button::A);
        assert_eq!(binding.action, Action::Key(Key::KEY_F4));
        assert_eq!(binding.modifiers, Modifiers::ALT);
        assert!(binding.repeat);
    }

    #[test]
    fn test_bare_modifier_only_after_first_token() {
        let mut store = ProfileStore::new();
        bind(&mut store, BindTarget::Button(Button::B), "alt");
        bind(&mut store, BindTarget::Button(Button::X), "c ctrl");

        assert_eq!(store.root().binding(Button::B).action, Action::Key(Key::KEY_LEFTALT));
        assert_eq!(store.root().binding(Button::B).modifiers, Modifiers::NONE);
        assert_eq!(store.root().binding(Button::X).modifiers, Modifiers::CTRL);
    }

    #[test]
    fn test_uppercase_key_does_not_imply_shift() {
        let mut store = ProfileStore::new();
        bind(&mut store, BindTarget::Button(Button::Y), "A");
        assert_eq!(store.root().binding(Button::Y).modifiers, Modifiers::NONE);
    }

    #[test]
    fn test_quoted_punctuation_key() {
        let mut store = ProfileStore::new();
        bind(&mut store, BindTarget::Button(Button::L1), "\";\"");
        assert_eq!(store.root().binding(Button::L1).action, Action::Key(Key::KEY_SEMICOLON));
    }

    #[test]
    fn test_parent_and_clear_drop_modifiers() {
        let mut store = ProfileStore::new();
        bind(&mut store, BindTarget::Button(Button::A), "a add_shift parent");
        assert!(store.root().binding(Button::A).is_inherit());
        assert_eq!(store.root().binding(Button::A).modifiers, Modifiers::NONE);

        bind(&mut store, BindTarget::Button(Button::A), "b add_shift clear");
        assert_eq!(store.root().binding(Button::A).action, Action::None);
        assert_eq!(store.root().binding(Button::A).modifiers, Modifiers::NONE);
    }

    // ====== Stack Action Tests ======

    #[test]
    fn test_stack_verbs_link_normalised_target() {
        let mut store = ProfileStore::new();
        bind(&mut store, BindTarget::Button(Button::Start), "esc push_state Menu");
        bind(&mut store, BindTarget::Button(Button::Back), "set_state game");
        bind(&mut store, BindTarget::Button(Button::Guide), "hold_state fn");

        match &store.root().binding(Button::Start).action {
            Action::Stack { op, target, key } => {
                assert_eq!(*op, StackOp::Push);
                assert_eq!(target.name, "controls:menu");
                assert_eq!(*key, Some(Key::KEY_ESC), "earlier key is kept");
            }
            other => panic!("expected push, got {:?}", other),
        }
        assert!(matches!(
            store.root().binding(Button::Back).action,
            Action::Stack { op: StackOp::Set, .. }
        ));
        assert!(matches!(
            store.root().binding(Button::Guide).action,
            Action::Stack { op: StackOp::Hold, .. }
        ));
    }

    #[test]
    fn test_key_after_stack_verb_is_kept() {
        let mut store = ProfileStore::new();
        bind(&mut store, BindTarget::Button(Button::Start), "push_state menu esc");

        match &store.root().binding(Button::Start).action {
            Action::Stack { op, key, .. } => {
                assert_eq!(*op, StackOp::Push);
                assert_eq!(*key, Some(Key::KEY_ESC), "later key rides along");
            }
            other => panic!("expected push, got {:?}", other),
        }
    }

    #[test]
    fn test_stack_verb_without_target_is_ignored() {
        let mut store = ProfileStore::new();
        bind(&mut store, BindTarget::Button(Button::Start), "push_state");
        assert_eq!(store.root().binding(Button::Start).action, Action::None);
    }

    #[test]
    fn test_pop_state_keeps_key() {
        let mut store = ProfileStore::new();
        bind(&mut store, BindTarget::Button(Button::B), "esc pop_state");
        assert_eq!(
            store.root().binding(Button::B).action,
            Action::Pop {
                key: Some(Key::KEY_ESC)
            }
        );
    }

    #[test]
    fn test_stack_on_group_member_turns_mouse_off() {
        let mut store = ProfileStore::new();
        root(&mut store).set_mouse_mode(ButtonGroup::Dpad, TriState::On);
        bind(&mut store, BindTarget::Button(Button::DpadUp), "push_state menu");
        assert_eq!(store.root().mouse_mode(ButtonGroup::Dpad), TriState::Off);
    }

    // ====== Special Tests ======

    #[test]
    fn test_special_replaces_key() {
        let mut store = ProfileStore::new();
        bind(&mut store, BindTarget::Button(Button::R1), "a next_letter3");
        assert_eq!(
            store.root().binding(Button::R1).action,
            Action::Special(SpecialFunction::NextLetter(3))
        );
    }

    #[test]
    fn test_mouse_slow_turns_group_mouse_off() {
        let mut store = ProfileStore::new();
        root(&mut store).set_mouse_mode(ButtonGroup::LeftStick, TriState::On);
        bind(&mut store, BindTarget::Button(Button::LeftStickUp), "mouse_slow");
        assert_eq!(store.root().mouse_mode(ButtonGroup::LeftStick), TriState::Off);
    }

    // ====== Group Tests ======

    #[test]
    fn test_group_mouse_movement() {
        let mut store = ProfileStore::new();
        bind(&mut store, BindTarget::Group(ButtonGroup::RightStick), "mouse_movement");

        assert_eq!(store.root().mouse_mode(ButtonGroup::RightStick), TriState::On);
        for button in ButtonGroup::RightStick.members() {
            assert_eq!(store.root().binding(button).action, Action::None);
        }
    }

    #[test]
    fn test_group_arrow_keys() {
        let mut store = ProfileStore::new();
        bind(&mut store, BindTarget::Group(ButtonGroup::LeftStick), "arrow_keys add_shift");

        let profile = store.root();
        assert_eq!(profile.binding(Button::LeftStickUp).action, Action::Key(Key::KEY_UP));
        assert_eq!(profile.binding(Button::LeftStickDown).action, Action::Key(Key::KEY_DOWN));
        assert_eq!(profile.binding(Button::LeftStickLeft).action, Action::Key(Key::KEY_LEFT));
        assert_eq!(profile.binding(Button::LeftStickRight).action, Action::Key(Key::KEY_RIGHT));
        assert!(profile
            .bindings()
            .filter(|(button, _)| button.group() == Some(ButtonGroup::LeftStick))
            .all(|(_, binding)| binding.modifiers == Modifiers::SHIFT));
    }

    #[test]
    fn test_group_parent_sets_mouse_inherit() {
        let mut store = ProfileStore::new();
        bind(&mut store, BindTarget::Group(ButtonGroup::Dpad), "parent");
        assert_eq!(store.root().mouse_mode(ButtonGroup::Dpad), TriState::Inherit);
        assert!(store.root().binding(Button::DpadLeft).is_inherit());
    }

    #[test]
    fn test_group_rejects_single_button_verbs() {
        let mut store = ProfileStore::new();
        bind(&mut store, BindTarget::Group(ButtonGroup::Dpad), "push_state menu");
        bind(&mut store, BindTarget::Group(ButtonGroup::Dpad), "mouse_slow");
        for button in ButtonGroup::Dpad.members() {
            assert_eq!(store.root().binding(button).action, Action::None);
        }
    }

    #[test]
    fn test_mouse_movement_rejected_on_single_button() {
        let mut store = ProfileStore::new();
        bind(&mut store, BindTarget::Button(Button::DpadUp), "mouse_movement");
        assert_eq!(store.root().mouse_mode(ButtonGroup::Dpad), TriState::Off);
    }

    #[test]
    fn test_unknown_token_is_skipped() {
        let mut store = ProfileStore::new();
        bind(&mut store, BindTarget::Button(Button::A), "frobnicate enter");
        assert_eq!(store.root().binding(Button::A).action, Action::Key(Key::KEY_ENTER));
    }
}
