//! # Control-State Stack
//!
//! The ordered list of active profiles plus the per-button hold overlays.
//!
//! Resolution order for any button:
//!
//! 1. Held overlays, most recently activated first.
//! 2. Stack layers, top first.
//!
//! A binding marked inherit is skipped; the first other binding wins. The
//! same precedence decides the effective charset/wordset, the three mouse
//! modes and exclusive grab.

use tracing::{debug, warn};

use crate::controls::binding::{ButtonBinding, TriState};
use crate::controls::button::{Button, ButtonGroup, BUTTON_COUNT};
use crate::controls::profile::{InputSetRef, ProfileId, ProfileStore};

/// Maximum number of stack layers, including the base.
pub const MAX_STACK: usize = 16;

/// A profile held open by a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Hold {
    profile: ProfileId,
    order: u32,
}

/// Where a resolved binding lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingRef {
    /// Profile that owns the binding.
    pub profile: ProfileId,
    /// Button slot within that profile.
    pub button: Button,
}

impl BindingRef {
    /// Fetches the binding from `store`.
    #[must_use]
    pub fn get<'a>(&self, store: &'a ProfileStore) -> &'a ButtonBinding {
        store.get(self.profile).binding(self.button)
    }
}

/// Mouse mode per button group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseModes {
    pub dpad: bool,
    pub left_stick: bool,
    pub right_stick: bool,
}

impl MouseModes {
    /// Mode of `group`.
    #[must_use]
    pub fn get(&self, group: ButtonGroup) -> bool {
        match group {
            ButtonGroup::Dpad => self.dpad,
            ButtonGroup::LeftStick => self.left_stick,
            ButtonGroup::RightStick => self.right_stick,
        }
    }

    fn set(&mut self, group: ButtonGroup, value: bool) {
        match group {
            ButtonGroup::Dpad => self.dpad = value,
            ButtonGroup::LeftStick => self.left_stick = value,
            ButtonGroup::RightStick => self.right_stick = value,
        }
    }
}

/// Settings derived from the current stack and holds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DerivedState {
    /// Charset or wordset that should be loaded, if any.
    pub input_set: Option<InputSetRef>,
    /// Effective mouse mode per group.
    pub mouse: MouseModes,
    /// Whether the controller should be grabbed exclusively.
    pub exclusive: bool,
}

/// Stack of active profiles plus hold overlays.
#[derive(Debug, Clone)]
pub struct ControlStack {
    layers: Vec<ProfileId>,
    holds: [Option<Hold>; BUTTON_COUNT],
    hold_counter: u32,
    derived: DerivedState,
}

impl ControlStack {
    /// Creates a stack with `base` as its only layer.
    #[must_use]
    pub fn new(base: ProfileId) -> Self {
        let mut layers = Vec::with_capacity(MAX_STACK);
        layers.push(base);
        Self {
            layers,
            holds: [None; BUTTON_COUNT],
            hold_counter: 0,
            derived: DerivedState::default(),
        }
    }

    /// Number of layers above the base.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    /// Top layer.
    #[must_use]
    pub fn top(&self) -> ProfileId {
        self.layers[self.layers.len() - 1]
    }

    /// Layers from base to top.
    #[must_use]
    pub fn layers(&self) -> &[ProfileId] {
        &self.layers
    }

    /// Profile held by `button`, if any.
    #[must_use]
    pub fn held_by(&self, button: Button) -> Option<ProfileId> {
        self.holds[button.index()].map(|hold| hold.profile)
    }

    /// State computed by the last [`ControlStack::recompute_derived_state`].
    #[must_use]
    pub fn derived(&self) -> &DerivedState {
        &self.derived
    }

    /// Pushes `profile`.
    ///
    /// Refused when the stack is full: the stack is left untouched and its
    /// contents are logged.
    ///
    /// # Returns
    ///
    /// `true` if the profile was pushed.
    pub fn push(&mut self, store: &ProfileStore, profile: ProfileId) -> bool {
        if self.layers.len() >= MAX_STACK {
            warn!("Maximum control stack depth reached, refusing {}", store.get(profile).name());
            for (i, layer) in self.layers.iter().enumerate() {
                warn!("{:02}) '{}'", i, store.get(*layer).name());
            }
            return false;
        }

        debug!("{}push_state: {}", self.indent(), store.get(profile).name());
        self.layers.push(profile);
        self.recompute_derived_state(store);
        true
    }

    /// Replaces the top layer with `profile`.
    pub fn set(&mut self, store: &ProfileStore, profile: ProfileId) {
        debug!("{}set_state: {}", self.indent(), store.get(profile).name());
        let top = self.layers.len() - 1;
        self.layers[top] = profile;
        self.recompute_derived_state(store);
    }

    /// Removes the top layer. The base layer is never removed.
    ///
    /// # Returns
    ///
    /// `true` if a layer was removed.
    pub fn pop(&mut self, store: &ProfileStore) -> bool {
        if self.layers.len() <= 1 {
            return false;
        }

        debug!("{}pop_state: {}", self.indent(), store.get(self.top()).name());
        self.layers.pop();
        self.recompute_derived_state(store);
        true
    }

    /// Opens `profile` as a hold overlay owned by `button`.
    pub fn push_hold(&mut self, store: &ProfileStore, profile: ProfileId, button: Button) {
        self.hold_counter += 1;
        self.holds[button.index()] = Some(Hold {
            profile,
            order: self.hold_counter,
        });
        debug!("hold_state[{}]: {}", button, store.get(profile).name());
        self.recompute_derived_state(store);
    }

    /// Closes the hold overlay owned by `button`.
    ///
    /// Once no holds remain the activation counter restarts at zero.
    pub fn pop_hold(&mut self, store: &ProfileStore, button: Button) {
        if let Some(hold) = self.holds[button.index()].take() {
            debug!("release_state[{}]: {}", button, store.get(hold.profile).name());
        }

        if self.holds.iter().all(Option::is_none) {
            self.hold_counter = 0;
        }

        self.recompute_derived_state(store);
    }

    /// Profiles in precedence order: holds newest first, then layers top
    /// first.
    fn precedence(&self) -> impl Iterator<Item = ProfileId> + '_ {
        let mut holds: Vec<Hold> = self.holds.iter().flatten().copied().collect();
        holds.sort_by(|a, b| b.order.cmp(&a.order));

        holds
            .into_iter()
            .map(|hold| hold.profile)
            .chain(self.layers.iter().rev().copied())
    }

    /// Finds the binding that currently applies to `button`.
    ///
    /// # Returns
    ///
    /// The first non-inherit binding in precedence order, or `None` if
    /// every active profile inherits for this button.
    #[must_use]
    pub fn resolve(&self, store: &ProfileStore, button: Button) -> Option<BindingRef> {
        self.precedence()
            .find(|profile| !store.get(*profile).binding(button).is_inherit())
            .map(|profile| BindingRef { profile, button })
    }

    /// Recomputes the charset/wordset, mouse modes and exclusivity from
    /// the current holds and layers.
    pub fn recompute_derived_state(&mut self, store: &ProfileStore) {
        let mut derived = DerivedState::default();
        let mut mouse_found = [false; 3];
        let mut exclusive_found = false;

        for id in self.precedence() {
            let profile = store.get(id);

            if derived.input_set.is_none() {
                derived.input_set = profile.input_set.clone();
            }

            for group in ButtonGroup::ALL {
                if mouse_found[group.index()] {
                    continue;
                }
                match profile.mouse_mode(group) {
                    TriState::Inherit => {}
                    mode => {
                        derived.mouse.set(group, mode == TriState::On);
                        mouse_found[group.index()] = true;
                    }
                }
            }

            if !exclusive_found && profile.exclusive != TriState::Inherit {
                derived.exclusive = profile.exclusive == TriState::On;
                exclusive_found = true;
            }
        }

        self.derived = derived;
    }

    fn indent(&self) -> String {
        "  ".repeat(self.depth())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::binding::{Action, OverlayMode};
    use evdev::Key;

    fn store_with(names: &[&str]) -> (ProfileStore, Vec<ProfileId>) {
        let mut store = ProfileStore::new();
        let ids = names.iter().map(|name| store.create_or_get(name)).collect();
        (store, ids)
    }

    fn bind(store: &mut ProfileStore, id: ProfileId, button: Button, key: Key) {
        *store.get_mut(id).binding_mut(button) = ButtonBinding::key(key);
    }

    fn resolved_key(stack: &ControlStack, store: &ProfileStore, button: Button) -> Option<Key> {
        stack
            .resolve(store, button)
            .and_then(|r| r.get(store).action.key())
    }

    // ====== Depth Tests ======

    #[test]
    fn test_push_pop_depth_accounting() {
        let (store, ids) = store_with(&["a"]);
        let mut stack = ControlStack::new(ProfileId::ROOT);

        for _ in 0..5 {
            assert!(stack.push(&store, ids[0]));
        }
        for _ in 0..3 {
            assert!(stack.pop(&store));
        }
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn test_pop_at_base_is_noop() {
        let store = ProfileStore::new();
        let mut stack = ControlStack::new(ProfileId::ROOT);
        assert!(!stack.pop(&store));
        assert!(!stack.pop(&store));
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.top(), ProfileId::ROOT);
    }

    #[test]
    fn test_push_refused_at_max_depth() {
        let (store, ids) = store_with(&["a"]);
        let mut stack = ControlStack::new(ProfileId::ROOT);

        let mut accepted = 0;
        for _ in 0..40 {
            if stack.push(&store, ids[0]) {
                accepted += 1;
            }
        }

        assert_eq!(accepted, MAX_STACK - 1);
        assert_eq!(stack.layers().len(), MAX_STACK);
        assert_eq!(stack.depth(), MAX_STACK - 1);
    }

    #[test]
    fn test_set_replaces_top_without_depth_change() {
        let (store, ids) = store_with(&["a", "b"]);
        let mut stack = ControlStack::new(ProfileId::ROOT);
        stack.push(&store, ids[0]);
        stack.set(&store, ids[1]);
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.top(), ids[1]);

        // set at the base replaces the base
        stack.pop(&store);
        stack.set(&store, ids[0]);
        assert_eq!(stack.layers(), &[ids[0]]);
    }

    // ====== Resolution Tests ======

    #[test]
    fn test_resolve_all_inherit_returns_none() {
        let (mut store, ids) = store_with(&["a"]);
        store.apply_overlay(ProfileId::ROOT, OverlayMode::Parent);
        store.apply_overlay(ids[0], OverlayMode::Parent);

        let mut stack = ControlStack::new(ProfileId::ROOT);
        stack.push(&store, ids[0]);

        assert!(stack.resolve(&store, Button::A).is_none());
    }

    #[test]
    fn test_resolve_falls_through_to_root() {
        let (mut store, ids) = store_with(&["a", "b"]);
        bind(&mut store, ProfileId::ROOT, Button::X, Key::KEY_X);
        store.apply_overlay(ids[0], OverlayMode::Parent);
        store.apply_overlay(ids[1], OverlayMode::Parent);

        let mut stack = ControlStack::new(ProfileId::ROOT);
        stack.push(&store, ids[0]);
        stack.push(&store, ids[1]);

        let found = stack.resolve(&store, Button::X).unwrap();
        assert_eq!(found.profile, ProfileId::ROOT);
        assert_eq!(resolved_key(&stack, &store, Button::X), Some(Key::KEY_X));
    }

    #[test]
    fn test_empty_binding_stops_resolution() {
        let (mut store, ids) = store_with(&["a"]);
        bind(&mut store, ProfileId::ROOT, Button::Y, Key::KEY_Y);

        let mut stack = ControlStack::new(ProfileId::ROOT);
        stack.push(&store, ids[0]);

        let found = stack.resolve(&store, Button::Y).unwrap();
        assert_eq!(found.profile, ids[0], "an empty binding is still concrete");
        assert_eq!(found.get(&store).action, Action::None);
    }

    #[test]
    fn test_hold_order_precedence() {
        let (mut store, ids) = store_with(&["hold_a", "hold_b"]);
        store.apply_overlay(ids[0], OverlayMode::Parent);
        store.apply_overlay(ids[1], OverlayMode::Parent);
        bind(&mut store, ids[0], Button::X, Key::KEY_1);
        bind(&mut store, ids[1], Button::X, Key::KEY_2);
        bind(&mut store, ProfileId::ROOT, Button::X, Key::KEY_0);

        let mut stack = ControlStack::new(ProfileId::ROOT);
        stack.push_hold(&store, ids[0], Button::L1);
        stack.push_hold(&store, ids[1], Button::R1);
        assert_eq!(resolved_key(&stack, &store, Button::X), Some(Key::KEY_2));

        stack.pop_hold(&store, Button::R1);
        assert_eq!(resolved_key(&stack, &store, Button::X), Some(Key::KEY_1));

        stack.pop_hold(&store, Button::L1);
        assert_eq!(resolved_key(&stack, &store, Button::X), Some(Key::KEY_0));
    }

    #[test]
    fn test_hold_only_binding_in_later_hold() {
        let (mut store, ids) = store_with(&["hold_a", "hold_b"]);
        store.apply_overlay(ids[0], OverlayMode::Parent);
        store.apply_overlay(ids[1], OverlayMode::Parent);
        store.apply_overlay(ProfileId::ROOT, OverlayMode::Parent);
        bind(&mut store, ids[1], Button::X, Key::KEY_B);

        let mut stack = ControlStack::new(ProfileId::ROOT);
        stack.push_hold(&store, ids[0], Button::L1);
        stack.push_hold(&store, ids[1], Button::R1);
        assert_eq!(resolved_key(&stack, &store, Button::X), Some(Key::KEY_B));

        stack.pop_hold(&store, Button::R1);
        assert!(stack.resolve(&store, Button::X).is_none());
    }

    #[test]
    fn test_holds_beat_stack_layers() {
        let (mut store, ids) = store_with(&["layer", "hold"]);
        bind(&mut store, ids[0], Button::A, Key::KEY_L);
        bind(&mut store, ids[1], Button::A, Key::KEY_H);

        let mut stack = ControlStack::new(ProfileId::ROOT);
        stack.push_hold(&store, ids[1], Button::Guide);
        stack.push(&store, ids[0]);

        assert_eq!(resolved_key(&stack, &store, Button::A), Some(Key::KEY_H));
    }

    #[test]
    fn test_hold_counter_resets_when_empty() {
        let (store, ids) = store_with(&["h"]);
        let mut stack = ControlStack::new(ProfileId::ROOT);
        stack.push_hold(&store, ids[0], Button::A);
        stack.push_hold(&store, ids[0], Button::B);
        assert_eq!(stack.hold_counter, 2);

        stack.pop_hold(&store, Button::A);
        assert_eq!(stack.hold_counter, 2);
        stack.pop_hold(&store, Button::B);
        assert_eq!(stack.hold_counter, 0);
        assert!(stack.held_by(Button::A).is_none());
    }

    // ====== Derived State Tests ======

    #[test]
    fn test_derived_mouse_mode_precedence() {
        let (mut store, ids) = store_with(&["mouse", "layer"]);
        store.get_mut(ids[0]).set_mouse_mode(ButtonGroup::Dpad, TriState::On);
        store.apply_overlay(ids[1], OverlayMode::Parent);

        let mut stack = ControlStack::new(ProfileId::ROOT);
        assert!(!stack.derived().mouse.dpad);

        stack.push(&store, ids[0]);
        stack.push(&store, ids[1]);
        assert!(stack.derived().mouse.dpad, "inherit falls through to the layer below");
        assert!(!stack.derived().mouse.left_stick);

        stack.pop(&store);
        stack.pop(&store);
        assert!(!stack.derived().mouse.dpad);
    }

    #[test]
    fn test_derived_mouse_defaults_off_when_all_inherit() {
        let mut store = ProfileStore::new();
        store.apply_overlay(ProfileId::ROOT, OverlayMode::Parent);
        let mut stack = ControlStack::new(ProfileId::ROOT);
        stack.recompute_derived_state(&store);
        assert_eq!(stack.derived().mouse, MouseModes::default());
        assert!(!stack.derived().exclusive);
    }

    #[test]
    fn test_derived_input_set_first_wins() {
        let (mut store, ids) = store_with(&["chars", "words"]);
        store.get_mut(ids[0]).input_set = Some(InputSetRef::Charset("basic".to_string()));
        store.get_mut(ids[1]).input_set = Some(InputSetRef::Wordset("names".to_string()));

        let mut stack = ControlStack::new(ProfileId::ROOT);
        stack.push(&store, ids[0]);
        stack.push_hold(&store, ids[1], Button::L2);
        assert_eq!(
            stack.derived().input_set,
            Some(InputSetRef::Wordset("names".to_string()))
        );

        stack.pop_hold(&store, Button::L2);
        assert_eq!(
            stack.derived().input_set,
            Some(InputSetRef::Charset("basic".to_string()))
        );
    }

    #[test]
    fn test_derived_exclusive() {
        let (mut store, ids) = store_with(&["grab"]);
        store.get_mut(ids[0]).exclusive = TriState::On;

        let mut stack = ControlStack::new(ProfileId::ROOT);
        stack.push(&store, ids[0]);
        assert!(stack.derived().exclusive);
        stack.pop(&store);
        assert!(!stack.derived().exclusive);
    }
}
