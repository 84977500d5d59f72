//! # Control Engine
//!
//! The per-button state machine that turns controller input into keys,
//! pointer motion, stack changes and text entry.
//!
//! The engine is driven by two calls:
//!
//! * [`Engine::handle_event`] records button edges and axis samples.
//! * [`Engine::tick`] compares the pressed set with the previous tick,
//!   runs press and release handling, fires due repeats and moves the
//!   pointer.
//!
//! A press resolves the button through the [`ControlStack`] once and
//! caches the result, so the matching release and any repeats use the
//! same binding even if the stack changes while the button is held.
//!
//! Output failures are logged and absorbed; the engine keeps running.
//!
//! ## Example
//!
//! ```
//! use padmap::config::ConfigLoader;
//! use padmap::controller::events::ControllerEvent;
//! use padmap::controls::button::Button;
//! use padmap::controls::engine::Engine;
//! # use padmap::keys::KeyStroke;
//! # use padmap::output::sink::InputSink;
//! # struct Null;
//! # impl InputSink for Null {
//! #     fn emit_key(&mut self, _: KeyStroke, _: bool) -> padmap::error::Result<()> { Ok(()) }
//! #     fn emit_mouse_motion(&mut self, _: i32, _: i32) -> padmap::error::Result<()> { Ok(()) }
//! # }
//!
//! let mut loader = ConfigLoader::new();
//! loader.load_str("[controls]\nstart = push_state menu\n[controls:menu]\n", false);
//! let mut engine = Engine::new(loader.finish(), Box::new(Null));
//!
//! engine.handle_event(ControllerEvent::Button { button: Button::Start, pressed: true });
//! engine.tick(0);
//! assert_eq!(engine.stack().depth(), 1);
//! ```

use tracing::{debug, info, warn};

use crate::config::{Config, Settings};
use crate::controller::deadzone::{setting_to_fraction, trigger_clamp, Vector2};
use crate::controller::events::{Axis, ControllerEvent};
use crate::controller::mouse::{MouseMotion, MouseTuning, MOTION_TICK_MS};
use crate::controls::binding::{Action, SpecialFunction, StackOp};
use crate::controls::button::{Button, ButtonGroup, ButtonSet, BUTTON_COUNT};
use crate::controls::profile::{InputSetRef, ProfileId, ProfileStore};
use crate::controls::stack::{BindingRef, ControlStack};
use crate::keys::KeyStroke;
use crate::output::sink::InputSink;
use crate::process::ProcessControl;
use crate::text::{InputSets, TextEntry};

const LEFT: usize = 0;
const RIGHT: usize = 1;

/// Resolution engine and runtime button state.
pub struct Engine {
    store: ProfileStore,
    sets: InputSets,
    settings: Settings,
    stack: ControlStack,
    text: TextEntry,
    mouse: MouseMotion,
    sink: Box<dyn InputSink>,
    process: Option<Box<dyn ProcessControl>>,

    /// Buttons reported pressed by the device.
    digital: ButtonSet,
    /// Buttons pressed by stick and trigger deflection.
    analog: ButtonSet,
    previous: ButtonSet,
    in_repeat: ButtonSet,
    hold_pushed: ButtonSet,
    mouse_slow: ButtonSet,
    mouse_move: ButtonSet,
    next_repeat: [u64; BUTTON_COUNT],
    held: [Option<BindingRef>; BUTTON_COUNT],

    sticks: [Vector2; 2],
    triggers: [f32; 2],
    next_motion: Option<u64>,

    exclusive: bool,
    pending_grab: Option<bool>,
    running: bool,
}

impl Engine {
    /// Creates an engine over a finalised configuration.
    ///
    /// The stack starts in the profile named by `settings.controls`, or the
    /// root profile if that name is unknown.
    #[must_use]
    pub fn new(config: Config, sink: Box<dyn InputSink>) -> Self {
        let Config {
            settings,
            profiles: store,
            sets,
        } = config;

        let base = store.find(&settings.controls).unwrap_or_else(|| {
            warn!("Unable to find control profile \"{}\", using root", settings.controls);
            ProfileId::ROOT
        });
        info!("Starting in control profile {}", store.get(base).name());

        let mut stack = ControlStack::new(base);
        stack.recompute_derived_state(&store);
        let mouse = MouseMotion::new(MouseTuning::from(&settings));

        let mut engine = Self {
            store,
            sets,
            settings,
            stack,
            text: TextEntry::new(),
            mouse,
            sink,
            process: None,
            digital: ButtonSet::empty(),
            analog: ButtonSet::empty(),
            previous: ButtonSet::empty(),
            in_repeat: ButtonSet::empty(),
            hold_pushed: ButtonSet::empty(),
            mouse_slow: ButtonSet::empty(),
            mouse_move: ButtonSet::empty(),
            next_repeat: [0; BUTTON_COUNT],
            held: [None; BUTTON_COUNT],
            sticks: [Vector2::ZERO; 2],
            triggers: [0.0; 2],
            next_motion: None,
            exclusive: false,
            pending_grab: None,
            running: true,
        };
        engine.sync_derived_state();
        engine
    }

    /// Sets the process terminated by the start + hotkey combo.
    #[must_use]
    pub fn with_process(mut self, process: Box<dyn ProcessControl>) -> Self {
        self.process = Some(process);
        self
    }

    #[must_use]
    pub fn stack(&self) -> &ControlStack {
        &self.stack
    }

    #[must_use]
    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    #[must_use]
    pub fn text(&self) -> &TextEntry {
        &self.text
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// False once the quit combo has been pressed.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Buttons pressed as of the last tick.
    #[must_use]
    pub fn pressed(&self) -> ButtonSet {
        self.previous
    }

    /// Takes the latest change of exclusive mode, if any.
    ///
    /// # Returns
    ///
    /// `Some(true)` to grab the controller, `Some(false)` to release it.
    pub fn take_grab_request(&mut self) -> Option<bool> {
        self.pending_grab.take()
    }

    /// Records one controller event. Effects happen on the next tick.
    pub fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Button { button, pressed } => self.digital.set(button, pressed),
            ControllerEvent::Axis { axis, value } => {
                match axis {
                    Axis::LeftX => self.sticks[LEFT].x = value,
                    Axis::LeftY => self.sticks[LEFT].y = value,
                    Axis::RightX => self.sticks[RIGHT].x = value,
                    Axis::RightY => self.sticks[RIGHT].y = value,
                    Axis::LeftTrigger => self.triggers[LEFT] = value,
                    Axis::RightTrigger => self.triggers[RIGHT] = value,
                }
                self.update_analog_buttons();
            }
        }
    }

    /// Runs one update at monotonic time `now` (milliseconds).
    pub fn tick(&mut self, now: u64) {
        let pressed = self.digital | self.analog;
        let previous = self.previous;

        for button in Button::ALL {
            match (previous.contains(button), pressed.contains(button)) {
                (false, true) => self.press(button, now),
                (true, false) => self.release(button),
                _ => {}
            }
        }
        self.previous = pressed;

        let hotkey = self.settings.hotkey;
        let combo = |set: ButtonSet| set.contains(Button::Start) && set.contains(hotkey);
        if combo(pressed) && !combo(previous) {
            self.quit();
        }

        for button in self.in_repeat.iter() {
            if now >= self.next_repeat[button.index()] {
                self.repeat(button, now);
            }
        }

        self.update_motion(now);
    }

    /// Earliest time a tick has work to do without new input.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.in_repeat
            .iter()
            .map(|button| self.next_repeat[button.index()])
            .chain(self.next_motion)
            .min()
    }

    /// Releases every held button, as if the controller went idle.
    pub fn release_all(&mut self) {
        self.digital = ButtonSet::empty();
        self.analog = ButtonSet::empty();
        for button in self.previous.iter() {
            self.release(button);
        }
        self.previous = ButtonSet::empty();
    }

    fn press(&mut self, button: Button, now: u64) {
        let resolved = self.stack.resolve(&self.store, button);
        self.held[button.index()] = resolved;

        if button.group() == Some(ButtonGroup::Dpad) && self.stack.derived().mouse.dpad {
            let moves = resolved.map_or(true, |r| {
                matches!(r.get(&self.store).action, Action::None | Action::Key(_))
            });
            if moves {
                self.mouse_move.insert(button);
            }
        }

        let Some(binding_ref) = resolved else {
            return;
        };
        self.dispatch(button, binding_ref, now, false);
    }

    fn repeat(&mut self, button: Button, now: u64) {
        self.next_repeat[button.index()] = now + self.settings.repeat_rate;

        let Some(binding_ref) = self.held[button.index()] else {
            return;
        };
        if let Some(stroke) = binding_ref.get(&self.store).keystroke() {
            self.emit_key(stroke, false);
        }
        self.dispatch(button, binding_ref, now, true);
    }

    fn dispatch(&mut self, button: Button, binding_ref: BindingRef, now: u64, repeating: bool) {
        let binding = binding_ref.get(&self.store).clone();
        let mut stack_changed = false;

        match &binding.action {
            Action::None | Action::Inherit | Action::Key(_) => {}
            Action::Pop { .. } => stack_changed = self.stack.pop(&self.store),
            Action::Stack { op, target, .. } if !repeating => {
                if let Some(id) = target.id {
                    match op {
                        StackOp::Push => stack_changed = self.stack.push(&self.store, id),
                        StackOp::Set => {
                            self.stack.set(&self.store, id);
                            stack_changed = true;
                        }
                        StackOp::Hold => {
                            self.stack.push_hold(&self.store, id, button);
                            self.hold_pushed.insert(button);
                            stack_changed = true;
                        }
                    }
                }
            }
            Action::Stack { .. } => {}
            Action::Special(SpecialFunction::MouseSlow) => self.mouse_slow.insert(button),
            Action::Special(special) => {
                if self.text.is_active() {
                    stack_changed = self.run_text(*special);
                }
            }
        }

        if let Some(stroke) = binding.keystroke() {
            self.emit_key(stroke, true);

            if binding.repeat && !repeating {
                self.in_repeat.insert(button);
                self.next_repeat[button.index()] = now + self.settings.repeat_delay;
            }
        }

        if stack_changed {
            self.sync_derived_state();
        }
    }

    fn release(&mut self, button: Button) {
        let mut stack_changed = false;
        if self.hold_pushed.contains(button) {
            self.hold_pushed.remove(button);
            self.stack.pop_hold(&self.store, button);
            stack_changed = true;
        }

        self.mouse_slow.remove(button);
        self.mouse_move.remove(button);
        self.in_repeat.remove(button);

        if let Some(binding_ref) = self.held[button.index()].take() {
            if let Some(stroke) = binding_ref.get(&self.store).keystroke() {
                self.emit_key(stroke, false);
            }
        }

        if stack_changed {
            self.sync_derived_state();
        }
    }

    /// Runs a text-entry function.
    ///
    /// # Returns
    ///
    /// `true` if the stack was popped.
    fn run_text(&mut self, special: SpecialFunction) -> bool {
        let sink = self.sink.as_mut();

        match special {
            SpecialFunction::AddLetter => self.text.add_letter(sink),
            SpecialFunction::RemoveLetter => self.text.remove_letter(sink),
            SpecialFunction::NextLetter(amount) => self.text.next_letter(sink, amount),
            SpecialFunction::PrevLetter(amount) => self.text.prev_letter(sink, amount),
            SpecialFunction::NextWord(amount) => self.text.next_word(sink, amount),
            SpecialFunction::PrevWord(amount) => self.text.prev_word(sink, amount),
            SpecialFunction::UpperCase => self.text.upper_case(sink),
            SpecialFunction::LowerCase => self.text.lower_case(sink),
            SpecialFunction::ToggleCase => self.text.toggle_case(sink),
            SpecialFunction::FinishText => {
                self.text.accept(sink);
                return self.stack.pop(&self.store);
            }
            SpecialFunction::CancelText => {
                self.text.cancel(sink);
                return self.stack.pop(&self.store);
            }
            SpecialFunction::MouseSlow => {}
        }

        false
    }

    /// Applies the stack's derived state to text entry, the grab request
    /// and the analog buttons.
    fn sync_derived_state(&mut self) {
        let derived = self.stack.derived().clone();

        match &derived.input_set {
            Some(InputSetRef::Charset(name)) => {
                if self.text.charset_name() != Some(name.as_str()) {
                    self.text.load_charset(&self.sets, name);
                }
            }
            Some(InputSetRef::Wordset(name)) => {
                if self.text.wordset_name() != Some(name.as_str()) {
                    self.text.load_wordset(&self.sets, name);
                }
            }
            None => self.text.stop(),
        }

        if derived.exclusive != self.exclusive {
            debug!("Exclusive mode {}", if derived.exclusive { "on" } else { "off" });
            self.exclusive = derived.exclusive;
            self.pending_grab = Some(derived.exclusive);
        }

        if !derived.mouse.dpad {
            self.mouse_move = ButtonSet::empty();
        }

        self.update_analog_buttons();
    }

    /// Derives stick direction and trigger buttons from the analog state.
    fn update_analog_buttons(&mut self) {
        let mouse = self.stack.derived().mouse;
        let threshold_x = setting_to_fraction(self.settings.deadzone_x);
        let threshold_y = setting_to_fraction(self.settings.deadzone_y);

        for (group, stick) in [
            (ButtonGroup::LeftStick, self.sticks[LEFT]),
            (ButtonGroup::RightStick, self.sticks[RIGHT]),
        ] {
            let [up, down, left, right] = group.members();
            let active = !mouse.get(group);

            self.analog.set(up, active && stick.y < -threshold_y);
            self.analog.set(down, active && stick.y > threshold_y);
            self.analog.set(left, active && stick.x < -threshold_x);
            self.analog.set(right, active && stick.x > threshold_x);
        }

        let trigger_deadzone = setting_to_fraction(self.settings.deadzone_triggers);
        self.analog
            .set(Button::L2, trigger_clamp(self.triggers[LEFT], trigger_deadzone) > 0.0);
        self.analog
            .set(Button::R2, trigger_clamp(self.triggers[RIGHT], trigger_deadzone) > 0.0);
    }

    fn motion_velocity(&self) -> Vector2 {
        let mouse = self.stack.derived().mouse;
        let mut velocity = Vector2::ZERO;
        let mut add = |v: Vector2| velocity = Vector2::new(velocity.x + v.x, velocity.y + v.y);

        if mouse.left_stick {
            add(self.mouse.stick_velocity(self.sticks[LEFT]));
        }
        if mouse.right_stick {
            add(self.mouse.stick_velocity(self.sticks[RIGHT]));
        }

        let axis = |negative: Button, positive: Button| {
            i32::from(self.mouse_move.contains(positive)) - i32::from(self.mouse_move.contains(negative))
        };
        let dx = axis(Button::DpadLeft, Button::DpadRight);
        let dy = axis(Button::DpadUp, Button::DpadDown);
        add(self.mouse.dpad_velocity(dx, dy));

        velocity
    }

    fn update_motion(&mut self, now: u64) {
        let velocity = self.motion_velocity();

        if velocity == Vector2::ZERO {
            self.mouse.reset();
            self.next_motion = None;
            return;
        }

        if self.next_motion.is_some_and(|due| now < due) {
            return;
        }
        self.next_motion = Some(now + MOTION_TICK_MS);

        let (dx, dy) = self.mouse.advance(velocity, !self.mouse_slow.is_empty());
        if dx != 0 || dy != 0 {
            if let Err(e) = self.sink.emit_mouse_motion(dx, dy) {
                debug!("Failed to move mouse: {}", e);
            }
        }
    }

    fn emit_key(&mut self, stroke: KeyStroke, pressed: bool) {
        if let Err(e) = self.sink.emit_key(stroke, pressed) {
            debug!("Failed to emit key: {}", e);
        }
    }

    fn quit(&mut self) {
        info!("Quit combo pressed");

        if let Some(process) = self.process.as_mut() {
            if !process.terminate() {
                warn!("Failed to terminate the foreground process");
            }
        }

        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use crate::keys::Modifiers;
    use crate::output::sink::mocks::{RecordingSink, SinkEvent};
    use crate::process::MockProcessControl;
    use evdev::Key;

    fn engine_with(contents: &str) -> (Engine, RecordingSink) {
        let mut loader = ConfigLoader::new();
        loader.load_str(contents, false);
        let sink = RecordingSink::new();
        let engine = Engine::new(loader.finish(), Box::new(sink.clone()));
        (engine, sink)
    }

    fn press(engine: &mut Engine, button: Button, now: u64) {
        engine.handle_event(ControllerEvent::Button { button, pressed: true });
        engine.tick(now);
    }

    fn release(engine: &mut Engine, button: Button, now: u64) {
        engine.handle_event(ControllerEvent::Button { button, pressed: false });
        engine.tick(now);
    }

    fn axis(engine: &mut Engine, axis: Axis, value: f32) {
        engine.handle_event(ControllerEvent::Axis { axis, value });
    }

    fn count(sink: &RecordingSink, key: Key) -> usize {
        sink.presses().into_iter().filter(|k| *k == key).count()
    }

    // ====== Key Tests ======

    #[test]
    fn test_key_press_and_release() {
        let (mut engine, sink) = engine_with("[controls]\na = enter add_ctrl\n");
        press(&mut engine, Button::A, 0);
        release(&mut engine, Button::A, 10);

        let stroke = KeyStroke::new(Key::KEY_ENTER, Modifiers::CTRL);
        assert_eq!(
            sink.events(),
            vec![SinkEvent::Key(stroke, true), SinkEvent::Key(stroke, false)]
        );
    }

    #[test]
    fn test_unbound_button_is_silent() {
        let (mut engine, sink) = engine_with("[controls]\na = enter\n");
        press(&mut engine, Button::B, 0);
        release(&mut engine, Button::B, 5);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_sink_failure_is_absorbed() {
        let (mut engine, sink) = engine_with("[controls]\nstart = esc push_state menu\n[controls:menu]\n");
        sink.set_fail(true);
        press(&mut engine, Button::Start, 0);
        assert_eq!(engine.stack().depth(), 1, "stack change still happens");
        assert!(engine.is_running());
    }

    // ====== Stack Tests ======

    #[test]
    fn test_push_then_pop() {
        let (mut engine, sink) = engine_with(
            "[controls]\n\
             start = push_state menu\n\
             a = enter\n\
             [controls:menu]\n\
             overlay = parent\n\
             a = space\n\
             b = pop_state\n",
        );

        press(&mut engine, Button::Start, 0);
        release(&mut engine, Button::Start, 10);
        press(&mut engine, Button::A, 20);
        release(&mut engine, Button::A, 30);
        press(&mut engine, Button::B, 40);
        release(&mut engine, Button::B, 50);
        press(&mut engine, Button::A, 60);

        assert_eq!(sink.presses(), vec![Key::KEY_SPACE, Key::KEY_ENTER]);
        assert_eq!(engine.stack().depth(), 0);
    }

    #[test]
    fn test_stack_action_key_is_emitted_once() {
        let (mut engine, sink) = engine_with("[controls]\nstart = esc push_state menu\n[controls:menu]\n");
        press(&mut engine, Button::Start, 0);
        assert_eq!(count(&sink, Key::KEY_ESC), 1);
    }

    #[test]
    fn test_release_matches_press_after_stack_change() {
        let (mut engine, sink) = engine_with(
            "[controls]\n\
             x = f1 push_state menu\n\
             [controls:menu]\n\
             x = f2\n",
        );

        press(&mut engine, Button::X, 0);
        release(&mut engine, Button::X, 10);

        let f1 = KeyStroke::plain(Key::KEY_F1);
        assert_eq!(sink.events(), vec![SinkEvent::Key(f1, true), SinkEvent::Key(f1, false)]);
    }

    #[test]
    fn test_hold_state_lasts_while_pressed() {
        let (mut engine, sink) = engine_with(
            "[controls]\n\
             back = hold_state fn\n\
             a = a\n\
             [controls:fn]\n\
             overlay = parent\n\
             a = f5\n",
        );

        press(&mut engine, Button::Back, 0);
        press(&mut engine, Button::A, 10);
        release(&mut engine, Button::A, 20);
        release(&mut engine, Button::Back, 30);
        press(&mut engine, Button::A, 40);

        assert_eq!(sink.presses(), vec![Key::KEY_F5, Key::KEY_A]);
        assert!(engine.stack().held_by(Button::Back).is_none());
    }

    #[test]
    fn test_concurrent_holds_newest_wins() {
        let (mut engine, sink) = engine_with(
            "[controls]\n\
             l1 = hold_state first\n\
             r1 = hold_state second\n\
             [controls:first]\n\
             overlay = parent\n\
             [controls:second]\n\
             overlay = parent\n\
             x = f9\n",
        );

        press(&mut engine, Button::L1, 0);
        press(&mut engine, Button::R1, 10);
        press(&mut engine, Button::X, 20);
        release(&mut engine, Button::X, 30);
        release(&mut engine, Button::R1, 40);
        press(&mut engine, Button::X, 50);

        assert_eq!(sink.presses(), vec![Key::KEY_F9], "second press resolves to nothing");
    }

    #[test]
    fn test_exclusive_profile_requests_grab() {
        let (mut engine, _sink) = engine_with(
            "[controls]\n\
             start = push_state game\n\
             [controls:game]\n\
             overlay = parent\n\
             exclusive = true\n\
             b = pop_state\n",
        );

        assert_eq!(engine.take_grab_request(), None);
        press(&mut engine, Button::Start, 0);
        assert_eq!(engine.take_grab_request(), Some(true));
        assert_eq!(engine.take_grab_request(), None);
        press(&mut engine, Button::B, 10);
        assert_eq!(engine.take_grab_request(), Some(false));
    }

    #[test]
    fn test_default_profile_setting() {
        let (engine, _sink) = engine_with("[config]\ncontrols = menu\n[controls:menu]\n");
        let menu = engine.store().find("menu").unwrap();
        assert_eq!(engine.stack().top(), menu);
    }

    // ====== Repeat Tests ======

    #[test]
    fn test_repeat_timing() {
        let (mut engine, sink) = engine_with("[config]\nrepeat_delay = 200\nrepeat_rate = 50\n[controls]\nup = up repeat\n");

        press(&mut engine, Button::DpadUp, 0);
        assert_eq!(engine.next_deadline(), Some(200));

        engine.tick(199);
        assert_eq!(count(&sink, Key::KEY_UP), 1);

        engine.tick(200);
        assert_eq!(count(&sink, Key::KEY_UP), 2);
        assert_eq!(engine.next_deadline(), Some(250), "repeat uses the shorter rate");

        engine.tick(250);
        assert_eq!(count(&sink, Key::KEY_UP), 3);

        release(&mut engine, Button::DpadUp, 260);
        engine.tick(400);
        assert_eq!(count(&sink, Key::KEY_UP), 3);
        assert_eq!(engine.next_deadline(), None);
    }

    #[test]
    fn test_repeat_releases_before_pressing() {
        let (mut engine, sink) = engine_with("[config]\nrepeat_delay = 100\n[controls]\na = x repeat\n");
        press(&mut engine, Button::A, 0);
        engine.tick(100);

        let x = KeyStroke::plain(Key::KEY_X);
        assert_eq!(
            sink.events(),
            vec![
                SinkEvent::Key(x, true),
                SinkEvent::Key(x, false),
                SinkEvent::Key(x, true)
            ]
        );
    }

    // ====== Text Entry Tests ======

    const TEXT_CONFIG: &str = "\
[controls]
start = push_state entry
[controls:entry]
charset = digits
up = next_letter3
down = prev_letter4
a = add_letter
start = finish_text
back = cancel_text
";

    #[test]
    fn test_text_entry_activates_with_profile() {
        let (mut engine, _sink) = engine_with(TEXT_CONFIG);
        assert!(!engine.text().is_active());

        press(&mut engine, Button::Start, 0);
        release(&mut engine, Button::Start, 10);
        assert_eq!(engine.text().charset_name(), Some("digits"));

        press(&mut engine, Button::DpadUp, 20);
        release(&mut engine, Button::DpadUp, 30);
        assert_eq!(engine.text().cursor_char(), Some('3'));

        press(&mut engine, Button::DpadDown, 40);
        release(&mut engine, Button::DpadDown, 50);
        assert_eq!(engine.text().cursor_char(), Some('9'));
    }

    #[test]
    fn test_finish_text_enters_once_and_pops() {
        let (mut engine, sink) = engine_with(TEXT_CONFIG);
        press(&mut engine, Button::Start, 0);
        release(&mut engine, Button::Start, 10);
        press(&mut engine, Button::A, 20);
        release(&mut engine, Button::A, 30);
        sink.clear();

        press(&mut engine, Button::Start, 40);

        assert_eq!(count(&sink, Key::KEY_ENTER), 1);
        assert_eq!(engine.stack().depth(), 0);
        assert!(!engine.text().is_active(), "leaving the profile stops text entry");
    }

    #[test]
    fn test_cancel_text_pops_without_enter() {
        let (mut engine, sink) = engine_with(TEXT_CONFIG);
        press(&mut engine, Button::Start, 0);
        release(&mut engine, Button::Start, 10);
        press(&mut engine, Button::Back, 20);

        assert_eq!(count(&sink, Key::KEY_ENTER), 0);
        assert_eq!(engine.stack().depth(), 0);
    }

    #[test]
    fn test_text_functions_ignored_when_inactive() {
        let (mut engine, sink) = engine_with("[controls]\na = add_letter\nb = finish_text\n[controls:x]\n");
        press(&mut engine, Button::A, 0);
        press(&mut engine, Button::B, 10);
        assert!(sink.events().is_empty());
        assert_eq!(engine.stack().depth(), 0);
    }

    // ====== Analog Tests ======

    #[test]
    fn test_stick_drives_direction_buttons() {
        let (mut engine, sink) = engine_with("[controls]\nleft_analog = arrow_keys\n");

        axis(&mut engine, Axis::LeftY, -0.9);
        engine.tick(0);
        axis(&mut engine, Axis::LeftY, 0.0);
        engine.tick(10);

        assert_eq!(sink.presses(), vec![Key::KEY_UP]);
        assert!(engine.pressed().is_empty());
    }

    #[test]
    fn test_stick_inside_threshold_is_idle() {
        let (mut engine, sink) = engine_with("[config]\ndeadzone_x = 16384\n[controls]\nleft_analog = arrow_keys\n");
        axis(&mut engine, Axis::LeftX, 0.4);
        engine.tick(0);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_trigger_presses_l2() {
        let (mut engine, sink) = engine_with("[controls]\nl2 = mouse_left\n");
        axis(&mut engine, Axis::LeftTrigger, 0.05);
        engine.tick(0);
        assert!(sink.events().is_empty(), "below trigger deadzone");

        axis(&mut engine, Axis::LeftTrigger, 0.8);
        engine.tick(10);
        assert_eq!(sink.presses(), vec![Key::BTN_LEFT]);
    }

    // ====== Mouse Tests ======

    #[test]
    fn test_stick_mouse_motion() {
        let (mut engine, sink) = engine_with(
            "[config]\ndeadzone_mode = radial\ndeadzone_scale = 1000\n[controls]\nright_analog = mouse_movement\n",
        );

        axis(&mut engine, Axis::RightX, 1.0);
        engine.tick(0);
        engine.tick(16);

        assert_eq!(sink.motion(), (32, 0));
        assert!(sink.presses().is_empty(), "mouse stick does not press direction buttons");
    }

    #[test]
    fn test_motion_paced_by_tick() {
        let (mut engine, sink) = engine_with("[controls]\ndpad = mouse_movement\n");
        press(&mut engine, Button::DpadRight, 0);
        engine.tick(5);
        engine.tick(16);

        assert_eq!(sink.motion(), (10, 0));
        assert_eq!(engine.next_deadline(), Some(32));
    }

    #[test]
    fn test_dpad_mouse_and_slow() {
        let (mut engine, sink) = engine_with("[controls]\ndpad = mouse_movement\nr1 = mouse_slow\n");

        press(&mut engine, Button::DpadDown, 0);
        assert_eq!(sink.motion(), (0, 5));

        engine.handle_event(ControllerEvent::Button {
            button: Button::R1,
            pressed: true,
        });
        engine.tick(16);
        assert_eq!(sink.motion(), (0, 7), "slow halves the step, truncated");

        release(&mut engine, Button::DpadDown, 32);
        engine.tick(48);
        assert_eq!(sink.motion(), (0, 7));
        assert_eq!(engine.next_deadline(), None);
    }

    // ====== Quit Tests ======

    #[test]
    fn test_quit_combo_terminates_process() {
        let (engine, _sink) = engine_with("[controls]\n");
        let mut process = MockProcessControl::new();
        process.expect_terminate().times(1).returning(|| true);
        let mut engine = engine.with_process(Box::new(process));

        press(&mut engine, Button::Back, 0);
        press(&mut engine, Button::Start, 10);
        engine.tick(20);

        assert!(!engine.is_running());
    }

    #[test]
    fn test_quit_stops_even_if_kill_fails() {
        let (engine, _sink) = engine_with("[config]\nhotkey = guide\n[controls]\n");
        let mut process = MockProcessControl::new();
        process.expect_terminate().times(1).returning(|| false);
        let mut engine = engine.with_process(Box::new(process));

        press(&mut engine, Button::Back, 0);
        press(&mut engine, Button::Start, 10);
        assert!(engine.is_running(), "back is not the hotkey here");

        press(&mut engine, Button::Guide, 20);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_release_all() {
        let (mut engine, sink) = engine_with("[controls]\na = a\nb = b\n");
        press(&mut engine, Button::A, 0);
        press(&mut engine, Button::B, 0);
        sink.clear();

        engine.release_all();

        assert_eq!(sink.events().len(), 2);
        assert!(engine.pressed().is_empty());
    }
}
