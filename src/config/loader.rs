//! # Config Loader
//!
//! Feeds parsed ini lines into [`Settings`], the [`ProfileStore`] and the
//! [`InputSets`], then runs the finalise pass.
//!
//! ## Sections
//!
//! | Section | Meaning |
//! |---------|---------|
//! | `[config]` | scalar settings, charsets and wordsets |
//! | `[config:<game>]` | as `[config]`, only when the game prefix matches |
//! | `[controls]` | the root profile |
//! | `[controls:<name>]` | a named profile, created on first sight |
//!
//! Other sections are ignored.
//!
//! ## Legacy files
//!
//! Lines before any section header use the older flat layout: button
//! names bind on the root profile, `overlay` applies to the root,
//! `<button>_hk` lines are collected for a hotkey layer and anything else
//! is a `[config]` key. If no `[controls...]` section appears in any file,
//! [`ConfigLoader::finish`] converts the collected `_hk` lines into a
//! `controls:hk_hotkey` profile held by the hotkey button.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::bindings::apply_binding;
use crate::config::ini::{self, IniLine};
use crate::config::tokenize::{non_empty, tokenize};
use crate::config::{Config, Settings};
use crate::controls::binding::{OverlayMode, TriState};
use crate::controls::button::BindTarget;
use crate::controls::profile::{InputSetRef, ProfileId};
use crate::error::Result;

/// Hotkey layer built from legacy `_hk` lines.
const HK_HOTKEY_PROFILE: &str = "controls:hk_hotkey";

/// Bindings of the built-in interactive text-input layer.
const TEXT_INPUT_BINDINGS: [(&str, &str); 8] = [
    ("up", "prev_letter"),
    ("down", "next_letter"),
    ("right", "add_letter"),
    ("left", "remove_letter"),
    ("a", "add_letter"),
    ("b", "remove_letter"),
    ("start", "finish_text"),
    ("back", "cancel_text"),
];

/// What the current section feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Legacy,
    Config,
    Control(ProfileId),
    Ignored,
}

/// Accumulates one or more control files into a [`Config`].
///
/// # Examples
///
/// ```
/// use padmap::config::ConfigLoader;
/// use padmap::controls::button::Button;
///
/// let mut loader = ConfigLoader::new();
/// loader.load_str("[config]\nrepeat_delay = 250\n[controls]\na = enter\n", false);
/// let config = loader.finish();
///
/// assert_eq!(config.settings.repeat_delay, 250);
/// assert_eq!(config.profiles.root().binding(Button::A).to_string(), "enter");
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: Config,
    game_prefix: Option<String>,
    text_input: bool,
    legacy_only: bool,
    hk_lines: Vec<(String, String)>,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            legacy_only: true,
            ..Self::default()
        }
    }

    /// Selects which `[config:<prefix>]` sections apply.
    #[must_use]
    pub fn with_game_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.game_prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    /// Enables the built-in text-input layer for legacy files.
    #[must_use]
    pub fn with_text_input(mut self, enabled: bool) -> Self {
        self.text_input = enabled;
        self
    }

    /// Settings read so far.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.config.settings
    }

    /// Reads and applies a control file.
    ///
    /// # Arguments
    ///
    /// * `path` - File to read
    /// * `config_only` - Only honour `[config]` and `[config:<prefix>]`
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read. Problems inside the file
    /// are logged and skipped.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P, config_only: bool) -> Result<()> {
        let path = path.as_ref();
        info!("Loading '{}'", path.display());

        let contents = fs::read_to_string(path)?;
        self.load_str(&contents, config_only);
        Ok(())
    }

    /// Applies control file contents.
    pub fn load_str(&mut self, contents: &str, config_only: bool) {
        let mut section = if config_only { Section::Config } else { Section::Legacy };

        for (line_number, line) in ini::parse(contents) {
            match line {
                IniLine::Section(name) => {
                    section = self.enter_section(&name, config_only);
                    debug!("line {}: [{}] -> {:?}", line_number, name, section);
                }
                IniLine::Entry { key, value } => match section {
                    Section::Legacy => self.legacy_entry(&key, &value),
                    Section::Config => self.config_entry(&key, &value),
                    Section::Control(id) => self.control_entry(id, &key, &value),
                    Section::Ignored => {}
                },
            }
        }
    }

    /// Applies legacy conversions and links all profiles.
    pub fn finish(mut self) -> Config {
        if self.legacy_only {
            self.config.profiles.get_mut(ProfileId::ROOT).overlay = OverlayMode::Clear;

            let hk_lines = std::mem::take(&mut self.hk_lines);
            if !hk_lines.is_empty() {
                debug!("Converting {} legacy hotkey lines", hk_lines.len());
                self.control_entry(ProfileId::ROOT, "hotkey", "hold_state hk_hotkey");
                let layer = self.config.profiles.create_or_get(HK_HOTKEY_PROFILE);
                self.control_entry(layer, "overlay", "parent");

                for (key, value) in hk_lines {
                    if value.is_empty() {
                        continue;
                    }
                    let name = &key[..key.len() - 3];
                    self.control_entry(layer, name, &value);
                }
            }

            if self.text_input {
                self.add_text_input_layer();
            }
        }

        let demoted = self.config.profiles.finalise();
        if demoted > 0 {
            debug!("{} bindings cleared while linking profiles", demoted);
        }

        self.config
    }

    fn add_text_input_layer(&mut self) {
        debug!("Adding interactive text input layer");

        self.control_entry(ProfileId::ROOT, "start", "hold_state hk_start");
        let hold = self.config.profiles.create_or_get("controls:hk_start");
        self.control_entry(hold, "overlay", "parent");
        self.control_entry(hold, "down", "push_state text_input");

        let text = self.config.profiles.create_or_get("controls:text_input");
        self.control_entry(text, "overlay", "clear");
        self.control_entry(text, "charset", "full");
        for (button, binding) in TEXT_INPUT_BINDINGS {
            self.control_entry(text, button, binding);
        }
    }

    fn enter_section(&mut self, name: &str, config_only: bool) -> Section {
        let lower = name.to_ascii_lowercase();

        if lower == "config" {
            return Section::Config;
        }

        if let Some(prefix) = lower.strip_prefix("config:") {
            return match &self.game_prefix {
                Some(game) if game.eq_ignore_ascii_case(prefix) => Section::Config,
                _ => Section::Ignored,
            };
        }

        if lower == "controls" || lower.starts_with("controls:") {
            if config_only {
                return Section::Ignored;
            }
            self.legacy_only = false;
            return Section::Control(self.config.profiles.create_or_get(&lower));
        }

        Section::Ignored
    }

    fn legacy_entry(&mut self, key: &str, value: &str) {
        if let Some(target) = BindTarget::parse(key, self.config.settings.hotkey) {
            let tokens = tokenize(value);
            let first = non_empty(&tokens).next().unwrap_or("");

            // old files spell group mouse mode per direction
            if first.to_ascii_lowercase().starts_with("mouse_movement_") {
                if let Some(group) = target.group() {
                    let root = self.config.profiles.get_mut(ProfileId::ROOT);
                    apply_binding(root, BindTarget::Group(group), "mouse_movement");
                    return;
                }
            }

            apply_binding(self.config.profiles.get_mut(ProfileId::ROOT), target, value);
        } else if key.eq_ignore_ascii_case("overlay") {
            self.overlay_entry(ProfileId::ROOT, value);
        } else if key.len() > 3 && key.to_ascii_lowercase().ends_with("_hk") {
            self.hk_lines.push((key.to_string(), value.to_string()));
        } else {
            self.config_entry(key, value);
        }
    }

    fn config_entry(&mut self, key: &str, value: &str) {
        let tokens = tokenize(value);
        let mut tokens = non_empty(&tokens);

        if key.eq_ignore_ascii_case("charset") {
            let Some(name) = tokens.next() else {
                warn!("charset used without any name or characters defined");
                return;
            };
            let Some(chars) = tokens.next() else {
                warn!("charset \"{}\" specified without any characters defined", name);
                return;
            };
            self.config.sets.register_charset(name, chars);
        } else if key.eq_ignore_ascii_case("wordset") {
            let Some(name) = tokens.next() else {
                warn!("wordset used without any name or words defined");
                return;
            };
            let mut count = 0;
            for word in tokens {
                self.config.sets.register_word(name, word);
                count += 1;
            }
            if count == 0 {
                warn!("wordset \"{}\" specified without any words defined", name);
            }
        } else {
            let first = tokens.next().unwrap_or("");
            if !self.config.settings.apply(key, first) {
                debug!("Unknown config key \"{}\" = \"{}\"", key, value);
            }
        }
    }

    fn control_entry(&mut self, id: ProfileId, key: &str, value: &str) {
        if let Some(target) = BindTarget::parse(key, self.config.settings.hotkey) {
            apply_binding(self.config.profiles.get_mut(id), target, value);
            return;
        }

        let tokens = tokenize(value);
        let first = non_empty(&tokens).next().unwrap_or("");

        match key.to_ascii_lowercase().as_str() {
            "overlay" => self.overlay_entry(id, value),
            "charset" => {
                if self.config.sets.charset(first).is_none() {
                    warn!("charset unable to find \"{}\" charset", first);
                    return;
                }
                self.config.profiles.get_mut(id).input_set = Some(InputSetRef::Charset(first.to_string()));
            }
            "wordset" => {
                if self.config.sets.wordset(first).is_none() {
                    warn!("wordset unable to find \"{}\" wordset", first);
                    return;
                }
                self.config.profiles.get_mut(id).input_set = Some(InputSetRef::Wordset(first.to_string()));
            }
            "exclusive" => self.config.profiles.get_mut(id).exclusive = TriState::parse(first),
            _ => warn!(
                "{}: unknown key \"{}\" = \"{}\"",
                self.config.profiles.get(id).name(),
                key,
                value
            ),
        }
    }

    fn overlay_entry(&mut self, id: ProfileId, value: &str) {
        let tokens = tokenize(value);
        let Some(mode) = non_empty(&tokens).next() else {
            return;
        };

        if mode.eq_ignore_ascii_case("parent") {
            self.config.profiles.apply_overlay(id, OverlayMode::Parent);
        } else if mode.eq_ignore_ascii_case("clear") {
            self.config.profiles.apply_overlay(id, OverlayMode::Clear);
        } else {
            self.config.profiles.apply_named_overlay(id, mode);
        }
    }
}
