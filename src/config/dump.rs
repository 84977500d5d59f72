//! Renders a loaded [`Config`] back into control-file form.
//!
//! The output is valid input for [`ConfigLoader`](crate::config::ConfigLoader):
//! loading a dump yields the same settings, sets and bindings.

use std::fmt::Write;

use crate::config::Config;
use crate::controls::binding::{ButtonBinding, OverlayMode, TriState};
use crate::controls::button::ButtonGroup;
use crate::controls::profile::{ControlProfile, InputSetRef};
use crate::error::Result;

/// Renders `config` as a control file.
///
/// # Errors
///
/// Returns error if the settings cannot be serialised.
pub fn render(config: &Config) -> Result<String> {
    let mut out = String::new();

    out.push_str("[config]\n");
    out.push_str(&toml::to_string(&config.settings)?);

    for charset in config.sets.charsets().filter(|set| !set.builtin) {
        let chars: String = charset.chars.iter().collect();
        let _ = writeln!(out, "charset = {} {}", quote(&charset.name), quote(&chars));
    }

    for wordset in config.sets.wordsets() {
        let words: Vec<String> = wordset.words.iter().map(|word| quote(word)).collect();
        let _ = writeln!(out, "wordset = {} {}", quote(&wordset.name), words.join(" "));
    }

    for (_, profile) in config.profiles.iter() {
        out.push('\n');
        render_profile(&mut out, profile);
    }

    Ok(out)
}

fn render_profile(out: &mut String, profile: &ControlProfile) {
    let _ = writeln!(out, "[{}]", profile.name());

    let inherits = match &profile.overlay {
        OverlayMode::None => false,
        OverlayMode::Parent => {
            out.push_str("overlay = parent\n");
            true
        }
        overlay => {
            let _ = writeln!(out, "overlay = {}", overlay);
            false
        }
    };

    match &profile.input_set {
        Some(InputSetRef::Charset(name)) => {
            let _ = writeln!(out, "charset = {}", quote(name));
        }
        Some(InputSetRef::Wordset(name)) => {
            let _ = writeln!(out, "wordset = {}", quote(name));
        }
        None => {}
    }

    if profile.exclusive != TriState::Off {
        let _ = writeln!(out, "exclusive = {}", profile.exclusive.name());
    }

    let unchanged = if inherits {
        ButtonBinding::inherit()
    } else {
        ButtonBinding::default()
    };

    for (button, binding) in profile.bindings() {
        if *binding != unchanged {
            let _ = writeln!(out, "{} = {}", button, binding);
        }
    }

    for group in ButtonGroup::ALL {
        if profile.mouse_mode(group) == TriState::On {
            let _ = writeln!(out, "{} = mouse_movement", group);
        }
    }
}

fn quote(text: &str) -> String {
    if text.contains('"') {
        format!("'{}'", text)
    } else {
        format!("\"{}\"", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use crate::controls::button::Button;

    const SAMPLE: &str = "\
[config]
repeat_delay = 250
deadzone_mode = hybrid
charset = vowels aeiou
wordset = greet hello \"good day\"

[controls]
a = enter
start = esc push_state menu
right_analog = mouse_movement
b = \";\" add_shift repeat

[controls:menu]
overlay = parent
exclusive = true
wordset = greet
x = pop_state
";

    fn load(contents: &str) -> Config {
        let mut loader = ConfigLoader::new();
        loader.load_str(contents, false);
        loader.finish()
    }

    #[test]
    fn test_dump_contains_sections() {
        let rendered = render(&load(SAMPLE)).unwrap();

        assert!(rendered.starts_with("[config]\n"));
        assert!(rendered.contains("repeat_delay = 250"));
        assert!(rendered.contains("charset = \"vowels\" \"aeiou\""));
        assert!(rendered.contains("wordset = \"greet\" \"hello\" \"good day\""));
        assert!(rendered.contains("[controls:menu]\noverlay = parent\nwordset = \"greet\"\nexclusive = true\n"));
        assert!(rendered.contains("right_analog = mouse_movement"));
        assert!(!rendered.contains("charset = \"basic\""), "builtin sets are not dumped");
    }

    #[test]
    fn test_dump_reloads_to_same_config() {
        let original = load(SAMPLE);
        let reloaded = load(&render(&original).unwrap());

        assert_eq!(reloaded.settings, original.settings);
        assert_eq!(reloaded.profiles.len(), original.profiles.len());
        for ((_, a), (_, b)) in original.profiles.iter().zip(reloaded.profiles.iter()) {
            assert_eq!(a.name(), b.name());
            for button in Button::ALL {
                assert_eq!(a.binding(button), b.binding(button), "{} {}", a.name(), button);
            }
            assert_eq!(a.mouse, b.mouse, "{}", a.name());
            assert_eq!(a.exclusive, b.exclusive, "{}", a.name());
            assert_eq!(a.input_set, b.input_set, "{}", a.name());
        }
    }
}
