//! # Control Profiles
//!
//! Named sets of button bindings and the append-only store that owns them.
//!
//! Profiles live in an indexed table. Index 0 is always the root profile
//! `controls`; every other name is normalised to `controls:<name>`. Lookups
//! are case-insensitive. Bindings and the control stack refer to profiles
//! by [`ProfileId`], never by reference.
//!
//! ## Lifecycle
//!
//! 1. The config loader calls [`ProfileStore::create_or_get`] for every
//!    section and edits bindings through [`ProfileStore::get_mut`].
//! 2. [`ProfileStore::finalise`] runs once after all files are read and
//!    resolves stack-action targets.
//! 3. From then on the store is only read.

use std::fmt;

use tracing::{debug, warn};

use crate::controls::binding::{Action, ButtonBinding, OverlayMode, TriState};
use crate::controls::button::{Button, ButtonGroup, BUTTON_COUNT};

/// Name of the root profile.
pub const ROOT_PROFILE: &str = "controls";

/// Index of a profile in the [`ProfileStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProfileId(usize);

impl ProfileId {
    /// The root profile.
    pub const ROOT: ProfileId = ProfileId(0);

    /// Raw table index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Text-entry pool a profile activates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSetRef {
    Charset(String),
    Wordset(String),
}

/// One named control profile.
#[derive(Debug, Clone)]
pub struct ControlProfile {
    name: String,
    bindings: [ButtonBinding; BUTTON_COUNT],
    /// Charset or wordset activated while this profile is effective.
    pub input_set: Option<InputSetRef>,
    /// Mouse mode per [`ButtonGroup`], indexed by [`ButtonGroup::index`].
    pub mouse: [TriState; 3],
    /// Exclusive grab of the controller while this profile is effective.
    pub exclusive: TriState,
    /// Last overlay applied, for dumps.
    pub overlay: OverlayMode,
    needs_link: bool,
}

impl ControlProfile {
    fn new(name: String) -> Self {
        Self {
            name,
            bindings: std::array::from_fn(|_| ButtonBinding::default()),
            input_set: None,
            mouse: [TriState::Off; 3],
            exclusive: TriState::Off,
            overlay: OverlayMode::None,
            needs_link: false,
        }
    }

    /// Normalised profile name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binding for `button`.
    #[must_use]
    pub fn binding(&self, button: Button) -> &ButtonBinding {
        &self.bindings[button.index()]
    }

    /// Mutable binding for `button`. Marks the profile for link
    /// resolution.
    pub fn binding_mut(&mut self, button: Button) -> &mut ButtonBinding {
        self.needs_link = true;
        &mut self.bindings[button.index()]
    }

    /// Mouse mode of `group`.
    #[must_use]
    pub fn mouse_mode(&self, group: ButtonGroup) -> TriState {
        self.mouse[group.index()]
    }

    pub fn set_mouse_mode(&mut self, group: ButtonGroup, mode: TriState) {
        self.mouse[group.index()] = mode;
    }

    /// All bindings with their buttons.
    pub fn bindings(&self) -> impl Iterator<Item = (Button, &ButtonBinding)> {
        Button::ALL.into_iter().zip(self.bindings.iter())
    }
}

/// Normalises a profile name: `controls` stays the root, anything else
/// gains a `controls:` prefix unless it already has one.
///
/// # Examples
///
/// ```
/// use padmap::controls::profile::normalise_name;
///
/// assert_eq!(normalise_name("Menu"), "controls:menu");
/// assert_eq!(normalise_name("controls:menu"), "controls:menu");
/// assert_eq!(normalise_name("CONTROLS"), "controls");
/// ```
#[must_use]
pub fn normalise_name(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    if lower == ROOT_PROFILE || lower.starts_with("controls:") {
        lower
    } else {
        format!("controls:{}", lower)
    }
}

/// Append-only registry of control profiles.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    profiles: Vec<ControlProfile>,
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileStore {
    /// Creates a store holding only the root profile.
    #[must_use]
    pub fn new() -> Self {
        Self {
            profiles: vec![ControlProfile::new(ROOT_PROFILE.to_string())],
        }
    }

    /// Returns the profile named `name`, creating it if needed.
    pub fn create_or_get(&mut self, name: &str) -> ProfileId {
        if let Some(id) = self.find(name) {
            return id;
        }

        let normalised = normalise_name(name);
        debug!("Creating control profile {}", normalised);
        self.profiles.push(ControlProfile::new(normalised));
        ProfileId(self.profiles.len() - 1)
    }

    /// Looks up a profile by name, case-insensitively.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<ProfileId> {
        let normalised = normalise_name(name);
        self.profiles
            .iter()
            .position(|profile| profile.name == normalised)
            .map(ProfileId)
    }

    /// Profile by id.
    ///
    /// Ids only come from this store, which never removes entries, so an
    /// out-of-range id is a programming error.
    #[must_use]
    pub fn get(&self, id: ProfileId) -> &ControlProfile {
        &self.profiles[id.0]
    }

    /// Mutable profile by id.
    pub fn get_mut(&mut self, id: ProfileId) -> &mut ControlProfile {
        &mut self.profiles[id.0]
    }

    /// The root profile.
    #[must_use]
    pub fn root(&self) -> &ControlProfile {
        &self.profiles[0]
    }

    /// Number of profiles, including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Always false: the root profile exists from construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Iterates all profiles in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (ProfileId, &ControlProfile)> {
        self.profiles
            .iter()
            .enumerate()
            .map(|(index, profile)| (ProfileId(index), profile))
    }

    /// Rewrites every binding of `id`.
    ///
    /// * `OverlayMode::Parent` - every binding inherits, mouse modes and
    ///   exclusivity inherit.
    /// * `OverlayMode::Clear` - every binding is emptied, mouse modes and
    ///   exclusivity are switched off.
    /// * `OverlayMode::None` - bindings are left as configured.
    ///
    /// Named overlays go through [`ProfileStore::apply_named_overlay`].
    pub fn apply_overlay(&mut self, id: ProfileId, mode: OverlayMode) {
        let profile = self.get_mut(id);

        match mode {
            OverlayMode::Parent => {
                for binding in profile.bindings.iter_mut() {
                    *binding = ButtonBinding::inherit();
                }
                profile.mouse = [TriState::Inherit; 3];
                profile.exclusive = TriState::Inherit;
            }
            OverlayMode::Clear => {
                for binding in profile.bindings.iter_mut() {
                    *binding = ButtonBinding::default();
                }
                profile.mouse = [TriState::Off; 3];
                profile.exclusive = TriState::Off;
            }
            OverlayMode::None | OverlayMode::Named(_) => return,
        }

        profile.overlay = mode;
    }

    /// Copies bindings, mouse modes and exclusivity from the profile named
    /// `source` into `id`.
    ///
    /// Copied stack actions are unlinked so finalise re-resolves them
    /// against their new owner.
    ///
    /// # Returns
    ///
    /// `false` (with a warning) if `source` is unknown or is `id` itself.
    pub fn apply_named_overlay(&mut self, id: ProfileId, source: &str) -> bool {
        let Some(source_id) = self.find(source) else {
            warn!(
                "{}: overlay source \"{}\" does not exist, ignoring",
                self.get(id).name,
                source
            );
            return false;
        };

        if source_id == id {
            warn!("{}: cannot overlay a profile onto itself, ignoring", self.get(id).name);
            return false;
        }

        let source_profile = self.get(source_id).clone();
        let profile = self.get_mut(id);

        profile.bindings = source_profile.bindings;
        for binding in profile.bindings.iter_mut() {
            if let Action::Stack { target, .. } = &mut binding.action {
                target.id = None;
            }
        }
        profile.mouse = source_profile.mouse;
        profile.exclusive = source_profile.exclusive;
        profile.overlay = OverlayMode::Named(source_profile.name);
        profile.needs_link = true;
        true
    }

    /// Resolves every pending stack-action target.
    ///
    /// Members of a group in mouse mode lose their actions first. A target
    /// that names the owning profile, or no profile at all, is demoted to
    /// an empty binding with a warning.
    ///
    /// # Returns
    ///
    /// The number of demoted bindings.
    pub fn finalise(&mut self) -> usize {
        let mut demoted = 0;

        for index in 0..self.profiles.len() {
            let profile = &mut self.profiles[index];
            for group in ButtonGroup::ALL {
                if profile.mouse_mode(group) == TriState::On {
                    for button in group.members() {
                        profile.bindings[button.index()].action = Action::None;
                    }
                }
            }

            if !self.profiles[index].needs_link {
                continue;
            }

            for button in Button::ALL {
                let target_name = match &self.profiles[index].bindings[button.index()].action {
                    Action::Stack { target, .. } if target.id.is_none() => target.name.clone(),
                    _ => continue,
                };

                let resolved = self.find(&target_name);
                let profile = &mut self.profiles[index];
                let binding = &mut profile.bindings[button.index()];

                match resolved {
                    Some(target_id) if target_id.0 == index => {
                        warn!(
                            "{}: \"{} = {}\" links to its own profile, clearing action",
                            profile.name, button, binding
                        );
                        binding.action = Action::None;
                        demoted += 1;
                    }
                    Some(target_id) => {
                        if let Action::Stack { target, .. } = &mut binding.action {
                            target.id = Some(target_id);
                        }
                    }
                    None => {
                        warn!(
                            "{}: \"{} = {}\" links to an unknown profile, clearing action",
                            profile.name, button, binding
                        );
                        binding.action = Action::None;
                        demoted += 1;
                    }
                }
            }

            self.profiles[index].needs_link = false;
        }

        demoted
    }
}
