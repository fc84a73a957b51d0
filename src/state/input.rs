/// Keyboard bindings for the sorting screen.
///
/// The dispatcher holds a binding table derived from the current destinations
/// and mode. The controller rebuilds it after every change to either, so a
/// key press is always resolved against live state.
use super::destinations::{lowercase, DestinationRegistry};

/// Toolkit-independent key identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Space,
    Character(char),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub ctrl: bool,
}

impl KeyPress {
    pub fn new(key: Key) -> Self {
        Self { key, ctrl: false }
    }

    pub fn with_ctrl(key: Key) -> Self {
        Self { key, ctrl: true }
    }
}

/// What a key press asks the controller to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Previous,
    Skip,
    Save,
    Classify(String),
}

#[derive(Debug, Clone, Default)]
pub struct InputDispatcher {
    active: bool,
    /// (lowercase key, destination name)
    bindings: Vec<(char, String)>,
}

impl InputDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the binding table from current state.
    pub fn rebuild(&mut self, registry: &DestinationRegistry, active: bool) {
        self.active = active;
        self.bindings = registry
            .list()
            .iter()
            .map(|dest| (dest.key, dest.name.clone()))
            .collect();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Resolve one key press to at most one command.
    pub fn dispatch(&self, press: KeyPress) -> Option<Command> {
        if !self.active {
            return None;
        }

        match press.key {
            Key::ArrowLeft => Some(Command::Previous),
            Key::ArrowRight | Key::Space => Some(Command::Skip),
            Key::Character(c) if press.ctrl && c.eq_ignore_ascii_case(&'s') => Some(Command::Save),
            Key::Character(c) => {
                let lower = lowercase(c)?;
                self.bindings
                    .iter()
                    .find(|(key, _)| *key == lower)
                    .map(|(_, name)| Command::Classify(name.clone()))
            }
            Key::Other => None,
        }
    }
}
