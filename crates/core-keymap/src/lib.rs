//! Binding modes: named sets of key/button bindings that replace the default
//! set until reverted (§4.3 `mode <name>`, GLOSSARY "Binding mode").

use std::collections::BTreeMap;
use std::time::Instant;

pub const DEFAULT_MODE: &str = "default";

/// One binding mode: a name plus the command string each key combo or mouse
/// button triggers while the mode is active.
#[derive(Debug, Clone, Default)]
pub struct BindingMode {
    pub name: String,
    pub key_bindings: BTreeMap<String, String>,
    /// Mouse button (1-based) to command-string bindings, per-bar (§6 Config
    /// `bindings`).
    pub mouse_bindings: BTreeMap<u8, String>,
}

impl BindingMode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_bindings: BTreeMap::new(),
            mouse_bindings: BTreeMap::new(),
        }
    }

    pub fn bind_key(mut self, combo: impl Into<String>, command: impl Into<String>) -> Self {
        self.key_bindings.insert(combo.into(), command.into());
        self
    }

    pub fn bind_button(mut self, button: u8, command: impl Into<String>) -> Self {
        self.mouse_bindings.insert(button, command.into());
        self
    }
}

/// Manages the set of known binding modes and which one is currently active.
/// Only one mode is active at a time; switching modes never removes the
/// previously registered bindings, it only changes which set is consulted.
pub struct ModeTable {
    modes: BTreeMap<String, BindingMode>,
    active: String,
    /// When the active mode last changed away from [`DEFAULT_MODE`]; used by
    /// the bar's visibility state machine (§4.6: "recent mode activation
    /// forces Shown").
    activated_at: Option<Instant>,
}

impl Default for ModeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeTable {
    pub fn new() -> Self {
        let mut modes = BTreeMap::new();
        modes.insert(DEFAULT_MODE.to_string(), BindingMode::new(DEFAULT_MODE));
        Self {
            modes,
            active: DEFAULT_MODE.to_string(),
            activated_at: None,
        }
    }

    pub fn register(&mut self, mode: BindingMode) {
        self.modes.insert(mode.name.clone(), mode);
    }

    /// Switch to `name`. Returns `false` (no-op) if `name` is unknown.
    pub fn switch(&mut self, name: &str) -> bool {
        if !self.modes.contains_key(name) {
            tracing::warn!(target: "keymap", mode = name, "unknown_binding_mode");
            return false;
        }
        if self.active != name {
            self.active = name.to_string();
            self.activated_at = if name == DEFAULT_MODE {
                None
            } else {
                Some(Instant::now())
            };
            tracing::info!(target: "keymap", mode = name, "mode_switched");
        }
        true
    }

    pub fn active_mode(&self) -> &BindingMode {
        &self.modes[&self.active]
    }

    pub fn active_name(&self) -> &str {
        &self.active
    }

    pub fn is_default(&self) -> bool {
        self.active == DEFAULT_MODE
    }

    /// Whether the indicator should be considered "recently activated"
    /// within `window` of the current mode switch.
    pub fn recently_activated(&self, window: std::time::Duration) -> bool {
        matches!(self.activated_at, Some(t) if t.elapsed() < window)
    }

    pub fn resolve_key(&self, combo: &str) -> Option<&str> {
        self.active_mode().key_bindings.get(combo).map(String::as_str)
    }

    pub fn resolve_button(&self, button: u8) -> Option<&str> {
        self.active_mode().mouse_bindings.get(button).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn starts_in_default_mode() {
        let t = ModeTable::new();
        assert_eq!(t.active_name(), DEFAULT_MODE);
        assert!(t.is_default());
    }

    #[test]
    fn switching_to_unknown_mode_is_noop() {
        let mut t = ModeTable::new();
        assert!(!t.switch("resize"));
        assert_eq!(t.active_name(), DEFAULT_MODE);
    }

    #[test]
    fn switching_to_registered_mode_resolves_bindings() {
        let mut t = ModeTable::new();
        t.register(BindingMode::new("resize").bind_key("h", "resize shrink width 10 px"));
        assert!(t.switch("resize"));
        assert_eq!(t.active_name(), "resize");
        assert_eq!(t.resolve_key("h"), Some("resize shrink width 10 px"));
        assert_eq!(t.resolve_key("j"), None);
    }

    #[test]
    fn switching_back_to_default_clears_activation_window() {
        let mut t = ModeTable::new();
        t.register(BindingMode::new("resize"));
        t.switch("resize");
        assert!(t.recently_activated(std::time::Duration::from_secs(5)));
        t.switch(DEFAULT_MODE);
        assert!(!t.recently_activated(std::time::Duration::from_secs(5)));
    }

    #[test]
    fn mouse_bindings_resolve_per_mode() {
        let mut t = ModeTable::new();
        t.register(BindingMode::new("bar").bind_button(3, "menu"));
        t.switch("bar");
        assert_eq!(t.resolve_button(3), Some("menu"));
        assert_eq!(t.resolve_button(1), None);
    }
}
