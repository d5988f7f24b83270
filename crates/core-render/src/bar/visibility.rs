//! Bar visibility state machine (§4.6): `{Dock, Hide, Invisible} × {Shown,
//! Hidden}`.

use core_config::HideOnModifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shown {
    Shown,
    Hidden,
}

/// Tracks whether the bar window is currently mapped, given the configured
/// `hide_on_modifier` policy and the events that can move it between
/// states.
#[derive(Debug, Clone, Copy)]
pub struct BarVisibility {
    mode: HideOnModifier,
    state: Shown,
}

impl BarVisibility {
    pub fn new(mode: HideOnModifier) -> Self {
        let state = match mode {
            HideOnModifier::Dock => Shown::Shown,
            HideOnModifier::Hide | HideOnModifier::Invisible => Shown::Hidden,
        };
        Self { mode, state }
    }

    pub fn is_shown(&self) -> bool {
        matches!(self.state, Shown::Shown)
    }

    /// `Dock` mode ignores the modifier entirely and stays mapped.
    /// `Hide`/`Invisible` reveal on modifier-press; on release they drop
    /// back to hidden unless an urgent workspace or a recently-activated
    /// binding mode forces the bar to stay shown.
    pub fn on_modifier_change(&mut self, pressed: bool, any_urgent_workspace: bool, mode_indicator_active: bool) {
        if self.mode == HideOnModifier::Dock {
            self.state = Shown::Shown;
            return;
        }
        if pressed {
            self.state = Shown::Shown;
        } else if !any_urgent_workspace && !mode_indicator_active {
            self.state = Shown::Hidden;
        }
    }

    /// Any urgent workspace or recent mode activation forces `Shown`
    /// regardless of modifier state (§4.6 transitions).
    pub fn force_shown_if(&mut self, any_urgent_workspace: bool, mode_indicator_active: bool) {
        if self.mode != HideOnModifier::Dock && (any_urgent_workspace || mode_indicator_active) {
            self.state = Shown::Shown;
        }
    }
}
