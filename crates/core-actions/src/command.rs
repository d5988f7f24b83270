//! Command AST (§4.3). The grammar that produces these values is out of
//! scope (§1); this module is the boundary the parser targets and the
//! dispatcher consumes.

use core_model::{Criteria, Direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    Direction(Direction),
    Parent,
    Child,
    ModeToggle,
    /// Bare `focus` with match criteria (§8 scenario 4): focuses whatever the
    /// working set resolved to, rather than moving relative to it.
    Matched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeMode {
    Grow,
    Shrink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAxis {
    Direction(Direction),
    Width,
    Height,
}

/// `<px> [or <ppt>]`: tiling resolves the percentage leg; floating resolves
/// the pixel leg (§4.3 `resize`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeAmount {
    pub px: u32,
    pub ppt: u32,
}

impl ResizeAmount {
    pub fn as_percent(self) -> f64 {
        self.ppt as f64 / 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitOrientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutTarget {
    SplitH,
    SplitV,
    Stacked,
    Tabbed,
    /// `layout toggle [all|split]` (§4.3): cycles through the listed set.
    ToggleAll,
    ToggleSplit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatingOp {
    Enable,
    Disable,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderOp {
    Set(core_state::BorderStyle),
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillTarget {
    Window,
    Client,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Enable,
    Disable,
    Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceSelector {
    Named(String),
    Next,
    Prev,
    /// Requesting the already-visible workspace jumps to `back_and_forth`
    /// when `workspace_auto_back_and_forth` is set (§4.3, scenario 3).
    BackAndForth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapScope {
    Inner,
    Outer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapTarget {
    Current,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapOp {
    Set,
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarSetting {
    Mode(core_config::HideOnModifier),
    HiddenState(core_config::HiddenState),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Focus(FocusTarget),
    Move { dir: Direction, px: Option<u32> },
    MoveToWorkspace(WorkspaceSelector),
    Resize { mode: ResizeMode, axis: ResizeAxis, amount: ResizeAmount },
    Split(SplitOrientation),
    Layout(LayoutTarget),
    Floating(FloatingOp),
    Border(BorderOp),
    Mark { toggle: bool, name: String },
    Unmark(Option<String>),
    Kill(KillTarget),
    Fullscreen { action: ToggleAction, mode: core_state::FullscreenMode },
    Workspace(WorkspaceSelector),
    RenameWorkspace { old: Option<String>, new: String },
    MoveWorkspaceToOutput(String),
    AppendLayout(String),
    TitleFormat(Option<String>),
    Gaps { scope: GapScope, target: GapTarget, op: GapOp, px: u32 },
    Exec { no_startup_id: bool, cmd: String },
    Mode(String),
    Bar(BarSetting),
    Reload,
    Restart,
    Exit,
}

/// One parsed command: optional match criteria plus the action to apply to
/// every container in the resolved working set (§4.2, §4.3).
#[derive(Debug, Clone)]
pub struct Command {
    pub criteria: Criteria,
    pub action: Action,
}
