//! Command interpreter (§4.3): resolves each [`Command`]'s match criteria to
//! a working set and applies its [`Action`], one command at a time, batching
//! the tree's `needs_render` flag rather than re-rendering per command.

use crate::command::{
    Action, BarSetting, BorderOp, Command, FloatingOp, FocusTarget, GapOp, GapScope, GapTarget, KillTarget,
    LayoutTarget, ResizeAxis, ResizeMode, SplitOrientation, ToggleAction, WorkspaceSelector,
};
use crate::error::WmError;
use core_config::Config;
use core_events::IpcReply;
use core_keymap::ModeTable;
use core_model::{
    find_workspace_by_name, is_reserved_workspace_name, match_containers, nearest_in_direction, next_workspace,
    prev_workspace, Direction,
};
use core_state::{Axis, BorderStyle, ContainerTree, FullscreenMode, Layout, NodeId, Position, Role};
use core_terminal::DisplayBackend;

/// A side effect the caller (the binary's event loop) must act on once the
/// batch returns, beyond whatever reply was already sent to the IPC client
/// (§4.3 `reload`/`restart`/`exit`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlSignal {
    #[default]
    None,
    Reload,
    Restart,
    Exit,
}

/// One command's outcome: the reply sent back over IPC, plus whether the
/// error (if any) is fatal (§7 `ProtocolError`/`ResourceUnavailable`) — the
/// caller logs and exits on a fatal outcome rather than continuing the batch.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub reply: IpcReply,
    pub fatal: bool,
}

impl CommandOutcome {
    fn ok() -> Self {
        Self { reply: IpcReply { success: true, payload: None, error: None }, fatal: false }
    }

    fn err(e: WmError) -> Self {
        let fatal = e.is_fatal();
        Self { reply: IpcReply { success: false, payload: None, error: Some(e.to_string()) }, fatal }
    }

    fn mismatch() -> Self {
        Self::err(WmError::CriteriaMismatch)
    }
}

/// Everything a single command needs to mutate. Borrowed fresh for each
/// command in a batch so the tree's `needs_render` flag accumulates across
/// the whole batch rather than per command (§4.3: "the renderer runs once at
/// the end of a batch").
pub struct ActionContext<'a> {
    pub tree: &'a mut ContainerTree,
    pub config: &'a mut Config,
    pub modes: &'a mut ModeTable,
    pub backend: &'a mut dyn DisplayBackend,
}

fn containing_workspace(tree: &ContainerTree, node: NodeId) -> Option<NodeId> {
    let mut cur = Some(node);
    while let Some(id) = cur {
        let c = tree.get(id)?;
        if c.role == Role::Workspace {
            return Some(id);
        }
        cur = c.parent;
    }
    None
}

fn current_visible_workspace(tree: &ContainerTree) -> Option<NodeId> {
    if let Some(focused) = tree.focused {
        if let Some(ws) = containing_workspace(tree, focused) {
            return Some(ws);
        }
    }
    let output = *tree.outputs().first()?;
    core_model::visible_workspace(tree, output)
}

fn create_workspace(tree: &mut ContainerTree, name: &str) -> Option<NodeId> {
    let output = *tree.outputs().first()?;
    let content = tree.content_of(output)?;
    let ws = tree.create(Role::Workspace);
    tree.get_mut(ws).expect("just created").name = Some(name.to_string());
    tree.attach(ws, content, Position::Last).ok()?;
    Some(ws)
}

fn switch_to_workspace(tree: &mut ContainerTree, target: NodeId) {
    if let Some(prev) = current_visible_workspace(tree) {
        if prev != target {
            tree.back_and_forth = tree.get(prev).and_then(|c| c.name.clone());
        }
    }
    let _ = tree.con_focus(target);
}

/// §4.1 `find_resize_participants` axis: `ResizeAxis::Direction` maps
/// Left/Right to horizontal and Up/Down to vertical, matching the axis a
/// tiling resize along that direction would actually affect.
fn resize_tree_axis(axis: ResizeAxis) -> Axis {
    match axis {
        ResizeAxis::Direction(d) if d.is_horizontal() => Axis::Horizontal,
        ResizeAxis::Direction(_) => Axis::Vertical,
        ResizeAxis::Width => Axis::Horizontal,
        ResizeAxis::Height => Axis::Vertical,
    }
}

/// `resize grow|shrink` (tiling case). The direction the caller gave is
/// assumed to name the edge shared with `node`'s resize partner (i3's own
/// convention: asking to grow "left" only makes sense when there is a left
/// neighbor to shrink) — so growing `node` always means growing whichever of
/// `first`/`second` it is, regardless of which slot that turns out to be.
/// `clamp_resize`'s convention is "positive delta grows `first`"; flip the
/// sign when `node` is `second`.
fn resize_tiling(tree: &mut ContainerTree, node: NodeId, mode: ResizeMode, axis: ResizeAxis, magnitude: f64) -> bool {
    let tree_axis = resize_tree_axis(axis);
    let Some((first, second)) = tree.find_resize_participants(node, tree_axis) else {
        return false;
    };
    let node_is_first = first == node;
    let grows_first = node_is_first == (mode == ResizeMode::Grow);
    let delta = if grows_first { magnitude } else { -magnitude };
    tree.resize(first, second, delta).unwrap_or(false)
}

const MIN_FLOATING_SIZE: u32 = 75;

/// `resize grow|shrink` (floating case): adjust the containing
/// `FloatingContainer`'s width or height in place, refusing to shrink below
/// [`MIN_FLOATING_SIZE`] (§4.3 `resize`, floating leg).
fn resize_floating(tree: &mut ContainerTree, node: NodeId, mode: ResizeMode, axis: ResizeAxis, px: u32) -> bool {
    let Some(parent) = tree.get(node).and_then(|c| c.parent) else {
        return false;
    };
    let Some(floater) = tree.get(parent) else { return false };
    let delta = px as i32 * if mode == ResizeMode::Grow { 1 } else { -1 };
    let horizontal = matches!(axis, ResizeAxis::Width) || matches!(axis, ResizeAxis::Direction(d) if d.is_horizontal());
    let (new_w, new_h) = if horizontal {
        ((floater.rect.w as i32 + delta).max(0) as u32, floater.rect.h)
    } else {
        (floater.rect.w, (floater.rect.h as i32 + delta).max(0) as u32)
    };
    if horizontal && new_w < MIN_FLOATING_SIZE {
        return false;
    }
    if !horizontal && new_h < MIN_FLOATING_SIZE {
        return false;
    }
    let floater_mut = tree.get_mut(parent).expect("checked above");
    floater_mut.rect.w = new_w;
    floater_mut.rect.h = new_h;
    tree.needs_render = true;
    true
}

fn move_tiling(tree: &mut ContainerTree, node: NodeId, dir: Direction) -> bool {
    let dir_axis = if dir.is_horizontal() { Axis::Horizontal } else { Axis::Vertical };
    let forward = matches!(dir, Direction::Right | Direction::Down);
    let mut cur = node;
    loop {
        let Some(parent) = tree.get(cur).and_then(|c| c.parent) else {
            return false;
        };
        if tree.packing_axis(parent) == dir_axis && tree.move_within_parent(cur, forward).unwrap_or(false) {
            return true;
        }
        if parent == tree.root() {
            return false;
        }
        cur = parent;
    }
}

fn move_floating(tree: &mut ContainerTree, node: NodeId, dir: Direction, px: u32) -> bool {
    let Some(parent) = tree.get(node).and_then(|c| c.parent) else {
        return false;
    };
    let delta = px as i32;
    let Some(floater) = tree.get_mut(parent) else { return false };
    match dir {
        Direction::Left => floater.rect.x -= delta,
        Direction::Right => floater.rect.x += delta,
        Direction::Up => floater.rect.y -= delta,
        Direction::Down => floater.rect.y += delta,
    }
    tree.needs_render = true;
    true
}

/// `focus <dir>` (§4.1 tie-break): try the focused node's own siblings first,
/// then climb a level and retry against the parent's siblings, until a
/// geometric candidate is found or the root is reached.
fn focus_direction(tree: &mut ContainerTree, dir: Direction) -> bool {
    let Some(start) = tree.focused else { return false };
    let mut node = start;
    loop {
        let Some(parent) = tree.get(node).and_then(|c| c.parent) else {
            return false;
        };
        let from_rect = tree.get(node).map(|c| c.rect).unwrap_or_default();
        let siblings = tree.get(parent).map(|c| c.children.clone()).unwrap_or_default();
        let candidates: Vec<(NodeId, core_geom::Rect)> = siblings
            .into_iter()
            .filter(|s| *s != node)
            .filter_map(|s| tree.get(s).map(|c| (s, c.rect)))
            .collect();
        if let Some(target) = nearest_in_direction(from_rect, dir, &candidates) {
            return tree.con_focus(target).unwrap_or(false);
        }
        if parent == tree.root() {
            return false;
        }
        node = parent;
    }
}

/// `focus mode_toggle`: swap focus between the tiling and floating windows on
/// the current workspace (i3's `focus mode_toggle`).
fn focus_mode_toggle(tree: &mut ContainerTree) -> bool {
    let Some(focused) = tree.focused else { return false };
    let Some(ws) = containing_workspace(tree, focused) else {
        return false;
    };
    let currently_floating = tree.is_floating(focused);
    let Some(candidate) = tree.get(ws).and_then(|c| {
        c.focus_order
            .iter()
            .find(|id| (tree.get(**id).map(|c| c.role) == Some(Role::FloatingContainer)) != currently_floating)
            .copied()
    }) else {
        return false;
    };
    let target = if tree.get(candidate).map(|c| c.role) == Some(Role::FloatingContainer) {
        tree.get(candidate).and_then(|c| c.focus_order.first().copied()).unwrap_or(candidate)
    } else {
        candidate
    };
    tree.con_focus(target).unwrap_or(false)
}

fn next_layout_in_cycle(current: Layout) -> Layout {
    match current {
        Layout::SplitH => Layout::SplitV,
        Layout::SplitV => Layout::Stacked,
        Layout::Stacked => Layout::Tabbed,
        _ => Layout::SplitH,
    }
}

/// Nearest ancestor (including `node` itself) that can hold grafted children
/// directly — a `Workspace` or `SplitContainer` (§4.3 `append_layout`).
fn nearest_split_ancestor(tree: &ContainerTree, node: NodeId) -> Option<NodeId> {
    let mut cur = Some(node);
    while let Some(id) = cur {
        let c = tree.get(id)?;
        if matches!(c.role, Role::Workspace | Role::SplitContainer) {
            return Some(id);
        }
        cur = c.parent;
    }
    None
}

/// Apply one command's action to its resolved working set, returning its
/// outcome and any process-level signal the caller must act on after the
/// batch completes.
pub fn execute(ctx: &mut ActionContext, cmd: &Command) -> (CommandOutcome, ControlSignal) {
    let working_set = || match_containers(ctx.tree, &cmd.criteria, ctx.tree.focused);
    let none = ControlSignal::None;

    match &cmd.action {
        Action::Focus(target) => {
            if *target == FocusTarget::Matched {
                // §8 scenario 4: multiple matches (e.g. two containers
                // bearing the same mark via direct state construction, which
                // bypasses `set_mark`'s own uniqueness) are not rejected the
                // way a multi-match `mark` is — the pinned behavior (§9 Open
                // Question, DESIGN.md) is to warn and focus the last match.
                let matches = working_set();
                if matches.is_empty() {
                    return (CommandOutcome::mismatch(), none);
                }
                if matches.len() > 1 {
                    tracing::warn!(target: "actions", count = matches.len(), "focus matched more than one container");
                }
                for node in &matches {
                    let _ = ctx.tree.con_focus(*node);
                }
                return (CommandOutcome::ok(), none);
            }
            // §8 scenario 5: a candidate that exists but is refused by a
            // fullscreen boundary (or simply doesn't exist in that
            // direction) is a silent no-op, not a failure — `focus <dir>`
            // only fails when there is no starting point to move from at
            // all (mirrors i3's own "focus commands always succeed").
            if ctx.tree.focused.is_none() {
                return (CommandOutcome::mismatch(), none);
            }
            match target {
                FocusTarget::Direction(dir) => {
                    focus_direction(ctx.tree, *dir);
                }
                FocusTarget::Parent => {
                    if let Some(p) = ctx.tree.focused.and_then(|f| ctx.tree.get(f).and_then(|c| c.parent)) {
                        let _ = ctx.tree.con_focus(p);
                    }
                }
                FocusTarget::Child => {
                    if let Some(c) = ctx.tree.focused.and_then(|f| ctx.tree.get(f).and_then(|c| c.focus_order.first().copied())) {
                        let _ = ctx.tree.con_focus(c);
                    }
                }
                FocusTarget::ModeToggle => {
                    focus_mode_toggle(ctx.tree);
                }
                FocusTarget::Matched => unreachable!("handled above"),
            }
            (CommandOutcome::ok(), none)
        }

        Action::Move { dir, px } => {
            let matches = working_set();
            if matches.is_empty() {
                return (CommandOutcome::mismatch(), none);
            }
            for node in matches {
                if ctx.tree.is_floating(node) {
                    move_floating(ctx.tree, node, *dir, px.unwrap_or(10));
                } else {
                    move_tiling(ctx.tree, node, *dir);
                }
            }
            (CommandOutcome::ok(), none)
        }

        Action::MoveToWorkspace(sel) => {
            let matches = working_set();
            if matches.is_empty() {
                return (CommandOutcome::mismatch(), none);
            }
            if let WorkspaceSelector::Named(name) = sel {
                if is_reserved_workspace_name(name) {
                    return (
                        CommandOutcome::err(WmError::PolicyRefusal("workspace names may not start with '__'".into())),
                        none,
                    );
                }
            }
            let Some(target) = resolve_workspace_selector(ctx, sel, false) else {
                return (CommandOutcome::err(WmError::PolicyRefusal("no such workspace".into())), none);
            };
            for node in matches {
                let _ = ctx.tree.move_to_workspace(node, target, true);
            }
            (CommandOutcome::ok(), none)
        }

        Action::Resize { mode, axis, amount } => {
            let matches = working_set();
            if matches.is_empty() {
                return (CommandOutcome::mismatch(), none);
            }
            let mut applied = false;
            for node in matches {
                let done = if ctx.tree.is_floating(node) {
                    resize_floating(ctx.tree, node, *mode, *axis, amount.px)
                } else {
                    resize_tiling(ctx.tree, node, *mode, *axis, amount.as_percent())
                };
                applied |= done;
            }
            if applied {
                (CommandOutcome::ok(), none)
            } else {
                (CommandOutcome::err(WmError::PolicyRefusal("resize refused: would fall below the minimum size".into())), none)
            }
        }

        Action::Split(orient) => {
            let matches = working_set();
            if matches.is_empty() {
                return (CommandOutcome::mismatch(), none);
            }
            let layout = match orient {
                SplitOrientation::Horizontal => Layout::SplitH,
                SplitOrientation::Vertical => Layout::SplitV,
            };
            for node in matches {
                let _ = ctx.tree.wrap_in_split(node, layout);
            }
            (CommandOutcome::ok(), none)
        }

        Action::Layout(target) => {
            let matches = working_set();
            if matches.is_empty() {
                return (CommandOutcome::mismatch(), none);
            }
            for node in matches {
                let layout = match target {
                    LayoutTarget::SplitH => Layout::SplitH,
                    LayoutTarget::SplitV => Layout::SplitV,
                    LayoutTarget::Stacked => Layout::Stacked,
                    LayoutTarget::Tabbed => Layout::Tabbed,
                    LayoutTarget::ToggleAll => {
                        let current = ctx.tree.get(node).map(|c| c.layout).unwrap_or(Layout::SplitH);
                        next_layout_in_cycle(current)
                    }
                    LayoutTarget::ToggleSplit => match ctx.tree.get(node).map(|c| c.layout) {
                        Some(Layout::SplitH) => Layout::SplitV,
                        _ => Layout::SplitH,
                    },
                };
                let _ = ctx.tree.set_layout(node, layout);
            }
            (CommandOutcome::ok(), none)
        }

        Action::Floating(op) => {
            let matches = working_set();
            if matches.is_empty() {
                return (CommandOutcome::mismatch(), none);
            }
            for node in matches {
                let is_float = ctx.tree.is_floating(node);
                let want_float = match op {
                    FloatingOp::Enable => true,
                    FloatingOp::Disable => false,
                    FloatingOp::Toggle => !is_float,
                };
                if want_float == is_float {
                    continue;
                }
                let Some(ws) = containing_workspace(ctx.tree, node) else { continue };
                if want_float {
                    let rect = ctx.tree.get(node).map(|c| c.rect).unwrap_or_default();
                    let _ = ctx.tree.float_node(node, ws, rect);
                } else {
                    let _ = ctx.tree.unfloat_node(node, ws);
                }
            }
            (CommandOutcome::ok(), none)
        }

        Action::Border(op) => {
            let matches = working_set();
            if matches.is_empty() {
                return (CommandOutcome::mismatch(), none);
            }
            for node in matches {
                let Some(c) = ctx.tree.get_mut(node) else { continue };
                c.border = match op {
                    BorderOp::Set(style) => *style,
                    BorderOp::Toggle => match c.border {
                        BorderStyle::Normal => BorderStyle::Pixel,
                        BorderStyle::Pixel => BorderStyle::None,
                        BorderStyle::None => BorderStyle::Normal,
                    },
                };
            }
            ctx.tree.needs_render = true;
            (CommandOutcome::ok(), none)
        }

        Action::Mark { toggle, name } => {
            let matches = working_set();
            if matches.is_empty() {
                return (CommandOutcome::mismatch(), none);
            }
            if matches.len() > 1 {
                return (
                    CommandOutcome::err(WmError::PolicyRefusal(
                        "mark: more than one container matched; no marks were changed".into(),
                    )),
                    none,
                );
            }
            match ctx.tree.set_mark(matches[0], name, *toggle) {
                Ok(()) => (CommandOutcome::ok(), none),
                Err(e) => (CommandOutcome::err(e.into()), none),
            }
        }

        Action::Unmark(name) => {
            match name {
                Some(n) => ctx.tree.clear_mark(n),
                None => ctx.tree.clear_all_marks(),
            }
            (CommandOutcome::ok(), none)
        }

        Action::Kill(target) => {
            let matches = working_set();
            if matches.is_empty() {
                return (CommandOutcome::mismatch(), none);
            }
            for node in matches {
                let Some(win) = ctx.tree.get(node).and_then(|c| c.window) else { continue };
                let result = match target {
                    KillTarget::Window => ctx.backend.close_window_polite(win),
                    KillTarget::Client => ctx.backend.kill_client(win),
                };
                if let Err(e) = result {
                    return (CommandOutcome::err(WmError::ProtocolError(e.to_string())), none);
                }
            }
            (CommandOutcome::ok(), none)
        }

        Action::Fullscreen { action, mode } => {
            let matches = working_set();
            if matches.is_empty() {
                return (CommandOutcome::mismatch(), none);
            }
            for node in matches {
                let current = ctx.tree.get(node).map(|c| c.fullscreen).unwrap_or(FullscreenMode::None);
                let target_mode = match action {
                    ToggleAction::Enable => *mode,
                    ToggleAction::Disable => FullscreenMode::None,
                    ToggleAction::Toggle => {
                        if current == FullscreenMode::None {
                            *mode
                        } else {
                            FullscreenMode::None
                        }
                    }
                };
                let _ = ctx.tree.toggle_fullscreen(node, target_mode);
            }
            (CommandOutcome::ok(), none)
        }

        Action::Workspace(sel) => {
            if ctx.tree.iter().any(|c| c.fullscreen == FullscreenMode::Global) {
                return (
                    CommandOutcome::err(WmError::PolicyRefusal(
                        "cannot switch workspaces while a container is fullscreen-global".into(),
                    )),
                    none,
                );
            }
            if let WorkspaceSelector::Named(name) = sel {
                if is_reserved_workspace_name(name) {
                    return (
                        CommandOutcome::err(WmError::PolicyRefusal("workspace names may not start with '__'".into())),
                        none,
                    );
                }
            }
            match resolve_workspace_selector(ctx, sel, true) {
                Some(target) => {
                    switch_to_workspace(ctx.tree, target);
                    (CommandOutcome::ok(), none)
                }
                None => (CommandOutcome::err(WmError::PolicyRefusal("no such workspace".into())), none),
            }
        }

        Action::RenameWorkspace { old, new } => {
            if is_reserved_workspace_name(new) {
                return (
                    CommandOutcome::err(WmError::PolicyRefusal("workspace names may not start with '__'".into())),
                    none,
                );
            }
            if find_workspace_by_name(ctx.tree, new).is_some() {
                return (
                    CommandOutcome::err(WmError::PolicyRefusal(format!("a workspace named {new:?} already exists"))),
                    none,
                );
            }
            let target = match old {
                Some(n) => find_workspace_by_name(ctx.tree, n),
                None => current_visible_workspace(ctx.tree),
            };
            match target {
                Some(ws) => {
                    ctx.tree.get_mut(ws).expect("found above").name = Some(new.clone());
                    (CommandOutcome::ok(), none)
                }
                None => (CommandOutcome::mismatch(), none),
            }
        }

        Action::MoveWorkspaceToOutput(output_name) => {
            let Some(ws) = current_visible_workspace(ctx.tree) else {
                return (CommandOutcome::mismatch(), none);
            };
            let target_output = ctx
                .tree
                .outputs()
                .into_iter()
                .find(|o| ctx.tree.get(*o).and_then(|c| c.name.as_deref()) == Some(output_name.as_str()));
            let Some(target_output) = target_output else {
                return (CommandOutcome::err(WmError::PolicyRefusal(format!("no output named {output_name}"))), none);
            };
            let Some(target_content) = ctx.tree.content_of(target_output) else {
                return (CommandOutcome::err(WmError::PolicyRefusal("target output has no content node".into())), none);
            };
            if ctx.tree.detach(ws).and_then(|_| ctx.tree.attach(ws, target_content, Position::Last)).is_err() {
                return (CommandOutcome::err(WmError::InvariantViolation("failed to reparent workspace".into())), none);
            }
            (CommandOutcome::ok(), none)
        }

        Action::AppendLayout(data) => {
            let persisted: Result<core_state::PersistedNode, _> = serde_json::from_str(data);
            let persisted = match persisted {
                Ok(p) => p,
                Err(e) => return (CommandOutcome::err(WmError::ParseError(e.to_string())), none),
            };
            let parent = if persisted.role == Role::Workspace {
                ctx.tree
                    .focused
                    .and_then(|f| ctx.tree.output_of(f))
                    .and_then(|output| ctx.tree.content_of(output))
            } else {
                ctx.tree.focused.and_then(|f| nearest_split_ancestor(ctx.tree, f))
            };
            let Some(parent) = parent else {
                return (CommandOutcome::mismatch(), none);
            };
            match core_state::graft_from_json(ctx.tree, parent, data) {
                Ok(_) => (CommandOutcome::ok(), none),
                Err(e) => (CommandOutcome::err(WmError::ParseError(e.to_string())), none),
            }
        }

        Action::TitleFormat(fmt) => {
            let matches = working_set();
            if matches.is_empty() {
                return (CommandOutcome::mismatch(), none);
            }
            let stored = match fmt.as_deref() {
                Some("%title") => None,
                other => other.map(str::to_string),
            };
            for node in matches {
                if let Some(c) = ctx.tree.get_mut(node) {
                    c.title_format = stored.clone();
                }
            }
            ctx.tree.needs_render = true;
            (CommandOutcome::ok(), none)
        }

        Action::Gaps { scope, target, op, px } => {
            let delta = match op {
                GapOp::Set => None,
                GapOp::Plus => Some(*px as i32),
                GapOp::Minus => Some(-(*px as i32)),
            };
            match target {
                GapTarget::All => {
                    let base = match scope {
                        GapScope::Inner => ctx.config.file.gaps.inner,
                        GapScope::Outer => ctx.config.file.gaps.outer,
                    };
                    let new_value = match delta {
                        Some(d) => Config::clamp_gap(base, d),
                        None => *px,
                    };
                    match scope {
                        GapScope::Inner => ctx.config.file.gaps.inner = new_value,
                        GapScope::Outer => ctx.config.file.gaps.outer = new_value,
                    }
                }
                GapTarget::Current => {
                    let Some(ws) = current_visible_workspace(ctx.tree) else {
                        return (CommandOutcome::mismatch(), none);
                    };
                    let base_default = match scope {
                        GapScope::Inner => ctx.config.file.gaps.inner,
                        GapScope::Outer => ctx.config.file.gaps.outer,
                    };
                    let Some(c) = ctx.tree.get_mut(ws) else {
                        return (CommandOutcome::mismatch(), none);
                    };
                    let current = match scope {
                        GapScope::Inner => c.gap_inner_override.unwrap_or(base_default),
                        GapScope::Outer => c.gap_outer_override.unwrap_or(base_default),
                    };
                    let new_value = match delta {
                        Some(d) => Config::clamp_gap(current, d),
                        None => *px,
                    };
                    match scope {
                        GapScope::Inner => c.gap_inner_override = Some(new_value),
                        GapScope::Outer => c.gap_outer_override = Some(new_value),
                    }
                }
            }
            ctx.tree.needs_render = true;
            (CommandOutcome::ok(), none)
        }

        Action::Exec { no_startup_id: _, cmd: command } => match ctx.backend.spawn(command) {
            Ok(()) => (CommandOutcome::ok(), none),
            Err(e) => (CommandOutcome::err(WmError::ProtocolError(e.to_string())), none),
        },

        Action::Mode(name) => {
            if ctx.modes.switch(name) {
                (CommandOutcome::ok(), none)
            } else {
                (CommandOutcome::err(WmError::ParseError(format!("unknown binding mode {name:?}"))), none)
            }
        }

        Action::Bar(setting) => {
            match setting {
                BarSetting::Mode(m) => ctx.config.file.bar.hide_on_modifier = *m,
                BarSetting::HiddenState(s) => ctx.config.file.bar.hidden_state = *s,
            }
            (CommandOutcome::ok(), none)
        }

        Action::Reload => (CommandOutcome::ok(), ControlSignal::Reload),
        Action::Restart => (CommandOutcome::ok(), ControlSignal::Restart),
        Action::Exit => (CommandOutcome::ok(), ControlSignal::Exit),
    }
}

/// Resolve a `workspace`/`move ... to workspace` selector to a concrete
/// node, creating a named workspace lazily if it does not exist yet (§4.3
/// `workspace <name>`: "created lazily if absent"). `allow_back_and_forth`
/// gates the "re-requesting the visible workspace jumps to back_and_forth"
/// rule, which only applies to `workspace`, not `move ... to workspace`.
fn resolve_workspace_selector(ctx: &mut ActionContext, sel: &WorkspaceSelector, allow_back_and_forth: bool) -> Option<NodeId> {
    match sel {
        WorkspaceSelector::Named(name) => match find_workspace_by_name(ctx.tree, name) {
            Some(existing) => {
                let is_visible = Some(existing) == current_visible_workspace(ctx.tree);
                if allow_back_and_forth && is_visible && ctx.config.file.workspace_auto_back_and_forth {
                    ctx.tree.back_and_forth.clone().and_then(|n| find_workspace_by_name(ctx.tree, &n))
                } else {
                    Some(existing)
                }
            }
            None => create_workspace(ctx.tree, name),
        },
        WorkspaceSelector::Next => current_visible_workspace(ctx.tree).and_then(|cur| next_workspace(ctx.tree, cur)),
        WorkspaceSelector::Prev => current_visible_workspace(ctx.tree).and_then(|cur| prev_workspace(ctx.tree, cur)),
        WorkspaceSelector::BackAndForth => ctx.tree.back_and_forth.clone().and_then(|n| find_workspace_by_name(ctx.tree, &n)),
    }
}

/// Run a whole batch of commands (one IPC `RunCommand` payload may contain
/// several, separated by `;`/`,` in the out-of-scope grammar). Outcomes are
/// returned in order; the first fatal outcome (§7 `ProtocolError` /
/// `ResourceUnavailable`) or control signal stops the batch early.
pub fn execute_batch(ctx: &mut ActionContext, commands: &[Command]) -> (Vec<CommandOutcome>, ControlSignal) {
    let mut outcomes = Vec::with_capacity(commands.len());
    let mut signal = ControlSignal::None;
    for cmd in commands {
        let (outcome, cmd_signal) = execute(ctx, cmd);
        let fatal = outcome.fatal;
        outcomes.push(outcome);
        if fatal || cmd_signal != ControlSignal::None {
            signal = cmd_signal;
            break;
        }
    }
    (outcomes, signal)
}
