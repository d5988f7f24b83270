//! Minimal command-string parser.
//!
//! The command grammar itself is explicitly out of scope (§1, §4.3 "Accepts
//! a parsed command AST (grammar out of scope)"); this module is a small,
//! deliberately non-exhaustive adapter so the `wm` binary's IPC endpoint has
//! something to hand `core_actions::Command` values to. It covers the
//! common case of each §4.3 command row with a bare action or a single
//! `[key=value,...]` criteria prefix; it does not attempt full i3 grammar
//! coverage (quoted strings with escapes, nested criteria, nullary
//! shorthand).

use core_actions::{Action, Command};
use core_actions::command::*;
use core_model::{Criteria, Direction, UrgentSelector};
use core_state::{BorderStyle, FullscreenMode};
use regex::Regex;

fn parse_regex(value: &str) -> Result<Regex, String> {
    Regex::new(value).map_err(|e| format!("bad regex {value:?}: {e}"))
}

fn parse_criteria(raw: &str) -> Result<Criteria, String> {
    let mut criteria = Criteria::default();
    for field in raw.split(',') {
        let field = field.trim();
        if field.is_empty() {
            continue;
        }
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| format!("malformed criteria field {field:?}"))?;
        let value = value.trim().trim_matches('"');
        match key.trim() {
            "class" => criteria.class = Some(parse_regex(value)?),
            "instance" => criteria.instance = Some(parse_regex(value)?),
            "window_role" => criteria.window_role = Some(parse_regex(value)?),
            "title" => criteria.title = Some(parse_regex(value)?),
            "con_mark" | "mark" => criteria.mark = Some(parse_regex(value)?),
            "workspace" => criteria.workspace = Some(parse_regex(value)?),
            "con_id" => criteria.container_id = Some(core_state::NodeId(
                value.parse().map_err(|_| format!("bad con_id {value:?}"))?,
            )),
            "window_id" => criteria.window_id = Some(value.parse().map_err(|_| format!("bad window_id {value:?}"))?),
            "urgent" => {
                criteria.urgent = Some(match value {
                    "latest" => UrgentSelector::Latest,
                    "oldest" => UrgentSelector::Oldest,
                    other => return Err(format!("unknown urgent selector {other:?}")),
                })
            }
            other => return Err(format!("unknown criteria field {other:?}")),
        }
    }
    Ok(criteria)
}

/// Split one command's leading `[...]` criteria block (if present) from its
/// action text.
fn split_criteria(cmd: &str) -> Result<(Criteria, &str), String> {
    let cmd = cmd.trim();
    if let Some(rest) = cmd.strip_prefix('[') {
        let close = rest.find(']').ok_or_else(|| "unterminated [criteria]".to_string())?;
        let criteria = parse_criteria(&rest[..close])?;
        Ok((criteria, rest[close + 1..].trim()))
    } else {
        Ok((Criteria::default(), cmd))
    }
}

fn parse_direction(s: &str) -> Result<Direction, String> {
    match s {
        "left" => Ok(Direction::Left),
        "right" => Ok(Direction::Right),
        "up" => Ok(Direction::Up),
        "down" => Ok(Direction::Down),
        other => Err(format!("unknown direction {other:?}")),
    }
}

fn parse_workspace_selector(toks: &[&str]) -> Result<WorkspaceSelector, String> {
    match toks {
        ["next"] => Ok(WorkspaceSelector::Next),
        ["prev"] => Ok(WorkspaceSelector::Prev),
        ["back_and_forth"] => Ok(WorkspaceSelector::BackAndForth),
        [name] => Ok(WorkspaceSelector::Named(name.to_string())),
        [] => Err("expected a workspace selector".to_string()),
        _ => Ok(WorkspaceSelector::Named(toks.join(" "))),
    }
}

fn parse_px(s: &str) -> Result<u32, String> {
    s.parse().map_err(|_| format!("expected a pixel count, got {s:?}"))
}

/// Parse one action (criteria already stripped) into an [`Action`].
fn parse_action(rest: &str) -> Result<Action, String> {
    let toks: Vec<&str> = rest.split_whitespace().collect();
    match toks.as_slice() {
        ["focus"] => Ok(Action::Focus(FocusTarget::Matched)),
        ["focus", "parent"] => Ok(Action::Focus(FocusTarget::Parent)),
        ["focus", "child"] => Ok(Action::Focus(FocusTarget::Child)),
        ["focus", "mode_toggle"] => Ok(Action::Focus(FocusTarget::ModeToggle)),
        ["focus", dir] => Ok(Action::Focus(FocusTarget::Direction(parse_direction(dir)?))),

        ["move", "to", "workspace", rest @ ..] => Ok(Action::MoveToWorkspace(parse_workspace_selector(rest)?)),
        ["move", "workspace", "to", "output", name] => Ok(Action::MoveWorkspaceToOutput(name.to_string())),
        ["move", dir] => Ok(Action::Move { dir: parse_direction(dir)?, px: None }),
        ["move", dir, px, "px"] => Ok(Action::Move { dir: parse_direction(dir)?, px: Some(parse_px(px)?) }),

        ["resize", mode, axis, px, "px"] => parse_resize(mode, axis, px, None),
        ["resize", mode, axis, px, "px", "or", ppt, "ppt"] => parse_resize(mode, axis, px, Some(ppt)),

        ["split", "v"] | ["split", "vertical"] => Ok(Action::Split(SplitOrientation::Vertical)),
        ["split", "h"] | ["split", "horizontal"] => Ok(Action::Split(SplitOrientation::Horizontal)),

        ["layout", "splith"] => Ok(Action::Layout(LayoutTarget::SplitH)),
        ["layout", "splitv"] => Ok(Action::Layout(LayoutTarget::SplitV)),
        ["layout", "stacking"] => Ok(Action::Layout(LayoutTarget::Stacked)),
        ["layout", "tabbed"] => Ok(Action::Layout(LayoutTarget::Tabbed)),
        ["layout", "toggle"] => Ok(Action::Layout(LayoutTarget::ToggleAll)),
        ["layout", "toggle", "all"] => Ok(Action::Layout(LayoutTarget::ToggleAll)),
        ["layout", "toggle", "split"] => Ok(Action::Layout(LayoutTarget::ToggleSplit)),

        ["floating", "enable"] => Ok(Action::Floating(FloatingOp::Enable)),
        ["floating", "disable"] => Ok(Action::Floating(FloatingOp::Disable)),
        ["floating", "toggle"] => Ok(Action::Floating(FloatingOp::Toggle)),

        ["border", "normal"] => Ok(Action::Border(BorderOp::Set(BorderStyle::Normal))),
        ["border", "pixel"] => Ok(Action::Border(BorderOp::Set(BorderStyle::Pixel))),
        ["border", "none"] => Ok(Action::Border(BorderOp::Set(BorderStyle::None))),
        ["border", "toggle"] => Ok(Action::Border(BorderOp::Toggle)),

        ["mark", "--toggle", name] => Ok(Action::Mark { toggle: true, name: (*name).to_string() }),
        ["mark", name] => Ok(Action::Mark { toggle: false, name: (*name).to_string() }),
        ["unmark"] => Ok(Action::Unmark(None)),
        ["unmark", name] => Ok(Action::Unmark(Some((*name).to_string()))),

        ["kill"] => Ok(Action::Kill(KillTarget::Window)),
        ["kill", "window"] => Ok(Action::Kill(KillTarget::Window)),
        ["kill", "client"] => Ok(Action::Kill(KillTarget::Client)),

        ["fullscreen", action] => parse_fullscreen(action, FullscreenMode::Output),
        ["fullscreen", action, "global"] => parse_fullscreen(action, FullscreenMode::Global),

        ["workspace", rest @ ..] => Ok(Action::Workspace(parse_workspace_selector(rest)?)),

        ["rename", "workspace", "to", new] => Ok(Action::RenameWorkspace { old: None, new: (*new).to_string() }),
        ["rename", "workspace", old, "to", new] => {
            Ok(Action::RenameWorkspace { old: Some((*old).to_string()), new: (*new).to_string() })
        }

        ["append_layout", path] => Ok(Action::AppendLayout((*path).to_string())),

        ["title_format", "%title"] => Ok(Action::TitleFormat(None)),
        ["title_format", rest @ ..] => Ok(Action::TitleFormat(Some(rest.join(" ")))),

        ["gaps", scope, target, op, px] => parse_gaps(scope, target, op, px),

        ["exec", "--no-startup-id", rest @ ..] => Ok(Action::Exec { no_startup_id: true, cmd: rest.join(" ") }),
        ["exec", rest @ ..] => Ok(Action::Exec { no_startup_id: false, cmd: rest.join(" ") }),

        ["mode", name] => Ok(Action::Mode((*name).to_string())),

        ["bar", "mode", mode, rest @ ..] => parse_bar_mode(mode, rest),
        ["bar", "hidden_state", state, rest @ ..] => parse_bar_hidden_state(state, rest),

        ["reload"] => Ok(Action::Reload),
        ["restart"] => Ok(Action::Restart),
        ["exit"] => Ok(Action::Exit),

        [] => Err("empty command".to_string()),
        other => Err(format!("unrecognized command: {}", other.join(" "))),
    }
}

fn parse_resize(mode: &str, axis: &str, px: &str, ppt: Option<&str>) -> Result<Action, String> {
    let mode = match mode {
        "grow" => ResizeMode::Grow,
        "shrink" => ResizeMode::Shrink,
        other => return Err(format!("unknown resize mode {other:?}")),
    };
    let axis = match axis {
        "width" => ResizeAxis::Width,
        "height" => ResizeAxis::Height,
        dir => ResizeAxis::Direction(parse_direction(dir)?),
    };
    let px: u32 = parse_px(px)?;
    let ppt: u32 = match ppt {
        Some(s) => s.parse().map_err(|_| format!("expected a percent count, got {s:?}"))?,
        None => px,
    };
    Ok(Action::Resize { mode, axis, amount: ResizeAmount { px, ppt } })
}

fn parse_fullscreen(action: &str, mode: FullscreenMode) -> Result<Action, String> {
    let action = match action {
        "enable" => ToggleAction::Enable,
        "disable" => ToggleAction::Disable,
        "toggle" => ToggleAction::Toggle,
        other => return Err(format!("unknown fullscreen action {other:?}")),
    };
    Ok(Action::Fullscreen { action, mode })
}

fn parse_gaps(scope: &str, target: &str, op: &str, px: &str) -> Result<Action, String> {
    let scope = match scope {
        "inner" => GapScope::Inner,
        "outer" => GapScope::Outer,
        other => return Err(format!("unknown gap scope {other:?}")),
    };
    let target = match target {
        "current" => GapTarget::Current,
        "all" => GapTarget::All,
        other => return Err(format!("unknown gap target {other:?}")),
    };
    let op = match op {
        "set" => GapOp::Set,
        "plus" => GapOp::Plus,
        "minus" => GapOp::Minus,
        other => return Err(format!("unknown gap op {other:?}")),
    };
    Ok(Action::Gaps { scope, target, op, px: parse_px(px)? })
}

fn parse_bar_mode(mode: &str, id: &[&str]) -> Result<Action, String> {
    let _ = id; // per-bar id targeting is a multi-bar feature this adapter does not model.
    let mode = match mode {
        "dock" => core_config::HideOnModifier::Dock,
        "hide" => core_config::HideOnModifier::Hide,
        "invisible" => core_config::HideOnModifier::Invisible,
        other => return Err(format!("unknown bar mode {other:?}")),
    };
    Ok(Action::Bar(BarSetting::Mode(mode)))
}

fn parse_bar_hidden_state(state: &str, id: &[&str]) -> Result<Action, String> {
    let _ = id;
    let state = match state {
        "show" => core_config::HiddenState::Show,
        "hide" => core_config::HiddenState::Hide,
        other => return Err(format!("unknown bar hidden_state {other:?}")),
    };
    Ok(Action::Bar(BarSetting::HiddenState(state)))
}

/// Parse a `;`-separated batch of commands, as sent over `RUN_COMMAND` (§6).
pub fn parse_command_line(line: &str) -> Result<Vec<Command>, String> {
    let mut out = Vec::new();
    for raw_cmd in line.split(';') {
        let raw_cmd = raw_cmd.trim();
        if raw_cmd.is_empty() {
            continue;
        }
        let (criteria, rest) = split_criteria(raw_cmd)?;
        let action = parse_action(rest)?;
        out.push(Command { criteria, action });
    }
    if out.is_empty() {
        return Err("empty command line".to_string());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_focus_direction() {
        let cmds = parse_command_line("focus left").unwrap();
        assert_eq!(cmds.len(), 1);
        assert!(matches!(cmds[0].action, Action::Focus(FocusTarget::Direction(Direction::Left))));
        assert!(cmds[0].criteria.is_empty());
    }

    #[test]
    fn parses_resize_with_ppt_fallback() {
        let cmds = parse_command_line("resize grow left 10 px or 10 ppt").unwrap();
        let Action::Resize { mode, axis, amount } = cmds[0].action.clone() else { panic!() };
        assert_eq!(mode, ResizeMode::Grow);
        assert_eq!(axis, ResizeAxis::Direction(Direction::Left));
        assert_eq!(amount.px, 10);
        assert_eq!(amount.ppt, 10);
    }

    #[test]
    fn parses_criteria_prefixed_command() {
        let cmds = parse_command_line(r#"[con_mark="m1"] focus"#).unwrap();
        assert!(!cmds[0].criteria.is_empty());
        assert!(matches!(cmds[0].action, Action::Focus(FocusTarget::Matched)));
    }

    #[test]
    fn parses_semicolon_separated_batch() {
        let cmds = parse_command_line("workspace 1; split h; layout tabbed").unwrap();
        assert_eq!(cmds.len(), 3);
    }

    #[test]
    fn rejects_unknown_command() {
        assert!(parse_command_line("frobnicate").is_err());
    }

    #[test]
    fn rejects_unterminated_criteria() {
        assert!(parse_command_line("[class=foo focus").is_err());
    }
}
