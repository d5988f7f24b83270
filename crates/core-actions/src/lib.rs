//! Command AST and the dispatcher that applies it to the container tree
//! (§4.3, §7).

pub mod command;
pub mod dispatcher;
pub mod error;

pub use command::{Action, Command};
pub use dispatcher::{execute, execute_batch, ActionContext, CommandOutcome, ControlSignal};
pub use error::WmError;

#[cfg(test)]
mod tests {
    use super::*;
    use command::{
        Action, BorderOp, Command, FloatingOp, FocusTarget, GapOp, GapScope, GapTarget, KillTarget, LayoutTarget,
        ResizeAmount, ResizeAxis, ResizeMode, SplitOrientation, ToggleAction, WorkspaceSelector,
    };
    use core_config::Config;
    use core_keymap::ModeTable;
    use core_model::{Criteria, Direction};
    use core_state::{ContainerTree, FullscreenMode, NodeId, Position, Role};
    use core_terminal::{LoggingBackend, WindowHandle};
    use pretty_assertions::assert_eq;

    struct Fixture {
        tree: ContainerTree,
        config: Config,
        modes: ModeTable,
        backend: LoggingBackend,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                tree: ContainerTree::new(),
                config: Config::default(),
                modes: ModeTable::new(),
                backend: LoggingBackend::default(),
            }
        }

        fn ctx(&mut self) -> ActionContext<'_> {
            ActionContext {
                tree: &mut self.tree,
                config: &mut self.config,
                modes: &mut self.modes,
                backend: &mut self.backend,
            }
        }
    }

    /// One output, one content node, one workspace named "1" — the base
    /// layout every scenario below builds on.
    fn single_workspace(tree: &mut ContainerTree) -> NodeId {
        let output = tree.create(Role::Output);
        tree.attach(output, tree.root(), Position::Last).unwrap();
        let content = tree.create(Role::Content);
        tree.attach(content, output, Position::Last).unwrap();
        let ws = tree.create(Role::Workspace);
        tree.get_mut(ws).unwrap().name = Some("1".into());
        tree.attach(ws, content, Position::Last).unwrap();
        ws
    }

    fn leaf(tree: &mut ContainerTree, parent: NodeId, handle: u32) -> NodeId {
        let node = tree.create(Role::LeafWindow);
        tree.get_mut(node).unwrap().window = Some(WindowHandle(handle));
        tree.attach(node, parent, Position::Last).unwrap();
        node
    }

    fn no_criteria_command(action: Action) -> Command {
        Command { criteria: Criteria::default(), action }
    }

    /// §8 scenario 1: `resize grow left 10 px or 10 ppt` with B focused among
    /// two tiled leaves at 0.5/0.5 moves 0.1 share from A to B.
    #[test]
    fn scenario_1_resize_grow_moves_share_from_sibling_to_focused() {
        let mut fx = Fixture::new();
        let ws = single_workspace(&mut fx.tree);
        let a = leaf(&mut fx.tree, ws, 1);
        let b = leaf(&mut fx.tree, ws, 2);
        fx.tree.con_focus(b).unwrap();

        let cmd = no_criteria_command(Action::Resize {
            mode: ResizeMode::Grow,
            axis: ResizeAxis::Direction(Direction::Left),
            amount: ResizeAmount { px: 10, ppt: 10 },
        });
        let (outcome, _) = execute(&mut fx.ctx(), &cmd);
        assert!(outcome.reply.success);
        assert!((fx.tree.get(a).unwrap().percent - 0.4).abs() < 1e-9);
        assert!((fx.tree.get(b).unwrap().percent - 0.6).abs() < 1e-9);
        assert!(fx.tree.needs_render);
    }

    /// §8 scenario 2: `move right` on A among A B C (SplitH) reorders to
    /// B A C without moving focus off A.
    #[test]
    fn scenario_2_move_right_reorders_without_moving_focus() {
        let mut fx = Fixture::new();
        let ws = single_workspace(&mut fx.tree);
        let a = leaf(&mut fx.tree, ws, 1);
        let b = leaf(&mut fx.tree, ws, 2);
        let c = leaf(&mut fx.tree, ws, 3);
        fx.tree.con_focus(a).unwrap();

        let cmd = no_criteria_command(Action::Move { dir: Direction::Right, px: None });
        let (outcome, _) = execute(&mut fx.ctx(), &cmd);
        assert!(outcome.reply.success);
        assert_eq!(fx.tree.get(ws).unwrap().children, vec![b, a, c]);
        assert_eq!(fx.tree.focused, Some(a));
    }

    /// §8 scenario 3: requesting the already-visible workspace under
    /// `workspace_auto_back_and_forth` redirects to the previously-visible
    /// workspace.
    #[test]
    fn scenario_3_workspace_auto_back_and_forth_redirects() {
        let mut fx = Fixture::new();
        fx.config.file.workspace_auto_back_and_forth = true;
        let output = fx.tree.create(Role::Output);
        fx.tree.attach(output, fx.tree.root(), Position::Last).unwrap();
        let content = fx.tree.create(Role::Content);
        fx.tree.attach(content, output, Position::Last).unwrap();
        let ws1 = fx.tree.create(Role::Workspace);
        fx.tree.get_mut(ws1).unwrap().name = Some("1".into());
        fx.tree.attach(ws1, content, Position::Last).unwrap();
        let ws2 = fx.tree.create(Role::Workspace);
        fx.tree.get_mut(ws2).unwrap().name = Some("2".into());
        fx.tree.attach(ws2, content, Position::Last).unwrap();

        // "1" visible, "2" was the previously-visible workspace.
        fx.tree.con_focus(ws1).unwrap();
        fx.tree.con_focus(ws2).unwrap();
        fx.tree.con_focus(ws1).unwrap();
        fx.tree.back_and_forth = Some("2".into());

        let cmd = no_criteria_command(Action::Workspace(WorkspaceSelector::Named("1".into())));
        let (outcome, _) = execute(&mut fx.ctx(), &cmd);
        assert!(outcome.reply.success);
        assert!(fx.tree.is_visible_workspace(ws2));
    }

    /// §8 scenario 4: two containers sharing a mark via direct state (not
    /// `set_mark`, which already enforces uniqueness) — bare `focus` with
    /// that mark as criteria warns and focuses the last match, per the
    /// pinned behavior (distinct from `mark`'s reject-before-mutate rule).
    #[test]
    fn scenario_4_duplicate_mark_focus_focuses_last_match() {
        let mut fx = Fixture::new();
        let ws = single_workspace(&mut fx.tree);
        let a = leaf(&mut fx.tree, ws, 1);
        let b = leaf(&mut fx.tree, ws, 2);
        fx.tree.get_mut(a).unwrap().mark = Some("m1".into());
        fx.tree.get_mut(b).unwrap().mark = Some("m1".into());

        let cmd = Command {
            criteria: Criteria { mark: Some(regex::Regex::new("^m1$").unwrap()), ..Default::default() },
            action: Action::Focus(FocusTarget::Matched),
        };
        let (outcome, _) = execute(&mut fx.ctx(), &cmd);
        assert!(outcome.reply.success);
        assert_eq!(fx.tree.focused, Some(b));
    }

    /// §8 scenario 5: `focus left` with fullscreen-global active elsewhere
    /// succeeds but leaves focus untouched (refused silently by the
    /// fullscreen boundary).
    #[test]
    fn scenario_5_focus_refused_by_fullscreen_boundary_still_succeeds() {
        let mut fx = Fixture::new();
        let ws = single_workspace(&mut fx.tree);
        let l = leaf(&mut fx.tree, ws, 1);
        let other = leaf(&mut fx.tree, ws, 2);
        fx.tree.get_mut(other).unwrap().rect = core_geom::Rect::new(0, 0, 100, 100);
        fx.tree.get_mut(l).unwrap().rect = core_geom::Rect::new(200, 0, 100, 100);
        fx.tree.con_focus(l).unwrap();
        fx.tree.toggle_fullscreen(l, FullscreenMode::Global).unwrap();

        let cmd = no_criteria_command(Action::Focus(FocusTarget::Direction(Direction::Left)));
        let (outcome, _) = execute(&mut fx.ctx(), &cmd);
        assert!(outcome.reply.success);
        assert_eq!(fx.tree.focused, Some(l));
    }

    #[test]
    fn resize_stops_at_minimum_share_and_reports_failure() {
        let mut fx = Fixture::new();
        let ws = single_workspace(&mut fx.tree);
        let a = leaf(&mut fx.tree, ws, 1);
        let _b = leaf(&mut fx.tree, ws, 2);
        fx.tree.con_focus(a).unwrap();

        let cmd = no_criteria_command(Action::Resize {
            mode: ResizeMode::Shrink,
            axis: ResizeAxis::Width,
            amount: ResizeAmount { px: 0, ppt: 90 },
        });
        let (outcome, _) = execute(&mut fx.ctx(), &cmd);
        assert!(!outcome.reply.success);
        assert!((fx.tree.get(a).unwrap().percent - 0.5).abs() < 1e-9);
    }

    #[test]
    fn reserved_workspace_names_are_rejected_by_workspace_command() {
        let mut fx = Fixture::new();
        single_workspace(&mut fx.tree);
        let cmd = no_criteria_command(Action::Workspace(WorkspaceSelector::Named("__scratch".into())));
        let (outcome, _) = execute(&mut fx.ctx(), &cmd);
        assert!(!outcome.reply.success);
    }

    #[test]
    fn reserved_workspace_names_are_rejected_by_move_to_workspace() {
        let mut fx = Fixture::new();
        let ws = single_workspace(&mut fx.tree);
        let leaf = fx.tree.create(Role::LeafWindow);
        fx.tree.attach(leaf, ws, Position::Last).unwrap();
        fx.tree.con_focus(leaf).unwrap();

        let cmd = no_criteria_command(Action::MoveToWorkspace(WorkspaceSelector::Named("__scratch".into())));
        let (outcome, _) = execute(&mut fx.ctx(), &cmd);
        assert!(!outcome.reply.success);
        assert!(fx.tree.iter().all(|c| c.name.as_deref() != Some("__scratch")), "no workspace should have been created");
    }

    #[test]
    fn empty_criteria_on_childless_focused_workspace_fails_move() {
        let mut fx = Fixture::new();
        let ws = single_workspace(&mut fx.tree);
        fx.tree.con_focus(ws).unwrap();

        let cmd = no_criteria_command(Action::Move { dir: Direction::Left, px: None });
        let (outcome, _) = execute(&mut fx.ctx(), &cmd);
        assert!(!outcome.reply.success);
    }

    #[test]
    fn mark_rejects_multi_match_before_any_mutation() {
        let mut fx = Fixture::new();
        let ws = single_workspace(&mut fx.tree);
        let a = leaf(&mut fx.tree, ws, 1);
        let b = leaf(&mut fx.tree, ws, 2);
        fx.tree.get_mut(a).unwrap().properties.class = Some("Term".into());
        fx.tree.get_mut(b).unwrap().properties.class = Some("Term".into());

        let cmd = Command {
            criteria: Criteria { class: Some(regex::Regex::new("^Term$").unwrap()), ..Default::default() },
            action: Action::Mark { toggle: false, name: "scratch".into() },
        };
        let (outcome, _) = execute(&mut fx.ctx(), &cmd);
        assert!(!outcome.reply.success);
        assert_eq!(fx.tree.get(a).unwrap().mark, None);
        assert_eq!(fx.tree.get(b).unwrap().mark, None);
    }

    #[test]
    fn split_v_preserves_sibling_shares_and_wraps_focused_leaf() {
        let mut fx = Fixture::new();
        let ws = single_workspace(&mut fx.tree);
        let a = leaf(&mut fx.tree, ws, 1);
        let b = leaf(&mut fx.tree, ws, 2);
        fx.tree.con_focus(a).unwrap();

        let cmd = no_criteria_command(Action::Split(SplitOrientation::Vertical));
        let (outcome, _) = execute(&mut fx.ctx(), &cmd);
        assert!(outcome.reply.success);
        assert!((fx.tree.get(b).unwrap().percent - 0.5).abs() < 1e-9);
        fx.tree.check_invariants().unwrap();
    }

    #[test]
    fn layout_toggle_all_cycles_through_the_full_set() {
        let mut fx = Fixture::new();
        let ws = single_workspace(&mut fx.tree);
        let split = fx.tree.create(Role::SplitContainer);
        fx.tree.attach(split, ws, Position::Last).unwrap();
        fx.tree.con_focus(split).unwrap();

        for expected in [core_state::Layout::SplitV, core_state::Layout::Stacked, core_state::Layout::Tabbed, core_state::Layout::SplitH] {
            let cmd = no_criteria_command(Action::Layout(LayoutTarget::ToggleAll));
            let (outcome, _) = execute(&mut fx.ctx(), &cmd);
            assert!(outcome.reply.success);
            assert_eq!(fx.tree.get(split).unwrap().layout, expected);
        }
    }

    #[test]
    fn floating_toggle_round_trips_back_to_tiling() {
        let mut fx = Fixture::new();
        let ws = single_workspace(&mut fx.tree);
        let a = leaf(&mut fx.tree, ws, 1);
        fx.tree.con_focus(a).unwrap();

        let enable = no_criteria_command(Action::Floating(FloatingOp::Toggle));
        execute(&mut fx.ctx(), &enable);
        assert!(fx.tree.is_floating(a));

        let disable = no_criteria_command(Action::Floating(FloatingOp::Toggle));
        execute(&mut fx.ctx(), &disable);
        assert!(!fx.tree.is_floating(a));
    }

    #[test]
    fn border_toggle_cycles_normal_pixel_none() {
        let mut fx = Fixture::new();
        let ws = single_workspace(&mut fx.tree);
        let a = leaf(&mut fx.tree, ws, 1);
        fx.tree.con_focus(a).unwrap();

        for expected in [core_state::BorderStyle::Pixel, core_state::BorderStyle::None, core_state::BorderStyle::Normal] {
            let cmd = no_criteria_command(Action::Border(BorderOp::Toggle));
            execute(&mut fx.ctx(), &cmd);
            assert_eq!(fx.tree.get(a).unwrap().border, expected);
        }
    }

    #[test]
    fn kill_client_asks_the_backend_to_terminate_the_window() {
        let mut fx = Fixture::new();
        let ws = single_workspace(&mut fx.tree);
        let a = leaf(&mut fx.tree, ws, 7);
        fx.tree.con_focus(a).unwrap();

        let cmd = no_criteria_command(Action::Kill(KillTarget::Client));
        let (outcome, _) = execute(&mut fx.ctx(), &cmd);
        assert!(outcome.reply.success);
    }

    #[test]
    fn gaps_plus_and_minus_clamp_at_zero() {
        let mut fx = Fixture::new();
        single_workspace(&mut fx.tree);

        let plus = no_criteria_command(Action::Gaps { scope: GapScope::Inner, target: GapTarget::All, op: GapOp::Plus, px: 5 });
        execute(&mut fx.ctx(), &plus);
        assert_eq!(fx.config.file.gaps.inner, 5);

        let minus = no_criteria_command(Action::Gaps { scope: GapScope::Inner, target: GapTarget::All, op: GapOp::Minus, px: 20 });
        execute(&mut fx.ctx(), &minus);
        assert_eq!(fx.config.file.gaps.inner, 0);
    }

    #[test]
    fn gaps_current_workspace_uses_a_per_workspace_override() {
        let mut fx = Fixture::new();
        let ws = single_workspace(&mut fx.tree);
        fx.tree.con_focus(ws).unwrap();

        let cmd = no_criteria_command(Action::Gaps { scope: GapScope::Outer, target: GapTarget::Current, op: GapOp::Set, px: 12 });
        execute(&mut fx.ctx(), &cmd);
        assert_eq!(fx.tree.get(ws).unwrap().gap_outer_override, Some(12));
        assert_eq!(fx.config.file.gaps.outer, 0);
    }

    #[test]
    fn reload_and_restart_surface_as_control_signals() {
        let mut fx = Fixture::new();
        single_workspace(&mut fx.tree);

        let (outcome, signal) = execute(&mut fx.ctx(), &no_criteria_command(Action::Reload));
        assert!(outcome.reply.success);
        assert_eq!(signal, ControlSignal::Reload);

        let (outcome, signal) = execute(&mut fx.ctx(), &no_criteria_command(Action::Restart));
        assert!(outcome.reply.success);
        assert_eq!(signal, ControlSignal::Restart);
    }

    #[test]
    fn mode_switch_rejects_an_unregistered_mode_name() {
        let mut fx = Fixture::new();
        single_workspace(&mut fx.tree);
        let (outcome, _) = execute(&mut fx.ctx(), &no_criteria_command(Action::Mode("resize".into())));
        assert!(!outcome.reply.success);
    }

    #[test]
    fn fullscreen_toggle_is_exclusive_among_siblings() {
        let mut fx = Fixture::new();
        let ws = single_workspace(&mut fx.tree);
        let a = leaf(&mut fx.tree, ws, 1);
        let b = leaf(&mut fx.tree, ws, 2);
        fx.tree.toggle_fullscreen(a, FullscreenMode::Global).unwrap();
        fx.tree.con_focus(b).unwrap();

        let cmd = no_criteria_command(Action::Fullscreen { action: ToggleAction::Enable, mode: FullscreenMode::Global });
        execute(&mut fx.ctx(), &cmd);
        assert_eq!(fx.tree.get(a).unwrap().fullscreen, FullscreenMode::None);
        assert_eq!(fx.tree.get(b).unwrap().fullscreen, FullscreenMode::Global);
    }

    #[test]
    fn append_layout_grafts_a_leaf_under_the_focused_split() {
        let mut fx = Fixture::new();
        let ws = single_workspace(&mut fx.tree);
        let split = fx.tree.create(Role::SplitContainer);
        fx.tree.attach(split, ws, Position::Last).unwrap();
        fx.tree.con_focus(split).unwrap();

        let persisted = core_state::PersistedNode {
            role: Role::LeafWindow,
            layout: core_state::Layout::Default,
            rect: core_geom::Rect::default(),
            percent: 1.0,
            border: core_state::BorderStyle::Normal,
            border_width: 2,
            fullscreen: FullscreenMode::None,
            mark: None,
            title_format: None,
            window_id: Some(99),
            name: None,
            properties: Default::default(),
            gap_inner_override: None,
            gap_outer_override: None,
            children: Vec::new(),
        };
        let json = serde_json::to_string(&persisted).unwrap();
        let cmd = no_criteria_command(Action::AppendLayout(json));
        let (outcome, _) = execute(&mut fx.ctx(), &cmd);
        assert!(outcome.reply.success);
        assert!(fx
            .tree
            .get(split)
            .unwrap()
            .children
            .iter()
            .any(|c| fx.tree.get(*c).unwrap().window == Some(WindowHandle(99))));
    }
}
