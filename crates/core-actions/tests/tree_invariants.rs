//! §8: "for every sequence of valid commands starting from a populated
//! tree, after each command the tree's structural invariants hold."
//! Drives `ContainerTree::check_invariants` after every command in an
//! arbitrary sequence rather than only at the end, so a transient violation
//! introduced mid-batch and repaired by a later step still fails the test.

use core_actions::command::{
    Action, Command, FloatingOp, FocusTarget, KillTarget, LayoutTarget, ResizeAmount, ResizeAxis, ResizeMode,
    SplitOrientation, ToggleAction, WorkspaceSelector,
};
use core_actions::{execute, ActionContext};
use core_config::Config;
use core_keymap::ModeTable;
use core_model::{Criteria, Direction};
use core_state::{ContainerTree, Position, Role};
use core_terminal::LoggingBackend;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum SimpleOp {
    Focus(Direction),
    Move(Direction),
    Split(SplitOrientation),
    LayoutToggle,
    FloatToggle,
    Kill,
    Workspace(WorkspaceSelector),
    Resize(ResizeMode, ResizeAxis, u32),
    Fullscreen,
}

fn direction() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::Left),
        Just(Direction::Right),
        Just(Direction::Up),
        Just(Direction::Down),
    ]
}

fn simple_op() -> impl Strategy<Value = SimpleOp> {
    prop_oneof![
        direction().prop_map(SimpleOp::Focus),
        direction().prop_map(SimpleOp::Move),
        Just(SimpleOp::Split(SplitOrientation::Horizontal)),
        Just(SimpleOp::Split(SplitOrientation::Vertical)),
        Just(SimpleOp::LayoutToggle),
        Just(SimpleOp::FloatToggle),
        Just(SimpleOp::Kill),
        Just(SimpleOp::Workspace(WorkspaceSelector::Next)),
        Just(SimpleOp::Workspace(WorkspaceSelector::Prev)),
        Just(SimpleOp::Workspace(WorkspaceSelector::Named("3".to_string()))),
        (direction(), 1u32..80).prop_map(|(dir, px)| {
            SimpleOp::Resize(ResizeMode::Grow, ResizeAxis::Direction(dir), px)
        }),
        Just(SimpleOp::Fullscreen),
    ]
}

fn to_command(op: &SimpleOp) -> Command {
    let action = match op.clone() {
        SimpleOp::Focus(dir) => Action::Focus(FocusTarget::Direction(dir)),
        SimpleOp::Move(dir) => Action::Move { dir, px: None },
        SimpleOp::Split(orientation) => Action::Split(orientation),
        SimpleOp::LayoutToggle => Action::Layout(LayoutTarget::ToggleSplit),
        SimpleOp::FloatToggle => Action::Floating(FloatingOp::Toggle),
        SimpleOp::Kill => Action::Kill(KillTarget::Window),
        SimpleOp::Workspace(sel) => Action::Workspace(sel),
        SimpleOp::Resize(mode, axis, px) => Action::Resize { mode, axis, amount: ResizeAmount { px, ppt: px } },
        SimpleOp::Fullscreen => Action::Fullscreen { action: ToggleAction::Toggle, mode: core_state::FullscreenMode::Output },
    };
    Command { criteria: Criteria::default(), action }
}

/// One output, one content, workspaces "1" and "2", three leaf windows
/// split across nested containers on workspace "1" so focus/move/resize/
/// kill all have something to act on from the start.
fn seed_tree() -> ContainerTree {
    let mut tree = ContainerTree::new();
    let output = tree.create(Role::Output);
    tree.attach(output, tree.root(), Position::Last).unwrap();
    let content = tree.create(Role::Content);
    tree.attach(content, output, Position::Last).unwrap();

    let ws1 = tree.create(Role::Workspace);
    tree.get_mut(ws1).unwrap().name = Some("1".to_string());
    tree.attach(ws1, content, Position::Last).unwrap();

    let ws2 = tree.create(Role::Workspace);
    tree.get_mut(ws2).unwrap().name = Some("2".to_string());
    tree.attach(ws2, content, Position::Last).unwrap();

    for _ in 0..3 {
        let leaf = tree.create(Role::LeafWindow);
        tree.attach(leaf, ws1, Position::Last).unwrap();
        tree.con_focus(leaf).unwrap();
    }
    tree.con_focus(ws1).unwrap();
    tree
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn invariants_hold_after_every_command_in_a_sequence(ops in proptest::collection::vec(simple_op(), 0..40)) {
        let mut tree = seed_tree();
        let mut config = Config::default();
        let mut modes = ModeTable::new();
        let mut backend = LoggingBackend::default();

        for op in &ops {
            let command = to_command(op);
            let mut ctx = ActionContext {
                tree: &mut tree,
                config: &mut config,
                modes: &mut modes,
                backend: &mut backend,
            };
            // A command may legitimately be refused (no node in that
            // direction, nothing left to kill); only the tree's shape after
            // the call is under test here, not each outcome's success.
            let _ = execute(&mut ctx, &command);
            prop_assert!(tree.check_invariants().is_ok(), "invariant violated after {:?}", op);
        }
    }
}
