//! The container tree: the authoritative state of the window manager (§3,
//! §4.1). Every read and mutation the rest of the workspace performs on the
//! layout goes through [`ContainerTree`]'s operations; nothing else is
//! allowed to reach into a [`Container`]'s `children`/`parent` fields
//! directly.

mod container;
mod error;
mod persist;
mod tree;

pub use container::{
    BorderStyle, Container, FullscreenMode, Layout, NodeId, Role, Urgency, WindowProperties, WindowType, ROOT,
};
pub use error::TreeError;
pub use persist::{from_json, graft_from_json, to_json, PersistedNode};
pub use tree::{Axis, ContainerTree, Position};

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn make_single_workspace() -> (ContainerTree, NodeId, NodeId) {
        let mut tree = ContainerTree::new();
        let output = tree.create(Role::Output);
        tree.attach(output, tree.root(), Position::Last).unwrap();
        let content = tree.create(Role::Content);
        tree.attach(content, output, Position::Last).unwrap();
        let ws = tree.create(Role::Workspace);
        tree.get_mut(ws).unwrap().name = Some("1".into());
        tree.attach(ws, content, Position::Last).unwrap();
        (tree, output, ws)
    }

    #[test]
    fn attach_rebalances_percentages_across_siblings() {
        let (mut tree, _output, ws) = make_single_workspace();
        let a = tree.create(Role::LeafWindow);
        tree.get_mut(a).unwrap().window = Some(core_terminal::WindowHandle(1));
        tree.attach(a, ws, Position::Last).unwrap();
        assert!((tree.get(a).unwrap().percent - 1.0).abs() < 1e-9);

        let b = tree.create(Role::LeafWindow);
        tree.get_mut(b).unwrap().window = Some(core_terminal::WindowHandle(2));
        tree.attach(b, ws, Position::Last).unwrap();
        assert!((tree.get(a).unwrap().percent - 0.5).abs() < 1e-9);
        assert!((tree.get(b).unwrap().percent - 0.5).abs() < 1e-9);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn attach_rejects_role_mismatch() {
        let (mut tree, output, _ws) = make_single_workspace();
        let leaf = tree.create(Role::LeafWindow);
        let err = tree.attach(leaf, output, Position::Last).unwrap_err();
        assert_eq!(err, TreeError::RoleMismatch(leaf));
    }

    #[test]
    fn detach_collapses_empty_split_container_but_not_workspace() {
        let (mut tree, _output, ws) = make_single_workspace();
        let split = tree.create(Role::SplitContainer);
        tree.attach(split, ws, Position::Last).unwrap();
        let leaf = tree.create(Role::LeafWindow);
        tree.get_mut(leaf).unwrap().window = Some(core_terminal::WindowHandle(1));
        tree.attach(leaf, split, Position::Last).unwrap();

        tree.detach(leaf).unwrap();
        // The split container had exactly one child; detaching it leaves the
        // split empty, which self-collapses into the workspace.
        assert!(tree.get(split).is_none());
        assert!(tree.get(ws).is_some(), "workspace must survive even when empty");
    }

    #[test]
    fn fullscreen_global_is_unique() {
        let (mut tree, _output, ws) = make_single_workspace();
        let a = tree.create(Role::LeafWindow);
        tree.attach(a, ws, Position::Last).unwrap();
        let b = tree.create(Role::LeafWindow);
        tree.attach(b, ws, Position::Last).unwrap();

        tree.toggle_fullscreen(a, FullscreenMode::Global).unwrap();
        tree.toggle_fullscreen(b, FullscreenMode::Global).unwrap();
        assert_eq!(tree.get(a).unwrap().fullscreen, FullscreenMode::None);
        assert_eq!(tree.get(b).unwrap().fullscreen, FullscreenMode::Global);
    }

    #[test]
    fn con_focus_refuses_to_cross_fullscreen_boundary() {
        let (mut tree, _output, ws) = make_single_workspace();
        let a = tree.create(Role::LeafWindow);
        tree.attach(a, ws, Position::Last).unwrap();
        let b = tree.create(Role::LeafWindow);
        tree.attach(b, ws, Position::Last).unwrap();

        tree.toggle_fullscreen(a, FullscreenMode::Global).unwrap();
        assert!(!tree.con_focus(b).unwrap());
        assert!(tree.con_focus(a).unwrap());
    }

    #[test]
    fn set_mark_steals_from_prior_holder() {
        let (mut tree, _output, ws) = make_single_workspace();
        let a = tree.create(Role::LeafWindow);
        tree.attach(a, ws, Position::Last).unwrap();
        let b = tree.create(Role::LeafWindow);
        tree.attach(b, ws, Position::Last).unwrap();

        tree.set_mark(a, "scratch", false).unwrap();
        tree.set_mark(b, "scratch", false).unwrap();
        assert_eq!(tree.get(a).unwrap().mark, None);
        assert_eq!(tree.get(b).unwrap().mark.as_deref(), Some("scratch"));
    }

    #[test]
    fn set_mark_toggle_clears_when_already_set() {
        let (mut tree, _output, ws) = make_single_workspace();
        let a = tree.create(Role::LeafWindow);
        tree.attach(a, ws, Position::Last).unwrap();
        tree.set_mark(a, "x", true).unwrap();
        assert_eq!(tree.get(a).unwrap().mark.as_deref(), Some("x"));
        tree.set_mark(a, "x", true).unwrap();
        assert_eq!(tree.get(a).unwrap().mark, None);
    }

    #[test]
    fn clear_all_marks_is_tree_wide() {
        let (mut tree, _output, ws) = make_single_workspace();
        let a = tree.create(Role::LeafWindow);
        tree.attach(a, ws, Position::Last).unwrap();
        let b = tree.create(Role::LeafWindow);
        tree.attach(b, ws, Position::Last).unwrap();
        tree.set_mark(a, "one", false).unwrap();
        tree.set_mark(b, "two", false).unwrap();
        tree.clear_all_marks();
        assert_eq!(tree.get(a).unwrap().mark, None);
        assert_eq!(tree.get(b).unwrap().mark, None);
    }

    #[test]
    fn resize_rejects_below_minimum_share() {
        let (mut tree, _output, ws) = make_single_workspace();
        let a = tree.create(Role::LeafWindow);
        tree.attach(a, ws, Position::Last).unwrap();
        let b = tree.create(Role::LeafWindow);
        tree.attach(b, ws, Position::Last).unwrap();
        // both start at 0.5; shrinking b by 0.46 would leave it at 0.04.
        assert!(!tree.resize(a, b, 0.46).unwrap());
        assert!((tree.get(a).unwrap().percent - 0.5).abs() < 1e-9);
    }

    #[test]
    fn find_resize_participants_skips_tabbed_ancestor() {
        let (mut tree, _output, ws) = make_single_workspace();
        let tabbed = tree.create(Role::SplitContainer);
        tree.attach(tabbed, ws, Position::Last).unwrap();
        tree.set_layout(tabbed, Layout::Tabbed).unwrap();
        let a = tree.create(Role::LeafWindow);
        tree.attach(a, tabbed, Position::Last).unwrap();
        let b = tree.create(Role::LeafWindow);
        tree.attach(b, ws, Position::Last).unwrap();

        // `a` sits under a Tabbed split with a single child; resizing
        // horizontally must ascend past the tabbed container to the
        // workspace's own SplitH-equivalent level.
        let participants = tree.find_resize_participants(a, Axis::Horizontal);
        assert_eq!(participants, Some((tabbed, b)));
    }

    #[test]
    fn move_to_workspace_reparents_a_whole_workspace_under_output_content() {
        let (mut tree, output, ws) = make_single_workspace();
        let other_output = tree.create(Role::Output);
        tree.attach(other_output, tree.root(), Position::Last).unwrap();
        let other_content = tree.create(Role::Content);
        tree.attach(other_content, other_output, Position::Last).unwrap();
        let other_ws = tree.create(Role::Workspace);
        tree.attach(other_ws, other_content, Position::Last).unwrap();

        tree.move_to_workspace(ws, other_ws, true).unwrap();
        assert_eq!(tree.get(ws).unwrap().parent, Some(other_content));
        assert_eq!(tree.output_of(ws), Some(other_output));
        let _ = output;
    }

    #[test]
    fn round_trip_check_invariants_on_persisted_tree() {
        let (tree, _output, ws) = make_single_workspace();
        let json = to_json(&tree).unwrap();
        let restored = from_json(&json).unwrap();
        restored.check_invariants().unwrap();
        let _ = ws;
    }

    #[test]
    fn wrap_in_split_preserves_parent_percentage_and_invariants() {
        let (mut tree, _output, ws) = make_single_workspace();
        let a = tree.create(Role::LeafWindow);
        tree.attach(a, ws, Position::Last).unwrap();
        let b = tree.create(Role::LeafWindow);
        tree.attach(b, ws, Position::Last).unwrap();

        let a_share = tree.get(a).unwrap().percent;
        let split = tree.wrap_in_split(a, Layout::SplitV).unwrap();
        assert_eq!(tree.get(split).unwrap().percent, a_share);
        assert_eq!(tree.get(a).unwrap().percent, 1.0);
        assert_eq!(tree.get(ws).unwrap().children, vec![split, b]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn move_within_parent_reorders_without_changing_focus() {
        let (mut tree, _output, ws) = make_single_workspace();
        let a = tree.create(Role::LeafWindow);
        tree.attach(a, ws, Position::Last).unwrap();
        let b = tree.create(Role::LeafWindow);
        tree.attach(b, ws, Position::Last).unwrap();
        let c = tree.create(Role::LeafWindow);
        tree.attach(c, ws, Position::Last).unwrap();
        tree.con_focus(a).unwrap();

        assert!(tree.move_within_parent(a, true).unwrap());
        assert_eq!(tree.get(ws).unwrap().children, vec![b, a, c]);
        assert_eq!(tree.focused, Some(a));
    }

    #[test]
    fn move_within_parent_is_noop_past_the_edge() {
        let (mut tree, _output, ws) = make_single_workspace();
        let a = tree.create(Role::LeafWindow);
        tree.attach(a, ws, Position::Last).unwrap();
        assert!(!tree.move_within_parent(a, true).unwrap());
    }

    #[test]
    fn float_then_unfloat_round_trips_back_to_tiling() {
        let (mut tree, _output, ws) = make_single_workspace();
        let a = tree.create(Role::LeafWindow);
        tree.attach(a, ws, Position::Last).unwrap();
        assert!(!tree.is_floating(a));

        tree.float_node(a, ws, core_geom::Rect::new(10, 10, 300, 200)).unwrap();
        assert!(tree.is_floating(a));
        tree.check_invariants().unwrap();

        tree.unfloat_node(a, ws).unwrap();
        assert!(!tree.is_floating(a));
        tree.check_invariants().unwrap();
    }
}
