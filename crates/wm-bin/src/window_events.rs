//! §4.5 EventDispatcher: translates [`WindowEvent`]s from the display
//! backend into [`ContainerTree`] operations. The backend itself (atom
//! lookup, the X event pump) is out of scope (§1); this module is what a
//! real backend's event pump would call into once it has decoded one event.

use core_events::{PropertyKind, WindowEvent};
use core_state::{ContainerTree, FullscreenMode, NodeId, Position, Role};
use core_terminal::{DisplayBackend, WindowHandle};

fn find_leaf_by_window(tree: &ContainerTree, win: WindowHandle) -> Option<NodeId> {
    tree.iter().find(|c| c.role == Role::LeafWindow && c.window == Some(win)).map(|c| c.id)
}

/// Where a newly mapped window attaches: the focused leaf's parent split,
/// or the focused workspace directly if nothing is focused yet (§3 LeafWindow
/// lifecycle: "re-parented under the focused split container").
fn attach_target(tree: &ContainerTree) -> Option<NodeId> {
    let focused = tree.focused?;
    let c = tree.get(focused)?;
    match c.role {
        Role::LeafWindow => c.parent,
        Role::Workspace | Role::SplitContainer => Some(focused),
        _ => None,
    }
}

/// Handle one [`WindowEvent`], mutating `tree` and issuing backend calls as
/// needed. Returns whether the event requires a render pass (on top of
/// whatever `tree.needs_render` mutations already set).
pub fn handle_window_event(
    tree: &mut ContainerTree,
    backend: &mut dyn DisplayBackend,
    event: &WindowEvent,
) -> anyhow::Result<()> {
    match event {
        WindowEvent::Map(win) => {
            let Some(parent) = attach_target(tree).or_else(|| {
                tree.outputs().first().and_then(|o| tree.content_of(*o)).and_then(|content| {
                    tree.get(content).and_then(|c| c.focus_order.first().copied())
                })
            }) else {
                tracing::warn!(target: "events.window", win = win.0, "map_with_no_attach_point");
                return Ok(());
            };
            let leaf = tree.create(Role::LeafWindow);
            tree.get_mut(leaf).expect("just created").window = Some(*win);
            tree.attach(leaf, parent, Position::Last)?;
            tree.con_focus(leaf)?;
            tracing::info!(target: "events.window", win = win.0, parent = ?parent, "window_mapped");
        }
        WindowEvent::Unmap(win) | WindowEvent::Destroy(win) => {
            if let Some(leaf) = find_leaf_by_window(tree, *win) {
                tree.detach(leaf)?;
                tracing::info!(target: "events.window", win = win.0, "window_removed");
            }
        }
        WindowEvent::ConfigureRequest { win, w, h } => {
            // Tiling geometry is authoritative; honor the request only for
            // windows we do not yet track (pre-map), otherwise the next
            // render pass overrides it anyway.
            if find_leaf_by_window(tree, *win).is_none() {
                backend.configure_window(*win, core_geom::Rect::new(0, 0, *w, *h))?;
            }
        }
        WindowEvent::PropertyChange { win, property } => {
            if let Some(leaf) = find_leaf_by_window(tree, *win) {
                tracing::debug!(target: "events.window", win = win.0, ?property, "property_cache_stale");
                if matches!(property, PropertyKind::Urgency) {
                    tree.mark_urgent(leaf, true)?;
                }
            }
        }
        WindowEvent::FocusChange(win) => {
            if let Some(leaf) = find_leaf_by_window(tree, *win) {
                tree.con_focus(leaf)?;
            }
        }
        WindowEvent::ButtonPress { .. } => {
            // Mouse-button-to-command dispatch is a keymap (`core-keymap`)
            // concern; the event dispatcher only forwards it there.
        }
        WindowEvent::VisibilityChange { .. } => {}
        WindowEvent::ModifierChange { .. } => {
            // Bar auto-reveal: handled in the `bar` binary's own event loop,
            // which owns `BarVisibility` (§4.6).
        }
        WindowEvent::OutputChange { name, present } => {
            if *present {
                if tree.outputs().iter().any(|o| tree.get(*o).and_then(|c| c.name.as_deref()) == Some(name.as_str())) {
                    return Ok(());
                }
                let output = tree.create(Role::Output);
                tree.get_mut(output).expect("just created").name = Some(name.clone());
                tree.attach(output, tree.root(), Position::Last)?;
                let content = tree.create(Role::Content);
                tree.attach(content, output, Position::Last)?;
                tracing::info!(target: "events.window", output = name.as_str(), "output_added");
            } else if let Some(output) =
                tree.outputs().into_iter().find(|o| tree.get(*o).and_then(|c| c.name.as_deref()) == Some(name.as_str()))
            {
                tree.detach(output)?;
                tracing::warn!(target: "events.window", output = name.as_str(), "output_removed");
            }
        }
    }
    Ok(())
}

/// Whether `node`'s fullscreen ancestry permits ordinary focus traffic to
/// pass through it, mirroring `ContainerTree::con_focus`'s own refusal so
/// callers can short-circuit before issuing backend calls for a refusal
/// that will be silent anyway (§8 scenario 5).
pub fn blocked_by_fullscreen(tree: &ContainerTree, node: NodeId) -> bool {
    tree.iter().any(|c| {
        c.fullscreen != FullscreenMode::None && {
            let mut cur = Some(node);
            let mut within = false;
            while let Some(id) = cur {
                if id == c.id {
                    within = true;
                    break;
                }
                cur = tree.get(id).and_then(|c| c.parent);
            }
            !within
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_terminal::LoggingBackend;

    fn single_workspace() -> (ContainerTree, NodeId) {
        let mut tree = ContainerTree::new();
        let output = tree.create(Role::Output);
        tree.attach(output, tree.root(), Position::Last).unwrap();
        let content = tree.create(Role::Content);
        tree.attach(content, output, Position::Last).unwrap();
        let ws = tree.create(Role::Workspace);
        tree.get_mut(ws).unwrap().name = Some("1".into());
        tree.attach(ws, content, Position::Last).unwrap();
        tree.con_focus(ws).unwrap();
        (tree, ws)
    }

    #[test]
    fn map_creates_a_leaf_under_the_focused_workspace() {
        let (mut tree, ws) = single_workspace();
        let mut backend = LoggingBackend::default();
        handle_window_event(&mut tree, &mut backend, &WindowEvent::Map(WindowHandle(7))).unwrap();
        let leaf = find_leaf_by_window(&tree, WindowHandle(7)).unwrap();
        assert_eq!(tree.get(leaf).unwrap().parent, Some(ws));
        assert_eq!(tree.focused, Some(leaf));
    }

    #[test]
    fn unmap_detaches_the_matching_leaf() {
        let (mut tree, _ws) = single_workspace();
        let mut backend = LoggingBackend::default();
        handle_window_event(&mut tree, &mut backend, &WindowEvent::Map(WindowHandle(7))).unwrap();
        handle_window_event(&mut tree, &mut backend, &WindowEvent::Unmap(WindowHandle(7))).unwrap();
        assert!(find_leaf_by_window(&tree, WindowHandle(7)).is_none());
    }

    #[test]
    fn property_change_urgency_marks_the_leaf_urgent() {
        let (mut tree, _ws) = single_workspace();
        let mut backend = LoggingBackend::default();
        handle_window_event(&mut tree, &mut backend, &WindowEvent::Map(WindowHandle(7))).unwrap();
        let leaf = find_leaf_by_window(&tree, WindowHandle(7)).unwrap();
        handle_window_event(
            &mut tree,
            &mut backend,
            &WindowEvent::PropertyChange { win: WindowHandle(7), property: PropertyKind::Urgency },
        )
        .unwrap();
        assert!(tree.get(leaf).unwrap().urgency.urgent);
    }

    #[test]
    fn output_change_present_adds_an_output_with_content() {
        let (mut tree, _ws) = single_workspace();
        handle_window_event(
            &mut tree,
            &mut LoggingBackend::default(),
            &WindowEvent::OutputChange { name: "HDMI-1".into(), present: true },
        )
        .unwrap();
        assert_eq!(tree.outputs().len(), 2);
    }
}
