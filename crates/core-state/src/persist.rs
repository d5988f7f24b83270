//! Persisted-state serialization (§6 "Persisted state"): the tree is
//! serialized as a JSON layout tree with node roles, layouts, percentages,
//! marks, window-id references, and geometry. On restart the tree is
//! rebuilt and window handles are re-attached by matching existing X
//! windows — re-attachment itself is the display backend's job, so
//! `restore` leaves each leaf's `window` field exactly as persisted and lets
//! the caller patch in freshly discovered handles afterward.

use crate::container::{BorderStyle, FullscreenMode, Layout, NodeId, Role, WindowProperties};
use crate::error::TreeError;
use crate::tree::{ContainerTree, Position};
use core_geom::Rect;
use core_terminal::WindowHandle;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedNode {
    pub role: Role,
    pub layout: Layout,
    pub rect: Rect,
    pub percent: f64,
    pub border: BorderStyle,
    pub border_width: u32,
    pub fullscreen: FullscreenMode,
    pub mark: Option<String>,
    pub title_format: Option<String>,
    pub window_id: Option<u32>,
    pub name: Option<String>,
    /// Carried even for a leaf whose window went away on restart, so a
    /// placeholder can be matched back to a real X window by class/title/
    /// role regex once one reappears (§9 "Tree rebuild on restart").
    #[serde(default)]
    pub properties: WindowProperties,
    #[serde(default)]
    pub gap_inner_override: Option<u32>,
    #[serde(default)]
    pub gap_outer_override: Option<u32>,
    pub children: Vec<PersistedNode>,
}

fn persist_node(tree: &ContainerTree, id: NodeId) -> PersistedNode {
    let c = tree.get(id).expect("valid node");
    PersistedNode {
        role: c.role,
        layout: c.layout,
        rect: c.rect,
        percent: c.percent,
        border: c.border,
        border_width: c.border_width,
        fullscreen: c.fullscreen,
        mark: c.mark.clone(),
        title_format: c.title_format.clone(),
        window_id: c.window.map(|w| w.0),
        name: c.name.clone(),
        properties: c.properties.clone(),
        gap_inner_override: c.gap_inner_override,
        gap_outer_override: c.gap_outer_override,
        children: c.children.iter().map(|ch| persist_node(tree, *ch)).collect(),
    }
}

/// Serialize the whole tree rooted at `root()` to a JSON string.
pub fn to_json(tree: &ContainerTree) -> serde_json::Result<String> {
    serde_json::to_string(&persist_node(tree, tree.root()))
}

fn restore_node(tree: &mut ContainerTree, parent: Option<NodeId>, node: &PersistedNode) -> Result<NodeId, TreeError> {
    let id = tree.create(node.role);
    {
        let c = tree.get_mut(id).expect("just created");
        c.layout = node.layout;
        c.rect = node.rect;
        c.percent = node.percent;
        c.border = node.border;
        c.border_width = node.border_width;
        c.fullscreen = node.fullscreen;
        c.mark = node.mark.clone();
        c.title_format = node.title_format.clone();
        c.window = node.window_id.map(WindowHandle);
        c.name = node.name.clone();
        c.properties = node.properties.clone();
        c.gap_inner_override = node.gap_inner_override;
        c.gap_outer_override = node.gap_outer_override;
    }
    if let Some(parent) = parent {
        tree.attach(id, parent, Position::Last)?;
        // `attach` rebalances every sibling's share, including this one's, to
        // `1/n` — overwrite it with the persisted share so a restored split
        // keeps its original percentages rather than flattening to uniform.
        tree.get_mut(id).expect("just attached").percent = node.percent;
    }
    restore_children(tree, id, &node.children)?;
    Ok(id)
}

/// Attach each of `children` under `parent` in turn, then restore their
/// persisted shares in one final pass. `attach` rescales *every* existing
/// sibling's share on each call, so fixing a child's percent up as it is
/// attached (as `restore_node` does for itself) would only survive until the
/// next sibling is attached and rescales it again; only the last-attached
/// child would come out right. Waiting until the whole group is in place
/// avoids that clobbering.
fn restore_children(tree: &mut ContainerTree, parent: NodeId, children: &[PersistedNode]) -> Result<(), TreeError> {
    let mut ids = Vec::with_capacity(children.len());
    for child in children {
        ids.push(restore_node(tree, Some(parent), child)?);
    }
    for (id, child) in ids.iter().zip(children) {
        tree.get_mut(*id).expect("just attached").percent = child.percent;
    }
    Ok(())
}

/// Rebuild a fresh tree from a persisted root node (normally itself role
/// `Root`, produced by a prior `to_json`/`persist_node` of the whole tree).
pub fn from_json(data: &str) -> anyhow::Result<ContainerTree> {
    let persisted: PersistedNode = serde_json::from_str(data)?;
    let mut tree = ContainerTree::new();
    // The synthetic root already exists; graft the persisted root's children
    // directly under it rather than creating a second root node.
    let root = tree.root();
    restore_children(&mut tree, root, &persisted.children)?;
    Ok(tree)
}

/// §4.3 `append_layout`: parse a single persisted node and graft it (with
/// its whole subtree) under an already-attached `parent`, reusing the same
/// restore logic `from_json` uses for the whole tree. A node partway through
/// a malformed subtree that has already been attached stays attached — the
/// graft is best-effort, not transactional.
pub fn graft_from_json(tree: &mut ContainerTree, parent: NodeId, data: &str) -> anyhow::Result<NodeId> {
    let persisted: PersistedNode = serde_json::from_str(data)?;
    Ok(restore_node(tree, Some(parent), &persisted)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Role;

    #[test]
    fn round_trips_a_small_tree() {
        let mut tree = ContainerTree::new();
        let output = tree.create(Role::Output);
        tree.attach(output, tree.root(), Position::Last).unwrap();
        let content = tree.create(Role::Content);
        tree.attach(content, output, Position::Last).unwrap();
        let ws = tree.create(Role::Workspace);
        tree.get_mut(ws).unwrap().name = Some("1".into());
        tree.attach(ws, content, Position::Last).unwrap();
        let leaf = tree.create(Role::LeafWindow);
        tree.get_mut(leaf).unwrap().window = Some(WindowHandle(42));
        tree.attach(leaf, ws, Position::Last).unwrap();

        let json = to_json(&tree).unwrap();
        let restored = from_json(&json).unwrap();

        let restored_ws = restored
            .iter()
            .find(|c| c.role == Role::Workspace)
            .expect("workspace restored");
        assert_eq!(restored_ws.name.as_deref(), Some("1"));
        let restored_leaf = restored
            .iter()
            .find(|c| c.role == Role::LeafWindow)
            .expect("leaf restored");
        assert_eq!(restored_leaf.window, Some(WindowHandle(42)));
    }

    #[test]
    fn round_trip_preserves_uneven_sibling_percentages() {
        let mut tree = ContainerTree::new();
        let output = tree.create(Role::Output);
        tree.attach(output, tree.root(), Position::Last).unwrap();
        let content = tree.create(Role::Content);
        tree.attach(content, output, Position::Last).unwrap();
        let ws = tree.create(Role::Workspace);
        tree.attach(ws, content, Position::Last).unwrap();

        let a = tree.create(Role::LeafWindow);
        tree.attach(a, ws, Position::Last).unwrap();
        let b = tree.create(Role::LeafWindow);
        tree.attach(b, ws, Position::Last).unwrap();
        let c = tree.create(Role::LeafWindow);
        tree.attach(c, ws, Position::Last).unwrap();
        // `attach` leaves three equal thirds; impose an uneven split that
        // attaching in restore order would flatten back to uniform if the
        // persisted shares weren't reapplied after the whole group lands.
        tree.get_mut(a).unwrap().percent = 0.2;
        tree.get_mut(b).unwrap().percent = 0.3;
        tree.get_mut(c).unwrap().percent = 0.5;

        let json = to_json(&tree).unwrap();
        let restored = from_json(&json).unwrap();
        let mut percents: Vec<f64> = restored
            .iter()
            .filter(|c| c.role == Role::LeafWindow)
            .map(|c| c.percent)
            .collect();
        percents.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(percents.len(), 3);
        assert!((percents[0] - 0.2).abs() < 1e-9);
        assert!((percents[1] - 0.3).abs() < 1e-9);
        assert!((percents[2] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn graft_from_json_attaches_subtree_under_an_existing_split() {
        let mut tree = ContainerTree::new();
        let output = tree.create(Role::Output);
        tree.attach(output, tree.root(), Position::Last).unwrap();
        let content = tree.create(Role::Content);
        tree.attach(content, output, Position::Last).unwrap();
        let ws = tree.create(Role::Workspace);
        tree.attach(ws, content, Position::Last).unwrap();
        let split = tree.create(Role::SplitContainer);
        tree.attach(split, ws, Position::Last).unwrap();

        let leaf = PersistedNode {
            role: Role::LeafWindow,
            layout: Layout::Default,
            rect: Rect::default(),
            percent: 1.0,
            border: BorderStyle::Normal,
            border_width: 2,
            fullscreen: FullscreenMode::None,
            mark: None,
            title_format: None,
            window_id: Some(7),
            name: None,
            properties: WindowProperties::default(),
            gap_inner_override: None,
            gap_outer_override: None,
            children: Vec::new(),
        };
        let json = serde_json::to_string(&leaf).unwrap();
        let grafted = graft_from_json(&mut tree, split, &json).unwrap();
        assert_eq!(tree.get(grafted).unwrap().parent, Some(split));
        assert_eq!(tree.get(grafted).unwrap().window, Some(WindowHandle(7)));
        tree.check_invariants().unwrap();
    }
}
