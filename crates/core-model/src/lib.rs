//! The match engine (§4.2) and the tree/output convenience queries and
//! tie-break rules the command interpreter leans on (§4.1 "Tie-breaks").

use core_geom::Rect;
use core_state::{ContainerTree, NodeId, Role, WindowType};
use regex::Regex;

/// `urgent=Latest|Oldest` selector (§3 Match criteria).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrgentSelector {
    Latest,
    Oldest,
}

/// A parsed match-criteria block (§3, §4.2). Every field is independent;
/// a command's working set is the conjunction ("intersection filter") of
/// whichever fields are `Some`. [`Criteria::is_empty`] distinguishes the
/// "no `[...]` given" case, which the interpreter resolves to the focused
/// container rather than to an empty set.
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    pub class: Option<Regex>,
    pub instance: Option<Regex>,
    pub window_role: Option<Regex>,
    pub title: Option<Regex>,
    pub window_id: Option<u32>,
    pub container_id: Option<NodeId>,
    pub mark: Option<Regex>,
    pub workspace: Option<Regex>,
    pub window_type: Option<WindowType>,
    pub urgent: Option<UrgentSelector>,
}

impl Criteria {
    pub fn is_empty(&self) -> bool {
        self.class.is_none()
            && self.instance.is_none()
            && self.window_role.is_none()
            && self.title.is_none()
            && self.window_id.is_none()
            && self.container_id.is_none()
            && self.mark.is_none()
            && self.workspace.is_none()
            && self.window_type.is_none()
            && self.urgent.is_none()
    }
}

fn regex_matches(re: &Option<Regex>, value: Option<&str>) -> bool {
    match re {
        None => true,
        Some(re) => value.is_some_and(|v| re.is_match(v)),
    }
}

/// Name of the nearest ancestor Workspace, used for the `workspace` criteria
/// field (a leaf's own `name` is unset; its owning workspace carries one).
fn owning_workspace_name(tree: &ContainerTree, node: NodeId) -> Option<String> {
    let mut cur = Some(node);
    while let Some(id) = cur {
        let c = tree.get(id)?;
        if c.role == Role::Workspace {
            return c.name.clone();
        }
        cur = c.parent;
    }
    None
}

fn matches_criteria(tree: &ContainerTree, node: NodeId, criteria: &Criteria) -> bool {
    let Some(c) = tree.get(node) else { return false };
    if !regex_matches(&criteria.class, c.properties.class.as_deref()) {
        return false;
    }
    if !regex_matches(&criteria.instance, c.properties.instance.as_deref()) {
        return false;
    }
    if !regex_matches(&criteria.window_role, c.properties.window_role.as_deref()) {
        return false;
    }
    if !regex_matches(&criteria.title, c.properties.title.as_deref()) {
        return false;
    }
    if let Some(wid) = criteria.window_id {
        if c.window.map(|w| w.0) != Some(wid) {
            return false;
        }
    }
    if let Some(cid) = criteria.container_id {
        if c.id != cid {
            return false;
        }
    }
    if !regex_matches(&criteria.mark, c.mark.as_deref()) {
        return false;
    }
    if let Some(re) = &criteria.workspace {
        match owning_workspace_name(tree, node) {
            Some(name) if re.is_match(&name) => {}
            _ => return false,
        }
    }
    if let Some(wt) = criteria.window_type {
        if c.properties.window_type != Some(wt) {
            return false;
        }
    }
    true
}

/// §4.2: resolve `criteria` against the container registry. An empty
/// criteria value yields `{focused}` wrapped as a single-element sequence;
/// otherwise every container satisfying the conjunction of supplied fields
/// is returned, narrowed further by `urgent=Latest|Oldest` to a single
/// element if that selector was given.
pub fn match_containers(tree: &ContainerTree, criteria: &Criteria, focused: Option<NodeId>) -> Vec<NodeId> {
    if criteria.is_empty() {
        return focused.into_iter().collect();
    }
    let mut matched: Vec<NodeId> = tree.iter().map(|c| c.id).filter(|id| matches_criteria(tree, *id, criteria)).collect();

    if let Some(selector) = criteria.urgent {
        let urgent_only: Vec<NodeId> = matched.iter().copied().filter(|id| tree.get(*id).is_some_and(|c| c.urgency.urgent)).collect();
        let picked = match selector {
            UrgentSelector::Latest => urgent_only.iter().max_by_key(|id| tree.get(**id).map(|c| c.urgency.stamp).unwrap_or(0)),
            UrgentSelector::Oldest => urgent_only.iter().min_by_key(|id| tree.get(**id).map(|c| c.urgency.stamp).unwrap_or(0)),
        };
        matched = picked.into_iter().copied().collect();
    }
    matched
}

/// Direction used by `focus <dir>`, `move <dir>`, and `resize ... <dir>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

/// Geometric-center-distance tie-break for `focus <dir>` (§4.1): among
/// `candidates` (siblings at the same tree level that could receive focus),
/// pick the nearest one whose center lies in `dir` relative to `from`.
pub fn nearest_in_direction(from: Rect, dir: Direction, candidates: &[(NodeId, Rect)]) -> Option<NodeId> {
    candidates
        .iter()
        .filter(|(_, rect)| match dir {
            Direction::Left => rect.center().0 < from.center().0,
            Direction::Right => rect.center().0 > from.center().0,
            Direction::Up => rect.center().1 < from.center().1,
            Direction::Down => rect.center().1 > from.center().1,
        })
        .min_by(|(_, a), (_, b)| from.center_distance(a).total_cmp(&from.center_distance(b)))
        .map(|(id, _)| *id)
}

/// The workspace immediately after `current` in its output's creation-order
/// list, wrapping around (`workspace next`).
pub fn next_workspace(tree: &ContainerTree, current: NodeId) -> Option<NodeId> {
    let output = tree.output_of(current)?;
    let list = tree.workspaces_of(output);
    let idx = list.iter().position(|w| *w == current)?;
    list.get((idx + 1) % list.len()).copied()
}

/// `workspace prev`: symmetric to [`next_workspace`].
pub fn prev_workspace(tree: &ContainerTree, current: NodeId) -> Option<NodeId> {
    let output = tree.output_of(current)?;
    let list = tree.workspaces_of(output);
    let idx = list.iter().position(|w| *w == current)?;
    list.get((idx + list.len() - 1) % list.len()).copied()
}

/// Look up a workspace by its `name` field anywhere in the tree (workspaces
/// are created lazily by name, so this is the existence check commands use
/// before deciding whether to create one).
pub fn find_workspace_by_name(tree: &ContainerTree, name: &str) -> Option<NodeId> {
    tree.iter().find(|c| c.role == Role::Workspace && c.name.as_deref() == Some(name)).map(|c| c.id)
}

/// The currently visible workspace on `output` (focus-order head of its
/// content node), mirroring [`ContainerTree::is_visible_workspace`].
pub fn visible_workspace(tree: &ContainerTree, output: NodeId) -> Option<NodeId> {
    let content = tree.content_of(output)?;
    tree.get(content)?.focus_order.first().copied()
}

/// Workspace names may not begin with `__` — reserved for i3/sway-internal
/// pseudo-workspaces (scratchpad, etc.); every creating command rejects it
/// (§8 Boundaries).
pub fn is_reserved_workspace_name(name: &str) -> bool {
    name.starts_with("__")
}
