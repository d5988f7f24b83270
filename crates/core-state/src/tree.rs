//! The container tree arena and its operations (§4.1).

use crate::container::{Container, FullscreenMode, Layout, NodeId, Role, ROOT};
use crate::error::TreeError;
use core_geom::{clamp_resize, rebalance_detach, rebalance_insert, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    First,
    Last,
    After(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    fn matches(self, layout: Layout, orientation: Axis) -> bool {
        match layout {
            Layout::SplitH => self == Axis::Horizontal,
            Layout::SplitV => self == Axis::Vertical,
            Layout::Default => self == orientation,
            _ => false,
        }
    }
}

/// Slab arena holding every container plus the global focus/back-and-forth
/// state (§3 "Global registry"). Freed slots are tracked so `NodeId`s stay
/// small and dense; a freed id is never handed out again while any live
/// reference to the old generation could exist, which in practice means we
/// only recycle a slot once its prior occupant has actually been detached
/// and dropped within the same mutation.
pub struct ContainerTree {
    slots: Vec<Option<Container>>,
    free: Vec<u32>,
    /// Orientation used by `Layout::Default` containers; toggled by
    /// `set_layout(node, Default)` (§4.1).
    orientation: std::collections::HashMap<NodeId, Axis>,
    pub focused: Option<NodeId>,
    pub back_and_forth: Option<String>,
    /// Set after any command mutates geometry or focus; cleared by the
    /// renderer once it completes a pass (§4.3 `needs_tree_render`).
    pub needs_render: bool,
    urgency_clock: u64,
}

impl Default for ContainerTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerTree {
    pub fn new() -> Self {
        let root = Container::new(ROOT, Role::Root);
        Self {
            slots: vec![Some(root)],
            free: Vec::new(),
            orientation: std::collections::HashMap::new(),
            focused: None,
            back_and_forth: None,
            needs_render: false,
            urgency_clock: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn get(&self, id: NodeId) -> Option<&Container> {
        self.slots.get(id.0 as usize).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Container> {
        self.slots.get_mut(id.0 as usize).and_then(|s| s.as_mut())
    }

    fn require(&self, id: NodeId) -> Result<&Container, TreeError> {
        self.get(id).ok_or(TreeError::NotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Container> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    /// Create a detached node of `role`, not yet attached to any parent.
    pub fn create(&mut self, role: Role) -> NodeId {
        let id = if let Some(idx) = self.free.pop() {
            NodeId(idx)
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(None);
            NodeId(idx)
        };
        self.slots[id.0 as usize] = Some(Container::new(id, role));
        id
    }

    fn free_slot(&mut self, id: NodeId) {
        self.slots[id.0 as usize] = None;
        self.orientation.remove(&id);
        self.free.push(id.0);
    }

    /// §4.1 `attach`.
    pub fn attach(&mut self, node: NodeId, parent: NodeId, position: Position) -> Result<(), TreeError> {
        if self.require(node)?.parent.is_some() {
            return Err(TreeError::AlreadyAttached(node));
        }
        let node_role = self.require(node)?.role;
        let parent_c = self.require(parent)?;
        if !parent_c.accepts_child(node_role) {
            return Err(TreeError::RoleMismatch(node));
        }

        let existing: Vec<NodeId> = parent_c.children.clone();
        let existing_shares: Vec<f64> = existing.iter().filter_map(|c| self.get(*c).map(|c| c.percent)).collect();
        let (scaled, new_share) = rebalance_insert(&existing_shares);
        let shares_by_id: std::collections::HashMap<NodeId, f64> =
            existing.iter().copied().zip(scaled.iter().copied()).collect();

        let parent_mut = self.get_mut(parent).expect("checked above");
        let idx = match position {
            Position::First => 0,
            Position::Last => parent_mut.children.len(),
            Position::After(sib) => parent_mut
                .children
                .iter()
                .position(|c| *c == sib)
                .map(|i| i + 1)
                .unwrap_or(parent_mut.children.len()),
        };
        parent_mut.children.insert(idx, node);
        parent_mut.focus_order.insert(0, node);

        for (id, share) in shares_by_id {
            if let Some(c) = self.get_mut(id) {
                c.percent = share;
            }
        }
        let node_mut = self.get_mut(node).expect("exists");
        node_mut.parent = Some(parent);
        node_mut.percent = new_share;
        self.needs_render = true;
        Ok(())
    }

    /// §4.1 `detach`.
    pub fn detach(&mut self, node: NodeId) -> Result<(), TreeError> {
        if node == ROOT {
            return Err(TreeError::RootImmutable);
        }
        let parent = self.require(node)?.parent.ok_or(TreeError::RootImmutable)?;
        let removed_share = self.require(node)?.percent;

        let parent_mut = self.get_mut(parent).ok_or(TreeError::NotFound(parent))?;
        parent_mut.children.retain(|c| *c != node);
        parent_mut.focus_order.retain(|c| *c != node);
        let remaining: Vec<NodeId> = parent_mut.children.clone();

        let shares: Vec<f64> = remaining.iter().filter_map(|c| self.get(*c).map(|c| c.percent)).collect();
        let rebalanced = rebalance_detach(&shares, removed_share);
        for (child, share) in remaining.iter().zip(rebalanced.iter()) {
            if let Some(c) = self.get_mut(*child) {
                c.percent = *share;
            }
        }

        if let Some(c) = self.get_mut(node) {
            c.parent = None;
        }
        self.needs_render = true;

        let parent_role = self.require(parent)?.role;
        let parent_empty = self.require(parent)?.children.is_empty();
        if parent_empty {
            match parent_role {
                Role::SplitContainer | Role::FloatingContainer => {
                    self.detach(parent)?;
                    self.free_slot(parent);
                }
                Role::Workspace if !self.is_visible_workspace(parent) => {
                    self.detach(parent)?;
                    self.free_slot(parent);
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// A workspace is "visible" if it sits at the head of its output's
    /// content focus order (§3 Workspace lifecycle: "destroyed when it has
    /// no children and is not visible").
    pub fn is_visible_workspace(&self, ws: NodeId) -> bool {
        let Some(c) = self.get(ws) else { return false };
        let Some(content) = c.parent else { return false };
        let Some(content_c) = self.get(content) else { return false };
        content_c.focus_order.first() == Some(&ws)
    }

    /// §4.1 `move_to_workspace`.
    pub fn move_to_workspace(&mut self, node: NodeId, ws: NodeId, respect_focus: bool) -> Result<(), TreeError> {
        let node_role = self.require(node)?.role;
        let old_output = self.output_of(node);
        self.detach(node)?;

        let target = if node_role == Role::Workspace {
            self.require(ws)?.parent.ok_or(TreeError::RootImmutable)?
        } else {
            ws
        };
        let position = if respect_focus {
            Position::First
        } else {
            Position::Last
        };
        self.attach(node, target, position)?;

        let new_output = self.output_of(node);
        if old_output != new_output {
            self.needs_render = true;
        }
        Ok(())
    }

    /// The packing axis a `Layout::Default` container currently resolves
    /// to (§4.1 `set_layout`); `SplitH`/`SplitV`/`Stacked`/`Tabbed` nodes
    /// ignore this and are read directly off their `layout` tag by callers.
    pub fn orientation_of(&self, node: NodeId) -> Axis {
        self.orientation.get(&node).copied().unwrap_or(Axis::Horizontal)
    }

    /// The axis `node`'s own children are packed along, resolving `Default`
    /// against the toggled orientation (§4.1 `set_layout`). Used by `move
    /// <dir>` to decide whether a direction lines up with the current
    /// packing axis at all.
    pub fn packing_axis(&self, node: NodeId) -> Axis {
        match self.get(node).map(|c| c.layout) {
            Some(Layout::SplitH) => Axis::Horizontal,
            Some(Layout::SplitV) => Axis::Vertical,
            _ => self.orientation_of(node),
        }
    }

    /// §4.3 `move <dir>` (tiling case): swap `node` with its immediate
    /// sibling one step toward `forward` (true = later in child order).
    /// Focus order is untouched, matching scenario 2 (`move right` reorders
    /// siblings without moving focus).
    pub fn move_within_parent(&mut self, node: NodeId, forward: bool) -> Result<bool, TreeError> {
        let parent = self.require(node)?.parent.ok_or(TreeError::RootImmutable)?;
        let parent_mut = self.get_mut(parent).ok_or(TreeError::NotFound(parent))?;
        let idx = parent_mut.children.iter().position(|c| *c == node).ok_or(TreeError::NotFound(node))?;
        let swap_idx = if forward { idx + 1 } else { idx.wrapping_sub(1) };
        if swap_idx >= parent_mut.children.len() {
            return Ok(false);
        }
        parent_mut.children.swap(idx, swap_idx);
        self.needs_render = true;
        Ok(true)
    }

    /// §4.3 `split v|h`: wrap `node` in a freshly created split container of
    /// `layout`, taking `node`'s former slot (and percentage) in its
    /// parent's child list. `node` becomes the new container's sole child at
    /// 100% share, preserving both sum-to-one invariants.
    pub fn wrap_in_split(&mut self, node: NodeId, layout: Layout) -> Result<NodeId, TreeError> {
        let parent = self.require(node)?.parent.ok_or(TreeError::RootImmutable)?;
        let percent = self.require(node)?.percent;
        let new_split = self.create(Role::SplitContainer);
        {
            let split_c = self.get_mut(new_split).expect("just created");
            split_c.layout = layout;
            split_c.parent = Some(parent);
            split_c.percent = percent;
            split_c.children.push(node);
            split_c.focus_order.push(node);
        }
        if layout == Layout::SplitH {
            self.orientation.insert(new_split, Axis::Horizontal);
        } else if layout == Layout::SplitV {
            self.orientation.insert(new_split, Axis::Vertical);
        }
        let parent_mut = self.get_mut(parent).ok_or(TreeError::NotFound(parent))?;
        let idx = parent_mut.children.iter().position(|c| *c == node).ok_or(TreeError::NotFound(node))?;
        parent_mut.children[idx] = new_split;
        parent_mut.focus_order.retain(|c| *c != node);
        parent_mut.focus_order.insert(0, new_split);

        let node_mut = self.get_mut(node).expect("exists");
        node_mut.parent = Some(new_split);
        node_mut.percent = 1.0;
        self.needs_render = true;
        Ok(new_split)
    }

    /// §4.3 `floating enable`: detach `node` from its tiling parent and
    /// attach it under a fresh `FloatingContainer` child of `ws` at `rect`.
    pub fn float_node(&mut self, node: NodeId, ws: NodeId, rect: Rect) -> Result<(), TreeError> {
        self.detach(node)?;
        let floater = self.create(Role::FloatingContainer);
        self.get_mut(floater).expect("just created").rect = rect;
        self.attach(floater, ws, Position::Last)?;
        self.attach(node, floater, Position::Last)
    }

    /// §4.3 `floating disable`: detach `node` from its `FloatingContainer`
    /// (which self-collapses once empty, per `detach`) and re-attach it as a
    /// tiled child of `ws`.
    pub fn unfloat_node(&mut self, node: NodeId, ws: NodeId) -> Result<(), TreeError> {
        self.detach(node)?;
        self.attach(node, ws, Position::Last)
    }

    pub fn is_floating(&self, node: NodeId) -> bool {
        self.get(node)
            .and_then(|c| c.parent)
            .and_then(|p| self.get(p))
            .map(|p| p.role == Role::FloatingContainer)
            .unwrap_or(false)
    }

    /// Outputs in attachment order (used by `core-model` for workspace
    /// selector tie-breaks).
    pub fn outputs(&self) -> Vec<NodeId> {
        self.get(ROOT).map(|r| r.children.clone()).unwrap_or_default()
    }

    /// A given output's content node (the unique Workspace-holding child).
    pub fn content_of(&self, output: NodeId) -> Option<NodeId> {
        self.get(output)?.children.iter().copied().find(|c| self.get(*c).map(|c| c.role) == Some(Role::Content))
    }

    /// Workspaces belonging to `output`, in creation order (§4.1 "next/prev
    /// workspace selection walks the current output's workspace list in
    /// creation order").
    pub fn workspaces_of(&self, output: NodeId) -> Vec<NodeId> {
        let Some(content) = self.content_of(output) else {
            return Vec::new();
        };
        self.get(content).map(|c| c.children.clone()).unwrap_or_default()
    }

    pub fn output_of(&self, node: NodeId) -> Option<NodeId> {
        let mut cur = Some(node);
        while let Some(id) = cur {
            let c = self.get(id)?;
            if c.role == Role::Output {
                return Some(id);
            }
            cur = c.parent;
        }
        None
    }

    /// §4.1 `set_layout`.
    pub fn set_layout(&mut self, node: NodeId, layout: Layout) -> Result<(), TreeError> {
        let c = self.get_mut(node).ok_or(TreeError::NotFound(node))?;
        if layout == Layout::Default {
            let prior = self.orientation.get(&node).copied().unwrap_or(Axis::Horizontal);
            let flipped = match prior {
                Axis::Horizontal => Axis::Vertical,
                Axis::Vertical => Axis::Horizontal,
            };
            self.orientation.insert(node, flipped);
            self.get_mut(node).unwrap().layout = Layout::Default;
        } else {
            if layout == Layout::SplitH {
                self.orientation.insert(node, Axis::Horizontal);
            } else if layout == Layout::SplitV {
                self.orientation.insert(node, Axis::Vertical);
            }
            self.get_mut(node).unwrap().layout = layout;
        }
        self.needs_render = true;
        Ok(())
    }

    /// §4.1 `toggle_fullscreen`.
    pub fn toggle_fullscreen(&mut self, node: NodeId, mode: FullscreenMode) -> Result<(), TreeError> {
        self.require(node)?;
        match mode {
            FullscreenMode::Global => {
                let others: Vec<NodeId> = self
                    .iter()
                    .filter(|c| c.id != node && c.fullscreen == FullscreenMode::Global)
                    .map(|c| c.id)
                    .collect();
                for o in others {
                    self.get_mut(o).unwrap().fullscreen = FullscreenMode::None;
                }
            }
            FullscreenMode::Output => {
                let output = self.output_of(node);
                let others: Vec<NodeId> = self
                    .iter()
                    .filter(|c| c.id != node && c.fullscreen == FullscreenMode::Output && self.output_of(c.id) == output)
                    .map(|c| c.id)
                    .collect();
                for o in others {
                    self.get_mut(o).unwrap().fullscreen = FullscreenMode::None;
                }
            }
            FullscreenMode::None => {}
        }
        self.get_mut(node).unwrap().fullscreen = mode;
        self.needs_render = true;
        Ok(())
    }

    /// Every node whose fullscreen containment a candidate must respect to
    /// be focusable (§4.1 `con_focus`: "focusable only if every fullscreen
    /// ancestor contains it").
    fn is_descendant_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.get(id).and_then(|c| c.parent);
        }
        false
    }

    fn is_focusable(&self, node: NodeId) -> bool {
        for c in self.iter() {
            match c.fullscreen {
                FullscreenMode::Global => {
                    if !self.is_descendant_or_self(c.id, node) {
                        return false;
                    }
                }
                FullscreenMode::Output => {
                    if self.output_of(c.id) == self.output_of(node) && !self.is_descendant_or_self(c.id, node) {
                        return false;
                    }
                }
                FullscreenMode::None => {}
            }
        }
        true
    }

    /// §4.1 `con_focus`. Returns `false` if refused by a fullscreen boundary.
    pub fn con_focus(&mut self, node: NodeId) -> Result<bool, TreeError> {
        self.require(node)?;
        if !self.is_focusable(node) {
            return Ok(false);
        }
        let mut child = node;
        while let Some(parent) = self.get(child).and_then(|c| c.parent) {
            let parent_mut = self.get_mut(parent).ok_or(TreeError::NotFound(parent))?;
            parent_mut.focus_order.retain(|c| *c != child);
            parent_mut.focus_order.insert(0, child);
            child = parent;
        }
        self.focused = Some(node);
        self.needs_render = true;
        Ok(true)
    }

    /// §4.1 `set_mark`. Stealing, not rejecting: the command-level
    /// multi-match rejection lives in the interpreter, not here.
    pub fn set_mark(&mut self, node: NodeId, mark: &str, toggle: bool) -> Result<(), TreeError> {
        self.require(node)?;
        if toggle && self.get(node).and_then(|c| c.mark.as_deref()) == Some(mark) {
            self.get_mut(node).unwrap().mark = None;
            return Ok(());
        }
        let holders: Vec<NodeId> = self
            .iter()
            .filter(|c| c.id != node && c.mark.as_deref() == Some(mark))
            .map(|c| c.id)
            .collect();
        for h in holders {
            self.get_mut(h).unwrap().mark = None;
        }
        self.get_mut(node).unwrap().mark = Some(mark.to_string());
        Ok(())
    }

    /// Tree-wide `unmark` with no argument: clears every mark (supplemental,
    /// grounded in `cmd_unmark`'s bare-argument branch).
    pub fn clear_all_marks(&mut self) {
        for slot in self.slots.iter_mut().flatten() {
            slot.mark = None;
        }
    }

    pub fn clear_mark(&mut self, mark: &str) {
        for slot in self.slots.iter_mut().flatten() {
            if slot.mark.as_deref() == Some(mark) {
                slot.mark = None;
            }
        }
    }

    pub fn find_by_mark(&self, mark: &str) -> Option<NodeId> {
        self.iter().find(|c| c.mark.as_deref() == Some(mark)).map(|c| c.id)
    }

    /// §4.1 `resize`. Returns `false` without mutation if either side would
    /// fall to or below the minimum share.
    pub fn resize(&mut self, first: NodeId, second: NodeId, delta_percent: f64) -> Result<bool, TreeError> {
        let a = self.require(first)?.percent;
        let b = self.require(second)?.percent;
        match clamp_resize(a, b, delta_percent) {
            Some((na, nb)) => {
                self.get_mut(first).unwrap().percent = na;
                self.get_mut(second).unwrap().percent = nb;
                self.needs_render = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// §4.1 `find_resize_participants`.
    pub fn find_resize_participants(&self, node: NodeId, axis: Axis) -> Option<(NodeId, NodeId)> {
        let mut cur = node;
        loop {
            let parent = self.get(cur)?.parent?;
            let parent_c = self.get(parent)?;
            let orientation = self.orientation.get(&parent).copied().unwrap_or(Axis::Horizontal);
            if matches!(parent_c.layout, Layout::Stacked | Layout::Tabbed) {
                cur = parent;
                continue;
            }
            if parent_c.children.len() >= 2 && axis.matches(parent_c.layout, orientation) {
                let idx = parent_c.children.iter().position(|c| *c == cur)?;
                return if idx == 0 {
                    Some((parent_c.children[0], parent_c.children[1]))
                } else {
                    Some((parent_c.children[idx - 1], parent_c.children[idx]))
                };
            }
            cur = parent;
        }
    }

    pub fn mark_urgent(&mut self, node: NodeId, urgent: bool) -> Result<(), TreeError> {
        self.urgency_clock += 1;
        let stamp = self.urgency_clock;
        let c = self.get_mut(node).ok_or(TreeError::NotFound(node))?;
        c.urgency.urgent = urgent;
        if urgent {
            c.urgency.stamp = stamp;
        }
        Ok(())
    }

    /// Best-effort check of §3's invariants 1-3, 5-7 (invariant 4, focus
    /// reachability, follows by construction of `con_focus` and is checked
    /// separately in tests).
    pub fn check_invariants(&self) -> Result<(), TreeError> {
        for c in self.iter() {
            if c.id != ROOT && c.parent.is_none() {
                return Err(TreeError::InvariantViolation(format!("{:?} has no parent", c.id)));
            }
            if c.is_leaf() && !c.children.is_empty() {
                return Err(TreeError::InvariantViolation(format!("leaf {:?} has children", c.id)));
            }
            if c.role == Role::LeafWindow && c.window.is_none() {
                return Err(TreeError::InvariantViolation(format!("leaf {:?} has no window handle", c.id)));
            }
            if let Some(parent) = c.parent {
                let parent_c = self.get(parent).ok_or(TreeError::NotFound(parent))?;
                let count = parent_c.children.iter().filter(|ch| **ch == c.id).count();
                if count != 1 {
                    return Err(TreeError::InvariantViolation(format!("{:?} appears {count} times in parent", c.id)));
                }
            }
            if c.children.len() >= 2 {
                let sum: f64 = c.children.iter().filter_map(|ch| self.get(*ch)).map(|ch| ch.percent).sum();
                if (sum - 1.0).abs() > 1e-6 {
                    return Err(TreeError::InvariantViolation(format!(
                        "{:?} children percentages sum to {sum}",
                        c.id
                    )));
                }
            }
        }
        let global_fullscreen = self.iter().filter(|c| c.fullscreen == FullscreenMode::Global).count();
        if global_fullscreen > 1 {
            return Err(TreeError::InvariantViolation("more than one global-fullscreen node".into()));
        }
        let mut marks = std::collections::HashSet::new();
        for c in self.iter() {
            if let Some(m) = &c.mark {
                if !marks.insert(m.clone()) {
                    return Err(TreeError::InvariantViolation(format!("duplicate mark {m:?}")));
                }
            }
        }
        Ok(())
    }
}
