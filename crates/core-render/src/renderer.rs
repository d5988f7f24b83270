//! Tree → geometry renderer (§4.4). Walks each Output's content downward,
//! assigns geometry, then asks the [`DisplayBackend`] to configure and
//! restack every window in one pass.

use core_config::GapsConfig;
use core_state::{ContainerTree, FullscreenMode, Layout, NodeId, Role};
use core_terminal::{DisplayBackend, TextMetrics, WindowHandle};
use core_geom::Rect;

/// Extra pixels reserved per Stacked/Tabbed child for its header strip,
/// beyond the loaded font's height. Drawing the header glyphs themselves is
/// a window-decoration concern (§1 Non-goals); the renderer only reserves
/// the space.
const HEADER_PADDING: u32 = 6;

/// §4.4: compute geometry for every output and push it to the backend.
/// Clears `tree.needs_render` on completion (§4.3 "the renderer runs once
/// at the end of the batch").
pub fn render(tree: &mut ContainerTree, backend: &mut dyn DisplayBackend, metrics: &dyn TextMetrics, gaps: GapsConfig) -> anyhow::Result<()> {
    for output in tree.outputs() {
        let Some(content) = tree.content_of(output) else { continue };
        let Some(ws) = tree.get(content).and_then(|c| c.focus_order.first().copied()) else {
            continue;
        };
        let output_rect = tree.get(output).map(|c| c.rect).unwrap_or_default();

        if let Some(fs_node) = find_fullscreen_on(tree, output) {
            layout_tiling(tree, fs_node, output_rect, 0, metrics);
        } else {
            let outer = tree.get(ws).and_then(|c| c.gap_outer_override).unwrap_or(gaps.outer);
            let ws_rect = output_rect.inset(outer);
            layout_tiling(tree, ws, ws_rect, gaps.inner, metrics);
        }
    }
    apply_to_backend(tree, backend)?;
    tree.needs_render = false;
    Ok(())
}

/// The node whose fullscreen mode should override normal layout on
/// `output`, if any. A Global fullscreen elsewhere (a different output)
/// does not suppress this output's own layout (§4.1 `toggle_fullscreen`:
/// uniqueness is tree-wide for Global, per-output for Output).
fn find_fullscreen_on(tree: &ContainerTree, output: NodeId) -> Option<NodeId> {
    let mut global = None;
    let mut local = None;
    for c in tree.iter() {
        match c.fullscreen {
            FullscreenMode::Global => global = Some(c.id),
            FullscreenMode::Output if tree.output_of(c.id) == Some(output) => local = Some(c.id),
            _ => {}
        }
    }
    match global {
        Some(g) if tree.output_of(g) == Some(output) => Some(g),
        _ => local,
    }
}

/// Assign `rect` to `node` and recursively lay out its children per its
/// layout tag. Floating containers are skipped entirely — their children
/// keep whatever explicit rect they already hold (§4.4, GLOSSARY "Floating
/// container").
fn layout_tiling(tree: &mut ContainerTree, node: NodeId, rect: Rect, gap_inner: u32, metrics: &dyn TextMetrics) {
    if let Some(c) = tree.get_mut(node) {
        c.rect = rect;
    }
    let (layout, role, children) = {
        let c = tree.get(node).expect("node exists");
        (c.layout, c.role, c.children.clone())
    };
    if role == Role::FloatingContainer || children.is_empty() {
        return;
    }

    match layout {
        Layout::Stacked | Layout::Tabbed => {
            let header = metrics.font_height() + HEADER_PADDING;
            let reserved = if layout == Layout::Stacked { header * children.len() as u32 } else { header };
            let content_rect = Rect::new(rect.x, rect.y + reserved as i32, rect.w, rect.h.saturating_sub(reserved));
            for child in &children {
                layout_tiling(tree, *child, content_rect, gap_inner, metrics);
            }
        }
        _ => {
            let axis = tree.orientation_of(node);
            let horizontal = match layout {
                Layout::SplitH => true,
                Layout::SplitV => false,
                Layout::Default => axis == core_state::Axis::Horizontal,
                _ => true,
            };
            let total = if horizontal { rect.w } else { rect.h };
            let shares: Vec<f64> = children.iter().map(|c| tree.get(*c).map(|c| c.percent).unwrap_or(0.0)).collect();

            let mut sizes: Vec<u32> = shares.iter().map(|s| (s * total as f64).round() as u32).collect();
            if let (Some(last), true) = (sizes.last_mut(), !sizes.is_empty()) {
                let consumed: u32 = sizes[..sizes.len() - 1].iter().sum();
                *last = total.saturating_sub(consumed);
            }

            let mut offset = 0i32;
            for (child, size) in children.iter().zip(sizes.iter()) {
                let child_rect = if horizontal {
                    Rect::new(rect.x + offset, rect.y, *size, rect.h)
                } else {
                    Rect::new(rect.x, rect.y + offset, rect.w, *size)
                };
                let gapped = child_rect.inset(gap_inner / 2);
                layout_tiling(tree, *child, gapped, gap_inner, metrics);
                offset += *size as i32;
            }
        }
    }
}

fn is_within(tree: &ContainerTree, ancestor: NodeId, node: NodeId) -> bool {
    let mut cur = Some(node);
    while let Some(id) = cur {
        if id == ancestor {
            return true;
        }
        cur = tree.get(id).and_then(|c| c.parent);
    }
    false
}

/// Whether `leaf` should be mapped this pass: on the visible workspace of
/// its output (or the sole survivor of a fullscreen override), and not
/// hidden behind a Stacked/Tabbed sibling that currently has focus.
fn is_leaf_visible(tree: &ContainerTree, leaf: NodeId) -> bool {
    let Some(output) = tree.output_of(leaf) else { return false };
    if let Some(fs) = find_fullscreen_on(tree, output) {
        return is_within(tree, fs, leaf);
    }
    let Some(content) = tree.content_of(output) else { return false };
    let Some(visible_ws) = tree.get(content).and_then(|c| c.focus_order.first().copied()) else {
        return false;
    };
    if !is_within(tree, visible_ws, leaf) {
        return false;
    }
    let mut cur = leaf;
    while let Some(parent) = tree.get(cur).and_then(|c| c.parent) {
        let parent_c = tree.get(parent).expect("parent exists");
        if matches!(parent_c.layout, Layout::Stacked | Layout::Tabbed) && parent_c.focus_order.first() != Some(&cur) {
            return false;
        }
        cur = parent;
    }
    true
}

fn apply_to_backend(tree: &ContainerTree, backend: &mut dyn DisplayBackend) -> anyhow::Result<()> {
    let mut visible_order: Vec<WindowHandle> = Vec::new();
    for c in tree.iter() {
        if c.role != Role::LeafWindow {
            continue;
        }
        let Some(win) = c.window else { continue };
        if is_leaf_visible(tree, c.id) {
            backend.configure_window(win, c.rect)?;
            backend.map_window(win)?;
            visible_order.push(win);
        } else {
            backend.unmap_window(win)?;
        }
    }
    backend.restack(&visible_order)?;
    Ok(())
}
