//! The bar core (§4.6): per-output state, the status-line layout algorithm,
//! the tray client list, the drawing-order plan, and the visibility state
//! machine.

pub mod statusline;
pub mod tray;
pub mod visibility;

pub use statusline::{layout_statusline, measure_block};
pub use tray::{TrayClient, TrayList};
pub use visibility::BarVisibility;

use core_config::{BarColors, ColorSet};
use core_geom::Rect;
use core_plugin::StatusBlock;
use core_terminal::{DisplayBackend, PixmapHandle, WindowHandle};

/// Workspace button horizontal offset from the output's leading edge and
/// the gap between consecutive buttons (§4.6 drawing order).
pub const WORKSPACE_BUTTON_OFFSET: i32 = 4;
pub const WORKSPACE_BUTTON_SPACING: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceButtonState {
    Inactive,
    Active,
    Focused,
    Urgent,
}

impl WorkspaceButtonState {
    pub fn colors(self, palette: &BarColors) -> ColorSet {
        match self {
            Self::Inactive => palette.inactive,
            Self::Active => palette.active,
            Self::Focused => palette.focus,
            Self::Urgent => palette.urgent,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkspaceButton {
    pub name: String,
    pub state: WorkspaceButtonState,
}

/// Per-output bar surface (§4.6 "Per-output state").
pub struct BarOutput {
    pub window: WindowHandle,
    pub pixmap: PixmapHandle,
    pub pixmap_width: u32,
    pub rect: Rect,
    pub tray: TrayList,
    pub visible: bool,
}

impl BarOutput {
    pub fn new(window: WindowHandle, pixmap: PixmapHandle, rect: Rect) -> Self {
        Self {
            window,
            pixmap,
            pixmap_width: 0,
            rect,
            tray: TrayList::new(),
            visible: true,
        }
    }

    /// Step 4 of the statusline algorithm: grow the backing pixmap
    /// monotonically if the computed total exceeds its current width.
    pub fn ensure_pixmap_width(&mut self, backend: &mut dyn DisplayBackend, needed: u32, height: u32) -> anyhow::Result<()> {
        if needed > self.pixmap_width {
            backend.grow_pixmap(self.pixmap, needed, height)?;
            self.pixmap_width = needed;
        }
        Ok(())
    }
}

/// Global bar state (§4.6 "Global state"): one shared status-block
/// sequence, the binding-mode name, and the modifier-held flag driving
/// [`BarVisibility`].
pub struct BarCore {
    pub outputs: std::collections::BTreeMap<String, BarOutput>,
    pub mode_name: String,
    pub modifier_held: bool,
    pub status_blocks: Vec<StatusBlock>,
    pub visibility: BarVisibility,
}

impl BarCore {
    pub fn new(hide_on_modifier: core_config::HideOnModifier) -> Self {
        Self {
            outputs: std::collections::BTreeMap::new(),
            mode_name: core_keymap::DEFAULT_MODE.to_string(),
            modifier_held: false,
            status_blocks: Vec::new(),
            visibility: BarVisibility::new(hide_on_modifier),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkspaceButtonPlan {
    pub name: String,
    pub state: WorkspaceButtonState,
    pub x: i32,
    pub width: u32,
}

#[derive(Debug, Clone)]
pub struct ModeIndicatorPlan {
    pub x: i32,
    pub width: u32,
    pub text: String,
}

/// The fully-resolved per-output drawing plan (§4.6 "Drawing order per
/// output"). Actual glyph/pixel drawing is a `TextMetrics`/backend concern
/// out of scope here; this is the geometry the caller hands to it.
#[derive(Debug, Clone)]
pub struct BarDrawPlan {
    pub workspace_buttons: Vec<WorkspaceButtonPlan>,
    pub mode_indicator: Option<ModeIndicatorPlan>,
    pub statusline_x: i32,
    pub statusline_width: u32,
    pub tray_icons: Vec<(WindowHandle, i32)>,
}

/// Lay out workspace buttons left-to-right starting `WORKSPACE_BUTTON_OFFSET`
/// from the leading edge, `WORKSPACE_BUTTON_SPACING` apart.
fn layout_workspace_buttons(workspaces: &[WorkspaceButton], widths: &[u32]) -> Vec<WorkspaceButtonPlan> {
    let mut x = WORKSPACE_BUTTON_OFFSET;
    workspaces
        .iter()
        .zip(widths.iter())
        .map(|(ws, width)| {
            let plan = WorkspaceButtonPlan {
                name: ws.name.clone(),
                state: ws.state,
                x,
                width: *width,
            };
            x += *width as i32 + WORKSPACE_BUTTON_SPACING;
            plan
        })
        .collect()
}

/// §4.6: build the full per-output draw plan. `mode_indicator` is `None`
/// when `disable_binding_mode_indicator` is set or the active mode is the
/// default one.
#[allow(clippy::too_many_arguments)]
pub fn build_draw_plan(
    output_rect: Rect,
    workspaces: &[WorkspaceButton],
    workspace_widths: &[u32],
    mode_indicator_text: Option<&str>,
    mode_indicator_width: u32,
    statusline_width: u32,
    tray: &TrayList,
    icon_size: u32,
    tray_padding: u32,
) -> BarDrawPlan {
    let workspace_buttons = layout_workspace_buttons(workspaces, workspace_widths);
    let mut x = workspace_buttons.last().map(|b| b.x + b.width as i32 + WORKSPACE_BUTTON_SPACING).unwrap_or(WORKSPACE_BUTTON_OFFSET);

    let mode_indicator = mode_indicator_text.map(|text| {
        let plan = ModeIndicatorPlan {
            x,
            width: mode_indicator_width,
            text: text.to_string(),
        };
        x += mode_indicator_width as i32;
        plan
    });

    let tray_icons = tray.icon_positions(output_rect.w, icon_size, tray_padding);
    let tray_span = tray.len() as u32 * (icon_size + tray_padding);
    let statusline_x = output_rect.w as i32 - tray_span as i32 - statusline_width as i32;

    BarDrawPlan {
        workspace_buttons,
        mode_indicator,
        statusline_x,
        statusline_width,
        tray_icons,
    }
}
