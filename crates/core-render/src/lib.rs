//! Tree-to-geometry renderer and status-bar core (§4.4, §4.6).

pub mod bar;
pub mod renderer;

pub use bar::{BarCore, BarDrawPlan, BarOutput, BarVisibility, TrayClient, TrayList, WorkspaceButton, WorkspaceButtonState, build_draw_plan};
pub use renderer::render;
