//! Container node types (§3 DATA MODEL).

use core_geom::Rect;
use core_terminal::WindowHandle;

/// Index into `ContainerTree`'s arena. Never reused while a node is live;
/// freed slots are recycled on the next `attach`/wrap so ids can repeat
/// across a tree's lifetime, but never while two live nodes could collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct NodeId(pub u32);

pub const ROOT: NodeId = NodeId(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Role {
    Root,
    Output,
    Content,
    Workspace,
    SplitContainer,
    LeafWindow,
    FloatingContainer,
    Dockarea,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Layout {
    Default,
    SplitH,
    SplitV,
    Stacked,
    Tabbed,
    Output,
    Dockarea,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BorderStyle {
    None,
    Pixel,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FullscreenMode {
    None,
    Output,
    Global,
}

/// Urgency bookkeeping: the raw flag plus a monotonic stamp so `urgent=Latest`
/// / `urgent=Oldest` selectors (§4.2) can be answered without a wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Urgency {
    pub urgent: bool,
    pub stamp: u64,
}

/// `window_type` values a leaf's `_NET_WM_WINDOW_TYPE` property cache may
/// hold (§3 Match criteria `window_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WindowType {
    Normal,
    Dialog,
    Utility,
    Toolbar,
    Splash,
    Menu,
    DropdownMenu,
    PopupMenu,
    Tooltip,
    Notification,
    Dock,
    Desktop,
}

/// Cached window properties the event dispatcher fills in on PropertyNotify
/// (§4.5: "update property cache") and the match engine reads (§4.2). Kept
/// on the container itself rather than requiring a round-trip to the
/// backend on every criteria evaluation.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct WindowProperties {
    pub class: Option<String>,
    pub instance: Option<String>,
    pub window_role: Option<String>,
    pub title: Option<String>,
    pub window_type: Option<WindowType>,
}

/// One node of the container tree. Every role uses the same struct (§3: "sum
/// over role"); fields that don't apply to a given role sit at their default
/// (e.g. `window` is always `None` on a `SplitContainer`).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Container {
    pub id: NodeId,
    pub role: Role,
    pub layout: Layout,
    pub rect: Rect,
    pub percent: f64,
    pub border: BorderStyle,
    pub border_width: u32,
    pub fullscreen: FullscreenMode,
    pub mark: Option<String>,
    pub title_format: Option<String>,
    pub window: Option<WindowHandle>,
    /// Workspace number/name or output name; unused by split/leaf nodes.
    pub name: Option<String>,
    pub urgency: Urgency,
    pub properties: WindowProperties,
    /// Per-workspace gap overrides (§4.3 `gaps ... current`); `None` means
    /// "use the global config value".
    pub gap_inner_override: Option<u32>,
    pub gap_outer_override: Option<u32>,
    #[serde(skip)]
    pub parent: Option<NodeId>,
    /// Geometric order along the packing axis.
    #[serde(skip)]
    pub children: Vec<NodeId>,
    /// Most-recently-focused-first order over the same child set as
    /// `children` (§3 "two parallel orderings").
    #[serde(skip)]
    pub focus_order: Vec<NodeId>,
}

impl Container {
    pub fn new(id: NodeId, role: Role) -> Self {
        let layout = match role {
            Role::Output => Layout::Output,
            Role::Dockarea => Layout::Dockarea,
            _ => Layout::Default,
        };
        Self {
            id,
            role,
            layout,
            rect: Rect::default(),
            percent: 1.0,
            border: BorderStyle::Normal,
            border_width: 2,
            fullscreen: FullscreenMode::None,
            mark: None,
            title_format: None,
            window: None,
            name: None,
            urgency: Urgency::default(),
            properties: WindowProperties::default(),
            gap_inner_override: None,
            gap_outer_override: None,
            parent: None,
            children: Vec::new(),
            focus_order: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.role, Role::LeafWindow)
    }

    pub fn is_split(&self) -> bool {
        matches!(self.role, Role::SplitContainer | Role::Workspace | Role::Content | Role::Output)
    }

    /// Whether `child_role` may be attached directly under a node of
    /// `self.role` (§4.1 `attach`: "role mismatch" failure condition).
    pub fn accepts_child(&self, child_role: Role) -> bool {
        use Role::*;
        match (self.role, child_role) {
            (Root, Output) => true,
            (Output, Content) | (Output, Dockarea) => true,
            (Content, Workspace) => true,
            (Workspace, SplitContainer) | (Workspace, LeafWindow) | (Workspace, FloatingContainer) => true,
            (SplitContainer, SplitContainer) | (SplitContainer, LeafWindow) => true,
            (FloatingContainer, LeafWindow) => true,
            _ => false,
        }
    }
}
