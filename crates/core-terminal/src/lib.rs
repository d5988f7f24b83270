//! Display backend abstraction.
//!
//! The X11 protocol plumbing itself — atom lookup, the event pump, GC/pixmap
//! allocation — is explicitly out of scope (§1): this crate only defines the
//! capability surface the rest of the workspace programs against, plus a
//! `LoggingBackend` test double that stands in for a real Xlib/XCB
//! implementation. A production build would swap in a real backend without
//! touching `core-state`, `core-render`, or `core-actions`.

pub mod capabilities;
pub use capabilities::DisplayCapabilities;

use core_geom::Rect;
use std::sync::atomic::{AtomicU32, Ordering};

/// Opaque handle to an X11 window, re-exported rather than re-derived so
/// every crate shares the same identity type for "the thing on screen".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct WindowHandle(pub u32);

/// Opaque handle to a backing pixmap (one per output, owned by `core-render`'s
/// bar core).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixmapHandle(pub u32);

/// The capability the layout engine's renderer (§4.4) and event dispatcher
/// (§4.5) use to talk to the display server. All methods are synchronous:
/// the single-threaded event loop (§5) issues every protocol call from the
/// same thread that owns the connection.
pub trait DisplayBackend: Send {
    /// Resize/move a window to `rect` and ask the server to send a
    /// synthetic ConfigureNotify if the size did not change (X11 quirk the
    /// renderer relies on to keep clients honest about their geometry).
    fn configure_window(&mut self, win: WindowHandle, rect: Rect) -> anyhow::Result<()>;
    fn map_window(&mut self, win: WindowHandle) -> anyhow::Result<()>;
    fn unmap_window(&mut self, win: WindowHandle) -> anyhow::Result<()>;
    /// Restack windows so the first element of `order` is on top.
    fn restack(&mut self, order: &[WindowHandle]) -> anyhow::Result<()>;
    /// Politely ask a client to close via WM_DELETE_WINDOW (`kill window`).
    fn close_window_polite(&mut self, win: WindowHandle) -> anyhow::Result<()>;
    /// Forcibly terminate a client's connection (`kill client`).
    fn kill_client(&mut self, win: WindowHandle) -> anyhow::Result<()>;
    /// Spawn an external command (`exec`), detached from the WM's lifetime.
    fn spawn(&mut self, command: &str) -> anyhow::Result<()>;

    fn reparent(&mut self, win: WindowHandle, new_parent: WindowHandle) -> anyhow::Result<()>;
    fn add_to_save_set(&mut self, win: WindowHandle) -> anyhow::Result<()>;
    fn remove_from_save_set(&mut self, win: WindowHandle) -> anyhow::Result<()>;
    fn send_xembed_embedded_notify(&mut self, win: WindowHandle) -> anyhow::Result<()>;

    /// Attempt to claim `_NET_SYSTEM_TRAY_S<screen>`. Returns `Ok(false)`
    /// without error if another tray already owns it (§5: "lost if another
    /// tray takes it").
    fn claim_tray_selection(&mut self, screen: u32) -> anyhow::Result<bool>;
    fn release_tray_selection(&mut self, screen: u32) -> anyhow::Result<()>;

    fn create_pixmap(&mut self, w: u32, h: u32) -> anyhow::Result<PixmapHandle>;
    fn grow_pixmap(&mut self, pixmap: PixmapHandle, w: u32, h: u32) -> anyhow::Result<()>;
}

/// Text measurement capability, kept separate from `DisplayBackend` because
/// the bar core needs it even when no window is being configured (§4.6 step
/// 1: "compute text width").
pub trait TextMetrics {
    fn text_width(&self, text: &str) -> u32;
    fn font_height(&self) -> u32;
}

/// Xkb modifier-grab capability used by the bar's auto-reveal state machine
/// (§4.6 visibility state machine) and by global keybindings.
pub trait InputGrab {
    fn grab_modifier(&mut self, mask: u32) -> anyhow::Result<()>;
    fn ungrab_modifier(&mut self, mask: u32) -> anyhow::Result<()>;
}

/// A backend that performs no real X11 I/O: every call is logged and
/// succeeds. Used by tests and as the default until a real Xlib/XCB backend
/// is wired in; this is the concrete stand-in for the capability named in
/// §1 ("modeled as a `DisplayBackend` capability").
pub struct LoggingBackend {
    next_pixmap: AtomicU32,
    capabilities: DisplayCapabilities,
    font_height: u32,
}

impl Default for LoggingBackend {
    fn default() -> Self {
        Self::new(DisplayCapabilities::default(), 16)
    }
}

impl LoggingBackend {
    pub fn new(capabilities: DisplayCapabilities, font_height: u32) -> Self {
        Self {
            next_pixmap: AtomicU32::new(1),
            capabilities,
            font_height,
        }
    }

    pub fn capabilities(&self) -> DisplayCapabilities {
        self.capabilities
    }
}

impl DisplayBackend for LoggingBackend {
    fn configure_window(&mut self, win: WindowHandle, rect: Rect) -> anyhow::Result<()> {
        tracing::debug!(target: "backend", win = win.0, ?rect, "configure_window");
        Ok(())
    }

    fn map_window(&mut self, win: WindowHandle) -> anyhow::Result<()> {
        tracing::debug!(target: "backend", win = win.0, "map_window");
        Ok(())
    }

    fn unmap_window(&mut self, win: WindowHandle) -> anyhow::Result<()> {
        tracing::debug!(target: "backend", win = win.0, "unmap_window");
        Ok(())
    }

    fn restack(&mut self, order: &[WindowHandle]) -> anyhow::Result<()> {
        tracing::debug!(target: "backend", count = order.len(), "restack");
        Ok(())
    }

    fn close_window_polite(&mut self, win: WindowHandle) -> anyhow::Result<()> {
        tracing::info!(target: "backend", win = win.0, "close_window_polite");
        Ok(())
    }

    fn kill_client(&mut self, win: WindowHandle) -> anyhow::Result<()> {
        tracing::info!(target: "backend", win = win.0, "kill_client");
        Ok(())
    }

    fn spawn(&mut self, command: &str) -> anyhow::Result<()> {
        tracing::info!(target: "backend", command, "spawn");
        Ok(())
    }

    fn reparent(&mut self, win: WindowHandle, new_parent: WindowHandle) -> anyhow::Result<()> {
        tracing::debug!(target: "backend", win = win.0, new_parent = new_parent.0, "reparent");
        Ok(())
    }

    fn add_to_save_set(&mut self, win: WindowHandle) -> anyhow::Result<()> {
        tracing::debug!(target: "backend", win = win.0, "add_to_save_set");
        Ok(())
    }

    fn remove_from_save_set(&mut self, win: WindowHandle) -> anyhow::Result<()> {
        tracing::debug!(target: "backend", win = win.0, "remove_from_save_set");
        Ok(())
    }

    fn send_xembed_embedded_notify(&mut self, win: WindowHandle) -> anyhow::Result<()> {
        tracing::debug!(target: "backend", win = win.0, "xembed_embedded_notify");
        Ok(())
    }

    fn claim_tray_selection(&mut self, screen: u32) -> anyhow::Result<bool> {
        tracing::info!(target: "backend", screen, "claim_tray_selection");
        Ok(true)
    }

    fn release_tray_selection(&mut self, screen: u32) -> anyhow::Result<()> {
        tracing::info!(target: "backend", screen, "release_tray_selection");
        Ok(())
    }

    fn create_pixmap(&mut self, w: u32, h: u32) -> anyhow::Result<PixmapHandle> {
        let id = self.next_pixmap.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(target: "backend", id, w, h, "create_pixmap");
        Ok(PixmapHandle(id))
    }

    fn grow_pixmap(&mut self, pixmap: PixmapHandle, w: u32, h: u32) -> anyhow::Result<()> {
        tracing::debug!(target: "backend", id = pixmap.0, w, h, "grow_pixmap");
        Ok(())
    }
}

impl TextMetrics for LoggingBackend {
    fn text_width(&self, text: &str) -> u32 {
        // Stand-in metric: every character occupies half the font height,
        // the conventional monospace approximation used by test fixtures.
        text.chars().count() as u32 * (self.font_height / 2).max(1)
    }

    fn font_height(&self) -> u32 {
        self.font_height
    }
}

impl InputGrab for LoggingBackend {
    fn grab_modifier(&mut self, mask: u32) -> anyhow::Result<()> {
        tracing::debug!(target: "backend", mask, "grab_modifier");
        Ok(())
    }

    fn ungrab_modifier(&mut self, mask: u32) -> anyhow::Result<()> {
        tracing::debug!(target: "backend", mask, "ungrab_modifier");
        Ok(())
    }
}
