//! System-tray (XEMBED) client list and reparent/notify sequence (§4.6
//! "Tray protocol"). Grounded in the dock-request handling in the original
//! `i3bar/src/xcb.c` (see SPEC_FULL.md §3): reparent into the bar window,
//! `_XEMBED_EMBEDDED_NOTIFY`, add to save-set, track per-output, map iff
//! the client's XEMBED_MAPPED bit is set.

use core_terminal::{DisplayBackend, WindowHandle};

const XEMBED_MAPPED: u32 = 1;

/// One docked tray client (§3 "Tray client").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrayClient {
    pub window: WindowHandle,
    pub xembed_version: u32,
    pub mapped: bool,
}

/// Per-output ordered list, nearest-to-edge outward (§3). Index 0 sits
/// closest to the bar's trailing edge; the renderer's tray x-coordinate
/// formula (`output.w - idx*(icon_size+tray_padding)`) assumes this order.
#[derive(Debug, Clone, Default)]
pub struct TrayList {
    clients: Vec<TrayClient>,
}

impl TrayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrayClient> {
        self.clients.iter()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// A dock request: reparent the client into the bar window, send the
    /// embedded-notify, add it to the save-set so it survives a WM crash,
    /// and insert it nearest the edge. Maps it immediately iff
    /// `xembed_flags` carries `XEMBED_MAPPED`.
    pub fn dock(
        &mut self,
        backend: &mut dyn DisplayBackend,
        bar_window: WindowHandle,
        client: WindowHandle,
        xembed_version: u32,
        xembed_flags: u32,
    ) -> anyhow::Result<()> {
        backend.reparent(client, bar_window)?;
        backend.send_xembed_embedded_notify(client)?;
        backend.add_to_save_set(client)?;
        let mapped = xembed_flags & XEMBED_MAPPED != 0;
        if mapped {
            backend.map_window(client)?;
        }
        self.clients.insert(
            0,
            TrayClient {
                window: client,
                xembed_version,
                mapped,
            },
        );
        Ok(())
    }

    /// `PropertyNotify` on `_XEMBED_INFO`: map/unmap per the refreshed flags.
    pub fn on_xembed_info_change(&mut self, backend: &mut dyn DisplayBackend, client: WindowHandle, xembed_flags: u32) -> anyhow::Result<()> {
        let Some(entry) = self.clients.iter_mut().find(|c| c.window == client) else {
            return Ok(());
        };
        let mapped = xembed_flags & XEMBED_MAPPED != 0;
        if mapped != entry.mapped {
            entry.mapped = mapped;
            if mapped {
                backend.map_window(client)?;
            } else {
                backend.unmap_window(client)?;
            }
        }
        Ok(())
    }

    /// `DestroyNotify`/`Unmap`: drop the client from the list so the next
    /// layout pass excludes it.
    pub fn remove(&mut self, client: WindowHandle) {
        self.clients.retain(|c| c.window != client);
    }

    /// x-coordinates for each docked icon, rightmost-first, zero-indexed
    /// from the output's trailing edge (§4.6 drawing order).
    pub fn icon_positions(&self, output_width: u32, icon_size: u32, tray_padding: u32) -> Vec<(WindowHandle, i32)> {
        self.clients
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.window, output_width as i32 - (idx as u32 * (icon_size + tray_padding)) as i32))
            .collect()
    }

    /// Shutdown / output-removal sequence (§4.6): unmap and reparent every
    /// client back to root, then the caller sends a synthetic destroy of
    /// the selection window so clients rediscover a new tray.
    pub fn release_all(&mut self, backend: &mut dyn DisplayBackend, root: WindowHandle) -> anyhow::Result<()> {
        for c in self.clients.drain(..) {
            backend.unmap_window(c.window)?;
            backend.reparent(c.window, root)?;
        }
        Ok(())
    }
}
