//! Status bar process: a read-only client of `wm`'s tree plus its own
//! status-generator child process. Per §2, "the bar core depends only on
//! `DisplayBackend`, `StatusSource`, and a subscribed read-only view of
//! workspace state" — the read-only view here is a periodic `GetTree` query
//! over the same IPC socket `wm` already exposes, rather than a duplicate
//! protocol.

use anyhow::{Context, Result};
use clap::Parser;
use core_events::{Event, EventSourceRegistry, TickEventSource, EVENT_CHANNEL_CAP};
use core_plugin::ChildProcessStatusSource;
use core_render::bar::{layout_statusline, BarCore, WorkspaceButton, WorkspaceButtonState};
use core_render::build_draw_plan;
use core_state::ContainerTree;
use core_terminal::LoggingBackend;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use wm_bin::bootstrap;

#[derive(Parser, Debug)]
#[command(name = "bar", about = "Status bar for the window manager")]
struct Args {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    state_dir: Option<PathBuf>,
    /// Shell command piped for the i3bar-style JSON status protocol (§4.6).
    /// Left unset, no status source runs and the statusline stays empty.
    #[arg(long)]
    status_command: Option<String>,
}

/// Query `wm`'s `GetTree` over the IPC socket and rebuild a local, read-only
/// tree from the reply. Best-effort: a connection failure (wm not running
/// yet, or mid-restart) just leaves the bar's existing view stale.
async fn fetch_tree(socket_path: &std::path::Path) -> Option<ContainerTree> {
    let mut stream = UnixStream::connect(socket_path).await.ok()?;
    let framed = core_input::encode_message(core_input::MessageType::GetTree as u32, &[]);
    tokio::io::AsyncWriteExt::write_all(&mut stream, &framed).await.ok()?;
    let (_, payload) = core_input::read_message(&mut stream).await.ok()?;
    let reply: serde_json::Value = serde_json::from_slice(&payload).ok()?;
    let tree_json = reply.get("payload")?.as_str()?;
    core_state::from_json(tree_json).ok()
}

fn workspace_buttons(tree: &ContainerTree) -> Vec<WorkspaceButton> {
    let mut buttons = Vec::new();
    for output in tree.outputs() {
        let active = core_model::visible_workspace(tree, output);
        for ws in tree.content_of(output).into_iter().flat_map(|c| {
            tree.get(c).map(|c| c.children.clone()).unwrap_or_default()
        }) {
            let Some(c) = tree.get(ws) else { continue };
            let state = if Some(ws) == active {
                if c.urgency.urgent {
                    WorkspaceButtonState::Urgent
                } else {
                    WorkspaceButtonState::Focused
                }
            } else if c.urgency.urgent {
                WorkspaceButtonState::Urgent
            } else {
                WorkspaceButtonState::Inactive
            };
            buttons.push(WorkspaceButton { name: c.name.clone().unwrap_or_default(), state });
        }
    }
    buttons
}

struct Runtime {
    bar: BarCore,
    metrics: LoggingBackend,
    socket_path: PathBuf,
    tray_padding: u32,
    rx: mpsc::Receiver<Event>,
    tx: Option<mpsc::Sender<Event>>,
    source_handles: Vec<tokio::task::JoinHandle<()>>,
}

impl Runtime {
    async fn new(args: Args) -> Result<Self> {
        let state_dir = args.state_dir.unwrap_or_else(bootstrap::state_dir);
        let socket_path = state_dir.join("wm.sock");
        let config = core_config::load_from(args.config).context("load config")?;

        let bar = BarCore::new(config.file.bar.hide_on_modifier);
        let metrics = LoggingBackend::default();

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAP);
        let mut registry = EventSourceRegistry::new();
        registry.register(TickEventSource::new(Duration::from_millis(500)));
        if let Some(cmd) = args.status_command {
            registry.register(ChildProcessStatusSource::new(cmd));
        }
        let source_handles = registry.spawn_all(&tx);

        Ok(Self {
            bar,
            metrics,
            socket_path,
            tray_padding: config.file.bar.tray_padding,
            rx,
            tx: Some(tx),
            source_handles,
        })
    }

    /// Recompute the draw plan from the bar's current state. The actual
    /// pixel drawing belongs to the backend/metrics pair, which a test
    /// double stands in for here just as it does for the `wm` binary.
    fn redraw(&self, buttons: &[WorkspaceButton]) {
        let widths: Vec<u32> = buttons.iter().map(|b| self.metrics.text_width(&b.name) + 8).collect();
        let mut blocks = self.bar.status_blocks.clone();
        let statusline_width = layout_statusline(&mut blocks);
        let plan = build_draw_plan(
            core_geom::Rect::new(0, 0, 1280, 20),
            buttons,
            &widths,
            None,
            0,
            statusline_width,
            &core_render::bar::TrayList::new(),
            20,
            self.tray_padding,
        );
        tracing::debug!(
            target: "bar",
            workspaces = plan.workspace_buttons.len(),
            statusline_x = plan.statusline_x,
            "draw_plan_computed"
        );
    }

    async fn handle_event(&mut self, event: Event) -> Result<bool> {
        match event {
            Event::Tick => {
                if let Some(tree) = fetch_tree(&self.socket_path).await {
                    let buttons = workspace_buttons(&tree);
                    self.redraw(&buttons);
                }
            }
            Event::StatusUpdate(raw) => match core_plugin::parse_status_line(&String::from_utf8_lossy(&raw)) {
                Ok(blocks) => self.bar.status_blocks = blocks,
                Err(e) => tracing::warn!(target: "bar", error = %e, "status_line_parse_failed"),
            },
            Event::ChildExited { pid, status } => {
                tracing::debug!(target: "bar", pid, status, "status_source_exited");
            }
            Event::Shutdown => return Ok(true),
            Event::Window(_) | Event::Ipc(_) => {}
        }
        Ok(false)
    }

    async fn run(&mut self) -> Result<()> {
        while let Some(event) = self.rx.recv().await {
            if self.handle_event(event).await? {
                break;
            }
        }
        self.tx.take();
        for handle in self.source_handles.drain(..) {
            let _ = tokio::time::timeout(Duration::from_secs(2), handle).await;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = bootstrap::configure_logging("bar")?;
    bootstrap::install_panic_hook();

    let mut runtime = Runtime::new(args).await?;
    runtime.run().await
}
