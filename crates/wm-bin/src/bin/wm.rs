//! Window manager process: owns the tree, the single-threaded dispatch loop,
//! and the IPC socket. Mirrors the teacher's `AppStartup` → `EditorRuntime`
//! staging (`ox-bin`), generalized from an editor's event sources to a
//! window manager's (display events, IPC, child-process exits, ticks).

use anyhow::{Context, Result};
use clap::Parser;
use core_actions::ControlSignal;
use core_events::{Event, EventSourceRegistry, TickEventSource, EVENT_CHANNEL_CAP};
use core_keymap::ModeTable;
use core_terminal::LoggingBackend;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;
use wm_bin::{bootstrap, ipc, tree_bootstrap, window_events};

#[derive(Parser, Debug)]
#[command(name = "wm", about = "Tiling window manager")]
struct Args {
    /// Path to `wmrc.toml`; defaults to the XDG discovery order.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the persisted-tree/socket state directory.
    #[arg(long)]
    state_dir: Option<PathBuf>,
}

/// Everything the run loop needs, assembled once at startup so `main` is
/// just "build it, then run it" like the teacher's `EditorBootstrap`.
struct Runtime {
    tree: core_state::ContainerTree,
    config: core_config::Config,
    modes: ModeTable,
    backend: LoggingBackend,
    /// Separate instance purely for `TextMetrics`: `render` wants both a
    /// `&mut dyn DisplayBackend` and a `&dyn TextMetrics` in the same call,
    /// which a single shared backend object cannot satisfy under borrowck.
    metrics: LoggingBackend,
    rx: mpsc::Receiver<Event>,
    tx: Option<mpsc::Sender<Event>>,
    source_handles: Vec<tokio::task::JoinHandle<()>>,
    tree_path: PathBuf,
    _log_guard: Option<WorkerGuard>,
}

enum LoopControl {
    Continue,
    Break,
}

impl Runtime {
    fn new(args: Args, log_guard: Option<WorkerGuard>) -> Result<Self> {
        let state_dir = args.state_dir.unwrap_or_else(bootstrap::state_dir);
        let tree_path = state_dir.join("tree.json");
        let socket_path = state_dir.join("wm.sock");

        let config = core_config::load_from(args.config).context("load config")?;
        let tree = tree_bootstrap::load_or_default(&tree_path);
        let modes = ModeTable::new();
        let backend = LoggingBackend::default();
        let metrics = LoggingBackend::default();

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAP);
        let mut registry = EventSourceRegistry::new();
        registry.register(TickEventSource::new(Duration::from_millis(500)));
        let channel = core_input::CommandChannel::bind(&socket_path).context("bind ipc socket")?;
        registry.register(channel);
        let source_handles = registry.spawn_all(&tx);

        Ok(Self {
            tree,
            config,
            modes,
            backend,
            metrics,
            rx,
            tx: Some(tx),
            source_handles,
            tree_path,
            _log_guard: log_guard,
        })
    }

    fn render_if_needed(&mut self) -> Result<()> {
        if self.tree.needs_render {
            core_render::render(&mut self.tree, &mut self.backend, &self.metrics, self.config.file.gaps)?;
        }
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> Result<LoopControl> {
        match event {
            Event::Window(win_event) => {
                window_events::handle_window_event(&mut self.tree, &mut self.backend, &win_event)?;
                self.render_if_needed()?;
            }
            Event::Ipc(request) => {
                let outcome = ipc::handle(
                    request.body,
                    &mut self.tree,
                    &mut self.config,
                    &mut self.modes,
                    &mut self.backend,
                );
                let _ = request.reply.send(outcome.reply);
                self.render_if_needed()?;
                match outcome.control {
                    ControlSignal::None => {}
                    ControlSignal::Reload => {
                        self.config = core_config::load_from(None).unwrap_or_default();
                        tracing::info!(target: "runtime", "config_reloaded");
                    }
                    ControlSignal::Restart => {
                        tree_bootstrap::persist(&self.tree, &self.tree_path);
                        tracing::info!(target: "runtime", "restart_requested");
                        return Ok(LoopControl::Break);
                    }
                    ControlSignal::Exit => {
                        tree_bootstrap::persist(&self.tree, &self.tree_path);
                        tracing::info!(target: "runtime", "exit_requested");
                        return Ok(LoopControl::Break);
                    }
                }
            }
            Event::StatusUpdate(_) => {
                // Owned by the `bar` binary's own event loop.
            }
            Event::ChildExited { pid, status } => {
                tracing::debug!(target: "runtime", pid, status, "child_exited");
            }
            Event::Tick => {}
            Event::Shutdown => return Ok(LoopControl::Break),
        }
        Ok(LoopControl::Continue)
    }

    async fn run(&mut self) -> Result<()> {
        while let Some(event) = self.rx.recv().await {
            match self.handle_event(event)? {
                LoopControl::Continue => {}
                LoopControl::Break => break,
            }
        }
        self.finalize_shutdown().await;
        Ok(())
    }

    async fn finalize_shutdown(&mut self) {
        self.tx.take();
        for handle in self.source_handles.drain(..) {
            let _ = tokio::time::timeout(Duration::from_secs(2), handle).await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_guard = bootstrap::configure_logging("wm")?;
    bootstrap::install_panic_hook();

    let mut runtime = Runtime::new(args, log_guard)?;
    runtime.run().await
}
