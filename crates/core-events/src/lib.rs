//! Event types consumed by the central event loop (§2 `EventDispatcher`,
//! §6 IPC broadcast groups) and the generic async-source registry that feeds
//! them into a bounded channel.

use core_terminal::WindowHandle;
use std::sync::atomic::AtomicU64;
use tokio::sync::{mpsc::Sender, oneshot};
use tokio::task::JoinHandle;

/// Bounded channel capacity for the main event queue. A single producer
/// (the async sources below) and single consumer (the event loop) keep
/// latency low; blocking-send backpressure is preferred over dropping
/// window events, which would violate §3 invariants.
pub const EVENT_CHANNEL_CAP: usize = 4096;

pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);

bitflags::bitflags! {
    /// Xkb-style modifier mask, shared between `core-config`'s `modifier`
    /// field and the bar's auto-reveal state machine (§4.6).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ModMask: u32 {
        const SHIFT = 1 << 0;
        const CTRL  = 1 << 1;
        const ALT   = 1 << 2;
        const SUPER = 1 << 3;
    }
}

/// Window-lifecycle and property events the display backend delivers
/// (§4.5 EventDispatcher): map, unmap, destroy, configure-request,
/// property-change, focus-change, button-press, visibility-change,
/// modifier-change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowEvent {
    Map(WindowHandle),
    Unmap(WindowHandle),
    Destroy(WindowHandle),
    ConfigureRequest { win: WindowHandle, w: u32, h: u32 },
    PropertyChange { win: WindowHandle, property: PropertyKind },
    FocusChange(WindowHandle),
    ButtonPress { output: u32, x: i32, y: i32, button: u8 },
    VisibilityChange { output: u32, visible: bool },
    ModifierChange { pressed: bool },
    /// xrandr-style output hotplug notification (§3 Output lifecycle).
    OutputChange { name: String, present: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    WmClass,
    WmName,
    WmRole,
    WmWindowType,
    XEmbedInfo,
    Urgency,
}

/// One IPC client's parsed request plus a reply channel (§6). The command
/// grammar itself is out of scope; by the time a request reaches this type
/// it is already a structured request body.
#[derive(Debug)]
pub struct IpcRequest {
    pub body: IpcBody,
    pub reply: oneshot::Sender<IpcReply>,
}

#[derive(Debug, Clone)]
pub enum IpcBody {
    RunCommand(String),
    Subscribe(Vec<BroadcastKind>),
    GetTree,
}

#[derive(Debug, Clone)]
pub struct IpcReply {
    pub success: bool,
    /// Serialized data for replies that carry a result body (`GetTree`);
    /// `None` for plain `{success, error}` replies.
    pub payload: Option<String>,
    pub error: Option<String>,
}

/// The broadcast groups a `subscribe` client may register for (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BroadcastKind {
    Workspace,
    Output,
    Mode,
    Window,
    BarConfigUpdate,
    Binding,
}

/// Top-level event enum consumed by the central event loop.
#[derive(Debug)]
pub enum Event {
    Window(WindowEvent),
    Ipc(IpcRequest),
    /// Raw status-block JSON read from the status-generator's stdout pipe
    /// (§4.6, deserialized downstream by `core-plugin`).
    StatusUpdate(Vec<u8>),
    /// A monitored child process exited (status source or `exec`'d command).
    ChildExited { pid: u32, status: i32 },
    Tick,
    Shutdown,
}

/// Optional hooks observing events at the loop boundary; default is a no-op.
pub trait EventHooks: Send + Sync + 'static {
    fn pre_handle(&self, _event: &Event) {}
    fn post_handle(&self, _event: &Event) {}
}

pub struct NoopEventHooks;
impl EventHooks for NoopEventHooks {}

/// Trait implemented by any async event producer (IPC listener, status
/// source reader, SIGCHLD self-pipe, tick timer). Each spawns one task that
/// pushes `Event`s into the shared channel and exits promptly once the
/// channel closes.
pub trait AsyncEventSource: Send + 'static {
    fn name(&self) -> &'static str;
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

#[derive(Default)]
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self { sources: Vec::new() }
    }

    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }

    /// Spawn all registered sources, draining the registry. Callers should
    /// drop their `Sender` clone before awaiting these handles during
    /// shutdown so sources observe the closed channel and exit.
    pub fn spawn_all(&mut self, tx: &Sender<Event>) -> Vec<JoinHandle<()>> {
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::info!(target: "runtime.events", source = name, "spawning event source");
            out.push(src.spawn(tx.clone()));
        }
        out
    }
}

/// Built-in monotonic tick source, used for ephemeral expiry (binding-mode
/// indicator timeouts, etc.) without busy polling.
pub struct TickEventSource {
    interval: std::time::Duration,
}

impl TickEventSource {
    pub fn new(interval: std::time::Duration) -> Self {
        Self { interval }
    }
}

impl AsyncEventSource for TickEventSource {
    fn name(&self) -> &'static str {
        "tick"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let dur = self.interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(dur);
            loop {
                interval.tick().await;
                if tx.send(Event::Tick).await.is_err() {
                    break;
                }
            }
        })
    }
}
