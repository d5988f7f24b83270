//! Shared startup plumbing for both binaries: log file wiring, panic hook,
//! and the persisted-tree path, following the same "log to a rolling file
//! via a non-blocking writer, install once" sequence the teacher's own
//! `AppStartup` uses.

use std::path::PathBuf;
use std::sync::Once;
use tracing_appender::non_blocking::WorkerGuard;

/// Initialize a file-backed `tracing` subscriber for `component` (`"wm"` or
/// `"bar"`). Returns the worker guard the caller must keep alive for the
/// process lifetime; dropping it stops the background writer thread.
pub fn configure_logging(component: &str) -> anyhow::Result<Option<WorkerGuard>> {
    let log_dir = state_dir();
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::never(&log_dir, format!("{component}.log"));
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .try_init()
    {
        Ok(()) => Ok(Some(guard)),
        Err(_) => Ok(None), // a subscriber is already installed (e.g. under test)
    }
}

pub fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

/// XDG-ish state directory used for logs, the persisted tree, and the
/// default IPC socket, preferring `$XDG_RUNTIME_DIR` and falling back to a
/// temp directory so a sandboxed test run never needs root-owned paths.
pub fn state_dir() -> PathBuf {
    dirs::runtime_dir()
        .or_else(dirs::state_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("wm")
}

pub fn persisted_tree_path() -> PathBuf {
    state_dir().join("tree.json")
}

pub fn socket_path() -> PathBuf {
    state_dir().join("wm.sock")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_dir_paths_are_scoped_under_a_single_wm_directory() {
        assert_eq!(persisted_tree_path().parent(), Some(state_dir().as_path()));
        assert_eq!(socket_path().parent(), Some(state_dir().as_path()));
    }
}
