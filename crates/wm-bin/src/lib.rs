//! Wires the eleven library crates into the two binaries (`wm`, `bar`):
//! startup plumbing, the window-event dispatcher, the IPC bridge, and the
//! ad hoc command-string parser that stands in for the out-of-scope grammar.

pub mod bootstrap;
pub mod command_parser;
pub mod ipc;
pub mod tree_bootstrap;
pub mod window_events;
