//! Status-source capability: the external status-generation child process
//! and JSON protocol that feeds the bar (§1, §3 "Status block").
//!
//! The child process and its wire protocol are an external collaborator;
//! this crate only defines the `StatusBlock` data the protocol produces, a
//! `StatusSource` trait, and an `AsyncEventSource` implementation that turns
//! a child process's stdout into `Event::StatusUpdate` batches.

use core_events::{AsyncEventSource, Event};
use serde::Deserialize;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Right,
    Center,
}

impl Default for Align {
    fn default() -> Self {
        Align::Left
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BorderWidths {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

/// One rendered segment of the bar's right-hand status line (§3).
///
/// `width`, `x_offset`, and `x_append` are computed by the renderer
/// (`core-render::bar::layout_statusline`), not by the status source; they
/// are `0` as received over the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusBlock {
    pub full_text: String,
    #[serde(default)]
    pub short_text: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub border: Option<String>,
    #[serde(default)]
    pub border_widths: BorderWidths,
    #[serde(default)]
    pub min_width: u32,
    #[serde(default)]
    pub align: Align,
    #[serde(default = "StatusBlock::default_separator")]
    pub separator: bool,
    #[serde(default = "StatusBlock::default_separator_block_width")]
    pub separator_block_width: u32,
    #[serde(default)]
    pub urgent: bool,
    #[serde(skip, default)]
    pub computed_width: u32,
    #[serde(skip, default)]
    pub x_offset: u32,
    #[serde(skip, default)]
    pub x_append: u32,
}

impl StatusBlock {
    const fn default_separator() -> bool {
        true
    }
    const fn default_separator_block_width() -> u32 {
        9
    }

    pub fn display_text(&self, use_short: bool) -> &str {
        if use_short {
            self.short_text.as_deref().unwrap_or(&self.full_text)
        } else {
            &self.full_text
        }
    }
}

/// Capability abstracting "something that periodically produces a sequence
/// of status blocks" (§1). A real implementation reads newline-delimited
/// JSON arrays from a child process's stdout; `NoopStatusSource` is the test
/// double.
pub trait StatusSource: Send {
    fn name(&self) -> &'static str;
}

pub struct NoopStatusSource;
impl StatusSource for NoopStatusSource {
    fn name(&self) -> &'static str {
        "noop-status-source"
    }
}

/// Parse one line of the i3status-style JSON protocol: a JSON array of
/// blocks, optionally prefixed with a leading comma (`,[...]`) as the
/// protocol requires for all lines after the first.
pub fn parse_status_line(line: &str) -> anyhow::Result<Vec<StatusBlock>> {
    let trimmed = line.trim_start().trim_start_matches(',');
    let blocks: Vec<StatusBlock> = serde_json::from_str(trimmed)?;
    Ok(blocks)
}

/// Drives an external status-generator process, forwarding each parsed
/// line as `Event::StatusUpdate` (raw JSON bytes; the renderer owns
/// deserialization timing so a malformed line does not crash the source).
pub struct ChildProcessStatusSource {
    command: String,
}

impl ChildProcessStatusSource {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into() }
    }
}

impl AsyncEventSource for ChildProcessStatusSource {
    fn name(&self) -> &'static str {
        "status-source"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let command = self.command;
        tokio::spawn(async move {
            let child = Command::new("sh")
                .arg("-c")
                .arg(&command)
                .stdout(Stdio::piped())
                .spawn();
            let mut child = match child {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(target: "status_source", error = %e, "spawn_failed");
                    return;
                }
            };
            let Some(stdout) = child.stdout.take() else {
                return;
            };
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() || line.trim() == "[" {
                            continue;
                        }
                        if tx.send(Event::StatusUpdate(line.into_bytes())).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(target: "status_source", error = %e, "read_failed");
                        break;
                    }
                }
            }
            let _ = child.kill().await;
        })
    }
}
