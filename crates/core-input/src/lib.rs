//! Command channel: the length-prefixed UNIX socket IPC protocol (§6).
//!
//! Wire format, modeled on i3/sway's own protocol: a 6-byte magic string,
//! a little-endian `u32` payload length, a little-endian `u32` message
//! type, then the payload bytes. `RUN_COMMAND` (0) carries a command
//! string; `SUBSCRIBE` (2) carries a JSON array of broadcast group names.
//! Replies are framed the same way and carry a JSON object
//! `{success, payload?, error?}` (`id` is added by the caller for
//! `open`-style replies, which this crate does not itself produce).
//! `payload` carries `GET_TREE`'s serialized tree for a successful reply.

use anyhow::{Context, Result, bail};
use core_events::{AsyncEventSource, BroadcastKind, Event, IpcBody, IpcRequest};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc::Sender;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const MAGIC: &[u8; 6] = b"i3-ipc";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MessageType {
    RunCommand = 0,
    GetTree = 4,
    Subscribe = 2,
}

impl MessageType {
    fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::RunCommand),
            4 => Some(Self::GetTree),
            2 => Some(Self::Subscribe),
            _ => None,
        }
    }
}

/// Encode one framed message.
pub fn encode_message(kind: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAGIC.len() + 8 + payload.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&kind.to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Read exactly one framed message from `stream`.
pub async fn read_message(stream: &mut UnixStream) -> Result<(u32, Vec<u8>)> {
    let mut magic = [0u8; 6];
    stream.read_exact(&mut magic).await.context("read magic")?;
    if &magic != MAGIC {
        bail!("bad magic: {:?}", magic);
    }
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await.context("read length")?;
    let len = u32::from_le_bytes(len_buf) as usize;
    let mut type_buf = [0u8; 4];
    stream.read_exact(&mut type_buf).await.context("read type")?;
    let kind = u32::from_le_bytes(type_buf);
    let mut payload = vec![0u8; len];
    if len > 0 {
        stream.read_exact(&mut payload).await.context("read payload")?;
    }
    Ok((kind, payload))
}

#[derive(Serialize)]
struct WireReply<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

async fn handle_connection(mut stream: UnixStream, tx: Sender<Event>) -> Result<()> {
    loop {
        let (kind, payload) = match read_message(&mut stream).await {
            Ok(v) => v,
            Err(_) => return Ok(()), // client disconnected
        };
        let Some(mtype) = MessageType::from_u32(kind) else {
            tracing::warn!(target: "ipc", kind, "unknown_message_type");
            continue;
        };
        let body = match mtype {
            MessageType::RunCommand => {
                let text = String::from_utf8_lossy(&payload).into_owned();
                IpcBody::RunCommand(text)
            }
            MessageType::GetTree => IpcBody::GetTree,
            MessageType::Subscribe => {
                let names: Vec<String> = serde_json::from_slice(&payload).unwrap_or_default();
                let kinds = names
                    .iter()
                    .filter_map(|n| match n.as_str() {
                        "workspace" => Some(BroadcastKind::Workspace),
                        "output" => Some(BroadcastKind::Output),
                        "mode" => Some(BroadcastKind::Mode),
                        "window" => Some(BroadcastKind::Window),
                        "barconfig_update" => Some(BroadcastKind::BarConfigUpdate),
                        "binding" => Some(BroadcastKind::Binding),
                        _ => None,
                    })
                    .collect();
                IpcBody::Subscribe(kinds)
            }
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        if tx.send(Event::Ipc(IpcRequest { body, reply: reply_tx })).await.is_err() {
            return Ok(());
        }
        let reply = reply_rx.await.unwrap_or(core_events::IpcReply {
            success: false,
            payload: None,
            error: Some("dispatcher shut down".into()),
        });
        let wire = WireReply {
            success: reply.success,
            payload: reply.payload.as_deref(),
            error: reply.error.as_deref(),
        };
        let payload = serde_json::to_vec(&wire)?;
        let framed = encode_message(kind, &payload);
        if stream.write_all(&framed).await.is_err() {
            return Ok(());
        }
    }
}

/// Listens on a UNIX socket, spawning one task per connection; each task
/// feeds parsed requests into the shared event channel and writes back the
/// dispatcher's reply.
pub struct CommandChannel {
    listener: UnixListener,
    path: PathBuf,
}

impl CommandChannel {
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let _ = std::fs::remove_file(&path);
        let listener = UnixListener::bind(&path).context("bind ipc socket")?;
        Ok(Self { listener, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accept loop: runs until the channel closes, spawning a per-connection
    /// handler for each accepted client.
    pub fn spawn_accept_loop(self, tx: Sender<Event>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match self.listener.accept().await {
                    Ok((stream, _addr)) => {
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, tx).await {
                                tracing::debug!(target: "ipc", error = %e, "connection_ended");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::warn!(target: "ipc", error = %e, "accept_failed");
                        break;
                    }
                }
            }
        })
    }
}

impl Drop for CommandChannel {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

impl AsyncEventSource for CommandChannel {
    fn name(&self) -> &'static str {
        "ipc"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        (*self).spawn_accept_loop(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn encode_message_has_correct_layout() {
        let framed = encode_message(0, b"hello");
        assert_eq!(&framed[0..6], MAGIC);
        assert_eq!(u32::from_le_bytes(framed[6..10].try_into().unwrap()), 5);
        assert_eq!(u32::from_le_bytes(framed[10..14].try_into().unwrap()), 0);
        assert_eq!(&framed[14..], b"hello");
    }

    #[tokio::test]
    async fn round_trip_run_command_over_socket() {
        let dir = tempfile::tempdir().unwrap();
        let sock_path = dir.path().join("wm.sock");
        let channel = CommandChannel::bind(&sock_path).unwrap();
        let (tx, mut rx) = mpsc::channel::<Event>(8);
        let _accept = channel.spawn_accept_loop(tx);

        let mut client = UnixStream::connect(&sock_path).await.unwrap();
        let msg = encode_message(0, b"workspace 1");
        client.write_all(&msg).await.unwrap();

        let ev = rx.recv().await.expect("event delivered");
        let Event::Ipc(req) = ev else { panic!("expected ipc event") };
        match req.body {
            IpcBody::RunCommand(ref s) => assert_eq!(s, "workspace 1"),
            _ => panic!("expected RunCommand"),
        }
        req.reply
            .send(core_events::IpcReply { success: true, payload: None, error: None })
            .unwrap();

        let (kind, payload) = read_message(&mut client).await.unwrap();
        assert_eq!(kind, 0);
        let reply: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(reply["success"], true);
    }
}
