//! Bridges one decoded [`IpcRequest`] to the command interpreter (§4.3, §6).
//!
//! `core-input` hands us a structured request body; this module turns
//! `RunCommand` text into a [`Command`] batch via [`command_parser`], runs it
//! through `core_actions::execute_batch`, and folds the per-command outcomes
//! into a single [`IpcReply`]. `GetTree` serializes the live tree instead of
//! touching the interpreter.

use crate::command_parser::parse_command_line;
use core_actions::{execute_batch, ActionContext, ControlSignal};
use core_config::Config;
use core_events::{IpcBody, IpcReply};
use core_keymap::ModeTable;
use core_state::ContainerTree;
use core_terminal::DisplayBackend;

/// The result of handling one IPC request: the reply to send back, and any
/// control signal (`reload`/`restart`/`exit`) the caller must act on.
pub struct IpcOutcome {
    pub reply: IpcReply,
    pub control: ControlSignal,
}

/// A batch's replies fold into i3's own `run_command` convention: `success`
/// is true only if every command in the batch succeeded, and `error` carries
/// the first failure's message.
fn fold_batch(outcomes: Vec<core_actions::CommandOutcome>) -> (IpcReply, bool) {
    let mut fatal = false;
    let mut first_error = None;
    for outcome in &outcomes {
        fatal |= outcome.fatal;
        if !outcome.reply.success && first_error.is_none() {
            first_error = outcome.reply.error.clone();
        }
    }
    let success = first_error.is_none();
    (IpcReply { success, payload: None, error: first_error }, fatal)
}

pub fn handle(
    body: IpcBody,
    tree: &mut ContainerTree,
    config: &mut Config,
    modes: &mut ModeTable,
    backend: &mut dyn DisplayBackend,
) -> IpcOutcome {
    match body {
        IpcBody::RunCommand(text) => {
            let commands = match parse_command_line(&text) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(target: "ipc", error = %e, "run_command_parse_failed");
                    return IpcOutcome {
                        reply: IpcReply { success: false, payload: None, error: Some(e) },
                        control: ControlSignal::None,
                    };
                }
            };
            let mut ctx = ActionContext { tree, config, modes, backend };
            let (outcomes, control) = execute_batch(&mut ctx, &commands);
            let (reply, fatal) = fold_batch(outcomes);
            if fatal {
                tracing::error!(target: "ipc", "run_command_batch_had_fatal_outcome");
            }
            IpcOutcome { reply, control }
        }
        IpcBody::GetTree => {
            let reply = match core_state::to_json(tree) {
                Ok(json) => IpcReply { success: true, payload: Some(json), error: None },
                Err(e) => IpcReply { success: false, payload: None, error: Some(e.to_string()) },
            };
            IpcOutcome { reply, control: ControlSignal::None }
        }
        IpcBody::Subscribe(kinds) => {
            // Broadcast delivery (pushing unsolicited `Event`-shaped messages
            // back down this connection) is the bar binary's concern via its
            // own socket client; the dispatcher only acknowledges interest.
            tracing::debug!(target: "ipc", ?kinds, "subscribe_acknowledged");
            IpcOutcome {
                reply: IpcReply { success: true, payload: None, error: None },
                control: ControlSignal::None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::Config;
    use core_state::{Position, Role};
    use core_terminal::LoggingBackend;

    fn workspace_tree() -> ContainerTree {
        let mut tree = ContainerTree::new();
        let output = tree.create(Role::Output);
        tree.attach(output, tree.root(), Position::Last).unwrap();
        let content = tree.create(Role::Content);
        tree.attach(content, output, Position::Last).unwrap();
        let ws = tree.create(Role::Workspace);
        tree.get_mut(ws).unwrap().name = Some("1".into());
        tree.attach(ws, content, Position::Last).unwrap();
        tree.con_focus(ws).unwrap();
        tree
    }

    #[test]
    fn get_tree_returns_a_json_payload() {
        let mut tree = workspace_tree();
        let mut config = Config::default();
        let mut modes = ModeTable::new();
        let mut backend = LoggingBackend::default();
        let outcome = handle(IpcBody::GetTree, &mut tree, &mut config, &mut modes, &mut backend);
        assert!(outcome.reply.success);
        let payload = outcome.reply.payload.expect("tree json");
        assert!(payload.contains("Workspace"));
    }

    #[test]
    fn run_command_with_unparsable_text_fails_without_touching_the_tree() {
        let mut tree = workspace_tree();
        let mut config = Config::default();
        let mut modes = ModeTable::new();
        let mut backend = LoggingBackend::default();
        let outcome = handle(
            IpcBody::RunCommand("frobnicate".into()),
            &mut tree,
            &mut config,
            &mut modes,
            &mut backend,
        );
        assert!(!outcome.reply.success);
        assert!(matches!(outcome.control, ControlSignal::None));
    }

    #[test]
    fn run_command_workspace_switch_succeeds() {
        let mut tree = workspace_tree();
        let mut config = Config::default();
        let mut modes = ModeTable::new();
        let mut backend = LoggingBackend::default();
        let outcome = handle(
            IpcBody::RunCommand("workspace 2".into()),
            &mut tree,
            &mut config,
            &mut modes,
            &mut backend,
        );
        assert!(outcome.reply.success);
    }
}
