//! Tree construction at process start: restore from a persisted layout
//! (§6 "Persisted state", §9 "Tree rebuild on restart") if one exists,
//! otherwise synthesize the minimal tree an output needs before any window
//! has mapped (one `Output` → one `Content` → workspace `"1"`).

use core_state::{ContainerTree, Position, Role};
use std::path::Path;

pub fn build_default_tree() -> ContainerTree {
    let mut tree = ContainerTree::new();
    let output = tree.create(Role::Output);
    tree.attach(output, tree.root(), Position::Last).expect("root accepts an output");
    let content = tree.create(Role::Content);
    tree.attach(content, output, Position::Last).expect("output accepts content");
    let ws = tree.create(Role::Workspace);
    tree.get_mut(ws).expect("just created").name = Some("1".to_string());
    tree.attach(ws, content, Position::Last).expect("content accepts a workspace");
    tree.con_focus(ws).expect("workspace is always focusable");
    tree
}

/// Load the tree from `path` if it holds valid persisted JSON, otherwise
/// build the default single-workspace tree. A corrupt persisted file is
/// logged and treated the same as "absent" rather than aborting startup —
/// the same resilience policy `core_config::load_from` applies to the
/// config file.
pub fn load_or_default(path: &Path) -> ContainerTree {
    match std::fs::read_to_string(path) {
        Ok(data) => match core_state::from_json(&data) {
            Ok(tree) => {
                tracing::info!(target: "runtime.startup", path = %path.display(), "tree_restored");
                tree
            }
            Err(e) => {
                tracing::warn!(target: "runtime.startup", path = %path.display(), error = %e, "tree_restore_failed_using_default");
                build_default_tree()
            }
        },
        Err(_) => build_default_tree(),
    }
}

/// Best-effort serialization to `path`, used both for a clean `restart` and
/// as the final step before a fatal error exits the process (§7: "a
/// best-effort tree serialization is attempted first").
pub fn persist(tree: &ContainerTree, path: &Path) {
    match core_state::to_json(tree) {
        Ok(json) => {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Err(e) = std::fs::write(path, json) {
                tracing::error!(target: "runtime.shutdown", error = %e, "tree_persist_failed");
            }
        }
        Err(e) => tracing::error!(target: "runtime.shutdown", error = %e, "tree_serialize_failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tree_has_one_focused_workspace() {
        let tree = build_default_tree();
        assert_eq!(tree.outputs().len(), 1);
        let focused = tree.focused.expect("a workspace is focused at startup");
        assert_eq!(tree.get(focused).unwrap().role, Role::Workspace);
    }

    #[test]
    fn persist_then_load_round_trips_the_default_tree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.json");
        let tree = build_default_tree();
        persist(&tree, &path);
        let restored = load_or_default(&path);
        assert_eq!(restored.outputs().len(), 1);
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let tree = load_or_default(Path::new("/nonexistent/wm-tree-test.json"));
        assert_eq!(tree.outputs().len(), 1);
    }
}
