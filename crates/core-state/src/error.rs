//! Narrow tree-level error type. `core-actions` maps these onto the
//! top-level `WmError` kinds (§7); this crate has no opinion on JSON replies
//! or fatal/non-fatal classification.

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("node {0:?} not found")]
    NotFound(crate::NodeId),
    #[error("node {0:?} does not accept children of this role")]
    RoleMismatch(crate::NodeId),
    #[error("node {0:?} already has a parent")]
    AlreadyAttached(crate::NodeId),
    #[error("the root node cannot be detached or reparented")]
    RootImmutable,
    #[error("mark {0:?} is already held by another container")]
    DuplicateMark(String),
    #[error("resize would push a participant below the minimum share")]
    ResizeBelowMinimum,
    #[error("node {0:?} has no adjacent sibling along the requested axis")]
    NoResizeParticipant(crate::NodeId),
    #[error("tree invariant violated: {0}")]
    InvariantViolation(String),
}
