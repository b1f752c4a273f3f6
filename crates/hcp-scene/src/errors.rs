use thiserror::Error;

use crate::ids::NodeId;
use crate::reflect::MemberKind;

/// Errors raised while mutating or building a scene.
#[derive(Debug, Error)]
pub enum SceneError {
    /// The referenced node does not exist (or was destroyed).
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    /// A node may carry at most one sticky tag.
    #[error("node '{name}' already carries sticky tag {existing}")]
    DuplicateSticky {
        /// Name of the offending node.
        name: String,
        /// Rendered id of the tag already attached.
        existing: String,
    },
    /// The scene description could not be decoded.
    #[error("invalid scene description: {0}")]
    Description(#[from] serde_json::Error),
    /// The description selected a path that does not exist.
    #[error("selected path '{0}' does not exist")]
    UnknownSelection(String),
}

/// A reflection call named a member the unit type does not expose.
#[derive(Debug, Error)]
#[error("{type_name} does not expose {kind} '{member}'")]
pub struct ReflectError {
    /// Member kind that was requested.
    pub kind: MemberKind,
    /// Unit type the call was made against.
    pub type_name: String,
    /// Requested member name.
    pub member: String,
}
