use crate::node::NodeIndex;

/// Structural misuse of the mutation API.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("node {0:?} does not exist")]
    Missing(NodeIndex),
    #[error("node {0:?} has no parent")]
    Detached(NodeIndex),
    #[error("node {node:?} is already owned by {owner:?}")]
    AlreadyOwned { node: NodeIndex, owner: NodeIndex },
    #[error("node {child:?} is not held by {parent:?}")]
    NotAChild { parent: NodeIndex, child: NodeIndex },
    #[error("node {0:?} is not a statement of a block")]
    NotAStatement(NodeIndex),
    #[error("node {0:?} is not a {1}")]
    WrongKind(NodeIndex, &'static str),
}
