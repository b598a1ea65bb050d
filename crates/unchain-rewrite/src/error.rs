use unchain_tree::{NodeIndex, TreeError};

/// Failures that abort a transform.
///
/// Shapes the engine does not recognise are not errors; they are reported in
/// the [`TransformReport`](crate::TransformReport) and left in place.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("function '{function}' does not return a single-value producer")]
    NotEligible { function: String },

    #[error("rule {rule} hit an unexpected shape at {node:?}: {detail}")]
    StructuralViolation {
        rule: &'static str,
        node: NodeIndex,
        detail: String,
    },

    #[error("{pass} did not reach a fixed point within {limit} iterations")]
    IterationLimit { pass: &'static str, limit: usize },

    #[error("{0:?} is not part of the function being transformed")]
    DetachedNode(NodeIndex),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl RewriteError {
    pub(crate) fn violation(rule: &'static str, node: NodeIndex, detail: impl Into<String>) -> Self {
        RewriteError::StructuralViolation {
            rule,
            node,
            detail: detail.into(),
        }
    }
}
