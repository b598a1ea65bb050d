use crate::catalog::CombinatorKind;
use unchain_tree::NodeIndex;

/// Everything one rule application needs. Built from a fresh scan and
/// discarded once the rule has run.
#[derive(Clone, Debug)]
pub struct RewriteContext {
    /// Function being transformed.
    pub root: NodeIndex,
    /// The name reference being eliminated.
    pub reference: NodeIndex,
    /// `reference.await()`, the expression the rule replaces.
    pub awaited: NodeIndex,
    /// Declaration `reference` resolves to.
    pub binding: NodeIndex,
    pub name: String,
    pub initializer: NodeIndex,
    /// Statement new statements are spliced before.
    pub anchor: NodeIndex,
    /// Block holding `anchor`.
    pub block: NodeIndex,
    pub kind: CombinatorKind,
}
