//! What a transform did.

use crate::catalog::CombinatorKind;
use serde::Serialize;
use unchain_common::diagnostics::Diagnostic;
use unchain_tree::NodeIndex;

/// One successful rule application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedRewrite {
    pub kind: CombinatorKind,
    pub binding: String,
}

/// Why an awaited reference was left in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum UnresolvedReason {
    /// The binding is referenced more than once.
    SharedProducer { references: usize },
    /// The initializer calls a producer method with no rule.
    UnsupportedCombinator { method: String },
    /// The initializer matched a rule but its arguments did not fit.
    RuleNotApplicable { kind: CombinatorKind },
    /// An await whose receiver is not a name still contains a combinator.
    UnliftedAwait { method: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedReference {
    pub reference: NodeIndex,
    pub binding: String,
    #[serde(flatten)]
    pub reason: UnresolvedReason,
}

/// Applications per optimizer pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerStats {
    pub flattened_runs: usize,
    pub useless_elvis: usize,
    pub exact_copies: usize,
    pub let_returns: usize,
    pub nullable_lets: usize,
    pub single_use: usize,
    pub renamed: usize,
}

impl OptimizerStats {
    pub fn total(&self) -> usize {
        self.flattened_runs
            + self.useless_elvis
            + self.exact_copies
            + self.let_returns
            + self.nullable_lets
            + self.single_use
            + self.renamed
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformReport {
    pub function: String,
    /// Whether the body was wrapped in the coroutine builder by this run.
    pub wrapped: bool,
    /// Producer expressions introduced as bindings before lifting.
    pub extracted: usize,
    /// Driver iterations, one per applied rule.
    pub iterations: usize,
    pub applied: Vec<AppliedRewrite>,
    pub unresolved: Vec<UnresolvedReference>,
    pub optimizer: OptimizerStats,
    pub diagnostics: Vec<Diagnostic>,
}

impl TransformReport {
    /// No awaited reference was left behind for lack of a rule.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}
