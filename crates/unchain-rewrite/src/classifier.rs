//! Binding classifier.
//!
//! Matchers run in a fixed order and the first hit wins. Elvis comes before
//! the catalog because an elvis initializer is also a binary expression the
//! catalog would otherwise inspect.

use crate::catalog::{self, CombinatorKind};
use crate::host::{Env, SymbolResolver};
use tracing::trace;
use unchain_common::names;
use unchain_tree::{BinaryOp, MethodRef, NodeArena, NodeIndex, NodeKind};

type Matcher = fn(&Classifier<'_>, &NodeArena, NodeIndex) -> Option<CombinatorKind>;

const MATCHERS: &[(&str, Matcher)] = &[
    ("elvis", match_elvis),
    ("let", match_let),
    ("run", match_run),
    ("if", match_if),
    ("alias", match_alias),
    ("catalog", match_catalog),
];

pub struct Classifier<'a> {
    resolver: &'a dyn SymbolResolver,
    producer_type: &'a str,
}

impl<'a> Classifier<'a> {
    pub fn new(env: &Env<'a>) -> Self {
        Self {
            resolver: env.resolver,
            producer_type: &env.options.producer_type,
        }
    }

    /// Classify the initializer of a `Property` binding.
    pub fn classify_binding(&self, arena: &NodeArena, binding: NodeIndex) -> Option<CombinatorKind> {
        let initializer = arena.get_property(binding)?.initializer;
        self.classify(arena, initializer)
    }

    pub fn classify(&self, arena: &NodeArena, initializer: NodeIndex) -> Option<CombinatorKind> {
        for (name, matcher) in MATCHERS {
            if let Some(kind) = matcher(self, arena, initializer) {
                trace!(matcher = name, ?kind, initializer = initializer.0, "classified");
                return Some(kind);
            }
        }
        trace!(initializer = initializer.0, "no matcher");
        None
    }

    /// Resolved target of `expr` when it is a call owned by the producer type.
    pub fn producer_method(&self, arena: &NodeArena, expr: NodeIndex) -> Option<MethodRef> {
        self.resolver
            .resolve_call(arena, expr)
            .filter(|m| m.owner == self.producer_type)
    }
}

fn match_elvis(_classifier: &Classifier<'_>, arena: &NodeArena, init: NodeIndex) -> Option<CombinatorKind> {
    let binary = arena.get_binary(init)?;
    (binary.op == BinaryOp::Elvis).then_some(CombinatorKind::Elvis)
}

/// `x.let { }` / `x?.let { }`
fn match_let(classifier: &Classifier<'_>, arena: &NodeArena, init: NodeIndex) -> Option<CombinatorKind> {
    let (_, call) = arena.selector_call(init)?;
    let is_let = call.callee == names::LET && single_lambda_arg(arena, &call.args);
    (is_let && classifier.producer_method(arena, init).is_none()).then_some(CombinatorKind::LetBlock)
}

/// `run { }`
fn match_run(classifier: &Classifier<'_>, arena: &NodeArena, init: NodeIndex) -> Option<CombinatorKind> {
    let call = arena.get_call(init)?;
    let is_run = call.callee == names::RUN && single_lambda_arg(arena, &call.args);
    (is_run && classifier.producer_method(arena, init).is_none()).then_some(CombinatorKind::RunBlock)
}

fn match_if(_classifier: &Classifier<'_>, arena: &NodeArena, init: NodeIndex) -> Option<CombinatorKind> {
    let data = arena.get_if(init)?;
    data.else_branch.is_some().then_some(CombinatorKind::IfExpr)
}

fn match_alias(_classifier: &Classifier<'_>, arena: &NodeArena, init: NodeIndex) -> Option<CombinatorKind> {
    matches!(arena.kind(init), Some(NodeKind::NameRef(_))).then_some(CombinatorKind::SimpleAlias)
}

fn match_catalog(classifier: &Classifier<'_>, arena: &NodeArena, init: NodeIndex) -> Option<CombinatorKind> {
    let method = classifier.producer_method(arena, init)?;
    catalog::classify(&method, classifier.producer_type)
}

fn single_lambda_arg(arena: &NodeArena, args: &[NodeIndex]) -> bool {
    matches!(args, [only] if arena.get_lambda(*only).is_some())
}

#[cfg(test)]
#[path = "tests/classifier_tests.rs"]
mod tests;
