//! Post-rewrite optimizer.
//!
//! Seven passes, each run to its own fixed point, in a fixed order. The
//! first six are the sources of name collisions; the seventh renames until
//! no block holds two bindings of one name.

mod exact_copies;
mod flatten_run;
mod let_return;
mod nullable_let;
mod redeclarations;
mod single_use;
mod useless_elvis;

pub use exact_copies::ExactCopies;
pub use flatten_run::FlattenRun;
pub use let_return::LetReturn;
pub use nullable_let::NullableLet;
pub use redeclarations::Redeclarations;
pub use single_use::SingleUse;
pub use useless_elvis::UselessElvis;

use crate::driver::{Rewrite, run_to_fixed_point};
use crate::error::RewriteError;
use crate::host::{Env, MutationScope};
use crate::report::OptimizerStats;
use tracing::debug;
use unchain_common::{limits, names};
use unchain_tree::binder::lexical_lookup;
use unchain_tree::{BinaryOp, LambdaParam, NodeArena, NodeIndex, NodeKind};

/// Run every enabled pass over `root`.
pub fn optimize(
    env: Env<'_>,
    arena: &mut NodeArena,
    scope: &mut dyn MutationScope,
    root: NodeIndex,
) -> Result<OptimizerStats, RewriteError> {
    let passes = &env.options.passes;
    let limit = env.options.iteration_limit.min(limits::MAX_PASS_ITERATIONS);
    let mut stats = OptimizerStats::default();
    if passes.flatten_run {
        stats.flattened_runs = run_pass(&mut FlattenRun::new(env), arena, scope, root, limit)?;
    }
    if passes.useless_elvis {
        stats.useless_elvis = run_pass(&mut UselessElvis::new(env), arena, scope, root, limit)?;
    }
    if passes.exact_copies {
        stats.exact_copies = run_pass(&mut ExactCopies, arena, scope, root, limit)?;
    }
    if passes.let_return {
        stats.let_returns = run_pass(&mut LetReturn::new(env), arena, scope, root, limit)?;
    }
    if passes.nullable_let {
        stats.nullable_lets = run_pass(&mut NullableLet::new(env), arena, scope, root, limit)?;
    }
    if passes.single_use {
        stats.single_use = run_pass(&mut SingleUse, arena, scope, root, limit)?;
    }
    if passes.redeclarations {
        stats.renamed = run_pass(&mut Redeclarations::new(env), arena, scope, root, limit)?;
    }
    Ok(stats)
}

fn run_pass<R: Rewrite>(
    pass: &mut R,
    arena: &mut NodeArena,
    scope: &mut dyn MutationScope,
    root: NodeIndex,
    limit: usize,
) -> Result<usize, RewriteError> {
    let applied = run_to_fixed_point(pass, arena, scope, root, limit)?;
    debug!(pass = R::NAME, applied, "optimizer pass");
    Ok(applied)
}

// =============================================================================
// Shared shape helpers
// =============================================================================

/// `receiver.let { p -> .. }` or `receiver?.let { .. }` with at most one
/// plain parameter.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LetShape {
    pub receiver: NodeIndex,
    pub lambda: NodeIndex,
    /// Declaration references to the lambda parameter link to: the `Param`,
    /// or the lambda itself for an implicit `it`.
    pub parameter: NodeIndex,
    pub safe: bool,
}

impl LetShape {
    pub fn of(arena: &NodeArena, expr: NodeIndex) -> Option<Self> {
        let (qualified, call) = arena.selector_call(expr)?;
        if call.callee != names::LET || call.target.as_ref().is_some_and(|t| t.is_mono_member()) {
            return None;
        }
        let [lambda] = call.args.as_slice() else {
            return None;
        };
        let data = arena.get_lambda(*lambda)?;
        let parameter = match data.params.as_slice() {
            [] => *lambda,
            [LambdaParam::Single(param)] => *param,
            _ => return None,
        };
        Some(Self {
            receiver: qualified.receiver,
            lambda: *lambda,
            parameter,
            safe: qualified.safe,
        })
    }

    pub fn body(&self, arena: &NodeArena) -> Vec<NodeIndex> {
        arena
            .get_lambda(self.lambda)
            .and_then(|l| arena.get_block(l.body))
            .map(|b| b.statements.clone())
            .unwrap_or_default()
    }

    /// Name the guard binding takes: the parameter's, or for `it` one
    /// suggested from the receiver.
    pub fn binding_name(&self, env: Env<'_>, arena: &NodeArena) -> String {
        match arena.get_param(self.parameter) {
            Some(param) => param.name.clone(),
            None => env.base_name(arena, self.receiver),
        }
    }
}

/// Whether the last statement of `statements` is a plain expression (not a
/// declaration and not a jump).
pub(crate) fn ends_in_expression(arena: &NodeArena, statements: &[NodeIndex]) -> bool {
    statements.last().is_some_and(|&last| {
        !matches!(
            arena.kind(last),
            Some(NodeKind::Property(_) | NodeKind::Destructuring(_) | NodeKind::Return(_)) | None
        )
    })
}

/// Whether every name inside `expr` would still resolve to the same
/// declaration if `expr` were moved to `at`.
pub(crate) fn names_survive_move(arena: &NodeArena, expr: NodeIndex, at: NodeIndex) -> bool {
    arena.descendants(expr).into_iter().all(|idx| {
        let Some(r) = arena.get_name_ref(idx) else {
            return true;
        };
        let is_selector = arena
            .get_qualified(arena.parent(idx))
            .is_some_and(|q| q.selector == idx);
        if is_selector || arena.is_within(r.binding, expr) {
            return true;
        }
        lexical_lookup(arena, at, &r.name) == r.binding
    })
}

/// Whether `node` is evaluated every time `statement` runs, before anything
/// else in `statement` that could observe a side effect.
pub(crate) fn is_first_unconditional_use(arena: &NodeArena, node: NodeIndex, statement: NodeIndex) -> bool {
    let mut child = node;
    for ancestor in arena.ancestors(node) {
        let unconditional = match arena.kind(ancestor) {
            Some(NodeKind::Lambda(_) | NodeKind::Try(_) | NodeKind::Block(_)) | None => false,
            Some(NodeKind::If(i)) => child == i.condition,
            Some(NodeKind::Binary(b)) => {
                child == b.left || !matches!(b.op, BinaryOp::Elvis | BinaryOp::And | BinaryOp::Or)
            }
            Some(NodeKind::Qualified(q)) => child == q.receiver || !q.safe,
            _ => true,
        };
        if !unconditional {
            return false;
        }
        if ancestor == statement {
            break;
        }
        child = ancestor;
    }
    if !arena.is_within(node, statement) {
        return false;
    }
    // No call may run before `node` is evaluated.
    for idx in arena.descendants(statement) {
        if idx == node {
            return true;
        }
        let is_call = arena.get_call(idx).is_some();
        if is_call && !arena.is_within(node, idx) && !inside_lambda(arena, idx, statement) {
            return false;
        }
    }
    false
}

fn inside_lambda(arena: &NodeArena, idx: NodeIndex, statement: NodeIndex) -> bool {
    arena
        .ancestors(idx)
        .take_while(|&a| a != statement)
        .any(|a| arena.get_lambda(a).is_some())
}
