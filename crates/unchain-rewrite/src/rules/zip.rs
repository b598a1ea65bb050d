//! `zip` rules: fork every operand, join, then combine only when all
//! values are present.

use super::{CallParts, bound_ref, declare, declare_named, finish, relabel_returns};
use crate::catalog::CombinatorKind;
use crate::context::RewriteContext;
use crate::error::RewriteError;
use crate::host::Env;
use smallvec::SmallVec;
use unchain_common::names;
use unchain_tree::{BinaryOp, LambdaParam, Literal, NodeArena, NodeIndex, NodeKind};

/// A combiner is a two-parameter lambda or a reference to a callable.
pub(super) fn is_combiner(arena: &NodeArena, node: NodeIndex) -> bool {
    match arena.kind(node) {
        Some(NodeKind::Lambda(l)) => {
            l.params.len() == 2 && l.params.iter().all(|p| matches!(p, LambdaParam::Single(_)))
        }
        Some(NodeKind::NameRef(_)) => true,
        _ => false,
    }
}

/// ```text
/// val async = async { p1.await() }
/// val async = async { p2.await() }
/// val p1 = async.await()
/// val p2 = async.await()
/// val x = if (p1 != null && p2 != null) Pair(p1, p2).let { (a, b) -> .. } else null
/// ```
///
/// Every operand starts before any is joined. Zip3 combines with
/// `Tuples.of(p1, p2, p3)` instead of a combiner.
pub(super) fn zip(env: Env<'_>, arena: &mut NodeArena, ctx: &RewriteContext) -> Result<(), RewriteError> {
    let parts = CallParts::expect(arena, ctx)?;
    let (operand_count, combiner) = match ctx.kind {
        CombinatorKind::Zip2 => (2, Some(parts.arg(ctx, 2)?)),
        _ => (3, None),
    };

    let mut tasks: SmallVec<[(NodeIndex, NodeIndex); 3]> = SmallVec::new();
    for index in 0..operand_count {
        let operand = parts.arg(ctx, index)?;
        let safe = env.is_nullable(arena, operand);
        arena.detach(operand)?;
        let awaited = arena.add_method_call(operand, env.options.await_function.as_str(), Vec::new(), safe);
        let body = arena.add_block(vec![awaited]);
        let lambda = arena.add_lambda(Vec::new(), body, None);
        let launch = arena.add_call(names::ASYNC, vec![lambda], None);
        let task = declare(env, arena, ctx.anchor, launch)?;
        tasks.push((task, operand));
    }

    let mut values: SmallVec<[NodeIndex; 3]> = SmallVec::new();
    for &(task, operand) in &tasks {
        let name = env.base_name(arena, operand);
        let handle = bound_ref(arena, task);
        let joined = arena.add_method_call(handle, names::AWAIT, Vec::new(), false);
        values.push(declare_named(arena, ctx.anchor, name, joined)?);
    }

    let mut condition = NodeIndex::NONE;
    for &value in &values {
        let reference = bound_ref(arena, value);
        let null = arena.add_literal(Literal::Null);
        let present = arena.add_binary(reference, BinaryOp::NotEq, null);
        condition = if condition.is_none() {
            present
        } else {
            arena.add_binary(condition, BinaryOp::And, present)
        };
    }

    let args: Vec<NodeIndex> = values.iter().map(|&v| bound_ref(arena, v)).collect();
    let combined = match combiner {
        Some(combiner) if arena.get_lambda(combiner).is_some() => {
            relabel_returns(arena, combiner, names::LET);
            arena.detach(combiner)?;
            arena.destructure_lambda_params(combiner)?;
            let pair = arena.add_call(env.options.pair_constructor.as_str(), args, None);
            arena.add_method_call(pair, names::LET, vec![combiner], false)
        }
        Some(combiner) => {
            let callee = arena
                .get_name_ref(combiner)
                .map(|r| r.name.clone())
                .ok_or_else(|| RewriteError::violation(ctx.kind.name(), combiner, "combiner is not callable"))?;
            arena.add_call(callee, args, None)
        }
        None => {
            let factory = arena.add_name_ref(env.options.tuple_factory.as_str(), NodeIndex::NONE);
            let of = arena.add_call("of", args, None);
            arena.add_qualified(factory, of, false)
        }
    };
    let null = arena.add_literal(Literal::Null);
    let choice = arena.add_if(condition, combined, null);
    let result = declare_named(arena, ctx.anchor, ctx.name.clone(), choice)?;
    let reference = bound_ref(arena, result);
    finish(arena, ctx, reference)
}
