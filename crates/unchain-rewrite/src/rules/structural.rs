//! Structural rules: the binding stays, its initializer becomes a value.

use super::{await_in_place, bound_ref};
use crate::context::RewriteContext;
use crate::error::RewriteError;
use crate::host::Env;
use unchain_common::limits::MAX_TREE_DEPTH;
use unchain_tree::{NodeArena, NodeIndex, NodeKind};

/// `val x = a ?: b` → `val x = a?.await() ?: b?.await()`
pub(super) fn elvis(env: Env<'_>, arena: &mut NodeArena, ctx: &RewriteContext) -> Result<(), RewriteError> {
    let Some(binary) = arena.get_binary(ctx.initializer) else {
        return Err(RewriteError::violation("elvis", ctx.initializer, "initializer is not an elvis"));
    };
    let (left, right) = (binary.left, binary.right);
    for side in [left, right] {
        if !env.is_direct_value(arena, side) {
            await_in_place(env, arena, side, true)?;
        }
    }
    finish_in_place(env, arena, ctx)
}

/// `val x = a?.let { .. }` and `val x = run { .. }`: await every value the
/// lambda yields.
pub(super) fn scope_block(env: Env<'_>, arena: &mut NodeArena, ctx: &RewriteContext) -> Result<(), RewriteError> {
    let rule = ctx.kind.name();
    let lambda = super::CallParts::of(arena, ctx.initializer)
        .and_then(|parts| parts.args.last().copied())
        .filter(|&l| arena.get_lambda(l).is_some())
        .ok_or_else(|| RewriteError::violation(rule, ctx.initializer, "no lambda argument"))?;
    process_lambda(env, arena, lambda, rule)?;
    finish_in_place(env, arena, ctx)
}

/// `val x = if (c) a else b`: await the value of each branch.
pub(super) fn if_expr(env: Env<'_>, arena: &mut NodeArena, ctx: &RewriteContext) -> Result<(), RewriteError> {
    process_if(env, arena, ctx.initializer, 0)?;
    finish_in_place(env, arena, ctx)
}

/// `val x = y` → `val x = y.await()`
pub(super) fn alias(env: Env<'_>, arena: &mut NodeArena, ctx: &RewriteContext) -> Result<(), RewriteError> {
    await_in_place(env, arena, ctx.initializer, false)?;
    finish_in_place(env, arena, ctx)
}

/// Replace the awaited reference with a plain reference to the binding,
/// whose declared producer type (if any) becomes the nullable value type.
fn finish_in_place(env: Env<'_>, arena: &mut NodeArena, ctx: &RewriteContext) -> Result<(), RewriteError> {
    if let Some(ty) = arena.get_property(ctx.binding).and_then(|p| p.ty.clone()) {
        let value_type = if env.options.is_extractable(&ty.name) {
            ty.args.first().cloned().map(|t| t.nullable())
        } else {
            Some(ty)
        };
        arena.set_property_type(ctx.binding, value_type);
    }
    let reference = bound_ref(arena, ctx.binding);
    arena.replace(ctx.awaited, reference)?;
    Ok(())
}

/// Await every value position of `lambda`: the operand of each return that
/// leaves it, and its trailing expression.
///
/// An empty body or a trailing declaration means the lambda yields nothing
/// awaitable, which no classified shape should produce.
pub(crate) fn process_lambda(
    env: Env<'_>,
    arena: &mut NodeArena,
    lambda: NodeIndex,
    rule: &'static str,
) -> Result<(), RewriteError> {
    let Some(body) = arena.get_lambda(lambda).map(|l| l.body) else {
        return Err(RewriteError::violation(rule, lambda, "not a lambda"));
    };
    for ret in arena.returns_targeting(lambda) {
        let value = arena.get_return(ret).map_or(NodeIndex::NONE, |r| r.value);
        if value.is_some() && !env.is_direct_value(arena, value) {
            await_in_place(env, arena, value, false)?;
        }
    }
    process_block_value(env, arena, body, rule, 0)
}

/// Await the value a block yields: its trailing expression, unless it jumps.
fn process_block_value(
    env: Env<'_>,
    arena: &mut NodeArena,
    block: NodeIndex,
    rule: &'static str,
    depth: u32,
) -> Result<(), RewriteError> {
    let Some(&last) = arena.get_block(block).and_then(|b| b.statements.last()) else {
        return Err(RewriteError::violation(rule, block, "block is empty"));
    };
    match arena.kind(last) {
        Some(NodeKind::Return(_)) => Ok(()),
        Some(NodeKind::Property(_) | NodeKind::Destructuring(_)) => {
            Err(RewriteError::violation(rule, last, "block ends in a declaration"))
        }
        Some(NodeKind::If(_)) => process_if(env, arena, last, depth + 1),
        _ => {
            if !env.is_direct_value(arena, last) {
                await_in_place(env, arena, last, false)?;
            }
            Ok(())
        }
    }
}

fn process_if(env: Env<'_>, arena: &mut NodeArena, node: NodeIndex, depth: u32) -> Result<(), RewriteError> {
    if depth > MAX_TREE_DEPTH {
        return Err(RewriteError::violation("if", node, "if chain too deep"));
    }
    let Some(data) = arena.get_if(node) else {
        return Err(RewriteError::violation("if", node, "not an if expression"));
    };
    let (then_branch, else_branch) = (data.then_branch, data.else_branch);
    if else_branch.is_none() {
        return Err(RewriteError::violation("if", node, "if without else yields no value"));
    }
    for branch in [then_branch, else_branch] {
        process_branch(env, arena, branch, depth)?;
    }
    Ok(())
}

/// Await the value of one `if` branch. Expression branches become blocks so
/// the awaited producer keeps its own anchor inside the branch.
fn process_branch(env: Env<'_>, arena: &mut NodeArena, branch: NodeIndex, depth: u32) -> Result<(), RewriteError> {
    if arena.get_if(branch).is_some() {
        return process_if(env, arena, branch, depth + 1);
    }
    if arena.get_block(branch).is_some() {
        return process_block_value(env, arena, branch, "if", depth);
    }
    if !env.is_direct_value(arena, branch) {
        arena.wrap(branch, |arena, branch| arena.add_block(vec![branch]))?;
        await_in_place(env, arena, branch, false)?;
    }
    Ok(())
}
