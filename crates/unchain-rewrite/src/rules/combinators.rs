//! Rules for the catalog combinators that take one receiver.

use super::{
    CallParts, bound_ref, declare, declare_named, finish, process_lambda, redeclare, relabel_returns, simple,
    take_awaited,
};
use crate::catalog::{self, CombinatorKind};
use crate::context::RewriteContext;
use crate::error::RewriteError;
use crate::host::Env;
use tracing::trace;
use unchain_common::names;
use unchain_tree::{BinaryOp, Literal, NodeArena, NodeIndex};

/// `val a = recv.await()` before the anchor.
fn await_receiver(env: Env<'_>, arena: &mut NodeArena, ctx: &RewriteContext, parts: &CallParts) -> Result<NodeIndex, RewriteError> {
    let receiver = parts.receiver(ctx)?;
    let awaited = take_awaited(env, arena, receiver)?;
    declare(env, arena, ctx.anchor, awaited)
}

/// `value?.let(f)`, with `f` moved out of the original call.
fn let_on(arena: &mut NodeArena, value: NodeIndex, f: NodeIndex) -> Result<NodeIndex, RewriteError> {
    relabel_returns(arena, f, names::LET);
    arena.detach(f)?;
    let receiver = bound_ref(arena, value);
    Ok(arena.add_method_call(receiver, names::LET, vec![f], true))
}

/// `map(f)`: `val a = recv.await(); val x = a?.let(f)`
pub(super) fn map(env: Env<'_>, arena: &mut NodeArena, ctx: &RewriteContext) -> Result<(), RewriteError> {
    let parts = CallParts::expect(arena, ctx)?;
    let f = parts.arg(ctx, 0)?;
    let value = await_receiver(env, arena, ctx, &parts)?;
    let mapped = let_on(arena, value, f)?;
    let result = declare_named(arena, ctx.anchor, ctx.name.clone(), mapped)?;
    let reference = bound_ref(arena, result);
    finish(arena, ctx, reference)
}

/// `flatMap(f)`: as `map`, then the lambda's own values are awaited.
pub(super) fn flat_map(env: Env<'_>, arena: &mut NodeArena, ctx: &RewriteContext) -> Result<(), RewriteError> {
    let parts = CallParts::expect(arena, ctx)?;
    let f = parts.arg(ctx, 0)?;
    let value = await_receiver(env, arena, ctx, &parts)?;
    let mapped = let_on(arena, value, f)?;
    let result = declare_named(arena, ctx.anchor, ctx.name.clone(), mapped)?;
    process_lambda(env, arena, f, ctx.kind.name())?;
    let reference = bound_ref(arena, result);
    finish(arena, ctx, reference)
}

/// `filter(p)` / `filterWhen(p)`:
/// `val a = recv.await(); val let = a?.let(p); val x = if (let == true) a else null`
pub(super) fn filter(env: Env<'_>, arena: &mut NodeArena, ctx: &RewriteContext, awaits_predicate: bool) -> Result<(), RewriteError> {
    let parts = CallParts::expect(arena, ctx)?;
    let predicate = parts.arg(ctx, 0)?;
    let value = await_receiver(env, arena, ctx, &parts)?;
    let tested = let_on(arena, value, predicate)?;
    let passes = declare(env, arena, ctx.anchor, tested)?;
    if awaits_predicate {
        process_lambda(env, arena, predicate, ctx.kind.name())?;
    }
    let flag = bound_ref(arena, passes);
    let yes = arena.add_literal(Literal::Bool(true));
    let condition = arena.add_binary(flag, BinaryOp::Eq, yes);
    let kept = bound_ref(arena, value);
    let dropped = arena.add_literal(Literal::Null);
    let choice = arena.add_if(condition, kept, dropped);
    let result = declare_named(arena, ctx.anchor, ctx.name.clone(), choice)?;
    let reference = bound_ref(arena, result);
    finish(arena, ctx, reference)
}

/// `switchIfEmpty(alt)`:
/// `val a = recv.await(); val x = if (a != null) { val just = Mono.just(a); just } else { alt }`
///
/// The reference moves to the new `x`, which the next iteration lifts as an
/// `if` initializer.
pub(super) fn switch_if_empty(env: Env<'_>, arena: &mut NodeArena, ctx: &RewriteContext) -> Result<(), RewriteError> {
    let parts = CallParts::expect(arena, ctx)?;
    let alternative = parts.arg(ctx, 0)?;
    let value = await_receiver(env, arena, ctx, &parts)?;

    let producer = &env.options.producer_type;
    let owner = arena.add_name_ref(simple(producer), NodeIndex::NONE);
    let argument = bound_ref(arena, value);
    let just_target = catalog::signature(CombinatorKind::Just).map(|s| s.method_ref(producer));
    let just_call = arena.add_call("just", vec![argument], just_target);
    let just = arena.add_qualified(owner, just_call, false);
    let just_name = env.base_name(arena, just);
    let just_binding = arena.add_property(just_name, false, None, just);
    let just_ref = bound_ref(arena, just_binding);
    let then_branch = arena.add_block(vec![just_binding, just_ref]);

    arena.detach(alternative)?;
    let else_branch = arena.add_block(vec![alternative]);
    let present = bound_ref(arena, value);
    let null = arena.add_literal(Literal::Null);
    let condition = arena.add_binary(present, BinaryOp::NotEq, null);
    let choice = arena.add_if(condition, then_branch, else_branch);
    let result = declare_named(arena, ctx.anchor, ctx.name.clone(), choice)?;
    redeclare(arena, ctx, result)
}

/// `thenReturn(v)`: `recv.await(); v`
pub(super) fn then_return(env: Env<'_>, arena: &mut NodeArena, ctx: &RewriteContext) -> Result<(), RewriteError> {
    let parts = CallParts::expect(arena, ctx)?;
    let value = parts.arg(ctx, 0)?;
    let receiver = parts.receiver(ctx)?;
    let awaited = take_awaited(env, arena, receiver)?;
    arena.insert_before(ctx.anchor, awaited)?;
    arena.detach(value)?;
    finish(arena, ctx, value)
}

/// `then(other)`: `recv.await(); val x = other`, continuing on `x`.
pub(super) fn then(env: Env<'_>, arena: &mut NodeArena, ctx: &RewriteContext) -> Result<(), RewriteError> {
    let parts = CallParts::expect(arena, ctx)?;
    let other = parts.arg(ctx, 0)?;
    let receiver = parts.receiver(ctx)?;
    let awaited = take_awaited(env, arena, receiver)?;
    arena.insert_before(ctx.anchor, awaited)?;
    arena.detach(other)?;
    let result = declare_named(arena, ctx.anchor, ctx.name.clone(), other)?;
    redeclare(arena, ctx, result)
}

/// `defer { s }`: `val x = run { s }`, continuing on `x`.
pub(super) fn defer(_env: Env<'_>, arena: &mut NodeArena, ctx: &RewriteContext) -> Result<(), RewriteError> {
    let parts = CallParts::expect(arena, ctx)?;
    let supplier = parts.arg(ctx, 0)?;
    relabel_returns(arena, supplier, names::RUN);
    arena.detach(supplier)?;
    let run = arena.add_call(names::RUN, vec![supplier], None);
    let result = declare_named(arena, ctx.anchor, ctx.name.clone(), run)?;
    redeclare(arena, ctx, result)
}

/// `just(v)` / `justOrEmpty(v)`: `v`
pub(super) fn just(arena: &mut NodeArena, ctx: &RewriteContext) -> Result<(), RewriteError> {
    let parts = CallParts::expect(arena, ctx)?;
    let value = parts.arg(ctx, 0)?;
    arena.detach(value)?;
    trace!(value = value.0, "inlining just");
    finish(arena, ctx, value)
}

/// `empty()`: `null`
pub(super) fn empty(arena: &mut NodeArena, ctx: &RewriteContext) -> Result<(), RewriteError> {
    let null = arena.add_literal(Literal::Null);
    finish(arena, ctx, null)
}
