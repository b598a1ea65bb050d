//! Rewrite rule library: one rule per [`CombinatorKind`].
//!
//! Every rule turns `binding.await()` into direct code. Structural rules
//! (elvis, let, run, if, alias) rewrite the binding's initializer into value
//! form and keep the binding. The others splice fresh bindings before the
//! anchor, replace the awaited reference, and delete the original binding.
//!
//! Fresh bindings take the suggester's base name; collisions are left for
//! the optimizer's renaming pass.

mod combinators;
mod errors;
mod structural;
mod zip;

use crate::catalog::CombinatorKind;
use crate::context::RewriteContext;
use crate::error::RewriteError;
use crate::host::Env;
use unchain_common::names;
use unchain_tree::{NodeArena, NodeIndex, NodeKind};

pub(crate) use structural::process_lambda;

/// Read-only check that the binding's arguments have the shape the rule
/// expects. A `false` here is a match failure, not an error.
pub fn shape_ok(arena: &NodeArena, ctx: &RewriteContext) -> bool {
    use CombinatorKind::*;
    let Some(parts) = CallParts::of(arena, ctx.initializer) else {
        return ctx.kind.is_structural();
    };
    let arg = |i: usize| parts.args.get(i).copied().unwrap_or(NodeIndex::NONE);
    let is_lambda = |i: usize| arena.get_lambda(arg(i)).is_some();
    let arity = parts.args.len();
    let has_receiver = parts.receiver.is_some();
    match ctx.kind {
        Elvis | LetBlock | RunBlock | IfExpr | SimpleAlias => true,
        Map | Filter | SwitchIfEmpty | ThenReturn | Then => has_receiver && arity == 1,
        FlatMap | FlatMapMany | FilterWhen => has_receiver && arity == 1 && is_lambda(0),
        OnErrorReturnAny => has_receiver && arity == 1,
        OnErrorReturnTyped => {
            has_receiver && arity == 2 && matches!(arena.kind(arg(0)), Some(NodeKind::ClassLiteral(_)))
        }
        Defer => arity == 1 && arena.get_lambda(arg(0)).is_some_and(|l| l.params.is_empty()),
        Just | JustOrEmpty => arity == 1,
        Empty => arity == 0,
        Zip2 => arity == 3 && zip::is_combiner(arena, arg(2)),
        Zip3 => arity == 3,
    }
}

/// Apply the rule for `ctx.kind`. Callers run [`shape_ok`] first; a shape
/// mismatch here is a [`RewriteError::StructuralViolation`].
pub fn apply(env: Env<'_>, arena: &mut NodeArena, ctx: &RewriteContext) -> Result<(), RewriteError> {
    use CombinatorKind::*;
    match ctx.kind {
        Elvis => structural::elvis(env, arena, ctx),
        LetBlock | RunBlock => structural::scope_block(env, arena, ctx),
        IfExpr => structural::if_expr(env, arena, ctx),
        SimpleAlias => structural::alias(env, arena, ctx),
        Map => combinators::map(env, arena, ctx),
        FlatMap | FlatMapMany => combinators::flat_map(env, arena, ctx),
        Filter => combinators::filter(env, arena, ctx, false),
        FilterWhen => combinators::filter(env, arena, ctx, true),
        SwitchIfEmpty => combinators::switch_if_empty(env, arena, ctx),
        ThenReturn => combinators::then_return(env, arena, ctx),
        Then => combinators::then(env, arena, ctx),
        Defer => combinators::defer(env, arena, ctx),
        Just | JustOrEmpty => combinators::just(arena, ctx),
        Empty => combinators::empty(arena, ctx),
        OnErrorReturnTyped => errors::on_error_return(env, arena, ctx, true),
        OnErrorReturnAny => errors::on_error_return(env, arena, ctx, false),
        Zip2 | Zip3 => zip::zip(env, arena, ctx),
    }
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Receiver and arguments of a bare or qualified call. Static calls have no
/// receiver.
struct CallParts {
    receiver: NodeIndex,
    args: Vec<NodeIndex>,
}

impl CallParts {
    fn of(arena: &NodeArena, expr: NodeIndex) -> Option<Self> {
        match arena.kind(expr)? {
            NodeKind::Call(call) => Some(Self {
                receiver: NodeIndex::NONE,
                args: call.args.clone(),
            }),
            NodeKind::Qualified(q) => {
                let call = arena.get_call(q.selector)?;
                let is_static = call.target.as_ref().is_some_and(|t| t.is_static);
                Some(Self {
                    receiver: if is_static { NodeIndex::NONE } else { q.receiver },
                    args: call.args.clone(),
                })
            }
            _ => None,
        }
    }

    fn expect(arena: &NodeArena, ctx: &RewriteContext) -> Result<Self, RewriteError> {
        Self::of(arena, ctx.initializer)
            .ok_or_else(|| RewriteError::violation(ctx.kind.name(), ctx.initializer, "initializer is not a call"))
    }

    fn arg(&self, ctx: &RewriteContext, index: usize) -> Result<NodeIndex, RewriteError> {
        self.args
            .get(index)
            .copied()
            .ok_or_else(|| RewriteError::violation(ctx.kind.name(), ctx.initializer, format!("missing argument {index}")))
    }

    fn receiver(&self, ctx: &RewriteContext) -> Result<NodeIndex, RewriteError> {
        if self.receiver.is_none() {
            return Err(RewriteError::violation(ctx.kind.name(), ctx.initializer, "missing receiver"));
        }
        Ok(self.receiver)
    }
}

/// `node.await()` / `node?.await()`; `node` must be unowned.
fn await_node(env: Env<'_>, arena: &mut NodeArena, node: NodeIndex, safe: bool) -> NodeIndex {
    arena.add_method_call(node, env.options.await_function.as_str(), Vec::new(), safe)
}

/// Await `node` where it stands. Safe-call form when it is nullable.
fn await_in_place(env: Env<'_>, arena: &mut NodeArena, node: NodeIndex, force_safe: bool) -> Result<(), RewriteError> {
    let safe = force_safe || env.is_nullable(arena, node);
    arena.wrap(node, |arena, node| await_node(env, arena, node, safe))?;
    Ok(())
}

/// Detach `node` from wherever it is and await it.
fn take_awaited(env: Env<'_>, arena: &mut NodeArena, node: NodeIndex) -> Result<NodeIndex, RewriteError> {
    let safe = env.is_nullable(arena, node);
    arena.detach(node)?;
    Ok(await_node(env, arena, node, safe))
}

/// A reference to `declaration`, linked.
fn bound_ref(arena: &mut NodeArena, declaration: NodeIndex) -> NodeIndex {
    let name = arena.declared_name(declaration).unwrap_or_default().to_string();
    arena.add_name_ref(name, declaration)
}

/// `val <suggested> = initializer` before `anchor`.
fn declare(env: Env<'_>, arena: &mut NodeArena, anchor: NodeIndex, initializer: NodeIndex) -> Result<NodeIndex, RewriteError> {
    let name = env.base_name(arena, initializer);
    declare_named(arena, anchor, name, initializer)
}

fn declare_named(
    arena: &mut NodeArena,
    anchor: NodeIndex,
    name: impl Into<String>,
    initializer: NodeIndex,
) -> Result<NodeIndex, RewriteError> {
    let property = arena.add_property(name, false, None, initializer);
    arena.insert_before(anchor, property)?;
    Ok(property)
}

/// Put `replacement` where the awaited reference was and drop the binding.
fn finish(arena: &mut NodeArena, ctx: &RewriteContext, replacement: NodeIndex) -> Result<(), RewriteError> {
    arena.replace(ctx.awaited, replacement)?;
    arena.remove_statement(ctx.binding)?;
    Ok(())
}

/// Point the awaited reference at a re-declared binding and drop the old
/// one; the next driver iteration continues on `replacement`.
fn redeclare(arena: &mut NodeArena, ctx: &RewriteContext, replacement: NodeIndex) -> Result<(), RewriteError> {
    arena.relink_references(ctx.root, ctx.binding, replacement, &ctx.name);
    arena.remove_statement(ctx.binding)?;
    Ok(())
}

/// Relabel returns that jump out of `lambda` through its implicit label so
/// they keep targeting it once it is passed to `callee`. Must run while the
/// lambda is still in place.
fn relabel_returns(arena: &mut NodeArena, lambda: NodeIndex, callee: &str) {
    let Some(data) = arena.get_lambda(lambda) else {
        return;
    };
    if data.label.is_some() {
        return;
    }
    for ret in arena.returns_targeting(lambda) {
        if arena.get_return(ret).is_some_and(|r| r.label.is_some()) {
            arena.set_return_label(ret, Some(callee.to_string()));
        }
    }
}

fn simple(qualified: &str) -> &str {
    names::simple_name(qualified)
}
