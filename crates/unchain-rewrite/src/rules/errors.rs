//! `onErrorReturn` rules.

use super::{CallParts, bound_ref, declare_named, finish, take_awaited};
use crate::context::RewriteContext;
use crate::error::RewriteError;
use crate::host::Env;
use unchain_common::names;
use unchain_tree::{NodeArena, NodeKind, TypeRef};

const CATCH_PARAM: &str = "e";

/// `val x = try { recv.await() } catch (e: T) { fallback }`
///
/// The typed overload catches the class given as first argument; the other
/// catches `Throwable`.
pub(super) fn on_error_return(
    env: Env<'_>,
    arena: &mut NodeArena,
    ctx: &RewriteContext,
    typed: bool,
) -> Result<(), RewriteError> {
    let parts = CallParts::expect(arena, ctx)?;
    let (caught, fallback) = if typed {
        let class = parts.arg(ctx, 0)?;
        let Some(NodeKind::ClassLiteral(literal)) = arena.kind(class) else {
            return Err(RewriteError::violation(ctx.kind.name(), class, "exception class is not a class literal"));
        };
        (TypeRef::named(literal.type_name.clone()), parts.arg(ctx, 1)?)
    } else {
        (TypeRef::named(names::THROWABLE), parts.arg(ctx, 0)?)
    };

    let receiver = parts.receiver(ctx)?;
    let awaited = take_awaited(env, arena, receiver)?;
    let body = arena.add_block(vec![awaited]);
    let param = arena.add_param(CATCH_PARAM, Some(caught));
    arena.detach(fallback)?;
    let handler = arena.add_block(vec![fallback]);
    let guarded = arena.add_try(body, param, handler);
    let result = declare_named(arena, ctx.anchor, ctx.name.clone(), guarded)?;
    let reference = bound_ref(arena, result);
    finish(arena, ctx, reference)
}
