//! Function wrapper.
//!
//! Runs once before lifting. Every value the function returns becomes an
//! awaited value, and the whole body moves into the coroutine builder:
//!
//! ```text
//! fun f(): Mono<T> { ...; return x }
//! fun f(): Mono<T> = mono { ...; return@mono x.await() }
//! ```

use crate::error::RewriteError;
use crate::host::Env;
use tracing::debug;
use unchain_tree::{NodeArena, NodeIndex};

/// Whether `function` already has the `= builder { .. }` shape.
pub fn is_wrapped(arena: &NodeArena, function: NodeIndex, builder: &str) -> bool {
    let Some(data) = arena.get_function(function) else {
        return false;
    };
    if !data.expression_body {
        return false;
    }
    let Some([single]) = arena.get_block(data.body).map(|b| b.statements.as_slice()) else {
        return false;
    };
    arena.get_call(*single).is_some_and(|call| {
        call.callee == builder && call.args.last().is_some_and(|&a| arena.get_lambda(a).is_some())
    })
}

/// `fun f() = e` → `fun f() { return e }`. Returns whether anything changed.
pub fn to_block_body(arena: &mut NodeArena, function: NodeIndex) -> Result<bool, RewriteError> {
    let Some(data) = arena.get_function(function) else {
        return Err(RewriteError::DetachedNode(function));
    };
    if !data.expression_body {
        return Ok(false);
    }
    let body = data.body;
    if let Some(&expr) = arena.get_block(body).and_then(|b| b.statements.first()) {
        arena.wrap(expr, |arena, expr| arena.add_return(None, expr))?;
    }
    arena.set_expression_body(function, false);
    Ok(true)
}

/// Await every returned value and move the body into the builder lambda.
pub fn wrap(env: Env<'_>, arena: &mut NodeArena, function: NodeIndex) -> Result<(), RewriteError> {
    let builder = env.options.coroutine_builder.as_str();
    let Some(body) = arena.get_function(function).map(|f| f.body) else {
        return Err(RewriteError::DetachedNode(function));
    };
    let returns = arena.returns_targeting(function);
    debug!(returns = returns.len(), "wrapping function body");
    for ret in returns {
        arena.set_return_label(ret, Some(builder.to_string()));
        let value = arena.get_return(ret).map_or(NodeIndex::NONE, |r| r.value);
        if value.is_some() && !arena.is_null_literal(value) {
            let safe = env.is_nullable(arena, value);
            let await_function = env.options.await_function.as_str();
            arena.wrap(value, |arena, value| {
                arena.add_method_call(value, await_function, Vec::new(), safe)
            })?;
        }
    }

    let new_body = arena.add_block(Vec::new());
    arena.replace(body, new_body)?;
    let lambda = arena.add_lambda(Vec::new(), body, None);
    let call = arena.add_call(builder, vec![lambda], None);
    arena.push_statement(new_body, call)?;
    arena.set_expression_body(function, true);
    Ok(())
}
