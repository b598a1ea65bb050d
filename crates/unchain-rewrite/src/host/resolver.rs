//! Resolver reading binder links and call annotations straight off the
//! arena.

use super::SymbolResolver;
use unchain_common::limits::MAX_TREE_DEPTH;
use unchain_common::names;
use unchain_tree::{BinaryOp, Literal, MethodRef, NodeArena, NodeIndex, NodeKind, TypeRef};

/// Default [`SymbolResolver`].
///
/// Types come from declared annotations, call targets and literals. Anything
/// it cannot see is unknown (`None`).
#[derive(Clone, Copy, Debug, Default)]
pub struct ArenaResolver;

impl SymbolResolver for ArenaResolver {
    fn resolve_reference(&self, arena: &NodeArena, name_ref: NodeIndex) -> Option<NodeIndex> {
        let binding = arena.get_name_ref(name_ref)?.binding;
        binding.is_some().then_some(binding)
    }

    fn resolve_call(&self, arena: &NodeArena, call: NodeIndex) -> Option<MethodRef> {
        arena.call_target(call).cloned()
    }

    fn expression_type(&self, arena: &NodeArena, expr: NodeIndex) -> Option<TypeRef> {
        type_of(arena, expr, 0)
    }
}

fn type_of(arena: &NodeArena, expr: NodeIndex, depth: u32) -> Option<TypeRef> {
    if depth > MAX_TREE_DEPTH {
        return None;
    }
    match arena.kind(expr)? {
        NodeKind::NameRef(r) => declared_type(arena, r.binding, depth + 1),
        NodeKind::Literal(lit) => match lit {
            Literal::Null => None,
            Literal::Bool(_) => Some(TypeRef::named(names::BOOLEAN)),
            Literal::Int(_) => Some(TypeRef::named("kotlin.Int")),
            Literal::Str(_) => Some(TypeRef::named("kotlin.String")),
        },
        NodeKind::Call(c) => match &c.target {
            Some(target) => target.returns.clone(),
            None if c.callee == names::RUN => {
                scope_lambda(arena, &c.args).and_then(|l| lambda_type(arena, l, depth + 1))
            }
            None => None,
        },
        NodeKind::Qualified(q) => {
            let selector = arena.get_call(q.selector)?;
            let mut ty = match &selector.target {
                Some(target) => target.returns.clone()?,
                None if selector.callee == names::LET => {
                    lambda_type(arena, scope_lambda(arena, &selector.args)?, depth + 1)?
                }
                None => return None,
            };
            if q.safe {
                ty = ty.nullable();
            }
            Some(ty)
        }
        NodeKind::If(i) => branch_type(arena, i.then_branch, depth + 1),
        NodeKind::Binary(b) if b.op == BinaryOp::Elvis => type_of(arena, b.left, depth + 1),
        NodeKind::Binary(b) => match b.op {
            BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Times | BinaryOp::Div => {
                type_of(arena, b.left, depth + 1)
            }
            _ => Some(TypeRef::named(names::BOOLEAN)),
        },
        _ => None,
    }
}

fn declared_type(arena: &NodeArena, declaration: NodeIndex, depth: u32) -> Option<TypeRef> {
    match arena.kind(declaration)? {
        NodeKind::Property(p) => match &p.ty {
            Some(ty) => Some(ty.clone()),
            None => type_of(arena, p.initializer, depth + 1),
        },
        NodeKind::Param(p) => p.ty.clone(),
        _ => None,
    }
}

fn branch_type(arena: &NodeArena, branch: NodeIndex, depth: u32) -> Option<TypeRef> {
    match arena.get_block(branch) {
        Some(block) => type_of(arena, *block.statements.last()?, depth),
        None => type_of(arena, branch, depth),
    }
}

fn scope_lambda(arena: &NodeArena, args: &[NodeIndex]) -> Option<NodeIndex> {
    match args {
        [only] if arena.get_lambda(*only).is_some() => Some(*only),
        _ => None,
    }
}

/// Type of the value a scope-function lambda yields: its trailing
/// expression, or else the operand of the first return leaving it.
fn lambda_type(arena: &NodeArena, lambda: NodeIndex, depth: u32) -> Option<TypeRef> {
    let body = arena.get_lambda(lambda)?.body;
    let tail = arena.get_block(body)?.statements.last().copied();
    let from_tail = tail
        .filter(|&t| {
            !matches!(
                arena.kind(t),
                Some(NodeKind::Property(_) | NodeKind::Destructuring(_) | NodeKind::Return(_))
            )
        })
        .and_then(|t| type_of(arena, t, depth));
    from_tail.or_else(|| {
        arena.returns_targeting(lambda).into_iter().find_map(|ret| {
            let value = arena.get_return(ret)?.value;
            if value.is_none() {
                return None;
            }
            type_of(arena, value, depth)
        })
    })
}
