//! A `let` result guarded by `?: return ..` is flattened the same way.
//!
//! ```kotlin
//! val y = a?.let { v -> f(v) } ?: return@mono null
//! // becomes
//! val v = a ?: return@mono null
//! val y = f(v)
//! ```

use super::useless_elvis::{is_useless_elvis, keep_left};
use super::{LetShape, ends_in_expression};
use crate::driver::{Rewrite, commit};
use crate::error::RewriteError;
use crate::host::{Env, MutationScope};
use unchain_tree::{BinaryOp, NodeArena, NodeIndex};

pub struct NullableLet<'a> {
    env: Env<'a>,
}

impl<'a> NullableLet<'a> {
    pub fn new(env: Env<'a>) -> Self {
        Self { env }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct NullableLetSite {
    elvis: NodeIndex,
    /// Property the elvis initializes.
    statement: NodeIndex,
    /// Separate `val l = a?.let { .. }` feeding the elvis, if any.
    let_binding: NodeIndex,
    shape: LetShape,
}

fn site(arena: &NodeArena, root: NodeIndex, elvis: NodeIndex) -> Option<NullableLetSite> {
    let data = arena.get_binary(elvis)?;
    if data.op != BinaryOp::Elvis || arena.get_return(data.right).is_none() {
        return None;
    }
    let statement = arena.parent(elvis);
    if arena.get_property(statement)?.initializer != elvis {
        return None;
    }
    arena.get_block(arena.parent(statement))?;

    let (let_binding, let_expr) = match arena.get_name_ref(data.left) {
        Some(r) => {
            let binding = arena.get_property(r.binding)?;
            if binding.mutable
                || arena.next_statement(r.binding) != statement
                || arena.references_to(root, r.binding).len() != 1
            {
                return None;
            }
            (r.binding, binding.initializer)
        }
        None => (NodeIndex::NONE, data.left),
    };
    let shape = LetShape::of(arena, let_expr)?;
    if !arena.returns_targeting(shape.lambda).is_empty() || !ends_in_expression(arena, &shape.body(arena)) {
        return None;
    }
    Some(NullableLetSite {
        elvis,
        statement,
        let_binding,
        shape,
    })
}

fn flatten(env: Env<'_>, arena: &mut NodeArena, site: NullableLetSite) -> Result<(), RewriteError> {
    let NullableLetSite {
        elvis,
        statement,
        let_binding,
        shape,
    } = site;
    let Some((left, right)) = arena.get_binary(elvis).map(|b| (b.left, b.right)) else {
        return Err(RewriteError::violation("nullable let", elvis, "not an elvis"));
    };
    let name = shape.binding_name(env, arena);
    let body = shape.body(arena);
    let insert_at = if let_binding.is_some() { let_binding } else { statement };

    arena.detach(shape.receiver)?;
    let guard_value = if shape.safe {
        let bail = arena.deep_clone(right);
        arena.add_binary(shape.receiver, BinaryOp::Elvis, bail)
    } else {
        shape.receiver
    };
    let guard = arena.add_property(name.clone(), false, None, guard_value);
    arena.insert_before(insert_at, guard)?;
    arena.relink_references(shape.lambda, shape.parameter, guard, &name);

    let Some((&tail, leading)) = body.split_last() else {
        return Err(RewriteError::violation("nullable let", shape.lambda, "empty let body"));
    };
    for &statement_in_body in leading {
        arena.detach(statement_in_body)?;
        arena.insert_before(statement, statement_in_body)?;
    }
    arena.detach(tail)?;
    arena.replace(left, tail)?;
    if let_binding.is_some() {
        arena.remove_statement(let_binding)?;
    }
    if is_useless_elvis(env, arena, elvis) {
        keep_left(arena, elvis)?;
    }
    Ok(())
}

impl Rewrite for NullableLet<'_> {
    type Candidate = NullableLetSite;
    const NAME: &'static str = "nullable let";

    fn find(&mut self, arena: &NodeArena, root: NodeIndex) -> Vec<NullableLetSite> {
        arena
            .descendants(root)
            .into_iter()
            .filter_map(|idx| site(arena, root, idx))
            .collect()
    }

    fn apply(
        &mut self,
        arena: &mut NodeArena,
        scope: &mut dyn MutationScope,
        _root: NodeIndex,
        site: NullableLetSite,
    ) -> Result<bool, RewriteError> {
        let env = self.env;
        commit(scope, arena, |arena| flatten(env, arena, site))?;
        Ok(true)
    }
}
