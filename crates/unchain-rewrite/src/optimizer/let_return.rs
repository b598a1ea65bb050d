//! A returned `let` result becomes a guard plus straight-line code.
//!
//! ```kotlin
//! val x = a?.let { v -> f(v) }       val v = a ?: return@mono null
//! return@mono x                 ->   return@mono f(v)
//! ```

use super::{LetShape, ends_in_expression};
use crate::driver::{Rewrite, commit};
use crate::error::RewriteError;
use crate::host::{Env, MutationScope};
use unchain_tree::{BinaryOp, Literal, NodeArena, NodeIndex};

pub struct LetReturn<'a> {
    env: Env<'a>,
}

impl<'a> LetReturn<'a> {
    pub fn new(env: Env<'a>) -> Self {
        Self { env }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LetReturnSite {
    ret: NodeIndex,
    property: NodeIndex,
    shape: LetShape,
}

fn site(arena: &NodeArena, root: NodeIndex, ret: NodeIndex) -> Option<LetReturnSite> {
    let value = arena.get_return(ret)?.value;
    let property = arena.get_name_ref(value)?.binding;
    let data = arena.get_property(property)?;
    if data.mutable || arena.next_statement(property) != ret {
        return None;
    }
    if arena.references_to(root, property).len() != 1 {
        return None;
    }
    let shape = LetShape::of(arena, data.initializer)?;
    ends_in_expression(arena, &shape.body(arena)).then_some(LetReturnSite { ret, property, shape })
}

fn inline_let(env: Env<'_>, arena: &mut NodeArena, site: LetReturnSite) -> Result<(), RewriteError> {
    let LetReturnSite { ret, property, shape } = site;
    let label = arena.get_return(ret).and_then(|r| r.label.clone());
    let name = shape.binding_name(env, arena);
    let body = shape.body(arena);
    let jumps = arena.returns_targeting(shape.lambda);

    arena.detach(shape.receiver)?;
    let guard_value = if shape.safe {
        let null = arena.add_literal(Literal::Null);
        let bail = arena.add_return(label.clone(), null);
        arena.add_binary(shape.receiver, BinaryOp::Elvis, bail)
    } else {
        shape.receiver
    };
    let guard = arena.add_property(name.clone(), false, None, guard_value);
    arena.insert_before(property, guard)?;
    arena.relink_references(shape.lambda, shape.parameter, guard, &name);
    for jump in jumps {
        arena.set_return_label(jump, label.clone());
    }

    let Some((&tail, leading)) = body.split_last() else {
        return Err(RewriteError::violation("let return", shape.lambda, "empty let body"));
    };
    for &statement in leading {
        arena.detach(statement)?;
        arena.insert_before(property, statement)?;
    }
    arena.detach(tail)?;
    let value = arena.add_return(label, tail);
    arena.insert_before(property, value)?;
    arena.remove_statement(property)?;
    arena.remove_statement(ret)?;
    Ok(())
}

impl Rewrite for LetReturn<'_> {
    type Candidate = LetReturnSite;
    const NAME: &'static str = "let return";

    fn find(&mut self, arena: &NodeArena, root: NodeIndex) -> Vec<LetReturnSite> {
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
        site: LetReturnSite,
    ) -> Result<bool, RewriteError> {
        let env = self.env;
        commit(scope, arena, |arena| inline_let(env, arena, site))?;
        Ok(true)
    }
}
