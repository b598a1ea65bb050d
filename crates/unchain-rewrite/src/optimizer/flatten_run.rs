//! `run { .. }` blocks left behind by the structural rules are spliced into
//! the enclosing block.
//!
//! ```kotlin
//! run { log(); val a = f(); a }     ->   log(); val a = f(); a
//! val x = run { val a = f(); g(a) } ->   val a = f(); val x = g(a)
//! ```

use super::ends_in_expression;
use crate::driver::{Rewrite, commit};
use crate::error::RewriteError;
use crate::host::{Env, MutationScope};
use unchain_common::names;
use unchain_tree::{NodeArena, NodeIndex, NodeKind};

pub struct FlattenRun<'a> {
    env: Env<'a>,
}

impl<'a> FlattenRun<'a> {
    pub fn new(env: Env<'a>) -> Self {
        Self { env }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum RunSite {
    /// `run { .. }` standing as a statement.
    Statement { call: NodeIndex, lambda: NodeIndex },
    /// `val x = run { .. }`.
    Initializer {
        property: NodeIndex,
        call: NodeIndex,
        lambda: NodeIndex,
    },
}

/// The lambda of a plain `run { }` call whose body can be inlined.
fn run_lambda(env: Env<'_>, arena: &NodeArena, call: NodeIndex) -> Option<NodeIndex> {
    let data = arena.get_call(call)?;
    if data.callee != names::RUN || data.target.as_ref().is_some_and(|t| t.owner == env.options.producer_type) {
        return None;
    }
    let [lambda] = data.args.as_slice() else {
        return None;
    };
    let body = arena.get_lambda(*lambda)?;
    if !body.params.is_empty() || body.label.is_some() || !arena.returns_targeting(*lambda).is_empty() {
        return None;
    }
    // `it` inside the body would bind to the run lambda.
    if !arena.references_to(*lambda, *lambda).is_empty() {
        return None;
    }
    Some(*lambda)
}

fn site(env: Env<'_>, arena: &NodeArena, call: NodeIndex) -> Option<RunSite> {
    let lambda = run_lambda(env, arena, call)?;
    let statements = arena.get_block(arena.get_lambda(lambda)?.body)?.statements.clone();
    let parent = arena.parent(call);
    match arena.kind(parent)? {
        NodeKind::Block(_) if !statements.is_empty() => Some(RunSite::Statement { call, lambda }),
        NodeKind::Property(p) if p.initializer == call && ends_in_expression(arena, &statements) => {
            arena.get_block(arena.parent(parent))?;
            Some(RunSite::Initializer {
                property: parent,
                call,
                lambda,
            })
        }
        _ => None,
    }
}

fn body_of(arena: &NodeArena, lambda: NodeIndex) -> Vec<NodeIndex> {
    arena
        .get_lambda(lambda)
        .and_then(|l| arena.get_block(l.body))
        .map(|b| b.statements.clone())
        .unwrap_or_default()
}

fn move_before(arena: &mut NodeArena, anchor: NodeIndex, statements: &[NodeIndex]) -> Result<(), RewriteError> {
    for &statement in statements {
        arena.detach(statement)?;
        arena.insert_before(anchor, statement)?;
    }
    Ok(())
}

fn flatten(arena: &mut NodeArena, site: RunSite) -> Result<(), RewriteError> {
    match site {
        RunSite::Statement { call, lambda } => {
            let statements = body_of(arena, lambda);
            move_before(arena, call, &statements)?;
            arena.remove_statement(call)?;
        }
        RunSite::Initializer { property, call, lambda } => {
            let statements = body_of(arena, lambda);
            let Some((&tail, leading)) = statements.split_last() else {
                return Err(RewriteError::violation("flatten run", call, "empty run body"));
            };
            move_before(arena, property, leading)?;
            arena.detach(tail)?;
            arena.replace(call, tail)?;
        }
    }
    Ok(())
}

impl Rewrite for FlattenRun<'_> {
    type Candidate = RunSite;
    const NAME: &'static str = "flatten run";

    fn find(&mut self, arena: &NodeArena, root: NodeIndex) -> Vec<RunSite> {
        arena
            .descendants(root)
            .into_iter()
            .filter_map(|idx| site(self.env, arena, idx))
            .collect()
    }

    fn apply(
        &mut self,
        arena: &mut NodeArena,
        scope: &mut dyn MutationScope,
        _root: NodeIndex,
        site: RunSite,
    ) -> Result<bool, RewriteError> {
        commit(scope, arena, |arena| flatten(arena, site))?;
        Ok(true)
    }
}
