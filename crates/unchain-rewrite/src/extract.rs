//! Pre-lift extraction.
//!
//! Producer-typed expressions nested inside statements are introduced as
//! bindings right before their statement, one at a time, so the driver only
//! ever sees producers through names. Conditionally evaluated positions are
//! left alone; an expression branch of an `if` is turned into a block first
//! so the binding stays inside the branch.

use crate::driver::{Rewrite, commit};
use crate::error::RewriteError;
use crate::host::{Env, MutationScope};
use tracing::debug;
use unchain_tree::{BinaryOp, NodeArena, NodeIndex, NodeKind};

pub struct Extractor<'a> {
    env: Env<'a>,
    pub extracted: usize,
}

impl<'a> Extractor<'a> {
    pub fn new(env: Env<'a>) -> Self {
        Self { env, extracted: 0 }
    }

    fn is_candidate(&self, arena: &NodeArena, idx: NodeIndex) -> bool {
        let Some(kind) = arena.kind(idx) else {
            return false;
        };
        if matches!(
            kind,
            NodeKind::Function(_)
                | NodeKind::Param(_)
                | NodeKind::Block(_)
                | NodeKind::Property(_)
                | NodeKind::Destructuring(_)
                | NodeKind::Return(_)
                | NodeKind::NameRef(_)
                | NodeKind::Literal(_)
                | NodeKind::Lambda(_)
                | NodeKind::ClassLiteral(_)
        ) {
            return false;
        }
        let parent = arena.parent(idx);
        match arena.kind(parent) {
            Some(NodeKind::Qualified(q)) if q.selector == idx => return false,
            Some(NodeKind::Property(p)) if p.initializer == idx => return false,
            _ => {}
        }
        let is_producer = self
            .env
            .resolver
            .expression_type(arena, idx)
            .is_some_and(|ty| self.env.options.is_extractable(&ty.name));
        is_producer && !is_conditional(arena, idx)
    }
}

/// Whether `idx` is evaluated only conditionally within its statement.
/// Walking stops at the nearest block or at an `if` branch, which
/// extraction turns into a block.
fn is_conditional(arena: &NodeArena, idx: NodeIndex) -> bool {
    let mut child = idx;
    for ancestor in arena.ancestors(idx) {
        match arena.kind(ancestor) {
            None | Some(NodeKind::Block(_)) => return false,
            Some(NodeKind::If(i)) if child != i.condition => return false,
            Some(NodeKind::Binary(b)) => {
                let lazy = matches!(b.op, BinaryOp::Elvis | BinaryOp::And | BinaryOp::Or);
                if lazy && child == b.right {
                    return true;
                }
            }
            Some(NodeKind::Qualified(q)) if q.safe && child == q.selector => return true,
            _ => {}
        }
        child = ancestor;
    }
    false
}

/// Nearest `if` whose expression branch contains `idx` before any block.
fn expression_branch(arena: &NodeArena, idx: NodeIndex) -> Option<NodeIndex> {
    let mut child = idx;
    for ancestor in arena.ancestors(idx) {
        match arena.kind(ancestor)? {
            NodeKind::Block(_) => return None,
            NodeKind::If(i) if child != i.condition => return Some(child),
            _ => {}
        }
        child = ancestor;
    }
    None
}

/// Whether the value of `block`'s last statement is the value of the block.
fn yields_value(arena: &NodeArena, block: NodeIndex) -> bool {
    matches!(
        arena.kind(arena.parent(block)),
        Some(NodeKind::Lambda(_) | NodeKind::If(_) | NodeKind::Try(_))
    )
}

fn extract(env: Env<'_>, arena: &mut NodeArena, expr: NodeIndex) -> Result<(), RewriteError> {
    if let Some(branch) = expression_branch(arena, expr) {
        arena.wrap(branch, |arena, branch| arena.add_block(vec![branch]))?;
    }
    let Some((block, statement)) = arena.statement_in_block(expr) else {
        return Err(RewriteError::DetachedNode(expr));
    };
    let name = env.base_name(arena, expr);
    if statement == expr {
        let is_tail = arena
            .get_block(block)
            .and_then(|b| b.statements.last())
            .is_some_and(|&last| last == expr);
        let property = arena.wrap(expr, |arena, expr| arena.add_property(name, false, None, expr))?;
        if is_tail && yields_value(arena, block) {
            let name = arena.declared_name(property).unwrap_or_default().to_string();
            let reference = arena.add_name_ref(name, property);
            arena.insert_after(property, reference)?;
        }
        return Ok(());
    }
    let reference = arena.add_name_ref(name.clone(), NodeIndex::NONE);
    arena.replace(expr, reference)?;
    let property = arena.add_property(name, false, None, expr);
    arena.insert_before(statement, property)?;
    arena.set_binding(reference, property);
    Ok(())
}

impl Rewrite for Extractor<'_> {
    type Candidate = NodeIndex;
    const NAME: &'static str = "extraction";

    fn find(&mut self, arena: &NodeArena, root: NodeIndex) -> Vec<NodeIndex> {
        let body = arena.get_function(root).map_or(root, |f| f.body);
        arena
            .descendants(body)
            .into_iter()
            .filter(|&idx| self.is_candidate(arena, idx))
            .collect()
    }

    fn apply(
        &mut self,
        arena: &mut NodeArena,
        scope: &mut dyn MutationScope,
        _root: NodeIndex,
        expr: NodeIndex,
    ) -> Result<bool, RewriteError> {
        let env = self.env;
        commit(scope, arena, |arena| extract(env, arena, expr))?;
        self.extracted += 1;
        debug!(expr = expr.0, "extracted producer expression");
        Ok(true)
    }
}
