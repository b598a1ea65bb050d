//! Renames declarations the host flags as redeclared or shadowing.
//!
//! The new name avoids every name declared or referenced in the function,
//! so a rename never creates a fresh conflict and the pass terminates.

use crate::driver::{Rewrite, commit};
use crate::error::RewriteError;
use crate::host::{Env, HostDiagnosticKind, MutationScope};
use rustc_hash::FxHashSet;
use tracing::trace;
use unchain_tree::{NodeArena, NodeIndex, NodeKind};

pub struct Redeclarations<'a> {
    env: Env<'a>,
}

impl<'a> Redeclarations<'a> {
    pub fn new(env: Env<'a>) -> Self {
        Self { env }
    }

    fn is_flagged(&self, arena: &NodeArena, declaration: NodeIndex) -> bool {
        let in_block = match arena.kind(declaration) {
            Some(NodeKind::Property(_)) => arena.get_block(arena.parent(declaration)).is_some(),
            Some(NodeKind::Param(_)) => arena.get_destructuring(arena.parent(declaration)).is_some(),
            _ => false,
        };
        in_block
            && (self.env.oracle.has(arena, declaration, HostDiagnosticKind::Redeclaration)
                || self.env.oracle.has(arena, declaration, HostDiagnosticKind::ShadowedReference))
    }
}

/// Every name declared or referenced under `root`.
fn names_in_use(arena: &NodeArena, root: NodeIndex) -> FxHashSet<String> {
    arena
        .descendants(root)
        .into_iter()
        .filter_map(|idx| match arena.kind(idx) {
            Some(NodeKind::NameRef(r)) => Some(r.name.clone()),
            Some(NodeKind::Property(_) | NodeKind::Param(_)) => arena.declared_name(idx).map(str::to_string),
            _ => None,
        })
        .collect()
}

impl Rewrite for Redeclarations<'_> {
    type Candidate = NodeIndex;
    const NAME: &'static str = "redeclarations";

    fn find(&mut self, arena: &NodeArena, root: NodeIndex) -> Vec<NodeIndex> {
        arena
            .descendants(root)
            .into_iter()
            .filter(|&idx| self.is_flagged(arena, idx))
            .collect()
    }

    fn apply(
        &mut self,
        arena: &mut NodeArena,
        scope: &mut dyn MutationScope,
        root: NodeIndex,
        declaration: NodeIndex,
    ) -> Result<bool, RewriteError> {
        let excluded = names_in_use(arena, root);
        let Some(name) = self.env.names.suggest(arena, declaration, &excluded).into_iter().next() else {
            return Ok(false);
        };
        trace!(declaration = declaration.0, %name, "rename");
        commit(scope, arena, |arena| {
            arena.rename_declaration(root, declaration, &name);
            Ok(())
        })?;
        Ok(true)
    }
}
