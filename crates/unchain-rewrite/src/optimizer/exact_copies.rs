//! `val x = y` where `y` is itself an immutable binding: uses of `x` are
//! pointed at `y` and the copy is dropped.

use crate::driver::{Rewrite, commit};
use crate::error::RewriteError;
use crate::host::MutationScope;
use unchain_tree::binder::lexical_lookup;
use unchain_tree::{NodeArena, NodeIndex, NodeKind};

#[derive(Clone, Copy, Debug, Default)]
pub struct ExactCopies;

#[derive(Clone, Copy, Debug)]
pub struct CopySite {
    property: NodeIndex,
    source: NodeIndex,
}

fn is_immutable_binding(arena: &NodeArena, declaration: NodeIndex) -> bool {
    match arena.kind(declaration) {
        Some(NodeKind::Property(p)) => !p.mutable,
        Some(NodeKind::Param(_) | NodeKind::Lambda(_)) => true,
        _ => false,
    }
}

fn copy_of(arena: &NodeArena, root: NodeIndex, property: NodeIndex) -> Option<CopySite> {
    let data = arena.get_property(property)?;
    if data.mutable || data.ty.is_some() {
        return None;
    }
    arena.get_block(arena.parent(property))?;
    let source = arena.get_name_ref(data.initializer)?;
    if !is_immutable_binding(arena, source.binding) {
        return None;
    }
    let uses = arena.references_to(root, property);
    if uses.is_empty() {
        return None;
    }
    let visible = uses
        .iter()
        .all(|&u| lexical_lookup(arena, u, &source.name) == source.binding);
    visible.then_some(CopySite {
        property,
        source: source.binding,
    })
}

fn inline_copy(arena: &mut NodeArena, root: NodeIndex, copy: CopySite) -> Result<(), RewriteError> {
    let name = arena.declared_name(copy.source).unwrap_or_default().to_string();
    arena.relink_references(root, copy.property, copy.source, &name);
    arena.remove_statement(copy.property)?;
    Ok(())
}

impl Rewrite for ExactCopies {
    type Candidate = CopySite;
    const NAME: &'static str = "exact copies";

    fn find(&mut self, arena: &NodeArena, root: NodeIndex) -> Vec<CopySite> {
        arena
            .descendants(root)
            .into_iter()
            .filter_map(|idx| copy_of(arena, root, idx))
            .collect()
    }

    fn apply(
        &mut self,
        arena: &mut NodeArena,
        scope: &mut dyn MutationScope,
        root: NodeIndex,
        copy: CopySite,
    ) -> Result<bool, RewriteError> {
        commit(scope, arena, |arena| inline_copy(arena, root, copy))?;
        Ok(true)
    }
}
