//! A binding used exactly once is inlined into its use when that cannot
//! change evaluation order or name resolution.

use super::{is_first_unconditional_use, names_survive_move};
use crate::driver::{Rewrite, commit};
use crate::error::RewriteError;
use crate::host::MutationScope;
use unchain_common::names;
use unchain_tree::{NodeArena, NodeIndex, NodeKind};

#[derive(Clone, Copy, Debug, Default)]
pub struct SingleUse;

#[derive(Clone, Copy, Debug)]
pub struct SingleUseSite {
    property: NodeIndex,
    reference: NodeIndex,
}

/// `async { .. }` bindings name concurrently started work; inlining them
/// would serialize it.
fn starts_task(arena: &NodeArena, expr: NodeIndex) -> bool {
    arena.get_call(expr).is_some_and(|c| c.callee == names::ASYNC)
}

fn site(arena: &NodeArena, root: NodeIndex, property: NodeIndex) -> Option<SingleUseSite> {
    let data = arena.get_property(property)?;
    if data.mutable || data.ty.is_some() {
        return None;
    }
    arena.get_block(arena.parent(property))?;
    let init = data.initializer;
    if starts_task(arena, init) || arena.find_first(init, |a, idx| a.get_return(idx).is_some()).is_some() {
        return None;
    }
    let [reference] = arena.references_to(root, property)[..] else {
        return None;
    };
    if !names_survive_move(arena, init, reference) {
        return None;
    }
    let pure = matches!(
        arena.kind(init),
        Some(NodeKind::NameRef(_) | NodeKind::Literal(_) | NodeKind::ClassLiteral(_))
    );
    if pure || is_first_unconditional_use(arena, reference, arena.next_statement(property)) {
        return Some(SingleUseSite { property, reference });
    }
    None
}

fn inline(arena: &mut NodeArena, site: SingleUseSite) -> Result<(), RewriteError> {
    let init = arena.initializer(site.property);
    arena.detach(init)?;
    arena.replace(site.reference, init)?;
    arena.remove_statement(site.property)?;
    Ok(())
}

impl Rewrite for SingleUse {
    type Candidate = SingleUseSite;
    const NAME: &'static str = "single use";

    fn find(&mut self, arena: &NodeArena, root: NodeIndex) -> Vec<SingleUseSite> {
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
        site: SingleUseSite,
    ) -> Result<bool, RewriteError> {
        commit(scope, arena, |arena| inline(arena, site))?;
        Ok(true)
    }
}
