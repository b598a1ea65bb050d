//! `x ?: y` where the host reports the elvis as useless becomes `x`.

use crate::driver::{Rewrite, commit};
use crate::error::RewriteError;
use crate::host::{Env, HostDiagnosticKind, MutationScope};
use unchain_tree::{BinaryOp, NodeArena, NodeIndex};

pub struct UselessElvis<'a> {
    env: Env<'a>,
}

impl<'a> UselessElvis<'a> {
    pub fn new(env: Env<'a>) -> Self {
        Self { env }
    }
}

pub(crate) fn is_useless_elvis(env: Env<'_>, arena: &NodeArena, elvis: NodeIndex) -> bool {
    arena.get_binary(elvis).is_some_and(|b| b.op == BinaryOp::Elvis)
        && (env.oracle.has(arena, elvis, HostDiagnosticKind::UselessElvis)
            || env.oracle.has(arena, elvis, HostDiagnosticKind::UselessElvisRightIsNull))
}

/// Replace `elvis` with its left operand.
pub(crate) fn keep_left(arena: &mut NodeArena, elvis: NodeIndex) -> Result<(), RewriteError> {
    let Some(left) = arena.get_binary(elvis).map(|b| b.left) else {
        return Err(RewriteError::violation("useless elvis", elvis, "not a binary expression"));
    };
    arena.detach(left)?;
    arena.replace(elvis, left)?;
    Ok(())
}

impl Rewrite for UselessElvis<'_> {
    type Candidate = NodeIndex;
    const NAME: &'static str = "useless elvis";

    fn find(&mut self, arena: &NodeArena, root: NodeIndex) -> Vec<NodeIndex> {
        arena
            .descendants(root)
            .into_iter()
            .filter(|&idx| is_useless_elvis(self.env, arena, idx))
            .collect()
    }

    fn apply(
        &mut self,
        arena: &mut NodeArena,
        scope: &mut dyn MutationScope,
        _root: NodeIndex,
        elvis: NodeIndex,
    ) -> Result<bool, RewriteError> {
        commit(scope, arena, |arena| keep_left(arena, elvis))?;
        Ok(true)
    }
}
