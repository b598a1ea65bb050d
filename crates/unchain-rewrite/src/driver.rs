//! Generic fixed-point driver.
//!
//! Extraction, await lifting and every optimizer pass share one loop: scan
//! for candidates, apply the first one that takes, rescan. Candidates are
//! never reused across applications since every edit may invalidate them.

use crate::error::RewriteError;
use crate::host::MutationScope;
use std::fmt::Debug;
use tracing::trace;
use unchain_tree::{NodeArena, NodeIndex};

/// A rewrite driven to a fixed point.
pub trait Rewrite {
    type Candidate: Copy + Debug;

    /// Name used in logs and in [`RewriteError::IterationLimit`].
    const NAME: &'static str;

    /// Candidates under `root`, in the order they should be tried.
    fn find(&mut self, arena: &NodeArena, root: NodeIndex) -> Vec<Self::Candidate>;

    /// Check preconditions (read-only), then edit through `scope`. Returns
    /// whether the tree changed.
    fn apply(
        &mut self,
        arena: &mut NodeArena,
        scope: &mut dyn MutationScope,
        root: NodeIndex,
        candidate: Self::Candidate,
    ) -> Result<bool, RewriteError>;
}

/// Apply `rewrite` until no candidate takes. Returns the number of
/// applications.
pub fn run_to_fixed_point<R: Rewrite>(
    rewrite: &mut R,
    arena: &mut NodeArena,
    scope: &mut dyn MutationScope,
    root: NodeIndex,
    limit: usize,
) -> Result<usize, RewriteError> {
    let mut applied = 0;
    loop {
        let candidates = rewrite.find(arena, root);
        trace!(pass = R::NAME, candidates = candidates.len(), "scan");
        let mut progressed = false;
        for candidate in candidates {
            if rewrite.apply(arena, scope, root, candidate)? {
                progressed = true;
                break;
            }
            trace!(pass = R::NAME, ?candidate, "no match");
        }
        if !progressed {
            return Ok(applied);
        }
        applied += 1;
        if applied > limit {
            return Err(RewriteError::IterationLimit { pass: R::NAME, limit });
        }
    }
}

/// Run one edit through `scope`.
pub(crate) fn commit(
    scope: &mut dyn MutationScope,
    arena: &mut NodeArena,
    mut edit: impl FnMut(&mut NodeArena) -> Result<(), RewriteError>,
) -> Result<(), RewriteError> {
    scope.write(arena, &mut edit)
}
