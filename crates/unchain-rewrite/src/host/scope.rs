//! Mutation scopes.

use super::MutationScope;
use crate::error::RewriteError;
use tracing::trace;
use unchain_tree::NodeArena;

/// Applies edits directly. A failed edit leaves whatever it already changed.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectWrite;

impl MutationScope for DirectWrite {
    fn write(
        &mut self,
        arena: &mut NodeArena,
        edit: &mut dyn FnMut(&mut NodeArena) -> Result<(), RewriteError>,
    ) -> Result<(), RewriteError> {
        edit(arena)
    }
}

/// Snapshotting scope.
///
/// Each edit is all-or-nothing: a failing edit restores the arena to its
/// state before that edit. The arena as of the first write after
/// [`begin`](MutationScope::begin) is kept so the whole operation can be
/// undone at once.
#[derive(Clone, Debug, Default)]
pub struct Journal {
    initial: Option<NodeArena>,
    writes: usize,
}

impl Journal {
    /// Number of edits committed since the last `begin`.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl MutationScope for Journal {
    fn write(
        &mut self,
        arena: &mut NodeArena,
        edit: &mut dyn FnMut(&mut NodeArena) -> Result<(), RewriteError>,
    ) -> Result<(), RewriteError> {
        if self.initial.is_none() {
            self.initial = Some(arena.clone());
        }
        let before = arena.clone();
        match edit(arena) {
            Ok(()) => {
                self.writes += 1;
                Ok(())
            }
            Err(err) => {
                trace!(%err, "edit failed, restoring arena");
                *arena = before;
                Err(err)
            }
        }
    }

    fn begin(&mut self) {
        self.initial = None;
        self.writes = 0;
    }

    fn undo(&mut self, arena: &mut NodeArena) -> bool {
        match self.initial.take() {
            Some(initial) => {
                *arena = initial;
                self.writes = 0;
                true
            }
            None => false,
        }
    }
}
