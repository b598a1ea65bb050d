//! Await-lifting driver.
//!
//! Scans for `x.await()` where `x` names a local binding whose initializer
//! is a classified shape, and applies the matching rule until none remain.
//! References to parameters and to opaque producer calls are already direct
//! and stay as they are.
//!
//! Combinator rules splice new statements before the statement holding the
//! await. An await that is only conditionally evaluated there (right of
//! `?:`, `&&` or `||`, an argument of a safe call, an `if` branch) is first
//! given a statement of its own: the operand becomes `run { operand }` and
//! the branch becomes a block.

use crate::classifier::Classifier;
use crate::context::RewriteContext;
use crate::driver::{Rewrite, commit};
use crate::error::RewriteError;
use crate::host::{Env, MutationScope};
use crate::report::{AppliedRewrite, UnresolvedReason, UnresolvedReference};
use crate::rules;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};
use unchain_common::diagnostics::{Diagnostic, diagnostic_codes};
use unchain_common::names;
use unchain_tree::{BinaryOp, NodeArena, NodeIndex, NodeKind};

/// `reference.await()`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AwaitSite {
    pub reference: NodeIndex,
    pub awaited: NodeIndex,
}

/// Every await of a name reference under `root`, in source order.
pub fn await_sites(arena: &NodeArena, root: NodeIndex, await_function: &str) -> Vec<AwaitSite> {
    arena
        .descendants(root)
        .into_iter()
        .filter_map(|idx| {
            arena.get_name_ref(idx)?;
            let awaited = arena.parent(idx);
            let (qualified, call) = arena.selector_call(awaited)?;
            let is_await = qualified.receiver == idx && call.callee == await_function && call.args.is_empty();
            is_await.then_some(AwaitSite {
                reference: idx,
                awaited,
            })
        })
        .collect()
}

/// Part of a statement evaluated only under a condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lazy {
    /// Right operand of a short-circuit operator, or an argument of a safe
    /// call.
    Operand(NodeIndex),
    /// Expression branch of an `if`.
    Branch(NodeIndex),
}

/// Nearest conditionally evaluated position between `awaited` and the
/// statement holding it.
fn lazy_position(arena: &NodeArena, awaited: NodeIndex) -> Option<Lazy> {
    let mut child = awaited;
    let mut below = NodeIndex::NONE;
    for ancestor in arena.ancestors(awaited) {
        match arena.kind(ancestor)? {
            NodeKind::Block(_) => return None,
            NodeKind::If(i) if child != i.condition => return Some(Lazy::Branch(child)),
            NodeKind::Binary(b)
                if matches!(b.op, BinaryOp::Elvis | BinaryOp::And | BinaryOp::Or) && child == b.right =>
            {
                return Some(Lazy::Operand(child));
            }
            NodeKind::Qualified(q) if q.safe && child == q.selector && below.is_some() => {
                return Some(Lazy::Operand(below));
            }
            _ => {}
        }
        below = child;
        child = ancestor;
    }
    None
}

/// Give the lazy position a block of its own.
fn isolate(arena: &mut NodeArena, lazy: Lazy) -> Result<(), RewriteError> {
    match lazy {
        Lazy::Branch(branch) => {
            arena.wrap(branch, |arena, branch| arena.add_block(vec![branch]))?;
        }
        Lazy::Operand(operand) => {
            arena.wrap(operand, |arena, operand| {
                let body = arena.add_block(vec![operand]);
                let lambda = arena.add_lambda(Vec::new(), body, None);
                arena.add_call(names::RUN, vec![lambda], None)
            })?;
        }
    }
    Ok(())
}

enum Plan {
    Rewrite(RewriteContext),
    /// Already direct.
    Terminal,
    Unresolved(UnresolvedReference),
    /// No declaration found for the name.
    Unbound,
}

pub struct AwaitLifter<'a> {
    env: Env<'a>,
    classifier: Classifier<'a>,
    function_name: String,
    applied: Vec<AppliedRewrite>,
    unresolved: Vec<UnresolvedReference>,
    notes: Vec<Diagnostic>,
    noted: FxHashSet<NodeIndex>,
}

impl<'a> AwaitLifter<'a> {
    pub fn new(env: Env<'a>, function_name: impl Into<String>) -> Self {
        Self {
            env,
            classifier: Classifier::new(&env),
            function_name: function_name.into(),
            applied: Vec::new(),
            unresolved: Vec::new(),
            notes: Vec::new(),
            noted: FxHashSet::default(),
        }
    }

    /// Unresolved references still present under `root`, and the
    /// informational notes gathered while scanning.
    pub fn finish(
        mut self,
        arena: &NodeArena,
        root: NodeIndex,
    ) -> (Vec<UnresolvedReference>, Vec<Diagnostic>, Vec<AppliedRewrite>) {
        self.unresolved.retain(|u| arena.is_attached_to(u.reference, root));
        for entry in self.unlifted_awaits(arena, root) {
            self.record_unresolved(entry);
        }
        (self.unresolved, self.notes, self.applied)
    }

    /// Awaits of anything but a name whose receiver still calls a producer
    /// method. No rule reaches them, so they count against completeness.
    fn unlifted_awaits(&self, arena: &NodeArena, root: NodeIndex) -> Vec<UnresolvedReference> {
        let await_function = self.env.options.await_function.as_str();
        arena
            .descendants(root)
            .into_iter()
            .filter_map(|awaited| {
                let (qualified, call) = arena.selector_call(awaited)?;
                if call.callee != await_function || !call.args.is_empty() {
                    return None;
                }
                if arena.get_name_ref(qualified.receiver).is_some() {
                    return None;
                }
                let method = arena
                    .descendants(qualified.receiver)
                    .into_iter()
                    .find_map(|idx| self.classifier.producer_method(arena, idx))?;
                Some(UnresolvedReference {
                    reference: awaited,
                    binding: self.enclosing_binding(arena, awaited),
                    reason: UnresolvedReason::UnliftedAwait { method: method.name },
                })
            })
            .collect()
    }

    /// Name of the binding whose initializer holds `node`, or the function's.
    fn enclosing_binding(&self, arena: &NodeArena, node: NodeIndex) -> String {
        arena
            .statement_in_block(node)
            .and_then(|(_, statement)| arena.get_property(statement))
            .map_or_else(|| self.function_name.clone(), |p| p.name.clone())
    }

    fn plan(&self, arena: &NodeArena, root: NodeIndex, site: AwaitSite) -> Result<Plan, RewriteError> {
        let Some(binding) = self.env.resolver.resolve_reference(arena, site.reference) else {
            return Ok(Plan::Unbound);
        };
        let Some(property) = arena.get_property(binding) else {
            return Ok(Plan::Terminal);
        };
        if property.mutable {
            return Ok(Plan::Terminal);
        }
        let name = property.name.clone();
        let initializer = property.initializer;
        let unresolved = |reason| {
            Ok(Plan::Unresolved(UnresolvedReference {
                reference: site.reference,
                binding: name.clone(),
                reason,
            }))
        };

        let Some(kind) = self.classifier.classify(arena, initializer) else {
            return match self.classifier.producer_method(arena, initializer) {
                Some(method) => unresolved(UnresolvedReason::UnsupportedCombinator {
                    method: method.name,
                }),
                None => Ok(Plan::Terminal),
            };
        };
        let references = arena.references_to(root, binding).len();
        if references != 1 {
            return unresolved(UnresolvedReason::SharedProducer { references });
        }
        let Some((block, anchor)) = arena.statement_in_block(site.awaited) else {
            return Err(RewriteError::DetachedNode(site.awaited));
        };
        let ctx = RewriteContext {
            root,
            reference: site.reference,
            awaited: site.awaited,
            binding,
            name: name.clone(),
            initializer,
            anchor,
            block,
            kind,
        };
        if !rules::shape_ok(arena, &ctx) {
            return unresolved(UnresolvedReason::RuleNotApplicable { kind });
        }
        Ok(Plan::Rewrite(ctx))
    }

    fn note_unbound(&mut self, arena: &NodeArena, reference: NodeIndex) {
        if !self.noted.insert(reference) {
            return;
        }
        let name = arena.get_name_ref(reference).map(|r| r.name.as_str()).unwrap_or_default();
        self.notes.push(Diagnostic::from_code(
            self.function_name.clone(),
            Some(reference.0),
            diagnostic_codes::UNRESOLVED_REFERENCE,
            &[name],
        ));
    }

    fn record_unresolved(&mut self, entry: UnresolvedReference) {
        trace!(binding = %entry.binding, reason = ?entry.reason, "left in place");
        match self.unresolved.iter_mut().find(|u| u.reference == entry.reference) {
            Some(existing) => *existing = entry,
            None => self.unresolved.push(entry),
        }
    }
}

impl Rewrite for AwaitLifter<'_> {
    type Candidate = AwaitSite;
    const NAME: &'static str = "await lifting";

    fn find(&mut self, arena: &NodeArena, root: NodeIndex) -> Vec<AwaitSite> {
        await_sites(arena, root, &self.env.options.await_function)
    }

    fn apply(
        &mut self,
        arena: &mut NodeArena,
        scope: &mut dyn MutationScope,
        root: NodeIndex,
        site: AwaitSite,
    ) -> Result<bool, RewriteError> {
        let mut ctx = match self.plan(arena, root, site)? {
            Plan::Rewrite(ctx) => ctx,
            Plan::Terminal => return Ok(false),
            Plan::Unbound => {
                self.note_unbound(arena, site.reference);
                return Ok(false);
            }
            Plan::Unresolved(entry) => {
                self.record_unresolved(entry);
                return Ok(false);
            }
        };
        // Structural rules keep the binding where it is and splice nothing.
        if !ctx.kind.is_structural()
            && let Some(lazy) = lazy_position(arena, site.awaited)
        {
            commit(scope, arena, |arena| isolate(arena, lazy))?;
            trace!(?lazy, "isolated conditional await");
            ctx = match self.plan(arena, root, site)? {
                Plan::Rewrite(ctx) => ctx,
                _ => return Err(RewriteError::violation("await lifting", site.awaited, "await lost its binding")),
            };
        }
        let env = self.env;
        commit(scope, arena, |arena| rules::apply(env, arena, &ctx))?;
        debug!(kind = %ctx.kind, binding = %ctx.name, "applied rewrite");
        self.unresolved.retain(|u| u.reference != site.reference);
        self.applied.push(AppliedRewrite {
            kind: ctx.kind,
            binding: ctx.name,
        });
        Ok(true)
    }
}
