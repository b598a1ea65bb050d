//! Entry point: wrap, extract, lift, optimize.

use crate::driver::{commit, run_to_fixed_point};
use crate::error::RewriteError;
use crate::extract::Extractor;
use crate::host::{Env, Host, MutationScope};
use crate::lift::AwaitLifter;
use crate::optimizer;
use crate::options::TransformOptions;
use crate::report::{TransformReport, UnresolvedReason, UnresolvedReference};
use crate::wrapper;
use tracing::debug;
use unchain_common::diagnostics::{Diagnostic, diagnostic_codes};
use unchain_common::limits;
use unchain_tree::{NodeArena, NodeIndex};

/// Transforms producer-returning functions into direct style.
///
/// A transform never fails on shapes it does not recognise; those are left
/// in place and listed in the [`TransformReport`]. Errors mean the engine
/// met a shape its own rules should not have produced.
pub struct Transformer {
    options: TransformOptions,
    host: Host,
}

impl Transformer {
    pub fn new(options: TransformOptions, host: Host) -> Self {
        Self { options, host }
    }

    /// Default options and the arena-only host.
    pub fn standard() -> Self {
        Self::new(TransformOptions::default(), Host::standard())
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Whether `function` returns the producer type.
    pub fn is_eligible(&self, arena: &NodeArena, function: NodeIndex) -> bool {
        arena
            .get_function(function)
            .and_then(|f| f.return_type.as_ref())
            .is_some_and(|ty| ty.name == self.options.producer_type)
    }

    /// Rewrite `function` in place.
    #[tracing::instrument(level = "debug", skip_all, fields(function = function.0))]
    pub fn transform(&mut self, arena: &mut NodeArena, function: NodeIndex) -> Result<TransformReport, RewriteError> {
        let name = arena
            .get_function(function)
            .map(|f| f.name.clone())
            .ok_or(RewriteError::DetachedNode(function))?;
        if !self.is_eligible(arena, function) {
            return Err(RewriteError::NotEligible { function: name });
        }

        let Self { options, host } = self;
        let options = &*options;
        let env = Env {
            resolver: &*host.resolver,
            oracle: &*host.oracle,
            names: &*host.names,
            options,
        };
        let scope: &mut dyn MutationScope = &mut *host.scope;
        scope.begin();

        let mut report = TransformReport {
            function: name.clone(),
            ..TransformReport::default()
        };

        if !wrapper::is_wrapped(arena, function, &options.coroutine_builder) {
            commit(scope, arena, |arena| wrapper::to_block_body(arena, function).map(drop))?;
            if options.extract {
                let mut extractor = Extractor::new(env);
                let limit = options.iteration_limit.min(limits::MAX_EXTRACTIONS);
                run_to_fixed_point(&mut extractor, arena, scope, function, limit)?;
                report.extracted = extractor.extracted;
            }
            commit(scope, arena, |arena| wrapper::wrap(env, arena, function))?;
            report.wrapped = true;
        }

        let mut lifter = AwaitLifter::new(env, name.clone());
        report.iterations = run_to_fixed_point(&mut lifter, arena, scope, function, options.iteration_limit)?;
        let (unresolved, notes, applied) = lifter.finish(arena, function);
        report.applied = applied;

        if options.optimize {
            report.optimizer = optimizer::optimize(env, arena, scope, function)?;
        }

        report.diagnostics = unresolved
            .iter()
            .map(|entry| unresolved_diagnostic(&name, entry))
            .chain(notes)
            .collect();
        if !unresolved.is_empty() {
            let count = unresolved.len().to_string();
            report.diagnostics.push(Diagnostic::from_code(
                name.clone(),
                Some(function.0),
                diagnostic_codes::PARTIAL_TRANSFORM,
                &[name.as_str(), count.as_str()],
            ));
        }
        report.unresolved = unresolved;
        debug!(
            applied = report.applied.len(),
            unresolved = report.unresolved.len(),
            optimized = report.optimizer.total(),
            "transform finished"
        );
        Ok(report)
    }

    /// Revert the last transform, if the host's scope keeps a journal.
    pub fn undo(&mut self, arena: &mut NodeArena) -> bool {
        self.host.scope.undo(arena)
    }
}

fn unresolved_diagnostic(function: &str, entry: &UnresolvedReference) -> Diagnostic {
    let node = Some(entry.reference.0);
    match &entry.reason {
        UnresolvedReason::SharedProducer { references } => Diagnostic::from_code(
            function,
            node,
            diagnostic_codes::SHARED_PRODUCER,
            &[entry.binding.as_str(), references.to_string().as_str()],
        ),
        UnresolvedReason::UnsupportedCombinator { method } => Diagnostic::from_code(
            function,
            node,
            diagnostic_codes::UNSUPPORTED_COMBINATOR,
            &[method.as_str(), entry.binding.as_str()],
        ),
        UnresolvedReason::RuleNotApplicable { kind } => Diagnostic::from_code(
            function,
            node,
            diagnostic_codes::RULE_NOT_APPLICABLE,
            &[entry.binding.as_str(), kind.name()],
        ),
        UnresolvedReason::UnliftedAwait { method } => Diagnostic::from_code(
            function,
            node,
            diagnostic_codes::UNLIFTED_AWAIT,
            &[method.as_str(), entry.binding.as_str()],
        ),
    }
}
