//! Rewrite engine turning chained `Mono` combinator functions into
//! direct-style coroutine code.
//!
//! A transform runs in four stages over one function tree:
//! - Extraction: producer expressions become named bindings (`extract`)
//! - Wrapping: the body moves into the coroutine builder (`wrapper`)
//! - Await lifting: awaited bindings are rewritten by rule until none match
//!   (`lift`, `classifier`, `rules`)
//! - Optimization: the lifted code is simplified and renamed (`optimizer`)
//!
//! Host facilities (symbol resolution, diagnostics, naming, write access)
//! come in through the traits in [`host`].

// Combinator signatures
pub mod catalog;
pub use catalog::{CATALOG, CombinatorKind, Signature};

// Binding classification
pub mod classifier;
pub use classifier::Classifier;

pub mod context;
pub use context::RewriteContext;

// Fixed-point driver shared by every stage
pub mod driver;
pub use driver::{Rewrite, run_to_fixed_point};

pub mod error;
pub use error::RewriteError;

pub mod extract;
pub use extract::Extractor;

// Host collaborators
pub mod host;
pub use host::{
    ArenaResolver, DiagnosticOracle, DirectWrite, Env, Host, HostDiagnostic, HostDiagnosticKind, Journal,
    KotlinNameSuggester, MutationScope, NameSuggester, StaticAnalyzer, SymbolResolver,
};

pub mod lift;
pub use lift::{AwaitLifter, AwaitSite, await_sites};

pub mod optimizer;
pub use optimizer::optimize;

pub mod options;
pub use options::{OptimizerPasses, TransformOptions};

pub mod report;
pub use report::{AppliedRewrite, OptimizerStats, TransformReport, UnresolvedReason, UnresolvedReference};

// Rule library
pub mod rules;

pub mod transformer;
pub use transformer::Transformer;

pub mod wrapper;

#[cfg(test)]
#[path = "tests/driver_tests.rs"]
mod driver_tests;
