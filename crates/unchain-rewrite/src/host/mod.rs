//! Collaborators the engine consumes from its host.
//!
//! The engine never inspects types, diagnostics or scopes on its own; it asks
//! these interfaces. [`Host::standard`] wires in-crate implementations that
//! work off the arena alone, which is enough for fixtures and tests.

mod analysis;
mod naming;
mod resolver;
mod scope;

pub use analysis::{HostDiagnostic, HostDiagnosticKind, StaticAnalyzer};
pub use naming::KotlinNameSuggester;
pub use resolver::ArenaResolver;
pub use scope::{DirectWrite, Journal};

use crate::error::RewriteError;
use crate::options::TransformOptions;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use unchain_tree::{MethodRef, NodeArena, NodeIndex, TypeRef};

/// Symbol identity and type queries.
pub trait SymbolResolver {
    /// Declaration a name reference binds to.
    fn resolve_reference(&self, arena: &NodeArena, name_ref: NodeIndex) -> Option<NodeIndex>;

    /// Method a bare or qualified call resolves to.
    fn resolve_call(&self, arena: &NodeArena, call: NodeIndex) -> Option<MethodRef>;

    /// Static type of an expression, when known.
    fn expression_type(&self, arena: &NodeArena, expr: NodeIndex) -> Option<TypeRef>;
}

/// Analysis warnings attached to a node.
pub trait DiagnosticOracle {
    fn diagnostics(&self, arena: &NodeArena, node: NodeIndex) -> SmallVec<[HostDiagnostic; 2]>;

    fn has(&self, arena: &NodeArena, node: NodeIndex, kind: HostDiagnosticKind) -> bool {
        self.diagnostics(arena, node).iter().any(|d| d.kind == kind)
    }
}

/// Identifier suggestions for fresh and renamed bindings.
pub trait NameSuggester {
    /// Candidate names for `node`, best first, none of them in `excluded`.
    fn suggest(&self, arena: &NodeArena, node: NodeIndex, excluded: &FxHashSet<String>) -> Vec<String>;
}

/// Exclusive write access to the tree.
pub trait MutationScope {
    /// Run one all-or-nothing edit.
    fn write(
        &mut self,
        arena: &mut NodeArena,
        edit: &mut dyn FnMut(&mut NodeArena) -> Result<(), RewriteError>,
    ) -> Result<(), RewriteError>;

    /// Start a new user operation.
    fn begin(&mut self) {}

    /// Revert every write since [`begin`](Self::begin). Returns whether
    /// anything was reverted.
    fn undo(&mut self, _arena: &mut NodeArena) -> bool {
        false
    }
}

/// The four collaborators bundled.
pub struct Host {
    pub resolver: Box<dyn SymbolResolver>,
    pub oracle: Box<dyn DiagnosticOracle>,
    pub names: Box<dyn NameSuggester>,
    pub scope: Box<dyn MutationScope>,
}

impl Host {
    /// Arena-only collaborators with an undo journal.
    pub fn standard() -> Self {
        Self {
            resolver: Box::new(ArenaResolver),
            oracle: Box::new(StaticAnalyzer),
            names: Box::new(KotlinNameSuggester),
            scope: Box::new(Journal::default()),
        }
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: impl SymbolResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    #[must_use]
    pub fn with_oracle(mut self, oracle: impl DiagnosticOracle + 'static) -> Self {
        self.oracle = Box::new(oracle);
        self
    }

    #[must_use]
    pub fn with_names(mut self, names: impl NameSuggester + 'static) -> Self {
        self.names = Box::new(names);
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl MutationScope + 'static) -> Self {
        self.scope = Box::new(scope);
        self
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::standard()
    }
}

/// Read-only view of the host plus options, handed to every rule and pass.
#[derive(Clone, Copy)]
pub struct Env<'a> {
    pub resolver: &'a dyn SymbolResolver,
    pub oracle: &'a dyn DiagnosticOracle,
    pub names: &'a dyn NameSuggester,
    pub options: &'a TransformOptions,
}

impl<'a> Env<'a> {
    pub fn new(host: &'a Host, options: &'a TransformOptions) -> Self {
        Self {
            resolver: &*host.resolver,
            oracle: &*host.oracle,
            names: &*host.names,
            options,
        }
    }

    /// Best suggestion for `node` with no exclusions. Rules use this for
    /// fresh bindings and leave collisions to the renaming pass.
    pub fn base_name(&self, arena: &NodeArena, node: NodeIndex) -> String {
        self.names
            .suggest(arena, node, &FxHashSet::default())
            .into_iter()
            .next()
            .unwrap_or_else(|| naming::FALLBACK_NAME.to_string())
    }

    /// Whether `expr` is known to be of a non-producer type, or is a shape
    /// that never holds a producer (`null`, jumps, literals).
    pub fn is_direct_value(&self, arena: &NodeArena, expr: NodeIndex) -> bool {
        use unchain_tree::NodeKind;
        match arena.kind(expr) {
            Some(NodeKind::Literal(_) | NodeKind::Return(_) | NodeKind::ClassLiteral(_)) => true,
            Some(_) => self
                .resolver
                .expression_type(arena, expr)
                .is_some_and(|ty| !self.options.is_extractable(&ty.name)),
            None => true,
        }
    }

    /// Whether `expr` is statically known to be nullable.
    pub fn is_nullable(&self, arena: &NodeArena, expr: NodeIndex) -> bool {
        self.resolver
            .expression_type(arena, expr)
            .is_some_and(|ty| ty.nullable)
    }
}
