//! Signature catalog: the closed set of producer methods the engine knows how
//! to lift.
//!
//! A call matches an entry when its resolved target is owned by the producer
//! type and its erased signature (name, static-ness, parameter shapes) is
//! structurally equal to the entry's.

use serde::Serialize;
use std::fmt;
use unchain_tree::{MethodRef, ParamShape};

/// Classification of a binding's initializer shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CombinatorKind {
    Map,
    FlatMap,
    FlatMapMany,
    Filter,
    FilterWhen,
    SwitchIfEmpty,
    Zip2,
    Zip3,
    ThenReturn,
    Then,
    Defer,
    Just,
    JustOrEmpty,
    Empty,
    OnErrorReturnTyped,
    OnErrorReturnAny,
    Elvis,
    LetBlock,
    RunBlock,
    IfExpr,
    SimpleAlias,
}

impl CombinatorKind {
    pub fn name(self) -> &'static str {
        match self {
            CombinatorKind::Map => "map",
            CombinatorKind::FlatMap => "flatMap",
            CombinatorKind::FlatMapMany => "flatMapMany",
            CombinatorKind::Filter => "filter",
            CombinatorKind::FilterWhen => "filterWhen",
            CombinatorKind::SwitchIfEmpty => "switchIfEmpty",
            CombinatorKind::Zip2 => "zip/2",
            CombinatorKind::Zip3 => "zip/3",
            CombinatorKind::ThenReturn => "thenReturn",
            CombinatorKind::Then => "then",
            CombinatorKind::Defer => "defer",
            CombinatorKind::Just => "just",
            CombinatorKind::JustOrEmpty => "justOrEmpty",
            CombinatorKind::Empty => "empty",
            CombinatorKind::OnErrorReturnTyped => "onErrorReturn(type)",
            CombinatorKind::OnErrorReturnAny => "onErrorReturn",
            CombinatorKind::Elvis => "elvis",
            CombinatorKind::LetBlock => "let",
            CombinatorKind::RunBlock => "run",
            CombinatorKind::IfExpr => "if",
            CombinatorKind::SimpleAlias => "alias",
        }
    }

    /// Structural kinds rewrite the initializer in place and keep the
    /// binding; the others replace the binding with spliced statements.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            CombinatorKind::Elvis
                | CombinatorKind::LetBlock
                | CombinatorKind::RunBlock
                | CombinatorKind::IfExpr
                | CombinatorKind::SimpleAlias
        )
    }
}

impl fmt::Display for CombinatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One catalog entry.
#[derive(Debug)]
pub struct Signature {
    pub kind: CombinatorKind,
    pub name: &'static str,
    pub is_static: bool,
    pub params: &'static [ParamShape],
}

impl Signature {
    /// Structural equality against a resolved method (owner checked by the
    /// caller).
    pub fn matches(&self, method: &MethodRef) -> bool {
        self.name == method.name
            && self.is_static == method.is_static
            && self.params == method.params.as_slice()
    }

    /// A method reference on `owner` with this signature, for synthesized
    /// calls.
    pub fn method_ref(&self, owner: &str) -> MethodRef {
        let params = self.params.to_vec();
        if self.is_static {
            MethodRef::static_method(owner, self.name, params)
        } else {
            MethodRef::instance(owner, self.name, params)
        }
    }
}

use ParamShape::{BiFunction, Class, Function, Predicate, Producer, Supplier, TypeVar};

/// Catalog in match order. Overloads differ structurally (arity or shape),
/// never by position.
pub static CATALOG: &[Signature] = &[
    Signature { kind: CombinatorKind::Map, name: "map", is_static: false, params: &[Function] },
    Signature { kind: CombinatorKind::FlatMap, name: "flatMap", is_static: false, params: &[Function] },
    Signature { kind: CombinatorKind::FlatMapMany, name: "flatMapMany", is_static: false, params: &[Function] },
    Signature { kind: CombinatorKind::Zip2, name: "zip", is_static: true, params: &[Producer, Producer, BiFunction] },
    Signature { kind: CombinatorKind::Zip3, name: "zip", is_static: true, params: &[Producer, Producer, Producer] },
    Signature { kind: CombinatorKind::Filter, name: "filter", is_static: false, params: &[Predicate] },
    Signature { kind: CombinatorKind::FilterWhen, name: "filterWhen", is_static: false, params: &[Function] },
    Signature { kind: CombinatorKind::SwitchIfEmpty, name: "switchIfEmpty", is_static: false, params: &[Producer] },
    Signature { kind: CombinatorKind::ThenReturn, name: "thenReturn", is_static: false, params: &[TypeVar] },
    Signature { kind: CombinatorKind::Then, name: "then", is_static: false, params: &[Producer] },
    Signature { kind: CombinatorKind::Defer, name: "defer", is_static: true, params: &[Supplier] },
    Signature { kind: CombinatorKind::Just, name: "just", is_static: true, params: &[TypeVar] },
    Signature { kind: CombinatorKind::JustOrEmpty, name: "justOrEmpty", is_static: true, params: &[TypeVar] },
    Signature { kind: CombinatorKind::Empty, name: "empty", is_static: true, params: &[] },
    Signature { kind: CombinatorKind::OnErrorReturnTyped, name: "onErrorReturn", is_static: false, params: &[Class, TypeVar] },
    Signature { kind: CombinatorKind::OnErrorReturnAny, name: "onErrorReturn", is_static: false, params: &[TypeVar] },
];

/// Classify a resolved call target against the catalog.
///
/// Returns `None` when the owner is not `producer_type` or no entry matches.
pub fn classify(method: &MethodRef, producer_type: &str) -> Option<CombinatorKind> {
    if method.owner != producer_type {
        return None;
    }
    CATALOG.iter().find(|s| s.matches(method)).map(|s| s.kind)
}

/// Catalog entry for `kind`, if it is a catalog kind.
pub fn signature(kind: CombinatorKind) -> Option<&'static Signature> {
    CATALOG.iter().find(|s| s.kind == kind)
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
