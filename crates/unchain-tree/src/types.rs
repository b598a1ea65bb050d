//! Type references and resolved method signatures.
//!
//! The tree never type-checks anything; these are the facts a host hands the
//! engine about declared types and call targets.

use serde::{Deserialize, Serialize};
use std::fmt;
use unchain_common::names;

/// A (possibly generic, possibly nullable) type reference.
///
/// `name` is fully qualified for library types (`reactor.core.publisher.Mono`)
/// and simple for local ones.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<TypeRef>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            nullable: false,
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            args,
            nullable: false,
        }
    }

    /// `Mono<arg>`
    pub fn mono(arg: TypeRef) -> Self {
        Self::generic(names::MONO, vec![arg])
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Whether this is the single-value producer type.
    #[inline]
    pub fn is_mono(&self) -> bool {
        self.name == names::MONO
    }

    /// Whether this is any reactive publisher (`Mono` or `Flux`).
    #[inline]
    pub fn is_publisher(&self) -> bool {
        self.name == names::MONO || self.name == names::FLUX
    }

    pub fn simple_name(&self) -> &str {
        names::simple_name(&self.name)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.simple_name())?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        if self.nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}

// =============================================================================
// Method signatures
// =============================================================================

/// Shape of one declared parameter of a resolved method.
///
/// Only the shapes the combinator catalog distinguishes get their own variant;
/// everything else is `Named` with its qualified type name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamShape {
    /// An unconstrained type variable (`T`).
    TypeVar,
    /// `Class<E>`
    Class,
    /// `Function<T, R>`
    Function,
    /// `BiFunction<T, U, R>`
    BiFunction,
    /// `Predicate<T>`
    Predicate,
    /// `Supplier<T>`
    Supplier,
    /// `Mono<T>`, a single-value producer argument.
    Producer,
    /// `Publisher<T>`, any reactive-streams publisher.
    Publisher,
    /// `Optional<T>`
    Optional,
    Named(String),
}

/// The resolved target of a call: owner, name and declared parameter shapes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodRef {
    /// Fully qualified owner type.
    pub owner: String,
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamShape>,
    #[serde(default)]
    pub is_static: bool,
    /// Declared return type, when the host knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<TypeRef>,
}

impl MethodRef {
    pub fn instance(owner: impl Into<String>, name: impl Into<String>, params: Vec<ParamShape>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            params,
            is_static: false,
            returns: None,
        }
    }

    pub fn static_method(
        owner: impl Into<String>,
        name: impl Into<String>,
        params: Vec<ParamShape>,
    ) -> Self {
        Self {
            is_static: true,
            ..Self::instance(owner, name, params)
        }
    }

    #[must_use]
    pub fn returning(mut self, ty: TypeRef) -> Self {
        self.returns = Some(ty);
        self
    }

    /// Whether this method is declared on the single-value producer type.
    #[inline]
    pub fn is_mono_member(&self) -> bool {
        self.owner == names::MONO
    }

    /// Whether the declared result is a reactive publisher.
    pub fn returns_publisher(&self) -> bool {
        self.returns.as_ref().is_some_and(TypeRef::is_publisher)
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}/{}", names::simple_name(&self.owner), self.name, self.params.len())
    }
}
