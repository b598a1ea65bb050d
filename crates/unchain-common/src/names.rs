//! Qualified names the engine recognises or emits.
//!
//! Types are stored fully qualified in the tree; the printer shortens them to
//! their simple name.

/// The single-value producer type being eliminated.
pub const MONO: &str = "reactor.core.publisher.Mono";

/// The multi-value publisher type; only extracted, never awaited directly.
pub const FLUX: &str = "reactor.core.publisher.Flux";

/// Owner of the reactor tuple helpers (`Tuples.of`).
pub const TUPLES: &str = "reactor.util.function.Tuples";

/// Owner of the Kotlin scope functions (`let`, `run`) and `Pair`.
pub const KOTLIN: &str = "kotlin";

/// Owner of the coroutine builders (`async`).
pub const COROUTINES: &str = "kotlinx.coroutines";

/// Owner of the publisher await extensions (`awaitFirstOrNull`).
pub const COROUTINES_REACTIVE: &str = "kotlinx.coroutines.reactive";

/// Owner of the producer coroutine builder (`mono { }`).
pub const COROUTINES_REACTOR: &str = "kotlinx.coroutines.reactor";

pub const THROWABLE: &str = "kotlin.Throwable";
pub const ANY: &str = "kotlin.Any";
pub const BOOLEAN: &str = "kotlin.Boolean";
pub const PAIR: &str = "kotlin.Pair";
pub const DEFERRED: &str = "kotlinx.coroutines.Deferred";

pub const AWAIT_FIRST_OR_NULL: &str = "awaitFirstOrNull";
pub const AWAIT: &str = "await";
pub const ASYNC: &str = "async";
pub const LET: &str = "let";
pub const RUN: &str = "run";
pub const MONO_BUILDER: &str = "mono";

/// Imports a host should add to the file after a transform.
pub const REQUIRED_IMPORTS: &[&str] = &[
    "kotlinx.coroutines.async",
    "kotlinx.coroutines.reactive.awaitSingle",
    "kotlinx.coroutines.reactive.awaitFirstOrNull",
    "reactor.util.function.Tuples",
];

/// Simple (unqualified) part of a qualified name.
#[must_use]
pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}
