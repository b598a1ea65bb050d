//! Centralized limits and thresholds for the rewrite engine.
//!
//! Every fixed-point loop in the engine is bounded by one of the constants
//! below. The loops are expected to converge long before reaching them; a
//! limit being hit means a rule re-created the shape it consumed, which is a
//! rule-catalog defect and is reported as `RewriteError::IterationLimit`.
//!
//! # Categories
//!
//! - **Iteration Limits**: Bounds on fixed-point loops (driver, optimizer passes)
//! - **Recursion Depths**: Bounds on recursive tree walks (binder, printer)
//! - **Naming Limits**: Bounds on the fresh-name search

// =============================================================================
// Iteration Limits
// =============================================================================

/// Maximum number of successful rewrites the await-lifting driver applies to
/// one function.
///
/// Each rewrite removes one suspension-indirection, so a function needs at
/// most as many iterations as it has producer bindings (plus the bindings the
/// structural rules re-declare). 10 000 leaves room for very long generated
/// chains.
///
/// # Kotlin example
///
/// ```kotlin
/// // Every binding below costs one driver iteration:
/// val a = src.map { it + 1 }
/// val b = a.filter { it > 2 }
/// val c = b.flatMap { lookup(it) }
/// return c
/// ```
pub const MAX_LIFT_ITERATIONS: usize = 10_000;

/// Maximum number of applications of a single optimizer pass.
///
/// Optimizer passes shrink the tree (inlining, flattening) or only rename,
/// so they converge in a number of steps bounded by the number of bindings.
pub const MAX_PASS_ITERATIONS: usize = 10_000;

/// Maximum number of producer expressions the pre-lift extraction introduces
/// as bindings in one function.
pub const MAX_EXTRACTIONS: usize = 10_000;

// =============================================================================
// Recursion Depths
// =============================================================================

/// Maximum depth for recursive tree walks (binder, printer, deep clone).
///
/// Prevents stack overflow on pathologically nested inputs. Walks that hit
/// the limit stop descending; the printer emits `/* ... */` in place of the
/// elided subtree.
///
/// # Kotlin example
///
/// ```kotlin
/// // Deeply nested lambdas:
/// a?.let { b?.let { c?.let { /* ... 500 levels ... */ } } }
/// ```
pub const MAX_TREE_DEPTH: u32 = 500;

/// Maximum number of parent hops when walking from a node to an ancestor.
pub const MAX_PARENT_WALK: u32 = 10_000;

// =============================================================================
// Naming Limits
// =============================================================================

/// Maximum numeric suffix tried when making a suggested name unique
/// (`value`, `value1`, `value2`, ...).
pub const MAX_NAME_SUFFIX: u32 = 10_000;
