//! Transform configuration.

use serde::{Deserialize, Serialize};
use unchain_common::{limits, names};

/// Options controlling one transform.
///
/// Deserializes from camelCase JSON; every field is optional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformOptions {
    /// Qualified name of the single-value producer type being eliminated.
    pub producer_type: String,
    /// Types whose expressions are introduced as bindings before lifting.
    pub extractable_types: Vec<String>,
    /// Suspension call appended to awaited producers.
    pub await_function: String,
    /// Coroutine builder the function body is wrapped in.
    pub coroutine_builder: String,
    /// Constructor used to pair two zipped values.
    pub pair_constructor: String,
    /// Receiver of the `of` factory used to combine three zipped values.
    pub tuple_factory: String,
    /// Run pre-lift extraction.
    pub extract: bool,
    /// Run the post-rewrite optimizer.
    pub optimize: bool,
    pub passes: OptimizerPasses,
    /// Bound on every fixed-point loop.
    pub iteration_limit: usize,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            producer_type: names::MONO.to_string(),
            extractable_types: vec![names::MONO.to_string(), names::FLUX.to_string()],
            await_function: names::AWAIT_FIRST_OR_NULL.to_string(),
            coroutine_builder: names::MONO_BUILDER.to_string(),
            pair_constructor: names::simple_name(names::PAIR).to_string(),
            tuple_factory: names::simple_name(names::TUPLES).to_string(),
            extract: true,
            optimize: true,
            passes: OptimizerPasses::default(),
            iteration_limit: limits::MAX_LIFT_ITERATIONS,
        }
    }
}

impl TransformOptions {
    /// Options with the optimizer disabled; the output is the raw lifted form.
    pub fn unoptimized() -> Self {
        Self {
            optimize: false,
            ..Self::default()
        }
    }

    pub fn is_extractable(&self, type_name: &str) -> bool {
        self.extractable_types.iter().any(|t| t == type_name)
    }
}

/// Per-pass switches for the post-rewrite optimizer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OptimizerPasses {
    pub flatten_run: bool,
    pub useless_elvis: bool,
    pub exact_copies: bool,
    pub let_return: bool,
    pub nullable_let: bool,
    pub single_use: bool,
    pub redeclarations: bool,
}

impl Default for OptimizerPasses {
    fn default() -> Self {
        Self {
            flatten_run: true,
            useless_elvis: true,
            exact_copies: true,
            let_return: true,
            nullable_let: true,
            single_use: true,
            redeclarations: true,
        }
    }
}

impl OptimizerPasses {
    /// Only the renaming pass; leaves the lifted shape intact but hygienic.
    pub fn hygiene_only() -> Self {
        Self {
            flatten_run: false,
            useless_elvis: false,
            exact_copies: false,
            let_return: false,
            nullable_let: false,
            single_use: false,
            redeclarations: true,
        }
    }
}
