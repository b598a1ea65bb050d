//! Read a fixture, transform it, hand back the printed result.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};
use unchain_rewrite::{Host, TransformReport, Transformer};
use unchain_tree::{FunctionDecl, NodeArena, print_function};

use crate::args::CliArgs;
use crate::config::resolve_options;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_PARTIAL: i32 = 2;

/// Result of transforming one fixture.
#[derive(Debug)]
pub struct Outcome {
    pub source: String,
    pub report: TransformReport,
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        if self.report.is_complete() {
            EXIT_SUCCESS
        } else {
            EXIT_PARTIAL
        }
    }
}

pub fn load_fixture(path: &Path) -> Result<FunctionDecl> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid fixture {}", path.display()))
}

pub fn run(args: &CliArgs) -> Result<Outcome> {
    let options = resolve_options(args)?;
    let decl = load_fixture(&args.fixture)?;
    debug!(function = %decl.name, optimize = options.optimize, "loaded fixture");
    transform(&decl, options)
}

/// Transform an already parsed function with the standard host.
pub fn transform(decl: &FunctionDecl, options: unchain_rewrite::TransformOptions) -> Result<Outcome> {
    let mut arena = NodeArena::new();
    let root = arena.lower_function(decl);
    let mut transformer = Transformer::new(options, Host::standard());
    let report = transformer
        .transform(&mut arena, root)
        .with_context(|| format!("failed to transform '{}'", decl.name))?;
    info!(
        function = %report.function,
        applied = report.applied.len(),
        unresolved = report.unresolved.len(),
        "transformed"
    );
    Ok(Outcome {
        source: print_function(&arena, root),
        report,
    })
}
