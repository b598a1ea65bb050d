//! Transform options from `--config` and flags.

use anyhow::{Context, Result};
use std::path::Path;
use unchain_rewrite::TransformOptions;

use crate::args::CliArgs;

/// Parse a JSON options file.
pub fn load_options(path: &Path) -> Result<TransformOptions> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_options(&text).with_context(|| format!("invalid config {}", path.display()))
}

pub fn parse_options(text: &str) -> Result<TransformOptions> {
    let options: TransformOptions = serde_json::from_str(text)?;
    if options.iteration_limit == 0 {
        anyhow::bail!("iterationLimit must be at least 1");
    }
    Ok(options)
}

/// Options file (or defaults) with command-line overrides applied.
pub fn resolve_options(args: &CliArgs) -> Result<TransformOptions> {
    let mut options = match &args.config {
        Some(path) => load_options(path)?,
        None => TransformOptions::default(),
    };
    if args.no_optimize {
        options.optimize = false;
    }
    Ok(options)
}
