use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the unchain binary.
#[derive(Parser, Debug)]
#[command(
    name = "unchain",
    version,
    about = "Rewrite chained Mono combinators into direct-style coroutine code"
)]
pub struct CliArgs {
    /// Function to transform: a serialized function declaration (JSON).
    pub fixture: PathBuf,

    /// Transform options (JSON). Omitted fields keep their defaults.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Print the raw lifted form; skip the post-rewrite optimizer.
    #[arg(long = "no-optimize")]
    pub no_optimize: bool,

    /// Print a summary of applied rewrites, unresolved references and
    /// optimizer counts after the function.
    #[arg(long)]
    pub report: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, ignore_case = true)]
    pub format: OutputFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
