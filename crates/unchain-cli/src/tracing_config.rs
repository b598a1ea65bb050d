//! Tracing setup for the `unchain` binary.
//!
//! `UNCHAIN_LOG` (falling back to `RUST_LOG`) holds an `EnvFilter` directive;
//! `UNCHAIN_LOG_FORMAT` picks the output:
//!
//! - `text` (default): flat `fmt` lines
//! - `tree`: indented spans via `tracing-tree`, one level per rule or pass
//! - `json`: one JSON object per event
//!
//! ```bash
//! UNCHAIN_LOG=debug UNCHAIN_LOG_FORMAT=tree unchain load.json
//! UNCHAIN_LOG="unchain_rewrite::optimizer=trace" unchain load.json --report
//! ```
//!
//! Nothing is installed unless one of the filter variables is set. Output
//! always goes to stderr so stdout stays the transformed function.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

const LOG_VAR: &str = "UNCHAIN_LOG";
const FORMAT_VAR: &str = "UNCHAIN_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Tree,
    Json,
}

impl LogFormat {
    /// Unknown values fall back to `Text`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Filter directive and format read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    pub directive: String,
    pub format: LogFormat,
}

impl TracingConfig {
    /// `None` when neither `UNCHAIN_LOG` nor `RUST_LOG` is set.
    pub fn from_env() -> Option<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let directive = var(LOG_VAR).or_else(|| var("RUST_LOG"))?;
        let format = var(FORMAT_VAR).map_or(LogFormat::Text, |v| LogFormat::parse(&v));
        Some(Self { directive, format })
    }
}

/// Install the global subscriber if the environment asks for one.
pub fn init_tracing() {
    let Some(config) = TracingConfig::from_env() else {
        return;
    };
    let filter = EnvFilter::builder().parse_lossy(&config.directive);

    match config.format {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_targets(true);
            Registry::default().with(filter).with(tree_layer).init();
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(json_layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
