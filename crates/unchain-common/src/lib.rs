//! Common types and utilities for the unchain rewrite engine.
//!
//! This crate provides foundational pieces shared by all unchain crates:
//! - Engine limits and thresholds (`limits`)
//! - Diagnostic codes, categories and message templates (`diagnostics`)
//! - Qualified names of the producer library and the coroutine bridge (`names`)

// Centralized limits and thresholds
pub mod limits;

// Diagnostic types and message lookup
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, diagnostic_codes, format_message};

// Well-known qualified names
pub mod names;
