//! Output rendering: the printed function, diagnostics and the `--report`
//! summary.

use colored::Colorize;
use serde_json::json;
use unchain_common::diagnostics::{Diagnostic, DiagnosticCategory};
use unchain_rewrite::{OptimizerStats, TransformReport, UnresolvedReason};

use crate::args::OutputFormat;
use crate::driver::Outcome;

pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter { color }
    }

    /// What goes to stdout.
    pub fn render(&self, outcome: &Outcome, format: OutputFormat, with_report: bool) -> serde_json::Result<String> {
        match format {
            OutputFormat::Text => Ok(self.render_text(outcome, with_report)),
            OutputFormat::Json => render_json(outcome, with_report),
        }
    }

    fn render_text(&self, outcome: &Outcome, with_report: bool) -> String {
        let mut out = outcome.source.clone();
        out.push('\n');
        if with_report {
            out.push('\n');
            out.push_str(&self.format_summary(&outcome.report));
        }
        out
    }

    /// Diagnostics, one per line, for stderr.
    pub fn render_diagnostics(&self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();
        for diagnostic in diagnostics {
            out.push_str(&self.format_diagnostic(diagnostic));
            out.push('\n');
        }
        out
    }

    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        format!(
            "{} - {} {}: {}",
            diagnostic.function,
            self.format_category(diagnostic.category),
            self.format_code(diagnostic.code),
            diagnostic.message_text
        )
    }

    pub fn format_summary(&self, report: &TransformReport) -> String {
        let status = if report.is_complete() { "complete" } else { "partial" };
        let status = match (self.color, report.is_complete()) {
            (false, _) => status.to_string(),
            (true, true) => status.green().bold().to_string(),
            (true, false) => status.yellow().bold().to_string(),
        };
        let mut out = format!("{}: {status}\n", report.function);
        out.push_str(&format!(
            "  wrapped: {}, extracted: {}, iterations: {}\n",
            if report.wrapped { "yes" } else { "no" },
            report.extracted,
            report.iterations
        ));

        let applied: Vec<String> = report
            .applied
            .iter()
            .map(|a| format!("{} {}", a.kind, a.binding))
            .collect();
        out.push_str(&format!("  applied: {}\n", list_or_none(&applied)));

        if !report.unresolved.is_empty() {
            let unresolved: Vec<String> = report
                .unresolved
                .iter()
                .map(|u| format!("{} ({})", u.binding, describe_reason(&u.reason)))
                .collect();
            out.push_str(&format!("  unresolved: {}\n", unresolved.join(", ")));
        }

        out.push_str(&format!("  optimizer: {}\n", list_or_none(&optimizer_counts(&report.optimizer))));
        out
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = match category {
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Suggestion => "suggestion",
            DiagnosticCategory::Message => "message",
        };

        if !self.color {
            return label.to_string();
        }

        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
            DiagnosticCategory::Suggestion => label.blue().bold().to_string(),
            DiagnosticCategory::Message => label.cyan().bold().to_string(),
        }
    }

    fn format_code(&self, code: u32) -> String {
        let label = format!("UC{code}");
        if self.color {
            label.bright_blue().to_string()
        } else {
            label
        }
    }
}

fn render_json(outcome: &Outcome, with_report: bool) -> serde_json::Result<String> {
    let mut value = json!({
        "source": outcome.source,
        "complete": outcome.report.is_complete(),
        "diagnostics": outcome.report.diagnostics,
    });
    if with_report {
        value["report"] = serde_json::to_value(&outcome.report)?;
    }
    serde_json::to_string_pretty(&value)
}

fn describe_reason(reason: &UnresolvedReason) -> String {
    match reason {
        UnresolvedReason::SharedProducer { references } => format!("shared by {references} references"),
        UnresolvedReason::UnsupportedCombinator { method } => format!("unsupported combinator '{method}'"),
        UnresolvedReason::RuleNotApplicable { kind } => format!("{kind} arguments not supported"),
        UnresolvedReason::UnliftedAwait { method } => format!("'{method}' awaited through an expression"),
    }
}

fn optimizer_counts(stats: &OptimizerStats) -> Vec<String> {
    [
        ("flatten run", stats.flattened_runs),
        ("useless elvis", stats.useless_elvis),
        ("exact copies", stats.exact_copies),
        ("let return", stats.let_returns),
        ("nullable let", stats.nullable_lets),
        ("single use", stats.single_use),
        ("redeclarations", stats.renamed),
    ]
    .into_iter()
    .filter(|&(_, count)| count > 0)
    .map(|(pass, count)| format!("{pass} {count}"))
    .collect()
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}
