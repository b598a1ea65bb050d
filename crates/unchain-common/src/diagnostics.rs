//! Diagnostic types and message lookup for the rewrite engine.
//!
//! The engine never fails on shapes it does not recognise; it leaves them in
//! place and records a diagnostic instead. Hosts surface these next to the
//! quick-fix that triggered the transform.

use serde::Serialize;

// =============================================================================
// Diagnostic Types
// =============================================================================

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
    Suggestion = 2,
    Message = 3,
}

/// A diagnostic produced while transforming one function.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Name of the function being transformed.
    pub function: String,
    /// Arena index of the node the diagnostic is attached to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<u32>,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
}

impl Diagnostic {
    /// Create a diagnostic from a message definition and its arguments.
    #[must_use]
    pub fn from_code(function: impl Into<String>, node: Option<u32>, code: u32, args: &[&str]) -> Self {
        let (category, template) = get_diagnostic_message(code)
            .map(|m| (m.category, m.message))
            .unwrap_or((DiagnosticCategory::Error, "{0}"));
        Self {
            function: function.into(),
            node,
            message_text: format_message(template, args),
            category,
            code,
        }
    }
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// A diagnostic message definition with code, category, and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

pub mod diagnostic_codes {
    pub const FUNCTION_NOT_ELIGIBLE: u32 = 9001;
    pub const PARTIAL_TRANSFORM: u32 = 9002;
    pub const UNSUPPORTED_COMBINATOR: u32 = 9003;
    pub const SHARED_PRODUCER: u32 = 9004;
    pub const UNRESOLVED_REFERENCE: u32 = 9005;
    pub const RULE_NOT_APPLICABLE: u32 = 9006;
    pub const UNLIFTED_AWAIT: u32 = 9007;
}

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: diagnostic_codes::FUNCTION_NOT_ELIGIBLE,
        category: DiagnosticCategory::Error,
        message: "Function '{0}' does not return '{1}'.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::PARTIAL_TRANSFORM,
        category: DiagnosticCategory::Warning,
        message: "Function '{0}' was only partially transformed: {1} suspension point(s) still await a combinator chain.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::UNSUPPORTED_COMBINATOR,
        category: DiagnosticCategory::Warning,
        message: "Combinator '{0}' initializing '{1}' has no rewrite rule.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::SHARED_PRODUCER,
        category: DiagnosticCategory::Warning,
        message: "Producer '{0}' is referenced {1} times and cannot be awaited in place.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::UNRESOLVED_REFERENCE,
        category: DiagnosticCategory::Message,
        message: "Reference '{0}' does not resolve to a local binding.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::RULE_NOT_APPLICABLE,
        category: DiagnosticCategory::Warning,
        message: "Binding '{0}' matches '{1}' but its arguments have an unsupported shape.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::UNLIFTED_AWAIT,
        category: DiagnosticCategory::Warning,
        message: "Combinator '{0}' in '{1}' is awaited through an expression that could not be lifted.",
    },
];

/// Look up a diagnostic message definition by code.
#[must_use]
pub fn get_diagnostic_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

/// Get the message template for a diagnostic code.
#[must_use]
pub fn get_message_template(code: u32) -> Option<&'static str> {
    get_diagnostic_message(code).map(|m| m.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_message_replaces_placeholders() {
        let text = format_message("Producer '{0}' is referenced {1} times", &["x", "2"]);
        assert_eq!(text, "Producer 'x' is referenced 2 times");
    }

    #[test]
    fn test_from_code_uses_catalog_category() {
        let diag = Diagnostic::from_code(
            "load",
            Some(7),
            diagnostic_codes::UNSUPPORTED_COMBINATOR,
            &["cache", "x"],
        );
        assert_eq!(diag.category, DiagnosticCategory::Warning);
        assert_eq!(diag.message_text, "Combinator 'cache' initializing 'x' has no rewrite rule.");
        assert_eq!(diag.node, Some(7));
    }

    #[test]
    fn test_diagnostic_serializes_without_missing_node() {
        let diag = Diagnostic::from_code("f", None, diagnostic_codes::PARTIAL_TRANSFORM, &["f", "1"]);
        let json = serde_json::to_string(&diag).expect("diagnostic should serialize");
        assert!(!json.contains("\"node\""), "unexpected node field: {json}");
        assert!(json.contains("\"code\":9002"));
    }

    #[test]
    fn test_unknown_code_falls_back_to_first_argument() {
        let diag = Diagnostic::from_code("f", None, 1, &["raw text"]);
        assert_eq!(diag.message_text, "raw text");
        assert!(get_message_template(1).is_none());
    }
}
