//! Name suggestions derived from expression shape.

use super::NameSuggester;
use rustc_hash::FxHashSet;
use unchain_common::limits::{MAX_NAME_SUFFIX, MAX_TREE_DEPTH};
use unchain_common::names;
use unchain_tree::{NodeArena, NodeIndex, NodeKind};

pub(crate) const FALLBACK_NAME: &str = "value";

/// Number of candidates returned per request.
const CANDIDATES: usize = 3;

const KEYWORDS: &[&str] = &[
    "as", "break", "class", "continue", "do", "else", "false", "for", "fun", "if", "in", "interface",
    "is", "null", "object", "package", "return", "super", "this", "throw", "true", "try", "typealias",
    "typeof", "val", "var", "when", "while",
];

/// Default [`NameSuggester`].
///
/// Declarations suggest their own name. Expressions suggest the referenced
/// name, the selector name, or the callee with a `get` prefix stripped; an
/// await call suggests after its receiver. Exclusions are dodged with
/// numeric suffixes.
#[derive(Clone, Copy, Debug, Default)]
pub struct KotlinNameSuggester;

impl NameSuggester for KotlinNameSuggester {
    fn suggest(&self, arena: &NodeArena, node: NodeIndex, excluded: &FxHashSet<String>) -> Vec<String> {
        let mut base = base_name(arena, node, 0);
        if base.is_empty() || KEYWORDS.contains(&base.as_str()) {
            base = FALLBACK_NAME.to_string();
        }
        let mut out = Vec::with_capacity(CANDIDATES);
        if !excluded.contains(&base) {
            out.push(base.clone());
        }
        let mut suffix = 1;
        while out.len() < CANDIDATES && suffix <= MAX_NAME_SUFFIX {
            let candidate = format!("{base}{suffix}");
            if !excluded.contains(&candidate) {
                out.push(candidate);
            }
            suffix += 1;
        }
        out
    }
}

fn is_await_call(callee: &str) -> bool {
    callee == names::AWAIT || callee.starts_with("await")
}

fn base_name(arena: &NodeArena, node: NodeIndex, depth: u32) -> String {
    if depth > MAX_TREE_DEPTH {
        return String::new();
    }
    match arena.kind(node) {
        Some(NodeKind::Property(_) | NodeKind::Param(_)) => {
            arena.declared_name(node).unwrap_or_default().to_string()
        }
        Some(NodeKind::NameRef(r)) => r.name.clone(),
        Some(NodeKind::Call(c)) => from_callee(&c.callee),
        Some(NodeKind::Qualified(q)) => match arena.kind(q.selector) {
            Some(NodeKind::Call(c)) if is_await_call(&c.callee) => base_name(arena, q.receiver, depth + 1),
            Some(NodeKind::Call(c)) => from_callee(&c.callee),
            Some(NodeKind::NameRef(r)) => r.name.clone(),
            _ => String::new(),
        },
        _ => String::new(),
    }
}

fn from_callee(callee: &str) -> String {
    let stripped = match callee.strip_prefix("get") {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_uppercase()) => rest,
        _ => callee,
    };
    decapitalize(stripped)
}

fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
#[path = "../tests/naming_tests.rs"]
mod tests;
