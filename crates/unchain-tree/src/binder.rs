//! Lexical name resolution.
//!
//! Links every `NameRef` to the declaration it denotes: a `Property`
//! declared earlier in an enclosing block, a function/lambda/catch `Param`,
//! a destructuring entry, or the `Lambda` itself for an implicit `it`.
//! Names with no local declaration stay `NONE` (types, top-level
//! functions).

use crate::node::*;
use tracing::trace;

/// Resolve `name` as seen from `at`, walking outward through enclosing
/// scopes. Only declarations that precede `at` in their block are visible.
pub fn lexical_lookup(arena: &NodeArena, at: NodeIndex, name: &str) -> NodeIndex {
    let mut child = at;
    for ancestor in arena.ancestors(at) {
        let Some(kind) = arena.kind(ancestor) else {
            break;
        };
        match kind {
            NodeKind::Block(block) => {
                let end = block
                    .statements
                    .iter()
                    .position(|&s| s == child)
                    .unwrap_or(block.statements.len());
                for &statement in block.statements[..end].iter().rev() {
                    if let Some(found) = declaration_in_statement(arena, statement, name) {
                        return found;
                    }
                }
            }
            NodeKind::Lambda(lambda) if child == lambda.body => {
                if lambda.params.is_empty() {
                    if name == "it" {
                        return ancestor;
                    }
                } else if let Some(found) = lambda
                    .params
                    .iter()
                    .flat_map(|p| p.declarations().iter().copied())
                    .find(|&p| arena.declared_name(p) == Some(name))
                {
                    return found;
                }
            }
            NodeKind::Function(function) if child == function.body => {
                if let Some(&found) = function
                    .params
                    .iter()
                    .find(|&&p| arena.declared_name(p) == Some(name))
                {
                    return found;
                }
            }
            NodeKind::Try(t) if child == t.handler => {
                if arena.declared_name(t.catch_param) == Some(name) {
                    return t.catch_param;
                }
            }
            _ => {}
        }
        child = ancestor;
    }
    NodeIndex::NONE
}

fn declaration_in_statement(arena: &NodeArena, statement: NodeIndex, name: &str) -> Option<NodeIndex> {
    match arena.kind(statement)? {
        NodeKind::Property(p) if p.name == name => Some(statement),
        NodeKind::Destructuring(d) => d
            .entries
            .iter()
            .copied()
            .find(|&e| arena.declared_name(e) == Some(name)),
        _ => None,
    }
}

/// Whether `name_ref` is the selector of a qualified expression
/// (`x.name`), which is a member access, not a local reference.
fn is_member_selector(arena: &NodeArena, name_ref: NodeIndex) -> bool {
    arena
        .get_qualified(arena.parent(name_ref))
        .is_some_and(|q| q.selector == name_ref)
}

/// Link every unbound reference under `root`. Existing links are kept.
pub fn bind(arena: &mut NodeArena, root: NodeIndex) {
    let mut links = Vec::new();
    for idx in arena.descendants(root) {
        let Some(data) = arena.get_name_ref(idx) else {
            continue;
        };
        if data.binding.is_some() || is_member_selector(arena, idx) {
            continue;
        }
        let target = lexical_lookup(arena, idx, &data.name);
        if target.is_some() {
            links.push((idx, target));
        }
    }
    trace!(root = root.0, linked = links.len(), "bind");
    for (reference, declaration) in links {
        arena.set_binding(reference, declaration);
    }
}
