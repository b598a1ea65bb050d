//! Conservative static analysis standing in for the host's inspections.

use super::DiagnosticOracle;
use smallvec::SmallVec;
use unchain_tree::binder::lexical_lookup;
use unchain_tree::{BinaryOp, Literal, NodeArena, NodeIndex, NodeKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostDiagnosticKind {
    /// Left operand of `?:` is never null.
    UselessElvis,
    /// Right operand of `?:` is the `null` literal.
    UselessElvisRightIsNull,
    /// Two declarations in the same block share a name.
    Redeclaration,
    /// A declaration captures, by name, a later reference bound elsewhere.
    ShadowedReference,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostDiagnostic {
    pub kind: HostDiagnosticKind,
    pub node: NodeIndex,
}

/// Default [`DiagnosticOracle`].
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticAnalyzer;

impl DiagnosticOracle for StaticAnalyzer {
    fn diagnostics(&self, arena: &NodeArena, node: NodeIndex) -> SmallVec<[HostDiagnostic; 2]> {
        let mut out = SmallVec::new();
        let mut push = |kind| out.push(HostDiagnostic { kind, node });
        match arena.kind(node) {
            Some(NodeKind::Binary(b)) if b.op == BinaryOp::Elvis => {
                if arena.is_null_literal(b.right) {
                    push(HostDiagnosticKind::UselessElvisRightIsNull);
                } else if is_never_null(arena, b.left) {
                    push(HostDiagnosticKind::UselessElvis);
                }
            }
            Some(NodeKind::Property(_) | NodeKind::Param(_)) => {
                if redeclares(arena, node) {
                    push(HostDiagnosticKind::Redeclaration);
                }
                if captures_foreign_reference(arena, node) {
                    push(HostDiagnosticKind::ShadowedReference);
                }
            }
            _ => {}
        }
        out
    }
}

fn is_never_null(arena: &NodeArena, expr: NodeIndex) -> bool {
    match arena.kind(expr) {
        Some(NodeKind::Literal(lit)) => *lit != Literal::Null,
        Some(NodeKind::ClassLiteral(_)) => true,
        Some(NodeKind::NameRef(r)) => match arena.kind(r.binding) {
            Some(NodeKind::Property(p)) => p.ty.as_ref().is_some_and(|t| !t.nullable),
            Some(NodeKind::Param(p)) => p.ty.as_ref().is_some_and(|t| !t.nullable),
            _ => false,
        },
        Some(NodeKind::Binary(b)) => match b.op {
            BinaryOp::Elvis => is_never_null(arena, b.right),
            _ => true,
        },
        _ => false,
    }
}

/// Block in which a declaration is visible, and the statement declaring it.
fn declaring_statement(arena: &NodeArena, declaration: NodeIndex) -> Option<(NodeIndex, NodeIndex)> {
    let parent = arena.parent(declaration);
    match arena.kind(parent)? {
        NodeKind::Block(_) => Some((parent, declaration)),
        NodeKind::Destructuring(_) => {
            let block = arena.parent(parent);
            arena.get_block(block).map(|_| (block, parent))
        }
        _ => None,
    }
}

fn names_declared_by(arena: &NodeArena, statement: NodeIndex) -> SmallVec<[&str; 2]> {
    match arena.kind(statement) {
        Some(NodeKind::Property(p)) => smallvec::smallvec![p.name.as_str()],
        Some(NodeKind::Destructuring(d)) => d
            .entries
            .iter()
            .filter_map(|&e| arena.declared_name(e))
            .collect(),
        _ => SmallVec::new(),
    }
}

/// Whether another declaration in the same block, or another entry of the
/// same destructuring, has the same name. Both sides are flagged; the
/// optimizer visits them in document order, so the earlier one is renamed.
fn redeclares(arena: &NodeArena, declaration: NodeIndex) -> bool {
    let Some(name) = arena.declared_name(declaration) else {
        return false;
    };
    let Some((block, statement)) = declaring_statement(arena, declaration) else {
        return false;
    };
    let Some(data) = arena.get_block(block) else {
        return false;
    };
    let others = data.statements.iter().filter(|&&s| s != statement);
    if others.flat_map(|&s| names_declared_by(arena, s)).any(|n| n == name) {
        return true;
    }
    match arena.get_destructuring(statement) {
        Some(d) => d
            .entries
            .iter()
            .any(|&e| e != declaration && arena.declared_name(e) == Some(name)),
        None => false,
    }
}

fn captures_foreign_reference(arena: &NodeArena, declaration: NodeIndex) -> bool {
    let Some(name) = arena.declared_name(declaration) else {
        return false;
    };
    let root = arena.root_of(declaration);
    arena.descendants(root).into_iter().any(|idx| {
        let Some(r) = arena.get_name_ref(idx) else {
            return false;
        };
        if r.name != name || r.binding == declaration {
            return false;
        }
        let is_selector = arena
            .get_qualified(arena.parent(idx))
            .is_some_and(|q| q.selector == idx);
        !is_selector && lexical_lookup(arena, idx, name) == declaration
    })
}
