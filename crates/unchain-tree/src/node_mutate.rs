//! In-place edits: replace, detach, statement insertion, renaming and deep
//! clone.
//!
//! Edits keep parent links consistent. A node handed to an edit as the new
//! occupant of a slot must be unowned (fresh from `add_*`, `lower_expr`,
//! `deep_clone`, or previously detached).

use crate::error::TreeError;
use crate::node::*;
use crate::types::{MethodRef, TypeRef};
use rustc_hash::FxHashMap;
use tracing::trace;

impl NodeArena {
    fn ensure_unowned(&self, node: NodeIndex) -> Result<(), TreeError> {
        let Some(n) = self.get(node) else {
            return Err(TreeError::Missing(node));
        };
        if n.parent.is_some() {
            return Err(TreeError::AlreadyOwned {
                node,
                owner: n.parent,
            });
        }
        Ok(())
    }

    /// Point the slot of `parent` holding `old` at `new`. A `NONE` `new`
    /// removes `old` from list slots and blanks single slots.
    fn swap_child_slot(&mut self, parent: NodeIndex, old: NodeIndex, new: NodeIndex) -> bool {
        fn single(slot: &mut NodeIndex, old: NodeIndex, new: NodeIndex) -> bool {
            if *slot == old {
                *slot = new;
                true
            } else {
                false
            }
        }
        fn list(slots: &mut Vec<NodeIndex>, old: NodeIndex, new: NodeIndex) -> bool {
            let Some(pos) = slots.iter().position(|&s| s == old) else {
                return false;
            };
            if new.is_none() {
                slots.remove(pos);
            } else {
                slots[pos] = new;
            }
            true
        }

        let Some(node) = self.get_mut(parent) else {
            return false;
        };
        match &mut node.kind {
            NodeKind::Function(f) => list(&mut f.params, old, new) || single(&mut f.body, old, new),
            NodeKind::Block(b) => list(&mut b.statements, old, new),
            NodeKind::Property(p) => single(&mut p.initializer, old, new),
            NodeKind::Destructuring(d) => {
                list(&mut d.entries, old, new) || single(&mut d.initializer, old, new)
            }
            NodeKind::Return(r) => single(&mut r.value, old, new),
            NodeKind::Call(c) => list(&mut c.args, old, new),
            NodeKind::Qualified(q) => {
                single(&mut q.receiver, old, new) || single(&mut q.selector, old, new)
            }
            NodeKind::Lambda(l) => {
                if single(&mut l.body, old, new) {
                    return true;
                }
                let mut found = false;
                l.params.retain_mut(|param| {
                    if found {
                        return true;
                    }
                    match param {
                        LambdaParam::Single(slot) if *slot == old => {
                            found = true;
                            *slot = new;
                            new.is_some()
                        }
                        LambdaParam::Single(_) => true,
                        LambdaParam::Destructured(entries) => {
                            found = list(entries, old, new);
                            true
                        }
                    }
                });
                found
            }
            NodeKind::Binary(b) => single(&mut b.left, old, new) || single(&mut b.right, old, new),
            NodeKind::If(i) => {
                single(&mut i.condition, old, new)
                    || single(&mut i.then_branch, old, new)
                    || single(&mut i.else_branch, old, new)
            }
            NodeKind::Try(t) => {
                single(&mut t.body, old, new)
                    || single(&mut t.catch_param, old, new)
                    || single(&mut t.handler, old, new)
            }
            NodeKind::Param(_) | NodeKind::NameRef(_) | NodeKind::Literal(_) | NodeKind::ClassLiteral(_) => {
                false
            }
        }
    }

    /// Put `new` where `old` is; `old` becomes unowned.
    pub fn replace(&mut self, old: NodeIndex, new: NodeIndex) -> Result<(), TreeError> {
        if old == new {
            return Ok(());
        }
        self.ensure_unowned(new)?;
        let parent = self.parent(old);
        if parent.is_none() {
            return Err(TreeError::Detached(old));
        }
        if !self.swap_child_slot(parent, old, new) {
            return Err(TreeError::NotAChild { parent, child: old });
        }
        trace!(old = old.0, new = new.0, parent = parent.0, "replace");
        self.set_parent(new, parent);
        self.set_parent(old, NodeIndex::NONE);
        Ok(())
    }

    /// Replace `node` with the result of `build(node)`, which receives
    /// `node` unowned and must return a new unowned subtree containing it.
    pub fn wrap(
        &mut self,
        node: NodeIndex,
        build: impl FnOnce(&mut NodeArena, NodeIndex) -> NodeIndex,
    ) -> Result<NodeIndex, TreeError> {
        let hole = self.add_literal(Literal::Null);
        self.replace(node, hole)?;
        let wrapped = build(self, node);
        self.replace(hole, wrapped)?;
        Ok(wrapped)
    }

    /// Remove `node` from its parent. List slots shrink; single slots become
    /// empty.
    pub fn detach(&mut self, node: NodeIndex) -> Result<(), TreeError> {
        let parent = self.parent(node);
        if parent.is_none() {
            return Err(TreeError::Detached(node));
        }
        if !self.swap_child_slot(parent, node, NodeIndex::NONE) {
            return Err(TreeError::NotAChild { parent, child: node });
        }
        trace!(node = node.0, parent = parent.0, "detach");
        self.set_parent(node, NodeIndex::NONE);
        Ok(())
    }

    /// Remove a statement from its block.
    pub fn remove_statement(&mut self, statement: NodeIndex) -> Result<(), TreeError> {
        if self.get_block(self.parent(statement)).is_none() {
            return Err(TreeError::NotAStatement(statement));
        }
        self.detach(statement)
    }

    fn insert_at_offset(&mut self, anchor: NodeIndex, statement: NodeIndex, after: bool) -> Result<(), TreeError> {
        self.ensure_unowned(statement)?;
        let block = self.parent(anchor);
        let Some(pos) = self.statement_position(block, anchor) else {
            return Err(TreeError::NotAStatement(anchor));
        };
        let at = if after { pos + 1 } else { pos };
        if let Some(Node {
            kind: NodeKind::Block(data),
            ..
        }) = self.get_mut(block)
        {
            data.statements.insert(at, statement);
        }
        self.set_parent(statement, block);
        Ok(())
    }

    /// Insert `statement` directly before the block statement `anchor`.
    pub fn insert_before(&mut self, anchor: NodeIndex, statement: NodeIndex) -> Result<(), TreeError> {
        self.insert_at_offset(anchor, statement, false)
    }

    /// Insert `statement` directly after the block statement `anchor`.
    pub fn insert_after(&mut self, anchor: NodeIndex, statement: NodeIndex) -> Result<(), TreeError> {
        self.insert_at_offset(anchor, statement, true)
    }

    /// Insert `statements` in order before `anchor`.
    pub fn splice_before(&mut self, anchor: NodeIndex, statements: &[NodeIndex]) -> Result<(), TreeError> {
        for &statement in statements {
            self.insert_before(anchor, statement)?;
        }
        Ok(())
    }

    /// Append `statement` to `block`.
    pub fn push_statement(&mut self, block: NodeIndex, statement: NodeIndex) -> Result<(), TreeError> {
        self.ensure_unowned(statement)?;
        let Some(Node {
            kind: NodeKind::Block(data),
            ..
        }) = self.get_mut(block)
        else {
            return Err(TreeError::WrongKind(block, "Block"));
        };
        data.statements.push(statement);
        self.set_parent(statement, block);
        Ok(())
    }

    // ============================================================================
    // Payload edits
    // ============================================================================

    pub fn set_binding(&mut self, name_ref: NodeIndex, declaration: NodeIndex) {
        if let Some(Node {
            kind: NodeKind::NameRef(data),
            ..
        }) = self.get_mut(name_ref)
        {
            data.binding = declaration;
        }
    }

    pub fn set_return_label(&mut self, ret: NodeIndex, label: Option<String>) {
        if let Some(Node {
            kind: NodeKind::Return(data),
            ..
        }) = self.get_mut(ret)
        {
            data.label = label;
        }
    }

    pub fn set_call_target(&mut self, call: NodeIndex, target: Option<MethodRef>) {
        if let Some(Node {
            kind: NodeKind::Call(data),
            ..
        }) = self.get_mut(call)
        {
            data.target = target;
        }
    }

    pub fn set_safe(&mut self, qualified: NodeIndex, safe: bool) {
        if let Some(Node {
            kind: NodeKind::Qualified(data),
            ..
        }) = self.get_mut(qualified)
        {
            data.safe = safe;
        }
    }

    pub fn set_property_type(&mut self, property: NodeIndex, ty: Option<TypeRef>) {
        if let Some(Node {
            kind: NodeKind::Property(data),
            ..
        }) = self.get_mut(property)
        {
            data.ty = ty;
        }
    }

    pub fn set_expression_body(&mut self, function: NodeIndex, expression_body: bool) {
        if let Some(Node {
            kind: NodeKind::Function(data),
            ..
        }) = self.get_mut(function)
        {
            data.expression_body = expression_body;
        }
    }

    /// Turn `{ a, b -> ... }` into `{ (a, b) -> ... }`.
    pub fn destructure_lambda_params(&mut self, lambda: NodeIndex) -> Result<(), TreeError> {
        let Some(Node {
            kind: NodeKind::Lambda(data),
            ..
        }) = self.get_mut(lambda)
        else {
            return Err(TreeError::WrongKind(lambda, "Lambda"));
        };
        let entries: Vec<NodeIndex> = data
            .params
            .iter()
            .flat_map(|p| p.declarations().iter().copied())
            .collect();
        data.params = vec![LambdaParam::Destructured(entries)];
        Ok(())
    }

    /// Rename a declaration and every reference under `root` linked to it.
    pub fn rename_declaration(&mut self, root: NodeIndex, declaration: NodeIndex, new_name: &str) {
        for reference in self.references_to(root, declaration) {
            if let Some(Node {
                kind: NodeKind::NameRef(data),
                ..
            }) = self.get_mut(reference)
            {
                data.name = new_name.to_string();
            }
        }
        if let Some(node) = self.get_mut(declaration) {
            match &mut node.kind {
                NodeKind::Property(data) => data.name = new_name.to_string(),
                NodeKind::Param(data) => data.name = new_name.to_string(),
                _ => {}
            }
        }
    }

    /// Point every reference under `root` linked to `from` at `to`, renaming
    /// it to `name`.
    pub fn relink_references(&mut self, root: NodeIndex, from: NodeIndex, to: NodeIndex, name: &str) {
        for reference in self.references_to(root, from) {
            if let Some(Node {
                kind: NodeKind::NameRef(data),
                ..
            }) = self.get_mut(reference)
            {
                data.binding = to;
                data.name = name.to_string();
            }
        }
    }

    // ============================================================================
    // Deep clone
    // ============================================================================

    /// Copy the subtree at `root`. The copy is unowned. References to
    /// declarations inside the subtree are relinked to the copied
    /// declarations; references to outside declarations keep their links.
    pub fn deep_clone(&mut self, root: NodeIndex) -> NodeIndex {
        let originals = self.descendants(root);
        let mut mapping: FxHashMap<NodeIndex, NodeIndex> = FxHashMap::default();
        for &idx in &originals {
            let kind = self.nodes[idx.0 as usize].kind.clone();
            let copy = NodeIndex(self.nodes.len() as u32);
            self.nodes.push(Node {
                kind,
                parent: NodeIndex::NONE,
            });
            mapping.insert(idx, copy);
        }
        let remap = |idx: &mut NodeIndex| {
            if let Some(&copy) = mapping.get(idx) {
                *idx = copy;
            }
        };
        for &idx in &originals {
            let copy = mapping[&idx];
            let parent = self.parent(idx);
            let copy_parent = if idx == root {
                NodeIndex::NONE
            } else {
                mapping.get(&parent).copied().unwrap_or(NodeIndex::NONE)
            };
            let node = &mut self.nodes[copy.0 as usize];
            node.parent = copy_parent;
            match &mut node.kind {
                NodeKind::Function(f) => {
                    f.params.iter_mut().for_each(remap);
                    remap(&mut f.body);
                }
                NodeKind::Block(b) => b.statements.iter_mut().for_each(remap),
                NodeKind::Property(p) => remap(&mut p.initializer),
                NodeKind::Destructuring(d) => {
                    d.entries.iter_mut().for_each(remap);
                    remap(&mut d.initializer);
                }
                NodeKind::Return(r) => remap(&mut r.value),
                NodeKind::NameRef(n) => remap(&mut n.binding),
                NodeKind::Call(c) => c.args.iter_mut().for_each(remap),
                NodeKind::Qualified(q) => {
                    remap(&mut q.receiver);
                    remap(&mut q.selector);
                }
                NodeKind::Lambda(l) => {
                    for param in &mut l.params {
                        match param {
                            LambdaParam::Single(p) => remap(p),
                            LambdaParam::Destructured(entries) => entries.iter_mut().for_each(remap),
                        }
                    }
                    remap(&mut l.body);
                }
                NodeKind::Binary(b) => {
                    remap(&mut b.left);
                    remap(&mut b.right);
                }
                NodeKind::If(i) => {
                    remap(&mut i.condition);
                    remap(&mut i.then_branch);
                    remap(&mut i.else_branch);
                }
                NodeKind::Try(t) => {
                    remap(&mut t.body);
                    remap(&mut t.catch_param);
                    remap(&mut t.handler);
                }
                NodeKind::Param(_) | NodeKind::Literal(_) | NodeKind::ClassLiteral(_) => {}
            }
        }
        mapping.get(&root).copied().unwrap_or(NodeIndex::NONE)
    }
}
