//! NodeArena access methods: typed getters, parent/child navigation and
//! pre-order search.

use crate::node::*;
use unchain_common::limits;

impl NodeArena {
    /// Get a node by index
    #[inline]
    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get(index.0 as usize)
        }
    }

    /// Get a mutable node by index
    #[inline]
    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get_mut(index.0 as usize)
        }
    }

    #[inline]
    pub fn kind(&self, index: NodeIndex) -> Option<&NodeKind> {
        self.get(index).map(|n| &n.kind)
    }

    #[inline]
    pub fn parent(&self, index: NodeIndex) -> NodeIndex {
        self.get(index).map_or(NodeIndex::NONE, |n| n.parent)
    }

    // ============================================================================
    // Typed getters
    // ============================================================================

    #[inline]
    pub fn get_function(&self, index: NodeIndex) -> Option<&FunctionData> {
        match self.kind(index)? {
            NodeKind::Function(data) => Some(data),
            _ => None,
        }
    }

    #[inline]
    pub fn get_param(&self, index: NodeIndex) -> Option<&ParamData> {
        match self.kind(index)? {
            NodeKind::Param(data) => Some(data),
            _ => None,
        }
    }

    #[inline]
    pub fn get_block(&self, index: NodeIndex) -> Option<&BlockData> {
        match self.kind(index)? {
            NodeKind::Block(data) => Some(data),
            _ => None,
        }
    }

    #[inline]
    pub fn get_property(&self, index: NodeIndex) -> Option<&PropertyData> {
        match self.kind(index)? {
            NodeKind::Property(data) => Some(data),
            _ => None,
        }
    }

    #[inline]
    pub fn get_destructuring(&self, index: NodeIndex) -> Option<&DestructuringData> {
        match self.kind(index)? {
            NodeKind::Destructuring(data) => Some(data),
            _ => None,
        }
    }

    #[inline]
    pub fn get_return(&self, index: NodeIndex) -> Option<&ReturnData> {
        match self.kind(index)? {
            NodeKind::Return(data) => Some(data),
            _ => None,
        }
    }

    #[inline]
    pub fn get_name_ref(&self, index: NodeIndex) -> Option<&NameRefData> {
        match self.kind(index)? {
            NodeKind::NameRef(data) => Some(data),
            _ => None,
        }
    }

    #[inline]
    pub fn get_literal(&self, index: NodeIndex) -> Option<&Literal> {
        match self.kind(index)? {
            NodeKind::Literal(data) => Some(data),
            _ => None,
        }
    }

    #[inline]
    pub fn get_call(&self, index: NodeIndex) -> Option<&CallData> {
        match self.kind(index)? {
            NodeKind::Call(data) => Some(data),
            _ => None,
        }
    }

    #[inline]
    pub fn get_qualified(&self, index: NodeIndex) -> Option<&QualifiedData> {
        match self.kind(index)? {
            NodeKind::Qualified(data) => Some(data),
            _ => None,
        }
    }

    #[inline]
    pub fn get_lambda(&self, index: NodeIndex) -> Option<&LambdaData> {
        match self.kind(index)? {
            NodeKind::Lambda(data) => Some(data),
            _ => None,
        }
    }

    #[inline]
    pub fn get_binary(&self, index: NodeIndex) -> Option<&BinaryData> {
        match self.kind(index)? {
            NodeKind::Binary(data) => Some(data),
            _ => None,
        }
    }

    #[inline]
    pub fn get_if(&self, index: NodeIndex) -> Option<&IfData> {
        match self.kind(index)? {
            NodeKind::If(data) => Some(data),
            _ => None,
        }
    }

    #[inline]
    pub fn get_try(&self, index: NodeIndex) -> Option<&TryData> {
        match self.kind(index)? {
            NodeKind::Try(data) => Some(data),
            _ => None,
        }
    }

    #[inline]
    pub fn is_null_literal(&self, index: NodeIndex) -> bool {
        matches!(self.get_literal(index), Some(Literal::Null))
    }

    /// Name declared by a `Property` or `Param`.
    pub fn declared_name(&self, index: NodeIndex) -> Option<&str> {
        match self.kind(index)? {
            NodeKind::Property(data) => Some(&data.name),
            NodeKind::Param(data) => Some(&data.name),
            NodeKind::Lambda(_) => Some("it"),
            _ => None,
        }
    }

    /// Initializer of a `Property` or `Destructuring` statement.
    pub fn initializer(&self, index: NodeIndex) -> NodeIndex {
        match self.kind(index) {
            Some(NodeKind::Property(data)) => data.initializer,
            Some(NodeKind::Destructuring(data)) => data.initializer,
            _ => NodeIndex::NONE,
        }
    }

    /// For a qualified expression whose selector is a call, the call node.
    pub fn selector_call(&self, index: NodeIndex) -> Option<(&QualifiedData, &CallData)> {
        let qualified = self.get_qualified(index)?;
        let call = self.get_call(qualified.selector)?;
        Some((qualified, call))
    }

    /// The resolved call target of a bare or qualified call.
    pub fn call_target(&self, index: NodeIndex) -> Option<&crate::types::MethodRef> {
        match self.kind(index)? {
            NodeKind::Call(call) => call.target.as_ref(),
            NodeKind::Qualified(q) => self.get_call(q.selector)?.target.as_ref(),
            _ => None,
        }
    }

    // ============================================================================
    // Navigation
    // ============================================================================

    pub(crate) fn kind_children(kind: &NodeKind) -> NodeList {
        let mut out = NodeList::new();
        match kind {
            NodeKind::Function(f) => {
                out.extend(f.params.iter().copied());
                out.push(f.body);
            }
            NodeKind::Block(b) => out.extend(b.statements.iter().copied()),
            NodeKind::Property(p) => out.push(p.initializer),
            NodeKind::Destructuring(d) => {
                out.extend(d.entries.iter().copied());
                out.push(d.initializer);
            }
            NodeKind::Return(r) => out.push(r.value),
            NodeKind::Call(c) => out.extend(c.args.iter().copied()),
            NodeKind::Qualified(q) => {
                out.push(q.receiver);
                out.push(q.selector);
            }
            NodeKind::Lambda(l) => {
                for param in &l.params {
                    out.extend(param.declarations().iter().copied());
                }
                out.push(l.body);
            }
            NodeKind::Binary(b) => {
                out.push(b.left);
                out.push(b.right);
            }
            NodeKind::If(i) => {
                out.push(i.condition);
                out.push(i.then_branch);
                out.push(i.else_branch);
            }
            NodeKind::Try(t) => {
                out.push(t.body);
                out.push(t.catch_param);
                out.push(t.handler);
            }
            NodeKind::Param(_) | NodeKind::NameRef(_) | NodeKind::Literal(_) | NodeKind::ClassLiteral(_) => {}
        }
        out.retain(|c| c.is_some());
        out
    }

    /// Direct children in source order.
    pub fn children(&self, index: NodeIndex) -> NodeList {
        self.kind(index).map(Self::kind_children).unwrap_or_default()
    }

    /// `root` and all its descendants in pre-order (source order).
    pub fn descendants(&self, root: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            if self.get(idx).is_none() {
                continue;
            }
            out.push(idx);
            let children = self.children(idx);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Pre-order search under `root`, first match wins.
    pub fn find_first(&self, root: NodeIndex, mut pred: impl FnMut(&Self, NodeIndex) -> bool) -> Option<NodeIndex> {
        self.descendants(root).into_iter().find(|&idx| pred(self, idx))
    }

    /// Ancestors of `index`, nearest first (excluding `index`).
    pub fn ancestors(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        let mut current = self.parent(index);
        let mut hops = 0u32;
        std::iter::from_fn(move || {
            if current.is_none() || hops >= limits::MAX_PARENT_WALK {
                return None;
            }
            hops += 1;
            let here = current;
            current = self.parent(here);
            Some(here)
        })
    }

    /// Whether `index` is `ancestor` or lies under it.
    pub fn is_within(&self, index: NodeIndex, ancestor: NodeIndex) -> bool {
        index == ancestor || self.ancestors(index).any(|a| a == ancestor)
    }

    /// Root of the tree containing `index`.
    pub fn root_of(&self, index: NodeIndex) -> NodeIndex {
        self.ancestors(index).last().unwrap_or(index)
    }

    /// Whether `index` is reachable from the function `root`.
    pub fn is_attached_to(&self, index: NodeIndex, root: NodeIndex) -> bool {
        self.get(index).is_some() && self.is_within(index, root)
    }

    /// Enclosing function declaration.
    pub fn enclosing_function(&self, index: NodeIndex) -> NodeIndex {
        self.ancestors(index)
            .find(|&a| self.get_function(a).is_some())
            .unwrap_or(NodeIndex::NONE)
    }

    /// Nearest ancestor that is a block, together with the child of that
    /// block on the path to `index` (the statement containing `index`).
    ///
    /// A node that is itself a statement of a block yields itself.
    pub fn statement_in_block(&self, index: NodeIndex) -> Option<(NodeIndex, NodeIndex)> {
        let mut child = index;
        for ancestor in self.ancestors(index) {
            if self.get_block(ancestor).is_some() {
                return Some((ancestor, child));
            }
            child = ancestor;
        }
        None
    }

    /// Position of `statement` inside `block`.
    pub fn statement_position(&self, block: NodeIndex, statement: NodeIndex) -> Option<usize> {
        self.get_block(block)?
            .statements
            .iter()
            .position(|&s| s == statement)
    }

    /// Statement directly following `statement` in its block.
    pub fn next_statement(&self, statement: NodeIndex) -> NodeIndex {
        let block = self.parent(statement);
        let Some(data) = self.get_block(block) else {
            return NodeIndex::NONE;
        };
        data.statements
            .iter()
            .position(|&s| s == statement)
            .and_then(|pos| data.statements.get(pos + 1).copied())
            .unwrap_or(NodeIndex::NONE)
    }

    // ============================================================================
    // Labels and returns
    // ============================================================================

    /// Label a `return@label` inside `lambda` would use: the explicit label,
    /// else the name of the call the lambda is passed to.
    pub fn lambda_label(&self, lambda: NodeIndex) -> Option<&str> {
        let data = self.get_lambda(lambda)?;
        if let Some(label) = &data.label {
            return Some(label);
        }
        let parent = self.parent(lambda);
        self.get_call(parent).map(|c| c.callee.as_str())
    }

    /// Function or lambda a return jumps out of.
    ///
    /// Unlabelled returns target the enclosing function; labelled returns
    /// target the nearest enclosing lambda carrying that label.
    pub fn return_target(&self, ret: NodeIndex) -> NodeIndex {
        let Some(data) = self.get_return(ret) else {
            return NodeIndex::NONE;
        };
        for ancestor in self.ancestors(ret) {
            match self.kind(ancestor) {
                Some(NodeKind::Function(f)) => {
                    if data.label.as_deref().is_none_or(|l| l == f.name) {
                        return ancestor;
                    }
                }
                Some(NodeKind::Lambda(_)) => {
                    if let Some(label) = &data.label
                        && self.lambda_label(ancestor) == Some(label.as_str())
                    {
                        return ancestor;
                    }
                }
                _ => {}
            }
        }
        NodeIndex::NONE
    }

    /// All returns under `owner` that jump out of `owner`.
    pub fn returns_targeting(&self, owner: NodeIndex) -> Vec<NodeIndex> {
        self.descendants(owner)
            .into_iter()
            .filter(|&idx| self.get_return(idx).is_some() && self.return_target(idx) == owner)
            .collect()
    }

    /// All name references under `root` linked to `declaration`.
    pub fn references_to(&self, root: NodeIndex, declaration: NodeIndex) -> Vec<NodeIndex> {
        self.descendants(root)
            .into_iter()
            .filter(|&idx| {
                self.get_name_ref(idx)
                    .is_some_and(|r| r.binding == declaration && declaration.is_some())
            })
            .collect()
    }

    /// Structural equality of two subtrees: same shapes, same names, same
    /// literal values, references linked to the same declarations.
    pub fn same_tree(&self, a: NodeIndex, b: NodeIndex) -> bool {
        let (Some(na), Some(nb)) = (self.get(a), self.get(b)) else {
            return a.is_none() && b.is_none();
        };
        let same_payload = match (&na.kind, &nb.kind) {
            (NodeKind::NameRef(x), NodeKind::NameRef(y)) => x.name == y.name && x.binding == y.binding,
            (NodeKind::Literal(x), NodeKind::Literal(y)) => x == y,
            (NodeKind::Call(x), NodeKind::Call(y)) => x.callee == y.callee && x.args.len() == y.args.len(),
            (NodeKind::Qualified(x), NodeKind::Qualified(y)) => x.safe == y.safe,
            (NodeKind::Binary(x), NodeKind::Binary(y)) => x.op == y.op,
            (NodeKind::ClassLiteral(x), NodeKind::ClassLiteral(y)) => {
                x.type_name == y.type_name && x.java == y.java
            }
            (NodeKind::Return(x), NodeKind::Return(y)) => x.label == y.label,
            (NodeKind::If(_), NodeKind::If(_)) | (NodeKind::Block(_), NodeKind::Block(_)) => true,
            _ => false,
        };
        if !same_payload {
            return false;
        }
        let (ca, cb) = (self.children(a), self.children(b));
        ca.len() == cb.len() && ca.iter().zip(cb.iter()).all(|(&x, &y)| self.same_tree(x, y))
    }
}
