//! NodeArena creation methods (add_* methods) and lowering from surface
//! syntax.
//!
//! Every `add_*` method takes ownership of its children: their parent link is
//! set to the new node. Children passed in must not be attached elsewhere.

use crate::node::*;
use crate::syntax::{Expr, FunctionBody, FunctionDecl, LambdaParamDecl, Stmt};
use crate::types::{MethodRef, TypeRef};

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena::default()
    }

    /// Number of nodes ever allocated (including detached ones).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, child: NodeIndex, parent: NodeIndex) {
        if let Some(node) = self.get_mut(child) {
            node.parent = parent;
        }
    }

    #[inline]
    fn set_parent_list(&mut self, children: &[NodeIndex], parent: NodeIndex) {
        for &child in children {
            self.set_parent(child, parent);
        }
    }

    fn push(&mut self, kind: NodeKind) -> NodeIndex {
        let index = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            parent: NodeIndex::NONE,
        });
        index
    }

    /// Allocate `kind` and adopt every child it references.
    fn add(&mut self, kind: NodeKind) -> NodeIndex {
        let children = Self::kind_children(&kind);
        let index = self.push(kind);
        self.set_parent_list(&children, index);
        index
    }

    // ============================================================================
    // Node Creation Methods
    // ============================================================================

    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        params: Vec<NodeIndex>,
        return_type: Option<TypeRef>,
        body: NodeIndex,
        expression_body: bool,
    ) -> NodeIndex {
        self.add(NodeKind::Function(FunctionData {
            name: name.into(),
            params,
            return_type,
            body,
            expression_body,
        }))
    }

    pub fn add_param(&mut self, name: impl Into<String>, ty: Option<TypeRef>) -> NodeIndex {
        self.add(NodeKind::Param(ParamData {
            name: name.into(),
            ty,
        }))
    }

    pub fn add_block(&mut self, statements: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::Block(BlockData { statements }))
    }

    pub fn add_property(
        &mut self,
        name: impl Into<String>,
        mutable: bool,
        ty: Option<TypeRef>,
        initializer: NodeIndex,
    ) -> NodeIndex {
        self.add(NodeKind::Property(PropertyData {
            name: name.into(),
            mutable,
            ty,
            initializer,
        }))
    }

    pub fn add_destructuring(&mut self, entries: Vec<NodeIndex>, initializer: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Destructuring(DestructuringData {
            entries,
            initializer,
        }))
    }

    pub fn add_return(&mut self, label: Option<String>, value: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Return(ReturnData { label, value }))
    }

    pub fn add_name_ref(&mut self, name: impl Into<String>, binding: NodeIndex) -> NodeIndex {
        self.add(NodeKind::NameRef(NameRefData {
            name: name.into(),
            binding,
        }))
    }

    pub fn add_literal(&mut self, literal: Literal) -> NodeIndex {
        self.add(NodeKind::Literal(literal))
    }

    pub fn add_call(
        &mut self,
        callee: impl Into<String>,
        args: Vec<NodeIndex>,
        target: Option<MethodRef>,
    ) -> NodeIndex {
        self.add(NodeKind::Call(CallData {
            callee: callee.into(),
            args,
            target,
        }))
    }

    pub fn add_qualified(&mut self, receiver: NodeIndex, selector: NodeIndex, safe: bool) -> NodeIndex {
        self.add(NodeKind::Qualified(QualifiedData {
            receiver,
            selector,
            safe,
        }))
    }

    /// `receiver.callee(args)` / `receiver?.callee(args)`
    pub fn add_method_call(
        &mut self,
        receiver: NodeIndex,
        callee: impl Into<String>,
        args: Vec<NodeIndex>,
        safe: bool,
    ) -> NodeIndex {
        let call = self.add_call(callee, args, None);
        self.add_qualified(receiver, call, safe)
    }

    pub fn add_lambda(
        &mut self,
        params: Vec<LambdaParam>,
        body: NodeIndex,
        label: Option<String>,
    ) -> NodeIndex {
        self.add(NodeKind::Lambda(LambdaData {
            params,
            body,
            label,
        }))
    }

    pub fn add_binary(&mut self, left: NodeIndex, op: BinaryOp, right: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Binary(BinaryData { left, op, right }))
    }

    pub fn add_if(
        &mut self,
        condition: NodeIndex,
        then_branch: NodeIndex,
        else_branch: NodeIndex,
    ) -> NodeIndex {
        self.add(NodeKind::If(IfData {
            condition,
            then_branch,
            else_branch,
        }))
    }

    pub fn add_try(&mut self, body: NodeIndex, catch_param: NodeIndex, handler: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Try(TryData {
            body,
            catch_param,
            handler,
        }))
    }

    pub fn add_class_literal(&mut self, type_name: impl Into<String>, java: bool) -> NodeIndex {
        self.add(NodeKind::ClassLiteral(ClassLiteralData {
            type_name: type_name.into(),
            java,
        }))
    }

    // ============================================================================
    // Lowering
    // ============================================================================

    /// Lower a function declaration into the arena and bind its names.
    pub fn lower_function(&mut self, decl: &FunctionDecl) -> NodeIndex {
        let params = decl
            .params
            .iter()
            .map(|p| self.add_param(p.name.clone(), p.ty.clone()))
            .collect();
        let (statements, expression_body) = match &decl.body {
            FunctionBody::Block { statements } => (self.lower_statements(statements), false),
            FunctionBody::Expression { expr } => (vec![self.lower_expr(expr)], true),
        };
        let body = self.add_block(statements);
        let function = self.add_function(
            decl.name.clone(),
            params,
            decl.return_type.clone(),
            body,
            expression_body,
        );
        crate::binder::bind(self, function);
        function
    }

    pub fn lower_statements(&mut self, statements: &[Stmt]) -> Vec<NodeIndex> {
        statements.iter().map(|s| self.lower_stmt(s)).collect()
    }

    pub fn lower_stmt(&mut self, stmt: &Stmt) -> NodeIndex {
        match stmt {
            Stmt::Val {
                name,
                mutable,
                ty,
                init,
            } => {
                let init = self.lower_expr(init);
                self.add_property(name.clone(), *mutable, ty.clone(), init)
            }
            Stmt::Destructure { names, init } => {
                let entries = names.iter().map(|n| self.add_param(n.clone(), None)).collect();
                let init = self.lower_expr(init);
                self.add_destructuring(entries, init)
            }
            Stmt::Expr { expr } => self.lower_expr(expr),
        }
    }

    /// Lower an expression. The result is unowned; names inside are left
    /// unbound unless given as `BoundName`.
    pub fn lower_expr(&mut self, expr: &Expr) -> NodeIndex {
        match expr {
            Expr::Name { name } => self.add_name_ref(name.clone(), NodeIndex::NONE),
            Expr::BoundName { name, binding } => self.add_name_ref(name.clone(), *binding),
            Expr::Splice(node) => *node,
            Expr::Null => self.add_literal(Literal::Null),
            Expr::Bool { value } => self.add_literal(Literal::Bool(*value)),
            Expr::Int { value } => self.add_literal(Literal::Int(*value)),
            Expr::Str { value } => self.add_literal(Literal::Str(value.clone())),
            Expr::Call {
                callee,
                args,
                target,
            } => {
                let args = args.iter().map(|a| self.lower_expr(a)).collect();
                self.add_call(callee.clone(), args, target.clone())
            }
            Expr::Qualified {
                receiver,
                selector,
                safe,
            } => {
                let receiver = self.lower_expr(receiver);
                let selector = self.lower_expr(selector);
                self.add_qualified(receiver, selector, *safe)
            }
            Expr::Lambda {
                params,
                body,
                label,
            } => {
                let params = params
                    .iter()
                    .map(|p| match p {
                        LambdaParamDecl::Single(name) => {
                            LambdaParam::Single(self.add_param(name.clone(), None))
                        }
                        LambdaParamDecl::Destructured(names) => LambdaParam::Destructured(
                            names.iter().map(|n| self.add_param(n.clone(), None)).collect(),
                        ),
                    })
                    .collect();
                let statements = self.lower_statements(body);
                let body = self.add_block(statements);
                self.add_lambda(params, body, label.clone())
            }
            Expr::Binary { left, op, right } => {
                let left = self.lower_expr(left);
                let right = self.lower_expr(right);
                self.add_binary(left, *op, right)
            }
            Expr::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.lower_expr(condition);
                let then_branch = self.lower_expr(then_branch);
                let else_branch = else_branch
                    .as_ref()
                    .map_or(NodeIndex::NONE, |e| self.lower_expr(e));
                self.add_if(condition, then_branch, else_branch)
            }
            Expr::Block { statements } => {
                let statements = self.lower_statements(statements);
                self.add_block(statements)
            }
            Expr::Try {
                body,
                catch_name,
                catch_type,
                handler,
            } => {
                let body_statements = self.lower_statements(body);
                let body = self.add_block(body_statements);
                let param = self.add_param(catch_name.clone(), Some(catch_type.clone()));
                let handler_statements = self.lower_statements(handler);
                let handler = self.add_block(handler_statements);
                self.add_try(body, param, handler)
            }
            Expr::ClassLiteral { type_name, java } => self.add_class_literal(type_name.clone(), *java),
            Expr::Return { label, value } => {
                let value = value.as_ref().map_or(NodeIndex::NONE, |v| self.lower_expr(v));
                self.add_return(label.clone(), value)
            }
        }
    }
}
