//! Owned surface syntax.
//!
//! This is the form functions arrive in (JSON fixtures, host adapters) and the
//! form rules use to synthesize new code. [`NodeArena::lower_function`] and
//! [`NodeArena::lower_expr`] turn it into arena nodes.
//!
//! Two variants exist only for synthesis and never appear in fixtures:
//! `Splice` plugs an existing unowned subtree into the new code, and
//! `BoundName` emits a reference already linked to its declaration.
//!
//! [`NodeArena::lower_function`]: crate::NodeArena::lower_function
//! [`NodeArena::lower_expr`]: crate::NodeArena::lower_expr

use crate::node::{BinaryOp, NodeIndex};
use crate::types::{MethodRef, TypeRef};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default)]
    pub return_type: Option<TypeRef>,
    pub body: FunctionBody,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    #[serde(default)]
    pub ty: Option<TypeRef>,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FunctionBody {
    Block { statements: Vec<Stmt> },
    Expression { expr: Expr },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Stmt {
    Val {
        name: String,
        #[serde(default)]
        mutable: bool,
        #[serde(default)]
        ty: Option<TypeRef>,
        init: Expr,
    },
    Destructure {
        names: Vec<String>,
        init: Expr,
    },
    Expr {
        expr: Expr,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LambdaParamDecl {
    Single(String),
    Destructured(Vec<String>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Expr {
    Name {
        name: String,
    },
    Null,
    Bool {
        value: bool,
    },
    Int {
        value: i64,
    },
    Str {
        value: String,
    },
    Call {
        callee: String,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        target: Option<MethodRef>,
    },
    Qualified {
        receiver: Box<Expr>,
        selector: Box<Expr>,
        #[serde(default)]
        safe: bool,
    },
    Lambda {
        #[serde(default)]
        params: Vec<LambdaParamDecl>,
        body: Vec<Stmt>,
        #[serde(default)]
        label: Option<String>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        #[serde(default)]
        else_branch: Option<Box<Expr>>,
    },
    /// Braced block; valid as an `if` branch.
    Block {
        statements: Vec<Stmt>,
    },
    Try {
        body: Vec<Stmt>,
        catch_name: String,
        catch_type: TypeRef,
        handler: Vec<Stmt>,
    },
    ClassLiteral {
        type_name: String,
        #[serde(default)]
        java: bool,
    },
    Return {
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        value: Option<Box<Expr>>,
    },
    #[serde(skip)]
    Splice(NodeIndex),
    #[serde(skip)]
    BoundName { name: String, binding: NodeIndex },
}

// =============================================================================
// Builders
// =============================================================================

impl Expr {
    pub fn name(name: impl Into<String>) -> Self {
        Expr::Name { name: name.into() }
    }

    pub fn null() -> Self {
        Expr::Null
    }

    pub fn int(value: i64) -> Self {
        Expr::Int { value }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Str {
            value: value.into(),
        }
    }

    pub fn bool(value: bool) -> Self {
        Expr::Bool { value }
    }

    pub fn splice(node: NodeIndex) -> Self {
        Expr::Splice(node)
    }

    pub fn bound(name: impl Into<String>, binding: NodeIndex) -> Self {
        Expr::BoundName {
            name: name.into(),
            binding,
        }
    }

    /// Unqualified call: `callee(args)`.
    pub fn call(callee: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: callee.into(),
            args,
            target: None,
        }
    }

    /// `receiver.name(args)`
    pub fn method(receiver: Expr, name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::qualified(receiver, Self::call(name, args), false)
    }

    /// `receiver?.name(args)`
    pub fn safe_method(receiver: Expr, name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::qualified(receiver, Self::call(name, args), true)
    }

    /// `receiver.name` (property access).
    pub fn field(receiver: Expr, name: impl Into<String>) -> Self {
        Self::qualified(receiver, Self::name(name), false)
    }

    pub fn qualified(receiver: Expr, selector: Expr, safe: bool) -> Self {
        Expr::Qualified {
            receiver: Box::new(receiver),
            selector: Box::new(selector),
            safe,
        }
    }

    /// Attach a resolved target to a call, or to the call selector of a
    /// qualified expression.
    #[must_use]
    pub fn with_target(mut self, method: MethodRef) -> Self {
        match &mut self {
            Expr::Call { target, .. } => *target = Some(method),
            Expr::Qualified { selector, .. } => {
                if let Expr::Call { target, .. } = selector.as_mut() {
                    *target = Some(method);
                }
            }
            _ => {}
        }
        self
    }

    /// Lambda with named parameters.
    pub fn lambda(params: &[&str], body: Vec<Stmt>) -> Self {
        Expr::Lambda {
            params: params
                .iter()
                .map(|p| LambdaParamDecl::Single((*p).to_string()))
                .collect(),
            body,
            label: None,
        }
    }

    /// Lambda using the implicit `it` parameter.
    pub fn it_lambda(body: Vec<Stmt>) -> Self {
        Expr::Lambda {
            params: Vec::new(),
            body,
            label: None,
        }
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn elvis(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Elvis, right)
    }

    pub fn if_else(condition: Expr, then_branch: Expr, else_branch: Option<Expr>) -> Self {
        Expr::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        }
    }

    pub fn block(statements: Vec<Stmt>) -> Self {
        Expr::Block { statements }
    }

    pub fn ret(label: Option<&str>, value: Option<Expr>) -> Self {
        Expr::Return {
            label: label.map(str::to_string),
            value: value.map(Box::new),
        }
    }

    pub fn class_literal(type_name: impl Into<String>, java: bool) -> Self {
        Expr::ClassLiteral {
            type_name: type_name.into(),
            java,
        }
    }
}

impl Stmt {
    pub fn val(name: impl Into<String>, init: Expr) -> Self {
        Stmt::Val {
            name: name.into(),
            mutable: false,
            ty: None,
            init,
        }
    }

    pub fn var(name: impl Into<String>, init: Expr) -> Self {
        Stmt::Val {
            name: name.into(),
            mutable: true,
            ty: None,
            init,
        }
    }

    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr { expr }
    }

    /// Unlabelled `return value`.
    pub fn ret(value: Expr) -> Self {
        Stmt::Expr {
            expr: Expr::ret(None, Some(value)),
        }
    }

    pub fn ret_label(label: &str, value: Expr) -> Self {
        Stmt::Expr {
            expr: Expr::ret(Some(label), Some(value)),
        }
    }

    pub fn destructure(names: &[&str], init: Expr) -> Self {
        Stmt::Destructure {
            names: names.iter().map(|n| (*n).to_string()).collect(),
            init,
        }
    }
}

impl FunctionDecl {
    pub fn block(
        name: impl Into<String>,
        params: Vec<ParamDecl>,
        return_type: Option<TypeRef>,
        statements: Vec<Stmt>,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            return_type,
            body: FunctionBody::Block { statements },
        }
    }

    pub fn expression(
        name: impl Into<String>,
        params: Vec<ParamDecl>,
        return_type: Option<TypeRef>,
        expr: Expr,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            return_type,
            body: FunctionBody::Expression { expr },
        }
    }
}
