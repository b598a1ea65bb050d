//! Node definitions for the function tree.
//!
//! Nodes live in a [`NodeArena`] and refer to each other by [`NodeIndex`].
//! Every node records its parent, so the tree can be walked in both
//! directions and edited in place.

use crate::types::{MethodRef, TypeRef};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Index of a node in its arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// Absent node (missing child, unresolved binding, detached parent).
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    pub const fn is_some(self) -> bool {
        !self.is_none()
    }
}

impl Default for NodeIndex {
    fn default() -> Self {
        Self::NONE
    }
}

pub type NodeList = SmallVec<[NodeIndex; 4]>;

// =============================================================================
// Node payloads
// =============================================================================

#[derive(Clone, Debug)]
pub struct FunctionData {
    pub name: String,
    pub params: Vec<NodeIndex>,
    pub return_type: Option<TypeRef>,
    /// Always a `Block`. For expression-bodied functions the block holds a
    /// single statement: the body expression.
    pub body: NodeIndex,
    pub expression_body: bool,
}

/// Function parameter, lambda parameter, destructuring entry or catch
/// parameter.
#[derive(Clone, Debug)]
pub struct ParamData {
    pub name: String,
    pub ty: Option<TypeRef>,
}

#[derive(Clone, Debug, Default)]
pub struct BlockData {
    pub statements: Vec<NodeIndex>,
}

/// Local `val`/`var` declaration.
#[derive(Clone, Debug)]
pub struct PropertyData {
    pub name: String,
    pub mutable: bool,
    pub ty: Option<TypeRef>,
    pub initializer: NodeIndex,
}

/// `val (a, b) = init`; entries are `Param` nodes.
#[derive(Clone, Debug)]
pub struct DestructuringData {
    pub entries: Vec<NodeIndex>,
    pub initializer: NodeIndex,
}

/// `return`, `return@label`, with optional value.
#[derive(Clone, Debug)]
pub struct ReturnData {
    pub label: Option<String>,
    pub value: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct NameRefData {
    pub name: String,
    /// Declaration this name resolves to (`Property`, `Param`, or the `Lambda`
    /// itself for an implicit `it`). `NONE` for external names.
    pub binding: NodeIndex,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

/// `callee(args)`. Qualified calls are a `Qualified` whose selector is a
/// `Call`.
#[derive(Clone, Debug)]
pub struct CallData {
    pub callee: String,
    pub args: Vec<NodeIndex>,
    pub target: Option<MethodRef>,
}

/// `receiver.selector` or `receiver?.selector`.
#[derive(Clone, Debug)]
pub struct QualifiedData {
    pub receiver: NodeIndex,
    pub selector: NodeIndex,
    pub safe: bool,
}

#[derive(Clone, Debug)]
pub enum LambdaParam {
    Single(NodeIndex),
    Destructured(Vec<NodeIndex>),
}

impl LambdaParam {
    pub fn declarations(&self) -> &[NodeIndex] {
        match self {
            LambdaParam::Single(idx) => std::slice::from_ref(idx),
            LambdaParam::Destructured(entries) => entries,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LambdaData {
    pub params: Vec<LambdaParam>,
    /// Always a `Block`.
    pub body: NodeIndex,
    /// Explicit `label@` prefix.
    pub label: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BinaryOp {
    Elvis,
    Eq,
    NotEq,
    And,
    Or,
    Lt,
    Gt,
    Le,
    Ge,
    Plus,
    Minus,
    Times,
    Div,
}

impl BinaryOp {
    pub fn token(self) -> &'static str {
        match self {
            BinaryOp::Elvis => "?:",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Times => "*",
            BinaryOp::Div => "/",
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Times | BinaryOp::Div => 13,
            BinaryOp::Plus | BinaryOp::Minus => 12,
            BinaryOp::Elvis => 9,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => 7,
            BinaryOp::Eq | BinaryOp::NotEq => 6,
            BinaryOp::And => 5,
            BinaryOp::Or => 4,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BinaryData {
    pub left: NodeIndex,
    pub op: BinaryOp,
    pub right: NodeIndex,
}

/// `if (condition) then else other`. Branches are expressions or blocks;
/// `else_branch` may be `NONE`.
#[derive(Clone, Debug)]
pub struct IfData {
    pub condition: NodeIndex,
    pub then_branch: NodeIndex,
    pub else_branch: NodeIndex,
}

/// `try { body } catch (param) { handler }`
#[derive(Clone, Debug)]
pub struct TryData {
    pub body: NodeIndex,
    pub catch_param: NodeIndex,
    pub handler: NodeIndex,
}

/// `Type::class` or `Type::class.java`.
#[derive(Clone, Debug)]
pub struct ClassLiteralData {
    pub type_name: String,
    pub java: bool,
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    Function(FunctionData),
    Param(ParamData),
    Block(BlockData),
    Property(PropertyData),
    Destructuring(DestructuringData),
    Return(ReturnData),
    NameRef(NameRefData),
    Literal(Literal),
    Call(CallData),
    Qualified(QualifiedData),
    Lambda(LambdaData),
    Binary(BinaryData),
    If(IfData),
    Try(TryData),
    ClassLiteral(ClassLiteralData),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Function(_) => "Function",
            NodeKind::Param(_) => "Param",
            NodeKind::Block(_) => "Block",
            NodeKind::Property(_) => "Property",
            NodeKind::Destructuring(_) => "Destructuring",
            NodeKind::Return(_) => "Return",
            NodeKind::NameRef(_) => "NameRef",
            NodeKind::Literal(_) => "Literal",
            NodeKind::Call(_) => "Call",
            NodeKind::Qualified(_) => "Qualified",
            NodeKind::Lambda(_) => "Lambda",
            NodeKind::Binary(_) => "Binary",
            NodeKind::If(_) => "If",
            NodeKind::Try(_) => "Try",
            NodeKind::ClassLiteral(_) => "ClassLiteral",
        }
    }

    /// Whether this node declares a local name.
    pub fn is_declaration(&self) -> bool {
        matches!(self, NodeKind::Property(_) | NodeKind::Param(_))
    }
}

/// One node of the tree.
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    /// `NONE` for roots and for nodes not yet attached.
    pub parent: NodeIndex,
}

/// Arena owning every node of one (or more) functions.
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    pub(crate) nodes: Vec<Node>,
}
