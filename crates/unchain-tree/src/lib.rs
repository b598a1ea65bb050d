//! Function tree for the unchain rewrite engine.
//!
//! This crate provides the syntax model the engine edits in place:
//! - Arena-backed nodes with parent links (`NodeArena`, `NodeIndex`)
//! - Owned surface syntax for fixtures and code synthesis (`syntax`)
//! - Lexical binding of name references (`binder`)
//! - Type references and resolved call targets (`TypeRef`, `MethodRef`)
//! - A source printer (`printer`)

// Node model and arena
pub mod node;
pub use node::{
    BinaryOp, BlockData, CallData, FunctionData, LambdaData, LambdaParam, Literal, NameRefData, Node,
    NodeArena, NodeIndex, NodeKind, NodeList, ParamData, PropertyData, QualifiedData, ReturnData,
};

mod node_access;
mod node_arena;
mod node_mutate;

// Mutation errors
pub mod error;
pub use error::TreeError;

// Declared types and call targets
pub mod types;
pub use types::{MethodRef, ParamShape, TypeRef};

// Surface syntax and lowering
pub mod syntax;
pub use syntax::{Expr, FunctionBody, FunctionDecl, LambdaParamDecl, ParamDecl, Stmt};

// Name resolution
pub mod binder;

// Source printer
pub mod printer;
pub use printer::{Printer, print_function, print_node};

#[cfg(test)]
#[path = "tests/node_mutate_tests.rs"]
mod node_mutate_tests;
