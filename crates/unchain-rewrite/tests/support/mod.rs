//! Fixture builders shared by the integration tests.
#![allow(dead_code)]

use rustc_hash::FxHashSet;
use unchain_common::names;
use unchain_rewrite::{Host, RewriteError, TransformOptions, TransformReport, Transformer};
use unchain_tree::{
    Expr, FunctionDecl, MethodRef, NodeArena, NodeIndex, NodeKind, ParamDecl, ParamShape, Stmt, TypeRef,
    print_function,
};

pub fn mono() -> TypeRef {
    TypeRef::mono(TypeRef::named("String"))
}

/// `receiver.name(args)` resolved to an instance method of `Mono`.
pub fn on_mono(receiver: Expr, name: &str, params: Vec<ParamShape>, args: Vec<Expr>) -> Expr {
    let target = MethodRef::instance(names::MONO, name, params).returning(mono());
    Expr::method(receiver, name, args).with_target(target)
}

/// `Mono.name(args)` resolved to a static factory.
pub fn mono_static(name: &str, params: Vec<ParamShape>, args: Vec<Expr>) -> Expr {
    let target = MethodRef::static_method(names::MONO, name, params).returning(mono());
    Expr::method(Expr::name("Mono"), name, args).with_target(target)
}

/// A top-level function returning a producer.
pub fn producer_call(name: &str, args: Vec<Expr>) -> Expr {
    let target = MethodRef::static_method("app.Repository", name, Vec::new()).returning(mono());
    Expr::call(name, args).with_target(target)
}

pub fn producer(name: &str) -> ParamDecl {
    ParamDecl::new(name, mono())
}

pub fn load(params: Vec<ParamDecl>, statements: Vec<Stmt>) -> FunctionDecl {
    FunctionDecl::block("load", params, Some(mono()), statements)
}

/// `= mono { statements }`
pub fn wrapped(params: Vec<ParamDecl>, statements: Vec<Stmt>) -> FunctionDecl {
    let body = Expr::call(names::MONO_BUILDER, vec![Expr::it_lambda(statements)]);
    FunctionDecl::expression("load", params, Some(mono()), body)
}

pub fn awaited(name: &str) -> Expr {
    Expr::method(Expr::name(name), names::AWAIT_FIRST_OR_NULL, Vec::new())
}

pub struct Transformed {
    pub arena: NodeArena,
    pub root: NodeIndex,
    pub report: TransformReport,
}

impl Transformed {
    pub fn text(&self) -> String {
        print_function(&self.arena, self.root)
    }
}

pub fn try_transform_with(decl: &FunctionDecl, options: TransformOptions, host: Host) -> Result<Transformed, RewriteError> {
    let mut arena = NodeArena::new();
    let root = arena.lower_function(decl);
    let report = Transformer::new(options, host).transform(&mut arena, root)?;
    Ok(Transformed { arena, root, report })
}

pub fn transform_with(decl: &FunctionDecl, options: TransformOptions) -> Transformed {
    try_transform_with(decl, options, Host::standard()).expect("transform should succeed")
}

/// Raw lifted form, optimizer off.
pub fn lifted(decl: &FunctionDecl) -> Transformed {
    transform_with(decl, TransformOptions::unoptimized())
}

pub fn optimized(decl: &FunctionDecl) -> Transformed {
    transform_with(decl, TransformOptions::default())
}

/// No block under `root` declares the same name twice.
pub fn assert_hygienic(arena: &NodeArena, root: NodeIndex) {
    for idx in arena.descendants(root) {
        let Some(block) = arena.get_block(idx) else {
            continue;
        };
        let mut seen = FxHashSet::default();
        for &statement in &block.statements {
            let declared: Vec<&str> = match arena.kind(statement) {
                Some(NodeKind::Property(p)) => vec![p.name.as_str()],
                Some(NodeKind::Destructuring(d)) => {
                    d.entries.iter().filter_map(|&e| arena.declared_name(e)).collect()
                }
                _ => Vec::new(),
            };
            for name in declared {
                assert!(
                    seen.insert(name.to_string()),
                    "'{name}' declared twice in one block:\n{}",
                    print_function(arena, root)
                );
            }
        }
    }
}
