//! Tests for lexical binding of lowered functions.

use unchain_tree::binder::lexical_lookup;
use unchain_tree::*;

fn refs_named(arena: &NodeArena, root: NodeIndex, name: &str) -> Vec<NodeIndex> {
    arena
        .descendants(root)
        .into_iter()
        .filter(|&idx| arena.get_name_ref(idx).is_some_and(|r| r.name == name))
        .collect()
}

fn binding(arena: &NodeArena, reference: NodeIndex) -> NodeIndex {
    arena.get_name_ref(reference).map_or(NodeIndex::NONE, |r| r.binding)
}

fn body_statement(arena: &NodeArena, function: NodeIndex, pos: usize) -> NodeIndex {
    let body = arena.get_function(function).map(|f| f.body).unwrap_or_default();
    arena.get_block(body).map(|b| b.statements[pos]).unwrap_or_default()
}

#[test]
fn test_property_reference_binds_to_earlier_declaration() {
    let decl = FunctionDecl::block(
        "load",
        vec![],
        None,
        vec![
            Stmt::val("x", Expr::int(1)),
            Stmt::ret(Expr::name("x")),
        ],
    );
    let mut arena = NodeArena::new();
    let function = arena.lower_function(&decl);
    let property = body_statement(&arena, function, 0);
    let refs = refs_named(&arena, function, "x");
    assert_eq!(refs.len(), 1);
    assert_eq!(binding(&arena, refs[0]), property);
}

#[test]
fn test_parameter_and_implicit_it() {
    let decl = FunctionDecl::block(
        "load",
        vec![ParamDecl::new("id", TypeRef::named("kotlin.String"))],
        None,
        vec![Stmt::ret(Expr::method(
            Expr::name("id"),
            "let",
            vec![Expr::it_lambda(vec![Stmt::expr(Expr::name("it"))])],
        ))],
    );
    let mut arena = NodeArena::new();
    let function = arena.lower_function(&decl);
    let param = arena.get_function(function).map(|f| f.params[0]).unwrap_or_default();

    let id_ref = refs_named(&arena, function, "id")[0];
    assert_eq!(binding(&arena, id_ref), param);

    let it_ref = refs_named(&arena, function, "it")[0];
    let lambda = binding(&arena, it_ref);
    assert!(arena.get_lambda(lambda).is_some(), "`it` should bind to its lambda");
}

#[test]
fn test_inner_lambda_parameter_shadows_outer_property() {
    let decl = FunctionDecl::block(
        "load",
        vec![],
        None,
        vec![
            Stmt::val("x", Expr::int(1)),
            Stmt::ret(Expr::method(
                Expr::name("source"),
                "map",
                vec![Expr::lambda(&["x"], vec![Stmt::expr(Expr::name("x"))])],
            )),
        ],
    );
    let mut arena = NodeArena::new();
    let function = arena.lower_function(&decl);
    let inner = refs_named(&arena, function, "x")[0];
    let target = binding(&arena, inner);
    assert!(arena.get_param(target).is_some(), "inner x must bind to the lambda parameter");
}

#[test]
fn test_initializer_does_not_see_its_own_declaration() {
    let decl = FunctionDecl::block(
        "load",
        vec![ParamDecl::new("x", TypeRef::named("kotlin.Int"))],
        None,
        vec![Stmt::val("x", Expr::name("x")), Stmt::ret(Expr::name("x"))],
    );
    let mut arena = NodeArena::new();
    let function = arena.lower_function(&decl);
    let param = arena.get_function(function).map(|f| f.params[0]).unwrap_or_default();
    let property = body_statement(&arena, function, 0);
    let refs = refs_named(&arena, function, "x");
    assert_eq!(binding(&arena, refs[0]), param);
    assert_eq!(binding(&arena, refs[1]), property);
}

#[test]
fn test_member_selector_is_not_a_local_reference() {
    let decl = FunctionDecl::block(
        "load",
        vec![],
        None,
        vec![
            Stmt::val("size", Expr::int(1)),
            Stmt::ret(Expr::field(Expr::name("list"), "size")),
        ],
    );
    let mut arena = NodeArena::new();
    let function = arena.lower_function(&decl);
    let refs = refs_named(&arena, function, "size");
    assert_eq!(refs.len(), 1);
    assert!(binding(&arena, refs[0]).is_none());
}

#[test]
fn test_destructuring_and_catch_parameters() {
    let decl = FunctionDecl::block(
        "load",
        vec![],
        None,
        vec![
            Stmt::destructure(&["a", "b"], Expr::name("pair")),
            Stmt::ret(Expr::Try {
                body: vec![Stmt::expr(Expr::name("a"))],
                catch_name: "e".to_string(),
                catch_type: TypeRef::named("kotlin.Throwable"),
                handler: vec![Stmt::expr(Expr::name("e"))],
            }),
        ],
    );
    let mut arena = NodeArena::new();
    let function = arena.lower_function(&decl);
    let a_ref = refs_named(&arena, function, "a")[0];
    assert_eq!(arena.declared_name(binding(&arena, a_ref)), Some("a"));
    let e_ref = refs_named(&arena, function, "e")[0];
    let catch = binding(&arena, e_ref);
    assert_eq!(arena.declared_name(catch), Some("e"));
    assert!(arena.get_try(arena.parent(catch)).is_some());
}

#[test]
fn test_lexical_lookup_ignores_later_declarations() {
    let decl = FunctionDecl::block(
        "load",
        vec![],
        None,
        vec![Stmt::expr(Expr::name("y")), Stmt::val("y", Expr::int(2))],
    );
    let mut arena = NodeArena::new();
    let function = arena.lower_function(&decl);
    let reference = refs_named(&arena, function, "y")[0];
    assert!(binding(&arena, reference).is_none());
    assert!(lexical_lookup(&arena, reference, "y").is_none());
}

#[test]
fn test_lower_from_json_fixture() {
    let json = r#"{
        "name": "find",
        "params": [{ "name": "id", "ty": { "name": "kotlin.String" } }],
        "returnType": { "name": "reactor.core.publisher.Mono", "args": [{ "name": "kotlin.String" }] },
        "body": {
            "kind": "block",
            "statements": [
                { "kind": "val", "name": "user", "init": {
                    "kind": "call", "callee": "lookup", "args": [{ "kind": "name", "name": "id" }]
                } },
                { "kind": "expr", "expr": { "kind": "return", "value": { "kind": "name", "name": "user" } } }
            ]
        }
    }"#;
    let decl: FunctionDecl = serde_json::from_str(json).expect("fixture should parse");
    let mut arena = NodeArena::new();
    let function = arena.lower_function(&decl);
    let data = arena.get_function(function).expect("function node");
    assert_eq!(data.name, "find");
    assert!(data.return_type.as_ref().is_some_and(TypeRef::is_mono));
    let user_ref = refs_named(&arena, function, "user")[0];
    assert_eq!(binding(&arena, user_ref), body_statement(&arena, function, 0));
}
