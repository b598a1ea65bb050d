use crate::*;

fn lowered(statements: Vec<Stmt>) -> (NodeArena, NodeIndex, NodeIndex) {
    let mut arena = NodeArena::new();
    let function = arena.lower_function(&FunctionDecl::block("f", vec![], None, statements));
    let body = arena.get_function(function).map(|f| f.body).unwrap_or_default();
    (arena, function, body)
}

fn statements(arena: &NodeArena, block: NodeIndex) -> Vec<NodeIndex> {
    arena.get_block(block).map(|b| b.statements.clone()).unwrap_or_default()
}

#[test]
fn test_replace_updates_parent_links() {
    let (mut arena, function, body) = lowered(vec![Stmt::ret(Expr::name("a"))]);
    let ret = statements(&arena, body)[0];
    let old = arena.get_return(ret).map(|r| r.value).unwrap_or_default();
    let new = arena.lower_expr(&Expr::name("b"));

    arena.replace(old, new).expect("replace should succeed");

    assert_eq!(arena.parent(new), ret);
    assert!(arena.parent(old).is_none());
    assert!(!arena.is_attached_to(old, function));
    assert_eq!(print_function(&arena, function), "fun f() {\n    return b\n}");
}

#[test]
fn test_replace_rejects_owned_node() {
    let (mut arena, _, body) = lowered(vec![Stmt::expr(Expr::name("a")), Stmt::expr(Expr::name("b"))]);
    let stmts = statements(&arena, body);
    let err = arena.replace(stmts[0], stmts[1]).expect_err("owned node must be rejected");
    assert!(matches!(err, TreeError::AlreadyOwned { .. }));
}

#[test]
fn test_insert_before_and_after_anchor() {
    let (mut arena, function, body) = lowered(vec![Stmt::expr(Expr::name("b"))]);
    let anchor = statements(&arena, body)[0];
    let before = arena.lower_expr(&Expr::name("a"));
    let after = arena.lower_expr(&Expr::name("c"));
    arena.insert_before(anchor, before).expect("insert before");
    arena.insert_after(anchor, after).expect("insert after");
    assert_eq!(print_function(&arena, function), "fun f() {\n    a\n    b\n    c\n}");
    assert_eq!(arena.next_statement(before), anchor);
}

#[test]
fn test_insert_before_non_statement_fails() {
    let (mut arena, _, body) = lowered(vec![Stmt::ret(Expr::name("a"))]);
    let ret = statements(&arena, body)[0];
    let value = arena.get_return(ret).map(|r| r.value).unwrap_or_default();
    let stmt = arena.lower_expr(&Expr::name("x"));
    assert_eq!(arena.insert_before(value, stmt), Err(TreeError::NotAStatement(value)));
}

#[test]
fn test_remove_statement_and_detach() {
    let (mut arena, function, body) = lowered(vec![Stmt::expr(Expr::name("a")), Stmt::expr(Expr::name("b"))]);
    let first = statements(&arena, body)[0];
    arena.remove_statement(first).expect("remove");
    assert_eq!(statements(&arena, body).len(), 1);
    assert_eq!(arena.detach(first), Err(TreeError::Detached(first)));
    assert_eq!(print_function(&arena, function), "fun f() {\n    b\n}");
}

#[test]
fn test_deep_clone_relinks_inner_bindings_only() {
    let (mut arena, _, body) = lowered(vec![
        Stmt::val("outer", Expr::int(1)),
        Stmt::expr(Expr::method(
            Expr::name("src"),
            "map",
            vec![Expr::lambda(
                &["v"],
                vec![Stmt::expr(Expr::binary(Expr::name("v"), BinaryOp::Plus, Expr::name("outer")))],
            )],
        )),
    ]);
    let outer = statements(&arena, body)[0];
    let original = statements(&arena, body)[1];
    let copy = arena.deep_clone(original);
    assert!(arena.parent(copy).is_none());

    let copied_lambda = arena
        .find_first(copy, |a, idx| a.get_lambda(idx).is_some())
        .expect("copied lambda");
    let copied_refs: Vec<_> = arena
        .descendants(copy)
        .into_iter()
        .filter_map(|idx| arena.get_name_ref(idx).map(|r| (r.name.clone(), r.binding)))
        .collect();
    for (name, binding) in copied_refs {
        match name.as_str() {
            "v" => assert!(arena.is_within(binding, copied_lambda)),
            "outer" => assert_eq!(binding, outer),
            _ => assert!(binding.is_none()),
        }
    }
    assert!(!arena.same_tree(original, copy), "inner links differ between copies");
    assert_eq!(print_node(&arena, copy), print_node(&arena, original));
}

#[test]
fn test_rename_declaration_updates_references() {
    let (mut arena, function, body) = lowered(vec![
        Stmt::val("x", Expr::int(1)),
        Stmt::ret(Expr::name("x")),
    ]);
    let property = statements(&arena, body)[0];
    arena.rename_declaration(function, property, "y");
    assert_eq!(print_function(&arena, function), "fun f() {\n    val y = 1\n    return y\n}");
}

#[test]
fn test_return_target_resolution() {
    let (arena, function, _) = lowered(vec![Stmt::ret(Expr::method(
        Expr::name("x"),
        "let",
        vec![Expr::it_lambda(vec![
            Stmt::ret_label("let", Expr::name("it")),
            Stmt::ret(Expr::null()),
        ])],
    ))]);
    let lambda = arena
        .find_first(function, |a, idx| a.get_lambda(idx).is_some())
        .expect("lambda");
    assert_eq!(arena.lambda_label(lambda), Some("let"));
    let lambda_returns = arena.returns_targeting(lambda);
    assert_eq!(lambda_returns.len(), 1);
    assert_eq!(arena.returns_targeting(function).len(), 2);
}

#[test]
fn test_destructure_lambda_params() {
    let mut arena = NodeArena::new();
    let lambda = arena.lower_expr(&Expr::lambda(
        &["a", "b"],
        vec![Stmt::expr(Expr::binary(Expr::name("a"), BinaryOp::Plus, Expr::name("b")))],
    ));
    arena.destructure_lambda_params(lambda).expect("lambda");
    assert_eq!(print_node(&arena, lambda), "{ (a, b) -> a + b }");
    let literal = arena.add_literal(Literal::Null);
    assert_eq!(
        arena.destructure_lambda_params(literal),
        Err(TreeError::WrongKind(literal, "Lambda"))
    );
}
