//! Post-rewrite optimizer passes, on lifted output and on hand-written
//! direct-style bodies.

mod support;

use smallvec::SmallVec;
use support::*;
use unchain_rewrite::{
    DiagnosticOracle, Host, HostDiagnostic, HostDiagnosticKind, OptimizerPasses, RewriteError, StaticAnalyzer,
    TransformOptions,
};
use unchain_tree::{
    BinaryOp, Expr, FunctionDecl, NodeArena, NodeIndex, NodeKind, ParamDecl, ParamShape, Stmt,
    TypeRef,
};

fn key() -> ParamDecl {
    ParamDecl::new("key", TypeRef::named("Int").nullable())
}

fn zip_fixture() -> FunctionDecl {
    let combine = Expr::lambda(
        &["a", "b"],
        vec![Stmt::expr(Expr::binary(Expr::name("a"), BinaryOp::Plus, Expr::name("b")))],
    );
    let zip = mono_static(
        "zip",
        vec![ParamShape::Producer, ParamShape::Producer, ParamShape::BiFunction],
        vec![Expr::name("src"), Expr::name("other"), combine],
    );
    load(
        vec![producer("src"), producer("other")],
        vec![Stmt::val("x", zip), Stmt::ret(Expr::name("x"))],
    )
}

// =============================================================================
// Lifted output
// =============================================================================

#[test]
fn test_map_collapses_into_a_guard_and_a_return() {
    let mapper = Expr::it_lambda(vec![Stmt::expr(Expr::method(Expr::name("it"), "toString", vec![]))]);
    let decl = load(
        vec![producer("src")],
        vec![
            Stmt::val("x", on_mono(Expr::name("src"), "map", vec![ParamShape::Function], vec![mapper])),
            Stmt::ret(Expr::name("x")),
        ],
    );
    let out = optimized(&decl);
    assert_eq!(
        out.text(),
        "fun load(src: Mono<String>): Mono<String> = mono {
    val src1 = src.awaitFirstOrNull()
    val src = src1 ?: return@mono null
    return@mono src.toString()
}"
    );
    assert_eq!(out.report.optimizer.let_returns, 1);
    assert_eq!(out.report.optimizer.renamed, 1);
}

#[test]
fn test_defer_flattens_to_a_single_return() {
    let supplier = Expr::it_lambda(vec![Stmt::expr(Expr::name("src"))]);
    let decl = load(
        vec![producer("src")],
        vec![
            Stmt::val("x", mono_static("defer", vec![ParamShape::Supplier], vec![supplier])),
            Stmt::ret(Expr::name("x")),
        ],
    );
    let out = optimized(&decl);
    assert_eq!(
        out.text(),
        "fun load(src: Mono<String>): Mono<String> = mono { return@mono src.awaitFirstOrNull() }"
    );
    assert_eq!(out.report.optimizer.flattened_runs, 1);
    assert_eq!(out.report.optimizer.single_use, 1);
}

#[test]
fn test_zip_tasks_are_renamed_but_never_inlined() {
    let out = optimized(&zip_fixture());
    assert_eq!(
        out.text(),
        "fun load(src: Mono<String>, other: Mono<String>): Mono<String> = mono {
    val async1 = async { src.awaitFirstOrNull() }
    val async = async { other.awaitFirstOrNull() }
    val src = async1.await()
    val other = async.await()
    return@mono if (src != null && other != null) Pair(src, other).let { (a, b) -> a + b } else null
}"
    );
}

#[test]
fn test_hygiene_only_keeps_the_lifted_shape() {
    let options = TransformOptions {
        passes: OptimizerPasses::hygiene_only(),
        ..TransformOptions::default()
    };
    let out = transform_with(&zip_fixture(), options);
    assert_eq!(
        out.text(),
        "fun load(src: Mono<String>, other: Mono<String>): Mono<String> = mono {
    val async1 = async { src.awaitFirstOrNull() }
    val async = async { other.awaitFirstOrNull() }
    val src = async1.await()
    val other = async.await()
    val x = if (src != null && other != null) Pair(src, other).let { (a, b) -> a + b } else null
    return@mono x
}"
    );
    assert_eq!(out.report.optimizer.renamed, 1);
    assert_eq!(out.report.optimizer.total(), 1);
}

#[test]
fn test_disabled_pass_does_not_run() {
    let supplier = Expr::it_lambda(vec![Stmt::expr(Expr::name("src"))]);
    let decl = load(
        vec![producer("src")],
        vec![
            Stmt::val("x", mono_static("defer", vec![ParamShape::Supplier], vec![supplier])),
            Stmt::ret(Expr::name("x")),
        ],
    );
    let mut options = TransformOptions::default();
    options.passes.single_use = false;
    let out = transform_with(&decl, options);
    assert_eq!(
        out.text(),
        "fun load(src: Mono<String>): Mono<String> = mono {
    val x = src.awaitFirstOrNull()
    return@mono x
}"
    );
    assert_eq!(out.report.optimizer.single_use, 0);
}

#[test]
fn test_chained_filters_end_up_hygienic() {
    let predicate = |method: &str| {
        Expr::it_lambda(vec![Stmt::expr(Expr::method(Expr::name("it"), method, vec![]))])
    };
    let decl = load(
        vec![producer("src")],
        vec![
            Stmt::val(
                "a",
                on_mono(Expr::name("src"), "filter", vec![ParamShape::Predicate], vec![predicate("isEmpty")]),
            ),
            Stmt::val(
                "b",
                on_mono(Expr::name("a"), "filter", vec![ParamShape::Predicate], vec![predicate("isBlank")]),
            ),
            Stmt::ret(Expr::name("b")),
        ],
    );
    let out = optimized(&decl);
    assert!(out.report.is_complete());
    assert_hygienic(&out.arena, out.root);
}

#[test]
fn test_nested_scope_bodies_end_up_hygienic() {
    let mapped = || {
        let mapper = Expr::it_lambda(vec![Stmt::expr(Expr::method(Expr::name("it"), "toString", vec![]))]);
        on_mono(Expr::name("src"), "map", vec![ParamShape::Function], vec![mapper])
    };
    let key_let = || Expr::method(Expr::name("key"), "let", vec![Expr::it_lambda(vec![Stmt::expr(Expr::name("src"))])]);
    let combine = Expr::lambda(
        &["a", "b"],
        vec![Stmt::expr(Expr::binary(Expr::name("a"), BinaryOp::Plus, Expr::name("b")))],
    );
    let zip = mono_static(
        "zip",
        vec![ParamShape::Producer, ParamShape::Producer, ParamShape::BiFunction],
        vec![key_let(), key_let(), combine],
    );
    let then = on_mono(Expr::name("a"), "then", vec![ParamShape::Producer], vec![Expr::name("b")]);
    let branches = Expr::if_else(
        Expr::binary(Expr::name("k"), BinaryOp::Eq, Expr::int(1)),
        then,
        Some(Expr::call("run", vec![Expr::it_lambda(vec![Stmt::expr(zip)])])),
    );
    let body = Expr::lambda(
        &["k"],
        vec![Stmt::val("a", mapped()), Stmt::val("b", mapped()), Stmt::expr(branches)],
    );
    let decl = load(
        vec![ParamDecl::new("key", TypeRef::named("Int")), producer("src")],
        vec![
            Stmt::val("x", Expr::method(Expr::name("key"), "let", vec![body])),
            Stmt::ret(Expr::name("x")),
        ],
    );

    let out = lifted(&decl);
    assert!(out.report.is_complete(), "unexpected unresolved: {:?}", out.report.unresolved);
    let text = out.text();
    for name in ["val src = ", "val let = ", "val value = "] {
        assert!(text.contains(name), "{name} missing from:\n{text}");
    }

    let out = optimized(&decl);
    assert!(out.report.is_complete());
    assert!(out.report.optimizer.renamed > 0);
    assert_hygienic(&out.arena, out.root);
}

// =============================================================================
// Direct-style bodies
// =============================================================================

#[test]
fn test_exact_copies_are_replaced_by_their_source() {
    let decl = wrapped(
        vec![key()],
        vec![
            Stmt::val("a", Expr::name("key")),
            Stmt::val("b", Expr::name("a")),
            Stmt::ret_label("mono", Expr::call("describe", vec![Expr::name("b")])),
        ],
    );
    let out = optimized(&decl);
    assert_eq!(out.text(), "fun load(key: Int?): Mono<String> = mono { return@mono describe(key) }");
    assert_eq!(out.report.optimizer.exact_copies, 2);
}

#[test]
fn test_optimizer_pass_respects_the_iteration_limit() {
    let decl = wrapped(
        vec![key()],
        vec![
            Stmt::val("a", Expr::name("key")),
            Stmt::val("b", Expr::name("a")),
            Stmt::ret_label("mono", Expr::call("describe", vec![Expr::name("b")])),
        ],
    );
    let options = TransformOptions {
        iteration_limit: 1,
        ..TransformOptions::default()
    };
    let Err(err) = try_transform_with(&decl, options, Host::standard()) else {
        panic!("expected the exact-copies pass to hit its limit");
    };
    assert!(
        matches!(err, RewriteError::IterationLimit { pass: "exact copies", limit: 1 }),
        "{err}"
    );

    let options = TransformOptions {
        iteration_limit: usize::MAX,
        ..TransformOptions::default()
    };
    let out = transform_with(&decl, options);
    assert_eq!(out.report.optimizer.exact_copies, 2);
}

#[test]
fn test_nullable_let_becomes_a_guard() {
    let lookup = Expr::safe_method(
        Expr::name("key"),
        "let",
        vec![Expr::lambda(&["k"], vec![Stmt::expr(Expr::call("describe", vec![Expr::name("k")]))])],
    );
    let decl = wrapped(
        vec![key()],
        vec![
            Stmt::val("name", Expr::elvis(lookup, Expr::ret(Some("mono"), Some(Expr::null())))),
            Stmt::ret_label("mono", Expr::name("name")),
        ],
    );
    let out = optimized(&decl);
    assert_eq!(
        out.text(),
        "fun load(key: Int?): Mono<String> = mono {
    val k = key ?: return@mono null
    val name = describe(k) ?: return@mono null
    return@mono name
}"
    );
    assert_eq!(out.report.optimizer.nullable_lets, 1);
}

#[test]
fn test_statement_run_block_is_flattened() {
    let run = Expr::call(
        "run",
        vec![Expr::it_lambda(vec![
            Stmt::expr(Expr::call("log", vec![])),
            Stmt::val("a", Expr::call("fetch", vec![])),
        ])],
    );
    let decl = wrapped(vec![key()], vec![Stmt::expr(run), Stmt::ret_label("mono", Expr::name("key"))]);
    let out = optimized(&decl);
    assert_eq!(
        out.text(),
        "fun load(key: Int?): Mono<String> = mono {
    log()
    val a = fetch()
    return@mono key
}"
    );
    assert_eq!(out.report.optimizer.flattened_runs, 1);
}

#[test]
fn test_single_use_does_not_move_past_other_calls() {
    let decl = wrapped(
        vec![key()],
        vec![
            Stmt::val("a", Expr::call("fetch", vec![])),
            Stmt::val("b", Expr::call("combine", vec![Expr::call("log", vec![]), Expr::name("a")])),
            Stmt::ret_label("mono", Expr::name("b")),
        ],
    );
    let out = optimized(&decl);
    assert_eq!(
        out.text(),
        "fun load(key: Int?): Mono<String> = mono {
    val a = fetch()
    return@mono combine(log(), a)
}"
    );
}

#[test]
fn test_single_use_does_not_move_into_a_branch() {
    let decl = wrapped(
        vec![ParamDecl::new("flag", TypeRef::named("Boolean"))],
        vec![
            Stmt::val("a", Expr::call("fetch", vec![])),
            Stmt::ret_label("mono", Expr::if_else(Expr::name("flag"), Expr::name("a"), Some(Expr::null()))),
        ],
    );
    let out = optimized(&decl);
    assert_eq!(
        out.text(),
        "fun load(flag: Boolean): Mono<String> = mono {
    val a = fetch()
    return@mono if (flag) a else null
}"
    );
    assert_eq!(out.report.optimizer.total(), 0);
}

// =============================================================================
// Host oracle
// =============================================================================

/// Reports every elvis as useless on top of the static analysis.
struct EveryElvisUseless;

impl DiagnosticOracle for EveryElvisUseless {
    fn diagnostics(&self, arena: &NodeArena, node: NodeIndex) -> SmallVec<[HostDiagnostic; 2]> {
        let mut out = StaticAnalyzer.diagnostics(arena, node);
        if let Some(NodeKind::Binary(b)) = arena.kind(node)
            && b.op == BinaryOp::Elvis
            && !out.iter().any(|d| d.kind == HostDiagnosticKind::UselessElvis)
        {
            out.push(HostDiagnostic {
                kind: HostDiagnosticKind::UselessElvis,
                node,
            });
        }
        out
    }
}

fn elvis_fixture() -> FunctionDecl {
    load(
        vec![producer("src"), producer("other")],
        vec![
            Stmt::val("x", Expr::elvis(Expr::name("src"), Expr::name("other"))),
            Stmt::ret(Expr::name("x")),
        ],
    )
}

#[test]
fn test_useless_elvis_follows_the_host_oracle() {
    let host = Host::standard().with_oracle(EveryElvisUseless);
    let out = try_transform_with(&elvis_fixture(), TransformOptions::default(), host).expect("transform");
    assert_eq!(
        out.text(),
        "fun load(src: Mono<String>, other: Mono<String>): Mono<String> = mono { return@mono src?.awaitFirstOrNull() }"
    );
    assert_eq!(out.report.optimizer.useless_elvis, 1);
}

#[test]
fn test_elvis_with_nullable_left_is_kept() {
    let out = optimized(&elvis_fixture());
    assert!(out.text().contains("src?.awaitFirstOrNull() ?: other?.awaitFirstOrNull()"));
    assert_eq!(out.report.optimizer.useless_elvis, 0);
}
