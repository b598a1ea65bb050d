//! End-to-end behaviour of `Transformer`: eligibility, wrapping, reporting,
//! undo and host collaborators.

mod support;

use std::cell::Cell;
use std::rc::Rc;
use support::*;
use unchain_common::diagnostics::diagnostic_codes;
use unchain_rewrite::{
    ArenaResolver, CombinatorKind, Host, RewriteError, SymbolResolver, TransformOptions, Transformer,
    UnresolvedReason,
};
use unchain_tree::{
    BinaryOp, Expr, FunctionDecl, MethodRef, NodeArena, NodeIndex, ParamDecl, ParamShape, Stmt,
    TypeRef, print_function,
};

fn mapped(receiver: &str) -> Expr {
    let mapper = Expr::it_lambda(vec![Stmt::expr(Expr::method(Expr::name("it"), "toString", vec![]))]);
    on_mono(Expr::name(receiver), "map", vec![ParamShape::Function], vec![mapper])
}

fn map_fixture() -> FunctionDecl {
    load(
        vec![producer("src")],
        vec![Stmt::val("x", mapped("src")), Stmt::ret(Expr::name("x"))],
    )
}

fn codes(out: &Transformed) -> Vec<u32> {
    out.report.diagnostics.iter().map(|d| d.code).collect()
}

// =============================================================================
// Eligibility and wrapping
// =============================================================================

#[test]
fn test_function_not_returning_a_producer_is_rejected() {
    let decl = FunctionDecl::block("name", vec![], Some(TypeRef::named("String")), vec![Stmt::ret(Expr::string("a"))]);
    let mut arena = NodeArena::new();
    let root = arena.lower_function(&decl);
    let mut transformer = Transformer::standard();
    assert!(!transformer.is_eligible(&arena, root));

    let err = transformer.transform(&mut arena, root).expect_err("should be rejected");
    assert!(matches!(err, RewriteError::NotEligible { ref function } if function == "name"));
    assert_eq!(print_function(&arena, root), "fun name(): String {\n    return \"a\"\n}");
}

#[test]
fn test_expression_body_is_extracted_before_lifting() {
    let decl = FunctionDecl::expression("load", vec![producer("src")], Some(mono()), mapped("src"));
    let out = lifted(&decl);
    assert_eq!(
        out.text(),
        "fun load(src: Mono<String>): Mono<String> = mono {
    val src = src.awaitFirstOrNull()
    val map = src?.let { it.toString() }
    return@mono map
}"
    );
    assert_eq!(out.report.extracted, 1);
    assert!(out.report.wrapped);
}

#[test]
fn test_already_wrapped_body_is_only_lifted() {
    let decl = wrapped(
        vec![producer("src")],
        vec![Stmt::val("x", mapped("src")), Stmt::ret_label("mono", awaited("x"))],
    );
    let out = lifted(&decl);
    assert!(!out.report.wrapped);
    assert_eq!(out.report.extracted, 0);
    assert_eq!(
        out.text(),
        "fun load(src: Mono<String>): Mono<String> = mono {
    val src = src.awaitFirstOrNull()
    val x = src?.let { it.toString() }
    return@mono x
}"
    );
}

#[test]
fn test_every_return_is_relabelled_and_awaited() {
    let decl = load(
        vec![ParamDecl::new("flag", TypeRef::named("Boolean")), producer("src"), producer("other")],
        vec![
            Stmt::expr(Expr::if_else(
                Expr::name("flag"),
                Expr::block(vec![Stmt::ret(Expr::name("src"))]),
                None,
            )),
            Stmt::ret(Expr::name("other")),
        ],
    );
    let out = lifted(&decl);
    assert_eq!(
        out.text(),
        "fun load(flag: Boolean, src: Mono<String>, other: Mono<String>): Mono<String> = mono {
    if (flag) { return@mono src.awaitFirstOrNull() }
    return@mono other.awaitFirstOrNull()
}"
    );
    assert!(out.report.applied.is_empty());
}

// =============================================================================
// Driver behaviour
// =============================================================================

#[test]
fn test_chain_costs_one_iteration_per_binding() {
    let decl = load(
        vec![producer("src")],
        vec![
            Stmt::val("a", mapped("src")),
            Stmt::val("b", mapped("a")),
            Stmt::val("c", mapped("b")),
            Stmt::ret(Expr::name("c")),
        ],
    );
    let out = lifted(&decl);
    assert_eq!(out.report.iterations, 3);
    let bindings: Vec<&str> = out.report.applied.iter().map(|a| a.binding.as_str()).collect();
    assert_eq!(bindings, ["c", "b", "a"]);
    assert!(out.report.is_complete());
}

#[test]
fn test_second_transform_is_a_no_op() {
    let decl = map_fixture();
    let mut out = optimized(&decl);
    let first = out.text();

    let mut transformer = Transformer::standard();
    let report = transformer
        .transform(&mut out.arena, out.root)
        .expect("second transform should succeed");
    assert!(!report.wrapped);
    assert!(report.applied.is_empty());
    assert_eq!(report.optimizer.total(), 0);
    assert_eq!(print_function(&out.arena, out.root), first);
}

#[test]
fn test_iteration_limit_is_reported_as_an_error() {
    let decl = load(
        vec![producer("src")],
        vec![
            Stmt::val("a", mapped("src")),
            Stmt::val("b", mapped("a")),
            Stmt::ret(Expr::name("b")),
        ],
    );
    let options = TransformOptions {
        iteration_limit: 1,
        ..TransformOptions::unoptimized()
    };
    let Err(err) = try_transform_with(&decl, options, Host::standard()) else {
        panic!("expected the lift loop to hit its limit");
    };
    assert!(matches!(err, RewriteError::IterationLimit { limit: 1, .. }), "{err}");
}

// =============================================================================
// Partial transforms
// =============================================================================

#[test]
fn test_unsupported_combinator_is_left_in_place() {
    let cache = on_mono(Expr::name("src"), "cache", vec![], vec![]);
    let decl = load(vec![producer("src")], vec![Stmt::val("x", cache), Stmt::ret(Expr::name("x"))]);
    let out = lifted(&decl);

    assert!(!out.report.is_complete());
    assert_eq!(out.report.unresolved.len(), 1);
    let entry = &out.report.unresolved[0];
    assert_eq!(entry.binding, "x");
    assert_eq!(entry.reason, UnresolvedReason::UnsupportedCombinator { method: "cache".into() });
    assert_eq!(
        codes(&out),
        [diagnostic_codes::UNSUPPORTED_COMBINATOR, diagnostic_codes::PARTIAL_TRANSFORM]
    );
    assert_eq!(
        out.report.diagnostics[0].message_text,
        "Combinator 'cache' initializing 'x' has no rewrite rule."
    );
    assert_eq!(
        out.report.diagnostics[1].message_text,
        "Function 'load' was only partially transformed: 1 suspension point(s) still await a combinator chain."
    );
    assert!(out.text().contains("return@mono x.awaitFirstOrNull()"));
}

#[test]
fn test_shared_producer_is_not_lifted_twice() {
    let combine = Expr::lambda(
        &["a", "b"],
        vec![Stmt::expr(Expr::binary(Expr::name("a"), BinaryOp::Plus, Expr::name("b")))],
    );
    let zip = mono_static(
        "zip",
        vec![ParamShape::Producer, ParamShape::Producer, ParamShape::BiFunction],
        vec![Expr::name("a"), Expr::name("a"), combine],
    );
    let decl = load(
        vec![producer("src")],
        vec![Stmt::val("a", mapped("src")), Stmt::val("x", zip), Stmt::ret(Expr::name("x"))],
    );
    let out = lifted(&decl);

    assert!(!out.report.is_complete());
    assert_eq!(out.report.applied[0].kind, CombinatorKind::Zip2);
    for entry in &out.report.unresolved {
        assert_eq!(entry.binding, "a");
        assert_eq!(entry.reason, UnresolvedReason::SharedProducer { references: 2 });
    }
    let codes = codes(&out);
    assert!(codes.contains(&diagnostic_codes::SHARED_PRODUCER));
    assert_eq!(codes.last(), Some(&diagnostic_codes::PARTIAL_TRANSFORM));
    assert!(out.text().contains("val a = src.map { it.toString() }"));
}

#[test]
fn test_rule_with_unsupported_arguments_is_reported() {
    let flat_map = on_mono(Expr::name("src"), "flatMap", vec![ParamShape::Function], vec![Expr::name("mapper")]);
    let decl = load(vec![producer("src")], vec![Stmt::val("x", flat_map), Stmt::ret(Expr::name("x"))]);
    let out = lifted(&decl);

    assert_eq!(out.report.unresolved.len(), 1);
    assert_eq!(
        out.report.unresolved[0].reason,
        UnresolvedReason::RuleNotApplicable { kind: CombinatorKind::FlatMap }
    );
    assert_eq!(codes(&out)[0], diagnostic_codes::RULE_NOT_APPLICABLE);
}

#[test]
fn test_unbound_reference_is_a_note_not_a_failure() {
    let decl = load(vec![], vec![Stmt::ret(Expr::name("cached"))]);
    let out = lifted(&decl);

    assert!(out.report.is_complete());
    assert_eq!(codes(&out), [diagnostic_codes::UNRESOLVED_REFERENCE]);
    assert_eq!(
        out.report.diagnostics[0].message_text,
        "Reference 'cached' does not resolve to a local binding."
    );
}

#[test]
fn test_report_serializes_reason_inline() {
    let cache = on_mono(Expr::name("src"), "cache", vec![], vec![]);
    let decl = load(vec![producer("src")], vec![Stmt::val("x", cache), Stmt::ret(Expr::name("x"))]);
    let out = lifted(&decl);

    let json = serde_json::to_value(&out.report).expect("report should serialize");
    let entry = &json["unresolved"][0];
    assert_eq!(entry["binding"], "x");
    assert_eq!(entry["reason"], "unsupportedCombinator");
    assert_eq!(entry["method"], "cache");
    assert_eq!(json["function"], "load");
    assert_eq!(json["wrapped"], true);
}

// =============================================================================
// Evaluation order
// =============================================================================

fn position(text: &str, needle: &str) -> usize {
    text.find(needle).unwrap_or_else(|| panic!("'{needle}' missing from:\n{text}"))
}

#[test]
fn test_elvis_fallback_is_awaited_only_when_needed() {
    let decl = load(
        vec![producer("src"), producer("other")],
        vec![
            Stmt::val("a", mapped("src")),
            Stmt::val("b", mapped("other")),
            Stmt::val("x", Expr::elvis(Expr::name("a"), Expr::name("b"))),
            Stmt::ret(Expr::name("x")),
        ],
    );

    let out = lifted(&decl);
    assert!(out.report.is_complete());
    let kinds: Vec<CombinatorKind> = out.report.applied.iter().map(|a| a.kind).collect();
    assert_eq!(kinds, [CombinatorKind::Elvis, CombinatorKind::Map, CombinatorKind::Map]);
    let text = out.text();
    assert!(text.contains("?: run {"), "{text}");
    assert!(position(&text, "src.awaitFirstOrNull()") < position(&text, "?:"), "{text}");
    assert!(position(&text, "other.awaitFirstOrNull()") > position(&text, "?:"), "{text}");

    let text = optimized(&decl).text();
    assert!(position(&text, "other.awaitFirstOrNull()") > position(&text, "?:"), "{text}");
}

#[test]
fn test_await_in_an_if_branch_stays_in_the_branch() {
    let decl = wrapped(
        vec![ParamDecl::new("flag", TypeRef::named("Boolean")), producer("src")],
        vec![
            Stmt::val("a", mapped("src")),
            Stmt::ret_label("mono", Expr::if_else(Expr::name("flag"), awaited("a"), Some(Expr::null()))),
        ],
    );
    let out = lifted(&decl);
    assert!(out.report.is_complete());
    assert_eq!(out.report.applied[0].kind, CombinatorKind::Map);
    let text = out.text();
    assert!(position(&text, "if (flag)") < position(&text, "src.awaitFirstOrNull()"), "{text}");
}

// =============================================================================
// Scope functions
// =============================================================================

#[test]
fn test_run_block_in_a_branch_is_typed_and_lifted() {
    let branch = |name: &str, receiver: &str| {
        Expr::call(
            "run",
            vec![Expr::it_lambda(vec![Stmt::val(name, mapped(receiver)), Stmt::expr(Expr::name(name))])],
        )
    };
    let decl = load(
        vec![ParamDecl::new("flag", TypeRef::named("Boolean")), producer("src"), producer("other")],
        vec![
            Stmt::val("x", Expr::if_else(Expr::name("flag"), branch("v", "src"), Some(branch("w", "other")))),
            Stmt::ret(Expr::name("x")),
        ],
    );
    let out = lifted(&decl);

    assert!(out.report.is_complete(), "unexpected unresolved: {:?}", out.report.unresolved);
    assert_eq!(out.report.extracted, 2);
    let maps = out.report.applied.iter().filter(|a| a.kind == CombinatorKind::Map).count();
    assert_eq!(maps, 2);
    let text = out.text();
    assert!(!text.contains("}.awaitFirstOrNull()"), "{text}");
    assert!(!text.contains(".map {"), "{text}");
    assert_hygienic(&out.arena, out.root);
}

#[test]
fn test_await_through_an_unliftable_expression_is_reported() {
    let run = Expr::call(
        "run",
        vec![Expr::it_lambda(vec![Stmt::val("v", mapped("src")), Stmt::expr(Expr::name("v"))])],
    );
    let decl = wrapped(
        vec![producer("src")],
        vec![Stmt::ret_label("mono", Expr::method(run, "awaitFirstOrNull", vec![]))],
    );
    let out = lifted(&decl);

    assert!(!out.report.is_complete());
    assert_eq!(out.report.unresolved.len(), 1);
    let entry = &out.report.unresolved[0];
    assert_eq!(entry.binding, "load");
    assert_eq!(entry.reason, UnresolvedReason::UnliftedAwait { method: "map".into() });
    assert_eq!(codes(&out), [diagnostic_codes::UNLIFTED_AWAIT, diagnostic_codes::PARTIAL_TRANSFORM]);
    assert_eq!(
        out.report.diagnostics[0].message_text,
        "Combinator 'map' in 'load' is awaited through an expression that could not be lifted."
    );
}

// =============================================================================
// Failure and undo
// =============================================================================

#[test]
fn test_failed_rule_can_be_undone() {
    let empty_let = Expr::method(Expr::name("src"), "let", vec![Expr::it_lambda(vec![])]);
    let decl = load(vec![producer("src")], vec![Stmt::val("x", empty_let), Stmt::ret(Expr::name("x"))]);
    let mut arena = NodeArena::new();
    let root = arena.lower_function(&decl);
    let original = print_function(&arena, root);

    let mut transformer = Transformer::new(TransformOptions::unoptimized(), Host::standard());
    let err = transformer.transform(&mut arena, root).expect_err("empty lambda yields no value");
    assert!(matches!(err, RewriteError::StructuralViolation { .. }), "{err}");

    assert!(transformer.undo(&mut arena));
    assert_eq!(print_function(&arena, root), original);
}

// =============================================================================
// Host collaborators
// =============================================================================

/// Resolves names but knows no call targets.
struct NoCalls;

impl SymbolResolver for NoCalls {
    fn resolve_reference(&self, arena: &NodeArena, name_ref: NodeIndex) -> Option<NodeIndex> {
        ArenaResolver.resolve_reference(arena, name_ref)
    }

    fn resolve_call(&self, _arena: &NodeArena, _call: NodeIndex) -> Option<MethodRef> {
        None
    }

    fn expression_type(&self, arena: &NodeArena, expr: NodeIndex) -> Option<TypeRef> {
        ArenaResolver.expression_type(arena, expr)
    }
}

/// Counts the call targets the engine asks for.
#[derive(Default)]
struct Counting {
    calls: Rc<Cell<usize>>,
}

impl SymbolResolver for Counting {
    fn resolve_reference(&self, arena: &NodeArena, name_ref: NodeIndex) -> Option<NodeIndex> {
        ArenaResolver.resolve_reference(arena, name_ref)
    }

    fn resolve_call(&self, arena: &NodeArena, call: NodeIndex) -> Option<MethodRef> {
        self.calls.set(self.calls.get() + 1);
        ArenaResolver.resolve_call(arena, call)
    }

    fn expression_type(&self, arena: &NodeArena, expr: NodeIndex) -> Option<TypeRef> {
        ArenaResolver.expression_type(arena, expr)
    }
}

#[test]
fn test_call_targets_come_from_the_host_resolver() {
    let resolver = Counting::default();
    let calls = Rc::clone(&resolver.calls);
    let host = Host::standard().with_resolver(resolver);
    let out = try_transform_with(&map_fixture(), TransformOptions::default(), host).expect("transform");

    assert_eq!(out.report.applied.len(), 1);
    assert!(calls.get() > 0);
}

#[test]
fn test_classification_goes_through_the_host_resolver() {
    let host = Host::standard().with_resolver(NoCalls);
    let out = try_transform_with(&map_fixture(), TransformOptions::unoptimized(), host).expect("transform");

    assert!(out.report.applied.is_empty());
    assert!(out.report.is_complete());
    assert_eq!(
        out.text(),
        "fun load(src: Mono<String>): Mono<String> = mono {
    val x = src.map { it.toString() }
    return@mono x.awaitFirstOrNull()
}"
    );
}
