use crate::driver::{Rewrite, run_to_fixed_point};
use crate::error::RewriteError;
use crate::host::{DirectWrite, Journal, MutationScope};
use unchain_tree::{Expr, FunctionDecl, Literal, NodeArena, NodeIndex, Stmt, TypeRef};

/// Removes every `null` expression statement, one per application.
struct DropNulls;

impl Rewrite for DropNulls {
    type Candidate = NodeIndex;
    const NAME: &'static str = "drop nulls";

    fn find(&mut self, arena: &NodeArena, root: NodeIndex) -> Vec<NodeIndex> {
        arena
            .descendants(root)
            .into_iter()
            .filter(|&idx| arena.is_null_literal(idx) && arena.get_block(arena.parent(idx)).is_some())
            .collect()
    }

    fn apply(
        &mut self,
        arena: &mut NodeArena,
        scope: &mut dyn MutationScope,
        _root: NodeIndex,
        candidate: NodeIndex,
    ) -> Result<bool, RewriteError> {
        scope.write(arena, &mut |arena| Ok(arena.remove_statement(candidate)?))?;
        Ok(true)
    }
}

/// Appends a statement on every application and never runs out of work.
struct Grow;

impl Rewrite for Grow {
    type Candidate = NodeIndex;
    const NAME: &'static str = "grow";

    fn find(&mut self, arena: &NodeArena, root: NodeIndex) -> Vec<NodeIndex> {
        arena.get_function(root).map(|f| vec![f.body]).unwrap_or_default()
    }

    fn apply(
        &mut self,
        arena: &mut NodeArena,
        scope: &mut dyn MutationScope,
        _root: NodeIndex,
        body: NodeIndex,
    ) -> Result<bool, RewriteError> {
        scope.write(arena, &mut |arena| {
            let statement = arena.add_literal(Literal::Int(1));
            Ok(arena.push_statement(body, statement)?)
        })?;
        Ok(true)
    }
}

/// Finds candidates but never applies them.
struct Refuse;

impl Rewrite for Refuse {
    type Candidate = NodeIndex;
    const NAME: &'static str = "refuse";

    fn find(&mut self, arena: &NodeArena, root: NodeIndex) -> Vec<NodeIndex> {
        arena.descendants(root)
    }

    fn apply(
        &mut self,
        _arena: &mut NodeArena,
        _scope: &mut dyn MutationScope,
        _root: NodeIndex,
        _candidate: NodeIndex,
    ) -> Result<bool, RewriteError> {
        Ok(false)
    }
}

fn function(statements: Vec<Stmt>) -> (NodeArena, NodeIndex) {
    let mut arena = NodeArena::new();
    let decl = FunctionDecl::block("f", Vec::new(), Some(TypeRef::named("Unit")), statements);
    let root = arena.lower_function(&decl);
    (arena, root)
}

#[test]
fn test_fixed_point_counts_applications() {
    let (mut arena, root) = function(vec![
        Stmt::expr(Expr::null()),
        Stmt::val("a", Expr::int(1)),
        Stmt::expr(Expr::null()),
    ]);
    let applied = run_to_fixed_point(&mut DropNulls, &mut arena, &mut DirectWrite, root, 10).expect("converges");
    assert_eq!(applied, 2);
    let body = arena.get_function(root).map(|f| f.body).expect("function body");
    assert_eq!(arena.get_block(body).map(|b| b.statements.len()), Some(1));
}

#[test]
fn test_no_candidate_means_no_iteration() {
    let (mut arena, root) = function(vec![Stmt::val("a", Expr::int(1))]);
    let applied = run_to_fixed_point(&mut DropNulls, &mut arena, &mut DirectWrite, root, 10).expect("converges");
    assert_eq!(applied, 0);
}

#[test]
fn test_refused_candidates_end_the_loop() {
    let (mut arena, root) = function(vec![Stmt::expr(Expr::null())]);
    let applied = run_to_fixed_point(&mut Refuse, &mut arena, &mut DirectWrite, root, 10).expect("converges");
    assert_eq!(applied, 0);
}

#[test]
fn test_iteration_limit_is_an_error() {
    let (mut arena, root) = function(Vec::new());
    let err = run_to_fixed_point(&mut Grow, &mut arena, &mut DirectWrite, root, 5).expect_err("never converges");
    assert!(
        matches!(err, RewriteError::IterationLimit { pass: "grow", limit: 5 }),
        "unexpected error: {err}"
    );
}

#[test]
fn test_journal_restores_failed_edit_and_undoes_operation() {
    let (mut arena, root) = function(vec![Stmt::expr(Expr::null()), Stmt::val("a", Expr::int(1))]);
    let original = unchain_tree::print_function(&arena, root);
    let mut journal = Journal::default();
    journal.begin();

    run_to_fixed_point(&mut DropNulls, &mut arena, &mut journal, root, 10).expect("converges");
    assert_eq!(journal.writes(), 1);

    let orphan = arena.add_literal(Literal::Null);
    let failed = journal.write(&mut arena, &mut |arena| {
        let body = arena.get_function(root).map(|f| f.body).unwrap_or(NodeIndex::NONE);
        arena.push_statement(body, orphan)?;
        Ok(arena.remove_statement(orphan).and_then(|()| arena.remove_statement(orphan))?)
    });
    assert!(failed.is_err());
    assert_eq!(journal.writes(), 1);

    assert!(journal.undo(&mut arena));
    assert_eq!(unchain_tree::print_function(&arena, root), original);
    assert!(!journal.undo(&mut arena));
}
