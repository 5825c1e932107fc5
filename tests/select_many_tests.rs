use std::sync::Arc;

use linq_rewrite::ast::{Expr, Expression, Operator, Path, ValueType};
use linq_rewrite::render::render;
use linq_rewrite::{
    RewriteContext, RewriteOptions, StructuralShapeError, collect_roots, normalize_select_many,
};

// Helper functions to build trees for testing
fn var(name: &str, class: &str) -> Arc<Path> {
    Path::variable(name, ValueType::object(class))
}

fn member(parent: &Arc<Path>, name: &str) -> Arc<Path> {
    Path::property(parent, name, ValueType::Collection)
}

fn path(p: &Arc<Path>) -> Expr {
    Expression::path(p.clone())
}

fn select_many(source: Expr, lambda: Expr, alias_or_selector: Expr) -> Expr {
    Expression::operation(
        ValueType::Collection,
        Operator::SelectMany,
        vec![source, Expression::list(vec![lambda, alias_or_selector])],
    )
}

fn select(source: Expr, lambda: Expr) -> Expr {
    Expression::operation(ValueType::Collection, Operator::Select, vec![source, lambda])
}

fn normalize(expr: &Expr) -> Expr {
    normalize_select_many(expr, &mut RewriteContext::default()).unwrap()
}

/// `docs.SelectMany(x => x.Children, c)`
fn implicit_pairing() -> (Expr, Arc<Path>, Arc<Path>) {
    let docs = var("docs", "Family");
    let x = var("x", "Family");
    let c = var("c", "Person");
    let expr = select_many(
        path(&docs),
        Expression::lambda(path(&x), path(&member(&x, "Children"))),
        path(&c),
    );
    (expr, x, c)
}

// ========================================================================
// Translation Shapes
// ========================================================================

#[test]
fn test_explicit_selector() {
    // docs.SelectMany(x => x.Children, (x, c) => new { X = x, C = c })
    let docs = var("docs", "Family");
    let x = var("x", "Family");
    let c = var("c", "Person");
    let selector = Expression::anonymous([("X", path(&x)), ("C", path(&c))]);
    let source = path(&docs);
    let expr = select_many(
        source.clone(),
        Expression::lambda(path(&x), path(&member(&x, "Children"))),
        Expression::lambda(path(&c), selector.clone()),
    );

    let mut ctx = RewriteContext::default();
    let result = normalize_select_many(&expr, &mut ctx).unwrap();

    assert_eq!(result.operator(), Some(Operator::SelectManyTranslated));
    let args = result.args();
    assert_eq!(args.len(), 3);
    assert!(Arc::ptr_eq(&args[0], &source));

    // Outer lambda bound to x
    let (outer_param, outer_body) = args[1].as_path_lambda().unwrap();
    assert_eq!(outer_param, &x);
    assert_eq!(render(outer_body), "x.Children");

    // Selector lambda over WRAPPED(LIST(x, c)), body kept as is
    assert_eq!(args[2].operator(), Some(Operator::Lambda));
    let params = &args[2].args()[0];
    assert_eq!(params.operator(), Some(Operator::Wrapped));
    assert_eq!(
        params.args()[0].as_ref(),
        Expression::list(vec![path(&x), path(&c)]).as_ref()
    );
    assert!(Arc::ptr_eq(&args[2].args()[1], &selector));

    // Nothing to rename with an explicit selector
    assert!(ctx.substitutions().is_empty());
    assert_eq!(ctx.next_id(), 0);
}

#[test]
fn test_implicit_pairing_synthesizes_anonymous_selector() {
    let (expr, x, c) = implicit_pairing();

    let mut ctx = RewriteContext::default();
    let result = normalize_select_many(&expr, &mut ctx).unwrap();

    assert_eq!(result.operator(), Some(Operator::SelectManyTranslated));
    let selector = &result.args()[2].args()[1];
    let expected = Expression::anonymous([("X", path(&x)), ("C", path(&c))]);
    assert_eq!(selector.as_ref(), expected.as_ref());

    // Both names now live on the transient pair
    assert_eq!(ctx.next_id(), 1);
    let renamed: Vec<(String, String)> = ctx
        .substitutions()
        .iter()
        .map(|(original, replacement)| (original.dotted(), render(replacement)))
        .collect();
    assert_eq!(
        renamed,
        vec![
            ("x".to_string(), "transId_0.x".to_string()),
            ("c".to_string(), "transId_0.c".to_string()),
        ]
    );
}

#[test]
fn test_implicit_and_explicit_render_the_same() {
    let (implicit, x, c) = implicit_pairing();
    let docs = var("docs", "Family");
    let explicit = select_many(
        path(&docs),
        Expression::lambda(path(&x), path(&member(&x, "Children"))),
        Expression::lambda(
            path(&c),
            Expression::anonymous([("X", path(&x)), ("C", path(&c))]),
        ),
    );

    let expected = "docs.SelectMany(x => x.Children, (x, c) => new { X = x, C = c })";
    assert_eq!(render(&normalize(&implicit)), expected);
    assert_eq!(render(&normalize(&explicit)), expected);
}

#[test]
fn test_translated_node_keeps_static_type() {
    let (expr, _, _) = implicit_pairing();
    let result = normalize(&expr);
    assert_eq!(result.ty(), &ValueType::Collection);
}

// ========================================================================
// Renaming Through The Transient Pair
// ========================================================================

#[test]
fn test_later_lambda_is_rebound_to_transient_root() {
    // docs.SelectMany(x => x.Children, c).Select(x => x.Name)
    let (flat, x, _) = implicit_pairing();
    let name = Path::property(&x, "Name", ValueType::String);
    let expr = select(flat, Expression::lambda(path(&x), path(&name)));

    let result = normalize(&expr);

    assert_eq!(
        render(&result),
        "docs.SelectMany(x => x.Children, (x, c) => new { X = x, C = c })\
         .Select(transId_0 => transId_0.x.Name)"
    );
    assert_eq!(result.operator(), Some(Operator::Select));
}

#[test]
fn test_alias_members_are_renamed() {
    // docs.SelectMany(x => x.Children, c).Where(c => c.Age > 18)
    let (flat, _, c) = implicit_pairing();
    let age = Path::property(&c, "Age", ValueType::Number);
    let expr = Expression::operation(
        ValueType::Collection,
        Operator::Where,
        vec![
            flat,
            Expression::lambda(
                path(&c),
                Expression::predicate(Operator::Gt, vec![path(&age), Expression::constant(18)]),
            ),
        ],
    );

    let result = normalize(&expr);
    let (param, body) = result.args()[1].as_path_lambda().unwrap();

    assert_eq!(param.name(), "transId_0");
    assert!(param.is_root());
    assert_eq!(render(body), "transId_0.c.Age > 18");
    assert!(body.is_boolean());
}

#[test]
fn test_paths_before_the_flat_map_are_not_renamed() {
    // x.Children inside the outer lambda is visited before registration
    let (expr, _, _) = implicit_pairing();
    let result = normalize(&expr);
    let (_, outer_body) = result.args()[1].as_path_lambda().unwrap();
    assert_eq!(render(outer_body), "x.Children");
}

#[test]
fn test_lambda_bound_to_nested_path_uses_root() {
    // (x.Address) => x.Address.City  becomes  x => x.Address.City
    let x = var("x", "Order");
    let address = member(&x, "Address");
    let body = path(&Path::property(&address, "City", ValueType::String));
    let expr = Expression::lambda(path(&address), body.clone());

    let result = normalize(&expr);

    let (param, new_body) = result.as_path_lambda().unwrap();
    assert_eq!(param, &x);
    assert!(Arc::ptr_eq(new_body, &body));
}

// ========================================================================
// Transient Identifiers
// ========================================================================

#[test]
fn test_sequential_flat_maps_get_distinct_ids() {
    // docs.SelectMany(x => x.Children, c).SelectMany(y => y.Pets, p)
    let (first, _, _) = implicit_pairing();
    let y = var("y", "Person");
    let p = var("p", "Pet");
    let expr = select_many(
        first,
        Expression::lambda(path(&y), path(&member(&y, "Pets"))),
        path(&p),
    );

    let mut ctx = RewriteContext::default();
    normalize_select_many(&expr, &mut ctx).unwrap();

    let transient_roots: Vec<String> = ctx
        .substitutions()
        .iter()
        .flat_map(|(_, replacement)| collect_roots(replacement))
        .collect();
    assert_eq!(
        transient_roots,
        vec!["transId_0", "transId_0", "transId_1", "transId_1"]
    );
    assert_eq!(ctx.next_id(), 2);
}

#[test]
fn test_nested_flat_map_normalized_innermost_first() {
    // docs.SelectMany(x => x.Children.SelectMany(c => c.Pets, p), q)
    let docs = var("docs", "Family");
    let x = var("x", "Family");
    let c = var("c", "Person");
    let p = var("p", "Pet");
    let q = var("q", "Pet");
    let inner = select_many(
        path(&member(&x, "Children")),
        Expression::lambda(path(&c), path(&member(&c, "Pets"))),
        path(&p),
    );
    let expr = select_many(path(&docs), Expression::lambda(path(&x), inner), path(&q));

    let mut ctx = RewriteContext::default();
    let result = normalize_select_many(&expr, &mut ctx).unwrap();

    let (_, outer_body) = result.args()[1].as_path_lambda().unwrap();
    assert_eq!(outer_body.operator(), Some(Operator::SelectManyTranslated));

    let originals: Vec<String> = ctx
        .substitutions()
        .iter()
        .map(|(original, replacement)| format!("{} -> {}", original.dotted(), render(replacement)))
        .collect();
    assert_eq!(
        originals,
        vec![
            "c -> transId_0.c",
            "p -> transId_0.p",
            "x -> transId_1.x",
            "q -> transId_1.q",
        ]
    );
}

#[test]
fn test_seed_and_prefix_come_from_options() {
    let (expr, _, _) = implicit_pairing();

    let mut ctx = RewriteContext::new(RewriteOptions::seeded(41).with_prefix("pair_"));
    normalize_select_many(&expr, &mut ctx).unwrap();

    assert_eq!(render(&ctx.substitutions()[0].1), "pair_41.x");
    assert_eq!(ctx.next_id(), 42);
}

#[test]
fn test_non_ascii_names_get_distinct_members() {
    // docs.SelectMany(ä => ä.Kids, ö)
    let docs = var("docs", "Family");
    let a = var("ä", "Family");
    let o = var("ö", "Kid");
    let expr = select_many(
        path(&docs),
        Expression::lambda(path(&a), path(&member(&a, "Kids"))),
        path(&o),
    );

    let mut ctx = RewriteContext::default();
    normalize_select_many(&expr, &mut ctx).unwrap();

    let members: Vec<String> = ctx
        .substitutions()
        .iter()
        .map(|(_, replacement)| render(replacement))
        .collect();
    assert_eq!(members, vec!["transId_0.ä", "transId_0.ö"]);
}

// ========================================================================
// Identity, Idempotence, Determinism
// ========================================================================

#[test]
fn test_tree_without_flat_map_is_returned_by_identity() {
    let x = var("x", "Order");
    let expr = Expression::predicate(
        Operator::And,
        vec![
            Expression::predicate(
                Operator::Eq,
                vec![path(&member(&x, "Status")), Expression::constant("open")],
            ),
            Expression::anonymous([("Total", path(&member(&x, "Total")))]),
        ],
    );

    let result = normalize(&expr);
    assert!(Arc::ptr_eq(&result, &expr));
}

#[test]
fn test_clean_sibling_keeps_identity() {
    let (flat, _, _) = implicit_pairing();
    let o = var("o", "Order");
    let clean = Expression::predicate(
        Operator::Eq,
        vec![path(&member(&o, "Status")), Expression::constant("open")],
    );
    let expr = Expression::predicate(Operator::And, vec![flat, clean.clone()]);

    let result = normalize(&expr);

    assert!(!Arc::ptr_eq(&result, &expr));
    assert!(result.is_boolean());
    assert!(Arc::ptr_eq(&result.args()[1], &clean));
}

#[test]
fn test_normalizing_twice_is_a_no_op() {
    let (flat, x, _) = implicit_pairing();
    let name = Path::property(&x, "Name", ValueType::String);
    let expr = select(flat, Expression::lambda(path(&x), path(&name)));

    let once = normalize(&expr);
    let twice = normalize(&once);

    assert!(Arc::ptr_eq(&once, &twice));
}

#[test]
fn test_same_seed_same_output() {
    let (expr, _, _) = implicit_pairing();

    let a = normalize_select_many(&expr, &mut RewriteContext::new(RewriteOptions::seeded(3))).unwrap();
    let b = normalize_select_many(&expr, &mut RewriteContext::new(RewriteOptions::seeded(3))).unwrap();

    assert_eq!(a, b);
    assert_eq!(render(&a), render(&b));
}

#[test]
fn test_opaque_nodes_are_untouched() {
    let (flat, _, _) = implicit_pairing();
    let subquery = Expression::subquery(flat.clone());
    let template = Expression::template(ValueType::Collection, "{0}.Distinct()", vec![flat]);

    assert!(Arc::ptr_eq(&normalize(&subquery), &subquery));
    assert!(Arc::ptr_eq(&normalize(&template), &template));
}

// ========================================================================
// Error Cases
// ========================================================================

#[test]
fn test_reject_missing_list() {
    let x = var("x", "Family");
    let expr = Expression::operation(
        ValueType::Collection,
        Operator::SelectMany,
        vec![path(&x), Expression::lambda(path(&x), path(&member(&x, "Children")))],
    );

    let err = normalize_select_many(&expr, &mut RewriteContext::default()).unwrap_err();

    assert_eq!(err.operator(), Some(Operator::SelectMany));
    match err {
        StructuralShapeError::UnexpectedShape { found, .. } => assert_eq!(found, "x => x.Children"),
        other => panic!("Expected UnexpectedShape, got {:?}", other),
    }
}

#[test]
fn test_reject_list_without_lambda() {
    let x = var("x", "Family");
    let c = var("c", "Person");
    let expr = select_many(path(&x), path(&member(&x, "Children")), path(&c));

    let err = normalize_select_many(&expr, &mut RewriteContext::default()).unwrap_err();
    assert!(
        err.to_string().contains("LAMBDA bound to a path"),
        "unexpected message: {}",
        err
    );
}

#[test]
fn test_reject_constant_alias() {
    let x = var("x", "Family");
    let expr = select_many(
        path(&x),
        Expression::lambda(path(&x), path(&member(&x, "Children"))),
        Expression::constant("c"),
    );

    let result = normalize_select_many(&expr, &mut RewriteContext::default());
    assert!(matches!(
        result,
        Err(StructuralShapeError::UnexpectedShape {
            operator: Operator::SelectMany,
            ..
        })
    ));
}

#[test]
fn test_reject_selector_that_is_not_a_lambda() {
    let x = var("x", "Family");
    let c = var("c", "Person");
    let expr = select_many(
        path(&x),
        Expression::lambda(path(&x), path(&member(&x, "Children"))),
        Expression::predicate(Operator::Eq, vec![path(&c), Expression::constant(1)]),
    );

    assert!(normalize_select_many(&expr, &mut RewriteContext::default()).is_err());
}

#[test]
fn test_reject_missing_arguments() {
    let expr = Expression::operation(ValueType::Collection, Operator::SelectMany, vec![]);

    let err = normalize_select_many(&expr, &mut RewriteContext::default()).unwrap_err();
    assert!(err.to_string().starts_with("malformed SELECT_MANY expression"));
}

#[test]
fn test_reject_parent_replaced_by_non_path() {
    // A substitution that turns `x` into a constant cannot carry `x.Name`
    let x = var("x", "Order");
    let name = Path::property(&x, "Name", ValueType::String);

    let mut ctx = RewriteContext::default();
    ctx.add_substitution(x.clone(), Expression::constant(1));
    let err = normalize_select_many(&path(&name), &mut ctx).unwrap_err();

    assert_eq!(err.operator(), Some(Operator::SelectMany));
    assert_eq!(
        err,
        StructuralShapeError::NonPathParent {
            path: "x.Name".to_string(),
            replacement: "1".to_string(),
        }
    );
}
