//! Root collection.
//!
//! Finds the top-level identifiers (collections, range variables) an
//! expression reads from. Index definitions use this to decide which
//! document collections a map function is declared over.

use std::collections::BTreeSet;

use crate::ast::{Expr, Expression, Operator};

/// Names of every path root the expression depends on.
///
/// Walks depth-first, arguments left to right, and records the root name of
/// each path. It does not descend into subqueries (their roots belong to the
/// inner query) nor into templates (never parsed), and it skips the second
/// argument of `SUM`.
///
/// # Examples
///
/// ```
/// use linq_rewrite::ast::{Expression, Operator, Path, ValueType};
/// use linq_rewrite::roots::collect_roots;
///
/// let p1 = Path::variable("p1", ValueType::object("Person"));
/// let p2 = Path::variable("p2", ValueType::object("Person"));
/// let expr = Expression::predicate(
///     Operator::Eq,
///     vec![
///         Expression::path(Path::property(&p1, "FirstName", ValueType::String)),
///         Expression::path(Path::property(&p2, "LastName", ValueType::String)),
///     ],
/// );
///
/// let roots: Vec<String> = collect_roots(&expr).into_iter().collect();
/// assert_eq!(roots, vec!["p1", "p2"]);
/// ```
pub fn collect_roots(expr: &Expr) -> BTreeSet<String> {
    let mut roots = BTreeSet::new();
    collect_recursive(expr, &mut roots);
    tracing::trace!(count = roots.len(), "collected expression roots");
    roots
}

fn collect_recursive(expr: &Expression, roots: &mut BTreeSet<String>) {
    match expr {
        Expression::Path(path) => {
            roots.insert(path.root().name().to_string());
        }

        // The second SUM argument is the aggregated selector, not an input
        Expression::Operation {
            op: Operator::Sum,
            args,
            ..
        } => {
            for (i, arg) in args.iter().enumerate() {
                if i != 1 {
                    collect_recursive(arg, roots);
                }
            }
        }

        Expression::Operation { args, .. } | Expression::Factory { args, .. } => {
            for arg in args {
                collect_recursive(arg, roots);
            }
        }

        // Opaque
        Expression::SubQuery(_) | Expression::Template { .. } => {}

        Expression::Constant { .. } | Expression::Param { .. } => {}
    }
}

/// Like [`collect_roots`], but leaves out names bound by an enclosing lambda.
///
/// Inside `LAMBDA(x, body)` the root `x` refers to the lambda parameter, not
/// to an outer collection. A `WRAPPED(LIST(a, b))` parameter list binds every
/// root it names.
///
/// # Examples
///
/// ```
/// use linq_rewrite::ast::{Expression, Operator, Path, ValueType};
/// use linq_rewrite::roots::{collect_free_roots, collect_roots};
///
/// let docs = Path::variable("docs", ValueType::Collection);
/// let x = Path::variable("x", ValueType::object("Order"));
/// let query = Expression::operation(
///     ValueType::Collection,
///     Operator::Where,
///     vec![
///         Expression::path(docs),
///         Expression::lambda(
///             Expression::path(x.clone()),
///             Expression::predicate(
///                 Operator::Gt,
///                 vec![
///                     Expression::path(Path::property(&x, "Total", ValueType::Number)),
///                     Expression::constant(100),
///                 ],
///             ),
///         ),
///     ],
/// );
///
/// assert_eq!(collect_roots(&query).len(), 2);
/// assert_eq!(collect_free_roots(&query).into_iter().collect::<Vec<_>>(), vec!["docs"]);
/// ```
pub fn collect_free_roots(expr: &Expr) -> BTreeSet<String> {
    let mut roots = BTreeSet::new();
    let mut bound = Vec::new();
    collect_free_recursive(expr, &mut bound, &mut roots);
    tracing::trace!(count = roots.len(), "collected free expression roots");
    roots
}

fn collect_free_recursive(expr: &Expression, bound: &mut Vec<String>, roots: &mut BTreeSet<String>) {
    match expr {
        Expression::Path(path) => {
            let name = path.root().name();
            if !bound.iter().rev().any(|b| b == name) {
                roots.insert(name.to_string());
            }
        }

        Expression::Operation {
            op: Operator::Lambda,
            args,
            ..
        } if !args.is_empty() => {
            let depth = bound.len();
            binder_names(&args[0], bound);
            for body in &args[1..] {
                collect_free_recursive(body, bound, roots);
            }
            bound.truncate(depth);
        }

        Expression::Operation {
            op: Operator::Sum,
            args,
            ..
        } => {
            for (i, arg) in args.iter().enumerate() {
                if i != 1 {
                    collect_free_recursive(arg, bound, roots);
                }
            }
        }

        Expression::Operation { args, .. } | Expression::Factory { args, .. } => {
            for arg in args {
                collect_free_recursive(arg, bound, roots);
            }
        }

        Expression::SubQuery(_) | Expression::Template { .. } => {}

        Expression::Constant { .. } | Expression::Param { .. } => {}
    }
}

/// Pushes the names a lambda parameter binds.
fn binder_names(param: &Expression, bound: &mut Vec<String>) {
    match param {
        Expression::Path(path) => bound.push(path.root().name().to_string()),
        Expression::Operation {
            op: Operator::Wrapped | Operator::List,
            args,
            ..
        } => {
            for arg in args {
                binder_names(arg, bound);
            }
        }
        _ => {}
    }
}
