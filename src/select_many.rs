//! SelectMany normalization.
//!
//! The builder records a flat-map as
//!
//! ```text
//! SELECT_MANY(source, LIST(LAMBDA(x, x.Children), c))                      // implicit pairing
//! SELECT_MANY(source, LIST(LAMBDA(x, x.Children), LAMBDA(c, new { .. })))  // explicit selector
//! ```
//!
//! while the indexing language wants the two-lambda overload:
//!
//! ```text
//! source.SelectMany(x => x.Children, (x, c) => new { X = x, C = c })
//! ```
//!
//! The implicit form has no selector, so one is synthesized: an anonymous
//! pair `new { X = x, C = c }`. Every later reference to `x` or `c` must then
//! go through that pair, so both paths are registered for renaming onto
//! members of a transient variable (`transId_0.x`, `transId_0.c`). Lambdas
//! whose parameter became such a member are rebound to the transient root.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, trace};

use crate::ast::{Expr, Expression, Operator, Path, ValueType};
use crate::context::RewriteContext;
use crate::error::StructuralShapeError;
use crate::render::render;

/// Runs of characters that cannot appear in a member name.
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}_]+").expect("separator pattern is valid"));

/// Rewrites every `SELECT_MANY` node into
/// `SELECT_MANY_TRANSLATED(source, outer lambda, selector lambda)`.
///
/// Nested flat-maps are normalized innermost first. Subtrees with nothing to
/// rewrite come back as the very same [`Arc`], so running the pass on its own
/// output returns the input unchanged.
///
/// # Errors
///
/// Returns [`StructuralShapeError::UnexpectedShape`] when a `SELECT_MANY`
/// node is not shaped `SELECT_MANY(source, LIST(LAMBDA(path, body), alias))`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use linq_rewrite::ast::{Expression, Operator, Path, ValueType};
/// use linq_rewrite::render::render;
/// use linq_rewrite::{RewriteContext, normalize_select_many};
///
/// let docs = Path::variable("docs", ValueType::Collection);
/// let x = Path::variable("x", ValueType::object("Snapshot"));
/// let c = Path::variable("c", ValueType::object("ClickAction"));
/// let select_many = Expression::operation(
///     ValueType::Collection,
///     Operator::SelectMany,
///     vec![
///         Expression::path(docs),
///         Expression::list(vec![
///             Expression::lambda(
///                 Expression::path(x.clone()),
///                 Expression::path(Path::property(&x, "ClickActions", ValueType::Collection)),
///             ),
///             Expression::path(c),
///         ]),
///     ],
/// );
///
/// let mut ctx = RewriteContext::default();
/// let normalized = normalize_select_many(&select_many, &mut ctx).unwrap();
///
/// assert_eq!(
///     render(&normalized),
///     "docs.SelectMany(x => x.ClickActions, (x, c) => new { X = x, C = c })"
/// );
///
/// // Already canonical: nothing left to do
/// let again = normalize_select_many(&normalized, &mut RewriteContext::default()).unwrap();
/// assert!(Arc::ptr_eq(&normalized, &again));
/// ```
pub fn normalize_select_many(
    expr: &Expr,
    ctx: &mut RewriteContext,
) -> Result<Expr, StructuralShapeError> {
    debug!(first_id = ctx.next_id(), "normalizing SelectMany expressions");
    let normalized = normalize(expr, ctx)?;
    debug!(
        changed = !Arc::ptr_eq(expr, &normalized),
        substitutions = ctx.substitutions().len(),
        next_id = ctx.next_id(),
        "SelectMany normalization finished"
    );
    Ok(normalized)
}

fn normalize(expr: &Expr, ctx: &mut RewriteContext) -> Result<Expr, StructuralShapeError> {
    match expr.as_ref() {
        Expression::Operation { ty, op, args } => normalize_operation(expr, ty, *op, args, ctx),

        Expression::Factory { ty, args } => {
            let saved = ctx.enter_child();
            let rewritten = normalize_all(args, ctx)?;
            if ctx.leave_child(saved) {
                Ok(Expression::factory(ty.clone(), rewritten))
            } else {
                Ok(expr.clone())
            }
        }

        Expression::Path(path) => Ok(normalize_path(path, ctx)?.unwrap_or_else(|| expr.clone())),

        // Opaque, like in root collection
        Expression::Constant { .. }
        | Expression::Param { .. }
        | Expression::SubQuery(_)
        | Expression::Template { .. } => Ok(expr.clone()),
    }
}

fn normalize_all(args: &[Expr], ctx: &mut RewriteContext) -> Result<Vec<Expr>, StructuralShapeError> {
    args.iter().map(|arg| normalize(arg, ctx)).collect()
}

fn normalize_operation(
    expr: &Expr,
    ty: &ValueType,
    op: Operator,
    args: &[Expr],
    ctx: &mut RewriteContext,
) -> Result<Expr, StructuralShapeError> {
    let saved = ctx.enter_child();
    let mut rewritten = normalize_all(args, ctx)?;
    let dirty = ctx.leave_child(saved);

    match op {
        Operator::Lambda => {
            let rebind_to = match rewritten.first().map(|param| param.as_ref()) {
                Some(Expression::Path(param)) if !param.is_root() => Some(param.root().clone()),
                _ => None,
            };
            if let Some(root) = rebind_to {
                debug!(
                    param = %render(&rewritten[0]),
                    root = root.name(),
                    "binding lambda to parameter root"
                );
                ctx.mark_replace();
                rewritten[0] = Expression::path(root);
                return Ok(Expression::operation(ty.clone(), op, rewritten));
            }
        }
        Operator::SelectMany => {
            let translated = translate(expr, ty, &rewritten, ctx)?;
            ctx.mark_replace();
            return Ok(translated);
        }
        _ => {}
    }

    if dirty {
        Ok(Expression::operation(ty.clone(), op, rewritten))
    } else {
        Ok(expr.clone())
    }
}

/// Builds the canonical two-lambda form from the already normalized
/// arguments of a `SELECT_MANY` node.
fn translate(
    node: &Expr,
    ty: &ValueType,
    args: &[Expr],
    ctx: &mut RewriteContext,
) -> Result<Expr, StructuralShapeError> {
    let [source, pair, ..] = args else {
        return Err(StructuralShapeError::unexpected(
            Operator::SelectMany,
            "a source and a LIST argument",
            node,
        ));
    };

    let pair_args = match pair.as_ref() {
        Expression::Operation {
            op: Operator::List,
            args,
            ..
        } if args.len() == 2 => args,
        other => {
            return Err(StructuralShapeError::unexpected(
                Operator::SelectMany,
                "a two-argument LIST as second argument",
                other,
            ));
        }
    };

    let (variable, body) = pair_args[0].as_path_lambda().ok_or_else(|| {
        StructuralShapeError::unexpected(
            Operator::SelectMany,
            "a LAMBDA bound to a path as first LIST element",
            &pair_args[0],
        )
    })?;

    let (alias, result_selector) = match pair_args[1].as_ref() {
        Expression::Operation { .. } => {
            let (alias, selector) = pair_args[1].as_path_lambda().ok_or_else(|| {
                StructuralShapeError::unexpected(
                    Operator::SelectMany,
                    "a selector LAMBDA bound to a path",
                    &pair_args[1],
                )
            })?;
            (alias.clone(), selector.clone())
        }
        Expression::Path(alias) => (alias.clone(), pair_selector(variable, alias, ctx)),
        other => {
            return Err(StructuralShapeError::unexpected(
                Operator::SelectMany,
                "an alias path or a selector LAMBDA as second LIST element",
                other,
            ));
        }
    };

    let root = variable.root().clone();
    let params = Expression::operation(
        ValueType::Expression,
        Operator::Wrapped,
        vec![Expression::list(vec![
            Expression::path(root.clone()),
            Expression::path(alias),
        ])],
    );
    let outer = Expression::lambda(Expression::path(root), body.clone());
    let selector = Expression::lambda(params, result_selector);

    Ok(Expression::operation(
        ty.clone(),
        Operator::SelectManyTranslated,
        vec![source.clone(), outer, selector],
    ))
}

/// Synthesizes `new { Variable = variable, Alias = alias }` and registers
/// both paths for renaming onto members of a fresh transient variable.
fn pair_selector(variable: &Arc<Path>, alias: &Arc<Path>, ctx: &mut RewriteContext) -> Expr {
    let selector = Expression::anonymous([
        (capitalize(variable.name()), Expression::path(variable.clone())),
        (capitalize(alias.name()), Expression::path(alias.clone())),
    ]);

    let transient = Path::variable(ctx.fresh_transient_name(), ValueType::Anonymous);
    for path in [variable, alias] {
        let member = Path::property(&transient, member_name(path), path.ty.clone());
        trace!(
            original = %path.dotted(),
            replacement = %member.dotted(),
            "registering transient member"
        );
        ctx.add_substitution(path.clone(), Expression::path(member));
    }

    selector
}

/// Looks the path up in the substitution table, after re-parenting it if its
/// parent was itself replaced.
fn normalize_path(
    path: &Arc<Path>,
    ctx: &mut RewriteContext,
) -> Result<Option<Expr>, StructuralShapeError> {
    if let Some(parent) = path.parent()
        && let Some(new_parent) = normalize_path(parent, ctx)?
    {
        let Expression::Path(new_parent) = new_parent.as_ref() else {
            return Err(StructuralShapeError::NonPathParent {
                path: path.dotted(),
                replacement: render(&new_parent),
            });
        };
        ctx.mark_replace();
        return Ok(Some(Expression::path(path.with_parent(new_parent.clone()))));
    }

    match ctx.substitution_for(path) {
        Some(replacement) => {
            let replacement = replacement.clone();
            ctx.mark_replace();
            Ok(Some(replacement))
        }
        None => Ok(None),
    }
}

/// Member name for a path on the transient variable: its dotted text with
/// separators turned into underscores (`x.Address` -> `x_Address`).
fn member_name(path: &Path) -> String {
    SEPARATORS.replace_all(&path.dotted(), "_").into_owned()
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
