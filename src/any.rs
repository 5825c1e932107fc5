//! Existential-Any expansion.
//!
//! The builder spells "some element of a collection satisfies a comparison"
//! as a comparison on a marker path:
//!
//! ```text
//! EQ(x.Tags.any(), "urgent")
//! EQ(x.Children.any().Name, "bob")
//! ```
//!
//! The indexing language needs an explicit quantifier with a bound element
//! variable instead:
//!
//! ```text
//! x.Tags.Any(r => r == "urgent")
//! x.Children.Any(r => r.Name == "bob")
//! ```
//!
//! The marker path knows its collection but not the comparison it sits in,
//! so the pass keeps the chain of nodes being visited on the context stack
//! and reads the enclosing operation from there.

use std::sync::Arc;

use tracing::debug;

use crate::ast::{Expr, Expression, Operator, Path, PathType, ValueType};
use crate::context::RewriteContext;
use crate::error::StructuralShapeError;
use crate::render::render;

/// Name of the element variable bound by a synthesized `ANY`.
///
/// The `ANY` render template spells it out, so it is fixed.
pub const ANY_PARAMETER: &str = "r";

/// Rewrites comparisons on any-marker paths into explicit `ANY` nodes.
///
/// `OP(collection.any().rest, value)` becomes
/// `ANY(collection, OP(r.rest, value))`; `value` is carried over as is.
/// Anonymous objects are left alone, and untouched subtrees come back as
/// the same [`Arc`].
///
/// # Errors
///
/// Returns [`StructuralShapeError::MalformedAny`] when an any-path is not
/// the left operand of an operation with at least two arguments.
///
/// # Examples
///
/// ```
/// use linq_rewrite::ast::{Expression, Operator, Path, ValueType};
/// use linq_rewrite::render::render;
/// use linq_rewrite::{RewriteContext, expand_any};
///
/// let x = Path::variable("x", ValueType::object("Family"));
/// let children = Path::property(&x, "Children", ValueType::Collection);
/// let child = Path::any(&children, ValueType::object("Person"));
/// let name = Path::property(&child, "Name", ValueType::String);
///
/// let filter = Expression::predicate(
///     Operator::Eq,
///     vec![Expression::path(name), Expression::constant("bob")],
/// );
///
/// let expanded = expand_any(&filter, &mut RewriteContext::default()).unwrap();
/// assert_eq!(render(&expanded), "x.Children.Any(r => r.Name == \"bob\")");
/// ```
pub fn expand_any(expr: &Expr, ctx: &mut RewriteContext) -> Result<Expr, StructuralShapeError> {
    debug!("expanding Any paths");
    let expanded = expand(expr, ctx)?;
    debug!(changed = !Arc::ptr_eq(expr, &expanded), "Any expansion finished");
    Ok(expanded)
}

/// Visits `expr` with it pushed on the ancestor stack.
fn expand(expr: &Expr, ctx: &mut RewriteContext) -> Result<Expr, StructuralShapeError> {
    ctx.push(expr.clone());
    let result = expand_node(expr, ctx);
    ctx.pop();
    result
}

fn expand_node(expr: &Expr, ctx: &mut RewriteContext) -> Result<Expr, StructuralShapeError> {
    match expr.as_ref() {
        Expression::Factory { .. } => Ok(expr.clone()),

        Expression::Template { ty, template, args } => {
            let (rewritten, dirty) = expand_children(args, ctx)?;
            if dirty {
                Ok(Expression::template(ty.clone(), template.clone(), rewritten))
            } else {
                Ok(expr.clone())
            }
        }

        Expression::Operation { ty, op, args } => {
            let (mut rewritten, dirty) = expand_children(args, ctx)?;
            if !dirty {
                return Ok(expr.clone());
            }
            // The ANY built for our left operand already absorbed this node.
            // Only our own any-path counts: an enclosing operation whose first
            // argument became an ANY further down keeps its other arguments.
            if args
                .first()
                .and_then(|first| first.as_path())
                .is_some_and(|path| split_at_any(path).is_some())
            {
                return Ok(rewritten.swap_remove(0));
            }
            Ok(Expression::operation(ty.clone(), *op, rewritten))
        }

        Expression::Path(path) => Ok(expand_path(expr, path, ctx)?.unwrap_or_else(|| expr.clone())),

        Expression::Constant { .. } | Expression::Param { .. } | Expression::SubQuery(_) => {
            Ok(expr.clone())
        }
    }
}

/// Visits each child with a cleared replace flag and merges it back.
fn expand_children(
    args: &[Expr],
    ctx: &mut RewriteContext,
) -> Result<(Vec<Expr>, bool), StructuralShapeError> {
    let mut dirty = false;
    let mut rewritten = Vec::with_capacity(args.len());
    for arg in args {
        let saved = ctx.enter_child();
        rewritten.push(expand(arg, ctx)?);
        dirty |= ctx.leave_child(saved);
    }
    Ok((rewritten, dirty))
}

fn expand_path(
    node: &Expr,
    path: &Arc<Path>,
    ctx: &mut RewriteContext,
) -> Result<Option<Expr>, StructuralShapeError> {
    let Some((marker, below)) = split_at_any(path) else {
        return Ok(None);
    };
    let collection = marker
        .parent()
        .ok_or_else(|| StructuralShapeError::malformed_any(path, "the any-marker has no collection"))?;
    let collection = expand(&Expression::path(collection.clone()), ctx)?;

    // Frame 0 is this path, frame 1 the operation comparing it
    let (ty, op, compared) = match ctx.ancestor(1).map(|frame| frame.as_ref()) {
        Some(Expression::Operation { ty, op, args }) if args.len() >= 2 => {
            if !Arc::ptr_eq(&args[0], node) {
                return Err(StructuralShapeError::malformed_any(
                    path,
                    "the any-path must be the left operand of its operation",
                ));
            }
            (ty.clone(), *op, args[1].clone())
        }
        _ => {
            return Err(StructuralShapeError::malformed_any(
                path,
                "no enclosing operation with a compared value",
            ));
        }
    };

    let element = below
        .iter()
        .fold(Path::variable(ANY_PARAMETER, marker.ty.clone()), |parent, segment| {
            segment.with_parent(parent)
        });
    let predicate = Expression::operation(ty, op, vec![Expression::path(element), compared]);
    let any = Expression::operation(ValueType::Boolean, Operator::Any, vec![collection, predicate]);

    debug!(path = %path.dotted(), rewritten = %render(&any), "expanded Any path");
    ctx.mark_replace();
    Ok(Some(any))
}

/// Splits a path at its innermost any-marker.
///
/// Returns the marker and the segments below it, outermost first, or `None`
/// when the chain has no marker.
fn split_at_any(path: &Arc<Path>) -> Option<(&Arc<Path>, Vec<&Arc<Path>>)> {
    let mut below = Vec::new();
    let mut current = path;
    loop {
        if current.path_type() == PathType::CollectionAny {
            below.reverse();
            return Some((current, below));
        }
        below.push(current);
        current = current.parent()?;
    }
}
