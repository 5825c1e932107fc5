use std::sync::Arc;

use crate::ast::{Operator, Path, ValueType};
use crate::value::ConstValue;

/// Shared handle to an immutable expression node.
///
/// Rewrites compare handles with [`Arc::ptr_eq`] to tell an untouched subtree
/// from a rebuilt one.
pub type Expr = Arc<Expression>;

/// Node of the expression tree.
///
/// The variant set is closed; passes are free functions matching on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    /// Literal value
    ///
    /// # Example
    /// ```text
    /// "bob"
    /// ```
    Constant { value: ConstValue, ty: ValueType },

    /// Field reference
    ///
    /// # Example
    /// ```text
    /// x.ClickActions
    /// ```
    Path(Arc<Path>),

    /// Operator application with ordered arguments
    ///
    /// # Example
    /// ```text
    /// EQ(x.Name, "bob")
    /// ```
    Operation {
        ty: ValueType,
        op: Operator,
        args: Vec<Expr>,
    },

    /// Anonymous object construction; every argument is a
    /// `LIST(Constant(field name), selector)` pair.
    ///
    /// # Example
    /// ```text
    /// new { X = x, C = c }
    /// ```
    Factory { ty: ValueType, args: Vec<Expr> },

    /// Named parameter supplied at execution time
    Param { ty: ValueType, name: String },

    /// Nested query. Opaque to every pass: its roots belong to the inner
    /// query, not to the enclosing expression.
    SubQuery(Expr),

    /// Raw source template with `{0}`-style holes. Never parsed.
    Template {
        ty: ValueType,
        template: String,
        args: Vec<Expr>,
    },
}

impl Expression {
    /// Literal typed after its value.
    pub fn constant(value: impl Into<ConstValue>) -> Expr {
        let value = value.into();
        let ty = value.value_type();
        Arc::new(Expression::Constant { value, ty })
    }

    /// Literal with an explicit static type.
    pub fn typed_constant(value: impl Into<ConstValue>, ty: ValueType) -> Expr {
        Arc::new(Expression::Constant {
            value: value.into(),
            ty,
        })
    }

    pub fn path(path: Arc<Path>) -> Expr {
        Arc::new(Expression::Path(path))
    }

    pub fn operation(ty: ValueType, op: Operator, args: Vec<Expr>) -> Expr {
        Arc::new(Expression::Operation { ty, op, args })
    }

    /// Boolean-typed operation.
    pub fn predicate(op: Operator, args: Vec<Expr>) -> Expr {
        Expression::operation(ValueType::Boolean, op, args)
    }

    /// `param => body`
    pub fn lambda(param: Expr, body: Expr) -> Expr {
        Expression::operation(ValueType::Expression, Operator::Lambda, vec![param, body])
    }

    /// `LIST(args...)`
    pub fn list(args: Vec<Expr>) -> Expr {
        Expression::operation(ValueType::Expression, Operator::List, args)
    }

    pub fn factory(ty: ValueType, args: Vec<Expr>) -> Expr {
        Arc::new(Expression::Factory { ty, args })
    }

    /// Anonymous object with the given `(field name, selector)` pairs.
    pub fn anonymous<S: Into<String>>(fields: impl IntoIterator<Item = (S, Expr)>) -> Expr {
        let args = fields
            .into_iter()
            .map(|(name, selector)| {
                Expression::list(vec![
                    Expression::constant(ConstValue::String(name.into())),
                    selector,
                ])
            })
            .collect();
        Expression::factory(ValueType::Anonymous, args)
    }

    pub fn param(ty: ValueType, name: impl Into<String>) -> Expr {
        Arc::new(Expression::Param {
            ty,
            name: name.into(),
        })
    }

    pub fn subquery(query: Expr) -> Expr {
        Arc::new(Expression::SubQuery(query))
    }

    pub fn template(ty: ValueType, template: impl Into<String>, args: Vec<Expr>) -> Expr {
        Arc::new(Expression::Template {
            ty,
            template: template.into(),
            args,
        })
    }

    /// Static result type of the node.
    ///
    /// A subquery reports the type of the query it wraps.
    pub fn ty(&self) -> &ValueType {
        match self {
            Expression::Constant { ty, .. }
            | Expression::Operation { ty, .. }
            | Expression::Factory { ty, .. }
            | Expression::Param { ty, .. }
            | Expression::Template { ty, .. } => ty,
            Expression::Path(path) => &path.ty,
            Expression::SubQuery(query) => query.ty(),
        }
    }

    pub fn is_boolean(&self) -> bool {
        self.ty().is_boolean()
    }

    /// Operator of an [`Expression::Operation`].
    pub fn operator(&self) -> Option<Operator> {
        match self {
            Expression::Operation { op, .. } => Some(*op),
            _ => None,
        }
    }

    /// Arguments of an operation, factory, or template; empty for leaves.
    pub fn args(&self) -> &[Expr] {
        match self {
            Expression::Operation { args, .. }
            | Expression::Factory { args, .. }
            | Expression::Template { args, .. } => args,
            Expression::Constant { .. }
            | Expression::Path(_)
            | Expression::Param { .. }
            | Expression::SubQuery(_) => &[],
        }
    }

    pub fn as_path(&self) -> Option<&Arc<Path>> {
        match self {
            Expression::Path(path) => Some(path),
            _ => None,
        }
    }

    /// `(parameter, body)` of a lambda bound to a single path.
    pub fn as_path_lambda(&self) -> Option<(&Arc<Path>, &Expr)> {
        match self {
            Expression::Operation {
                op: Operator::Lambda,
                args,
                ..
            } => match args.as_slice() {
                [param, body] => param.as_path().map(|param| (param, body)),
                _ => None,
            },
            _ => None,
        }
    }
}
