use std::fmt;

/// Operators of the expression tree.
///
/// This is a closed registry: the builder can only produce these, and the
/// printer holds a template for every one of them (see [`Operator::template`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // Logical
    /// Logical AND (`&&`)
    And,
    /// Logical OR (`||`)
    Or,
    /// Negation (`!`)
    Not,

    // Comparison
    /// Equal (`==`)
    Eq,
    /// Not equal (`!=`)
    Ne,
    /// Less than (`<`)
    Lt,
    /// Less than or equal (`<=`)
    Le,
    /// Greater than (`>`)
    Gt,
    /// Greater than or equal (`>=`)
    Ge,

    // Structural
    /// Ordered argument list (`a, b`)
    List,
    /// Parenthesized group, used for synthesized parameter lists
    Wrapped,
    /// Binds a parameter path (or a wrapped parameter list) to a body
    Lambda,

    // Fluent query methods
    /// `source.Select(lambda)`
    Select,
    /// `source.Where(lambda)`
    Where,
    /// Flat-map marker as produced by the builder, before normalization.
    ///
    /// Shape: `SELECT_MANY(source, LIST(LAMBDA(x, body), alias | LAMBDA(alias, selector)))`
    SelectMany,
    /// Canonical flat-map: `SELECT_MANY_TRANSLATED(source, outer lambda, selector lambda)`
    SelectManyTranslated,
    /// Existential quantifier: `ANY(collection, predicate over r)`
    Any,
    /// `source.Sum(lambda)`
    Sum,
    /// `source.Count()`
    Count,
}

impl Operator {
    /// Every registered operator, in declaration order.
    pub const ALL: [Operator; 19] = [
        Operator::And,
        Operator::Or,
        Operator::Not,
        Operator::Eq,
        Operator::Ne,
        Operator::Lt,
        Operator::Le,
        Operator::Gt,
        Operator::Ge,
        Operator::List,
        Operator::Wrapped,
        Operator::Lambda,
        Operator::Select,
        Operator::Where,
        Operator::SelectMany,
        Operator::SelectManyTranslated,
        Operator::Any,
        Operator::Sum,
        Operator::Count,
    ];

    /// Stable identifier, as used in error messages and the JSON encoding.
    pub fn id(self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "NOT",
            Operator::Eq => "EQ",
            Operator::Ne => "NE",
            Operator::Lt => "LT",
            Operator::Le => "LE",
            Operator::Gt => "GT",
            Operator::Ge => "GE",
            Operator::List => "LIST",
            Operator::Wrapped => "WRAPPED",
            Operator::Lambda => "LAMBDA",
            Operator::Select => "SELECT",
            Operator::Where => "WHERE",
            Operator::SelectMany => "SELECT_MANY",
            Operator::SelectManyTranslated => "SELECT_MANY_TRANSLATED",
            Operator::Any => "ANY",
            Operator::Sum => "SUM",
            Operator::Count => "COUNT",
        }
    }

    /// Looks an operator up by its [`id`](Operator::id).
    pub fn from_id(id: &str) -> Option<Self> {
        Operator::ALL.into_iter().find(|op| op.id() == id)
    }

    /// Render template with positional holes (`{0}`, `{1}`, ...).
    ///
    /// `LIST` is variadic: the renderer joins all of its arguments and only
    /// uses the template for the two-argument case.
    pub fn template(self) -> &'static str {
        match self {
            Operator::And => "{0} && {1}",
            Operator::Or => "{0} || {1}",
            Operator::Not => "!{0}",
            Operator::Eq => "{0} == {1}",
            Operator::Ne => "{0} != {1}",
            Operator::Lt => "{0} < {1}",
            Operator::Le => "{0} <= {1}",
            Operator::Gt => "{0} > {1}",
            Operator::Ge => "{0} >= {1}",
            Operator::List => "{0}, {1}",
            Operator::Wrapped => "({0})",
            Operator::Lambda => "{0} => {1}",
            Operator::Select => "{0}.Select({1})",
            Operator::Where => "{0}.Where({1})",
            Operator::SelectMany => "{0}.SelectMany({1})",
            Operator::SelectManyTranslated => "{0}.SelectMany({1}, {2})",
            Operator::Any => "{0}.Any(r => {1})",
            Operator::Sum => "{0}.Sum({1})",
            Operator::Count => "{0}.Count()",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
