//! Template rendering of expression trees.
//!
//! Every operator renders through its registered template
//! ([`Operator::template`]), so this module doubles as the check that the
//! passes only introduce operators the printer knows. The output is meant for
//! error messages, logs, and the command line; it is close to, but not
//! byte-for-byte, what the server-side printer emits.
//!
//! # Examples
//!
//! ```
//! use linq_rewrite::ast::{Expression, Operator, Path, ValueType};
//! use linq_rewrite::render::render;
//!
//! let x = Path::variable("x", ValueType::object("Person"));
//! let name = Path::property(&x, "Name", ValueType::String);
//! let filter = Expression::predicate(
//!     Operator::Eq,
//!     vec![Expression::path(name), Expression::constant("bob")],
//! );
//!
//! assert_eq!(render(&filter), "x.Name == \"bob\"");
//! ```

use crate::ast::{Expr, Expression, Operator};
use crate::value::ConstValue;

/// Renders an expression to its template text.
pub fn render(expr: &Expression) -> String {
    match expr {
        Expression::Constant { value, .. } => value.render(),
        Expression::Path(path) => path.dotted(),
        Expression::Operation {
            op: Operator::List,
            args,
            ..
        } => args.iter().map(|arg| render(arg)).collect::<Vec<_>>().join(", "),
        Expression::Operation { op, args, .. } => {
            let rendered: Vec<String> = args.iter().map(|arg| render(arg)).collect();
            fill_template(op.template(), &rendered)
        }
        Expression::Factory { args, .. } => render_anonymous(args),
        Expression::Param { name, .. } => name.clone(),
        Expression::SubQuery(query) => format!("({})", render(query)),
        Expression::Template { template, args, .. } => {
            let rendered: Vec<String> = args.iter().map(|arg| render(arg)).collect();
            fill_template(template, &rendered)
        }
    }
}

fn render_anonymous(fields: &[Expr]) -> String {
    if fields.is_empty() {
        return "new { }".to_string();
    }

    let items: Vec<String> = fields
        .iter()
        .map(|field| match field.as_ref() {
            Expression::Operation {
                op: Operator::List,
                args,
                ..
            } if args.len() == 2 => match args[0].as_ref() {
                Expression::Constant {
                    value: ConstValue::String(name),
                    ..
                } => format!("{} = {}", name, render(&args[1])),
                _ => render(field),
            },
            _ => render(field),
        })
        .collect();
    format!("new {{ {} }}", items.join(", "))
}

/// Substitutes `{n}` holes with the n-th rendered argument.
///
/// Holes without a matching argument are kept verbatim.
pub fn fill_template(template: &str, args: &[String]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c != '{' {
            result.push(c);
            continue;
        }

        let mut digits = String::new();
        while let Some(&(_, d)) = chars.peek() {
            if !d.is_ascii_digit() {
                break;
            }
            digits.push(d);
            chars.next();
        }

        let closed = matches!(chars.peek(), Some(&(_, '}')));
        match digits.parse::<usize>().ok().filter(|_| closed) {
            Some(index) if index < args.len() => {
                chars.next();
                result.push_str(&args[index]);
            }
            _ => {
                // Not a hole we can fill; emit what we consumed
                let end = start + 1 + digits.len();
                result.push_str(&template[start..end]);
            }
        }
    }

    result
}
