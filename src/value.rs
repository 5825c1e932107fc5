use rust_decimal::Decimal;

use crate::ast::ValueType;

/// A literal carried by a [`Constant`](crate::ast::Expression::Constant) node.
///
/// Numbers keep the distinction between integers and decimals. Decimals are
/// exact, so `0.1` reaches the rendered index definition as `0.1` rather
/// than as the nearest binary float.
///
/// # Examples
///
/// ```
/// use linq_rewrite::ConstValue;
/// use rust_decimal::Decimal;
///
/// let name = ConstValue::from("bob");
/// let price = ConstValue::Decimal(Decimal::new(1999, 2));
///
/// assert_eq!(name.render(), "\"bob\"");
/// assert_eq!(price.render(), "19.99");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstValue {
    /// `null`
    Null,

    /// `true`/`false`
    Boolean(bool),

    /// Integer number
    Integer(i64),

    /// Exact decimal number
    Decimal(Decimal),

    /// UTF-8 string
    String(String),
}

impl ConstValue {
    /// The static type a constant of this value gets when none is given.
    pub fn value_type(&self) -> ValueType {
        match self {
            ConstValue::Null => ValueType::object("Object"),
            ConstValue::Boolean(_) => ValueType::Boolean,
            ConstValue::Integer(_) | ConstValue::Decimal(_) => ValueType::Number,
            ConstValue::String(_) => ValueType::String,
        }
    }

    /// Source text of the literal. Strings are quoted and escaped.
    pub fn render(&self) -> String {
        match self {
            ConstValue::Null => "null".to_string(),
            ConstValue::Boolean(b) => b.to_string(),
            ConstValue::Integer(n) => n.to_string(),
            ConstValue::Decimal(d) => d.normalize().to_string(),
            ConstValue::String(s) => format!("\"{}\"", escape(s)),
        }
    }
}

fn escape(s: &str) -> String {
    s.chars()
        .flat_map(|c| match c {
            '"' => vec!['\\', '"'],
            '\\' => vec!['\\', '\\'],
            '\n' => vec!['\\', 'n'],
            '\r' => vec!['\\', 'r'],
            '\t' => vec!['\\', 't'],
            c => vec![c],
        })
        .collect()
}

impl From<bool> for ConstValue {
    fn from(b: bool) -> Self {
        ConstValue::Boolean(b)
    }
}

impl From<i64> for ConstValue {
    fn from(n: i64) -> Self {
        ConstValue::Integer(n)
    }
}

impl From<i32> for ConstValue {
    fn from(n: i32) -> Self {
        ConstValue::Integer(n.into())
    }
}

impl From<Decimal> for ConstValue {
    fn from(d: Decimal) -> Self {
        ConstValue::Decimal(d)
    }
}

impl From<&str> for ConstValue {
    fn from(s: &str) -> Self {
        ConstValue::String(s.to_string())
    }
}

impl From<String> for ConstValue {
    fn from(s: String) -> Self {
        ConstValue::String(s)
    }
}
