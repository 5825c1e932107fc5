use std::borrow::Cow;
use std::fmt;

/// Encoded names of the built-in types.
const BUILTIN_NAMES: [&str; 6] = [
    "boolean",
    "string",
    "number",
    "collection",
    "anonymous",
    "expression",
];

/// Marks a domain class in the encoding, e.g. `class:string`.
pub const CLASS_PREFIX: &str = "class:";

/// Static result type of an expression node.
///
/// The builder attaches a type to every node it creates. Rewrites carry the
/// type over unchanged when they rebuild a node, so a boolean predicate stays
/// a predicate after its arguments were replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// `true`/`false` predicates
    Boolean,

    /// Text
    String,

    /// Any numeric value (integer or decimal)
    Number,

    /// A collection of documents or values
    Collection,

    /// An anonymous object built with `new { ... }`
    Anonymous,

    /// A fragment of the query language itself: lambdas, argument lists,
    /// fluent calls whose value is another query.
    Expression,

    /// A named domain class (`Order`, `ClickAction`, ...)
    Object(String),
}

impl ValueType {
    /// Shorthand for [`ValueType::Object`].
    pub fn object(name: impl Into<String>) -> Self {
        ValueType::Object(name.into())
    }

    /// True for predicate-typed nodes.
    pub fn is_boolean(&self) -> bool {
        matches!(self, ValueType::Boolean)
    }

    /// Stable name used by the JSON tree encoding.
    ///
    /// A domain class whose name would read back as a built-in type (or as
    /// an escaped class) is written with the `class:` prefix.
    pub fn name(&self) -> Cow<'_, str> {
        match self {
            ValueType::Boolean => Cow::Borrowed("boolean"),
            ValueType::String => Cow::Borrowed("string"),
            ValueType::Number => Cow::Borrowed("number"),
            ValueType::Collection => Cow::Borrowed("collection"),
            ValueType::Anonymous => Cow::Borrowed("anonymous"),
            ValueType::Expression => Cow::Borrowed("expression"),
            ValueType::Object(name)
                if BUILTIN_NAMES.contains(&name.as_str()) || name.starts_with(CLASS_PREFIX) =>
            {
                Cow::Owned(format!("{}{}", CLASS_PREFIX, name))
            }
            ValueType::Object(name) => Cow::Borrowed(name),
        }
    }

    /// Inverse of [`ValueType::name`]; unknown names become domain classes.
    pub fn from_name(name: &str) -> Self {
        if let Some(class) = name.strip_prefix(CLASS_PREFIX) {
            return ValueType::Object(class.to_string());
        }
        match name {
            "boolean" => ValueType::Boolean,
            "string" => ValueType::String,
            "number" => ValueType::Number,
            "collection" => ValueType::Collection,
            "anonymous" => ValueType::Anonymous,
            "expression" => ValueType::Expression,
            other => ValueType::Object(other.to_string()),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
