//! JSON <-> expression tree conversion utilities
//!
//! Trees travel through the command line as plain JSON:
//!
//! ```text
//! {"constant": "bob"}                                   literal (type inferred)
//! {"path": "Name", "parent": {"path": "x"}}             x.Name
//! {"path": "any", "kind": "any", "parent": {...}}       collection any-marker
//! {"op": "EQ", "args": [..], "type": "boolean"}         operation
//! {"new": [["X", {..}], ["C", {..}]]}                   anonymous object
//! {"param": "minTotal"}                                 parameter
//! {"subquery": {..}}                                    opaque subquery
//! {"template": "{0}.Length", "args": [..]}              raw template
//! ```
//!
//! `type` is optional everywhere and defaults per node kind.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::ast::{Expr, Expression, Operator, Path, PathMetadata, PathType, ValueType};
use crate::value::ConstValue;

/// Errors that can occur while decoding a JSON tree
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("expected a JSON object for an expression node, found `{0}`")]
    NotAnObject(String),

    #[error(
        "unknown node `{0}`; expected one of constant, path, op, new, factory, param, subquery, template"
    )]
    UnknownNode(String),

    #[error("unknown operator `{0}` (run 'linq-rewrite operators' to list them)")]
    UnknownOperator(String),

    #[error("unknown path kind `{0}`; expected variable, property or any")]
    UnknownPathKind(String),

    #[error("field `{field}` must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("unsupported constant `{0}`")]
    UnsupportedConstant(String),
}

/// Convert a JSON tree to an expression
pub fn json_to_expr(v: &Value) -> Result<Expr, DecodeError> {
    let obj = v
        .as_object()
        .ok_or_else(|| DecodeError::NotAnObject(v.to_string()))?;
    let ty = declared_type(obj)?;

    if let Some(constant) = obj.get("constant") {
        let value = json_to_constant(constant)?;
        return Ok(match ty {
            Some(ty) => Expression::typed_constant(value, ty),
            None => Expression::constant(value),
        });
    }

    if obj.contains_key("path") {
        return Ok(Expression::path(json_to_path(obj)?));
    }

    if let Some(id) = obj.get("op") {
        let id = id.as_str().ok_or(DecodeError::InvalidField {
            field: "op",
            expected: "an operator id string",
        })?;
        let op = Operator::from_id(id).ok_or_else(|| DecodeError::UnknownOperator(id.to_string()))?;
        let args = json_to_args(obj)?;
        return Ok(Expression::operation(
            ty.unwrap_or_else(|| default_operation_type(op)),
            op,
            args,
        ));
    }

    if let Some(fields) = obj.get("new") {
        let fields = fields.as_array().ok_or(DecodeError::InvalidField {
            field: "new",
            expected: "an array of [name, expression] pairs",
        })?;
        let args = fields
            .iter()
            .map(json_to_field)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Expression::factory(ty.unwrap_or(ValueType::Anonymous), args));
    }

    if let Some(args) = obj.get("factory") {
        let args = args.as_array().ok_or(DecodeError::InvalidField {
            field: "factory",
            expected: "an array of expressions",
        })?;
        let args = args.iter().map(json_to_expr).collect::<Result<Vec<_>, _>>()?;
        return Ok(Expression::factory(ty.unwrap_or(ValueType::Anonymous), args));
    }

    if let Some(name) = obj.get("param") {
        let name = name.as_str().ok_or(DecodeError::InvalidField {
            field: "param",
            expected: "a string",
        })?;
        return Ok(Expression::param(ty.unwrap_or_else(default_type), name));
    }

    if let Some(query) = obj.get("subquery") {
        return Ok(Expression::subquery(json_to_expr(query)?));
    }

    if let Some(template) = obj.get("template") {
        let template = template.as_str().ok_or(DecodeError::InvalidField {
            field: "template",
            expected: "a string",
        })?;
        let args = json_to_args(obj)?;
        return Ok(Expression::template(
            ty.unwrap_or_else(default_type),
            template,
            args,
        ));
    }

    Err(DecodeError::UnknownNode(v.to_string()))
}

fn json_to_path(obj: &Map<String, Value>) -> Result<Arc<Path>, DecodeError> {
    let name = obj
        .get("path")
        .and_then(Value::as_str)
        .ok_or(DecodeError::InvalidField {
            field: "path",
            expected: "a string",
        })?;
    let parent = match obj.get("parent") {
        Some(parent) => {
            let parent = parent.as_object().ok_or(DecodeError::InvalidField {
                field: "parent",
                expected: "a path object",
            })?;
            Some(json_to_path(parent)?)
        }
        None => None,
    };
    let path_type = match obj.get("kind").map(|k| (k, k.as_str())) {
        Some((_, Some(kind))) => {
            PathType::from_name(kind).ok_or_else(|| DecodeError::UnknownPathKind(kind.to_string()))?
        }
        Some((kind, None)) => return Err(DecodeError::UnknownPathKind(kind.to_string())),
        None if parent.is_some() => PathType::Property,
        None => PathType::Variable,
    };

    Ok(Arc::new(Path {
        ty: declared_type(obj)?.unwrap_or_else(default_type),
        metadata: PathMetadata {
            name: name.to_string(),
            parent,
            path_type,
        },
    }))
}

fn json_to_field(v: &Value) -> Result<Expr, DecodeError> {
    let invalid = DecodeError::InvalidField {
        field: "new",
        expected: "an array of [name, expression] pairs",
    };
    match v.as_array().map(Vec::as_slice) {
        Some([Value::String(name), selector]) => Ok(Expression::list(vec![
            Expression::constant(name.as_str()),
            json_to_expr(selector)?,
        ])),
        _ => Err(invalid),
    }
}

fn json_to_args(obj: &Map<String, Value>) -> Result<Vec<Expr>, DecodeError> {
    match obj.get("args") {
        Some(Value::Array(args)) => args.iter().map(json_to_expr).collect(),
        Some(_) => Err(DecodeError::InvalidField {
            field: "args",
            expected: "an array of expressions",
        }),
        None => Ok(Vec::new()),
    }
}

fn json_to_constant(v: &Value) -> Result<ConstValue, DecodeError> {
    match v {
        Value::Null => Ok(ConstValue::Null),
        Value::Bool(b) => Ok(ConstValue::Boolean(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(ConstValue::Integer(i));
            }
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .map(ConstValue::Decimal)
                .map_err(|_| DecodeError::UnsupportedConstant(text))
        }
        Value::String(s) => Ok(ConstValue::String(s.clone())),
        Value::Array(_) | Value::Object(_) => Err(DecodeError::UnsupportedConstant(v.to_string())),
    }
}

fn declared_type(obj: &Map<String, Value>) -> Result<Option<ValueType>, DecodeError> {
    match obj.get("type") {
        Some(Value::String(name)) => Ok(Some(ValueType::from_name(name))),
        Some(_) => Err(DecodeError::InvalidField {
            field: "type",
            expected: "a type name string",
        }),
        None => Ok(None),
    }
}

fn default_type() -> ValueType {
    ValueType::object("Object")
}

fn default_operation_type(op: Operator) -> ValueType {
    match op {
        Operator::And
        | Operator::Or
        | Operator::Not
        | Operator::Eq
        | Operator::Ne
        | Operator::Lt
        | Operator::Le
        | Operator::Gt
        | Operator::Ge
        | Operator::Any => ValueType::Boolean,
        Operator::Sum | Operator::Count => ValueType::Number,
        Operator::Select | Operator::Where | Operator::SelectMany | Operator::SelectManyTranslated => {
            ValueType::Collection
        }
        Operator::List | Operator::Wrapped | Operator::Lambda => ValueType::Expression,
    }
}

/// Convert an expression to a JSON tree
pub fn expr_to_json(expr: &Expression) -> Value {
    let mut obj = Map::new();
    match expr {
        Expression::Constant { value, ty } => {
            obj.insert("constant".into(), constant_to_json(value));
            if *ty != value.value_type() {
                obj.insert("type".into(), ty.name().into());
            }
        }
        Expression::Path(path) => return path_to_json(path),
        Expression::Operation { ty, op, args } => {
            obj.insert("op".into(), op.id().into());
            obj.insert("args".into(), args_to_json(args));
            if *ty != default_operation_type(*op) {
                obj.insert("type".into(), ty.name().into());
            }
        }
        Expression::Factory { ty, args } => {
            match args.iter().map(|arg| field_to_json(arg)).collect::<Option<Vec<_>>>() {
                Some(fields) => obj.insert("new".into(), Value::Array(fields)),
                None => obj.insert("factory".into(), args_to_json(args)),
            };
            if *ty != ValueType::Anonymous {
                obj.insert("type".into(), ty.name().into());
            }
        }
        Expression::Param { ty, name } => {
            obj.insert("param".into(), name.as_str().into());
            insert_type(&mut obj, ty);
        }
        Expression::SubQuery(query) => {
            obj.insert("subquery".into(), expr_to_json(query));
        }
        Expression::Template { ty, template, args } => {
            obj.insert("template".into(), template.as_str().into());
            obj.insert("args".into(), args_to_json(args));
            insert_type(&mut obj, ty);
        }
    }
    Value::Object(obj)
}

fn path_to_json(path: &Path) -> Value {
    let mut obj = Map::new();
    obj.insert("path".into(), path.name().into());
    if let Some(parent) = path.parent() {
        obj.insert("parent".into(), path_to_json(parent));
    }
    let implied = if path.is_root() {
        PathType::Variable
    } else {
        PathType::Property
    };
    if path.path_type() != implied {
        obj.insert("kind".into(), path.path_type().name().into());
    }
    insert_type(&mut obj, &path.ty);
    Value::Object(obj)
}

fn field_to_json(field: &Expression) -> Option<Value> {
    match field {
        Expression::Operation {
            op: Operator::List,
            args,
            ..
        } => match args.as_slice() {
            [name, selector] => match name.as_ref() {
                Expression::Constant {
                    value: ConstValue::String(name),
                    ..
                } => Some(Value::Array(vec![name.as_str().into(), expr_to_json(selector)])),
                _ => None,
            },
            _ => None,
        },
        _ => None,
    }
}

fn args_to_json(args: &[Expr]) -> Value {
    Value::Array(args.iter().map(|arg| expr_to_json(arg)).collect())
}

fn insert_type(obj: &mut Map<String, Value>, ty: &ValueType) {
    if *ty != default_type() {
        obj.insert("type".into(), ty.name().into());
    }
}

fn constant_to_json(value: &ConstValue) -> Value {
    match value {
        ConstValue::Null => Value::Null,
        ConstValue::Boolean(b) => Value::Bool(*b),
        ConstValue::Integer(i) => Value::Number((*i).into()),
        ConstValue::Decimal(d) => d
            .to_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ConstValue::String(s) => Value::String(s.clone()),
    }
}
