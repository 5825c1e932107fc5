//! # Expression Tree
//!
//! This module defines the immutable expression tree that query and index
//! definitions are compiled through before they are rendered to the server's
//! map/reduce source text.
//!
//! ## Architecture Overview
//!
//! The tree is organized into focused submodules:
//!
//! - **[expressions]** - The closed [`Expression`] variant and its constructors
//! - **[path]** - Field references ([`Path`]) with their parent chain
//! - **[operators]** - The fixed [`Operator`] registry and render templates
//! - **[types]** - Static result types ([`ValueType`])
//!
//! ## Sharing
//!
//! Nodes live behind [`Arc`](std::sync::Arc) (see [`Expr`]). A rewrite pass
//! never mutates a node: it hands back the very same `Arc` for an untouched
//! subtree, and builds fresh nodes only along the spine that changed.
//!
//! ```
//! use std::sync::Arc;
//! use linq_rewrite::ast::{Expression, Operator, Path, ValueType};
//!
//! // docs.Orders.Where(o => o.Total > 100)
//! let order = Path::variable("o", ValueType::object("Order"));
//! let total = Path::property(&order, "Total", ValueType::Number);
//! let filter = Expression::predicate(
//!     Operator::Gt,
//!     vec![Expression::path(total), Expression::constant(100)],
//! );
//!
//! assert!(filter.is_boolean());
//! assert_eq!(filter.operator(), Some(Operator::Gt));
//! ```
//!
//! ## Anonymous Objects
//!
//! A [`Expression::Factory`] is an anonymous projection. Each of its fields is
//! stored as `LIST(Constant(name), selector)` so the printer can emit
//! `new { Name = selector }` without extra metadata.
pub mod expressions;
pub mod operators;
pub mod path;
pub mod types;

pub use expressions::{Expr, Expression};
pub use operators::Operator;
pub use path::{Path, PathMetadata, PathType};
pub use types::ValueType;
