pub mod any;
pub mod ast;
pub mod cli;
pub mod context;
pub mod error;
pub mod options;
pub mod render;
pub mod roots;
pub mod select_many;
pub mod value;

pub use any::{ANY_PARAMETER, expand_any};
pub use ast::{Expr, Expression, Operator, Path, PathMetadata, PathType, ValueType};
pub use context::RewriteContext;
pub use error::StructuralShapeError;
pub use options::{DEFAULT_TRANSIENT_PREFIX, RewriteOptions};
pub use render::render;
pub use roots::{collect_free_roots, collect_roots};
pub use select_many::normalize_select_many;
pub use value::ConstValue;
