use thiserror::Error;

use crate::ast::{Expression, Operator, Path};
use crate::render::render;

/// A tree violated the structural precondition of a rewrite rule.
///
/// This is a programming error in whatever built the tree, never a data
/// error: passes stop at the first violation and return no partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralShapeError {
    /// An operator's arguments do not have the shape its rewrite expects
    #[error("malformed {operator} expression: expected {expected}, found `{found}`")]
    UnexpectedShape {
        operator: Operator,
        expected: &'static str,
        found: String,
    },

    /// A substitution replaced a path's parent with something that is not a path
    #[error("cannot re-parent `{path}` onto non-path `{replacement}`")]
    NonPathParent { path: String, replacement: String },

    /// An any-path is not the left operand of an enclosing operation
    #[error("malformed Any expression `{path}`: {reason}")]
    MalformedAny { path: String, reason: &'static str },
}

impl StructuralShapeError {
    pub(crate) fn unexpected(operator: Operator, expected: &'static str, found: &Expression) -> Self {
        StructuralShapeError::UnexpectedShape {
            operator,
            expected,
            found: render(found),
        }
    }

    pub(crate) fn malformed_any(path: &Path, reason: &'static str) -> Self {
        StructuralShapeError::MalformedAny {
            path: path.dotted(),
            reason,
        }
    }

    /// The operator whose precondition failed.
    pub fn operator(&self) -> Option<Operator> {
        match self {
            StructuralShapeError::UnexpectedShape { operator, .. } => Some(*operator),
            StructuralShapeError::MalformedAny { .. } => Some(Operator::Any),
            // Only SelectMany normalization re-parents paths
            StructuralShapeError::NonPathParent { .. } => Some(Operator::SelectMany),
        }
    }
}
