//! CLI support for linq-rewrite
//!
//! Provides programmatic access to the command line passes for embedding in
//! other tools (index deployment scripts, test harnesses).

mod convert;
mod docs;
mod rewrite;

pub use convert::{DecodeError, expr_to_json, json_to_expr};
pub use docs::{get_encoding_overview, get_operator_reference};
pub use rewrite::{Pass, PassOptions, PassResult, execute_pass};

use std::io;

/// Errors that can occur during CLI operations
#[derive(Debug)]
pub enum CliError {
    /// Input is valid JSON but not a valid tree
    Decode(DecodeError),
    /// A pass rejected the tree
    Shape(crate::StructuralShapeError),
    /// JSON parsing error
    Json(serde_json::Error),
    /// IO error
    Io(io::Error),
    /// No input provided
    NoInput,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Decode(e) => write!(f, "Invalid expression tree: {}", e),
            CliError::Shape(e) => write!(f, "Rewrite failed: {}", e),
            CliError::Json(e) => write!(f, "Invalid JSON: {}", e),
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::NoInput => write!(
                f,
                "No input provided. Use --input or pipe a JSON expression tree to stdin."
            ),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Decode(e) => Some(e),
            CliError::Shape(e) => Some(e),
            CliError::Json(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::NoInput => None,
        }
    }
}

impl From<DecodeError> for CliError {
    fn from(e: DecodeError) -> Self {
        CliError::Decode(e)
    }
}

impl From<crate::StructuralShapeError> for CliError {
    fn from(e: crate::StructuralShapeError) -> Self {
        CliError::Shape(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}
