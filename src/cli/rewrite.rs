//! Run a single pass over a JSON expression tree

use std::sync::Arc;

use super::{CliError, expr_to_json, json_to_expr};
use crate::{
    RewriteContext, RewriteOptions, collect_free_roots, collect_roots, expand_any,
    normalize_select_many, render,
};

/// Which pass to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Every root the tree reads from
    Roots,
    /// Roots not bound by an enclosing lambda
    FreeRoots,
    /// SelectMany normalization
    SelectMany,
    /// Existential-Any expansion
    ExpandAny,
    /// Template rendering only
    Render,
}

/// Options for a pass run
#[derive(Debug, Clone)]
pub struct PassOptions {
    pub pass: Pass,
    /// JSON tree input string
    pub input: Option<String>,
    /// Seed and prefix of the rewrite context
    pub rewrite: RewriteOptions,
}

/// Result of a pass run
#[derive(Debug)]
pub enum PassResult {
    /// Sorted root names
    Roots(Vec<String>),
    /// Rewritten tree, plus whether anything changed
    Tree { tree: serde_json::Value, changed: bool },
    /// Rendered text
    Text(String),
}

/// Decode the input tree and run the selected pass on it
pub fn execute_pass(options: &PassOptions) -> Result<PassResult, CliError> {
    let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
    let json_value: serde_json::Value = serde_json::from_str(json_str)?;
    let tree = json_to_expr(&json_value)?;

    tracing::debug!(pass = ?options.pass, "running pass");

    let rewritten = match options.pass {
        Pass::Roots => return Ok(PassResult::Roots(collect_roots(&tree).into_iter().collect())),
        Pass::FreeRoots => {
            return Ok(PassResult::Roots(
                collect_free_roots(&tree).into_iter().collect(),
            ));
        }
        Pass::Render => return Ok(PassResult::Text(render(&tree))),
        Pass::SelectMany => {
            let mut ctx = RewriteContext::new(options.rewrite.clone());
            normalize_select_many(&tree, &mut ctx)?
        }
        Pass::ExpandAny => {
            let mut ctx = RewriteContext::new(options.rewrite.clone());
            expand_any(&tree, &mut ctx)?
        }
    };

    Ok(PassResult::Tree {
        tree: expr_to_json(&rewritten),
        changed: !Arc::ptr_eq(&tree, &rewritten),
    })
}
