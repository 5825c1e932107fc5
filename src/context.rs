use std::sync::Arc;

use crate::ast::{Expr, Path};
use crate::options::RewriteOptions;

/// State threaded through one top-level rewrite.
///
/// A context is created for a single call of a pass and dropped when it
/// returns; it is never shared between calls or threads.
///
/// - the **replace flag** only flows upward: a child is visited with a
///   cleared flag ([`enter_child`](Self::enter_child)) and its result is
///   OR-merged back ([`leave_child`](Self::leave_child));
/// - the **substitution table** is append-only and matched structurally,
///   first entry wins;
/// - the **fresh-id counter** only increases during a pass, so transient
///   names never collide;
/// - the **ancestor stack** holds the nodes currently being visited.
///
/// # Examples
///
/// ```
/// use linq_rewrite::{RewriteContext, RewriteOptions};
///
/// let mut ctx = RewriteContext::new(RewriteOptions::seeded(7));
/// assert_eq!(ctx.fresh_transient_name(), "transId_7");
/// assert_eq!(ctx.fresh_transient_name(), "transId_8");
/// assert_eq!(ctx.next_id(), 9);
/// ```
#[derive(Debug, Clone)]
pub struct RewriteContext {
    replace: bool,
    substitutions: Vec<(Arc<Path>, Expr)>,
    next_id: u64,
    stack: Vec<Expr>,
    options: RewriteOptions,
}

impl Default for RewriteContext {
    fn default() -> Self {
        RewriteContext::new(RewriteOptions::default())
    }
}

impl RewriteContext {
    pub fn new(options: RewriteOptions) -> Self {
        RewriteContext {
            replace: false,
            substitutions: Vec::new(),
            next_id: options.first_transient_id,
            stack: Vec::new(),
            options,
        }
    }

    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    /// True once anything in the subtree being visited was rewritten.
    pub fn is_replace(&self) -> bool {
        self.replace
    }

    pub fn mark_replace(&mut self) {
        self.replace = true;
    }

    /// Clears the flag before visiting a child; returns the parent's flag.
    pub fn enter_child(&mut self) -> bool {
        std::mem::replace(&mut self.replace, false)
    }

    /// Merges a finished child into the parent flag saved by
    /// [`enter_child`](Self::enter_child). Returns whether the child itself
    /// rewrote anything.
    pub fn leave_child(&mut self, parent: bool) -> bool {
        let child = self.replace;
        self.replace = parent || child;
        child
    }

    /// Registers `original` to be replaced by `replacement` from now on.
    pub fn add_substitution(&mut self, original: Arc<Path>, replacement: Expr) {
        self.substitutions.push((original, replacement));
    }

    /// First replacement registered for a path structurally equal to `path`.
    pub fn substitution_for(&self, path: &Path) -> Option<&Expr> {
        self.substitutions
            .iter()
            .find(|(original, _)| original.as_ref() == path)
            .map(|(_, replacement)| replacement)
    }

    pub fn substitutions(&self) -> &[(Arc<Path>, Expr)] {
        &self.substitutions
    }

    /// Value the next fresh id will take.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn fresh_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// `<prefix><fresh id>`, e.g. `transId_0`.
    pub fn fresh_transient_name(&mut self) -> String {
        let id = self.fresh_id();
        format!("{}{}", self.options.transient_prefix, id)
    }

    pub fn push(&mut self, node: Expr) {
        self.stack.push(node);
    }

    pub fn pop(&mut self) -> Option<Expr> {
        self.stack.pop()
    }

    /// The node `depth` frames below the top of the stack (0 is the top).
    pub fn ancestor(&self, depth: usize) -> Option<&Expr> {
        self.stack.iter().rev().nth(depth)
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }
}
