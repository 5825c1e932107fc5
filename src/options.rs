//! Configuration of a rewrite pass.

/// Prefix of the transient tuple variables introduced by SelectMany
/// normalization (`transId_0`, `transId_1`, ...).
pub const DEFAULT_TRANSIENT_PREFIX: &str = "transId_";

/// Knobs of a single top-level rewrite.
///
/// Two passes run with equal options over equal trees produce equal output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Prefix of synthesized transient identifiers
    pub transient_prefix: String,

    /// First value of the fresh-id counter
    pub first_transient_id: u64,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        RewriteOptions {
            transient_prefix: DEFAULT_TRANSIENT_PREFIX.to_string(),
            first_transient_id: 0,
        }
    }
}

impl RewriteOptions {
    /// Default options with the counter starting at `seed`.
    pub fn seeded(seed: u64) -> Self {
        RewriteOptions {
            first_transient_id: seed,
            ..Self::default()
        }
    }

    /// Builder-style override of the transient prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.transient_prefix = prefix.into();
        self
    }
}
