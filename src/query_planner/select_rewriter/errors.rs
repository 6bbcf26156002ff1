//! Error types for projection rewriting.
//!
//! All of these are raised while the projection is being rewritten, never
//! while rows are being processed, so a query can be rejected before any
//! data access happens.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RewriteError {
    /// Collection fields are owned by more than one distinct query source.
    /// The caller should fall back to executing the projection unrewritten.
    #[error("Unsupported projection: collection fields reference {} distinct query sources ({})", .sources.len(), .sources.join(", "))]
    UnsupportedProjection { sources: Vec<String> },

    /// A tuple, or a projection feeding one, is outside the supported width.
    #[error("Unsupported arity {arity}: supported arities are {min} through {max}")]
    UnsupportedArity { arity: usize, min: usize, max: usize },

    /// Internal invariant violation while building or finalising a rewrite.
    #[error("Invalid shape: expected {expected}, found {found}")]
    InvalidShape { expected: String, found: String },
}

impl RewriteError {
    pub(crate) fn invalid_shape(expected: impl Into<String>, found: impl ToString) -> Self {
        RewriteError::InvalidShape {
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    /// True when the caller is expected to retry without rewriting.
    pub fn is_fallback_signal(&self) -> bool {
        matches!(self, RewriteError::UnsupportedProjection { .. })
    }
}

pub type RewriteResult<T> = Result<T, RewriteError>;
