//! Error types for applying post-processing programs to executed rows.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvalError {
    #[error("Unbound parameter `{0}`")]
    UnboundParameter(String),

    #[error("Expected a sequence, found {found}")]
    NotASequence { found: &'static str },

    #[error("Cannot cast {found} to {expected}")]
    InvalidCast { expected: String, found: String },

    #[error("Index {index} out of range for a row of {len} cells")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Expected a tuple or row, found {found}")]
    NotATuple { found: &'static str },

    #[error("Expected a grouping, found {found}")]
    NotAGroup { found: &'static str },

    #[error("Member `{member}` not found on {found}")]
    MissingMember { member: String, found: &'static str },
}

pub type EvalResult<T> = Result<T, EvalError>;
