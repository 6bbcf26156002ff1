use thiserror::Error;

use super::{logical_expr::errors::ConversionError, select_rewriter::errors::RewriteError};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryPlannerError {
    #[error("Failed to parse projection:\n{0}")]
    Parse(String),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}
