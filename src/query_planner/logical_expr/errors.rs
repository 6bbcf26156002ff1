//! Error types for lowering parsed projections to expressions.
//!
//! These errors occur when a projection refers to query sources or members
//! that the declared sources and the entity catalog do not know about.

use thiserror::Error;

use crate::entity_catalog::CatalogError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConversionError {
    #[error("Unknown query source `{name}`")]
    UnknownSource { name: String },

    #[error("Query source `{name}` is declared more than once")]
    DuplicateSource { name: String },

    #[error("Cannot access member `{member}` on a value of type {ty}")]
    NotAnEntity { member: String, ty: String },

    #[error("Member `{member}` is initialised more than once")]
    DuplicateMember { member: String },

    #[error("Invalid source declaration `{0}`: expected name:Entity")]
    InvalidSourceDeclaration(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
