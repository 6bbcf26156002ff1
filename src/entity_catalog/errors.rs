//! # Entity Catalog Error Types
//!
//! Errors raised while loading entity definitions and while resolving
//! member types against them.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error("No entity definition found for `{entity}`")]
    UnknownEntity { entity: String },
    #[error("Entity `{entity}` has no property `{property}`")]
    UnknownProperty { entity: String, property: String },
    #[error("Entity `{entity}` is defined more than once")]
    DuplicateEntity { entity: String },
    #[error("Invalid type `{type_name}` for property `{entity}.{property}`")]
    InvalidPropertyType {
        entity: String,
        property: String,
        type_name: String,
    },
    #[error("Failed to read catalog file: {error}")]
    ConfigReadError { error: String },
    #[error("Failed to parse catalog: {error}")]
    ConfigParseError { error: String },
}

impl CatalogError {
    /// Create an UnknownProperty error that also lists the properties the
    /// entity does have.
    pub fn unknown_property_with_candidates<'a>(
        entity: impl Into<String>,
        property: impl Into<String>,
        candidates: impl Iterator<Item = &'a str>,
    ) -> Self {
        let mut known: Vec<&str> = candidates.collect();
        known.sort_unstable();
        let property = property.into();
        CatalogError::UnknownProperty {
            entity: entity.into(),
            property: if known.is_empty() {
                property
            } else {
                format!("{} (known: {})", property, known.join(", "))
            },
        }
    }
}
