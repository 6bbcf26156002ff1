//! Choice of concrete collection type for reconstructed collection fields.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::query_planner::logical_expr::{CollectionKind, ValueType};

/// Maps the declared type of a collection field to the concrete collection
/// that is materialised for each regrouped row.
pub trait CollectionMaterializer {
    fn concrete_kind(&self, declared: &ValueType) -> CollectionKind;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionPolicy {
    /// Follow the field's declared collection kind; plain sequences become lists.
    #[default]
    Declared,
    /// Always materialise a deduplicating set.
    Set,
    /// Always materialise a duplicate-preserving list.
    List,
}

impl CollectionMaterializer for CollectionPolicy {
    fn concrete_kind(&self, declared: &ValueType) -> CollectionKind {
        match self {
            CollectionPolicy::Declared => declared.collection_kind().unwrap_or(CollectionKind::List),
            CollectionPolicy::Set => CollectionKind::Set,
            CollectionPolicy::List => CollectionKind::List,
        }
    }
}

impl fmt::Display for CollectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionPolicy::Declared => write!(f, "declared"),
            CollectionPolicy::Set => write!(f, "set"),
            CollectionPolicy::List => write!(f, "list"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown collection policy '{0}': expected declared, set or list")]
pub struct UnknownCollectionPolicy(pub String);

impl FromStr for CollectionPolicy {
    type Err = UnknownCollectionPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "declared" => Ok(CollectionPolicy::Declared),
            "set" => Ok(CollectionPolicy::Set),
            "list" => Ok(CollectionPolicy::List),
            _ => Err(UnknownCollectionPolicy(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_policy_follows_field_type() {
        let order = ValueType::entity("Order");
        let policy = CollectionPolicy::Declared;
        assert_eq!(
            policy.concrete_kind(&ValueType::set_of(order.clone())),
            CollectionKind::Set
        );
        assert_eq!(
            policy.concrete_kind(&ValueType::list_of(order.clone())),
            CollectionKind::List
        );
        assert_eq!(
            policy.concrete_kind(&ValueType::sequence_of(order)),
            CollectionKind::List
        );
    }

    #[test]
    fn test_fixed_policies() {
        let list = ValueType::list_of(ValueType::Int);
        assert_eq!(CollectionPolicy::Set.concrete_kind(&list), CollectionKind::Set);
        assert_eq!(CollectionPolicy::List.concrete_kind(&list), CollectionKind::List);
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!("SET".parse::<CollectionPolicy>().unwrap(), CollectionPolicy::Set);
        assert_eq!(" declared ".parse::<CollectionPolicy>().unwrap(), CollectionPolicy::Declared);
        assert!("bag".parse::<CollectionPolicy>().is_err());
    }
}
