//! Resolved types carried by every expression node.
//!
//! The rewriter never inspects runtime values; every decision it makes
//! (is this field a collection? what is its element type? how wide is the
//! tuple?) is a question about these types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::query_planner::select_rewriter::errors::RewriteError;

/// Smallest arity of a synthetic tuple.
pub const MIN_TUPLE_ARITY: usize = 2;

/// Largest arity of a synthetic tuple.
pub const MAX_TUPLE_ARITY: usize = 6;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum CollectionKind {
    /// Deduplicating collection (entity `ISet`-style properties).
    Set,
    /// Duplicate-preserving, ordered collection.
    List,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKind::Set => write!(f, "Set"),
            CollectionKind::List => write!(f, "List"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Int,
    Float,
    Bool,
    /// Text is enumerable (a sequence of characters) but never a collection.
    Text,
    /// Untyped slot, e.g. a cell read out of a raw result row.
    Object,
    /// An entity type by name, e.g. `Customer`.
    Entity(String),
    Collection {
        kind: CollectionKind,
        element: Box<ValueType>,
    },
    /// Enumerable without a concrete collection kind (row sequences, query results).
    Sequence(Box<ValueType>),
    Record(RecordType),
    Tuple(TupleType),
    Grouping {
        key: Box<ValueType>,
        element: Box<ValueType>,
    },
}

impl ValueType {
    pub fn entity(name: impl Into<String>) -> Self {
        ValueType::Entity(name.into())
    }

    pub fn set_of(element: ValueType) -> Self {
        ValueType::Collection {
            kind: CollectionKind::Set,
            element: Box::new(element),
        }
    }

    pub fn list_of(element: ValueType) -> Self {
        ValueType::Collection {
            kind: CollectionKind::List,
            element: Box::new(element),
        }
    }

    pub fn sequence_of(element: ValueType) -> Self {
        ValueType::Sequence(Box::new(element))
    }

    pub fn is_enumerable(&self) -> bool {
        matches!(
            self,
            ValueType::Text
                | ValueType::Collection { .. }
                | ValueType::Sequence(_)
                | ValueType::Grouping { .. }
        )
    }

    /// Enumerable and not text. This is the only collection test used by the rewriter.
    pub fn is_collection(&self) -> bool {
        self.is_enumerable() && *self != ValueType::Text
    }

    /// Element type of an enumerable, `None` for scalars and text.
    pub fn element_type(&self) -> Option<&ValueType> {
        match self {
            ValueType::Collection { element, .. }
            | ValueType::Sequence(element)
            | ValueType::Grouping { element, .. } => Some(element),
            _ => None,
        }
    }

    pub fn collection_kind(&self) -> Option<CollectionKind> {
        match self {
            ValueType::Collection { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Int => write!(f, "Int"),
            ValueType::Float => write!(f, "Float"),
            ValueType::Bool => write!(f, "Bool"),
            ValueType::Text => write!(f, "Text"),
            ValueType::Object => write!(f, "Object"),
            ValueType::Entity(name) => write!(f, "{}", name),
            ValueType::Collection { kind, element } => write!(f, "{}<{}>", kind, element),
            ValueType::Sequence(element) => write!(f, "Seq<{}>", element),
            ValueType::Record(record) => write!(f, "{}", record),
            ValueType::Tuple(tuple) => write!(f, "{}", tuple),
            ValueType::Grouping { key, element } => write!(f, "Grouping<{}, {}>", key, element),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct RecordMember {
    pub name: String,
    pub ty: ValueType,
}

impl RecordMember {
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A record type: anonymous (`name == None`) or a named, user-declared type.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct RecordType {
    pub name: Option<String>,
    pub members: Vec<RecordMember>,
}

impl RecordType {
    pub fn anonymous(members: Vec<RecordMember>) -> Self {
        Self {
            name: None,
            members,
        }
    }

    pub fn named(name: impl Into<String>, members: Vec<RecordMember>) -> Self {
        Self {
            name: Some(name.into()),
            members,
        }
    }

    pub fn member(&self, name: &str) -> Option<&RecordMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members = self
            .members
            .iter()
            .map(|m| format!("{}: {}", m.name, m.ty))
            .collect::<Vec<_>>()
            .join(", ");
        match &self.name {
            Some(name) => write!(f, "{} {{ {} }}", name, members),
            None => write!(f, "{{ {} }}", members),
        }
    }
}

/// Fixed-arity product type used for rewritten projections and grouping keys.
///
/// The component list is private: the only way to obtain a `TupleType` is
/// through [`TupleType::new`], which rejects arities outside
/// `MIN_TUPLE_ARITY..=MAX_TUPLE_ARITY`.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<ValueType>", into = "Vec<ValueType>")]
pub struct TupleType {
    items: Vec<ValueType>,
}

impl TupleType {
    pub fn new(items: Vec<ValueType>) -> Result<Self, RewriteError> {
        if !(MIN_TUPLE_ARITY..=MAX_TUPLE_ARITY).contains(&items.len()) {
            return Err(RewriteError::UnsupportedArity {
                arity: items.len(),
                min: MIN_TUPLE_ARITY,
                max: MAX_TUPLE_ARITY,
            });
        }
        Ok(Self { items })
    }

    pub fn arity(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[ValueType] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&ValueType> {
        self.items.get(index)
    }
}

impl TryFrom<Vec<ValueType>> for TupleType {
    type Error = RewriteError;

    fn try_from(items: Vec<ValueType>) -> Result<Self, Self::Error> {
        TupleType::new(items)
    }
}

impl From<TupleType> for Vec<ValueType> {
    fn from(tuple: TupleType) -> Self {
        tuple.items
    }
}

impl fmt::Display for TupleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items = self
            .items
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "Tuple<{}>", items)
    }
}
