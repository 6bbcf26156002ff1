//! Projection expression trees.
//!
//! `Expr` is a closed sum type covering both the caller-supplied projection
//! shapes (member access, positional construction, member initialisation)
//! and the nodes the rewriter synthesises (tuples, row reads, sequence
//! operations over flat result rows).

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

pub mod ast_conversion;
mod display;
pub mod errors;
pub mod value_type;
pub mod visitors;

pub use value_type::{
    CollectionKind, RecordMember, RecordType, TupleType, ValueType, MAX_TUPLE_ARITY,
    MIN_TUPLE_ARITY,
};

static NEXT_SOURCE_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of a query source. Two references denote the same source only if
/// their ids are equal; names and item types play no part in identity.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(pub u32);

impl SourceId {
    pub fn fresh() -> Self {
        SourceId(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The entity currently being iterated by a query (`from c in customers`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySourceRef {
    pub id: SourceId,
    /// Range variable name, used for display and evaluation bindings.
    pub name: String,
    /// Declared entity type of the iterated items.
    pub item_type: String,
}

impl QuerySourceRef {
    /// Declare a new query source with a fresh identity.
    pub fn new(name: impl Into<String>, item_type: impl Into<String>) -> Self {
        Self {
            id: SourceId::fresh(),
            name: name.into(),
            item_type: item_type.into(),
        }
    }

    pub fn ty(&self) -> ValueType {
        ValueType::Entity(self.item_type.clone())
    }

    /// Member access on this source, e.g. `customer.OrderSet`.
    pub fn member(&self, member: impl Into<String>, ty: ValueType) -> Expr {
        Expr::Member(MemberAccess {
            target: Box::new(Expr::QuerySource(self.clone())),
            member: member.into(),
            ty,
        })
    }
}

impl PartialEq for QuerySourceRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for QuerySourceRef {}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: ValueType,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn to_expr(&self) -> Expr {
        Expr::Parameter(self.clone())
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Literal {
    pub fn ty(&self) -> ValueType {
        match self {
            Literal::Null => ValueType::Object,
            Literal::Int(_) => ValueType::Int,
            Literal::Float(_) => ValueType::Float,
            Literal::Bool(_) => ValueType::Bool,
            Literal::Text(_) => ValueType::Text,
        }
    }
}

/// Property or field access, e.g. `customer.OrderSet`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct MemberAccess {
    pub target: Box<Expr>,
    pub member: String,
    /// Declared type of the member.
    pub ty: ValueType,
}

/// Positional construction: `new { a, b, c }` or `new Wrapper(a, b)`.
///
/// `args[i]` initialises `ty.members[i]`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct NewRecord {
    pub ty: RecordType,
    pub args: Vec<Expr>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct MemberBinding {
    pub member: String,
    pub expr: Expr,
}

/// Member initialisation: `new Wrapper(ctor args) { A = .., B = .. }`.
///
/// `ty` describes the full record; constructor arguments initialise the
/// leading members, bindings initialise members by name.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct MemberInit {
    pub ty: RecordType,
    pub ctor_args: Vec<Expr>,
    pub bindings: Vec<MemberBinding>,
}

/// Construction of a synthetic fixed-arity tuple.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct TupleExpr {
    pub ty: TupleType,
    pub items: Vec<Expr>,
}

impl TupleExpr {
    /// Build a tuple whose type is taken from the item types.
    pub fn from_items(
        items: Vec<Expr>,
    ) -> Result<Self, crate::query_planner::select_rewriter::errors::RewriteError> {
        let ty = TupleType::new(items.iter().map(Expr::ty).collect())?;
        Ok(Self { ty, items })
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Lambda {
    pub param: Parameter,
    pub body: Box<Expr>,
}

impl Lambda {
    pub fn new(param: Parameter, body: Expr) -> Self {
        Self {
            param,
            body: Box::new(body),
        }
    }

    pub fn return_type(&self) -> ValueType {
        self.body.ty()
    }
}

/// Higher-order operations over sequences, used by post-processing programs.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum SequenceOp {
    /// Reinterpret every item of `source` as `element`.
    Cast {
        source: Box<Expr>,
        element: ValueType,
    },
    /// Group items by `key`, projecting each item through `value`.
    /// Groups appear in first-occurrence order of their keys.
    GroupBy {
        source: Box<Expr>,
        key: Lambda,
        value: Lambda,
    },
    Select {
        source: Box<Expr>,
        selector: Lambda,
    },
    ToArray {
        source: Box<Expr>,
    },
    /// Materialise a concrete collection from the items of `source`.
    NewCollection {
        kind: CollectionKind,
        element: ValueType,
        source: Box<Expr>,
    },
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Expr {
    QuerySource(QuerySourceRef),

    Member(MemberAccess),

    New(NewRecord),

    MemberInit(MemberInit),

    Parameter(Parameter),

    Literal(Literal),

    /// Type conversion; the rewriter uses it to narrow widened row cells.
    Convert {
        operand: Box<Expr>,
        ty: ValueType,
    },

    /// Read cell `index` of a raw, untyped result row.
    RowIndex {
        row: Box<Expr>,
        index: usize,
    },

    /// Read component `index` of a tuple-typed expression.
    TupleItem {
        tuple: Box<Expr>,
        index: usize,
        ty: ValueType,
    },

    Tuple(TupleExpr),

    /// The key of a grouping.
    GroupKey(Box<Expr>),

    Sequence(SequenceOp),
}

impl Expr {
    /// Resolved type of this node.
    pub fn ty(&self) -> ValueType {
        match self {
            Expr::QuerySource(source) => source.ty(),
            Expr::Member(member) => member.ty.clone(),
            Expr::New(new) => ValueType::Record(new.ty.clone()),
            Expr::MemberInit(init) => ValueType::Record(init.ty.clone()),
            Expr::Parameter(param) => param.ty.clone(),
            Expr::Literal(literal) => literal.ty(),
            Expr::Convert { ty, .. } => ty.clone(),
            Expr::RowIndex { .. } => ValueType::Object,
            Expr::TupleItem { ty, .. } => ty.clone(),
            Expr::Tuple(tuple) => ValueType::Tuple(tuple.ty.clone()),
            Expr::GroupKey(group) => match group.ty() {
                ValueType::Grouping { key, .. } => *key,
                _ => ValueType::Object,
            },
            Expr::Sequence(op) => op.ty(),
        }
    }

    pub fn convert(self, ty: ValueType) -> Expr {
        Expr::Convert {
            operand: Box::new(self),
            ty,
        }
    }

    /// Component `index` of a tuple-typed expression, typed from the tuple type.
    pub fn tuple_item(self, index: usize) -> Expr {
        let ty = match self.ty() {
            ValueType::Tuple(tuple) => tuple.item(index).cloned().unwrap_or(ValueType::Object),
            _ => ValueType::Object,
        };
        Expr::TupleItem {
            tuple: Box::new(self),
            index,
            ty,
        }
    }

    /// The query source this expression denotes, looking through conversions.
    pub fn as_query_source(&self) -> Option<&QuerySourceRef> {
        match self {
            Expr::QuerySource(source) => Some(source),
            Expr::Convert { operand, .. } => operand.as_query_source(),
            _ => None,
        }
    }
}

impl SequenceOp {
    pub fn ty(&self) -> ValueType {
        match self {
            SequenceOp::Cast { element, .. } => ValueType::sequence_of(element.clone()),
            SequenceOp::GroupBy { key, value, .. } => ValueType::sequence_of(ValueType::Grouping {
                key: Box::new(key.return_type()),
                element: Box::new(value.return_type()),
            }),
            SequenceOp::Select { selector, .. } => ValueType::sequence_of(selector.return_type()),
            SequenceOp::ToArray { source } => {
                let element = source.ty().element_type().cloned().unwrap_or(ValueType::Object);
                ValueType::list_of(element)
            }
            SequenceOp::NewCollection { kind, element, .. } => ValueType::Collection {
                kind: *kind,
                element: Box::new(element.clone()),
            },
        }
    }
}
