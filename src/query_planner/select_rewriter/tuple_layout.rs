//! Argument layout of a rewritten projection tuple.
//!
//! Positions are carried explicitly from the rewrite through transform
//! synthesis: original field `i` lives at tuple position `i + offset`, where
//! the offset is 1 when the collection owner was injected at position 0.

use crate::query_planner::logical_expr::{QuerySourceRef, ValueType};

#[derive(Debug, Clone, PartialEq)]
pub enum OwnerKey {
    /// The owner was not a projection field; it occupies tuple position 0.
    Injected(QuerySourceRef),
    /// The owner already is the projection field at this tuple position.
    Field {
        source: QuerySourceRef,
        position: usize,
    },
}

impl OwnerKey {
    pub fn source(&self) -> &QuerySourceRef {
        match self {
            OwnerKey::Injected(source) | OwnerKey::Field { source, .. } => source,
        }
    }

    pub fn position(&self) -> usize {
        match self {
            OwnerKey::Injected(_) => 0,
            OwnerKey::Field { position, .. } => *position,
        }
    }
}

/// A collection field of the original projection, in final tuple numbering.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSlot {
    pub position: usize,
    /// Declared type of the field, e.g. `Set<Order>`.
    pub declared: ValueType,
    /// Element type carried by each flat row, e.g. `Order`.
    pub element: ValueType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleLayout {
    owner: OwnerKey,
    arity: usize,
    /// Sorted by position.
    slots: Vec<CollectionSlot>,
}

impl TupleLayout {
    pub fn new(owner: OwnerKey, arity: usize, mut slots: Vec<CollectionSlot>) -> Self {
        slots.sort_by_key(|slot| slot.position);
        Self {
            owner,
            arity,
            slots,
        }
    }

    pub fn owner(&self) -> &OwnerKey {
        &self.owner
    }

    pub fn owner_injected(&self) -> bool {
        matches!(self.owner, OwnerKey::Injected(_))
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Number of tuple positions before the first original field.
    pub fn field_offset(&self) -> usize {
        usize::from(self.owner_injected())
    }

    /// Tuple position of original field `field`.
    pub fn position_of_field(&self, field: usize) -> usize {
        field + self.field_offset()
    }

    pub fn collection_slots(&self) -> &[CollectionSlot] {
        &self.slots
    }

    /// The injected-index set: positions of all collection fields.
    pub fn injected_indices(&self) -> Vec<usize> {
        self.slots.iter().map(|slot| slot.position).collect()
    }

    pub fn slot_at(&self, position: usize) -> Option<&CollectionSlot> {
        self.slots.iter().find(|slot| slot.position == position)
    }

    /// Positions that form the grouping key, in tuple order.
    pub fn key_positions(&self) -> Vec<usize> {
        (0..self.arity)
            .filter(|position| self.slot_at(*position).is_none())
            .collect()
    }
}
