//! Synthesis of the post-processing transform.
//!
//! The transform is an expression program over the flat row sequence:
//!
//! ```text
//! rows.Cast<Tuple<..>>()
//!     .GroupBy(item => <non-collection positions>, item => <collection positions>)
//!     .Select(g => <original projection rebuilt from g.Key and g>)
//!     .ToArray()
//! ```
//!
//! A one-position key or value is used bare; two or more positions are
//! packed into a tuple.

use serde::{Deserialize, Serialize};

use crate::query_planner::logical_expr::{
    Expr, Lambda, Parameter, SequenceOp, TupleExpr, TupleType, ValueType,
};

use super::{
    errors::{RewriteError, RewriteResult},
    materializer::CollectionMaterializer,
    projection_shape::ProjectionShape,
    tuple_layout::TupleLayout,
};

/// Name of the per-row lambda parameter used by key and value selectors.
const ITEM_PARAMETER: &str = "item";
/// Name of the per-group lambda parameter used by the result selector.
const GROUP_PARAMETER: &str = "g";
const VALUE_PARAMETER: &str = "v";

/// Program that regroups flat rows into one result per distinct key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostProcessTransform {
    /// The flat row sequence the program is applied to.
    pub rows: Parameter,
    pub body: Expr,
}

impl PostProcessTransform {
    /// Type of one regrouped output row.
    pub fn output_element_type(&self) -> ValueType {
        self.body
            .ty()
            .element_type()
            .cloned()
            .unwrap_or(ValueType::Object)
    }
}

impl std::fmt::Display for PostProcessTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} => {}", self.rows.name, self.body)
    }
}

pub(crate) struct ListTransformerBuilder<'a> {
    pub shape: &'a ProjectionShape,
    pub layout: &'a TupleLayout,
    pub materializer: &'a dyn CollectionMaterializer,
    pub rows_parameter: &'a str,
}

impl ListTransformerBuilder<'_> {
    pub fn build(&self, row_type: &TupleType) -> RewriteResult<PostProcessTransform> {
        if row_type.arity() != self.layout.arity() {
            return Err(RewriteError::invalid_shape(
                format!("row tuple of arity {}", self.layout.arity()),
                row_type,
            ));
        }

        let rows = Parameter::new(
            self.rows_parameter,
            ValueType::sequence_of(ValueType::Object),
        );
        let cast = Expr::Sequence(SequenceOp::Cast {
            source: Box::new(rows.to_expr()),
            element: ValueType::Tuple(row_type.clone()),
        });

        let item = Parameter::new(ITEM_PARAMETER, ValueType::Tuple(row_type.clone()));

        let key_positions = self.layout.key_positions();
        if key_positions.is_empty() {
            return Err(RewriteError::invalid_shape(
                "at least one grouping key position",
                "only collection positions",
            ));
        }
        let key_selector = Lambda::new(item.clone(), select_positions(&item, &key_positions)?);
        let value_selector = Lambda::new(
            item.clone(),
            select_positions(&item, &self.layout.injected_indices())?,
        );

        let group_by = Expr::Sequence(SequenceOp::GroupBy {
            source: Box::new(cast),
            key: key_selector,
            value: value_selector,
        });

        let group = Parameter::new(
            GROUP_PARAMETER,
            group_by
                .ty()
                .element_type()
                .cloned()
                .unwrap_or(ValueType::Object),
        );
        let result_selector = Lambda::new(group.clone(), self.result_selector(&group, &key_positions)?);

        let select = Expr::Sequence(SequenceOp::Select {
            source: Box::new(group_by),
            selector: result_selector,
        });

        Ok(PostProcessTransform {
            rows,
            body: Expr::Sequence(SequenceOp::ToArray {
                source: Box::new(select),
            }),
        })
    }

    /// `g => new Shape(g.Key.., new Set<T>(g..))`: one output row per group.
    fn result_selector(&self, group: &Parameter, key_positions: &[usize]) -> RewriteResult<Expr> {
        let ValueType::Grouping { element, .. } = &group.ty else {
            return Err(RewriteError::invalid_shape("grouping parameter", &group.ty));
        };

        let key = Expr::GroupKey(Box::new(group.to_expr()));
        let value_count = self.layout.collection_slots().len();

        let mut fields = Vec::with_capacity(self.shape.arity());
        for field in 0..self.shape.arity() {
            let position = self.layout.position_of_field(field);

            if let Some(slot) = self.layout.slot_at(position) {
                let rank = self
                    .layout
                    .collection_slots()
                    .iter()
                    .position(|s| s.position == position)
                    .unwrap_or_default();

                let values = if value_count == 1 {
                    group.to_expr()
                } else {
                    let v = Parameter::new(VALUE_PARAMETER, (**element).clone());
                    Expr::Sequence(SequenceOp::Select {
                        source: Box::new(group.to_expr()),
                        selector: Lambda::new(v.clone(), v.to_expr().tuple_item(rank)),
                    })
                };

                fields.push(Expr::Sequence(SequenceOp::NewCollection {
                    kind: self.materializer.concrete_kind(&slot.declared),
                    element: slot.element.clone(),
                    source: Box::new(Expr::Sequence(SequenceOp::ToArray {
                        source: Box::new(values),
                    })),
                }));
            } else {
                let rank = key_positions
                    .iter()
                    .position(|p| *p == position)
                    .ok_or_else(|| {
                        RewriteError::invalid_shape(
                            format!("key component for tuple position {}", position),
                            "no such key position",
                        )
                    })?;
                fields.push(if key_positions.len() == 1 {
                    key.clone()
                } else {
                    key.clone().tuple_item(rank)
                });
            }
        }

        self.shape.rebuild(fields)
    }
}

/// `item.ItemN` for a single position, otherwise a tuple of the positions.
fn select_positions(item: &Parameter, positions: &[usize]) -> RewriteResult<Expr> {
    match positions {
        [position] => Ok(item.to_expr().tuple_item(*position)),
        _ => {
            let items = positions
                .iter()
                .map(|p| item.to_expr().tuple_item(*p))
                .collect();
            Ok(Expr::Tuple(TupleExpr::from_items(items)?))
        }
    }
}
