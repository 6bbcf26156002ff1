//! Select clause rewriting for collection-valued projections.
//!
//! A projection such as `new { c.Age, c.OrderSet }` cannot be executed
//! directly against a row source that returns one row per order. The
//! rewriter turns it into a fixed-arity tuple that carries the collection
//! owner as an identity column (injected at position 0 if the projection does
//! not already contain it), and synthesises a post-processing program that
//! regroups the flat rows into one result per owner with the collection
//! rebuilt.
//!
//! The API is a two-step typestate so an instance cannot be reused:
//!
//! ```ignore
//! let pre = ProjectionRewriter::new(input).pre_process(shape)?;
//! // caller embeds pre.expression() into the executable query ...
//! let done = pre.post_process(query_projection)?;
//! let rows = done.apply(flat_rows)?;
//! ```

use crate::{
    config::RewriterConfig,
    query_planner::logical_expr::{
        Expr, Parameter, QuerySourceRef, TupleExpr, ValueType, MAX_TUPLE_ARITY,
    },
    result_transformer::{self, errors::EvalError, value::Value},
};

pub mod collection_scanner;
pub mod errors;
pub mod list_transformer;
pub mod materializer;
pub mod projection_shape;
pub mod tuple_layout;


use collection_scanner::CollectionReferenceScanner;
use errors::{RewriteError, RewriteResult};
use list_transformer::{ListTransformerBuilder, PostProcessTransform};
use materializer::{CollectionMaterializer, CollectionPolicy};
use projection_shape::ProjectionShape;
use tuple_layout::{CollectionSlot, OwnerKey, TupleLayout};

/// Most original fields a rewritable projection may have; one tuple
/// position is reserved for a possibly injected owner key.
pub const MAX_PROJECTION_FIELDS: usize = MAX_TUPLE_ARITY - 1;

/// Default name of the flat row sequence parameter of a post-processing transform.
pub const DEFAULT_ROWS_PARAMETER: &str = "rows";

pub struct ProjectionRewriter {
    input: Parameter,
    rows_parameter: String,
    materializer: Box<dyn CollectionMaterializer>,
}

impl ProjectionRewriter {
    /// `input` is the placeholder for one raw row of the executed query.
    pub fn new(input: Parameter) -> Self {
        Self {
            input,
            rows_parameter: DEFAULT_ROWS_PARAMETER.to_string(),
            materializer: Box::new(CollectionPolicy::default()),
        }
    }

    pub fn from_config(config: &RewriterConfig) -> Self {
        Self::new(Parameter::new(
            config.input_parameter.clone(),
            ValueType::Object,
        ))
        .with_rows_parameter(config.rows_parameter.clone())
        .with_materializer(config.collection_policy)
    }

    pub fn with_materializer(mut self, materializer: impl CollectionMaterializer + 'static) -> Self {
        self.materializer = Box::new(materializer);
        self
    }

    pub fn with_rows_parameter(mut self, name: impl Into<String>) -> Self {
        self.rows_parameter = name.into();
        self
    }

    pub fn input(&self) -> &Parameter {
        &self.input
    }

    /// Scan the projection and, if it references an entity-owned collection,
    /// replace it with a tuple carrying the owner key and the original fields.
    pub fn pre_process(self, expr: Expr) -> RewriteResult<PreProcessed> {
        let Some(shape) = ProjectionShape::classify(&expr) else {
            log::debug!("ProjectionRewriter: {} is not a rewritable shape", expr);
            return Ok(PreProcessed::unchanged(self, expr));
        };

        let mut owners: Vec<QuerySourceRef> = Vec::new();
        let mut collection_fields: Vec<(usize, ValueType)> = Vec::new();

        for (field, field_expr) in shape.fields().iter().enumerate() {
            let ty = field_expr.ty();
            if !ty.is_collection() {
                continue;
            }
            let references = CollectionReferenceScanner::scan(field_expr);
            if references.is_empty() {
                continue;
            }
            for reference in references {
                if !owners.contains(&reference.owner) {
                    owners.push(reference.owner);
                }
            }
            collection_fields.push((field, ty));
        }

        if owners.len() > 1 {
            let sources = owners
                .iter()
                .map(|s| format!("{}#{}", s.name, s.id.0))
                .collect::<Vec<_>>();
            log::warn!(
                "ProjectionRewriter: collection fields owned by {} sources, rejecting {}",
                owners.len(),
                expr
            );
            return Err(RewriteError::UnsupportedProjection { sources });
        }

        let Some(owner) = owners.pop() else {
            log::debug!("ProjectionRewriter: no collection fields in {}", expr);
            return Ok(PreProcessed::unchanged(self, expr));
        };

        if shape.arity() > MAX_PROJECTION_FIELDS {
            return Err(RewriteError::UnsupportedArity {
                arity: shape.arity(),
                min: 1,
                max: MAX_PROJECTION_FIELDS,
            });
        }

        let owner_key = match shape
            .fields()
            .iter()
            .position(|f| f.as_query_source() == Some(&owner))
        {
            Some(position) => OwnerKey::Field {
                source: owner,
                position,
            },
            None => OwnerKey::Injected(owner),
        };

        let mut items = Vec::with_capacity(shape.arity() + 1);
        if let OwnerKey::Injected(source) = &owner_key {
            items.push(Expr::QuerySource(source.clone()));
        }
        items.extend(shape.fields().iter().cloned());
        let tuple = TupleExpr::from_items(items)?;

        let offset = usize::from(matches!(owner_key, OwnerKey::Injected(_)));
        let slots = collection_fields
            .into_iter()
            .map(|(field, declared)| CollectionSlot {
                position: field + offset,
                element: declared.element_type().cloned().unwrap_or(ValueType::Object),
                declared,
            })
            .collect();
        let layout = TupleLayout::new(owner_key, tuple.ty.arity(), slots);

        log::debug!(
            "ProjectionRewriter: {} -> {} (owner injected: {}, collection positions: {:?})",
            expr,
            tuple.ty,
            layout.owner_injected(),
            layout.injected_indices()
        );

        Ok(PreProcessed {
            rewriter: self,
            expression: Expr::Tuple(tuple),
            state: Some(RewriteState { shape, layout }),
        })
    }
}

#[derive(Debug, Clone)]
struct RewriteState {
    shape: ProjectionShape,
    layout: TupleLayout,
}

/// Result of [`ProjectionRewriter::pre_process`].
pub struct PreProcessed {
    rewriter: ProjectionRewriter,
    expression: Expr,
    state: Option<RewriteState>,
}

impl PreProcessed {
    fn unchanged(rewriter: ProjectionRewriter, expression: Expr) -> Self {
        Self {
            rewriter,
            expression,
            state: None,
        }
    }

    /// The projection to embed into the executable query.
    pub fn expression(&self) -> &Expr {
        &self.expression
    }

    pub fn is_rewritten(&self) -> bool {
        self.state.is_some()
    }

    pub fn layout(&self) -> Option<&TupleLayout> {
        self.state.as_ref().map(|s| &s.layout)
    }

    /// Tuple positions of the collection fields; empty when nothing was rewritten.
    pub fn injected_indices(&self) -> Vec<usize> {
        self.layout()
            .map(TupleLayout::injected_indices)
            .unwrap_or_default()
    }

    pub fn owner_injected(&self) -> bool {
        self.layout().is_some_and(TupleLayout::owner_injected)
    }

    /// Narrow the collection slots of the constructed tuple to their element
    /// types and synthesise the regrouping transform.
    pub fn post_process(self, expr: Expr) -> RewriteResult<RewrittenProjection> {
        let Some(RewriteState { shape, layout }) = self.state else {
            return Ok(RewrittenProjection {
                expression: expr,
                transform: None,
            });
        };

        let Expr::Tuple(tuple) = expr else {
            return Err(RewriteError::invalid_shape("rewritten projection tuple", expr));
        };
        if tuple.items.len() != layout.arity() {
            return Err(RewriteError::invalid_shape(
                format!("tuple of arity {}", layout.arity()),
                tuple.ty,
            ));
        }

        let input = &self.rewriter.input;
        let mut items = tuple.items;
        for slot in layout.collection_slots() {
            items[slot.position] = Expr::RowIndex {
                row: Box::new(input.to_expr()),
                index: slot.position,
            }
            .convert(slot.element.clone());
        }
        let finalized = TupleExpr::from_items(items)?;

        let transform = ListTransformerBuilder {
            shape: &shape,
            layout: &layout,
            materializer: self.rewriter.materializer.as_ref(),
            rows_parameter: &self.rewriter.rows_parameter,
        }
        .build(&finalized.ty)?;

        log::debug!("ProjectionRewriter: post-processing transform {}", transform);

        Ok(RewrittenProjection {
            expression: Expr::Tuple(finalized),
            transform: Some(transform),
        })
    }
}

/// A finished rewrite: the projection to execute and, if the projection had
/// collection fields, the program that regroups the executed rows.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RewrittenProjection {
    pub expression: Expr,
    pub transform: Option<PostProcessTransform>,
}

impl RewrittenProjection {
    pub fn unchanged(expression: Expr) -> Self {
        Self {
            expression,
            transform: None,
        }
    }

    /// Apply the post-processing transform to executed rows. Without a
    /// transform the rows are returned as they are.
    pub fn apply(&self, rows: Vec<Value>) -> Result<Vec<Value>, EvalError> {
        match &self.transform {
            Some(transform) => result_transformer::apply_transform(transform, rows),
            None => Ok(rows),
        }
    }
}
