//! Projection planning.
//!
//! Turns a projection (typed expression or projection text) into the
//! projection to execute plus the optional post-processing transform that
//! regroups the executed rows.

use crate::{
    config::RewriterConfig,
    entity_catalog::EntityCatalog,
    projection_parser::parse_projection,
};

use logical_expr::{
    ast_conversion::{lower_projection, SourceScope},
    Expr, Parameter, ValueType,
};
use select_rewriter::{errors::RewriteResult, ProjectionRewriter, RewrittenProjection};

pub mod errors;
pub mod logical_expr;
pub mod select_rewriter;

pub use errors::QueryPlannerError;

/// Rewrite `shape` with the caller embedding the pre-processed tuple as is,
/// so the post-process input is the pre-process output.
pub fn rewrite_projection(
    shape: Expr,
    input: Parameter,
    config: &RewriterConfig,
) -> RewriteResult<RewrittenProjection> {
    let pre = ProjectionRewriter::new(input)
        .with_rows_parameter(config.rows_parameter.clone())
        .with_materializer(config.collection_policy)
        .pre_process(shape)?;
    let expression = pre.expression().clone();
    pre.post_process(expression)
}

/// Like [`rewrite_projection`] with the configured input parameter. If
/// `fallback_on_unsupported` is set, projections whose collections belong to
/// several sources are returned unchanged with no transform.
pub fn plan_projection(shape: Expr, config: &RewriterConfig) -> RewriteResult<RewrittenProjection> {
    let input = Parameter::new(config.input_parameter.clone(), ValueType::Object);
    match rewrite_projection(shape.clone(), input, config) {
        Err(err) if err.is_fallback_signal() && config.fallback_on_unsupported => {
            log::warn!("{}; executing {} without rewriting", err, shape);
            Ok(RewrittenProjection::unchanged(shape))
        }
        result => result,
    }
}

/// Parse projection text, resolve it against `catalog` and `scope`, and plan it.
pub fn plan_projection_text(
    text: &str,
    catalog: &EntityCatalog,
    scope: &SourceScope,
    config: &RewriterConfig,
) -> Result<RewrittenProjection, QueryPlannerError> {
    let ast = parse_projection(text).map_err(|e| QueryPlannerError::Parse(e.to_string()))?;
    let shape = lower_projection(&ast, catalog, scope)?;
    log::debug!("Planning projection {}", shape);
    Ok(plan_projection(shape, config)?)
}
