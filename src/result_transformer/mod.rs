//! Result Transformer
//!
//! Applies post-processing programs to the flat rows an executed query
//! returns. This is the caller side of a rewrite: the execution engine hands
//! over rows shaped like the rewritten tuple, and the transform produced by
//! the rewriter turns them back into one result per projection row.

pub mod errors;
pub mod eval;
pub mod value;

use crate::query_planner::select_rewriter::list_transformer::PostProcessTransform;

use errors::{EvalError, EvalResult};
use eval::{evaluate, Scope};
use value::Value;

/// Run `transform` once over `rows` and return the regrouped results.
pub fn apply_transform(transform: &PostProcessTransform, rows: Vec<Value>) -> EvalResult<Vec<Value>> {
    log::debug!(
        "Applying post-processing transform to {} rows",
        rows.len()
    );
    let mut scope = Scope::new();
    scope.bind(transform.rows.name.clone(), Value::List(rows));
    match evaluate(&transform.body, &mut scope)? {
        Value::List(results) | Value::Set(results) => Ok(results),
        other => Err(EvalError::NotASequence {
            found: other.kind_name(),
        }),
    }
}

/// Convert a JSON document of rows (an array of arrays) into row values.
pub fn rows_from_json(json: serde_json::Value) -> EvalResult<Vec<Value>> {
    match Value::from(json) {
        Value::List(rows) => Ok(rows
            .into_iter()
            .map(|row| match row {
                Value::List(cells) => Value::Tuple(cells),
                other => other,
            })
            .collect()),
        other => Err(EvalError::NotASequence {
            found: other.kind_name(),
        }),
    }
}
