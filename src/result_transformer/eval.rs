//! Interpreter for expression programs over executed rows.

use crate::query_planner::logical_expr::{
    CollectionKind, Expr, Lambda, MemberInit, NewRecord, SequenceOp, ValueType,
};

use super::{
    errors::{EvalError, EvalResult},
    value::Value,
};

/// Parameter bindings visible while evaluating; later bindings shadow earlier ones.
#[derive(Debug, Default)]
pub struct Scope {
    bindings: Vec<(String, Value)>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.push((name.into(), value));
    }

    fn unbind(&mut self) {
        self.bindings.pop();
    }

    fn lookup(&self, name: &str) -> EvalResult<Value> {
        self.bindings
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| EvalError::UnboundParameter(name.to_string()))
    }
}

pub fn evaluate(expr: &Expr, scope: &mut Scope) -> EvalResult<Value> {
    match expr {
        Expr::QuerySource(source) => scope.lookup(&source.name),

        Expr::Parameter(param) => scope.lookup(&param.name),

        Expr::Literal(literal) => Ok(Value::from(literal)),

        Expr::Member(member) => {
            let target = evaluate(&member.target, scope)?;
            target
                .field(&member.member)
                .cloned()
                .ok_or(EvalError::MissingMember {
                    member: member.member.clone(),
                    found: target.kind_name(),
                })
        }

        Expr::New(NewRecord { ty, args }) => {
            let mut fields = Vec::with_capacity(args.len());
            for (member, arg) in ty.members.iter().zip(args) {
                fields.push((member.name.clone(), evaluate(arg, scope)?));
            }
            Ok(Value::Record {
                type_name: ty.name.clone(),
                fields,
            })
        }

        Expr::MemberInit(MemberInit {
            ty,
            ctor_args,
            bindings,
        }) => {
            let mut fields = Vec::with_capacity(ctor_args.len() + bindings.len());
            for (member, arg) in ty.members.iter().zip(ctor_args) {
                fields.push((member.name.clone(), evaluate(arg, scope)?));
            }
            for binding in bindings {
                fields.push((binding.member.clone(), evaluate(&binding.expr, scope)?));
            }
            Ok(Value::Record {
                type_name: ty.name.clone(),
                fields,
            })
        }

        Expr::Convert { operand, ty } => {
            let value = evaluate(operand, scope)?;
            if value.conforms_to(ty) {
                Ok(value)
            } else {
                Err(EvalError::InvalidCast {
                    expected: ty.to_string(),
                    found: value.kind_name().to_string(),
                })
            }
        }

        Expr::RowIndex { row, index } | Expr::TupleItem {
            tuple: row, index, ..
        } => {
            let row = evaluate(row, scope)?;
            let cells = match &row {
                Value::Tuple(cells) | Value::List(cells) => cells,
                other => {
                    return Err(EvalError::NotATuple {
                        found: other.kind_name(),
                    })
                }
            };
            cells
                .get(*index)
                .cloned()
                .ok_or(EvalError::IndexOutOfRange {
                    index: *index,
                    len: cells.len(),
                })
        }

        Expr::Tuple(tuple) => {
            let items = tuple
                .items
                .iter()
                .map(|item| evaluate(item, scope))
                .collect::<EvalResult<Vec<_>>>()?;
            Ok(Value::Tuple(items))
        }

        Expr::GroupKey(group) => match evaluate(group, scope)? {
            Value::Group { key, .. } => Ok(*key),
            other => Err(EvalError::NotAGroup {
                found: other.kind_name(),
            }),
        },

        Expr::Sequence(op) => evaluate_sequence(op, scope),
    }
}

fn evaluate_sequence(op: &SequenceOp, scope: &mut Scope) -> EvalResult<Value> {
    match op {
        SequenceOp::Cast { source, element } => {
            let items = into_items(evaluate(source, scope)?)?;
            let cast = items
                .into_iter()
                .map(|item| cast_item(item, element))
                .collect::<EvalResult<Vec<_>>>()?;
            Ok(Value::List(cast))
        }

        SequenceOp::GroupBy { source, key, value } => {
            let items = into_items(evaluate(source, scope)?)?;
            let mut groups: Vec<(Value, Vec<Value>)> = Vec::new();
            for item in items {
                let k = apply_lambda(key, item.clone(), scope)?;
                let v = apply_lambda(value, item, scope)?;
                match groups.iter_mut().find(|(existing, _)| *existing == k) {
                    Some((_, values)) => values.push(v),
                    None => groups.push((k, vec![v])),
                }
            }
            Ok(Value::List(
                groups
                    .into_iter()
                    .map(|(key, values)| Value::Group {
                        key: Box::new(key),
                        values,
                    })
                    .collect(),
            ))
        }

        SequenceOp::Select { source, selector } => {
            let items = into_items(evaluate(source, scope)?)?;
            let selected = items
                .into_iter()
                .map(|item| apply_lambda(selector, item, scope))
                .collect::<EvalResult<Vec<_>>>()?;
            Ok(Value::List(selected))
        }

        SequenceOp::ToArray { source } => Ok(Value::List(into_items(evaluate(source, scope)?)?)),

        SequenceOp::NewCollection { kind, source, .. } => {
            // Owner rows without a collection element carry null in that slot.
            let items: Vec<Value> = into_items(evaluate(source, scope)?)?
                .into_iter()
                .filter(|item| !item.is_null())
                .collect();
            Ok(match kind {
                CollectionKind::Set => Value::set_from(items),
                CollectionKind::List => Value::List(items),
            })
        }
    }
}

fn apply_lambda(lambda: &Lambda, argument: Value, scope: &mut Scope) -> EvalResult<Value> {
    scope.bind(lambda.param.name.clone(), argument);
    let result = evaluate(&lambda.body, scope);
    scope.unbind();
    result
}

fn into_items(value: Value) -> EvalResult<Vec<Value>> {
    match value {
        Value::List(items) | Value::Set(items) => Ok(items),
        Value::Group { values, .. } => Ok(values),
        other => Err(EvalError::NotASequence {
            found: other.kind_name(),
        }),
    }
}

fn cast_item(item: Value, element: &ValueType) -> EvalResult<Value> {
    // Rows arrive from the execution engine as plain cell lists.
    let item = match (item, element) {
        (Value::List(cells), ValueType::Tuple(_)) => Value::Tuple(cells),
        (item, _) => item,
    };
    if item.conforms_to(element) {
        Ok(item)
    } else {
        Err(EvalError::InvalidCast {
            expected: element.to_string(),
            found: item.kind_name().to_string(),
        })
    }
}
