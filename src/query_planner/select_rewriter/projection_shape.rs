//! Classification of a projection into its top-level fields.
//!
//! Every supported shape is linearised into an ordered field list. For
//! member initialisation the constructor arguments come first, followed by
//! the member bindings in declaration order. The shape kind is kept so the
//! original projection can be rebuilt from replacement fields later.

use crate::query_planner::logical_expr::{
    Expr, MemberBinding, MemberInit, NewRecord, RecordType, ValueType,
};

use super::errors::{RewriteError, RewriteResult};

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// A bare member access; the projection has exactly one field.
    Member,
    /// Positional construction of `RecordType`.
    New(RecordType),
    /// Member initialisation; the first `ctor_len` fields are constructor
    /// arguments, the remaining ones bind `binding_members` in order.
    MemberInit {
        ty: RecordType,
        ctor_len: usize,
        binding_members: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionShape {
    kind: ShapeKind,
    fields: Vec<Expr>,
    result_type: ValueType,
}

impl ProjectionShape {
    /// Classify `expr`, or `None` when it is not a rewritable projection shape.
    pub fn classify(expr: &Expr) -> Option<Self> {
        match expr {
            Expr::Member(_) => Some(Self {
                kind: ShapeKind::Member,
                fields: vec![expr.clone()],
                result_type: expr.ty(),
            }),
            Expr::New(new) => Some(Self {
                kind: ShapeKind::New(new.ty.clone()),
                fields: new.args.clone(),
                result_type: expr.ty(),
            }),
            Expr::MemberInit(init) => {
                let mut fields = init.ctor_args.clone();
                fields.extend(init.bindings.iter().map(|b| b.expr.clone()));
                Some(Self {
                    kind: ShapeKind::MemberInit {
                        ty: init.ty.clone(),
                        ctor_len: init.ctor_args.len(),
                        binding_members: init.bindings.iter().map(|b| b.member.clone()).collect(),
                    },
                    fields,
                    result_type: expr.ty(),
                })
            }
            _ => None,
        }
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    pub fn fields(&self) -> &[Expr] {
        &self.fields
    }

    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    /// Type of one output row of the original projection.
    pub fn result_type(&self) -> &ValueType {
        &self.result_type
    }

    /// Rebuild a projection of the same kind with `fields` in place of the originals.
    pub fn rebuild(&self, fields: Vec<Expr>) -> RewriteResult<Expr> {
        if fields.len() != self.arity() {
            return Err(RewriteError::invalid_shape(
                format!("{} projection fields", self.arity()),
                format!("{} fields", fields.len()),
            ));
        }

        match &self.kind {
            ShapeKind::Member => Ok(fields.into_iter().next().ok_or_else(|| {
                RewriteError::invalid_shape("one projection field", "none")
            })?),
            ShapeKind::New(ty) => Ok(Expr::New(NewRecord {
                ty: ty.clone(),
                args: fields,
            })),
            ShapeKind::MemberInit {
                ty,
                ctor_len,
                binding_members,
            } => {
                let mut fields = fields;
                let bound = fields.split_off(*ctor_len);
                let bindings = binding_members
                    .iter()
                    .zip(bound)
                    .map(|(member, expr)| MemberBinding {
                        member: member.clone(),
                        expr,
                    })
                    .collect();
                Ok(Expr::MemberInit(MemberInit {
                    ty: ty.clone(),
                    ctor_args: fields,
                    bindings,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_planner::logical_expr::{Literal, QuerySourceRef, RecordMember};

    #[test]
    fn test_member_init_linearises_ctor_args_first() {
        let customer = QuerySourceRef::new("customer", "Customer");
        let ty = RecordType::named(
            "Wrapper",
            vec![
                RecordMember::new("Owner", customer.ty()),
                RecordMember::new("Name", ValueType::Text),
            ],
        );
        let expr = Expr::MemberInit(MemberInit {
            ty,
            ctor_args: vec![Expr::QuerySource(customer.clone())],
            bindings: vec![MemberBinding {
                member: "Name".to_string(),
                expr: customer.member("Name", ValueType::Text),
            }],
        });

        let shape = ProjectionShape::classify(&expr).unwrap();
        assert_eq!(shape.arity(), 2);
        assert_eq!(shape.fields()[0], Expr::QuerySource(customer));

        let rebuilt = shape.rebuild(shape.fields().to_vec()).unwrap();
        assert_eq!(rebuilt, expr);
    }

    #[test]
    fn test_unsupported_shapes_are_not_classified() {
        assert!(ProjectionShape::classify(&Expr::Literal(Literal::Int(1))).is_none());
        let customer = QuerySourceRef::new("customer", "Customer");
        assert!(ProjectionShape::classify(&Expr::QuerySource(customer)).is_none());
    }

    #[test]
    fn test_rebuild_rejects_wrong_field_count() {
        let customer = QuerySourceRef::new("customer", "Customer");
        let shape = ProjectionShape::classify(&customer.member("Age", ValueType::Int)).unwrap();
        let err = shape.rebuild(vec![]).unwrap_err();
        assert!(matches!(err, RewriteError::InvalidShape { .. }));
    }
}
