//! Projection AST to expression lowering
//!
//! Resolves the names in a parsed projection against the declared query
//! sources and the entity catalog, producing a fully typed [`Expr`].

use std::str::FromStr;

use crate::{
    entity_catalog::EntityCatalog,
    projection_parser::ast::{PathExpr, ProjectionAst},
};

use super::{
    errors::ConversionError, Expr, MemberAccess, MemberBinding, MemberInit, NewRecord,
    QuerySourceRef, RecordMember, RecordType, ValueType,
};

/// A `name:Entity` source declaration, as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDeclaration {
    pub name: String,
    pub entity: String,
}

impl FromStr for SourceDeclaration {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((name, entity)) if !name.trim().is_empty() && !entity.trim().is_empty() => {
                Ok(SourceDeclaration {
                    name: name.trim().to_string(),
                    entity: entity.trim().to_string(),
                })
            }
            _ => Err(ConversionError::InvalidSourceDeclaration(s.to_string())),
        }
    }
}

/// The query sources in scope for a projection.
#[derive(Debug, Clone, Default)]
pub struct SourceScope {
    sources: Vec<QuerySourceRef>,
}

impl SourceScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a source iterating `entity`; each declaration gets its own identity.
    pub fn declare(
        &mut self,
        declaration: &SourceDeclaration,
        catalog: &EntityCatalog,
    ) -> Result<QuerySourceRef, ConversionError> {
        if self.get(&declaration.name).is_some() {
            return Err(ConversionError::DuplicateSource {
                name: declaration.name.clone(),
            });
        }
        catalog.entity(&declaration.entity)?;

        let source = QuerySourceRef::new(declaration.name.clone(), declaration.entity.clone());
        log::debug!(
            "SourceScope: declared {} as {} (id {})",
            source.name,
            source.item_type,
            source.id.0
        );
        self.sources.push(source.clone());
        Ok(source)
    }

    pub fn get(&self, name: &str) -> Option<&QuerySourceRef> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn sources(&self) -> &[QuerySourceRef] {
        &self.sources
    }
}

/// Lower a parsed projection to a typed expression.
pub fn lower_projection(
    ast: &ProjectionAst<'_>,
    catalog: &EntityCatalog,
    scope: &SourceScope,
) -> Result<Expr, ConversionError> {
    match ast {
        ProjectionAst::Path(path) => lower_path(path, catalog, scope),

        ProjectionAst::Anonymous(fields) => {
            let mut members = Vec::with_capacity(fields.len());
            let mut args = Vec::with_capacity(fields.len());
            for field in fields {
                let expr = lower_path(&field.expr, catalog, scope)?;
                push_member(&mut members, field.member_name(), expr.ty())?;
                args.push(expr);
            }
            Ok(Expr::New(NewRecord {
                ty: RecordType::anonymous(members),
                args,
            }))
        }

        ProjectionAst::Constructor { type_name, args } => {
            let (members, args) = lower_positional(args, catalog, scope)?;
            Ok(Expr::New(NewRecord {
                ty: RecordType::named(*type_name, members),
                args,
            }))
        }

        ProjectionAst::MemberInit {
            type_name,
            ctor_args,
            bindings,
        } => {
            let (mut members, ctor_args) = lower_positional(ctor_args, catalog, scope)?;
            let mut lowered = Vec::with_capacity(bindings.len());
            for binding in bindings {
                let expr = lower_path(&binding.expr, catalog, scope)?;
                push_member(&mut members, binding.member, expr.ty())?;
                lowered.push(MemberBinding {
                    member: binding.member.to_string(),
                    expr,
                });
            }
            Ok(Expr::MemberInit(MemberInit {
                ty: RecordType::named(*type_name, members),
                ctor_args,
                bindings: lowered,
            }))
        }
    }
}

fn lower_positional(
    args: &[PathExpr<'_>],
    catalog: &EntityCatalog,
    scope: &SourceScope,
) -> Result<(Vec<RecordMember>, Vec<Expr>), ConversionError> {
    let mut members = Vec::with_capacity(args.len());
    let mut lowered = Vec::with_capacity(args.len());
    for arg in args {
        let expr = lower_path(arg, catalog, scope)?;
        push_member(&mut members, arg.default_name(), expr.ty())?;
        lowered.push(expr);
    }
    Ok((members, lowered))
}

fn push_member(
    members: &mut Vec<RecordMember>,
    name: &str,
    ty: ValueType,
) -> Result<(), ConversionError> {
    if members.iter().any(|m| m.name == name) {
        return Err(ConversionError::DuplicateMember {
            member: name.to_string(),
        });
    }
    members.push(RecordMember::new(name, ty));
    Ok(())
}

fn lower_path(
    path: &PathExpr<'_>,
    catalog: &EntityCatalog,
    scope: &SourceScope,
) -> Result<Expr, ConversionError> {
    let source = scope
        .get(path.root)
        .ok_or_else(|| ConversionError::UnknownSource {
            name: path.root.to_string(),
        })?;

    let mut expr = Expr::QuerySource(source.clone());
    for member in &path.members {
        let ty = match expr.ty() {
            ValueType::Entity(entity) => catalog.property_type(&entity, member)?,
            other => {
                return Err(ConversionError::NotAnEntity {
                    member: member.to_string(),
                    ty: other.to_string(),
                })
            }
        };
        expr = Expr::Member(MemberAccess {
            target: Box::new(expr),
            member: member.to_string(),
            ty,
        });
    }
    Ok(expr)
}
