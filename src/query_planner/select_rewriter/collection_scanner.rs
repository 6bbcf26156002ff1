//! Collection-reference scanning.
//!
//! Finds member accesses rooted directly at a query source whose declared
//! type is a collection, e.g. `customer.OrderSet`. Text-typed members
//! (`customer.Name`) are never reported. Duplicates are reported as often
//! as they occur; de-duplication is up to the caller.

use crate::query_planner::logical_expr::{
    visitors::{walk_expression, ExpressionVisitor},
    Expr, MemberAccess, QuerySourceRef,
};

/// A collection property together with the query source that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionReference {
    pub owner: QuerySourceRef,
    pub member: MemberAccess,
}

#[derive(Default)]
pub struct CollectionReferenceScanner {
    pub references: Vec<CollectionReference>,
}

impl CollectionReferenceScanner {
    /// Collect every source-rooted collection reference in `expr`, in walk order.
    pub fn scan(expr: &Expr) -> Vec<CollectionReference> {
        let mut scanner = Self::default();
        walk_expression(expr, &mut scanner);
        scanner.references
    }
}

impl ExpressionVisitor for CollectionReferenceScanner {
    type Output = ();

    fn visit_member_access(&mut self, member: &MemberAccess) {
        if !member.ty.is_collection() {
            return;
        }
        if let Expr::QuerySource(owner) = member.target.as_ref() {
            log::trace!(
                "CollectionReferenceScanner: {}.{} owned by source #{}",
                owner.name,
                member.member,
                owner.id.0
            );
            self.references.push(CollectionReference {
                owner: owner.clone(),
                member: member.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_planner::logical_expr::{Literal, Parameter, ValueType};

    fn orders() -> ValueType {
        ValueType::set_of(ValueType::entity("Order"))
    }

    #[test]
    fn test_finds_collection_member_on_source() {
        let customer = QuerySourceRef::new("customer", "Customer");
        let expr = customer.member("OrderSet", orders());

        let refs = CollectionReferenceScanner::scan(&expr);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].owner, customer);
        assert_eq!(refs[0].member.member, "OrderSet");
    }

    #[test]
    fn test_ignores_text_members() {
        let customer = QuerySourceRef::new("customer", "Customer");
        let expr = customer.member("Name", ValueType::Text);
        assert!(CollectionReferenceScanner::scan(&expr).is_empty());
    }

    #[test]
    fn test_ignores_scalar_members_and_bare_sources() {
        let customer = QuerySourceRef::new("customer", "Customer");
        assert!(CollectionReferenceScanner::scan(&customer.member("Age", ValueType::Int)).is_empty());
        assert!(CollectionReferenceScanner::scan(&Expr::QuerySource(customer)).is_empty());
    }

    #[test]
    fn test_collection_not_rooted_at_source_is_ignored() {
        let param = Parameter::new("p", ValueType::entity("Customer"));
        let expr = Expr::Member(MemberAccess {
            target: Box::new(param.to_expr()),
            member: "OrderSet".to_string(),
            ty: orders(),
        });
        assert!(CollectionReferenceScanner::scan(&expr).is_empty());
    }

    #[test]
    fn test_nested_member_access_is_walked() {
        // customer.OrderSet.Count
        let customer = QuerySourceRef::new("customer", "Customer");
        let expr = Expr::Member(MemberAccess {
            target: Box::new(customer.member("OrderSet", orders())),
            member: "Count".to_string(),
            ty: ValueType::Int,
        });

        let refs = CollectionReferenceScanner::scan(&expr);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].member.member, "OrderSet");
    }

    #[test]
    fn test_walks_through_conversions() {
        let customer = QuerySourceRef::new("customer", "Customer");
        let expr = customer.member("OrderList", ValueType::list_of(ValueType::entity("Order")))
            .convert(ValueType::Object);
        assert_eq!(CollectionReferenceScanner::scan(&expr).len(), 1);
    }

    #[test]
    fn test_unknown_nodes_pass_through() {
        let expr = Expr::Literal(Literal::Text("abc".to_string()));
        assert!(CollectionReferenceScanner::scan(&expr).is_empty());
    }
}
