//! Expression Visitor Pattern
//!
//! Traversal over projection-shape subtrees. The walk follows the nodes a
//! projection field is built from (member access chains and conversions)
//! and hands every other node to [`ExpressionVisitor::visit_leaf`] without
//! descending into it. Unknown node kinds are therefore passed through,
//! never rejected.
//!
//! # Example
//!
//! ```ignore
//! struct MemberNames(Vec<String>);
//!
//! impl ExpressionVisitor for MemberNames {
//!     type Output = ();
//!     fn visit_member_access(&mut self, member: &MemberAccess) {
//!         self.0.push(member.member.clone());
//!     }
//! }
//! ```

use super::{Expr, MemberAccess, QuerySourceRef};

pub trait ExpressionVisitor {
    type Output: Default;

    /// Called for each member access, before its target is walked.
    fn visit_member_access(&mut self, _member: &MemberAccess) -> Self::Output {
        Self::Output::default()
    }

    /// Called for bare query source references (e.g. `customer`).
    fn visit_query_source(&mut self, _source: &QuerySourceRef) -> Self::Output {
        Self::Output::default()
    }

    /// Called for every node the walk does not descend into.
    fn visit_leaf(&mut self, _expr: &Expr) -> Self::Output {
        Self::Output::default()
    }
}

/// Walk a projection-shape subtree, calling visitor methods for each node.
pub fn walk_expression<V: ExpressionVisitor>(expr: &Expr, visitor: &mut V) -> V::Output {
    match expr {
        Expr::Member(member) => {
            let result = visitor.visit_member_access(member);
            walk_expression(&member.target, visitor);
            result
        }

        Expr::Convert { operand, .. } => walk_expression(operand, visitor),

        Expr::QuerySource(source) => visitor.visit_query_source(source),

        Expr::New(_)
        | Expr::MemberInit(_)
        | Expr::Parameter(_)
        | Expr::Literal(_)
        | Expr::RowIndex { .. }
        | Expr::TupleItem { .. }
        | Expr::Tuple(_)
        | Expr::GroupKey(_)
        | Expr::Sequence(_) => visitor.visit_leaf(expr),
    }
}
