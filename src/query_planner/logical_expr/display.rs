use std::fmt;

use super::{Expr, Lambda, Literal, SequenceOp};

fn join(items: &[Expr]) -> String {
    items
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.param.name, self.body)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::QuerySource(source) => write!(f, "{}", source.name),
            Expr::Member(member) => write!(f, "{}.{}", member.target, member.member),
            Expr::New(new) => match &new.ty.name {
                Some(name) => write!(f, "new {}({})", name, join(&new.args)),
                None => {
                    let fields = new
                        .ty
                        .members
                        .iter()
                        .zip(&new.args)
                        .map(|(m, a)| format!("{} = {}", m.name, a))
                        .collect::<Vec<_>>()
                        .join(", ");
                    write!(f, "new {{ {} }}", fields)
                }
            },
            Expr::MemberInit(init) => {
                let name = init.ty.name.as_deref().unwrap_or("");
                let bindings = init
                    .bindings
                    .iter()
                    .map(|b| format!("{} = {}", b.member, b.expr))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "new {}({}) {{ {} }}", name, join(&init.ctor_args), bindings)
            }
            Expr::Parameter(param) => write!(f, "{}", param.name),
            Expr::Literal(literal) => write!(f, "{}", literal),
            Expr::Convert { operand, ty } => write!(f, "Convert({}, {})", operand, ty),
            Expr::RowIndex { row, index } => write!(f, "{}[{}]", row, index),
            Expr::TupleItem { tuple, index, .. } => write!(f, "{}.Item{}", tuple, index + 1),
            Expr::Tuple(tuple) => write!(f, "new {}({})", tuple.ty, join(&tuple.items)),
            Expr::GroupKey(group) => write!(f, "{}.Key", group),
            Expr::Sequence(op) => write!(f, "{}", op),
        }
    }
}

impl fmt::Display for SequenceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceOp::Cast { source, element } => write!(f, "{}.Cast<{}>()", source, element),
            SequenceOp::GroupBy { source, key, value } => {
                write!(f, "{}.GroupBy({}, {})", source, key, value)
            }
            SequenceOp::Select { source, selector } => write!(f, "{}.Select({})", source, selector),
            SequenceOp::ToArray { source } => write!(f, "{}.ToArray()", source),
            SequenceOp::NewCollection {
                kind,
                element,
                source,
            } => write!(f, "new {}<{}>({})", kind, element, source),
        }
    }
}
