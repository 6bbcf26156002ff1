use std::fmt;

/// A dotted member path rooted at a query source: `customer.Address.City`.
#[derive(Debug, PartialEq, Clone)]
pub struct PathExpr<'a> {
    pub root: &'a str,
    pub members: Vec<&'a str>,
}

impl<'a> PathExpr<'a> {
    /// Member name a projection gives this path when none is written:
    /// the last member, or the root for a bare source.
    pub fn default_name(&self) -> &'a str {
        self.members.last().copied().unwrap_or(self.root)
    }
}

impl fmt::Display for PathExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for member in &self.members {
            write!(f, ".{}", member)?;
        }
        Ok(())
    }
}

/// One field of an anonymous projection, `vip = customer.Vip` or just `customer.Vip`.
#[derive(Debug, PartialEq, Clone)]
pub struct ProjectionField<'a> {
    pub name: Option<&'a str>,
    pub expr: PathExpr<'a>,
}

impl<'a> ProjectionField<'a> {
    pub fn member_name(&self) -> &'a str {
        self.name.unwrap_or_else(|| self.expr.default_name())
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct MemberAssignment<'a> {
    pub member: &'a str,
    pub expr: PathExpr<'a>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum ProjectionAst<'a> {
    /// `customer.OrderSet`
    Path(PathExpr<'a>),
    /// `new { customer, customer.OrderSet, vip = customer.Vip }`
    Anonymous(Vec<ProjectionField<'a>>),
    /// `new Wrapper(customer, customer.OrderSet)`
    Constructor {
        type_name: &'a str,
        args: Vec<PathExpr<'a>>,
    },
    /// `new Wrapper(customer) { B = customer.OrderSet }`
    MemberInit {
        type_name: &'a str,
        ctor_args: Vec<PathExpr<'a>>,
        bindings: Vec<MemberAssignment<'a>>,
    },
}
