//! Parser for projection text.
//!
//! Accepted forms:
//!
//! ```text
//! customer.OrderSet
//! new { customer, customer.OrderSet, vip = customer.Vip }
//! new Wrapper(customer, customer.OrderSet)
//! new Wrapper(customer) { B = customer.OrderSet }
//! ```

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, multispace0, satisfy},
    combinator::{cut, map, not, opt},
    error::context,
    multi::{separated_list0, separated_list1},
    sequence::{delimited, terminated},
    IResult, Parser,
};

use ast::{MemberAssignment, ProjectionAst, ProjectionField};
use common::{identifier, is_identifier_char, path, ws};
use errors::ProjectionParseError;

pub mod ast;
mod common;
pub mod errors;

type ParseResult<'a, O> = IResult<&'a str, O, ProjectionParseError<'a>>;

/// Parse a complete projection; trailing input is an error.
pub fn parse_projection(input: &'_ str) -> Result<ProjectionAst<'_>, ProjectionParseError<'_>> {
    match parse_projection_with_nom(input) {
        Ok((remainder, projection)) => {
            if !remainder.trim().is_empty() {
                return Err(ProjectionParseError::new(
                    remainder,
                    "Unexpected tokens after projection",
                ));
            }
            Ok(projection)
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(e),
        Err(nom::Err::Incomplete(_)) => Err(ProjectionParseError::new("", "Incomplete projection")),
    }
}

pub fn parse_projection_with_nom(input: &'_ str) -> ParseResult<'_, ProjectionAst<'_>> {
    let (input, _) = multispace0.parse(input)?;
    context(
        "Expected a member path or a `new` expression",
        alt((new_expression, map(ws(path), ProjectionAst::Path))),
    )
    .parse(input)
}

fn new_keyword(input: &str) -> ParseResult<'_, &str> {
    terminated(tag("new"), not(satisfy(is_identifier_char))).parse(input)
}

fn new_expression(input: &str) -> ParseResult<'_, ProjectionAst<'_>> {
    let (input, _) = ws(new_keyword).parse(input)?;

    // Past `new` the input can only be a construction.
    cut(context(
        "Expected `{` or a type name after `new`",
        alt((anonymous_body, named_body)),
    ))
    .parse(input)
}

fn anonymous_body(input: &str) -> ParseResult<'_, ProjectionAst<'_>> {
    let (input, fields) = delimited(
        ws(char('{')),
        context(
            "Error in anonymous projection fields",
            separated_list1(ws(char(',')), projection_field),
        ),
        context("Expected `}`", cut(ws(char('}')))),
    )
    .parse(input)?;
    Ok((input, ProjectionAst::Anonymous(fields)))
}

fn projection_field(input: &str) -> ParseResult<'_, ProjectionField<'_>> {
    let (input, name) = opt(terminated(ws(identifier), ws(char('=')))).parse(input)?;
    let (input, expr) = if name.is_some() {
        context("Expected a member path after `=`", cut(ws(path))).parse(input)?
    } else {
        ws(path).parse(input)?
    };
    Ok((input, ProjectionField { name, expr }))
}

fn member_assignment(input: &str) -> ParseResult<'_, MemberAssignment<'_>> {
    let (input, member) = ws(identifier).parse(input)?;
    let (input, _) = context("Expected `=` in member binding", cut(ws(char('=')))).parse(input)?;
    let (input, expr) = context("Expected a member path after `=`", cut(ws(path))).parse(input)?;
    Ok((input, MemberAssignment { member, expr }))
}

fn named_body(input: &str) -> ParseResult<'_, ProjectionAst<'_>> {
    let (input, type_name) = ws(identifier).parse(input)?;

    let (input, ctor_args) = opt(delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), ws(path)),
        context("Expected `)`", cut(ws(char(')')))),
    ))
    .parse(input)?;

    let (input, bindings) = opt(delimited(
        ws(char('{')),
        separated_list0(ws(char(',')), member_assignment),
        context("Expected `}`", cut(ws(char('}')))),
    ))
    .parse(input)?;

    let projection = match (ctor_args, bindings) {
        (ctor_args, Some(bindings)) => ProjectionAst::MemberInit {
            type_name,
            ctor_args: ctor_args.unwrap_or_default(),
            bindings,
        },
        (Some(args), None) => ProjectionAst::Constructor { type_name, args },
        (None, None) => {
            return Err(nom::Err::Failure(ProjectionParseError::new(
                input,
                "Expected constructor arguments or member bindings",
            )))
        }
    };
    Ok((input, projection))
}

#[cfg(test)]
mod tests {
    use super::ast::PathExpr;
    use super::*;
    use test_case::test_case;

    fn p<'a>(root: &'a str, members: &[&'a str]) -> PathExpr<'a> {
        PathExpr {
            root,
            members: members.to_vec(),
        }
    }

    #[test]
    fn test_bare_member_access() {
        assert_eq!(
            parse_projection("  customer.OrderSet  "),
            Ok(ProjectionAst::Path(p("customer", &["OrderSet"])))
        );
    }

    #[test]
    fn test_anonymous_projection() {
        assert_eq!(
            parse_projection("new { customer, customer.OrderSet, vip = customer.Vip }"),
            Ok(ProjectionAst::Anonymous(vec![
                ProjectionField {
                    name: None,
                    expr: p("customer", &[]),
                },
                ProjectionField {
                    name: None,
                    expr: p("customer", &["OrderSet"]),
                },
                ProjectionField {
                    name: Some("vip"),
                    expr: p("customer", &["Vip"]),
                },
            ]))
        );
    }

    #[test]
    fn test_member_init() {
        assert_eq!(
            parse_projection("new Wrapper(customer) { B = customer.OrderSet }"),
            Ok(ProjectionAst::MemberInit {
                type_name: "Wrapper",
                ctor_args: vec![p("customer", &[])],
                bindings: vec![MemberAssignment {
                    member: "B",
                    expr: p("customer", &["OrderSet"]),
                }],
            })
        );
    }

    #[test]
    fn test_member_init_without_constructor() {
        assert_eq!(
            parse_projection("new Wrapper { A = customer, B = customer.OrderList }"),
            Ok(ProjectionAst::MemberInit {
                type_name: "Wrapper",
                ctor_args: vec![],
                bindings: vec![
                    MemberAssignment {
                        member: "A",
                        expr: p("customer", &[]),
                    },
                    MemberAssignment {
                        member: "B",
                        expr: p("customer", &["OrderList"]),
                    },
                ],
            })
        );
    }

    #[test]
    fn test_constructor() {
        assert_eq!(
            parse_projection("new Wrapper(customer, customer.OrderSet)"),
            Ok(ProjectionAst::Constructor {
                type_name: "Wrapper",
                args: vec![p("customer", &[]), p("customer", &["OrderSet"])],
            })
        );
    }

    #[test]
    fn test_identifier_starting_with_new_is_a_path() {
        assert_eq!(
            parse_projection("newest.OrderSet"),
            Ok(ProjectionAst::Path(p("newest", &["OrderSet"])))
        );
    }

    #[test_case("new { customer.OrderSet" ; "missing closing brace")]
    #[test_case("new Wrapper" ; "type without arguments or bindings")]
    #[test_case("new Wrapper { B customer.OrderSet }" ; "binding without equals")]
    #[test_case("new { vip = }" ; "binding without path")]
    #[test_case("customer.OrderSet extra" ; "trailing tokens")]
    #[test_case("new" ; "bare keyword")]
    #[test_case("" ; "empty input")]
    fn test_rejects(input: &str) {
        assert!(parse_projection(input).is_err());
    }

    #[test]
    fn test_error_carries_context() {
        let err = parse_projection("new Wrapper").unwrap_err();
        assert!(err
            .errors
            .iter()
            .any(|(_, ctx)| *ctx == "Expected constructor arguments or member bindings"));
        assert_eq!(
            err.message(),
            Some("Expected a member path or a `new` expression")
        );
    }
}
