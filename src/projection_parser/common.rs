use nom::{
    bytes::complete::take_while,
    character::complete::{char, multispace0, satisfy},
    combinator::recognize,
    error::ParseError,
    multi::separated_list1,
    sequence::{delimited, pair},
    IResult, Parser,
};

use super::ast::PathExpr;

pub fn ws<'a, O, E: ParseError<&'a str>, F>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
{
    delimited(multispace0, inner, multispace0)
}

pub fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// A letter or underscore followed by letters, digits or underscores,
// e.g. "customer", "OrderSet", "_tmp1".
pub fn identifier<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    recognize(pair(
        satisfy(|c: char| c.is_alphabetic() || c == '_'),
        take_while(is_identifier_char),
    ))
    .parse(input)
}

// Dotted member path without whitespace around the dots.
pub fn path<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, PathExpr<'a>, E> {
    let (input, mut parts) = separated_list1(char('.'), identifier).parse(input)?;
    let root = parts.remove(0);
    Ok((
        input,
        PathExpr {
            root,
            members: parts,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nom::bytes::complete::tag;

    #[test]
    fn test_ws() {
        assert_eq!(
            ws(tag::<&str, &str, nom::error::Error<&str>>("new")).parse("  new  {"),
            Ok(("{", "new"))
        );
    }

    #[test]
    fn test_identifier() {
        assert_eq!(
            identifier::<nom::error::Error<&str>>("Order_Set2.x"),
            Ok((".x", "Order_Set2"))
        );
        assert!(identifier::<nom::error::Error<&str>>("2abc").is_err());
    }

    #[test]
    fn test_path() {
        let (rest, parsed) = path::<nom::error::Error<&str>>("customer.Address.City }").unwrap();
        assert_eq!(rest, " }");
        assert_eq!(parsed.root, "customer");
        assert_eq!(parsed.members, vec!["Address", "City"]);
        assert_eq!(parsed.default_name(), "City");
    }

    #[test]
    fn test_path_stops_at_trailing_dot() {
        let (rest, parsed) = path::<nom::error::Error<&str>>("customer.").unwrap();
        assert_eq!(rest, ".");
        assert!(parsed.members.is_empty());
    }
}
