use nom::error::{ContextError, ParseError};
use std::fmt;

/// Parse failure with the nom context stack, innermost first.
#[derive(Debug, PartialEq)]
pub struct ProjectionParseError<'a> {
    pub errors: Vec<(&'a str, &'static str)>,
}

impl<'a> ProjectionParseError<'a> {
    pub fn new(input: &'a str, message: &'static str) -> Self {
        ProjectionParseError {
            errors: vec![(input, message)],
        }
    }

    /// The outermost context message, if any.
    pub fn message(&self) -> Option<&'static str> {
        self.errors.last().map(|(_, ctx)| *ctx)
    }
}

impl<'a> ParseError<&'a str> for ProjectionParseError<'a> {
    fn from_error_kind(input: &'a str, _kind: nom::error::ErrorKind) -> Self {
        ProjectionParseError {
            errors: vec![(input, "unknown error")],
        }
    }

    fn append(input: &'a str, _kind: nom::error::ErrorKind, mut other: Self) -> Self {
        other.errors.push((input, "unknown error (appended)"));
        other
    }
}

impl<'a> ContextError<&'a str> for ProjectionParseError<'a> {
    fn add_context(input: &'a str, ctx: &'static str, mut other: Self) -> Self {
        other.errors.push((input, ctx));
        other
    }
}

impl fmt::Display for ProjectionParseError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (input, ctx) in &self.errors {
            if input.is_empty() {
                writeln!(f, "{}: <end of input>", ctx)?;
            } else {
                writeln!(f, "{}: {}", ctx, input)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ProjectionParseError<'_> {}

impl<'a> From<nom::error::Error<&'a str>> for ProjectionParseError<'a> {
    fn from(err: nom::error::Error<&'a str>) -> Self {
        ProjectionParseError {
            errors: vec![(err.input, "Unable to parse")],
        }
    }
}
