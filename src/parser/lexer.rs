// Shared lexer helpers for the selection syntax

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0, none_of},
    combinator::map,
    multi::many0,
    sequence::delimited,
    IResult,
};

/// Wrap a parser so it skips surrounding whitespace.
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Bare identifier: column or keyword without quoting.
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-' || c == '.'),
        |s: &str| s.to_string(),
    )(input)
}

/// Double-quoted string, for column names with spaces or punctuation.
pub fn string_literal(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        map(many0(none_of("\"")), |chars| chars.into_iter().collect()),
        char('"'),
    )(input)
}

/// A column reference: bare identifier or quoted string.
pub fn column_name(input: &str) -> IResult<&str, String> {
    alt((string_literal, identifier))(input)
}
