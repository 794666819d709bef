// Parser for chart selection strings
//
// Format: chart(role: column, role: none, role: [col, col], ...)
// e.g. bar(x: region, y: sales)
//      bubble(x: gdp, y: life, size: none)
//      sunburst(path: [region, city], values: population)

use anyhow::{anyhow, Result};
use nom::{
    branch::alt,
    character::complete::char,
    combinator::{eof, map},
    multi::separated_list0,
    sequence::separated_pair,
    IResult,
};

use super::lexer::{column_name, identifier, string_literal, ws};
use crate::resolver::{ColumnSelection, RoleBinding};
use crate::schema::{Cardinality, ChartType, RoleName};

/// A role value before keyword resolution.
#[derive(Debug, Clone, PartialEq)]
enum RawValue {
    Name(String),
    List(Vec<String>),
    None,
}

fn parse_value(input: &str) -> IResult<&str, RawValue> {
    alt((
        map(parse_list, RawValue::List),
        // A quoted "none" is a column literally named none.
        map(string_literal, RawValue::Name),
        map(identifier, |name| {
            if name == "none" {
                RawValue::None
            } else {
                RawValue::Name(name)
            }
        }),
    ))(input)
}

fn parse_list(input: &str) -> IResult<&str, Vec<String>> {
    let (input, _) = ws(char('['))(input)?;
    let (input, items) = separated_list0(ws(char(',')), column_name)(input)?;
    let (input, _) = ws(char(']'))(input)?;
    Ok((input, items))
}

fn parse_assignment(input: &str) -> IResult<&str, (String, RawValue)> {
    separated_pair(ws(identifier), char(':'), ws(parse_value))(input)
}

/// Grammar-level parse of one selection string.
fn parse_raw(input: &str) -> IResult<&str, (String, Vec<(String, RawValue)>)> {
    let (input, chart) = ws(identifier)(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, assignments) = separated_list0(ws(char(',')), parse_assignment)(input)?;
    let (input, _) = ws(char(')'))(input)?;
    let (input, _) = ws(eof)(input)?;
    Ok((input, (chart, assignments)))
}

/// Parse a full selection string into a chart type and its column
/// selection. Here the user types names instead of picking from widgets,
/// so unknown chart or role keywords are user-facing errors, not panics.
pub fn parse_selection(input: &str) -> Result<(ChartType, ColumnSelection)> {
    let (_, (chart_word, assignments)) = parse_raw(input)
        .map_err(|e| anyhow!("Invalid chart selection '{}': {}", input.trim(), e))?;

    let chart = ChartType::from_keyword(&chart_word).ok_or_else(|| {
        anyhow!(
            "Unknown chart type '{}' (expected one of: {})",
            chart_word,
            ChartType::ALL
                .iter()
                .map(|t| t.keyword())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })?;

    let mut selection = ColumnSelection::new();
    for (role_word, value) in assignments {
        let role = RoleName::from_keyword(&role_word)
            .ok_or_else(|| anyhow!("Unknown role '{}'", role_word))?;
        let descriptor = chart
            .roles()
            .iter()
            .find(|d| d.name == role)
            .ok_or_else(|| {
                anyhow!(
                    "Role '{}' does not apply to the {}",
                    role_word,
                    chart.display_name()
                )
            })?;

        let binding = match value {
            RawValue::None => RoleBinding::None,
            RawValue::Name(name) => match descriptor.cardinality {
                Cardinality::One => RoleBinding::Column(name),
                Cardinality::OneOrMore => RoleBinding::Columns(vec![name]),
            },
            RawValue::List(items) => match descriptor.cardinality {
                Cardinality::OneOrMore => RoleBinding::Columns(items),
                Cardinality::One => {
                    return Err(anyhow!(
                        "Role '{}' takes a single column, not a list",
                        role_word
                    ))
                }
            },
        };
        selection.set(role, binding);
    }

    Ok((chart, selection))
}
