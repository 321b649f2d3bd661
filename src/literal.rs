//! Relaxed map-literal parser used by `Object` coercion.
//!
//! Accepts the loose literal syntax editors tend to store in text fields:
//! single- or double-quoted strings, `True`/`False`/`None` alongside the JSON
//! constants, tuples, and trailing commas. The top-level literal must be a
//! mapping.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, multispace0, none_of},
    combinator::{all_consuming, map, map_res, opt, value},
    error::VerboseError,
    multi::{many0, separated_list0},
    number::complete::recognize_float,
    sequence::{delimited, preceded, separated_pair, terminated},
    Finish, IResult,
};
use serde_json::{Map, Number, Value};

use crate::types::json_type_name;

type ParseResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

/// Parse a relaxed map literal such as `{'ct': 'di', "nary": [1, 2.5, None]}`.
///
/// Returns a message describing the failure position on malformed input.
pub fn parse_map_literal(input: &str) -> Result<Map<String, Value>, String> {
    let (_, parsed) = all_consuming(ws(literal))(input)
        .finish()
        .map_err(|e| {
            let offset = e
                .errors
                .first()
                .map(|(rest, _)| input.len() - rest.len())
                .unwrap_or(0);
            format!("unexpected input at offset {}", offset)
        })?;

    match parsed {
        Value::Object(map) => Ok(map),
        other => Err(format!(
            "expected a mapping literal, got {}",
            json_type_name(&other)
        )),
    }
}

fn ws<'a, T>(
    inner: impl FnMut(&'a str) -> ParseResult<'a, T>,
) -> impl FnMut(&'a str) -> ParseResult<'a, T> {
    delimited(multispace0, inner, multispace0)
}

fn literal(input: &str) -> ParseResult<'_, Value> {
    alt((
        mapping,
        sequence('[', ']'),
        sequence('(', ')'),
        map(string, Value::String),
        number,
        constant,
    ))(input)
}

fn mapping(input: &str) -> ParseResult<'_, Value> {
    let entry = separated_pair(ws(key), char(':'), ws(literal));
    let (input, entries) = delimited(
        terminated(char('{'), multispace0),
        terminated(separated_list0(char(','), entry), opt(ws(char(',')))),
        preceded_ws(char('}')),
    )(input)?;

    Ok((input, Value::Object(entries.into_iter().collect())))
}

fn sequence(open: char, close: char) -> impl FnMut(&str) -> ParseResult<'_, Value> {
    move |input| {
        let (input, items) = delimited(
            terminated(char(open), multispace0),
            terminated(separated_list0(char(','), ws(literal)), opt(ws(char(',')))),
            preceded_ws(char(close)),
        )(input)?;
        Ok((input, Value::Array(items)))
    }
}

fn preceded_ws<'a, T>(
    inner: impl FnMut(&'a str) -> ParseResult<'a, T>,
) -> impl FnMut(&'a str) -> ParseResult<'a, T> {
    preceded(multispace0, inner)
}

/// Mapping keys: strings, or numbers and constants rendered as text.
fn key(input: &str) -> ParseResult<'_, String> {
    alt((
        string,
        map(number, |n| n.to_string()),
        map(constant, |c| match c {
            Value::Null => "None".to_string(),
            other => other.to_string(),
        }),
    ))(input)
}

fn string(input: &str) -> ParseResult<'_, String> {
    alt((quoted('\''), quoted('"')))(input)
}

fn quoted(quote: char) -> impl FnMut(&str) -> ParseResult<'_, String> {
    let stop = if quote == '\'' { "'\\" } else { "\"\\" };
    move |input| {
        delimited(
            char(quote),
            map(
                many0(alt((
                    value('\n', tag("\\n")),
                    value('\r', tag("\\r")),
                    value('\t', tag("\\t")),
                    value('\\', tag("\\\\")),
                    value('\'', tag("\\'")),
                    value('"', tag("\\\"")),
                    none_of(stop),
                ))),
                |chars| chars.into_iter().collect(),
            ),
            char(quote),
        )(input)
    }
}

fn number(input: &str) -> ParseResult<'_, Value> {
    map_res(recognize_float, |text: &str| {
        let integral = !text.contains(['.', 'e', 'E']);
        if integral {
            if let Ok(n) = text.parse::<i64>() {
                return Ok(Value::Number(n.into()));
            }
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or("number out of range")
    })(input)
}

fn constant(input: &str) -> ParseResult<'_, Value> {
    alt((
        value(Value::Bool(true), alt((tag("True"), tag("true")))),
        value(Value::Bool(false), alt((tag("False"), tag("false")))),
        value(Value::Null, alt((tag("None"), tag("null")))),
    ))(input)
}
