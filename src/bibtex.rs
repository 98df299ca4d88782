//! BibTeX reading and writing.
//!
//! The normalizer only ever sees a [`BibRecord`]; turning text into a record
//! and back goes through the [`BibFormat`] trait so another BibTeX
//! implementation can be dropped in. [`Bibtex`] is the built-in one:
//!
//! - `@string` definitions (with the month macros predefined)
//! - `@comment` and `@preamble` blocks, `%` line comments
//! - braced, quoted, numeric and macro values, concatenated with `#`
//! - nested braces in field values

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::map,
    IResult,
};
use std::collections::HashMap;
use thiserror::Error;

use crate::record::BibRecord;

/// Errors that can occur when reading a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no BibTeX entry found")]
    NoEntry,

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
}

/// Reads and writes single bibliographic records.
pub trait BibFormat {
    /// Parses the first record found in `text`.
    fn parse_record(&self, text: &str) -> Result<BibRecord, ParseError>;

    /// Writes a record back to text.
    fn serialize_record(&self, record: &BibRecord) -> String;
}

/// The built-in BibTeX reader/writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bibtex;

impl BibFormat for Bibtex {
    fn parse_record(&self, text: &str) -> Result<BibRecord, ParseError> {
        parse_first_entry(text)
    }

    fn serialize_record(&self, record: &BibRecord) -> String {
        format_record(record)
    }
}

/// Month macros every BibTeX style knows about.
const MONTH_MACROS: &[(&str, &str)] = &[
    ("jan", "January"),
    ("feb", "February"),
    ("mar", "March"),
    ("apr", "April"),
    ("may", "May"),
    ("jun", "June"),
    ("jul", "July"),
    ("aug", "August"),
    ("sep", "September"),
    ("oct", "October"),
    ("nov", "November"),
    ("dec", "December"),
];

/// Result of parsing an @ block
enum AtBlock {
    Entry(BibRecord),
    String(String, String),
    Skipped,
}

fn parse_first_entry(input: &str) -> Result<BibRecord, ParseError> {
    let mut strings: HashMap<String, String> = MONTH_MACROS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let mut remaining = input;

    loop {
        remaining = skip_whitespace_and_comments(remaining);
        if remaining.is_empty() {
            return Err(ParseError::NoEntry);
        }

        if !remaining.starts_with('@') {
            // Free text around the entry, e.g. a note copied with it
            match remaining.find('@') {
                Some(pos) => {
                    remaining = &remaining[pos..];
                    continue;
                }
                None => return Err(ParseError::NoEntry),
            }
        }

        match parse_at_block(remaining, &strings) {
            Ok((rest, block)) => {
                match block {
                    AtBlock::Entry(record) => {
                        tracing::debug!(
                            "parsed @{}{{{}}} with {} fields",
                            record.entry_type,
                            record.id,
                            record.fields.len()
                        );
                        return Ok(record);
                    }
                    AtBlock::String(key, value) => {
                        strings.insert(key, value);
                    }
                    AtBlock::Skipped => {}
                }
                remaining = rest;
            }
            Err(err) => {
                let offset = input.len() - remaining.len();
                let line = input[..offset].matches('\n').count() + 1;
                let message = match err {
                    nom::Err::Error(e) | nom::Err::Failure(e) => {
                        format!("malformed entry ({})", e.code.description())
                    }
                    nom::Err::Incomplete(_) => "unexpected end of input".to_string(),
                };
                return Err(ParseError::Syntax { line, message });
            }
        }
    }
}

/// Skip whitespace and `%` line comments
fn skip_whitespace_and_comments(input: &str) -> &str {
    let mut rest = input;
    loop {
        rest = rest.trim_start();
        if rest.starts_with('%') {
            let end = rest.find('\n').unwrap_or(rest.len());
            rest = &rest[end..];
        } else {
            return rest;
        }
    }
}

/// Parse an @ block (entry, string, preamble, or comment)
fn parse_at_block<'a>(
    input: &'a str,
    strings: &HashMap<String, String>,
) -> IResult<&'a str, AtBlock> {
    let (rest, _) = char('@')(input)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, block_type) = take_while1(|c: char| c.is_ascii_alphanumeric())(rest)?;

    match block_type.to_lowercase().as_str() {
        "string" => {
            let (rest, (key, value)) = parse_string_definition(rest, strings)?;
            Ok((rest, AtBlock::String(key, value)))
        }
        "preamble" | "comment" => {
            let (rest, _) = multispace0(rest)?;
            let (rest, _) = parse_delimited_content(rest)?;
            Ok((rest, AtBlock::Skipped))
        }
        entry_type => {
            let (rest, record) = parse_entry_body(rest, entry_type, strings)?;
            Ok((rest, AtBlock::Entry(record)))
        }
    }
}

/// Opening delimiter of a block and its matching closing character.
fn open_delimiter(input: &str) -> IResult<&str, char> {
    alt((
        map(char('{'), |_| '}'),
        map(char('('), |_| ')'),
    ))(input)
}

/// Parse a @string definition
fn parse_string_definition<'a>(
    input: &'a str,
    strings: &HashMap<String, String>,
) -> IResult<&'a str, (String, String)> {
    let (rest, _) = multispace0(input)?;
    let (rest, close) = open_delimiter(rest)?;
    let (rest, (key, value)) = parse_single_field(rest, strings)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = char(close)(rest)?;

    Ok((rest, (key, value)))
}

/// Skip a braced or parenthesized block
fn parse_delimited_content(input: &str) -> IResult<&str, &str> {
    if input.starts_with('(') {
        let end = input.find(')').ok_or_else(|| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char))
        })?;
        return Ok((&input[end + 1..], &input[..end + 1]));
    }
    parse_braced_content(input)
}

/// Parse an entry body
fn parse_entry_body<'a>(
    input: &'a str,
    entry_type: &str,
    strings: &HashMap<String, String>,
) -> IResult<&'a str, BibRecord> {
    let (rest, _) = multispace0(input)?;
    let (rest, close) = open_delimiter(rest)?;
    let (rest, _) = multispace0(rest)?;

    let (rest, id) = take_while1(|c: char| {
        !c.is_whitespace() && !matches!(c, ',' | '{' | '}' | '(' | ')' | '"' | '=')
    })(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = char(',')(rest)?;

    let (rest, fields) = parse_fields(rest, strings)?;

    let (rest, _) = multispace0(rest)?;
    let (rest, _) = char(close)(rest)?;

    let mut record = BibRecord::new(entry_type, id);
    for (name, value) in fields {
        record.set(&name, value);
    }

    Ok((rest, record))
}

/// Parse fields within an entry
fn parse_fields<'a>(
    input: &'a str,
    strings: &HashMap<String, String>,
) -> IResult<&'a str, Vec<(String, String)>> {
    let mut fields = Vec::new();
    let mut remaining = input;

    loop {
        let (rest, _) = multispace0(remaining)?;

        if rest.starts_with('}') || rest.starts_with(')') {
            return Ok((rest, fields));
        }

        let (rest, field) = parse_single_field(rest, strings)?;
        fields.push(field);

        let (rest, _) = multispace0(rest)?;
        remaining = rest.strip_prefix(',').unwrap_or(rest);
    }
}

/// Parse a single field (name = value)
fn parse_single_field<'a>(
    input: &'a str,
    strings: &HashMap<String, String>,
) -> IResult<&'a str, (String, String)> {
    let (rest, _) = multispace0(input)?;
    let (rest, name) =
        take_while1(|c: char| c.is_ascii_alphanumeric() || "_-:.+".contains(c))(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = char('=')(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, value) = parse_field_value(rest, strings)?;

    Ok((rest, (name.to_lowercase(), collapse_whitespace(&value))))
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a field value (braced, quoted, number, or macro name)
fn parse_field_value<'a>(
    input: &'a str,
    strings: &HashMap<String, String>,
) -> IResult<&'a str, String> {
    let mut result = String::new();
    let mut remaining = input;

    loop {
        let (rest, _) = multispace0(remaining)?;

        let (rest, part) = alt((
            parse_braced_value,
            parse_quoted_value,
            map(take_while1(|c: char| c.is_ascii_digit()), |s: &str| {
                s.to_string()
            }),
            map(
                take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
                |s: &str| {
                    strings
                        .get(&s.to_lowercase())
                        .cloned()
                        .unwrap_or_else(|| s.to_string())
                },
            ),
        ))(rest)?;

        result.push_str(&part);
        remaining = rest;

        let (rest, _) = multispace0(remaining)?;
        if let Some(stripped) = rest.strip_prefix('#') {
            remaining = stripped;
        } else {
            return Ok((rest, result));
        }
    }
}

/// Parse a braced value {content}
fn parse_braced_value(input: &str) -> IResult<&str, String> {
    let (rest, content) = parse_braced_content(input)?;
    let inner = &content[1..content.len() - 1];
    Ok((rest, inner.to_string()))
}

/// Parse braced content including nested braces
fn parse_braced_content(input: &str) -> IResult<&str, &str> {
    if !input.starts_with('{') {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        )));
    }

    let mut depth = 0usize;
    let mut escaped = false;

    for (pos, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&input[pos + 1..], &input[..pos + 1]));
                }
            }
            '\\' => escaped = true,
            _ => {}
        }
    }

    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

/// Parse a quoted value "content"; quotes inside braces don't end it
fn parse_quoted_value(input: &str) -> IResult<&str, String> {
    let Some(body) = input.strip_prefix('"') else {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        )));
    };

    let mut depth = 0usize;
    let mut escaped = false;

    for (pos, c) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '"' if depth == 0 => {
                return Ok((&body[pos + 1..], body[..pos].to_string()));
            }
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '\\' => escaped = true,
            _ => {}
        }
    }

    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

/// Writes a record with one braced field per line, fields in name order.
fn format_record(record: &BibRecord) -> String {
    let mut result = String::new();

    result.push('@');
    result.push_str(&record.entry_type);
    result.push('{');
    result.push_str(&record.id);
    result.push(',');
    result.push('\n');

    let count = record.fields.len();
    for (i, (name, value)) in record.fields.iter().enumerate() {
        result.push(' ');
        result.push_str(name);
        result.push_str(" = {");
        result.push_str(value);
        result.push('}');
        if i + 1 < count {
            result.push(',');
        }
        result.push('\n');
    }

    result.push_str("}\n");
    result
}
