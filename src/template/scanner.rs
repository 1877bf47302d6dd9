//! Single-pass scanner that splits template text into segments.
//!
//! The scanner is deliberately forgiving: raw SQL must survive untouched,
//! so any brace group that does not form a default declaration or a
//! conditional is emitted as literal text. Only a `{` with no matching `}`
//! is a hard error.

use once_cell::sync::Lazy;
use regex::Regex;

use super::TemplateError;
use crate::value::Value;

/// A piece of scanned template.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment {
    /// Literal SQL text, emitted verbatim.
    Text(String),
    /// A `@name` parameter reference.
    Param { name: String },
    /// A `{DEFAULT @name = literal}` declaration. Removed from the output.
    Default { name: String, value: Value },
    /// A `{expr} ? {then} : {else}` conditional. Bodies are scanned
    /// recursively; `expr_offset` is the absolute offset of the guard text
    /// for error reporting.
    Cond {
        expr: String,
        expr_offset: usize,
        then_body: Vec<Segment>,
        else_body: Option<Vec<Segment>>,
    },
}

/// `DEFAULT @name = literal` inside a brace group. The literal part is
/// validated separately so that near-misses fall back to literal text.
static DEFAULT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A\s*(?i:DEFAULT)\s+@([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.*?)\s*\z")
        .expect("default declaration regex is valid")
});

/// Bare identifier, for default literals written without quotes.
static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A[A-Za-z_][A-Za-z0-9_]*\z").expect("identifier regex is valid"));

/// Scan a full template into a segment list.
pub(crate) fn scan(template: &str) -> Result<Vec<Segment>, TemplateError> {
    scan_part(template, 0)
}

/// Scan a template slice whose first byte sits at absolute offset `base`.
fn scan_part(src: &str, base: usize) -> Result<Vec<Segment>, TemplateError> {
    let bytes = src.as_bytes();
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            // Quoted literals pass through as text; `@` and braces inside
            // them are inert.
            b'\'' => i = skip_quoted(bytes, i),
            b'@' => {
                if let Some(end) = ident_end(bytes, i + 1) {
                    flush_text(&mut segments, src, text_start, i);
                    segments.push(Segment::Param {
                        name: src[i + 1..end].to_string(),
                    });
                    i = end;
                    text_start = i;
                } else {
                    i += 1;
                }
            }
            b'{' => {
                let close = find_matching_brace(bytes, i).ok_or_else(|| {
                    TemplateError::Syntax {
                        message: "unmatched '{'".to_string(),
                        offset: base + i,
                    }
                })?;
                let content = &src[i + 1..close];

                if let Some((name, value)) = parse_default(content) {
                    flush_text(&mut segments, src, text_start, i);
                    segments.push(Segment::Default { name, value });
                    i = consume_one_newline(bytes, close + 1);
                    text_start = i;
                } else if let Some(cond) = scan_conditional(src, base, i, close)? {
                    let (segment, end) = cond;
                    flush_text(&mut segments, src, text_start, i);
                    segments.push(segment);
                    i = end;
                    text_start = i;
                } else {
                    // Not a recognized construct: the brace is literal
                    // text. Scanning continues inside the group so
                    // parameter references there still substitute.
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }

    flush_text(&mut segments, src, text_start, bytes.len());
    Ok(segments)
}

/// Try to read `? {then}` and optionally `: {else}` after the guard group
/// that spans `open..=close`. Returns the conditional segment and the
/// offset just past it, or `None` if the guard is not followed by `? {`.
fn scan_conditional(
    src: &str,
    base: usize,
    open: usize,
    close: usize,
) -> Result<Option<(Segment, usize)>, TemplateError> {
    let bytes = src.as_bytes();

    let q = skip_whitespace(bytes, close + 1);
    if q >= bytes.len() || bytes[q] != b'?' {
        return Ok(None);
    }
    let then_open = skip_whitespace(bytes, q + 1);
    if then_open >= bytes.len() || bytes[then_open] != b'{' {
        return Ok(None);
    }
    let then_close =
        find_matching_brace(bytes, then_open).ok_or_else(|| TemplateError::Syntax {
            message: "unterminated conditional body".to_string(),
            offset: base + then_open,
        })?;
    let then_body = scan_part(&src[then_open + 1..then_close], base + then_open + 1)?;

    let mut end = then_close + 1;
    let mut else_body = None;
    let c = skip_whitespace(bytes, end);
    if c < bytes.len() && bytes[c] == b':' {
        let else_open = skip_whitespace(bytes, c + 1);
        if else_open < bytes.len() && bytes[else_open] == b'{' {
            let else_close =
                find_matching_brace(bytes, else_open).ok_or_else(|| TemplateError::Syntax {
                    message: "unterminated conditional body".to_string(),
                    offset: base + else_open,
                })?;
            else_body = Some(scan_part(
                &src[else_open + 1..else_close],
                base + else_open + 1,
            )?);
            end = else_close + 1;
        }
    }

    Ok(Some((
        Segment::Cond {
            expr: src[open + 1..close].to_string(),
            expr_offset: base + open + 1,
            then_body,
            else_body,
        },
        end,
    )))
}

/// Parse the inside of a brace group as a default declaration.
fn parse_default(content: &str) -> Option<(String, Value)> {
    let caps = DEFAULT_RE.captures(content)?;
    let name = caps[1].to_string();
    let value = parse_default_literal(&caps[2])?;
    Some((name, value))
}

/// A default literal: integer, real, single-quoted string, or bare
/// identifier (treated as a string).
fn parse_default_literal(text: &str) -> Option<Value> {
    if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
        let inner = &text[1..text.len() - 1];
        return Some(Value::Str(inner.replace("''", "'")));
    }
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::Int(i));
    }
    if let Ok(r) = text.parse::<f64>() {
        return Some(Value::Real(r));
    }
    if IDENT_RE.is_match(text) {
        return Some(Value::Str(text.to_string()));
    }
    None
}

fn flush_text(segments: &mut Vec<Segment>, src: &str, start: usize, end: usize) {
    if start < end {
        segments.push(Segment::Text(src[start..end].to_string()));
    }
}

/// Advance past a single-quoted literal starting at `start` (which must be
/// a `'`), honoring `''` escapes. An unterminated literal runs to the end
/// of input.
pub(crate) fn skip_quoted(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if i + 1 < bytes.len() && bytes[i + 1] == b'\'' {
                i += 2;
            } else {
                return i + 1;
            }
        } else {
            i += 1;
        }
    }
    bytes.len()
}

/// Offset of the `}` matching the `{` at `open`, skipping braces inside
/// quoted literals.
fn find_matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' => i = skip_quoted(bytes, i),
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    None
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Consume at most one newline (`\n` or `\r\n`) so a removed default
/// declaration does not leave a blank line behind.
fn consume_one_newline(bytes: &[u8], i: usize) -> usize {
    if i < bytes.len() && bytes[i] == b'\n' {
        i + 1
    } else if i + 1 < bytes.len() && bytes[i] == b'\r' && bytes[i + 1] == b'\n' {
        i + 2
    } else {
        i
    }
}

/// End of the identifier starting at `start`, or `None` if `start` does not
/// begin an identifier.
fn ident_end(bytes: &[u8], start: usize) -> Option<usize> {
    if start >= bytes.len() {
        return None;
    }
    if !(bytes[start].is_ascii_alphabetic() || bytes[start] == b'_') {
        return None;
    }
    let mut i = start + 1;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    Some(i)
}
