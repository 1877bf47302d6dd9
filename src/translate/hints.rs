//! MPP hint expansion.
//!
//! A comment line of the form `--HINT DISTRIBUTE_ON_KEY(column)` or
//! `--HINT SORT_ON_KEY(INTERLEAVED:column)` immediately preceding a
//! `CREATE TABLE` or `SELECT ... INTO ...` statement rewrites that
//! statement for the MPP targets:
//!
//! - PDW / Synapse: `WITH (DISTRIBUTION = HASH(column))`, with
//!   `SELECT ... INTO` statements converted to `CREATE TABLE ... AS
//!   SELECT` so the clause has somewhere to live.
//! - Redshift: `DISTKEY(column)` / `INTERLEAVED SORTKEY(column)`, same
//!   CTAS conversion.
//!
//! "Immediately preceding" tolerates whitespace and other comment lines
//! between the hint and the statement. The hint comment itself is
//! preserved in the output. On every other dialect the hint is an
//! ordinary comment and passes through untouched.

use once_cell::sync::Lazy;
use regex::Regex;

use super::quoting::literal_mask;
use crate::dialect::Dialect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HintKind {
    Distribute,
    Sort,
}

static DISTRIBUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)--\s*HINT\s+DISTRIBUTE_ON_KEY\s*\(\s*([^)\r\n]*?)\s*\)").unwrap()
});

static SORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)--\s*HINT\s+SORT_ON_KEY\s*\(\s*INTERLEAVED\s*:\s*([^)\r\n]*?)\s*\)").unwrap()
});

static CREATE_TABLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\ACREATE\s+TABLE\s").unwrap());

static SELECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\ASELECT\s").unwrap());

static INTO_TARGET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bINTO\s+([A-Za-z_#][A-Za-z0-9_#.]*)\s*").unwrap());

static AS_SELECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+AS\s+SELECT\b").unwrap());

/// Expand MPP hints for `dialect`. Non-MPP dialects pass through.
pub(crate) fn expand(sql: &str, dialect: Dialect) -> String {
    if !dialect.supports_mpp_hints() {
        return sql.to_string();
    }

    let mut result = sql.to_string();
    let mut from = 0;
    while let Some((kind, key, hint_end)) = next_hint(&result, from) {
        from = hint_end;
        let Some(stmt_start) = statement_start(&result, hint_end) else {
            continue;
        };
        let stmt_end = statement_end(&result, stmt_start);
        if let Some(rewritten) =
            rewrite_statement(&result[stmt_start..stmt_end], kind, &key, dialect)
        {
            result.replace_range(stmt_start..stmt_end, &rewritten);
        }
    }
    result
}

/// Earliest hint comment at or after `from`, with its key and end offset.
fn next_hint(text: &str, from: usize) -> Option<(HintKind, String, usize)> {
    let mask = literal_mask(text);
    let mut best: Option<(usize, HintKind, String, usize)> = None;
    for (kind, re) in [
        (HintKind::Distribute, &*DISTRIBUTE_RE),
        (HintKind::Sort, &*SORT_RE),
    ] {
        let mut start = from;
        while let Some(m) = re.find_at(text, start) {
            if mask[m.start()] {
                start = m.start() + 1;
                continue;
            }
            let key = re
                .captures(&text[m.start()..m.end()])
                .and_then(|caps| caps.get(1))
                .map(|g| g.as_str().to_string())
                .unwrap_or_default();
            if best.as_ref().map_or(true, |(s, ..)| m.start() < *s) {
                best = Some((m.start(), kind, key, m.end()));
            }
            break;
        }
    }
    best.map(|(_, kind, key, end)| (kind, key, end))
}

/// Start of the statement following the hint: whitespace and further
/// comment lines/blocks are skipped. `None` when nothing follows.
fn statement_start(text: &str, mut i: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if text[i..].starts_with("--") {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
        } else if text[i..].starts_with("/*") {
            i = match text[i + 2..].find("*/") {
                Some(rel) => i + 2 + rel + 2,
                None => bytes.len(),
            };
        } else {
            break;
        }
    }
    (i < bytes.len()).then_some(i)
}

/// End of the statement starting at `start`: the first `;` outside string
/// literals, or end of input.
fn statement_end(text: &str, start: usize) -> usize {
    let stmt = &text[start..];
    let mask = literal_mask(stmt);
    for (i, b) in stmt.bytes().enumerate() {
        if b == b';' && !mask[i] {
            return start + i;
        }
    }
    text.len()
}

fn rewrite_statement(stmt: &str, kind: HintKind, key: &str, dialect: Dialect) -> Option<String> {
    let clause = table_clause(kind, key, dialect)?;

    if CREATE_TABLE_RE.is_match(stmt) {
        // Prefer inserting before `AS SELECT` (an earlier hint may already
        // have converted the statement to CTAS), then after the column
        // definition list, then at the end.
        if let Some(m) = AS_SELECT_RE.find(stmt) {
            let mut out = String::with_capacity(stmt.len() + clause.len() + 1);
            out.push_str(&stmt[..m.start()]);
            out.push(' ');
            out.push_str(&clause);
            out.push_str(&stmt[m.start()..]);
            return Some(out);
        }
        if let Some(close) = table_def_close(stmt) {
            let mut out = String::with_capacity(stmt.len() + clause.len() + 1);
            out.push_str(&stmt[..=close]);
            out.push(' ');
            out.push_str(&clause);
            out.push_str(&stmt[close + 1..]);
            return Some(out);
        }
        return Some(format!("{} {}", stmt.trim_end(), clause));
    }

    if SELECT_RE.is_match(stmt) {
        let mask = literal_mask(stmt);
        let mut start = 0;
        while let Some(caps) = INTO_TARGET_RE.captures_at(stmt, start) {
            let m = caps.get(0)?;
            if mask[m.start()] {
                start = m.start() + 1;
                continue;
            }
            let target = caps.get(1)?.as_str();
            let select_sql = format!("{}{}", &stmt[..m.start()], &stmt[m.end()..]);
            return Some(format!(
                "CREATE TABLE {} {} AS {}",
                target, clause, select_sql
            ));
        }
    }

    None
}

/// The dialect-specific table attribute for a hint, or `None` when the
/// hint has no expansion on this dialect.
fn table_clause(kind: HintKind, key: &str, dialect: Dialect) -> Option<String> {
    match (kind, dialect) {
        (HintKind::Distribute, Dialect::Pdw | Dialect::Synapse) => {
            Some(format!("WITH (DISTRIBUTION = HASH({}))", key))
        }
        (HintKind::Distribute, Dialect::Redshift) => Some(format!("DISTKEY({})", key)),
        (HintKind::Sort, Dialect::Redshift) => Some(format!("INTERLEAVED SORTKEY({})", key)),
        // PDW and Synapse have no interleaved sort keys.
        (HintKind::Sort, Dialect::Pdw | Dialect::Synapse) => None,
        _ => None,
    }
}

/// Offset of the `)` closing the column definition list, if the statement
/// has one.
fn table_def_close(stmt: &str) -> Option<usize> {
    let bytes = stmt.as_bytes();
    let mask = literal_mask(stmt);
    let open = bytes
        .iter()
        .enumerate()
        .position(|(i, &b)| b == b'(' && !mask[i])?;
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if mask[i] {
            continue;
        }
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
