//! Search/replace patterns with captures.
//!
//! A search pattern mixes three token classes:
//!
//! - **Literal text**, matched ASCII-case-insensitively (non-ASCII bytes
//!   compare exactly).
//! - **Whitespace runs**, which match one or more whitespace characters in
//!   the SQL text.
//! - **Captures**: `@@@` optionally followed by a lowercase letter
//!   (`@@@a`, `@@@b`, ...), which match a run of text up to the point
//!   where the rest of the pattern matches. A capture never crosses an
//!   unbalanced closing parenthesis, stops at a comma at its own
//!   parenthesis depth unless the next anchor itself begins with a comma,
//!   and skips single-quoted literals atomically. A capture with nothing
//!   after it takes a single token (a maximal non-whitespace, balanced
//!   run).
//!
//! The replacement references captures by the same `@@@x` names; captured
//! text keeps its original casing and is trimmed of surrounding whitespace
//! when substituted.
//!
//! Matching consults the caller's string-protection mask: a match cannot
//! begin inside a single-quoted literal and anchors are never found inside
//! one, unless the search pattern itself contains a quote.

use super::quoting::skip_quoted;

/// One token of a compiled search pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternToken {
    Literal(String),
    Whitespace,
    /// Capture with its name (empty for the bare `@@@`).
    Capture(String),
}

/// A compiled search pattern.
#[derive(Debug, Clone)]
pub(crate) struct Pattern {
    tokens: Vec<PatternToken>,
    /// Whether the pattern itself references a quoted literal, which opts
    /// it out of string protection.
    references_quotes: bool,
}

/// One part of a compiled replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplacePart {
    Literal(String),
    Capture(String),
}

/// A compiled replacement string.
#[derive(Debug, Clone)]
pub(crate) struct Replacement {
    parts: Vec<ReplacePart>,
}

/// A successful pattern match against SQL text.
#[derive(Debug)]
pub(crate) struct PatternMatch {
    pub(crate) start: usize,
    pub(crate) end: usize,
    /// Captured byte ranges, in pattern order.
    captures: Vec<(String, (usize, usize))>,
}

impl Pattern {
    /// Compile a search pattern. Errors carry a human-readable message;
    /// the loader attaches the table line number.
    pub(crate) fn compile(text: &str) -> Result<Pattern, String> {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut i = 0;

        while i < chars.len() {
            if chars[i] == '@' && i + 2 < chars.len() && chars[i + 1] == '@' && chars[i + 2] == '@'
            {
                if !literal.is_empty() {
                    tokens.push(PatternToken::Literal(std::mem::take(&mut literal)));
                }
                let mut end = i + 3;
                let mut name = String::new();
                if end < chars.len() && chars[end].is_ascii_lowercase() {
                    name.push(chars[end]);
                    end += 1;
                }
                if matches!(tokens.last(), Some(PatternToken::Capture(_))) {
                    return Err("adjacent wildcards in search pattern".to_string());
                }
                tokens.push(PatternToken::Capture(name));
                i = end;
            } else if chars[i].is_whitespace() {
                if !literal.is_empty() {
                    tokens.push(PatternToken::Literal(std::mem::take(&mut literal)));
                }
                while i < chars.len() && chars[i].is_whitespace() {
                    i += 1;
                }
                tokens.push(PatternToken::Whitespace);
            } else {
                literal.push(chars[i]);
                i += 1;
            }
        }
        if !literal.is_empty() {
            tokens.push(PatternToken::Literal(literal));
        }

        if tokens.is_empty() {
            return Err("empty search pattern".to_string());
        }
        if !tokens
            .iter()
            .any(|t| matches!(t, PatternToken::Literal(_)))
        {
            return Err("search pattern has no literal text".to_string());
        }

        let references_quotes = tokens
            .iter()
            .any(|t| matches!(t, PatternToken::Literal(l) if l.contains('\'')));

        Ok(Pattern {
            tokens,
            references_quotes,
        })
    }

    /// Names bound by this pattern's captures.
    pub(crate) fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|t| match t {
            PatternToken::Capture(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Find the first match at or after `from`.
    pub(crate) fn find(&self, text: &str, mask: &[bool], from: usize) -> Option<PatternMatch> {
        let bytes = text.as_bytes();
        for start in from..=bytes.len() {
            if !text.is_char_boundary(start) {
                continue;
            }
            if !self.references_quotes && start < mask.len() && mask[start] {
                continue;
            }
            if !self.start_boundary_ok(bytes, start) {
                continue;
            }
            let mut captures = Vec::new();
            if let Some(end) = self.match_seq(text, mask, 0, start, &mut captures) {
                if self.end_boundary_ok(bytes, end) {
                    return Some(PatternMatch {
                        start,
                        end,
                        captures,
                    });
                }
            }
        }
        None
    }

    /// A pattern whose literal text begins with a word character must not
    /// start in the middle of a word (`LEN(` must not fire inside
    /// `GLEN(`).
    fn start_boundary_ok(&self, bytes: &[u8], start: usize) -> bool {
        match self.tokens.first() {
            Some(PatternToken::Literal(lit)) if lit.starts_with(is_word_char) => {
                start == 0 || !is_word_byte(bytes[start - 1])
            }
            _ => true,
        }
    }

    /// Symmetric check at the end of the match.
    fn end_boundary_ok(&self, bytes: &[u8], end: usize) -> bool {
        match self.tokens.last() {
            Some(PatternToken::Literal(lit)) if lit.ends_with(is_word_char) => {
                end == bytes.len() || !is_word_byte(bytes[end])
            }
            _ => true,
        }
    }

    /// Match the token suffix starting at `ti` against `text` at `pos`.
    fn match_seq(
        &self,
        text: &str,
        mask: &[bool],
        ti: usize,
        pos: usize,
        captures: &mut Vec<(String, (usize, usize))>,
    ) -> Option<usize> {
        let bytes = text.as_bytes();
        let Some(token) = self.tokens.get(ti) else {
            return Some(pos);
        };
        match token {
            PatternToken::Literal(lit) => {
                if !self.references_quotes && pos < mask.len() && mask[pos] {
                    return None;
                }
                if literal_matches(bytes, pos, lit.as_bytes()) {
                    self.match_seq(text, mask, ti + 1, pos + lit.len(), captures)
                } else {
                    None
                }
            }
            PatternToken::Whitespace => {
                let mut p = pos;
                while p < bytes.len() && bytes[p].is_ascii_whitespace() {
                    p += 1;
                }
                if p == pos {
                    None
                } else {
                    self.match_seq(text, mask, ti + 1, p, captures)
                }
            }
            PatternToken::Capture(name) => {
                if self.is_trailing(ti) {
                    let end = self.scan_single_token(text, pos);
                    if end == pos {
                        return None;
                    }
                    let saved = captures.len();
                    captures.push((name.clone(), (pos, end)));
                    if let Some(e) = self.match_seq(text, mask, ti + 1, end, captures) {
                        return Some(e);
                    }
                    captures.truncate(saved);
                    None
                } else {
                    self.scan_capture(text, mask, ti, name, pos, captures)
                }
            }
        }
    }

    /// True if every token after `ti` is whitespace (or there are none):
    /// the capture at `ti` has no literal anchor and takes a single token.
    fn is_trailing(&self, ti: usize) -> bool {
        self.tokens[ti + 1..]
            .iter()
            .all(|t| matches!(t, PatternToken::Whitespace))
    }

    /// Whether the first literal anchor after `ti` begins with a comma, in
    /// which case a depth-zero comma does not terminate the capture.
    fn next_anchor_starts_with_comma(&self, ti: usize) -> bool {
        self.tokens[ti + 1..]
            .iter()
            .find_map(|t| match t {
                PatternToken::Literal(lit) => Some(lit.starts_with(',')),
                _ => None,
            })
            .unwrap_or(false)
    }

    /// Scan a capture bounded by the rest of the pattern: at each candidate
    /// end position (at capture-relative parenthesis depth zero) the
    /// remaining tokens are tried; the shortest successful capture wins.
    fn scan_capture(
        &self,
        text: &str,
        mask: &[bool],
        ti: usize,
        name: &str,
        pos: usize,
        captures: &mut Vec<(String, (usize, usize))>,
    ) -> Option<usize> {
        let bytes = text.as_bytes();
        let comma_allowed = self.next_anchor_starts_with_comma(ti);
        let mut depth = 0i32;
        let mut k = pos;
        loop {
            if depth == 0 && k > pos && text.is_char_boundary(k) {
                let saved = captures.len();
                captures.push((name.to_string(), (pos, k)));
                if let Some(end) = self.match_seq(text, mask, ti + 1, k, captures) {
                    return Some(end);
                }
                captures.truncate(saved);
            }
            if k >= bytes.len() {
                return None;
            }
            let b = bytes[k];
            if b == b'\'' && !self.references_quotes {
                k = skip_quoted(bytes, k);
                continue;
            }
            match b {
                b'(' => depth += 1,
                b')' => {
                    // The capture may not cross an unbalanced close paren.
                    if depth == 0 {
                        return None;
                    }
                    depth -= 1;
                }
                b',' if depth == 0 && !comma_allowed => return None,
                _ => {}
            }
            k += 1;
        }
    }

    /// Maximal single token: non-whitespace, balance-limited, quoted
    /// literals taken atomically.
    fn scan_single_token(&self, text: &str, pos: usize) -> usize {
        let bytes = text.as_bytes();
        let mut depth = 0i32;
        let mut i = pos;
        while i < bytes.len() {
            let b = bytes[i];
            if b == b'\'' {
                i = skip_quoted(bytes, i);
                continue;
            }
            if b.is_ascii_whitespace() {
                break;
            }
            match b {
                b'(' => depth += 1,
                b')' => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                b',' if depth == 0 => break,
                _ => {}
            }
            i += 1;
        }
        i
    }
}

impl Replacement {
    /// Compile a replacement string.
    pub(crate) fn compile(text: &str) -> Replacement {
        let chars: Vec<char> = text.chars().collect();
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut i = 0;
        while i < chars.len() {
            if chars[i] == '@' && i + 2 < chars.len() && chars[i + 1] == '@' && chars[i + 2] == '@'
            {
                if !literal.is_empty() {
                    parts.push(ReplacePart::Literal(std::mem::take(&mut literal)));
                }
                let mut end = i + 3;
                let mut name = String::new();
                if end < chars.len() && chars[end].is_ascii_lowercase() {
                    name.push(chars[end]);
                    end += 1;
                }
                parts.push(ReplacePart::Capture(name));
                i = end;
            } else {
                literal.push(chars[i]);
                i += 1;
            }
        }
        if !literal.is_empty() {
            parts.push(ReplacePart::Literal(literal));
        }
        Replacement { parts }
    }

    /// Names this replacement references.
    pub(crate) fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|p| match p {
            ReplacePart::Capture(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Substitute captured text (trimmed, original casing) into the
    /// replacement.
    pub(crate) fn render(&self, text: &str, m: &PatternMatch) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                ReplacePart::Literal(s) => out.push_str(s),
                ReplacePart::Capture(name) => {
                    if let Some((_, (s, e))) = m.captures.iter().find(|(n, _)| n == name) {
                        out.push_str(text[*s..*e].trim());
                    }
                }
            }
        }
        out
    }
}

fn literal_matches(text: &[u8], pos: usize, lit: &[u8]) -> bool {
    pos + lit.len() <= text.len()
        && text[pos..pos + lit.len()]
            .iter()
            .zip(lit)
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
