//! String-literal protection for the translation transforms.
//!
//! Every transform that scans SQL text consults a per-input mask of byte
//! positions that sit inside single-quoted string literals (the quotes
//! themselves included), so literal content is never rewritten by
//! accident. `''` is the escape for a quote inside a literal.

/// Mark every byte position inside a single-quoted literal.
pub(crate) fn literal_mask(sql: &str) -> Vec<bool> {
    let bytes = sql.as_bytes();
    let mut mask = vec![false; bytes.len()];
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            let end = skip_quoted(bytes, i);
            for flag in &mut mask[i..end] {
                *flag = true;
            }
            i = end;
        } else {
            i += 1;
        }
    }
    mask
}

/// Advance past the single-quoted literal starting at `start` (which must
/// be a `'`), honoring `''` escapes. An unterminated literal runs to the
/// end of input.
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
