//! Temp-table emulation.
//!
//! The canonical dialect spells session-local temp tables `#name`. Several
//! targets have no equivalent, so references are rewritten to ordinary
//! tables in a scratch schema, suffixed with a per-process session salt to
//! keep concurrent users of the same schema apart:
//!
//! - with an emulation schema configured: `#name` ->
//!   `schema.name_<salt>`
//! - without: `#name` -> `name_<salt>`
//!
//! All occurrences of a given `#name` rewrite to the same identifier, so
//! statements that create and then read a temp table keep referring to the
//! same object.

use std::sync::OnceLock;

use once_cell::sync::Lazy;
use regex::Regex;
use ring::rand::{SecureRandom, SystemRandom};

use super::quoting::literal_mask;
use super::TranslateError;
use crate::dialect::Dialect;

/// Salt length; long enough that collisions between concurrent sessions
/// are not a practical concern.
const SALT_LEN: usize = 8;

static SESSION_SALT: OnceLock<String> = OnceLock::new();

static TEMP_TABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([A-Za-z_][A-Za-z0-9_]*)").unwrap());

/// The process-wide session salt, created lazily on first use and stable
/// for the lifetime of the process.
pub fn session_salt() -> &'static str {
    SESSION_SALT.get_or_init(|| {
        let rng = SystemRandom::new();
        let mut bytes = [0u8; SALT_LEN];
        rng.fill(&mut bytes).expect("failed to generate session salt");
        const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
        bytes
            .iter()
            .map(|b| ALPHABET[*b as usize % ALPHABET.len()] as char)
            .collect()
    })
}

/// Rewrite `#name` references for dialects that need emulation. Other
/// dialects pass through unchanged.
pub(crate) fn emulate(
    sql: &str,
    dialect: Dialect,
    schema: Option<&str>,
) -> Result<String, TranslateError> {
    if !dialect.requires_temp_table_emulation() {
        return Ok(sql.to_string());
    }

    let mask = literal_mask(sql);
    let salt = session_salt();
    let limit = dialect.max_temp_name_len();

    let mut out = String::with_capacity(sql.len());
    let mut last = 0;
    for m in TEMP_TABLE_RE.find_iter(sql) {
        if mask[m.start()] {
            continue;
        }
        let name = &sql[m.start() + 1..m.end()];
        if name.len() > limit {
            return Err(TranslateError::IdentifierTooLong {
                name: name.to_string(),
                dialect: dialect.name().to_string(),
                limit,
            });
        }
        out.push_str(&sql[last..m.start()]);
        if let Some(schema) = schema {
            out.push_str(schema);
            out.push('.');
        }
        out.push_str(name);
        out.push('_');
        out.push_str(salt);
        last = m.end();
    }
    out.push_str(&sql[last..]);
    Ok(out)
}
