//! Dialect translation: the table-driven rule engine and the built-in
//! transforms around it.
//!
//! A translation job runs through a fixed stage pipeline; every stage
//! consumes the full text and produces the full text for the next:
//!
//! ```text
//! INIT -> STRING_PROTECT -> RULE_LOOP -> TEMP_EMUL -> HINT_EXPAND -> DONE
//! ```
//!
//! String protection is recomputed whenever a stage changes the text, so
//! no transform ever rewrites inside a single-quoted literal (rules that
//! explicitly quote a literal in their search pattern excepted). The rule
//! loop applies the target dialect's rules in table order, each scanned
//! left-to-right over the whole text; afterwards the temp-table and MPP
//! hint transforms run. Translating to the canonical dialect is the
//! identity.

mod hints;
mod pattern;
mod quoting;
mod rules;
mod temp_tables;

use thiserror::Error;

pub use rules::{default_table, Rule, RuleTable};
pub use temp_tables::session_salt;

use crate::config;
use crate::dialect::Dialect;

/// Errors raised while loading a rule table or translating SQL.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranslateError {
    /// The requested target dialect is not one of the supported set.
    #[error("unknown target dialect '{0}'")]
    UnknownDialect(String),

    /// A pattern-table row failed to parse or compile.
    #[error("replacement pattern table line {line}: {message}")]
    RuleLoad { message: String, line: usize },

    /// A `#name` temp-table name is too long for a dialect that requires
    /// emulation.
    #[error("temp table name '{name}' exceeds {limit} characters for {dialect}")]
    IdentifierTooLong {
        name: String,
        dialect: String,
        limit: usize,
    },
}

/// Translate rendered SQL to the named target dialect.
///
/// `temp_emulation_schema` overrides the process-wide setting for this
/// call; pass `None` to fall back to it.
pub fn translate(
    sql: &str,
    target: &str,
    temp_emulation_schema: Option<&str>,
) -> Result<String, TranslateError> {
    translate_dialect(sql, Dialect::from_name(target)?, temp_emulation_schema)
}

/// [`translate`] with a pre-parsed dialect.
pub fn translate_dialect(
    sql: &str,
    target: Dialect,
    temp_emulation_schema: Option<&str>,
) -> Result<String, TranslateError> {
    translate_with_table(sql, target, temp_emulation_schema, rules::default_table())
}

/// Translate against a caller-supplied rule table instead of the embedded
/// default. This is the seam tests and embedders use to pin the rule set.
pub fn translate_with_table(
    sql: &str,
    target: Dialect,
    temp_emulation_schema: Option<&str>,
    table: &RuleTable,
) -> Result<String, TranslateError> {
    // The canonical dialect is a passthrough: no rules, no emulation, no
    // hint expansion.
    if target == Dialect::SqlServer {
        return Ok(sql.to_string());
    }

    let mut text = sql.to_string();
    for rule in table.rules_for(target) {
        text = rule.apply(&text);
    }

    let schema = temp_emulation_schema
        .map(str::to_string)
        .or_else(config::temp_emulation_schema);
    text = temp_tables::emulate(&text, target, schema.as_deref())?;

    Ok(hints::expand(&text, target))
}
