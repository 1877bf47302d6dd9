//! # sqlweave
//!
//! SQL templating and dialect translation from a single source of truth.
//!
//! Programs that speak to many back-end databases write their SQL once, in
//! a canonical SQL-Server-flavored dialect, with a small templating
//! language layered on top; `sqlweave` renders the template against a set
//! of parameter bindings and then translates the rendered SQL to the
//! target dialect through an ordered, data-driven rule table.
//!
//! ## Quick Start
//!
//! ```
//! use sqlweave::{render_translate, Bindings};
//!
//! let sql = render_translate(
//!     "SELECT person_id FROM @cdm_schema.person WHERE year_of_birth > @year",
//!     "postgresql",
//!     &Bindings::new().set("cdm_schema", "cdm").set("year", 1980),
//!     None,
//! )
//! .unwrap();
//! assert_eq!(sql, "SELECT person_id FROM cdm.person WHERE year_of_birth > 1980");
//! ```
//!
//! ## Architecture
//!
//! ```text
//! template text ──► render (scanner + guard evaluator + emitter)
//!                      │
//!                      ▼                    replacement pattern table
//!               canonical SQL ──► translate ◄──────────────────────
//!                                    │
//!                  rule loop ► temp-table emulation ► hint expansion
//!                                    │
//!                                    ▼
//!                              target-dialect SQL
//! ```
//!
//! Rendering is total with respect to bindings (unbound parameters render
//! empty); translation is best-effort and rule-scoped by design, a pattern
//! engine rather than a SQL parser. Both are pure functions of their
//! inputs and safe to call concurrently.

pub mod config;
pub mod dialect;
pub mod template;
pub mod translate;
pub mod value;

pub use config::{set_temp_emulation_schema, temp_emulation_schema, Settings};
pub use dialect::Dialect;
pub use template::{render, TemplateError};
pub use translate::{
    default_table, translate, translate_dialect, translate_with_table, RuleTable, TranslateError,
};
pub use value::{Bindings, Value};

use thiserror::Error;

/// Any error from the combined render-then-translate operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Translate(#[from] TranslateError),
}

/// Render a template and translate the result in one call.
pub fn render_translate(
    template: &str,
    target: &str,
    bindings: &Bindings,
    temp_emulation_schema: Option<&str>,
) -> Result<String, Error> {
    let rendered = render(template, bindings)?;
    Ok(translate(&rendered, target, temp_emulation_schema)?)
}

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::{set_temp_emulation_schema, temp_emulation_schema};
    pub use crate::dialect::Dialect;
    pub use crate::template::{render, TemplateError};
    pub use crate::translate::{
        translate, translate_dialect, translate_with_table, RuleTable, TranslateError,
    };
    pub use crate::value::{Bindings, Value};
    pub use crate::{render_translate, Error};
}
