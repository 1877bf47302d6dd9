//! Template front-end: scanner, guard-expression evaluator, and renderer.
//!
//! Templates are SQL text interleaved with three markup constructs:
//!
//! - **Parameter references**: `@name`, substituted with the bound value.
//! - **Default declarations**: `{DEFAULT @name = literal}`, removed from
//!   the output; they supply a value for parameters the caller leaves
//!   unbound.
//! - **Conditional blocks**: `{expr} ? {then} : {else}` (the else arm is
//!   optional); the guard expression is evaluated against the bindings and
//!   the selected body is rendered in place.
//!
//! Everything else, including single-quoted string literals and SQL
//! comments, passes through untouched. Rendering is total with respect to
//! bindings: an unbound parameter with no default renders as the empty
//! string rather than failing, so templates with optional parameters stay
//! usable.
//!
//! ```
//! use sqlweave::{render, Bindings};
//!
//! let sql = render(
//!     "SELECT * FROM person {@age != ''} ? {WHERE age > @age}",
//!     &Bindings::new().set("age", 21),
//! )
//! .unwrap();
//! assert_eq!(sql, "SELECT * FROM person WHERE age > 21");
//! ```

mod expr;
mod renderer;
mod scanner;

use thiserror::Error;

pub use renderer::render;

/// Errors raised while rendering a template.
///
/// Offsets are byte offsets into the template text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// The template markup itself is malformed (an unterminated block).
    #[error("template syntax error at offset {offset}: {message}")]
    Syntax { message: String, offset: usize },

    /// A conditional guard expression could not be parsed.
    #[error("expression error at offset {offset}: {message}")]
    Expression { message: String, offset: usize },
}
