//! Two-pass template renderer.
//!
//! Pass one collects `{DEFAULT ...}` declarations from the whole segment
//! tree (conditional bodies included, last declaration wins). Pass two
//! emits: text verbatim, parameters via their effective binding, and
//! conditionals by evaluating the guard and rendering the selected body.

use std::collections::HashMap;

use super::expr;
use super::scanner::{self, Segment};
use super::TemplateError;
use crate::value::{Bindings, Value};

/// Render a template against a set of parameter bindings.
///
/// An explicit binding wins over a default declaration; a parameter with
/// neither renders as the empty string. See the module docs for the markup
/// constructs.
pub fn render(template: &str, bindings: &Bindings) -> Result<String, TemplateError> {
    let segments = scanner::scan(template)?;

    let mut defaults = HashMap::new();
    collect_defaults(&segments, &mut defaults);

    let mut out = String::with_capacity(template.len());
    emit(&segments, bindings, &defaults, &mut out)?;
    Ok(out)
}

fn collect_defaults(segments: &[Segment], defaults: &mut HashMap<String, Value>) {
    for segment in segments {
        match segment {
            Segment::Default { name, value } => {
                defaults.insert(name.clone(), value.clone());
            }
            Segment::Cond {
                then_body,
                else_body,
                ..
            } => {
                collect_defaults(then_body, defaults);
                if let Some(body) = else_body {
                    collect_defaults(body, defaults);
                }
            }
            _ => {}
        }
    }
}

fn emit(
    segments: &[Segment],
    bindings: &Bindings,
    defaults: &HashMap<String, Value>,
    out: &mut String,
) -> Result<(), TemplateError> {
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Param { name } => {
                if let Some(value) = effective(name, bindings, defaults) {
                    out.push_str(&value.render());
                }
            }
            Segment::Default { .. } => {}
            Segment::Cond {
                expr,
                expr_offset,
                then_body,
                else_body,
            } => {
                let truthy = expr::eval_guard(expr, *expr_offset, |name| {
                    effective(name, bindings, defaults).cloned()
                })?;
                if truthy {
                    emit(then_body, bindings, defaults, out)?;
                } else if let Some(body) = else_body {
                    emit(body, bindings, defaults, out)?;
                }
            }
        }
    }
    Ok(())
}

fn effective<'a>(
    name: &str,
    bindings: &'a Bindings,
    defaults: &'a HashMap<String, Value>,
) -> Option<&'a Value> {
    bindings.get(name).or_else(|| defaults.get(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_plain_sql_unchanged() {
        let sql = "SELECT a, b FROM t WHERE c = 'x''y';";
        assert_eq!(render(sql, &Bindings::new()).unwrap(), sql);
    }

    #[test]
    fn test_render_parameter_substitution() {
        let sql = render(
            "SELECT * FROM @x WHERE id=@a",
            &Bindings::new().set("x", "my_table").set("a", 123),
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM my_table WHERE id=123");
    }

    #[test]
    fn test_render_sequence_binding() {
        let sql = render(
            "SELECT * FROM table WHERE id IN (@a)",
            &Bindings::new().set("a", vec![1i64, 2, 3]),
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM table WHERE id IN (1,2,3)");
    }

    #[test]
    fn test_render_unbound_parameter_is_empty() {
        let sql = render("SELECT @missing FROM t", &Bindings::new()).unwrap();
        assert_eq!(sql, "SELECT  FROM t");
    }

    #[test]
    fn test_render_default_used_when_unbound() {
        let sql = render("{DEFAULT @a=1} SELECT @a", &Bindings::new()).unwrap();
        assert_eq!(sql, " SELECT 1");
    }

    #[test]
    fn test_render_binding_overrides_default() {
        let sql = render("{DEFAULT @a=1} SELECT @a", &Bindings::new().set("a", 2)).unwrap();
        assert_eq!(sql, " SELECT 2");
    }

    #[test]
    fn test_render_last_default_wins() {
        let sql = render("{DEFAULT @a=1}{DEFAULT @a=2}SELECT @a", &Bindings::new()).unwrap();
        assert_eq!(sql, "SELECT 2");
    }

    #[test]
    fn test_render_default_inside_conditional_body_collected() {
        // Defaults are collected from the whole template before emission,
        // even when the declaring body is not rendered.
        let sql = render("{FALSE} ? {{DEFAULT @a=7}}SELECT @a", &Bindings::new()).unwrap();
        assert_eq!(sql, "SELECT 7");
    }

    #[test]
    fn test_render_conditional_true() {
        let sql = render(
            "SELECT * FROM t {@x IN (1,2,3)} ? {WHERE id=@x}",
            &Bindings::new().set("x", 2),
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE id=2");
    }

    #[test]
    fn test_render_conditional_false_without_else() {
        let sql = render(
            "SELECT * FROM t {@x IN (1,2,3)} ? {WHERE id=@x}",
            &Bindings::new().set("x", 9),
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM t ");
    }

    #[test]
    fn test_render_conditional_else() {
        let sql = render(
            "{@flag} ? {SELECT 1} : {SELECT 2}",
            &Bindings::new().set("flag", false),
        )
        .unwrap();
        assert_eq!(sql, "SELECT 2");
    }

    #[test]
    fn test_render_nested_conditionals() {
        let template = "{@a} ? {A{@b} ? {B} : {C}}";
        let sql = render(template, &Bindings::new().set("a", 1).set("b", 1)).unwrap();
        assert_eq!(sql, "AB");
        let sql = render(template, &Bindings::new().set("a", 1).set("b", 0)).unwrap();
        assert_eq!(sql, "AC");
        let sql = render(template, &Bindings::new().set("a", 0).set("b", 1)).unwrap();
        assert_eq!(sql, "");
    }

    #[test]
    fn test_render_unbound_guard_is_false() {
        let sql = render("SELECT 1 {@missing} ? {WHERE x=1}", &Bindings::new()).unwrap();
        assert_eq!(sql, "SELECT 1 ");
    }

    #[test]
    fn test_render_bool_binding() {
        let sql = render("SELECT @flag", &Bindings::new().set("flag", true)).unwrap();
        assert_eq!(sql, "SELECT TRUE");
    }

    #[test]
    fn test_render_at_sign_in_string_literal_preserved() {
        let sql = render("SELECT 'a@b' FROM t", &Bindings::new().set("b", "nope")).unwrap();
        assert_eq!(sql, "SELECT 'a@b' FROM t");
    }

    #[test]
    fn test_render_expression_error_propagates() {
        let err = render("{1 ==} ? {x}", &Bindings::new()).unwrap_err();
        assert!(matches!(err, TemplateError::Expression { .. }));
    }

    #[test]
    fn test_render_syntax_error_propagates() {
        let err = render("SELECT {", &Bindings::new()).unwrap_err();
        assert!(matches!(err, TemplateError::Syntax { offset: 7, .. }));
    }
}
