//! Rendering behavior across the templating constructs.

use sqlweave::{render, Bindings, TemplateError, Value};

#[test]
fn test_plain_sql_renders_unchanged() {
    let cases = [
        "SELECT * FROM person;",
        "SELECT a, b FROM t WHERE c = 'x''y' -- comment",
        "INSERT INTO t (a) VALUES (1);\nDELETE FROM t;",
        "SELECT '{not} {markup}' FROM t",
    ];
    for sql in cases {
        assert_eq!(render(sql, &Bindings::new()).unwrap(), sql, "case: {sql}");
    }
}

#[test]
fn test_parameter_substitution() {
    let sql = render(
        "SELECT * FROM @x WHERE id=@a",
        &Bindings::new().set("x", "my_table").set("a", 123),
    )
    .unwrap();
    assert_eq!(sql, "SELECT * FROM my_table WHERE id=123");
}

#[test]
fn test_sequence_substitution() {
    let sql = render(
        "SELECT * FROM table WHERE id IN (@a)",
        &Bindings::new().set("a", vec![1i64, 2, 3]),
    )
    .unwrap();
    assert_eq!(sql, "SELECT * FROM table WHERE id IN (1,2,3)");
}

#[test]
fn test_string_sequence_is_quoted() {
    let sql = render(
        "WHERE gender IN (@genders)",
        &Bindings::new().set("genders", vec!["M", "F"]),
    )
    .unwrap();
    assert_eq!(sql, "WHERE gender IN ('M','F')");
}

#[test]
fn test_default_declaration() {
    assert_eq!(
        render("{DEFAULT @a=1} SELECT @a", &Bindings::new()).unwrap(),
        " SELECT 1"
    );
}

#[test]
fn test_default_override() {
    for (value, expected) in [
        (Value::Int(5), "5"),
        (Value::Str("five".into()), "five"),
        (Value::Real(5.5), "5.5"),
    ] {
        let mut bindings = Bindings::new();
        bindings.insert("x", value);
        let sql = render("{DEFAULT @x=d} @x", &bindings).unwrap();
        assert_eq!(sql, format!(" {}", expected));
    }
    // And without an override the default wins.
    assert_eq!(render("{DEFAULT @x=d} @x", &Bindings::new()).unwrap(), " d");
}

#[test]
fn test_conditional_selects_then_branch() {
    let sql = render(
        "SELECT * FROM t {@x IN (1,2,3)} ? {WHERE id=@x}",
        &Bindings::new().set("x", 2),
    )
    .unwrap();
    assert_eq!(sql, "SELECT * FROM t WHERE id=2");
}

#[test]
fn test_conditional_boolean_algebra() {
    // The guard follows the documented truth table for each binding set.
    let template = "{(@a == 1 & @b == 2) | @c} ? {yes} : {no}";
    let cases = [
        (1i64, 2i64, false, "yes"),
        (1, 3, false, "no"),
        (0, 2, false, "no"),
        (0, 0, true, "yes"),
    ];
    for (a, b, c, expected) in cases {
        let sql = render(
            template,
            &Bindings::new().set("a", a).set("b", b).set("c", c),
        )
        .unwrap();
        assert_eq!(sql, expected, "a={a} b={b} c={c}");
    }
}

#[test]
fn test_negated_guard() {
    let sql = render(
        "{!@exclude} ? {SELECT 1}",
        &Bindings::new().set("exclude", false),
    )
    .unwrap();
    assert_eq!(sql, "SELECT 1");
}

#[test]
fn test_string_guard_comparison() {
    let template = "{@gender == 'M'} ? {male} : {other}";
    assert_eq!(
        render(template, &Bindings::new().set("gender", "M")).unwrap(),
        "male"
    );
    assert_eq!(
        render(template, &Bindings::new().set("gender", "F")).unwrap(),
        "other"
    );
}

#[test]
fn test_unbound_parameter_renders_empty_and_guard_false() {
    let sql = render(
        "SELECT @missing FROM t {@missing} ? {WHERE 1=1}",
        &Bindings::new(),
    )
    .unwrap();
    assert_eq!(sql, "SELECT  FROM t ");
}

#[test]
fn test_defaults_collected_before_any_guard_runs() {
    let sql = render(
        "{@low == 5} ? {match} : {miss}{DEFAULT @low = 5}",
        &Bindings::new(),
    )
    .unwrap();
    assert_eq!(sql, "match");
}

#[test]
fn test_literal_at_preserved_inside_strings() {
    let sql = render(
        "SELECT * FROM t WHERE email = 'a@b.com'",
        &Bindings::new().set("b", "X"),
    )
    .unwrap();
    assert_eq!(sql, "SELECT * FROM t WHERE email = 'a@b.com'");
}

#[test]
fn test_whole_template_example() {
    let template = "\
{DEFAULT @cdm_schema = cdm}
SELECT person_id
FROM @cdm_schema.person
{@year != ''} ? {WHERE year_of_birth >= @year}
";
    let sql = render(template, &Bindings::new().set("year", 1990)).unwrap();
    assert_eq!(
        sql,
        "SELECT person_id\nFROM cdm.person\nWHERE year_of_birth >= 1990\n"
    );
    let sql = render(template, &Bindings::new()).unwrap();
    assert_eq!(sql, "SELECT person_id\nFROM cdm.person\n\n");
}

#[test]
fn test_unterminated_block_reports_offset() {
    let err = render("SELECT 1 {oops", &Bindings::new()).unwrap_err();
    assert_eq!(
        err,
        TemplateError::Syntax {
            message: "unmatched '{'".to_string(),
            offset: 9,
        }
    );
}

#[test]
fn test_malformed_guard_is_an_error() {
    let err = render("{@a ==} ? {x}", &Bindings::new()).unwrap_err();
    assert!(matches!(err, TemplateError::Expression { .. }));
}
