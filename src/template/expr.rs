//! Guard expressions for conditional template blocks.
//!
//! The expression language is small: comparisons (`==`, `!=`, `<`, `<=`,
//! `>`, `>=`), membership (`IN (...)`), negation (`!`), conjunction (`&`),
//! disjunction (`|`), parentheses, and operands that are numbers, quoted
//! strings, bare words, `TRUE`/`FALSE`, or `@name` parameter references.
//!
//! Parameter references are resolved against the effective bindings at
//! evaluation time; an unbound reference yields the empty string, which
//! drives comparisons false and bare guards false.

use chumsky::prelude::*;

use super::TemplateError;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Num(f64),
    Str(String),
    Bool(bool),
    Param(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Cmp(CmpOp, Box<Expr>, Box<Expr>),
    In(Box<Expr>, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Parser for the guard expression grammar.
///
/// Precedence, tight to loose: `!`, comparison, `&`, `|`.
fn parser<'src>() -> impl Parser<'src, &'src str, Expr, extra::Err<Rich<'src, char>>> {
    let expr = recursive(|expr| {
        let number = just('-')
            .or_not()
            .then(text::digits(10))
            .then(just('.').then(text::digits(10)).or_not())
            .to_slice()
            .map(|s: &str| Expr::Num(s.parse().unwrap_or_default()));

        // Single-quoted string with '' escapes.
        let string = just('\'')
            .ignore_then(
                choice((just("''").to('\''), none_of('\'')))
                    .repeated()
                    .collect::<String>(),
            )
            .then_ignore(just('\''))
            .map(Expr::Str);

        let param = just('@')
            .ignore_then(text::ident())
            .map(|name: &str| Expr::Param(name.to_string()));

        // Bare words are strings, except the boolean keywords.
        let word = text::ident().map(|w: &str| {
            if w.eq_ignore_ascii_case("TRUE") {
                Expr::Bool(true)
            } else if w.eq_ignore_ascii_case("FALSE") {
                Expr::Bool(false)
            } else {
                Expr::Str(w.to_string())
            }
        });

        let atom = recursive(|atom| {
            choice((
                just('!')
                    .padded()
                    .ignore_then(atom)
                    .map(|e: Expr| Expr::Not(Box::new(e))),
                expr.clone()
                    .delimited_by(just('(').padded(), just(')').padded()),
                number,
                string,
                param,
                word,
            ))
            .padded()
        });

        let cmp_op = choice((
            just("==").to(CmpOp::Eq),
            just("!=").to(CmpOp::Ne),
            just("<=").to(CmpOp::Le),
            just(">=").to(CmpOp::Ge),
            just('<').to(CmpOp::Lt),
            just('>').to(CmpOp::Gt),
        ))
        .padded();

        let in_kw = text::ident()
            .try_map(|w: &str, span| {
                if w.eq_ignore_ascii_case("IN") {
                    Ok(())
                } else {
                    Err(Rich::custom(span, "expected IN"))
                }
            })
            .padded();

        let atom_list = atom
            .clone()
            .separated_by(just(',').padded())
            .at_least(1)
            .collect::<Vec<Expr>>();

        let in_clause =
            in_kw.ignore_then(atom_list.delimited_by(just('(').padded(), just(')').padded()));

        let cmp = atom
            .clone()
            .then(
                choice((
                    cmp_op
                        .then(atom.clone())
                        .map(|(op, rhs)| CmpTail::Cmp(op, rhs)),
                    in_clause.map(CmpTail::In),
                ))
                .or_not(),
            )
            .map(|(lhs, tail)| match tail {
                None => lhs,
                Some(CmpTail::Cmp(op, rhs)) => Expr::Cmp(op, Box::new(lhs), Box::new(rhs)),
                Some(CmpTail::In(items)) => Expr::In(Box::new(lhs), items),
            });

        let and = cmp.clone().foldl(
            just('&').padded().ignore_then(cmp).repeated(),
            |lhs, rhs| Expr::And(Box::new(lhs), Box::new(rhs)),
        );

        and.clone().foldl(
            just('|').padded().ignore_then(and).repeated(),
            |lhs, rhs| Expr::Or(Box::new(lhs), Box::new(rhs)),
        )
    });

    expr.then_ignore(end())
}

enum CmpTail {
    Cmp(CmpOp, Expr),
    In(Vec<Expr>),
}

/// A resolved operand during evaluation.
#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Num(f64),
    Text(String),
    Bool(bool),
    Seq(Vec<Operand>),
}

impl Operand {
    fn from_value(value: &Value) -> Operand {
        match value {
            Value::Int(i) => Operand::Num(*i as f64),
            Value::Real(r) => Operand::Num(*r),
            Value::Bool(b) => Operand::Bool(*b),
            Value::Str(s) => Operand::Text(s.clone()),
            Value::Seq(items) => Operand::Seq(items.iter().map(Operand::from_value).collect()),
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Operand::Num(n) => Some(*n),
            Operand::Text(t) => t.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_text(&self) -> String {
        match self {
            Operand::Num(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Operand::Text(t) => t.clone(),
            Operand::Bool(true) => "TRUE".to_string(),
            Operand::Bool(false) => "FALSE".to_string(),
            Operand::Seq(items) => {
                let parts: Vec<String> = items.iter().map(Operand::as_text).collect();
                parts.join(",")
            }
        }
    }

    fn truthy(&self) -> bool {
        match self {
            Operand::Num(n) => *n != 0.0,
            Operand::Bool(b) => *b,
            Operand::Text(t) => !t.is_empty() && !t.eq_ignore_ascii_case("FALSE") && t != "0",
            Operand::Seq(items) => !items.is_empty(),
        }
    }
}

/// Evaluate a guard expression to a boolean.
///
/// `offset` is the absolute offset of the expression text in the template,
/// used to report parse errors. A blank guard evaluates false (this is what
/// an unbound bare parameter reference looks like after substitution).
pub(crate) fn eval_guard<F>(
    expr_text: &str,
    offset: usize,
    lookup: F,
) -> Result<bool, TemplateError>
where
    F: Fn(&str) -> Option<Value>,
{
    if expr_text.trim().is_empty() {
        return Ok(false);
    }
    let parsed = parser()
        .parse(expr_text)
        .into_result()
        .map_err(|errors| {
            let first = &errors[0];
            TemplateError::Expression {
                message: first.to_string(),
                offset: offset + first.span().start,
            }
        })?;
    Ok(eval(&parsed, &lookup).truthy())
}

fn eval<F>(expr: &Expr, lookup: &F) -> Operand
where
    F: Fn(&str) -> Option<Value>,
{
    match expr {
        Expr::Num(n) => Operand::Num(*n),
        Expr::Str(s) => Operand::Text(s.clone()),
        Expr::Bool(b) => Operand::Bool(*b),
        Expr::Param(name) => lookup(name)
            .as_ref()
            .map(Operand::from_value)
            .unwrap_or_else(|| Operand::Text(String::new())),
        Expr::Not(inner) => Operand::Bool(!eval(inner, lookup).truthy()),
        Expr::And(lhs, rhs) => {
            // Short-circuit.
            if !eval(lhs, lookup).truthy() {
                Operand::Bool(false)
            } else {
                Operand::Bool(eval(rhs, lookup).truthy())
            }
        }
        Expr::Or(lhs, rhs) => {
            if eval(lhs, lookup).truthy() {
                Operand::Bool(true)
            } else {
                Operand::Bool(eval(rhs, lookup).truthy())
            }
        }
        Expr::Cmp(op, lhs, rhs) => {
            let lhs = eval(lhs, lookup);
            let rhs = eval(rhs, lookup);
            Operand::Bool(compare(*op, &lhs, &rhs))
        }
        Expr::In(needle, haystack) => {
            let needle = eval(needle, lookup);
            let mut found = false;
            for item in haystack {
                let item = eval(item, lookup);
                // A sequence-valued reference in the list contributes each
                // of its elements.
                let matched = match &item {
                    Operand::Seq(elements) => {
                        elements.iter().any(|e| compare(CmpOp::Eq, &needle, e))
                    }
                    other => compare(CmpOp::Eq, &needle, other),
                };
                if matched {
                    found = true;
                    break;
                }
            }
            Operand::Bool(found)
        }
    }
}

/// Numeric comparison when both sides parse as numbers, otherwise
/// case-sensitive string comparison.
fn compare(op: CmpOp, lhs: &Operand, rhs: &Operand) -> bool {
    if let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) {
        match op {
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
        }
    } else {
        let a = lhs.as_text();
        let b = rhs.as_text();
        match op {
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
        }
    }
}
