//! Parameter values and binding maps for template rendering.
//!
//! Templates are rendered against a [`Bindings`] map from parameter name to
//! [`Value`]. Values are a small tagged variant covering the scalar types a
//! SQL template cares about plus ordered sequences of scalars (for `IN`
//! lists and similar).

use std::collections::HashMap;

/// A value bound to a template parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer value, rendered bare (`123`).
    Int(i64),
    /// Real value, rendered via the shortest round-trip form (`3.5`).
    Real(f64),
    /// Boolean value, rendered as `TRUE` / `FALSE` in substitution context.
    Bool(bool),
    /// String value, rendered bare (no quotes) in substitution context.
    Str(String),
    /// Ordered sequence of scalars, rendered comma-separated with string
    /// elements single-quoted.
    Seq(Vec<Value>),
}

impl Value {
    /// The string form used when the value is substituted into SQL text.
    ///
    /// Strings render without quotes (the template decides whether it wants
    /// `'@name'` or a bare identifier), while string elements *inside* a
    /// sequence are quoted so that `IN (@list)` produces a valid list.
    pub fn render(&self) -> String {
        match self {
            Value::Int(i) => i.to_string(),
            Value::Real(r) => r.to_string(),
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::Str(s) => s.clone(),
            Value::Seq(items) => {
                let rendered: Vec<String> = items.iter().map(Value::render_element).collect();
                rendered.join(",")
            }
        }
    }

    /// The string form used for an element of a sequence: strings are
    /// single-quoted (embedded quotes doubled), everything else renders as
    /// in substitution context.
    fn render_element(&self) -> String {
        match self {
            Value::Str(s) => format!("'{}'", s.replace('\'', "''")),
            other => other.render(),
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Seq(v.into_iter().map(Into::into).collect())
    }
}

/// A map from parameter name to bound value.
///
/// Names are case-sensitive and carry no `@` sigil. The builder-style
/// [`Bindings::set`] makes inline construction read naturally:
///
/// ```
/// use sqlweave::{Bindings, render};
///
/// let bindings = Bindings::new().set("table", "person").set("limit", 10);
/// let sql = render("SELECT * FROM @table", &bindings).unwrap();
/// assert_eq!(sql, "SELECT * FROM person");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: HashMap<String, Value>,
}

impl Bindings {
    /// Create an empty binding map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, returning the updated map.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Bind `name` to `value` in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Look up a binding.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// True if no parameters are bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of bound parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl FromIterator<(String, Value)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Bindings {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_scalars() {
        assert_eq!(Value::Int(123).render(), "123");
        assert_eq!(Value::Real(3.5).render(), "3.5");
        assert_eq!(Value::Real(2.0).render(), "2");
        assert_eq!(Value::Bool(true).render(), "TRUE");
        assert_eq!(Value::Bool(false).render(), "FALSE");
        assert_eq!(Value::Str("my_table".into()).render(), "my_table");
    }

    #[test]
    fn test_render_sequence_of_ints() {
        let v = Value::from(vec![1i64, 2, 3]);
        assert_eq!(v.render(), "1,2,3");
    }

    #[test]
    fn test_render_sequence_quotes_strings() {
        let v = Value::from(vec!["a", "b"]);
        assert_eq!(v.render(), "'a','b'");
    }

    #[test]
    fn test_render_sequence_escapes_quotes() {
        let v = Value::from(vec!["it's"]);
        assert_eq!(v.render(), "'it''s'");
    }

    #[test]
    fn test_as_number() {
        assert_eq!(Value::Int(2).as_number(), Some(2.0));
        assert_eq!(Value::Real(2.5).as_number(), Some(2.5));
        assert_eq!(Value::Str("2".into()).as_number(), None);
        assert_eq!(Value::Bool(true).as_number(), None);
    }

    #[test]
    fn test_bindings_builder() {
        let b = Bindings::new().set("x", 1).set("y", "two");
        assert_eq!(b.len(), 2);
        assert_eq!(b.get("x"), Some(&Value::Int(1)));
        assert_eq!(b.get("y"), Some(&Value::Str("two".into())));
        assert_eq!(b.get("z"), None);
    }

    #[test]
    fn test_bindings_names_are_case_sensitive() {
        let b = Bindings::new().set("Table", "t1");
        assert!(b.get("table").is_none());
        assert!(b.get("Table").is_some());
    }

    #[test]
    fn test_bindings_last_set_wins() {
        let b = Bindings::new().set("x", 1).set("x", 2);
        assert_eq!(b.get("x"), Some(&Value::Int(2)));
    }
}
