//! Predicate maps for record queries.
//!
//! A predicate map is a JSON object of `{field: {"eq" | "ne": value}}`
//! entries, all of which must hold (AND). A field missing from a record is
//! read as `null`, so `{"ne": "x"}` matches it and `{"ne": null}` does not.
//!
//! ```rust
//! use classroom::storage::Query;
//! use serde_json::json;
//!
//! let query = Query::parse(&json!({
//!     "student_id": {"eq": "stu1"},
//!     "category": {"ne": null},
//! }))
//! .unwrap();
//! assert_eq!(query.predicates().len(), 2);
//! ```

use crate::models::Record;
use crate::{Error, Result};
use serde_json::Value;
use std::fmt;

/// Comparison operator of a single predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Field equals the value.
    Eq,
    /// Field does not equal the value.
    Ne,
}

impl Operator {
    /// Returns the operator keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
        }
    }

    /// Parses an operator keyword.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One field comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Record field name.
    pub field: String,
    /// Comparison operator.
    pub operator: Operator,
    /// Value to compare against.
    pub value: Value,
}

impl Predicate {
    /// Returns true if `record` satisfies this predicate.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        let actual = record.get(&self.field).unwrap_or(&Value::Null);
        let equal = values_equal(actual, &self.value);
        match self.operator {
            Operator::Eq => equal,
            Operator::Ne => !equal,
        }
    }
}

/// A conjunction of predicates. The empty query matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    predicates: Vec<Predicate>,
}

impl Query {
    /// Creates an empty query.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    /// Adds an equality predicate.
    #[must_use]
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Operator::Eq, value)
    }

    /// Adds an inequality predicate.
    #[must_use]
    pub fn ne(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Operator::Ne, value)
    }

    fn with(mut self, field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate {
            field: field.into(),
            operator,
            value: value.into(),
        });
        self
    }

    /// Parses a predicate map.
    ///
    /// Each entry is either `{field: {"eq": v}}`, `{field: {"ne": v}}`, or a
    /// bare `{field: v}` shorthand for equality.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the map is not an object, or an
    /// operator object is empty, has several keys, or names an unknown
    /// operator.
    pub fn parse(map: &Value) -> Result<Self> {
        let Value::Object(entries) = map else {
            return Err(Error::Validation(format!(
                "predicate map must be a JSON object, got {map}"
            )));
        };

        let mut query = Self::new();
        for (field, condition) in entries {
            let (operator, value) = parse_condition(field, condition)?;
            query = query.with(field.clone(), operator, value);
        }
        Ok(query)
    }

    /// Returns the predicates in insertion order.
    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Returns true if the query has no predicates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Returns true if `record` satisfies every predicate.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }
}

impl TryFrom<&Value> for Query {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        Self::parse(value)
    }
}

fn parse_condition(field: &str, condition: &Value) -> Result<(Operator, Value)> {
    let Value::Object(ops) = condition else {
        return Ok((Operator::Eq, condition.clone()));
    };

    let mut iter = ops.iter();
    match (iter.next(), iter.next()) {
        (Some((op, value)), None) => Operator::parse(op)
            .map(|operator| (operator, value.clone()))
            .ok_or_else(|| {
                Error::Validation(format!("unknown operator '{op}' for field '{field}'"))
            }),
        (None, _) => Err(Error::Validation(format!(
            "empty condition for field '{field}'"
        ))),
        (Some(_), Some(_)) => Err(Error::Validation(format!(
            "field '{field}' must have exactly one operator"
        ))),
    }
}

/// JSON equality that treats numerically equal numbers as equal (`1 == 1.0`).
#[allow(clippy::float_cmp)]
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => match (x.as_u64(), y.as_u64()) {
                (Some(x), Some(y)) => x == y,
                _ => x.as_f64() == y.as_f64(),
            },
        },
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::record_from;
    use serde_json::json;

    fn question(student: &str, category: Value) -> Record {
        record_from(json!({"student_id": student, "category": category}))
    }

    #[test]
    fn test_eq_matches_exact_value() {
        let query = Query::new().eq("student_id", "stu1");
        assert!(query.matches(&question("stu1", Value::Null)));
        assert!(!query.matches(&question("stu2", Value::Null)));
    }

    #[test]
    fn test_ne_null_requires_present_non_null() {
        let query = Query::new().ne("category", Value::Null);
        assert!(query.matches(&question("s", json!("知识点定义类"))));
        assert!(!query.matches(&question("s", Value::Null)));
        assert!(!query.matches(&record_from(json!({"student_id": "s"}))));
    }

    #[test]
    fn test_ne_value_matches_missing_field() {
        let query = Query::new().ne("category", "知识点定义类");
        assert!(query.matches(&record_from(json!({"student_id": "s"}))));
        assert!(!query.matches(&question("s", json!("知识点定义类"))));
    }

    #[test]
    fn test_eq_null_matches_missing_field() {
        let query = Query::new().eq("category", Value::Null);
        assert!(query.matches(&record_from(json!({}))));
    }

    #[test]
    fn test_conjunction() {
        let query = Query::parse(&json!({
            "student_id": {"eq": "stu1"},
            "category": {"ne": null},
        }))
        .unwrap();
        assert!(query.matches(&question("stu1", json!("知识点应用类"))));
        assert!(!query.matches(&question("stu1", Value::Null)));
        assert!(!query.matches(&question("stu2", json!("知识点应用类"))));
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let query = Query::parse(&json!({})).unwrap();
        assert!(query.is_empty());
        assert!(query.matches(&record_from(json!({"anything": 1}))));
    }

    #[test]
    fn test_bare_value_is_equality() {
        let query = Query::parse(&json!({"category": null})).unwrap();
        assert_eq!(query.predicates()[0].operator, Operator::Eq);
        assert!(query.matches(&question("s", Value::Null)));
    }

    #[test]
    fn test_numbers_compare_numerically() {
        let query = Query::new().eq("id", 3);
        assert!(query.matches(&record_from(json!({"id": 3.0}))));
        assert!(!query.matches(&record_from(json!({"id": "3"}))));
    }

    #[test]
    fn test_rejects_malformed_maps() {
        assert!(matches!(Query::parse(&json!([1])), Err(Error::Validation(_))));
        assert!(matches!(
            Query::parse(&json!({"a": {"gt": 1}})),
            Err(Error::Validation(msg)) if msg.contains("gt")
        ));
        assert!(matches!(
            Query::parse(&json!({"a": {}})),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            Query::parse(&json!({"a": {"eq": 1, "ne": 2}})),
            Err(Error::Validation(_))
        ));
    }
}
