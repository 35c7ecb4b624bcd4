use crate::collection::Document;
use crate::common::{Value, AND_KEY, NEAR_KEY, OR_KEY};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::geo::{DistanceUnit, NearClause};
use itertools::Itertools;
use regex::Regex;

use super::{compile_like, compile_regexp, logical_filters};

const OPTIONS_KEY: &str = "options";
const MAX_DISTANCE_KEY: &str = "maxDistance";
const MIN_DISTANCE_KEY: &str = "minDistance";
const UNIT_KEY: &str = "unit";

const OPERATORS: [&str; 13] = [
    "inq", "nin", "neq", "like", "nlike", "ilike", "nilike", "regexp", "between", "gt", "gte",
    "lt", "lte",
];

/// Relational operators resolved through the three-way compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Greater,
    GreaterEqual,
    Lesser,
    LesserEqual,
}

/// The test applied to one field of a document.
#[derive(Debug, Clone)]
pub enum Condition {
    /// Loose equality against a literal. Nested documents and arrays
    /// compare structurally.
    Equals(Value),
    /// A regular expression literal, tested against string values.
    Matches(Regex),
    /// An unset condition; never matches.
    Undefined,
    /// Proximity clause, resolved by the geo stage of a query.
    Near(NearClause),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    NotEquals(Value),
    /// SQL LIKE family, already translated to a regular expression.
    Like { regex: Regex, negate: bool },
    Regexp(Regex),
    Between(Value, Value),
    Compare(Comparison, Value),
}

/// One entry of a predicate mapping.
#[derive(Debug, Clone)]
pub enum Clause {
    Field { key: String, condition: Condition },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

/// A where clause: clauses that must all hold.
///
/// A predicate is either built with the fluent API or parsed from the
/// JSON form used by the persistence layer.
///
/// ```rust,ignore
/// use memstore::filter::{field, or};
///
/// let by_api = field("seq").gte(2).and(or(vec![
///     field("vip").eq(true),
///     field("name").like("%St%")?,
/// ]));
/// let by_json = Predicate::from_json(&json!({
///     "seq": {"gte": 2},
///     "or": [{"vip": true}, {"name": {"like": "%St%"}}]
/// }))?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

/// Switches that change how conditions evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// When set, a `neq` against a value it cannot be compared with matches.
    pub legacy_neq: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        MatchOptions {
            legacy_neq: cfg!(feature = "legacy_neq"),
        }
    }
}

impl Predicate {
    /// A predicate without clauses, matching every document.
    pub fn new() -> Self {
        Predicate { clauses: Vec::new() }
    }

    pub fn field(key: &str, condition: Condition) -> Self {
        Predicate {
            clauses: vec![Clause::Field {
                key: key.to_string(),
                condition,
            }],
        }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Adds every clause of `other` to this predicate.
    pub fn and(mut self, other: Predicate) -> Self {
        self.clauses.extend(other.clauses);
        self
    }

    /// Either this predicate or `other`.
    pub fn or(self, other: Predicate) -> Self {
        Predicate {
            clauses: vec![Clause::Or(vec![self, other])],
        }
    }

    pub fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    /// Evaluates the predicate against one document.
    pub fn matches(&self, document: &Document, options: &MatchOptions) -> bool {
        logical_filters::matches(self, document, options)
    }

    /// Parses a where clause from its JSON form.
    pub fn from_json(json: &serde_json::Value) -> StoreResult<Predicate> {
        Predicate::from_value(&Value::from(json))
    }

    /// Parses a where clause held as a [Value]. `null` is the empty clause.
    ///
    /// # Errors
    ///
    /// Returns `FilterError` for anything that is not a mapping, for an
    /// `and`/`or` that is not a list of mappings and for malformed
    /// operator objects.
    pub fn from_value(value: &Value) -> StoreResult<Predicate> {
        let doc = match value {
            Value::Null => return Ok(Predicate::new()),
            Value::Document(doc) => doc,
            other => {
                return Err(filter_error(&format!(
                    "A where clause must be an object, found {}",
                    other
                )))
            }
        };

        let mut predicate = Predicate::new();
        for (key, value) in doc.iter() {
            let clause = if key == AND_KEY || key == OR_KEY {
                let branches = parse_branches(key, value)?;
                if key == AND_KEY {
                    Clause::And(branches)
                } else {
                    Clause::Or(branches)
                }
            } else {
                Clause::Field {
                    key: key.clone(),
                    condition: Condition::from_value(value)?,
                }
            };
            predicate.push(clause);
        }
        Ok(predicate)
    }

    /// Rewrites every literal compared against a field through `coerce`,
    /// which receives the field path and the literal.
    pub fn coerce_with(self, coerce: &dyn Fn(&str, Value) -> Value) -> Predicate {
        let clauses = self
            .clauses
            .into_iter()
            .map(|clause| match clause {
                Clause::Field { key, condition } => {
                    let condition = condition.coerce_with(&key, coerce);
                    Clause::Field { key, condition }
                }
                Clause::And(branches) => Clause::And(
                    branches.into_iter().map(|it| it.coerce_with(coerce)).collect(),
                ),
                Clause::Or(branches) => Clause::Or(
                    branches.into_iter().map(|it| it.coerce_with(coerce)).collect(),
                ),
            })
            .collect();
        Predicate { clauses }
    }
}

impl Condition {
    /// Parses the condition of one field.
    ///
    /// A mapping holding `near` is a near clause. A mapping holding exactly
    /// one known operator is that operator; `options` may accompany the
    /// pattern operators. A mapping without operators, and any other value,
    /// is an equality literal.
    pub fn from_value(value: &Value) -> StoreResult<Condition> {
        let doc = match value {
            Value::Document(doc) => doc,
            other => return Ok(Condition::Equals(other.clone())),
        };

        if doc.contains_key(NEAR_KEY) {
            return parse_near(doc);
        }

        let operators: Vec<&String> = doc
            .keys()
            .filter(|key| OPERATORS.contains(&key.as_str()))
            .collect();
        if operators.is_empty() {
            return Ok(Condition::Equals(value.clone()));
        }
        if operators.len() > 1 {
            return Err(filter_error(&format!(
                "A condition must hold exactly one operator, found: {}",
                operators.iter().join(", ")
            )));
        }

        let operator = operators[0].as_str();
        let unknown = doc
            .keys()
            .filter(|key| key.as_str() != operator && key.as_str() != OPTIONS_KEY)
            .join(", ");
        if !unknown.is_empty() {
            return Err(filter_error(&format!(
                "Unknown keys next to operator {}: {}",
                operator, unknown
            )));
        }

        let operand = doc.get(operator).cloned().unwrap_or_default();
        let case_insensitive = match doc.get(OPTIONS_KEY) {
            None | Some(Value::Null) => false,
            Some(Value::String(flags)) => flags.contains('i'),
            Some(other) => {
                return Err(filter_error(&format!(
                    "options must be a string of flags, found {}",
                    other
                )))
            }
        };

        match operator {
            "inq" => Ok(Condition::In(array_operand(operator, operand)?)),
            "nin" => Ok(Condition::NotIn(array_operand(operator, operand)?)),
            "neq" => Ok(Condition::NotEquals(operand)),
            "like" | "nlike" | "ilike" | "nilike" => {
                let pattern = string_operand(operator, &operand)?;
                let case_insensitive = case_insensitive || operator.contains("ilike");
                Ok(Condition::Like {
                    regex: compile_like(pattern, case_insensitive)?,
                    negate: operator.starts_with('n'),
                })
            }
            "regexp" => {
                let pattern = string_operand(operator, &operand)?;
                Ok(Condition::Regexp(compile_regexp(pattern, case_insensitive)?))
            }
            "between" => {
                let bounds = array_operand(operator, operand)?;
                match <[Value; 2]>::try_from(bounds) {
                    Ok([low, high]) => Ok(Condition::Between(low, high)),
                    Err(bounds) => Err(filter_error(&format!(
                        "between needs exactly two bounds, found {}",
                        bounds.len()
                    ))),
                }
            }
            "gt" => Ok(Condition::Compare(Comparison::Greater, operand)),
            "gte" => Ok(Condition::Compare(Comparison::GreaterEqual, operand)),
            "lt" => Ok(Condition::Compare(Comparison::Lesser, operand)),
            _ => Ok(Condition::Compare(Comparison::LesserEqual, operand)),
        }
    }

    fn coerce_with(self, key: &str, coerce: &dyn Fn(&str, Value) -> Value) -> Condition {
        let each = |values: Vec<Value>| -> Vec<Value> {
            values.into_iter().map(|it| coerce(key, it)).collect()
        };
        match self {
            Condition::Equals(value) => Condition::Equals(coerce(key, value)),
            Condition::In(values) => Condition::In(each(values)),
            Condition::NotIn(values) => Condition::NotIn(each(values)),
            Condition::NotEquals(value) => Condition::NotEquals(coerce(key, value)),
            Condition::Between(low, high) => {
                Condition::Between(coerce(key, low), coerce(key, high))
            }
            Condition::Compare(op, value) => Condition::Compare(op, coerce(key, value)),
            other => other,
        }
    }
}

fn parse_branches(key: &str, value: &Value) -> StoreResult<Vec<Predicate>> {
    match value {
        Value::Array(items) => items.iter().map(Predicate::from_value).collect(),
        other => Err(filter_error(&format!(
            "{} expects a list of where clauses, found {}",
            key, other
        ))),
    }
}

fn parse_near(doc: &Document) -> StoreResult<Condition> {
    let mut clause = NearClause::new(doc.get(NEAR_KEY).cloned().unwrap_or_default());
    clause.max_distance = distance_bound(doc, MAX_DISTANCE_KEY)?;
    clause.min_distance = distance_bound(doc, MIN_DISTANCE_KEY)?;
    clause.unit = match doc.get(UNIT_KEY) {
        None | Some(Value::Null) => None,
        Some(Value::String(unit)) => Some(DistanceUnit::parse(unit)?),
        Some(other) => return Err(filter_error(&format!("Invalid distance unit {}", other))),
    };
    Ok(Condition::Near(clause))
}

fn distance_bound(doc: &Document, key: &str) -> StoreResult<Option<f64>> {
    match doc.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => match value.to_number() {
            Some(n) if !value.is_date() && !n.is_nan() => Ok(Some(n)),
            _ => Err(filter_error(&format!("{} must be a number, found {}", key, value))),
        },
    }
}

fn array_operand(operator: &str, operand: Value) -> StoreResult<Vec<Value>> {
    match operand {
        Value::Array(items) => Ok(items),
        other => Err(filter_error(&format!(
            "{} expects an array, found {}",
            operator, other
        ))),
    }
}

fn string_operand<'a>(operator: &str, operand: &'a Value) -> StoreResult<&'a str> {
    operand.as_str().ok_or_else(|| {
        filter_error(&format!("{} expects a string pattern, found {}", operator, operand))
    })
}

pub(crate) fn filter_error(message: &str) -> StoreError {
    log::error!("{}", message);
    StoreError::new(message, ErrorKind::FilterError)
}

/// A predicate matching every document.
pub fn all() -> Predicate {
    Predicate::new()
}

/// All of the given predicates.
pub fn and(predicates: Vec<Predicate>) -> Predicate {
    Predicate {
        clauses: vec![Clause::And(predicates)],
    }
}

/// At least one of the given predicates.
pub fn or(predicates: Vec<Predicate>) -> Predicate {
    Predicate {
        clauses: vec![Clause::Or(predicates)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_literals_and_operators() {
        let predicate = Predicate::from_json(&json!({
            "name": "John",
            "seq": {"gte": 2},
            "tags": {"inq": ["a", "b"]},
            "address": {"city": "Liverpool"},
        }))
        .unwrap();

        let clauses = predicate.clauses();
        assert_eq!(clauses.len(), 4);
        assert!(matches!(
            &clauses[0],
            Clause::Field { key, condition: Condition::Equals(Value::String(_)) } if key == "name"
        ));
        assert!(matches!(
            &clauses[1],
            Clause::Field { condition: Condition::Compare(Comparison::GreaterEqual, _), .. }
        ));
        assert!(matches!(
            &clauses[2],
            Clause::Field { condition: Condition::In(values), .. } if values.len() == 2
        ));
        assert!(matches!(
            &clauses[3],
            Clause::Field { condition: Condition::Equals(Value::Document(_)), .. }
        ));
    }

    #[test]
    fn test_parse_logical_branches() {
        let predicate = Predicate::from_json(&json!({
            "and": [{"a": 1}, {"or": [{"b": 2}, {"c": 3}]}]
        }))
        .unwrap();
        match &predicate.clauses()[0] {
            Clause::And(branches) => {
                assert_eq!(branches.len(), 2);
                assert!(matches!(branches[1].clauses()[0], Clause::Or(_)));
            }
            other => panic!("unexpected clause {:?}", other),
        }
    }

    #[test]
    fn test_parse_near() {
        let predicate = Predicate::from_json(&json!({
            "location": {"near": "10,20", "maxDistance": 100, "unit": "meters"}
        }))
        .unwrap();
        match &predicate.clauses()[0] {
            Clause::Field { condition: Condition::Near(near), .. } => {
                assert_eq!(near.max_distance, Some(100.0));
                assert_eq!(near.min_distance, None);
                assert_eq!(near.unit, Some(DistanceUnit::Meters));
            }
            other => panic!("unexpected clause {:?}", other),
        }
    }

    #[test]
    fn test_parse_errors_are_filter_errors() {
        for json in [
            json!({"seq": {"inq": 5}}),
            json!({"seq": {"nin": "x"}}),
            json!({"seq": {"between": [1]}}),
            json!({"seq": {"gt": 1, "lt": 5}}),
            json!({"seq": {"gt": 1, "foo": 5}}),
            json!({"name": {"like": 5}}),
            json!({"name": {"regexp": "("}}),
            json!({"and": {"a": 1}}),
            json!({"loc": {"near": "1,2", "maxDistance": "far"}}),
            json!({"loc": {"near": "1,2", "unit": "parsecs"}}),
            json!([1, 2]),
        ] {
            let err = Predicate::from_json(&json).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::FilterError, "for {}", json);
        }
    }

    #[test]
    fn test_null_is_empty_predicate() {
        assert!(Predicate::from_json(&serde_json::Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_coerce_with_rewrites_literals_only() {
        let predicate = Predicate::from_json(&json!({
            "seq": {"between": ["1", "3"]},
            "or": [{"seq": "2"}],
            "name": {"like": "J%"},
        }))
        .unwrap();
        let coerced = predicate.coerce_with(&|key, value| {
            if key == "seq" {
                value.as_str().and_then(|s| s.parse::<i64>().ok()).map(Value::I64).unwrap_or(value)
            } else {
                value
            }
        });

        assert!(matches!(
            &coerced.clauses()[0],
            Clause::Field { condition: Condition::Between(Value::I64(1), Value::I64(3)), .. }
        ));
        match &coerced.clauses()[1] {
            Clause::Or(branches) => assert!(matches!(
                &branches[0].clauses()[0],
                Clause::Field { condition: Condition::Equals(Value::I64(2)), .. }
            )),
            other => panic!("unexpected clause {:?}", other),
        }
    }

    #[test]
    fn test_default_match_options_follow_feature() {
        assert_eq!(MatchOptions::default().legacy_neq, cfg!(feature = "legacy_neq"));
    }
}
