use crate::collection::Document;
use crate::common::{Value, FIELD_SEPARATOR};

use super::{
    test_between, test_comparison, test_equals, test_in, test_like, test_not_equals,
    test_not_in, test_regex, Clause, Condition, MatchOptions, Predicate,
};

/// Evaluates a predicate against a document.
///
/// Every clause must hold. `and` branches must all match and `or` branches
/// need at least one match; an empty `or` never matches.
pub(crate) fn matches(predicate: &Predicate, document: &Document, options: &MatchOptions) -> bool {
    predicate.clauses().iter().all(|clause| match clause {
        Clause::Field { key, condition } => test_field(document, key, condition, options),
        Clause::And(branches) => branches.iter().all(|it| matches(it, document, options)),
        Clause::Or(branches) => branches.iter().any(|it| matches(it, document, options)),
    })
}

// values reached by a path; a dotted path crossing an array of documents
// reaches one value per element
enum FieldValue<'a> {
    Missing,
    Found(&'a Value),
    Spread(Vec<&'a Value>),
}

fn resolve<'a>(document: &'a Document, path: &str) -> FieldValue<'a> {
    if let Some(value) = document.get_path(path) {
        return FieldValue::Found(value);
    }
    if !path.contains(FIELD_SEPARATOR) {
        return FieldValue::Missing;
    }

    let mut segments = path.split(FIELD_SEPARATOR);
    let mut current: Vec<&Value> = segments
        .next()
        .and_then(|first| document.get(first))
        .into_iter()
        .collect();

    for segment in segments {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Document(doc) => next.extend(doc.get(segment)),
                Value::Array(items) => next.extend(
                    items
                        .iter()
                        .filter_map(Value::as_document)
                        .filter_map(|doc| doc.get(segment)),
                ),
                _ => {}
            }
        }
        current = next;
    }

    if current.is_empty() {
        FieldValue::Missing
    } else {
        FieldValue::Spread(current)
    }
}

fn test_field(document: &Document, key: &str, condition: &Condition, options: &MatchOptions) -> bool {
    match condition {
        Condition::Near(_) => return true,
        Condition::Undefined => return false,
        _ => {}
    }

    match resolve(document, key) {
        FieldValue::Missing => test(condition, None, options),
        FieldValue::Found(value) => match (value, condition) {
            (Value::Array(_), Condition::Equals(Value::Array(_))) => {
                test(condition, Some(value), options)
            }
            (Value::Array(items), _) => test_elements(condition, items.iter().collect(), options),
            _ => test(condition, Some(value), options),
        },
        FieldValue::Spread(values) => {
            let elements = values
                .into_iter()
                .flat_map(|value| match value {
                    Value::Array(items) => items.iter().collect::<Vec<_>>(),
                    other => vec![other],
                })
                .collect();
            test_elements(condition, elements, options)
        }
    }
}

// an array field matches when any element does; exclusions must hold for
// every element
fn test_elements(condition: &Condition, elements: Vec<&Value>, options: &MatchOptions) -> bool {
    match condition {
        Condition::NotEquals(_) if elements.is_empty() => true,
        Condition::NotIn(_) | Condition::Like { negate: true, .. } => elements
            .into_iter()
            .all(|element| test(condition, Some(element), options)),
        _ => elements
            .into_iter()
            .any(|element| test(condition, Some(element), options)),
    }
}

fn test(condition: &Condition, value: Option<&Value>, options: &MatchOptions) -> bool {
    match condition {
        Condition::Equals(literal) => test_equals(literal, value),
        Condition::Matches(regex) | Condition::Regexp(regex) => test_regex(regex, value),
        Condition::Undefined => false,
        Condition::Near(_) => true,
        Condition::In(candidates) => test_in(candidates, value),
        Condition::NotIn(candidates) => test_not_in(candidates, value),
        Condition::NotEquals(operand) => test_not_equals(operand, value, options.legacy_neq),
        Condition::Like { regex, negate } => test_like(regex, *negate, value),
        Condition::Between(low, high) => test_between(value, low, high),
        Condition::Compare(op, bound) => test_comparison(*op, value, bound),
    }
}
