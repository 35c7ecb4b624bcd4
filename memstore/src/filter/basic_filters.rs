use crate::common::{parse_date, Value};

use super::compare;

/// Type-coercing equality, in the spirit of a dynamically typed `==`.
///
/// Null and missing values equal each other and nothing else. Numbers
/// equal numeric strings, booleans compare as 0/1, dates equal their epoch
/// millis or any text parsing to the same instant. Arrays compare to
/// scalars through their joined text form.
pub(crate) fn loose_equals(a: Option<&Value>, b: Option<&Value>) -> bool {
    let (a, b) = match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => return true,
        (None | Some(Value::Null), _) | (_, None | Some(Value::Null)) => return false,
        (Some(a), Some(b)) => (a, b),
    };

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Bool(x), other) | (other, Value::Bool(x)) => {
            loose_equals(Some(&Value::I64(*x as i64)), Some(other))
        }
        (Value::String(s), n) | (n, Value::String(s)) if n.is_number() => {
            Value::from(s.as_str()).to_number() == n.as_f64()
        }
        (Value::Date(d), Value::String(s)) | (Value::String(s), Value::Date(d)) => {
            parse_date(s).is_some_and(|parsed| parsed == *d)
        }
        (Value::Date(d), n) | (n, Value::Date(d)) if n.is_number() => {
            n.as_f64() == Some(d.timestamp_millis() as f64)
        }
        (Value::Array(items), scalar) | (scalar, Value::Array(items))
            if !scalar.is_array() && !scalar.is_document() =>
        {
            loose_equals(
                Some(&Value::String(Value::Array(items.clone()).to_text())),
                Some(scalar),
            )
        }
        (x, y) => x == y,
    }
}

/// Equality against a literal condition.
///
/// A null literal matches null and missing values. Nested documents and
/// arrays compare structurally. Everything else compares by text form, so
/// `5` equals `"5"`.
pub(crate) fn test_equals(literal: &Value, value: Option<&Value>) -> bool {
    match (literal, value) {
        (Value::Null, None | Some(Value::Null)) => true,
        (Value::Null, _) | (_, None) => false,
        (Value::Document(_) | Value::Array(_), Some(value)) => literal == value,
        (Value::Date(x), Some(Value::Date(y))) => x.timestamp_millis() == y.timestamp_millis(),
        (_, Some(Value::Null)) => false,
        (_, Some(value)) => literal.to_text() == value.to_text(),
    }
}

pub(crate) fn test_in(candidates: &[Value], value: Option<&Value>) -> bool {
    candidates.iter().any(|it| loose_equals(Some(it), value))
}

pub(crate) fn test_not_in(candidates: &[Value], value: Option<&Value>) -> bool {
    !test_in(candidates, value)
}

/// `neq` holds when the three-way compare is non-zero. An incomparable
/// pair matches only in legacy mode.
pub(crate) fn test_not_equals(operand: &Value, value: Option<&Value>, legacy_neq: bool) -> bool {
    let cmp = compare(Some(operand), value);
    if cmp.is_nan() {
        legacy_neq
    } else {
        cmp != 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::date_value;
    use crate::doc;

    #[test]
    fn test_loose_equals_coerces() {
        assert!(loose_equals(Some(&Value::I64(5)), Some(&Value::from("5"))));
        assert!(loose_equals(Some(&Value::from(" 5 ")), Some(&Value::F64(5.0))));
        assert!(loose_equals(Some(&Value::Bool(true)), Some(&Value::I64(1))));
        assert!(loose_equals(Some(&Value::Bool(false)), Some(&Value::from("0"))));
        assert!(loose_equals(Some(&date_value(0)), Some(&Value::from("1970-01-01T00:00:00Z"))));
        assert!(loose_equals(Some(&date_value(10)), Some(&Value::I64(10))));
        assert!(loose_equals(Some(&Value::from(vec![1, 2])), Some(&Value::from("1,2"))));
        assert!(!loose_equals(Some(&Value::from("a")), Some(&Value::from("b"))));
        assert!(!loose_equals(Some(&Value::from("x")), Some(&Value::I64(0))));
    }

    #[test]
    fn test_loose_equals_nullish() {
        assert!(loose_equals(None, Some(&Value::Null)));
        assert!(!loose_equals(None, Some(&Value::I64(0))));
        assert!(!loose_equals(Some(&Value::from("")), Some(&Value::Null)));
    }

    #[test]
    fn test_equals_literal() {
        assert!(test_equals(&Value::I64(5), Some(&Value::from("5"))));
        assert!(test_equals(&Value::from("true"), Some(&Value::Bool(true))));
        assert!(!test_equals(&Value::from("x"), None));
        assert!(test_equals(&Value::Null, None));
        assert!(test_equals(&Value::Null, Some(&Value::Null)));
        assert!(!test_equals(&Value::Null, Some(&Value::from("null"))));
        assert!(test_equals(&date_value(5), Some(&date_value(5))));
    }

    #[test]
    fn test_equals_structural() {
        let literal = Value::Document(doc! { city: "Liverpool" });
        assert!(test_equals(&literal, Some(&Value::Document(doc! { city: "Liverpool" }))));
        assert!(!test_equals(
            &literal,
            Some(&Value::Document(doc! { city: "Liverpool", zip: "L1" }))
        ));
    }

    #[test]
    fn test_in_and_not_in() {
        let candidates = vec![Value::I64(1), Value::from("two")];
        assert!(test_in(&candidates, Some(&Value::from("1"))));
        assert!(test_in(&candidates, Some(&Value::from("two"))));
        assert!(!test_in(&candidates, Some(&Value::I64(3))));
        assert!(!test_in(&candidates, None));
        assert!(test_not_in(&candidates, Some(&Value::I64(3))));
        assert!(test_not_in(&candidates, None));
        assert!(!test_not_in(&candidates, Some(&Value::I64(1))));
    }

    #[test]
    fn test_not_equals_operand() {
        assert!(test_not_equals(&Value::I64(1), Some(&Value::I64(2)), false));
        assert!(!test_not_equals(&Value::I64(1), Some(&Value::from("1")), false));
        assert!(!test_not_equals(&Value::Null, None, true));

        // incomparable pairs
        assert!(test_not_equals(&Value::from("x"), Some(&Value::I64(1)), true));
        assert!(!test_not_equals(&Value::from("x"), Some(&Value::I64(1)), false));
        assert!(test_not_equals(&Value::from("x"), None, true));
    }
}
