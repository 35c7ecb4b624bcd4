use crate::common::Value;
use std::cmp::Ordering;

use super::{loose_equals, Comparison};

/// Three-way comparison between a document value and an operand.
///
/// Returns a negative, zero or positive number, or NaN when the two cannot
/// be compared:
/// - null or missing on either side: zero when both are, NaN otherwise
/// - numbers: their difference, with the operand read as a number
/// - strings: lexicographic order
/// - booleans: difference of their 0/1 forms
/// - dates: difference in milliseconds, with the operand read as epoch millis
/// - anything else: zero when loosely equal, NaN otherwise
pub(crate) fn compare(a: Option<&Value>, b: Option<&Value>) -> f64 {
    let a_nullish = a.is_none_or(Value::is_null);
    let b_nullish = b.is_none_or(Value::is_null);
    if a_nullish || b_nullish {
        return if a_nullish && b_nullish { 0.0 } else { f64::NAN };
    }

    let (a, b) = match (a, b) {
        (Some(a), Some(b)) => (a, b),
        _ => return f64::NAN,
    };

    match (a, b) {
        (Value::String(x), Value::String(y)) => match x.cmp(y) {
            Ordering::Less => -1.0,
            Ordering::Equal => 0.0,
            Ordering::Greater => 1.0,
        },
        (Value::Bool(x), Value::Bool(y)) => (*x as i64 - *y as i64) as f64,
        (Value::Date(x), Value::Date(y)) => (x.timestamp_millis() - y.timestamp_millis()) as f64,
        (Value::Date(x), y) => match y.to_number() {
            Some(millis) => x.timestamp_millis() as f64 - millis,
            None => f64::NAN,
        },
        (x, y) if x.is_number() => match (x.as_f64(), y.to_number()) {
            (Some(x), Some(y)) => x - y,
            _ => f64::NAN,
        },
        (x, y) => {
            if loose_equals(Some(x), Some(y)) {
                0.0
            } else {
                f64::NAN
            }
        }
    }
}

/// Relational test of a document value against a bound. An incomparable
/// pair never passes.
pub(crate) fn test_comparison(op: Comparison, value: Option<&Value>, bound: &Value) -> bool {
    let cmp = compare(value, Some(bound));
    if cmp.is_nan() {
        return false;
    }
    match op {
        Comparison::Greater => cmp > 0.0,
        Comparison::GreaterEqual => cmp >= 0.0,
        Comparison::Lesser => cmp < 0.0,
        Comparison::LesserEqual => cmp <= 0.0,
    }
}

/// Inclusive range test.
pub(crate) fn test_between(value: Option<&Value>, low: &Value, high: &Value) -> bool {
    test_comparison(Comparison::GreaterEqual, value, low)
        && test_comparison(Comparison::LesserEqual, value, high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::date_value;

    #[test]
    fn test_compare_by_type() {
        assert_eq!(compare(Some(&Value::I64(5)), Some(&Value::F64(3.5))), 1.5);
        assert_eq!(compare(Some(&Value::from("a")), Some(&Value::from("b"))), -1.0);
        assert_eq!(compare(Some(&Value::Bool(true)), Some(&Value::Bool(false))), 1.0);
        assert_eq!(compare(Some(&date_value(1000)), Some(&date_value(250))), 750.0);
    }

    #[test]
    fn test_compare_nullish() {
        assert_eq!(compare(None, None), 0.0);
        assert_eq!(compare(Some(&Value::Null), None), 0.0);
        assert!(compare(None, Some(&Value::I64(1))).is_nan());
        assert!(compare(Some(&Value::I64(1)), Some(&Value::Null)).is_nan());
    }

    #[test]
    fn test_compare_mismatched_types() {
        assert_eq!(compare(Some(&Value::from("5")), Some(&Value::I64(5))), 0.0);
        assert!(compare(Some(&Value::from("x")), Some(&Value::I64(5))).is_nan());
        assert!(compare(Some(&Value::from("2020")), Some(&date_value(0))).is_nan());
    }

    #[test]
    fn test_compare_reads_operand_by_left_type() {
        assert_eq!(compare(Some(&Value::I64(5)), Some(&Value::from("3"))), 2.0);
        assert_eq!(compare(Some(&Value::F64(1.5)), Some(&Value::Bool(true))), 0.5);
        assert!(compare(Some(&Value::I64(5)), Some(&Value::from("three"))).is_nan());
        assert_eq!(compare(Some(&date_value(5000)), Some(&Value::I64(1000))), 4000.0);
        assert_eq!(compare(Some(&date_value(5000)), Some(&Value::from("5000"))), 0.0);
        assert!(compare(Some(&date_value(5000)), Some(&Value::from("soon"))).is_nan());

        assert!(test_comparison(Comparison::Greater, Some(&Value::I64(5)), &Value::from("3")));
        assert!(!test_comparison(Comparison::Lesser, Some(&Value::I64(5)), &Value::from("3")));
        assert!(test_comparison(
            Comparison::Greater,
            Some(&date_value(5000)),
            &Value::I64(1000)
        ));
        assert!(test_between(Some(&Value::I64(2)), &Value::from("1"), &Value::from("4")));
    }

    #[test]
    fn test_comparisons() {
        let five = Value::I64(5);
        assert!(test_comparison(Comparison::Greater, Some(&five), &Value::I64(4)));
        assert!(!test_comparison(Comparison::Greater, Some(&five), &Value::I64(5)));
        assert!(test_comparison(Comparison::GreaterEqual, Some(&five), &Value::I64(5)));
        assert!(test_comparison(Comparison::Lesser, Some(&five), &Value::F64(5.1)));
        assert!(test_comparison(Comparison::LesserEqual, Some(&five), &Value::I64(5)));
        assert!(!test_comparison(Comparison::Lesser, None, &Value::I64(5)));
        assert!(!test_comparison(Comparison::Greater, Some(&Value::from("x")), &Value::I64(1)));
    }

    #[test]
    fn test_between_is_inclusive() {
        let low = date_value(1000);
        let high = date_value(2000);
        assert!(test_between(Some(&date_value(1000)), &low, &high));
        assert!(test_between(Some(&date_value(2000)), &low, &high));
        assert!(!test_between(Some(&date_value(2001)), &low, &high));
        assert!(!test_between(None, &low, &high));
    }
}
