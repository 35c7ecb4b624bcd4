use crate::common::Value;
use crate::errors::StoreResult;
use crate::geo::NearClause;
use regex::Regex;

use super::{compile_like, compile_regexp, Comparison, Condition, Predicate};

/// Creates a fluent filter builder for the specified field name.
///
/// Dotted names address nested fields, as in `field("address.city")`.
pub fn field(field_name: &str) -> FluentFilter {
    FluentFilter {
        field_name: field_name.to_string(),
    }
}

/// A fluent builder for a condition on one field.
///
/// Each method returns a [Predicate] that can be passed to a query or
/// combined with other predicates. Pattern methods compile their pattern up
/// front and return a `StoreResult`.
pub struct FluentFilter {
    field_name: String,
}

impl FluentFilter {
    fn with(self, condition: Condition) -> Predicate {
        Predicate::field(&self.field_name, condition)
    }

    /// Loose equality; `5` matches `"5"`.
    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Predicate {
        self.with(Condition::Equals(value.into()))
    }

    #[inline]
    pub fn neq<T: Into<Value>>(self, value: T) -> Predicate {
        self.with(Condition::NotEquals(value.into()))
    }

    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> Predicate {
        self.with(Condition::Compare(Comparison::Greater, value.into()))
    }

    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> Predicate {
        self.with(Condition::Compare(Comparison::GreaterEqual, value.into()))
    }

    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> Predicate {
        self.with(Condition::Compare(Comparison::Lesser, value.into()))
    }

    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> Predicate {
        self.with(Condition::Compare(Comparison::LesserEqual, value.into()))
    }

    /// Inclusive range.
    pub fn between<T: Into<Value>>(self, low: T, high: T) -> Predicate {
        self.with(Condition::Between(low.into(), high.into()))
    }

    pub fn inq<T: Into<Value>>(self, values: Vec<T>) -> Predicate {
        self.with(Condition::In(values.into_iter().map(Into::into).collect()))
    }

    pub fn nin<T: Into<Value>>(self, values: Vec<T>) -> Predicate {
        self.with(Condition::NotIn(values.into_iter().map(Into::into).collect()))
    }

    /// SQL LIKE match: `%` is any run of characters, `_` one character.
    pub fn like(self, pattern: &str) -> StoreResult<Predicate> {
        self.like_condition(pattern, false, false)
    }

    pub fn nlike(self, pattern: &str) -> StoreResult<Predicate> {
        self.like_condition(pattern, false, true)
    }

    /// Case-insensitive LIKE.
    pub fn ilike(self, pattern: &str) -> StoreResult<Predicate> {
        self.like_condition(pattern, true, false)
    }

    pub fn nilike(self, pattern: &str) -> StoreResult<Predicate> {
        self.like_condition(pattern, true, true)
    }

    /// Regular expression match, accepting the `/pattern/flags` form.
    pub fn regexp(self, pattern: &str) -> StoreResult<Predicate> {
        let regex = compile_regexp(pattern, false)?;
        Ok(self.with(Condition::Regexp(regex)))
    }

    /// Matches string values against an already compiled expression.
    pub fn matches(self, regex: Regex) -> Predicate {
        self.with(Condition::Matches(regex))
    }

    pub fn near(self, clause: NearClause) -> Predicate {
        self.with(Condition::Near(clause))
    }

    fn like_condition(
        self,
        pattern: &str,
        case_insensitive: bool,
        negate: bool,
    ) -> StoreResult<Predicate> {
        let regex = compile_like(pattern, case_insensitive)?;
        Ok(self.with(Condition::Like { regex, negate }))
    }
}
