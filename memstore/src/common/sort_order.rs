use crate::errors::{ErrorKind, StoreError, StoreResult};
use std::fmt::Display;

/// Specifies the direction for sorting documents.
///
/// # Variants
/// - `Ascending`: Sort from smallest to largest value (A to Z, 0 to 9, oldest to newest)
/// - `Descending`: Sort from largest to smallest value (Z to A, 9 to 0, newest to oldest)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in ascending order (smallest to largest, A-Z, oldest to newest)
    Ascending,
    /// Sort in descending order (largest to smallest, Z-A, newest to oldest)
    Descending,
}

impl SortOrder {
    /// Parses a direction keyword, case-insensitively.
    pub fn parse(token: &str) -> StoreResult<SortOrder> {
        match token.to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortOrder::Ascending),
            "DESC" => Ok(SortOrder::Descending),
            _ => {
                log::error!("Unrecognized sort direction '{}'", token);
                Err(StoreError::new(
                    &format!("Unrecognized sort direction '{}', expected ASC or DESC", token),
                    ErrorKind::InvalidSortOrder,
                ))
            }
        }
    }
}

/// One key of a multi-key sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub key: String,
    pub direction: SortOrder,
}

impl SortKey {
    pub fn new(key: impl Into<String>, direction: SortOrder) -> Self {
        SortKey {
            key: key.into(),
            direction,
        }
    }

    /// Parses a single `"field [ASC|DESC]"` token.
    pub fn parse(token: &str) -> StoreResult<SortKey> {
        let parts: Vec<&str> = token.split_whitespace().collect();
        match parts.as_slice() {
            [key] => Ok(SortKey::new(*key, SortOrder::Ascending)),
            [key, direction] => Ok(SortKey::new(*key, SortOrder::parse(direction)?)),
            [] => {
                log::error!("Empty order clause");
                Err(StoreError::new("Order clause cannot be empty", ErrorKind::InvalidSortOrder))
            }
            _ => {
                log::error!("Malformed order clause '{}'", token);
                Err(StoreError::new(
                    &format!("Malformed order clause '{}'", token),
                    ErrorKind::InvalidSortOrder,
                ))
            }
        }
    }
}

impl Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.direction {
            SortOrder::Ascending => write!(f, "{} ASC", self.key),
            SortOrder::Descending => write!(f, "{} DESC", self.key),
        }
    }
}

/// An ordered list of sort keys; the first key that tells two documents
/// apart decides their order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn new() -> Self {
        SortSpec { keys: Vec::new() }
    }

    /// Ascending order over the given fields.
    pub fn ascending<S: AsRef<str>>(fields: &[S]) -> Self {
        SortSpec {
            keys: fields
                .iter()
                .map(|it| SortKey::new(it.as_ref(), SortOrder::Ascending))
                .collect(),
        }
    }

    pub fn add(mut self, key: impl Into<String>, direction: SortOrder) -> Self {
        self.keys.push(SortKey::new(key, direction));
        self
    }

    /// Parses order clauses. Each clause may itself hold several
    /// comma-separated tokens, so `["vip ASC, seq DESC"]` yields two keys.
    pub fn parse<S: AsRef<str>>(clauses: &[S]) -> StoreResult<SortSpec> {
        let mut keys = Vec::new();
        for clause in clauses {
            for token in clause.as_ref().split(',') {
                keys.push(SortKey::parse(token)?);
            }
        }
        Ok(SortSpec { keys })
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
