use crate::collection::Document;
use crate::common::Value;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::filter::{Clause, Condition, Predicate};
use crate::geo::{distance, DistanceUnit, GeoPoint};
use itertools::Itertools;
use std::cmp::Ordering;

/// A proximity condition on a location field, as written in a where clause.
///
/// The target point is kept in its raw form and validated when the query
/// runs, so a malformed point fails the query before any document is read.
///
/// ```rust,ignore
/// let near = NearClause::new(Value::from("53.40, -2.99"))
///     .max_distance(10000.0)
///     .unit(DistanceUnit::Meters);
/// let predicate = field("location").near(near);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NearClause {
    pub near: Value,
    pub max_distance: Option<f64>,
    pub min_distance: Option<f64>,
    pub unit: Option<DistanceUnit>,
}

impl NearClause {
    pub fn new<T: Into<Value>>(near: T) -> Self {
        NearClause {
            near: near.into(),
            max_distance: None,
            min_distance: None,
            unit: None,
        }
    }

    pub fn max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = Some(max_distance);
        self
    }

    pub fn min_distance(mut self, min_distance: f64) -> Self {
        self.min_distance = Some(min_distance);
        self
    }

    pub fn unit(mut self, unit: DistanceUnit) -> Self {
        self.unit = Some(unit);
        self
    }
}

/// The single resolved near clause of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct NearSpec {
    pub key: String,
    pub near: GeoPoint,
    pub max_distance: Option<f64>,
    pub min_distance: Option<f64>,
    pub unit: DistanceUnit,
}

/// Finds the near clause of a predicate, looking through nested `and` and
/// `or` branches at any depth.
///
/// # Errors
///
/// Fails with a validation error when more than one near clause exists or
/// when the target point is malformed.
pub fn extract_near(predicate: &Predicate) -> StoreResult<Option<NearSpec>> {
    let mut found = Vec::new();
    collect_near(predicate, &mut found);

    match found.len() {
        0 => Ok(None),
        1 => {
            let (key, clause) = found[0];
            Ok(Some(NearSpec {
                key: key.to_string(),
                near: GeoPoint::parse(&clause.near)?,
                max_distance: clause.max_distance,
                min_distance: clause.min_distance,
                unit: clause.unit.unwrap_or_default(),
            }))
        }
        _ => {
            let keys = found.iter().map(|(key, _)| *key).join(", ");
            log::error!("Query holds {} near clauses on {}", found.len(), keys);
            Err(StoreError::new(
                &format!(
                    "A query may hold only one near clause, found {} on fields: {}",
                    found.len(),
                    keys
                ),
                ErrorKind::ValidationError,
            ))
        }
    }
}

fn collect_near<'a>(predicate: &'a Predicate, found: &mut Vec<(&'a str, &'a NearClause)>) {
    for clause in predicate.clauses() {
        match clause {
            Clause::Field {
                key,
                condition: Condition::Near(near),
            } => found.push((key.as_str(), near)),
            Clause::And(branches) | Clause::Or(branches) => {
                for branch in branches {
                    collect_near(branch, found);
                }
            }
            Clause::Field { .. } => {}
        }
    }
}

/// Keeps documents whose location lies inside the distance bounds and
/// orders them nearest first.
///
/// Documents without a usable location are dropped. A bound only applies
/// when it is greater than zero.
pub fn apply_near(documents: Vec<Document>, spec: &NearSpec) -> Vec<Document> {
    let mut located: Vec<(f64, Document)> = Vec::with_capacity(documents.len());
    for doc in documents {
        let location = match doc.get_path(&spec.key).and_then(GeoPoint::from_stored) {
            Some(location) => location,
            None => {
                log::warn!("Skipping document without a usable location in {}", spec.key);
                continue;
            }
        };

        let d = distance(&spec.near, &location, spec.unit);
        if spec.max_distance.is_some_and(|max| max > 0.0 && d > max) {
            continue;
        }
        if spec.min_distance.is_some_and(|min| min > 0.0 && d < min) {
            continue;
        }
        located.push((d, doc));
    }

    located.sort_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    located.into_iter().map(|(_, doc)| doc).collect()
}
