use crate::common::{SortOrder, Value};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::filter::Predicate;

/// Which fields a query returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelection {
    /// Only these fields, plus the id fields.
    Include(Vec<String>),
    /// Every field except these. Id fields are never dropped.
    Exclude(Vec<String>),
}

impl FieldSelection {
    pub fn include<S: AsRef<str>>(fields: &[S]) -> Self {
        FieldSelection::Include(fields.iter().map(|it| it.as_ref().to_string()).collect())
    }

    pub fn exclude<S: AsRef<str>>(fields: &[S]) -> Self {
        FieldSelection::Exclude(fields.iter().map(|it| it.as_ref().to_string()).collect())
    }

    /// Reads a `{field: bool}` map. Any true entry makes it an include list
    /// of the true entries; a map of only false entries excludes them.
    pub fn from_map<S: AsRef<str>>(entries: &[(S, bool)]) -> Self {
        let selected: Vec<String> = entries
            .iter()
            .filter(|(_, keep)| *keep)
            .map(|(name, _)| name.as_ref().to_string())
            .collect();
        if selected.is_empty() {
            FieldSelection::Exclude(
                entries.iter().map(|(name, _)| name.as_ref().to_string()).collect(),
            )
        } else {
            FieldSelection::Include(selected)
        }
    }

    /// Parses a field name, a list of names or a `{field: bool}` map.
    pub fn from_json(json: &serde_json::Value) -> StoreResult<FieldSelection> {
        match json {
            serde_json::Value::String(name) => Ok(FieldSelection::include(&[name])),
            serde_json::Value::Array(items) => {
                let names = items
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .map(str::to_string)
                            .ok_or_else(|| invalid_option("fields", item))
                    })
                    .collect::<StoreResult<Vec<String>>>()?;
                Ok(FieldSelection::Include(names))
            }
            serde_json::Value::Object(map) => {
                let entries: Vec<(&str, bool)> = map
                    .iter()
                    .map(|(name, keep)| (name.as_str(), Value::from(keep).is_truthy()))
                    .collect();
                Ok(FieldSelection::from_map(&entries))
            }
            other => Err(invalid_option("fields", other)),
        }
    }
}

/// The query half of a filter: everything except the where clause is
/// optional and applied in a fixed order (sort, near, match, project,
/// skip, limit, include).
///
/// # Examples
///
/// ```rust,ignore
/// use memstore::collection::FindOptions;
/// use memstore::filter::field;
///
/// let options = FindOptions::new()
///     .where_clause(field("vip").eq(true))
///     .order("seq DESC")
///     .skip(1)
///     .limit(2);
///
/// // the same query in the persistence layer's JSON form
/// let options = FindOptions::from_json(&json!({
///     "where": {"vip": true},
///     "order": "seq DESC",
///     "skip": 1,
///     "limit": 2
/// }))?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub(crate) predicate: Option<Predicate>,
    pub(crate) order: Vec<String>,
    pub(crate) fields: Option<FieldSelection>,
    pub(crate) skip: Option<usize>,
    pub(crate) limit: Option<usize>,
    pub(crate) include: Option<serde_json::Value>,
}

pub fn where_clause(predicate: Predicate) -> FindOptions {
    FindOptions::new().where_clause(predicate)
}

pub fn order_by(field_name: &str, sort_order: SortOrder) -> FindOptions {
    FindOptions::new().sort_by(field_name, sort_order)
}

pub fn skip_by(skip: usize) -> FindOptions {
    FindOptions::new().skip(skip)
}

pub fn limit_to(limit: usize) -> FindOptions {
    FindOptions::new().limit(limit)
}

impl FindOptions {
    pub fn new() -> FindOptions {
        FindOptions::default()
    }

    pub fn where_clause(mut self, predicate: Predicate) -> FindOptions {
        self.predicate = Some(predicate);
        self
    }

    /// Appends an order clause such as `"vip ASC, seq DESC"`. Clauses are
    /// validated when the query runs.
    pub fn order(mut self, clause: &str) -> FindOptions {
        self.order.push(clause.to_string());
        self
    }

    pub fn sort_by(mut self, field_name: &str, sort_order: SortOrder) -> FindOptions {
        let clause = match sort_order {
            SortOrder::Ascending => format!("{} ASC", field_name),
            SortOrder::Descending => format!("{} DESC", field_name),
        };
        self.order.push(clause);
        self
    }

    pub fn fields(mut self, selection: FieldSelection) -> FindOptions {
        self.fields = Some(selection);
        self
    }

    pub fn skip(mut self, skip: usize) -> FindOptions {
        self.skip = Some(skip);
        self
    }

    /// Same as [FindOptions::skip].
    pub fn offset(self, offset: usize) -> FindOptions {
        self.skip(offset)
    }

    /// Maximum page size. Zero means no limit.
    pub fn limit(mut self, limit: usize) -> FindOptions {
        self.limit = Some(limit);
        self
    }

    /// Relations to resolve on the result page, in the persistence
    /// layer's own include syntax.
    pub fn include(mut self, include: serde_json::Value) -> FindOptions {
        self.include = Some(include);
        self
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    /// Parses a filter object `{where, order, fields, limit, skip|offset,
    /// include}`. Absent and null entries are ignored.
    pub fn from_json(json: &serde_json::Value) -> StoreResult<FindOptions> {
        let map = match json {
            serde_json::Value::Null => return Ok(FindOptions::new()),
            serde_json::Value::Object(map) => map,
            other => return Err(invalid_option("filter", other)),
        };
        let entry = |key: &str| map.get(key).filter(|it| !it.is_null());

        let mut options = FindOptions::new();
        if let Some(clause) = entry("where") {
            options.predicate = Some(Predicate::from_json(clause)?);
        }
        if let Some(order) = entry("order") {
            options.order = match order {
                serde_json::Value::String(clause) => vec![clause.clone()],
                serde_json::Value::Array(items) => items
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .map(str::to_string)
                            .ok_or_else(|| invalid_option("order", item))
                    })
                    .collect::<StoreResult<Vec<String>>>()?,
                other => return Err(invalid_option("order", other)),
            };
        }
        if let Some(fields) = entry("fields") {
            options.fields = Some(FieldSelection::from_json(fields)?);
        }
        if let Some(skip) = entry("skip").or_else(|| entry("offset")) {
            options.skip = Some(count_option("skip", skip)?);
        }
        if let Some(limit) = entry("limit") {
            options.limit = Some(count_option("limit", limit)?);
        }
        options.include = entry("include").cloned();
        Ok(options)
    }
}

// accepts non-negative integers, also when sent as numeric strings
fn count_option(name: &str, json: &serde_json::Value) -> StoreResult<usize> {
    let parsed = match json {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| invalid_option(name, json))
}

fn invalid_option(name: &str, json: &serde_json::Value) -> StoreError {
    log::error!("Invalid {} option: {}", name, json);
    StoreError::new(
        &format!("Invalid {} option: {}", name, json),
        ErrorKind::ValidationError,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let options = order_by("seq", SortOrder::Descending).skip(2).limit(3);
        assert_eq!(options.order, vec!["seq DESC"]);
        assert_eq!(options.skip, Some(2));
        assert_eq!(options.limit, Some(3));
        assert!(options.predicate().is_none());

        assert_eq!(skip_by(4).offset(5).skip, Some(5));
        assert_eq!(limit_to(1).limit, Some(1));
    }

    #[test]
    fn test_from_json() {
        let options = FindOptions::from_json(&json!({
            "where": {"vip": true},
            "order": ["vip ASC", "seq DESC"],
            "fields": ["name"],
            "offset": "1",
            "limit": 2,
            "include": "posts"
        }))
        .unwrap();

        assert!(options.predicate().is_some_and(|it| !it.is_empty()));
        assert_eq!(options.order, vec!["vip ASC", "seq DESC"]);
        assert_eq!(options.fields, Some(FieldSelection::include(&["name"])));
        assert_eq!(options.skip, Some(1));
        assert_eq!(options.limit, Some(2));
        assert_eq!(options.include, Some(json!("posts")));
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        for bad in [
            json!({"limit": -1}),
            json!({"skip": "many"}),
            json!({"order": 5}),
            json!({"fields": 1}),
            json!([1, 2]),
        ] {
            let err = FindOptions::from_json(&bad).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ValidationError, "{}", bad);
        }
        assert!(FindOptions::from_json(&json!(null)).is_ok());
        assert!(FindOptions::from_json(&json!({"where": null, "limit": null})).is_ok());
    }

    #[test]
    fn test_field_map_forms() {
        assert_eq!(
            FieldSelection::from_json(&json!({"name": true, "age": false})).unwrap(),
            FieldSelection::include(&["name"])
        );
        assert_eq!(
            FieldSelection::from_json(&json!({"secret": false})).unwrap(),
            FieldSelection::exclude(&["secret"])
        );
        assert_eq!(
            FieldSelection::from_json(&json!("name")).unwrap(),
            FieldSelection::include(&["name"])
        );
    }
}
