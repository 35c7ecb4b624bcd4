use crate::collection::Document;
use crate::common::{SortOrder, SortSpec, Value};
use std::cmp::Ordering;

/// Sorts documents in place by a multi-key sort spec.
///
/// Keys apply left to right and the first non-equal comparison wins. A
/// document missing a key always sorts after one that has it, whatever the
/// direction; the direction only flips comparisons between present values.
/// The sort is stable, so documents equal on every key keep their order.
pub(crate) fn sort_documents(documents: &mut [Document], spec: &SortSpec) {
    if spec.is_empty() {
        return;
    }
    documents.sort_by(|a, b| compare_documents(a, b, spec));
}

pub(crate) fn compare_documents(a: &Document, b: &Document, spec: &SortSpec) -> Ordering {
    for sort_key in spec.keys() {
        let cmp = match (a.get_path(&sort_key.key), b.get_path(&sort_key.key)) {
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => Ordering::Equal,
            (Some(a_value), Some(b_value)) => {
                let cmp = sort_cmp(a_value, b_value);
                match sort_key.direction {
                    SortOrder::Ascending => cmp,
                    SortOrder::Descending => cmp.reverse(),
                }
            }
        };

        if cmp != Ordering::Equal {
            return cmp;
        }
    }
    Ordering::Equal
}

// relational order inside a type, rank order across types so the
// comparator stays total
fn sort_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (a, b) if a.is_number() && b.is_number() => {
            let x = a.as_f64().unwrap_or(f64::NAN);
            let y = b.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        _ => a
            .relational_cmp(b)
            .unwrap_or_else(|| type_rank(a).cmp(&type_rank(b))),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::I64(_) | Value::F64(_) => 2,
        Value::String(_) => 3,
        Value::Date(_) => 4,
        Value::Document(_) => 5,
        Value::Array(_) => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn names(documents: &[Document]) -> Vec<String> {
        documents
            .iter()
            .map(|it| it.get("name").map(|v| v.to_text()).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_sort_single_key_both_directions() {
        let mut docs = vec![
            doc! { name: "b", age: 2 },
            doc! { name: "c", age: 3 },
            doc! { name: "a", age: 1 },
        ];
        sort_documents(&mut docs, &SortSpec::new().add("age", SortOrder::Ascending));
        assert_eq!(names(&docs), vec!["a", "b", "c"]);

        sort_documents(&mut docs, &SortSpec::new().add("age", SortOrder::Descending));
        assert_eq!(names(&docs), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_missing_key_sorts_last_in_both_directions() {
        let mut docs = vec![
            doc! { name: "none" },
            doc! { name: "one", rank: 1 },
            doc! { name: "two", rank: 2 },
        ];
        sort_documents(&mut docs, &SortSpec::new().add("rank", SortOrder::Ascending));
        assert_eq!(names(&docs), vec!["one", "two", "none"]);

        sort_documents(&mut docs, &SortSpec::new().add("rank", SortOrder::Descending));
        assert_eq!(names(&docs), vec!["two", "one", "none"]);
    }

    #[test]
    fn test_multi_key_sort() {
        let mut docs = vec![
            doc! { name: "a", vip: true, seq: 1 },
            doc! { name: "b", vip: false, seq: 2 },
            doc! { name: "c", vip: true, seq: 3 },
            doc! { name: "d", vip: false, seq: 4 },
        ];
        let spec = SortSpec::parse(&["vip ASC, seq DESC"]).unwrap();
        sort_documents(&mut docs, &spec);
        assert_eq!(names(&docs), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_nested_key_and_dates() {
        let mut docs = vec![
            doc! { name: "late", meta: { at: (crate::common::date_value(2000)) } },
            doc! { name: "early", meta: { at: (crate::common::date_value(1000)) } },
        ];
        sort_documents(&mut docs, &SortSpec::new().add("meta.at", SortOrder::Ascending));
        assert_eq!(names(&docs), vec!["early", "late"]);
    }

    #[test]
    fn test_mixed_types_do_not_panic() {
        let mut docs = vec![
            doc! { name: "n", v: 1 },
            doc! { name: "s", v: "x" },
            doc! { name: "z", v: 0 },
            doc! { name: "f", v: (f64::NAN) },
            doc! { name: "b", v: true },
        ];
        sort_documents(&mut docs, &SortSpec::new().add("v", SortOrder::Ascending));
        assert_eq!(docs.len(), 5);
        assert_eq!(names(&docs)[0], "b");
    }
}
