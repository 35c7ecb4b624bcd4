use crate::common::INITIAL_SEQUENCE;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The complete in-memory content of one backing destination.
///
/// This is also the persisted file format:
///
/// ```text
/// {
///   "ids":    { "<collection>": <next sequence value> },
///   "models": { "<collection>": { "<id>": "<serialized document>" } }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    pub(crate) ids: IndexMap<String, i64>,
    #[serde(default)]
    pub(crate) models: IndexMap<String, IndexMap<String, String>>,
}

impl StoreState {
    pub fn new() -> Self {
        StoreState::default()
    }

    /// Parses a persisted snapshot. Blank text is an empty store.
    pub fn from_snapshot(text: &str) -> StoreResult<StoreState> {
        if text.trim().is_empty() {
            return Ok(StoreState::new());
        }
        serde_json::from_str(text).map_err(|err| {
            log::error!("Malformed store snapshot: {}", err);
            StoreError::new(
                &format!("Malformed store snapshot: {}", err),
                ErrorKind::EncodingError,
            )
        })
    }

    pub fn to_snapshot(&self) -> StoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Makes sure the collection exists without touching existing content.
    pub(crate) fn init_collection(&mut self, collection: &str) {
        self.ids
            .entry(collection.to_string())
            .or_insert(INITIAL_SEQUENCE);
        self.models.entry(collection.to_string()).or_default();
    }

    /// Empties the collection and restarts its sequence.
    pub(crate) fn reset_collection(&mut self, collection: &str) {
        self.ids.insert(collection.to_string(), INITIAL_SEQUENCE);
        self.models.insert(collection.to_string(), IndexMap::new());
    }

    pub(crate) fn sequence(&self, collection: &str) -> i64 {
        self.ids.get(collection).copied().unwrap_or(INITIAL_SEQUENCE)
    }

    /// Consumes one sequence value and returns it.
    ///
    /// When the caller supplied a numeric id above the current value the
    /// sequence jumps past it, so generated ids never collide with it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidId` when the next value would not fit in an `i64`.
    /// The sequence is left untouched in that case.
    pub(crate) fn advance_sequence(
        &mut self,
        collection: &str,
        supplied: Option<i64>,
    ) -> StoreResult<i64> {
        let current = self.sequence(collection);
        let base = match supplied {
            Some(id) if id > current => id,
            _ => current,
        };
        let next = base.checked_add(1).ok_or_else(|| {
            log::error!("Id sequence of {} is exhausted at {}", collection, base);
            StoreError::new(
                &format!("No id can follow {} in {}", base, collection),
                ErrorKind::InvalidId,
            )
        })?;
        self.ids.insert(collection.to_string(), next);
        Ok(current)
    }

    pub(crate) fn record(&self, collection: &str, key: &str) -> Option<&String> {
        self.models.get(collection).and_then(|records| records.get(key))
    }

    pub(crate) fn records(&self, collection: &str) -> impl Iterator<Item = (&String, &String)> {
        self.models
            .get(collection)
            .into_iter()
            .flat_map(|records| records.iter())
    }

    pub(crate) fn put_record(&mut self, collection: &str, key: String, serialized: String) {
        self.models
            .entry(collection.to_string())
            .or_default()
            .insert(key, serialized);
    }

    pub(crate) fn remove_record(&mut self, collection: &str, key: &str) -> Option<String> {
        self.models
            .get_mut(collection)
            .and_then(|records| records.shift_remove(key))
    }

    pub(crate) fn clear_records(&mut self, collection: &str) -> usize {
        match self.models.get_mut(collection) {
            Some(records) => {
                let count = records.len();
                records.clear();
                count
            }
            None => 0,
        }
    }

    pub(crate) fn record_count(&self, collection: &str) -> usize {
        self.models.get(collection).map_or(0, |records| records.len())
    }
}
