use crate::errors::StoreResult;
use crate::store::{FileBackend, SharedStore};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Weak};

// live shared stores by canonical file path
static FILE_STORES: LazyLock<Mutex<HashMap<PathBuf, Weak<SharedStore>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Returns the shared store of a file, opening it on first use.
///
/// Stores stay registered while any handle on them is alive.
pub(crate) fn shared_for_file(path: &Path) -> StoreResult<Arc<SharedStore>> {
    let key = canonical_path(path)?;
    let mut stores = FILE_STORES.lock();
    stores.retain(|_, store| store.strong_count() > 0);

    if let Some(shared) = stores.get(&key).and_then(Weak::upgrade) {
        log::debug!("Sharing open store for {}", key.display());
        return Ok(shared);
    }

    let shared = Arc::new(SharedStore::open(Arc::new(FileBackend::new(&key)))?);
    stores.insert(key, Arc::downgrade(&shared));
    Ok(shared)
}

/// Resolves a path to the key stores are shared under. The file itself
/// need not exist yet.
fn canonical_path(path: &Path) -> StoreResult<PathBuf> {
    if let Ok(canonical) = path.canonicalize() {
        return Ok(canonical);
    }

    let absolute = std::path::absolute(path)?;
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => match parent.canonicalize() {
            Ok(parent) => Ok(parent.join(name)),
            Err(_) => Ok(absolute),
        },
        _ => Ok(absolute),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_file_shares_one_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let first = shared_for_file(&path).unwrap();
        let second = shared_for_file(&dir.path().join(".").join("db.json")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_different_files_do_not_share() {
        let dir = tempfile::tempdir().unwrap();
        let first = shared_for_file(&dir.path().join("a.json")).unwrap();
        let second = shared_for_file(&dir.path().join("b.json")).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_released_store_is_reopened() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let first = shared_for_file(&path).unwrap();
        let described = first.describe();
        drop(first);

        let second = shared_for_file(&path).unwrap();
        assert_eq!(second.describe(), described);
    }
}
