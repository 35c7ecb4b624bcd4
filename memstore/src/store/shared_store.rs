use crate::common::{atomic, Atomic, LockExt};
use crate::errors::StoreResult;
use crate::store::{DurabilityQueue, StorageBackend, StoreState, WriteAck};
use std::sync::Arc;

/// The state object and durability queue of one backing destination.
///
/// Every store opened on the same destination holds the same
/// `SharedStore`, so their collections and writes are serialized together.
pub(crate) struct SharedStore {
    state: Atomic<StoreState>,
    queue: DurabilityQueue,
    backend: Arc<dyn StorageBackend>,
}

impl SharedStore {
    /// Loads the destination's snapshot and starts its durability queue.
    pub(crate) fn open(backend: Arc<dyn StorageBackend>) -> StoreResult<SharedStore> {
        let state = match backend.load()? {
            Some(snapshot) => StoreState::from_snapshot(&snapshot)?,
            None => StoreState::new(),
        };
        log::debug!(
            "Opened {} with {} collections",
            backend.describe(),
            state.models.len()
        );

        Ok(SharedStore {
            state: atomic(state),
            queue: DurabilityQueue::start(backend.clone())?,
            backend,
        })
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        self.state.read_with(f)
    }

    /// Applies a mutation under the write lock and, when it succeeds,
    /// enqueues a snapshot of the result before the lock is released.
    ///
    /// A failed mutation is expected to leave the state untouched and
    /// enqueues nothing.
    pub(crate) fn mutate<R>(
        &self,
        f: impl FnOnce(&mut StoreState) -> StoreResult<R>,
    ) -> StoreResult<(R, WriteAck)> {
        self.state.write_with(|state| {
            let result = f(state)?;
            let snapshot = state.to_snapshot()?;
            Ok((result, self.queue.enqueue(snapshot)))
        })
    }

    pub(crate) fn describe(&self) -> String {
        self.backend.describe()
    }
}
