//! Serialized persistence of store snapshots.
//!
//! Every mutation enqueues a [WriteTask] holding a snapshot of the whole
//! store. A single worker thread per destination writes the tasks strictly
//! in arrival order, one at a time, and reports each outcome to the caller
//! that enqueued it through its [WriteAck].
//!
//! # Thread Lifecycle
//!
//! The worker runs until the queue is shut down or dropped. Shutdown closes
//! the channel, lets the worker drain the tasks already queued and joins it.

use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::store::StorageBackend;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// One pending write: the snapshot to persist and where to report.
pub(crate) struct WriteTask {
    snapshot: String,
    on_complete: Sender<StoreResult<()>>,
}

/// Handle on the durability outcome of one mutation.
///
/// The in-memory effect of the mutation is visible as soon as the call
/// returns; the ack only tells when (and whether) it reached the backing
/// destination. Dropping the ack without waiting is fine.
#[derive(Debug)]
pub struct WriteAck {
    receiver: Receiver<StoreResult<()>>,
}

impl WriteAck {
    fn new(receiver: Receiver<StoreResult<()>>) -> Self {
        WriteAck { receiver }
    }

    /// Blocks until the write of this mutation finished.
    ///
    /// # Errors
    ///
    /// Returns the backend's error when the write failed, or a
    /// `DurabilityError` when the queue stopped before running the task.
    pub fn wait(self) -> StoreResult<()> {
        match self.receiver.recv() {
            Ok(outcome) => outcome,
            Err(_) => Err(queue_stopped()),
        }
    }

    /// Like [WriteAck::wait], giving up after `timeout`. Returns `None` on
    /// timeout; the ack can be waited on again.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<StoreResult<()>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(queue_stopped())),
        }
    }
}

/// Single-concurrency write queue for one backing destination.
pub(crate) struct DurabilityQueue {
    sender: Mutex<Option<Sender<WriteTask>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    description: String,
}

impl DurabilityQueue {
    /// Starts the worker thread for `backend`.
    pub(crate) fn start(backend: Arc<dyn StorageBackend>) -> StoreResult<DurabilityQueue> {
        let description = backend.describe();
        let (sender, receiver) = crossbeam_channel::unbounded::<WriteTask>();

        let worker = thread::Builder::new()
            .name("memstore-durability".to_string())
            .spawn(move || write_loop(backend, receiver))
            .map_err(|err| {
                log::error!("Failed to start durability worker: {}", err);
                StoreError::new_with_cause(
                    "Failed to start durability worker",
                    ErrorKind::InternalError,
                    err.into(),
                )
            })?;

        log::debug!("Durability queue started for {}", description);
        Ok(DurabilityQueue {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            description,
        })
    }

    /// Queues a snapshot for persistence.
    ///
    /// Callers enqueue while still holding the state lock the snapshot was
    /// taken under, so queue order matches mutation order.
    pub(crate) fn enqueue(&self, snapshot: String) -> WriteAck {
        let (on_complete, receiver) = crossbeam_channel::bounded(1);
        let task = WriteTask {
            snapshot,
            on_complete,
        };

        let guard = self.sender.lock();
        match guard.as_ref() {
            Some(sender) => {
                if let Err(err) = sender.send(task) {
                    log::error!("Durability queue for {} is gone", self.description);
                    let _ = err.into_inner().on_complete.send(Err(queue_stopped()));
                }
            }
            None => {
                log::warn!("Write enqueued after shutdown of {}", self.description);
                let _ = task.on_complete.send(Err(queue_stopped()));
            }
        }
        WriteAck::new(receiver)
    }

    /// Stops accepting writes, drains the queued ones and joins the worker.
    pub(crate) fn shutdown(&self) {
        let sender = self.sender.lock().take();
        drop(sender);

        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                log::error!("Durability worker for {} panicked", self.description);
            }
            log::debug!("Durability queue for {} stopped", self.description);
        }
    }
}

impl Drop for DurabilityQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn write_loop(backend: Arc<dyn StorageBackend>, receiver: Receiver<WriteTask>) {
    for task in receiver.iter() {
        let outcome = backend.store(&task.snapshot);
        if let Err(err) = &outcome {
            log::error!("Failed to persist snapshot to {}: {}", backend.describe(), err);
        }
        // the caller may have dropped its ack
        let _ = task.on_complete.send(outcome);
    }
}

fn queue_stopped() -> StoreError {
    StoreError::new(
        "Durability queue stopped before the write ran",
        ErrorKind::DurabilityError,
    )
}
