use crate::collection::Document;
use crate::errors::StoreResult;
use crate::store::WriteAck;
use std::time::Duration;

/// Outcome of an upsert: the stored document and whether it was created.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertResult {
    pub document: Document,
    pub is_new_instance: bool,
}

/// Number of documents removed by a destroy operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteResult {
    pub count: usize,
}

/// Number of documents changed by a bulk update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateResult {
    pub count: usize,
}

/// The result of a mutation together with its durability outcome.
///
/// The value reflects the in-memory state right after the mutation, which
/// later reads already observe. [Persisted::wait] additionally blocks until
/// the backing destination has been written.
///
/// # Examples
///
/// ```rust,ignore
/// // fire and forget
/// let id = store.create("User", doc! { name: "John" })?.into_value();
///
/// // wait for the flush
/// let id = store.create("User", doc! { name: "Paul" })?.wait()?;
/// ```
#[derive(Debug)]
pub struct Persisted<T> {
    value: T,
    ack: WriteAck,
}

impl<T> Persisted<T> {
    pub(crate) fn new(value: T, ack: WriteAck) -> Self {
        Persisted { value, ack }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    /// Returns the value without waiting for the write.
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn into_parts(self) -> (T, WriteAck) {
        (self.value, self.ack)
    }

    /// Waits until the mutation is persisted and returns its value.
    ///
    /// # Errors
    ///
    /// Returns the durability error of this mutation. The in-memory change
    /// is not rolled back.
    pub fn wait(self) -> StoreResult<T> {
        self.ack.wait()?;
        Ok(self.value)
    }

    /// Like [Persisted::wait], giving up after `timeout`.
    pub fn wait_timeout(self, timeout: Duration) -> Option<StoreResult<T>> {
        let Persisted { value, ack } = self;
        ack.wait_timeout(timeout)
            .map(|outcome| outcome.map(|_| value))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Persisted<U> {
        Persisted {
            value: f(self.value),
            ack: self.ack,
        }
    }
}
