use parking_lot::RwLock;
use std::sync::Arc;

/// State shared between store handles behind a read-write lock.
pub type Atomic<T> = Arc<RwLock<T>>;

#[inline]
pub fn atomic<T>(value: T) -> Atomic<T> {
    Arc::new(RwLock::new(value))
}

/// Scoped access to shared state. The lock is released when the closure
/// returns.
pub trait LockExt<T> {
    fn read_with<R>(&self, f: impl FnOnce(&T) -> R) -> R;

    fn write_with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R;
}

impl<T> LockExt<T> for Atomic<T> {
    #[inline]
    fn read_with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.read();
        f(&*guard)
    }

    #[inline]
    fn write_with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.write();
        f(&mut *guard)
    }
}
