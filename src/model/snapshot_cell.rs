use std::sync::Arc;
use std::sync::atomic::{AtomicPtr, Ordering};

/// Holder for the most recently published immutable state. The single
/// writer replaces the whole `Arc` after each mutation; readers load a
/// consistent view without taking a lock.
pub struct SnapshotCell<T> {
    ptr: AtomicPtr<T>,
}

impl<T> SnapshotCell<T> {
    pub fn new(initial: Arc<T>) -> Self {
        let raw = Arc::into_raw(initial) as *mut T;
        Self { ptr: AtomicPtr::new(raw) }
    }

    pub fn from_value(value: T) -> Self { Self::new(Arc::new(value)) }

    #[inline]
    pub fn load(&self) -> Arc<T> {
        let p = self.ptr.load(Ordering::Acquire);
        assert!(!p.is_null(), "SnapshotCell pointer was null");
        unsafe {
            Arc::increment_strong_count(p);
            Arc::from_raw(p)
        }
    }

    #[inline]
    pub fn publish(&self, next: Arc<T>) {
        let newp = Arc::into_raw(next) as *mut T;
        let oldp = self.ptr.swap(newp, Ordering::AcqRel);
        unsafe {
            drop(Arc::from_raw(oldp));
        }
    }

    #[inline]
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let current = self.load();
        f(&current)
    }
}

impl<T> Drop for SnapshotCell<T> {
    fn drop(&mut self) {
        let p = self.ptr.load(Ordering::Relaxed);
        if !p.is_null() {
            unsafe {
                drop(Arc::from_raw(p));
            }
        }
    }
}

unsafe impl<T: Send + Sync> Send for SnapshotCell<T> {}
unsafe impl<T: Send + Sync> Sync for SnapshotCell<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_returns_published_value() {
        let cell = SnapshotCell::from_value(1u32);
        assert_eq!(*cell.load(), 1);

        cell.publish(Arc::new(2));
        assert_eq!(*cell.load(), 2);
    }

    #[test]
    fn test_old_snapshots_stay_valid_after_publish() {
        let cell = SnapshotCell::from_value(vec![1, 2, 3]);
        let old = cell.load();
        cell.publish(Arc::new(vec![4]));

        assert_eq!(*old, vec![1, 2, 3]);
        assert_eq!(*cell.load(), vec![4]);
    }

    #[test]
    fn test_with_borrows_current() {
        let cell = SnapshotCell::from_value(String::from("abc"));
        assert_eq!(cell.with(|s| s.len()), 3);
    }
}
