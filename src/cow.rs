use {
    crate::sync::Mutex,
    arc_swap::ArcSwap,
    std::{
        fmt,
        sync::{Arc, PoisonError},
    },
};

/// A growable array published as immutable snapshots behind an atomically
/// swappable reference.
///
/// Writers serialize with each other on a write-side lock, copy the
/// current snapshot into a fresh array one element longer, and publish it
/// with a single atomic swap. Readers load the current snapshot reference
/// once and never block, never observing a torn or partially written
/// state; a snapshot is reclaimed when its last reader lets go of it.
///
/// The trade-off is that every append copies the whole array, so this
/// favors read-heavy, write-light workloads.
pub struct CowVec<T> {
    current: ArcSwap<Vec<T>>,
    writer: Mutex<()>,
}

impl<T> CowVec<T> {
    /// Constructs an empty [`CowVec<T>`].
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Vec::new()),
            writer: Mutex::new(()),
        }
    }

    /// Number of elements in the current snapshot. One atomic load, no
    /// ordering guarantee relative to in-flight appends.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.current.load().len()
    }
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a handle to the current snapshot. The snapshot is immutable;
    /// later appends publish new snapshots and leave this one untouched.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<T>> {
        self.current.load_full()
    }
}

impl<T: Clone> CowVec<T> {
    /// Appends `value` by copying the current snapshot into a new array
    /// one element longer and atomically publishing it.
    ///
    /// Writers contend only with other writers. The write-side lock guards
    /// no data of its own, so a lock poisoned by a panicking writer is
    /// recovered: whatever snapshot that writer last published is complete.
    pub fn push(&self, value: T) {
        let _writer =
            self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.current.load();
        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend_from_slice(&current);
        next.push(value);
        self.current.store(Arc::new(next));
    }
}

impl<T> Default for CowVec<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
impl<T> From<Vec<T>> for CowVec<T> {
    #[inline]
    fn from(value: Vec<T>) -> Self {
        Self {
            current: ArcSwap::from_pointee(value),
            writer: Mutex::new(()),
        }
    }
}
impl<T: fmt::Debug> fmt::Debug for CowVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self.current.load(), f)
    }
}
