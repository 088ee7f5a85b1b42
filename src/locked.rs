use {
    crate::{grow::GrowVec, guard::LockedGuard, sync::Mutex},
    std::{
        fmt,
        sync::{LockResult, PoisonError, TryLockError, TryLockResult},
    },
};

/// A growable array behind one coarse mutual-exclusion lock: every public
/// operation, reads of the length included, holds the lock for its full
/// duration.
///
/// Appends are linearizable: after N completed appends from any mix of
/// threads the length is exactly N, with no lost updates and no
/// out-of-bounds writes. The trade-off is that the lock serializes
/// everything, concurrent readers included, which caps throughput under
/// read-heavy contention.
pub struct LockedVec<T> {
    inner: Mutex<GrowVec<T>>,
}

impl<T> LockedVec<T> {
    /// Constructs an empty [`LockedVec<T>`] without allocating.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(GrowVec::new()),
        }
    }
    /// Constructs a new [`LockedVec<T>`] with room for `capacity` elements.
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(GrowVec::with_capacity(capacity)),
        }
    }

    /// Acquires the lock for writing.
    ///
    /// # Errors
    /// Returns an error if the lock was poisoned by a panic in another
    /// thread; the guard inside still grants access.
    #[inline]
    pub fn lock(&self) -> LockResult<LockedGuard<'_, T>> {
        match self.inner.lock() {
            Ok(guard) => Ok(LockedGuard::new(guard)),
            Err(e) => Err(PoisonError::new(LockedGuard::new(e.into_inner()))),
        }
    }
    /// Acquires the lock for writing if it is free.
    ///
    /// # Errors
    /// Returns an error if the lock is held by another thread or poisoned.
    #[inline]
    pub fn try_lock(&self) -> TryLockResult<LockedGuard<'_, T>> {
        match self.inner.try_lock() {
            Ok(guard) => Ok(LockedGuard::new(guard)),
            Err(TryLockError::Poisoned(e)) => Err(TryLockError::Poisoned(
                PoisonError::new(LockedGuard::new(e.into_inner())),
            )),
            Err(TryLockError::WouldBlock) => Err(TryLockError::WouldBlock),
        }
    }

    /// Number of elements. Takes the lock; a poisoned lock is recovered
    /// since reads cannot observe a half-finished append (the length is
    /// advanced only after the value is written).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.read().capacity()
    }
    /// Copies the contents out under the lock.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.read().as_slice().to_vec()
    }

    fn read(&self) -> crate::sync::MutexGuard<'_, GrowVec<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for LockedVec<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
impl<T> From<Vec<T>> for LockedVec<T> {
    #[inline]
    fn from(value: Vec<T>) -> Self {
        Self {
            inner: Mutex::new(GrowVec::from(value)),
        }
    }
}
impl<T: fmt::Debug> fmt::Debug for LockedVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.read(), f)
    }
}
