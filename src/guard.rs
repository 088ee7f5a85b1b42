use {
    crate::{error::TryReserveError, grow::GrowVec, sync::MutexGuard},
    std::ops,
};

/// Write access to a [`LockedVec`](crate::LockedVec).
///
/// Holds the lock for as long as it lives; dropping it releases the lock
/// on every exit path, including unwinding out of a failed grow.
pub struct LockedGuard<'a, T> {
    inner: MutexGuard<'a, GrowVec<T>>,
}

impl<'a, T> LockedGuard<'a, T> {
    #[inline]
    pub(crate) fn new(inner: MutexGuard<'a, GrowVec<T>>) -> Self {
        Self { inner }
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        self.inner.as_slice()
    }
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Appends `value` while holding the lock, growing the backing store
    /// if it is full.
    ///
    /// # Panics
    /// If the required capacity overflows [`isize::MAX`]; aborts if memory
    /// is exhausted.
    #[inline]
    pub fn push(&mut self, value: T) {
        self.inner.push(value);
    }
    /// Appends `value` while holding the lock.
    ///
    /// # Errors
    /// Returns an error if growing the backing store fails.
    #[inline]
    pub fn try_push(&mut self, value: T) -> Result<(), TryReserveError> {
        self.inner.try_push(value)
    }
}

impl<T> ops::Deref for LockedGuard<'_, T> {
    type Target = [T];
    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}
