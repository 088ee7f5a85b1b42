use {
    std::{alloc::Layout, time::Duration},
    thiserror::Error,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum TryReserveError {
    #[error("memory allocation failed because capacity exceeded maximum")]
    CapacityOverflow,
    #[error("memory allocation failed because allocator returned an error")]
    AllocError(Layout),
}
impl From<Layout> for TryReserveError {
    #[inline]
    fn from(e: Layout) -> Self {
        Self::AllocError(e)
    }
}

/// An append observed an index at or past the bounds of the backing store
/// it was about to write into.
///
/// Only [`RacyVec`](crate::RacyVec) produces this: a stale length read
/// paired with a stale buffer read makes the write target land outside the
/// allocation, and the bounds guard reports it instead of writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("append index {index} is out of bounds for capacity {capacity}")]
pub struct BoundsViolation {
    pub index: usize,
    pub capacity: usize,
}

/// What a single append against a stress target can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AppendError {
    /// A detectable out-of-bounds write in the unsynchronized variant.
    /// The harness records this as a race, not a failure.
    #[error(transparent)]
    Bounds(#[from] BoundsViolation),
    /// A lock was poisoned by a panic in another thread. Unlike a race,
    /// this signals a harness bug and is fatal.
    #[error("lock poisoned by a panicked writer")]
    Poisoned,
}

/// Faults of the harness itself, as opposed to hazards it observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HarnessError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("lock poisoned by a panicked writer")]
    LockPoisoned,
    #[error("workers still running after {0:?}")]
    WorkerTimeout(Duration),
    #[error("a worker exited without reporting a result")]
    WorkerPanicked,
}
