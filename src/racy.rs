use {
    crate::{
        error::BoundsViolation,
        grow::DEFAULT_CAPACITY,
        sync::{AtomicPtr, AtomicU64, AtomicUsize, Ordering},
    },
    std::{array, fmt, ptr},
};

/// Upper bound on doublings; enough to exceed any allocatable size.
const GENERATIONS: usize = 48;

/// One allocation of the backing store. Never mutated structurally after
/// it is published; only its slots are written.
struct Generation {
    slots: Box<[AtomicU64]>,
}

impl Generation {
    fn boxed(capacity: usize) -> Box<Self> {
        Box::new(Self {
            slots: (0..capacity).map(|_| AtomicU64::new(0)).collect(),
        })
    }
}

/// The unsynchronized growable array: a shared container whose append is
/// deliberately decomposed into independently observable steps, exactly
/// the way a plain dynamic-array list misbehaves when mutated from several
/// threads at once.
///
/// An append reads the current buffer, reads the length, grows if the
/// length has reached the capacity, writes the value at the length's
/// index, and finally stores `length + 1` back. Every one of those is a
/// separate racy load or store; there is no mutual exclusion and no
/// read-modify-write anywhere on the path. Two appenders can therefore
/// observe the same length and overwrite each other's slot (a lost
/// update), or pair a stale buffer with an advanced length and aim past
/// the end of the allocation.
///
/// A wild write is undefined behavior in Rust, so the rendition differs
/// from a managed runtime in one place: the append re-checks the index
/// against the buffer it is actually about to write and reports
/// [`BoundsViolation`] instead of writing. The hazard stays observable;
/// the process stays sound. Values are stored in per-slot atomics for the
/// same reason, standing in for the managed runtime's array cell write.
///
/// This container exists to be raced against by the stress harness. It
/// must not gain locking; use [`LockedVec`](crate::LockedVec) or
/// [`CowVec`](crate::CowVec) for correctness.
pub struct RacyVec {
    /// Lazily installed buffers; generation `g` holds `initial << g`
    /// slots. Old generations stay allocated until drop so a stale reader
    /// can never dangle.
    generations: [AtomicPtr<Generation>; GENERATIONS],
    /// Index of the generation appends should use. Republished with a
    /// plain racy store after a grow.
    cur: AtomicUsize,
    /// Number of logically present elements. Advanced with a racy
    /// load/store pair, never a read-modify-write.
    len: AtomicUsize,
}

impl RacyVec {
    /// Constructs a [`RacyVec`] with the default initial capacity.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Constructs a [`RacyVec`] whose first buffer holds `capacity`
    /// elements (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let this = Self {
            generations: array::from_fn(|_| AtomicPtr::new(ptr::null_mut())),
            cur: AtomicUsize::new(0),
            len: AtomicUsize::new(0),
        };
        this.generations[0].store(
            Box::into_raw(Generation::boxed(capacity.max(1))),
            Ordering::Release,
        );
        this
    }

    /// Appends `value` at the next free slot.
    ///
    /// # Errors
    /// Returns [`BoundsViolation`] when a racy interleaving left this
    /// thread holding a buffer too small for the index it observed. The
    /// caller records it; nothing was written.
    pub fn append(&self, value: u64) -> Result<(), BoundsViolation> {
        // The hazard, step by step: buffer and length are read separately,
        // so either can be stale relative to the other.
        let (r#gen, buf) = self.generation(self.cur.load(Ordering::Relaxed));
        let len = self.len.load(Ordering::Relaxed);

        let buf = if len == buf.slots.len() {
            self.grow(r#gen);
            self.generation(self.cur.load(Ordering::Relaxed)).1
        } else {
            buf
        };

        let capacity = buf.slots.len();
        if len >= capacity {
            // A managed runtime would throw its index-out-of-range error
            // right here; writing would be UB for us.
            return Err(BoundsViolation {
                index: len,
                capacity,
            });
        }

        // Write the value, then advance the count. Two plain stores with
        // nothing ordering them against other appenders.
        buf.slots[len].store(value, Ordering::Relaxed);
        self.len.store(len + 1, Ordering::Relaxed);
        Ok(())
    }

    /// Current count. A single racy load with no ordering guarantee
    /// relative to concurrent appends.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Capacity of the buffer current appends target.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.generation(self.cur.load(Ordering::Relaxed)).1.slots.len()
    }

    /// Copies out the stored values up to the current count.
    ///
    /// Meaningful only once all appenders have quiesced; under contention
    /// the copy inherits every hazard appends have.
    #[must_use]
    pub fn values(&self) -> Vec<u64> {
        let buf = self.generation(self.cur.load(Ordering::Relaxed)).1;
        let len = self.len.load(Ordering::Relaxed).min(buf.slots.len());
        buf.slots[..len]
            .iter()
            .map(|slot| slot.load(Ordering::Relaxed))
            .collect()
    }

    /// Resolves a generation index to its buffer, falling back to the
    /// newest installed one if `gen` is not published yet from this
    /// thread's point of view. Generation 0 is installed in the
    /// constructor, so the walk always terminates.
    fn generation(&self, r#gen: usize) -> (usize, &Generation) {
        let mut g = r#gen.min(GENERATIONS - 1);
        loop {
            let raw = self.generations[g].load(Ordering::Acquire);
            if !raw.is_null() {
                // SAFETY: non-null generation pointers come from
                // `Box::into_raw`, are published with Release, and are
                // only freed in `drop`, which requires exclusive access.
                return (g, unsafe { &*raw });
            }
            g -= 1;
        }
    }

    /// Installs the next generation (double the capacity, contents copied
    /// forward) and racily republishes `cur`.
    fn grow(&self, r#gen: usize) {
        let next = r#gen + 1;
        if next >= GENERATIONS {
            // Let the bounds guard in `append` report it.
            return;
        }
        let old = self.generation(r#gen).1;
        let fresh = Generation::boxed(old.slots.len() * 2);
        for (slot, fresh_slot) in old.slots.iter().zip(fresh.slots.iter()) {
            fresh_slot.store(slot.load(Ordering::Relaxed), Ordering::Relaxed);
        }

        let raw = Box::into_raw(fresh);
        // The compare-exchange only arbitrates which thread's allocation
        // survives when several grow at once; it does not order the append
        // steps themselves.
        if self.generations[next]
            .compare_exchange(
                ptr::null_mut(),
                raw,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            // SAFETY: the losing candidate was never published; this
            // thread still exclusively owns it.
            drop(unsafe { Box::from_raw(raw) });
        }
        self.cur.store(next, Ordering::Relaxed);
    }
}

impl Drop for RacyVec {
    fn drop(&mut self) {
        for r#gen in &self.generations {
            let raw = r#gen.load(Ordering::Acquire);
            if !raw.is_null() {
                // SAFETY: `&mut self` means no other thread can reach the
                // buffers; each non-null pointer came from `Box::into_raw`
                // and appears in the table exactly once.
                drop(unsafe { Box::from_raw(raw) });
            }
        }
    }
}

impl Default for RacyVec {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RacyVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RacyVec")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}
