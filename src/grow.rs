use {
    crate::{cap::Cap, error::TryReserveError, raw::RawBuf},
    std::{
        alloc::handle_alloc_error,
        borrow::Borrow,
        fmt,
        hash::{Hash, Hasher},
        mem::ManuallyDrop,
        ops,
        ptr,
        slice::{self, SliceIndex},
    },
};

/// Capacity the backing store jumps to on the first grow of an empty
/// container.
pub const DEFAULT_CAPACITY: usize = 10;

/// A growable array with exclusive-ownership semantics: the plain
/// sequential core every concurrent variant in this crate builds on.
///
/// Appending writes the value at index `len`, then advances `len`; when
/// `len` reaches the capacity, the backing store is reallocated to twice
/// its size first. Those are two separate steps, which is exactly what
/// makes the shared, unsynchronized rendition ([`RacyVec`](crate::RacyVec))
/// hazardous. Here the borrow checker forces `&mut self`, so the steps can
/// never interleave.
pub struct GrowVec<T> {
    buf: RawBuf<T>,
    len: usize,
}

// SAFETY: `GrowVec` exclusively owns its buffer; if `T` is `Send`, moving
// the container between threads moves the elements with it.
unsafe impl<T: Send> Send for GrowVec<T> {}
// SAFETY: there is no interior mutability; shared references only permit
// reads of the initialized prefix, same as a slice.
unsafe impl<T: Sync> Sync for GrowVec<T> {}

impl<T> GrowVec<T> {
    /// Constructs an empty [`GrowVec<T>`] without allocating.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Constructs a new [`GrowVec<T>`] with room for `capacity` elements,
    /// returning an error if the allocation fails
    ///
    /// # Errors
    /// Returns an error if:
    /// * `capacity * size_of::<T>` overflows [`isize::MAX`]
    /// * memory is exhausted
    pub fn try_with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        let Some(cap) = Cap::new::<T>(capacity) else {
            return Err(TryReserveError::CapacityOverflow);
        };
        let buf = RawBuf::try_with_capacity(cap)?;

        Ok(Self { buf, len: 0 })
    }

    /// Constructs a new [`GrowVec<T>`] with room for `capacity` elements.
    #[inline]
    #[must_use]
    #[allow(clippy::missing_panics_doc)]
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = Cap::new::<T>(capacity)
            .unwrap_or_else(|| panic!("{}", TryReserveError::CapacityOverflow));
        let buf = RawBuf::with_capacity(cap);

        Self { buf, len: 0 }
    }

    /// Number of initialized elements. Always <= [`capacity`](Self::capacity).
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY:
        // * `as_ptr()` is never null and is aligned even when unallocated
        // * the entire block of memory is within a single allocation
        // * the first `len` elements are correctly initialized
        // * `capacity * size_of::<T>()` doesn't overflow `isize::MAX`, so
        //   neither does `len * size_of::<T>()`
        unsafe { slice::from_raw_parts(self.buf.as_ptr(), self.len) }
    }
    #[inline]
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: see `as_slice`; `&mut self` grants exclusive access.
        unsafe { slice::from_raw_parts_mut(self.buf.as_mut_ptr(), self.len) }
    }

    /// Appends `value`, growing the backing store if it is full.
    ///
    /// # Panics
    /// If the required capacity overflows [`isize::MAX`]; aborts if memory
    /// is exhausted.
    pub fn push(&mut self, value: T) {
        match self.try_push(value) {
            Ok(()) => {}
            Err(e @ TryReserveError::CapacityOverflow) => panic!("{e}"),
            Err(TryReserveError::AllocError(layout)) => {
                handle_alloc_error(layout)
            }
        }
    }

    /// Appends `value`, growing the backing store if it is full.
    ///
    /// # Errors
    /// Returns an error if growing fails; `value` is dropped in that case.
    pub fn try_push(&mut self, value: T) -> Result<(), TryReserveError> {
        if self.len == self.capacity() {
            self.grow_amortized()?;
        }
        // SAFETY: `len < capacity` after a successful grow, so the write
        // target is inside the allocated block (ZST writes never touch
        // memory).
        unsafe {
            self.buf.as_non_null().add(self.len).write(value);
        }
        self.len += 1;
        Ok(())
    }

    /// Doubles the capacity (first grow goes to [`DEFAULT_CAPACITY`]).
    fn grow_amortized(&mut self) -> Result<(), TryReserveError> {
        let new_cap = if self.capacity() == 0 {
            DEFAULT_CAPACITY
        } else {
            self.capacity()
                .checked_mul(2)
                .ok_or(TryReserveError::CapacityOverflow)?
        };
        let Some(new_cap) = Cap::new::<T>(new_cap) else {
            return Err(TryReserveError::CapacityOverflow);
        };
        self.buf.grow_to(new_cap)
    }

    #[inline]
    #[cfg(test)]
    pub(crate) const fn raw_cap(&self) -> Cap {
        self.buf.raw_cap()
    }
}

impl<T> Drop for GrowVec<T> {
    fn drop(&mut self) {
        // SAFETY: exactly the first `len` elements are initialized; the
        // buffer itself is freed by `RawBuf::drop`.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.buf.as_mut_ptr(),
                self.len,
            ));
        }
    }
}

impl<T> ops::Deref for GrowVec<T> {
    type Target = [T];
    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}
impl<T> ops::DerefMut for GrowVec<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}
impl<T> Borrow<[T]> for GrowVec<T> {
    #[inline]
    fn borrow(&self) -> &[T] {
        self.as_slice()
    }
}
impl<T> AsRef<[T]> for GrowVec<T> {
    #[inline]
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, I> ops::Index<I> for GrowVec<T>
where
    I: SliceIndex<[T]>,
{
    type Output = <I as SliceIndex<[T]>>::Output;
    #[inline]
    fn index(&self, index: I) -> &Self::Output {
        ops::Index::index(&**self, index)
    }
}
impl<T> Default for GrowVec<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

// ------------------------------- fmt impl -------------------------------

impl<T: fmt::Debug> fmt::Debug for GrowVec<T> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

// ----------------------------- From impl -----------------------------

impl<T> From<Vec<T>> for GrowVec<T> {
    #[inline]
    fn from(value: Vec<T>) -> Self {
        let mut value = ManuallyDrop::new(value);
        let (ptr, len, cap) =
            (value.as_mut_ptr(), value.len(), value.capacity());
        // SAFETY: the parts come from a live `Vec`, whose buffer was
        // allocated by the global allocator for `cap` elements (dangling
        // when unallocated), of which the first `len` are initialized;
        // `Vec` upholds `cap <= isize::MAX`.
        unsafe {
            Self {
                buf: RawBuf::from_raw(ptr, Cap::new_unchecked::<T>(cap)),
                len,
            }
        }
    }
}
impl<T> From<GrowVec<T>> for Vec<T> {
    #[inline]
    fn from(value: GrowVec<T>) -> Self {
        let this = ManuallyDrop::new(value);
        let cap = if size_of::<T>() == 0 {
            this.len
        } else {
            this.buf.raw_cap().get()
        };
        // SAFETY: the `Vec` is constructed from parts of the given
        // `GrowVec`, whose buffer satisfies `Vec`'s allocation contract.
        unsafe { Vec::from_raw_parts(this.buf.as_mut_ptr(), this.len, cap) }
    }
}

// ----------------------------- PartialEq impl -----------------------------

impl<T, U> PartialEq<GrowVec<U>> for GrowVec<T>
where
    T: PartialEq<U>,
{
    #[inline]
    fn eq(&self, rhs: &GrowVec<U>) -> bool {
        PartialEq::eq(&**self, &**rhs)
    }
}
impl<T, U> PartialEq<[U]> for GrowVec<T>
where
    T: PartialEq<U>,
{
    #[inline]
    fn eq(&self, rhs: &[U]) -> bool {
        PartialEq::eq(&**self, rhs)
    }
}
impl<T, U> PartialEq<&[U]> for GrowVec<T>
where
    T: PartialEq<U>,
{
    #[inline]
    fn eq(&self, rhs: &&[U]) -> bool {
        PartialEq::eq(&**self, *rhs)
    }
}
impl<T, U, const N: usize> PartialEq<[U; N]> for GrowVec<T>
where
    T: PartialEq<U>,
{
    #[inline]
    fn eq(&self, rhs: &[U; N]) -> bool {
        PartialEq::eq(&**self, rhs)
    }
}
impl<T, U> PartialEq<Vec<U>> for GrowVec<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, rhs: &Vec<U>) -> bool {
        PartialEq::eq(&**self, &**rhs)
    }
}

// ----------------------------- Eq and Hash impl -----------------------------

impl<T: Eq> Eq for GrowVec<T> {}
/// [`GrowVec`] implements [`Borrow<[T]>`], so we need to `hash` the
/// same way as the slice does.
impl<T: Hash> Hash for GrowVec<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        Hash::hash(&**self, state);
    }
}
