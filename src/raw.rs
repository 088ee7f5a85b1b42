use {
    crate::{cap::Cap, error::TryReserveError},
    std::{
        alloc::{self, Layout, handle_alloc_error},
        marker::PhantomData,
        ptr::NonNull,
    },
};

/// Allocation-owning backing store of a [`GrowVec`](crate::GrowVec).
///
/// Knows its pointer and capacity, nothing about initialized length.
pub(crate) struct RawBuf<T> {
    /// Pointer to the first byte of the buffer.
    ///
    /// Changes to this field outside of [`grow_to`](RawBuf::grow_to) are
    /// `Undefined Behavior`
    ptr: NonNull<u8>,
    /// Capacity of the buffer.
    ///
    /// Cannot exceed [`isize::MAX`]
    cap: Cap,
    _marker: PhantomData<T>,
}

impl<T> RawBuf<T> {
    /// Constructs a new [`RawBuf<T>`],
    /// returning an error if the allocation fails
    ///
    /// # Errors
    /// Returns an error if:
    /// * `cap * size_of::<T>` overflows `isize::MAX`
    /// * memory is exhausted
    pub(crate) fn try_with_capacity(cap: Cap) -> Result<Self, TryReserveError> {
        // `cap` for ZST is zero.
        if cap == Cap::ZERO {
            return Ok(Self {
                ptr: NonNull::<T>::dangling().cast(),
                cap,
                _marker: PhantomData,
            });
        }

        let Ok(layout) = Layout::array::<T>(cap.get()) else {
            return Err(TryReserveError::CapacityOverflow);
        };

        // SAFETY: `cap != 0` and `T` is not a ZST here, so `layout` has a
        // non-zero size.
        let raw = unsafe { alloc::alloc(layout) };
        let Some(ptr) = NonNull::new(raw) else {
            return Err(layout.into());
        };

        Ok(Self {
            ptr,
            cap,
            _marker: PhantomData,
        })
    }
    /// Constructs a new [`RawBuf<T>`], aborting if the allocation fails.
    #[inline]
    pub(crate) fn with_capacity(cap: Cap) -> Self {
        match Self::try_with_capacity(cap) {
            Ok(this) => this,
            Err(e @ TryReserveError::CapacityOverflow) => panic!("{e}"),
            Err(TryReserveError::AllocError(layout)) => {
                handle_alloc_error(layout)
            }
        }
    }

    /// Reallocates the buffer to `new_cap`, moving the existing bytes.
    ///
    /// The caller keeps track of how many elements are initialized; this
    /// only moves memory.
    ///
    /// # Errors
    /// Returns an error if:
    /// * `new_cap * size_of::<T>` overflows `isize::MAX`
    /// * memory is exhausted
    pub(crate) fn grow_to(
        &mut self,
        new_cap: Cap,
    ) -> Result<(), TryReserveError> {
        // ZSTs never allocate.
        if size_of::<T>() == 0 {
            return Ok(());
        }
        debug_assert!(new_cap.get() > self.cap.get());

        let Ok(new_layout) = Layout::array::<T>(new_cap.get()) else {
            return Err(TryReserveError::CapacityOverflow);
        };

        let raw = match self.memory_layout() {
            // SAFETY: `new_cap > cap >= 0` and `T` is not a ZST, so
            // `new_layout` has a non-zero size.
            None => unsafe { alloc::alloc(new_layout) },
            // SAFETY: `ptr` was allocated with `old_layout` by this
            // allocator, and `new_layout.size()` is non-zero and does not
            // overflow `isize::MAX` (checked by `Layout::array`).
            Some((ptr, old_layout)) => unsafe {
                alloc::realloc(ptr.as_ptr(), old_layout, new_layout.size())
            },
        };
        let Some(ptr) = NonNull::new(raw) else {
            return Err(new_layout.into());
        };

        self.ptr = ptr;
        self.cap = new_cap;
        Ok(())
    }

    /// Constructs a [`RawBuf<T>`] directly from a pointer and a capacity.
    ///
    /// # Safety
    /// * `ptr` must be currently allocated with the global allocator, or
    ///   dangling if `cap` is zero.
    /// * `T` needs to have the same alignment as what `ptr` was allocated
    ///   with.
    /// * `size_of::<T>() * cap` must be the same as the size the pointer
    ///   was allocated with.
    /// * the allocated size in bytes cannot exceed [`isize::MAX`]
    #[inline]
    #[must_use]
    pub(crate) unsafe fn from_raw(ptr: *mut T, cap: Cap) -> Self {
        Self {
            // SAFETY: the safety contract must be upheld by the caller.
            ptr: unsafe { NonNull::new_unchecked(ptr).cast() },
            cap,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub(crate) const fn as_non_null(&self) -> NonNull<T> {
        self.ptr.cast()
    }
    #[inline]
    pub(crate) const fn as_mut_ptr(&self) -> *mut T {
        self.as_non_null().as_ptr()
    }
    #[inline]
    pub(crate) const fn as_ptr(&self) -> *const T {
        self.as_non_null().as_ptr() as _
    }
    #[inline]
    pub(crate) const fn capacity(&self) -> usize {
        if size_of::<T>() == 0 {
            usize::MAX
        } else {
            self.cap.get()
        }
    }
    #[inline]
    pub(crate) const fn raw_cap(&self) -> Cap {
        self.cap
    }

    fn memory_layout(&self) -> Option<(NonNull<u8>, Layout)> {
        if self.cap == Cap::ZERO {
            None
        } else {
            // SAFETY:
            // * we allocated this chunk of memory so `unchecked_mul` and
            //   `size` rounded to the nearest power of two both cannot
            //   overflow `isize::MAX`.
            // * `align` is obtained through align_of so it is a power of
            //   two.
            unsafe {
                let size = size_of::<T>().unchecked_mul(self.cap.get());
                let layout =
                    Layout::from_size_align_unchecked(size, align_of::<T>());
                Some((self.ptr, layout))
            }
        }
    }
}

impl<T> Drop for RawBuf<T> {
    fn drop(&mut self) {
        if let Some((ptr, layout)) = self.memory_layout() {
            // SAFETY: we allocated this block of memory with this ptr and
            // this layout
            unsafe {
                alloc::dealloc(ptr.as_ptr(), layout);
            }
        }
    }
}
