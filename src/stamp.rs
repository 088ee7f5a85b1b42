use std::fmt;

/// Identity of one appended value: which worker appended it and at what
/// position in that worker's sequence.
///
/// Stamps make every append distinguishable, so the reconciliation pass
/// can tell a lost update apart from a merely reordered one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stamp {
    pub thread: u32,
    pub seq: u32,
}

impl Stamp {
    #[inline]
    #[must_use]
    pub const fn new(thread: u32, seq: u32) -> Self {
        Self { thread, seq }
    }

    /// Packs into a nonzero `u64`: a never-written slot reads back as zero
    /// and can therefore not alias a real stamp.
    #[inline]
    #[must_use]
    pub const fn pack(self) -> u64 {
        ((self.thread as u64 + 1) << 32) | self.seq as u64
    }

    /// Inverse of [`pack`](Self::pack). Returns `None` for zero in the
    /// thread field, the marker of an unwritten slot.
    #[inline]
    #[must_use]
    pub const fn unpack(raw: u64) -> Option<Self> {
        let thread = raw >> 32;
        if thread == 0 {
            None
        } else {
            Some(Self {
                thread: (thread - 1) as u32,
                seq: raw as u32,
            })
        }
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}#{}", self.thread, self.seq)
    }
}
