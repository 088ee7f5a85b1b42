//! Switchable synchronization primitives.
//!
//! Container internals go through this module so the same code can be
//! model checked with `loom` (`RUSTFLAGS="--cfg loom"`) and run on the
//! real `std` primitives everywhere else.

#[cfg(loom)]
pub(crate) use loom::sync::{
    Mutex, MutexGuard,
    atomic::{AtomicPtr, AtomicU64, AtomicUsize, Ordering},
};

#[cfg(not(loom))]
pub(crate) use std::sync::{
    Mutex, MutexGuard,
    atomic::{AtomicPtr, AtomicU64, AtomicUsize, Ordering},
};
