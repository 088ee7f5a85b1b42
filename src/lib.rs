//! A concurrency-safety stress harness for growable-array containers.
//!
//! A dynamic-array append is two steps: write the value at the current
//! count's index, then advance the count (with a capacity check and a
//! reallocation in front when the store is full). Nothing makes those
//! steps atomic, so a plain growable array mutated from several threads
//! loses updates and aims writes past the end of its allocation.
//!
//! This crate keeps that hazard reproducible instead of hiding it, and
//! pairs it with the two classic fixes:
//!
//! * [`RacyVec`]: the unsynchronized baseline; races on purpose, with
//!   the out-of-bounds case surfaced as a caught [`error::BoundsViolation`]
//!   rather than undefined behavior.
//! * [`LockedVec`]: one coarse lock around every operation; linearizable
//!   appends, serialized readers.
//! * [`CowVec`]: copy-on-write, immutable snapshots published by atomic
//!   reference swap; lock-free readers, O(n) appends.
//! * [`stress`]: spawns contending appenders against a chosen variant,
//!   then checks the final size and reconciles every appended value.
//!
//! # Examples
//! ```
//! use racevec::locked_vec;
//!
//! let list = locked_vec!(10, [1, 2, 3]);
//!
//! // only one write lock may be held
//! {
//!     let mut guard = list.lock().unwrap();
//!     guard.push(4);
//!     guard.push(5);
//! }
//!
//! assert_eq!(list.len(), 5);
//! assert_eq!(list.to_vec(), [1, 2, 3, 4, 5]);
//! ```

mod cap;
mod cow;
pub mod error;
mod grow;
pub mod guard;
mod locked;
mod macros;
mod racy;
mod raw;
pub mod stamp;
pub mod stress;
mod sync;
#[cfg(test)]
mod tests;

pub use crate::{
    cow::CowVec,
    grow::{DEFAULT_CAPACITY, GrowVec},
    locked::LockedVec,
    racy::RacyVec,
};
