//! Typed record identifiers for the realmforge engine.
//!
//! Every persistent record — user, realm, task, daily quest, ledger entry —
//! is addressed by its own niche-optimized id newtype so that a [`TaskId`]
//! can never be passed where a [`RealmId`] is expected. The
//! [`IdAllocator`] hands out monotonically increasing raw ids shared across
//! all record kinds and can resume from a persisted watermark after restart.

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{ForgeResult, IdentError};

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        ///
        /// Uses `NonZeroU64` so that `Option<Self>` is the same size as `Self`
        /// (the niche optimization lets the compiler use 0 as the `None`
        /// discriminant).
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[repr(transparent)]
        pub struct $name(NonZeroU64);

        impl $name {
            /// Create an id from a raw `u64`. Returns `None` if `raw` is zero.
            pub fn new(raw: u64) -> Option<Self> {
                NonZeroU64::new(raw).map(Self)
            }

            /// Wrap an allocator-produced raw id.
            pub fn from_raw(raw: NonZeroU64) -> Self {
                Self(raw)
            }

            /// Get the underlying `u64` value.
            pub fn get(self) -> u64 {
                self.0.get()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a user.
    UserId,
    "user"
);
define_id!(
    /// Unique identifier for a realm.
    RealmId,
    "realm"
);
define_id!(
    /// Unique identifier for a task.
    TaskId,
    "task"
);
define_id!(
    /// Unique identifier for a daily quest.
    QuestId,
    "quest"
);
define_id!(
    /// Unique identifier for an XP ledger entry.
    EntryId,
    "entry"
);

/// Thread-safe id allocator.
///
/// Produces monotonically increasing raw ids starting from 1, shared across
/// all record kinds (a task and a realm never collide, and ledger tie-breaks
/// on id are globally deterministic). Safe to share via `Arc<IdAllocator>`.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    /// Create a new allocator that starts from id 1.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Create an allocator that resumes from a persisted watermark.
    pub fn starting_from(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start.max(1)),
        }
    }

    /// Allocate the next raw id.
    ///
    /// Returns an error if the id space is exhausted (after 2^64 - 1 allocations).
    pub fn next_raw(&self) -> ForgeResult<NonZeroU64> {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        NonZeroU64::new(raw).ok_or_else(|| IdentError::AllocatorExhausted.into())
    }

    /// Return the next id that *would* be allocated, without consuming it.
    ///
    /// This is the watermark persisted to the store's meta table.
    pub fn peek_next(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_niche_optimization() {
        assert_eq!(
            std::mem::size_of::<Option<TaskId>>(),
            std::mem::size_of::<TaskId>()
        );
    }

    #[test]
    fn zero_is_none() {
        assert!(TaskId::new(0).is_none());
        assert!(TaskId::new(1).is_some());
        assert_eq!(UserId::new(42).unwrap().get(), 42);
    }

    #[test]
    fn allocator_produces_sequential_ids() {
        let alloc = IdAllocator::new();
        assert_eq!(alloc.next_raw().unwrap().get(), 1);
        assert_eq!(alloc.next_raw().unwrap().get(), 2);
        assert_eq!(alloc.next_raw().unwrap().get(), 3);
    }

    #[test]
    fn allocator_starting_from() {
        let alloc = IdAllocator::starting_from(100);
        assert_eq!(alloc.next_raw().unwrap().get(), 100);
        assert_eq!(alloc.peek_next(), 101);
    }

    #[test]
    fn id_display() {
        assert_eq!(TaskId::new(42).unwrap().to_string(), "task:42");
        assert_eq!(QuestId::new(7).unwrap().to_string(), "quest:7");
    }

    #[test]
    fn id_ordering() {
        assert!(EntryId::new(1).unwrap() < EntryId::new(2).unwrap());
    }
}
