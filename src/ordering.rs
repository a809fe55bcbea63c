//! Memory orderings for slot access.
//!
//! Every slot load and compare-and-swap goes through a [`MemoryModel`] chosen
//! once at construction, so the orderings used at each access point stay
//! consistent across the codebase.

use std::sync::atomic::Ordering;

/// Memory-ordering strength for slot words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoryModel {
    /// Acquire loads paired with release publication.
    ///
    /// A reader that observes a leaf or array word also observes everything
    /// the publishing thread wrote before its CAS (item fields, the populated
    /// slots of a fresh array node).
    #[default]
    AcquireRelease,

    /// Sequentially consistent everywhere.
    SeqCst,
}

impl MemoryModel {
    /// Ordering for reading a slot word during traversal.
    /// Pairs with the publisher's release CAS.
    #[must_use]
    #[inline(always)]
    pub const fn load(self) -> Ordering {
        match self {
            Self::AcquireRelease => Ordering::Acquire,
            Self::SeqCst => Ordering::SeqCst,
        }
    }

    /// Ordering for CAS success (link, unlink, claim, publish).
    #[must_use]
    #[inline(always)]
    pub const fn cas_success(self) -> Ordering {
        match self {
            Self::AcquireRelease => Ordering::AcqRel,
            Self::SeqCst => Ordering::SeqCst,
        }
    }

    /// Ordering for CAS failure.
    /// Only need to see the current value.
    #[must_use]
    #[inline(always)]
    pub const fn cas_failure(self) -> Ordering {
        match self {
            Self::AcquireRelease => Ordering::Acquire,
            Self::SeqCst => Ordering::SeqCst,
        }
    }
}

/// Ordering for slot writes into an array node no other thread can see yet.
/// The publishing CAS provides the release edge.
pub const UNPUBLISHED: Ordering = Ordering::Relaxed;

/// Ordering for counters that carry no synchronization (statistics).
pub const RELAXED: Ordering = Ordering::Relaxed;
