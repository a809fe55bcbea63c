//! Linked-item counter behind `len()` and `is_empty()`.
//!
//! Incremented after every successful link and decremented after every
//! successful unlink. Under concurrent churn the value may briefly lag the
//! structure; at quiescence it is exact. There is no "always zero" mode
//! since `is_empty()` reads this counter.
//!
//! A link becomes visible before its increment, so an unlink on another
//! thread can decrement first. The raw count is signed for that window and
//! reads clamp it at zero.

use std::sync::atomic::{AtomicIsize, Ordering};

/// Memory ordering used for counter updates.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CountingMode {
    /// Relaxed increments; reads may lag other threads' operations.
    #[default]
    Relaxed,

    /// Sequentially consistent increments and reads.
    Sequential,
}

impl CountingMode {
    const fn ordering(self) -> Ordering {
        match self {
            Self::Relaxed => Ordering::Relaxed,
            Self::Sequential => Ordering::SeqCst,
        }
    }
}

/// Atomic count of linked items.
#[derive(Debug, Default)]
pub struct ItemCounter {
    count: AtomicIsize,
    mode: CountingMode,
}

impl ItemCounter {
    /// Create a zeroed counter.
    #[must_use]
    pub const fn new(mode: CountingMode) -> Self {
        Self {
            count: AtomicIsize::new(0),
            mode,
        }
    }

    #[inline(always)]
    pub(crate) fn inc(&self) {
        self.count.fetch_add(1, self.mode.ordering());
    }

    #[inline(always)]
    pub(crate) fn dec(&self) {
        self.count.fetch_sub(1, self.mode.ordering());
    }

    /// Current count, never below zero.
    #[must_use]
    #[inline(always)]
    pub fn get(&self) -> usize {
        usize::try_from(self.count.load(self.mode.ordering())).unwrap_or(0)
    }

    /// Counting mode in use.
    #[must_use]
    #[inline]
    pub const fn mode(&self) -> CountingMode {
        self.mode
    }
}
