//! Internal event statistics.
//!
//! The trie reports every retry, success, failure and structural event to a
//! [`StatSink`]. The default sink, [`NoStats`], compiles every call away.
//! [`Stats`] keeps one relaxed atomic counter per event.

use std::sync::atomic::{AtomicU64, AtomicUsize};

use crate::ordering::RELAXED;

/// Receiver of trie events. Every method defaults to a no-op.
#[allow(unused_variables)]
pub trait StatSink: Send + Sync {
    /// `insert` linked a new item.
    #[inline(always)]
    fn on_insert_success(&self) {}
    /// `insert` found a duplicate or a hash collision.
    #[inline(always)]
    fn on_insert_failed(&self) {}
    /// `insert` lost a race and retried.
    #[inline(always)]
    fn on_insert_retry(&self) {}

    /// `update` linked a new item.
    #[inline(always)]
    fn on_update_new(&self) {}
    /// `update` replaced an existing item.
    #[inline(always)]
    fn on_update_existing(&self) {}
    /// `update` found nothing to replace (or hit a collision).
    #[inline(always)]
    fn on_update_failed(&self) {}
    /// `update` lost a race and retried.
    #[inline(always)]
    fn on_update_retry(&self) {}

    /// `erase`, `unlink` or `extract` removed an item.
    #[inline(always)]
    fn on_erase_success(&self) {}
    /// `erase`, `unlink` or `extract` found nothing.
    #[inline(always)]
    fn on_erase_failed(&self) {}
    /// `erase`, `unlink` or `extract` lost a race and retried.
    #[inline(always)]
    fn on_erase_retry(&self) {}

    /// `find` located the key.
    #[inline(always)]
    fn on_find_success(&self) {}
    /// `find` did not locate the key.
    #[inline(always)]
    fn on_find_failed(&self) {}

    /// A leaf slot was converted into an array node.
    #[inline(always)]
    fn on_expand_node_success(&self) {}
    /// A leaf slot changed before it could be claimed for expansion.
    #[inline(always)]
    fn on_expand_node_failed(&self) {}
    /// A slot changed under an operation between load and CAS.
    #[inline(always)]
    fn on_slot_changed(&self) {}
    /// An operation met a slot mid-conversion and backed off.
    #[inline(always)]
    fn on_slot_converting(&self) {}
    /// An array node was allocated and linked.
    #[inline(always)]
    fn on_array_node_created(&self) {}
    /// The trie reached `height` levels.
    #[inline(always)]
    fn height(&self, height: usize) {}
}

/// Disabled statistics.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStats;

impl StatSink for NoStats {}

// ============================================================================
//  Stats
// ============================================================================

macro_rules! event_counters {
    ($( $(#[$doc:meta])* $field:ident => $hook:ident ),+ $(,)?) => {
        /// Atomic event counters.
        #[derive(Debug, Default)]
        pub struct Stats {
            $( $(#[$doc])* $field: AtomicU64, )+
            height: AtomicUsize,
        }

        /// Point-in-time copy of [`Stats`].
        ///
        /// Counters are read one by one, so a snapshot taken under load is
        /// not a consistent cut.
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
        pub struct StatsSnapshot {
            $( $(#[$doc])* pub $field: u64, )+
            /// Greatest height reached.
            pub height: usize,
        }

        impl Stats {
            /// Create zeroed counters.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Copy all counters.
            #[must_use]
            pub fn snapshot(&self) -> StatsSnapshot {
                StatsSnapshot {
                    $( $field: self.$field.load(RELAXED), )+
                    height: self.height.load(RELAXED),
                }
            }
        }

        impl StatSink for Stats {
            $(
                #[inline]
                fn $hook(&self) {
                    self.$field.fetch_add(1, RELAXED);
                }
            )+

            #[inline]
            fn height(&self, height: usize) {
                self.height.fetch_max(height, RELAXED);
            }
        }
    };
}

event_counters! {
    /// Successful inserts.
    insert_success => on_insert_success,
    /// Failed inserts.
    insert_failed => on_insert_failed,
    /// Insert retries.
    insert_retry => on_insert_retry,
    /// Updates that linked a new item.
    update_new => on_update_new,
    /// Updates that replaced an item.
    update_existing => on_update_existing,
    /// Failed updates.
    update_failed => on_update_failed,
    /// Update retries.
    update_retry => on_update_retry,
    /// Successful removals.
    erase_success => on_erase_success,
    /// Failed removals.
    erase_failed => on_erase_failed,
    /// Removal retries.
    erase_retry => on_erase_retry,
    /// Successful lookups.
    find_success => on_find_success,
    /// Failed lookups.
    find_failed => on_find_failed,
    /// Leaf-to-array conversions.
    expand_node_success => on_expand_node_success,
    /// Conversions abandoned because the slot changed.
    expand_node_failed => on_expand_node_failed,
    /// Slots changed by another thread mid-operation.
    slot_changed => on_slot_changed,
    /// Slots found mid-conversion.
    slot_converting => on_slot_converting,
    /// Array nodes created.
    array_node_count => on_array_node_created,
}

// ============================================================================
//  LevelStatistics
// ============================================================================

/// Occupancy of one trie level, from
/// [`HashTrie::level_statistics`](crate::HashTrie::level_statistics).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LevelStatistics {
    /// Array nodes at this level.
    pub array_node_count: usize,
    /// Slots per array node at this level.
    pub node_capacity: usize,
    /// Slots holding an item (converting slots included).
    pub data_cell_count: usize,
    /// Slots holding a deeper array node.
    pub array_cell_count: usize,
    /// Empty slots.
    pub empty_cell_count: usize,
}

impl LevelStatistics {
    /// Total slots across all nodes at this level.
    #[must_use]
    #[inline]
    pub const fn total_cells(&self) -> usize {
        self.array_node_count * self.node_capacity
    }
}
