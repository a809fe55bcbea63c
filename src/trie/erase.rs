//! Removal: erase, unlink, extract and clear.
//!
//! A removal is one CAS `Leaf(item) → Empty`. The slot is never reverted to
//! anything else and array nodes stay linked, so the path to every other
//! item is unchanged.

use std::fmt as StdFmt;
use std::ops::Deref;
use std::ptr as StdPtr;

use crate::node::{ArrayNode, SlotState, Tagged};
use crate::reclaim::Reclaim;
use crate::stats::StatSink;
use crate::tracing_helpers::{debug_log, trace_log};

use super::HashTrie;

impl<'a, T, const N: usize, R, S> HashTrie<'a, T, N, R, S>
where
    R: Reclaim,
    S: StatSink,
{
    /// Unlink the item for `key` if `accept` approves it.
    ///
    /// The unlinked item is retired through `guard`.
    pub(super) fn erase_in<'s, F>(
        &'s self,
        key: &[u8; N],
        guard: &R::Guard<'_>,
        accept: F,
    ) -> Option<&'s T>
    where
        F: Fn(&T) -> bool,
    {
        let mut pos = self.head_position(key);
        let mut attempt: u32 = 0;

        loop {
            let (word, state) = self.load_slot(pos.slot());

            match state {
                SlotState::Array(child) => {
                    pos.descend(child, self.geometry.array_size_log2);
                    continue;
                }

                SlotState::Empty => {
                    self.stats.on_erase_failed();
                    return None;
                }

                SlotState::Leaf(item) => {
                    if !self.is_match(item, key) || !accept(item) {
                        self.stats.on_erase_failed();
                        return None;
                    }

                    if self.cas_slot(pos.slot(), word, Tagged::EMPTY).is_ok() {
                        self.count.dec();
                        self.retire_item(item, guard);
                        self.stats.on_erase_success();
                        return Some(item);
                    }

                    trace_log!(level = pos.level, attempt, "erase retry");
                    self.stats.on_slot_changed();
                    self.stats.on_erase_retry();
                }

                SlotState::Converting(_) => {
                    self.stats.on_slot_converting();
                }
            }

            self.backoff(&mut attempt);
        }
    }

    /// Unlink the item for `key` and return it.
    ///
    /// The item is retired: its disposer runs once `guard` and every other
    /// guard that may have seen it are dropped.
    ///
    /// # Panics
    ///
    /// Panics if `guard` was issued by another container.
    pub fn erase<'g>(&'g self, key: &[u8; N], guard: &'g R::Guard<'_>) -> Option<&'g T> {
        self.verify(guard);
        self.erase_in(key, guard, |_| true)
    }

    /// Unlink the item for `key` if `accept` returns `true` for it.
    ///
    /// # Panics
    ///
    /// Panics if `guard` was issued by another container.
    pub fn erase_if<'g, F>(&'g self, key: &[u8; N], guard: &'g R::Guard<'_>, accept: F) -> Option<&'g T>
    where
        F: Fn(&T) -> bool,
    {
        self.verify(guard);
        self.erase_in(key, guard, accept)
    }

    /// Unlink the item for `key`. Returns whether something was removed.
    pub fn remove(&self, key: &[u8; N]) -> bool {
        let guard = self.guard();
        self.erase_in(key, &guard, |_| true).is_some()
    }

    /// Unlink exactly `item`.
    ///
    /// Fails if the item linked under its hash is a different object, even
    /// if the two compare equal.
    pub fn unlink(&self, item: &T) -> bool {
        let guard = self.guard();
        let key: &[u8; N] = self.hash_of(item);
        self.erase_in(key, &guard, |linked| StdPtr::eq(linked, item))
            .is_some()
    }

    /// Unlink the item for `key` and hand it back under a private guard.
    ///
    /// The item's disposer is held back until the returned handle drops.
    pub fn extract(&self, key: &[u8; N]) -> Option<Extracted<'_, T, R>> {
        let guard: R::Guard<'_> = self.guard();
        let item: &T = self.erase_in(key, &guard, |_| true)?;

        Some(Extracted {
            item,
            _guard: guard,
        })
    }

    /// Unlink every item.
    ///
    /// Not atomic: items linked concurrently may survive, and concurrent
    /// readers may see a partially cleared trie. Array nodes are kept.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    pub fn clear(&self) {
        let guard = self.guard();
        let mut stack: Vec<&ArrayNode> = vec![&*self.head];

        while let Some(node) = stack.pop() {
            for slot in node.slots() {
                let mut attempt: u32 = 0;

                loop {
                    let (word, state) = self.load_slot(slot);

                    match state {
                        SlotState::Empty => break,

                        SlotState::Array(child) => {
                            stack.push(child);
                            break;
                        }

                        SlotState::Leaf(item) => {
                            if self.cas_slot(slot, word, Tagged::EMPTY).is_ok() {
                                self.count.dec();
                                self.retire_item(item, &guard);
                                self.stats.on_erase_success();
                                break;
                            }
                            self.stats.on_slot_changed();
                            self.stats.on_erase_retry();
                        }

                        SlotState::Converting(_) => {
                            self.stats.on_slot_converting();
                            self.backoff(&mut attempt);
                        }
                    }
                }
            }
        }

        debug_log!(remaining = self.len(), "trie cleared");
    }
}

// ============================================================================
//  Extracted
// ============================================================================

/// An unlinked item protected by its own guard.
///
/// Dereferences to the item. The item's disposer runs no earlier than this
/// handle's drop.
pub struct Extracted<'t, T, R>
where
    R: Reclaim + 't,
{
    item: &'t T,
    _guard: R::Guard<'t>,
}

impl<'t, T, R: Reclaim + 't> Extracted<'t, T, R> {
    /// The extracted item.
    #[must_use]
    #[inline]
    pub const fn get(&self) -> &T {
        self.item
    }
}

impl<'t, T, R: Reclaim + 't> Deref for Extracted<'t, T, R> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.item
    }
}

impl<'t, T: StdFmt::Debug, R: Reclaim + 't> StdFmt::Debug for Extracted<'t, T, R> {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_tuple("Extracted").field(self.item).finish()
    }
}
