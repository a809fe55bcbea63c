//! In-place replacement and upsert.
//!
//! Replacement swaps the leaf word in one CAS `Leaf(old) → Leaf(new)`; the
//! slot never passes through `Empty`, so readers see either item but never
//! a gap.

use std::ptr as StdPtr;

use crate::node::{SlotState, Tagged};
use crate::reclaim::Reclaim;
use crate::stats::StatSink;
use crate::tracing_helpers::trace_log;

use super::traverse::Position;
use super::{HashTrie, UpdateError, Updated};

impl<'a, T, const N: usize, R, S> HashTrie<'a, T, N, R, S>
where
    R: Reclaim,
    S: StatSink,
{
    /// Replace the item whose hash equals `item`'s, or insert `item` if none
    /// is linked and `allow_insert` is set.
    ///
    /// A replaced item is retired and returned. Updating an item with
    /// itself is a no-op that reports `Replaced(item)` and retires nothing.
    ///
    /// # Errors
    ///
    /// - [`UpdateError::NotFound`] if nothing equal is linked and
    ///   `allow_insert` is `false`.
    /// - [`UpdateError::HashCollision`] if insertion hit a distinct item
    ///   with the same hash bytes.
    ///
    /// # Panics
    ///
    /// Panics if `guard` was issued by another container.
    pub fn update<'g>(
        &'g self,
        item: &'a T,
        allow_insert: bool,
        guard: &'g R::Guard<'_>,
    ) -> Result<Updated<'g, T>, UpdateError> {
        self.verify(guard);
        self.update_in(item, allow_insert, guard)
    }

    /// Insert `item` or replace its equal. Returns `true` if an item was
    /// replaced.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::HashCollision`] on a full-width collision.
    pub fn upsert(&self, item: &'a T) -> Result<bool, UpdateError> {
        let guard = self.guard();
        let outcome: Updated<'_, T> = self.update_in(item, true, &guard)?;
        Ok(matches!(outcome, Updated::Replaced(_)))
    }

    fn update_in<'s>(
        &'s self,
        item: &'a T,
        allow_insert: bool,
        guard: &R::Guard<'_>,
    ) -> Result<Updated<'s, T>, UpdateError> {
        let hash: &[u8; N] = self.hash_of(item);
        let mut pos: Position<'s, '_> = self.head_position(hash);
        let mut attempt: u32 = 0;

        loop {
            let (word, state) = self.load_slot(pos.slot());

            match state {
                SlotState::Array(child) => {
                    pos.descend(child, self.geometry.array_size_log2);
                    continue;
                }

                SlotState::Converting(_) => {
                    self.stats.on_slot_converting();
                }

                SlotState::Leaf(existing) if self.is_match(existing, hash) => {
                    if StdPtr::eq(existing, item) {
                        self.stats.on_update_existing();
                        return Ok(Updated::Replaced(existing));
                    }

                    if self.cas_slot(pos.slot(), word, Tagged::leaf(item)).is_ok() {
                        self.retire_item(existing, guard);
                        self.stats.on_update_existing();
                        return Ok(Updated::Replaced(existing));
                    }

                    self.stats.on_slot_changed();
                    self.stats.on_update_retry();
                }

                SlotState::Empty | SlotState::Leaf(_) if !allow_insert => {
                    self.stats.on_update_failed();
                    return Err(UpdateError::NotFound);
                }

                SlotState::Empty | SlotState::Leaf(_) => {
                    match self.try_link(&pos, word, state, item, hash) {
                        Ok(true) => {
                            self.count.inc();
                            self.stats.on_update_new();
                            return Ok(Updated::Inserted);
                        }
                        Ok(false) => {
                            trace_log!(level = pos.level, attempt, "update retry");
                            self.stats.on_update_retry();
                        }
                        Err(err) => {
                            self.stats.on_update_failed();
                            return Err(err.into());
                        }
                    }
                }
            }

            self.backoff(&mut attempt);
        }
    }
}
