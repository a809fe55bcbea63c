//! Insertion and leaf expansion.
//!
//! ```text
//! Empty slot:  CAS Empty → Leaf(new)
//!
//! Leaf slot:   1. allocate array node A
//!              2. CAS Leaf(old) → Converting(old)          (claim)
//!              3. place old and new in A, nesting further
//!                 nodes while their segments collide       (populate)
//!              4. CAS Converting(old) → Array(A)           (publish)
//! ```
//!
//! Only the claiming thread may touch a converting slot, so step 4 cannot
//! fail. Everyone else backs off until the array is published. Steps 1-3
//! write into memory no other thread can reach yet, so they use relaxed
//! stores; the release half of the publishing CAS orders them.

use std::cmp::Ordering as CmpOrdering;

use crate::node::{ArrayNode, SlotState, Tagged};
use crate::ordering::UNPUBLISHED;
use crate::reclaim::Reclaim;
use crate::split::HashSplitter;
use crate::stats::StatSink;
use crate::tracing_helpers::{debug_log, error_log, trace_log, warn_log};

use super::traverse::Position;
use super::{HashTrie, InsertError};

impl<'a, T, const N: usize, R, S> HashTrie<'a, T, N, R, S>
where
    R: Reclaim,
    S: StatSink,
{
    /// Link `item`.
    ///
    /// # Errors
    ///
    /// - [`InsertError::Duplicate`] if an item with an equal hash is linked.
    /// - [`InsertError::HashCollision`] if a distinct item has the same hash
    ///   bytes. Nothing is modified in either case.
    pub fn insert(&self, item: &'a T) -> Result<(), InsertError> {
        let guard = self.guard();
        self.insert_with_guard(item, &guard)
    }

    /// Link `item` under a caller-held guard.
    ///
    /// Amortizes guard entry over a batch of inserts.
    ///
    /// # Errors
    ///
    /// Same as [`insert`](Self::insert).
    ///
    /// # Panics
    ///
    /// Panics if `guard` was issued by another container.
    pub fn insert_with_guard(&self, item: &'a T, guard: &R::Guard<'_>) -> Result<(), InsertError> {
        self.verify(guard);

        let hash: &[u8; N] = self.hash_of(item);
        let mut pos: Position<'_, '_> = self.head_position(hash);
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

                SlotState::Empty | SlotState::Leaf(_) => {
                    match self.try_link(&pos, word, state, item, hash) {
                        Ok(true) => {
                            self.count.inc();
                            self.stats.on_insert_success();
                            return Ok(());
                        }
                        Ok(false) => {
                            trace_log!(level = pos.level, attempt, "insert retry");
                            self.stats.on_insert_retry();
                        }
                        Err(err) => {
                            self.stats.on_insert_failed();
                            return Err(err);
                        }
                    }
                }
            }

            self.backoff(&mut attempt);
        }
    }

    // ========================================================================
    //  Link step
    // ========================================================================

    /// One attempt to link `item` at an empty or leaf slot.
    ///
    /// Returns `Ok(false)` when the slot changed and the caller must reload.
    /// The count and success statistics are left to the caller.
    pub(super) fn try_link(
        &self,
        pos: &Position<'_, '_>,
        word: Tagged,
        state: SlotState<'_, T>,
        item: &'a T,
        hash: &[u8; N],
    ) -> Result<bool, InsertError> {
        match state {
            SlotState::Empty => {
                let linked: bool = self.cas_slot(pos.slot(), word, Tagged::leaf(item)).is_ok();
                if !linked {
                    self.stats.on_slot_changed();
                }
                Ok(linked)
            }

            SlotState::Leaf(existing) => {
                let existing_hash: &[u8; N] = self.hash_of(existing);

                if (self.config.compare)(existing_hash, hash) == CmpOrdering::Equal {
                    return Err(InsertError::Duplicate);
                }
                if existing_hash == hash {
                    warn_log!(level = pos.level, "distinct items share a full hash value");
                    return Err(InsertError::HashCollision);
                }

                Ok(self.expand(pos, word, existing_hash, item, hash))
            }

            SlotState::Converting(_) | SlotState::Array(_) => Ok(false),
        }
    }

    /// Replace the leaf at `pos` by an array node holding it and `item`.
    ///
    /// Returns `false` if the leaf changed before it could be claimed.
    fn expand(
        &self,
        pos: &Position<'_, '_>,
        leaf: Tagged,
        existing_hash: &[u8; N],
        item: &'a T,
        hash: &[u8; N],
    ) -> bool {
        let array_size: usize = self.geometry.array_size;
        let bits: usize = self.geometry.array_size_log2;
        let converting: Tagged = leaf.converting();

        let fresh: *mut ArrayNode = ArrayNode::new_raw(array_size);

        // Claim.
        if self.cas_slot(pos.slot(), leaf, converting).is_err() {
            // SAFETY: fresh was never published.
            drop(unsafe { Box::from_raw(fresh) });
            self.stats.on_expand_node_failed();
            self.stats.on_slot_changed();
            return false;
        }
        self.stats.on_array_node_created();

        // Populate.
        let offset: usize = pos.splitter.bit_offset();
        let mut old_split: HashSplitter<'_> = HashSplitter::with_offset(existing_hash, offset);
        let mut new_split: HashSplitter<'_> = HashSplitter::with_offset(hash, offset);

        // SAFETY: fresh is a live Box only this thread can reach.
        let mut node: &ArrayNode = unsafe { &*fresh };
        let mut deepest: usize = pos.level + 1;

        loop {
            // The hashes differ and agree on every bit before `offset`, so
            // they diverge before either splitter runs out.
            let old_idx: usize = old_split.cut(bits);
            let new_idx: usize = new_split.cut(bits);

            if old_idx != new_idx {
                node.slot(old_idx).store(leaf, UNPUBLISHED);
                node.slot(new_idx).store(Tagged::leaf(item), UNPUBLISHED);
                break;
            }

            let child: *mut ArrayNode = ArrayNode::new_raw(array_size);
            node.slot(old_idx).store(Tagged::array(child), UNPUBLISHED);
            self.stats.on_array_node_created();

            // SAFETY: child is now owned by node, which is still private.
            node = unsafe { &*child };
            deepest += 1;
        }

        // Publish.
        if let Err(actual) = self.cas_slot(pos.slot(), converting, Tagged::array(fresh)) {
            error_log!(level = pos.level, ?actual, "converting slot changed under its owner");
            panic!("converting slot changed under its owner: {actual:?}");
        }

        self.stats.on_expand_node_success();
        self.stats.height(deepest + 1);
        debug_log!(level = pos.level, deepest, "leaf expanded");

        true
    }
}
