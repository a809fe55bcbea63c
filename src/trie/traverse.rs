//! Hash-path traversal and lookup.

use crate::node::{ArrayNode, Slot, SlotState};
use crate::reclaim::Reclaim;
use crate::split::HashSplitter;
use crate::stats::StatSink;

use super::HashTrie;

/// A slot on an item's hash path.
///
/// `splitter` has consumed the segment that selected `idx`, so its offset
/// is where the next level's segment starts.
pub(super) struct Position<'s, 'h> {
    node: &'s ArrayNode,
    idx: usize,
    pub(super) level: usize,
    pub(super) splitter: HashSplitter<'h>,
}

impl<'s, 'h> Position<'s, 'h> {
    /// The slot at this position.
    #[inline(always)]
    pub(super) fn slot(&self) -> &'s Slot {
        self.node.slot(self.idx)
    }

    /// Step into `child`, selecting the slot for the next segment.
    #[inline(always)]
    pub(super) fn descend(&mut self, child: &'s ArrayNode, bits: usize) {
        self.node = child;
        self.level += 1;
        self.idx = self.splitter.cut(bits);
    }
}

impl<'a, T, const N: usize, R, S> HashTrie<'a, T, N, R, S>
where
    R: Reclaim,
    S: StatSink,
{
    /// Position of `hash` in the head node.
    #[inline(always)]
    pub(super) fn head_position<'s, 'h>(&'s self, hash: &'h [u8; N]) -> Position<'s, 'h> {
        let mut splitter: HashSplitter<'h> = HashSplitter::new(hash);
        let idx: usize = splitter.cut(self.geometry.head_size_log2);

        Position {
            node: &self.head,
            idx,
            level: 0,
            splitter,
        }
    }

    /// Descend along `key` until a slot that is not an array node.
    ///
    /// Converting slots are returned as is; their item is still linked.
    #[inline]
    pub(super) fn locate<'s, 'h>(&'s self, key: &'h [u8; N]) -> (Position<'s, 'h>, SlotState<'s, T>) {
        let mut pos: Position<'s, 'h> = self.head_position(key);

        loop {
            let (_, state) = self.load_slot(pos.slot());
            match state {
                SlotState::Array(child) => pos.descend(child, self.geometry.array_size_log2),
                other => return (pos, other),
            }
        }
    }

    /// Lookup without guard verification.
    pub(super) fn find_in<'s>(&'s self, key: &[u8; N]) -> Option<&'s T> {
        let (_, state) = self.locate(key);

        let found: Option<&'s T> = match state {
            SlotState::Leaf(item) | SlotState::Converting(item) if self.is_match(item, key) => {
                Some(item)
            }
            _ => None,
        };

        if found.is_some() {
            self.stats.on_find_success();
        } else {
            self.stats.on_find_failed();
        }
        found
    }

    // ========================================================================
    //  Public lookup
    // ========================================================================

    /// Find the item whose hash compares equal to `key`.
    ///
    /// The reference is valid while `guard` lives.
    ///
    /// # Panics
    ///
    /// Panics if `guard` was issued by another container.
    #[inline]
    pub fn find<'g>(&'g self, key: &[u8; N], guard: &'g R::Guard<'_>) -> Option<&'g T> {
        self.verify(guard);
        self.find_in(key)
    }

    /// Find the item for `key` and pass it to `f` under an internal guard.
    pub fn find_with<F, U>(&self, key: &[u8; N], f: F) -> Option<U>
    where
        F: FnOnce(&T) -> U,
    {
        let _guard = self.guard();
        self.find_in(key).map(f)
    }

    /// Whether an item with this hash is linked.
    #[must_use]
    pub fn contains(&self, key: &[u8; N]) -> bool {
        let _guard = self.guard();
        self.find_in(key).is_some()
    }
}
