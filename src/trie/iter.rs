//! Best-effort traversal of linked items.

use std::marker::PhantomData;
use std::sync::atomic::Ordering;

use crate::node::{ArrayNode, SlotState};
use crate::reclaim::Reclaim;
use crate::stats::StatSink;

use super::HashTrie;

/// Depth-first iterator over linked items, in hash-bit order.
///
/// Not a snapshot. An item linked or unlinked during iteration may or may
/// not be yielded; every item linked for the whole iteration is yielded
/// exactly once.
pub struct Iter<'g, T> {
    /// Nodes on the current path with the next slot to visit in each.
    stack: Vec<(&'g ArrayNode, usize)>,
    order: Ordering,
    _items: PhantomData<&'g T>,
}

impl<'g, T> Iterator for Iter<'g, T> {
    type Item = &'g T;

    fn next(&mut self) -> Option<&'g T> {
        loop {
            let (node, next) = self.stack.last_mut()?;
            let node: &'g ArrayNode = *node;

            if *next >= node.capacity() {
                self.stack.pop();
                continue;
            }

            let word = node.slot(*next).load(self.order);
            *next += 1;

            // SAFETY: the iterator borrows the trie for 'g; items outlive the
            // trie and array nodes are freed only in its Drop.
            match unsafe { word.decode::<T>() } {
                SlotState::Empty => {}
                SlotState::Leaf(item) | SlotState::Converting(item) => return Some(item),
                SlotState::Array(child) => self.stack.push((child, 0)),
            }
        }
    }
}

impl<'a, T, const N: usize, R, S> HashTrie<'a, T, N, R, S>
where
    R: Reclaim,
    S: StatSink,
{
    /// Iterate over linked items while `guard` lives.
    ///
    /// # Panics
    ///
    /// Panics if `guard` was issued by another container.
    pub fn iter<'g>(&'g self, guard: &'g R::Guard<'_>) -> Iter<'g, T> {
        self.verify(guard);

        Iter {
            stack: vec![(&*self.head, 0)],
            order: self.config.memory_model.load(),
            _items: PhantomData,
        }
    }
}
