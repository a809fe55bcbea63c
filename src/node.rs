//! Slot words and array nodes.
//!
//! A slot is one `AtomicPtr<u8>` whose two low bits carry a tag:
//!
//! | Word                | State                      |
//! |---------------------|----------------------------|
//! | null                | `Empty`                    |
//! | `item_ptr`          | `Leaf(item)`               |
//! | `item_ptr \| 0b01`  | `Converting(item)`         |
//! | `array_ptr \| 0b10` | `Array(node)`              |
//!
//! Every state transition is a single compare-and-swap on the word. Leaf
//! pointers are borrowed caller items; array pointers come from
//! `Box::into_raw` and are owned by the trie until teardown.
//!
//! Tagging needs items aligned to at least [`TAG_ALIGN`] bytes. The trie
//! checks this at compile time through [`AlignCheck`].

use std::marker::PhantomData;
use std::ptr as StdPtr;
use std::sync::atomic::{AtomicPtr, Ordering};

/// Mask covering the tag bits.
const TAG_MASK: usize = 0b11;

/// Tag for a leaf whose slot is being expanded into an array node.
const TAG_CONVERTING: usize = 0b01;

/// Tag for an array node pointer.
const TAG_ARRAY: usize = 0b10;

/// Minimum alignment of anything stored in a slot.
pub const TAG_ALIGN: usize = TAG_MASK + 1;

/// Post-monomorphization alignment check for item types.
pub(crate) struct AlignCheck<T>(PhantomData<T>);

impl<T> AlignCheck<T> {
    /// Evaluating this constant fails the build for under-aligned `T`.
    pub(crate) const OK: () = assert!(
        std::mem::align_of::<T>() >= TAG_ALIGN,
        "items linked into a HashTrie must be aligned to at least 4 bytes"
    );
}

// ============================================================================
//  Tagged
// ============================================================================

/// A raw slot word: pointer plus tag.
///
/// Compared by address and tag, never dereferenced without decoding.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct Tagged(*mut u8);

impl Tagged {
    /// The empty word.
    pub(crate) const EMPTY: Self = Self(StdPtr::null_mut());

    /// Word for a leaf referencing `item`.
    #[inline(always)]
    pub(crate) fn leaf<T>(item: &T) -> Self {
        Self(StdPtr::from_ref(item).cast::<u8>().cast_mut())
    }

    /// Word for an array node.
    #[inline(always)]
    pub(crate) fn array(node: *mut ArrayNode) -> Self {
        Self(node.cast::<u8>().map_addr(|addr| addr | TAG_ARRAY))
    }

    /// The converting form of this leaf word.
    #[inline(always)]
    pub(crate) fn converting(self) -> Self {
        debug_assert!(self.tag() == 0 && !self.0.is_null());
        Self(self.0.map_addr(|addr| addr | TAG_CONVERTING))
    }

    #[inline(always)]
    fn tag(self) -> usize {
        self.0.addr() & TAG_MASK
    }

    #[inline(always)]
    fn untagged(self) -> *mut u8 {
        self.0.map_addr(|addr| addr & !TAG_MASK)
    }

    /// Address of the referenced object, tag stripped.
    #[inline(always)]
    pub(crate) fn addr(self) -> usize {
        self.untagged().addr()
    }

    /// Decode into a typed state.
    ///
    /// # Safety
    ///
    /// - Leaf and converting words must reference a live `T` for `'g`.
    /// - Array words must reference an `ArrayNode` that outlives `'g`.
    #[inline(always)]
    pub(crate) unsafe fn decode<'g, T>(self) -> SlotState<'g, T> {
        if self.0.is_null() {
            return SlotState::Empty;
        }

        let ptr: *mut u8 = self.untagged();
        match self.tag() {
            // SAFETY: caller guarantees the leaf reference is live for 'g.
            0 => SlotState::Leaf(unsafe { &*ptr.cast::<T>() }),
            // SAFETY: as above; the converting word still references the leaf.
            TAG_CONVERTING => SlotState::Converting(unsafe { &*ptr.cast::<T>() }),
            // SAFETY: caller guarantees the array node outlives 'g.
            TAG_ARRAY => SlotState::Array(unsafe { &*ptr.cast::<ArrayNode>() }),
            _ => unreachable!("invalid slot tag {:#b}", self.tag()),
        }
    }

    /// Raw array pointer, if this is an array word.
    #[inline(always)]
    pub(crate) fn as_array_ptr(self) -> Option<*mut ArrayNode> {
        (self.tag() == TAG_ARRAY).then(|| self.untagged().cast::<ArrayNode>())
    }
}

impl std::fmt::Debug for Tagged {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind: &str = match (self.0.is_null(), self.tag()) {
            (true, _) => "Empty",
            (false, 0) => "Leaf",
            (false, TAG_CONVERTING) => "Converting",
            (false, TAG_ARRAY) => "Array",
            _ => "Invalid",
        };
        write!(f, "{kind}({:#x})", self.addr())
    }
}

/// Decoded slot state.
#[derive(Debug)]
pub(crate) enum SlotState<'g, T> {
    /// No item at this position.
    Empty,

    /// One linked item.
    Leaf(&'g T),

    /// A leaf being replaced by an array node; wait and reload.
    Converting(&'g T),

    /// A deeper level.
    Array(&'g ArrayNode),
}

// ============================================================================
//  Slot
// ============================================================================

/// One atomically accessed cell of an array node.
#[derive(Debug)]
#[repr(transparent)]
pub(crate) struct Slot(AtomicPtr<u8>);

impl Slot {
    #[inline(always)]
    pub(crate) const fn empty() -> Self {
        Self(AtomicPtr::new(StdPtr::null_mut()))
    }

    #[inline(always)]
    pub(crate) fn load(&self, order: Ordering) -> Tagged {
        Tagged(self.0.load(order))
    }

    #[inline(always)]
    pub(crate) fn store(&self, word: Tagged, order: Ordering) {
        self.0.store(word.0, order);
    }

    /// Strong CAS. On failure returns the word actually observed.
    #[inline(always)]
    pub(crate) fn compare_exchange(
        &self,
        current: Tagged,
        new: Tagged,
        success: Ordering,
        failure: Ordering,
    ) -> Result<Tagged, Tagged> {
        self.0
            .compare_exchange(current.0, new.0, success, failure)
            .map(Tagged)
            .map_err(Tagged)
    }

    /// Plain read for teardown, where no other thread can touch the slot.
    #[inline(always)]
    pub(crate) fn get_mut(&mut self) -> Tagged {
        Tagged(*self.0.get_mut())
    }
}

// ============================================================================
//  ArrayNode
// ============================================================================

/// One trie level: a power-of-two sized array of slots.
///
/// Array nodes are only ever mutated through their slots. Once published
/// they stay linked until the trie is dropped.
#[derive(Debug)]
pub(crate) struct ArrayNode {
    slots: Box<[Slot]>,
}

impl ArrayNode {
    /// Create a node of `size` empty slots.
    pub(crate) fn new(size: usize) -> Self {
        debug_assert!(size.is_power_of_two());
        Self {
            slots: (0..size).map(|_| Slot::empty()).collect(),
        }
    }

    /// Create a node on the heap and leak it as a raw pointer.
    pub(crate) fn new_raw(size: usize) -> *mut Self {
        Box::into_raw(Box::new(Self::new(size)))
    }

    #[inline(always)]
    pub(crate) fn slot(&self, idx: usize) -> &Slot {
        &self.slots[idx]
    }

    #[inline(always)]
    pub(crate) fn slots(&self) -> &[Slot] {
        &self.slots
    }

    #[inline(always)]
    pub(crate) fn slots_mut(&mut self) -> &mut [Slot] {
        &mut self.slots
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }
}
