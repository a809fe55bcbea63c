//! `HashTrie` - a lock-free intrusive hash trie.
//!
//! This module provides the container type, its outcome and error types, and
//! the shared plumbing (slot loads, guard verification, item retirement) used
//! by the operation submodules.
//!
//! # Structure
//!
//! ```text
//! head (2^head_bits slots, level 0)
//!  ├─ Empty
//!  ├─ Leaf(&item)
//!  └─ Array ──► node (2^array_bits slots, level 1)
//!                ├─ Leaf(&item)
//!                └─ Array ──► node (level 2) ...
//! ```
//!
//! An item lives in the first slot along its hash path that no other item
//! shares. When a second item arrives at an occupied leaf slot, the slot is
//! expanded into an array node holding both.
//!
//! # Operation protocol
//!
//! ```text
//! 1. guard = trie.guard()
//! 2. cut head segment, load head slot
//! 3. Array      → cut next segment, descend
//!    Converting → back off, reload
//!    Empty/Leaf → CAS the slot; on a lost race reload and retry
//! 4. unlinked leaves are retired through the guard
//! 5. drop(guard)
//! ```

use std::cmp::Ordering as CmpOrdering;
use std::fmt as StdFmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::config::{Config, Disposer};
use crate::counter::ItemCounter;
use crate::geometry::{ConfigError, Geometry};
use crate::node::{AlignCheck, ArrayNode, Slot, SlotState, Tagged};
use crate::reclaim::{Deferred, Reclaim, ReclaimGuard, Retire};
use crate::stats::{NoStats, StatSink};
use crate::tracing_helpers::debug_log;

mod diagnostics;
mod erase;
mod insert;
mod iter;
mod traverse;
mod update;



pub use erase::Extracted;
pub use iter::Iter;

// ============================================================================
//  Errors and outcomes
// ============================================================================

/// Reasons an insert links nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    /// An item with an equal hash is already linked.
    Duplicate,

    /// Two distinct items share every bit of their hash.
    ///
    /// The fixed-size hash cannot tell them apart. Not retryable; the hash
    /// is too narrow or too weak for the data set.
    HashCollision,
}

impl StdFmt::Display for InsertError {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        match self {
            Self::Duplicate => write!(f, "an item with this hash is already linked"),
            Self::HashCollision => {
                write!(f, "distinct items share the full hash value")
            }
        }
    }
}

impl std::error::Error for InsertError {}

/// Reasons an update changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateError {
    /// No item with this hash is linked and insertion was not allowed.
    NotFound,

    /// Insertion was attempted and hit a full-width hash collision.
    HashCollision,
}

impl StdFmt::Display for UpdateError {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        match self {
            Self::NotFound => write!(f, "no item with this hash is linked"),
            Self::HashCollision => {
                write!(f, "distinct items share the full hash value")
            }
        }
    }
}

impl std::error::Error for UpdateError {}

impl From<InsertError> for UpdateError {
    fn from(err: InsertError) -> Self {
        match err {
            // An update only inserts where nothing equal is linked.
            InsertError::Duplicate => Self::NotFound,
            InsertError::HashCollision => Self::HashCollision,
        }
    }
}

/// Successful [`HashTrie::update`] outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Updated<'g, T> {
    /// Nothing equal was linked; the item was inserted.
    Inserted,

    /// The returned item was replaced and retired.
    Replaced(&'g T),
}

// ============================================================================
//  HashTrie
// ============================================================================

/// A lock-free set of caller-owned items keyed by a fixed-size hash.
///
/// # Type Parameters
///
/// - `'a` - how long linked items are borrowed
/// - `T` - item type (alignment of at least 4 bytes)
/// - `N` - hash length in bytes
/// - `R` - reclamation scheme (default [`Deferred`])
/// - `S` - statistics sink (default [`NoStats`])
///
/// # Example
///
/// ```rust
/// use hashtrie::{Config, HashTrie};
///
/// #[repr(align(8))]
/// struct User {
///     id_hash: [u8; 8],
///     name: &'static str,
/// }
///
/// fn user_hash(u: &User) -> &[u8; 8] {
///     &u.id_hash
/// }
///
/// let alice = User { id_hash: 1u64.to_be_bytes(), name: "alice" };
/// let bob = User { id_hash: 2u64.to_be_bytes(), name: "bob" };
///
/// let trie: HashTrie<'_, User, 8> = HashTrie::new(Config::new(user_hash)).unwrap();
/// trie.insert(&alice).unwrap();
/// trie.insert(&bob).unwrap();
///
/// let guard = trie.guard();
/// assert_eq!(trie.find(&2u64.to_be_bytes(), &guard).map(|u| u.name), Some("bob"));
/// assert_eq!(trie.len(), 2);
/// ```
pub struct HashTrie<'a, T, const N: usize, R = Deferred, S = NoStats>
where
    R: Reclaim,
    S: StatSink,
{
    /// Level-0 node, alive for the trie's lifetime.
    head: Box<ArrayNode>,

    /// Validated level widths.
    geometry: Geometry,

    /// Accessor, comparator, disposer, backoff and orderings.
    config: Config<T, N>,

    /// Linked items.
    count: ItemCounter,

    /// Event sink.
    stats: S,

    /// Reclamation scheme. Declared last so pending disposals run after
    /// teardown has released the nodes.
    reclaimer: R,

    /// Items are borrowed, never owned.
    _items: PhantomData<&'a T>,
}

impl<'a, T, const N: usize> HashTrie<'a, T, N> {
    /// Create a trie with deferred reclamation and no statistics.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the bit widths cannot tile the hash.
    pub fn new(config: Config<T, N>) -> Result<Self, ConfigError> {
        Self::with_parts(config, Deferred::new(), NoStats)
    }
}

impl<'a, T, const N: usize, R, S> HashTrie<'a, T, N, R, S>
where
    R: Reclaim,
    S: StatSink,
{
    /// Create a trie with an explicit reclamation scheme and statistics sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the bit widths cannot tile the hash.
    pub fn with_parts(config: Config<T, N>, reclaimer: R, stats: S) -> Result<Self, ConfigError> {
        let () = AlignCheck::<T>::OK;

        let geometry: Geometry = config.geometry()?;
        let head: Box<ArrayNode> = Box::new(ArrayNode::new(geometry.head_size));

        debug_log!(
            head_size = geometry.head_size,
            array_size = geometry.array_size,
            max_height = geometry.max_height(),
            "hash trie created"
        );

        stats.height(1);

        Ok(Self {
            head,
            geometry,
            count: ItemCounter::new(config.counting),
            config,
            stats,
            reclaimer,
            _items: PhantomData,
        })
    }

    /// Enter a protected region and return a guard.
    ///
    /// References returned by guard-taking methods stay valid, and their
    /// disposer is held back, until the guard drops.
    #[must_use]
    #[inline(always)]
    pub fn guard(&self) -> R::Guard<'_> {
        self.reclaimer.enter()
    }

    /// Number of linked items.
    ///
    /// Approximate while other threads are linking or unlinking, exact at
    /// quiescence.
    #[must_use]
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.count.get()
    }

    /// Whether no item is linked.
    #[must_use]
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots in the head node.
    #[must_use]
    #[inline]
    pub const fn head_size(&self) -> usize {
        self.geometry.head_size
    }

    /// Slots in every deeper array node.
    #[must_use]
    #[inline]
    pub const fn array_node_size(&self) -> usize {
        self.geometry.array_size
    }

    /// Maximum number of levels.
    #[must_use]
    #[inline]
    pub const fn max_height(&self) -> usize {
        self.geometry.max_height()
    }

    /// Validated geometry.
    #[must_use]
    #[inline]
    pub const fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// The statistics sink.
    #[must_use]
    #[inline]
    pub const fn stats(&self) -> &S {
        &self.stats
    }

    /// The reclamation scheme.
    #[must_use]
    #[inline]
    pub const fn reclaimer(&self) -> &R {
        &self.reclaimer
    }

    // ========================================================================
    //  Internal Helpers
    // ========================================================================

    /// Panic if `guard` came from another container.
    #[inline(always)]
    fn verify(&self, guard: &R::Guard<'_>) {
        assert!(
            self.reclaimer.owns(guard),
            "guard was issued by a different container"
        );
    }

    /// Hash of a linked or candidate item.
    #[inline(always)]
    fn hash_of<'t>(&self, item: &'t T) -> &'t [u8; N] {
        (self.config.hash)(item)
    }

    /// Whether `item` is the item identified by `key`.
    #[inline(always)]
    fn is_match(&self, item: &T, key: &[u8; N]) -> bool {
        (self.config.compare)(self.hash_of(item), key) == CmpOrdering::Equal
    }

    /// Load and decode a slot.
    #[inline(always)]
    fn load_slot<'s>(&'s self, slot: &'s Slot) -> (Tagged, SlotState<'s, T>) {
        let word: Tagged = slot.load(self.config.memory_model.load());

        // SAFETY: leaf and converting words reference items borrowed for 'a,
        // and 'a: 's. Array words reference nodes owned by this trie and
        // freed only in Drop, which needs &mut self.
        (word, unsafe { word.decode::<T>() })
    }

    /// CAS a slot with the configured orderings.
    #[inline(always)]
    fn cas_slot(&self, slot: &Slot, current: Tagged, new: Tagged) -> Result<Tagged, Tagged> {
        let model = self.config.memory_model;
        slot.compare_exchange(current, new, model.cas_success(), model.cas_failure())
    }

    /// Pause before retry `attempt`.
    #[inline(always)]
    fn backoff(&self, attempt: &mut u32) {
        self.config.backoff.pause(*attempt);
        *attempt = attempt.saturating_add(1);
    }

    /// Hand an unlinked item to the reclamation scheme.
    ///
    /// Without a disposer there is nothing to release: the caller owns the
    /// storage and the trie holds no resources for the item.
    fn retire_item(&self, item: &T, guard: &R::Guard<'_>) {
        let Some(disposer) = self.config.disposer.as_ref() else {
            return;
        };

        let record: *mut RetiredItem<T> = Box::into_raw(Box::new(RetiredItem {
            item: NonNull::from(item),
            disposer: Disposer::clone(disposer),
        }));

        // SAFETY: the item was just unlinked by a successful CAS, so no
        // traversal starting after this point can reach it. The record is a
        // fresh Box, matching RetiredItem::reclaim.
        unsafe { guard.retire(record) };
    }
}

// ============================================================================
//  Retired items
// ============================================================================

/// An unlinked item waiting for its disposer.
struct RetiredItem<T> {
    item: NonNull<T>,
    disposer: Disposer<T>,
}

impl<T> Retire for RetiredItem<T> {
    unsafe fn reclaim(ptr: *mut Self) {
        // SAFETY: ptr came from Box::into_raw in retire_item.
        let record: Box<Self> = unsafe { Box::from_raw(ptr) };

        // SAFETY: items are borrowed for the trie's 'a, and the reclaimer
        // (which runs this) never outlives the trie.
        (record.disposer)(unsafe { record.item.as_ref() });
    }
}

// ============================================================================
//  Teardown
// ============================================================================

impl<T, const N: usize, R, S> Drop for HashTrie<'_, T, N, R, S>
where
    R: Reclaim,
    S: StatSink,
{
    fn drop(&mut self) {
        let disposer: Option<Disposer<T>> = self.config.disposer.clone();
        let mut pending: Vec<Box<ArrayNode>> = Vec::new();

        drain_node::<T>(&mut self.head, disposer.as_ref(), &mut pending);
        while let Some(mut node) = pending.pop() {
            drain_node::<T>(&mut node, disposer.as_ref(), &mut pending);
        }
    }
}

/// Dispose every item in `node` and queue its child arrays for freeing.
fn drain_node<T>(
    node: &mut ArrayNode,
    disposer: Option<&Disposer<T>>,
    pending: &mut Vec<Box<ArrayNode>>,
) {
    for slot in node.slots_mut() {
        let word: Tagged = slot.get_mut();

        if let Some(child) = word.as_array_ptr() {
            // SAFETY: published array nodes come from Box::into_raw and are
            // linked from exactly one slot.
            pending.push(unsafe { Box::from_raw(child) });
            continue;
        }

        // SAFETY: exclusive access; leaf words reference items borrowed for 'a.
        match unsafe { word.decode::<T>() } {
            SlotState::Leaf(item) | SlotState::Converting(item) => {
                if let Some(dispose) = disposer {
                    dispose(item);
                }
            }
            SlotState::Empty | SlotState::Array(_) => {}
        }
    }
}

impl<T, const N: usize, R, S> StdFmt::Debug for HashTrie<'_, T, N, R, S>
where
    R: Reclaim,
    S: StatSink,
{
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_struct("HashTrie")
            .field("len", &self.len())
            .field("geometry", &self.geometry)
            .finish_non_exhaustive()
    }
}
