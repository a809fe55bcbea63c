//! Construction-time configuration for [`HashTrie`](crate::HashTrie).
//!
//! Every behavior the trie lets callers override lives in one [`Config`]
//! value with named fields, injected once at construction:
//!
//! | Field          | Default                          |
//! |----------------|----------------------------------|
//! | `head_bits`    | [`DEFAULT_HEAD_BITS`] (8)        |
//! | `array_bits`   | [`DEFAULT_ARRAY_BITS`] (4)       |
//! | `hash`         | required                         |
//! | `compare`      | [`bitwise_compare`]              |
//! | `disposer`     | `None`                           |
//! | `backoff`      | [`SpinYield::default()`]         |
//! | `memory_model` | [`MemoryModel::AcquireRelease`]  |
//! | `counting`     | [`CountingMode::Relaxed`]        |

use std::fmt as StdFmt;
use std::sync::Arc;

use crate::backoff::{Backoff, SpinYield};
use crate::compare::{Comparator, bitwise_compare};
use crate::counter::CountingMode;
use crate::geometry::{ConfigError, Geometry};
use crate::ordering::MemoryModel;

/// Default bits consumed by the head node (256 slots).
pub const DEFAULT_HEAD_BITS: usize = 8;

/// Default bits consumed by each deeper array node (16 slots).
pub const DEFAULT_ARRAY_BITS: usize = 4;

/// Extracts an item's hash value. Must return the same bytes for as long
/// as the item is linked.
pub type HashAccessor<T, const N: usize> = fn(&T) -> &[u8; N];

/// Called exactly once per unlinked item, after reclamation proves no
/// reader can still observe it. May run on any thread.
pub type Disposer<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Trie configuration.
///
/// # Example
///
/// ```rust
/// use hashtrie::{Config, MemoryModel};
///
/// #[repr(align(8))]
/// struct Entry {
///     hash: [u8; 8],
/// }
///
/// fn entry_hash(entry: &Entry) -> &[u8; 8] {
///     &entry.hash
/// }
///
/// let config: Config<Entry, 8> = Config::new(entry_hash)
///     .with_head_bits(6)
///     .with_array_bits(3)
///     .with_memory_model(MemoryModel::SeqCst);
///
/// let geometry = config.geometry().unwrap();
/// assert_eq!(geometry.head_size_log2, 7);
/// ```
pub struct Config<T, const N: usize> {
    /// Requested head width in bits (adjusted by [`Geometry::compute`]).
    pub head_bits: usize,

    /// Requested array node width in bits.
    pub array_bits: usize,

    /// Hash accessor.
    pub hash: HashAccessor<T, N>,

    /// Hash comparator.
    pub compare: Comparator<N>,

    /// Optional disposer for unlinked items.
    pub disposer: Option<Disposer<T>>,

    /// Pause strategy between retries.
    pub backoff: Arc<dyn Backoff>,

    /// Orderings for slot access.
    pub memory_model: MemoryModel,

    /// Orderings for the item counter.
    pub counting: CountingMode,
}

impl<T, const N: usize> Config<T, N> {
    /// Configuration with defaults for everything but the hash accessor.
    #[must_use]
    pub fn new(hash: HashAccessor<T, N>) -> Self {
        Self {
            head_bits: DEFAULT_HEAD_BITS,
            array_bits: DEFAULT_ARRAY_BITS,
            hash,
            compare: bitwise_compare::<N>,
            disposer: None,
            backoff: Arc::new(SpinYield::default()),
            memory_model: MemoryModel::default(),
            counting: CountingMode::default(),
        }
    }

    /// Set the requested head width.
    #[must_use]
    pub fn with_head_bits(mut self, head_bits: usize) -> Self {
        self.head_bits = head_bits;
        self
    }

    /// Set the requested array node width.
    #[must_use]
    pub fn with_array_bits(mut self, array_bits: usize) -> Self {
        self.array_bits = array_bits;
        self
    }

    /// Replace the hash comparator.
    #[must_use]
    pub fn with_compare(mut self, compare: Comparator<N>) -> Self {
        self.compare = compare;
        self
    }

    /// Install a disposer.
    #[must_use]
    pub fn with_disposer<F>(mut self, disposer: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.disposer = Some(Arc::new(disposer));
        self
    }

    /// Replace the backoff policy.
    #[must_use]
    pub fn with_backoff<B: Backoff + 'static>(mut self, backoff: B) -> Self {
        self.backoff = Arc::new(backoff);
        self
    }

    /// Select the slot memory model.
    #[must_use]
    pub fn with_memory_model(mut self, memory_model: MemoryModel) -> Self {
        self.memory_model = memory_model;
        self
    }

    /// Select the item counter ordering.
    #[must_use]
    pub fn with_counting(mut self, counting: CountingMode) -> Self {
        self.counting = counting;
        self
    }

    /// Validate widths against the hash length.
    ///
    /// # Errors
    ///
    /// See [`Geometry::compute`].
    pub const fn geometry(&self) -> Result<Geometry, ConfigError> {
        Geometry::compute(self.head_bits, self.array_bits, N)
    }
}

impl<T, const N: usize> Clone for Config<T, N> {
    fn clone(&self) -> Self {
        Self {
            head_bits: self.head_bits,
            array_bits: self.array_bits,
            hash: self.hash,
            compare: self.compare,
            disposer: self.disposer.clone(),
            backoff: Arc::clone(&self.backoff),
            memory_model: self.memory_model,
            counting: self.counting,
        }
    }
}

impl<T, const N: usize> StdFmt::Debug for Config<T, N> {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_struct("Config")
            .field("head_bits", &self.head_bits)
            .field("array_bits", &self.array_bits)
            .field("hash_len", &N)
            .field("disposer", &self.disposer.is_some())
            .field("backoff", &self.backoff)
            .field("memory_model", &self.memory_model)
            .field("counting", &self.counting)
            .finish_non_exhaustive()
    }
}
