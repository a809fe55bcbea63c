//! Level geometry: how many hash bits each trie level consumes.
//!
//! Level 0 (the head) consumes `head_bits`, every deeper level consumes
//! `array_bits`. Both node widths are powers of two. The widths must tile the
//! hash exactly, so [`Geometry::compute`] raises `head_bits` by the remainder
//! when `(hash_bits - head_bits) % array_bits != 0`.
//!
//! Node sizes are bounded: array nodes by [`MAX_ARRAY_BITS`], the adjusted
//! head by [`MAX_HEAD_BITS`]. Widths past either bound are rejected even when
//! they would tile the hash, since every node is allocated in full.

use std::fmt as StdFmt;

/// Lower bound for `array_bits` (4-slot array nodes).
pub const MIN_ARRAY_BITS: usize = 2;

/// Upper bound for `array_bits` (64Ki-slot array nodes).
pub const MAX_ARRAY_BITS: usize = 16;

/// Lower bound for `head_bits` (16-slot head node).
pub const MIN_HEAD_BITS: usize = 4;

/// Upper bound for `head_bits` after adjustment (16Mi-slot head node).
pub const MAX_HEAD_BITS: usize = 24;

// ============================================================================
//  ConfigError
// ============================================================================

/// Construction-time configuration failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The hash value has zero length.
    EmptyHash,

    /// `array_bits` is wider than the supported maximum.
    ArrayBitsTooLarge {
        /// Requested width.
        array_bits: usize,
    },

    /// The head width required to tile the hash exceeds the supported maximum.
    HeadBitsTooLarge {
        /// Head width after flooring, capping and remainder adjustment.
        head_bits: usize,
    },
}

impl StdFmt::Display for ConfigError {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        match self {
            Self::EmptyHash => write!(f, "hash value must be at least one byte"),

            Self::ArrayBitsTooLarge { array_bits } => write!(
                f,
                "array_bits {array_bits} exceeds maximum {MAX_ARRAY_BITS}"
            ),

            Self::HeadBitsTooLarge { head_bits } => write!(
                f,
                "head node needs {head_bits} bits to tile the hash (maximum {MAX_HEAD_BITS})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
//  Geometry
// ============================================================================

/// Validated per-level widths for one container instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Slots in the head node (`1 << head_size_log2`).
    pub head_size: usize,

    /// Bits consumed at level 0.
    pub head_size_log2: usize,

    /// Slots in every deeper array node (`1 << array_size_log2`).
    pub array_size: usize,

    /// Bits consumed at every level below the head.
    pub array_size_log2: usize,

    /// Total bits in the hash value.
    pub hash_bits: usize,
}

impl Geometry {
    /// Derive node widths from the requested bit widths and hash length.
    ///
    /// `array_bits` is floored at 2, `head_bits` is floored at 4 and capped at
    /// the hash width, then raised so the deeper levels tile the remaining bits
    /// exactly.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the hash is empty or the widths cannot be
    /// reconciled within the supported node sizes.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hashtrie::geometry::Geometry;
    ///
    /// let g = Geometry::compute(4, 4, 4).unwrap();
    /// assert_eq!(g.head_size, 16);
    /// assert_eq!(g.array_size, 16);
    /// assert_eq!(g.max_height(), 8);
    /// ```
    pub const fn compute(
        head_bits: usize,
        array_bits: usize,
        hash_len: usize,
    ) -> Result<Self, ConfigError> {
        if hash_len == 0 {
            return Err(ConfigError::EmptyHash);
        }

        let hash_bits: usize = hash_len * 8;

        let array_bits: usize = if array_bits < MIN_ARRAY_BITS {
            MIN_ARRAY_BITS
        } else {
            array_bits
        };
        if array_bits > MAX_ARRAY_BITS {
            return Err(ConfigError::ArrayBitsTooLarge { array_bits });
        }

        let mut head_bits: usize = if head_bits < MIN_HEAD_BITS {
            MIN_HEAD_BITS
        } else {
            head_bits
        };
        if head_bits > hash_bits {
            head_bits = hash_bits;
        }

        let remainder: usize = (hash_bits - head_bits) % array_bits;
        head_bits += remainder;

        if head_bits > MAX_HEAD_BITS {
            return Err(ConfigError::HeadBitsTooLarge { head_bits });
        }

        Ok(Self {
            head_size: 1 << head_bits,
            head_size_log2: head_bits,
            array_size: 1 << array_bits,
            array_size_log2: array_bits,
            hash_bits,
        })
    }

    /// Maximum number of levels: `1 + (hash_bits - head_bits) / array_bits`.
    #[must_use]
    #[inline]
    pub const fn max_height(&self) -> usize {
        1 + (self.hash_bits - self.head_size_log2) / self.array_size_log2
    }

    /// Bits consumed at `level`.
    #[must_use]
    #[inline]
    pub const fn bits_at(&self, level: usize) -> usize {
        if level == 0 {
            self.head_size_log2
        } else {
            self.array_size_log2
        }
    }

    /// Slot count of a node at `level`.
    #[must_use]
    #[inline]
    pub const fn node_size_at(&self, level: usize) -> usize {
        1 << self.bits_at(level)
    }

    /// Bit offset at which `level` starts cutting.
    #[must_use]
    #[inline]
    pub const fn offset_of(&self, level: usize) -> usize {
        if level == 0 {
            0
        } else {
            self.head_size_log2 + (level - 1) * self.array_size_log2
        }
    }
}
