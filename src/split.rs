//! Hash segmenter for [`HashTrie`](crate::HashTrie) descent.
//!
//! A fixed-size hash value is consumed as a bit string, most significant bit
//! of byte 0 first. Each trie level cuts the next `bits` bits off the front
//! and uses them as a slot index into that level's array node.
//!
//! The [`HashSplitter`] cursor tracks how many bits have been consumed. It is
//! `Copy`, so a traversal can stash the cursor value at a slot and resume from
//! it later (expansion does exactly this for the colliding item).

/// Bits per byte of hash input.
const BYTE_BITS: usize = 8;

/// A cursor that cuts a fixed-size hash into fixed-width segments.
///
/// # Example
///
/// ```rust
/// use hashtrie::split::HashSplitter;
///
/// let hash: [u8; 2] = [0xAB, 0xCD];
/// let mut splitter = HashSplitter::new(&hash);
///
/// assert_eq!(splitter.cut(4), 0xA);
/// assert_eq!(splitter.cut(8), 0xBC);
/// assert_eq!(splitter.cut(4), 0xD);
/// assert!(splitter.eos());
/// ```
#[derive(Clone, Copy, Debug)]
pub struct HashSplitter<'h> {
    /// The full hash value (never modified).
    hash: &'h [u8],

    /// Number of bits already consumed.
    offset: usize,
}

impl<'h> HashSplitter<'h> {
    /// Create a cursor positioned at bit 0.
    #[must_use]
    #[inline]
    pub const fn new(hash: &'h [u8]) -> Self {
        Self { hash, offset: 0 }
    }

    /// Create a cursor positioned at `offset` bits.
    ///
    /// # Panics
    ///
    /// Panics if `offset` exceeds the hash length in bits.
    #[must_use]
    pub fn with_offset(hash: &'h [u8], offset: usize) -> Self {
        assert!(
            offset <= hash.len() * BYTE_BITS,
            "bit offset {offset} past end of {}-byte hash",
            hash.len()
        );
        Self { hash, offset }
    }

    /// Total number of bits in the hash.
    #[must_use]
    #[inline]
    pub const fn bit_len(&self) -> usize {
        self.hash.len() * BYTE_BITS
    }

    /// Number of bits consumed so far.
    #[must_use]
    #[inline]
    pub const fn bit_offset(&self) -> usize {
        self.offset
    }

    /// Number of bits not yet consumed.
    #[must_use]
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.bit_len() - self.offset
    }

    /// End of stream: every bit has been consumed.
    #[must_use]
    #[inline]
    pub const fn eos(&self) -> bool {
        self.offset >= self.bit_len()
    }

    /// Rewind to bit 0.
    #[inline]
    pub const fn reset(&mut self) {
        self.offset = 0;
    }

    /// Cut the next `bits` bits and advance the cursor.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `bits` bits remain or `bits` does not fit in a
    /// `usize`.
    pub fn cut(&mut self, bits: usize) -> usize {
        assert!(
            bits <= usize::BITS as usize,
            "segment width {bits} does not fit in usize"
        );
        assert!(
            bits <= self.remaining(),
            "segment width {bits} exceeds {} remaining bits",
            self.remaining()
        );

        let mut segment: usize = 0;
        let mut wanted: usize = bits;

        while wanted > 0 {
            let byte: u8 = self.hash[self.offset / BYTE_BITS];
            let available: usize = BYTE_BITS - self.offset % BYTE_BITS;
            let take: usize = available.min(wanted);

            // Bits [available - take, available) of `byte`, counted from the LSB.
            let mask: u16 = (1u16 << take) - 1;
            let chunk: u16 = (u16::from(byte) >> (available - take)) & mask;

            segment = (segment << take) | usize::from(chunk);
            self.offset += take;
            wanted -= take;
        }

        segment
    }

    /// Cut up to `bits` bits, stopping early at the end of the hash.
    ///
    /// Returns the segment and the number of bits actually cut.
    pub fn safe_cut(&mut self, bits: usize) -> (usize, usize) {
        let width: usize = bits.min(self.remaining());
        (self.cut(width), width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_whole_bytes() {
        let hash: [u8; 4] = [0x12, 0x34, 0x56, 0x78];
        let mut s = HashSplitter::new(&hash);

        assert_eq!(s.cut(8), 0x12);
        assert_eq!(s.cut(16), 0x3456);
        assert_eq!(s.cut(8), 0x78);
        assert!(s.eos());
    }

    #[test]
    fn test_cut_nibbles_msb_first() {
        let hash: [u8; 2] = [0xF0, 0x5A];
        let mut s = HashSplitter::new(&hash);

        let nibbles: Vec<usize> = (0..4).map(|_| s.cut(4)).collect();
        assert_eq!(nibbles, vec![0xF, 0x0, 0x5, 0xA]);
    }

    #[test]
    fn test_cut_across_byte_boundary() {
        // 0b1010_1100 0b0011_0101
        let hash: [u8; 2] = [0xAC, 0x35];
        let mut s = HashSplitter::new(&hash);

        assert_eq!(s.cut(3), 0b101);
        // bits 3..9: 0_1100_0
        assert_eq!(s.cut(6), 0b01_1000);
        assert_eq!(s.bit_offset(), 9);
        assert_eq!(s.cut(7), 0b011_0101);
    }

    #[test]
    fn test_single_bits() {
        let hash: [u8; 1] = [0b1001_0110];
        let mut s = HashSplitter::new(&hash);
        let bits: Vec<usize> = (0..8).map(|_| s.cut(1)).collect();

        assert_eq!(bits, vec![1, 0, 0, 1, 0, 1, 1, 0]);
    }

    #[test]
    fn test_with_offset_matches_sequential_cut() {
        let hash: [u8; 4] = [0xDE, 0xAD, 0xBE, 0xEF];

        let mut sequential = HashSplitter::new(&hash);
        let _ = sequential.cut(12);

        let mut resumed = HashSplitter::with_offset(&hash, 12);
        assert_eq!(sequential.cut(5), resumed.cut(5));
        assert_eq!(sequential.bit_offset(), resumed.bit_offset());
    }

    #[test]
    fn test_reset_restarts_from_zero() {
        let hash: [u8; 2] = [0xAB, 0xCD];
        let mut s = HashSplitter::new(&hash);

        let first: usize = s.cut(6);
        let _ = s.cut(10);
        assert!(s.eos());

        s.reset();
        assert_eq!(s.bit_offset(), 0);
        assert_eq!(s.cut(6), first);
    }

    #[test]
    fn test_safe_cut_stops_at_end() {
        let hash: [u8; 1] = [0xFF];
        let mut s = HashSplitter::new(&hash);
        let _ = s.cut(6);

        assert_eq!(s.safe_cut(4), (0b11, 2));
        assert!(s.eos());
        assert_eq!(s.safe_cut(4), (0, 0));
    }

    #[test]
    fn test_zero_width_cut() {
        let hash: [u8; 1] = [0xFF];
        let mut s = HashSplitter::new(&hash);
        assert_eq!(s.cut(0), 0);
        assert_eq!(s.bit_offset(), 0);
    }

    #[test]
    #[should_panic(expected = "exceeds")]
    fn test_cut_past_end_panics() {
        let hash: [u8; 1] = [0xFF];
        let mut s = HashSplitter::new(&hash);
        let _ = s.cut(9);
    }

    #[test]
    #[should_panic(expected = "past end")]
    fn test_with_offset_past_end_panics() {
        let hash: [u8; 1] = [0x00];
        let _ = HashSplitter::with_offset(&hash, 9);
    }
}
