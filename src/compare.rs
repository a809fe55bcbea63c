//! Hash value comparison.

use std::cmp::Ordering;

/// Orders two hash values. `Equal` means "same item identity".
pub type Comparator<const N: usize> = fn(&[u8; N], &[u8; N]) -> Ordering;

/// Default comparator: lexicographic byte order, like `memcmp`.
///
/// ```rust
/// use std::cmp::Ordering;
/// use hashtrie::compare::bitwise_compare;
///
/// assert_eq!(bitwise_compare(&[1, 2], &[1, 3]), Ordering::Less);
/// assert_eq!(bitwise_compare(&[9, 0], &[9, 0]), Ordering::Equal);
/// ```
#[must_use]
#[inline]
pub fn bitwise_compare<const N: usize>(lhs: &[u8; N], rhs: &[u8; N]) -> Ordering {
    lhs.as_slice().cmp(rhs.as_slice())
}
