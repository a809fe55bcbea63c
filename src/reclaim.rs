//! Memory reclamation contract.
//!
//! The trie never frees what it unlinks directly. It enters a guard before
//! dereferencing anything loaded from a slot, and hands unlinked objects to
//! the guard via [`ReclaimGuard::retire`]. The scheme behind the guard decides
//! when the object's [`Retire::reclaim`] runs.
//!
//! Two schemes are provided:
//!
//! - [`Deferred`]: hyaline reclamation via the `seize` crate. Reclaim runs
//!   only once no guard entered before the retirement is still alive. This is
//!   the default and is correct under full concurrency.
//! - [`Immediate`]: reclaim runs inside `retire`. Only meaningful when the
//!   caller guarantees external exclusivity (a single thread using the
//!   container, or readers that never overlap removals).
//!
//! # Protocol
//!
//! ```text
//! 1. guard = reclaimer.enter()
//! 2. load slot words, dereference leaves and array nodes
//! 3. CAS a leaf out of its slot
//! 4. guard.retire(record)      // reclaim deferred per scheme
//! 5. drop(guard)
//! ```

use std::fmt as StdFmt;
use std::marker::PhantomData;
use std::ptr as StdPtr;

use seize::{Collector, Guard, LocalGuard};

// ============================================================================
//  Contract
// ============================================================================

/// Something that can be handed to a reclamation scheme.
pub trait Retire {
    /// Release the object behind `ptr`.
    ///
    /// # Safety
    ///
    /// - `ptr` must be the pointer passed to [`ReclaimGuard::retire`].
    /// - Called at most once per retirement.
    unsafe fn reclaim(ptr: *mut Self);
}

/// A scoped protection token produced by [`Reclaim::enter`].
pub trait ReclaimGuard {
    /// Schedule `ptr` for reclamation.
    ///
    /// # Safety
    ///
    /// - `ptr` must be unreachable by any traversal that starts after this call.
    /// - `ptr` must satisfy the contract of `X::reclaim`.
    unsafe fn retire<X: Retire>(&self, ptr: *mut X);
}

/// A memory reclamation scheme.
///
/// Selected once at construction and owned by the container.
pub trait Reclaim: Send + Sync {
    /// Guard type. Dropping it ends the protected region.
    type Guard<'r>: ReclaimGuard
    where
        Self: 'r;

    /// Enter a protected region.
    fn enter(&self) -> Self::Guard<'_>;

    /// Whether `guard` was issued by this scheme instance.
    fn owns(&self, guard: &Self::Guard<'_>) -> bool;
}

// ============================================================================
//  Deferred (seize)
// ============================================================================

/// Deferred reclamation backed by a [`seize::Collector`].
pub struct Deferred {
    collector: Collector,
}

impl Deferred {
    /// Create a scheme with a default collector.
    #[must_use]
    pub fn new() -> Self {
        Self::with_collector(Collector::new())
    }

    /// Create a scheme around a preconfigured collector
    /// (for example `Collector::new().batch_size(8)`).
    #[must_use]
    pub const fn with_collector(collector: Collector) -> Self {
        Self { collector }
    }

    /// The underlying collector.
    #[must_use]
    #[inline]
    pub const fn collector(&self) -> &Collector {
        &self.collector
    }
}

impl Default for Deferred {
    fn default() -> Self {
        Self::new()
    }
}

impl StdFmt::Debug for Deferred {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}

impl Reclaim for Deferred {
    type Guard<'r> = LocalGuard<'r>;

    #[inline(always)]
    fn enter(&self) -> LocalGuard<'_> {
        self.collector.enter()
    }

    #[inline(always)]
    fn owns(&self, guard: &LocalGuard<'_>) -> bool {
        StdPtr::eq(guard.collector(), &self.collector)
    }
}

impl ReclaimGuard for LocalGuard<'_> {
    #[inline]
    unsafe fn retire<X: Retire>(&self, ptr: *mut X) {
        // SAFETY: caller guarantees ptr is unlinked and valid for X::reclaim.
        // seize runs the callback once no earlier guard is live.
        unsafe { self.defer_retire(ptr, reclaim_deferred::<X>) };
    }
}

/// Seize callback forwarding to [`Retire::reclaim`].
///
/// # Safety
///
/// Same as `X::reclaim`; seize guarantees no reader remains.
unsafe fn reclaim_deferred<X: Retire>(ptr: *mut X, _collector: &Collector) {
    // SAFETY: forwarded from the retire contract.
    unsafe { X::reclaim(ptr) };
}

// ============================================================================
//  Immediate
// ============================================================================

/// Reclaim inside `retire`, assuming external exclusivity.
///
/// Unlinked items are disposed before the removing call returns. Any
/// reference another thread still holds then points at an item its owner
/// already considers released. Use only when no reader can overlap a removal.
#[derive(Debug, Default, Clone, Copy)]
pub struct Immediate;

/// Guard for [`Immediate`]. Protects nothing.
#[derive(Debug)]
pub struct ImmediateGuard {
    // Guards stay on the thread that entered them, like seize's LocalGuard.
    _not_send: PhantomData<*const ()>,
}

impl Reclaim for Immediate {
    type Guard<'r> = ImmediateGuard;

    #[inline(always)]
    fn enter(&self) -> ImmediateGuard {
        ImmediateGuard {
            _not_send: PhantomData,
        }
    }

    #[inline(always)]
    fn owns(&self, _guard: &ImmediateGuard) -> bool {
        true
    }
}

impl ReclaimGuard for ImmediateGuard {
    #[inline]
    unsafe fn retire<X: Retire>(&self, ptr: *mut X) {
        // SAFETY: caller guarantees ptr is unlinked and valid for X::reclaim.
        unsafe { X::reclaim(ptr) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Retirement record that bumps a shared counter.
    struct Counted(Arc<AtomicUsize>);

    impl Retire for Counted {
        unsafe fn reclaim(ptr: *mut Self) {
            let this: Box<Self> = unsafe { Box::from_raw(ptr) };
            this.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counted(hits: &Arc<AtomicUsize>) -> *mut Counted {
        Box::into_raw(Box::new(Counted(Arc::clone(hits))))
    }

    #[test]
    fn test_immediate_reclaims_inside_retire() {
        let hits = Arc::new(AtomicUsize::new(0));
        let scheme = Immediate;
        let guard = scheme.enter();

        unsafe { guard.retire(counted(&hits)) };
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(scheme.owns(&guard));
    }

    #[test]
    fn test_deferred_reclaims_by_collector_drop() {
        let hits = Arc::new(AtomicUsize::new(0));
        let scheme = Deferred::new();

        {
            let guard = scheme.enter();
            for _ in 0..5 {
                unsafe { guard.retire(counted(&hits)) };
            }
            // Still protected: nothing reclaimed while the guard is live.
            assert_eq!(hits.load(Ordering::SeqCst), 0);
        }

        drop(scheme);
        assert_eq!(hits.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_deferred_owns_only_its_guards() {
        let a = Deferred::new();
        let b = Deferred::new();

        let ga = a.enter();
        let gb = b.enter();
        assert!(a.owns(&ga));
        assert!(!a.owns(&gb));
        assert!(b.owns(&gb));
    }

    #[test]
    fn test_deferred_reclaims_across_threads() {
        let hits = Arc::new(AtomicUsize::new(0));
        let scheme = Arc::new(Deferred::with_collector(Collector::new().batch_size(2)));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let scheme = Arc::clone(&scheme);
                let hits = Arc::clone(&hits);
                std::thread::spawn(move || {
                    for _ in 0..16 {
                        let guard = scheme.enter();
                        unsafe { guard.retire(counted(&hits)) };
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        // Whatever the batches left behind is reclaimed at collector drop.
        drop(Arc::into_inner(scheme));
        assert_eq!(hits.load(Ordering::SeqCst), 64);
    }
}
