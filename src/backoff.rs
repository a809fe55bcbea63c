//! Contention backoff between CAS retries.
//!
//! A retry loop calls [`Backoff::pause`] with the number of failed attempts
//! so far. Pausing never affects correctness; a policy that returns at once
//! ([`NoBackoff`]) is valid and only changes throughput.

use std::fmt::Debug;
use std::hint as StdHint;
use std::thread;
use std::time::Duration;

/// Largest spin exponent any policy uses, whatever its configuration.
const MAX_SPIN_SHIFT: u32 = 16;

/// Pluggable pause strategy.
pub trait Backoff: Send + Sync + Debug {
    /// Pause before retry number `attempt` (0-indexed).
    fn pause(&self, attempt: u32);
}

/// Retry immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBackoff;

impl Backoff for NoBackoff {
    #[inline(always)]
    fn pause(&self, _attempt: u32) {}
}

/// Exponential busy-wait, capped at `2^max_shift` spin hints (and never
/// more than `2^16`).
#[derive(Debug, Clone, Copy)]
pub struct Spin {
    /// Cap on the exponent.
    pub max_shift: u32,
}

impl Default for Spin {
    fn default() -> Self {
        Self { max_shift: 6 }
    }
}

impl Backoff for Spin {
    #[inline]
    fn pause(&self, attempt: u32) {
        for _ in 0..1u32 << attempt.min(self.max_shift).min(MAX_SPIN_SHIFT) {
            StdHint::spin_loop();
        }
    }
}

/// Three-phase backoff: spin, then yield, then a short sleep.
///
/// Phase 1 (`attempt < spin_limit`): exponential spin, handles most cases
/// since slot conversions finish quickly.
/// Phase 2 (`attempt < yield_limit`): yield so a preempted converter can run.
/// Phase 3: sleep `sleep` to stop burning CPU.
#[derive(Debug, Clone, Copy)]
pub struct SpinYield {
    /// Attempts spent spinning.
    pub spin_limit: u32,
    /// Attempts (counted from 0) after which yielding turns into sleeping.
    pub yield_limit: u32,
    /// Sleep length in phase 3.
    pub sleep: Duration,
}

impl Default for SpinYield {
    fn default() -> Self {
        Self {
            spin_limit: 6,
            yield_limit: 64,
            sleep: Duration::from_micros(10),
        }
    }
}

impl Backoff for SpinYield {
    fn pause(&self, attempt: u32) {
        if attempt < self.spin_limit {
            for _ in 0..1u32 << attempt.min(MAX_SPIN_SHIFT) {
                StdHint::spin_loop();
            }
        } else if attempt < self.yield_limit {
            thread::yield_now();
        } else {
            thread::sleep(self.sleep);
        }
    }
}
