//! # `HashTrie`
//!
//! A lock-free, intrusive hash set organized as a multi-level trie over
//! fixed-size hash values.
//!
//! Items are caller-owned: the trie links references to them and never
//! moves, copies or frees them. Each item is identified by a fixed-size
//! hash value (`[u8; N]`) that the caller provides through an accessor. The
//! hash is consumed most-significant bit first in fixed-width segments, one
//! per level, and each segment indexes a slot of that level's array node.
//!
//! ## Status
//!
//! | Feature | Status |
//! |---------|--------|
//! | Concurrent find | Lock-free, wait-free on a quiescent path |
//! | Concurrent insert / update | Lock-free, CAS-based leaf expansion |
//! | Concurrent erase / extract | Lock-free |
//! | Disposal of unlinked items | Deferred (`seize`) or immediate |
//! | Array node compaction | Not implemented (nodes live until drop) |
//! | Ordered iteration | Hash-bit order only |
//!
//! ## Thread Safety
//!
//! `HashTrie` is `Send + Sync` when its items are `Sync`. References handed
//! out by guard-taking methods are valid while the guard lives:
//!
//! ```rust
//! use hashtrie::{Config, HashTrie};
//!
//! #[repr(align(8))]
//! struct Session {
//!     token: [u8; 16],
//!     user: u32,
//! }
//!
//! fn token(s: &Session) -> &[u8; 16] {
//!     &s.token
//! }
//!
//! let sessions: Vec<Session> = (0..4u32)
//!     .map(|user| Session { token: u128::from(user).to_be_bytes(), user })
//!     .collect();
//!
//! let trie: HashTrie<'_, Session, 16> = HashTrie::new(Config::new(token)).unwrap();
//! for s in &sessions {
//!     trie.insert(s).unwrap();
//! }
//!
//! let guard = trie.guard();
//! let found = trie.find(&u128::from(2u32).to_be_bytes(), &guard);
//! assert_eq!(found.map(|s| s.user), Some(2));
//! ```
//!
//! ## Item Constraints
//!
//! - Items must be aligned to at least 4 bytes; the two low pointer bits tag
//!   slot states. Under-aligned item types fail to compile.
//! - Items must outlive the trie (`'a`).
//! - An item's hash must not change while it is linked.
//!
//! ## Design
//!
//! Every slot holds one tagged word: empty, a leaf (item reference), a leaf
//! being converted, or an array node. Inserting next to an existing leaf
//! allocates an array node, claims the leaf slot, places both items in the
//! new node (nesting further nodes while their segments still collide) and
//! publishes the node with a single CAS. Array nodes are never removed, so a
//! slot's path never changes once an item is linked.

#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// Hot-path helpers are small wrappers around a single atomic or CAS.
#![allow(clippy::inline_always)]

pub mod backoff;
pub mod compare;
pub mod config;
pub mod counter;
pub mod geometry;
pub mod ordering;
pub mod reclaim;
pub mod split;
pub mod stats;
pub mod trie;

mod node;
mod tracing_helpers;

// Re-export main types for convenience
pub use backoff::{Backoff, NoBackoff, Spin, SpinYield};
pub use config::{Config, Disposer, HashAccessor};
pub use counter::CountingMode;
pub use geometry::{ConfigError, Geometry};
pub use node::TAG_ALIGN;
pub use ordering::MemoryModel;
pub use reclaim::{Deferred, Immediate, Reclaim, ReclaimGuard, Retire};
pub use stats::{LevelStatistics, NoStats, StatSink, Stats, StatsSnapshot};
pub use trie::{Extracted, HashTrie, InsertError, Iter, UpdateError, Updated};
