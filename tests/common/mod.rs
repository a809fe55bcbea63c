//! Common test utilities: tracing setup and item fixtures.
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//!
//! #[test]
//! fn my_test() {
//!     common::init_tracing();
//!     let entries = common::entries(1000);
//!     // ...
//! }
//! ```
//!
//! # Configuration
//!
//! Environment variables:
//! - `RUST_LOG`: Filter directives (e.g., `hashtrie=debug,hashtrie::trie=trace`)
//! - `HASHTRIE_LOG_DIR`: Log directory (default: `logs/`)
//! - `HASHTRIE_LOG_CONSOLE`: Set to "0" to disable console output
//!
//! Library events are only emitted with `--features tracing`.
//!
//! # Log Files
//!
//! Logs are written to `logs/hashtrie.jsonl` as newline-delimited JSON:
//!
//! ```bash
//! # Expansions only
//! cat logs/hashtrie.jsonl | jq 'select(.fields.message == "leaf expanded")'
//!
//! # Errors only
//! cat logs/hashtrie.jsonl | jq 'select(.level == "ERROR")'
//! ```

#![allow(dead_code)]

use std::collections::HashMap;
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use hashtrie::Config;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

// =============================================================================
// Tracing
// =============================================================================

/// Ensures tracing is only initialized once across all tests.
static INIT: Once = Once::new();

/// Initialize the tracing subscriber with file and console logging.
///
/// Safe to call multiple times - only the first call takes effect.
pub fn init_tracing() {
    INIT.call_once(|| {
        setup_tracing();
    });
}

/// Configuration for tracing setup.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Directory for log files.
    pub log_dir: PathBuf,
    /// Log file name.
    pub log_file: String,
    /// Enable console output.
    pub console_enabled: bool,
    /// Default log level if RUST_LOG is not set.
    pub default_level: Level,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            log_file: "hashtrie.jsonl".to_string(),
            console_enabled: true,
            default_level: Level::INFO,
        }
    }
}

impl TracingConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("HASHTRIE_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        if env::var("HASHTRIE_LOG_CONSOLE").is_ok_and(|v| v == "0") {
            config.console_enabled = false;
        }

        config
    }
}

fn make_filter(default_level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("{default_level}")))
}

#[expect(clippy::expect_used)]
fn setup_tracing() {
    let config = TracingConfig::from_env();

    std::fs::create_dir_all(&config.log_dir).expect("Failed to create log directory");
    let log_path = config.log_dir.join(&config.log_file);

    // Append: nextest runs each test binary in its own process.
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .expect("Failed to open log file");

    let console_layer = config.console_enabled.then(|| {
        tracing_subscriber::fmt::layer()
            .with_thread_ids(true)
            .with_target(true)
            .with_line_number(true)
            .with_span_events(FmtSpan::CLOSE)
            .compact()
            .with_filter(make_filter(config.default_level))
    });

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_thread_ids(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .json()
        .with_filter(make_filter(config.default_level));

    let _ = Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

// =============================================================================
// Fixtures
// =============================================================================

/// A test item: a `u64` key and its 8-byte mixed hash.
#[repr(align(8))]
#[derive(Debug)]
pub struct Entry {
    pub hash: [u8; 8],
    pub key: u64,
    pub payload: u64,
}

impl Entry {
    pub fn new(key: u64) -> Self {
        Self::with_payload(key, key)
    }

    pub fn with_payload(key: u64, payload: u64) -> Self {
        Self {
            hash: mix(key).to_be_bytes(),
            key,
            payload,
        }
    }
}

/// Hash accessor for [`Entry`].
pub fn entry_hash(entry: &Entry) -> &[u8; 8] {
    &entry.hash
}

/// Hash bytes for `key`, as stored in `Entry::new(key)`.
pub fn hash_of(key: u64) -> [u8; 8] {
    mix(key).to_be_bytes()
}

/// SplitMix64 finalizer. A bijection on `u64`, so distinct keys never
/// collide.
pub const fn mix(key: u64) -> u64 {
    let mut z: u64 = key.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// `count` entries with keys `0..count`.
pub fn entries(count: usize) -> Vec<Entry> {
    (0..count as u64).map(Entry::new).collect()
}

/// Default test configuration: small nodes so tests reach deep levels.
pub fn config() -> Config<Entry, 8> {
    Config::new(entry_hash).with_head_bits(4).with_array_bits(4)
}

/// Records every disposer call by key.
#[derive(Debug, Default, Clone)]
pub struct DisposeLog {
    calls: Arc<AtomicUsize>,
    by_key: Arc<Mutex<HashMap<u64, usize>>>,
}

impl DisposeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// `config` with a disposer that records into this log.
    pub fn attach(&self, config: Config<Entry, 8>) -> Config<Entry, 8> {
        let log = self.clone();
        config.with_disposer(move |entry: &Entry| log.record(entry.key))
    }

    fn record(&self, key: u64) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.by_key.lock().unwrap().entry(key).or_default() += 1;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn count_for(&self, key: u64) -> usize {
        self.by_key.lock().unwrap().get(&key).copied().unwrap_or(0)
    }

    /// Panic if any key was disposed more than once.
    pub fn assert_at_most_once(&self) {
        let by_key = self.by_key.lock().unwrap();
        let repeated: Vec<_> = by_key.iter().filter(|&(_, &n)| n > 1).collect();
        assert!(repeated.is_empty(), "disposed more than once: {repeated:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_init() {
        init_tracing();
        tracing::info!("Tracing initialized successfully");
        tracing::debug!(key = 42, "Debug event");
    }

    #[test]
    fn test_mix_is_injective_on_sample() {
        let mut seen = std::collections::HashSet::new();
        for k in 0..10_000u64 {
            assert!(seen.insert(mix(k)));
        }
    }
}
