//! Replica identity, clocks and tag nonces.
//!
//! All are explicit dependencies: counters and election sets are bound to a
//! replica id at construction, timestamp-based sets take a [`Clock`], and the
//! OR-Set takes a [`NonceSource`] for its tags. The defaults read the system
//! clock and the thread RNG; tests swap in [`ManualClock`] and
//! [`SequentialNonces`] to pin ids, timestamps and tags.
//!
//! # Example
//!
//! ```
//! use crdt_toolbox::replica::{Clock, IdGenerator, ManualClock, SequentialIds};
//!
//! let mut ids = SequentialIds::new("node");
//! assert_eq!(ids.next_id(), "node-0");
//! assert_eq!(ids.next_id(), "node-1");
//!
//! let clock = ManualClock::new(10);
//! let shared = clock.clone();
//! shared.advance(5);
//! assert_eq!(clock.now(), 15);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::RngCore;

/// Identifier of one logical replica.
///
/// Used as a map key inside counters; each replica owns exactly one slot.
pub type ReplicaId = String;

/// Logical or physical timestamp, in microseconds for [`SystemClock`].
pub type Timestamp = u64;

/// Source of replica identifiers.
///
/// Uniqueness is only as strong as the generator: [`RandomIds`] makes
/// collisions negligible for realistic replica counts but does not rule them
/// out.
pub trait IdGenerator {
    /// Produce the next identifier.
    fn next_id(&mut self) -> ReplicaId;
}

/// Random identifiers of the form `rs_<16 hex digits>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&mut self) -> ReplicaId {
        random_replica_id()
    }
}

/// Deterministic identifiers `prefix-0`, `prefix-1`, ...
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    /// Create a generator that numbers ids under `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> ReplicaId {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

/// Generate a random replica id with 64 bits of entropy.
pub fn random_replica_id() -> ReplicaId {
    format!("rs_{:016x}", rand::thread_rng().next_u64())
}

/// Source of timestamps for time-ordered CRDTs.
pub trait Clock {
    /// Current timestamp.
    fn now(&self) -> Timestamp;
}

/// Wall clock: microseconds since the Unix epoch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64
    }
}

/// Manually driven clock. Clones share the same time cell.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    time: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock reading `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            time: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, time: Timestamp) {
        self.time.store(time, Ordering::SeqCst);
    }

    /// Move forward by `delta`.
    pub fn advance(&self, delta: Timestamp) {
        self.time.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.time.load(Ordering::SeqCst)
    }
}

/// Source of the random half of OR-Set tags.
pub trait NonceSource {
    /// Produce the next nonce.
    fn next_nonce(&self) -> u64;
}

/// Nonces drawn from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RandomNonces;

impl NonceSource for RandomNonces {
    fn next_nonce(&self) -> u64 {
        rand::thread_rng().next_u64()
    }
}

/// Deterministic nonces `start`, `start + 1`, ...
///
/// Clones share the counter, so copies of one set never mint the same nonce.
#[derive(Debug, Clone, Default)]
pub struct SequentialNonces {
    next: Arc<AtomicU64>,
}

impl SequentialNonces {
    /// Create a source whose first nonce is `start`.
    pub fn new(start: u64) -> Self {
        Self {
            next: Arc::new(AtomicU64::new(start)),
        }
    }
}

impl NonceSource for SequentialNonces {
    fn next_nonce(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}
