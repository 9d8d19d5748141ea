use std::collections::BTreeMap;

use crate::replica::ReplicaId;
use crate::Crdt;

/// Payload of a [`GCounter`]: each replica's running total.
pub type GCounterPayload = BTreeMap<ReplicaId, u64>;

/// A grow-only counter (G-Counter).
///
/// Each replica maintains its own count. The total value is the sum of all
/// replica counts. This counter can only be incremented, never decremented.
///
/// The counter is bound to one replica id at construction and only ever
/// increments that slot; there is no way to bump another replica's slot
/// through this type.
///
/// Totals saturate at `u64::MAX` instead of wrapping, so a peer payload with
/// huge counts cannot overflow the sum.
///
/// # Example
///
/// ```
/// use crdt_toolbox::prelude::*;
///
/// let mut a = GCounter::new("a");
/// a.increment();
///
/// let mut b = GCounter::new("b");
/// b.increment();
///
/// let ab = a.merged(&b);
/// assert_eq!(ab.value(), 2);
/// assert_eq!(ab.count_for("b"), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GCounter {
    replica: ReplicaId,
    counts: GCounterPayload,
}

impl GCounter {
    /// Create an empty G-Counter owned by `replica`.
    pub fn new(replica: impl Into<ReplicaId>) -> Self {
        Self {
            replica: replica.into(),
            counts: BTreeMap::new(),
        }
    }

    /// Rebuild a counter for `replica` from a stored payload.
    pub fn from_payload(replica: impl Into<ReplicaId>, payload: GCounterPayload) -> Self {
        Self {
            replica: replica.into(),
            counts: payload,
        }
    }

    /// Copy of this counter's state bound to a different replica.
    #[must_use]
    pub fn fork(&self, replica: impl Into<ReplicaId>) -> Self {
        Self {
            replica: replica.into(),
            counts: self.counts.clone(),
        }
    }

    /// Increment this replica's count by 1.
    pub fn increment(&mut self) {
        self.increment_by(1);
    }

    /// Increment this replica's count by `n`, saturating at `u64::MAX`.
    pub fn increment_by(&mut self, n: u64) {
        let slot = self.counts.entry(self.replica.clone()).or_insert(0);
        *slot = slot.saturating_add(n);
    }

    /// This replica's id.
    #[must_use]
    pub fn replica(&self) -> &str {
        &self.replica
    }

    /// Get the count for a specific replica.
    #[must_use]
    pub fn count_for(&self, replica: &str) -> u64 {
        self.counts.get(replica).copied().unwrap_or(0)
    }
}

impl Crdt for GCounter {
    type Payload = GCounterPayload;
    type Value = u64;

    fn payload(&self) -> GCounterPayload {
        self.counts.clone()
    }

    fn set_payload(&mut self, payload: GCounterPayload) {
        self.counts = payload;
    }

    fn value(&self) -> u64 {
        self.counts
            .values()
            .fold(0u64, |total, &count| total.saturating_add(count))
    }

    fn merge(&mut self, other: &Self) {
        for (replica, &count) in &other.counts {
            let entry = self.counts.entry(replica.clone()).or_insert(0);
            *entry = (*entry).max(count);
        }
    }

    fn descends_from(&self, other: &Self) -> bool {
        other
            .counts
            .iter()
            .all(|(replica, &count)| self.count_for(replica) >= count)
    }
}
