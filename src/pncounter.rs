use serde::{Deserialize, Serialize};

use crate::gcounter::GCounterPayload;
use crate::replica::ReplicaId;
use crate::{Crdt, GCounter};

/// Payload of a [`PNCounter`]: the increment and decrement halves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PNCounterPayload {
    /// Increments per replica.
    #[serde(rename = "P")]
    pub p: GCounterPayload,
    /// Decrements per replica.
    #[serde(rename = "N")]
    pub n: GCounterPayload,
}

/// A positive-negative counter (PN-Counter).
///
/// Supports both increment and decrement operations by maintaining two
/// internal G-Counters: one for increments and one for decrements.
/// The value is `increments - decrements`, clamped to the `i64` range.
///
/// # Example
///
/// ```
/// use crdt_toolbox::prelude::*;
///
/// let mut a = PNCounter::new("a");
/// a.increment();
/// a.decrement();
///
/// let mut b = PNCounter::new("b");
/// b.decrement();
/// b.decrement();
///
/// let mut b2 = b.clone();
/// b2.decrement();
///
/// assert_eq!(a.merged(&b).merged(&b2).value(), -3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PNCounter {
    increments: GCounter,
    decrements: GCounter,
}

impl PNCounter {
    /// Create a new PN-Counter owned by `replica`.
    pub fn new(replica: impl Into<ReplicaId>) -> Self {
        let replica = replica.into();
        Self {
            increments: GCounter::new(replica.clone()),
            decrements: GCounter::new(replica),
        }
    }

    /// Rebuild a counter for `replica` from a stored payload.
    pub fn from_payload(replica: impl Into<ReplicaId>, payload: PNCounterPayload) -> Self {
        let replica = replica.into();
        Self {
            increments: GCounter::from_payload(replica.clone(), payload.p),
            decrements: GCounter::from_payload(replica, payload.n),
        }
    }

    /// Copy of this counter's state bound to a different replica.
    #[must_use]
    pub fn fork(&self, replica: impl Into<ReplicaId>) -> Self {
        let replica = replica.into();
        Self {
            increments: self.increments.fork(replica.clone()),
            decrements: self.decrements.fork(replica),
        }
    }

    /// Increment the counter by 1.
    pub fn increment(&mut self) {
        self.increments.increment();
    }

    /// Decrement the counter by 1.
    pub fn decrement(&mut self) {
        self.decrements.increment();
    }

    /// This replica's id.
    #[must_use]
    pub fn replica(&self) -> &str {
        self.increments.replica()
    }
}

impl Crdt for PNCounter {
    type Payload = PNCounterPayload;
    type Value = i64;

    fn payload(&self) -> PNCounterPayload {
        PNCounterPayload {
            p: self.increments.payload(),
            n: self.decrements.payload(),
        }
    }

    fn set_payload(&mut self, payload: PNCounterPayload) {
        self.increments.set_payload(payload.p);
        self.decrements.set_payload(payload.n);
    }

    /// Get the current counter value (increments - decrements).
    fn value(&self) -> i64 {
        let diff = i128::from(self.increments.value()) - i128::from(self.decrements.value());
        i64::try_from(diff).unwrap_or(if diff > 0 { i64::MAX } else { i64::MIN })
    }

    fn merge(&mut self, other: &Self) {
        self.increments.merge(&other.increments);
        self.decrements.merge(&other.decrements);
    }

    fn descends_from(&self, other: &Self) -> bool {
        self.increments.descends_from(&other.increments)
            && self.decrements.descends_from(&other.decrements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_counter_is_zero() {
        let c = PNCounter::new("a");
        assert_eq!(c.value(), 0);
    }

    #[test]
    fn increment_and_decrement() {
        let mut c = PNCounter::new("a");
        c.increment();
        c.increment();
        c.decrement();
        assert_eq!(c.value(), 1);
    }

    #[test]
    fn can_go_negative() {
        let mut c = PNCounter::new("a");
        c.decrement();
        c.decrement();
        assert_eq!(c.value(), -2);
    }

    #[test]
    fn value_clamps_to_i64_range() {
        let up = PNCounterPayload {
            p: GCounterPayload::from([("a".to_string(), u64::MAX)]),
            n: GCounterPayload::new(),
        };
        assert_eq!(PNCounter::from_payload("a", up).value(), i64::MAX);

        let down = PNCounterPayload {
            p: GCounterPayload::new(),
            n: GCounterPayload::from([("a".to_string(), u64::MAX)]),
        };
        assert_eq!(PNCounter::from_payload("a", down).value(), i64::MIN);

        let balanced = PNCounterPayload {
            p: GCounterPayload::from([("a".to_string(), u64::MAX)]),
            n: GCounterPayload::from([("b".to_string(), u64::MAX - 2)]),
        };
        assert_eq!(PNCounter::from_payload("a", balanced).value(), 2);
    }

    #[test]
    fn merge_different_replicas() {
        let mut c1 = PNCounter::new("a");
        c1.increment();
        c1.increment();

        let mut c2 = PNCounter::new("b");
        c2.decrement();

        c1.merge(&c2);
        assert_eq!(c1.value(), 1);
    }

    #[test]
    fn merge_is_commutative() {
        let mut c1 = PNCounter::new("a");
        c1.increment();

        let mut c2 = PNCounter::new("b");
        c2.decrement();
        c2.decrement();

        assert_eq!(c1.merged(&c2).payload(), c2.merged(&c1).payload());
    }

    #[test]
    fn descends_requires_both_halves() {
        let mut a = PNCounter::new("a");
        a.increment();
        let mut b = a.clone();
        b.decrement();

        assert!(b.descends_from(&a));
        assert!(!a.descends_from(&b));
    }

    #[test]
    fn payload_uses_p_and_n_keys() {
        let mut c = PNCounter::new("a");
        c.increment();
        c.decrement();
        c.decrement();
        let json = serde_json::to_value(c.payload()).unwrap();
        assert_eq!(json, serde_json::json!({ "P": { "a": 1 }, "N": { "a": 2 } }));

        let restored = PNCounter::from_payload("a", serde_json::from_value(json).unwrap());
        assert_eq!(restored.value(), -1);
    }
}
