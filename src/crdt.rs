use std::cmp::Ordering;
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::Result;

/// Core trait that all state-based CRDTs implement.
///
/// A CRDT separates its *payload* (the replicated state that merge operates
/// on) from its *value* (a pure projection of the payload). Only the payload
/// is ever exchanged between replicas or persisted.
///
/// # Properties
///
/// All implementations must satisfy:
/// - **Commutativity:** `a.merged(b) == b.merged(a)`
/// - **Associativity:** `a.merged(b.merged(c)) == a.merged(b).merged(c)`
/// - **Idempotency:** `a.merged(a) == a`
///
/// where equality is payload equality.
pub trait Crdt: Clone {
    /// Serializable replicated state.
    type Payload: Clone + PartialEq + Debug + Serialize + DeserializeOwned;

    /// Application-visible projection of the payload.
    type Value;

    /// A structural copy of the replicated state.
    fn payload(&self) -> Self::Payload;

    /// Replace the replicated state. Accepts exactly what [`Crdt::payload`]
    /// produces.
    fn set_payload(&mut self, payload: Self::Payload);

    /// Derived value. Has no side effects.
    fn value(&self) -> Self::Value;

    /// Merge another replica's state into this one.
    ///
    /// After merging, `self` contains the least upper bound of both states.
    fn merge(&mut self, other: &Self);

    /// Returns a new instance holding the least upper bound of `self` and
    /// `other`, leaving both untouched.
    ///
    /// The result keeps `self`'s replica binding and clock.
    #[must_use]
    fn merged(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.merge(other);
        out
    }

    /// Returns `true` if `self` contains every update present in `other`.
    ///
    /// Used to detect that shipping `self` to a holder of `other` would
    /// carry no new information in the opposite direction.
    fn descends_from(&self, other: &Self) -> bool;

    /// Causal comparison of two states.
    ///
    /// `None` means the states are concurrent: each holds updates the other
    /// lacks.
    fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self.descends_from(other), other.descends_from(self)) {
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Greater),
            (false, true) => Some(Ordering::Less),
            (false, false) => None,
        }
    }
}

/// Collection capability shared by the set variants.
pub trait SetCrdt<T: Element>: Crdt {
    /// Add an element.
    fn add(&mut self, element: T);

    /// Remove an element.
    ///
    /// Returns `Ok(true)` if the call recorded a removal. Grow-only sets
    /// return [`CrdtError::UnsupportedOperation`](crate::CrdtError).
    fn discard(&mut self, element: &T) -> Result<bool>;

    /// Check whether an element is currently visible.
    fn contains(&self, element: &T) -> bool;

    /// Iterate over the visible elements in order.
    fn members(&self) -> Box<dyn Iterator<Item = &T> + '_>;

    /// The visible elements, collected in order.
    fn elements(&self) -> Vec<&T> {
        self.members().collect()
    }

    /// Number of visible elements.
    fn len(&self) -> usize {
        self.members().count()
    }

    /// Check whether no element is visible.
    fn is_empty(&self) -> bool {
        self.members().next().is_none()
    }
}

/// Bounds every set element must satisfy: ordered for deterministic
/// payloads and serializable for the payload contract.
pub trait Element: Ord + Clone + Debug + Serialize + DeserializeOwned {}

impl<T> Element for T where T: Ord + Clone + Debug + Serialize + DeserializeOwned {}
