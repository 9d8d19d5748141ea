use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Crdt, Element, GSet, Result, SetCrdt};

/// Payload of a [`TwoPSet`]: the added and removed G-Set payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "T: Element")]
pub struct TwoPSetPayload<T> {
    /// Every element ever added.
    #[serde(rename = "A")]
    pub added: Vec<T>,
    /// Tombstones.
    #[serde(rename = "R")]
    pub removed: Vec<T>,
}

/// A two-phase set (2P-Set).
///
/// Elements can be added and removed, but once removed, they can never
/// become visible again. This is implemented with two G-Sets: one for
/// additions and one for removals (tombstones).
///
/// # Example
///
/// ```
/// use crdt_toolbox::prelude::*;
///
/// let mut s1 = TwoPSet::new();
/// s1.add(1);
/// s1.add(2);
/// s1.discard(&2).unwrap();
///
/// let mut s2 = TwoPSet::new();
/// s2.add(2); // re-add on another replica
///
/// s1.merge(&s2);
/// assert!(s1.contains(&1));
/// assert!(!s1.contains(&2)); // tombstone wins
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoPSet<T: Element> {
    added: GSet<T>,
    removed: GSet<T>,
}

impl<T: Element> TwoPSet<T> {
    /// Create a new empty 2P-Set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            added: GSet::new(),
            removed: GSet::new(),
        }
    }

    /// Rebuild a set from a stored payload.
    pub fn from_payload(payload: TwoPSetPayload<T>) -> Self {
        Self {
            added: GSet::from_payload(payload.added),
            removed: GSet::from_payload(payload.removed),
        }
    }

    /// Iterate over active elements (added and not removed).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.added.as_set().difference(self.removed.as_set())
    }

    /// Check whether `value` has been tombstoned.
    #[must_use]
    pub fn is_removed(&self, value: &T) -> bool {
        self.removed.contains(value)
    }
}

impl<T: Element> Default for TwoPSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> Crdt for TwoPSet<T> {
    type Payload = TwoPSetPayload<T>;
    type Value = BTreeSet<T>;

    fn payload(&self) -> TwoPSetPayload<T> {
        TwoPSetPayload {
            added: self.added.payload(),
            removed: self.removed.payload(),
        }
    }

    fn set_payload(&mut self, payload: TwoPSetPayload<T>) {
        self.added.set_payload(payload.added);
        self.removed.set_payload(payload.removed);
    }

    fn value(&self) -> BTreeSet<T> {
        self.iter().cloned().collect()
    }

    fn merge(&mut self, other: &Self) {
        self.added.merge(&other.added);
        self.removed.merge(&other.removed);
    }

    fn descends_from(&self, other: &Self) -> bool {
        self.added.descends_from(&other.added) && self.removed.descends_from(&other.removed)
    }
}

impl<T: Element> SetCrdt<T> for TwoPSet<T> {
    /// Always recorded in the added set; has no visible effect once the
    /// element is tombstoned.
    fn add(&mut self, element: T) {
        self.added.add(element);
    }

    fn discard(&mut self, element: &T) -> Result<bool> {
        if self.contains(element) {
            self.removed.add(element.clone());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn contains(&self, element: &T) -> bool {
        self.added.contains(element) && !self.removed.contains(element)
    }

    fn members(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }
}
