use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::replica::{Clock, SystemClock, Timestamp};
use crate::{Crdt, Element, Result, SetCrdt};

/// Payload of an [`LWWSet`]: latest add and remove timestamps per element.
///
/// Each map is encoded as a sorted list of `[element, timestamp]` pairs, so
/// elements need not serialize as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "T: Element")]
pub struct LWWSetPayload<T> {
    /// Element -> latest add timestamp.
    #[serde(rename = "A", with = "crate::codec::pairs")]
    pub added: BTreeMap<T, Timestamp>,
    /// Element -> latest remove timestamp.
    #[serde(rename = "R", with = "crate::codec::pairs")]
    pub removed: BTreeMap<T, Timestamp>,
}

/// A last-writer-wins element set (LWW-Set).
///
/// Each element carries the timestamp of its latest add and latest remove.
/// An element is present when its add timestamp is greater than or equal to
/// its remove timestamp, so equal timestamps resolve to present (add wins).
///
/// Correctness depends on the clock: replicas with skewed clocks can see a
/// later remove lose to an earlier add. Ties between replicas are not broken
/// by replica identity.
///
/// # Example
///
/// ```
/// use crdt_toolbox::prelude::*;
/// use crdt_toolbox::replica::ManualClock;
///
/// let clock = ManualClock::new(1);
/// let mut a = LWWSet::with_clock(clock.clone());
/// a.add("eric".to_string());
///
/// clock.set(2);
/// let mut b = a.clone();
/// let mut c = a.clone();
/// b.add("eric".to_string());
/// c.discard(&"eric".to_string()).unwrap();
///
/// // same timestamp on both sides: the add wins
/// assert!(b.merged(&c).contains(&"eric".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct LWWSet<T: Element, C: Clock = SystemClock> {
    clock: C,
    added: BTreeMap<T, Timestamp>,
    removed: BTreeMap<T, Timestamp>,
}

impl<T: Element> LWWSet<T> {
    /// Create a new empty LWW-Set timestamping with the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Rebuild a set from a stored payload.
    pub fn from_payload(payload: LWWSetPayload<T>) -> Self {
        Self::from_payload_with_clock(payload, SystemClock)
    }
}

impl<T: Element> Default for LWWSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element, C: Clock> LWWSet<T, C> {
    /// Create a new empty LWW-Set using `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            added: BTreeMap::new(),
            removed: BTreeMap::new(),
        }
    }

    /// Rebuild a set from a stored payload using `clock`.
    pub fn from_payload_with_clock(payload: LWWSetPayload<T>, clock: C) -> Self {
        Self {
            clock,
            added: payload.added,
            removed: payload.removed,
        }
    }

    /// Record an add at an explicit timestamp.
    ///
    /// A timestamp older than the recorded one is ignored, keeping each
    /// entry a max-register.
    pub fn add_at(&mut self, value: T, timestamp: Timestamp) {
        record(&mut self.added, value, timestamp);
    }

    /// Record a remove at an explicit timestamp.
    pub fn discard_at(&mut self, value: T, timestamp: Timestamp) {
        record(&mut self.removed, value, timestamp);
    }

    /// Latest add timestamp of `value`.
    #[must_use]
    pub fn added_at(&self, value: &T) -> Option<Timestamp> {
        self.added.get(value).copied()
    }

    /// Latest remove timestamp of `value`.
    #[must_use]
    pub fn removed_at(&self, value: &T) -> Option<Timestamp> {
        self.removed.get(value).copied()
    }

    /// Iterate over the visible elements.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.added
            .iter()
            .filter(|&(value, &added)| self.removed.get(value).map_or(true, |&r| added >= r))
            .map(|(value, _)| value)
    }
}

fn record<T: Ord>(map: &mut BTreeMap<T, Timestamp>, value: T, timestamp: Timestamp) {
    let entry = map.entry(value).or_insert(timestamp);
    *entry = (*entry).max(timestamp);
}

fn merge_registers<T: Element>(into: &mut BTreeMap<T, Timestamp>, from: &BTreeMap<T, Timestamp>) {
    for (value, &timestamp) in from {
        record(into, value.clone(), timestamp);
    }
}

fn registers_descend<T: Ord>(ours: &BTreeMap<T, Timestamp>, theirs: &BTreeMap<T, Timestamp>) -> bool {
    theirs
        .iter()
        .all(|(value, &ts)| ours.get(value).is_some_and(|&own| own >= ts))
}

impl<T: Element, C: Clock> PartialEq for LWWSet<T, C> {
    fn eq(&self, other: &Self) -> bool {
        self.added == other.added && self.removed == other.removed
    }
}

impl<T: Element, C: Clock> Eq for LWWSet<T, C> {}

impl<T: Element, C: Clock + Clone> Crdt for LWWSet<T, C> {
    type Payload = LWWSetPayload<T>;
    type Value = BTreeSet<T>;

    fn payload(&self) -> LWWSetPayload<T> {
        LWWSetPayload {
            added: self.added.clone(),
            removed: self.removed.clone(),
        }
    }

    fn set_payload(&mut self, payload: LWWSetPayload<T>) {
        self.added = payload.added;
        self.removed = payload.removed;
    }

    fn value(&self) -> BTreeSet<T> {
        self.iter().cloned().collect()
    }

    fn merge(&mut self, other: &Self) {
        merge_registers(&mut self.added, &other.added);
        merge_registers(&mut self.removed, &other.removed);
    }

    fn descends_from(&self, other: &Self) -> bool {
        registers_descend(&self.added, &other.added)
            && registers_descend(&self.removed, &other.removed)
    }
}

impl<T: Element, C: Clock + Clone> SetCrdt<T> for LWWSet<T, C> {
    fn add(&mut self, element: T) {
        let now = self.clock.now();
        self.add_at(element, now);
    }

    /// Unconditional: the remove is recorded even if the element was never
    /// seen, so it can shadow an older add arriving later.
    fn discard(&mut self, element: &T) -> Result<bool> {
        let now = self.clock.now();
        self.discard_at(element.clone(), now);
        Ok(true)
    }

    fn contains(&self, element: &T) -> bool {
        match (self.added.get(element), self.removed.get(element)) {
            (Some(added), Some(removed)) => added >= removed,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    fn members(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }
}
