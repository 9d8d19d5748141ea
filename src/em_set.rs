use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::gcounter::GCounterPayload;
use crate::replica::ReplicaId;
use crate::{Crdt, Element, GCounter, Result, SetCrdt};

/// Counter pair of one element in an [`EMSet`] payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionPayload {
    /// Add-side counter.
    #[serde(rename = "A")]
    pub adds: GCounterPayload,
    /// Remove-side counter.
    #[serde(rename = "R")]
    pub removes: GCounterPayload,
}

/// Payload of an [`EMSet`]: the election of every element ever touched.
///
/// Encoded as a sorted list of `[element, {"A": .., "R": ..}]` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "T: Element")]
pub struct EMSetPayload<T>(
    #[serde(with = "crate::codec::pairs")] pub BTreeMap<T, ElectionPayload>,
);

impl<T: Element> Default for EMSetPayload<T> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Election {
    adds: GCounter,
    removes: GCounter,
}

impl Election {
    fn new(replica: &str) -> Self {
        Self {
            adds: GCounter::new(replica),
            removes: GCounter::new(replica),
        }
    }

    fn from_payload(replica: &str, payload: ElectionPayload) -> Self {
        Self {
            adds: GCounter::from_payload(replica, payload.adds),
            removes: GCounter::from_payload(replica, payload.removes),
        }
    }

    fn payload(&self) -> ElectionPayload {
        ElectionPayload {
            adds: self.adds.payload(),
            removes: self.removes.payload(),
        }
    }

    fn is_present(&self) -> bool {
        self.adds.value() > self.removes.value()
    }

    fn rebind(&self, replica: &str) -> Self {
        Self {
            adds: self.adds.fork(replica),
            removes: self.removes.fork(replica),
        }
    }
}

/// Outvote `loser` by one: the winner becomes `join(winner, loser)` with
/// the own slot bumped, so its total strictly exceeds `loser`'s.
fn outvote(winner: &GCounter, loser: &GCounter) -> GCounter {
    let mut next = loser.fork(winner.replica());
    next.merge(winner);
    next.increment();
    next
}

/// An election set: membership decided by dueling per-element counters.
///
/// Every element owns an add counter `A` and a remove counter `R`, both
/// G-Counters. The element is present while `A.value > R.value`. Adding a
/// missing element (or removing a present one) pushes the asserted side one
/// past the opposing side as currently known to this replica. Because both
/// sides are G-Counters, concurrent adds from different replicas both push
/// `A` further ahead and still converge to "present".
///
/// # Example
///
/// ```
/// use crdt_toolbox::prelude::*;
///
/// let mut a = EMSet::new("a");
/// a.add("eric".to_string());
///
/// let mut b = a.fork("b");
/// b.discard(&"eric".to_string()).unwrap();
/// assert!(!b.contains(&"eric".to_string()));
///
/// b.add("eric".to_string());
/// assert!(a.merged(&b).contains(&"eric".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EMSet<T: Element> {
    replica: ReplicaId,
    elections: BTreeMap<T, Election>,
}

impl<T: Element> EMSet<T> {
    /// Create an empty set owned by `replica`.
    pub fn new(replica: impl Into<ReplicaId>) -> Self {
        Self {
            replica: replica.into(),
            elections: BTreeMap::new(),
        }
    }

    /// Rebuild a set for `replica` from a stored payload.
    pub fn from_payload(replica: impl Into<ReplicaId>, payload: EMSetPayload<T>) -> Self {
        let mut set = Self::new(replica);
        set.set_payload(payload);
        set
    }

    /// Copy of this set's state bound to a different replica.
    #[must_use]
    pub fn fork(&self, replica: impl Into<ReplicaId>) -> Self {
        let replica = replica.into();
        Self {
            elections: self
                .elections
                .iter()
                .map(|(value, election)| (value.clone(), election.rebind(&replica)))
                .collect(),
            replica,
        }
    }

    /// This replica's id.
    #[must_use]
    pub fn replica(&self) -> &str {
        &self.replica
    }

    /// Current `(add, remove)` totals of `value`, if it was ever touched.
    #[must_use]
    pub fn tally(&self, value: &T) -> Option<(u64, u64)> {
        self.elections
            .get(value)
            .map(|election| (election.adds.value(), election.removes.value()))
    }

    /// Iterate over the visible elements.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elections
            .iter()
            .filter(|(_, election)| election.is_present())
            .map(|(value, _)| value)
    }
}

impl<T: Element> Crdt for EMSet<T> {
    type Payload = EMSetPayload<T>;
    type Value = BTreeSet<T>;

    fn payload(&self) -> EMSetPayload<T> {
        EMSetPayload(
            self.elections
                .iter()
                .map(|(value, election)| (value.clone(), election.payload()))
                .collect(),
        )
    }

    fn set_payload(&mut self, payload: EMSetPayload<T>) {
        self.elections = payload
            .0
            .into_iter()
            .map(|(value, election)| (value, Election::from_payload(&self.replica, election)))
            .collect();
    }

    fn value(&self) -> BTreeSet<T> {
        self.iter().cloned().collect()
    }

    fn merge(&mut self, other: &Self) {
        for (value, theirs) in &other.elections {
            let ours = self
                .elections
                .entry(value.clone())
                .or_insert_with(|| Election::new(&self.replica));
            ours.adds.merge(&theirs.adds);
            ours.removes.merge(&theirs.removes);
        }
    }

    fn descends_from(&self, other: &Self) -> bool {
        let empty = Election::new(&self.replica);
        other.elections.iter().all(|(value, theirs)| {
            let ours = self.elections.get(value).unwrap_or(&empty);
            ours.adds.descends_from(&theirs.adds) && ours.removes.descends_from(&theirs.removes)
        })
    }
}

impl<T: Element> SetCrdt<T> for EMSet<T> {
    /// No-op if the element is already winning.
    fn add(&mut self, element: T) {
        let election = self
            .elections
            .entry(element)
            .or_insert_with(|| Election::new(&self.replica));
        if !election.is_present() {
            election.adds = outvote(&election.adds, &election.removes);
        }
    }

    fn discard(&mut self, element: &T) -> Result<bool> {
        match self.elections.get_mut(element) {
            Some(election) if election.is_present() => {
                election.removes = outvote(&election.removes, &election.adds);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn contains(&self, element: &T) -> bool {
        self.elections
            .get(element)
            .is_some_and(Election::is_present)
    }

    fn members(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }
}
