use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::replica::{Clock, NonceSource, RandomNonces, SystemClock, Timestamp};
use crate::{Crdt, CrdtError, Element, GSet, Result, SetCrdt};

/// Unique token minted for every add in an [`ORSet`].
///
/// A timestamp from the set's clock paired with a nonce from its
/// [`NonceSource`]. On the wire
/// it is the string `"<timestamp:016x>-<nonce:016x>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag {
    timestamp: Timestamp,
    nonce: u64,
}

impl Tag {
    const MIN: Tag = Tag {
        timestamp: 0,
        nonce: 0,
    };
    const MAX: Tag = Tag {
        timestamp: u64::MAX,
        nonce: u64::MAX,
    };

    /// Build a tag from its parts.
    pub fn new(timestamp: Timestamp, nonce: u64) -> Self {
        Self { timestamp, nonce }
    }

    /// Time at which the tag was minted.
    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}-{:016x}", self.timestamp, self.nonce)
    }
}

impl FromStr for Tag {
    type Err = CrdtError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || CrdtError::MalformedPayload(format!("invalid OR-Set tag {s:?}"));
        let (ts, nonce) = s.split_once('-').ok_or_else(malformed)?;
        if ts.len() != 16 || nonce.len() != 16 {
            return Err(malformed());
        }
        Ok(Tag {
            timestamp: u64::from_str_radix(ts, 16).map_err(|_| malformed())?,
            nonce: u64::from_str_radix(nonce, 16).map_err(|_| malformed())?,
        })
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Payload of an [`ORSet`]: tagged additions and tagged tombstones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "T: Element")]
pub struct ORSetPayload<T> {
    /// Every `(element, tag)` ever added.
    #[serde(rename = "A")]
    pub added: Vec<(T, Tag)>,
    /// Every `(element, tag)` ever observed and removed.
    #[serde(rename = "R")]
    pub removed: Vec<(T, Tag)>,
}

/// An observed-remove set (OR-Set), also known as an add-wins set.
///
/// Unlike the 2P-Set, elements can be freely added and removed, and
/// re-added after removal. Each add operation mints a unique tag.
/// Remove only tombstones the tags that the remover has observed, so
/// concurrent adds are preserved.
///
/// Tags come from a [`Clock`] and a [`NonceSource`]; both are injectable
/// with [`with_sources`](ORSet::with_sources) for deterministic tags.
///
/// # Example
///
/// ```
/// use crdt_toolbox::prelude::*;
///
/// let mut s1 = ORSet::new();
/// s1.add("apple".to_string());
/// s1.add("banana".to_string());
///
/// let mut s2 = s1.clone();
/// s1.discard(&"banana".to_string()).unwrap();
/// s2.add("banana".to_string()); // concurrent add, fresh tag
///
/// let merged = s1.merged(&s2);
/// // banana is present because s2's add was concurrent with s1's remove
/// assert!(merged.contains(&"banana".to_string()));
/// assert!(merged.contains(&"apple".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct ORSet<T: Element, C: Clock = SystemClock, N: NonceSource = RandomNonces> {
    clock: C,
    nonces: N,
    added: GSet<(T, Tag)>,
    removed: GSet<(T, Tag)>,
}

impl<T: Element> ORSet<T> {
    /// Create a new empty OR-Set timestamping tags with the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Rebuild a set from a stored payload.
    pub fn from_payload(payload: ORSetPayload<T>) -> Self {
        Self::from_payload_with_clock(payload, SystemClock)
    }
}

impl<T: Element> Default for ORSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element, C: Clock> ORSet<T, C> {
    /// Create a new empty OR-Set using `clock` for tag timestamps.
    pub fn with_clock(clock: C) -> Self {
        Self::with_sources(clock, RandomNonces)
    }

    /// Rebuild a set from a stored payload using `clock`.
    pub fn from_payload_with_clock(payload: ORSetPayload<T>, clock: C) -> Self {
        Self::from_payload_with_sources(payload, clock, RandomNonces)
    }
}

impl<T: Element, C: Clock, N: NonceSource> ORSet<T, C, N> {
    /// Create a new empty OR-Set minting tags from `clock` and `nonces`.
    pub fn with_sources(clock: C, nonces: N) -> Self {
        Self {
            clock,
            nonces,
            added: GSet::new(),
            removed: GSet::new(),
        }
    }

    /// Rebuild a set from a stored payload with explicit tag sources.
    pub fn from_payload_with_sources(payload: ORSetPayload<T>, clock: C, nonces: N) -> Self {
        Self {
            clock,
            nonces,
            added: GSet::from_payload(payload.added),
            removed: GSet::from_payload(payload.removed),
        }
    }

    /// Tags of `value` that are added and not yet removed.
    pub fn live_tags<'a>(&'a self, value: &T) -> impl Iterator<Item = &'a Tag> + 'a {
        let removed = self.removed.as_set();
        self.added
            .as_set()
            .range((value.clone(), Tag::MIN)..=(value.clone(), Tag::MAX))
            .filter(move |pair| !removed.contains(*pair))
            .map(|(_, tag)| tag)
    }

    /// Iterate over the visible elements.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let removed = self.removed.as_set();
        let mut last: Option<&T> = None;
        self.added
            .as_set()
            .iter()
            .filter(move |pair| !removed.contains(*pair))
            .filter_map(move |(value, _)| {
                // pairs are sorted by element, so duplicates are adjacent
                if last == Some(value) {
                    None
                } else {
                    last = Some(value);
                    Some(value)
                }
            })
    }

    fn mint_tag(&self) -> Tag {
        Tag::new(self.clock.now(), self.nonces.next_nonce())
    }
}

impl<T: Element, C: Clock, N: NonceSource> PartialEq for ORSet<T, C, N> {
    fn eq(&self, other: &Self) -> bool {
        self.added == other.added && self.removed == other.removed
    }
}

impl<T: Element, C: Clock, N: NonceSource> Eq for ORSet<T, C, N> {}

impl<T: Element, C: Clock + Clone, N: NonceSource + Clone> Crdt for ORSet<T, C, N> {
    type Payload = ORSetPayload<T>;
    type Value = BTreeSet<T>;

    fn payload(&self) -> ORSetPayload<T> {
        ORSetPayload {
            added: self.added.payload(),
            removed: self.removed.payload(),
        }
    }

    fn set_payload(&mut self, payload: ORSetPayload<T>) {
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

impl<T: Element, C: Clock + Clone, N: NonceSource + Clone> SetCrdt<T> for ORSet<T, C, N> {
    /// Mints a fresh tag. Never looks at the tombstones, so an element can
    /// be re-added after removal.
    fn add(&mut self, element: T) {
        let tag = self.mint_tag();
        self.added.add((element, tag));
    }

    /// Tombstones the tags of `element` observed by this replica. Tags
    /// minted concurrently elsewhere are untouched and survive the merge.
    fn discard(&mut self, element: &T) -> Result<bool> {
        let observed: Vec<Tag> = self.live_tags(element).copied().collect();
        if observed.is_empty() {
            return Ok(false);
        }
        for tag in observed {
            self.removed.add((element.clone(), tag));
        }
        Ok(true)
    }

    fn contains(&self, element: &T) -> bool {
        self.live_tags(element).next().is_some()
    }

    fn members(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }
}
