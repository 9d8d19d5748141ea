use std::collections::BTreeSet;

use crate::{Crdt, CrdtError, Element, Result, SetCrdt};

/// A grow-only set (G-Set).
///
/// Elements can be added but never removed. Merge is simply the union
/// of both sets. This is the simplest set CRDT and the building block of
/// [`TwoPSet`](crate::TwoPSet) and [`ORSet`](crate::ORSet).
///
/// # Example
///
/// ```
/// use crdt_toolbox::prelude::*;
///
/// let mut s1 = GSet::new();
/// s1.add("apple".to_string());
/// s1.add("banana".to_string());
///
/// let mut s2 = GSet::new();
/// s2.add("cherry".to_string());
///
/// s1.merge(&s2);
/// assert_eq!(s1.len(), 3);
/// assert!(s1.discard(&"apple".to_string()).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GSet<T: Element> {
    elements: BTreeSet<T>,
}

impl<T: Element> GSet<T> {
    /// Create a new empty G-Set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: BTreeSet::new(),
        }
    }

    /// Rebuild a set from a stored payload. Duplicates collapse.
    pub fn from_payload(payload: Vec<T>) -> Self {
        payload.into_iter().collect()
    }

    /// Iterate over the elements in the set.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elements.iter()
    }

    pub(crate) fn as_set(&self) -> &BTreeSet<T> {
        &self.elements
    }
}

impl<T: Element> Default for GSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> Crdt for GSet<T> {
    type Payload = Vec<T>;
    type Value = BTreeSet<T>;

    fn payload(&self) -> Vec<T> {
        self.elements.iter().cloned().collect()
    }

    fn set_payload(&mut self, payload: Vec<T>) {
        self.elements = payload.into_iter().collect();
    }

    fn value(&self) -> BTreeSet<T> {
        self.elements.clone()
    }

    fn merge(&mut self, other: &Self) {
        for elem in &other.elements {
            self.elements.insert(elem.clone());
        }
    }

    fn descends_from(&self, other: &Self) -> bool {
        other.elements.is_subset(&self.elements)
    }
}

impl<T: Element> SetCrdt<T> for GSet<T> {
    fn add(&mut self, element: T) {
        self.elements.insert(element);
    }

    fn discard(&mut self, _element: &T) -> Result<bool> {
        Err(CrdtError::UnsupportedOperation {
            crdt: "GSet",
            operation: "discard",
        })
    }

    fn contains(&self, element: &T) -> bool {
        self.elements.contains(element)
    }

    fn members(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.elements.iter())
    }

    fn len(&self) -> usize {
        self.elements.len()
    }

    fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<T: Element> IntoIterator for GSet<T> {
    type Item = T;
    type IntoIter = std::collections::btree_set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<T: Element> FromIterator<T> for GSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            elements: BTreeSet::from_iter(iter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_set_is_empty() {
        let s = GSet::<String>::new();
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
    }

    #[test]
    fn add_and_contains() {
        let mut s = GSet::new();
        s.add(1);
        assert!(s.contains(&1));
        assert!(!s.contains(&2));
    }

    #[test]
    fn add_is_idempotent() {
        let mut s = GSet::new();
        s.add(2);
        s.add(1);
        s.add(2);
        assert_eq!(s.len(), 2);
        assert_eq!(s.elements(), vec![&1, &2]);
    }

    #[test]
    fn discard_is_unsupported() {
        let mut s = GSet::new();
        s.add(1);
        let err = s.discard(&1).unwrap_err();
        assert!(matches!(
            err,
            CrdtError::UnsupportedOperation {
                crdt: "GSet",
                operation: "discard"
            }
        ));
        assert!(s.contains(&1));
    }

    #[test]
    fn merge_is_union() {
        let mut s1 = GSet::new();
        s1.add(1);
        s1.add(2);

        let mut s2 = GSet::new();
        s2.add(2);
        s2.add(3);

        let merged = s1.merged(&s2);
        assert_eq!(merged.value(), BTreeSet::from([1, 2, 3]));
        assert_eq!(s1.len(), 2);
    }

    #[test]
    fn descends_from_is_subset() {
        let s1: GSet<i32> = vec![1, 2].into_iter().collect();
        let s2: GSet<i32> = vec![1].into_iter().collect();
        assert!(s1.descends_from(&s2));
        assert!(!s2.descends_from(&s1));
    }

    #[test]
    fn payload_is_sorted_sequence() {
        let s: GSet<i32> = vec![3, 1, 2, 1].into_iter().collect();
        assert_eq!(s.payload(), vec![1, 2, 3]);
        assert_eq!(GSet::from_payload(s.payload()), s);
    }
}
