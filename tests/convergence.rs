//! Integration tests verifying CRDT convergence properties.
//!
//! For any CRDT, merging replicas in any order must produce the same result.

use std::collections::{BTreeMap, BTreeSet};

use crdt_toolbox::prelude::*;
use crdt_toolbox::replica::ManualClock;

fn names(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn counts(entries: &[(&str, u64)]) -> BTreeMap<String, u64> {
    entries.iter().map(|&(k, v)| (k.to_string(), v)).collect()
}

#[test]
fn gcounter_diamond() {
    let mut a = GCounter::new("a");
    let mut b = GCounter::new("b");

    a.increment();
    assert_eq!(a.payload(), counts(&[("a", 1)]));

    b.increment();
    assert_eq!(b.payload(), counts(&[("b", 1)]));

    let mut b2 = b.clone();
    b2.increment();
    assert_eq!(b2.payload(), counts(&[("b", 2)]));

    let mut ab = a.merged(&b);
    assert_eq!(ab.payload(), counts(&[("a", 1), ("b", 1)]));
    assert_eq!(ab.value(), 2);

    ab.increment();
    assert_eq!(ab.payload(), counts(&[("a", 2), ("b", 1)]));

    let abb2 = ab.merged(&b2);
    assert_eq!(abb2.payload(), counts(&[("a", 2), ("b", 2)]));
    assert_eq!(abb2.value(), 4);
}

#[test]
fn gcounter_three_way_convergence() {
    let mut a = GCounter::new("a");
    let mut b = GCounter::new("b");
    let mut c = GCounter::new("c");

    a.increment_by(10);
    b.increment_by(20);
    c.increment_by(30);

    let order1 = a.merged(&b).merged(&c);
    let order2 = c.merged(&a).merged(&b);
    let order3 = b.merged(&c).merged(&a);

    assert_eq!(order1.value(), 60);
    assert_eq!(order1.payload(), order2.payload());
    assert_eq!(order2.payload(), order3.payload());
}

#[test]
fn pncounter_diamond() {
    let mut a = PNCounter::new("a");
    let mut b = PNCounter::new("b");

    a.increment();
    b.decrement();

    a.decrement();
    b.decrement();

    let ab = a.merged(&b);

    let mut b2 = b.clone();
    b2.decrement();

    let abb2 = ab.merged(&b2);
    assert_eq!(abb2.value(), -3);
}

#[test]
fn gset_diamond_and_no_discard() {
    let mut a = GSet::new();
    let mut b = GSet::new();

    a.add("eric".to_string());
    a.add("mark".to_string());
    b.add("glenn".to_string());
    let mut b2 = b.clone();

    let ab = a.merged(&b);
    b2.add("tom".to_string());

    let mut abb2 = ab.merged(&b2);
    assert_eq!(abb2.value(), names(&["eric", "mark", "glenn", "tom"]));

    let err = abb2.discard(&"eric".to_string()).unwrap_err();
    assert!(matches!(err, CrdtError::UnsupportedOperation { .. }));
    assert!(abb2.contains(&"eric".to_string()));
}

#[test]
fn twopset_diamond_remove_is_permanent() {
    let mut a = TwoPSet::new();
    let mut b = TwoPSet::new();

    a.add("eric".to_string());
    b.add("glenn".to_string());
    a.add("mark".to_string());
    b.add("tom".to_string());

    let ab = a.merged(&b);

    let mut b2 = b.clone();
    assert!(b2.discard(&"tom".to_string()).unwrap());

    let mut abb2 = ab.merged(&b2);
    assert_eq!(abb2.value(), names(&["eric", "mark", "glenn"]));

    abb2.add("tom".to_string());
    assert!(!abb2.contains(&"tom".to_string()));
    assert_eq!(abb2.merged(&ab).value(), names(&["eric", "mark", "glenn"]));
}

#[test]
fn orset_add_wins_over_concurrent_remove() {
    let mut a = ORSet::new();
    a.add("eric".to_string());

    let mut b = a.clone();
    let mut c = a.clone();
    b.add("eric".to_string());
    c.discard(&"eric".to_string()).unwrap();

    assert_eq!(b.merged(&c).value(), names(&["eric"]));
    assert_eq!(c.merged(&b).value(), names(&["eric"]));
}

#[test]
fn orset_concurrent_removes_then_readd() {
    let mut a = ORSet::new();
    a.add("eric".to_string());

    let mut b = a.clone();
    let mut c = a.clone();
    b.discard(&"eric".to_string()).unwrap();
    c.discard(&"eric".to_string()).unwrap();

    let mut bc = b.merged(&c);
    assert!(!bc.contains(&"eric".to_string()));

    bc.add("eric".to_string());
    assert!(bc.contains(&"eric".to_string()));
}

#[test]
fn lwwset_concurrent_add_and_remove_favor_add() {
    let clock = ManualClock::new(1);
    let mut a = LWWSet::with_clock(clock.clone());
    a.add("eric".to_string());

    let mut b = a.clone();
    let mut c = a.clone();

    clock.set(2);
    b.add("eric".to_string());
    c.discard(&"eric".to_string()).unwrap();

    let d = b.merged(&c);
    assert_eq!(d.value(), names(&["eric"]));
    assert_eq!(c.merged(&b).value(), names(&["eric"]));
}

#[test]
fn lwwset_later_remove_wins() {
    let clock = ManualClock::new(1);
    let mut a = LWWSet::with_clock(clock.clone());
    a.add("eric".to_string());

    let mut b = a.clone();
    clock.set(3);
    b.discard(&"eric".to_string()).unwrap();

    assert!(!a.merged(&b).contains(&"eric".to_string()));
}

#[test]
fn emset_concurrent_toggles_converge() {
    let mut a = EMSet::new("a");
    a.add("eric".to_string());

    let mut b = a.fork("b");
    let mut c = a.fork("c");
    b.discard(&"eric".to_string()).unwrap();
    c.discard(&"eric".to_string()).unwrap();

    let bc = b.merged(&c);
    assert!(!bc.contains(&"eric".to_string()));
    assert_eq!(bc.payload(), c.merged(&b).payload());

    let mut d = bc.fork("d");
    d.add("eric".to_string());
    assert!(d.merged(&b).merged(&c).contains(&"eric".to_string()));
}

#[test]
fn repeated_merge_is_idempotent() {
    let mut a = ORSet::new();
    a.add(1);
    a.add(2);

    let mut b = ORSet::new();
    b.add(2);
    b.add(3);

    a.merge(&b);
    let snapshot = a.clone();

    a.merge(&b);
    assert_eq!(a, snapshot, "Merge should be idempotent");

    a.merge(&b);
    assert_eq!(a, snapshot, "Merge should be idempotent (3rd time)");
}

#[test]
fn merge_never_mutates_inputs() {
    let mut a = TwoPSet::new();
    a.add(1);
    let mut b = TwoPSet::new();
    b.add(2);
    b.discard(&2).unwrap();

    let (a_before, b_before) = (a.payload(), b.payload());
    let _ = a.merged(&b);
    assert_eq!(a.payload(), a_before);
    assert_eq!(b.payload(), b_before);
}
