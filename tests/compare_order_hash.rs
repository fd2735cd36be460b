use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use any_caps::prelude::*;
use any_caps::caps;

// =============================================================================
// 1. Equality (Comparable)
// =============================================================================

type Cmp = Any<caps![Comparable]>;

#[test]
fn same_type_equality_uses_the_value() {
    assert_eq!(Cmp::new(13_i32), Cmp::new(13_i32));
    assert_ne!(Cmp::new(13_i32), Cmp::new(14_i32));
}

#[test]
fn different_types_are_never_equal() {
    // 13 and "13" look alike but are distinct values.
    assert_ne!(Cmp::new(13_i32), Cmp::new("13"));
    assert_ne!(Cmp::new(13_i32), Cmp::new(13_u32));
}

// =============================================================================
// 2. Ordering (Orderable)
// =============================================================================

type OrdVal = Any<caps![Orderable]>;

#[test]
fn same_type_values_sort_by_their_own_ordering() {
    let mut values = vec![OrdVal::new(25), OrdVal::new(-15), OrdVal::new(3)];
    values.sort();
    let sorted: Vec<i32> = values.iter().map(|v| v.value::<i32>()).collect();
    assert_eq!(sorted, [-15, 3, 25]);
}

#[test]
fn empty_sorts_before_any_value() {
    assert_eq!(OrdVal::empty().cmp(&OrdVal::new(i32::MIN)), Ordering::Less);
    assert_eq!(OrdVal::new(i32::MIN).cmp(&OrdVal::empty()), Ordering::Greater);
    assert_eq!(OrdVal::empty().cmp(&OrdVal::empty()), Ordering::Equal);
}

#[test]
fn cross_type_ordering_is_total_and_consistent() {
    let a = OrdVal::new(13_i32);
    let b = OrdVal::new("13");
    // Arbitrary direction, but antisymmetric and stable.
    assert_ne!(a.cmp(&b), Ordering::Equal);
    assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
    assert_eq!(a.cmp(&b), OrdVal::new(7_i32).cmp(&OrdVal::new("x")));
}

#[test]
fn ordered_sets_accept_mixed_types() {
    let mut set = BTreeSet::new();
    set.insert(OrdVal::new(2_i32));
    set.insert(OrdVal::new(1_i32));
    set.insert(OrdVal::new("one"));
    set.insert(OrdVal::new(1_i32)); // duplicate
    assert_eq!(set.len(), 3);
}

// =============================================================================
// 3. Hashing (Hashable)
// =============================================================================

type Keyed = Any<caps![Comparable, Hashable]>;

#[test]
fn equal_values_hash_equal() {
    assert_eq!(Keyed::new(13_i32).hash_value(), Keyed::new(13_i32).hash_value());
}

#[test]
fn hash_set_deduplicates_by_type_and_value() {
    let mut set = HashSet::new();
    set.insert(Keyed::new(13_i32));
    set.insert(Keyed::new(13_i32)); // same value, same type
    set.insert(Keyed::new("13")); // same digits, different type
    assert_eq!(set.len(), 2);

    assert!(set.contains(&Keyed::new(13_i32)));
    assert!(set.contains(&Keyed::new("13")));
    assert!(!set.contains(&Keyed::new(14_i32)));
}
