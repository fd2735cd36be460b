use std::cell::Cell;
use std::rc::Rc;

use any_caps::prelude::*;
use any_caps::{StorageClass, caps};

// =============================================================================
// 1. Class decision
// =============================================================================

#[test]
fn small_values_stay_inline_and_large_ones_spill() {
    type V = Any<caps![]>;
    assert_eq!(V::new(7_i32).storage_class(), Some(StorageClass::Inline));
    // String is exactly pointer + capacity + length: still inline.
    assert_eq!(
        V::new(String::from("x")).storage_class(),
        Some(StorageClass::Inline)
    );
    assert_eq!(
        V::new([0_i32; 123]).storage_class(),
        Some(StorageClass::Boxed)
    );
}

// =============================================================================
// 2. Transparency: behavior does not depend on the class
// =============================================================================

#[test]
fn boxed_values_behave_like_inline_ones() {
    type V = Any<caps![Copiable, Comparable]>;

    let small = V::new(7_i32);
    let big = V::new([7_i32; 123]);

    assert_eq!(small.value::<i32>(), 7);
    assert_eq!(big.expect_ref::<[i32; 123]>()[122], 7);

    assert_eq!(small, small.clone());
    assert_eq!(big, big.clone());
    assert_ne!(big, V::new([8_i32; 123]));
}

#[test]
fn boxed_values_survive_explicit_moves() {
    type V = Any<caps![Movable]>;
    let mut v = V::new([3_u64; 40]);
    assert_eq!(v.storage_class(), Some(StorageClass::Boxed));
    let arr = v.try_take::<[u64; 40]>().unwrap();
    assert_eq!(arr, [3_u64; 40]);
    assert!(!v.has_value());
}

// =============================================================================
// 3. Destruction accounting
// =============================================================================

#[derive(Clone)]
struct Tally(Rc<Cell<usize>>);

impl Drop for Tally {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

#[derive(Clone)]
struct BigTally {
    _pad: [u8; 64],
    count: Rc<Cell<usize>>,
}

impl Drop for BigTally {
    fn drop(&mut self) {
        self.count.set(self.count.get() + 1);
    }
}

#[test]
fn inline_value_is_destroyed_exactly_once() {
    let drops = Rc::new(Cell::new(0));
    {
        let _v = Any::<caps![]>::new(Tally(drops.clone()));
    }
    assert_eq!(drops.get(), 1);
}

#[test]
fn boxed_value_is_destroyed_exactly_once() {
    let drops = Rc::new(Cell::new(0));
    {
        let v = Any::<caps![]>::new(BigTally {
            _pad: [0; 64],
            count: drops.clone(),
        });
        assert_eq!(v.storage_class(), Some(StorageClass::Boxed));
    }
    assert_eq!(drops.get(), 1);
}

#[test]
fn replacement_destroys_the_previous_value_first() {
    let drops = Rc::new(Cell::new(0));
    let mut v = Any::<caps![]>::new(Tally(drops.clone()));
    v.set(1_i32);
    assert_eq!(drops.get(), 1);
    v.reset();
    assert_eq!(drops.get(), 1);
}

#[test]
fn clones_are_destroyed_independently() {
    let drops = Rc::new(Cell::new(0));
    let v = Any::<caps![Copiable]>::new(Tally(drops.clone()));
    let w = v.clone();
    drop(v);
    assert_eq!(drops.get(), 1);
    drop(w);
    assert_eq!(drops.get(), 2);
}

#[test]
fn moving_out_does_not_double_destroy() {
    let drops = Rc::new(Cell::new(0));
    let mut v = Any::<caps![Movable]>::new(Tally(drops.clone()));
    let t = v.try_take::<Tally>().unwrap();
    assert_eq!(drops.get(), 0);
    drop(v);
    assert_eq!(drops.get(), 0);
    drop(t);
    assert_eq!(drops.get(), 1);
}
