use any_caps::prelude::*;
use any_caps::caps;

type Plain = Any<caps![]>;

// =============================================================================
// 1. Store and read back
// =============================================================================

#[test]
fn holds_and_returns_the_stored_value() {
    let v = Plain::new(42_i32);
    assert!(v.has_value());
    assert!(v.is::<i32>());
    assert_eq!(v.downcast_ref::<i32>(), Some(&42));
    assert_eq!(v.value::<i32>(), 42);
}

#[test]
fn concrete_type_may_change_between_assignments() {
    let mut v = Plain::new(1_u8);
    assert!(v.is::<u8>());

    v.set(String::from("now a string"));
    assert!(v.is::<String>());
    assert_eq!(v.expect_ref::<String>(), "now a string");

    v.emplace(|| vec![1, 2, 3]);
    assert_eq!(v.expect_ref::<Vec<i32>>(), &[1, 2, 3]);
}

#[test]
fn mutation_through_downcast_mut() {
    let mut v = Plain::new(String::from("ab"));
    v.downcast_mut::<String>().unwrap().push('c');
    assert_eq!(v.expect_ref::<String>(), "abc");

    v.try_mut::<String>().unwrap().push('d');
    assert_eq!(v.expect_ref::<String>(), "abcd");
}

// =============================================================================
// 2. Wrong-type extraction
// =============================================================================

#[test]
fn mismatch_is_reported_not_guessed() {
    let v = Plain::new(42_i32);
    assert_eq!(v.downcast_ref::<u32>(), None);
    assert_eq!(
        v.try_ref::<u32>(),
        Err(CastError::Mismatch {
            stored: "i32",
            requested: "u32",
        })
    );
}

#[test]
fn mismatch_message_names_both_types() {
    let v = Plain::new(42_i32);
    let err = v.try_ref::<u32>().unwrap_err();
    assert_eq!(
        err.to_string(),
        "container holds `i32`, not the requested `u32`"
    );
}

#[test]
fn value_or_falls_back_on_mismatch_and_on_empty() {
    let v = Plain::new(42_i32);
    assert_eq!(v.value_or::<i32>(0), 42);
    assert_eq!(v.value_or::<u64>(7), 7);
    assert_eq!(Plain::empty().value_or::<i32>(-1), -1);
}

#[test]
#[should_panic(expected = "cannot cast `i32`")]
fn expect_ref_panics_on_mismatch() {
    let v = Plain::new(42_i32);
    let _ = v.expect_ref::<String>();
}

#[test]
#[should_panic(expected = "cannot cast")]
fn value_panics_on_mismatch() {
    let v = Plain::new(42_i32);
    let _ = v.value::<u8>();
}

// =============================================================================
// 3. Explicit moves (Movable)
// =============================================================================

#[test]
fn swap_exchanges_contents_of_any_types() {
    type V = Any<caps![Movable]>;
    let mut a = V::new(1_i32);
    let mut b = V::new(String::from("two"));
    a.swap(&mut b);
    assert_eq!(a.expect_ref::<String>(), "two");
    assert_eq!(*b.expect_ref::<i32>(), 1);
}

#[test]
fn take_leaves_the_source_empty() {
    type V = Any<caps![Movable]>;
    let mut a = V::new(5_i32);
    let b = a.take();
    assert!(!a.has_value());
    assert_eq!(*b.expect_ref::<i32>(), 5);
}

#[test]
fn try_take_moves_out_on_match_and_keeps_the_value_on_mismatch() {
    type V = Any<caps![Movable]>;
    let mut a = V::new(String::from("moved"));

    assert!(matches!(a.try_take::<i32>(), Err(CastError::Mismatch { .. })));
    assert!(a.has_value());

    let s = a.try_take::<String>().unwrap();
    assert_eq!(s, "moved");
    assert!(!a.has_value());
    assert_eq!(a.try_take::<String>(), Err(CastError::Empty));
}
