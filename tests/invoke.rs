use any_caps::prelude::*;
use any_caps::caps;

#[test]
fn calls_a_stored_closure() {
    let f = Any::<caps![Invocable<(i32,), i32>]>::new(|x: i32| x * 2);
    assert_eq!(f.call((5,)), 10);
}

#[test]
fn calls_a_stored_fn_pointer() {
    fn shout(s: String, n: usize) -> String {
        s.repeat(n)
    }
    let f = Any::<caps![Invocable<(String, usize), String>]>::new(
        shout as fn(String, usize) -> String,
    );
    assert_eq!(f.call((String::from("ha"), 3)), "hahaha");
}

#[test]
fn zero_arity_callables() {
    let f = Any::<caps![Invocable<(), &'static str>]>::new(|| "ready");
    assert_eq!(f.call(()), "ready");
}

#[test]
fn declaration_order_does_not_change_dispatch() {
    // The call entry must survive both directions of the set fold: filled
    // at the head with a tail behind it, and carried through another
    // capability's passthrough.
    let head = Any::<caps![Invocable<(i32,), i32>, Copiable]>::new(|x: i32| x + 1);
    let tail = Any::<caps![Copiable, Invocable<(i32,), i32>]>::new(|x: i32| x + 1);
    assert_eq!(head.call((4,)), 5);
    assert_eq!(tail.call((4,)), 5);
    assert_eq!(head.clone().call((9,)), tail.clone().call((9,)));
}

#[test]
fn callables_can_carry_other_capabilities() {
    // Capture-free closures are Clone, so Copiable composes.
    let f = Any::<caps![Copiable, Invocable<(i32, i32), i32>]>::new(|a: i32, b: i32| a + b);
    let g = f.clone();
    assert_eq!(f.call((2, 3)), g.call((2, 3)));
}

#[test]
fn unique_function_moves_its_captured_state() {
    let greeting = Box::new(String::from("hello"));
    let mut f = UniqueFunction::<(usize,), String>::new(move |n: usize| {
        format!("{greeting} x{n}")
    });
    assert_eq!(f.call((2,)), "hello x2");

    // The closure is move-only; the container hands it over whole.
    let g = f.take();
    assert!(!f.has_value());
    assert_eq!(g.call((1,)), "hello x1");
}

#[test]
fn replacing_a_callable_replaces_its_target() {
    let mut f = Any::<caps![Movable, Invocable<(i32,), i32>]>::new(|x: i32| x + 1);
    assert_eq!(f.call((1,)), 2);
    f.set(|x: i32| x - 1);
    assert_eq!(f.call((1,)), 0);
}

#[test]
#[should_panic(expected = "called an empty container")]
fn calling_an_empty_container_panics() {
    let f = Any::<caps![Invocable<(), ()>]>::empty();
    f.call(());
}
