//! Built-in capability tags, their operation entries, and the bridges from
//! std traits (`Clone`, `Eq`, `Ord`, `Hash`, `Fn`, `Display`) to
//! those entries.
//!
//! Entries are plain structs of `unsafe fn` pointers operating on erased
//! `*const u8` value addresses. Each pointer is instantiated once per
//! concrete type (and, where behavior differs, per storage class) by the
//! generic shim functions at the bottom of this module.

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

use crate::caps::{Capability, ProvideEntry, Slot, fill_passthrough};
use crate::store::{RawBuf, StorageClass};

// -----------------------------------------------------------------------------
// Operation entries
// -----------------------------------------------------------------------------

/// Duplicates the source value into a fresh cell buffer: clone-in-place for
/// the inline class, clone-into-new-allocation for the boxed class.
#[derive(Clone, Copy)]
pub struct CopyEntry {
    pub(crate) duplicate: unsafe fn(src: *const u8, dst: *mut RawBuf),
}

/// Relocation marker. Moves are plain byte moves in Rust, so the entry
/// carries no functions; its presence in the slot is what gates `swap`,
/// `take` and `try_take`.
#[derive(Clone, Copy)]
pub struct MoveEntry;

/// Same-type value equality.
#[derive(Clone, Copy)]
pub struct EqEntry {
    pub(crate) equal: unsafe fn(*const u8, *const u8) -> bool,
}

/// Same-type total ordering. Carries equality too: `Ord: Eq` in Rust, and
/// the eq slot is fed from here when only `Orderable` is declared.
#[derive(Clone, Copy)]
pub struct OrdEntry {
    pub(crate) compare: unsafe fn(*const u8, *const u8) -> Ordering,
    pub(crate) equal: unsafe fn(*const u8, *const u8) -> bool,
}

/// Feeds the value into a hasher stream.
#[derive(Clone, Copy)]
pub struct HashEntry {
    pub(crate) feed: unsafe fn(*const u8, &mut dyn Hasher),
}

/// Invokes the value with an argument tuple.
pub struct CallEntry<A, R> {
    pub(crate) invoke: unsafe fn(*const u8, A) -> R,
}

impl<A, R> Clone for CallEntry<A, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A, R> Copy for CallEntry<A, R> {}

/// Renders the value through a formatter.
#[derive(Clone, Copy)]
pub struct RenderEntry {
    pub(crate) render: unsafe fn(*const u8, &mut fmt::Formatter<'_>) -> fmt::Result,
}

// -----------------------------------------------------------------------------
// Capability tags
// -----------------------------------------------------------------------------

/// Destruction marker. Every container destroys its value regardless of the
/// declared set; the tag exists so sets written out in full stay valid.
pub struct Destructible;

/// The container can be cloned. Requires `T: Clone` of stored types.
pub struct Copiable;

/// The container supports explicit value transfer (`swap`, `take`,
/// `try_take`). Stored types need nothing: Rust moves are byte moves.
pub struct Movable;

/// `==`/`!=` between containers. Requires `T: Eq`, since the gated impl
/// promises reflexivity: a partial equality would let `NaN`-like values
/// break `HashSet`/`BTreeMap` keys.
///
/// ```compile_fail
/// use any_caps::{Any, Comparable, caps};
///
/// let v = Any::<caps![Comparable]>::new(f32::NAN); // f32 is not `Eq`
/// ```
pub struct Comparable;

/// Total ordering between containers. Requires `T: Ord`; also provides
/// equality, since `Ord` subsumes it.
pub struct Orderable;

/// Hashing. Requires `T: Hash`.
pub struct Hashable;

/// Invocation with argument tuple `A` returning `R`. Requires
/// `T: Fn(A...) -> R`.
pub struct Invocable<A, R>(PhantomData<fn(A) -> R>);

/// Textual rendering. Requires `T: Display`.
pub struct Renderable;

// -----------------------------------------------------------------------------
// Capability impls
// -----------------------------------------------------------------------------

impl Capability for Destructible {
    type Entry = ();
    fill_passthrough!(copy, mov, eq, ord, hash, call, render, ext);
}

impl<T: 'static> ProvideEntry<T> for Destructible {
    fn entry(_class: StorageClass) {}
}

impl Capability for Copiable {
    type Entry = CopyEntry;

    type FillCopy<Tail: Slot> = CopyEntry;

    fn fill_copy<Tail: Slot>(entry: CopyEntry, _tail: Tail) -> CopyEntry {
        entry
    }

    fill_passthrough!(mov, eq, ord, hash, call, render, ext);
}

impl<T: Clone + 'static> ProvideEntry<T> for Copiable {
    fn entry(class: StorageClass) -> CopyEntry {
        CopyEntry {
            duplicate: match class {
                StorageClass::Inline => clone_into_buf::<T>,
                StorageClass::Boxed => clone_into_heap::<T>,
            },
        }
    }
}

impl Capability for Movable {
    type Entry = MoveEntry;

    type FillMov<Tail: Slot> = MoveEntry;

    fn fill_mov<Tail: Slot>(entry: MoveEntry, _tail: Tail) -> MoveEntry {
        entry
    }

    fill_passthrough!(copy, eq, ord, hash, call, render, ext);
}

impl<T: 'static> ProvideEntry<T> for Movable {
    fn entry(_class: StorageClass) -> MoveEntry {
        MoveEntry
    }
}

impl Capability for Comparable {
    type Entry = EqEntry;

    type FillEq<Tail: Slot> = EqEntry;

    fn fill_eq<Tail: Slot>(entry: EqEntry, _tail: Tail) -> EqEntry {
        entry
    }

    fill_passthrough!(copy, mov, ord, hash, call, render, ext);
}

impl<T: Eq + 'static> ProvideEntry<T> for Comparable {
    fn entry(_class: StorageClass) -> EqEntry {
        EqEntry {
            equal: eq_values::<T>,
        }
    }
}

impl Capability for Orderable {
    type Entry = OrdEntry;

    type FillOrd<Tail: Slot> = OrdEntry;
    type FillEq<Tail: Slot> = EqEntry;

    fn fill_ord<Tail: Slot>(entry: OrdEntry, _tail: Tail) -> OrdEntry {
        entry
    }

    fn fill_eq<Tail: Slot>(entry: OrdEntry, _tail: Tail) -> EqEntry {
        EqEntry { equal: entry.equal }
    }

    fill_passthrough!(copy, mov, hash, call, render, ext);
}

impl<T: Ord + 'static> ProvideEntry<T> for Orderable {
    fn entry(_class: StorageClass) -> OrdEntry {
        OrdEntry {
            compare: cmp_values::<T>,
            equal: eq_values::<T>,
        }
    }
}

impl Capability for Hashable {
    type Entry = HashEntry;

    type FillHash<Tail: Slot> = HashEntry;

    fn fill_hash<Tail: Slot>(entry: HashEntry, _tail: Tail) -> HashEntry {
        entry
    }

    fill_passthrough!(copy, mov, eq, ord, call, render, ext);
}

impl<T: Hash + 'static> ProvideEntry<T> for Hashable {
    fn entry(_class: StorageClass) -> HashEntry {
        HashEntry {
            feed: hash_value::<T>,
        }
    }
}

impl<A: 'static, R: 'static> Capability for Invocable<A, R> {
    type Entry = CallEntry<A, R>;

    type FillCall<Tail: Slot> = CallEntry<A, R>;

    fn fill_call<Tail: Slot>(entry: CallEntry<A, R>, _tail: Tail) -> CallEntry<A, R> {
        entry
    }

    fill_passthrough!(copy, mov, eq, ord, hash, render, ext);
}

impl Capability for Renderable {
    type Entry = RenderEntry;

    type FillRender<Tail: Slot> = RenderEntry;

    fn fill_render<Tail: Slot>(entry: RenderEntry, _tail: Tail) -> RenderEntry {
        entry
    }

    fill_passthrough!(copy, mov, eq, ord, hash, call, ext);
}

impl<T: fmt::Display + 'static> ProvideEntry<T> for Renderable {
    fn entry(_class: StorageClass) -> RenderEntry {
        RenderEntry {
            render: render_value::<T>,
        }
    }
}

/// `ProvideEntry` bridges from the `Fn` traits, one per supported arity.
macro_rules! impl_invocable {
    ($shim:ident: $($arg:ident),*) => {
        #[allow(non_snake_case)]
        unsafe fn $shim<Func, Ret, $($arg),*>(
            target: *const u8,
            ($($arg,)*): ($($arg,)*),
        ) -> Ret
        where
            Func: Fn($($arg),*) -> Ret,
        {
            // SAFETY: caller guarantees `target` points at a live `Func`.
            let target = unsafe { &*target.cast::<Func>() };
            target($($arg),*)
        }

        impl<Func, Ret, $($arg),*> ProvideEntry<Func> for Invocable<($($arg,)*), Ret>
        where
            Func: Fn($($arg),*) -> Ret + 'static,
            Ret: 'static,
            $($arg: 'static,)*
        {
            fn entry(_class: StorageClass) -> CallEntry<($($arg,)*), Ret> {
                CallEntry {
                    invoke: $shim::<Func, Ret, $($arg),*>,
                }
            }
        }
    };
}

impl_invocable!(invoke0:);
impl_invocable!(invoke1: A0);
impl_invocable!(invoke2: A0, A1);
impl_invocable!(invoke3: A0, A1, A2);
impl_invocable!(invoke4: A0, A1, A2, A3);

// -----------------------------------------------------------------------------
// Shims
// -----------------------------------------------------------------------------

unsafe fn clone_into_buf<T: Clone>(src: *const u8, dst: *mut RawBuf) {
    // SAFETY: caller guarantees `src` points at a live `T` and `dst` at a
    // cell buffer; `T` was classed inline, so it fits.
    let copy = unsafe { (*src.cast::<T>()).clone() };
    unsafe { dst.cast::<T>().write(copy) };
}

unsafe fn clone_into_heap<T: Clone>(src: *const u8, dst: *mut RawBuf) {
    // SAFETY: as above; the boxed class stores the owning pointer in `dst`.
    let copy = unsafe { (*src.cast::<T>()).clone() };
    unsafe { dst.cast::<*mut T>().write(Box::into_raw(Box::new(copy))) };
}

unsafe fn eq_values<T: PartialEq>(a: *const u8, b: *const u8) -> bool {
    // SAFETY: caller guarantees both operands are live `T`s.
    unsafe { *a.cast::<T>() == *b.cast::<T>() }
}

unsafe fn cmp_values<T: Ord>(a: *const u8, b: *const u8) -> Ordering {
    // SAFETY: caller guarantees both operands are live `T`s.
    unsafe { (*a.cast::<T>()).cmp(&*b.cast::<T>()) }
}

unsafe fn hash_value<T: Hash>(value: *const u8, mut state: &mut dyn Hasher) {
    // SAFETY: caller guarantees `value` points at a live `T`.
    unsafe { (*value.cast::<T>()).hash(&mut state) }
}

unsafe fn render_value<T: fmt::Display>(
    value: *const u8,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    // SAFETY: caller guarantees `value` points at a live `T`.
    fmt::Display::fmt(unsafe { &*value.cast::<T>() }, f)
}
