//! Capability registry core.
//!
//! A capability is a unit marker type implementing [`Capability`]. A
//! container type declares a *set* of capabilities, written with the
//! [`caps!`](crate::caps!) macro, which desugars to a [`Cons`]/[`Nil`] list.
//!
//! The operation table has one *slot* per built-in capability plus a list
//! slot for extension capabilities. Rust coherence forbids asking "is this
//! tag the one I'm looking for" with overlapping blanket impls, so slot
//! membership is computed the other way round: every capability declares,
//! through the `FillXxx` associated types, which slot it fills — all other
//! slots pass the tail of the set through unchanged. Folding a set left to
//! right therefore produces concrete slot types (`CopyEntry` vs `()`), and
//! gated container operations bound on slot equality
//! (`S: CapSet<CopySlot = CopyEntry>`) simply fail to resolve when the
//! capability was not declared.

use core::marker::PhantomData;

use crate::store::StorageClass;

pub mod builtin;
pub mod find;

/// Anything that can sit in an operation-table slot: plain `Copy` data,
/// shareable process-wide for the process lifetime.
pub trait Slot: Copy + Send + Sync + 'static {}

impl<X: Copy + Send + Sync + 'static> Slot for X {}

/// One capability tag.
///
/// `Entry` is the per-concrete-type record of erased function pointers this
/// capability needs. The `FillXxx` associated types and their value-level
/// twins route the entry into its table slot; see the module docs.
pub trait Capability: 'static {
    /// Per-concrete-type operation entry for this capability.
    type Entry: Slot;

    type FillCopy<Tail: Slot>: Slot;
    type FillMov<Tail: Slot>: Slot;
    type FillEq<Tail: Slot>: Slot;
    type FillOrd<Tail: Slot>: Slot;
    type FillHash<Tail: Slot>: Slot;
    type FillCall<Tail: Slot>: Slot;
    type FillRender<Tail: Slot>: Slot;
    type FillExt<Tail: Slot>: Slot;

    // The fill methods take the already-built entry by value; the caller
    // ([`Storable`](crate::Storable)) is the one holding the
    // `ProvideEntry<T>` bound. A bound here would shadow the impl's own
    // associated-type definitions and break normalization of the fill
    // return types.
    fn fill_copy<Tail: Slot>(entry: Self::Entry, tail: Tail) -> Self::FillCopy<Tail>;

    fn fill_mov<Tail: Slot>(entry: Self::Entry, tail: Tail) -> Self::FillMov<Tail>;

    fn fill_eq<Tail: Slot>(entry: Self::Entry, tail: Tail) -> Self::FillEq<Tail>;

    fn fill_ord<Tail: Slot>(entry: Self::Entry, tail: Tail) -> Self::FillOrd<Tail>;

    fn fill_hash<Tail: Slot>(entry: Self::Entry, tail: Tail) -> Self::FillHash<Tail>;

    fn fill_call<Tail: Slot>(entry: Self::Entry, tail: Tail) -> Self::FillCall<Tail>;

    fn fill_render<Tail: Slot>(entry: Self::Entry, tail: Tail) -> Self::FillRender<Tail>;

    fn fill_ext<Tail: Slot>(entry: Self::Entry, tail: Tail) -> Self::FillExt<Tail>;
}

/// Entry factory: capability `Self` knows how to operate on concrete values
/// of type `T` under a given storage class.
///
/// Built-in capabilities implement this blanket-wise over the std trait they
/// bridge (`Clone` for `Copiable`, `Eq` for `Comparable`, ...), so
/// "`T` is storable under set `S`" decomposes into exactly the trait bounds
/// the declared capabilities demand.
pub trait ProvideEntry<T: 'static>: Capability {
    fn entry(class: StorageClass) -> Self::Entry;
}

/// The empty capability set: destruction only.
pub struct Nil;

/// A capability set node: `Head` plus the rest of the set.
pub struct Cons<Head, Rest>(PhantomData<fn() -> (Head, Rest)>);

/// A capability set, with its folded table-slot types.
pub trait CapSet: 'static {
    type CopySlot: Slot;
    type MovSlot: Slot;
    type EqSlot: Slot;
    type OrdSlot: Slot;
    type HashSlot: Slot;
    type CallSlot: Slot;
    type RenderSlot: Slot;
    type ExtSlot: Slot;
}

impl CapSet for Nil {
    type CopySlot = ();
    type MovSlot = ();
    type EqSlot = ();
    type OrdSlot = ();
    type HashSlot = ();
    type CallSlot = ();
    type RenderSlot = ();
    type ExtSlot = ();
}

impl<C: Capability, R: CapSet> CapSet for Cons<C, R> {
    type CopySlot = C::FillCopy<R::CopySlot>;
    type MovSlot = C::FillMov<R::MovSlot>;
    type EqSlot = C::FillEq<R::EqSlot>;
    type OrdSlot = C::FillOrd<R::OrdSlot>;
    type HashSlot = C::FillHash<R::HashSlot>;
    type CallSlot = C::FillCall<R::CallSlot>;
    type RenderSlot = C::FillRender<R::RenderSlot>;
    type ExtSlot = C::FillExt<R::ExtSlot>;
}

/// Builds a capability-set type from a list of tags.
///
/// ```
/// use any_caps::{Any, Comparable, Copiable, caps};
///
/// type Value = Any<caps![Copiable, Comparable]>;
/// let v = Value::new(13_i32);
/// assert_eq!(v, v.clone());
/// ```
#[macro_export]
macro_rules! caps {
    [$(,)?] => { $crate::Nil };
    [$head:ty $(, $rest:ty)* $(,)?] => {
        $crate::Cons<$head, $crate::caps![$($rest),*]>
    };
}

/// Identity folds for every slot a capability does not fill.
macro_rules! fill_passthrough {
    ($($slot:ident),* $(,)?) => {
        ::paste::paste! { $(
            type [<Fill $slot:camel>]<Tail: $crate::caps::Slot> = Tail;

            fn [<fill_ $slot>]<Tail: $crate::caps::Slot>(
                _entry: Self::Entry,
                tail: Tail,
            ) -> Tail {
                tail
            }
        )* }
    };
}

pub(crate) use fill_passthrough;
