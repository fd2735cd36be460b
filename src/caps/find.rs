//! Locating an extension capability's entry inside the ext slot.
//!
//! Extension capabilities do not get a dedicated table slot; they fill the
//! ext slot with a nested tuple list, `(ExtNode<E1>, (ExtNode<E2>, ()))`.
//! [`FindExt`] walks that list at compile time. The index parameter `I`
//! ([`Here`] / [`There`]) is never written by hand: the compiler infers it
//! while resolving the bound, which is what lets the same extension appear
//! at any depth of the declared set.

use core::marker::PhantomData;

use crate::caps::{Capability, Slot};

/// One link of the ext-slot list: the entry of extension capability `E`.
pub struct ExtNode<E: Capability> {
    pub entry: E::Entry,
}

impl<E: Capability> Clone for ExtNode<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: Capability> Copy for ExtNode<E> {}

/// Index marker: the entry is the head of the list.
pub struct Here;

/// Index marker: the entry is somewhere in the tail, at index `I`.
pub struct There<I>(PhantomData<I>);

/// Compile-time search of the ext-slot list for `E`'s entry.
pub trait FindExt<E: Capability, I> {
    fn find_ext(&self) -> &E::Entry;
}

impl<E: Capability, Tail: Slot> FindExt<E, Here> for (ExtNode<E>, Tail) {
    fn find_ext(&self) -> &E::Entry {
        &self.0.entry
    }
}

impl<E, Other, Tail, I> FindExt<E, There<I>> for (ExtNode<Other>, Tail)
where
    E: Capability,
    Other: Capability,
    Tail: Slot + FindExt<E, I>,
{
    fn find_ext(&self) -> &E::Entry {
        self.1.find_ext()
    }
}
