//! Operation tables and their process-wide registry.
//!
//! An [`OpTable`] is the erased dispatch record for one combination of
//! concrete type, storage class and capability set. Tables are built lazily
//! on first assignment and memoized for the process lifetime, so every
//! container holding a `u32` under the same set shares one table reference.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

use crate::caps::{CapSet, Capability, Cons, Nil, ProvideEntry};
use crate::store::{StorageClass, storage_class_of};

/// Shared dispatch table for one (type, storage class) pair under set `S`.
///
/// `drop_value` is always present: destruction is not capability-gated. The
/// remaining slots are whatever the set's fold produced, `()` where the
/// corresponding capability was not declared.
pub(crate) struct OpTable<S: CapSet> {
    pub(crate) drop_value: unsafe fn(*mut u8),
    pub(crate) type_name: &'static str,
    pub(crate) copy: S::CopySlot,
    #[allow(dead_code)]
    pub(crate) mov: S::MovSlot,
    pub(crate) eq: S::EqSlot,
    pub(crate) ord: S::OrdSlot,
    pub(crate) hash: S::HashSlot,
    pub(crate) call: S::CallSlot,
    pub(crate) render: S::RenderSlot,
    pub(crate) ext: S::ExtSlot,
}

impl<S: CapSet> OpTable<S> {
    fn build<T: Storable<S>>(class: StorageClass) -> Self {
        Self {
            drop_value: match class {
                StorageClass::Inline => drop_in_buf::<T>,
                StorageClass::Boxed => drop_boxed::<T>,
            },
            type_name: type_name::<T>(),
            copy: T::copy_slot(class),
            mov: T::mov_slot(class),
            eq: T::eq_slot(class),
            ord: T::ord_slot(class),
            hash: T::hash_slot(class),
            call: T::call_slot(class),
            render: T::render_slot(class),
            ext: T::ext_slot(class),
        }
    }
}

unsafe fn drop_in_buf<T>(ptr: *mut u8) {
    // SAFETY: caller guarantees `ptr` addresses a live inline `T`.
    unsafe { ptr.cast::<T>().drop_in_place() }
}

unsafe fn drop_boxed<T>(ptr: *mut u8) {
    // SAFETY: caller guarantees `ptr` is the owning heap pointer.
    drop(unsafe { Box::from_raw(ptr.cast::<T>()) });
}

/// `T` can be stored under capability set `S`: every declared capability can
/// produce its entry for `T`.
///
/// Implemented by recursion over the set; the slot methods fold each
/// capability's fill over the tail's slots. User code never calls them.
pub trait Storable<S: CapSet>: 'static + Sized {
    #[doc(hidden)]
    fn copy_slot(class: StorageClass) -> S::CopySlot;
    #[doc(hidden)]
    fn mov_slot(class: StorageClass) -> S::MovSlot;
    #[doc(hidden)]
    fn eq_slot(class: StorageClass) -> S::EqSlot;
    #[doc(hidden)]
    fn ord_slot(class: StorageClass) -> S::OrdSlot;
    #[doc(hidden)]
    fn hash_slot(class: StorageClass) -> S::HashSlot;
    #[doc(hidden)]
    fn call_slot(class: StorageClass) -> S::CallSlot;
    #[doc(hidden)]
    fn render_slot(class: StorageClass) -> S::RenderSlot;
    #[doc(hidden)]
    fn ext_slot(class: StorageClass) -> S::ExtSlot;
}

impl<T: 'static> Storable<Nil> for T {
    fn copy_slot(_class: StorageClass) {}
    fn mov_slot(_class: StorageClass) {}
    fn eq_slot(_class: StorageClass) {}
    fn ord_slot(_class: StorageClass) {}
    fn hash_slot(_class: StorageClass) {}
    fn call_slot(_class: StorageClass) {}
    fn render_slot(_class: StorageClass) {}
    fn ext_slot(_class: StorageClass) {}
}

impl<T, C, R> Storable<Cons<C, R>> for T
where
    C: Capability + ProvideEntry<T>,
    R: CapSet,
    T: Storable<R>,
{
    fn copy_slot(class: StorageClass) -> C::FillCopy<R::CopySlot> {
        C::fill_copy(<C as ProvideEntry<T>>::entry(class), <T as Storable<R>>::copy_slot(class))
    }

    fn mov_slot(class: StorageClass) -> C::FillMov<R::MovSlot> {
        C::fill_mov(<C as ProvideEntry<T>>::entry(class), <T as Storable<R>>::mov_slot(class))
    }

    fn eq_slot(class: StorageClass) -> C::FillEq<R::EqSlot> {
        C::fill_eq(<C as ProvideEntry<T>>::entry(class), <T as Storable<R>>::eq_slot(class))
    }

    fn ord_slot(class: StorageClass) -> C::FillOrd<R::OrdSlot> {
        C::fill_ord(<C as ProvideEntry<T>>::entry(class), <T as Storable<R>>::ord_slot(class))
    }

    fn hash_slot(class: StorageClass) -> C::FillHash<R::HashSlot> {
        C::fill_hash(<C as ProvideEntry<T>>::entry(class), <T as Storable<R>>::hash_slot(class))
    }

    fn call_slot(class: StorageClass) -> C::FillCall<R::CallSlot> {
        C::fill_call(<C as ProvideEntry<T>>::entry(class), <T as Storable<R>>::call_slot(class))
    }

    fn render_slot(class: StorageClass) -> C::FillRender<R::RenderSlot> {
        C::fill_render(<C as ProvideEntry<T>>::entry(class), <T as Storable<R>>::render_slot(class))
    }

    fn ext_slot(class: StorageClass) -> C::FillExt<R::ExtSlot> {
        C::fill_ext(<C as ProvideEntry<T>>::entry(class), <T as Storable<R>>::ext_slot(class))
    }
}

static TABLES: OnceLock<Mutex<HashMap<TypeId, &'static (dyn Any + Send + Sync)>>> =
    OnceLock::new();

/// The memoized table for `T` under set `S`.
///
/// Keyed by `TypeId::of::<(T, S)>()`, so the same type under two different
/// sets gets two tables. Built at most once per key; the winner is leaked
/// and every later caller gets the same `&'static` reference.
pub(crate) fn shared_table<T: Storable<S>, S: CapSet>() -> &'static OpTable<S> {
    let key = TypeId::of::<(T, S)>();
    let mut tables = TABLES
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    let erased: &'static (dyn Any + Send + Sync) = *tables.entry(key).or_insert_with(|| {
        let table = OpTable::<S>::build::<T>(storage_class_of::<T>());
        Box::leak(Box::new(table))
    });
    drop(tables);
    erased
        .downcast_ref::<OpTable<S>>()
        .unwrap_or_else(|| unreachable!("registry entry built for a different table type"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps;
    use crate::caps::builtin::{Comparable, Copiable};

    #[test]
    fn tables_are_shared_per_type_and_set() {
        type S = caps![Copiable, Comparable];
        let a = shared_table::<u32, S>();
        let b = shared_table::<u32, S>();
        assert!(std::ptr::eq(a, b));

        let other = shared_table::<i64, S>();
        assert!(!std::ptr::eq(
            a as *const OpTable<S>,
            other as *const OpTable<S>
        ));
    }

    #[test]
    fn same_type_under_different_sets_gets_different_tables() {
        let one = shared_table::<u32, caps![Copiable]>() as *const OpTable<caps![Copiable]>;
        let two = shared_table::<u32, caps![Comparable]>() as *const OpTable<caps![Comparable]>;
        assert_ne!(one as usize, two as usize);
    }
}
