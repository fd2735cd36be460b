//! Storage cell: the container's private state.
//!
//! A cell is an inline byte buffer plus occupancy metadata. Small values are
//! constructed in place inside the buffer; large (or over-aligned) values
//! live in their own heap allocation and the buffer holds the owning
//! pointer. The class is decided once per assignment and never changes while
//! the value is held.

use core::marker::PhantomData;
use core::mem::MaybeUninit;
use core::mem::{align_of, size_of};
use std::any::TypeId;

use crate::caps::CapSet;
use crate::table::{OpTable, Storable, shared_table};

pub(crate) const INLINE_WORDS: usize = 3;

/// Cell buffer: either the value's bytes (inline class) or the owning heap
/// pointer (boxed class).
pub(crate) type RawBuf = MaybeUninit<[usize; INLINE_WORDS]>;

/// Inline capacity in bytes (24 on 64-bit targets).
pub(crate) const INLINE_BYTES: usize = size_of::<[usize; INLINE_WORDS]>();
pub(crate) const INLINE_ALIGN: usize = align_of::<usize>();

/// Physical placement of a held value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageClass {
    /// Constructed in place inside the cell's inline buffer.
    Inline,
    /// Owned heap allocation; the cell records the pointer.
    Boxed,
}

/// Storage class a value of type `T` will be assigned.
///
/// Inline requires both size and alignment to fit the buffer; the buffer is
/// word-aligned, so over-aligned types go to the heap even when small.
pub const fn storage_class_of<T>() -> StorageClass {
    if size_of::<T>() <= INLINE_BYTES && align_of::<T>() <= INLINE_ALIGN {
        StorageClass::Inline
    } else {
        StorageClass::Boxed
    }
}

/// Metadata of a non-empty cell.
pub(crate) struct Occupied<S: CapSet> {
    pub(crate) table: &'static OpTable<S>,
    pub(crate) type_id: TypeId,
    pub(crate) class: StorageClass,
}

impl<S: CapSet> Clone for Occupied<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: CapSet> Copy for Occupied<S> {}

/// The cell itself. Invariant: `meta` is `Some` exactly when `buf` holds a
/// live value (or owning pointer) of the recorded type, and `meta.table` was
/// built for that type under that storage class.
pub(crate) struct StorageCell<S: CapSet> {
    pub(crate) meta: Option<Occupied<S>>,
    pub(crate) buf: RawBuf,
    // Erased contents may be !Send/!Sync; never let the cell be either.
    _marker: PhantomData<*mut ()>,
}

impl<S: CapSet> StorageCell<S> {
    pub(crate) const fn empty() -> Self {
        Self {
            meta: None,
            buf: RawBuf::uninit(),
            _marker: PhantomData,
        }
    }

    pub(crate) fn from_parts(meta: Occupied<S>, buf: RawBuf) -> Self {
        Self {
            meta: Some(meta),
            buf,
            _marker: PhantomData,
        }
    }

    /// Destroys the current value (if any), then stores `value` under its
    /// freshly decided storage class.
    pub(crate) fn put<T: Storable<S>>(&mut self, value: T) -> &mut T {
        self.clear();
        let class = storage_class_of::<T>();
        let table = shared_table::<T, S>();
        let slot = self.buf.as_mut_ptr();
        let ptr = match class {
            StorageClass::Inline => {
                let p = slot.cast::<T>();
                // SAFETY: class decision guarantees size and alignment fit
                // the buffer, and `clear` left it dead.
                unsafe { p.write(value) };
                p
            }
            StorageClass::Boxed => {
                let p = Box::into_raw(Box::new(value));
                // SAFETY: a pointer always fits the buffer.
                unsafe { slot.cast::<*mut T>().write(p) };
                p
            }
        };
        self.meta = Some(Occupied {
            table,
            type_id: TypeId::of::<T>(),
            class,
        });
        // SAFETY: just written; exclusively borrowed through `self`.
        unsafe { &mut *ptr }
    }

    /// Address of the live value. Meaningless while the cell is empty.
    pub(crate) fn value_ptr(&self) -> *const u8 {
        match self.meta {
            Some(Occupied {
                class: StorageClass::Boxed,
                ..
            }) => {
                // SAFETY: a boxed cell's buffer holds the heap pointer.
                unsafe { self.buf.as_ptr().cast::<*mut u8>().read() }
            }
            _ => self.buf.as_ptr().cast(),
        }
    }

    pub(crate) fn value_ptr_mut(&mut self) -> *mut u8 {
        match self.meta {
            Some(Occupied {
                class: StorageClass::Boxed,
                ..
            }) => {
                // SAFETY: as in `value_ptr`.
                unsafe { self.buf.as_ptr().cast::<*mut u8>().read() }
            }
            _ => self.buf.as_mut_ptr().cast(),
        }
    }

    /// Runs the destroy entry of the held value and leaves the cell empty.
    pub(crate) fn clear(&mut self) {
        if let Some(meta) = self.meta.take() {
            let ptr = match meta.class {
                StorageClass::Inline => self.buf.as_mut_ptr().cast::<u8>(),
                // SAFETY: boxed cell's buffer holds the heap pointer.
                StorageClass::Boxed => unsafe { self.buf.as_ptr().cast::<*mut u8>().read() },
            };
            // SAFETY: the cell held a live value of the type this table was
            // built for; metadata is already gone, so the bytes cannot be
            // reached again.
            unsafe { (meta.table.drop_value)(ptr) };
        }
    }
}

impl<S: CapSet> Drop for StorageCell<S> {
    fn drop(&mut self) {
        self.clear();
    }
}
