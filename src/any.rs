//! The capability-gated container.

use core::any::{TypeId, type_name};
use core::fmt;
use core::hash::{Hash, Hasher};
use core::mem;
use std::hash::DefaultHasher;

use crate::caps::builtin::{
    CallEntry, CopyEntry, EqEntry, HashEntry, Invocable, MoveEntry, Movable, OrdEntry, RenderEntry,
};
use crate::caps::find::FindExt;
use crate::caps::{CapSet, Capability, Nil};
use crate::error::CastError;
use crate::store::{RawBuf, StorageCell, StorageClass};
use crate::table::Storable;

/// Hash of an empty container. Arbitrary fixed prime so empties collide with
/// each other and (almost) nothing else.
const EMPTY_HASH: u64 = 7927;

/// A type-erased value container that supports exactly the operations its
/// capability set `S` declares.
///
/// `Any<caps![Copiable, Comparable]>` can be cloned and compared;
/// `Any<caps![Renderable]>` can be displayed but not cloned. Operations
/// absent from the set do not exist at compile time:
///
/// ```compile_fail
/// use any_caps::{Any, Comparable, caps};
///
/// let a = Any::<caps![Comparable]>::new(1_i32);
/// let b = a.clone(); // no `Copiable` in the set
/// ```
///
/// ```compile_fail
/// use any_caps::{Any, Copiable, caps};
///
/// let a = Any::<caps![Copiable]>::new(1_i32);
/// let b = Any::<caps![Copiable]>::new(1_i32);
/// assert_eq!(a, b); // no `Comparable` in the set
/// ```
///
/// Any `'static` type satisfying the set's requirements can be stored, and
/// the concrete type may change from one assignment to the next:
///
/// ```
/// use any_caps::{Any, Renderable, caps};
///
/// let mut v = Any::<caps![Renderable]>::new(13_i32);
/// assert_eq!(v.to_string(), "13");
/// v.set("thirteen");
/// assert_eq!(v.to_string(), "thirteen");
/// ```
pub struct Any<S: CapSet = Nil> {
    cell: StorageCell<S>,
}

impl<S: CapSet> Any<S> {
    /// An empty container. Allocation-free.
    pub const fn empty() -> Self {
        Self {
            cell: StorageCell::empty(),
        }
    }

    /// A container holding `value`.
    pub fn new<T: Storable<S>>(value: T) -> Self {
        let mut this = Self::empty();
        this.cell.put(value);
        this
    }

    /// Replaces the contents with `value`, destroying the previous value
    /// first. Returns a reference to the freshly stored value.
    pub fn set<T: Storable<S>>(&mut self, value: T) -> &mut T {
        self.cell.put(value)
    }

    /// Replaces the contents with the value `make` produces.
    pub fn emplace<T: Storable<S>>(&mut self, make: impl FnOnce() -> T) -> &mut T {
        self.cell.put(make())
    }

    /// Destroys the contents, leaving the container empty. No-op when
    /// already empty.
    pub fn reset(&mut self) {
        self.cell.clear();
    }

    pub fn has_value(&self) -> bool {
        self.cell.meta.is_some()
    }

    /// Type id of the held value, `None` when empty.
    pub fn type_id(&self) -> Option<TypeId> {
        self.cell.meta.map(|m| m.type_id)
    }

    /// Diagnostic name of the held value's type, `None` when empty.
    pub fn type_name(&self) -> Option<&'static str> {
        self.cell.meta.map(|m| m.table.type_name)
    }

    /// Where the held value lives, `None` when empty.
    pub fn storage_class(&self) -> Option<StorageClass> {
        self.cell.meta.map(|m| m.class)
    }

    /// Whether the container currently holds a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id() == Some(TypeId::of::<T>())
    }

    /// Borrows the held value as `T`, `None` on empty or type mismatch.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        if self.is::<T>() {
            // SAFETY: type just checked; cell invariant says the value is live.
            Some(unsafe { &*self.cell.value_ptr().cast::<T>() })
        } else {
            None
        }
    }

    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        if self.is::<T>() {
            // SAFETY: as in `downcast_ref`; `&mut self` gives exclusivity.
            Some(unsafe { &mut *self.cell.value_ptr_mut().cast::<T>() })
        } else {
            None
        }
    }

    /// Like [`downcast_ref`](Self::downcast_ref), but reports *why* the
    /// borrow failed.
    pub fn try_ref<T: 'static>(&self) -> Result<&T, CastError> {
        let meta = self.cell.meta.as_ref().ok_or(CastError::Empty)?;
        if meta.type_id != TypeId::of::<T>() {
            return Err(CastError::Mismatch {
                stored: meta.table.type_name,
                requested: type_name::<T>(),
            });
        }
        // SAFETY: type just checked; cell invariant says the value is live.
        Ok(unsafe { &*self.cell.value_ptr().cast::<T>() })
    }

    pub fn try_mut<T: 'static>(&mut self) -> Result<&mut T, CastError> {
        let meta = self.cell.meta.as_ref().ok_or(CastError::Empty)?;
        if meta.type_id != TypeId::of::<T>() {
            return Err(CastError::Mismatch {
                stored: meta.table.type_name,
                requested: type_name::<T>(),
            });
        }
        // SAFETY: as above, with exclusivity from `&mut self`.
        Ok(unsafe { &mut *self.cell.value_ptr_mut().cast::<T>() })
    }

    /// Borrows the held value as `T`.
    ///
    /// # Panics
    ///
    /// When the container is empty or holds another type.
    pub fn expect_ref<T: 'static>(&self) -> &T {
        match self.try_ref() {
            Ok(value) => value,
            Err(CastError::Empty) => panic!("cannot cast: container is empty"),
            Err(CastError::Mismatch { stored, .. }) => {
                panic!("cannot cast `{stored}` to `{}`", type_name::<T>())
            }
        }
    }

    pub fn expect_mut<T: 'static>(&mut self) -> &mut T {
        match self.try_mut() {
            Ok(value) => value,
            Err(CastError::Empty) => panic!("cannot cast: container is empty"),
            Err(CastError::Mismatch { stored, .. }) => {
                panic!("cannot cast `{stored}` to `{}`", type_name::<T>())
            }
        }
    }

    /// A copy of the held value.
    ///
    /// Clones through the concrete `T`, so it needs no `Copiable` in the
    /// set.
    ///
    /// # Panics
    ///
    /// When the container is empty or holds another type.
    pub fn value<T: Clone + 'static>(&self) -> T {
        self.expect_ref::<T>().clone()
    }

    /// A copy of the held value, or `default` when the container is empty
    /// or holds another type.
    pub fn value_or<T: Clone + 'static>(&self, default: T) -> T {
        match self.downcast_ref::<T>() {
            Some(value) => value.clone(),
            None => default,
        }
    }

    #[doc(hidden)]
    pub fn __ext_dispatch<E, I>(&self) -> Option<(&'static E::Entry, *const u8)>
    where
        E: Capability,
        S::ExtSlot: FindExt<E, I>,
    {
        self.cell
            .meta
            .map(|m| (m.table.ext.find_ext(), self.cell.value_ptr()))
    }
}

impl<S: CapSet<MovSlot = MoveEntry>> Any<S> {
    /// Exchanges the contents of two containers of the same set.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.cell, &mut other.cell);
    }

    /// Moves the contents out, leaving this container empty.
    pub fn take(&mut self) -> Self {
        Self {
            cell: mem::replace(&mut self.cell, StorageCell::empty()),
        }
    }

    /// Moves the held value out as a `T`, leaving the container empty on
    /// success. On mismatch the value stays put.
    pub fn try_take<T: 'static>(&mut self) -> Result<T, CastError> {
        let meta = self.cell.meta.ok_or(CastError::Empty)?;
        if meta.type_id != TypeId::of::<T>() {
            return Err(CastError::Mismatch {
                stored: meta.table.type_name,
                requested: type_name::<T>(),
            });
        }
        self.cell.meta = None;
        // SAFETY: metadata is gone, so these bytes are read exactly once.
        let value = match meta.class {
            StorageClass::Inline => unsafe { self.cell.buf.as_ptr().cast::<T>().read() },
            StorageClass::Boxed => {
                let ptr = unsafe { self.cell.buf.as_ptr().cast::<*mut T>().read() };
                unsafe { *Box::from_raw(ptr) }
            }
        };
        Ok(value)
    }
}

impl<S: CapSet<HashSlot = HashEntry>> Any<S> {
    /// Hash of the held value under the default hasher, stable within one
    /// process run. Empty containers all hash alike.
    pub fn hash_value(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl<S: CapSet, A, R> Any<S>
where
    A: 'static,
    R: 'static,
    S: CapSet<CallSlot = CallEntry<A, R>>,
{
    /// Invokes the held callable with `args`.
    ///
    /// # Panics
    ///
    /// When the container is empty.
    pub fn call(&self, args: A) -> R {
        let meta = self
            .cell
            .meta
            .as_ref()
            .unwrap_or_else(|| panic!("called an empty container"));
        // SAFETY: cell invariant; the entry was built for the held type.
        unsafe { (meta.table.call.invoke)(self.cell.value_ptr(), args) }
    }
}

impl<S: CapSet> Default for Any<S> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<S: CapSet<CopySlot = CopyEntry>> Clone for Any<S> {
    fn clone(&self) -> Self {
        match self.cell.meta {
            None => Self::empty(),
            Some(meta) => {
                let mut buf = RawBuf::uninit();
                // SAFETY: source is live; `duplicate` was built for the
                // held type under `meta.class` and initializes `buf`
                // accordingly.
                unsafe { (meta.table.copy.duplicate)(self.cell.value_ptr(), &mut buf) };
                Self {
                    cell: StorageCell::from_parts(meta, buf),
                }
            }
        }
    }
}

impl<S: CapSet<EqSlot = EqEntry>> PartialEq for Any<S> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.cell.meta, &other.cell.meta) {
            (None, None) => true,
            (Some(a), Some(b)) if a.type_id == b.type_id => {
                // SAFETY: both live, same type, entry built for that type.
                unsafe { (a.table.eq.equal)(self.cell.value_ptr(), other.cell.value_ptr()) }
            }
            _ => false,
        }
    }
}

impl<S: CapSet<EqSlot = EqEntry>> Eq for Any<S> {}

impl<S: CapSet<OrdSlot = OrdEntry, EqSlot = EqEntry>> PartialOrd for Any<S> {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<S: CapSet<OrdSlot = OrdEntry, EqSlot = EqEntry>> Ord for Any<S> {
    /// Empty sorts before everything; values of different types sort by
    /// type id (arbitrary but total and consistent within a process run);
    /// values of the same type sort by their own ordering.
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        match (&self.cell.meta, &other.cell.meta) {
            (None, None) => core::cmp::Ordering::Equal,
            (None, Some(_)) => core::cmp::Ordering::Less,
            (Some(_), None) => core::cmp::Ordering::Greater,
            (Some(a), Some(b)) => {
                if a.type_id != b.type_id {
                    return a.type_id.cmp(&b.type_id);
                }
                // SAFETY: both live, same type, entry built for that type.
                unsafe { (a.table.ord.compare)(self.cell.value_ptr(), other.cell.value_ptr()) }
            }
        }
    }
}

impl<S: CapSet<HashSlot = HashEntry>> Hash for Any<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.cell.meta {
            None => state.write_u64(EMPTY_HASH),
            Some(meta) => {
                // Type id first, so equal byte patterns of different types
                // do not collide deliberately.
                meta.type_id.hash(state);
                // SAFETY: value is live; entry built for its type.
                unsafe { (meta.table.hash.feed)(self.cell.value_ptr(), state) };
            }
        }
    }
}

impl<S: CapSet<RenderSlot = RenderEntry>> fmt::Display for Any<S> {
    /// An empty container renders as nothing.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.meta {
            None => Ok(()),
            // SAFETY: value is live; entry built for its type.
            Some(meta) => unsafe { (meta.table.render.render)(self.cell.value_ptr(), f) },
        }
    }
}

impl<S: CapSet> fmt::Debug for Any<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.meta {
            None => f.write_str("Any(empty)"),
            Some(meta) => f
                .debug_struct("Any")
                .field("type", &meta.table.type_name)
                .field("storage", &meta.class)
                .finish_non_exhaustive(),
        }
    }
}

/// A move-only type-erased callable, the type-erasure idiom for closures
/// that capture non-clonable state.
///
/// ```
/// use any_caps::UniqueFunction;
///
/// let greeting = Box::new(String::from("hello"));
/// let f = UniqueFunction::<(usize,), String>::new(move |n: usize| {
///     format!("{greeting} x{n}")
/// });
/// assert_eq!(f.call((3,)), "hello x3");
/// ```
pub type UniqueFunction<A, R> = Any<crate::caps![Movable, Invocable<A, R>]>;
