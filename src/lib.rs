//! Type-erased value containers that pay only for the capabilities they
//! declare.
//!
//! [`Any<S>`] holds a value of any `'static` type, like `Box<dyn Any>`, but
//! the set `S` decides which operations exist on the *container*: cloning,
//! equality, ordering, hashing, invocation, rendering, explicit moves. Each
//! declared capability contributes one entry to a dispatch table shared by
//! every container holding the same concrete type, so a container is just
//! an inline buffer (three words; larger values spill to the heap) plus one
//! table pointer.
//!
//! ```
//! use any_caps::{Any, Copiable, Orderable, Renderable, caps};
//!
//! type Value = Any<caps![Copiable, Orderable, Renderable]>;
//!
//! let mut values = vec![Value::new(25), Value::new(-15), Value::new(3)];
//! values.sort();
//! let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
//! assert_eq!(rendered, ["-15", "3", "25"]);
//!
//! let copy = values[0].clone();
//! assert_eq!(copy.value::<i32>(), -15);
//! ```
//!
//! Undeclared operations are compile errors, not runtime errors; see the
//! [`Any`] docs. New capabilities are declared with [`member_capability!`]
//! and [`free_capability!`].

mod any;
pub mod caps;
mod error;
mod store;
mod table;

pub use crate::any::{Any, UniqueFunction};
pub use crate::caps::builtin::{
    CallEntry, Comparable, Copiable, CopyEntry, Destructible, EqEntry, HashEntry, Hashable,
    Invocable, Movable, MoveEntry, OrdEntry, Orderable, RenderEntry, Renderable,
};
pub use crate::caps::find::{ExtNode, FindExt, Here, There};
pub use crate::caps::{CapSet, Capability, Cons, Nil, ProvideEntry, Slot};
pub use crate::error::CastError;
pub use crate::store::{StorageClass, storage_class_of};
pub use crate::table::Storable;

pub use macros::{free_capability, member_capability};

/// Everything a typical user needs in scope.
pub mod prelude {
    pub use crate::{
        Any, CapSet, Capability, CastError, Comparable, Copiable, Destructible, Hashable,
        Invocable, Movable, Orderable, Renderable, Storable, UniqueFunction, caps,
        free_capability, member_capability,
    };
}
