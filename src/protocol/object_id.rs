//! Typed object handles and id allocation.
//!
//! Every protocol object is addressed by a 32-bit id. The id carries a
//! phantom interface tag so a surface id cannot be passed where a registry
//! id is expected, at no runtime cost. [`Generic`] is the type-erased tag
//! used by everything that only sees the wire (parser, dispatch keys).
//!
//! Conversions follow the protocol's object/new-id rules:
//!
//! - `ObjectId<I>` converts into `NewId<I>`.
//! - `ObjectId<I>` with a concrete `I` converts into `NewId<Generic>`.
//! - `ObjectId<Generic>` does not convert into a concrete `NewId<I>`:
//!
//! ```compile_fail
//! use wlwire_client::protocol::{Generic, NewId, ObjectId};
//! use wlwire_client::protocols::wayland::WlSurface;
//!
//! let erased: ObjectId<Generic> = ObjectId::from_raw(7);
//! let _surface: NewId<WlSurface> = erased.into();
//! ```
//!
//! - `NewId` never converts back into `ObjectId`:
//!
//! ```compile_fail
//! use wlwire_client::protocol::{NewId, ObjectId};
//! use wlwire_client::protocols::wayland::WlSurface;
//!
//! let new_id: NewId<WlSurface> = NewId::from_raw(7);
//! let _object: ObjectId<WlSurface> = new_id.into();
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use super::wire_format::FIRST_CLIENT_OBJECT_ID;

/// A protocol interface (object type) such as `wl_surface`.
///
/// Implemented by uninhabited marker types, usually through
/// [`wire_interface!`](crate::wire_interface).
pub trait Interface: 'static {
    /// Interface name as it appears on the wire (`wl_registry.bind`).
    const NAME: &'static str;
    /// Highest interface version these message tables describe.
    const VERSION: u32;
}

/// Type-erased interface tag.
///
/// Does not implement [`Interface`].
#[derive(Debug)]
pub enum Generic {}

/// Handle to an existing protocol object.
pub struct ObjectId<I = Generic> {
    id: u32,
    _interface: PhantomData<fn() -> I>,
}

/// Id the peer is asked to create an object under.
pub struct NewId<I = Generic> {
    id: u32,
    _interface: PhantomData<fn() -> I>,
}

macro_rules! impl_id_common {
    ($name:ident) => {
        impl<I> $name<I> {
            /// Wrap a raw numeric id.
            #[inline]
            pub const fn from_raw(id: u32) -> Self {
                Self {
                    id,
                    _interface: PhantomData,
                }
            }

            /// The numeric id.
            #[inline]
            pub const fn id(self) -> u32 {
                self.id
            }

            /// Drop the interface tag.
            #[inline]
            pub const fn generic(self) -> $name<Generic> {
                $name::from_raw(self.id)
            }

            /// Attach an interface tag to a raw id.
            ///
            /// The caller vouches that the object really has interface `J`.
            #[inline]
            pub const fn cast<J>(self) -> $name<J> {
                $name::from_raw(self.id)
            }
        }

        impl<I> Clone for $name<I> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<I> Copy for $name<I> {}

        impl<I, J> PartialEq<$name<J>> for $name<I> {
            fn eq(&self, other: &$name<J>) -> bool {
                self.id == other.id
            }
        }

        impl<I> Eq for $name<I> {}

        impl<I> PartialEq<u32> for $name<I> {
            fn eq(&self, other: &u32) -> bool {
                self.id == *other
            }
        }

        impl<I> Hash for $name<I> {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }

        impl<I> fmt::Debug for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.id).finish()
            }
        }

        impl<I> fmt::Display for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.id)
            }
        }
    };
}

impl_id_common!(ObjectId);
impl_id_common!(NewId);

impl<I> From<ObjectId<I>> for NewId<I> {
    fn from(object: ObjectId<I>) -> Self {
        NewId::from_raw(object.id)
    }
}

impl<I: Interface> From<ObjectId<I>> for NewId<Generic> {
    fn from(object: ObjectId<I>) -> Self {
        NewId::from_raw(object.id)
    }
}

/// Monotonic allocator for client-side object ids.
///
/// Ids start at 2; id 1 is the display. The peer requires new ids to appear
/// on the wire in increasing order, so callers must register the creating
/// requests in the same order they reserve ids.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    /// Create an allocator whose first id is 2.
    pub fn new() -> Self {
        Self {
            next: FIRST_CLIENT_OBJECT_ID,
        }
    }

    /// Reserve the next id, tagged with interface `I`.
    ///
    /// # Example
    ///
    /// ```
    /// use wlwire_client::protocol::{Generic, IdAllocator, ObjectId};
    ///
    /// let mut ids = IdAllocator::new();
    /// let first: ObjectId<Generic> = ids.reserve();
    /// let second: ObjectId<Generic> = ids.reserve();
    /// assert_eq!(first.id(), 2);
    /// assert_eq!(second.id(), 3);
    /// ```
    pub fn reserve<I>(&mut self) -> ObjectId<I> {
        let id = self.next;
        self.next += 1;
        ObjectId::from_raw(id)
    }

    /// The id the next call to [`reserve`](Self::reserve) returns.
    pub fn peek_next(&self) -> u32 {
        self.next
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    enum Foo {}
    impl Interface for Foo {
        const NAME: &'static str = "foo";
        const VERSION: u32 = 1;
    }

    enum Bar {}
    impl Interface for Bar {
        const NAME: &'static str = "bar";
        const VERSION: u32 = 2;
    }

    #[test]
    fn test_equality_ignores_tag() {
        let generic: ObjectId<Generic> = ObjectId::from_raw(7);
        let foo: ObjectId<Foo> = ObjectId::from_raw(7);
        let bar: ObjectId<Bar> = ObjectId::from_raw(7);

        assert_eq!(generic, foo);
        assert_eq!(generic, bar);
        assert_eq!(foo, bar);
        assert_ne!(foo, ObjectId::<Foo>::from_raw(8));
        assert_eq!(foo, 7u32);
    }

    #[test]
    fn test_object_to_new_id_conversions() {
        let foo: ObjectId<Foo> = ObjectId::from_raw(11);

        let typed: NewId<Foo> = foo.into();
        let erased: NewId<Generic> = foo.into();
        assert_eq!(typed.id(), 11);
        assert_eq!(erased.id(), 11);

        let generic: ObjectId<Generic> = ObjectId::from_raw(12);
        let generic_new: NewId<Generic> = generic.into();
        assert_eq!(generic_new, 12u32);
    }

    #[test]
    fn test_generic_and_cast_keep_value() {
        let foo: ObjectId<Foo> = ObjectId::from_raw(5);
        assert_eq!(foo.generic().id(), 5);
        let back: ObjectId<Foo> = foo.generic().cast();
        assert_eq!(back, foo);
    }

    #[test]
    fn test_hash_matches_equality() {
        let mut set = HashSet::new();
        set.insert(ObjectId::<Generic>::from_raw(3));
        assert!(set.contains(&ObjectId::<Foo>::from_raw(3).generic()));
        assert!(!set.contains(&ObjectId::<Generic>::from_raw(4)));
    }

    #[test]
    fn test_allocator_starts_at_two_and_increments() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.peek_next(), 2);

        let a: ObjectId<Foo> = ids.reserve();
        let b: ObjectId<Bar> = ids.reserve();
        let c: ObjectId = ids.reserve();

        assert_eq!(a.id(), 2);
        assert_eq!(b.id(), 3);
        assert_eq!(c.id(), 4);
        assert_eq!(ids.peek_next(), 5);
    }

    #[test]
    fn test_debug_and_display() {
        let foo: ObjectId<Foo> = ObjectId::from_raw(9);
        assert_eq!(format!("{:?}", foo), "ObjectId(9)");
        assert_eq!(format!("{}", foo), "#9");
        let new_id: NewId<Foo> = foo.into();
        assert_eq!(format!("{:?}", new_id), "NewId(9)");
    }
}
