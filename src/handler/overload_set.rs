//! Overload set for dispatching events by (object id, opcode).
//!
//! Each entry owns a strongly typed user callback behind one erased shape:
//! it decodes the raw argument span as its message type and forwards the
//! value. Keys are unique; a second registration for the same pair fails
//! and leaves the first in place.
//!
//! # Example
//!
//! ```
//! use wlwire_client::handler::OverloadSet;
//! use wlwire_client::protocol::ObjectId;
//! use wlwire_client::protocols::wayland::{wl_registry, WlRegistry};
//!
//! let registry: ObjectId<WlRegistry> = ObjectId::from_raw(2);
//! let mut names = Vec::new();
//!
//! let mut overloads = OverloadSet::new();
//! overloads
//!     .add(registry, |global: wl_registry::event::Global| names.push(global.name))
//!     .unwrap();
//! assert!(overloads.add(registry, |_: wl_registry::event::Global| {}).is_err());
//! assert_eq!(overloads.len(), 1);
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::marker::PhantomData;

use super::visit::DispatchContext;
use crate::connection::RequestQueue;
use crate::error::{Result, WireError};
use crate::protocol::{interpret_with_fds, Generic, Message, ObjectId, ParsedMessage};

/// Dispatch key: only the numeric id and opcode are known at runtime.
pub type OverloadKey = (ObjectId<Generic>, u16);

/// Erased handler invoked with the raw arguments of one message.
pub trait Overload {
    /// Decode `arguments` and run the user callback.
    fn call(&mut self, arguments: &[u8], ctx: &mut DispatchContext<'_>) -> Result<()>;
}

/// Wrapper that decodes the arguments before calling a plain callback.
pub struct TypedOverload<F, M> {
    handler: F,
    _message: PhantomData<fn(M)>,
}

impl<F, M> TypedOverload<F, M>
where
    F: FnMut(M),
    M: Message,
{
    /// Create a new typed overload.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _message: PhantomData,
        }
    }
}

impl<F, M> Overload for TypedOverload<F, M>
where
    F: FnMut(M),
    M: Message,
{
    fn call(&mut self, arguments: &[u8], ctx: &mut DispatchContext<'_>) -> Result<()> {
        let message = interpret_with_fds::<M>(arguments, &mut *ctx.fds)?;
        (self.handler)(message);
        Ok(())
    }
}

/// Wrapper for callbacks that also register requests.
pub struct QueueOverload<F, M> {
    handler: F,
    _message: PhantomData<fn(M)>,
}

impl<F, M> QueueOverload<F, M>
where
    F: FnMut(M, &mut RequestQueue) -> Result<()>,
    M: Message,
{
    /// Create a new request-registering overload.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _message: PhantomData,
        }
    }
}

impl<F, M> Overload for QueueOverload<F, M>
where
    F: FnMut(M, &mut RequestQueue) -> Result<()>,
    M: Message,
{
    fn call(&mut self, arguments: &[u8], ctx: &mut DispatchContext<'_>) -> Result<()> {
        let message = interpret_with_fds::<M>(arguments, &mut *ctx.fds)?;
        (self.handler)(message, &mut *ctx.requests)
    }
}

/// Map from (object id, opcode) to typed event handlers.
///
/// The lifetime lets handlers borrow local state for the duration of one
/// receive call.
#[derive(Default)]
pub struct OverloadSet<'a> {
    entries: HashMap<OverloadKey, Box<dyn Overload + 'a>>,
}

impl<'a> OverloadSet<'a> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Handle message `M` sent by `object` with `handler`.
    ///
    /// # Errors
    ///
    /// [`WireError::DuplicateOverload`] if `(object, M::OPCODE)` is taken.
    pub fn add<M, F>(&mut self, object: ObjectId<M::Interface>, handler: F) -> Result<()>
    where
        M: Message + 'a,
        F: FnMut(M) + 'a,
    {
        self.insert(object.generic(), M::OPCODE, Box::new(TypedOverload::new(handler)))
    }

    /// Like [`add`](Self::add), for handlers that answer with requests
    /// (ping/pong, binding globals as they are announced).
    ///
    /// Requests registered by the handler are flushed by the caller.
    pub fn add_with<M, F>(&mut self, object: ObjectId<M::Interface>, handler: F) -> Result<()>
    where
        M: Message + 'a,
        F: FnMut(M, &mut RequestQueue) -> Result<()> + 'a,
    {
        self.insert(object.generic(), M::OPCODE, Box::new(QueueOverload::new(handler)))
    }

    /// Register an already erased handler.
    pub fn insert(
        &mut self,
        object: ObjectId<Generic>,
        opcode: u16,
        overload: Box<dyn Overload + 'a>,
    ) -> Result<()> {
        match self.entries.entry((object, opcode)) {
            Entry::Occupied(_) => Err(WireError::DuplicateOverload {
                object_id: object.id(),
                opcode,
            }),
            Entry::Vacant(slot) => {
                slot.insert(overload);
                Ok(())
            }
        }
    }

    /// Look up the handler for `(object, opcode)`.
    pub fn resolve(
        &mut self,
        object: ObjectId<Generic>,
        opcode: u16,
    ) -> Option<&mut (dyn Overload + 'a)> {
        self.entries
            .get_mut(&(object, opcode))
            .map(|overload| overload.as_mut())
    }

    /// True when a handler exists for `(object, opcode)`.
    pub fn contains(&self, object: ObjectId<Generic>, opcode: u16) -> bool {
        self.entries.contains_key(&(object, opcode))
    }

    /// Run the handler for `message`, if any.
    ///
    /// Returns `Ok(false)` when no handler matches; that is not an error.
    pub fn dispatch(
        &mut self,
        message: &ParsedMessage<'_>,
        ctx: &mut DispatchContext<'_>,
    ) -> Result<bool> {
        match self.resolve(message.object_id, message.opcode) {
            Some(overload) => {
                overload.call(message.arguments, ctx)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for OverloadSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{parse_messages, NewId, RequestBuffer};
    use crate::protocols::wayland::{wl_callback, wl_registry, WlCallback, WlRegistry};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    fn encoded<M: Message>(object: ObjectId<M::Interface>, message: M) -> Vec<u8> {
        let mut buffer = RequestBuffer::new();
        buffer.append(object, message).unwrap();
        buffer.as_bytes().to_vec()
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let registry: ObjectId<WlRegistry> = ObjectId::from_raw(2);
        let first_calls = RefCell::new(0);
        let second_calls = RefCell::new(0);

        let mut overloads = OverloadSet::new();
        overloads
            .add(registry, |_: wl_registry::event::Global| {
                *first_calls.borrow_mut() += 1
            })
            .unwrap();

        let err = overloads
            .add(registry, |_: wl_registry::event::Global| {
                *second_calls.borrow_mut() += 1
            })
            .unwrap_err();
        assert!(matches!(
            err,
            WireError::DuplicateOverload {
                object_id: 2,
                opcode: 0
            }
        ));

        let bytes = encoded(
            registry,
            wl_registry::event::Global {
                name: 1,
                interface: "wl_shm".to_string(),
                version: 1,
            },
        );
        let message = parse_messages(&bytes).next().unwrap().unwrap();

        let mut requests = RequestQueue::new();
        let mut fds = VecDeque::new();
        let mut ctx = DispatchContext::new(&mut requests, &mut fds);
        assert!(overloads.dispatch(&message, &mut ctx).unwrap());
        drop(overloads);

        assert_eq!(*first_calls.borrow(), 1);
        assert_eq!(*second_calls.borrow(), 0);
    }

    #[test]
    fn test_same_opcode_on_other_object_is_distinct() {
        let first: ObjectId<WlCallback> = ObjectId::from_raw(3);
        let second: ObjectId<WlCallback> = ObjectId::from_raw(4);

        let mut overloads = OverloadSet::new();
        overloads.add(first, |_: wl_callback::event::Done| {}).unwrap();
        overloads.add(second, |_: wl_callback::event::Done| {}).unwrap();

        assert_eq!(overloads.len(), 2);
        assert!(overloads.contains(first.generic(), 0));
        assert!(overloads.resolve(ObjectId::from_raw(5), 0).is_none());
    }

    #[test]
    fn test_dispatch_unmatched_returns_false() {
        let mut overloads = OverloadSet::new();
        let bytes = encoded(
            ObjectId::<WlCallback>::from_raw(9),
            wl_callback::event::Done { callback_data: 1 },
        );
        let message = parse_messages(&bytes).next().unwrap().unwrap();

        let mut requests = RequestQueue::new();
        let mut fds = VecDeque::new();
        let mut ctx = DispatchContext::new(&mut requests, &mut fds);
        assert!(!overloads.dispatch(&message, &mut ctx).unwrap());
    }

    #[test]
    fn test_add_with_registers_requests() {
        let registry: ObjectId<WlRegistry> = ObjectId::from_raw(2);
        let mut overloads = OverloadSet::new();
        overloads
            .add_with(
                registry,
                |global: wl_registry::event::Global, queue: &mut RequestQueue| {
                    let id: ObjectId = queue.reserve_object_id();
                    queue.register_request(
                        registry,
                        wl_registry::request::Bind {
                            name: global.name,
                            interface: global.interface,
                            version: global.version,
                            id: NewId::from_raw(id.id()),
                        },
                    )
                },
            )
            .unwrap();

        let bytes = encoded(
            registry,
            wl_registry::event::Global {
                name: 3,
                interface: "wl_seat".to_string(),
                version: 7,
            },
        );
        let message = parse_messages(&bytes).next().unwrap().unwrap();

        let mut requests = RequestQueue::new();
        let mut fds = VecDeque::new();
        let mut ctx = DispatchContext::new(&mut requests, &mut fds);
        assert!(overloads.dispatch(&message, &mut ctx).unwrap());

        assert!(requests.has_registered_requests());
        assert_eq!(requests.peek_next_id(), 3);
    }

    #[test]
    fn test_decode_failure_propagates() {
        let registry: ObjectId<WlRegistry> = ObjectId::from_raw(2);
        let mut overloads = OverloadSet::new();
        overloads
            .add(registry, |_: wl_registry::event::Global| {})
            .unwrap();

        // Global header with an empty payload.
        let bytes = crate::protocol::Header::new(2, 0, 8).encode();
        let message = parse_messages(&bytes).next().unwrap().unwrap();

        let mut requests = RequestQueue::new();
        let mut fds = VecDeque::new();
        let mut ctx = DispatchContext::new(&mut requests, &mut fds);
        assert!(matches!(
            overloads.dispatch(&message, &mut ctx),
            Err(WireError::Decode(_))
        ));
    }
}
