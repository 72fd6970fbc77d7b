//! Handler module - event dispatch.
//!
//! Provides:
//! - [`OverloadSet`] - maps (object id, opcode) pairs to typed handlers
//! - [`visit`], [`visit_all`], [`dispatch_all`] - run parsed messages through a set
//! - [`DispatchContext`] - connection state handlers may use
//!
//! # Example
//!
//! ```
//! use std::collections::VecDeque;
//! use wlwire_client::handler::{dispatch_all, DispatchContext, OverloadSet};
//! use wlwire_client::protocol::{parse_messages, ObjectId, RequestBuffer};
//! use wlwire_client::protocols::wayland::{wl_callback, WlCallback};
//! use wlwire_client::RequestQueue;
//!
//! let callback: ObjectId<WlCallback> = ObjectId::from_raw(3);
//! let mut wire = RequestBuffer::new();
//! wire.append(callback, wl_callback::event::Done { callback_data: 42 }).unwrap();
//!
//! let mut data = None;
//! {
//!     let mut overloads = OverloadSet::new();
//!     overloads
//!         .add(callback, |done: wl_callback::event::Done| data = Some(done.callback_data))
//!         .unwrap();
//!
//!     let mut requests = RequestQueue::new();
//!     let mut fds = VecDeque::new();
//!     let mut ctx = DispatchContext::new(&mut requests, &mut fds);
//!     dispatch_all(parse_messages(wire.as_bytes()), &mut overloads, &mut ctx).unwrap();
//! }
//! assert_eq!(data, Some(42));
//! ```

mod overload_set;
mod visit;

pub use overload_set::{Overload, OverloadKey, OverloadSet, QueueOverload, TypedOverload};
pub use visit::{dispatch_all, visit, visit_all, DispatchContext};

pub(crate) use visit::log_skipped;
