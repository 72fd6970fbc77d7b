//! # wlwire-client
//!
//! Blocking client-side implementation of the Wayland wire protocol.
//!
//! The crate speaks the binary protocol directly over the compositor's Unix
//! socket: it encodes requests, passes descriptors as ancillary data,
//! frames incoming bytes into events and dispatches them to typed handlers.
//!
//! ## Architecture
//!
//! - **protocol**: 8-byte header, typed object ids, message descriptions,
//!   request encoder, event parser, receive buffer
//! - **handler**: (object id, opcode) keyed overload sets
//! - **transport**: the byte/descriptor capability and its Unix socket implementation
//! - **connection**: the blocking driver tying them together
//! - **protocols**: message tables for `wayland` and `xdg_shell`
//!
//! ## Example
//!
//! ```no_run
//! use wlwire_client::handler::OverloadSet;
//! use wlwire_client::protocol::ObjectId;
//! use wlwire_client::protocols::wayland::{wl_callback, wl_display, WlCallback, DISPLAY};
//! use wlwire_client::Connection;
//!
//! fn main() -> wlwire_client::Result<()> {
//!     let mut conn = Connection::connect_to_env()?;
//!
//!     let callback: ObjectId<WlCallback> = conn.reserve_object_id();
//!     conn.register_request(DISPLAY, wl_display::request::Sync { callback: callback.into() })?;
//!     conn.flush_registered_requests()?;
//!
//!     let mut overloads = OverloadSet::new();
//!     let serial = conn
//!         .recv_and_visit(&mut overloads)
//!         .until_with(callback, |done: wl_callback::event::Done, _| Ok(done.callback_data))?;
//!     println!("round trip done, serial {}", serial);
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod protocols;
pub mod transport;

pub use connection::{
    Connection, ConnectionBuilder, MessageBatch, RecvVisit, RequestQueue, DEFAULT_RECV_BLOCK_SIZE,
};
pub use error::{Result, WireError};
