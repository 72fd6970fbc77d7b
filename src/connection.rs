//! Connection driver.
//!
//! A [`Connection`] owns the transport, the outbound [`RequestQueue`] and the
//! inbound [`RecvBuffer`]. Everything is blocking and single threaded:
//!
//! 1. Register requests, reserving ids for the objects they create
//! 2. Flush them to the compositor
//! 3. Receive and dispatch events until an awaited event arrives
//!
//! # Example
//!
//! ```no_run
//! use wlwire_client::handler::OverloadSet;
//! use wlwire_client::protocol::ObjectId;
//! use wlwire_client::protocols::wayland::{
//!     wl_callback, wl_display, wl_registry, WlCallback, WlRegistry, DISPLAY,
//! };
//! use wlwire_client::Connection;
//!
//! fn main() -> wlwire_client::Result<()> {
//!     let mut conn = Connection::connect_to_env()?;
//!
//!     let registry: ObjectId<WlRegistry> = conn.reserve_object_id();
//!     conn.register_request(DISPLAY, wl_display::request::GetRegistry { registry: registry.into() })?;
//!     let callback: ObjectId<WlCallback> = conn.reserve_object_id();
//!     conn.register_request(DISPLAY, wl_display::request::Sync { callback: callback.into() })?;
//!     conn.flush_registered_requests()?;
//!
//!     let mut globals = Vec::new();
//!     {
//!         let mut overloads = OverloadSet::new();
//!         overloads.add(registry, |global: wl_registry::event::Global| globals.push(global))?;
//!         conn.recv_and_visit(&mut overloads)
//!             .until::<wl_callback::event::Done>(callback)?;
//!     }
//!
//!     for global in &globals {
//!         println!("{} v{}", global.interface, global.version);
//!     }
//!     Ok(())
//! }
//! ```

use std::collections::VecDeque;
use std::io;
use std::os::fd::{AsFd, OwnedFd};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

use bytes::Bytes;
use tracing::{debug, trace};

use crate::error::{Result, WireError};
use crate::handler::{log_skipped, visit, visit_all, DispatchContext, OverloadSet};
use crate::protocol::{
    interpret_with_fds, parse_messages, Generic, IdAllocator, Message, MessageIter, ObjectId,
    ParsedMessage, RecvBuffer, RequestBuffer,
};
use crate::transport::{self, Transport};

/// Bytes requested from the transport per read.
pub const DEFAULT_RECV_BLOCK_SIZE: usize = 1000;

/// Outbound side of a connection: id allocation plus encoded requests.
///
/// Handlers registered with [`OverloadSet::add_with`] receive it so they can
/// answer events while the connection is blocked receiving.
#[derive(Debug, Default)]
pub struct RequestQueue {
    ids: IdAllocator,
    buffer: RequestBuffer,
}

impl RequestQueue {
    /// Create a queue whose first reserved id is 2.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next client object id.
    ///
    /// Requests creating objects must be registered in the order their ids
    /// were reserved; the compositor rejects ids that go backwards.
    pub fn reserve_object_id<I>(&mut self) -> ObjectId<I> {
        self.ids.reserve()
    }

    /// The id the next reservation returns.
    pub fn peek_next_id(&self) -> u32 {
        self.ids.peek_next()
    }

    /// Encode `message` for `object`; it is sent by the next flush.
    pub fn register_request<M: Message>(
        &mut self,
        object: ObjectId<M::Interface>,
        message: M,
    ) -> Result<()> {
        self.buffer.append(object, message)
    }

    /// True when a flush would send something.
    pub fn has_registered_requests(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Encoded requests not yet flushed.
    pub fn pending(&self) -> &RequestBuffer {
        &self.buffer
    }

    fn take(&mut self) -> (Bytes, Vec<OwnedFd>) {
        self.buffer.take()
    }
}

/// Builder for configuring and creating a [`Connection`].
#[derive(Debug, Clone)]
pub struct ConnectionBuilder {
    recv_block_size: usize,
    socket_path: Option<PathBuf>,
}

impl ConnectionBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self {
            recv_block_size: DEFAULT_RECV_BLOCK_SIZE,
            socket_path: None,
        }
    }

    /// Set the number of bytes requested per read.
    ///
    /// Default: 1000
    pub fn recv_block_size(mut self, size: usize) -> Self {
        self.recv_block_size = size.max(1);
        self
    }

    /// Connect to `path` instead of locating the socket from the
    /// environment.
    pub fn socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = Some(path.into());
        self
    }

    /// Open the compositor socket.
    ///
    /// Fails with [`WireError::MissingRuntimeDir`] before any I/O if no path
    /// was set and the environment does not name one.
    pub fn connect(self) -> Result<Connection<UnixStream>> {
        let path = match &self.socket_path {
            Some(path) => path.clone(),
            None => transport::socket_path_from_env()?,
        };
        let stream = transport::connect(&path)?;
        Ok(self.build(stream))
    }

    /// Adopt an already connected transport.
    pub fn build<T: Transport>(self, transport: T) -> Connection<T> {
        Connection {
            transport,
            recv: RecvBuffer::with_capacity(self.recv_block_size * 4),
            fds_in: VecDeque::new(),
            requests: RequestQueue::new(),
            recv_block_size: self.recv_block_size,
        }
    }
}

impl Default for ConnectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One whole-message batch taken off the receive buffer.
#[derive(Debug, Clone)]
pub struct MessageBatch {
    bytes: Bytes,
}

impl MessageBatch {
    /// Iterate the messages of the batch in wire order.
    pub fn iter(&self) -> MessageIter<'_> {
        parse_messages(&self.bytes)
    }

    /// Raw bytes of the batch.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Byte length of the batch.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the read produced no whole message yet.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Client connection to a compositor.
pub struct Connection<T = UnixStream> {
    transport: T,
    recv: RecvBuffer,
    fds_in: VecDeque<OwnedFd>,
    requests: RequestQueue,
    recv_block_size: usize,
}

impl Connection<UnixStream> {
    /// Create a new connection builder.
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    /// Connect to the socket named by `WAYLAND_DISPLAY`/`XDG_RUNTIME_DIR`.
    pub fn connect_to_env() -> Result<Self> {
        ConnectionBuilder::new().connect()
    }
}

impl<T: Transport> Connection<T> {
    /// Adopt `transport` with default settings.
    pub fn new(transport: T) -> Self {
        ConnectionBuilder::new().build(transport)
    }

    /// Reserve the next client object id. See
    /// [`RequestQueue::reserve_object_id`].
    pub fn reserve_object_id<I>(&mut self) -> ObjectId<I> {
        self.requests.reserve_object_id()
    }

    /// Encode a request; it is sent by the next flush.
    pub fn register_request<M: Message>(
        &mut self,
        object: ObjectId<M::Interface>,
        message: M,
    ) -> Result<()> {
        self.requests.register_request(object, message)
    }

    /// True when a flush would send something.
    pub fn has_registered_requests(&self) -> bool {
        self.requests.has_registered_requests()
    }

    /// The outbound queue.
    pub fn requests(&mut self) -> &mut RequestQueue {
        &mut self.requests
    }

    /// Send every registered request, in registration order.
    ///
    /// Each queued descriptor travels attached to one byte of the request
    /// stream; the remaining bytes follow with a plain write.
    pub fn flush_registered_requests(&mut self) -> Result<()> {
        let (bytes, fds) = self.requests.take();
        if bytes.is_empty() && fds.is_empty() {
            return Ok(());
        }

        debug!(bytes = bytes.len(), fds = fds.len(), "Flushing requests");
        debug_assert!(bytes.len() >= fds.len(), "each descriptor needs a data byte");

        let mut written = 0;
        for fd in &fds {
            let end = (written + 1).min(bytes.len());
            let sent = self
                .transport
                .send_with_fds(&bytes[written..end], &[fd.as_fd()])?;
            if sent == 0 {
                return Err(io::Error::from(io::ErrorKind::WriteZero).into());
            }
            written += sent;
        }

        self.transport.write_all(&bytes[written..])?;
        Ok(())
    }

    /// Block until more data arrives and append it to the receive buffer.
    ///
    /// Received descriptors are queued for fd arguments. Returns the
    /// number of bytes read; end of stream is [`WireError::ConnectionClosed`].
    pub fn recv_more_data(&mut self) -> Result<usize> {
        receive_into(
            &mut self.transport,
            &mut self.recv,
            &mut self.fds_in,
            self.recv_block_size,
        )
    }

    /// Length of the buffered whole-message prefix. Does no I/O.
    pub fn whole_messages_len(&self) -> Result<usize> {
        self.recv.whole_messages_len()
    }

    /// Bytes received and not yet dispatched.
    pub fn buffered_len(&self) -> usize {
        self.recv.len()
    }

    /// Received descriptors not yet consumed by an fd argument.
    pub fn received_fd_count(&self) -> usize {
        self.fds_in.len()
    }

    /// Take the oldest received descriptor.
    ///
    /// For events nobody decoded: their descriptors stay queued otherwise.
    pub fn take_received_fd(&mut self) -> Option<OwnedFd> {
        self.fds_in.pop_front()
    }

    /// Read once and take every whole message now buffered.
    ///
    /// The batch may be empty if the read ended inside a message.
    pub fn recv_events(&mut self) -> Result<MessageBatch> {
        self.recv_more_data()?;
        let bytes = self.recv.split_whole_messages()?;
        Ok(MessageBatch { bytes })
    }

    /// Dispatch a batch through `overloads`, calling `default` for messages
    /// without a handler. Returns how many messages a handler ran for.
    pub fn visit_events<D>(
        &mut self,
        batch: &MessageBatch,
        overloads: &mut OverloadSet<'_>,
        default: D,
    ) -> Result<usize>
    where
        D: FnMut(&ParsedMessage<'_>),
    {
        let mut ctx = DispatchContext::new(&mut self.requests, &mut self.fds_in);
        visit_all(batch.iter(), overloads, &mut ctx, default)
    }

    /// Start a receive-and-visit call; finish it with one of the `until`
    /// methods of [`RecvVisit`].
    pub fn recv_and_visit<'c, 'o>(
        &'c mut self,
        overloads: &'c mut OverloadSet<'o>,
    ) -> RecvVisit<'c, 'o, T> {
        RecvVisit {
            conn: self,
            overloads,
        }
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Tear down the connection, returning the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }
}

impl<T> std::fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("buffered", &self.recv.len())
            .field("received_fds", &self.fds_in.len())
            .field("requests", &self.requests)
            .field("recv_block_size", &self.recv_block_size)
            .finish()
    }
}

fn receive_into<T: Transport>(
    transport: &mut T,
    recv: &mut RecvBuffer,
    fds_in: &mut VecDeque<OwnedFd>,
    block: usize,
) -> Result<usize> {
    let mut fds = Vec::new();
    let result = recv.read_with(block, |buf| transport.recv_with_fds(buf, &mut fds));
    let fd_count = fds.len();
    fds_in.extend(fds);

    match result {
        Ok(n) => {
            trace!(bytes = n, fds = fd_count, buffered = recv.len(), "Received data");
            Ok(n)
        }
        Err(WireError::ConnectionClosed) => {
            debug!(buffered = recv.len(), "Compositor closed the connection");
            Err(WireError::ConnectionClosed)
        }
        Err(e) => Err(e),
    }
}

/// A pending "receive and visit until" call.
///
/// Buffered whole messages are dispatched first, in wire order; more data is
/// read only once they are exhausted. The awaited message ends the call and
/// anything buffered after it stays for the next call. There is no timeout.
pub struct RecvVisit<'c, 'o, T> {
    conn: &'c mut Connection<T>,
    overloads: &'c mut OverloadSet<'o>,
}

impl<'c, 'o, T: Transport> RecvVisit<'c, 'o, T> {
    /// Dispatch until `object` sends `M`; its value is dropped.
    ///
    /// Messages with descriptor fields are still decoded so their
    /// descriptors leave the received queue.
    pub fn until<M: Message>(self, object: ObjectId<M::Interface>) -> Result<()> {
        self.until_raw(object.generic(), M::OPCODE, |arguments, ctx| {
            if !M::IS_STATIC {
                interpret_with_fds::<M>(arguments, &mut *ctx.fds)?;
            }
            Ok(())
        })
    }

    /// Dispatch until `object` sends `M`, then decode it and pass it to
    /// `on_found` with the request queue.
    pub fn until_with<M, R, F>(self, object: ObjectId<M::Interface>, on_found: F) -> Result<R>
    where
        M: Message,
        F: FnOnce(M, &mut RequestQueue) -> Result<R>,
    {
        self.until_raw(object.generic(), M::OPCODE, |arguments, ctx| {
            let message = interpret_with_fds::<M>(arguments, &mut *ctx.fds)?;
            on_found(message, &mut *ctx.requests)
        })
    }

    /// Dispatch until a message with `(object, opcode)` arrives and hand its
    /// raw arguments to `on_found`.
    ///
    /// Bytes of every message handled before an error are consumed too.
    pub fn until_raw<R, F>(self, object: ObjectId<Generic>, opcode: u16, on_found: F) -> Result<R>
    where
        F: FnOnce(&[u8], &mut DispatchContext<'_>) -> Result<R>,
    {
        let overloads = self.overloads;
        let Connection {
            transport,
            recv,
            fds_in,
            requests,
            recv_block_size,
        } = self.conn;
        let mut on_found = Some(on_found);

        loop {
            let whole = recv.whole_messages_len()?;
            let mut processed = 0;
            let mut outcome = None;

            {
                let mut ctx = DispatchContext::new(requests, fds_in);
                for message in parse_messages(&recv.as_bytes()[..whole]) {
                    let message = match message {
                        Ok(message) => message,
                        Err(e) => {
                            outcome = Some(Err(e));
                            break;
                        }
                    };
                    processed += message.wire_len();

                    if message.object_id == object && message.opcode == opcode {
                        trace!(
                            object_id = object.id(),
                            opcode,
                            "Found awaited message"
                        );
                        outcome = on_found
                            .take()
                            .map(|on_found| on_found(message.arguments, &mut ctx));
                        break;
                    }

                    let queued_fds = ctx.fds.len();
                    let skipped = |unmatched: &ParsedMessage<'_>| {
                        log_skipped(unmatched);
                        if queued_fds > 0 {
                            trace!(
                                object_id = unmatched.object_id.id(),
                                opcode = unmatched.opcode,
                                queued_fds,
                                "Skipped message while descriptors are queued"
                            );
                        }
                    };
                    if let Err(e) = visit(&message, overloads, &mut ctx, skipped) {
                        outcome = Some(Err(e));
                        break;
                    }
                }
            }

            recv.consume(processed);
            if let Some(result) = outcome {
                return result;
            }

            receive_into(transport, recv, fds_in, *recv_block_size)?;
        }
    }
}
