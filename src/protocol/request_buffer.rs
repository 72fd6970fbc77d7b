//! Outbound request encoder.
//!
//! Requests are appended back to back into one `BytesMut` in the order the
//! caller registers them. Descriptor arguments do not appear in the byte
//! stream; they are collected on a side list and sent as ancillary data by
//! the next flush.

use std::os::fd::OwnedFd;

use bytes::{BufMut, Bytes, BytesMut};

use super::message::{ArgWriter, Message};
use super::object_id::ObjectId;
use super::wire_format::{Header, HEADER_SIZE, MAX_MESSAGE_SIZE, WORD_SIZE};
use crate::error::{Result, WireError};

/// Encoded requests waiting to be flushed.
#[derive(Debug, Default)]
pub struct RequestBuffer {
    bytes: BytesMut,
    fds: Vec<OwnedFd>,
}

impl RequestBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `message` addressed to `object` at the end of the buffer.
    ///
    /// On error the buffer is left exactly as it was before the call.
    ///
    /// # Example
    ///
    /// ```
    /// use wlwire_client::protocol::{NewId, RequestBuffer};
    /// use wlwire_client::protocols::wayland::{wl_display, DISPLAY};
    ///
    /// let mut buffer = RequestBuffer::new();
    /// let get_registry = wl_display::request::GetRegistry {
    ///     registry: NewId::from_raw(2),
    /// };
    /// buffer.append(DISPLAY, get_registry).unwrap();
    /// assert_eq!(buffer.len(), 12);
    /// ```
    pub fn append<M: Message>(&mut self, object: ObjectId<M::Interface>, message: M) -> Result<()> {
        let start = self.bytes.len();
        let fds_start = self.fds.len();

        self.bytes.put_bytes(0, HEADER_SIZE);
        message.encode(&mut ArgWriter::new(&mut self.bytes, &mut self.fds));

        let size = self.bytes.len() - start;
        debug_assert_eq!(size % WORD_SIZE, 0, "arguments must keep word alignment");

        if size > MAX_MESSAGE_SIZE {
            self.bytes.truncate(start);
            self.fds.truncate(fds_start);
            return Err(WireError::MessageTooLarge { size });
        }

        Header::new(object.id(), M::OPCODE, size as u16)
            .encode_into(&mut self.bytes[start..start + HEADER_SIZE]);
        Ok(())
    }

    /// Encoded bytes not yet flushed.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when there is nothing to flush.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty() && self.fds.is_empty()
    }

    /// Descriptors queued for the next flush.
    pub fn fd_count(&self) -> usize {
        self.fds.len()
    }

    /// Encoded bytes, in registration order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take everything out, leaving the buffer empty.
    pub fn take(&mut self) -> (Bytes, Vec<OwnedFd>) {
        (self.bytes.split().freeze(), std::mem::take(&mut self.fds))
    }
}
