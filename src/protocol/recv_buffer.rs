//! Inbound accumulation buffer.
//!
//! Uses `bytes::BytesMut` to collect socket reads until they form whole
//! messages. The first unconsumed byte always starts a header: bytes leave
//! the buffer only in units of whole messages.
//!
//! # Example
//!
//! ```
//! use wlwire_client::protocol::{Header, RecvBuffer};
//!
//! let mut wire = Header::new(2, 0, 12).encode().to_vec();
//! wire.extend_from_slice(&5u32.to_ne_bytes());
//!
//! let mut buffer = RecvBuffer::new();
//! buffer.extend_from_slice(&wire[..10]);
//! assert_eq!(buffer.whole_messages_len().unwrap(), 0);
//!
//! buffer.extend_from_slice(&wire[10..]);
//! assert_eq!(buffer.whole_messages_len().unwrap(), 12);
//! ```

use std::io;

use bytes::{Bytes, BytesMut};

use super::wire_format::{Header, HEADER_SIZE, WORD_SIZE};
use crate::error::{Result, WireError};

/// Bytes received from the peer and not yet dispatched.
#[derive(Debug, Default)]
pub struct RecvBuffer {
    buffer: BytesMut,
}

impl RecvBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// All buffered bytes, possibly ending in a partial message.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Append raw bytes.
    pub fn extend_from_slice(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Length of the longest prefix made of whole messages.
    ///
    /// Only the size field of each header is inspected. A size below the
    /// header length can never be skipped over, so it is reported as a
    /// framing error.
    pub fn whole_messages_len(&self) -> Result<usize> {
        let mut offset = 0;
        while let Some(size) = Header::peek_size(&self.buffer[offset..]) {
            let size = usize::from(size);
            if size < HEADER_SIZE {
                return Err(WireError::Framing(format!(
                    "Message size {} at offset {} is less than the {} byte header",
                    size, offset, HEADER_SIZE
                )));
            }
            if offset + size > self.buffer.len() {
                break;
            }
            offset += size;
        }
        Ok(offset)
    }

    /// The whole-message prefix, borrowed.
    pub fn whole_messages(&self) -> Result<&[u8]> {
        let len = self.whole_messages_len()?;
        Ok(&self.buffer[..len])
    }

    /// Remove the whole-message prefix and return it.
    pub fn split_whole_messages(&mut self) -> Result<Bytes> {
        let len = self.whole_messages_len()?;
        Ok(self.buffer.split_to(len).freeze())
    }

    /// Drop `len` leading bytes that were already dispatched.
    pub fn consume(&mut self, len: usize) {
        debug_assert!(len <= self.buffer.len());
        let _ = self.buffer.split_to(len.min(self.buffer.len()));
    }

    /// Append data produced by `read`, which behaves like a partial read.
    ///
    /// Each request is `block` bytes, plus one when the buffered total would
    /// otherwise end on a word boundary. Messages are word aligned, so a read
    /// that fills such a request ended inside a message and more data is
    /// already on its way; in that case `read` is called again.
    ///
    /// Returns the number of bytes appended. A zero-length read means the
    /// peer closed the stream and fails with [`WireError::ConnectionClosed`].
    pub fn read_with<F>(&mut self, block: usize, mut read: F) -> Result<usize>
    where
        F: FnMut(&mut [u8]) -> io::Result<usize>,
    {
        let block = block.max(1);
        let mut total = 0;

        loop {
            let start = self.buffer.len();
            let mut request = block;
            if (start + request) % WORD_SIZE == 0 {
                request += 1;
            }

            self.buffer.resize(start + request, 0);
            let read_result = read(&mut self.buffer[start..]);
            let n = match read_result {
                Ok(n) => n,
                Err(e) => {
                    self.buffer.truncate(start);
                    return Err(e.into());
                }
            };
            self.buffer.truncate(start + n);

            if n == 0 {
                return Err(WireError::ConnectionClosed);
            }

            total += n;
            if n < request {
                return Ok(total);
            }
        }
    }
}
