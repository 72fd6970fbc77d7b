//! Wire format encoding and decoding.
//!
//! Implements the 8-byte message header:
//! ```text
//! ┌──────────────┬──────────────────────────────┐
//! │ Object ID    │ Opcode        │ Size          │
//! │ uint32 (NE)  │ high 16 bits  │ low 16 bits   │
//! └──────────────┴──────────────────────────────┘
//! ```
//!
//! All words are in native byte order. Size counts the header itself and
//! every message is padded to a multiple of 4 bytes.

use crate::error::{Result, WireError};

/// Header size in bytes (fixed, exactly 8).
pub const HEADER_SIZE: usize = 8;

/// Byte offset of the packed opcode/size word inside the header.
pub const SIZE_AND_OPCODE_OFFSET: usize = 4;

/// Largest message the 16-bit size field can describe.
pub const MAX_MESSAGE_SIZE: usize = u16::MAX as usize;

/// Argument alignment in bytes.
pub const WORD_SIZE: usize = 4;

/// Object id of the global display singleton.
pub const DISPLAY_OBJECT_ID: u32 = 1;

/// First object id a client allocates for its own objects.
pub const FIRST_CLIENT_OBJECT_ID: u32 = 2;

/// Number of zero bytes needed to bring `len` up to the next word boundary.
#[inline]
pub const fn padding_for(len: usize) -> usize {
    (WORD_SIZE - len % WORD_SIZE) % WORD_SIZE
}

/// `len` rounded up to the next word boundary.
#[inline]
pub const fn padded_len(len: usize) -> usize {
    len + padding_for(len)
}

/// Decoded message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Target (request) or source (event) object.
    pub object_id: u32,
    /// Message opcode within the object's interface.
    pub opcode: u16,
    /// Total message size in bytes, header included.
    pub size: u16,
}

impl Header {
    /// Create a new header.
    pub fn new(object_id: u32, opcode: u16, size: u16) -> Self {
        Self {
            object_id,
            opcode,
            size,
        }
    }

    /// Encode header to bytes (native endian).
    ///
    /// # Example
    ///
    /// ```
    /// use wlwire_client::protocol::Header;
    ///
    /// let header = Header::new(1, 1, 12);
    /// let bytes = header.encode();
    /// assert_eq!(bytes.len(), 8);
    /// ```
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        self.encode_into(&mut buf);
        buf
    }

    /// Encode header into an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if buffer is smaller than `HEADER_SIZE` (8 bytes).
    pub fn encode_into(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= HEADER_SIZE);
        let size_and_opcode = (u32::from(self.opcode) << 16) | u32::from(self.size);
        buf[0..4].copy_from_slice(&self.object_id.to_ne_bytes());
        buf[4..8].copy_from_slice(&size_and_opcode.to_ne_bytes());
    }

    /// Decode header from bytes (native endian).
    ///
    /// Returns `None` if buffer is too short.
    ///
    /// # Example
    ///
    /// ```
    /// use wlwire_client::protocol::Header;
    ///
    /// let bytes = Header::new(3, 2, 16).encode();
    /// let header = Header::decode(&bytes).unwrap();
    /// assert_eq!(header.object_id, 3);
    /// assert_eq!(header.opcode, 2);
    /// assert_eq!(header.size, 16);
    /// ```
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }
        let object_id = u32::from_ne_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let size_and_opcode = u32::from_ne_bytes([buf[4], buf[5], buf[6], buf[7]]);
        Some(Self {
            object_id,
            opcode: (size_and_opcode >> 16) as u16,
            size: (size_and_opcode & 0xFFFF) as u16,
        })
    }

    /// Read only the size field of the header starting at `buf[0]`.
    ///
    /// Returns `None` if the size word is not fully present.
    #[inline]
    pub fn peek_size(buf: &[u8]) -> Option<u16> {
        let word = buf.get(SIZE_AND_OPCODE_OFFSET..HEADER_SIZE)?;
        let size_and_opcode = u32::from_ne_bytes([word[0], word[1], word[2], word[3]]);
        Some((size_and_opcode & 0xFFFF) as u16)
    }

    /// Validate the header against the bytes available after it.
    ///
    /// Checks:
    /// - Size covers at least the header
    /// - Size does not exceed `available` (bytes from the header start)
    pub fn validate(&self, available: usize) -> Result<()> {
        let size = usize::from(self.size);
        if size < HEADER_SIZE {
            return Err(WireError::Framing(format!(
                "Message size {} is less than the {} byte header",
                size, HEADER_SIZE
            )));
        }

        if size > available {
            return Err(WireError::Framing(format!(
                "Message size {} exceeds the {} bytes available",
                size, available
            )));
        }

        Ok(())
    }

    /// Payload length in bytes (size minus header).
    #[inline]
    pub fn payload_len(&self) -> usize {
        usize::from(self.size).saturating_sub(HEADER_SIZE)
    }
}
