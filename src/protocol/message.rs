//! Message type model.
//!
//! A message is a plain struct whose fields are wire arguments in
//! declaration order, plus an opcode scoped to an owning [`Interface`].
//! The [`wire_message!`](crate::wire_message) macro writes the struct and
//! its [`Message`] impl from one description:
//!
//! ```
//! use wlwire_client::{wire_interface, wire_message};
//! use wlwire_client::protocol::{Message, ObjectId};
//!
//! wire_interface! {
//!     pub enum Counter = "counter", version 1;
//! }
//!
//! wire_message! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct Add: Counter = 0, "add" {
//!         pub amount: u32,
//!         pub target: ObjectId,
//!     }
//!
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct Label: Counter = 1, "label" {
//!         pub text: String,
//!     }
//! }
//!
//! assert_eq!(Add::WIRE_SIZE, Some(16));
//! assert!(Add::IS_STATIC);
//! assert_eq!(Label::WIRE_SIZE, None);
//! ```

use std::collections::VecDeque;
use std::os::fd::OwnedFd;

use bytes::{BufMut, BytesMut};

use super::object_id::Interface;
use super::wire_format::{padded_len, padding_for, HEADER_SIZE, WORD_SIZE};
use crate::error::{Result, WireError};

/// A request or event with a fixed opcode on interface [`Message::Interface`].
pub trait Message: Sized {
    /// Interface owning this message. Only used to type-check targets.
    type Interface: Interface;

    /// Opcode within the owning interface.
    const OPCODE: u16;

    /// Message name without the interface prefix.
    const NAME: &'static str;

    /// Encoded size including the header when every field is fixed-size.
    const WIRE_SIZE: Option<usize>;

    /// True when the message has no string, array or descriptor field.
    const IS_STATIC: bool = Self::WIRE_SIZE.is_some();

    /// Write the arguments in declaration order.
    fn encode(self, out: &mut ArgWriter<'_>);

    /// Read the arguments in declaration order.
    fn decode(args: &mut ArgReader<'_>) -> Result<Self>;
}

/// One argument kind of the wire format.
pub trait WireArg: Sized {
    /// Payload bytes this argument always occupies, `None` for strings,
    /// arrays and descriptors.
    const STATIC_SIZE: Option<usize>;

    /// Append this argument.
    fn encode(self, out: &mut ArgWriter<'_>);

    /// Take this argument from the front of the remaining payload.
    fn decode(args: &mut ArgReader<'_>) -> Result<Self>;
}

/// Header plus padded field sizes, or `None` if any field is dynamic.
pub const fn static_size(fields: &[Option<usize>]) -> Option<usize> {
    let mut total = HEADER_SIZE;
    let mut i = 0;
    while i < fields.len() {
        match fields[i] {
            Some(size) => total += padded_len(size),
            None => return None,
        }
        i += 1;
    }
    Some(total)
}

/// Appends arguments to an outbound byte buffer and its descriptor side list.
pub struct ArgWriter<'a> {
    bytes: &'a mut BytesMut,
    fds: &'a mut Vec<OwnedFd>,
}

impl<'a> ArgWriter<'a> {
    /// Write into `bytes`, queueing descriptors on `fds`.
    pub fn new(bytes: &'a mut BytesMut, fds: &'a mut Vec<OwnedFd>) -> Self {
        Self { bytes, fds }
    }

    /// Append a native-endian word.
    pub fn put_u32(&mut self, value: u32) {
        self.bytes.put_slice(&value.to_ne_bytes());
    }

    /// Append a native-endian signed word.
    pub fn put_i32(&mut self, value: i32) {
        self.bytes.put_slice(&value.to_ne_bytes());
    }

    /// Append a length-prefixed string, NUL terminated and padded.
    ///
    /// The length field counts the terminator, so `""` is encoded as
    /// length 1 followed by a single NUL and three bytes of padding.
    pub fn put_string(&mut self, value: &str) {
        let len = value.len() + 1;
        self.put_u32(len as u32);
        self.bytes.put_slice(value.as_bytes());
        self.bytes.put_u8(0);
        self.bytes.put_bytes(0, padding_for(len));
    }

    /// Append a length-prefixed byte array, padded.
    pub fn put_array(&mut self, value: &[u8]) {
        self.put_u32(value.len() as u32);
        self.bytes.put_slice(value);
        self.bytes.put_bytes(0, padding_for(value.len()));
    }

    /// Queue a descriptor for the next flush. Writes no bytes.
    pub fn push_fd(&mut self, fd: OwnedFd) {
        self.fds.push(fd);
    }
}

/// Reads arguments off the payload of one message.
pub struct ArgReader<'a> {
    payload: &'a [u8],
    offset: usize,
    fds: &'a mut VecDeque<OwnedFd>,
}

impl<'a> ArgReader<'a> {
    /// Read from `payload`, taking descriptors from the front of `fds`.
    pub fn new(payload: &'a [u8], fds: &'a mut VecDeque<OwnedFd>) -> Self {
        Self {
            payload,
            offset: 0,
            fds,
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.payload.len() - self.offset
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(WireError::Decode(format!(
                "Need {} argument bytes at offset {}, only {} left",
                len,
                self.offset,
                self.remaining()
            )));
        }
        let payload = self.payload;
        let bytes = &payload[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    fn skip_padding(&mut self, len: usize) -> Result<()> {
        self.take(padding_for(len)).map(|_| ())
    }

    /// Take a native-endian word.
    pub fn take_u32(&mut self) -> Result<u32> {
        let word = self.take(WORD_SIZE)?;
        Ok(u32::from_ne_bytes([word[0], word[1], word[2], word[3]]))
    }

    /// Take a native-endian signed word.
    pub fn take_i32(&mut self) -> Result<i32> {
        let word = self.take(WORD_SIZE)?;
        Ok(i32::from_ne_bytes([word[0], word[1], word[2], word[3]]))
    }

    /// Take a string argument, without its terminator.
    ///
    /// A length field of 0 is the null string: it decodes as `""` and
    /// consumes nothing past the length field.
    pub fn take_string(&mut self) -> Result<&'a str> {
        let len = self.take_u32()? as usize;
        if len == 0 {
            return Ok("");
        }
        let raw = self.take(len)?;
        self.skip_padding(len)?;

        let (text, nul) = raw.split_at(len - 1);
        if nul[0] != 0 {
            return Err(WireError::Decode(
                "String argument is not NUL terminated".to_string(),
            ));
        }
        std::str::from_utf8(text)
            .map_err(|e| WireError::Decode(format!("String argument is not UTF-8: {}", e)))
    }

    /// Take an array argument.
    pub fn take_array(&mut self) -> Result<&'a [u8]> {
        let len = self.take_u32()? as usize;
        let raw = self.take(len)?;
        self.skip_padding(len)?;
        Ok(raw)
    }

    /// Take the oldest received descriptor.
    pub fn take_fd(&mut self) -> Result<OwnedFd> {
        self.fds.pop_front().ok_or(WireError::MissingDescriptor)
    }
}

/// Declare interface marker types.
///
/// ```
/// use wlwire_client::wire_interface;
/// use wlwire_client::protocol::Interface;
///
/// wire_interface! {
///     /// A seat.
///     pub enum WlSeat = "wl_seat", version 9;
/// }
///
/// assert_eq!(WlSeat::NAME, "wl_seat");
/// assert_eq!(WlSeat::VERSION, 9);
/// ```
#[macro_export]
macro_rules! wire_interface {
    ($(
        $(#[$meta:meta])*
        $vis:vis enum $name:ident = $wire_name:literal, version $version:literal;
    )*) => {
        $(
            $(#[$meta])*
            #[derive(Debug)]
            $vis enum $name {}

            impl $crate::protocol::Interface for $name {
                const NAME: &'static str = $wire_name;
                const VERSION: u32 = $version;
            }
        )*
    };
}

/// Declare message structs together with their [`Message`] impls.
///
/// Syntax per message: `struct Name: Interface = opcode, "wire_name" { fields }`.
/// Fields are encoded and decoded in the order written.
#[macro_export]
macro_rules! wire_message {
    ($(
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $iface:ty = $opcode:literal, $wire_name:literal {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $fty:ty
            ),* $(,)?
        }
    )*) => {
        $(
            $(#[$meta])*
            $vis struct $name {
                $(
                    $(#[$fmeta])*
                    $fvis $field: $fty,
                )*
            }

            impl $crate::protocol::Message for $name {
                type Interface = $iface;
                const OPCODE: u16 = $opcode;
                const NAME: &'static str = $wire_name;
                const WIRE_SIZE: Option<usize> = $crate::protocol::static_size(&[
                    $( <$fty as $crate::protocol::WireArg>::STATIC_SIZE ),*
                ]);

                #[allow(unused_variables)]
                fn encode(self, out: &mut $crate::protocol::ArgWriter<'_>) {
                    $( $crate::protocol::WireArg::encode(self.$field, out); )*
                }

                #[allow(unused_variables)]
                fn decode(
                    args: &mut $crate::protocol::ArgReader<'_>,
                ) -> $crate::error::Result<Self> {
                    Ok(Self {
                        $( $field: <$fty as $crate::protocol::WireArg>::decode(args)?, )*
                    })
                }
            }
        )*
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_with<F: FnOnce(&mut ArgWriter<'_>)>(f: F) -> (BytesMut, Vec<OwnedFd>) {
        let mut bytes = BytesMut::new();
        let mut fds = Vec::new();
        f(&mut ArgWriter::new(&mut bytes, &mut fds));
        (bytes, fds)
    }

    #[test]
    fn test_static_size() {
        assert_eq!(static_size(&[]), Some(8));
        assert_eq!(static_size(&[Some(4), Some(4)]), Some(16));
        assert_eq!(static_size(&[Some(4), None]), None);
    }

    #[test]
    fn test_empty_string_encoding() {
        let (bytes, _) = write_with(|w| w.put_string(""));
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[..4], &1u32.to_ne_bytes());
        assert_eq!(&bytes[4..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_string_padding() {
        // "abc" + NUL is exactly one word.
        let (bytes, _) = write_with(|w| w.put_string("abc"));
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[..4], &4u32.to_ne_bytes());
        assert_eq!(&bytes[4..], b"abc\0");

        let (bytes, _) = write_with(|w| w.put_string("abcd"));
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[..4], &5u32.to_ne_bytes());
        assert_eq!(&bytes[4..], b"abcd\0\0\0\0");
    }

    #[test]
    fn test_array_padding_has_no_terminator() {
        let (bytes, _) = write_with(|w| w.put_array(&[1, 2, 3, 4, 5]));
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[..4], &5u32.to_ne_bytes());
        assert_eq!(&bytes[4..], &[1, 2, 3, 4, 5, 0, 0, 0]);

        let (bytes, _) = write_with(|w| w.put_array(&[]));
        assert_eq!(&bytes[..], &0u32.to_ne_bytes());
    }

    #[test]
    fn test_null_string_consumes_only_length() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&0u32.to_ne_bytes());
        payload.extend_from_slice(&42u32.to_ne_bytes());

        let mut fds = VecDeque::new();
        let mut reader = ArgReader::new(&payload, &mut fds);
        assert_eq!(reader.take_string().unwrap(), "");
        assert_eq!(reader.take_u32().unwrap(), 42);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_take_string_and_array() {
        let (bytes, _) = write_with(|w| {
            w.put_string("wl_shm");
            w.put_array(&[9, 9]);
            w.put_i32(-3);
        });

        let mut fds = VecDeque::new();
        let mut reader = ArgReader::new(&bytes, &mut fds);
        assert_eq!(reader.take_string().unwrap(), "wl_shm");
        assert_eq!(reader.take_array().unwrap(), &[9, 9]);
        assert_eq!(reader.take_i32().unwrap(), -3);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_truncated_payload_is_decode_error() {
        let payload = 16u32.to_ne_bytes();
        let mut fds = VecDeque::new();
        let mut reader = ArgReader::new(&payload, &mut fds);
        let err = reader.take_string().unwrap_err();
        assert!(matches!(err, WireError::Decode(_)));
    }

    #[test]
    fn test_missing_terminator_rejected() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&4u32.to_ne_bytes());
        payload.extend_from_slice(b"abcd");

        let mut fds = VecDeque::new();
        let mut reader = ArgReader::new(&payload, &mut fds);
        assert!(reader.take_string().is_err());
    }

    #[test]
    fn test_take_fd_without_descriptor() {
        let mut fds = VecDeque::new();
        let mut reader = ArgReader::new(&[], &mut fds);
        assert!(matches!(
            reader.take_fd(),
            Err(WireError::MissingDescriptor)
        ));
    }
}
