//! Message decoding.
//!
//! [`parse_messages`] walks a region that holds only whole messages and
//! yields one [`ParsedMessage`] per header without copying. Argument spans
//! borrow from the region. [`interpret`] turns one span into a typed
//! message.

use std::collections::VecDeque;
use std::os::fd::OwnedFd;

use super::message::{ArgReader, Message};
use super::object_id::{Generic, ObjectId};
use super::wire_format::{Header, HEADER_SIZE};
use crate::error::{Result, WireError};

/// One framed message viewed in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedMessage<'a> {
    /// Source object of the event.
    pub object_id: ObjectId<Generic>,
    /// Opcode within the source object's interface.
    pub opcode: u16,
    /// Payload after the header.
    pub arguments: &'a [u8],
}

impl<'a> ParsedMessage<'a> {
    /// Bytes this message occupies on the wire, header included.
    pub fn wire_len(&self) -> usize {
        HEADER_SIZE + self.arguments.len()
    }

    /// True when this is message `M` sent by `object`.
    pub fn is<M: Message>(&self, object: ObjectId<M::Interface>) -> bool {
        self.object_id == object && self.opcode == M::OPCODE
    }
}

/// Lazy iterator over the messages of a whole-message region.
///
/// Yields an error for a header whose size is below 8 or runs past the end
/// of the region, then stops.
#[derive(Debug, Clone)]
pub struct MessageIter<'a> {
    bytes: &'a [u8],
    cursor: usize,
    failed: bool,
}

/// Iterate the messages in `bytes`.
///
/// # Example
///
/// ```
/// use wlwire_client::protocol::{parse_messages, Header};
///
/// let mut bytes = Vec::new();
/// bytes.extend_from_slice(&Header::new(3, 0, 12).encode());
/// bytes.extend_from_slice(&7u32.to_ne_bytes());
/// bytes.extend_from_slice(&Header::new(1, 1, 8).encode());
///
/// let opcodes: Vec<u16> = parse_messages(&bytes).map(|m| m.unwrap().opcode).collect();
/// assert_eq!(opcodes, vec![0, 1]);
/// ```
pub fn parse_messages(bytes: &[u8]) -> MessageIter<'_> {
    MessageIter {
        bytes,
        cursor: 0,
        failed: false,
    }
}

impl<'a> MessageIter<'a> {
    /// Bytes covered by the messages yielded so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl<'a> Iterator for MessageIter<'a> {
    type Item = Result<ParsedMessage<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor == self.bytes.len() {
            return None;
        }

        let rest = &self.bytes[self.cursor..];
        let header = match Header::decode(rest) {
            Some(header) => header,
            None => {
                self.failed = true;
                return Some(Err(WireError::Framing(format!(
                    "Truncated header: {} bytes left at offset {}",
                    rest.len(),
                    self.cursor
                ))));
            }
        };

        if let Err(e) = header.validate(rest.len()) {
            self.failed = true;
            return Some(Err(e));
        }

        let size = usize::from(header.size);
        self.cursor += size;
        Some(Ok(ParsedMessage {
            object_id: ObjectId::from_raw(header.object_id),
            opcode: header.opcode,
            arguments: &rest[HEADER_SIZE..size],
        }))
    }
}

impl std::iter::FusedIterator for MessageIter<'_> {}

/// Decode the payload of one message as `M`.
///
/// The payload must be a complete encoding of exactly one `M`. A descriptor
/// field fails with [`WireError::MissingDescriptor`]; use
/// [`interpret_with_fds`] for messages that carry descriptors.
pub fn interpret<M: Message>(payload: &[u8]) -> Result<M> {
    let mut no_fds = VecDeque::new();
    interpret_with_fds(payload, &mut no_fds)
}

/// Decode the payload of one message as `M`, taking descriptor fields from
/// the front of `fds`.
pub fn interpret_with_fds<M: Message>(payload: &[u8], fds: &mut VecDeque<OwnedFd>) -> Result<M> {
    M::decode(&mut ArgReader::new(payload, fds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Fixed, RequestBuffer};
    use crate::protocols::wayland::{wl_registry, WlRegistry};
    use crate::{wire_interface, wire_message};

    wire_interface! {
        enum Probe = "probe", version 1;
    }

    wire_message! {
        #[derive(Debug, Clone, PartialEq)]
        struct Motion: Probe = 3, "motion" {
            time: u32,
            x: Fixed,
            y: Fixed,
            delta: i32,
        }
    }

    fn message(object_id: u32, opcode: u16, args: &[u8]) -> Vec<u8> {
        let mut out = Header::new(object_id, opcode, (HEADER_SIZE + args.len()) as u16)
            .encode()
            .to_vec();
        out.extend_from_slice(args);
        out
    }

    #[test]
    fn test_parse_empty_region() {
        assert_eq!(parse_messages(&[]).count(), 0);
    }

    #[test]
    fn test_parse_yields_in_order_with_spans() {
        let mut bytes = message(2, 0, &[1, 0, 0, 0]);
        bytes.extend(message(5, 2, &[]));
        bytes.extend(message(2, 1, &[9; 8]));

        let mut iter = parse_messages(&bytes);
        let first = iter.next().unwrap().unwrap();
        assert_eq!(first.object_id, 2u32);
        assert_eq!(first.opcode, 0);
        assert_eq!(first.arguments, &[1, 0, 0, 0]);
        assert_eq!(first.wire_len(), 12);
        assert_eq!(iter.consumed(), 12);

        let second = iter.next().unwrap().unwrap();
        assert_eq!(second.object_id, 5u32);
        assert!(second.arguments.is_empty());

        let third = iter.next().unwrap().unwrap();
        assert_eq!(third.arguments.len(), 8);
        assert!(iter.next().is_none());
        assert_eq!(iter.consumed(), bytes.len());
    }

    #[test]
    fn test_size_below_header_is_framing_error() {
        let mut bytes = Header::new(1, 0, 4).encode().to_vec();
        bytes.extend_from_slice(&[0; 4]);

        let mut iter = parse_messages(&bytes);
        assert!(matches!(iter.next(), Some(Err(WireError::Framing(_)))));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_size_past_region_is_framing_error() {
        let bytes = Header::new(1, 0, 64).encode();
        let mut iter = parse_messages(&bytes);
        assert!(matches!(iter.next(), Some(Err(WireError::Framing(_)))));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_truncated_header_is_framing_error() {
        let mut bytes = message(1, 0, &[]);
        bytes.extend_from_slice(&[0; 4]);

        let results: Vec<_> = parse_messages(&bytes).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(WireError::Framing(_))));
    }

    #[test]
    fn test_interpret_static_message() {
        let motion = Motion {
            time: 1234,
            x: Fixed::from_f64(10.5),
            y: Fixed::from_int(-3),
            delta: -1,
        };
        let mut buffer = RequestBuffer::new();
        buffer.append(ObjectId::from_raw(9), motion.clone()).unwrap();
        assert_eq!(Some(buffer.len()), Motion::WIRE_SIZE);
        assert_eq!(buffer.len() % 4, 0);

        let parsed = parse_messages(buffer.as_bytes()).next().unwrap().unwrap();
        assert!(parsed.is::<Motion>(ObjectId::from_raw(9)));
        assert_eq!(interpret::<Motion>(parsed.arguments).unwrap(), motion);
    }

    #[test]
    fn test_interpret_global_event() {
        let registry: ObjectId<WlRegistry> = ObjectId::from_raw(2);
        let mut buffer = RequestBuffer::new();
        buffer
            .append(
                registry,
                wl_registry::event::Global {
                    name: 7,
                    interface: "wl_output".to_string(),
                    version: 4,
                },
            )
            .unwrap();

        let parsed = parse_messages(buffer.as_bytes()).next().unwrap().unwrap();
        assert!(parsed.is::<wl_registry::event::Global>(registry));
        let global: wl_registry::event::Global = interpret(parsed.arguments).unwrap();
        assert_eq!(global.name, 7);
        assert_eq!(global.interface, "wl_output");
        assert_eq!(global.version, 4);
    }

    #[test]
    fn test_interpret_short_payload_fails() {
        assert!(matches!(
            interpret::<Motion>(&[0; 8]),
            Err(WireError::Decode(_))
        ));
    }
}
