//! Protocol module - wire format, message model, encoding and decoding.
//!
//! This module implements the byte-level side of the client:
//! - 8-byte header encoding/decoding
//! - Typed object ids and id allocation
//! - Message descriptions and argument codecs
//! - Request encoder and lazy event parser
//! - Receive buffer for accumulating partial reads

mod message;
mod object_id;
mod parser;
mod primitives;
mod recv_buffer;
mod request_buffer;
mod wire_format;

pub use message::{static_size, ArgReader, ArgWriter, Message, WireArg};
pub use object_id::{Generic, IdAllocator, Interface, NewId, ObjectId};
pub use parser::{interpret, interpret_with_fds, parse_messages, MessageIter, ParsedMessage};
pub use primitives::Fixed;
pub use recv_buffer::RecvBuffer;
pub use request_buffer::RequestBuffer;
pub use wire_format::{
    padded_len, padding_for, Header, DISPLAY_OBJECT_ID, FIRST_CLIENT_OBJECT_ID, HEADER_SIZE,
    MAX_MESSAGE_SIZE, WORD_SIZE,
};
