//! Error types for wlwire-client.

use thiserror::Error;

/// Main error type for all wire protocol operations.
#[derive(Debug, Error)]
pub enum WireError {
    /// I/O error on the compositor socket.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The compositor closed the connection (zero-length read).
    #[error("Connection closed by compositor")]
    ConnectionClosed,

    /// A message header does not describe a whole message.
    #[error("Framing error: {0}")]
    Framing(String),

    /// Argument bytes do not match the message description.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A descriptor argument was decoded but none was received.
    #[error("No received file descriptor left for fd argument")]
    MissingDescriptor,

    /// Second overload for the same (object id, opcode) pair.
    #[error("Overload for object {object_id} opcode {opcode} already present")]
    DuplicateOverload {
        /// Object id of the conflicting registration.
        object_id: u32,
        /// Opcode of the conflicting registration.
        opcode: u16,
    },

    /// Encoded message does not fit the 16-bit size field of the header.
    #[error("Message of {size} bytes exceeds the maximum message size")]
    MessageTooLarge {
        /// Encoded size including the header.
        size: usize,
    },

    /// `XDG_RUNTIME_DIR` is needed to locate the compositor socket but is unset.
    #[error("XDG_RUNTIME_DIR is required if WAYLAND_DISPLAY is not an absolute path")]
    MissingRuntimeDir,
}

/// Result type alias using WireError.
pub type Result<T> = std::result::Result<T, WireError>;
