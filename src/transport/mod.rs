//! Transport module - byte and descriptor I/O to the compositor.
//!
//! Provides:
//! - [`Transport`] - the minimal capability the connection needs
//! - a [`Transport`] implementation for `std::os::unix::net::UnixStream`
//!   with descriptor passing over `SCM_RIGHTS`
//! - compositor socket discovery from the environment

mod socket_path;
mod unix;

use std::io;
use std::os::fd::{BorrowedFd, OwnedFd};

pub use socket_path::{resolve_socket_path, socket_path_from_env, DEFAULT_DISPLAY_NAME};
pub use unix::{connect, MAX_FDS_PER_READ};

/// Blocking stream with out-of-band descriptor passing.
///
/// Every method retries on signal interruption.
pub trait Transport {
    /// Write all of `bytes`.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Read until `buf` is full or the stream ends. Returns bytes read.
    fn read_full(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read_some(&mut buf[filled..])? {
                0 => break,
                n => filled += n,
            }
        }
        Ok(filled)
    }

    /// Block until at least one byte is available and read what is there.
    /// Returns 0 only at end of stream.
    fn read_some(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Send a prefix of `bytes` with `fds` attached. Returns bytes sent.
    fn send_with_fds(&mut self, bytes: &[u8], fds: &[BorrowedFd<'_>]) -> io::Result<usize>;

    /// Like [`read_some`](Self::read_some), appending any received
    /// descriptors to `fds`.
    fn recv_with_fds(&mut self, buf: &mut [u8], fds: &mut Vec<OwnedFd>) -> io::Result<usize>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write_all(bytes)
    }

    fn read_full(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_full(buf)
    }

    fn read_some(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_some(buf)
    }

    fn send_with_fds(&mut self, bytes: &[u8], fds: &[BorrowedFd<'_>]) -> io::Result<usize> {
        (**self).send_with_fds(bytes, fds)
    }

    fn recv_with_fds(&mut self, buf: &mut [u8], fds: &mut Vec<OwnedFd>) -> io::Result<usize> {
        (**self).recv_with_fds(buf, fds)
    }
}
