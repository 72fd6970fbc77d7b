//! Unix domain socket transport.
//!
//! Plain reads and writes go through `std::io`; descriptor passing uses
//! `sendmsg`/`recvmsg` with `SCM_RIGHTS` control messages from `rustix`.

use std::io::{self, IoSlice, IoSliceMut, Read, Write};
use std::mem::MaybeUninit;
use std::os::fd::{BorrowedFd, OwnedFd};
use std::os::unix::net::UnixStream;
use std::path::Path;

use rustix::net::{
    recvmsg, sendmsg, RecvAncillaryBuffer, RecvAncillaryMessage, RecvFlags, ReturnFlags,
    SendAncillaryBuffer, SendAncillaryMessage, SendFlags,
};
use tracing::debug;

use super::Transport;
use crate::error::Result;

/// Most descriptors accepted by a single read.
pub const MAX_FDS_PER_READ: usize = 28;

/// Connect to the compositor socket at `path`.
pub fn connect(path: &Path) -> Result<UnixStream> {
    let stream = UnixStream::connect(path)?;
    debug!(path = %path.display(), "Connected to compositor socket");
    Ok(stream)
}

fn retry_interrupted<T>(mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    loop {
        match op() {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}

impl Transport for UnixStream {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        Write::write_all(self, bytes)
    }

    fn read_some(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        retry_interrupted(|| Read::read(&mut *self, &mut *buf))
    }

    fn send_with_fds(&mut self, bytes: &[u8], fds: &[BorrowedFd<'_>]) -> io::Result<usize> {
        let mut space = vec![MaybeUninit::<u8>::uninit(); rustix::cmsg_space!(ScmRights(fds.len()))];
        let mut ancillary = SendAncillaryBuffer::new(&mut space);
        if !fds.is_empty() && !ancillary.push(SendAncillaryMessage::ScmRights(fds)) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "descriptors do not fit the control buffer",
            ));
        }

        retry_interrupted(|| {
            sendmsg(
                &*self,
                &[IoSlice::new(bytes)],
                &mut ancillary,
                SendFlags::NOSIGNAL,
            )
            .map_err(io::Error::from)
        })
    }

    fn recv_with_fds(&mut self, buf: &mut [u8], fds: &mut Vec<OwnedFd>) -> io::Result<usize> {
        let mut space = [MaybeUninit::<u8>::uninit(); rustix::cmsg_space!(ScmRights(MAX_FDS_PER_READ))];
        let mut ancillary = RecvAncillaryBuffer::new(&mut space);

        let received = retry_interrupted(|| {
            recvmsg(
                &*self,
                &mut [IoSliceMut::new(&mut *buf)],
                &mut ancillary,
                RecvFlags::CMSG_CLOEXEC,
            )
            .map_err(io::Error::from)
        })?;

        for message in ancillary.drain() {
            if let RecvAncillaryMessage::ScmRights(received_fds) = message {
                fds.extend(received_fds);
            }
        }

        // The kernel closed the descriptors that did not fit, so the
        // received queue no longer lines up with fd arguments.
        if received.flags.contains(ReturnFlags::CTRUNC) {
            debug!(
                bytes = received.bytes,
                fds = fds.len(),
                "Received descriptors truncated"
            );
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "more than {} descriptors in one read, extra descriptors were dropped",
                    MAX_FDS_PER_READ
                ),
            ));
        }
        Ok(received.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Seek;
    use std::os::fd::AsFd;

    #[test]
    fn test_send_and_receive_descriptor() {
        let (mut client, mut server) = UnixStream::pair().unwrap();

        let file = tempfile_with(b"descriptor payload");
        Transport::send_with_fds(&mut client, &[7], &[file.as_fd()]).unwrap();

        let mut buf = [0u8; 16];
        let mut fds = Vec::new();
        let n = server.recv_with_fds(&mut buf, &mut fds).unwrap();
        assert_eq!(n, 1);
        assert_eq!(buf[0], 7);
        assert_eq!(fds.len(), 1);

        let mut received = File::from(fds.pop().unwrap());
        let mut contents = String::new();
        received.rewind().unwrap();
        received.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "descriptor payload");
    }

    #[test]
    fn test_send_without_descriptors() {
        let (mut client, mut server) = UnixStream::pair().unwrap();
        let sent = Transport::send_with_fds(&mut client, b"abcd", &[]).unwrap();
        assert_eq!(sent, 4);

        let mut buf = [0u8; 4];
        assert_eq!(server.read_full(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
    }

    #[test]
    fn test_read_some_returns_zero_at_eof() {
        let (client, mut server) = UnixStream::pair().unwrap();
        drop(client);
        let mut buf = [0u8; 8];
        assert_eq!(server.read_some(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_read_full_stops_at_eof() {
        let (mut client, mut server) = UnixStream::pair().unwrap();
        Transport::write_all(&mut client, &[1, 2, 3]).unwrap();
        drop(client);

        let mut buf = [0u8; 8];
        assert_eq!(server.read_full(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_too_many_descriptors_is_an_error() {
        let (mut client, mut server) = UnixStream::pair().unwrap();

        let file = tempfile_with(b"x");
        let fds: Vec<BorrowedFd<'_>> = (0..MAX_FDS_PER_READ + 2).map(|_| file.as_fd()).collect();
        Transport::send_with_fds(&mut client, &[1], &fds).unwrap();

        let mut buf = [0u8; 4];
        let mut received = Vec::new();
        let err = server.recv_with_fds(&mut buf, &mut received).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(received.len() <= MAX_FDS_PER_READ);
    }

    fn tempfile_with(contents: &[u8]) -> File {
        let path = std::env::temp_dir().join(format!(
            "wlwire-client-fd-test-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        let mut file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .unwrap();
        let _ = std::fs::remove_file(&path);
        file.write_all(contents).unwrap();
        file
    }
}
