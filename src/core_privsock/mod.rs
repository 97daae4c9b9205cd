//! Privilege-separation channel between a session task and its helper task.
//!
//! The session side never creates data sockets itself. It sends one-byte
//! request opcodes over a unix stream pair; the helper answers with a status
//! byte, optionally followed by a big-endian integer, a length-prefixed
//! buffer, or a socket passed as an SCM_RIGHTS control message.

pub mod client;
pub mod helper;

pub use client::PrivSockClient;
pub use helper::PrivSockHelper;

use std::io::{self, IoSlice, IoSliceMut};
use std::os::unix::io::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};

use nix::sys::socket::{
    recvmsg, sendmsg, ControlMessage, ControlMessageOwned, MsgFlags, UnixAddr,
};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt, Interest};
use tokio::net::UnixStream;

/// Session-to-helper request opcodes.
pub const PRIV_SOCK_GET_DATA_SOCK: u8 = 1;
pub const PRIV_SOCK_PASV_ACTIVE: u8 = 2;
pub const PRIV_SOCK_PASV_LISTEN: u8 = 3;
pub const PRIV_SOCK_PASV_ACCEPT: u8 = 4;

/// Helper-to-session status codes.
pub const PRIV_SOCK_RESULT_OK: u8 = 1;
pub const PRIV_SOCK_RESULT_BAD: u8 = 2;

/// Upper bound on a length-prefixed buffer. The channel only ever carries
/// short address strings.
pub const PRIV_SOCK_MAX_BUF: usize = 256;

/// Channel-level failures. Any of these means the pairing is broken and the
/// session cannot continue; per-operation failures travel in-band as a
/// `PRIV_SOCK_RESULT_BAD` status instead.
#[derive(Debug, Error)]
pub enum PrivSockError {
    #[error("privilege-separation channel I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("privilege-separation channel closed by peer")]
    Closed,
    #[error("unexpected byte {0:#04x} on privilege-separation channel")]
    Protocol(u8),
    #[error("oversized buffer of {0} bytes announced on privilege-separation channel")]
    OversizedBuffer(u32),
}

async fn read_u8(stream: &mut UnixStream) -> Result<u8, PrivSockError> {
    let mut byte = [0u8; 1];
    match stream.read_exact(&mut byte).await {
        Ok(_) => Ok(byte[0]),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(PrivSockError::Closed),
        Err(e) => Err(PrivSockError::Io(e)),
    }
}

pub(crate) async fn send_cmd(stream: &mut UnixStream, cmd: u8) -> Result<(), PrivSockError> {
    stream.write_all(&[cmd]).await?;
    Ok(())
}

/// Reads the next request opcode. `None` is a clean shutdown: the peer hung
/// up between requests.
pub(crate) async fn recv_cmd(stream: &mut UnixStream) -> Result<Option<u8>, PrivSockError> {
    let mut byte = [0u8; 1];
    let n = stream.read(&mut byte).await?;
    if n == 0 {
        Ok(None)
    } else {
        Ok(Some(byte[0]))
    }
}

pub(crate) async fn send_result(stream: &mut UnixStream, status: u8) -> Result<(), PrivSockError> {
    stream.write_all(&[status]).await?;
    Ok(())
}

pub(crate) async fn recv_result(stream: &mut UnixStream) -> Result<u8, PrivSockError> {
    read_u8(stream).await
}

pub(crate) async fn send_int(stream: &mut UnixStream, value: u32) -> Result<(), PrivSockError> {
    stream.write_u32(value).await?;
    Ok(())
}

pub(crate) async fn recv_int(stream: &mut UnixStream) -> Result<u32, PrivSockError> {
    match stream.read_u32().await {
        Ok(value) => Ok(value),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(PrivSockError::Closed),
        Err(e) => Err(PrivSockError::Io(e)),
    }
}

pub(crate) async fn send_buf(stream: &mut UnixStream, buf: &[u8]) -> Result<(), PrivSockError> {
    if buf.len() > PRIV_SOCK_MAX_BUF {
        return Err(PrivSockError::OversizedBuffer(buf.len() as u32));
    }
    stream.write_u32(buf.len() as u32).await?;
    stream.write_all(buf).await?;
    Ok(())
}

pub(crate) async fn recv_buf(stream: &mut UnixStream) -> Result<Vec<u8>, PrivSockError> {
    let len = recv_int(stream).await?;
    if len as usize > PRIV_SOCK_MAX_BUF {
        return Err(PrivSockError::OversizedBuffer(len));
    }
    let mut buf = vec![0u8; len as usize];
    match stream.read_exact(&mut buf).await {
        Ok(_) => Ok(buf),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(PrivSockError::Closed),
        Err(e) => Err(PrivSockError::Io(e)),
    }
}

/// Passes a descriptor to the peer. One placeholder byte travels alongside
/// the control message; the kernel duplicates the descriptor at send time,
/// so the caller may close its copy as soon as this returns.
pub(crate) async fn send_fd(stream: &mut UnixStream, fd: BorrowedFd<'_>) -> Result<(), PrivSockError> {
    let raw = fd.as_raw_fd();
    loop {
        stream.writable().await?;
        let result = stream.try_io(Interest::WRITABLE, || {
            let data = [0u8; 1];
            let iov = [IoSlice::new(&data)];
            let fds = [raw];
            let cmsg = [ControlMessage::ScmRights(&fds)];
            sendmsg::<UnixAddr>(stream.as_raw_fd(), &iov, &cmsg, MsgFlags::empty(), None)
                .map_err(io::Error::from)
        });
        match result {
            Ok(_) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
            Err(e) => return Err(PrivSockError::Io(e)),
        }
    }
}

/// Receives a descriptor passed by the peer.
pub(crate) async fn recv_fd(stream: &mut UnixStream) -> Result<OwnedFd, PrivSockError> {
    loop {
        stream.readable().await?;
        let result = stream.try_io(Interest::READABLE, || {
            let mut data = [0u8; 1];
            let mut iov = [IoSliceMut::new(&mut data)];
            let mut cmsg_buf = nix::cmsg_space!([RawFd; 1]);
            let msg = recvmsg::<UnixAddr>(
                stream.as_raw_fd(),
                &mut iov,
                Some(&mut cmsg_buf),
                MsgFlags::empty(),
            )
            .map_err(io::Error::from)?;
            if msg.bytes == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "peer closed"));
            }
            for cmsg in msg.cmsgs().map_err(io::Error::from)? {
                if let ControlMessageOwned::ScmRights(fds) = cmsg {
                    if let Some(&fd) = fds.first() {
                        return Ok(unsafe { OwnedFd::from_raw_fd(fd) });
                    }
                }
            }
            Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "descriptor missing from control message",
            ))
        });
        match result {
            Ok(fd) => return Ok(fd),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Err(PrivSockError::Closed),
            Err(e) => return Err(PrivSockError::Io(e)),
        }
    }
}
