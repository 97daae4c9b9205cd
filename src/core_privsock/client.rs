use std::net::SocketAddrV4;

use tokio::net::{TcpStream, UnixStream};

use super::{
    recv_fd, recv_int, recv_result, send_buf, send_cmd, send_int, PrivSockError,
    PRIV_SOCK_GET_DATA_SOCK, PRIV_SOCK_PASV_ACCEPT, PRIV_SOCK_PASV_ACTIVE,
    PRIV_SOCK_PASV_LISTEN, PRIV_SOCK_RESULT_BAD, PRIV_SOCK_RESULT_OK,
};

/// Session-side endpoint of the privilege-separation channel.
///
/// Methods return `Ok(None)` when the helper reports that the requested
/// operation failed; an `Err` means the channel itself is unusable.
#[derive(Debug)]
pub struct PrivSockClient {
    stream: UnixStream,
}

impl PrivSockClient {
    pub fn new(stream: UnixStream) -> Self {
        Self { stream }
    }

    /// Asks whether a passive listener is currently armed.
    pub async fn pasv_active(&mut self) -> Result<bool, PrivSockError> {
        send_cmd(&mut self.stream, PRIV_SOCK_PASV_ACTIVE).await?;
        self.expect_ok().await?;
        Ok(recv_int(&mut self.stream).await? != 0)
    }

    /// Arms a fresh passive listener, replacing any previous one, and
    /// returns the port it listens on.
    pub async fn pasv_listen(&mut self) -> Result<Option<u16>, PrivSockError> {
        send_cmd(&mut self.stream, PRIV_SOCK_PASV_LISTEN).await?;
        if !self.recv_ok_or_bad().await? {
            return Ok(None);
        }
        let port = recv_int(&mut self.stream).await?;
        Ok(Some(port as u16))
    }

    /// Waits for the remote peer to connect to the armed listener. The
    /// listener is consumed whether or not a connection arrives.
    pub async fn pasv_accept(&mut self) -> Result<Option<TcpStream>, PrivSockError> {
        send_cmd(&mut self.stream, PRIV_SOCK_PASV_ACCEPT).await?;
        if !self.recv_ok_or_bad().await? {
            return Ok(None);
        }
        self.recv_data_stream().await.map(Some)
    }

    /// Opens an active-mode connection from the privileged data port to the
    /// address the client supplied in PORT.
    pub async fn get_data_sock(
        &mut self,
        addr: SocketAddrV4,
    ) -> Result<Option<TcpStream>, PrivSockError> {
        send_cmd(&mut self.stream, PRIV_SOCK_GET_DATA_SOCK).await?;
        send_int(&mut self.stream, u32::from(addr.port())).await?;
        send_buf(&mut self.stream, addr.ip().to_string().as_bytes()).await?;
        if !self.recv_ok_or_bad().await? {
            return Ok(None);
        }
        self.recv_data_stream().await.map(Some)
    }

    async fn expect_ok(&mut self) -> Result<(), PrivSockError> {
        match recv_result(&mut self.stream).await? {
            PRIV_SOCK_RESULT_OK => Ok(()),
            other => Err(PrivSockError::Protocol(other)),
        }
    }

    async fn recv_ok_or_bad(&mut self) -> Result<bool, PrivSockError> {
        match recv_result(&mut self.stream).await? {
            PRIV_SOCK_RESULT_OK => Ok(true),
            PRIV_SOCK_RESULT_BAD => Ok(false),
            other => Err(PrivSockError::Protocol(other)),
        }
    }

    async fn recv_data_stream(&mut self) -> Result<TcpStream, PrivSockError> {
        let fd = recv_fd(&mut self.stream).await?;
        let std_stream = std::net::TcpStream::from(fd);
        std_stream.set_nonblocking(true)?;
        Ok(TcpStream::from_std(std_stream)?)
    }
}
