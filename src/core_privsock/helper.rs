use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::os::unix::io::AsFd;
use std::sync::Arc;

use log::{debug, error, warn};
use tokio::net::{TcpListener, TcpSocket, TcpStream, UnixStream};
use tokio::time::timeout;

use crate::config::Config;

use super::{
    recv_buf, recv_cmd, recv_int, send_fd, send_int, send_result, PrivSockError,
    PRIV_SOCK_GET_DATA_SOCK, PRIV_SOCK_PASV_ACCEPT, PRIV_SOCK_PASV_ACTIVE,
    PRIV_SOCK_PASV_LISTEN, PRIV_SOCK_RESULT_BAD, PRIV_SOCK_RESULT_OK,
};

/// Privileged endpoint of the channel. One helper serves exactly one
/// session; it owns the passive listener between PASV and the transfer
/// command, and it is the only place data sockets are created.
pub struct PrivSockHelper {
    stream: UnixStream,
    config: Arc<Config>,
    pasv_listener: Option<TcpListener>,
}

impl PrivSockHelper {
    pub fn new(stream: UnixStream, config: Arc<Config>) -> Self {
        Self {
            stream,
            config,
            pasv_listener: None,
        }
    }

    /// Serves requests until the session side hangs up.
    pub async fn run(mut self) -> Result<(), PrivSockError> {
        loop {
            let cmd = match recv_cmd(&mut self.stream).await? {
                Some(cmd) => cmd,
                None => return Ok(()),
            };
            match cmd {
                PRIV_SOCK_GET_DATA_SOCK => self.handle_get_data_sock().await?,
                PRIV_SOCK_PASV_ACTIVE => self.handle_pasv_active().await?,
                PRIV_SOCK_PASV_LISTEN => self.handle_pasv_listen().await?,
                PRIV_SOCK_PASV_ACCEPT => self.handle_pasv_accept().await?,
                other => {
                    error!("Unknown privsock request {:#04x}", other);
                    return Err(PrivSockError::Protocol(other));
                }
            }
        }
    }

    async fn handle_pasv_active(&mut self) -> Result<(), PrivSockError> {
        let armed = self.pasv_listener.is_some();
        send_result(&mut self.stream, PRIV_SOCK_RESULT_OK).await?;
        send_int(&mut self.stream, u32::from(armed)).await
    }

    async fn handle_pasv_listen(&mut self) -> Result<(), PrivSockError> {
        // A repeated PASV simply replaces the previous listener.
        self.pasv_listener = None;

        let addr: Ipv4Addr = match self.config.server.pasv_address.parse() {
            Ok(addr) => addr,
            Err(e) => {
                warn!(
                    "Unusable pasv_address {:?}: {}",
                    self.config.server.pasv_address, e
                );
                return send_result(&mut self.stream, PRIV_SOCK_RESULT_BAD).await;
            }
        };

        match TcpListener::bind(SocketAddr::from((addr, 0))).await {
            Ok(listener) => {
                let port = match listener.local_addr() {
                    Ok(local) => local.port(),
                    Err(e) => {
                        warn!("Passive listener has no local address: {}", e);
                        return send_result(&mut self.stream, PRIV_SOCK_RESULT_BAD).await;
                    }
                };
                debug!("Passive listener armed on {}:{}", addr, port);
                self.pasv_listener = Some(listener);
                send_result(&mut self.stream, PRIV_SOCK_RESULT_OK).await?;
                send_int(&mut self.stream, u32::from(port)).await
            }
            Err(e) => {
                warn!("Failed to bind passive listener on {}: {}", addr, e);
                send_result(&mut self.stream, PRIV_SOCK_RESULT_BAD).await
            }
        }
    }

    async fn handle_pasv_accept(&mut self) -> Result<(), PrivSockError> {
        // The listener is single-use: gone after this whatever happens.
        let listener = match self.pasv_listener.take() {
            Some(listener) => listener,
            None => {
                warn!("PASV accept requested without an armed listener");
                return send_result(&mut self.stream, PRIV_SOCK_RESULT_BAD).await;
            }
        };

        match timeout(self.config.server.accept_timeout(), listener.accept()).await {
            Ok(Ok((stream, peer))) => {
                debug!("Accepted data connection from {}", peer);
                send_result(&mut self.stream, PRIV_SOCK_RESULT_OK).await?;
                self.pass_stream(stream).await
            }
            Ok(Err(e)) => {
                warn!("Accepting data connection failed: {}", e);
                send_result(&mut self.stream, PRIV_SOCK_RESULT_BAD).await
            }
            Err(_) => {
                warn!("Timed out waiting for the data connection");
                send_result(&mut self.stream, PRIV_SOCK_RESULT_BAD).await
            }
        }
    }

    async fn handle_get_data_sock(&mut self) -> Result<(), PrivSockError> {
        let port = recv_int(&mut self.stream).await?;
        let buf = recv_buf(&mut self.stream).await?;

        let ip = std::str::from_utf8(&buf)
            .ok()
            .and_then(|s| s.parse::<Ipv4Addr>().ok());
        let target = match ip {
            Some(ip) => SocketAddrV4::new(ip, port as u16),
            None => {
                warn!("Malformed address in data-socket request");
                return send_result(&mut self.stream, PRIV_SOCK_RESULT_BAD).await;
            }
        };

        match self.connect_from_data_port(target).await {
            Ok(stream) => {
                debug!("Opened active data connection to {}", target);
                send_result(&mut self.stream, PRIV_SOCK_RESULT_OK).await?;
                self.pass_stream(stream).await
            }
            Err(e) => {
                warn!("Active data connection to {} failed: {}", target, e);
                send_result(&mut self.stream, PRIV_SOCK_RESULT_BAD).await
            }
        }
    }

    /// Connects to `target` with the configured source port. Reusing the
    /// address is required for back-to-back transfers while the previous
    /// data socket lingers in TIME_WAIT.
    async fn connect_from_data_port(&self, target: SocketAddrV4) -> io::Result<TcpStream> {
        let socket = TcpSocket::new_v4()?;
        socket.set_reuseaddr(true)?;
        socket.bind(SocketAddr::from((
            Ipv4Addr::UNSPECIFIED,
            self.config.server.data_port,
        )))?;
        timeout(
            self.config.server.connect_timeout(),
            socket.connect(SocketAddr::V4(target)),
        )
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "data connection timed out"))?
    }

    /// Hands the accepted or connected socket to the session side. The
    /// kernel duplicates the descriptor, so the local copy closes here.
    async fn pass_stream(&mut self, stream: TcpStream) -> Result<(), PrivSockError> {
        let std_stream = stream.into_std()?;
        send_fd(&mut self.stream, std_stream.as_fd()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_privsock::PrivSockClient;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn test_config() -> Arc<Config> {
        let mut config = Config::default();
        config.server.pasv_address = String::from("127.0.0.1");
        config.server.data_port = 0;
        config.server.accept_timeout = 5;
        config.server.connect_timeout = 5;
        Arc::new(config)
    }

    fn spawn_helper() -> PrivSockClient {
        let (session_end, helper_end) = UnixStream::pair().unwrap();
        let helper = PrivSockHelper::new(helper_end, test_config());
        tokio::spawn(helper.run());
        PrivSockClient::new(session_end)
    }

    #[tokio::test]
    async fn passive_listener_round_trip() {
        let mut client = spawn_helper();

        assert!(!client.pasv_active().await.unwrap());
        let port = client.pasv_listen().await.unwrap().unwrap();
        assert!(client.pasv_active().await.unwrap());

        let connector = tokio::spawn(async move {
            TcpStream::connect(("127.0.0.1", port)).await.unwrap()
        });
        let mut server_side = client.pasv_accept().await.unwrap().unwrap();
        let mut peer_side = connector.await.unwrap();

        peer_side.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        server_side.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");
    }

    #[tokio::test]
    async fn passive_listener_is_single_use() {
        let mut client = spawn_helper();

        let port = client.pasv_listen().await.unwrap().unwrap();
        let connector = tokio::spawn(async move {
            TcpStream::connect(("127.0.0.1", port)).await.unwrap()
        });
        assert!(client.pasv_accept().await.unwrap().is_some());
        connector.await.unwrap();

        // Consumed: no listener armed any more, a second accept fails in-band.
        assert!(!client.pasv_active().await.unwrap());
        assert!(client.pasv_accept().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn repeated_listen_replaces_the_listener() {
        let mut client = spawn_helper();

        let first = client.pasv_listen().await.unwrap().unwrap();
        let second = client.pasv_listen().await.unwrap().unwrap();
        assert_ne!(first, second);

        // Only the latest port accepts.
        assert!(TcpStream::connect(("127.0.0.1", first)).await.is_err());
        let connector = tokio::spawn(async move {
            TcpStream::connect(("127.0.0.1", second)).await.unwrap()
        });
        assert!(client.pasv_accept().await.unwrap().is_some());
        connector.await.unwrap();
    }

    #[tokio::test]
    async fn active_connect_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let target = match listener.local_addr().unwrap() {
            SocketAddr::V4(v4) => v4,
            other => panic!("unexpected address family: {}", other),
        };

        let mut client = spawn_helper();
        let mut server_side = client.get_data_sock(target).await.unwrap().unwrap();
        let (mut peer_side, _) = listener.accept().await.unwrap();

        server_side.write_all(b"pong").await.unwrap();
        let mut buf = [0u8; 4];
        peer_side.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"pong");
    }

    #[tokio::test]
    async fn refused_connect_is_an_in_band_failure() {
        let mut client = spawn_helper();
        // Bind then drop so the port is momentarily guaranteed dead.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let target = SocketAddrV4::new(Ipv4Addr::LOCALHOST, port);
        assert!(client.get_data_sock(target).await.unwrap().is_none());
    }
}
