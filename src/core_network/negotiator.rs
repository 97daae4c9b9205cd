//! Turns whichever data-connection mode the client armed into an actual
//! connected stream for the transfer commands.

use crate::constants::FTP_BADSENDCONN;
use crate::helpers::{send_reply, ControlWriter};
use crate::session::Session;
use log::error;

/// Produces the data connection for a transfer command and stores it in
/// `session.data_stream`.
///
/// Returns `Ok(true)` on success. On a negotiation failure the appropriate
/// 425 reply has already been sent and `Ok(false)` is returned; the caller
/// just abandons the transfer. `Err` means the privilege-separation channel
/// is gone and the session must end.
///
/// A PORT endpoint is consumed by the attempt whether or not the connect
/// succeeds; the client has to send a fresh PORT for the next transfer.
pub async fn open_data_stream(
    writer: &ControlWriter,
    session: &mut Session,
) -> Result<bool, std::io::Error> {
    let port_armed = session.port_addr.is_some();
    let pasv_armed = session
        .priv_sock
        .pasv_active()
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    if port_armed && pasv_armed {
        // PORT and PASV refuse to arm on top of each other, so this state
        // means the session bookkeeping is corrupt.
        error!("Both active and passive modes armed at transfer time");
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "both active and passive modes armed",
        ));
    }
    if !port_armed && !pasv_armed {
        send_reply(writer, FTP_BADSENDCONN, "Use PORT or PASV first.").await?;
        return Ok(false);
    }

    let stream = if let Some(addr) = session.port_addr.take() {
        session.priv_sock.get_data_sock(addr).await
    } else {
        session.priv_sock.pasv_accept().await
    }
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    match stream {
        Some(stream) => {
            session.data_stream = Some(stream);
            Ok(true)
        }
        None => {
            send_reply(writer, FTP_BADSENDCONN, "Can't open data connection.").await?;
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core_auth::UserDb;
    use crate::core_privsock::{PrivSockClient, PrivSockHelper};
    use std::net::{Ipv4Addr, SocketAddrV4};
    use std::sync::Arc;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::{TcpListener, TcpStream, UnixStream};
    use tokio::sync::Mutex;

    async fn control_pair() -> (ControlWriter, BufReader<TcpStream>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        let (_read, write) = server.into_split();
        (Arc::new(Mutex::new(write)), BufReader::new(client))
    }

    fn session_with_helper() -> Session {
        let mut config = Config::default();
        config.server.data_port = 0;
        config.server.connect_timeout = 5;
        let config = Arc::new(config);

        let (session_end, helper_end) = UnixStream::pair().unwrap();
        tokio::spawn(PrivSockHelper::new(helper_end, Arc::clone(&config)).run());
        Session::new(&config, Arc::new(UserDb::default()), PrivSockClient::new(session_end))
    }

    async fn read_reply(reader: &mut BufReader<TcpStream>) -> String {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        line
    }

    #[tokio::test]
    async fn neither_mode_armed_is_rejected_in_band() {
        let (writer, mut control) = control_pair().await;
        let mut session = session_with_helper();

        assert!(!open_data_stream(&writer, &mut session).await.unwrap());
        assert_eq!(read_reply(&mut control).await, "425 Use PORT or PASV first.\r\n");
        assert!(session.data_stream.is_none());
    }

    #[tokio::test]
    async fn active_mode_connects_to_the_armed_endpoint() {
        let (writer, _control) = control_pair().await;
        let mut session = session_with_helper();

        let peer = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let peer_addr = peer.local_addr().unwrap();
        session.port_addr = Some(SocketAddrV4::new(
            Ipv4Addr::LOCALHOST,
            peer_addr.port(),
        ));

        assert!(open_data_stream(&writer, &mut session).await.unwrap());
        assert!(session.data_stream.is_some());
        assert!(session.port_addr.is_none());
        peer.accept().await.unwrap();
    }

    #[tokio::test]
    async fn failed_active_connect_still_consumes_the_endpoint() {
        let (writer, mut control) = control_pair().await;
        let mut session = session_with_helper();

        let dead_port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        session.port_addr = Some(SocketAddrV4::new(Ipv4Addr::LOCALHOST, dead_port));

        assert!(!open_data_stream(&writer, &mut session).await.unwrap());
        assert_eq!(
            read_reply(&mut control).await,
            "425 Can't open data connection.\r\n"
        );
        assert!(session.port_addr.is_none());

        // The next attempt finds nothing armed.
        assert!(!open_data_stream(&writer, &mut session).await.unwrap());
        assert_eq!(read_reply(&mut control).await, "425 Use PORT or PASV first.\r\n");
    }
}
