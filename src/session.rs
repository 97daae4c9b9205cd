use std::net::SocketAddrV4;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpStream;

use crate::config::Config;
use crate::core_auth::UserDb;
use crate::core_privsock::PrivSockClient;

/// How payload bytes are represented on the wire. Both types move bytes
/// verbatim; the distinction only changes reply wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Ascii,
    Binary,
}

impl TransferType {
    pub fn name(&self) -> &'static str {
        match self {
            TransferType::Ascii => "ASCII",
            TransferType::Binary => "BINARY",
        }
    }
}

/// The account a session is logged in as.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub name: String,
}

/// Mutable per-connection state. One `Session` lives exactly as long as its
/// control connection and is only ever touched by that connection's task.
#[derive(Debug)]
pub struct Session {
    pub users: Arc<UserDb>,
    pub priv_sock: PrivSockClient,
    /// Account named by USER, awaiting its PASS.
    pub pending_user: Option<String>,
    /// Set once by a successful PASS, never changed afterwards.
    pub user: Option<SessionUser>,
    pub cwd: PathBuf,
    pub transfer_type: TransferType,
    /// Byte offset announced by REST for the next transfer command.
    pub restart_pos: u64,
    /// Source path announced by RNFR, consumed by the next RNTO.
    pub rename_from: Option<PathBuf>,
    /// Peer address announced by PORT, consumed by the next data transfer.
    pub port_addr: Option<SocketAddrV4>,
    /// Data connection produced by the negotiator for the current transfer.
    pub data_stream: Option<TcpStream>,
    pub umask: u32,
    pub upload_max_rate: u64,
    pub download_max_rate: u64,
}

impl Session {
    pub fn new(config: &Config, users: Arc<UserDb>, priv_sock: PrivSockClient) -> Self {
        Self {
            users,
            priv_sock,
            pending_user: None,
            user: None,
            cwd: PathBuf::from("/"),
            transfer_type: TransferType::Binary,
            restart_pos: 0,
            rename_from: None,
            port_addr: None,
            data_stream: None,
            umask: config.server.umask(),
            upload_max_rate: config.server.upload_max_rate,
            download_max_rate: config.server.download_max_rate,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Hands out the restart offset armed by REST and disarms it. Only the
    /// transfer commands call this; anything else leaves the offset alone.
    pub fn take_restart_pos(&mut self) -> u64 {
        std::mem::take(&mut self.restart_pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::UnixStream;

    fn test_session() -> Session {
        let (session_end, _helper_end) = UnixStream::pair().unwrap();
        Session::new(
            &Config::default(),
            Arc::new(UserDb::default()),
            PrivSockClient::new(session_end),
        )
    }

    #[tokio::test]
    async fn fresh_sessions_start_logged_out_in_binary() {
        let session = test_session();
        assert!(!session.is_authenticated());
        assert_eq!(session.transfer_type, TransferType::Binary);
        assert_eq!(session.cwd, PathBuf::from("/"));
        assert!(session.port_addr.is_none());
    }

    #[tokio::test]
    async fn restart_pos_is_consumed_once() {
        let mut session = test_session();
        session.restart_pos = 4096;
        assert_eq!(session.take_restart_pos(), 4096);
        assert_eq!(session.take_restart_pos(), 0);
    }
}
