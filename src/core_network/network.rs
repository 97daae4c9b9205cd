use crate::config::Config;
use crate::constants::{
    FTP_BADCMD, FTP_COMMANDNOTIMPL, FTP_GREET, FTP_IDLE_TIMEOUT, FTP_LOGINERR, MAX_COMMAND_LINE,
};
use crate::core_auth::UserDb;
use crate::core_ftpcommand::ftpcommand::FtpCommand;
use crate::core_ftpcommand::handlers::initialize_command_handlers;
use crate::core_privsock::{PrivSockClient, PrivSockHelper};
use crate::helpers::{send_reply, ControlWriter};
use crate::session::Session;
use anyhow::Result;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream, UnixStream};
use tokio::sync::Mutex;
use tokio::time::timeout;

/// Accepts control connections forever, one spawned task per client.
pub async fn start_server(
    listener: TcpListener,
    config: Arc<Config>,
    users: Arc<UserDb>,
) -> Result<()> {
    loop {
        let (socket, addr) = listener.accept().await?;
        info!("Control connection from {}", addr);

        let config = Arc::clone(&config);
        let users = Arc::clone(&users);
        tokio::spawn(async move {
            if let Err(e) = serve_session(socket, config, users).await {
                error!("Session for {} failed: {}", addr, e);
            }
            info!("Control connection from {} closed", addr);
        });
    }
}

/// Wires up one session: a privileged helper task on one end of a socket
/// pair, the command loop on the other.
pub async fn serve_session(
    socket: TcpStream,
    config: Arc<Config>,
    users: Arc<UserDb>,
) -> Result<(), std::io::Error> {
    let (session_end, helper_end) = UnixStream::pair()?;

    let helper_config = Arc::clone(&config);
    let helper = tokio::spawn(async move {
        if let Err(e) = PrivSockHelper::new(helper_end, helper_config).run().await {
            error!("Privileged helper failed: {}", e);
        }
    });

    let session = Session::new(&config, users, PrivSockClient::new(session_end));
    let result = handle_connection(socket, config, Arc::new(Mutex::new(session))).await;

    // The session is gone, so its channel end is closed; the helper loop
    // sees EOF and winds down.
    let _ = helper.await;
    result
}

/// The command loop: greet, then read, dispatch and reply until the client
/// quits, goes quiet past the idle limit, or the connection drops.
pub async fn handle_connection(
    socket: TcpStream,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
) -> Result<(), std::io::Error> {
    let peer = socket.peer_addr()?;
    let (read_half, write_half) = socket.into_split();
    let writer: ControlWriter = Arc::new(Mutex::new(write_half));

    send_reply(
        &writer,
        FTP_GREET,
        &format!("(ferrousftpd {})", env!("CARGO_PKG_VERSION")),
    )
    .await?;

    let handlers = initialize_command_handlers();
    let idle_limit = config.server.idle_timeout();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();

    loop {
        line.clear();
        let mut limited = (&mut reader).take(MAX_COMMAND_LINE as u64);
        let read = limited.read_line(&mut line);
        let n = match idle_limit {
            Some(limit) => match timeout(limit, read).await {
                Ok(result) => result?,
                Err(_) => {
                    info!("Disconnecting idle client {}", peer);
                    send_reply(&writer, FTP_IDLE_TIMEOUT, "Timeout.").await?;
                    break;
                }
            },
            None => read.await?,
        };
        if n == 0 {
            break;
        }
        if !line.ends_with('\n') {
            if n == MAX_COMMAND_LINE {
                warn!("Overlong command line from {}", peer);
                send_reply(&writer, FTP_BADCMD, "Input line too long.").await?;
            }
            // Either way the stream is mid-line and useless from here on.
            break;
        }

        let input = line.trim_end_matches(['\r', '\n']);
        let (verb, arg) = match input.split_once(' ') {
            Some((verb, arg)) => (verb, arg.to_string()),
            None => (input, String::new()),
        };

        if verb.eq_ignore_ascii_case("PASS") {
            info!("{} PASS ****", peer);
        } else {
            info!("{} {}", peer, input);
        }

        let command = match FtpCommand::from_str(verb) {
            Some(command) => command,
            None => {
                send_reply(&writer, FTP_BADCMD, "Unknown command.").await?;
                continue;
            }
        };

        if !command.allowed_before_login() && !session.lock().await.is_authenticated() {
            send_reply(&writer, FTP_LOGINERR, "Please login with USER and PASS.").await?;
            continue;
        }

        match handlers.get(&command).and_then(|entry| entry.as_ref()) {
            Some(handler) => {
                handler(
                    Arc::clone(&writer),
                    Arc::clone(&config),
                    Arc::clone(&session),
                    arg,
                )
                .await?;
            }
            None => {
                send_reply(&writer, FTP_COMMANDNOTIMPL, "Command not implemented.").await?;
            }
        }

        if command == FtpCommand::QUIT {
            break;
        }
    }

    if let Some(user) = &session.lock().await.user {
        info!("Session for {} from {} ended", user.name, peer);
    }
    Ok(())
}
