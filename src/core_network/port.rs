use crate::config::Config;
use crate::constants::{FTP_BADOPTS, FTP_BADSEQ, FTP_PORTOK};
use crate::helpers::{send_reply, ControlWriter};
use crate::session::Session;
use log::{info, warn};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Parses a PORT argument of the form `h1,h2,h3,h4,p1,p2` where every group
/// is a decimal octet and the port is `p1 * 256 + p2`.
pub fn parse_port_argument(arg: &str) -> Option<SocketAddrV4> {
    let parts: Vec<&str> = arg.trim().split(',').collect();
    if parts.len() != 6 {
        return None;
    }
    let octets: Result<Vec<u8>, _> = parts.iter().map(|x| x.trim().parse::<u8>()).collect();
    let octets = octets.ok()?;

    let ip = Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]);
    let port = (octets[4] as u16) << 8 | octets[5] as u16;
    Some(SocketAddrV4::new(ip, port))
}

/// Handles the PORT (Active Mode) FTP command.
///
/// The endpoint is only recorded here; the actual connection is opened by
/// the privileged helper when a transfer command runs.
pub async fn handle_port_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    let addr = match parse_port_argument(&arg) {
        Some(addr) => addr,
        None => {
            warn!("Malformed PORT argument: {:?}", arg);
            send_reply(&writer, FTP_BADOPTS, "Illegal PORT command.").await?;
            return Ok(());
        }
    };

    let mut session = session.lock().await;
    let pasv_armed = session
        .priv_sock
        .pasv_active()
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    if pasv_armed {
        send_reply(&writer, FTP_BADSEQ, "Bad sequence of commands.").await?;
        return Ok(());
    }

    info!("Client will listen for data on {}", addr);
    session.port_addr = Some(addr);
    send_reply(
        &writer,
        FTP_PORTOK,
        "PORT command successful. Consider using PASV.",
    )
    .await?;
    Ok(())
}
