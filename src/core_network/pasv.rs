use crate::config::Config;
use crate::constants::{FTP_BADSENDCONN, FTP_BADSEQ, FTP_PASVOK};
use crate::helpers::{send_reply, ControlWriter};
use crate::session::Session;
use log::debug;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Formats the 227 reply payload: address and port as six decimal octets.
pub fn format_pasv_reply(ip: Ipv4Addr, port: u16) -> String {
    let [a, b, c, d] = ip.octets();
    format!(
        "Entering Passive Mode ({},{},{},{},{},{}).",
        a,
        b,
        c,
        d,
        port / 256,
        port % 256
    )
}

/// Handles the PASV (Passive Mode) FTP command.
///
/// Asks the privileged helper to arm a fresh listener and advertises its
/// port. A PORT endpoint armed earlier makes this a sequencing error.
pub async fn handle_pasv_command(
    writer: ControlWriter,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<(), std::io::Error> {
    let pasv_ip: Ipv4Addr = config
        .server
        .pasv_address
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let mut session = session.lock().await;
    if session.port_addr.is_some() {
        send_reply(&writer, FTP_BADSEQ, "Bad sequence of commands.").await?;
        return Ok(());
    }

    let port = session
        .priv_sock
        .pasv_listen()
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    let port = match port {
        Some(port) => port,
        None => {
            send_reply(&writer, FTP_BADSENDCONN, "Failed to enter Passive Mode.").await?;
            return Ok(());
        }
    };

    debug!("Advertising passive endpoint {}:{}", pasv_ip, port);
    send_reply(&writer, FTP_PASVOK, &format_pasv_reply(pasv_ip, port)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_splits_the_port_into_two_octets() {
        assert_eq!(
            format_pasv_reply(Ipv4Addr::new(10, 1, 2, 3), 4 * 256 + 2),
            "Entering Passive Mode (10,1,2,3,4,2)."
        );
    }

    #[test]
    fn reply_handles_port_extremes() {
        assert_eq!(
            format_pasv_reply(Ipv4Addr::LOCALHOST, 65535),
            "Entering Passive Mode (127,0,0,1,255,255)."
        );
        assert_eq!(
            format_pasv_reply(Ipv4Addr::LOCALHOST, 255),
            "Entering Passive Mode (127,0,0,1,0,255)."
        );
    }
}
