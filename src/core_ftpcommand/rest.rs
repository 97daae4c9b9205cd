use crate::config::Config;
use crate::constants::{FTP_BADOPTS, FTP_RESTOK};
use crate::helpers::{send_reply, ControlWriter};
use crate::session::Session;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the REST (Restart) FTP command.
///
/// Arms a byte offset for the next RETR, STOR or APPE. The offset survives
/// until a transfer command consumes it; `REST 0` disarms it.
pub async fn handle_rest_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    let offset = match arg.trim().parse::<u64>() {
        Ok(offset) => offset,
        Err(_) => {
            send_reply(&writer, FTP_BADOPTS, "REST needs a numeric parameter.").await?;
            return Ok(());
        }
    };

    session.lock().await.restart_pos = offset;
    send_reply(
        &writer,
        FTP_RESTOK,
        &format!("Restart position accepted ({}).", offset),
    )
    .await?;
    Ok(())
}
