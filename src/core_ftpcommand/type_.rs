use crate::config::Config;
use crate::constants::{FTP_BADCMD, FTP_TYPEOK};
use crate::helpers::{send_reply, ControlWriter};
use crate::session::{Session, TransferType};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the TYPE (Representation Type) FTP command.
///
/// Both representations move bytes unchanged; the choice only shows up in
/// transfer replies.
pub async fn handle_type_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    match arg.trim().to_ascii_uppercase().as_str() {
        "A" => {
            session.lock().await.transfer_type = TransferType::Ascii;
            send_reply(&writer, FTP_TYPEOK, "Switching to ASCII mode.").await?;
        }
        "I" => {
            session.lock().await.transfer_type = TransferType::Binary;
            send_reply(&writer, FTP_TYPEOK, "Switching to Binary mode.").await?;
        }
        _ => {
            send_reply(&writer, FTP_BADCMD, "Unrecognised TYPE command.").await?;
        }
    }
    Ok(())
}
