use crate::config::Config;
use crate::constants::FTP_GOODBYE;
use crate::helpers::{send_reply, ControlWriter};
use crate::session::Session;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the QUIT FTP command. The dispatch loop closes the connection
/// after this reply goes out.
pub async fn handle_quit_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    _session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<(), std::io::Error> {
    info!("Received QUIT command. Closing connection.");
    send_reply(&writer, FTP_GOODBYE, "Goodbye.").await?;
    Ok(())
}
