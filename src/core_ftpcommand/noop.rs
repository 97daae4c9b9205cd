use crate::config::Config;
use crate::constants::FTP_NOOPOK;
use crate::helpers::{send_reply, ControlWriter};
use crate::session::Session;
use std::sync::Arc;
use tokio::sync::Mutex;

pub async fn handle_noop_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    _session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<(), std::io::Error> {
    send_reply(&writer, FTP_NOOPOK, "NOOP ok.").await?;
    Ok(())
}
