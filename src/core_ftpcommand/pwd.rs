// src/core_ftpcommand/pwd.rs
use crate::config::Config;
use crate::constants::FTP_PWDOK;
use crate::helpers::{send_reply, ControlWriter};
use crate::session::Session;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the PWD (Print Working Directory) FTP command.
pub async fn handle_pwd_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<(), std::io::Error> {
    let cwd = {
        let session = session.lock().await;
        session.cwd.clone()
    };
    send_reply(&writer, FTP_PWDOK, &format!("\"{}\"", cwd.display())).await?;
    Ok(())
}
