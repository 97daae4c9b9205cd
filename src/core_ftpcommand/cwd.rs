use crate::config::Config;
use crate::constants::{FTP_BADOPTS, FTP_CWDOK, FTP_FILEFAIL};
use crate::helpers::{normalize_path, resolve_path, send_reply, ControlWriter};
use crate::session::Session;
use log::debug;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the CWD (Change Working Directory) FTP command.
pub async fn handle_cwd_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    let arg = arg.trim();
    if arg.is_empty() {
        send_reply(&writer, FTP_BADOPTS, "Syntax error in parameters or arguments.").await?;
        return Ok(());
    }

    let mut session = session.lock().await;
    let target = normalize_path(&resolve_path(&session.cwd, arg));

    match tokio::fs::metadata(&target).await {
        Ok(meta) if meta.is_dir() => {
            debug!("Working directory now {}", target.display());
            session.cwd = target;
            send_reply(&writer, FTP_CWDOK, "Directory successfully changed.").await?;
        }
        _ => {
            send_reply(&writer, FTP_FILEFAIL, "Failed to change directory.").await?;
        }
    }
    Ok(())
}
