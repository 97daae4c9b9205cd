use crate::config::Config;
use crate::constants::{FTP_BADOPTS, FTP_DELEOK, FTP_FILEFAIL};
use crate::helpers::{normalize_path, resolve_path, send_reply, ControlWriter};
use crate::session::Session;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the DELE (Delete File) FTP command.
pub async fn handle_dele_command(
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

    let target = {
        let session = session.lock().await;
        normalize_path(&resolve_path(&session.cwd, arg))
    };

    match tokio::fs::remove_file(&target).await {
        Ok(()) => {
            info!("Deleted {}", target.display());
            send_reply(&writer, FTP_DELEOK, "Delete operation successful.").await?;
        }
        Err(e) => {
            warn!("DELE {} failed: {}", target.display(), e);
            send_reply(&writer, FTP_FILEFAIL, "Delete operation failed.").await?;
        }
    }
    Ok(())
}
