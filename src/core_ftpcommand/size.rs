// core_ftpcommand/size.rs

use crate::config::Config;
use crate::constants::{FTP_BADOPTS, FTP_FILEFAIL, FTP_SIZEOK};
use crate::helpers::{normalize_path, resolve_path, send_reply, ControlWriter};
use crate::session::Session;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the SIZE (File Size) FTP command. Only regular files have a
/// reportable size.
pub async fn handle_size_command(
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

    match tokio::fs::metadata(&target).await {
        Ok(meta) if meta.is_file() => {
            send_reply(&writer, FTP_SIZEOK, &meta.len().to_string()).await?;
        }
        _ => {
            send_reply(&writer, FTP_FILEFAIL, "Could not get file size.").await?;
        }
    }
    Ok(())
}
