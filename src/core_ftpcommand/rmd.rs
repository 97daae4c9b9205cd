use crate::config::Config;
use crate::constants::{FTP_BADOPTS, FTP_FILEFAIL, FTP_RMDIROK};
use crate::helpers::{normalize_path, resolve_path, send_reply, ControlWriter};
use crate::session::Session;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the RMD (Remove Directory) FTP command. Only empty directories
/// can be removed.
pub async fn handle_rmd_command(
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

    match tokio::fs::remove_dir(&target).await {
        Ok(()) => {
            info!("Removed directory {}", target.display());
            send_reply(&writer, FTP_RMDIROK, "Remove directory operation successful.").await?;
        }
        Err(e) => {
            warn!("RMD {} failed: {}", target.display(), e);
            send_reply(&writer, FTP_FILEFAIL, "Remove directory operation failed.").await?;
        }
    }
    Ok(())
}
