use crate::config::Config;
use crate::constants::{FTP_BADOPTS, FTP_FILEFAIL, FTP_MKDIROK};
use crate::helpers::{normalize_path, resolve_path, send_reply, ControlWriter};
use crate::session::Session;
use log::{info, warn};
use std::fs::Permissions;
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the MKD (Make Directory) FTP command.
///
/// The new directory gets mode 0777 filtered through the configured umask.
pub async fn handle_mkd_command(
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

    let session = session.lock().await;
    let target = normalize_path(&resolve_path(&session.cwd, arg));

    if let Err(e) = tokio::fs::create_dir(&target).await {
        warn!("MKD {} failed: {}", target.display(), e);
        send_reply(&writer, FTP_FILEFAIL, "Create directory operation failed.").await?;
        return Ok(());
    }

    let mode = 0o777 & !session.umask;
    if let Err(e) = tokio::fs::set_permissions(&target, Permissions::from_mode(mode)).await {
        warn!("Setting mode {:03o} on {} failed: {}", mode, target.display(), e);
    }

    info!("Created directory {}", target.display());
    send_reply(
        &writer,
        FTP_MKDIROK,
        &format!("\"{}\" created.", target.display()),
    )
    .await?;
    Ok(())
}
