use crate::config::Config;
use crate::constants::{FTP_BADOPTS, FTP_BADSEQ, FTP_FILEFAIL, FTP_RENAMEOK};
use crate::helpers::{normalize_path, resolve_path, send_reply, ControlWriter};
use crate::session::Session;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the RNTO (Rename To) FTP command.
///
/// Completes the rename armed by RNFR. The stored source is consumed by
/// this attempt whether the rename works or not.
pub async fn handle_rnto_command(
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
    let source = match session.rename_from.take() {
        Some(source) => source,
        None => {
            send_reply(&writer, FTP_BADSEQ, "RNFR required first.").await?;
            return Ok(());
        }
    };
    let target = normalize_path(&resolve_path(&session.cwd, arg));

    match tokio::fs::rename(&source, &target).await {
        Ok(()) => {
            info!("Renamed {} to {}", source.display(), target.display());
            send_reply(&writer, FTP_RENAMEOK, "Rename successful.").await?;
        }
        Err(e) => {
            warn!(
                "Rename {} to {} failed: {}",
                source.display(),
                target.display(),
                e
            );
            send_reply(&writer, FTP_FILEFAIL, "Rename failed.").await?;
        }
    }
    Ok(())
}
