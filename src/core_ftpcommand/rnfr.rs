use crate::config::Config;
use crate::constants::{FTP_BADOPTS, FTP_FILEFAIL, FTP_RNFROK};
use crate::helpers::{normalize_path, resolve_path, send_reply, ControlWriter};
use crate::session::Session;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the RNFR (Rename From) FTP command.
///
/// Records the rename source for the RNTO that must follow. The source has
/// to exist now; a dangling symlink still counts since the link itself is
/// what gets renamed.
///
/// # Arguments
///
/// * `writer` - A shared, locked write half for responses to the client.
/// * `session` - A shared, locked session containing the user's current state.
/// * `arg` - The current name of the file or directory.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating the success or failure of the operation.
pub async fn handle_rnfr_command(
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
    let source = normalize_path(&resolve_path(&session.cwd, arg));

    if tokio::fs::symlink_metadata(&source).await.is_err() {
        session.rename_from = None;
        send_reply(&writer, FTP_FILEFAIL, "RNFR command failed.").await?;
        return Ok(());
    }

    session.rename_from = Some(source);
    send_reply(&writer, FTP_RNFROK, "Ready for RNTO.").await?;
    Ok(())
}
