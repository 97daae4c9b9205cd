use crate::config::Config;
use crate::constants::{FTP_CWDOK, FTP_FILEFAIL};
use crate::helpers::{normalize_path, send_reply, ControlWriter};
use crate::session::Session;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the CDUP (Change to Parent Directory) FTP command. Equivalent
/// to `CWD ..`; at the root it stays at the root.
pub async fn handle_cdup_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<(), std::io::Error> {
    let mut session = session.lock().await;
    let target = normalize_path(&session.cwd.join(".."));

    match tokio::fs::metadata(&target).await {
        Ok(meta) if meta.is_dir() => {
            session.cwd = target;
            send_reply(&writer, FTP_CWDOK, "Directory successfully changed.").await?;
        }
        _ => {
            send_reply(&writer, FTP_FILEFAIL, "Failed to change directory.").await?;
        }
    }
    Ok(())
}
