use crate::config::Config;
use crate::constants::{FTP_BADSEQ, FTP_LOGINERR, FTP_LOGINOK};
use crate::helpers::{send_reply, ControlWriter};
use crate::session::{Session, SessionUser};
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the PASS FTP command.
///
/// Confirms the account named by the preceding USER. The pending name is
/// consumed by this attempt either way; a failed password means starting
/// over with USER. On success the session drops into the account's home
/// directory.
///
/// # Arguments
///
/// * `writer` - A shared, locked write half for responses to the client.
/// * `session` - A shared, locked session containing the login state.
/// * `arg` - The cleartext password, taken verbatim (it may contain spaces).
///
/// # Returns
///
/// Result<(), std::io::Error> indicating the success or failure of the operation.
pub async fn handle_pass_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    let mut session = session.lock().await;
    if session.is_authenticated() {
        send_reply(&writer, FTP_LOGINOK, "Already logged in.").await?;
        return Ok(());
    }

    let pending = match session.pending_user.take() {
        Some(pending) => pending,
        None => {
            send_reply(&writer, FTP_BADSEQ, "Login with USER first.").await?;
            return Ok(());
        }
    };

    let entry = match session.users.lookup(&pending) {
        Some(entry) => entry.clone(),
        None => {
            send_reply(&writer, FTP_LOGINERR, "Login incorrect.").await?;
            return Ok(());
        }
    };

    if !entry.verify_password(&arg) {
        warn!("Failed login for {}", pending);
        send_reply(&writer, FTP_LOGINERR, "Login incorrect.").await?;
        return Ok(());
    }

    if !entry.home_dir.is_dir() {
        warn!(
            "Home directory {} for {} is missing",
            entry.home_dir.display(),
            pending
        );
    }

    info!("Login successful for {}", pending);
    session.cwd = entry.home_dir;
    session.user = Some(SessionUser {
        name: entry.username,
    });
    send_reply(&writer, FTP_LOGINOK, "Login successful.").await?;
    Ok(())
}
