use crate::config::Config;
use crate::constants::{FTP_BADOPTS, FTP_GIVEPWORD, FTP_LOGINERR};
use crate::helpers::{send_reply, ControlWriter};
use crate::session::Session;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the USER FTP command.
///
/// Names the account the client wants to log in as. Any non-empty name is
/// parked in `pending_user` and answered with 331; whether the account
/// exists is only revealed by PASS, so unknown and known names read the
/// same from outside.
pub async fn handle_user_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    let username = arg.trim();
    if username.is_empty() {
        send_reply(&writer, FTP_BADOPTS, "Syntax error in parameters or arguments.").await?;
        return Ok(());
    }

    let mut session = session.lock().await;
    if session.is_authenticated() {
        send_reply(&writer, FTP_LOGINERR, "Can't change to another user.").await?;
        return Ok(());
    }

    info!("USER {} awaiting password", username);
    session.pending_user = Some(username.to_string());
    send_reply(&writer, FTP_GIVEPWORD, "Please specify the password.").await?;
    Ok(())
}
