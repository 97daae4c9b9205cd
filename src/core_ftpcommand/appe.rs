use crate::config::Config;
use crate::core_ftpcommand::stor::upload_common;
use crate::helpers::ControlWriter;
use crate::session::Session;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the APPE (Append) FTP command.
///
/// Same receive path as STOR, but the file is opened without truncation and
/// positioned at its end, so the incoming data extends whatever is already
/// there. A pending REST offset is consumed and ignored.
pub async fn handle_appe_command(
    writer: ControlWriter,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    upload_common(writer, config, session, arg, true).await
}
