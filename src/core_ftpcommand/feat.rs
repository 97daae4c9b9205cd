use crate::config::Config;
use crate::constants::FTP_FEATOK;
use crate::helpers::{send_feature_line, send_lreply, send_reply, ControlWriter};
use crate::session::Session;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the FEAT (Feature) FTP command.
///
/// Responds with the multi-line list of supported extensions.
pub async fn handle_feat_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    _session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<(), std::io::Error> {
    let features = ["PASV", "REST STREAM", "SIZE", "UTF8"];

    send_lreply(&writer, FTP_FEATOK, "Features:").await?;
    for feature in features {
        send_feature_line(&writer, feature).await?;
    }
    send_reply(&writer, FTP_FEATOK, "End").await?;
    Ok(())
}
