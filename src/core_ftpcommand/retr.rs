use crate::config::Config;
use crate::constants::{
    FTP_BADOPTS, FTP_BADSENDFILE, FTP_BADSENDNET, FTP_DATACONN, FTP_FILEFAIL, FTP_TRANSFEROK,
};
use crate::core_network::negotiator::open_data_stream;
use crate::filelock;
use crate::helpers::{normalize_path, resolve_path, send_reply, ControlWriter};
use crate::session::Session;
use crate::throttle::RateLimiter;
use log::{error, info};
use std::io::{Seek, SeekFrom};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::task;

enum DownloadOutcome {
    Complete,
    LocalFail,
    NetworkFail,
}

/// Handles the RETR (Retrieve) FTP command.
///
/// Negotiates the data connection, opens and read-locks the file, honors a
/// restart offset armed by REST, then streams the remainder through the
/// rate limiter. The final reply distinguishes local read failures (451)
/// from data-connection failures (426).
///
/// # Arguments
///
/// * `writer` - A shared, locked write half for responses to the client.
/// * `config` - A shared server configuration.
/// * `session` - A shared, locked session containing the user's current state.
/// * `arg` - The path of the file to send.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating the success or failure of the operation.
pub async fn handle_retr_command(
    writer: ControlWriter,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    let arg = arg.trim();
    if arg.is_empty() {
        send_reply(&writer, FTP_BADOPTS, "Syntax error in parameters or arguments.").await?;
        return Ok(());
    }

    let mut session = session.lock().await;
    // The offset is spent by this attempt no matter how it ends, a failed
    // negotiation included.
    let offset = session.take_restart_pos();

    if !open_data_stream(&writer, &mut session).await? {
        return Ok(());
    }
    let mut data_stream = match session.data_stream.take() {
        Some(stream) => stream,
        None => return Ok(()),
    };

    let path = normalize_path(&resolve_path(&session.cwd, arg));

    let open_path = path.clone();
    let opened = task::spawn_blocking(move || -> std::io::Result<(std::fs::File, u64)> {
        let mut file = std::fs::File::open(&open_path)?;
        filelock::lock_file_read(&file)?;
        let meta = file.metadata()?;
        if !meta.file_type().is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a regular file",
            ));
        }
        if offset != 0 {
            file.seek(SeekFrom::Start(offset))?;
        }
        Ok((file, meta.len()))
    })
    .await
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let (file, size) = match opened {
        Ok(opened) => opened,
        Err(e) => {
            info!("RETR {} refused: {}", path.display(), e);
            send_reply(&writer, FTP_FILEFAIL, "Failed to open file.").await?;
            return Ok(());
        }
    };

    send_reply(
        &writer,
        FTP_DATACONN,
        &format!(
            "Opening {} mode data connection for {} ({} bytes).",
            session.transfer_type.name(),
            arg,
            size
        ),
    )
    .await?;

    let mut file = tokio::fs::File::from_std(file);
    let mut limiter = RateLimiter::new(session.download_max_rate);
    let mut buffer = vec![0u8; config.server.download_buffer_size()];
    let mut remaining = size.saturating_sub(offset);
    let mut outcome = DownloadOutcome::Complete;

    while remaining > 0 {
        let want = remaining.min(buffer.len() as u64) as usize;
        let n = match file.read(&mut buffer[..want]).await {
            // The file shrank under us; what we got is all there is.
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                error!("Reading {} failed: {}", path.display(), e);
                outcome = DownloadOutcome::LocalFail;
                break;
            }
        };
        if let Err(e) = data_stream.write_all(&buffer[..n]).await {
            error!("Writing to data connection failed: {}", e);
            outcome = DownloadOutcome::NetworkFail;
            break;
        }
        remaining -= n as u64;
        limiter.throttle(n as u64).await;
    }

    // Push the FIN out before reporting; the read lock dies with `file`.
    let _ = data_stream.shutdown().await;
    drop(data_stream);
    drop(file);

    match outcome {
        DownloadOutcome::Complete => {
            info!("RETR {} complete ({} bytes from offset {})", path.display(), size.saturating_sub(offset), offset);
            send_reply(&writer, FTP_TRANSFEROK, "Transfer complete.").await?;
        }
        DownloadOutcome::LocalFail => {
            send_reply(&writer, FTP_BADSENDFILE, "Failure reading from local file.").await?;
        }
        DownloadOutcome::NetworkFail => {
            send_reply(&writer, FTP_BADSENDNET, "Failure writing to network stream.").await?;
        }
    }
    Ok(())
}
