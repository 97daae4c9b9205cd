use crate::config::Config;
use crate::constants::{
    FTP_BADOPTS, FTP_BADSENDFILE, FTP_BADSENDNET, FTP_DATACONN, FTP_TRANSFEROK, FTP_UPLOADFAIL,
};
use crate::core_network::negotiator::open_data_stream;
use crate::filelock;
use crate::helpers::{normalize_path, resolve_path, send_reply, ControlWriter};
use crate::session::Session;
use crate::throttle::RateLimiter;
use log::{error, info, warn};
use std::io::{Seek, SeekFrom};
use std::os::unix::fs::OpenOptionsExt;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::task;

enum UploadOutcome {
    Complete,
    LocalFail,
    NetworkFail,
}

/// Handles the STOR (Store) FTP command.
///
/// Receives a file over the data connection. With no restart offset the
/// target is truncated; after REST the upload overwrites in place from the
/// given position.
///
/// # Arguments
///
/// * `writer` - A shared, locked write half for responses to the client.
/// * `config` - A shared server configuration.
/// * `session` - A shared, locked session containing the user's current state.
/// * `arg` - The path of the file to create or overwrite.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating the success or failure of the operation.
pub async fn handle_stor_command(
    writer: ControlWriter,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    upload_common(writer, config, session, arg, false).await
}

/// Shared receive path for STOR and APPE. The two differ only in how the
/// opened file is positioned before data flows.
pub(crate) async fn upload_common(
    writer: ControlWriter,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
    is_append: bool,
) -> Result<(), std::io::Error> {
    let arg = arg.trim();
    if arg.is_empty() {
        send_reply(&writer, FTP_BADOPTS, "Syntax error in parameters or arguments.").await?;
        return Ok(());
    }

    let mut session = session.lock().await;
    // Spent by this attempt no matter how it ends, a failed negotiation
    // included. APPE takes it too but appends regardless.
    let offset = session.take_restart_pos();

    if !open_data_stream(&writer, &mut session).await? {
        return Ok(());
    }
    let mut data_stream = match session.data_stream.take() {
        Some(stream) => stream,
        None => return Ok(()),
    };

    let path = normalize_path(&resolve_path(&session.cwd, arg));
    let umask = session.umask;

    let open_path = path.clone();
    let opened = task::spawn_blocking(move || -> std::io::Result<std::fs::File> {
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .mode(0o666 & !umask)
            .open(&open_path)?;
        filelock::lock_file_write(&file)?;
        if is_append {
            file.seek(SeekFrom::End(0))?;
        } else if offset == 0 {
            file.set_len(0)?;
        } else {
            file.seek(SeekFrom::Start(offset))?;
        }
        Ok(file)
    })
    .await
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let file = match opened {
        Ok(file) => file,
        Err(e) => {
            warn!("Upload to {} refused: {}", path.display(), e);
            send_reply(&writer, FTP_UPLOADFAIL, "Could not create file.").await?;
            return Ok(());
        }
    };

    send_reply(&writer, FTP_DATACONN, "Ok to send data.").await?;

    let mut file = tokio::fs::File::from_std(file);
    let mut limiter = RateLimiter::new(session.upload_max_rate);
    let mut buffer = vec![0u8; config.server.upload_buffer_size()];
    let mut outcome = UploadOutcome::Complete;
    let mut received: u64 = 0;

    loop {
        let n = match data_stream.read(&mut buffer).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                error!("Reading from data connection failed: {}", e);
                outcome = UploadOutcome::NetworkFail;
                break;
            }
        };
        limiter.throttle(n as u64).await;
        if let Err(e) = file.write_all(&buffer[..n]).await {
            error!("Writing {} failed: {}", path.display(), e);
            outcome = UploadOutcome::LocalFail;
            break;
        }
        received += n as u64;
    }

    if matches!(outcome, UploadOutcome::Complete) {
        if let Err(e) = file.flush().await {
            error!("Flushing {} failed: {}", path.display(), e);
            outcome = UploadOutcome::LocalFail;
        }
    }
    // Write lock is released when the handle goes.
    drop(file);
    drop(data_stream);

    match outcome {
        UploadOutcome::Complete => {
            info!("Upload to {} complete ({} bytes)", path.display(), received);
            send_reply(&writer, FTP_TRANSFEROK, "Transfer complete.").await?;
        }
        UploadOutcome::LocalFail => {
            send_reply(&writer, FTP_BADSENDFILE, "Failure writing to local file.").await?;
        }
        UploadOutcome::NetworkFail => {
            send_reply(&writer, FTP_BADSENDNET, "Failure reading from network stream.").await?;
        }
    }
    Ok(())
}
