use crate::config::Config;
use crate::constants::{FTP_BADSENDFILE, FTP_BADSENDNET, FTP_DATACONN, FTP_TRANSFEROK};
use crate::core_network::negotiator::open_data_stream;
use crate::helpers::{send_reply, ControlWriter};
use crate::session::Session;
use chrono::{DateTime, Local};
use log::{debug, error};
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

const S_IFMT: u32 = 0o170000;
const S_IFSOCK: u32 = 0o140000;
const S_IFLNK: u32 = 0o120000;
const S_IFBLK: u32 = 0o060000;
const S_IFDIR: u32 = 0o040000;
const S_IFCHR: u32 = 0o020000;
const S_IFIFO: u32 = 0o010000;

#[derive(Debug)]
enum ListError {
    /// Reading the directory itself failed.
    Dir(std::io::Error),
    /// Writing a line to the data connection failed.
    Write(std::io::Error),
}

/// Handles the LIST FTP command.
///
/// Streams a long-format listing of the current directory over the data
/// connection, one `ls -l` style line per visible entry.
///
/// # Arguments
///
/// * `writer` - A shared, locked write half for responses to the client.
/// * `config` - A shared server configuration.
/// * `session` - A shared, locked session containing the user's current state.
/// * `arg` - Listing options from the client, accepted and ignored.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating the success or failure of the operation.
pub async fn handle_list_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    list_common(writer, session, arg, true).await
}

/// Handles the NLST (Name List) FTP command. Bare names, one per line.
pub async fn handle_nlst_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    list_common(writer, session, arg, false).await
}

async fn list_common(
    writer: ControlWriter,
    session: Arc<Mutex<Session>>,
    arg: String,
    detail: bool,
) -> Result<(), std::io::Error> {
    if !arg.trim().is_empty() {
        debug!("Listing options ignored: {}", arg.trim());
    }

    let mut session = session.lock().await;
    // Offsets have no meaning for listings but a pending one is still spent.
    session.take_restart_pos();

    if !open_data_stream(&writer, &mut session).await? {
        return Ok(());
    }
    let mut data_stream = match session.data_stream.take() {
        Some(stream) => stream,
        None => return Ok(()),
    };

    send_reply(&writer, FTP_DATACONN, "Here comes the directory listing.").await?;

    let dir = session.cwd.clone();
    let result = write_listing(&dir, detail, &mut data_stream).await;
    let _ = data_stream.shutdown().await;
    drop(data_stream);

    match result {
        Ok(()) => {
            send_reply(&writer, FTP_TRANSFEROK, "Directory send OK.").await?;
        }
        Err(ListError::Dir(e)) => {
            error!("Listing {} failed: {}", dir.display(), e);
            send_reply(&writer, FTP_BADSENDFILE, "Failure reading local directory.").await?;
        }
        Err(ListError::Write(e)) => {
            error!("Writing listing to data connection failed: {}", e);
            send_reply(&writer, FTP_BADSENDNET, "Failure writing to network stream.").await?;
        }
    }
    Ok(())
}

/// Streams one line per visible entry of `dir` into `out`. Dotfiles are
/// skipped; entries that vanish mid-walk are silently dropped.
async fn write_listing<W>(dir: &Path, detail: bool, out: &mut W) -> Result<(), ListError>
where
    W: AsyncWrite + Unpin,
{
    let mut entries = tokio::fs::read_dir(dir).await.map_err(ListError::Dir)?;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => return Ok(()),
            Err(e) => return Err(ListError::Dir(e)),
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let line = if detail {
            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                Err(_) => continue,
            };
            let link_target = if meta.file_type().is_symlink() {
                tokio::fs::read_link(entry.path()).await.ok()
            } else {
                None
            };
            format!("{}\r\n", format_list_entry(&name, &meta, link_target.as_deref()))
        } else {
            format!("{}\r\n", name)
        };
        out.write_all(line.as_bytes()).await.map_err(ListError::Write)?;
    }
}

fn format_list_entry(name: &str, meta: &std::fs::Metadata, link_target: Option<&Path>) -> String {
    let date = format_mtime(meta.modified().unwrap_or(std::time::UNIX_EPOCH));
    let shown = match link_target {
        Some(target) => format!("{} -> {}", name, target.display()),
        None => name.to_string(),
    };
    format!(
        "{} {:>3} {:<8} {:<8} {:>8} {} {}",
        file_mode_string(meta.mode()),
        meta.nlink(),
        meta.uid(),
        meta.gid(),
        meta.size(),
        date,
        shown
    )
}

/// Renders a raw mode word the way `ls -l` does, setuid/setgid/sticky
/// folded into the execute columns.
fn file_mode_string(mode: u32) -> String {
    let mut out = String::with_capacity(10);
    out.push(match mode & S_IFMT {
        S_IFDIR => 'd',
        S_IFLNK => 'l',
        S_IFSOCK => 's',
        S_IFIFO => 'p',
        S_IFBLK => 'b',
        S_IFCHR => 'c',
        _ => '-',
    });
    let triplets = [(mode >> 6) & 7, (mode >> 3) & 7, mode & 7];
    for (i, bits) in triplets.iter().enumerate() {
        out.push(if bits & 4 != 0 { 'r' } else { '-' });
        out.push(if bits & 2 != 0 { 'w' } else { '-' });
        let special = match i {
            0 => mode & 0o4000 != 0,
            1 => mode & 0o2000 != 0,
            _ => mode & 0o1000 != 0,
        };
        out.push(match (special, bits & 1 != 0) {
            (true, true) if i == 2 => 't',
            (true, false) if i == 2 => 'T',
            (true, true) => 's',
            (true, false) => 'S',
            (false, true) => 'x',
            (false, false) => '-',
        });
    }
    out
}

/// `ls` convention: recent files show hour and minute, older ones the year.
fn format_mtime(mtime: std::time::SystemTime) -> String {
    let when: DateTime<Local> = mtime.into();
    let age = Local::now().signed_duration_since(when);
    if age.num_days() > 182 || age.num_days() < -1 {
        when.format("%b %e  %Y").to_string()
    } else {
        when.format("%b %e %H:%M").to_string()
    }
}
