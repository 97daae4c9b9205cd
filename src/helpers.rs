use crate::config::Config;

use anyhow::{Context, Result};

use log::info;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

/// Write half of the control connection, shared between the dispatch loop
/// and the command handlers.
pub type ControlWriter = Arc<Mutex<OwnedWriteHalf>>;

/// Sends a final reply line: `code SP text CRLF`.
pub async fn send_reply(
    writer: &ControlWriter,
    code: u16,
    text: &str,
) -> Result<(), std::io::Error> {
    let line = format!("{} {}\r\n", code, text);
    let mut writer = writer.lock().await;
    writer.write_all(line.as_bytes()).await?;
    Ok(())
}

/// Sends an intermediate reply line of a multi-line reply: `code HYPHEN text CRLF`.
pub async fn send_lreply(
    writer: &ControlWriter,
    code: u16,
    text: &str,
) -> Result<(), std::io::Error> {
    let line = format!("{}-{}\r\n", code, text);
    let mut writer = writer.lock().await;
    writer.write_all(line.as_bytes()).await?;
    Ok(())
}

/// Sends a bare feature line inside a multi-line reply: ` text CRLF`.
pub async fn send_feature_line(
    writer: &ControlWriter,
    text: &str,
) -> Result<(), std::io::Error> {
    let line = format!(" {}\r\n", text);
    let mut writer = writer.lock().await;
    writer.write_all(line.as_bytes()).await?;
    Ok(())
}

/// Resolves a client-supplied path against the session working directory.
/// Absolute arguments are taken as-is, relative ones are joined onto `cwd`.
pub fn resolve_path(cwd: &Path, arg: &str) -> PathBuf {
    let arg = Path::new(arg);
    if arg.is_absolute() {
        arg.to_path_buf()
    } else {
        cwd.join(arg)
    }
}

/// Collapses `.` and `..` components lexically, without consulting the
/// filesystem. `..` at the root stays at the root.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
        }
    }
    if normalized.as_os_str().is_empty() {
        PathBuf::from("/")
    } else {
        normalized
    }
}

pub fn load_config(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path))?;
    let config: Config = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse configuration file: {}", path))?;

    Ok(config)
}

// Helper function to log configuration options
pub fn log_config(config: &Config) {
    info!("  Listen: {}:{}", config.server.listen_address, config.server.listen_port);
    info!("  PASV Address: {}", config.server.pasv_address);
    info!("  Data Port: {}", config.server.data_port);
    info!("  Passwd File: {}", config.server.passwd_file);
    info!("  Local Umask: {:03o}", config.server.umask());
    info!("  Idle Timeout: {} s", config.server.idle_session_timeout);
    info!(
        "  Upload Max Rate: {}",
        describe_rate(config.server.upload_max_rate)
    );
    info!(
        "  Download Max Rate: {}",
        describe_rate(config.server.download_max_rate)
    );
    info!(
        "  Upload Buffer Size: {} KB",
        config.server.upload_buffer_size() / 1024
    );
    info!(
        "  Download Buffer Size: {} KB",
        config.server.download_buffer_size() / 1024
    );
}

fn describe_rate(rate: u64) -> String {
    if rate == 0 {
        String::from("unlimited")
    } else {
        format!("{} B/s", rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn resolve_path_joins_relative_arguments() {
        let cwd = Path::new("/srv/ftp/alice");
        assert_eq!(
            resolve_path(cwd, "reports/2026.txt"),
            PathBuf::from("/srv/ftp/alice/reports/2026.txt")
        );
    }

    #[test]
    fn resolve_path_keeps_absolute_arguments() {
        let cwd = Path::new("/srv/ftp/alice");
        assert_eq!(resolve_path(cwd, "/tmp/upload"), PathBuf::from("/tmp/upload"));
    }

    #[test]
    fn normalize_collapses_dots() {
        assert_eq!(
            normalize_path(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
        assert_eq!(normalize_path(Path::new("/a/..")), PathBuf::from("/"));
    }

    #[test]
    fn normalize_stops_at_the_root() {
        assert_eq!(normalize_path(Path::new("/../../x")), PathBuf::from("/x"));
        assert_eq!(normalize_path(Path::new("/")), PathBuf::from("/"));
    }

    #[test]
    fn load_config_reads_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nlisten_port = 2100").unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.server.listen_port, 2100);
    }

    #[test]
    fn load_config_rejects_missing_file() {
        assert!(load_config("/nonexistent/ferrousftpd.conf").is_err());
    }

    #[test]
    fn describe_rate_spells_out_unlimited() {
        assert_eq!(describe_rate(0), "unlimited");
        assert_eq!(describe_rate(4096), "4096 B/s");
    }
}
