use serde::{Deserialize, Serialize};
use std::time::Duration;

use log::warn;

/// Fallback umask when the configured string does not parse as octal.
const DEFAULT_UMASK: u32 = 0o077;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: String,
    pub listen_port: u16,
    /// Address advertised in PASV replies and bound by the passive listener.
    pub pasv_address: String,
    /// Source port for active-mode data connections. 0 means ephemeral.
    pub data_port: u16,
    pub passwd_file: String,
    /// Octal creation mask applied to uploaded files, e.g. "022".
    pub local_umask: String,
    /// Seconds a session may sit idle between commands. 0 disables the limit.
    pub idle_session_timeout: u64,
    /// Seconds the passive listener waits for the peer to connect.
    pub accept_timeout: u64,
    /// Seconds an active-mode connect may take before it is abandoned.
    pub connect_timeout: u64,
    /// Per-session transfer ceilings in bytes per second. 0 means unlimited.
    pub upload_max_rate: u64,
    pub download_max_rate: u64,
    pub upload_buffer_size: Option<usize>, // Optional to allow default value
    pub download_buffer_size: Option<usize>, // Optional to allow default value
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: String::from("0.0.0.0"),
            listen_port: 21,
            pasv_address: String::from("127.0.0.1"),
            data_port: 20,
            passwd_file: String::from("/etc/ferrousftpd.passwd"),
            local_umask: String::from("077"),
            idle_session_timeout: 300,
            accept_timeout: 60,
            connect_timeout: 60,
            upload_max_rate: 0,
            download_max_rate: 0,
            upload_buffer_size: Some(256 * 1024), // Default 256 KB
            download_buffer_size: Some(128 * 1024), // Default 128 KB
        }
    }
}

impl ServerConfig {
    pub fn umask(&self) -> u32 {
        match u32::from_str_radix(&self.local_umask, 8) {
            Ok(mask) if mask <= 0o777 => mask,
            _ => {
                warn!(
                    "Invalid local_umask {:?}, falling back to {:03o}",
                    self.local_umask, DEFAULT_UMASK
                );
                DEFAULT_UMASK
            }
        }
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_session_timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(self.idle_session_timeout))
        }
    }

    pub fn accept_timeout(&self) -> Duration {
        Duration::from_secs(self.accept_timeout)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn upload_buffer_size(&self) -> usize {
        self.upload_buffer_size.unwrap_or(256 * 1024)
    }

    pub fn download_buffer_size(&self) -> usize {
        self.download_buffer_size.unwrap_or(128 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            listen_port = 2121
            pasv_address = "10.0.0.5"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.listen_port, 2121);
        assert_eq!(config.server.pasv_address, "10.0.0.5");
        assert_eq!(config.server.data_port, 20);
        assert_eq!(config.server.idle_session_timeout, 300);
        assert_eq!(config.server.upload_buffer_size, Some(256 * 1024));
    }

    #[test]
    fn empty_toml_is_a_full_default_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.listen_port, 21);
        assert_eq!(config.server.umask(), 0o077);
        assert!(config.server.idle_timeout().is_some());
    }

    #[test]
    fn umask_parses_octal() {
        let mut config = Config::default();
        config.server.local_umask = String::from("022");
        assert_eq!(config.server.umask(), 0o022);

        config.server.local_umask = String::from("77");
        assert_eq!(config.server.umask(), 0o077);
    }

    #[test]
    fn bad_umask_falls_back() {
        let mut config = Config::default();
        config.server.local_umask = String::from("abc");
        assert_eq!(config.server.umask(), 0o077);

        config.server.local_umask = String::from("7777");
        assert_eq!(config.server.umask(), 0o077);
    }

    #[test]
    fn zero_idle_timeout_disables_it() {
        let mut config = Config::default();
        config.server.idle_session_timeout = 0;
        assert!(config.server.idle_timeout().is_none());
    }
}
