mod config;
mod constants;
mod core_auth;
mod core_cli;
mod core_ftpcommand;
mod core_network;
mod core_privsock;
mod filelock;
mod helpers;
mod server;
mod session;
mod throttle;

use crate::core_auth::UserDb;
use crate::core_cli::Cli;
use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use log::info;
use std::io::Write;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    // Initialize the logger with a custom format
    let default_level = if args.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();

    // Load configuration from the TOML file
    let config_path = if args.config.is_empty() {
        constants::DEFAULT_CONFIG_PATH
    } else {
        args.config.as_str()
    };
    let config = helpers::load_config(config_path)?;
    info!("Configuration loaded from {}", config_path);
    helpers::log_config(&config);

    let users = UserDb::load_from_file(&config.server.passwd_file)?;
    info!(
        "Loaded {} account(s) from {}",
        users.len(),
        config.server.passwd_file
    );

    // Run the FTP server
    server::run(config, users).await?;

    Ok(())
}
