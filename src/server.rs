use crate::config::Config;
use crate::core_auth::UserDb;
use crate::core_network::network;
use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Runs the FTP server with the provided configuration and account database.
///
/// Binds the control listener, then hands off to the accept loop, which only
/// returns on an unrecoverable listener error.
///
/// # Arguments
///
/// * `config` - The server configuration.
/// * `users` - The accounts clients may log in as.
///
/// # Returns
///
/// Result<(), anyhow::Error> indicating the success or failure of the operation.
pub async fn run(config: Config, users: UserDb) -> Result<()> {
    let bind_addr = format!(
        "{}:{}",
        config.server.listen_address, config.server.listen_port
    );
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind control listener on {}", bind_addr))?;
    info!("Listening on {}", bind_addr);

    network::start_server(listener, Arc::new(config), Arc::new(users)).await
}
