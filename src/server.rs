use crate::config::{ServerConfig, UserRecord};
use crate::core_auth::UserDirectory;
use crate::core_network::network;
use crate::helpers::log_config;
use anyhow::Result;
use log::info;
use std::sync::Arc;

/// Runs the FTP server with the provided configuration and user accounts.
///
/// # Arguments
///
/// * `config` - The server configuration, already defaulted and with a
///   canonicalized root.
/// * `users` - The accounts loaded from the users file; may be empty.
///
/// # Returns
///
/// `Ok(())` after a graceful shutdown, or the startup error (typically a
/// bind failure) that prevented the server from running.
pub async fn run(config: ServerConfig, users: Vec<UserRecord>) -> Result<()> {
    info!("Starting ferroftpd with {} account(s)", users.len());
    log_config(&config);

    let directory = UserDirectory::new(users, config.allow_anonymous);
    network::start_server(Arc::new(config), Arc::new(directory)).await
}
