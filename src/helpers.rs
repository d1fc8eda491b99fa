use crate::config::ServerConfig;
use log::info;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

/// Write half of the control connection, shared between the dispatch loop and
/// the command handlers. Per-session writes are serialized through the lock,
/// so multi-line replies go out atomically.
pub type ControlWriter = Arc<Mutex<OwnedWriteHalf>>;

/// Sends a reply (one line, or a preformatted multi-line block) to the client.
pub async fn send_response(
    writer: &ControlWriter,
    message: &[u8],
) -> Result<(), std::io::Error> {
    let mut writer = writer.lock().await;
    writer.write_all(message).await?;
    writer.flush().await?;
    Ok(())
}

// Helper function to log configuration options
pub fn log_config(config: &ServerConfig) {
    info!("  Root: {}", config.root.display());
    info!("  Bind: {}", config.bind);
    info!("  Control Port: {}", config.control_port);
    info!(
        "  Passive Ports: {}..{}",
        config.pasv_min, config.pasv_max
    );
    info!(
        "  Idle Timeouts: {}s before login, {}s after",
        config.pre_login_idle_seconds, config.post_login_idle_seconds
    );
    info!("  Allow Anonymous: {}", config.allow_anonymous);
}
