use crate::config::ServerConfig;
use crate::core_auth::UserDirectory;
use crate::core_ftpcommand::error::CommandError;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the PASS FTP command.
///
/// Consumes the pending user set by USER. Anonymous logins accept any
/// password; named logins require an exact username/password match in the
/// user directory. A successful login swaps the session root to the user's
/// home directory (created on first login) and resets the virtual working
/// directory to "/".
pub async fn handle_pass_command(
    writer: ControlWriter,
    config: Arc<ServerConfig>,
    users: Arc<UserDirectory>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), CommandError> {
    let mut session = session.lock().await;
    let pending = session.pending_user.clone();

    if pending == "anonymous" {
        if !users.allow_anonymous() {
            drop(session);
            send_response(&writer, b"530 Anonymous access denied\r\n").await?;
            return Ok(());
        }
        let home = config.root.join("anonymous");
        tokio::fs::create_dir_all(&home).await?;
        session.login("anonymous", home);
        info!("[session {}] anonymous logged in", session.id);
        drop(session);
        send_response(&writer, b"230 Logged in.\r\n").await?;
        return Ok(());
    }

    if !pending.is_empty() && users.check_password(&pending, &arg) {
        let home = config.root.join("users").join(&pending);
        tokio::fs::create_dir_all(&home).await?;
        session.login(&pending, home);
        info!("[session {}] user {} logged in", session.id, pending);
        drop(session);
        send_response(&writer, b"230 Logged in.\r\n").await?;
    } else {
        warn!(
            "[session {}] failed login attempt for {:?}",
            session.id, pending
        );
        drop(session);
        send_response(&writer, b"530 Login incorrect\r\n").await?;
    }
    Ok(())
}
