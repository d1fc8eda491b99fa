use crate::core_auth::UserDirectory;
use crate::core_ftpcommand::error::CommandError;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the USER FTP command.
///
/// The name is remembered as the pending user and consumed by the next PASS.
/// "anonymous" (in any case) is subject to the anonymous-access policy and
/// normalized to lowercase.
pub async fn handle_user_command(
    writer: ControlWriter,
    users: Arc<UserDirectory>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), CommandError> {
    let name = arg.trim();

    if name.eq_ignore_ascii_case("anonymous") {
        if !users.allow_anonymous() {
            send_response(&writer, b"530 Anonymous access denied\r\n").await?;
            return Ok(());
        }
        let mut session = session.lock().await;
        session.pending_user = String::from("anonymous");
        info!("[session {}] anonymous login requested", session.id);
        drop(session);
        send_response(&writer, b"331 Anonymous login ok, send any password\r\n").await?;
    } else {
        let mut session = session.lock().await;
        session.pending_user = name.to_string();
        drop(session);
        send_response(&writer, b"331 Password required\r\n").await?;
    }
    Ok(())
}
