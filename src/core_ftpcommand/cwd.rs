use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::utils::try_change_dir;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the CWD FTP command.
///
/// The argument is resolved against the jail; only an existing directory
/// inside the root is accepted. A traversal that lexically climbs above "/"
/// clamps to "/" rather than failing.
pub async fn handle_cwd_command(
    writer: ControlWriter,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), CommandError> {
    let mut session = session.lock().await;
    let changed = try_change_dir(&mut session, arg.trim()).await;
    drop(session);

    if changed {
        send_response(&writer, b"250 Directory successfully changed\r\n").await?;
    } else {
        send_response(&writer, b"550 Failed to change directory\r\n").await?;
    }
    Ok(())
}
